// src/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==============================================================================
// 1. Core value types
// ==============================================================================

pub type ClientId = String;

/// Font settings carried by a configuration and by every snapshot of it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct TextOptions {
    pub font_name: String,
    pub font_size: i32,
}

impl TextOptions {
    pub fn new(font_name: impl Into<String>, font_size: i32) -> Self {
        Self {
            font_name: font_name.into(),
            font_size,
        }
    }
}

impl Default for TextOptions {
    fn default() -> Self {
        Self::new("Consolas", 12)
    }
}

/// What a subscription is about: one configuration of one user.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub user_id: i64,
    pub configuration_id: i64,
}

impl Target {
    pub fn new(user_id: i64, configuration_id: i64) -> Self {
        Self {
            user_id,
            configuration_id,
        }
    }
}

// ==============================================================================
// 2. Stored entities
// ==============================================================================

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserConfiguration {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub text_options: TextOptions,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// Saved state the configuration would go back to on "restore last".
    pub saved_state_id: Option<i64>,
}

impl UserConfiguration {
    pub fn target(&self) -> Target {
        Target::new(self.user_id, self.id)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    pub id: i64,
    pub configuration_id: i64,
    pub saved_at: DateTime<Utc>,
    pub text_options: TextOptions,
}

/// Read-only view of a configuration's version history.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub name: String,
    pub text_options: TextOptions,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub save_pointer: Option<DateTime<Utc>>,
    pub versions: Vec<DateTime<Utc>>,
}

// ==============================================================================
// 3. Change notifications
// ==============================================================================

/// Pushed to subscribers of `(user_id, configuration_id)` after a persisted change.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub user_id: i64,
    pub configuration_id: i64,
    pub configuration_name: String,
    pub font_name: String,
    pub font_size: i32,
}

impl ChangeEvent {
    pub fn from_configuration(configuration: &UserConfiguration) -> Self {
        Self {
            user_id: configuration.user_id,
            configuration_id: configuration.id,
            configuration_name: configuration.name.clone(),
            font_name: configuration.text_options.font_name.clone(),
            font_size: configuration.text_options.font_size,
        }
    }

    pub fn target(&self) -> Target {
        Target::new(self.user_id, self.configuration_id)
    }
}

/// Everything the repository reports to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryEvent {
    Changed(ChangeEvent),
    /// The configuration no longer exists; its subscriptions are stale.
    Removed(Target),
}

// ==============================================================================
// 4. Request payloads (HTTP / Socket.IO)
// ==============================================================================

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub username: String,
    #[serde(default)]
    pub name: String,
}

impl UserPayload {
    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("username must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationPayload {
    pub configuration_name: String,
    #[serde(default)]
    pub text_options: TextOptions,
}

impl ConfigurationPayload {
    pub fn validate(&self) -> Result<(), String> {
        if self.configuration_name.trim().is_empty() {
            return Err("configurationName must not be empty".to_string());
        }
        if self.text_options.font_name.trim().is_empty() {
            return Err("fontName must not be empty".to_string());
        }
        if self.text_options.font_size <= 0 {
            return Err(format!(
                "fontSize must be positive, got {}",
                self.text_options.font_size
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct RestoreSavedStatePayload {
    pub saved_state_id: i64,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPayload {
    pub user_id: i64,
    pub configuration_id: i64,
}

// ==============================================================================
// 5. Socket.IO acknowledgements
// ==============================================================================

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum SubscriptionAck {
    #[serde(rename_all = "camelCase")]
    Completed {
        success: bool,
        action: &'static str,
        was_previously_subscribed: bool,
        user_id: i64,
        configuration_id: i64,
    },
    Failed {
        success: bool,
        action: &'static str,
        error: String,
    },
}

impl SubscriptionAck {
    pub fn completed(action: &'static str, was_previously_subscribed: bool, payload: SubscriptionPayload) -> Self {
        SubscriptionAck::Completed {
            success: true,
            action,
            was_previously_subscribed,
            user_id: payload.user_id,
            configuration_id: payload.configuration_id,
        }
    }

    pub fn failed(action: &'static str, error: impl Into<String>) -> Self {
        SubscriptionAck::Failed {
            success: false,
            action,
            error: error.into(),
        }
    }
}
