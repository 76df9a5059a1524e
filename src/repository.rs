// src/repository.rs
//! SQLite-backed store for users, their text configurations and saved states.
//!
//! Every mutation runs inside one transaction. Change notifications go out on
//! the event channel only after that transaction has committed.

use crate::{
    filter::ConfigurationFilter,
    registry::ConfigurationLookup,
    state::EventSender,
    types::{
        ChangeEvent, ConfigurationPayload, RepositoryEvent, SavedState, Target, TextOptions, User,
        UserConfiguration, UserPayload,
    },
    versioning::{Clock, SystemClock, VersionedConfiguration},
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteConnection, SqlitePool};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("User {0} was not found")]
    UserNotFound(i64),

    #[error("Configuration {configuration_id} of user {user_id} was not found")]
    ConfigurationNotFound { user_id: i64, configuration_id: i64 },

    #[error("Saved state {saved_state_id} of configuration {configuration_id} was not found")]
    SavedStateNotFound {
        configuration_id: i64,
        saved_state_id: i64,
    },

    #[error("Configuration {0} has no last saved state")]
    NoLastSavedState(i64),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RepositoryError::UserNotFound(_)
                | RepositoryError::ConfigurationNotFound { .. }
                | RepositoryError::SavedStateNotFound { .. }
                | RepositoryError::NoLastSavedState(_)
        )
    }
}

pub async fn init_db(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS configurations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            font_name TEXT NOT NULL,
            font_size INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            modified_at INTEGER NOT NULL,
            saved_state_id INTEGER,
            UNIQUE (user_id, name)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS saved_states (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            configuration_id INTEGER NOT NULL REFERENCES configurations(id) ON DELETE CASCADE,
            saved_at INTEGER NOT NULL,
            font_name TEXT NOT NULL,
            font_size INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_saved_states_configuration
            ON saved_states (configuration_id, saved_at)",
    )
    .execute(pool)
    .await?;

    info!("🗃️ [DB] 'users', 'configurations' and 'saved_states' tables are ready.");
    Ok(())
}

// ------------------------------------------------------------------------------
// Row types
// ------------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    name: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow, Clone)]
struct ConfigurationRow {
    id: i64,
    user_id: i64,
    name: String,
    font_name: String,
    font_size: i32,
    created_at: i64,
    modified_at: i64,
    saved_state_id: Option<i64>,
}

impl ConfigurationRow {
    fn options(&self) -> TextOptions {
        TextOptions::new(self.font_name.clone(), self.font_size)
    }
}

impl From<ConfigurationRow> for UserConfiguration {
    fn from(row: ConfigurationRow) -> Self {
        UserConfiguration {
            text_options: row.options(),
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            created_at: from_millis(row.created_at),
            modified_at: from_millis(row.modified_at),
            saved_state_id: row.saved_state_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SavedStateRow {
    id: i64,
    configuration_id: i64,
    saved_at: i64,
    font_name: String,
    font_size: i32,
}

impl From<SavedStateRow> for SavedState {
    fn from(row: SavedStateRow) -> Self {
        SavedState {
            id: row.id,
            configuration_id: row.configuration_id,
            saved_at: from_millis(row.saved_at),
            text_options: TextOptions::new(row.font_name, row.font_size),
        }
    }
}

const CONFIGURATION_COLUMNS: &str =
    "id, user_id, name, font_name, font_size, created_at, modified_at, saved_state_id";
const SAVED_STATE_COLUMNS: &str = "id, configuration_id, saved_at, font_name, font_size";

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn map_sqlx_error(e: sqlx::Error, what: &str) -> RepositoryError {
    let unique = e
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);
    if unique {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

// ------------------------------------------------------------------------------
// Lookups shared by every operation (run on a pooled or transactional connection)
// ------------------------------------------------------------------------------

async fn ensure_user(conn: &mut SqliteConnection, user_id: i64) -> Result<(), RepositoryError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    found.map(|_| ()).ok_or(RepositoryError::UserNotFound(user_id))
}

/// Loads a configuration, telling a missing user apart from a missing configuration.
async fn fetch_configuration(
    conn: &mut SqliteConnection,
    user_id: i64,
    configuration_id: i64,
) -> Result<ConfigurationRow, RepositoryError> {
    let row = sqlx::query_as::<_, ConfigurationRow>(&format!(
        "SELECT {CONFIGURATION_COLUMNS} FROM configurations WHERE user_id = ? AND id = ?"
    ))
    .bind(user_id)
    .bind(configuration_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(row),
        None => {
            ensure_user(conn, user_id).await?;
            Err(RepositoryError::ConfigurationNotFound {
                user_id,
                configuration_id,
            })
        }
    }
}

async fn fetch_saved_state(
    conn: &mut SqliteConnection,
    configuration_id: i64,
    saved_state_id: i64,
) -> Result<SavedStateRow, RepositoryError> {
    sqlx::query_as::<_, SavedStateRow>(&format!(
        "SELECT {SAVED_STATE_COLUMNS} FROM saved_states WHERE id = ? AND configuration_id = ?"
    ))
    .bind(saved_state_id)
    .bind(configuration_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::SavedStateNotFound {
        configuration_id,
        saved_state_id,
    })
}

async fn write_options(
    conn: &mut SqliteConnection,
    configuration_id: i64,
    options: &TextOptions,
    modified_at: i64,
    saved_state_id: Option<i64>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE configurations
            SET font_name = ?, font_size = ?, modified_at = ?, saved_state_id = ?
          WHERE id = ?",
    )
    .bind(&options.font_name)
    .bind(options.font_size)
    .bind(modified_at)
    .bind(saved_state_id)
    .bind(configuration_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_saved_state(
    conn: &mut SqliteConnection,
    configuration_id: i64,
    options: &TextOptions,
    now_ms: i64,
) -> Result<SavedStateRow, RepositoryError> {
    // Snapshot stamps stay strictly increasing per configuration.
    let newest: Option<i64> =
        sqlx::query_scalar("SELECT MAX(saved_at) FROM saved_states WHERE configuration_id = ?")
            .bind(configuration_id)
            .fetch_one(&mut *conn)
            .await?;
    let saved_at = match newest {
        Some(newest) if now_ms <= newest => newest + 1,
        _ => now_ms,
    };

    let id = sqlx::query(
        "INSERT INTO saved_states (configuration_id, saved_at, font_name, font_size) VALUES (?, ?, ?, ?)",
    )
    .bind(configuration_id)
    .bind(saved_at)
    .bind(&options.font_name)
    .bind(options.font_size)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(SavedStateRow {
        id,
        configuration_id,
        saved_at,
        font_name: options.font_name.clone(),
        font_size: options.font_size,
    })
}

// ------------------------------------------------------------------------------
// Repository
// ------------------------------------------------------------------------------

#[derive(Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    events: Option<EventSender>,
}

impl SettingsRepository {
    /// A repository that reports nothing; useful for tooling and tests.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            clock: Arc::new(SystemClock),
            events: None,
        }
    }

    pub fn with_events(pool: SqlitePool, events: EventSender) -> Self {
        Self {
            events: Some(events),
            ..Self::new(pool)
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn now_ms(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    fn emit(&self, event: RepositoryEvent) {
        let Some(events) = &self.events else { return };
        debug!("📣 [REPO] Emitting {:?}", event);
        if events.send(event).is_err() {
            warn!("⚠️ [REPO] Event channel closed. Notification dropped.");
        }
    }

    // ---------------------------------------------------------------- users

    pub async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>("SELECT id, username, name FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn add_user(&self, payload: &UserPayload) -> Result<User, RepositoryError> {
        let id = sqlx::query("INSERT INTO users (username, name) VALUES (?, ?)")
            .bind(&payload.username)
            .bind(&payload.name)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "username"))?
            .last_insert_rowid();

        info!("👤 [REPO] Added user #{} ({})", id, payload.username);
        Ok(User {
            id,
            username: payload.username.clone(),
            name: payload.name.clone(),
        })
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, UserRow>("SELECT id, username, name FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::from)
            .ok_or(RepositoryError::UserNotFound(user_id))
    }

    pub async fn update_user(&self, user_id: i64, payload: &UserPayload) -> Result<User, RepositoryError> {
        let affected = sqlx::query("UPDATE users SET username = ?, name = ? WHERE id = ?")
            .bind(&payload.username)
            .bind(&payload.name)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "username"))?
            .rows_affected();
        if affected == 0 {
            return Err(RepositoryError::UserNotFound(user_id));
        }
        Ok(User {
            id: user_id,
            username: payload.username.clone(),
            name: payload.name.clone(),
        })
    }

    /// Deletes the user together with all of their configurations.
    pub async fn remove_user(&self, user_id: i64) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let user = sqlx::query_as::<_, UserRow>("SELECT id, username, name FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::UserNotFound(user_id))?;

        let configuration_ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM configurations WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("🗑️ [REPO] Removed user #{} with {} configuration(s)", user_id, configuration_ids.len());
        for configuration_id in configuration_ids {
            self.emit(RepositoryEvent::Removed(Target::new(user_id, configuration_id)));
        }
        Ok(user.into())
    }

    // ------------------------------------------------------- configurations

    pub async fn list_configurations(
        &self,
        user_id: i64,
        filter: &ConfigurationFilter,
    ) -> Result<Vec<UserConfiguration>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        ensure_user(&mut conn, user_id).await?;

        let rows = sqlx::query_as::<_, ConfigurationRow>(&format!(
            "SELECT {CONFIGURATION_COLUMNS} FROM configurations WHERE user_id = ? ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(UserConfiguration::from)
            .filter(|c| filter.matches(c))
            .collect())
    }

    pub async fn get_configuration(
        &self,
        user_id: i64,
        configuration_id: i64,
    ) -> Result<UserConfiguration, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Ok(fetch_configuration(&mut conn, user_id, configuration_id).await?.into())
    }

    /// Creates a configuration and records its initial saved state.
    pub async fn create_configuration(
        &self,
        user_id: i64,
        payload: &ConfigurationPayload,
    ) -> Result<UserConfiguration, RepositoryError> {
        let now = self.now_ms();
        let mut tx = self.pool.begin().await?;
        ensure_user(&mut tx, user_id).await?;

        let id = sqlx::query(
            "INSERT INTO configurations (user_id, name, font_name, font_size, created_at, modified_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&payload.configuration_name)
        .bind(&payload.text_options.font_name)
        .bind(payload.text_options.font_size)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(e, "configuration name"))?
        .last_insert_rowid();

        let initial = insert_saved_state(&mut tx, id, &payload.text_options, now).await?;
        write_options(&mut tx, id, &payload.text_options, now, Some(initial.id)).await?;
        let row = fetch_configuration(&mut tx, user_id, id).await?;
        tx.commit().await?;

        info!("📝 [REPO] User #{} created configuration #{} '{}'", user_id, id, row.name);
        Ok(row.into())
    }

    /// Applies new name and options. Notifies only if something actually changed.
    pub async fn update_configuration(
        &self,
        user_id: i64,
        configuration_id: i64,
        payload: &ConfigurationPayload,
    ) -> Result<UserConfiguration, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let row = fetch_configuration(&mut tx, user_id, configuration_id).await?;

        let changed = row.name != payload.configuration_name || row.options() != payload.text_options;
        if !changed {
            tx.rollback().await?;
            return Ok(row.into());
        }

        let now = self.now_ms();
        sqlx::query(
            "UPDATE configurations SET name = ?, font_name = ?, font_size = ?, modified_at = ? WHERE id = ?",
        )
        .bind(&payload.configuration_name)
        .bind(&payload.text_options.font_name)
        .bind(payload.text_options.font_size)
        .bind(now)
        .bind(configuration_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(e, "configuration name"))?;
        tx.commit().await?;

        let updated = UserConfiguration::from(ConfigurationRow {
            name: payload.configuration_name.clone(),
            font_name: payload.text_options.font_name.clone(),
            font_size: payload.text_options.font_size,
            modified_at: now,
            ..row
        });
        self.emit(RepositoryEvent::Changed(ChangeEvent::from_configuration(&updated)));
        Ok(updated)
    }

    pub async fn remove_configuration(
        &self,
        user_id: i64,
        configuration_id: i64,
    ) -> Result<UserConfiguration, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let row = fetch_configuration(&mut tx, user_id, configuration_id).await?;
        sqlx::query("DELETE FROM configurations WHERE id = ?")
            .bind(configuration_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("🗑️ [REPO] Removed configuration #{} of user #{}", configuration_id, user_id);
        self.emit(RepositoryEvent::Removed(Target::new(user_id, configuration_id)));
        Ok(row.into())
    }

    /// Snapshots the live options and points "restore last" at the new snapshot.
    pub async fn save_state(&self, user_id: i64, configuration_id: i64) -> Result<SavedState, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let row = fetch_configuration(&mut tx, user_id, configuration_id).await?;
        let saved = insert_saved_state(&mut tx, configuration_id, &row.options(), self.now_ms()).await?;
        sqlx::query("UPDATE configurations SET saved_state_id = ? WHERE id = ?")
            .bind(saved.id)
            .bind(configuration_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!("💾 [REPO] Saved state #{} for configuration #{}", saved.id, configuration_id);
        Ok(saved.into())
    }

    pub async fn restore_last_saved_state(
        &self,
        user_id: i64,
        configuration_id: i64,
    ) -> Result<UserConfiguration, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let row = fetch_configuration(&mut tx, user_id, configuration_id).await?;
        let pointer = row
            .saved_state_id
            .ok_or(RepositoryError::NoLastSavedState(configuration_id))?;
        let saved = fetch_saved_state(&mut tx, configuration_id, pointer).await?;
        let restored = TextOptions::new(saved.font_name, saved.font_size);

        if restored == row.options() {
            tx.rollback().await?;
            return Ok(row.into());
        }

        let now = self.now_ms();
        write_options(&mut tx, configuration_id, &restored, now, Some(pointer)).await?;
        tx.commit().await?;

        let updated = UserConfiguration::from(ConfigurationRow {
            font_name: restored.font_name,
            font_size: restored.font_size,
            modified_at: now,
            ..row
        });
        self.emit(RepositoryEvent::Changed(ChangeEvent::from_configuration(&updated)));
        Ok(updated)
    }

    /// Restores a specific saved state and makes it the new "last". Always notifies,
    /// even if the values happen to match.
    pub async fn restore_saved_state(
        &self,
        user_id: i64,
        configuration_id: i64,
        saved_state_id: i64,
    ) -> Result<UserConfiguration, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let row = fetch_configuration(&mut tx, user_id, configuration_id).await?;
        let saved = fetch_saved_state(&mut tx, configuration_id, saved_state_id).await?;
        let restored = TextOptions::new(saved.font_name, saved.font_size);

        let now = self.now_ms();
        write_options(&mut tx, configuration_id, &restored, now, Some(saved_state_id)).await?;
        tx.commit().await?;

        let updated = UserConfiguration::from(ConfigurationRow {
            font_name: restored.font_name,
            font_size: restored.font_size,
            modified_at: now,
            saved_state_id: Some(saved_state_id),
            ..row
        });
        self.emit(RepositoryEvent::Changed(ChangeEvent::from_configuration(&updated)));
        Ok(updated)
    }

    // --------------------------------------------------------- saved states

    pub async fn list_saved_states(
        &self,
        user_id: i64,
        configuration_id: i64,
    ) -> Result<Vec<SavedState>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_configuration(&mut conn, user_id, configuration_id).await?;
        let rows = sqlx::query_as::<_, SavedStateRow>(&format!(
            "SELECT {SAVED_STATE_COLUMNS} FROM saved_states WHERE configuration_id = ? ORDER BY saved_at, id"
        ))
        .bind(configuration_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows.into_iter().map(SavedState::from).collect())
    }

    pub async fn get_saved_state(
        &self,
        user_id: i64,
        configuration_id: i64,
        saved_state_id: i64,
    ) -> Result<SavedState, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_configuration(&mut conn, user_id, configuration_id).await?;
        Ok(fetch_saved_state(&mut conn, configuration_id, saved_state_id).await?.into())
    }

    /// Deletes a saved state. If it was the "last" one, the newest remaining
    /// state takes its place (or none, if it was the only one).
    pub async fn remove_saved_state(
        &self,
        user_id: i64,
        configuration_id: i64,
        saved_state_id: i64,
    ) -> Result<SavedState, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let row = fetch_configuration(&mut tx, user_id, configuration_id).await?;
        let saved = fetch_saved_state(&mut tx, configuration_id, saved_state_id).await?;

        sqlx::query("DELETE FROM saved_states WHERE id = ?")
            .bind(saved_state_id)
            .execute(&mut *tx)
            .await?;

        if row.saved_state_id == Some(saved_state_id) {
            let newest: Option<i64> = sqlx::query_scalar(
                "SELECT id FROM saved_states WHERE configuration_id = ? ORDER BY saved_at DESC, id DESC LIMIT 1",
            )
            .bind(configuration_id)
            .fetch_optional(&mut *tx)
            .await?;
            sqlx::query("UPDATE configurations SET saved_state_id = ? WHERE id = ?")
                .bind(newest)
                .bind(configuration_id)
                .execute(&mut *tx)
                .await?;
            debug!(
                "↩️ [REPO] Configuration #{} save pointer moved from #{} to {:?}",
                configuration_id, saved_state_id, newest
            );
        }
        tx.commit().await?;
        Ok(saved.into())
    }

    /// Loads a configuration with its whole saved-state history as a
    /// [`VersionedConfiguration`].
    pub async fn versioned_configuration(
        &self,
        user_id: i64,
        configuration_id: i64,
    ) -> Result<VersionedConfiguration, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let row = fetch_configuration(&mut conn, user_id, configuration_id).await?;
        let states = sqlx::query_as::<_, SavedStateRow>(&format!(
            "SELECT {SAVED_STATE_COLUMNS} FROM saved_states WHERE configuration_id = ? ORDER BY saved_at"
        ))
        .bind(configuration_id)
        .fetch_all(&mut *conn)
        .await?;

        let pointer = row.saved_state_id.and_then(|id| {
            states
                .iter()
                .find(|s| s.id == id)
                .map(|s| from_millis(s.saved_at))
        });
        let history = states
            .into_iter()
            .map(|s| (from_millis(s.saved_at), TextOptions::new(s.font_name, s.font_size)));

        VersionedConfiguration::from_parts(
            row.name.clone(),
            from_millis(row.created_at),
            from_millis(row.modified_at),
            row.options(),
            history,
            pointer,
            self.clock.clone(),
        )
        .map_err(|_| RepositoryError::NoLastSavedState(configuration_id))
    }
}

#[async_trait]
impl ConfigurationLookup for SettingsRepository {
    async fn configuration_exists(&self, user_id: i64, configuration_id: i64) -> Result<bool, RepositoryError> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM configurations WHERE user_id = ? AND id = ?")
                .bind(user_id)
                .bind(configuration_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }
}
