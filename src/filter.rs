// src/filter.rs

use crate::types::UserConfiguration;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Query-string filter for listing a user's configurations. All given
/// criteria must hold.
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationFilter {
    /// Whole-name pattern where `*` matches any run of characters.
    pub name_template: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_until: Option<DateTime<Utc>>,
}

impl ConfigurationFilter {
    pub fn matches(&self, configuration: &UserConfiguration) -> bool {
        if let Some(template) = &self.name_template {
            if !glob_matches(template, &configuration.name) {
                return false;
            }
        }
        if self.created_from.is_some_and(|from| configuration.created_at < from) {
            return false;
        }
        if self.created_until.is_some_and(|until| configuration.created_at > until) {
            return false;
        }
        true
    }
}

/// Anchored wildcard match. Only `*` is special.
pub fn glob_matches(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    let (mut p, mut n) = (0, 0);
    // Position of the last `*` seen and the name index it was tried at.
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, n));
            p += 1;
        } else if p < pattern.len() && pattern[p] == name[n] {
            p += 1;
            n += 1;
        } else if let Some((star, tried)) = backtrack {
            p = star + 1;
            n = tried + 1;
            backtrack = Some((star, tried + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}
