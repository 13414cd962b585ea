//! Core configuration and the reserved-name set.
//!
//! # Responsibility
//! - Collect store path, logging settings and forbidden alias names.
//! - Read overrides from `NOTEALIAS_*` environment variables.
//!
//! # Invariants
//! - Reserved-name matching is exact and case-sensitive.
//! - Missing or blank environment values fall back to defaults.

use crate::logging::default_log_level;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "NOTEALIAS_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "NOTEALIAS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "NOTEALIAS_LOG_DIR";
pub const ENV_FORBIDDEN_NAMES: &str = "NOTEALIAS_FORBIDDEN_NAMES";

/// Route segments that would shadow system pages if used as aliases.
pub const DEFAULT_FORBIDDEN_NAMES: &[&str] = &[
    "api", "auth", "login", "logout", "new", "profile", "public", "register", "settings",
];

static NAME_LIST_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s,]+").expect("valid name list separator regex"));

/// Runtime configuration for the identity core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite file backing the store. `None` means callers pick a location.
    pub db_path: Option<PathBuf>,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    /// Names that may never be used as aliases.
    pub forbidden_names: Vec<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            forbidden_names: DEFAULT_FORBIDDEN_NAMES
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }
}

impl CoreConfig {
    /// Builds configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Used by tests to avoid mutating process-wide environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|trimmed| !trimmed.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = value(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = value(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(names) = value(ENV_FORBIDDEN_NAMES) {
            config.forbidden_names = parse_name_list(&names);
        }
        config
    }

    /// Reserved-name set consulted by alias validation.
    pub fn reserved_names(&self) -> ReservedNames {
        ReservedNames::new(self.forbidden_names.iter().cloned())
    }
}

/// Administratively forbidden alias names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservedNames {
    names: BTreeSet<String>,
}

impl ReservedNames {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Splits a comma/whitespace separated list, dropping empty entries.
pub fn parse_name_list(raw: &str) -> Vec<String> {
    NAME_LIST_SEPARATOR_RE
        .split(raw)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
