use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Environment variables overriding the config file, using the
/// double-underscore nested-key convention.
pub const REDIS_ENV: &str = "ConnectionStrings__Redis";
pub const SQL_ENV: &str = "ConnectionStrings__Sql";

#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    #[serde(rename = "ConnectionStrings", default)]
    connection_strings: ConnectionStrings,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConnectionStrings {
    #[serde(rename = "Redis", default)]
    redis: Option<String>,
    #[serde(rename = "Sql", default)]
    sql: Option<String>,
}

/// Resolved connection strings, immutable after startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub redis: Option<String>,
    pub sql: Option<String>,
}

impl Settings {
    /// Loads settings from the optional JSON config file, with environment
    /// variables taking precedence. Never fails: a missing or malformed file
    /// falls back to empty settings.
    pub fn load(path: &Path) -> Self {
        let file = read_file_config(path);
        Self::resolve(
            file.connection_strings,
            env::var(REDIS_ENV).ok(),
            env::var(SQL_ENV).ok(),
        )
    }

    fn resolve(file: ConnectionStrings, redis_env: Option<String>, sql_env: Option<String>) -> Self {
        Self {
            redis: normalize(redis_env.or(file.redis)),
            sql: normalize(sql_env.or(file.sql)),
        }
    }
}

/// Empty strings count as unconfigured.
fn normalize(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn read_file_config(path: &Path) -> FileConfig {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!("Config file {} not read ({}), using defaults", path.display(), e);
            return FileConfig::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring malformed config file {}: {}", path.display(), e);
            FileConfig::default()
        }
    }
}
