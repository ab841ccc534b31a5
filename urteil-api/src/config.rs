use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde_with::serde_as;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use strum::{Display, EnumString};

use crate::domain::search::{SearchLimits, SearchSettings};

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub search: SearchOptions,
}

#[serde_as]
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    /// Path to the SQLite case database. Opened as-is, never created: a
    /// missing database is a startup error.
    pub path: PathBuf,
    pub max_connections: u32,
    /// SQLite page-cache size (the `cache_size` pragma).
    pub cache_size: i64,
}

impl DatabaseSettings {
    pub fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("cache_size", self.cache_size.to_string())
            .pragma("temp_store", "memory")
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct SearchOptions {
    pub cache_size: usize,
    pub cache_ttl_secs: u64,
    pub snippet_words: i64,
    pub headnote_max_chars: usize,
    pub retrieval_timeout_secs: u64,
    pub min_year: i32,
    pub max_year: i32,
}

impl SearchOptions {
    /// Snapshot the file/env settings into the engine's tunables.
    pub fn engine_settings(&self) -> SearchSettings {
        SearchSettings {
            cache_size: self.cache_size,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            snippet_words: self.snippet_words,
            headnote_max_chars: self.headnote_max_chars,
            retrieval_timeout: Duration::from_secs(self.retrieval_timeout_secs),
            limits: SearchLimits {
                min_year: self.min_year,
                max_year: self.max_year,
                ..SearchLimits::default()
            },
        }
    }
}

pub fn read_config() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let config_directory = base_path.join("config");

    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .expect("Failed to parse APP_ENVIRONMENT");
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")))
        .add_source(config::File::from(
            config_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("URTEIL")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Display, Debug, EnumString)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}
