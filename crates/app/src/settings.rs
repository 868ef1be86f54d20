//! Settings for the command-line front end.
//!
//! Read from an optional `settings.toml` in the working directory, then from
//! `SALESBOOK_*` environment variables (`SALESBOOK_DATABASE__KIND=memory`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_SQLITE_PATH: &str = "./salesbook.db";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite { path: String },
    Url { url: String },
}

impl Default for Database {
    fn default() -> Self {
        Database::Sqlite {
            path: DEFAULT_SQLITE_PATH.to_string(),
        }
    }
}

impl Database {
    /// Connection string understood by `sea_orm::Database::connect`.
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite { path } => format!("sqlite:{path}?mode=rwc"),
            Database::Url { url } => url.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("settings").required(false))
                .add_source(
                    Environment::with_prefix("SALESBOOK")
                        .prefix_separator("_")
                        .separator("__"),
                ),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn from_toml(toml: &str) -> Settings {
        Settings::from_builder(
            Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
        .unwrap()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings = from_toml("");
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.database.url(), "sqlite:./salesbook.db?mode=rwc");
    }

    #[test]
    fn memory_database() {
        let settings = from_toml("[database]\nkind = \"memory\"\n");
        assert_eq!(settings.database, Database::Memory);
        assert_eq!(settings.database.url(), "sqlite::memory:");
    }

    #[test]
    fn explicit_url_and_level() {
        let settings = from_toml(
            "[app]\nlevel = \"debug\"\n[database]\nkind = \"url\"\nurl = \"sqlite:/tmp/x.db\"\n",
        );
        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.database.url(), "sqlite:/tmp/x.db");
    }
}
