//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Locale number format.
    #[serde(default)]
    pub locale: LocaleConfig,
    /// Amount entry behaviour.
    #[serde(default)]
    pub input: InputConfig,
    /// Database synchronization.
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Separators of the application locale.
#[derive(Debug, Clone, Deserialize)]
pub struct LocaleConfig {
    /// Decimal separator.
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: String,
    /// Group (thousands) separator.
    #[serde(default = "default_group_separator")]
    pub group_separator: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            decimal_separator: default_decimal_separator(),
            group_separator: default_group_separator(),
        }
    }
}

fn default_decimal_separator() -> String {
    ".".to_string()
}

fn default_group_separator() -> String {
    ",".to_string()
}

/// Amount entry configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Precision used when no currency applies.
    #[serde(default = "default_precision")]
    pub default_precision: u32,
    /// Truncate entered amounts to the currency scale.
    #[serde(default = "default_round_to_currency")]
    pub round_to_currency: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            default_precision: default_precision(),
            round_to_currency: default_round_to_currency(),
        }
    }
}

fn default_precision() -> u32 {
    2
}

fn default_round_to_currency() -> bool {
    true
}

/// Synchronization configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// JSON file holding the sync preferences.
    #[serde(default = "default_preferences_file")]
    pub preferences_file: PathBuf,
    /// JSON file holding the recent databases list.
    #[serde(default = "default_databases_file")]
    pub databases_file: PathBuf,
    /// Default directory for database files.
    #[serde(default = "default_database_dir")]
    pub database_dir: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            preferences_file: default_preferences_file(),
            databases_file: default_databases_file(),
            database_dir: default_database_dir(),
        }
    }
}

fn default_preferences_file() -> PathBuf {
    PathBuf::from("data/sync_preferences.json")
}

fn default_databases_file() -> PathBuf {
    PathBuf::from("data/recent_databases.json")
}

fn default_database_dir() -> PathBuf {
    PathBuf::from("data")
}

impl AppConfig {
    /// Environment variable prefix, e.g. `MMX__LOCALE__DECIMAL_SEPARATOR`.
    pub const ENV_PREFIX: &'static str = "MMX";

    /// Builds the layered configuration source.
    ///
    /// Sections this struct does not cover (such as `storage`) can be read
    /// from the returned value with [`config::Config::get`].
    ///
    /// # Errors
    ///
    /// Returns an error if a present config file cannot be parsed.
    pub fn source() -> Result<config::Config, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix(Self::ENV_PREFIX).separator("__"))
            .build()
    }

    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::source()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.locale.decimal_separator, ".");
        assert_eq!(config.locale.group_separator, ",");
        assert_eq!(config.input.default_precision, 2);
        assert!(config.input.round_to_currency);
        assert_eq!(config.sync.database_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        temp_env::with_vars_unset(
            [
                "MMX__LOCALE__DECIMAL_SEPARATOR",
                "MMX__INPUT__DEFAULT_PRECISION",
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.locale.decimal_separator, ".");
                assert_eq!(config.input.default_precision, 2);
            },
        );
    }

    #[test]
    fn test_load_reads_environment() {
        temp_env::with_vars(
            [
                ("MMX__LOCALE__DECIMAL_SEPARATOR", Some(",")),
                ("MMX__LOCALE__GROUP_SEPARATOR", Some(".")),
                ("MMX__INPUT__DEFAULT_PRECISION", Some("4")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.locale.decimal_separator, ",");
                assert_eq!(config.locale.group_separator, ".");
                assert_eq!(config.input.default_precision, 4);
            },
        );
    }
}
