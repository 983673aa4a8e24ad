// src/config.rs

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Connection parameters for the certificate database
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_dbname")]
    pub dbname: String,
    #[serde(default = "default_application_name")]
    pub application_name: String,
}

fn default_host() -> String { "crt.sh".to_string() }
fn default_port() -> u16 { 5432 }
fn default_user() -> String { "guest".to_string() }
fn default_dbname() -> String { "certwatch".to_string() }
fn default_application_name() -> String { "certlookup".to_string() }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            dbname: default_dbname(),
            application_name: default_application_name(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_level() }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&contents)?;
        Ok(cfg)
    }

    /// Load from `path` when given, otherwise use the public crt.sh defaults
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_point_at_crt_sh() {
        let config = Config::default();
        assert_eq!(config.database.host, "crt.sh");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.user, "guest");
        assert_eq!(config.database.dbname, "certwatch");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_from_valid_toml() {
        let toml_content = r#"
[database]
host = "db.internal"
port = 6432
user = "reader"
dbname = "ctlogs"

[logging]
level = "debug"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 6432);
        assert_eq!(config.database.user, "reader");
        assert_eq!(config.database.dbname, "ctlogs");
        assert_eq!(config.database.application_name, "certlookup");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_empty_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = Config::from_file(temp_file.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"invalid toml content {{{").unwrap();
        temp_file.flush().unwrap();

        assert!(Config::from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_config_wrong_type() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[database]\nport = \"not a number\"\n")
            .unwrap();
        temp_file.flush().unwrap();

        assert!(Config::from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_without_path() {
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }

    #[test]
    fn test_config_nonexistent_file() {
        let result = Config::load(Some(Path::new("/nonexistent/path/config.toml")));
        assert!(result.is_err());
    }
}
