use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "scraper.toml";
pub const DEFAULT_NOTIFY_COMMAND: &str = "signal-cli";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed reading config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed parsing config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Mirrors the deployment's `scraper.ini` sections and keys.
///
/// ```toml
/// [Database]
/// Engine = "sqlite:////project/website.db"
///
/// [Notifications]
/// Sender = "+440000000000"
/// Receiver = "+441111111111"
/// ConfigPath = "/project/signal"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "Database")]
    pub database: DatabaseSettings,
    #[serde(rename = "Notifications")]
    pub notifications: NotificationSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatabaseSettings {
    pub engine: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationSettings {
    pub sender: String,
    pub receiver: String,
    pub config_path: String,
    #[serde(default = "default_command")]
    pub command: String,
}

fn default_command() -> String {
    DEFAULT_NOTIFY_COMMAND.to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        data.parse()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[Database]
Engine = "sqlite:////project/website.db"

[Notifications]
Sender = "+440000000000"
Receiver = "+441111111111"
ConfigPath = "/project/signal"
"#;

    #[test]
    fn test_parse_sample() {
        let config: Config = SAMPLE.parse().unwrap();

        assert_eq!(config.database.engine, "sqlite:////project/website.db");
        assert_eq!(config.notifications.sender, "+440000000000");
        assert_eq!(config.notifications.receiver, "+441111111111");
        assert_eq!(config.notifications.config_path, "/project/signal");
        assert_eq!(config.notifications.command, "signal-cli");
    }

    #[test]
    fn test_command_override() {
        let text = format!("{}Command = \"/usr/local/bin/signal-cli\"\n", SAMPLE);
        let config: Config = text.parse().unwrap();
        assert_eq!(config.notifications.command, "/usr/local/bin/signal-cli");
    }

    #[test]
    fn test_missing_section_is_parse_error() {
        let text = "[Database]\nEngine = \"sqlite:///website.db\"\n";
        assert!(matches!(text.parse::<Config>(), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(Config::load(&path), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraper.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.database.engine, "sqlite:////project/website.db");
    }
}
