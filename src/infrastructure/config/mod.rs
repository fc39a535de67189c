//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::application::errors::ConfigError;
use crate::domain::rules::QualityPolicy;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

/// Whose records `/average` reports on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AverageScopeSetting {
    /// Everyone's records
    #[default]
    Global,
    /// Only the requesting user's records
    Requester,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TrackerConfig {
    /// Reject `/quality` values outside 1..=10
    pub strict_quality_range: bool,
    /// Intervals longer than this get a "did you miss a command" warning
    pub long_sleep_hours: u32,
    pub average_scope: AverageScopeSetting,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            strict_quality_range: true,
            long_sleep_hours: 24,
            average_scope: AverageScopeSetting::Global,
        }
    }
}

impl TrackerConfig {
    pub fn quality_policy(&self) -> QualityPolicy {
        QualityPolicy::from_strict(self.strict_quality_range)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdaptersConfig {
    pub telegram: Option<TelegramConfig>,
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TelegramConfig {
    pub enabled: bool,
    pub token: Option<String>,
    /// Long-poll timeout for getUpdates
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Identity used for everything typed into the console
    pub user_id: i64,
    pub user_name: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            user_id: 1,
            user_name: "console".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "sleep-bot".to_string(),
                prefix: "/".to_string(),
            },
            database: DatabaseConfig {
                path: PathBuf::from("sleep_bot.db"),
            },
            tracker: TrackerConfig::default(),
            adapters: AdaptersConfig {
                telegram: Some(TelegramConfig {
                    enabled: false,
                    token: None,
                    poll_timeout_secs: 30,
                }),
                console: Some(ConsoleConfig::default()),
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.prefix.is_empty() {
            return Err(ConfigError::MissingField("bot.prefix".to_string()));
        }
        if self.tracker.long_sleep_hours == 0 {
            return Err(ConfigError::InvalidValue(
                "tracker.long-sleep-hours must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Telegram token if the adapter is enabled and has one
    pub fn telegram_token(&self) -> Option<String> {
        self.adapters
            .telegram
            .as_ref()
            .filter(|t| t.enabled)
            .and_then(|t| t.token.clone())
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();

        if let Ok(token) = std::env::var("TG_TOKEN").or_else(|_| std::env::var("BOT_TOKEN")) {
            if let Some(ref mut tg) = config.adapters.telegram {
                tg.token = Some(token);
                tg.enabled = true;
            }
        }

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            config.bot.prefix = prefix;
        }

        if let Ok(path) = std::env::var("SLEEP_BOT_DB") {
            config.database.path = PathBuf::from(path);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_yaml() {
        let yaml = Config::default().to_yaml().unwrap();
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.database.path, PathBuf::from("sleep_bot.db"));
        assert!(config.tracker.strict_quality_range);
        assert_eq!(config.tracker.long_sleep_hours, 24);
        assert_eq!(config.telegram_token(), None);
    }

    #[test]
    fn test_tracker_section_is_optional() {
        let yaml = "
bot:
  name: sleep-bot
  prefix: /
database:
  path: /var/lib/sleep-bot/sleep.db
adapters:
  telegram:
    enabled: true
    token: '123:abc'
    poll-timeout-secs: 10
";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.tracker.average_scope, AverageScopeSetting::Global);
        assert_eq!(config.tracker.quality_policy(), QualityPolicy::Strict);
        assert_eq!(config.telegram_token().as_deref(), Some("123:abc"));
        assert!(config.adapters.console.is_none());
    }

    #[test]
    fn test_tracker_overrides() {
        let yaml = "
bot:
  name: sleep-bot
  prefix: /
database:
  path: sleep.db
tracker:
  strict-quality-range: false
  average-scope: requester
adapters: {}
";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.tracker.quality_policy(), QualityPolicy::Unchecked);
        assert_eq!(config.tracker.average_scope, AverageScopeSetting::Requester);
        assert_eq!(config.tracker.long_sleep_hours, 24);
    }

    #[test]
    fn test_zero_long_sleep_threshold_is_rejected() {
        let mut config = Config::default();
        config.tracker.long_sleep_hours = 0;
        let yaml = config.to_yaml().unwrap();
        assert!(matches!(Config::from_yaml(&yaml), Err(ConfigError::InvalidValue(_))));
    }
}
