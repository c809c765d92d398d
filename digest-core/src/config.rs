//! Runtime configuration: defaults, then an optional TOML file, then
//! environment variables.

use crate::error::ConfigError;
use crate::filter::Thresholds;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_SUBREDDITS: &[&str] = &[
    "ChatGPT", "OpenAI", "ClaudeAI", "Bard", "GeminiAI", "DeepSeek", "grok",
];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub reddit: RedditSettings,
    pub llm: LlmSettings,
    pub storage: StorageSettings,
    pub filter: FilterSettings,
    pub schedule: ScheduleSettings,
    pub web: WebSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RedditSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_agent: String,
    pub subreddits: Vec<String>,
    pub max_posts_per_subreddit: u32,
}

impl Default for RedditSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            user_agent: "digest-script/0.1".to_string(),
            subreddits: DEFAULT_SUBREDDITS.iter().map(|s| s.to_string()).collect(),
            max_posts_per_subreddit: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4.1-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub root: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: "./digest-data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub min_score: i64,
    pub min_comments: i64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Self {
            min_score: thresholds.min_score,
            min_comments: thresholds.min_comments,
        }
    }
}

impl FilterSettings {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.min_score, self.min_comments)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub timezone: String,
    pub trigger_summarize: bool,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            timezone: "Europe/Berlin".to_string(),
            trigger_summarize: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WebSettings {
    pub host: String,
    pub port: u16,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Credentials needed by the collect stage.
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl DigestConfig {
    /// Loads the optional TOML file and applies process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Applies overrides from `lookup`. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("REDDIT_CLIENT_ID") {
            self.reddit.client_id = Some(v);
        }
        if let Some(v) = var("REDDIT_CLIENT_SECRET") {
            self.reddit.client_secret = Some(v);
        }
        if let Some(v) = var("REDDIT_USER_AGENT") {
            self.reddit.user_agent = v;
        }
        if let Some(v) = var("REDDIT_SUBREDDITS") {
            self.reddit.subreddits = parse_subreddit_list(&v);
        }
        if let Some(v) = var("OPENAI_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = var("OPENAI_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = var("OPENAI_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = var("DIGEST_STORAGE_DIR") {
            self.storage.root = v;
        }
        if let Some(v) = var("MIN_SCORE") {
            self.filter.min_score = parse_value("MIN_SCORE", &v)?;
        }
        if let Some(v) = var("MIN_COMMENTS") {
            self.filter.min_comments = parse_value("MIN_COMMENTS", &v)?;
        }
        if let Some(v) = var("DIGEST_TIMEZONE") {
            self.schedule.timezone = v;
        }
        if let Some(v) = var("TRIGGER_SUMMARIZE") {
            self.schedule.trigger_summarize = parse_value("TRIGGER_SUMMARIZE", &v)?;
        }
        if let Some(v) = var("WEB_HOST") {
            self.web.host = v;
        }
        if let Some(v) = var("WEB_PORT") {
            self.web.port = parse_value("WEB_PORT", &v)?;
        }

        debug!(subreddits = ?self.reddit.subreddits, "Configuration resolved");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reddit.subreddits.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "subreddit list is empty".to_string(),
            });
        }
        if self.storage.root.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "storage.root".to_string(),
            });
        }
        self.timezone()?;
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.schedule
            .timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidValue {
                field: "schedule.timezone".to_string(),
                value: self.schedule.timezone.clone(),
            })
    }

    pub fn reddit_credentials(&self) -> Result<RedditCredentials, ConfigError> {
        let client_id = required(&self.reddit.client_id, "REDDIT_CLIENT_ID")?;
        let client_secret = required(&self.reddit.client_secret, "REDDIT_CLIENT_SECRET")?;
        Ok(RedditCredentials {
            client_id,
            client_secret,
            user_agent: self.reddit.user_agent.clone(),
        })
    }

    pub fn llm_api_key(&self) -> Result<String, ConfigError> {
        required(&self.llm.api_key, "OPENAI_API_KEY")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.web.host, self.web.port)
    }
}

/// Splits a comma separated list, trimming whitespace and stray quotes.
pub fn parse_subreddit_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_matches('"').trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn required(value: &Option<String>, var_name: &str) -> Result<String, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
            var_name: var_name.to_string(),
        })
}

fn parse_value<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DigestConfig::default();
        assert_eq!(config.filter.min_score, 30);
        assert_eq!(config.filter.min_comments, 30);
        assert_eq!(config.reddit.subreddits.len(), 7);
        assert_eq!(config.reddit.user_agent, "digest-script/0.1");
        assert_eq!(config.llm.model, "gpt-4.1-mini");
        assert_eq!(config.timezone().unwrap(), chrono_tz::Europe::Berlin);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = DigestConfig::default();
        config
            .apply_env(env(&[
                ("REDDIT_CLIENT_ID", "id"),
                ("REDDIT_CLIENT_SECRET", "secret"),
                ("REDDIT_SUBREDDITS", " \"ChatGPT\", OpenAI ,,grok"),
                ("MIN_SCORE", "50"),
                ("TRIGGER_SUMMARIZE", "false"),
                ("WEB_PORT", "9000"),
            ]))
            .unwrap();

        assert_eq!(config.reddit.subreddits, vec!["ChatGPT", "OpenAI", "grok"]);
        assert_eq!(config.filter.thresholds(), Thresholds::new(50, 30));
        assert!(!config.schedule.trigger_summarize);
        assert_eq!(config.bind_address(), "0.0.0.0:9000");

        let creds = config.reddit_credentials().unwrap();
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.client_secret, "secret");
    }

    #[test]
    fn test_missing_credentials_fail_fast() {
        let config = DigestConfig::default();
        match config.reddit_credentials() {
            Err(ConfigError::MissingEnvironmentVariable { var_name }) => {
                assert_eq!(var_name, "REDDIT_CLIENT_ID")
            }
            other => panic!("expected missing env var, got {other:?}"),
        }
        assert!(matches!(
            config.llm_api_key(),
            Err(ConfigError::MissingEnvironmentVariable { .. })
        ));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let mut config = DigestConfig::default();
        let result = config.apply_env(env(&[("MIN_COMMENTS", "many")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_empty_subreddit_list_fails_validation() {
        let mut config = DigestConfig::default();
        config.reddit.subreddits.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn test_toml_file_sections() {
        let config = DigestConfig::from_toml(
            r#"
            [reddit]
            subreddits = ["LocalLLaMA"]

            [filter]
            min_comments = 10

            [schedule]
            timezone = "UTC"
            "#,
        )
        .unwrap();

        assert_eq!(config.reddit.subreddits, vec!["LocalLLaMA"]);
        assert_eq!(config.filter.min_comments, 10);
        assert_eq!(config.filter.min_score, 30);
        assert_eq!(config.timezone().unwrap(), chrono_tz::UTC);
    }

    #[test]
    fn test_unknown_timezone() {
        let mut config = DigestConfig::default();
        config.schedule.timezone = "Mars/Olympus".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
