//! Runtime configuration.
//!
//! Settings come from three layers, later layers winning:
//! built-in defaults, an optional YAML file (`--config`), and CLI flags or
//! environment variables. Credentials are only accepted from the CLI layer.
//!
//! ```yaml
//! output_dir: blog
//! feeds:
//!   - name: arXiv
//!     url: http://export.arxiv.org/rss/cs.AI
//!     limit: 3
//! ranking:
//!   max_sources: 6
//!   min_score: -20.0
//! composer:
//!   model: deepseek-chat
//!   temperature: 0.2
//!   max_tokens: 4000
//!   timeout_secs: 60
//! ```

use crate::cli::Cli;
use crate::ranker::RankingPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "https://api.deepseek.com/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("language model API key is not set (use --api-key or DEEPSEEK_API_KEY)")]
    MissingApiKey,
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// One RSS feed to poll.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FeedConfig {
    /// Used as the `source_name` of every item from this feed.
    pub name: String,
    pub url: String,
    /// Number of leading entries to keep.
    pub limit: usize,
}

/// Query sent to the NewsAPI `everything` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsApiSettings {
    pub endpoint: String,
    pub query: String,
    pub page_size: u32,
    pub language: String,
    /// Articles older than this many days are not requested.
    pub lookback_days: i64,
    /// Number of returned articles kept.
    pub keep: usize,
}

impl Default for NewsApiSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://newsapi.org/v2/everything".to_string(),
            query: "artificial intelligence OR machine learning OR data science".to_string(),
            page_size: 10,
            language: "en".to_string(),
            lookback_days: 2,
            keep: 5,
        }
    }
}

/// Model parameters for one LLM call site.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl ModelSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn summarizer() -> Self {
        Self {
            model: "deepseek-reasoner".to_string(),
            temperature: 0.1,
            max_tokens: 1000,
            timeout_secs: 30,
        }
    }

    fn composer() -> Self {
        Self {
            model: "deepseek-chat".to_string(),
            temperature: 0.2,
            max_tokens: 4000,
            timeout_secs: 60,
        }
    }
}

/// Everything that is not a credential. All fields are optional in YAML.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub api_base_url: String,
    pub topic: String,
    pub tags: Vec<String>,
    pub feeds: Vec<FeedConfig>,
    pub newsapi: NewsApiSettings,
    pub ranking: RankingPolicy,
    pub summarizer: ModelSettings,
    pub composer: ModelSettings,
    /// Timeout for page, feed and NewsAPI fetches.
    pub fetch_timeout_secs: u64,
    /// Article text is cut to this many characters before summarization.
    pub article_char_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("blog"),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            topic: "AI, Machine Learning & Data Science Updates".to_string(),
            tags: [
                "artificial-intelligence",
                "machine-learning",
                "data-science",
                "ai-research",
                "tech-news",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            feeds: vec![
                FeedConfig {
                    name: "arXiv".to_string(),
                    url: "http://export.arxiv.org/rss/cs.AI".to_string(),
                    limit: 3,
                },
                FeedConfig {
                    name: "OpenAI Blog".to_string(),
                    url: "https://openai.com/blog/rss/".to_string(),
                    limit: 2,
                },
            ],
            newsapi: NewsApiSettings::default(),
            ranking: RankingPolicy::default(),
            summarizer: ModelSettings::summarizer(),
            composer: ModelSettings::composer(),
            fetch_timeout_secs: 10,
            article_char_limit: 8000,
        }
    }
}

impl Settings {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Fully resolved configuration handed to every stage.
#[derive(Clone)]
pub struct Config {
    pub settings: Settings,
    pub api_key: String,
    /// NewsAPI is skipped when absent.
    pub newsapi_key: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("settings", &self.settings)
            .field("api_key", &"<redacted>")
            .field("newsapi_key", &self.newsapi_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Config {
    /// Build the configuration from parsed CLI arguments.
    ///
    /// # Errors
    ///
    /// Fails when the config file cannot be read or parsed, or when no
    /// language model API key was provided.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let settings = match &cli.config {
            Some(path) => Settings::load(Path::new(path))?,
            None => Settings::default(),
        };
        Self::resolve(
            settings,
            cli.output_dir.as_deref(),
            cli.api_base_url.as_deref(),
            cli.api_key.as_deref(),
            cli.newsapi_key.as_deref(),
        )
    }

    fn resolve(
        mut settings: Settings,
        output_dir: Option<&str>,
        api_base_url: Option<&str>,
        api_key: Option<&str>,
        newsapi_key: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if let Some(dir) = output_dir {
            settings.output_dir = PathBuf::from(dir);
        }
        if let Some(base) = api_base_url {
            settings.api_base_url = base.to_string();
        }

        let api_key = non_blank(api_key).ok_or(ConfigError::MissingApiKey)?;
        let newsapi_key = non_blank(newsapi_key);

        Ok(Self {
            settings,
            api_key,
            newsapi_key,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let settings = Settings::default();
        assert_eq!(settings.output_dir, PathBuf::from("blog"));
        assert_eq!(settings.feeds.len(), 2);
        assert_eq!(settings.feeds[0].limit, 3);
        assert_eq!(settings.summarizer.model, "deepseek-reasoner");
        assert_eq!(settings.summarizer.timeout(), Duration::from_secs(30));
        assert_eq!(settings.composer.max_tokens, 4000);
        assert_eq!(settings.ranking.max_sources, 6);
        assert_eq!(settings.article_char_limit, 8000);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
output_dir: posts
ranking:
  max_sources: 4
composer:
  model: deepseek-chat
  temperature: 0.5
  max_tokens: 2000
  timeout_secs: 90
"#;
        let settings = Settings::from_yaml_str(yaml).unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("posts"));
        assert_eq!(settings.ranking.max_sources, 4);
        assert_eq!(settings.ranking.min_score, -20.0);
        assert_eq!(settings.composer.timeout_secs, 90);
        assert_eq!(settings.summarizer.model, "deepseek-reasoner");
        assert_eq!(settings.newsapi.keep, 5);
    }

    #[test]
    fn test_example_file_parses() {
        let settings = Settings::from_yaml_str(include_str!("../blog.example.yaml")).unwrap();
        assert_eq!(settings.feeds[1].name, "OpenAI Blog");
        assert_eq!(settings.newsapi.endpoint, "https://newsapi.org/v2/everything");
        assert_eq!(settings.composer.timeout_secs, 60);
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let err = Config::resolve(Settings::default(), None, None, None, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));

        let err = Config::resolve(Settings::default(), None, None, Some("   "), None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_cli_values_override_settings() {
        let config = Config::resolve(
            Settings::default(),
            Some("/tmp/out"),
            Some("http://localhost:8080/v1"),
            Some("sk-test"),
            Some(""),
        )
        .unwrap();

        assert_eq!(config.settings.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.settings.api_base_url, "http://localhost:8080/v1");
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.newsapi_key, None);
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config =
            Config::resolve(Settings::default(), None, None, Some("sk-secret"), Some("news")).unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
