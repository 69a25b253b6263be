//! Command-line interface definitions.
//!
//! Every option can also be supplied through an environment variable, which
//! is how credentials are normally provided.

use clap::Parser;

/// Generate a cited Markdown blog post from recent AI/ML news.
///
/// # Examples
///
/// ```sh
/// # Defaults: writes into ./blog, DeepSeek key from the environment
/// DEEPSEEK_API_KEY=sk-... ai_research_blog
///
/// # Custom output directory, YAML settings and NewsAPI enabled
/// ai_research_blog -o ./content/blog -c blog.yaml --newsapi-key KEY
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for the generated post (overrides the config file)
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Language model API key
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible chat completion API
    #[arg(long, env = "DEEPSEEK_API_BASE")]
    pub api_base_url: Option<String>,

    /// NewsAPI key; the NewsAPI collector is skipped without it
    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true)]
    pub newsapi_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "ai_research_blog",
            "--output-dir",
            "./posts",
            "--api-key",
            "sk-test",
        ]);

        assert_eq!(cli.output_dir.as_deref(), Some("./posts"));
        assert_eq!(cli.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["ai_research_blog", "-o", "/tmp/blog", "-c", "blog.yaml"]);

        assert_eq!(cli.output_dir.as_deref(), Some("/tmp/blog"));
        assert_eq!(cli.config.as_deref(), Some("blog.yaml"));
    }
}
