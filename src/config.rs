use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_MODEL: &str = "sonar-medium-online";
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a quiz generator. Read the content the user provides and write exactly ONE multiple-choice question about its key facts.

Format:
<question text ending with a question mark>
A) <option>
B) <option>
C) <option>
D) <option>

Rules:
1. Return only the question and the four lettered options, one per line.
2. Do not number the question and do not prefix it with "Question:".
3. Do not reveal or mark the correct answer.
4. Keep every option on a single line."#;

/// Settings for the chat-completion endpoint. Passed to the requester
/// explicitly; nothing reads it from global state.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub base_url: Url,
    pub model: String,
    pub system_prompt: String,
}

impl CompletionConfig {
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// `{base_url}/chat/completions`, tolerant of a trailing slash on the base.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub completion: CompletionConfig,
    pub script_path: PathBuf,
    pub max_upload_mb: usize,
    pub http_timeout_secs: u64,
}

impl Config {
    /// Upload limit in bytes, clamped instead of overflowing.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let base_url = get_env_or("COMPLETION_BASE_URL", DEFAULT_BASE_URL);
        let base_url = Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("Invalid value for COMPLETION_BASE_URL: {}", e)))?;

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8080"),
            completion: CompletionConfig {
                api_key: env::var("PERPLEXITY_API_KEY")
                    .ok()
                    .filter(|k| !k.trim().is_empty()),
                base_url,
                model: get_env_or("COMPLETION_MODEL", DEFAULT_MODEL),
                system_prompt: get_env_or("COMPLETION_SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
            },
            script_path: PathBuf::from(get_env_or("SCRIPT_PATH", "public/script.txt")),
            max_upload_mb: get_env_parse_or("MAX_UPLOAD_MB", 20)?,
            http_timeout_secs: get_env_parse_or("HTTP_TIMEOUT_SECS", 60)?,
        })
    }
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(api_key: Option<&str>, base: &str) -> CompletionConfig {
        CompletionConfig {
            api_key: api_key.map(str::to_string),
            base_url: Url::parse(base).unwrap(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    #[test]
    fn blank_api_key_disables_completion() {
        assert!(!completion(None, DEFAULT_BASE_URL).is_enabled());
        assert!(!completion(Some("  "), DEFAULT_BASE_URL).is_enabled());
        assert!(completion(Some("pplx-123"), DEFAULT_BASE_URL).is_enabled());
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            completion(None, "https://api.perplexity.ai").endpoint(),
            "https://api.perplexity.ai/chat/completions"
        );
        assert_eq!(
            completion(None, "http://127.0.0.1:9000/v1/").endpoint(),
            "http://127.0.0.1:9000/v1/chat/completions"
        );
    }

    fn config_with_upload_mb(max_upload_mb: usize) -> Config {
        Config {
            server_address: "127.0.0.1:0".to_string(),
            completion: completion(None, DEFAULT_BASE_URL),
            script_path: PathBuf::from("public/script.txt"),
            max_upload_mb,
            http_timeout_secs: 60,
        }
    }

    #[test]
    fn upload_limit_saturates_on_huge_values() {
        assert_eq!(config_with_upload_mb(20).max_upload_bytes(), 20 * 1024 * 1024);
        assert_eq!(config_with_upload_mb(usize::MAX).max_upload_bytes(), usize::MAX);
    }
}
