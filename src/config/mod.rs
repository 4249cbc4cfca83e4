// src/config/mod.rs
// All tunables load from the environment (.env supported), with defaults.

use once_cell::sync::Lazy;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    // ── OpenAI Configuration
    pub openai_base_url: String,
    pub chat_model: String,
    pub classifier_model: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub embedding_max_chars: usize,

    // ── Database Configuration
    pub database_url: String,
    pub sqlite_max_connections: u32,

    // ── Retrieval Configuration
    pub retrieval_email_k: usize,
    pub retrieval_contact_k: usize,
    pub email_snippet_chars: usize,
    pub contact_notes_chars: usize,

    // ── Sync Configuration
    pub poll_interval_secs: u64,
    pub poll_window_minutes: i64,

    // ── Chat History
    pub chat_history_limit: usize,

    // ── Server Configuration
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

/// Parse an env var, falling back to `default` when the variable is missing
/// or unparseable. Trailing comments and whitespace in .env values are
/// tolerated.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl AdvisorConfig {
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            eprintln!("Warning: .env file not found. Using environment variables and defaults.");
        }

        Self {
            openai_base_url: env_var_or("OPENAI_BASE_URL", "https://api.openai.com/v1".to_string()),
            chat_model: env_var_or("ADVISOR_CHAT_MODEL", "gpt-4.1".to_string()),
            classifier_model: env_var_or("ADVISOR_CLASSIFIER_MODEL", "gpt-4.1-mini".to_string()),
            embedding_model: env_var_or(
                "ADVISOR_EMBEDDING_MODEL",
                "text-embedding-3-small".to_string(),
            ),
            embedding_dim: env_var_or("ADVISOR_EMBEDDING_DIM", 1536),
            embedding_max_chars: env_var_or("ADVISOR_EMBEDDING_MAX_CHARS", 20000),
            database_url: env_var_or("DATABASE_URL", "sqlite:./advisor.db".to_string()),
            sqlite_max_connections: env_var_or("SQLITE_MAX_CONNECTIONS", 5),
            retrieval_email_k: env_var_or("ADVISOR_RETRIEVAL_EMAIL_K", 5),
            retrieval_contact_k: env_var_or("ADVISOR_RETRIEVAL_CONTACT_K", 5),
            email_snippet_chars: env_var_or("ADVISOR_EMAIL_SNIPPET_CHARS", 500),
            contact_notes_chars: env_var_or("ADVISOR_CONTACT_NOTES_CHARS", 300),
            poll_interval_secs: env_var_or("ADVISOR_POLL_INTERVAL_SECS", 300),
            poll_window_minutes: env_var_or("ADVISOR_POLL_WINDOW_MINUTES", 10),
            chat_history_limit: env_var_or("ADVISOR_CHAT_HISTORY_LIMIT", 30),
            host: env_var_or("ADVISOR_HOST", "0.0.0.0".to_string()),
            port: env_var_or("ADVISOR_PORT", 3001),
            log_level: env_var_or("ADVISOR_LOG_LEVEL", "info".to_string()),
        }
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get full OpenAI API URL for a given endpoint
    pub fn openai_api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.openai_base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<AdvisorConfig> = Lazy::new(AdvisorConfig::from_env);
