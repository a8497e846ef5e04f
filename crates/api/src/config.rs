use sceneforge_core::decision::TargetStrategy;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`; generation calls
    /// dominate the budget).
    pub request_timeout_secs: u64,
    /// Generation backend base URL, e.g. `https://api.openai.com/v1`.
    pub genai_base_url: String,
    /// Generation backend API key.
    pub genai_api_key: String,
    /// Model name passed on every completion call.
    pub genai_model: String,
    /// How many recent conversation messages enter the decision prompt.
    pub message_limit: i64,
    /// What an edit without an explicit target resolves to.
    pub target_strategy: TargetStrategy,
    /// Decisions below this confidence are logged; execution proceeds.
    pub confidence_floor: f64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                       |
    /// |--------------------------|-------------------------------|
    /// | `HOST`                   | `0.0.0.0`                     |
    /// | `PORT`                   | `3000`                        |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`       |
    /// | `REQUEST_TIMEOUT_SECS`   | `120`                         |
    /// | `GENAI_BASE_URL`         | `https://api.openai.com/v1`   |
    /// | `GENAI_API_KEY`          | (required)                    |
    /// | `GENAI_MODEL`            | `gpt-4o-mini`                 |
    /// | `MESSAGE_LIMIT`          | `12`                          |
    /// | `TARGET_STRATEGY`        | `most_recent_created`         |
    /// | `ENGINE_CONFIDENCE_FLOOR`| `0.35`                        |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let genai_base_url = std::env::var("GENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".into());

        let genai_api_key = std::env::var("GENAI_API_KEY").expect("GENAI_API_KEY must be set");

        let genai_model =
            std::env::var("GENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

        let message_limit: i64 = std::env::var("MESSAGE_LIMIT")
            .unwrap_or_else(|_| "12".into())
            .parse()
            .expect("MESSAGE_LIMIT must be a valid i64");

        let target_strategy: TargetStrategy = std::env::var("TARGET_STRATEGY")
            .unwrap_or_else(|_| "most_recent_created".into())
            .parse()
            .expect("TARGET_STRATEGY must be one of most_recent_created, most_recent_updated, reject");

        let confidence_floor: f64 = std::env::var("ENGINE_CONFIDENCE_FLOOR")
            .unwrap_or_else(|_| "0.35".into())
            .parse()
            .expect("ENGINE_CONFIDENCE_FLOOR must be a valid f64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            genai_base_url,
            genai_api_key,
            genai_model,
            message_limit,
            target_strategy,
            confidence_floor,
        }
    }
}
