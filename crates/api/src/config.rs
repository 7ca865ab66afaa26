use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development; override via environment variables in production.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// OpenAI API key for text and image generation.
    pub openai_api_key: String,
    /// Root directory for locally stored slide images.
    pub storage_root: String,
    /// Shared secret the billing webhook must present.
    pub billing_webhook_secret: String,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Required | Default         |
    /// |--------------------------|----------|-----------------|
    /// | `HOST`                   | no       | `0.0.0.0`       |
    /// | `PORT`                   | no       | `3000`          |
    /// | `CORS_ORIGINS`           | no       | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`   | no       | `30`            |
    /// | `OPENAI_API_KEY`         | **yes**  | --              |
    /// | `STORAGE_ROOT`           | no       | `./data/images` |
    /// | `BILLING_WEBHOOK_SECRET` | **yes**  | --              |
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing or a numeric variable
    /// does not parse; misconfiguration should fail at startup.
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
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let openai_api_key =
            std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set in the environment");

        let storage_root =
            std::env::var("STORAGE_ROOT").unwrap_or_else(|_| "./data/images".into());

        let billing_webhook_secret = std::env::var("BILLING_WEBHOOK_SECRET")
            .expect("BILLING_WEBHOOK_SECRET must be set in the environment");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            openai_api_key,
            storage_root,
            billing_webhook_secret,
            jwt: JwtConfig::from_env(),
        }
    }
}
