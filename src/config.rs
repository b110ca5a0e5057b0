use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind the HTTP server to, e.g. "0.0.0.0"
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Public base URL used when building short links, e.g. "https://go.example.com".
    /// When unset the link is built from the request's Host header.
    /// Must NOT have a trailing slash.
    pub base_url: Option<String>,

    /// Validity window in minutes applied when a request omits it (or sends 0).
    pub default_validity_minutes: i64,

    /// Salt fed to the short code encoder.
    pub code_salt: String,

    /// Minimum length of generated short codes.
    pub code_min_length: usize,

    /// Prefer X-Forwarded-For / X-Real-IP over the socket address when
    /// recording a click. Only enable behind a trusted reverse proxy.
    pub trust_proxy_headers: bool,
}

impl AppConfig {
    /// Load configuration from environment variables (populated by dotenvy before this is called).
    pub fn from_env() -> Result<Self> {
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse::<u16>()
            .context("PORT must be a valid port number (1–65535)")?;

        let default_validity_minutes = std::env::var("DEFAULT_VALIDITY_MINUTES")
            .unwrap_or_else(|_| "30".into())
            .parse::<i64>()
            .context("DEFAULT_VALIDITY_MINUTES must be an integer")?;

        if default_validity_minutes <= 0 {
            anyhow::bail!("DEFAULT_VALIDITY_MINUTES must be positive");
        }

        let code_min_length = std::env::var("CODE_MIN_LENGTH")
            .unwrap_or_else(|_| "5".into())
            .parse::<usize>()
            .context("CODE_MIN_LENGTH must be a non-negative integer")?;

        let base_url = std::env::var("BASE_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_owned())
            .filter(|url| !url.is_empty());

        let trust_proxy_headers = std::env::var("TRUST_PROXY_HEADERS")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            base_url,
            default_validity_minutes,
            code_salt: std::env::var("CODE_SALT").unwrap_or_else(|_| "url-shortener-salt".into()),
            code_min_length,
            trust_proxy_headers,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            base_url: None,
            default_validity_minutes: 30,
            code_salt: "url-shortener-salt".into(),
            code_min_length: 5,
            trust_proxy_headers: false,
        }
    }
}
