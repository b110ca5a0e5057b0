use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shortened link held in the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortUrl {
    pub short_code: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl ShortUrl {
    /// A link stays redirectable up to and including its expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// A single recorded visit to a short link.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub timestamp: DateTime<Utc>,
    pub referrer: String,
    pub user_agent: String,
    pub ip_address: String,
    pub browser: String,
    pub os: String,
    pub device_type: String,
}

/// Body of `POST /shorturls`.
#[derive(Debug, Deserialize)]
pub struct CreateShortUrlRequest {
    pub url: String,
    #[serde(default)]
    pub validity: i64,
    #[serde(default)]
    pub shortcode: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShortUrlResponse {
    pub short_link: String,
    pub expiry: String,
}

/// Body of `GET /shorturls/:code`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlStats {
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub total_clicks: usize,
    pub click_details: Vec<ClickEvent>,
}
