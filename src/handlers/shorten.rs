use crate::{
    error::AppError,
    models::{CreateShortUrlRequest, CreateShortUrlResponse, ShortUrl},
    AppState,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use chrono::{Duration, SecondsFormat, Utc};
use std::sync::Arc;

/// Path segments already claimed by static routes.
const RESERVED_CODES: &[&str] = &["shorturls", "health"];

/// POST /shorturls
///
/// 1. Parse the JSON body and check the URL scheme.
/// 2. Resolve the validity window (configured default when 0 or omitted).
/// 3. Use the custom code if it is free, otherwise derive one from the clock.
/// 4. Store the record with an empty click history and return the short link.
///
/// The body is parsed by hand so a missing `Content-Type` is tolerated and
/// every parse failure maps to the same 400 envelope. Only the first JSON
/// value is read; anything after it is ignored.
pub async fn create_short_url(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<CreateShortUrlResponse>), AppError> {
    let req: CreateShortUrlRequest = serde_json::Deserializer::from_slice(&body)
        .into_iter::<CreateShortUrlRequest>()
        .next()
        .and_then(Result::ok)
        .ok_or_else(|| AppError::InvalidRequest("Invalid request body".into()))?;

    if !req.url.starts_with("http://") && !req.url.starts_with("https://") {
        return Err(AppError::InvalidRequest(
            "URL must start with http:// or https://".into(),
        ));
    }

    let validity = match req.validity {
        0 => state.config.default_validity_minutes,
        minutes => minutes,
    };

    let now = Utc::now();
    let expires_at = Duration::try_minutes(validity)
        .and_then(|window| now.checked_add_signed(window))
        .ok_or_else(|| AppError::InvalidRequest("Validity is out of range".into()))?;

    let custom = req.shortcode.as_deref().filter(|c| !c.is_empty());
    if let Some(code) = custom {
        validate_custom_code(code)?;
        if state.store.exists(code).await {
            return Err(AppError::Conflict);
        }
    }
    let short_code = state.codes.generate(custom, now);

    state
        .store
        .insert(ShortUrl {
            short_code: short_code.clone(),
            original_url: req.url,
            created_at: now,
            expires_at,
            is_active: true,
        })
        .await;

    tracing::debug!("Created short link '{}' expiring at {}", short_code, expires_at);

    Ok((
        StatusCode::CREATED,
        Json(CreateShortUrlResponse {
            short_link: short_link(&state, &headers, &short_code),
            expiry: expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }),
    ))
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// Custom codes are used as given unless they cannot be served as a single
/// path segment or would shadow a static route.
fn validate_custom_code(code: &str) -> Result<(), AppError> {
    if code.contains('/') || code == "." || code == ".." {
        return Err(AppError::InvalidRequest(
            "Shortcode must be a single path segment".into(),
        ));
    }
    if RESERVED_CODES.contains(&code) {
        return Err(AppError::InvalidRequest(format!(
            "Shortcode '{code}' is reserved"
        )));
    }
    Ok(())
}

/// Configured base URL if any, otherwise `http://<Host header>`.
fn short_link(state: &AppState, headers: &HeaderMap, code: &str) -> String {
    if let Some(base) = &state.config.base_url {
        return format!("{base}/{code}");
    }

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("localhost:{}", state.config.port));

    format!("http://{host}/{code}")
}
