use crate::{error::AppError, models::ClickEvent, AppState};
use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::{net::SocketAddr, sync::Arc};
use woothee::parser::Parser;

/// GET /:code
///
/// 1. Look the code up. Unknown or inactive codes are 404.
/// 2. Codes past their expiry are 410, distinct from never-existing ones.
/// 3. Record the click before answering, so stats read after the redirect
///    already include it.
/// 4. Return a 302 to the original URL.
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    // ── 1. Resolve URL ─────────────────────────────────────────────────────
    let link = state
        .store
        .get(&code)
        .await
        .filter(|link| link.is_active)
        .ok_or(AppError::NotFound)?;

    let now = Utc::now();
    if link.is_expired_at(now) {
        return Err(AppError::Gone);
    }

    // ── 2. Extract request metadata ────────────────────────────────────────
    let user_agent = header_value(&headers, header::USER_AGENT);
    let (browser, os, device_type) = parse_user_agent(&user_agent);

    let click = ClickEvent {
        timestamp: now,
        referrer: header_value(&headers, header::REFERER),
        user_agent,
        ip_address: client_ip(&headers, addr, state.config.trust_proxy_headers),
        browser,
        os,
        device_type,
    };

    // ── 3. Log the click ───────────────────────────────────────────────────
    if !state.store.append_click(&code, click).await {
        tracing::warn!("Click logging: link '{}' vanished before the click was stored", code);
    }

    // ── 4. Redirect ────────────────────────────────────────────────────────
    Ok((StatusCode::FOUND, [(header::LOCATION, link.original_url)]).into_response())
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

/// The peer address without its port. Proxy headers are only consulted when
/// the deployment says they can be trusted.
fn client_ip(headers: &HeaderMap, addr: SocketAddr, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        // X-Forwarded-For can be a comma-separated list; take the first entry.
        if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            if let Some(ip) = xff.split(',').next().map(str::trim) {
                if !ip.is_empty() {
                    return ip.to_owned();
                }
            }
        }

        if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
            if !real_ip.is_empty() {
                return real_ip.to_owned();
            }
        }
    }

    addr.ip().to_string()
}

/// Parse a User-Agent string using woothee and return
/// `(browser_name, os_name, device_category)`, empty when unknown.
fn parse_user_agent(ua: &str) -> (String, String, String) {
    if ua.is_empty() {
        return Default::default();
    }

    let known = |s: &str| {
        if s.is_empty() || s == "UNKNOWN" {
            String::new()
        } else {
            s.to_owned()
        }
    };

    match Parser::new().parse(ua) {
        Some(result) => (known(result.name), known(result.os), known(result.category)),
        None => Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::handlers::test_support::*;
    use crate::models::ShortUrl;
    use crate::store::{LinkStore, MemoryStore};
    use axum::{body::Body, http::Request};
    use serde_json::json;

    const FIREFOX_UA: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/115.0";

    #[tokio::test]
    async fn redirects_to_original_url() {
        let app = app();
        create(&app, json!({"url": "https://example.com/page", "shortcode": "abc123"})).await;

        let reply = get(&app, "/abc123").await;
        assert_eq!(reply.status, StatusCode::FOUND);
        assert_eq!(reply.headers[header::LOCATION], "https://example.com/page");
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let app = app();
        let reply = get(&app, "/doesnotexist").await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.body["error"], "Short URL not found");
    }

    #[tokio::test]
    async fn expired_code_is_gone_but_keeps_stats() {
        let app = app();
        let created =
            create(&app, json!({"url": "https://example.com", "validity": -1, "shortcode": "old"})).await;
        assert_eq!(created.status, StatusCode::CREATED);

        let reply = get(&app, "/old").await;
        assert_eq!(reply.status, StatusCode::GONE);
        assert_eq!(reply.body["error"], "Short URL has expired");

        let stats = get(&app, "/shorturls/old").await;
        assert_eq!(stats.status, StatusCode::OK);
        assert_eq!(stats.body["totalClicks"], 0);
    }

    #[tokio::test]
    async fn inactive_code_is_not_found_but_keeps_stats() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store
            .insert(ShortUrl {
                short_code: "paused".into(),
                original_url: "https://example.com".into(),
                created_at: now,
                expires_at: now + chrono::Duration::minutes(30),
                is_active: false,
            })
            .await;
        let app = app_over(store.clone());

        let reply = get(&app, "/paused").await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.body["error"], "Short URL not found");

        let stats = get(&app, "/shorturls/paused").await;
        assert_eq!(stats.status, StatusCode::OK);
        assert_eq!(stats.body["originalUrl"], "https://example.com");
        assert_eq!(stats.body["totalClicks"], 0);
    }

    #[tokio::test]
    async fn records_request_metadata() {
        let app = app();
        create(&app, json!({"url": "https://example.com", "shortcode": "meta"})).await;

        let req = Request::get("/meta")
            .header("referer", "https://news.example/thread")
            .header("user-agent", FIREFOX_UA)
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, req).await.status, StatusCode::FOUND);

        let stats = get(&app, "/shorturls/meta").await;
        let click = &stats.body["clickDetails"][0];
        assert_eq!(click["referrer"], "https://news.example/thread");
        assert_eq!(click["userAgent"], FIREFOX_UA);
        assert_eq!(click["ipAddress"], "203.0.113.7");
        assert_eq!(click["browser"], "Firefox");
    }

    #[tokio::test]
    async fn missing_headers_record_empty_strings() {
        let app = app();
        create(&app, json!({"url": "https://example.com", "shortcode": "bare"})).await;
        get(&app, "/bare").await;

        let stats = get(&app, "/shorturls/bare").await;
        let click = &stats.body["clickDetails"][0];
        assert_eq!(click["referrer"], "");
        assert_eq!(click["userAgent"], "");
        assert_eq!(click["browser"], "");
    }

    #[tokio::test]
    async fn strips_port_from_ipv6_peer() {
        let app = app();
        create(&app, json!({"url": "https://example.com", "shortcode": "six"})).await;

        let mut req = Request::get("/six").body(Body::empty()).unwrap();
        let addr: SocketAddr = "[2001:db8::1]:443".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        send(&app, req).await;

        let stats = get(&app, "/shorturls/six").await;
        assert_eq!(stats.body["clickDetails"][0]["ipAddress"], "2001:db8::1");
    }

    #[tokio::test]
    async fn proxy_headers_ignored_unless_trusted() {
        let forwarded = || {
            Request::get("/px")
                .header("x-forwarded-for", "198.51.100.4, 10.0.0.1")
                .body(Body::empty())
                .unwrap()
        };

        let untrusted = app();
        create(&untrusted, json!({"url": "https://example.com", "shortcode": "px"})).await;
        send(&untrusted, forwarded()).await;
        let stats = get(&untrusted, "/shorturls/px").await;
        assert_eq!(stats.body["clickDetails"][0]["ipAddress"], "203.0.113.7");

        let trusted = app_with(AppConfig {
            trust_proxy_headers: true,
            ..AppConfig::default()
        });
        create(&trusted, json!({"url": "https://example.com", "shortcode": "px"})).await;
        send(&trusted, forwarded()).await;
        let stats = get(&trusted, "/shorturls/px").await;
        assert_eq!(stats.body["clickDetails"][0]["ipAddress"], "198.51.100.4");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_redirects_each_record_one_click() {
        const N: usize = 64;
        let app = app();
        create(&app, json!({"url": "https://example.com", "shortcode": "busy"})).await;

        let tasks: Vec<_> = (0..N)
            .map(|_| {
                let app = app.clone();
                tokio::spawn(async move { get(&app, "/busy").await.status })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap(), StatusCode::FOUND);
        }

        let stats = get(&app, "/shorturls/busy").await;
        assert_eq!(stats.body["totalClicks"], N);
        assert_eq!(stats.body["clickDetails"].as_array().unwrap().len(), N);
    }

    #[test]
    fn user_agent_parsing_blanks_unknowns() {
        assert_eq!(parse_user_agent(""), Default::default());

        let (browser, os, _) = parse_user_agent(FIREFOX_UA);
        assert_eq!(browser, "Firefox");
        assert!(os.starts_with("Windows"), "os was {os}");
    }
}
