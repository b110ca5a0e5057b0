use crate::{error::AppError, models::UrlStats, AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

/// GET /shorturls/:code
///
/// Record and clicks come from a single store snapshot. Expired and inactive
/// links still report their stats.
pub async fn url_stats(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<UrlStats>, AppError> {
    let (link, clicks) = state.store.snapshot(&code).await.ok_or(AppError::NotFound)?;

    Ok(Json(UrlStats {
        original_url: link.original_url,
        created_at: link.created_at,
        expires_at: link.expires_at,
        total_clicks: clicks.len(),
        click_details: clicks,
    }))
}
