use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Every way a request can fail. Each variant is terminal for the request.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Shortcode already in use")]
    Conflict,

    #[error("Short URL not found")]
    NotFound,

    #[error("Short URL has expired")]
    Gone,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Gone => StatusCode::GONE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
