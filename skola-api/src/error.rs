use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Anyhow(anyhow::Error),
}

impl ApiError {
    /// Wraps a boxed repository or publisher error as a 500. Boxed trait
    /// objects have no `Into<anyhow::Error>`, so `?` alone cannot do this.
    pub fn internal(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Anyhow(anyhow::anyhow!(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}

/// Rejection for `WithRejection<Json<T>, _>` extractors: any body that fails
/// to parse as the expected shape answers a uniform 400.
#[derive(Debug)]
pub struct BadRequestBody(pub JsonRejection);

impl From<JsonRejection> for BadRequestBody {
    fn from(rejection: JsonRejection) -> Self {
        Self(rejection)
    }
}

impl IntoResponse for BadRequestBody {
    fn into_response(self) -> Response {
        tracing::debug!("Rejected request body: {}", self.0.body_text());
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid input" })),
        )
            .into_response()
    }
}
