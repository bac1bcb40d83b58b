use axum::http::StatusCode;
use axum::response::{ IntoResponse, Response };
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("upstream completion failed: {0}")]
    Upstream(String),

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("a role with id {0} already exists")]
    DuplicateRole(String),

    #[error("role store error: {0}")]
    Store(#[from] mongodb::error::Error),

    #[error("failed to encode role document: {0}")]
    Serialization(#[from] mongodb::bson::ser::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// Handlers surface every failure as the framework's generic 500; the cause has
// already been logged by the component that raised it.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
