//! API error types
//!
//! Every failure of the scaling operation maps onto one of three stable
//! plain-text responses: a dedicated parse-error message, a not-found
//! message, and the generic failure message. The caller-facing texts
//! never change; diagnostic detail goes to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::cosmos::CosmosError;
use crate::services::scaler::ScaleError;

/// Generic failure, any transport/auth/throttling/internal problem
pub const GENERIC_MESSAGE: &str = "ERROR: The collection's throughput was not changed...";

/// The configured increment did not parse as an integer
pub const PARSE_MESSAGE: &str = "PARSE ERROR: The collection's throughput was not changed...";

/// The referenced collection or offer does not exist
pub const NOT_FOUND_MESSAGE: &str = "NOT FOUND: The collection's throughput was not changed...";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Throughput increment '{0}' is not an integer")]
    InvalidIncrement(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cosmos DB error: {0}")]
    Upstream(#[from] CosmosError),
}

impl From<ScaleError> for ApiError {
    fn from(err: ScaleError) -> Self {
        match err {
            ScaleError::InvalidIncrement(raw) => ApiError::InvalidIncrement(raw),
            ScaleError::CollectionNotFound { .. } | ScaleError::OfferNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            ScaleError::Cosmos(err) => ApiError::Upstream(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::InvalidIncrement(raw) => {
                tracing::warn!(
                    increment = %raw,
                    "Throughput increment did not parse as an integer"
                );
                (StatusCode::BAD_REQUEST, PARSE_MESSAGE)
            }
            ApiError::NotFound(detail) => {
                tracing::warn!(detail = %detail, "Referenced resource does not exist");
                (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
            }
            ApiError::Upstream(err) => {
                tracing::error!(error = %err, "Cosmos DB control-plane call failed");
                (StatusCode::BAD_REQUEST, GENERIC_MESSAGE)
            }
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_parse_error_response() {
        let response = ApiError::InvalidIncrement("abc".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, PARSE_MESSAGE);
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let response = ApiError::NotFound("Items".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn test_upstream_error_is_generic() {
        let response = ApiError::Upstream(CosmosError::Throttled).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, GENERIC_MESSAGE);
    }

    #[test]
    fn test_scale_error_mapping() {
        assert!(matches!(
            ApiError::from(ScaleError::InvalidIncrement("x".to_string())),
            ApiError::InvalidIncrement(_)
        ));
        assert!(matches!(
            ApiError::from(ScaleError::OfferNotFound("Items".to_string())),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(ScaleError::CollectionNotFound {
                database: "ToDoList".to_string(),
                container: "Items".to_string()
            }),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(ScaleError::Cosmos(CosmosError::Unauthorized)),
            ApiError::Upstream(_)
        ));
    }
}
