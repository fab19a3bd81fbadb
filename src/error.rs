//! Crate-level error and its HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::domain::aggregates::cart::CartError;
use crate::domain::aggregates::product::UnknownVariant;
use crate::domain::image_rules::ImageRuleError;
use crate::domain::specs::UnsupportedVariant;
use crate::domain::value_objects::{QuantityError, SlugError};

/// Every failure a handler can surface. All variants are permanent input or
/// lookup failures except `Db`, which is the storage passthrough.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Image(#[from] ImageRuleError),

    #[error(transparent)]
    UnknownVariant(#[from] UnknownVariant),

    #[error(transparent)]
    UnsupportedVariant(#[from] UnsupportedVariant),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Slug(#[from] SlugError),

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl StoreError {
    fn status(&self) -> StatusCode {
        match self {
            StoreError::Image(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StoreError::UnknownVariant(_)
            | StoreError::UnsupportedVariant(_)
            | StoreError::Slug(_)
            | StoreError::Quantity(_)
            | StoreError::BadRequest(_) => StatusCode::BAD_REQUEST,
            StoreError::Cart(CartError::ItemNotFound) | StoreError::NotFound => {
                StatusCode::NOT_FOUND
            }
            StoreError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            StoreError::from(UnknownVariant("toaster".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(StoreError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            StoreError::from(ImageRuleError::MaxSize {
                len: 4_000_000,
                max_bytes: 3_145_728
            })
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            StoreError::from(CartError::ItemNotFound).status(),
            StatusCode::NOT_FOUND
        );
    }
}
