use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::aggregates::{CartError, OrderError, ProductError};
use crate::domain::value_objects::{MoneyError, QuantityError, SizeError};
use crate::media::MediaError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Sign in required")]
    Unauthenticated,

    #[error("Admin access required")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Media error: {0}")]
    Media(MediaError),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(_) | Self::Media(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CartError> for AppError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::LineNotFound => Self::NotFound("Cart line"),
            CartError::ProductNotFound => Self::NotFound("Product"),
            CartError::Empty | CartError::Quantity(_) => Self::InvalidInput(e.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Cart(e) => e.into(),
            other => Self::Store(other),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound => Self::NotFound("Order"),
            OrderError::InvalidTransition { .. } | OrderError::MissingShipping => Self::Conflict(e.to_string()),
            _ => Self::InvalidInput(e.to_string()),
        }
    }
}

impl From<ProductError> for AppError {
    fn from(e: ProductError) -> Self { Self::InvalidInput(e.to_string()) }
}

impl From<QuantityError> for AppError {
    fn from(e: QuantityError) -> Self { Self::InvalidInput(e.to_string()) }
}

impl From<SizeError> for AppError {
    fn from(e: SizeError) -> Self { Self::InvalidInput(e.to_string()) }
}

impl From<MoneyError> for AppError {
    fn from(e: MoneyError) -> Self { Self::InvalidInput(e.to_string()) }
}

impl From<MediaError> for AppError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::NotAnImage(_) | MediaError::Empty => Self::InvalidInput(e.to_string()),
            MediaError::Io(_) => Self::Media(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::OrderStatus;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::from(CartError::LineNotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::from(QuantityError::BelowOne(0)).status(), StatusCode::BAD_REQUEST);
        let transition = OrderError::InvalidTransition { from: OrderStatus::Paid, to: OrderStatus::Cancelled };
        assert_eq!(AppError::from(transition).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::from(MediaError::Empty).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        let overflow = StoreError::Cart(CartError::Quantity(QuantityError::TooLarge(4_294_967_300)));
        assert_eq!(AppError::from(overflow).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(StoreError::Corrupt("x".into())).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
