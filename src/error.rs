use thiserror::Error;

/// A record or input failed validation
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid {field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Remote store unavailable: {0}")]
    Remote(String),
}

#[cfg(feature = "api")]
pub use api::AppError;

#[cfg(feature = "api")]
mod api {
    use actix_web::{http::StatusCode, HttpResponse, ResponseError};
    use std::fmt;

    use super::{StoreError, ValidationError};
    use crate::models::ErrorResponse;

    /// Application error types
    #[derive(Debug)]
    pub enum AppError {
        /// Invalid request data
        Validation(ValidationError),
        /// Loading or saving failed
        Store(String),
        /// Required state is missing
        NotFound(String),
    }

    impl fmt::Display for AppError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                AppError::Validation(err) => write!(f, "Validation error: {}", err),
                AppError::Store(msg) => write!(f, "Store error: {}", msg),
                AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            }
        }
    }

    impl std::error::Error for AppError {}

    impl From<ValidationError> for AppError {
        fn from(err: ValidationError) -> Self {
            AppError::Validation(err)
        }
    }

    impl From<StoreError> for AppError {
        fn from(err: StoreError) -> Self {
            AppError::Store(err.to_string())
        }
    }

    impl ResponseError for AppError {
        fn status_code(&self) -> StatusCode {
            match self {
                AppError::Validation(_) => StatusCode::BAD_REQUEST,
                AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AppError::NotFound(_) => StatusCode::NOT_FOUND,
            }
        }

        fn error_response(&self) -> HttpResponse {
            let (error_code, message) = match self {
                AppError::Validation(err) => ("validation_error", err.to_string()),
                AppError::Store(msg) => ("store_error", msg.clone()),
                AppError::NotFound(msg) => ("not_found", msg.clone()),
            };

            HttpResponse::build(self.status_code()).json(ErrorResponse {
                error: error_code.to_string(),
                message,
            })
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("totalBank", "must not be negative");
        assert_eq!(err.to_string(), "Invalid totalBank: must not be negative");
    }

    #[test]
    fn test_store_error_from_json() {
        let err: StoreError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(err.to_string().starts_with("Stored data is not valid JSON"));
    }
}
