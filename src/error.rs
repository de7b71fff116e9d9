use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Failures reported by the cloud document store, already classified for
/// user-facing messaging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("document store request timed out")]
    Timeout,
    #[error("document store denied access")]
    PermissionDenied,
    #[error("document store rejected the credentials")]
    Unauthenticated,
    #[error("document store is unavailable")]
    Unavailable,
    #[error("document not found")]
    NotFound,
    #[error("document store error: {0}")]
    Other(String),
}

impl StoreError {
    pub fn user_message(&self) -> String {
        match self {
            StoreError::Timeout => {
                "Saving took too long. Check your internet connection.".to_string()
            },
            StoreError::PermissionDenied => {
                "Access denied. Check your account settings.".to_string()
            },
            StoreError::Unauthenticated => "You are signed out. Please sign in again.".to_string(),
            StoreError::Unavailable => {
                "The service is unavailable right now. Try again later.".to_string()
            },
            StoreError::NotFound => "No saved preferences were found.".to_string(),
            StoreError::Other(msg) => format!("Something went wrong: {msg}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("catalog request failed: {0}")]
    Http(#[from] wreq::Error),
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("user not authenticated")]
    NotAuthenticated,
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Http(_) => StatusCode::BAD_GATEWAY,
            AppError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Invalid(_) => StatusCode::BAD_REQUEST,
            AppError::Store(err) => match err {
                StoreError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                StoreError::PermissionDenied => StatusCode::FORBIDDEN,
                StoreError::Unauthenticated => StatusCode::UNAUTHORIZED,
                StoreError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
                StoreError::NotFound => StatusCode::NOT_FOUND,
                StoreError::Other(_) => StatusCode::BAD_GATEWAY,
            },
            AppError::Db(_) | AppError::Json(_) | AppError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Store(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_map_to_distinct_statuses() {
        assert_eq!(AppError::Store(StoreError::Timeout).status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(AppError::Store(StoreError::PermissionDenied).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Store(StoreError::Unavailable).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(AppError::NotAuthenticated.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn store_errors_render_user_messages() {
        let msg = AppError::Store(StoreError::Timeout).message();
        assert!(msg.contains("internet connection"));
    }
}
