use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Translate an I/O failure while resolving `path` into a response-level
    /// error. NotFound and PermissionDenied get their own status codes,
    /// everything else is a 500.
    pub fn from_io(err: io::Error, path: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => AppError::NotFound(path.to_string()),
            io::ErrorKind::PermissionDenied => AppError::Forbidden(path.to_string()),
            _ => AppError::Io(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(path) => (StatusCode::NOT_FOUND, format!("Not found: {}", path)),
            AppError::Forbidden(path) => (StatusCode::FORBIDDEN, format!("Forbidden: {}", path)),
            _ => {
                tracing::error!("Internal error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <title>Error {}</title>
</head>
<body>
    <h1>Error {}</h1>
    <p>{}</p>
    <a href="/">Back to /</a>
</body>
</html>"#,
            status.as_u16(),
            status.as_u16(),
            message
        );

        (status, Html(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = AppError::NotFound("/missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn forbidden_maps_to_403() {
        let response = AppError::Forbidden("/locked".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn io_error_kinds_map_to_statuses() {
        let err = AppError::from_io(io::Error::from(io::ErrorKind::NotFound), "/a");
        assert!(matches!(err, AppError::NotFound(_)));

        let err = AppError::from_io(io::Error::from(io::ErrorKind::PermissionDenied), "/b");
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = AppError::from_io(io::Error::from(io::ErrorKind::BrokenPipe), "/c");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
