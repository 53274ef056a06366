//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mdbook_core::{BookError, ConversionError, MdbookError, ParseError};
use serde_json::json;

/// Error returned by a handler, rendered as `{"error": message}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

fn status_for(error: &MdbookError) -> StatusCode {
    match error {
        MdbookError::Book(error) => match error {
            BookError::NoSuchBook(_) | BookError::NoSuchItem(_) | BookError::NoSuchReference(_) => {
                StatusCode::NOT_FOUND
            }
            BookError::NameInUse(_)
            | BookError::Collision(_)
            | BookError::NotEmpty(_)
            | BookError::TooManyCopies(_) => StatusCode::CONFLICT,
            BookError::InvalidName(_)
            | BookError::WrongKind(_)
            | BookError::InvalidStatus(_)
            | BookError::InvalidReference(_) => StatusCode::BAD_REQUEST,
            BookError::Integrity(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        MdbookError::Parse(ParseError::InvalidPattern(_)) => StatusCode::BAD_REQUEST,
        MdbookError::Conversion(
            ConversionError::UnsupportedFormat(_) | ConversionError::InvalidSettings(_),
        ) => StatusCode::BAD_REQUEST,
        MdbookError::Parse(_) | MdbookError::Conversion(_) | MdbookError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<MdbookError> for ApiError {
    fn from(error: MdbookError) -> Self {
        Self::new(status_for(&error), error.to_string())
    }
}

impl From<BookError> for ApiError {
    fn from(error: BookError) -> Self {
        MdbookError::from(error).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{}", self.message);
        } else {
            tracing::debug!("{}: {}", self.status, self.message);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (BookError::NoSuchItem("x".into()).into(), StatusCode::NOT_FOUND),
            (BookError::NameInUse("x".into()).into(), StatusCode::CONFLICT),
            (BookError::NotEmpty("section".into()).into(), StatusCode::CONFLICT),
            (BookError::InvalidStatus("x".into()).into(), StatusCode::BAD_REQUEST),
            (
                MdbookError::from(ConversionError::UnsupportedFormat("epub".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                MdbookError::from(ConversionError::EncodingFailed("zip".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status, status);
        }
    }
}
