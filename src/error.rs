//! Error handling

use std::path::PathBuf;

use axum::response::IntoResponse;
use tracing::info;

use crate::compositor::CompositorError;
use crate::gemini::GenerationError;

/// definitions for the greetings application.
#[derive(Debug)]
pub enum GreetingError {
    /// When you didn't do the right thing
    BadRequest,
    /// Missing or invalid CSRF token
    Unauthorized,
    /// The upload went over the body limit
    PayloadTooLarge,
    /// When a requested resource is not found
    NotFound(String),
    /// A configured font file is missing
    FontNotFound(PathBuf),
    /// The text generation call failed
    Generation(GenerationError),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl std::fmt::Display for GreetingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GreetingError::BadRequest => write!(f, "bad request"),
            GreetingError::Unauthorized => write!(f, "invalid or missing session"),
            GreetingError::PayloadTooLarge => write!(f, "payload too large"),
            GreetingError::NotFound(what) => write!(f, "not found: {what}"),
            GreetingError::FontNotFound(path) => write!(f, "font not found: {}", path.display()),
            GreetingError::Generation(err) => write!(f, "{err}"),
            GreetingError::InternalServerError(message) => {
                write!(f, "internal server error: {message}")
            }
        }
    }
}

impl std::error::Error for GreetingError {}

impl From<GenerationError> for GreetingError {
    fn from(err: GenerationError) -> Self {
        GreetingError::Generation(err)
    }
}

impl From<CompositorError> for GreetingError {
    fn from(err: CompositorError) -> Self {
        match err {
            CompositorError::FontNotFound(path) => GreetingError::FontNotFound(path),
            CompositorError::Decode(err) => {
                info!("Uploaded image could not be decoded: {}", err);
                GreetingError::BadRequest
            }
            other => GreetingError::InternalServerError(other.to_string()),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for GreetingError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        match err.status() {
            axum::http::StatusCode::PAYLOAD_TOO_LARGE => GreetingError::PayloadTooLarge,
            status if status.is_client_error() => {
                info!("Malformed multipart body: {}", err.body_text());
                GreetingError::BadRequest
            }
            _ => GreetingError::InternalServerError(err.body_text()),
        }
    }
}

impl From<std::io::Error> for GreetingError {
    fn from(err: std::io::Error) -> Self {
        GreetingError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for GreetingError {
    fn from(err: axum::http::Error) -> Self {
        GreetingError::InternalServerError(err.to_string())
    }
}

impl From<tower_sessions::session::Error> for GreetingError {
    fn from(err: tower_sessions::session::Error) -> Self {
        GreetingError::InternalServerError(err.to_string())
    }
}

impl IntoResponse for GreetingError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            GreetingError::BadRequest => {
                info!("Bad request received");
                (axum::http::StatusCode::BAD_REQUEST, "Bad Request")
            }
            GreetingError::Unauthorized => {
                info!("Unauthorized request received");
                (
                    axum::http::StatusCode::UNAUTHORIZED,
                    "Unauthorized: invalid or missing session.",
                )
            }
            GreetingError::PayloadTooLarge => {
                info!("Upload over the body limit");
                (
                    axum::http::StatusCode::PAYLOAD_TOO_LARGE,
                    "Upload is too large",
                )
            }
            GreetingError::NotFound(what) => {
                tracing::error!("404 {what}");
                (axum::http::StatusCode::NOT_FOUND, "Not Found")
            }
            GreetingError::FontNotFound(path) => {
                tracing::error!("Font not found: {}", path.display());
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Font resource not found",
                )
            }
            GreetingError::Generation(err) => {
                tracing::error!("Text generation failed: {}", err);
                (
                    axum::http::StatusCode::BAD_GATEWAY,
                    "Greeting generation failed",
                )
            }
            GreetingError::InternalServerError(message) => {
                tracing::error!("Internal server error: {}", message);
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                )
            }
        };
        let mut response = axum::response::Response::new(axum::body::Body::from(body));
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn errors_map_to_statuses() {
        let cases = [
            (GreetingError::BadRequest, StatusCode::BAD_REQUEST),
            (GreetingError::Unauthorized, StatusCode::UNAUTHORIZED),
            (GreetingError::PayloadTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
            (
                GreetingError::NotFound("output".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                GreetingError::Generation(GenerationError::Blocked("SAFETY".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                GreetingError::FontNotFound(PathBuf::from("/nope.ttf")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn missing_font_keeps_its_path() {
        let err = GreetingError::from(CompositorError::FontNotFound(PathBuf::from("/a.ttf")));
        assert_eq!(err.to_string(), "font not found: /a.ttf");
    }
}
