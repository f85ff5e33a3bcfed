//! HTTP response helpers
//!
//! Authentication failures must be indistinguishable from each other on the
//! wire, so the common error bodies are serialized once and reused verbatim.

use actix_web::{http::header, HttpResponse};
use serde_json::{json, Value};

/// Global instance of pre-serialized common responses
static CACHED_RESPONSES: std::sync::LazyLock<CachedResponses> =
    std::sync::LazyLock::new(CachedResponses::new);

/// Container for pre-serialized common HTTP response bodies
struct CachedResponses {
    unauthorized: String,
    server_error: String,
    service_unavailable: String,
}

impl CachedResponses {
    fn new() -> Self {
        Self {
            unauthorized: Self::create_json(
                "unauthorized",
                "Authentication is required to access this resource",
            ),
            server_error: Self::create_json("server_error", "An internal server error occurred"),
            service_unavailable: Self::create_json(
                "service_unavailable",
                "The service is temporarily unavailable",
            ),
        }
    }

    fn create_json(error: &str, description: &str) -> String {
        json!({
            "error": error,
            "error_description": description
        })
        .to_string()
    }

    fn unauthorized(&self) -> HttpResponse {
        HttpResponse::Unauthorized()
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .body(self.unauthorized.clone())
    }

    fn server_error(&self) -> HttpResponse {
        HttpResponse::InternalServerError()
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .body(self.server_error.clone())
    }

    fn service_unavailable(&self) -> HttpResponse {
        HttpResponse::ServiceUnavailable()
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .body(self.service_unavailable.clone())
    }
}

/// Unified response builder
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Create an `Unauthorized` (401) error response with optional customization
    #[must_use]
    pub fn unauthorized() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::Unauthorized)
    }

    /// Create an `InternalServerError` (500) error response with optional customization
    #[must_use]
    pub fn internal_server_error() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::InternalServerError)
    }

    /// Create a `ServiceUnavailable` (503) error response with optional customization
    #[must_use]
    pub fn service_unavailable() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::ServiceUnavailable)
    }

    /// Create an OK response (200) with JSON content
    #[must_use]
    pub fn ok<T: serde::Serialize>(data: &T) -> HttpResponse {
        HttpResponse::Ok()
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .json(data)
    }
}

/// Builder for error responses with fluent interface
pub struct ErrorResponseBuilder {
    error_type: ErrorType,
    error_code: Option<String>,
}

#[derive(Clone, Copy)]
enum ErrorType {
    Unauthorized,
    InternalServerError,
    ServiceUnavailable,
}

impl ErrorResponseBuilder {
    fn new(error_type: ErrorType) -> Self {
        Self {
            error_type,
            error_code: None,
        }
    }

    /// Set a custom error code
    #[must_use]
    pub fn with_error_code(mut self, code: &str) -> Self {
        self.error_code = Some(code.to_string());
        self
    }

    /// Build the final `HttpResponse`
    #[must_use]
    pub fn build(self) -> HttpResponse {
        let Some(error_code) = self.error_code else {
            return match self.error_type {
                ErrorType::Unauthorized => CACHED_RESPONSES.unauthorized(),
                ErrorType::InternalServerError => CACHED_RESPONSES.server_error(),
                ErrorType::ServiceUnavailable => CACHED_RESPONSES.service_unavailable(),
            };
        };

        let description = match self.error_type {
            ErrorType::Unauthorized => "Authentication is required to access this resource",
            ErrorType::InternalServerError => "An internal server error occurred",
            ErrorType::ServiceUnavailable => "The service is temporarily unavailable",
        };

        let body = json!({
            "error": Value::String(error_code),
            "error_description": Value::String(description.to_string()),
        });

        let mut response = match self.error_type {
            ErrorType::Unauthorized => HttpResponse::Unauthorized(),
            ErrorType::InternalServerError => HttpResponse::InternalServerError(),
            ErrorType::ServiceUnavailable => HttpResponse::ServiceUnavailable(),
        };

        response
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .json(body)
    }
}
