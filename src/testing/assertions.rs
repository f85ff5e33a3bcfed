//! Assertion helpers for authentication outcomes

use super::requests::ProtectedResponse;
use actix_web::http::StatusCode;

/// Assert the uniform rejection: 401 with the `unauthorized` error body
///
/// # Panics
///
/// Panics if the response is anything else.
pub fn assert_unauthorized(response: &ProtectedResponse) {
    assert_eq!(
        response.status,
        StatusCode::UNAUTHORIZED,
        "Expected 401, got {} with body {}",
        response.status,
        response.body
    );
    assert_eq!(response.body["error"], "unauthorized");
}

/// Assert that the protected handler ran for session `id`
///
/// # Panics
///
/// Panics if the request was rejected or bound to a different session.
pub fn assert_authenticated(response: &ProtectedResponse, id: &str) {
    assert_eq!(
        response.status,
        StatusCode::OK,
        "Expected 200, got {} with body {}",
        response.status,
        response.body
    );
    assert_eq!(response.body["id"], id);
}
