use crate::models::HealthResponse;
use actix_web::{HttpResponse, Result};

/// Liveness endpoint
///
/// # Errors
/// This function does not return errors under normal circumstances
pub async fn health() -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "Keyward is running".to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}
