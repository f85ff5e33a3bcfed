//! Drive a route protected by `ApiKeyAuth` end to end

use crate::session::{api_key, ApiKeyAuth, SessionManager};
use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::{test, web, App, HttpRequest, HttpResponse};
use serde_json::{json, Value};

use super::constants::PROTECTED_PATH;

/// Status and JSON body of a response from the protected test route
#[derive(Debug)]
pub struct ProtectedResponse {
    pub status: StatusCode,
    /// `Value::Null` when the body is not JSON
    pub body: Value,
}

/// Handler behind the middleware; echoes the bound session
async fn protected(req: HttpRequest) -> HttpResponse {
    let session = api_key(&req);
    HttpResponse::Ok().json(json!({
        "message": "it worked!",
        "id": session.id,
        "oidc_access_token": session.oidc_access_token,
    }))
}

/// Send one GET to the protected route, presenting `cookie` under the
/// manager's cookie name when given
pub async fn call_protected(manager: &SessionManager, cookie: Option<&str>) -> ProtectedResponse {
    let app = test::init_service(
        App::new().service(
            web::scope("/api")
                .wrap(ApiKeyAuth::new(manager.clone()))
                .route("/protected", web::get().to(protected)),
        ),
    )
    .await;

    let mut req = test::TestRequest::get().uri(PROTECTED_PATH);
    if let Some(value) = cookie {
        req = req.cookie(Cookie::new(
            manager.cookie_name().to_string(),
            value.to_string(),
        ));
    }

    let resp = test::call_service(&app, req.to_request()).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    ProtectedResponse {
        status,
        body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
    }
}
