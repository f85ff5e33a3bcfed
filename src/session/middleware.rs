//! Request binding of authenticated sessions
//!
//! [`ApiKeyAuth`] wraps a scope or app. Requests that fail authentication are
//! answered directly and never reach the wrapped service; requests that pass
//! carry an [`ApiKey`] in their extensions for the rest of their lifetime.

use crate::models::SessionRecord;
use crate::session::manager::SessionManager;
use crate::utils::responses::ResponseBuilder;
use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, ResponseError};
use std::future::{ready, Future, Ready};
use std::ops::Deref;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

/// The session an API key resolved to, shared read-only with handlers
#[derive(Debug, Clone)]
pub struct ApiKey(pub Arc<SessionRecord>);

impl Deref for ApiKey {
    type Target = SessionRecord;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Session bound to the request by [`ApiKeyAuth`]
///
/// # Panics
///
/// Panics when the request did not pass through [`ApiKeyAuth`]. Calling this
/// on an unprotected route is a wiring bug; use the [`ApiKey`] extractor
/// where a recoverable failure is preferred.
#[must_use]
pub fn api_key(req: &HttpRequest) -> Arc<SessionRecord> {
    match req.extensions().get::<ApiKey>() {
        Some(ApiKey(record)) => Arc::clone(record),
        None => panic!(
            "api_key called on {} without ApiKeyAuth middleware",
            req.path()
        ),
    }
}

impl FromRequest for ApiKey {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let api_key = req.extensions().get::<ApiKey>().cloned();
        ready(api_key.ok_or_else(|| {
            log::error!(
                "ApiKey extractor used on {} without ApiKeyAuth middleware",
                req.path()
            );
            actix_web::error::InternalError::from_response(
                "missing ApiKeyAuth middleware",
                ResponseBuilder::internal_server_error()
                    .with_error_code("missing_session")
                    .build(),
            )
            .into()
        }))
    }
}

/// Middleware factory authenticating the API key cookie of every request
#[derive(Clone)]
pub struct ApiKeyAuth {
    manager: SessionManager,
}

impl ApiKeyAuth {
    #[must_use]
    pub fn new(manager: SessionManager) -> Self {
        Self { manager }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ApiKeyMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyMiddleware {
            service: Rc::new(service),
            manager: self.manager.clone(),
        }))
    }
}

pub struct ApiKeyMiddleware<S> {
    service: Rc<S>,
    manager: SessionManager,
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let manager = self.manager.clone();

        Box::pin(async move {
            let cookie = req.cookie(manager.cookie_name());
            match manager.authenticate(cookie.as_ref().map(|c| c.value())).await {
                Ok(record) => {
                    log::debug!(
                        "Authenticated session {} ({}) for {}",
                        record.id,
                        record.login_type,
                        req.path()
                    );
                    req.extensions_mut().insert(ApiKey(Arc::new(record)));
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(err) => {
                    err.log();
                    let response = err.error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestFixtures, TestSessionBuilder};
    use actix_web::{test as actix_test, web, App, HttpResponse};

    async fn whoami(key: ApiKey) -> HttpResponse {
        HttpResponse::Ok().body(key.id.clone())
    }

    #[actix_web::test]
    async fn test_extractor_without_middleware_is_server_error() {
        let app = actix_test::init_service(App::new().route("/", web::get().to(whoami))).await;
        let req = actix_test::TestRequest::get().uri("/").to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["error"], "missing_session");
    }

    #[test]
    #[should_panic(expected = "without ApiKeyAuth middleware")]
    fn test_accessor_without_middleware_panics() {
        let req = actix_test::TestRequest::get().uri("/unprotected").to_http_request();
        let _ = api_key(&req);
    }

    #[actix_web::test]
    async fn test_extractor_and_accessor_agree() {
        let (id, secret) = TestFixtures::random_api_key_parts();
        let (manager, _store) =
            TestFixtures::session_manager(vec![TestSessionBuilder::new(&id, &secret).build()]).await;

        let app = actix_test::init_service(
            App::new()
                .wrap(ApiKeyAuth::new(manager.clone()))
                .route(
                    "/",
                    web::get().to(|req: HttpRequest, key: ApiKey| async move {
                        assert!(Arc::ptr_eq(&api_key(&req), &key.0));
                        HttpResponse::Ok().body(key.id.clone())
                    }),
                ),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/")
            .cookie(actix_web::cookie::Cookie::new(
                manager.cookie_name().to_string(),
                TestFixtures::cookie_value(&id, &secret),
            ))
            .to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, id.as_bytes());
    }
}
