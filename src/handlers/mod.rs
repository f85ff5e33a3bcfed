// HTTP request handlers
pub mod health;
pub mod healthcheck;
pub mod me;

pub use health::health;
pub use healthcheck::healthcheck;
pub use me::me;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ApiKeyAuth, MemorySessionStore, SessionManager};
    use crate::testing::{TestFixtures, TestSessionBuilder};
    use actix_web::http::StatusCode;
    use actix_web::{cookie::Cookie, test, web, App};
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_ping() {
        let app = test::init_service(App::new().route("/ping", web::get().to(health))).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_me_returns_bound_session_without_secret() {
        let store = Arc::new(MemorySessionStore::new());
        let (id, secret) = TestFixtures::random_api_key_parts();
        store.insert(TestSessionBuilder::new(&id, &secret).build()).await;
        let manager = SessionManager::new(TestFixtures::auth_config(), store);

        let app = test::init_service(
            App::new().service(
                web::scope("/api")
                    .wrap(ApiKeyAuth::new(manager.clone()))
                    .route("/me", web::get().to(me)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/me")
            .cookie(Cookie::new(
                manager.cookie_name().to_string(),
                TestFixtures::cookie_value(&id, &secret),
            ))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["id"], id.as_str());
        assert_eq!(body["login_type"], "password");
        assert!(body.get("secret_hash").is_none());
    }
}
