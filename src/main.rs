#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use keyward::{
    handlers::{health, healthcheck, me},
    healthcheck::ReportOptions,
    oauth::HttpTokenSource,
    session::{ApiKeyAuth, MemorySessionStore, SessionManager},
    settings::KeywardSettings,
};
use std::path::Path;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = KeywardSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e:#}")))?;

    let session_manager = build_session_manager(&settings)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to initialize sessions: {e:#}")))?;

    let report_options = ReportOptions::from_settings(&settings.health)
        .map_err(|e| std::io::Error::other(format!("Failed to initialize health check: {e:#}")))?;

    start_server(settings, session_manager, report_options).await
}

async fn build_session_manager(settings: &KeywardSettings) -> anyhow::Result<SessionManager> {
    let store = match &settings.session.store_seed_path {
        Some(path) => MemorySessionStore::load_json_file(Path::new(path)).await?,
        None => {
            log::warn!("⚠️ No session store seed configured, every API key will be rejected");
            MemorySessionStore::new()
        }
    };

    let mut manager = SessionManager::new(settings.session.auth_config()?, Arc::new(store));
    if let Some(token_source) = HttpTokenSource::from_settings(&settings.oidc).await? {
        manager = manager.with_token_source(Arc::new(token_source));
    }
    Ok(manager)
}

/// Start the server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(
    settings: KeywardSettings,
    session_manager: SessionManager,
    report_options: ReportOptions,
) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings, &session_manager);

    let cors_origins = settings.get_cors_origins();
    let report_options = web::Data::new(report_options);

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "OPTIONS"])
            .allowed_headers(vec!["Content-Type", "Accept"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(report_options.clone())
            .wrap(cors)
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .route("/ping", web::get().to(health))
            .route("/healthcheck", web::get().to(healthcheck))
            .service(
                web::scope("/api")
                    .wrap(ApiKeyAuth::new(session_manager.clone()))
                    .route("/me", web::get().to(me)),
            )
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &KeywardSettings, manager: &SessionManager) {
    println!("Starting Keyward on http://{bind_address}");
    println!("Session cookie: {}", manager.cookie_name());
    println!(
        "OIDC token refresh: {}",
        if manager.oidc_refresh_enabled() { "enabled" } else { "disabled" }
    );
    println!(
        "Sliding refresh: last_used every {} min, expiry extended below {} min",
        settings.session.refresh_interval_minutes, settings.session.expiry_low_water_minutes
    );
    println!();
    println!("Endpoints:");
    println!("  GET  /ping         - Liveness check");
    println!("  GET  /healthcheck  - Relay and access URL reachability report");
    println!("  GET  /api/me       - Authenticated session summary");
}
