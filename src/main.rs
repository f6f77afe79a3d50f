use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{get, http::header, web, App, HttpResponse, HttpServer, Responder};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ledger_stats::admin::service::AdminService;
use ledger_stats::auth::AuthSettings;
use ledger_stats::config::AppConfig;
use ledger_stats::stats::models::StatsSettings;
use ledger_stats::{admin, auth, category, openapi, stats, transaction};

/// Health check endpoint that verifies database connectivity
#[get("/health")]
async fn health_check(pool: web::Data<PgPool>) -> impl Responder {
    match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected"
        })),
        Err(_) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "database": "disconnected"
        })),
    }
}

fn io_error<E: std::fmt::Display>(context: &str, e: E) -> std::io::Error {
    error!("{context}: {e}");
    std::io::Error::new(std::io::ErrorKind::Other, format!("{context}: {e}"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    // Initialize tracing subscriber for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| io_error("Invalid configuration", e))?;

    // Configure connection pool with production-ready settings
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(3))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await
        .map_err(|e| io_error("Failed to create pool", e))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| io_error("Failed to run migrations", e))?;

    if let Some(email) = &config.admin_email {
        let promoted = AdminService::promote(&pool, email)
            .await
            .map_err(|e| io_error("Failed to promote administrator", e))?;
        info!(promoted, "Administrator account configured");
    }

    let settings = StatsSettings {
        recent_transactions_limit: config.recent_transactions_limit,
    };
    let auth_settings = AuthSettings {
        admin_email: config.admin_email.clone(),
    };
    let jwt_secret = config.jwt_secret.clone();
    let allowed_origins = config.allowed_origins.clone();

    info!(
        "Starting server at http://{}:{}",
        config.bind_address, config.port
    );

    // Configure rate limiting for auth endpoints
    // ~5 requests per minute with burst of 5
    let auth_governor_config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(5)
        .finish()
        .ok_or_else(|| io_error("Failed to create rate limiter config", "invalid quota"))?;

    HttpServer::new(move || {
        // Clone allowed_origins for this closure invocation
        let allowed_origins = allowed_origins.clone();

        // Configure CORS
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origin_str = origin.to_str().unwrap_or("");
                allowed_origins
                    .split(',')
                    .any(|allowed| allowed.trim() == origin_str)
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            // Middleware (order matters: outer to inner)
            .wrap(TracingLogger::default())
            .wrap(cors)
            // Shared state
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(jwt_secret.clone()))
            .app_data(web::Data::new(settings))
            .app_data(web::Data::new(auth_settings.clone()))
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
            )
            // Health endpoint (no rate limiting)
            .service(health_check)
            // Auth endpoints without rate limiting
            .service(auth::logout)
            .service(auth::me)
            .service(auth::update_profile)
            // Category endpoints (order matters: specific routes before generic {id} routes)
            .service(category::list_categories)
            .service(category::get_category)
            .service(category::create_category)
            .service(category::update_category)
            .service(category::delete_category)
            // Transaction endpoints
            .service(transaction::list_transactions)
            .service(transaction::get_transaction)
            .service(transaction::create_transaction)
            .service(transaction::update_transaction)
            .service(transaction::delete_transaction)
            // Statistics
            .service(stats::get_category_shares)
            .service(stats::get_statistics)
            // Admin
            .service(stats::get_platform_statistics)
            .service(admin::list_users)
            .service(admin::update_user)
            .service(admin::delete_user)
            .service(admin::change_password)
            .service(admin::toggle_user_status)
            // Auth endpoints with rate limiting (must be last to avoid catching all routes)
            .service(
                web::scope("")
                    .wrap(Governor::new(&auth_governor_config))
                    .service(auth::register)
                    .service(auth::login)
                    .service(auth::refresh),
            )
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await
}
