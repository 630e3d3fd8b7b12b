use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpResponse, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payrun::config::Config;
use payrun::middleware::{OperatorAuth, RequestId};
use payrun::modules::payouts::controllers::payout_controller;
use payrun::modules::reports::controllers::summary_controller;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "payrun=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Configuration validation failed");

    tracing::info!("Starting PayRun Payout Invoice Engine");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .expect("Failed to create database pool");

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let workers = config.server.workers;
    let server_config = config.clone();

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&server_config.app.admin_origin)
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::HeaderName::from_static("x-operator-token"),
                header::HeaderName::from_static("x-request-id"),
            ])
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(server_config.clone()))
            .wrap(OperatorAuth::new(db_pool.clone()))
            .wrap(RequestId)
            .wrap(TracingLogger::default())
            .wrap(cors)
            .route("/health", web::get().to(health_check))
            .route("/", web::get().to(index))
            .service(
                web::scope("/payouts")
                    .route("/generate", web::post().to(payout_controller::generate))
                    .route("", web::get().to(payout_controller::list))
                    .route("/{id}", web::get().to(payout_controller::detail))
                    .route(
                        "/{id}/mark-paid",
                        web::post().to(payout_controller::mark_paid),
                    )
                    .route(
                        "/{id}/process",
                        web::post().to(payout_controller::begin_processing),
                    )
                    .route("/{id}/revert", web::post().to(payout_controller::revert)),
            )
            .route(
                "/reports/payouts/summary",
                web::get().to(summary_controller::payout_summary),
            )
    })
    .workers(workers)
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "payrun"
    }))
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "PayRun Payout Invoice Engine",
        "version": "0.1.0",
        "status": "running"
    }))
}
