mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use db::{memory::MemoryStore, DBClient, Store};
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

use service::{
    account_service::AccountService, chat_service::ChatService, job_service::JobService,
    payment_service::PaymentService, review_service::ReviewService,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<dyn Store>,
    // Services
    pub job_service: Arc<JobService>,
    pub review_service: Arc<ReviewService>,
    pub chat_service: Arc<ChatService>,
    pub account_service: Arc<AccountService>,
    pub payment_service: Arc<PaymentService>,
}

impl AppState {
    pub fn new(config: Config, db_client: Arc<dyn Store>) -> Self {
        let job_service = Arc::new(JobService::new(db_client.clone()));
        let review_service = Arc::new(ReviewService::new(db_client.clone()));
        let chat_service = Arc::new(ChatService::new(db_client.clone()));
        let account_service = Arc::new(AccountService::new(db_client.clone()));
        let payment_service = Arc::new(PaymentService::new(
            job_service.clone(),
            config.razorpay_key_id.clone(),
            config.razorpay_webhook_secret.clone(),
            config.payment_currency.clone(),
        ));

        Self {
            env: config,
            db_client,
            job_service,
            review_service,
            chat_service,
            account_service,
            payment_service,
        }
    }
}

async fn connect_store(config: &Config) -> Arc<dyn Store> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, using the in-memory demo store. Data is lost on restart");
        return Arc::new(MemoryStore::new());
    };

    let pool = match PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!(
                "Connected to the database (max connections: {})",
                config.db_max_connections
            );
            pool
        }
        Err(err) => {
            tracing::error!("Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let db_client = DBClient::new(pool);
    if let Err(err) = db_client.run_migrations().await {
        tracing::error!("Failed to apply database schema: {}", err);
        std::process::exit(1);
    }

    Arc::new(db_client)
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = Config::init();

    let level = config.log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::DEBUG);
    tracing_subscriber::fmt().with_max_level(level).init();

    let db_client = connect_store(&config).await;

    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let app_state = Arc::new(AppState::new(config.clone(), db_client));

    let app = create_router(app_state).layer(cors);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind port {}: {}", config.port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("Server is running on http://localhost:{}", config.port);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", err);
    }
}
