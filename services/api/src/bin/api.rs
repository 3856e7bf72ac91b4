//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{OpenAiDefinitionAdapter, SqliteKvStore},
    config::Config,
    error::ApiError,
    web::{build_router, rest::ApiDoc, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use book_corner_core::{DefinitionLookup, Library};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open Storage & Run Migrations ---
    info!("Opening database at {}", config.database_url);
    let store = SqliteKvStore::connect(&config.database_url).await?;
    info!("Running database migrations...");
    store.run_migrations().await?;
    info!("Database migrations complete.");

    let library = Library::open(Arc::new(store)).await;
    info!(books = library.books().len(), "Library loaded");

    // --- 3. Initialize the Definition Adapter ---
    let mut openai_config = OpenAIConfig::new();
    match &config.openai_api_key {
        Some(key) => openai_config = openai_config.with_api_key(key),
        None => warn!("OPENAI_API_KEY is not set; word lookups will return the fallback definition"),
    }
    if let Some(base) = &config.openai_api_base {
        openai_config = openai_config.with_api_base(base);
    }
    let definition_adapter = Arc::new(OpenAiDefinitionAdapter::new(
        Client::with_config(openai_config),
        config.definition_model.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = AppState::new(library, DefinitionLookup::new(definition_adapter));

    let origin = config.allowed_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!(
            "Invalid ALLOWED_ORIGIN '{}': {}",
            config.allowed_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    // --- 5. Create the Web Router ---
    let app = Router::new()
        .merge(build_router(app_state))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
