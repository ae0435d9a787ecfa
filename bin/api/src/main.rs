//! StrDomains API Server — read-only queries over the indexed entities.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use strdomains_core::{Settings, telemetry};
use strdomains_storage::{self as storage, repos};

/// Shared application state.
struct AppState {
    pool: sqlx::PgPool,
}

#[tokio::main]
async fn main() {
    telemetry::init();
    let settings = Settings::from_env().expect("Failed to load settings");

    tracing::info!("Starting StrDomains API Server");

    // Connect to database
    let pool = storage::connect(&settings.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Database ready");

    let state = Arc::new(AppState { pool });

    let app = Router::new()
        .route("/api/v1/tokens", get(list_tokens))
        .route("/api/v1/tokens/:id", get(get_token))
        .route("/api/v1/tokens/:id/transfers", get(get_token_transfers))
        .route("/api/v1/sales/recent", get(get_recent_sales))
        .route("/api/v1/listings", get(list_active_listings))
        .route("/api/v1/listings/:id", get(get_listing))
        .route("/api/v1/splitters/:address", get(get_splitter))
        .route("/health", get(health))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.api_port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind API port");
    axum::serve(listener, app).await.expect("API server failed");
}

// ─── Query Params ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PaginationParams {
    limit: Option<i64>,
}

impl PaginationParams {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 500)
    }
}

// ─── Response Types ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    data: T,
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

fn internal_error(e: sqlx::Error) -> StatusCode {
    tracing::error!(error = %e, "Query failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

// ─── Handlers ───────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn list_tokens(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, StatusCode> {
    let tokens = repos::get_recent_tokens(&state.pool, params.limit())
        .await
        .map_err(internal_error)?;
    Ok(ok(tokens))
}

async fn get_token(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let token = repos::get_token(&state.pool, &id)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(ok(token))
}

async fn get_token_transfers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, StatusCode> {
    let transfers = repos::get_token_transfers(&state.pool, &id, params.limit())
        .await
        .map_err(internal_error)?;
    Ok(ok(transfers))
}

async fn get_recent_sales(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, StatusCode> {
    let sales = repos::get_recent_sales(&state.pool, params.limit())
        .await
        .map_err(internal_error)?;
    Ok(ok(sales))
}

async fn list_active_listings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, StatusCode> {
    let listings = repos::get_active_listings(&state.pool, params.limit())
        .await
        .map_err(internal_error)?;
    Ok(ok(listings))
}

async fn get_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let listing = repos::get_listing(&state.pool, &id)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(ok(listing))
}

async fn get_splitter(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let splitter = repos::get_splitter(&state.pool, &address.to_lowercase())
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(ok(splitter))
}
