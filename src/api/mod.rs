pub mod error;
pub mod handlers;
pub mod projections;
pub mod state;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::PointsConfig;
use crate::store::Store;

use state::AppState;

/// Build the read-only query router over `state`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        // Earnings projections
        .route(
            "/api/total-referral-earnings/{guardian}",
            get(handlers::earnings::total_referral_earnings),
        )
        .route(
            "/api/earning-by-asset/{address}",
            get(handlers::earnings::earning_by_asset),
        )
        .route(
            "/api/earning-by-referrals/{guardian}",
            get(handlers::earnings::earning_by_referrals),
        )
        // Stored documents
        .route("/api/guardians/{address}", get(handlers::accounts::get_guardian))
        .route("/api/pioneers/{address}", get(handlers::accounts::get_pioneer))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(host: &str, port: u16, config: &PointsConfig) -> Result<()> {
    let db_path = config.db_path();
    let store = Store::open(&db_path)
        .with_context(|| format!("opening database at {}", db_path.display()))?;
    let app = router(AppState::new(store, config.fee_factors.clone()));

    let addr = format!("{host}:{port}");
    info!(%addr, db = %db_path.display(), "query API listening");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    axum::serve(listener, app).await.context("running server")?;

    Ok(())
}
