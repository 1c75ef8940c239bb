mod config;
mod db;
mod errors;
mod models;
mod normalize;
mod routes;
mod search;
mod sources;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::search::listings::PgListingStore;
use crate::search::scoring::{PgProfileStore, VaultMatchScorer};
use crate::search::Aggregator;
use crate::sources::boards::CompanyBoards;
use crate::sources::{build_adapters, build_http_client};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobsearch API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url)?;

    let boards = CompanyBoards::load(config.ats_companies_path.as_deref())?;
    info!("Loaded {} ATS company boards", boards.total());

    let http = build_http_client().context("failed to build HTTP client")?;
    let adapters = build_adapters(&http, &config.credentials, &boards);
    info!("Initialized {} source adapters", adapters.len());

    let scorer = VaultMatchScorer::new(Arc::new(PgProfileStore::new(db.clone())), config.scoring);
    let listings = PgListingStore::new(db);
    let aggregator = Aggregator::new(adapters, Arc::new(scorer), Arc::new(listings));

    let state = AppState {
        aggregator: Arc::new(aggregator),
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
