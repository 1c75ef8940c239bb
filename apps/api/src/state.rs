use std::sync::Arc;

use crate::search::Aggregator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the source adapters, the vault scorer and the listings store.
    pub aggregator: Arc<Aggregator>,
}
