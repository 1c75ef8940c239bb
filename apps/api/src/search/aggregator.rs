//! Search orchestration.
//!
//! Fans a request out to every enabled adapter as its own tokio task, isolates
//! failures per branch, then runs the merged set through the filter pipeline,
//! optional vault scoring, sorting and persistence.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::PageCursor;
use crate::search::filters::{run_pipeline, sort_jobs};
use crate::search::listings::ListingStore;
use crate::search::models::{SearchParams, SearchRequest, SearchResponse, SourceStatus};
use crate::search::scoring::MatchScorer;
use crate::sources::{SourceAdapter, SourceFamily, SourceRequest};

pub struct Aggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    scorer: Arc<dyn MatchScorer>,
    listings: Arc<dyn ListingStore>,
}

impl Aggregator {
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        scorer: Arc<dyn MatchScorer>,
        listings: Arc<dyn ListingStore>,
    ) -> Self {
        Self {
            adapters,
            scorer,
            listings,
        }
    }

    /// Picks the adapters named by `requested`. Entries may be a family
    /// (`company_boards`) or a single adapter key (`lever`). `None` or an empty
    /// list selects everything; unknown names are skipped.
    pub fn resolve_sources(&self, requested: Option<&[String]>) -> Vec<Arc<dyn SourceAdapter>> {
        let requested = match requested {
            Some(names) if !names.is_empty() => names,
            _ => return self.adapters.clone(),
        };

        let mut families = HashSet::new();
        let mut keys = HashSet::new();
        for name in requested {
            let normalized = name.trim().to_lowercase();
            if let Some(family) = SourceFamily::parse(&normalized) {
                families.insert(family);
            } else if self.adapters.iter().any(|a| a.key() == normalized) {
                keys.insert(normalized);
            } else {
                warn!("Ignoring unknown source '{name}'");
            }
        }

        self.adapters
            .iter()
            .filter(|a| families.contains(&a.family()) || keys.contains(a.key()))
            .cloned()
            .collect()
    }

    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, AppError> {
        let started = Instant::now();

        let query = request.query.as_deref().map(str::trim).unwrap_or_default();
        if query.is_empty() {
            return Err(AppError::InvalidQuery(
                "Search query is required".to_string(),
            ));
        }

        let filters = request.filters.clone().unwrap_or_default();
        let cursor = request
            .next_page_token
            .clone()
            .or_else(|| filters.next_page_token.clone());
        let location = request
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        let radius_miles = request.radius_miles.or(filters.radius_miles);

        let adapters = self.resolve_sources(request.sources.as_deref());
        let base = SourceRequest {
            query: query.to_string(),
            location: location.clone(),
            radius_miles,
            filters: filters.clone(),
            page_token: None,
        };

        let tasks = adapters.iter().map(|adapter| {
            let adapter = Arc::clone(adapter);
            let mut source_request = base.clone();
            source_request.page_token = cursor
                .as_ref()
                .filter(|c| c.source == adapter.key())
                .map(|c| c.token.clone());
            tokio::spawn(async move { adapter.search(&source_request).await })
        });
        let outcomes = join_all(tasks).await;

        let mut statuses = BTreeMap::new();
        let mut merged = Vec::new();
        let mut next_page_token = None;
        for (adapter, outcome) in adapters.iter().zip(outcomes) {
            let status = match outcome {
                Ok(Ok(page)) => {
                    if next_page_token.is_none() {
                        next_page_token = page.next_page_token.map(|token| PageCursor {
                            source: adapter.key().to_string(),
                            token,
                        });
                    }
                    let status = SourceStatus::success(page.jobs.len());
                    merged.extend(page.jobs);
                    status
                }
                Ok(Err(e)) => {
                    warn!("Source '{}' failed: {e}", adapter.key());
                    SourceStatus::error(e)
                }
                Err(e) => {
                    error!("Source '{}' task aborted: {e}", adapter.key());
                    SourceStatus::error(e)
                }
            };
            statuses.insert(adapter.key().to_string(), status);
        }
        let fetched = merged.len();

        let (mut jobs, filter_report) =
            run_pipeline(merged, &filters, location.as_deref(), Utc::now());

        if let Some(user_id) = request.user_id.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            jobs = self.scorer.score(jobs, user_id).await;
        }
        sort_jobs(&mut jobs);

        if !jobs.is_empty() {
            if let Err(e) = self.listings.upsert(&jobs).await {
                error!("Failed to persist job listings: {e:#}");
            }
        }

        let execution_time = started.elapsed().as_millis() as u64;
        info!(
            "Search '{}' returned {} jobs ({} fetched from {} sources, {} failed) in {}ms",
            query,
            jobs.len(),
            fetched,
            statuses.len(),
            statuses.values().filter(|s| s.is_error()).count(),
            execution_time
        );

        Ok(SearchResponse {
            total: jobs.len(),
            jobs,
            search_params: SearchParams {
                query: query.to_string(),
                location,
                radius_miles,
                filters,
                sources: adapters.iter().map(|a| a.key().to_string()).collect(),
            },
            sources: statuses,
            execution_time,
            next_page_token,
            filter_report,
        })
    }
}
