//! Applicant-tracking-system company boards.
//!
//! Each ATS is a `BoardProvider` that knows how to search one company's public
//! board. `BoardAdapter` turns a provider plus its company list into a
//! `SourceAdapter`: one concurrent request per company, each with a short timeout,
//! failures logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, warn};

use crate::models::JobResult;
use crate::sources::{SourceAdapter, SourceError, SourceFamily, SourcePage, SourceRequest};

pub mod ashby;
pub mod companies;
pub mod greenhouse;
pub mod lever;
pub mod recruitee;
pub mod workable;
pub mod workday;

pub use companies::{BoardCompany, CompanyBoards};

/// Per-company request budget.
pub const COMPANY_TIMEOUT: Duration = Duration::from_secs(3);

/// One ATS provider, searched a company at a time.
#[async_trait]
pub trait BoardProvider: Send + Sync {
    fn key(&self) -> &'static str;

    fn label(&self) -> &'static str;

    async fn search_company(
        &self,
        client: &Client,
        company: &BoardCompany,
        query: &str,
    ) -> Result<Vec<JobResult>, SourceError>;
}

pub struct BoardAdapter<P> {
    client: Client,
    provider: P,
    companies: Vec<BoardCompany>,
}

impl<P: BoardProvider> BoardAdapter<P> {
    pub fn new(client: Client, provider: P, companies: Vec<BoardCompany>) -> Self {
        Self {
            client,
            provider,
            companies,
        }
    }
}

#[async_trait]
impl<P: BoardProvider> SourceAdapter for BoardAdapter<P> {
    fn key(&self) -> &'static str {
        self.provider.key()
    }

    fn family(&self) -> SourceFamily {
        SourceFamily::CompanyBoards
    }

    async fn search(&self, request: &SourceRequest) -> Result<SourcePage, SourceError> {
        let tokens = query_tokens(&request.query);
        let searches = self
            .companies
            .iter()
            .map(|company| self.provider.search_company(&self.client, company, &request.query));
        let results = join_all(searches).await;

        let mut jobs = Vec::new();
        let mut failures = 0;
        for (company, result) in self.companies.iter().zip(results) {
            match result {
                Ok(company_jobs) => {
                    let before = company_jobs.len();
                    jobs.extend(
                        company_jobs
                            .into_iter()
                            .filter(|job| matches_all_tokens(job, &tokens)),
                    );
                    debug!(
                        "{} board '{}': {} postings fetched",
                        self.provider.label(),
                        company.slug,
                        before
                    );
                }
                Err(e) => {
                    failures += 1;
                    warn!(
                        "{} board '{}' failed: {e}",
                        self.provider.label(),
                        company.slug
                    );
                }
            }
        }

        if !self.companies.is_empty() && failures == self.companies.len() {
            return Err(SourceError::AllCompaniesFailed(failures));
        }
        Ok(SourcePage::jobs(jobs))
    }
}

/// Lowercased whitespace-separated query words.
pub fn query_tokens(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect()
}

/// AND semantics: every token must occur somewhere in title + description.
pub fn matches_all_tokens(job: &JobResult, tokens: &[String]) -> bool {
    let text = job.search_text();
    tokens.iter().all(|token| text.contains(token.as_str()))
}

pub fn build_board_adapters(client: &Client, boards: &CompanyBoards) -> Vec<Arc<dyn SourceAdapter>> {
    vec![
        Arc::new(BoardAdapter::new(
            client.clone(),
            greenhouse::Greenhouse,
            boards.greenhouse.clone(),
        )),
        Arc::new(BoardAdapter::new(
            client.clone(),
            lever::Lever,
            boards.lever.clone(),
        )),
        Arc::new(BoardAdapter::new(
            client.clone(),
            workday::Workday,
            boards.workday.clone(),
        )),
        Arc::new(BoardAdapter::new(
            client.clone(),
            recruitee::Recruitee,
            boards.recruitee.clone(),
        )),
        Arc::new(BoardAdapter::new(
            client.clone(),
            workable::Workable,
            boards.workable.clone(),
        )),
        Arc::new(BoardAdapter::new(
            client.clone(),
            ashby::Ashby,
            boards.ashby.clone(),
        )),
    ]
}
