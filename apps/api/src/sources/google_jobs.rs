//! Google Jobs via the SerpApi search proxy.
//!
//! The only paginated source: pages are fetched strictly in order because each
//! token comes from the previous response. A boolean query with several titles fans
//! out into one paged sub-search per title.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::models::{JobResult, RemoteType};
use crate::normalize::{infer_remote_type, parse_salary_text, posted_date_or_now, strip_html};
use crate::search::boolean_query::{parse_boolean_query, BooleanQuery};
use crate::sources::{
    fetch_json, id_string, SourceAdapter, SourceError, SourceFamily, SourcePage, SourceRequest,
};

pub const KEY: &str = "google_jobs";
pub const LABEL: &str = "Google Jobs";

const SERPAPI_URL: &str = "https://serpapi.com/search.json";
const MAX_PAGES: usize = 5;
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);
const OVERALL_BUDGET: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    jobs_results: Vec<GoogleJob>,
    serpapi_pagination: Option<SerpApiPagination>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerpApiPagination {
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleJob {
    #[serde(default)]
    job_id: serde_json::Value,
    title: String,
    company_name: Option<String>,
    location: Option<String>,
    description: Option<String>,
    #[serde(default)]
    detected_extensions: DetectedExtensions,
    #[serde(default)]
    apply_options: Vec<ApplyOption>,
    share_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DetectedExtensions {
    posted_at: Option<String>,
    schedule_type: Option<String>,
    work_from_home: Option<bool>,
    salary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApplyOption {
    link: String,
}

pub struct GoogleJobsAdapter {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

impl GoogleJobsAdapter {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            endpoint: SERPAPI_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_endpoint(client: Client, api_key: &str, endpoint: String) -> Self {
        Self {
            client,
            api_key: Some(api_key.to_string()),
            endpoint,
        }
    }

    /// Fetches up to `MAX_PAGES` pages for one query. Stops early on an empty page,
    /// a missing token, or the overall budget; a failure after the first page keeps
    /// what was already gathered.
    async fn fetch_pages(
        &self,
        api_key: &str,
        query: String,
        request: &SourceRequest,
        start_token: Option<String>,
    ) -> Result<(Vec<JobResult>, Option<String>), SourceError> {
        let started = Instant::now();
        let mut jobs = Vec::new();
        let mut token = start_token;

        for page in 0..MAX_PAGES {
            let elapsed = started.elapsed();
            if elapsed >= OVERALL_BUDGET {
                warn!("Google Jobs budget exhausted after {page} pages for '{query}'");
                break;
            }
            let timeout = PAGE_TIMEOUT.min(OVERALL_BUDGET - elapsed);

            let mut builder = self.client.get(&self.endpoint).query(&[
                ("engine", "google_jobs"),
                ("q", query.as_str()),
                ("hl", "en"),
                ("api_key", api_key),
            ]);
            if let Some(location) = &request.location {
                builder = builder.query(&[("location", location.as_str())]);
            }
            if let Some(km) = request.radius_km() {
                builder = builder.query(&[("lrad", km.to_string())]);
            }
            if let Some(t) = &token {
                builder = builder.query(&[("next_page_token", t.as_str())]);
            }

            let response: SerpApiResponse = match fetch_json(builder, timeout).await {
                Ok(response) => response,
                Err(e) if page > 0 => {
                    warn!("Google Jobs page {} failed for '{query}': {e}", page + 1);
                    break;
                }
                Err(e) => return Err(e),
            };

            if let Some(message) = &response.error {
                debug!("Google Jobs returned no results for '{query}': {message}");
            }

            let now = Utc::now();
            let page_jobs: Vec<JobResult> = response
                .jobs_results
                .into_iter()
                .map(|job| map_job(job, now))
                .collect();
            debug!(
                "Google Jobs page {} for '{query}': {} jobs",
                page + 1,
                page_jobs.len()
            );

            if page_jobs.is_empty() {
                token = None;
                break;
            }
            jobs.extend(page_jobs);

            token = response
                .serpapi_pagination
                .and_then(|p| p.next_page_token)
                .filter(|t| !t.is_empty());
            if token.is_none() {
                break;
            }
        }

        Ok((jobs, token))
    }

    async fn search_titles(
        &self,
        api_key: &str,
        parsed: &BooleanQuery,
        request: &SourceRequest,
    ) -> Result<SourcePage, SourceError> {
        info!(
            "Google Jobs boolean search across {} titles",
            parsed.titles.len()
        );
        let searches = parsed.titles.iter().map(|title| {
            self.fetch_pages(api_key, parsed.compose_query(Some(title)), request, None)
        });
        let results = join_all(searches).await;

        let mut seen = HashSet::new();
        let mut jobs = Vec::new();
        let mut last_error = None;
        let mut succeeded = 0;
        for (title, result) in parsed.titles.iter().zip(results) {
            match result {
                Ok((title_jobs, _)) => {
                    succeeded += 1;
                    jobs.extend(title_jobs.into_iter().filter(|j| seen.insert(j.id.clone())));
                }
                Err(e) => {
                    warn!("Google Jobs sub-search for '{title}' failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        if succeeded == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        jobs.retain(|job| parsed.matches(job));
        Ok(SourcePage::jobs(jobs))
    }
}

#[async_trait]
impl SourceAdapter for GoogleJobsAdapter {
    fn key(&self) -> &'static str {
        KEY
    }

    fn family(&self) -> SourceFamily {
        SourceFamily::GoogleJobs
    }

    async fn search(&self, request: &SourceRequest) -> Result<SourcePage, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingCredentials(KEY))?;

        let parsed = request
            .filters
            .boolean_string
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(parse_boolean_query)
            .filter(|q| !q.is_empty());

        match parsed {
            Some(parsed) if parsed.titles.len() > 1 => {
                self.search_titles(api_key, &parsed, request).await
            }
            Some(parsed) => {
                let composed = parsed.compose_query(parsed.titles.first().map(String::as_str));
                let query = if composed.trim().is_empty() {
                    request.query.clone()
                } else {
                    composed
                };
                let (mut jobs, next) = self
                    .fetch_pages(api_key, query, request, request.page_token.clone())
                    .await?;
                jobs.retain(|job| parsed.matches(job));
                Ok(SourcePage {
                    jobs,
                    next_page_token: next,
                })
            }
            None => {
                let (jobs, next) = self
                    .fetch_pages(
                        api_key,
                        request.query.clone(),
                        request,
                        request.page_token.clone(),
                    )
                    .await?;
                Ok(SourcePage {
                    jobs,
                    next_page_token: next,
                })
            }
        }
    }
}

fn map_job(job: GoogleJob, now: DateTime<Utc>) -> JobResult {
    let extensions = &job.detected_extensions;
    let raw_id = id_string(&job.job_id);
    let id = if raw_id.is_empty() {
        format!(
            "google_{}_{}",
            job.company_name.as_deref().unwrap_or("unknown"),
            job.title
        )
    } else {
        format!("google_{raw_id}")
    };

    let description = job.description.as_deref().map(strip_html);
    let remote_type = if extensions.work_from_home == Some(true) {
        Some(RemoteType::Remote)
    } else {
        infer_remote_type(job.location.as_deref(), description.as_deref())
    };
    let (salary_min, salary_max) = extensions
        .salary
        .as_deref()
        .map(parse_salary_text)
        .unwrap_or((None, None));

    JobResult {
        id,
        title: job.title.trim().to_string(),
        company: job
            .company_name
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        location: job.location.clone(),
        salary_min,
        salary_max,
        description,
        posted_date: posted_date_or_now(extensions.posted_at.as_deref(), now),
        apply_url: job
            .apply_options
            .first()
            .map(|o| o.link.clone())
            .or_else(|| job.share_link.clone()),
        source: LABEL.to_string(),
        remote_type,
        employment_type: extensions.schedule_type.clone(),
        match_score: None,
        required_skills: None,
    }
}
