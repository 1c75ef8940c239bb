//! Source adapters: one per external job provider.
//!
//! Every adapter maps its provider's native shape into `JobResult` and reports
//! failures as `SourceError`. The aggregator isolates those errors per branch, so
//! an adapter never has to worry about taking the whole search down.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::config::SourceCredentials;
use crate::models::{JobResult, SearchFilters};
use crate::normalize::truncate_chars;

pub mod adzuna;
pub mod boards;
pub mod google_jobs;
pub mod jsearch;
pub mod usajobs;

use boards::CompanyBoards;

const MILES_TO_KM: f64 = 1.609_344;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("missing credentials for {0}")]
    MissingCredentials(&'static str),

    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid board entry: {0}")]
    InvalidBoardEntry(String),

    #[error("all {0} company boards failed")]
    AllCompaniesFailed(usize),
}

impl SourceError {
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(timeout)
        } else {
            SourceError::Http(err)
        }
    }
}

/// Groups of adapters a caller can switch on by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFamily {
    GoogleJobs,
    Usajobs,
    Adzuna,
    Jsearch,
    CompanyBoards,
}

impl SourceFamily {
    pub const ALL: [SourceFamily; 5] = [
        SourceFamily::GoogleJobs,
        SourceFamily::Usajobs,
        SourceFamily::Adzuna,
        SourceFamily::Jsearch,
        SourceFamily::CompanyBoards,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFamily::GoogleJobs => "google_jobs",
            SourceFamily::Usajobs => "usajobs",
            SourceFamily::Adzuna => "adzuna",
            SourceFamily::Jsearch => "jsearch",
            SourceFamily::CompanyBoards => "company_boards",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        match name.as_str() {
            "google_jobs" | "google" | "googlejobs" => Some(SourceFamily::GoogleJobs),
            "usajobs" => Some(SourceFamily::Usajobs),
            "adzuna" => Some(SourceFamily::Adzuna),
            "jsearch" => Some(SourceFamily::Jsearch),
            "company_boards" | "ats" => Some(SourceFamily::CompanyBoards),
            _ => None,
        }
    }
}

/// What one adapter is asked for. `page_token` is only set for the adapter the
/// incoming cursor names.
#[derive(Debug, Clone, Default)]
pub struct SourceRequest {
    pub query: String,
    pub location: Option<String>,
    pub radius_miles: Option<f64>,
    pub filters: SearchFilters,
    pub page_token: Option<String>,
}

impl SourceRequest {
    pub fn radius_km(&self) -> Option<u32> {
        self.radius_miles
            .filter(|r| *r > 0.0)
            .map(|r| (r * MILES_TO_KM).round() as u32)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourcePage {
    pub jobs: Vec<JobResult>,
    pub next_page_token: Option<String>,
}

impl SourcePage {
    pub fn jobs(jobs: Vec<JobResult>) -> Self {
        Self {
            jobs,
            next_page_token: None,
        }
    }
}

/// A job provider. Implementations must be cheap to share across tasks.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable key used in the `sources` request list and response map.
    fn key(&self) -> &'static str;

    fn family(&self) -> SourceFamily;

    async fn search(&self, request: &SourceRequest) -> Result<SourcePage, SourceError>;
}

/// Sends `request` with a per-request timeout and decodes a 2xx JSON body.
pub async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
    timeout: Duration,
) -> Result<T, SourceError> {
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| SourceError::from_reqwest(e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::Status {
            status: status.as_u16(),
            body: truncate_chars(&body, 200),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| SourceError::from_reqwest(e, timeout))?;
    Ok(serde_json::from_str(&body)?)
}

/// Renders a provider id that may arrive as a JSON number or string.
pub fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Reads a salary figure that providers send as either a number or a numeric string.
pub fn number_value(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

/// Shared outbound client. Timeouts are set per request by each adapter.
pub fn build_http_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!("jobsearch/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Builds every adapter, handing each its own credentials.
pub fn build_adapters(
    client: &Client,
    credentials: &SourceCredentials,
    boards: &CompanyBoards,
) -> Vec<Arc<dyn SourceAdapter>> {
    let mut adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(google_jobs::GoogleJobsAdapter::new(
            client.clone(),
            credentials.serpapi_api_key.clone(),
        )),
        Arc::new(usajobs::UsaJobsAdapter::new(
            client.clone(),
            credentials.usajobs_api_key.clone(),
            credentials.usajobs_user_agent.clone(),
        )),
        Arc::new(adzuna::AdzunaAdapter::new(
            client.clone(),
            credentials.adzuna_app_id.clone(),
            credentials.adzuna_app_key.clone(),
        )),
        Arc::new(jsearch::JSearchAdapter::new(
            client.clone(),
            credentials.rapidapi_key.clone(),
        )),
    ];
    adapters.extend(boards::build_board_adapters(client, boards));
    adapters
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_family_names_round_trip() {
        for family in SourceFamily::ALL {
            assert_eq!(SourceFamily::parse(family.as_str()), Some(family));
        }
        assert_eq!(SourceFamily::parse("ATS"), Some(SourceFamily::CompanyBoards));
        assert_eq!(SourceFamily::parse("monster"), None);
    }

    #[test]
    fn test_radius_converted_to_km() {
        let request = SourceRequest {
            radius_miles: Some(25.0),
            ..Default::default()
        };
        assert_eq!(request.radius_km(), Some(40));
        let none = SourceRequest {
            radius_miles: Some(0.0),
            ..Default::default()
        };
        assert_eq!(none.radius_km(), None);
    }

    #[test]
    fn test_id_and_number_values() {
        assert_eq!(id_string(&json!(4012345)), "4012345");
        assert_eq!(id_string(&json!("abc")), "abc");
        assert_eq!(number_value(Some(&json!("85,000.00"))), Some(85_000.0));
        assert_eq!(number_value(Some(&json!(120000))), Some(120_000.0));
        assert_eq!(number_value(Some(&json!(null))), None);
        assert_eq!(number_value(None), None);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SourceError::MissingCredentials("adzuna").to_string(),
            "missing credentials for adzuna"
        );
        assert_eq!(
            SourceError::Timeout(Duration::from_secs(3)).to_string(),
            "request timed out after 3s"
        );
    }
}
