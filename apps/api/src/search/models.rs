use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{DatePosted, JobResult, PageCursor, SearchFilters};

/// Body of `POST /unified-job-search`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    pub location: Option<String>,
    pub radius_miles: Option<f64>,
    pub filters: Option<SearchFilters>,
    pub user_id: Option<String>,
    pub sources: Option<Vec<String>>,
    /// Overrides `filters.nextPageToken` when both are present.
    pub next_page_token: Option<PageCursor>,
}

/// Per-source diagnostics: jobs returned before filtering, and `success` or `error: <msg>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStatus {
    pub count: usize,
    pub status: String,
}

impl SourceStatus {
    pub fn success(count: usize) -> Self {
        Self {
            count,
            status: "success".to_string(),
        }
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            count: 0,
            status: format!("error: {message}"),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status.starts_with("error:")
    }
}

/// Echo of the effective search parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_miles: Option<f64>,
    pub filters: SearchFilters,
    pub sources: Vec<String>,
}

/// Outcome of the date filter, including whether the window was relaxed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFilterReport {
    pub window: DatePosted,
    pub input_count: usize,
    pub strict_count: usize,
    /// True when the strict window removed every job and the unfiltered set was returned.
    pub relaxed: bool,
}

/// Job counts after each pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterReport {
    pub date: DateFilterReport,
    pub after_date: usize,
    pub after_contract: usize,
    pub after_dedup: usize,
    pub after_location: usize,
    pub after_remote: usize,
    pub after_employment: usize,
    pub after_salary: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub jobs: Vec<JobResult>,
    pub total: usize,
    pub search_params: SearchParams,
    pub sources: BTreeMap<String, SourceStatus>,
    /// Milliseconds.
    pub execution_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<PageCursor>,
    pub filter_report: FilterReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_minimal_body() {
        let req: SearchRequest = serde_json::from_str(r#"{"query": "rust"}"#).unwrap();
        assert_eq!(req.query.as_deref(), Some("rust"));
        assert!(req.filters.is_none());
        assert!(req.sources.is_none());
    }

    #[test]
    fn test_request_reads_camel_case_fields() {
        let req: SearchRequest = serde_json::from_str(
            r#"{
                "query": "nurse",
                "location": "Austin, TX",
                "radiusMiles": 25,
                "userId": "0c6f1b9e-2f43-4d5e-9a4b-1f2e3d4c5b6a",
                "sources": ["usajobs"],
                "nextPageToken": {"source": "google_jobs", "token": "p2"}
            }"#,
        )
        .unwrap();
        assert_eq!(req.radius_miles, Some(25.0));
        assert_eq!(req.sources, Some(vec!["usajobs".to_string()]));
        assert_eq!(req.next_page_token.unwrap().token, "p2");
    }

    #[test]
    fn test_status_constructors() {
        assert_eq!(SourceStatus::success(4).status, "success");
        let failed = SourceStatus::error("request timed out after 10s");
        assert_eq!(failed.count, 0);
        assert_eq!(failed.status, "error: request timed out after 10s");
        assert!(failed.is_error());
    }
}
