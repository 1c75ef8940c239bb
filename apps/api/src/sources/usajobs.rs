use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{JobResult, RemoteType};
use crate::normalize::{annualize, infer_remote_type, posted_date_or_now, strip_html};
use crate::sources::{
    fetch_json, number_value, SourceAdapter, SourceError, SourceFamily, SourcePage, SourceRequest,
};

pub const KEY: &str = "usajobs";
pub const LABEL: &str = "USAJobs.gov";

const USAJOBS_URL: &str = "https://data.usajobs.gov/api/search";
const USAJOBS_HOST: &str = "data.usajobs.gov";
const TIMEOUT: Duration = Duration::from_secs(15);
const RESULTS_PER_PAGE: &str = "100";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UsaJobsResponse {
    search_result: SearchResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResult {
    #[serde(default)]
    search_result_items: Vec<SearchResultItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResultItem {
    matched_object_id: String,
    matched_object_descriptor: Descriptor,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Descriptor {
    position_title: String,
    organization_name: Option<String>,
    department_name: Option<String>,
    position_location_display: Option<String>,
    #[serde(default)]
    position_remuneration: Vec<Remuneration>,
    publication_start_date: Option<String>,
    #[serde(rename = "PositionURI")]
    position_uri: Option<String>,
    #[serde(rename = "ApplyURI", default)]
    apply_uri: Vec<String>,
    #[serde(default)]
    position_schedule: Vec<NamedCode>,
    qualification_summary: Option<String>,
    user_area: Option<UserArea>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Remuneration {
    minimum_range: Option<serde_json::Value>,
    maximum_range: Option<serde_json::Value>,
    rate_interval_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NamedCode {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserArea {
    details: Option<Details>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Details {
    job_summary: Option<String>,
    remote_indicator: Option<bool>,
    telework_eligible: Option<bool>,
}

/// USAJobs.gov search API. Requires an API key and the registered e-mail as
/// `User-Agent`.
pub struct UsaJobsAdapter {
    client: Client,
    api_key: Option<String>,
    user_agent: Option<String>,
}

impl UsaJobsAdapter {
    pub fn new(client: Client, api_key: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            client,
            api_key,
            user_agent,
        }
    }
}

#[async_trait]
impl SourceAdapter for UsaJobsAdapter {
    fn key(&self) -> &'static str {
        KEY
    }

    fn family(&self) -> SourceFamily {
        SourceFamily::Usajobs
    }

    async fn search(&self, request: &SourceRequest) -> Result<SourcePage, SourceError> {
        let (Some(api_key), Some(user_agent)) = (&self.api_key, &self.user_agent) else {
            return Err(SourceError::MissingCredentials(KEY));
        };

        let mut builder = self
            .client
            .get(USAJOBS_URL)
            .header("Host", USAJOBS_HOST)
            .header("User-Agent", user_agent)
            .header("Authorization-Key", api_key)
            .query(&[
                ("Keyword", request.query.as_str()),
                ("ResultsPerPage", RESULTS_PER_PAGE),
            ]);
        if let Some(location) = &request.location {
            builder = builder.query(&[("LocationName", location.as_str())]);
            if let Some(radius) = request.radius_miles.filter(|r| *r > 0.0) {
                builder = builder.query(&[("Radius", (radius.round() as u32).to_string())]);
            }
        }
        if let Some(days) = request.filters.date_posted.max_age_days() {
            builder = builder.query(&[("DatePosted", days.to_string())]);
        }

        let response: UsaJobsResponse = fetch_json(builder, TIMEOUT).await?;
        let now = Utc::now();
        let jobs = response
            .search_result
            .search_result_items
            .into_iter()
            .map(|item| map_item(item, now))
            .collect();
        Ok(SourcePage::jobs(jobs))
    }
}

fn map_item(item: SearchResultItem, now: DateTime<Utc>) -> JobResult {
    let descriptor = item.matched_object_descriptor;
    let details = descriptor.user_area.and_then(|u| u.details);

    let description = details
        .as_ref()
        .and_then(|d| d.job_summary.as_deref())
        .or(descriptor.qualification_summary.as_deref())
        .map(strip_html);

    let remote_type = match &details {
        Some(d) if d.remote_indicator == Some(true) => Some(RemoteType::Remote),
        Some(d) if d.telework_eligible == Some(true) => Some(RemoteType::Hybrid),
        _ => infer_remote_type(
            descriptor.position_location_display.as_deref(),
            description.as_deref(),
        ),
    };

    let pay = descriptor.position_remuneration.first();
    let period = pay
        .and_then(|p| p.rate_interval_code.as_deref())
        .unwrap_or("PA");
    let salary_min = pay
        .and_then(|p| number_value(p.minimum_range.as_ref()))
        .map(|v| annualize(v, period));
    let salary_max = pay
        .and_then(|p| number_value(p.maximum_range.as_ref()))
        .map(|v| annualize(v, period));

    JobResult {
        id: format!("usajobs_{}", item.matched_object_id),
        title: descriptor.position_title,
        company: descriptor
            .organization_name
            .or(descriptor.department_name)
            .unwrap_or_else(|| "U.S. Federal Government".to_string()),
        location: descriptor.position_location_display,
        salary_min,
        salary_max,
        description,
        posted_date: posted_date_or_now(descriptor.publication_start_date.as_deref(), now),
        apply_url: descriptor.apply_uri.into_iter().next().or(descriptor.position_uri),
        source: LABEL.to_string(),
        remote_type,
        employment_type: descriptor.position_schedule.into_iter().next().map(|s| s.name),
        match_score: None,
        required_skills: None,
    }
}
