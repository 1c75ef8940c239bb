use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{JobResult, RemotePreference};
use crate::normalize::{infer_remote_type, posted_date_or_now, strip_html};
use crate::sources::{
    fetch_json, id_string, SourceAdapter, SourceError, SourceFamily, SourcePage, SourceRequest,
};

pub const KEY: &str = "adzuna";
pub const LABEL: &str = "Adzuna";

const ADZUNA_URL: &str = "https://api.adzuna.com/v1/api/jobs/us/search/1";
const TIMEOUT: Duration = Duration::from_secs(10);
const RESULTS_PER_PAGE: &str = "50";

#[derive(Debug, Deserialize)]
struct AdzunaResponse {
    #[serde(default)]
    results: Vec<AdzunaJob>,
}

#[derive(Debug, Deserialize)]
struct AdzunaJob {
    id: serde_json::Value,
    title: String,
    company: Option<DisplayName>,
    location: Option<DisplayName>,
    description: Option<String>,
    created: Option<String>,
    redirect_url: Option<String>,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    contract_type: Option<String>,
    contract_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DisplayName {
    display_name: Option<String>,
}

pub struct AdzunaAdapter {
    client: Client,
    app_id: Option<String>,
    app_key: Option<String>,
}

impl AdzunaAdapter {
    pub fn new(client: Client, app_id: Option<String>, app_key: Option<String>) -> Self {
        Self {
            client,
            app_id,
            app_key,
        }
    }
}

/// Query parameters beyond credentials, derived from the request filters.
fn filter_params(request: &SourceRequest) -> Vec<(&'static str, String)> {
    let filters = &request.filters;
    let mut params = Vec::new();

    let what = match filters.remote_type {
        RemotePreference::Remote => format!("{} remote", request.query),
        _ => request.query.clone(),
    };
    params.push(("what", what));

    if let Some(location) = &request.location {
        params.push(("where", location.clone()));
        if let Some(km) = request.radius_km() {
            params.push(("distance", km.to_string()));
        }
    }
    if let Some(days) = filters.date_posted.max_age_days() {
        params.push(("max_days_old", days.to_string()));
    }
    if let Some(min) = filters.salary_min {
        params.push(("salary_min", (min.round() as u64).to_string()));
    }
    if let Some(max) = filters.salary_max {
        params.push(("salary_max", (max.round() as u64).to_string()));
    }
    if filters.contract_only {
        params.push(("contract", "1".to_string()));
    }
    match filters
        .employment_type
        .as_deref()
        .map(|t| t.to_lowercase())
        .as_deref()
    {
        Some("full-time") | Some("fulltime") | Some("full_time") => {
            params.push(("full_time", "1".to_string()))
        }
        Some("part-time") | Some("parttime") | Some("part_time") => {
            params.push(("part_time", "1".to_string()))
        }
        Some("contract") => params.push(("contract", "1".to_string())),
        _ => {}
    }
    params
}

#[async_trait]
impl SourceAdapter for AdzunaAdapter {
    fn key(&self) -> &'static str {
        KEY
    }

    fn family(&self) -> SourceFamily {
        SourceFamily::Adzuna
    }

    async fn search(&self, request: &SourceRequest) -> Result<SourcePage, SourceError> {
        let (Some(app_id), Some(app_key)) = (&self.app_id, &self.app_key) else {
            return Err(SourceError::MissingCredentials(KEY));
        };

        let builder = self
            .client
            .get(ADZUNA_URL)
            .query(&[
                ("app_id", app_id.as_str()),
                ("app_key", app_key.as_str()),
                ("results_per_page", RESULTS_PER_PAGE),
                ("content-type", "application/json"),
            ])
            .query(&filter_params(request));

        let response: AdzunaResponse = fetch_json(builder, TIMEOUT).await?;
        let now = Utc::now();
        Ok(SourcePage::jobs(
            response
                .results
                .into_iter()
                .map(|job| map_job(job, now))
                .collect(),
        ))
    }
}

fn map_job(job: AdzunaJob, now: DateTime<Utc>) -> JobResult {
    let location = job.location.and_then(|l| l.display_name);
    let description = job.description.as_deref().map(strip_html);
    let remote_type = infer_remote_type(location.as_deref(), description.as_deref());

    JobResult {
        id: format!("adzuna_{}", id_string(&job.id)),
        title: strip_html(&job.title),
        company: job
            .company
            .and_then(|c| c.display_name)
            .unwrap_or_else(|| "Unknown".to_string()),
        location,
        salary_min: job.salary_min,
        salary_max: job.salary_max,
        description,
        posted_date: posted_date_or_now(job.created.as_deref(), now),
        apply_url: job.redirect_url,
        source: LABEL.to_string(),
        remote_type,
        employment_type: job.contract_time.or(job.contract_type),
        match_score: None,
        required_skills: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DatePosted, RemoteType, SearchFilters};
    use chrono::TimeZone;

    #[test]
    fn test_maps_adzuna_results() {
        let fixture = r#"{
            "count": 1,
            "results": [{
                "id": "4512345678",
                "title": "<strong>Python</strong> Developer",
                "company": {"display_name": "Initech"},
                "location": {"display_name": "Remote, US", "area": ["US"]},
                "description": "Work on data pipelines &amp; APIs",
                "created": "2024-06-11T08:15:00Z",
                "redirect_url": "https://www.adzuna.com/land/ad/4512345678",
                "salary_min": 95000,
                "salary_max": 125000,
                "contract_type": "permanent",
                "contract_time": "full_time"
            }]
        }"#;
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let response: AdzunaResponse = serde_json::from_str(fixture).unwrap();
        let job = map_job(response.results.into_iter().next().unwrap(), now);

        assert_eq!(job.id, "adzuna_4512345678");
        assert_eq!(job.title, "Python Developer");
        assert_eq!(job.company, "Initech");
        assert_eq!(job.remote_type, Some(RemoteType::Remote));
        assert_eq!(job.description.as_deref(), Some("Work on data pipelines & APIs"));
        assert_eq!(job.employment_type.as_deref(), Some("full_time"));
        assert_eq!(job.salary_max, Some(125_000.0));
        assert_eq!(job.posted_date, "2024-06-11T08:15:00.000Z");
    }

    #[test]
    fn test_filter_params_follow_filters() {
        let request = SourceRequest {
            query: "data engineer".to_string(),
            location: Some("Denver, CO".to_string()),
            radius_miles: Some(10.0),
            filters: SearchFilters {
                date_posted: DatePosted::Week,
                employment_type: Some("Full-Time".to_string()),
                salary_min: Some(90_000.0),
                ..Default::default()
            },
            page_token: None,
        };
        let params = filter_params(&request);
        let get = |k: &str| {
            params
                .iter()
                .find(|(key, _)| *key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("what"), Some("data engineer"));
        assert_eq!(get("where"), Some("Denver, CO"));
        assert_eq!(get("distance"), Some("16"));
        assert_eq!(get("max_days_old"), Some("7"));
        assert_eq!(get("salary_min"), Some("90000"));
        assert_eq!(get("full_time"), Some("1"));
        assert_eq!(get("contract"), None);
    }
}
