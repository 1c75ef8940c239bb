use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{DatePosted, JobResult, RemotePreference, RemoteType};
use crate::normalize::{annualize, infer_remote_type, join_location, posted_date_or_now};
use crate::sources::{
    fetch_json, SourceAdapter, SourceError, SourceFamily, SourcePage, SourceRequest,
};

pub const KEY: &str = "jsearch";
pub const LABEL: &str = "JSearch";

const JSEARCH_URL: &str = "https://jsearch.p.rapidapi.com/search";
const JSEARCH_HOST: &str = "jsearch.p.rapidapi.com";
const TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct JSearchResponse {
    #[serde(default)]
    data: Vec<JSearchJob>,
}

#[derive(Debug, Deserialize)]
struct JSearchJob {
    job_id: String,
    job_title: String,
    employer_name: Option<String>,
    job_city: Option<String>,
    job_state: Option<String>,
    job_country: Option<String>,
    job_description: Option<String>,
    job_posted_at_datetime_utc: Option<String>,
    job_apply_link: Option<String>,
    job_is_remote: Option<bool>,
    job_employment_type: Option<String>,
    job_min_salary: Option<f64>,
    job_max_salary: Option<f64>,
    job_salary_period: Option<String>,
    job_required_skills: Option<Vec<String>>,
}

/// JSearch meta-aggregator on RapidAPI. The only source that reports required skills.
pub struct JSearchAdapter {
    client: Client,
    api_key: Option<String>,
}

impl JSearchAdapter {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
        }
    }
}

fn date_posted_param(window: DatePosted) -> &'static str {
    match window {
        DatePosted::Any => "all",
        DatePosted::Day => "today",
        DatePosted::ThreeDays => "3days",
        DatePosted::Week => "week",
        DatePosted::TwoWeeks | DatePosted::Month => "month",
    }
}

fn employment_type_param(employment_type: &str) -> Option<&'static str> {
    let normalized = employment_type.to_lowercase().replace(['-', '_', ' '], "");
    match normalized.as_str() {
        "fulltime" => Some("FULLTIME"),
        "parttime" => Some("PARTTIME"),
        "contract" | "contractor" => Some("CONTRACTOR"),
        "internship" | "intern" => Some("INTERN"),
        _ => None,
    }
}

fn experience_param(level: &str) -> Option<&'static str> {
    match level.to_lowercase().as_str() {
        "entry" | "entry-level" | "junior" => Some("under_3_years_experience"),
        "mid" | "mid-level" | "senior" | "lead" | "executive" => {
            Some("more_than_3_years_experience")
        }
        "none" | "no-experience" => Some("no_experience"),
        _ => None,
    }
}

fn query_params(request: &SourceRequest) -> Vec<(&'static str, String)> {
    let filters = &request.filters;
    let query = match &request.location {
        Some(location) => format!("{} in {}", request.query, location),
        None => request.query.clone(),
    };

    let mut params = vec![
        ("query", query),
        ("page", "1".to_string()),
        ("num_pages", "1".to_string()),
        ("date_posted", date_posted_param(filters.date_posted).to_string()),
    ];
    if filters.remote_type == RemotePreference::Remote {
        params.push(("remote_jobs_only", "true".to_string()));
    }
    if filters.contract_only {
        params.push(("employment_types", "CONTRACTOR".to_string()));
    } else if let Some(kind) = filters
        .employment_type
        .as_deref()
        .and_then(employment_type_param)
    {
        params.push(("employment_types", kind.to_string()));
    }
    if let Some(requirement) = filters.experience_level.as_deref().and_then(experience_param) {
        params.push(("job_requirements", requirement.to_string()));
    }
    if let Some(km) = request.radius_km() {
        params.push(("radius", km.to_string()));
    }
    params
}

#[async_trait]
impl SourceAdapter for JSearchAdapter {
    fn key(&self) -> &'static str {
        KEY
    }

    fn family(&self) -> SourceFamily {
        SourceFamily::Jsearch
    }

    async fn search(&self, request: &SourceRequest) -> Result<SourcePage, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingCredentials(KEY))?;

        let builder = self
            .client
            .get(JSEARCH_URL)
            .header("X-RapidAPI-Key", api_key)
            .header("X-RapidAPI-Host", JSEARCH_HOST)
            .query(&query_params(request));

        let response: JSearchResponse = fetch_json(builder, TIMEOUT).await?;
        let now = Utc::now();
        Ok(SourcePage::jobs(
            response
                .data
                .into_iter()
                .map(|job| map_job(job, now))
                .collect(),
        ))
    }
}

fn map_job(job: JSearchJob, now: DateTime<Utc>) -> JobResult {
    let is_remote = job.job_is_remote == Some(true);
    let location = join_location(&[
        job.job_city.as_deref(),
        job.job_state.as_deref(),
        job.job_country.as_deref(),
    ])
    .or_else(|| is_remote.then(|| "Remote".to_string()));

    let remote_type = if is_remote {
        Some(RemoteType::Remote)
    } else {
        infer_remote_type(location.as_deref(), job.job_description.as_deref())
    };

    let period = job.job_salary_period.as_deref().unwrap_or("YEAR");
    let required_skills = job
        .job_required_skills
        .filter(|skills| !skills.is_empty());

    JobResult {
        id: format!("jsearch_{}", job.job_id),
        title: job.job_title,
        company: job.employer_name.unwrap_or_else(|| "Unknown".to_string()),
        location,
        salary_min: job.job_min_salary.map(|v| annualize(v, period)),
        salary_max: job.job_max_salary.map(|v| annualize(v, period)),
        description: job.job_description,
        posted_date: posted_date_or_now(job.job_posted_at_datetime_utc.as_deref(), now),
        apply_url: job.job_apply_link,
        source: LABEL.to_string(),
        remote_type,
        employment_type: job.job_employment_type,
        match_score: None,
        required_skills,
    }
}
