use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{JobResult, RemoteType};
use crate::normalize::{infer_remote_type, join_location, posted_date_or_now, strip_html};
use crate::sources::boards::{BoardCompany, BoardProvider, COMPANY_TIMEOUT};
use crate::sources::{fetch_json, SourceError};

#[derive(Debug, Deserialize)]
struct WorkableAccount {
    #[serde(default)]
    jobs: Vec<WorkableJob>,
}

#[derive(Debug, Deserialize)]
struct WorkableJob {
    title: String,
    shortcode: String,
    employment_type: Option<String>,
    #[serde(default)]
    telecommuting: bool,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    url: Option<String>,
    application_url: Option<String>,
    published_on: Option<String>,
    created_at: Option<String>,
    description: Option<String>,
}

pub struct Workable;

#[async_trait]
impl BoardProvider for Workable {
    fn key(&self) -> &'static str {
        "workable"
    }

    fn label(&self) -> &'static str {
        "Workable"
    }

    async fn search_company(
        &self,
        client: &Client,
        company: &BoardCompany,
        _query: &str,
    ) -> Result<Vec<JobResult>, SourceError> {
        let url = format!(
            "https://apply.workable.com/api/v1/widget/accounts/{}",
            company.slug
        );
        let account: WorkableAccount =
            fetch_json(client.get(url).query(&[("details", "true")]), COMPANY_TIMEOUT).await?;
        let now = Utc::now();
        Ok(account
            .jobs
            .into_iter()
            .map(|job| map_job(company, job, now))
            .collect())
    }
}

fn map_job(company: &BoardCompany, job: WorkableJob, now: DateTime<Utc>) -> JobResult {
    let location = join_location(&[
        job.city.as_deref(),
        job.state.as_deref(),
        job.country.as_deref(),
    ]);
    let description = job.description.as_deref().map(strip_html);
    let remote_type = if job.telecommuting {
        Some(RemoteType::Remote)
    } else {
        infer_remote_type(location.as_deref(), description.as_deref())
    };
    let posted = job.published_on.or(job.created_at);

    JobResult {
        id: format!("workable_{}", job.shortcode),
        title: job.title,
        company: company.name.clone(),
        location,
        salary_min: None,
        salary_max: None,
        description,
        posted_date: posted_date_or_now(posted.as_deref(), now),
        apply_url: job.url.or(job.application_url),
        source: "Workable".to_string(),
        remote_type,
        employment_type: job.employment_type,
        match_score: None,
        required_skills: None,
    }
}
