use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::models::JobResult;
use crate::normalize::{infer_remote_type, posted_date_or_now, strip_html};
use crate::sources::boards::{BoardCompany, BoardProvider, COMPANY_TIMEOUT};
use crate::sources::{fetch_json, id_string, SourceError};

#[derive(Debug, Deserialize)]
struct GreenhouseBoard {
    #[serde(default)]
    jobs: Vec<GreenhouseJob>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseJob {
    id: serde_json::Value,
    title: String,
    location: Option<GreenhouseLocation>,
    absolute_url: Option<String>,
    first_published: Option<String>,
    updated_at: Option<String>,
    /// Entity-escaped HTML.
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseLocation {
    name: Option<String>,
}

pub struct Greenhouse;

#[async_trait]
impl BoardProvider for Greenhouse {
    fn key(&self) -> &'static str {
        "greenhouse"
    }

    fn label(&self) -> &'static str {
        "Greenhouse"
    }

    async fn search_company(
        &self,
        client: &Client,
        company: &BoardCompany,
        _query: &str,
    ) -> Result<Vec<JobResult>, SourceError> {
        let url = format!(
            "https://boards-api.greenhouse.io/v1/boards/{}/jobs",
            company.slug
        );
        let board: GreenhouseBoard =
            fetch_json(client.get(url).query(&[("content", "true")]), COMPANY_TIMEOUT).await?;
        let now = Utc::now();
        Ok(board
            .jobs
            .into_iter()
            .map(|job| map_job(company, job, now))
            .collect())
    }
}

fn map_job(company: &BoardCompany, job: GreenhouseJob, now: DateTime<Utc>) -> JobResult {
    let location = job.location.and_then(|l| l.name);
    let description = job.content.as_deref().map(strip_html);
    let posted = job.first_published.or(job.updated_at);

    JobResult {
        id: format!("greenhouse_{}", id_string(&job.id)),
        title: job.title,
        company: company.name.clone(),
        remote_type: infer_remote_type(location.as_deref(), description.as_deref()),
        location,
        salary_min: None,
        salary_max: None,
        description,
        posted_date: posted_date_or_now(posted.as_deref(), now),
        apply_url: job.absolute_url,
        source: "Greenhouse".to_string(),
        employment_type: None,
        match_score: None,
        required_skills: None,
    }
}
