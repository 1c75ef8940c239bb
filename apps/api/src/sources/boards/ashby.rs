use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{JobResult, RemoteType};
use crate::normalize::{posted_date_or_now, remote_type_from_label};
use crate::sources::boards::{BoardCompany, BoardProvider, COMPANY_TIMEOUT};
use crate::sources::{fetch_json, SourceError};

#[derive(Debug, Deserialize)]
struct AshbyBoard {
    #[serde(default)]
    jobs: Vec<AshbyJob>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AshbyJob {
    id: String,
    title: String,
    location: Option<String>,
    employment_type: Option<String>,
    is_remote: Option<bool>,
    workplace_type: Option<String>,
    published_at: Option<String>,
    job_url: Option<String>,
    apply_url: Option<String>,
    description_plain: Option<String>,
}

pub struct Ashby;

#[async_trait]
impl BoardProvider for Ashby {
    fn key(&self) -> &'static str {
        "ashby"
    }

    fn label(&self) -> &'static str {
        "Ashby"
    }

    async fn search_company(
        &self,
        client: &Client,
        company: &BoardCompany,
        _query: &str,
    ) -> Result<Vec<JobResult>, SourceError> {
        let url = format!(
            "https://api.ashbyhq.com/posting-api/job-board/{}",
            company.slug
        );
        let board: AshbyBoard = fetch_json(client.get(url), COMPANY_TIMEOUT).await?;
        let now = Utc::now();
        Ok(board
            .jobs
            .into_iter()
            .map(|job| map_job(company, job, now))
            .collect())
    }
}

fn map_job(company: &BoardCompany, job: AshbyJob, now: DateTime<Utc>) -> JobResult {
    let remote_type = match job.workplace_type.as_deref() {
        Some(label) => remote_type_from_label(
            Some(label),
            job.location.as_deref(),
            job.description_plain.as_deref(),
        ),
        None if job.is_remote == Some(true) => Some(RemoteType::Remote),
        None => remote_type_from_label(
            None,
            job.location.as_deref(),
            job.description_plain.as_deref(),
        ),
    };

    JobResult {
        id: format!("ashby_{}", job.id),
        title: job.title,
        company: company.name.clone(),
        location: job.location,
        salary_min: None,
        salary_max: None,
        description: job.description_plain,
        posted_date: posted_date_or_now(job.published_at.as_deref(), now),
        apply_url: job.apply_url.or(job.job_url),
        source: "Ashby".to_string(),
        remote_type,
        employment_type: job.employment_type,
        match_score: None,
        required_skills: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_maps_ashby_jobs() {
        let fixture = r#"{
            "apiVersion": "1",
            "jobs": [
                {
                    "id": "7f0c9d7e-aaaa-bbbb-cccc-1234567890ab",
                    "title": "Product Engineer",
                    "location": "San Francisco",
                    "employmentType": "FullTime",
                    "isRemote": false,
                    "workplaceType": "OnSite",
                    "publishedAt": "2024-06-14T18:30:00.000+00:00",
                    "jobUrl": "https://jobs.ashbyhq.com/acme/7f0c9d7e",
                    "applyUrl": "https://jobs.ashbyhq.com/acme/7f0c9d7e/application",
                    "descriptionPlain": "Ship features end to end."
                },
                {
                    "id": "b2",
                    "title": "Support Engineer",
                    "location": "North America",
                    "isRemote": true
                }
            ]
        }"#;
        let company = BoardCompany {
            slug: "acme".to_string(),
            name: "Acme".to_string(),
            host: None,
            site: None,
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let board: AshbyBoard = serde_json::from_str(fixture).unwrap();
        let jobs: Vec<_> = board
            .jobs
            .into_iter()
            .map(|j| map_job(&company, j, now))
            .collect();

        assert_eq!(jobs[0].id, "ashby_7f0c9d7e-aaaa-bbbb-cccc-1234567890ab");
        assert_eq!(jobs[0].remote_type, Some(RemoteType::Onsite));
        assert_eq!(jobs[0].posted_date, "2024-06-14T18:30:00.000Z");
        assert_eq!(jobs[0].employment_type.as_deref(), Some("FullTime"));
        assert_eq!(
            jobs[0].apply_url.as_deref(),
            Some("https://jobs.ashbyhq.com/acme/7f0c9d7e/application")
        );
        assert_eq!(jobs[1].remote_type, Some(RemoteType::Remote));
    }
}
