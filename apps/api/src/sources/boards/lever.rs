use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::models::JobResult;
use crate::normalize::{annualize, iso_timestamp, remote_type_from_label};
use crate::sources::boards::{BoardCompany, BoardProvider, COMPANY_TIMEOUT};
use crate::sources::{fetch_json, SourceError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeverPosting {
    id: String,
    text: String,
    #[serde(default)]
    categories: LeverCategories,
    description_plain: Option<String>,
    hosted_url: Option<String>,
    apply_url: Option<String>,
    /// Epoch milliseconds.
    created_at: Option<i64>,
    workplace_type: Option<String>,
    salary_range: Option<LeverSalaryRange>,
}

#[derive(Debug, Default, Deserialize)]
struct LeverCategories {
    location: Option<String>,
    commitment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LeverSalaryRange {
    min: Option<f64>,
    max: Option<f64>,
    interval: Option<String>,
}

pub struct Lever;

#[async_trait]
impl BoardProvider for Lever {
    fn key(&self) -> &'static str {
        "lever"
    }

    fn label(&self) -> &'static str {
        "Lever"
    }

    async fn search_company(
        &self,
        client: &Client,
        company: &BoardCompany,
        _query: &str,
    ) -> Result<Vec<JobResult>, SourceError> {
        let url = format!("https://api.lever.co/v0/postings/{}", company.slug);
        let postings: Vec<LeverPosting> =
            fetch_json(client.get(url).query(&[("mode", "json")]), COMPANY_TIMEOUT).await?;
        let now = Utc::now();
        Ok(postings
            .into_iter()
            .map(|posting| map_posting(company, posting, now))
            .collect())
    }
}

fn map_posting(company: &BoardCompany, posting: LeverPosting, now: DateTime<Utc>) -> JobResult {
    let location = posting.categories.location;
    let remote_type = remote_type_from_label(
        posting.workplace_type.as_deref(),
        location.as_deref(),
        posting.description_plain.as_deref(),
    );
    let posted = posting
        .created_at
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or(now);
    let (salary_min, salary_max) = match &posting.salary_range {
        Some(range) => {
            let interval = range.interval.as_deref().unwrap_or("per-year-salary");
            (
                range.min.map(|v| annualize(v, interval)),
                range.max.map(|v| annualize(v, interval)),
            )
        }
        None => (None, None),
    };

    JobResult {
        id: format!("lever_{}", posting.id),
        title: posting.text,
        company: company.name.clone(),
        location,
        salary_min,
        salary_max,
        description: posting.description_plain,
        posted_date: iso_timestamp(posted),
        apply_url: posting.hosted_url.or(posting.apply_url),
        source: "Lever".to_string(),
        remote_type,
        employment_type: posting.categories.commitment,
        match_score: None,
        required_skills: None,
    }
}
