use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{JobResult, RemoteType};
use crate::normalize::{infer_remote_type, join_location, posted_date_or_now, strip_html};
use crate::sources::boards::{BoardCompany, BoardProvider, COMPANY_TIMEOUT};
use crate::sources::{fetch_json, id_string, SourceError};

#[derive(Debug, Deserialize)]
struct RecruiteeResponse {
    #[serde(default)]
    offers: Vec<RecruiteeOffer>,
}

#[derive(Debug, Deserialize)]
struct RecruiteeOffer {
    id: serde_json::Value,
    title: String,
    location: Option<String>,
    city: Option<String>,
    country: Option<String>,
    #[serde(default)]
    remote: bool,
    #[serde(default)]
    hybrid: bool,
    careers_url: Option<String>,
    careers_apply_url: Option<String>,
    published_at: Option<String>,
    created_at: Option<String>,
    description: Option<String>,
    employment_type_code: Option<String>,
}

pub struct Recruitee;

#[async_trait]
impl BoardProvider for Recruitee {
    fn key(&self) -> &'static str {
        "recruitee"
    }

    fn label(&self) -> &'static str {
        "Recruitee"
    }

    async fn search_company(
        &self,
        client: &Client,
        company: &BoardCompany,
        _query: &str,
    ) -> Result<Vec<JobResult>, SourceError> {
        let url = format!("https://{}.recruitee.com/api/offers/", company.slug);
        let response: RecruiteeResponse = fetch_json(client.get(url), COMPANY_TIMEOUT).await?;
        let now = Utc::now();
        Ok(response
            .offers
            .into_iter()
            .map(|offer| map_offer(company, offer, now))
            .collect())
    }
}

fn map_offer(company: &BoardCompany, offer: RecruiteeOffer, now: DateTime<Utc>) -> JobResult {
    let location = offer
        .location
        .filter(|l| !l.trim().is_empty())
        .or_else(|| join_location(&[offer.city.as_deref(), offer.country.as_deref()]));
    let description = offer.description.as_deref().map(strip_html);
    let remote_type = if offer.remote {
        Some(RemoteType::Remote)
    } else if offer.hybrid {
        Some(RemoteType::Hybrid)
    } else {
        infer_remote_type(location.as_deref(), description.as_deref())
    };
    let posted = offer.published_at.or(offer.created_at);

    JobResult {
        id: format!("recruitee_{}", id_string(&offer.id)),
        title: offer.title,
        company: company.name.clone(),
        location,
        salary_min: None,
        salary_max: None,
        description,
        posted_date: posted_date_or_now(posted.as_deref(), now),
        apply_url: offer.careers_apply_url.or(offer.careers_url),
        source: "Recruitee".to_string(),
        remote_type,
        employment_type: offer.employment_type_code,
        match_score: None,
        required_skills: None,
    }
}
