use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::models::JobResult;
use crate::normalize::{parse_posted_date, remote_type_from_label};
use crate::sources::boards::{BoardCompany, BoardProvider, COMPANY_TIMEOUT};
use crate::sources::{fetch_json, SourceError};

const PAGE_LIMIT: u32 = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkdayResponse {
    #[serde(default)]
    job_postings: Vec<WorkdayPosting>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkdayPosting {
    title: String,
    external_path: String,
    locations_text: Option<String>,
    /// Relative text such as "Posted 3 Days Ago".
    posted_on: Option<String>,
    remote_type: Option<String>,
    #[serde(default)]
    bullet_fields: Vec<String>,
}

/// Workday career sites. Each entry needs the tenant (`slug`), data-centre `host`
/// and career-site name; unlike the other boards the search text is applied
/// server-side.
pub struct Workday;

fn site_base(company: &BoardCompany) -> Result<(String, &str), SourceError> {
    match (&company.host, &company.site) {
        (Some(host), Some(site)) => Ok((
            format!("https://{}.{}.myworkdayjobs.com", company.slug, host),
            site.as_str(),
        )),
        _ => Err(SourceError::InvalidBoardEntry(format!(
            "workday company '{}' needs host and site",
            company.slug
        ))),
    }
}

#[async_trait]
impl BoardProvider for Workday {
    fn key(&self) -> &'static str {
        "workday"
    }

    fn label(&self) -> &'static str {
        "Workday"
    }

    async fn search_company(
        &self,
        client: &Client,
        company: &BoardCompany,
        query: &str,
    ) -> Result<Vec<JobResult>, SourceError> {
        let (base, site) = site_base(company)?;
        let url = format!("{base}/wday/cxs/{}/{site}/jobs", company.slug);
        let body = json!({
            "appliedFacets": {},
            "limit": PAGE_LIMIT,
            "offset": 0,
            "searchText": query,
        });
        let response: WorkdayResponse =
            fetch_json(client.post(url).json(&body), COMPANY_TIMEOUT).await?;
        let now = Utc::now();
        Ok(response
            .job_postings
            .into_iter()
            .map(|posting| map_posting(company, &base, site, posting, now))
            .collect())
    }
}

fn map_posting(
    company: &BoardCompany,
    base: &str,
    site: &str,
    posting: WorkdayPosting,
    now: DateTime<Utc>,
) -> JobResult {
    let requisition = posting
        .bullet_fields
        .first()
        .cloned()
        .unwrap_or_else(|| posting.external_path.clone());

    let posted = posting
        .posted_on
        .as_deref()
        .and_then(|raw| parse_posted_date(raw, now))
        .unwrap_or(now);

    let mut job = JobResult::new(
        format!("workday_{}_{}", company.slug, requisition),
        posting.title,
        company.name.clone(),
        "Workday",
        posted,
    );
    job.remote_type = remote_type_from_label(
        posting.remote_type.as_deref(),
        posting.locations_text.as_deref(),
        None,
    );
    job.location = posting.locations_text;
    job.apply_url = Some(format!("{base}/en-US/{site}{}", posting.external_path));
    job
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RemoteType;
    use chrono::TimeZone;

    fn nvidia() -> BoardCompany {
        BoardCompany {
            slug: "nvidia".to_string(),
            name: "NVIDIA".to_string(),
            host: Some("wd5".to_string()),
            site: Some("NVIDIAExternalCareerSite".to_string()),
        }
    }

    #[test]
    fn test_maps_workday_postings() {
        let fixture = r#"{
            "total": 1,
            "jobPostings": [{
                "title": "Senior Systems Software Engineer",
                "externalPath": "/job/US-CA-Santa-Clara/Senior-Systems-Software-Engineer_JR1987654",
                "locationsText": "US, CA, Santa Clara",
                "postedOn": "Posted 2 Days Ago",
                "bulletFields": ["JR1987654"]
            }]
        }"#;
        let company = nvidia();
        let (base, site) = site_base(&company).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 8, 0, 0).unwrap();
        let response: WorkdayResponse = serde_json::from_str(fixture).unwrap();
        let job = map_posting(
            &company,
            &base,
            site,
            response.job_postings.into_iter().next().unwrap(),
            now,
        );

        assert_eq!(job.id, "workday_nvidia_JR1987654");
        assert_eq!(job.posted_date, "2024-06-13T00:00:00.000Z");
        assert_eq!(job.remote_type, Some(RemoteType::Onsite));
        assert_eq!(
            job.apply_url.as_deref(),
            Some("https://nvidia.wd5.myworkdayjobs.com/en-US/NVIDIAExternalCareerSite/job/US-CA-Santa-Clara/Senior-Systems-Software-Engineer_JR1987654")
        );
    }

    #[test]
    fn test_entry_without_site_is_rejected() {
        let mut company = nvidia();
        company.site = None;
        assert!(matches!(
            site_base(&company),
            Err(SourceError::InvalidBoardEntry(_))
        ));
    }
}
