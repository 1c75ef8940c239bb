use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::models::job::JobResult;
use crate::normalize::{truncate_chars, MAX_DESCRIPTION_CHARS};

/// One row of the `job_listings` upsert, keyed on `(external_id, source)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub external_id: String,
    pub source: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub description: Option<String>,
    pub posted_date: Option<DateTime<Utc>>,
    pub apply_url: Option<String>,
    pub remote_type: Option<String>,
    pub employment_type: Option<String>,
    pub required_skills: Option<Vec<String>>,
}

impl From<&JobResult> for ListingRecord {
    fn from(job: &JobResult) -> Self {
        Self {
            external_id: job.id.clone(),
            source: job.source.clone(),
            title: job.title.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            description: job
                .description
                .as_deref()
                .map(|d| truncate_chars(d, MAX_DESCRIPTION_CHARS)),
            posted_date: job.posted_at(),
            apply_url: job.apply_url.clone(),
            remote_type: job.remote_type.map(|r| r.as_str().to_string()),
            employment_type: job.employment_type.clone(),
            required_skills: job.required_skills.clone(),
        }
    }
}

/// Builds upsert rows, keeping the first record per `(external_id, source)`.
/// Postgres rejects an `ON CONFLICT DO UPDATE` batch that touches the same row twice.
pub fn listing_records(jobs: &[JobResult]) -> Vec<ListingRecord> {
    let mut seen = HashSet::new();
    jobs.iter()
        .filter(|job| seen.insert((job.id.as_str(), job.source.as_str())))
        .map(ListingRecord::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn job(id: &str, source: &str) -> JobResult {
        let posted = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        JobResult::new(id, "Engineer", "Acme", source, posted)
    }

    #[test]
    fn test_description_truncated_for_persistence() {
        let mut long = job("a", "Lever");
        long.description = Some("x".repeat(MAX_DESCRIPTION_CHARS + 250));
        let record = ListingRecord::from(&long);
        assert_eq!(
            record.description.unwrap().chars().count(),
            MAX_DESCRIPTION_CHARS
        );
    }

    #[test]
    fn test_same_id_different_source_both_kept() {
        let records = listing_records(&[job("1", "Lever"), job("1", "Ashby"), job("1", "Lever")]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source, "Lever");
        assert_eq!(records[1].source, "Ashby");
    }

    #[test]
    fn test_posted_date_parsed_to_timestamp() {
        let record = ListingRecord::from(&job("1", "Lever"));
        assert_eq!(
            record.posted_date,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        );
    }
}
