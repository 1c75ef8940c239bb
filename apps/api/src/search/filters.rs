//! Filter pipeline: pure functions over `Vec<JobResult>`.
//!
//! Stages run in a fixed order: date, contract-only, dedup, location, remote,
//! employment type, salary. `run_pipeline` records the count after each stage in a
//! `FilterReport` so callers can see where jobs went.

use std::collections::HashSet;
use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{DatePosted, JobResult, RemotePreference, RemoteType, SearchFilters};
use crate::normalize::is_arrangement_only;
use crate::search::models::{DateFilterReport, FilterReport};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const CONTRACT_KEYWORDS: &[&str] = &[
    "contract",
    "contractor",
    "freelance",
    "temporary",
    "1099",
    "c2c",
    "corp-to-corp",
];

const FULL_TIME: &[&str] = &["full", "fulltime", "full_time", "full-time", "permanent"];
const PART_TIME: &[&str] = &["part", "parttime", "part_time", "part-time"];
const CONTRACT: &[&str] = &["contract", "contractor", "freelance"];
const INTERNSHIP: &[&str] = &["intern"];
const TEMPORARY: &[&str] = &["temp", "seasonal"];

// ────────────────────────────────────────────────────────────────────────────
// Date
// ────────────────────────────────────────────────────────────────────────────

/// Keeps jobs posted within `window` (ages compared at day granularity).
/// Jobs with an unparseable date are kept. When the strict window would remove every
/// job from a non-empty input, the input is returned unchanged and the report says so.
pub fn filter_by_date(
    jobs: Vec<JobResult>,
    window: DatePosted,
    now: DateTime<Utc>,
) -> (Vec<JobResult>, DateFilterReport) {
    let input_count = jobs.len();
    let Some(max_days) = window.max_age_days() else {
        let report = DateFilterReport {
            window,
            input_count,
            strict_count: input_count,
            relaxed: false,
        };
        return (jobs, report);
    };

    let strict: Vec<JobResult> = jobs
        .iter()
        .filter(|job| match job.age_in_days(now) {
            Some(age) => age <= max_days,
            None => true,
        })
        .cloned()
        .collect();
    let strict_count = strict.len();

    if strict.is_empty() && input_count > 0 {
        let report = DateFilterReport {
            window,
            input_count,
            strict_count,
            relaxed: true,
        };
        return (jobs, report);
    }

    let report = DateFilterReport {
        window,
        input_count,
        strict_count,
        relaxed: false,
    };
    (strict, report)
}

// ────────────────────────────────────────────────────────────────────────────
// Contract-only
// ────────────────────────────────────────────────────────────────────────────

/// Keyword search over the whole serialized record, so a contract hint in any
/// field (title, description, employment type) counts.
pub fn is_contract_job(job: &JobResult) -> bool {
    let haystack = serde_json::to_string(job)
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    CONTRACT_KEYWORDS.iter().any(|kw| haystack.contains(kw))
}

// ────────────────────────────────────────────────────────────────────────────
// Dedup
// ────────────────────────────────────────────────────────────────────────────

/// `company_title_location`, lowercased, whitespace runs collapsed to `_`.
pub fn dedup_key(job: &JobResult) -> String {
    let raw = format!(
        "{}_{}_{}",
        job.company,
        job.title,
        job.location.as_deref().unwrap_or("")
    )
    .to_lowercase();
    WHITESPACE_RE.replace_all(raw.trim(), "_").into_owned()
}

/// First occurrence of each key wins; order is otherwise preserved.
pub fn dedup_jobs(jobs: Vec<JobResult>) -> Vec<JobResult> {
    let mut seen = HashSet::new();
    jobs.into_iter()
        .filter(|job| seen.insert(dedup_key(job)))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Location
// ────────────────────────────────────────────────────────────────────────────

/// "Austin, TX" → ["austin", "tx"]; "Austin TX" → ["austin", "tx"];
/// "New York" → ["new york"].
pub fn parse_location_parts(location: &str) -> Vec<String> {
    let lower = location.trim().to_lowercase();
    if lower.is_empty() {
        return Vec::new();
    }
    if lower.contains(',') {
        return lower
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
    }

    let tokens: Vec<&str> = lower.split_whitespace().collect();
    match tokens.split_last() {
        Some((state, city)) if !city.is_empty() && is_state_code(state) => {
            vec![city.join(" "), state.to_string()]
        }
        _ => vec![tokens.join(" ")],
    }
}

fn is_state_code(token: &str) -> bool {
    token.len() == 2 && token.chars().all(|c| c.is_ascii_alphabetic())
}

/// Keeps jobs whose location contains every part of `location`. Arrangement-only
/// locations ("Remote", "Hybrid") are kept, as are remote jobs whenever the
/// preference allows remote work. A job without a location matches nothing.
pub fn filter_by_location(
    jobs: Vec<JobResult>,
    location: &str,
    preference: RemotePreference,
) -> Vec<JobResult> {
    let parts = parse_location_parts(location);
    if parts.is_empty() {
        return jobs;
    }

    jobs.into_iter()
        .filter(|job| {
            if preference.allows_remote() && job.remote_type == Some(RemoteType::Remote) {
                return true;
            }
            let Some(job_location) = job.location.as_deref() else {
                return false;
            };
            if is_arrangement_only(job_location) {
                return true;
            }
            let job_location = job_location.to_lowercase();
            parts.iter().all(|part| job_location.contains(part.as_str()))
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Remote type
// ────────────────────────────────────────────────────────────────────────────

pub fn filter_by_remote_type(jobs: Vec<JobResult>, preference: RemotePreference) -> Vec<JobResult> {
    match preference {
        RemotePreference::Any => jobs,
        RemotePreference::Remote => jobs
            .into_iter()
            .filter(|job| job.remote_type == Some(RemoteType::Remote))
            .collect(),
        RemotePreference::Local | RemotePreference::Onsite | RemotePreference::Hybrid => jobs
            .into_iter()
            .filter(|job| {
                matches!(
                    job.remote_type,
                    Some(RemoteType::Hybrid) | Some(RemoteType::Onsite)
                )
            })
            .collect(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Employment type
// ────────────────────────────────────────────────────────────────────────────

fn employment_synonyms(wanted: &str) -> Option<&'static [&'static str]> {
    let compact = wanted.replace(['-', '_', ' '], "");
    match compact.as_str() {
        "fulltime" | "full" | "permanent" => Some(FULL_TIME),
        "parttime" | "part" => Some(PART_TIME),
        "contract" | "contractor" | "freelance" => Some(CONTRACT),
        "internship" | "intern" => Some(INTERNSHIP),
        "temporary" | "temp" | "seasonal" => Some(TEMPORARY),
        _ => None,
    }
}

/// True when the job's provider-specific employment type matches `wanted`.
/// Jobs that don't state a type always match.
pub fn matches_employment_type(job: &JobResult, wanted: &str) -> bool {
    let Some(actual) = job.employment_type.as_deref() else {
        return true;
    };
    let actual = actual.to_lowercase();
    let wanted = wanted.trim().to_lowercase();
    match employment_synonyms(&wanted) {
        Some(synonyms) => synonyms.iter().any(|s| actual.contains(s)),
        None => actual.contains(&wanted),
    }
}

pub fn filter_by_employment_type(jobs: Vec<JobResult>, wanted: Option<&str>) -> Vec<JobResult> {
    let wanted = match wanted.map(str::trim) {
        Some(w) if !w.is_empty() && !w.eq_ignore_ascii_case("any") => w,
        _ => return jobs,
    };
    jobs.into_iter()
        .filter(|job| matches_employment_type(job, wanted))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Salary
// ────────────────────────────────────────────────────────────────────────────

/// Drops jobs whose known range lies entirely outside `[min, max]`.
pub fn filter_by_salary(
    jobs: Vec<JobResult>,
    min: Option<f64>,
    max: Option<f64>,
) -> Vec<JobResult> {
    if min.is_none() && max.is_none() {
        return jobs;
    }
    jobs.into_iter()
        .filter(|job| {
            let upper = job.salary_max.or(job.salary_min);
            let lower = job.salary_min.or(job.salary_max);
            let below = matches!((upper, min), (Some(u), Some(m)) if u < m);
            let above = matches!((lower, max), (Some(l), Some(m)) if l > m);
            !below && !above
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Sort + pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Score descending (unscored last), then posting date descending. Stable.
pub fn sort_jobs(jobs: &mut [JobResult]) {
    jobs.sort_by(|a, b| {
        let by_score = match (a.match_score, b.match_score) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_score.then_with(|| b.posted_at().cmp(&a.posted_at()))
    });
}

pub fn run_pipeline(
    jobs: Vec<JobResult>,
    filters: &SearchFilters,
    location: Option<&str>,
    now: DateTime<Utc>,
) -> (Vec<JobResult>, FilterReport) {
    let (jobs, date) = filter_by_date(jobs, filters.date_posted, now);
    let after_date = jobs.len();

    let jobs = if filters.contract_only {
        jobs.into_iter().filter(is_contract_job).collect()
    } else {
        jobs
    };
    let after_contract = jobs.len();

    let jobs = dedup_jobs(jobs);
    let after_dedup = jobs.len();

    let jobs = match location.map(str::trim).filter(|l| !l.is_empty()) {
        Some(location) => filter_by_location(jobs, location, filters.remote_type),
        None => jobs,
    };
    let after_location = jobs.len();

    let jobs = filter_by_remote_type(jobs, filters.remote_type);
    let after_remote = jobs.len();

    let jobs = filter_by_employment_type(jobs, filters.employment_type.as_deref());
    let after_employment = jobs.len();

    let jobs = filter_by_salary(jobs, filters.salary_min, filters.salary_max);
    let after_salary = jobs.len();

    let report = FilterReport {
        date,
        after_date,
        after_contract,
        after_dedup,
        after_location,
        after_remote,
        after_employment,
        after_salary,
    };
    (jobs, report)
}
