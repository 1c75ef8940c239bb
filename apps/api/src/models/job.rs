use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::iso_timestamp;

/// Work arrangement inferred for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteType {
    Remote,
    Hybrid,
    Onsite,
}

impl RemoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteType::Remote => "remote",
            RemoteType::Hybrid => "hybrid",
            RemoteType::Onsite => "onsite",
        }
    }
}

/// The normalized record every source adapter produces.
///
/// `id` is source-prefixed (`google_<id>`, `lever_<id>`, ...) and together with
/// `source` forms the upsert key of the listings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub description: Option<String>,
    /// RFC 3339, UTC.
    pub posted_date: String,
    pub apply_url: Option<String>,
    /// Display label of the producing adapter, e.g. `USAJobs.gov`.
    pub source: String,
    pub remote_type: Option<RemoteType>,
    /// Provider vocabulary, not normalized ("FULLTIME", "Full-time", "permanent").
    pub employment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_skills: Option<Vec<String>>,
}

impl JobResult {
    /// Creates a record with every optional field empty and `posted_date` set to `posted_at`.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        company: impl Into<String>,
        source: &str,
        posted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            company: company.into(),
            location: None,
            salary_min: None,
            salary_max: None,
            description: None,
            posted_date: iso_timestamp(posted_at),
            apply_url: None,
            source: source.to_string(),
            remote_type: None,
            employment_type: None,
            match_score: None,
            required_skills: None,
        }
    }

    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.posted_date)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    /// Calendar days between the posting date and `now`, both taken in UTC.
    /// A job posted late yesterday is one day old.
    pub fn age_in_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.posted_at()
            .map(|posted| (now.date_naive() - posted.date_naive()).num_days())
    }

    /// Lowercased `title + description`, the haystack for keyword matching.
    pub fn search_text(&self) -> String {
        let mut text = self.title.to_lowercase();
        if let Some(description) = &self.description {
            text.push(' ');
            text.push_str(&description.to_lowercase());
        }
        text
    }
}

/// Relative posting-date windows accepted by the date filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatePosted {
    #[default]
    #[serde(rename = "any", alias = "all")]
    Any,
    #[serde(rename = "24h", alias = "today", alias = "1d")]
    Day,
    #[serde(rename = "3d", alias = "3days")]
    ThreeDays,
    #[serde(rename = "7d", alias = "week")]
    Week,
    #[serde(rename = "14d")]
    TwoWeeks,
    #[serde(rename = "30d", alias = "month")]
    Month,
}

impl DatePosted {
    /// Maximum listing age in days, `None` for `any`.
    pub fn max_age_days(&self) -> Option<i64> {
        match self {
            DatePosted::Any => None,
            DatePosted::Day => Some(1),
            DatePosted::ThreeDays => Some(3),
            DatePosted::Week => Some(7),
            DatePosted::TwoWeeks => Some(14),
            DatePosted::Month => Some(30),
        }
    }
}

/// The caller's work-arrangement preference. `local`, `onsite` and `hybrid` are synonyms
/// for "not fully remote".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemotePreference {
    #[default]
    #[serde(alias = "all")]
    Any,
    Remote,
    Hybrid,
    #[serde(alias = "on-site", alias = "on_site")]
    Onsite,
    Local,
}

impl RemotePreference {
    pub fn allows_remote(&self) -> bool {
        matches!(self, RemotePreference::Any | RemotePreference::Remote)
    }
}

/// Source-tagged pagination cursor. A bare string is accepted on input and read as a
/// Google Jobs token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CursorRepr")]
pub struct PageCursor {
    pub source: String,
    pub token: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CursorRepr {
    Bare(String),
    Tagged { source: String, token: String },
}

impl From<CursorRepr> for PageCursor {
    fn from(repr: CursorRepr) -> Self {
        match repr {
            CursorRepr::Bare(token) => PageCursor {
                source: crate::sources::google_jobs::KEY.to_string(),
                token,
            },
            CursorRepr::Tagged { source, token } => PageCursor { source, token },
        }
    }
}

/// Filters shaping a search. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    pub date_posted: DatePosted,
    pub contract_only: bool,
    pub remote_type: RemotePreference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boolean_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<PageCursor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_miles: Option<f64>,
}
