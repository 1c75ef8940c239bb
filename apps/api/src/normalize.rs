//! Normalization: pure text heuristics shared by every source adapter.
//!
//! Remote-type inference, posting-date parsing, salary annualization and HTML
//! cleanup live here, decoupled from HTTP, so each heuristic can be tuned and
//! tested against plain strings.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::RemoteType;

/// Descriptions are cut to this many characters before persistence.
pub const MAX_DESCRIPTION_CHARS: usize = 5000;

const HOURS_PER_YEAR: f64 = 2080.0;

static RELATIVE_NUMERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\+?\s*(minute|min|hour|hr|day|week|month|year)s?\s+ago").unwrap()
});

static RELATIVE_SINGLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:a|an|one)\s+(minute|hour|day|week|month|year)\s+ago").unwrap()
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static SALARY_AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\$?\s*(\d{1,3}(?:,\d{3})+|\d+(?:\.\d+)?)\s*(k)?").unwrap());

/// Words that, on their own, describe a work arrangement rather than a place.
const ARRANGEMENT_WORDS: &[&str] = &[
    "remote",
    "hybrid",
    "onsite",
    "on-site",
    "on site",
    "in office",
    "in-office",
    "anywhere",
    "work from home",
    "wfh",
];

const REMOTE_DESCRIPTION_HINTS: &[&str] = &[
    "fully remote",
    "100% remote",
    "remote position",
    "remote role",
    "remote-first",
    "work from home",
    "work from anywhere",
];

/// Renders a timestamp the way every `JobResult.posted_date` is stored.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Infers the work arrangement from free-text location and description.
/// An explicit arrangement in the location wins; a non-empty location without one
/// reads as onsite; no information at all stays unknown.
pub fn infer_remote_type(location: Option<&str>, description: Option<&str>) -> Option<RemoteType> {
    let location = location.map(|l| l.trim().to_lowercase()).unwrap_or_default();

    if location.contains("hybrid") {
        return Some(RemoteType::Hybrid);
    }
    if location.contains("remote")
        || location.contains("anywhere")
        || location.contains("work from home")
    {
        return Some(RemoteType::Remote);
    }

    if let Some(description) = description {
        let description = description.to_lowercase();
        if description.contains("hybrid role")
            || description.contains("hybrid position")
            || description.contains("hybrid schedule")
        {
            return Some(RemoteType::Hybrid);
        }
        if REMOTE_DESCRIPTION_HINTS
            .iter()
            .any(|hint| description.contains(hint))
        {
            return Some(RemoteType::Remote);
        }
    }

    if location.is_empty() {
        None
    } else {
        Some(RemoteType::Onsite)
    }
}

/// Maps a provider's workplace label ("Remote", "on-site", "OnSite", "hybrid") to a
/// `RemoteType`, falling back to text inference for unknown labels.
pub fn remote_type_from_label(
    label: Option<&str>,
    location: Option<&str>,
    description: Option<&str>,
) -> Option<RemoteType> {
    let normalized = label
        .map(|l| l.to_lowercase().replace(['-', '_', ' '], ""))
        .unwrap_or_default();
    match normalized.as_str() {
        "remote" => Some(RemoteType::Remote),
        "hybrid" => Some(RemoteType::Hybrid),
        "onsite" | "inoffice" | "office" => Some(RemoteType::Onsite),
        _ => infer_remote_type(location, description),
    }
}

/// True when a location string is just a work-arrangement word such as "Hybrid".
pub fn is_arrangement_only(location: &str) -> bool {
    let location = location.trim().to_lowercase();
    ARRANGEMENT_WORDS.iter().any(|word| location == *word)
}

/// Converts "3 days ago", "Posted 30+ Days Ago", "yesterday" or "just posted" into an
/// absolute timestamp, truncated to the start of the day.
pub fn parse_relative_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lower = text.trim().to_lowercase();

    let offset = if lower.contains("just posted")
        || lower.contains("just now")
        || lower.contains("today")
    {
        Some(Duration::zero())
    } else if lower.contains("yesterday") {
        Some(Duration::days(1))
    } else if let Some(caps) = RELATIVE_NUMERIC_RE.captures(&lower) {
        let amount: u64 = caps[1].parse().ok()?;
        unit_duration(&caps[2], amount)
    } else if let Some(caps) = RELATIVE_SINGLE_RE.captures(&lower) {
        unit_duration(&caps[1], 1)
    } else {
        None
    }?;

    start_of_day(now.checked_sub_signed(offset)?)
}

/// `None` when the amount does not fit a chrono `Duration`.
fn unit_duration(unit: &str, amount: u64) -> Option<Duration> {
    const DAY: u64 = 86_400;
    let unit_secs = match unit {
        "minute" | "min" => 60,
        "hour" | "hr" => 3_600,
        "day" => DAY,
        "week" => 7 * DAY,
        "month" => 30 * DAY,
        "year" => 365 * DAY,
        _ => return None,
    };
    let secs = amount.checked_mul(unit_secs)?;
    Duration::from_std(std::time::Duration::from_secs(secs)).ok()
}

fn start_of_day(at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    at.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parses the posting-date formats seen across providers: RFC 3339, naive ISO
/// timestamps, `2024-01-10 09:21:37 UTC`, bare dates, epoch seconds/millis and
/// relative text.
pub fn parse_posted_date(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S UTC", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }
    if raw.chars().all(|c| c.is_ascii_digit()) {
        let value: i64 = raw.parse().ok()?;
        return if value > 10_000_000_000 {
            Utc.timestamp_millis_opt(value).single()
        } else {
            Utc.timestamp_opt(value, 0).single()
        };
    }

    parse_relative_date(raw, now)
}

/// `parse_posted_date` rendered as ISO-8601, falling back to `now` when the provider
/// gave nothing usable.
pub fn posted_date_or_now(raw: Option<&str>, now: DateTime<Utc>) -> String {
    let parsed = raw.and_then(|r| parse_posted_date(r, now));
    iso_timestamp(parsed.unwrap_or(now))
}

/// Scales a pay amount to a yearly figure. Accepts words ("hourly", "per-year-salary")
/// and USAJobs rate codes (`PH`, `PA`, `BW`, ...).
pub fn annualize(amount: f64, period: &str) -> f64 {
    let period = period.trim().to_lowercase();
    let factor = match period.as_str() {
        "ph" => HOURS_PER_YEAR,
        "pd" => 260.0,
        "pw" => 52.0,
        "bw" => 26.0,
        "pm" => 12.0,
        "pa" | "py" => 1.0,
        p if p.contains("hour") => HOURS_PER_YEAR,
        p if p.contains("day") || p.contains("daily") => 260.0,
        p if p.contains("biweek") => 26.0,
        p if p.contains("week") => 52.0,
        p if p.contains("month") => 12.0,
        _ => 1.0,
    };
    (amount * factor).round()
}

/// Extracts an annual range from display text such as "100K–150K a year" or
/// "$25.50–$30 an hour".
pub fn parse_salary_text(text: &str) -> (Option<f64>, Option<f64>) {
    let lower = text.to_lowercase();
    let amounts: Vec<f64> = SALARY_AMOUNT_RE
        .captures_iter(&lower)
        .filter_map(|caps| {
            let value: f64 = caps[1].replace(',', "").parse().ok()?;
            Some(if caps.get(2).is_some() { value * 1000.0 } else { value })
        })
        .take(2)
        .collect();

    let period = if lower.contains("hour") {
        "hour"
    } else if lower.contains("day") {
        "day"
    } else if lower.contains("week") {
        "week"
    } else if lower.contains("month") {
        "month"
    } else {
        "year"
    };

    match amounts.as_slice() {
        [] => (None, None),
        [single] => {
            let annual = annualize(*single, period);
            (Some(annual), Some(annual))
        }
        [min, max, ..] => (Some(annualize(*min, period)), Some(annualize(*max, period))),
    }
}

/// Removes markup from provider descriptions. Handles both raw HTML and the
/// entity-escaped HTML some boards return.
pub fn strip_html(text: &str) -> String {
    let unescaped = decode_entities(text);
    let without_tags = TAG_RE.replace_all(&unescaped, " ");
    let decoded = decode_entities(&without_tags);
    WHITESPACE_RE.replace_all(decoded.trim(), " ").into_owned()
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Truncates on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Joins the non-empty parts of a structured address ("Austin", "TX", "US").
pub fn join_location(parts: &[Option<&str>]) -> Option<String> {
    let joined = parts
        .iter()
        .flatten()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_location_remote_wins() {
        assert_eq!(
            infer_remote_type(Some("Remote - US"), None),
            Some(RemoteType::Remote)
        );
        assert_eq!(
            infer_remote_type(Some("New York, NY (Hybrid)"), None),
            Some(RemoteType::Hybrid)
        );
    }

    #[test]
    fn test_description_hint_when_location_silent() {
        assert_eq!(
            infer_remote_type(Some("Denver, CO"), Some("This is a fully remote role.")),
            Some(RemoteType::Remote)
        );
    }

    #[test]
    fn test_plain_location_is_onsite_and_nothing_is_unknown() {
        assert_eq!(
            infer_remote_type(Some("Austin, TX"), Some("Great team")),
            Some(RemoteType::Onsite)
        );
        assert_eq!(infer_remote_type(None, None), None);
        assert_eq!(infer_remote_type(Some("  "), None), None);
    }

    #[test]
    fn test_remote_label_mapping() {
        assert_eq!(
            remote_type_from_label(Some("OnSite"), None, None),
            Some(RemoteType::Onsite)
        );
        assert_eq!(
            remote_type_from_label(Some("on-site"), None, None),
            Some(RemoteType::Onsite)
        );
        assert_eq!(
            remote_type_from_label(Some("unspecified"), Some("Remote"), None),
            Some(RemoteType::Remote)
        );
    }

    #[test]
    fn test_arrangement_only_locations() {
        assert!(is_arrangement_only("Hybrid"));
        assert!(is_arrangement_only(" remote "));
        assert!(!is_arrangement_only("Remote - Austin, TX"));
        assert!(!is_arrangement_only("Seattle, WA"));
    }

    #[test]
    fn test_relative_dates_truncate_to_day() {
        let expected = Utc.with_ymd_and_hms(2024, 6, 12, 0, 0, 0).unwrap();
        assert_eq!(parse_relative_date("3 days ago", noon()), Some(expected));
        assert_eq!(
            parse_relative_date("Posted 30+ Days Ago", noon()),
            Some(Utc.with_ymd_and_hms(2024, 5, 16, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_relative_date("a week ago", noon()),
            Some(Utc.with_ymd_and_hms(2024, 6, 8, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_relative_date("Posted Yesterday", noon()),
            Some(Utc.with_ymd_and_hms(2024, 6, 14, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_relative_date("Just posted", noon()),
            Some(Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_relative_date("sometime", noon()), None);
    }

    #[test]
    fn test_out_of_range_relative_dates_are_rejected() {
        assert_eq!(parse_relative_date("Posted 9999999 years ago", noon()), None);
        assert_eq!(parse_relative_date("200000000000000 days ago", noon()), None);
        assert_eq!(
            parse_relative_date("18446744073709551615 weeks ago", noon()),
            None
        );
        assert_eq!(
            parse_relative_date("99999999999999999999999 minutes ago", noon()),
            None
        );
        assert_eq!(
            posted_date_or_now(Some("200000000000000 days ago"), noon()),
            "2024-06-15T12:30:00.000Z"
        );
    }

    #[test]
    fn test_posted_date_formats() {
        let day = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(
            parse_posted_date("2024-01-10T09:21:37Z", noon()),
            Some(Utc.with_ymd_and_hms(2024, 1, 10, 9, 21, 37).unwrap())
        );
        assert_eq!(
            parse_posted_date("2024-01-10 09:21:37 UTC", noon()),
            Some(Utc.with_ymd_and_hms(2024, 1, 10, 9, 21, 37).unwrap())
        );
        assert_eq!(parse_posted_date("2024-01-10T00:00:00.0000", noon()), Some(day));
        assert_eq!(parse_posted_date("2024-01-10", noon()), Some(day));
        assert_eq!(parse_posted_date("1704844800000", noon()), Some(day));
        assert_eq!(parse_posted_date("1704844800", noon()), Some(day));
    }

    #[test]
    fn test_posted_date_falls_back_to_now() {
        assert_eq!(
            posted_date_or_now(Some("not a date"), noon()),
            "2024-06-15T12:30:00.000Z"
        );
        assert_eq!(posted_date_or_now(None, noon()), "2024-06-15T12:30:00.000Z");
    }

    #[test]
    fn test_annualize_periods() {
        assert_eq!(annualize(50.0, "hourly"), 104_000.0);
        assert_eq!(annualize(50.0, "PH"), 104_000.0);
        assert_eq!(annualize(120_000.0, "PA"), 120_000.0);
        assert_eq!(annualize(10_000.0, "month"), 120_000.0);
        assert_eq!(annualize(90_000.0, "per-year-salary"), 90_000.0);
    }

    #[test]
    fn test_salary_text() {
        assert_eq!(
            parse_salary_text("100K–150K a year"),
            (Some(100_000.0), Some(150_000.0))
        );
        assert_eq!(
            parse_salary_text("$25–$30 an hour"),
            (Some(52_000.0), Some(62_400.0))
        );
        assert_eq!(
            parse_salary_text("$120,000 a year"),
            (Some(120_000.0), Some(120_000.0))
        );
        assert_eq!(parse_salary_text("Competitive"), (None, None));
    }

    #[test]
    fn test_strip_escaped_html() {
        let escaped = "&lt;p&gt;Build &amp;amp; ship&lt;/p&gt;&lt;ul&gt;&lt;li&gt;Rust&lt;/li&gt;&lt;/ul&gt;";
        assert_eq!(strip_html(escaped), "Build & ship Rust");
        assert_eq!(strip_html("<b>Senior</b>  Engineer"), "Senior Engineer");
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_join_location_skips_empty_parts() {
        assert_eq!(
            join_location(&[Some("Austin"), Some(""), Some("US")]),
            Some("Austin, US".to_string())
        );
        assert_eq!(join_location(&[None, Some(" ")]), None);
    }
}
