use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::search::scoring::ScoringWeights;

/// Provider credentials. Each is optional; an adapter without its credentials
/// reports an error status per search instead of blocking startup.
#[derive(Debug, Clone, Default)]
pub struct SourceCredentials {
    pub serpapi_api_key: Option<String>,
    pub usajobs_api_key: Option<String>,
    /// Contact email USAJobs requires in the User-Agent header.
    pub usajobs_user_agent: Option<String>,
    pub adzuna_app_id: Option<String>,
    pub adzuna_app_key: Option<String>,
    pub rapidapi_key: Option<String>,
}

/// Application configuration loaded from environment variables.
/// Only `DATABASE_URL` is required.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub credentials: SourceCredentials,
    /// Overrides the built-in ATS company list.
    pub ats_companies_path: Option<PathBuf>,
    pub scoring: ScoringWeights,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = ScoringWeights::default();
        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            credentials: SourceCredentials {
                serpapi_api_key: optional_env("SERPAPI_API_KEY"),
                usajobs_api_key: optional_env("USAJOBS_API_KEY"),
                usajobs_user_agent: optional_env("USAJOBS_USER_AGENT"),
                adzuna_app_id: optional_env("ADZUNA_APP_ID"),
                adzuna_app_key: optional_env("ADZUNA_APP_KEY"),
                rapidapi_key: optional_env("RAPIDAPI_KEY"),
            },
            ats_companies_path: optional_env("ATS_COMPANIES_PATH").map(PathBuf::from),
            scoring: ScoringWeights {
                title: parse_env("SCORE_TITLE_WEIGHT", defaults.title)?,
                skill: parse_env("SCORE_SKILL_WEIGHT", defaults.skill)?,
                skill_cap: parse_env("SCORE_SKILL_CAP", defaults.skill_cap)?,
                fresh: parse_env("SCORE_FRESH_WEIGHT", defaults.fresh)?,
                fresh_days: parse_env("SCORE_FRESH_DAYS", defaults.fresh_days)?,
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("{key} has an invalid value '{raw}'"))
}
