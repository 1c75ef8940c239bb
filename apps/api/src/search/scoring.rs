//! Match scoring: ranks jobs against the caller's career vault.
//!
//! The scorer is a collaborator behind `MatchScorer` so the aggregator never
//! touches the database directly. Any failure to read the vault leaves the jobs
//! unscored rather than failing the search.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::vault::VaultProfile;
use crate::models::JobResult;

// ────────────────────────────────────────────────────────────────────────────
// Weights
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    /// Awarded once when the title contains any target role.
    pub title: u32,
    /// Per matching skill.
    pub skill: u32,
    /// Upper bound on the skill component.
    pub skill_cap: u32,
    /// Awarded when the job is at most `fresh_days` calendar days old, the same
    /// age the `datePosted` filter uses.
    pub fresh: u32,
    pub fresh_days: i64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            title: 50,
            skill: 5,
            skill_cap: 40,
            fresh: 10,
            fresh_days: 7,
        }
    }
}

/// Pure scoring function, clamped to 0..=100.
pub fn score_job(
    job: &JobResult,
    profile: &VaultProfile,
    weights: &ScoringWeights,
    now: DateTime<Utc>,
) -> u32 {
    let title = job.title.to_lowercase();
    let text = job.search_text();

    let title_score = if profile
        .target_roles
        .iter()
        .map(|role| role.trim().to_lowercase())
        .any(|role| !role.is_empty() && title.contains(&role))
    {
        weights.title
    } else {
        0
    };

    let matching_skills = profile
        .skills
        .iter()
        .map(|skill| skill.trim().to_lowercase())
        .filter(|skill| !skill.is_empty() && text.contains(skill.as_str()))
        .count() as u32;
    let skill_score = matching_skills
        .saturating_mul(weights.skill)
        .min(weights.skill_cap);

    let fresh_score = match job.age_in_days(now) {
        Some(age) if age <= weights.fresh_days => weights.fresh,
        _ => 0,
    };

    title_score
        .saturating_add(skill_score)
        .saturating_add(fresh_score)
        .min(100)
}

// ────────────────────────────────────────────────────────────────────────────
// Vault access
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// `Ok(None)` when the user has no vault.
    async fn load_profile(&self, user_id: &str) -> Result<Option<VaultProfile>>;
}

pub struct PgProfileStore {
    db: PgPool,
}

impl PgProfileStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn load_profile(&self, user_id: &str) -> Result<Option<VaultProfile>> {
        let user_id = Uuid::parse_str(user_id.trim())
            .with_context(|| format!("invalid user id '{user_id}'"))?;
        let profile = sqlx::query_as::<_, VaultProfile>(
            "SELECT target_roles, skills FROM career_vault WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("failed to read career vault")?;
        Ok(profile)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scorer
// ────────────────────────────────────────────────────────────────────────────

/// Scores a result set for one user. Carried by the aggregator as `Arc<dyn MatchScorer>`.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    /// Returns the same jobs, in the same order, with `match_score` set when possible.
    async fn score(&self, jobs: Vec<JobResult>, user_id: &str) -> Vec<JobResult>;
}

pub struct VaultMatchScorer {
    profiles: Arc<dyn ProfileStore>,
    weights: ScoringWeights,
}

impl VaultMatchScorer {
    pub fn new(profiles: Arc<dyn ProfileStore>, weights: ScoringWeights) -> Self {
        Self { profiles, weights }
    }
}

#[async_trait]
impl MatchScorer for VaultMatchScorer {
    async fn score(&self, mut jobs: Vec<JobResult>, user_id: &str) -> Vec<JobResult> {
        let profile = match self.profiles.load_profile(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                debug!("No career vault for user {user_id}; results left unscored");
                return jobs;
            }
            Err(e) => {
                warn!("Vault read failed, results left unscored: {e:#}");
                return jobs;
            }
        };

        let now = Utc::now();
        for job in &mut jobs {
            job.match_score = Some(score_job(job, &profile, &self.weights, now));
        }
        jobs
    }
}
