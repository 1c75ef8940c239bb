//! In-memory fakes for the aggregator's collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::models::JobResult;
use crate::search::listings::ListingStore;
use crate::search::scoring::MatchScorer;
use crate::sources::{SourceAdapter, SourceError, SourceFamily, SourcePage, SourceRequest};

pub fn job(id: &str, title: &str, source: &str) -> JobResult {
    JobResult::new(id, title, "Acme", source, Utc::now())
}

enum Behaviour {
    Jobs(Vec<JobResult>),
    Fail,
    Panic,
}

pub struct FakeAdapter {
    key: &'static str,
    family: SourceFamily,
    behaviour: Behaviour,
    next_page: Option<String>,
    calls: AtomicUsize,
    tokens: Mutex<Vec<Option<String>>>,
}

impl FakeAdapter {
    fn new(key: &'static str, family: SourceFamily, behaviour: Behaviour) -> Self {
        Self {
            key,
            family,
            behaviour,
            next_page: None,
            calls: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn with_jobs(key: &'static str, family: SourceFamily, jobs: Vec<JobResult>) -> Self {
        Self::new(key, family, Behaviour::Jobs(jobs))
    }

    pub fn failing(key: &'static str, family: SourceFamily) -> Self {
        Self::new(key, family, Behaviour::Fail)
    }

    pub fn panicking(key: &'static str, family: SourceFamily) -> Self {
        Self::new(key, family, Behaviour::Panic)
    }

    pub fn with_next_page(mut self, token: &str) -> Self {
        self.next_page = Some(token.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Page tokens received, one entry per call.
    pub fn tokens(&self) -> Vec<Option<String>> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceAdapter for FakeAdapter {
    fn key(&self) -> &'static str {
        self.key
    }

    fn family(&self) -> SourceFamily {
        self.family
    }

    async fn search(&self, request: &SourceRequest) -> Result<SourcePage, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(request.page_token.clone());
        match &self.behaviour {
            Behaviour::Jobs(jobs) => Ok(SourcePage {
                jobs: jobs.clone(),
                next_page_token: self.next_page.clone(),
            }),
            Behaviour::Fail => Err(SourceError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            }),
            Behaviour::Panic => panic!("adapter blew up"),
        }
    }
}

pub struct UnscoredScorer;

#[async_trait]
impl MatchScorer for UnscoredScorer {
    async fn score(&self, jobs: Vec<JobResult>, _user_id: &str) -> Vec<JobResult> {
        jobs
    }
}

/// Assigns preset scores by job id.
pub struct FixedScorer(HashMap<String, u32>);

impl FixedScorer {
    pub fn new(scores: &[(&str, u32)]) -> Self {
        Self(
            scores
                .iter()
                .map(|(id, score)| (id.to_string(), *score))
                .collect(),
        )
    }
}

#[async_trait]
impl MatchScorer for FixedScorer {
    async fn score(&self, mut jobs: Vec<JobResult>, _user_id: &str) -> Vec<JobResult> {
        for job in &mut jobs {
            job.match_score = self.0.get(&job.id).copied();
        }
        jobs
    }
}

#[derive(Default)]
pub struct RecordingListings {
    fail: bool,
    saved: Mutex<Vec<JobResult>>,
}

impl RecordingListings {
    pub fn failing() -> Self {
        Self {
            fail: true,
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn saved(&self) -> Vec<JobResult> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListingStore for RecordingListings {
    async fn upsert(&self, jobs: &[JobResult]) -> anyhow::Result<u64> {
        if self.fail {
            anyhow::bail!("database unavailable");
        }
        self.saved.lock().unwrap().extend_from_slice(jobs);
        Ok(jobs.len() as u64)
    }
}
