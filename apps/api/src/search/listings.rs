use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::models::listing::{listing_records, ListingRecord};
use crate::models::JobResult;

/// Bind parameters per row; keeps a chunk well under Postgres' 65535 limit.
const COLUMNS_PER_ROW: usize = 13;
const ROWS_PER_STATEMENT: usize = 65535 / COLUMNS_PER_ROW;

/// Where search results are persisted.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Upserts `jobs` keyed on `(external_id, source)`; returns rows written.
    async fn upsert(&self, jobs: &[JobResult]) -> Result<u64>;
}

pub struct PgListingStore {
    db: PgPool,
}

impl PgListingStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ListingStore for PgListingStore {
    async fn upsert(&self, jobs: &[JobResult]) -> Result<u64> {
        let records = listing_records(jobs);
        let mut written = 0;
        for chunk in records.chunks(ROWS_PER_STATEMENT) {
            let mut query = upsert_query(chunk);
            let result = query
                .build()
                .execute(&self.db)
                .await
                .context("job_listings upsert failed")?;
            written += result.rows_affected();
        }
        debug!("Upserted {written} job listings");
        Ok(written)
    }
}

fn upsert_query(records: &[ListingRecord]) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(
        "INSERT INTO job_listings (external_id, source, title, company, location, \
         salary_min, salary_max, description, posted_date, apply_url, remote_type, \
         employment_type, required_skills) ",
    );
    builder.push_values(records, |mut row, record| {
        row.push_bind(&record.external_id)
            .push_bind(&record.source)
            .push_bind(&record.title)
            .push_bind(&record.company)
            .push_bind(&record.location)
            .push_bind(record.salary_min)
            .push_bind(record.salary_max)
            .push_bind(&record.description)
            .push_bind(record.posted_date)
            .push_bind(&record.apply_url)
            .push_bind(&record.remote_type)
            .push_bind(&record.employment_type)
            .push_bind(&record.required_skills);
    });
    builder.push(
        " ON CONFLICT (external_id, source) DO UPDATE SET \
         title = EXCLUDED.title, \
         company = EXCLUDED.company, \
         location = EXCLUDED.location, \
         salary_min = EXCLUDED.salary_min, \
         salary_max = EXCLUDED.salary_max, \
         description = EXCLUDED.description, \
         posted_date = EXCLUDED.posted_date, \
         apply_url = EXCLUDED.apply_url, \
         remote_type = EXCLUDED.remote_type, \
         employment_type = EXCLUDED.employment_type, \
         required_skills = EXCLUDED.required_skills, \
         is_active = true, \
         last_seen_at = now()",
    );
    builder
}
