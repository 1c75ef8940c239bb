pub mod job;
pub mod listing;
pub mod vault;

pub use job::{DatePosted, JobResult, PageCursor, RemotePreference, RemoteType, SearchFilters};
