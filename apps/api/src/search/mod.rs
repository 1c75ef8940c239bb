pub mod aggregator;
pub mod boolean_query;
pub mod filters;
pub mod handlers;
pub mod listings;
pub mod models;
pub mod scoring;

#[cfg(test)]
pub mod test_support;

pub use aggregator::Aggregator;
