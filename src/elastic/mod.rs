//! Elasticsearch access: query bodies for the three retrieval strategies and response normalization.

pub mod client;
mod hits;
pub mod query;
pub mod types;

pub use client::{ElasticClient, Retrieval, SearchClient, SearchError};
pub use query::Strategy;
pub use types::{Hit, Passage};
