// Netta top lists - ranking engine and cache for a small social feed

// Core primitives: ids, scoring, hashtag extraction
pub mod core;

// Feed entities
pub mod models;

// Top-list computation
pub mod ranking;

// Corpus storage, cache and monitoring
pub mod infrastructure;

// Mutation glue and HTTP routes
pub mod feed_interface;

// Common utilities
pub mod app_state;
pub mod config;
pub mod data_seeder;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
pub use feed_interface::FeedInterface;
pub use infrastructure::{CorpusSource, InMemoryCorpus, RefreshError, TopListCache};
pub use ranking::{RankingEngine, TopListSnapshot};
