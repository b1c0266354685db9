// Infrastructure modules
pub mod cache;      // TTL top-list cache with explicit invalidation
pub mod corpus;     // In-memory users and posts
pub mod monitoring; // Tracing setup and cache counters
pub mod traits;     // Corpus access seam

pub use cache::{Ranker, RefreshError, TopListCache};
pub use corpus::{Corpus, CorpusSnapshot, InMemoryCorpus};
pub use monitoring::{initialize_tracing, CacheMetrics, CacheMetricsSnapshot};
pub use traits::CorpusSource;
