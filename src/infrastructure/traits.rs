use async_trait::async_trait;

use crate::error::AppResult;
use crate::infrastructure::corpus::CorpusSnapshot;

/// Read accessor over the corpus the rankings are computed from.
///
/// Implementations return the latest committed users and posts as one owned
/// snapshot. Any I/O (loading from a store) happens here, before ranking.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    async fn snapshot(&self) -> AppResult<CorpusSnapshot>;
}
