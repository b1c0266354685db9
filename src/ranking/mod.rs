// Ranking - top-list computation over corpus snapshots

pub mod engine;
pub mod snapshot;

pub use engine::{
    platform_stats, popular_posts, recent_posts, top_admins, top_authors, trending_tags,
    RankingEngine, MAX_CLOCK_SKEW_SECS,
};
pub use snapshot::{
    AdminEntry, AuthorEntry, EntityWarning, PlatformStats, TagEntry, TopListSnapshot,
};
