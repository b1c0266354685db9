use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::strong_types::PostId;
use crate::models::Post;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminEntry {
    pub handle: String,
    pub post_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorEntry {
    pub handle: String,
    pub author_score: i64,
    pub post_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    pub tag: String,
    pub mentions: u64,
}

/// Platform totals shown alongside the lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub users: usize,
    pub posts: usize,
    pub likes: u64,
}

/// An entity that was left out of the rankings because it is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityWarning {
    /// Post whose author handle does not resolve to a user
    MissingAuthor { post_id: PostId, author: String },
    /// Post timestamped in the future beyond the allowed clock skew
    FutureTimestamp { post_id: PostId, created_at: DateTime<Utc> },
    /// User stored under a key that is not its own handle
    HandleMismatch { key: String, handle: String },
    /// User lists a post id that is not in the corpus
    DanglingPost { handle: String, post_id: PostId },
}

impl fmt::Display for EntityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityWarning::MissingAuthor { post_id, author } => {
                write!(f, "post {} references missing author @{}", post_id, author)
            }
            EntityWarning::FutureTimestamp { post_id, created_at } => {
                write!(f, "post {} has a future timestamp {}", post_id, created_at)
            }
            EntityWarning::HandleMismatch { key, handle } => {
                write!(f, "user @{} is stored under key {:?}", handle, key)
            }
            EntityWarning::DanglingPost { handle, post_id } => {
                write!(f, "user @{} lists unknown post {}", handle, post_id)
            }
        }
    }
}

/// One complete computation of every top list.
///
/// Never patched in place: each refresh builds a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopListSnapshot {
    pub top_admins: Vec<AdminEntry>,
    pub top_authors: Vec<AuthorEntry>,
    pub popular_posts: Vec<Post>,
    pub recent_posts: Vec<Post>,
    pub trending_tags: Vec<TagEntry>,
    pub platform: PlatformStats,
    pub warnings: Vec<EntityWarning>,
    pub computed_at: DateTime<Utc>,
}

impl TopListSnapshot {
    pub fn empty(computed_at: DateTime<Utc>) -> Self {
        Self {
            top_admins: Vec::new(),
            top_authors: Vec::new(),
            popular_posts: Vec::new(),
            recent_posts: Vec::new(),
            trending_tags: Vec::new(),
            platform: PlatformStats::default(),
            warnings: Vec::new(),
            computed_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top_admins.is_empty()
            && self.top_authors.is_empty()
            && self.popular_posts.is_empty()
            && self.recent_posts.is_empty()
            && self.trending_tags.is_empty()
    }
}
