use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::strong_types::PostId;
use crate::core::tags::extract_tags;

/// Maximum post length in characters; longer content is truncated.
pub const MAX_POST_CHARS: usize = 280;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub commenter: String,
    pub text: String,
}

/// A post in the feed.
///
/// `author` is a weak reference by handle: nothing guarantees the author
/// still exists. `author_verified` / `author_admin` are captured when the
/// post is created and do not follow later role changes. `tags` is derived
/// from `content` once, here, and never re-derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author: String,
    pub content: String,
    pub author_verified: bool,
    pub author_admin: bool,
    pub created_at: DateTime<Utc>,
    pub likes: BTreeSet<String>,
    pub comments: Vec<Comment>,
    pub shares: u64,
    pub views: u64,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub is_sponsored: bool,
}

impl Post {
    pub fn new(
        author: impl Into<String>,
        content: &str,
        author_verified: bool,
        author_admin: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        let content = truncate_chars(content, MAX_POST_CHARS);
        let tags = extract_tags(&content);
        Self {
            id: PostId::new(),
            author: author.into(),
            content,
            author_verified,
            author_admin,
            created_at,
            likes: BTreeSet::new(),
            comments: Vec::new(),
            shares: 0,
            views: 0,
            tags,
            is_pinned: false,
            is_sponsored: false,
        }
    }

    pub fn like_count(&self) -> u64 {
        self.likes.len() as u64
    }

    pub fn comment_count(&self) -> u64 {
        self.comments.len() as u64
    }

    /// Returns false if `liker` had already liked the post.
    pub fn add_like(&mut self, liker: impl Into<String>) -> bool {
        self.likes.insert(liker.into())
    }

    pub fn remove_like(&mut self, liker: &str) -> bool {
        self.likes.remove(liker)
    }

    pub fn add_comment(&mut self, commenter: impl Into<String>, text: impl Into<String>) {
        self.comments.push(Comment {
            commenter: commenter.into(),
            text: text.into(),
        });
    }

    pub fn add_share(&mut self) {
        self.shares += 1;
    }

    pub fn add_view(&mut self) {
        self.views += 1;
    }
}

fn truncate_chars(content: &str, max: usize) -> String {
    match content.char_indices().nth(max) {
        Some((byte_idx, _)) => content[..byte_idx].to_string(),
        None => content.to_string(),
    }
}
