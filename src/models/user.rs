use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::core::scoring::{user_reputation, ReputationTier};
use crate::core::strong_types::{PostId, UserId};
use crate::models::post::Post;

/// Aggregated counters for a user.
///
/// `reputation_score` is derived from the other fields plus the user's role
/// flags. It is only ever replaced through [`User::refresh_stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub posts: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub views: u64,
    pub followers: u64,
    pub following: u64,
    pub account_age_days: i64,
    pub reputation_score: i64,
}

/// Verification mark shown next to a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    /// Red check
    Admin,
    /// Blue check
    Verified,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub handle: String,
    pub display_name: String,
    pub is_admin: bool,
    pub is_verified: bool,
    pub posts: Vec<PostId>,
    pub followers: BTreeSet<String>,
    pub following: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub stats: UserStats,
}

impl User {
    pub fn new(handle: impl Into<String>, display_name: Option<String>, created_at: DateTime<Utc>) -> Self {
        let handle = handle.into();
        Self {
            id: UserId::new(),
            display_name: display_name.unwrap_or_else(|| handle.clone()),
            handle,
            is_admin: false,
            is_verified: false,
            posts: Vec::new(),
            followers: BTreeSet::new(),
            following: BTreeSet::new(),
            created_at,
            stats: UserStats::default(),
        }
    }

    pub fn badge(&self) -> Badge {
        if self.is_admin {
            Badge::Admin
        } else if self.is_verified {
            Badge::Verified
        } else {
            Badge::None
        }
    }

    pub fn reputation_tier(&self) -> ReputationTier {
        ReputationTier::from_score(self.stats.reputation_score)
    }

    /// Rebuild `stats` from this user's own posts.
    ///
    /// `posts` may contain anything; only posts whose id is listed in
    /// `self.posts` are counted, so dangling ids contribute nothing.
    pub fn refresh_stats<'a>(&mut self, posts: impl IntoIterator<Item = &'a Post>, now: DateTime<Utc>) {
        let mut stats = UserStats {
            followers: self.followers.len() as u64,
            following: self.following.len() as u64,
            account_age_days: (now - self.created_at).num_days().max(0),
            ..UserStats::default()
        };

        let own: HashSet<PostId> = self.posts.iter().copied().collect();
        for post in posts.into_iter().filter(|p| own.contains(&p.id)) {
            stats.posts += 1;
            stats.likes += post.like_count();
            stats.comments += post.comment_count();
            stats.shares += post.shares;
            stats.views += post.views;
        }

        stats.reputation_score = user_reputation(&stats, self.is_verified, self.is_admin);
        self.stats = stats;
    }
}
