// Scoring Model - popularity of posts and reputation of users
//
// Every function here is pure: identical counters always produce identical
// scores, which keeps ranking order stable between refreshes.

use serde::{Deserialize, Serialize};

use crate::models::{Post, UserStats};

pub const LIKE_WEIGHT: u64 = 2;
pub const COMMENT_WEIGHT: u64 = 3;
pub const SHARE_WEIGHT: u64 = 5;
pub const VIEW_WEIGHT: f64 = 0.1;

pub const POST_REPUTATION_WEIGHT: u64 = 10;
pub const FOLLOWER_REPUTATION_WEIGHT: u64 = 20;
pub const VERIFIED_BONUS: i64 = 1000;
pub const ADMIN_BONUS: i64 = 5000;

/// Popularity of a single post: `likes*2 + comments*3 + shares*5 + views*0.1`.
pub fn post_score(post: &Post) -> f64 {
    author_engagement(post) as f64 + post.views as f64 * VIEW_WEIGHT
}

/// Weighted engagement of a post as credited to its author.
///
/// Unlike [`post_score`] this has no views term. Author ranking sums this
/// value, post ranking uses `post_score`; the two must stay separate.
pub fn author_engagement(post: &Post) -> i64 {
    let weighted = post.like_count() * LIKE_WEIGHT
        + post.comment_count() * COMMENT_WEIGHT
        + post.shares * SHARE_WEIGHT;
    weighted as i64
}

/// Reputation of a user from their aggregated stats.
///
/// The verified and admin bonuses are independent: an admin who is also
/// verified receives both.
pub fn user_reputation(stats: &UserStats, is_verified: bool, is_admin: bool) -> i64 {
    let base = stats.posts * POST_REPUTATION_WEIGHT
        + stats.likes * LIKE_WEIGHT
        + stats.comments * COMMENT_WEIGHT
        + stats.shares * SHARE_WEIGHT
        + stats.followers * FOLLOWER_REPUTATION_WEIGHT;

    let mut score = base as i64;
    if is_verified {
        score += VERIFIED_BONUS;
    }
    if is_admin {
        score += ADMIN_BONUS;
    }
    score
}

/// Coarse reputation bucket shown on profiles and the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReputationTier {
    Low,
    Medium,
    High,
}

impl ReputationTier {
    pub const MEDIUM_THRESHOLD: i64 = 1000;
    pub const HIGH_THRESHOLD: i64 = 5000;

    pub fn from_score(score: i64) -> Self {
        if score >= Self::HIGH_THRESHOLD {
            ReputationTier::High
        } else if score >= Self::MEDIUM_THRESHOLD {
            ReputationTier::Medium
        } else {
            ReputationTier::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post_with(likes: usize, comments: usize, shares: u64, views: u64) -> Post {
        let mut post = Post::new("author", "content", false, false, Utc::now());
        for i in 0..likes {
            post.add_like(format!("liker_{}", i));
        }
        for i in 0..comments {
            post.add_comment(format!("commenter_{}", i), "text");
        }
        post.shares = shares;
        post.views = views;
        post
    }

    #[test]
    fn test_post_score_formula() {
        let post = post_with(3, 2, 1, 10);
        // 6 + 6 + 5 + 1.0
        assert!((post_score(&post) - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_author_engagement_ignores_views() {
        let quiet = post_with(3, 2, 1, 0);
        let viewed = post_with(3, 2, 1, 10_000);
        assert_eq!(author_engagement(&quiet), 17);
        assert_eq!(author_engagement(&viewed), 17);
        assert!(post_score(&viewed) > post_score(&quiet));
    }

    #[test]
    fn test_post_score_monotone_in_each_counter() {
        let base = post_with(2, 2, 2, 2);
        let base_score = post_score(&base);
        assert!(post_score(&post_with(3, 2, 2, 2)) >= base_score);
        assert!(post_score(&post_with(2, 3, 2, 2)) >= base_score);
        assert!(post_score(&post_with(2, 2, 3, 2)) >= base_score);
        assert!(post_score(&post_with(2, 2, 2, 3)) >= base_score);
    }

    #[test]
    fn test_user_reputation_formula() {
        let stats = UserStats {
            posts: 2,
            likes: 10,
            comments: 1,
            shares: 1,
            followers: 3,
            ..UserStats::default()
        };
        // 20 + 20 + 3 + 5 + 60
        assert_eq!(user_reputation(&stats, false, false), 108);
        assert_eq!(user_reputation(&stats, true, false), 1108);
        assert_eq!(user_reputation(&stats, false, true), 5108);
    }

    #[test]
    fn test_admin_and_verified_bonuses_stack() {
        let stats = UserStats::default();
        assert_eq!(user_reputation(&stats, true, true), 6000);
    }

    #[test]
    fn test_views_and_following_do_not_affect_reputation() {
        let plain = UserStats::default();
        let busy = UserStats {
            views: 1_000,
            following: 50,
            account_age_days: 365,
            ..UserStats::default()
        };
        assert_eq!(user_reputation(&plain, false, false), user_reputation(&busy, false, false));
    }

    #[test]
    fn test_reputation_tiers() {
        assert_eq!(ReputationTier::from_score(0), ReputationTier::Low);
        assert_eq!(ReputationTier::from_score(999), ReputationTier::Low);
        assert_eq!(ReputationTier::from_score(1000), ReputationTier::Medium);
        assert_eq!(ReputationTier::from_score(5000), ReputationTier::High);
    }
}
