// Ranking Engine - derives the global top lists from a corpus snapshot
//
// Every list is recomputed from scratch (sort + truncate); no incremental
// index is kept. Ties are broken on stable keys so that an unchanged corpus
// always yields the same order.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, warn};

use crate::config::TopListConfig;
use crate::core::scoring::{author_engagement, post_score};
use crate::core::strong_types::PostId;
use crate::infrastructure::corpus::CorpusSnapshot;
use crate::models::{Post, User};
use crate::ranking::snapshot::{
    AdminEntry, AuthorEntry, EntityWarning, PlatformStats, TagEntry, TopListSnapshot,
};

/// Posts stamped further than this many seconds into the future are treated
/// as corrupted.
pub const MAX_CLOCK_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    config: TopListConfig,
}

impl RankingEngine {
    pub fn new(config: TopListConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TopListConfig {
        &self.config
    }

    pub fn compute(&self, corpus: &CorpusSnapshot) -> TopListSnapshot {
        self.compute_at(corpus, Utc::now())
    }

    /// Build every list against `now`.
    ///
    /// Malformed entities are dropped before ranking, logged, and listed in
    /// `warnings`; they never abort the computation.
    #[instrument(skip(self, corpus), fields(users = corpus.users.len(), posts = corpus.posts.len()))]
    pub fn compute_at(&self, corpus: &CorpusSnapshot, now: DateTime<Utc>) -> TopListSnapshot {
        let valid = validate(corpus, now);
        for warning in &valid.warnings {
            warn!("Skipping malformed entity: {}", warning);
        }

        let snapshot = TopListSnapshot {
            top_admins: top_admins(valid.users.iter().copied(), self.config.admins_limit),
            top_authors: top_authors(
                valid.users.iter().copied(),
                valid.posts.iter().copied(),
                self.config.authors_limit,
            ),
            popular_posts: popular_posts(
                valid.posts.iter().copied(),
                self.config.popular_limit,
                self.config.popular_window_days,
                now,
            ),
            recent_posts: recent_posts(valid.posts.iter().copied(), self.config.recent_limit),
            trending_tags: trending_tags(valid.posts.iter().copied(), self.config.tags_limit),
            platform: platform_stats(valid.users.iter().copied(), valid.posts.iter().copied()),
            warnings: valid.warnings,
            computed_at: now,
        };

        debug!(
            admins = snapshot.top_admins.len(),
            authors = snapshot.top_authors.len(),
            popular = snapshot.popular_posts.len(),
            recent = snapshot.recent_posts.len(),
            tags = snapshot.trending_tags.len(),
            "Computed top lists"
        );
        snapshot
    }
}

struct ValidEntities<'a> {
    users: Vec<&'a User>,
    posts: Vec<&'a Post>,
    warnings: Vec<EntityWarning>,
}

fn validate(corpus: &CorpusSnapshot, now: DateTime<Utc>) -> ValidEntities<'_> {
    let mut warnings = Vec::new();

    let mut users: Vec<&User> = Vec::with_capacity(corpus.users.len());
    for (key, user) in &corpus.users {
        if *key != user.handle {
            warnings.push(EntityWarning::HandleMismatch {
                key: key.clone(),
                handle: user.handle.clone(),
            });
        } else {
            users.push(user);
        }
    }
    // HashMap iteration order is arbitrary
    users.sort_by(|a, b| a.handle.cmp(&b.handle));
    warnings.sort_by_key(|w| w.to_string());

    let known: HashSet<&str> = users.iter().map(|u| u.handle.as_str()).collect();
    let latest_allowed = now + Duration::seconds(MAX_CLOCK_SKEW_SECS);

    let mut posts = Vec::with_capacity(corpus.posts.len());
    for post in &corpus.posts {
        if !known.contains(post.author.as_str()) {
            warnings.push(EntityWarning::MissingAuthor {
                post_id: post.id,
                author: post.author.clone(),
            });
        } else if post.created_at > latest_allowed {
            warnings.push(EntityWarning::FutureTimestamp {
                post_id: post.id,
                created_at: post.created_at,
            });
        } else {
            posts.push(post);
        }
    }

    let present: HashSet<PostId> = corpus.posts.iter().map(|p| p.id).collect();
    for user in &users {
        for post_id in &user.posts {
            if !present.contains(post_id) {
                warnings.push(EntityWarning::DanglingPost {
                    handle: user.handle.clone(),
                    post_id: *post_id,
                });
            }
        }
    }

    ValidEntities { users, posts, warnings }
}

/// Admins ordered by number of posts, most first; ties by handle.
pub fn top_admins<'a>(users: impl IntoIterator<Item = &'a User>, limit: usize) -> Vec<AdminEntry> {
    if limit == 0 {
        return Vec::new();
    }
    let mut admins: Vec<AdminEntry> = users
        .into_iter()
        .filter(|u| u.is_admin)
        .map(|u| AdminEntry {
            handle: u.handle.clone(),
            post_count: u.posts.len(),
        })
        .collect();

    admins.sort_by(|a, b| b.post_count.cmp(&a.post_count).then_with(|| a.handle.cmp(&b.handle)));
    admins.truncate(limit);
    admins
}

/// Authors ordered by summed engagement (likes*2 + comments*3 + shares*5)
/// across their posts; ties by handle.
///
/// Post ids that do not resolve among `posts` are skipped, and users with no
/// resolvable post are left out.
pub fn top_authors<'a>(
    users: impl IntoIterator<Item = &'a User>,
    posts: impl IntoIterator<Item = &'a Post>,
    limit: usize,
) -> Vec<AuthorEntry> {
    if limit == 0 {
        return Vec::new();
    }
    let by_id: HashMap<PostId, &Post> = posts.into_iter().map(|p| (p.id, p)).collect();

    let mut authors: Vec<AuthorEntry> = users
        .into_iter()
        .filter_map(|user| {
            let owned: Vec<&Post> = user.posts.iter().filter_map(|id| by_id.get(id).copied()).collect();
            if owned.is_empty() {
                return None;
            }
            Some(AuthorEntry {
                handle: user.handle.clone(),
                author_score: owned.iter().map(|p| author_engagement(p)).sum(),
                post_count: owned.len(),
            })
        })
        .collect();

    authors.sort_by(|a, b| {
        b.author_score
            .cmp(&a.author_score)
            .then_with(|| a.handle.cmp(&b.handle))
    });
    authors.truncate(limit);
    authors
}

/// Posts created within the last `window_days`, ordered by `post_score`.
/// Anything at or before the window edge is excluded outright. A window
/// reaching past the earliest representable time has no edge.
pub fn popular_posts<'a>(
    posts: impl IntoIterator<Item = &'a Post>,
    limit: usize,
    window_days: i64,
    now: DateTime<Utc>,
) -> Vec<Post> {
    if limit == 0 {
        return Vec::new();
    }
    let cutoff = Duration::try_days(window_days.max(0))
        .and_then(|window| now.checked_sub_signed(window));

    let mut scored: Vec<(f64, &Post)> = posts
        .into_iter()
        .filter(|p| cutoff.map_or(true, |edge| p.created_at > edge))
        .map(|p| (post_score(p), p))
        .collect();

    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .total_cmp(score_a)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    scored.into_iter().take(limit).map(|(_, p)| p.clone()).collect()
}

/// Newest posts first, regardless of age.
pub fn recent_posts<'a>(posts: impl IntoIterator<Item = &'a Post>, limit: usize) -> Vec<Post> {
    if limit == 0 {
        return Vec::new();
    }
    let mut recent: Vec<&Post> = posts.into_iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    recent.into_iter().take(limit).cloned().collect()
}

/// Tags by number of mentions. Every entry of a post's `tags` counts, so a
/// post repeating a tag contributes once per repetition.
pub fn trending_tags<'a>(posts: impl IntoIterator<Item = &'a Post>, limit: usize) -> Vec<TagEntry> {
    if limit == 0 {
        return Vec::new();
    }
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for post in posts {
        for tag in &post.tags {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut tags: Vec<TagEntry> = counts
        .into_iter()
        .map(|(tag, mentions)| TagEntry {
            tag: tag.to_string(),
            mentions,
        })
        .collect();
    tags.sort_by(|a, b| b.mentions.cmp(&a.mentions).then_with(|| a.tag.cmp(&b.tag)));
    tags.truncate(limit);
    tags
}

pub fn platform_stats<'a>(
    users: impl IntoIterator<Item = &'a User>,
    posts: impl IntoIterator<Item = &'a Post>,
) -> PlatformStats {
    let (post_count, likes) = posts
        .into_iter()
        .fold((0usize, 0u64), |(n, likes), p| (n + 1, likes + p.like_count()));
    PlatformStats {
        users: users.into_iter().count(),
        posts: post_count,
        likes,
    }
}
