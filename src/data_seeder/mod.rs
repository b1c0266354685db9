// Demo data: a handful of accounts with varied roles and engagement

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::AppResult;
use crate::infrastructure::corpus::Corpus;

/// (handle, is_admin, is_verified, post count)
const DEMO_USERS: &[(&str, bool, bool, usize)] = &[
    ("admin", true, true, 25),
    ("alex_pro", false, true, 15),
    ("maria_creative", false, true, 12),
    ("ivan_writer", false, true, 8),
    ("dmitry_tech", true, true, 5),
    ("olga_designer", false, false, 3),
    ("sophia_art", false, false, 2),
];

const DEMO_TAGS: &[&str] = &["#Netta", "#verification", "#art", "#tech", "#design"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub posts: usize,
}

/// Fill `corpus` with the demo accounts. The same `seed` always produces the
/// same engagement; post ages spread over the last 45 days so some posts fall
/// outside the popular window.
pub fn seed_demo_corpus(corpus: &mut Corpus, seed: u64, now: DateTime<Utc>) -> AppResult<SeedSummary> {
    let mut rng = StdRng::seed_from_u64(seed);
    let handles: Vec<&str> = DEMO_USERS.iter().map(|(h, ..)| *h).collect();

    for (handle, is_admin, is_verified, _) in DEMO_USERS {
        corpus.register_user_at(handle, None, now - Duration::days(90))?;
        corpus.set_admin(handle, *is_admin)?;
        corpus.set_verified(handle, *is_verified)?;
    }

    let mut posts = 0;
    for (handle, _, _, post_count) in DEMO_USERS {
        for i in 0..*post_count {
            let tag = DEMO_TAGS[rng.random_range(0..DEMO_TAGS.len())];
            let content = format!("Post {} from {} #Netta {}", i, handle, tag);
            let age = Duration::hours(rng.random_range(0..45 * 24));
            let post_id = corpus.create_post_at(handle, &content, now - age)?;

            let mut likers: Vec<&str> = handles.iter().copied().filter(|h| h != handle).collect();
            likers.shuffle(&mut rng);
            for liker in likers.iter().take(rng.random_range(0..=likers.len())) {
                corpus.like_post(post_id, liker)?;
            }
            for _ in 0..rng.random_range(0..=i.min(4)) {
                let commenter = handles[rng.random_range(0..handles.len())];
                corpus.comment_post(post_id, commenter, "Great post!")?;
            }
            for _ in 0..(i % 4) {
                corpus.share_post(post_id)?;
            }
            for _ in 0..rng.random_range(0..50) {
                corpus.view_post(post_id)?;
            }
            posts += 1;
        }
    }

    for handle in &handles {
        corpus.update_stats_at(handle, now)?;
    }

    info!("Seeded {} demo users and {} posts", handles.len(), posts);
    Ok(SeedSummary {
        users: handles.len(),
        posts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::RankingEngine;

    #[test]
    fn test_seed_builds_expected_admin_ranking() {
        let now = Utc::now();
        let mut corpus = Corpus::new();
        let summary = seed_demo_corpus(&mut corpus, 7, now).unwrap();
        assert_eq!(summary, SeedSummary { users: 7, posts: 70 });

        let lists = RankingEngine::default().compute_at(&corpus.snapshot(), now);
        let admins: Vec<(&str, usize)> = lists
            .top_admins
            .iter()
            .map(|a| (a.handle.as_str(), a.post_count))
            .collect();
        assert_eq!(admins, vec![("admin", 25), ("dmitry_tech", 5)]);
        assert_eq!(lists.trending_tags[0].tag, "netta");
        assert!(lists.trending_tags[0].mentions >= 70);
        assert!(lists.warnings.is_empty());
    }

    #[test]
    fn test_seed_is_deterministic() {
        let now = Utc::now();
        let mut a = Corpus::new();
        let mut b = Corpus::new();
        seed_demo_corpus(&mut a, 42, now).unwrap();
        seed_demo_corpus(&mut b, 42, now).unwrap();

        let engine = RankingEngine::default();
        let lists_a = engine.compute_at(&a.snapshot(), now);
        let lists_b = engine.compute_at(&b.snapshot(), now);
        assert_eq!(lists_a.top_authors, lists_b.top_authors);
        assert_eq!(lists_a.trending_tags, lists_b.trending_tags);
    }
}
