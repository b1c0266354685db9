// Corpus - the mutable set of users and posts the rankings read from
//
// The surrounding application owns the corpus. Rankings only ever see an
// owned `CorpusSnapshot` copied out under a read lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, instrument};

use crate::core::strong_types::{PostId, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::traits::CorpusSource;
use crate::models::{Post, User, UserStats};

/// Point-in-time copy of the corpus handed to the ranking engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusSnapshot {
    pub users: HashMap<String, User>,
    pub posts: Vec<Post>,
}

impl CorpusSnapshot {
    pub fn all_users(&self) -> &HashMap<String, User> {
        &self.users
    }

    pub fn all_posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.posts.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Corpus {
    users: HashMap<String, User>,
    posts: Vec<Post>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self, handle: &str) -> Option<&User> {
        self.users.get(handle)
    }

    pub fn post(&self, post_id: PostId) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == post_id)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    pub fn snapshot(&self) -> CorpusSnapshot {
        CorpusSnapshot {
            users: self.users.clone(),
            posts: self.posts.clone(),
        }
    }

    /// Insert a user exactly as given, e.g. when loading from a store.
    /// An existing user with the same handle is replaced.
    pub fn load_user(&mut self, user: User) {
        self.users.insert(user.handle.clone(), user);
    }

    /// Insert a post exactly as given. The author is not checked.
    pub fn load_post(&mut self, post: Post) {
        self.posts.push(post);
    }

    pub fn register_user(&mut self, handle: &str, display_name: Option<String>) -> AppResult<UserId> {
        self.register_user_at(handle, display_name, Utc::now())
    }

    pub fn register_user_at(
        &mut self,
        handle: &str,
        display_name: Option<String>,
        created_at: DateTime<Utc>,
    ) -> AppResult<UserId> {
        let handle = handle.trim().trim_start_matches('@');
        if handle.is_empty() || handle.chars().any(char::is_whitespace) {
            return Err(AppError::Validation(format!("Invalid handle: {:?}", handle)));
        }
        if self.users.contains_key(handle) {
            return Err(AppError::Conflict(format!("Handle @{} is already taken", handle)));
        }

        let user = User::new(handle, display_name.filter(|n| !n.trim().is_empty()), created_at);
        let id = user.id;
        self.users.insert(handle.to_string(), user);
        debug!("Registered user @{}", handle);
        Ok(id)
    }

    pub fn create_post(&mut self, author: &str, content: &str) -> AppResult<PostId> {
        self.create_post_at(author, content, Utc::now())
    }

    /// Create a post for `author`, snapshotting the author's role flags,
    /// and refresh the author's stats.
    pub fn create_post_at(&mut self, author: &str, content: &str, created_at: DateTime<Utc>) -> AppResult<PostId> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("Post content cannot be empty".to_string()));
        }
        let user = self
            .users
            .get_mut(author)
            .ok_or_else(|| AppError::NotFound(format!("User @{} not found", author)))?;

        let post = Post::new(author, content, user.is_verified, user.is_admin, created_at);
        let post_id = post.id;
        user.posts.push(post_id);
        self.posts.push(post);

        self.update_stats(author)?;
        Ok(post_id)
    }

    pub fn like_post(&mut self, post_id: PostId, liker: &str) -> AppResult<()> {
        self.require_user(liker)?;
        let post = self.post_mut(post_id)?;
        if !post.add_like(liker) {
            return Err(AppError::Conflict(format!("@{} already liked post {}", liker, post_id)));
        }
        Ok(())
    }

    pub fn unlike_post(&mut self, post_id: PostId, liker: &str) -> AppResult<()> {
        let post = self.post_mut(post_id)?;
        if !post.remove_like(liker) {
            return Err(AppError::NotFound(format!("@{} has not liked post {}", liker, post_id)));
        }
        Ok(())
    }

    pub fn comment_post(&mut self, post_id: PostId, commenter: &str, text: &str) -> AppResult<()> {
        if text.trim().is_empty() {
            return Err(AppError::Validation("Comment cannot be empty".to_string()));
        }
        self.require_user(commenter)?;
        self.post_mut(post_id)?.add_comment(commenter, text);
        Ok(())
    }

    pub fn share_post(&mut self, post_id: PostId) -> AppResult<()> {
        self.post_mut(post_id)?.add_share();
        Ok(())
    }

    pub fn view_post(&mut self, post_id: PostId) -> AppResult<()> {
        self.post_mut(post_id)?.add_view();
        Ok(())
    }

    pub fn follow(&mut self, follower: &str, followee: &str) -> AppResult<()> {
        if follower == followee {
            return Err(AppError::Validation("Users cannot follow themselves".to_string()));
        }
        self.require_user(followee)?;
        let inserted = self
            .users
            .get_mut(follower)
            .ok_or_else(|| AppError::NotFound(format!("User @{} not found", follower)))?
            .following
            .insert(followee.to_string());
        if !inserted {
            return Err(AppError::Conflict(format!("@{} already follows @{}", follower, followee)));
        }
        if let Some(target) = self.users.get_mut(followee) {
            target.followers.insert(follower.to_string());
        }
        Ok(())
    }

    pub fn set_verified(&mut self, handle: &str, verified: bool) -> AppResult<()> {
        self.user_mut(handle)?.is_verified = verified;
        self.update_stats(handle)?;
        Ok(())
    }

    pub fn set_admin(&mut self, handle: &str, admin: bool) -> AppResult<()> {
        self.user_mut(handle)?.is_admin = admin;
        self.update_stats(handle)?;
        Ok(())
    }

    /// Remove a post and its reference from the author's post list.
    pub fn delete_post(&mut self, post_id: PostId) -> AppResult<Post> {
        let idx = self
            .posts
            .iter()
            .position(|p| p.id == post_id)
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;
        let post = self.posts.remove(idx);

        if let Some(author) = self.users.get_mut(&post.author) {
            author.posts.retain(|id| *id != post_id);
        }
        Ok(post)
    }

    /// Remove a user, every post they authored, their likes and comments on
    /// other posts, and their follow edges.
    pub fn delete_user(&mut self, handle: &str) -> AppResult<User> {
        let user = self
            .users
            .remove(handle)
            .ok_or_else(|| AppError::NotFound(format!("User @{} not found", handle)))?;

        self.posts.retain(|p| p.author != handle);
        for post in &mut self.posts {
            post.likes.remove(handle);
            post.comments.retain(|c| c.commenter != handle);
        }
        for other in self.users.values_mut() {
            other.followers.remove(handle);
            other.following.remove(handle);
        }
        Ok(user)
    }

    pub fn update_stats(&mut self, handle: &str) -> AppResult<UserStats> {
        self.update_stats_at(handle, Utc::now())
    }

    /// Recompute a user's stats and reputation from the current posts.
    #[instrument(skip(self))]
    pub fn update_stats_at(&mut self, handle: &str, now: DateTime<Utc>) -> AppResult<UserStats> {
        let posts = &self.posts;
        let user = self
            .users
            .get_mut(handle)
            .ok_or_else(|| AppError::NotFound(format!("User @{} not found", handle)))?;
        user.refresh_stats(posts.iter(), now);
        Ok(user.stats.clone())
    }

    fn require_user(&self, handle: &str) -> AppResult<()> {
        if self.users.contains_key(handle) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("User @{} not found", handle)))
        }
    }

    fn user_mut(&mut self, handle: &str) -> AppResult<&mut User> {
        self.users
            .get_mut(handle)
            .ok_or_else(|| AppError::NotFound(format!("User @{} not found", handle)))
    }

    fn post_mut(&mut self, post_id: PostId) -> AppResult<&mut Post> {
        self.posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))
    }
}

/// Shared handle to a single in-process corpus.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    inner: Arc<RwLock<Corpus>>,
}

impl InMemoryCorpus {
    pub fn new(corpus: Corpus) -> Self {
        Self {
            inner: Arc::new(RwLock::new(corpus)),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Corpus> {
        self.inner.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, Corpus> {
        self.inner.write().await
    }
}

#[async_trait]
impl CorpusSource for InMemoryCorpus {
    async fn snapshot(&self) -> AppResult<CorpusSnapshot> {
        Ok(self.inner.read().await.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus_with(handles: &[&str]) -> Corpus {
        let mut corpus = Corpus::new();
        for handle in handles {
            corpus.register_user(handle, None).unwrap();
        }
        corpus
    }

    #[test]
    fn test_register_rejects_duplicates_and_blank_handles() {
        let mut corpus = corpus_with(&["alice"]);
        assert!(matches!(corpus.register_user("alice", None), Err(AppError::Conflict(_))));
        assert!(matches!(corpus.register_user("  ", None), Err(AppError::Validation(_))));
        assert!(matches!(corpus.register_user("two words", None), Err(AppError::Validation(_))));
        assert!(corpus.register_user("@bob", None).is_ok());
        assert!(corpus.user("bob").is_some());
    }

    #[test]
    fn test_create_post_snapshots_author_flags() {
        let mut corpus = corpus_with(&["alice"]);
        corpus.set_verified("alice", true).unwrap();
        let post_id = corpus.create_post("alice", "hello #world").unwrap();

        corpus.set_verified("alice", false).unwrap();
        corpus.set_admin("alice", true).unwrap();

        let post = corpus.post(post_id).unwrap();
        assert!(post.author_verified);
        assert!(!post.author_admin);
        assert_eq!(post.tags, vec!["world"]);
        assert_eq!(corpus.user("alice").unwrap().posts, vec![post_id]);
    }

    #[test]
    fn test_create_post_updates_author_stats() {
        let mut corpus = corpus_with(&["alice"]);
        corpus.create_post("alice", "one").unwrap();
        corpus.create_post("alice", "two").unwrap();
        let stats = &corpus.user("alice").unwrap().stats;
        assert_eq!(stats.posts, 2);
        assert_eq!(stats.reputation_score, 20);
    }

    #[test]
    fn test_create_post_requires_author_and_content() {
        let mut corpus = corpus_with(&["alice"]);
        assert!(matches!(corpus.create_post("ghost", "hi"), Err(AppError::NotFound(_))));
        assert!(matches!(corpus.create_post("alice", "   "), Err(AppError::Validation(_))));
        assert_eq!(corpus.post_count(), 0);
    }

    #[test]
    fn test_engagement_mutations() {
        let mut corpus = corpus_with(&["alice", "bob"]);
        let post_id = corpus.create_post("alice", "hi").unwrap();

        corpus.like_post(post_id, "bob").unwrap();
        assert!(matches!(corpus.like_post(post_id, "bob"), Err(AppError::Conflict(_))));
        assert!(matches!(corpus.like_post(post_id, "ghost"), Err(AppError::NotFound(_))));
        corpus.comment_post(post_id, "bob", "nice").unwrap();
        corpus.share_post(post_id).unwrap();
        corpus.view_post(post_id).unwrap();

        let post = corpus.post(post_id).unwrap();
        assert_eq!(post.like_count(), 1);
        assert_eq!(post.comment_count(), 1);
        assert_eq!(post.shares, 1);
        assert_eq!(post.views, 1);

        corpus.unlike_post(post_id, "bob").unwrap();
        assert_eq!(corpus.post(post_id).unwrap().like_count(), 0);
        assert!(corpus.share_post(PostId::new()).is_err());
    }

    #[test]
    fn test_stats_are_lazy_until_updated() {
        let mut corpus = corpus_with(&["alice", "bob"]);
        let post_id = corpus.create_post("alice", "hi").unwrap();
        corpus.like_post(post_id, "bob").unwrap();
        assert_eq!(corpus.user("alice").unwrap().stats.likes, 0);

        let stats = corpus.update_stats("alice").unwrap();
        assert_eq!(stats.likes, 1);
        assert_eq!(corpus.user("alice").unwrap().stats.reputation_score, 12);
    }

    #[test]
    fn test_follow_updates_both_sides() {
        let mut corpus = corpus_with(&["alice", "bob"]);
        corpus.follow("bob", "alice").unwrap();
        assert!(corpus.user("alice").unwrap().followers.contains("bob"));
        assert!(corpus.user("bob").unwrap().following.contains("alice"));
        assert!(matches!(corpus.follow("bob", "alice"), Err(AppError::Conflict(_))));
        assert!(matches!(corpus.follow("bob", "bob"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_delete_post_removes_author_reference() {
        let mut corpus = corpus_with(&["alice"]);
        let post_id = corpus.create_post("alice", "bye").unwrap();
        corpus.delete_post(post_id).unwrap();
        assert!(corpus.post(post_id).is_none());
        assert!(corpus.user("alice").unwrap().posts.is_empty());
        assert!(corpus.delete_post(post_id).is_err());
    }

    #[test]
    fn test_delete_user_purges_posts_and_edges() {
        let mut corpus = corpus_with(&["alice", "bob"]);
        corpus.create_post("alice", "one").unwrap();
        corpus.create_post("bob", "two").unwrap();
        corpus.follow("bob", "alice").unwrap();

        corpus.delete_user("alice").unwrap();
        assert_eq!(corpus.user_count(), 1);
        assert_eq!(corpus.post_count(), 1);
        assert!(corpus.user("bob").unwrap().following.is_empty());
    }

    #[test]
    fn test_delete_user_drops_their_engagement_on_other_posts() {
        let mut corpus = corpus_with(&["alice", "bob"]);
        let post_id = corpus.create_post("alice", "hello").unwrap();
        corpus.like_post(post_id, "bob").unwrap();
        corpus.comment_post(post_id, "bob", "nice").unwrap();
        corpus.comment_post(post_id, "alice", "thanks").unwrap();

        corpus.delete_user("bob").unwrap();
        let post = corpus.post(post_id).unwrap();
        assert_eq!(post.like_count(), 0);
        assert_eq!(post.comment_count(), 1);
        assert_eq!(post.comments[0].commenter, "alice");

        let lists = crate::ranking::RankingEngine::default().compute(&corpus.snapshot());
        assert_eq!(lists.platform.likes, 0);

        // The handle is free again and starts with no likes
        corpus.register_user("bob", None).unwrap();
        assert!(corpus.like_post(post_id, "bob").is_ok());
    }

    #[tokio::test]
    async fn test_in_memory_snapshot_is_a_copy() {
        let corpus = InMemoryCorpus::default();
        corpus.write().await.register_user("alice", None).unwrap();

        let snapshot = corpus.snapshot().await.unwrap();
        corpus.write().await.register_user("bob", None).unwrap();

        assert_eq!(snapshot.all_users().len(), 1);
        assert_eq!(corpus.read().await.user_count(), 2);
    }
}
