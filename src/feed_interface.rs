// Feed Interface - corpus mutations, top-list reads and their HTTP routes
//
// Every mutation goes through `mutate`, which applies the change under the
// corpus write lock, releases the lock, and only then invalidates the
// top-list cache. That is the single invalidation point for the corpus.

use std::sync::Arc;

use axum::{
    extract::{Path as AxumPath, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::{
    config::TopListConfig,
    core::{
        scoring::ReputationTier,
        strong_types::{PostId, UserId},
    },
    error::{AppError, AppResult},
    infrastructure::{
        cache::{RefreshError, TopListCache},
        corpus::{Corpus, InMemoryCorpus},
    },
    models::{Badge, UserStats},
    ranking::TopListSnapshot,
};

/// Public view of a user, with freshly recomputed stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub handle: String,
    pub display_name: String,
    pub is_admin: bool,
    pub is_verified: bool,
    pub badge: Badge,
    pub reputation_tier: ReputationTier,
    pub stats: UserStats,
}

#[derive(Clone)]
pub struct FeedInterface {
    corpus: InMemoryCorpus,
    cache: Arc<TopListCache>,
}

impl FeedInterface {
    pub fn new(corpus: InMemoryCorpus, config: TopListConfig) -> Self {
        let cache = Arc::new(TopListCache::new(Arc::new(corpus.clone()), config));
        Self { corpus, cache }
    }

    /// Pair `corpus` with an existing cache. The cache must read from the
    /// same corpus, or mutations here will never show up in its lists.
    pub fn with_cache(corpus: InMemoryCorpus, cache: Arc<TopListCache>) -> Self {
        Self { corpus, cache }
    }

    pub fn corpus(&self) -> &InMemoryCorpus {
        &self.corpus
    }

    pub fn cache(&self) -> &Arc<TopListCache> {
        &self.cache
    }

    pub async fn top_lists(&self) -> Result<Arc<TopListSnapshot>, RefreshError> {
        self.cache.get().await
    }

    /// Profile view. Stats are lazy, so they are recomputed here.
    pub async fn profile(&self, handle: &str) -> AppResult<Profile> {
        let mut corpus = self.corpus.write().await;
        corpus.update_stats(handle)?;
        let user = corpus
            .user(handle)
            .ok_or_else(|| AppError::NotFound(format!("User @{} not found", handle)))?;
        Ok(Profile {
            handle: user.handle.clone(),
            display_name: user.display_name.clone(),
            is_admin: user.is_admin,
            is_verified: user.is_verified,
            badge: user.badge(),
            reputation_tier: user.reputation_tier(),
            stats: user.stats.clone(),
        })
    }

    pub async fn register_user(&self, handle: &str, display_name: Option<String>) -> AppResult<UserId> {
        self.mutate(|c| c.register_user(handle, display_name)).await
    }

    pub async fn create_post(&self, author: &str, content: &str) -> AppResult<PostId> {
        self.mutate(|c| c.create_post(author, content)).await
    }

    pub async fn like_post(&self, post_id: PostId, liker: &str) -> AppResult<()> {
        self.mutate(|c| c.like_post(post_id, liker)).await
    }

    pub async fn unlike_post(&self, post_id: PostId, liker: &str) -> AppResult<()> {
        self.mutate(|c| c.unlike_post(post_id, liker)).await
    }

    pub async fn comment_post(&self, post_id: PostId, commenter: &str, text: &str) -> AppResult<()> {
        self.mutate(|c| c.comment_post(post_id, commenter, text)).await
    }

    pub async fn share_post(&self, post_id: PostId) -> AppResult<()> {
        self.mutate(|c| c.share_post(post_id)).await
    }

    pub async fn view_post(&self, post_id: PostId) -> AppResult<()> {
        self.mutate(|c| c.view_post(post_id)).await
    }

    pub async fn follow(&self, follower: &str, followee: &str) -> AppResult<()> {
        self.mutate(|c| c.follow(follower, followee)).await
    }

    pub async fn set_roles(&self, handle: &str, is_admin: Option<bool>, is_verified: Option<bool>) -> AppResult<()> {
        self.mutate(|c| {
            if let Some(admin) = is_admin {
                c.set_admin(handle, admin)?;
            }
            if let Some(verified) = is_verified {
                c.set_verified(handle, verified)?;
            }
            Ok(())
        })
        .await
    }

    pub async fn delete_post(&self, post_id: PostId) -> AppResult<()> {
        self.mutate(|c| c.delete_post(post_id).map(|_| ())).await
    }

    pub async fn delete_user(&self, handle: &str) -> AppResult<()> {
        self.mutate(|c| c.delete_user(handle).map(|_| ())).await
    }

    #[instrument(skip(self, op))]
    async fn mutate<T>(&self, op: impl FnOnce(&mut Corpus) -> AppResult<T>) -> AppResult<T> {
        let result = {
            let mut corpus = self.corpus.write().await;
            op(&mut corpus)
        };
        if result.is_ok() {
            self.cache.invalidate();
        }
        result
    }
}

#[derive(Deserialize)]
pub struct RegisterUserRequest {
    pub handle: String,
    pub display_name: Option<String>,
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub author: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct ActorRequest {
    pub user: String,
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub user: String,
    pub text: String,
}

#[derive(Deserialize)]
pub struct FollowRequest {
    pub follower: String,
}

#[derive(Deserialize)]
pub struct RolesRequest {
    pub is_admin: Option<bool>,
    pub is_verified: Option<bool>,
}

fn parse_post_id(raw: &str) -> AppResult<PostId> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Invalid post id: {}", raw)))
}

// HTTP Handlers

pub async fn top_lists_handler(State(feed): State<FeedInterface>) -> Result<Json<Value>, AppError> {
    match feed.top_lists().await {
        Ok(snapshot) => Ok(Json(json!({ "stale": false, "toplists": snapshot.as_ref() }))),
        Err(RefreshError { cause, previous: Some(previous) }) => Ok(Json(json!({
            "stale": true,
            "error": cause.to_string(),
            "toplists": previous.as_ref(),
        }))),
        Err(err) => Err(err.into()),
    }
}

pub async fn metrics_handler(State(feed): State<FeedInterface>) -> Json<Value> {
    let metrics = feed.cache().metrics();
    Json(json!({ "cache": metrics, "hit_rate": metrics.hit_rate() }))
}

pub async fn profile_handler(
    State(feed): State<FeedInterface>,
    AxumPath(handle): AxumPath<String>,
) -> Result<Json<Profile>, AppError> {
    feed.profile(&handle).await.map(Json)
}

pub async fn register_user_handler(
    State(feed): State<FeedInterface>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<Json<Value>, AppError> {
    let id = feed.register_user(&req.handle, req.display_name).await?;
    info!("Registered @{}", req.handle);
    Ok(Json(json!({ "id": id, "handle": req.handle })))
}

pub async fn create_post_handler(
    State(feed): State<FeedInterface>,
    Json(req): Json<CreatePostRequest>,
) -> Result<Json<Value>, AppError> {
    let id = feed.create_post(&req.author, &req.content).await?;
    Ok(Json(json!({ "id": id, "created": true })))
}

pub async fn like_post_handler(
    State(feed): State<FeedInterface>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<Value>, AppError> {
    let post_id = parse_post_id(&id)?;
    feed.like_post(post_id, &req.user).await?;
    Ok(Json(json!({ "id": post_id, "liked": true })))
}

pub async fn unlike_post_handler(
    State(feed): State<FeedInterface>,
    AxumPath((id, user)): AxumPath<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let post_id = parse_post_id(&id)?;
    feed.unlike_post(post_id, &user).await?;
    Ok(Json(json!({ "id": post_id, "liked": false })))
}

pub async fn comment_post_handler(
    State(feed): State<FeedInterface>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<CommentRequest>,
) -> Result<Json<Value>, AppError> {
    let post_id = parse_post_id(&id)?;
    feed.comment_post(post_id, &req.user, &req.text).await?;
    Ok(Json(json!({ "id": post_id, "commented": true })))
}

pub async fn share_post_handler(
    State(feed): State<FeedInterface>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Value>, AppError> {
    let post_id = parse_post_id(&id)?;
    feed.share_post(post_id).await?;
    Ok(Json(json!({ "id": post_id, "shared": true })))
}

pub async fn view_post_handler(
    State(feed): State<FeedInterface>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Value>, AppError> {
    let post_id = parse_post_id(&id)?;
    feed.view_post(post_id).await?;
    Ok(Json(json!({ "id": post_id, "viewed": true })))
}

pub async fn delete_post_handler(
    State(feed): State<FeedInterface>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Value>, AppError> {
    let post_id = parse_post_id(&id)?;
    feed.delete_post(post_id).await?;
    Ok(Json(json!({ "id": post_id, "deleted": true })))
}

pub async fn follow_handler(
    State(feed): State<FeedInterface>,
    AxumPath(handle): AxumPath<String>,
    Json(req): Json<FollowRequest>,
) -> Result<Json<Value>, AppError> {
    feed.follow(&req.follower, &handle).await?;
    Ok(Json(json!({ "follower": req.follower, "following": handle })))
}

pub async fn roles_handler(
    State(feed): State<FeedInterface>,
    AxumPath(handle): AxumPath<String>,
    Json(req): Json<RolesRequest>,
) -> Result<Json<Value>, AppError> {
    feed.set_roles(&handle, req.is_admin, req.is_verified).await?;
    Ok(Json(json!({ "handle": handle, "updated": true })))
}

pub async fn delete_user_handler(
    State(feed): State<FeedInterface>,
    AxumPath(handle): AxumPath<String>,
) -> Result<Json<Value>, AppError> {
    feed.delete_user(&handle).await?;
    Ok(Json(json!({ "handle": handle, "deleted": true })))
}

pub fn create_feed_router(feed: FeedInterface) -> Router {
    Router::new()
        // Top lists
        .route("/toplists", get(top_lists_handler))
        .route("/metrics", get(metrics_handler))

        // Users
        .route("/users", post(register_user_handler))
        .route("/users/{handle}", get(profile_handler).delete(delete_user_handler))
        .route("/users/{handle}/follow", post(follow_handler))
        .route("/users/{handle}/roles", post(roles_handler))

        // Posts and engagement
        .route("/posts", post(create_post_handler))
        .route("/posts/{id}", delete(delete_post_handler))
        .route("/posts/{id}/like", post(like_post_handler))
        .route("/posts/{id}/like/{user}", delete(unlike_post_handler))
        .route("/posts/{id}/comment", post(comment_post_handler))
        .route("/posts/{id}/share", post(share_post_handler))
        .route("/posts/{id}/view", post(view_post_handler))

        .with_state(feed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> FeedInterface {
        FeedInterface::new(InMemoryCorpus::default(), TopListConfig::default())
    }

    #[tokio::test]
    async fn test_successful_mutation_invalidates() {
        let feed = feed();
        feed.register_user("alice", None).await.unwrap();
        feed.top_lists().await.unwrap();
        assert!(feed.cache().is_fresh().await);

        feed.create_post("alice", "hello").await.unwrap();
        assert!(!feed.cache().is_fresh().await);
        assert_eq!(feed.top_lists().await.unwrap().recent_posts.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_cache_fresh() {
        let feed = feed();
        feed.register_user("alice", None).await.unwrap();
        feed.top_lists().await.unwrap();

        assert!(feed.create_post("ghost", "hello").await.is_err());
        assert!(feed.cache().is_fresh().await);
        assert_eq!(feed.cache().metrics().invalidations, 1);
    }

    #[tokio::test]
    async fn test_profile_recomputes_stats() {
        let feed = feed();
        feed.register_user("alice", None).await.unwrap();
        feed.register_user("bob", None).await.unwrap();
        let post_id = feed.create_post("alice", "hi").await.unwrap();
        feed.like_post(post_id, "bob").await.unwrap();
        feed.follow("bob", "alice").await.unwrap();
        feed.set_roles("alice", None, Some(true)).await.unwrap();

        let profile = feed.profile("alice").await.unwrap();
        assert_eq!(profile.badge, Badge::Verified);
        assert_eq!(profile.stats.likes, 1);
        assert_eq!(profile.stats.followers, 1);
        // 10 + 2 + 20 + 1000
        assert_eq!(profile.stats.reputation_score, 1032);
        assert_eq!(profile.reputation_tier, ReputationTier::Medium);

        assert!(matches!(feed.profile("ghost").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_role_change_moves_user_into_top_admins() {
        let feed = feed();
        feed.register_user("alice", None).await.unwrap();
        feed.create_post("alice", "hi").await.unwrap();
        assert!(feed.top_lists().await.unwrap().top_admins.is_empty());

        feed.set_roles("alice", Some(true), None).await.unwrap();
        let admins = feed.top_lists().await.unwrap().top_admins.clone();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].post_count, 1);
    }

    #[tokio::test]
    async fn test_deletions_purge_cached_lists() {
        let feed = feed();
        feed.register_user("alice", None).await.unwrap();
        feed.register_user("bob", None).await.unwrap();
        let post_id = feed.create_post("alice", "#gone").await.unwrap();
        feed.create_post("bob", "#stays").await.unwrap();
        assert_eq!(feed.top_lists().await.unwrap().recent_posts.len(), 2);

        feed.delete_post(post_id).await.unwrap();
        let lists = feed.top_lists().await.unwrap();
        assert!(lists.recent_posts.iter().all(|p| p.id != post_id));
        assert!(lists.trending_tags.iter().all(|t| t.tag != "gone"));

        feed.delete_user("bob").await.unwrap();
        let lists = feed.top_lists().await.unwrap();
        assert!(lists.recent_posts.is_empty());
        assert_eq!(lists.platform.users, 1);
    }
}
