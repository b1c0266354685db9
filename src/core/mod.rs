// Core primitives: typed ids, scoring, tag extraction

pub mod scoring;
pub mod strong_types;
pub mod tags;

pub use scoring::{author_engagement, post_score, user_reputation, ReputationTier};
pub use strong_types::{PostId, UserId};
pub use tags::extract_tags;
