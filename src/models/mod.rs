// Feed entities: users and their posts

pub mod post;
pub mod user;

pub use post::{Comment, Post, MAX_POST_CHARS};
pub use user::{Badge, User, UserStats};
