use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub toplists: TopListConfig,
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Sizing and freshness of the cached top lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopListConfig {
    pub ttl_secs: u64,
    pub popular_window_days: i64,
    pub admins_limit: usize,
    pub authors_limit: usize,
    pub popular_limit: usize,
    pub recent_limit: usize,
    pub tags_limit: usize,
}

impl Default for TopListConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300, // 5 minutes
            popular_window_days: 30,
            admins_limit: 5,
            authors_limit: 10,
            popular_limit: 10,
            recent_limit: 10,
            tags_limit: 10,
        }
    }
}

impl TopListConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_secs: env::var("TOPLIST_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.ttl_secs),
            popular_window_days: env::var("TOPLIST_POPULAR_WINDOW_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.popular_window_days),
            admins_limit: limit_from_env("TOPLIST_ADMINS_LIMIT", defaults.admins_limit),
            authors_limit: limit_from_env("TOPLIST_AUTHORS_LIMIT", defaults.authors_limit),
            popular_limit: limit_from_env("TOPLIST_POPULAR_LIMIT", defaults.popular_limit),
            recent_limit: limit_from_env("TOPLIST_RECENT_LIMIT", defaults.recent_limit),
            tags_limit: limit_from_env("TOPLIST_TAGS_LIMIT", defaults.tags_limit),
        }
    }
}

/// Limits are read as signed integers so that `0` and negative values both
/// mean "empty list" rather than a parse failure.
fn limit_from_env(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map(clamp_limit)
        .unwrap_or(default)
}

pub fn clamp_limit(raw: i64) -> usize {
    raw.max(0) as usize
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            toplists: TopListConfig::from_env(),
            seed_demo_data: env::var("SEED_DEMO_DATA")
                .map(|v| !matches!(v.as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
