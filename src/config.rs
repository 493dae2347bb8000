use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
}

#[derive(Serialize, Deserialize)]
pub struct ApiConfig {
    /// Server root, e.g. `http://localhost:9999`. Trailing slash is fine.
    pub base_url: String,
    /// Fetch the feed from `/api/slow/posts` instead of `/api/posts`.
    #[serde(default)]
    pub slow: bool,
    /// Per-request timeout. No timeout if omitted.
    pub timeout_secs: Option<u64>,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), slow: false, timeout_secs: None }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
