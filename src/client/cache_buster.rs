//! Strictly increasing cache-busting tokens

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of cache-busting tokens for read requests
///
/// Tokens are wall-clock milliseconds, bumped by one whenever the clock has
/// not moved (or moved backwards) since the previous token, so no two
/// requests ever share a token.
#[derive(Debug, Default)]
pub struct CacheBuster {
    last: AtomicI64,
}

impl CacheBuster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_token(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}
