//! Access token cache for the Hatif API
//!
//! Tokens are refreshed 30 seconds before they expire. Concurrent callers that
//! find the cache empty wait on the same lock, so only one of them fetches.

use std::{
    future::Future,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

/// Seconds shaved off the advertised lifetime, and the minimum lifetime kept.
const EXPIRY_MARGIN_SECS: u64 = 30;

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct TokenCache {
    token: Mutex<Option<CachedToken>>,
}

/// How long a token with the given `expires_in` is kept.
pub fn effective_ttl(expires_in_secs: u64) -> Duration {
    Duration::from_secs(
        expires_in_secs
            .saturating_sub(EXPIRY_MARGIN_SECS)
            .max(EXPIRY_MARGIN_SECS),
    )
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached token or calls `fetch` for a new `(token, expires_in_secs)`.
    pub async fn get_or_refresh<F, Fut>(&self, fetch: F) -> anyhow::Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<(String, u64)>>,
    {
        let mut guard = self.token.lock().await;

        if let Some(cached) = guard.as_ref() {
            if Instant::now() < cached.expires_at {
                return Ok(cached.value.clone());
            }
        }

        tracing::info!("token_cache_refreshing");
        let started = Instant::now();
        let (value, expires_in) = fetch().await.inspect_err(|e| {
            tracing::error!(error = %e, "token_cache_refresh_failed");
        })?;

        *guard = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + effective_ttl(expires_in),
        });
        tracing::info!(
            expires_in = expires_in,
            duration_ms = started.elapsed().as_millis() as u64,
            "token_cache_refreshed"
        );

        Ok(value)
    }

    /// Drops the cached token, used after the API rejects it.
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }
}
