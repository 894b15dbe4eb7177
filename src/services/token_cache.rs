use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::error::{DomainError, ErrorKind};

const REFRESH_SKEW: Duration = Duration::from_secs(60);

/// Implemented once per adapter family to perform the actual OAuth2
/// client-credentials (or static-bearer) exchange. [`TokenCache`] handles
/// caching, expiry, and single-flight refresh on top of this.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<(String, Duration), DomainError>;
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Caches one adapter's bearer token and refreshes it with single-flight
/// semantics: concurrent callers serialize on the same mutex, so only the
/// first ever reaches [`TokenSource::fetch_token`] while the token is stale.
pub struct TokenCache<S: TokenSource> {
    source: S,
    state: Mutex<Option<CachedToken>>,
}

impl<S: TokenSource> TokenCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: Mutex::new(None),
        }
    }

    /// Returns a bearer token valid for exactly one outbound call.
    pub async fn acquire_auth_headers(&self) -> Result<String, DomainError> {
        let mut guard = self.state.lock().await;

        let needs_refresh = match guard.as_ref() {
            None => true,
            Some(cached) => Instant::now() + REFRESH_SKEW >= cached.expires_at,
        };

        if needs_refresh {
            let (token, ttl) = self
                .source
                .fetch_token()
                .await
                .map_err(|e| DomainError::adapter(ErrorKind::Authentication, e.to_string()))?;
            *guard = Some(CachedToken {
                token: token.clone(),
                expires_at: Instant::now() + ttl,
            });
            return Ok(token);
        }

        Ok(guard.as_ref().expect("checked above").token.clone())
    }

    /// Forces the next `acquire_auth_headers` call to refresh, called after
    /// an outbound 401.
    pub async fn invalidate_token(&self) {
        let mut guard = self.state.lock().await;
        *guard = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct CountingSource {
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn fetch_token(&self) -> Result<(String, Duration), DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(("tok".to_string(), Duration::from_secs(3600)))
        }
    }

    #[tokio::test]
    async fn single_flight_refresh_calls_source_once_for_concurrent_callers() {
        let calls = Arc::new(AtomicU32::new(0));
        let cache = Arc::new(TokenCache::new(CountingSource { calls: calls.clone() }));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.acquire_auth_headers().await }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "tok");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_next_refresh() {
        let calls = Arc::new(AtomicU32::new(0));
        let cache = TokenCache::new(CountingSource { calls: calls.clone() });

        cache.acquire_auth_headers().await.unwrap();
        cache.invalidate_token().await;
        cache.acquire_auth_headers().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
