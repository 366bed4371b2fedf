//! Request Governor
//!
//! Wraps each remote operation with cache-then-limit-then-call-then-cache
//! semantics. Cache hits never touch the limiter; limiter rejections are
//! never retried; transient remote failures are retried per [`RetryPolicy`].

mod context;
mod retry;

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{validate_key, validate_namespace, validate_ttl, GetOptions};
use crate::error::{Result, SdkError, TransportError};
use crate::models::GovernedCallResult;

pub use context::GovernorContext;
pub use retry::RetryPolicy;

// == Governed Request ==
/// Where a governed read is cached.
#[derive(Debug, Clone)]
pub struct GovernedRequest {
    /// Raw cache key, validated before use
    pub cache_key: String,
    pub namespace: String,
    /// TTL in seconds; the cache default when None
    pub ttl: Option<u64>,
    /// Skip the cache read; the fresh result is still written back
    pub bypass_cache: bool,
}

impl GovernedRequest {
    pub fn new(cache_key: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            cache_key: cache_key.into(),
            namespace: namespace.into(),
            ttl: None,
            bypass_cache: false,
        }
    }

    pub fn with_ttl(mut self, ttl: Option<u64>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn bypass_cache(mut self, bypass: bool) -> Self {
        self.bypass_cache = bypass;
        self
    }
}

// == Governor ==
/// Orchestrates cache, limiter and remote calls over a [`GovernorContext`].
#[derive(Debug, Clone)]
pub struct Governor {
    context: GovernorContext,
    request_timeout: Duration,
}

impl Governor {
    pub fn new(context: GovernorContext, request_timeout: Duration) -> Self {
        Self {
            context,
            request_timeout,
        }
    }

    pub fn context(&self) -> &GovernorContext {
        &self.context
    }

    // == Execute ==
    /// Runs one governed read.
    ///
    /// 1. Fresh cache hit: return it, `from_cache = true`.
    /// 2. Otherwise ask the limiter; a rejection fails with `RateLimitExceeded`.
    /// 3. Call `remote_call`, retrying transient failures.
    /// 4. Store the result and return it, `from_cache = false`.
    pub async fn execute<F, Fut>(
        &self,
        request: &GovernedRequest,
        retry: &RetryPolicy,
        remote_call: F,
    ) -> Result<GovernedCallResult>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<Value, TransportError>>,
    {
        validate_namespace(&request.namespace)?;
        validate_key(&request.cache_key)?;
        validate_ttl(request.ttl)?;

        if !request.bypass_cache {
            let options = GetOptions::in_namespace(request.namespace.as_str());
            if let Some(data) = self.context.cache.write().await.get(&request.cache_key, &options) {
                debug!(key = %request.cache_key, namespace = %request.namespace, "cache hit");
                return Ok(GovernedCallResult {
                    data,
                    from_cache: true,
                });
            }
        }

        self.admit(&request.cache_key).await?;

        let data = self.call_with_retry(retry, remote_call).await?;

        self.context.cache.write().await.set(
            &request.cache_key,
            &data,
            request.ttl,
            Some(&request.namespace),
        )?;

        Ok(GovernedCallResult {
            data,
            from_cache: false,
        })
    }

    // == Execute Mutation ==
    /// Runs one governed write. No cache read; on success every entry in
    /// `invalidate` is dropped so later reads see the change.
    pub async fn execute_mutation<F, Fut>(
        &self,
        operation: &str,
        invalidate: Option<&str>,
        retry: &RetryPolicy,
        remote_call: F,
    ) -> Result<Value>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<Value, TransportError>>,
    {
        if let Some(namespace) = invalidate {
            validate_namespace(namespace)?;
        }
        self.admit(operation).await?;

        let data = self.call_with_retry(retry, remote_call).await?;

        if let Some(namespace) = invalidate {
            let removed = self.context.cache.write().await.clear_namespace(namespace)?;
            debug!(operation, namespace, removed, "invalidated cache after mutation");
        }

        Ok(data)
    }

    async fn admit(&self, identifier: &str) -> Result<()> {
        let decision = self.context.limiter.check_rate_limit(Some(identifier)).await;
        if decision.allowed {
            return Ok(());
        }

        warn!(
            identifier,
            retry_after_ms = ?decision.retry_after_ms,
            "request rejected by rate limiter"
        );
        Err(SdkError::rate_limited(decision.retry_after_ms))
    }

    async fn call_with_retry<F, Fut>(&self, retry: &RetryPolicy, mut remote_call: F) -> Result<Value>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<Value, TransportError>>,
    {
        let mut attempt = 0;
        loop {
            let err = match tokio::time::timeout(self.request_timeout, remote_call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) => SdkError::from_transport(err),
                Err(_) => SdkError::network(format!(
                    "Request timed out after {} ms",
                    self.request_timeout.as_millis()
                )),
            };

            if !err.is_transient() || attempt >= retry.max_retries {
                info!(kind = %err.kind, attempts = attempt + 1, "remote call failed");
                return Err(err);
            }

            attempt += 1;
            warn!(attempt, max = retry.max_retries, error = %err, "retrying remote call");
            tokio::time::sleep(retry.delay_for(attempt)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::rate_limiter::RateLimiterConfig;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn governor(max: u32) -> Governor {
        let context = GovernorContext::from_parts(3600, RateLimiterConfig::with_max(max));
        Governor::new(context, Duration::from_millis(200))
    }

    fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let gov = governor(10);
        let calls = Arc::new(AtomicUsize::new(0));
        let request = GovernedRequest::new("record.1", "sleep");

        for expected_from_cache in [false, true] {
            let calls = calls.clone();
            let result = gov
                .execute(&request, &fast_retry(0), move || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(json!({"data": "X"}))
                    }
                })
                .await
                .unwrap();
            assert_eq!(result.from_cache, expected_from_cache);
            assert_eq!(result.data["data"], "X");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(gov.context().limiter.stats().await.total_requests, 1);
    }

    #[tokio::test]
    async fn test_invalid_key_is_validation_error() {
        let gov = governor(10);
        let request = GovernedRequest::new("bad key", "sleep");

        let err = gov
            .execute(&request, &fast_retry(0), || async { Ok(json!(1)) })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(gov.context().limiter.stats().await.total_requests, 0);
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected_before_limiter_and_remote() {
        let gov = governor(10);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let request = GovernedRequest::new("k", "sleep").with_ttl(Some(0));

        let err = gov
            .execute(&request, &fast_retry(3), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(json!(1)) }
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(gov.context().limiter.stats().await.total_requests, 0);
    }

    #[tokio::test]
    async fn test_namespace_with_colon_rejected() {
        let gov = governor(10);
        gov.execute(&GovernedRequest::new("b:c", "a"), &fast_retry(0), || async {
            Ok(json!("inner"))
        })
        .await
        .unwrap();

        let err = gov
            .execute(&GovernedRequest::new("c", "a:b"), &fast_retry(0), || async {
                Ok(json!("outer"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = gov
            .execute_mutation("update.c", Some("a:b"), &fast_retry(0), || async {
                Ok(json!(true))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(gov.context().limiter.stats().await.total_requests, 1);

        let cached = gov
            .execute(&GovernedRequest::new("b:c", "a"), &fast_retry(0), || async {
                Ok(json!("fresh"))
            })
            .await
            .unwrap();
        assert!(cached.from_cache);
        assert_eq!(cached.data, json!("inner"));
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let gov = governor(10);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = gov
            .execute(&GovernedRequest::new("k", "sleep"), &fast_retry(3), move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(TransportError::ConnectionAborted("reset".into()))
                    } else {
                        Ok(json!("ok"))
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(result.data, json!("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Retries do not consume extra limiter budget
        assert_eq!(gov.context().limiter.stats().await.total_requests, 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted_surface_last_error() {
        let gov = governor(10);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let err = gov
            .execute(&GovernedRequest::new("k", "sleep"), &fast_retry(2), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(TransportError::Timeout("slow".into())) }
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_auth_failure_not_retried() {
        let gov = governor(10);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let err = gov
            .execute(&GovernedRequest::new("k", "sleep"), &fast_retry(3), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(TransportError::Status {
                        status: 401,
                        message: "bad token".into(),
                    })
                }
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Auth);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_call_times_out_as_network_error() {
        let gov = governor(10);

        let err = gov
            .execute(&GovernedRequest::new("k", "sleep"), &fast_retry(0), || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(json!(1))
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Network);
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_rate_limited_skips_remote_call() {
        let gov = governor(1);
        let calls = Arc::new(AtomicUsize::new(0));

        for (i, key) in ["a", "b"].iter().enumerate() {
            let counter = calls.clone();
            let result = gov
                .execute(&GovernedRequest::new(*key, "sleep"), &fast_retry(3), move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok(json!(1)) }
                })
                .await;
            if i == 0 {
                assert!(result.is_ok());
            } else {
                let err = result.unwrap_err();
                assert_eq!(err.kind, ErrorKind::RateLimitExceeded);
                assert_eq!(err.retry_after_ms, None);
            }
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bypass_cache_still_writes() {
        let gov = governor(10);
        let request = GovernedRequest::new("k", "sleep");

        gov.execute(&request, &fast_retry(0), || async { Ok(json!(1)) })
            .await
            .unwrap();
        let fresh = gov
            .execute(&request.clone().bypass_cache(true), &fast_retry(0), || async {
                Ok(json!(2))
            })
            .await
            .unwrap();
        assert!(!fresh.from_cache);

        let cached = gov
            .execute(&request, &fast_retry(0), || async { Ok(json!(3)) })
            .await
            .unwrap();
        assert!(cached.from_cache);
        assert_eq!(cached.data, json!(2));
    }

    #[tokio::test]
    async fn test_mutation_invalidates_namespace() {
        let gov = governor(10);
        gov.execute(&GovernedRequest::new("k", "sleep"), &fast_retry(0), || async {
            Ok(json!(1))
        })
        .await
        .unwrap();

        let data = gov
            .execute_mutation("update.k", Some("sleep"), &fast_retry(0), || async {
                Ok(json!({"updated": true}))
            })
            .await
            .unwrap();
        assert_eq!(data["updated"], true);

        let stats = gov.context().cache_stats().await;
        assert_eq!(stats.size, 0);
        assert_eq!(stats.deletes, 1);
    }
}
