//! Sleep API Client
//!
//! The governed operations exposed to SDK users. Every call goes through the
//! [`Governor`] with a cache key derived from the operation and its
//! identifying parameters.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::validate_key;
use crate::config::Config;
use crate::error::{Result, SdkError};
use crate::governor::{GovernedRequest, Governor, GovernorContext, RetryPolicy};
use crate::models::{
    DeleteOptions, FetchManyOptions, FetchOptions, GovernedCallResult, StatsReport, UpdateFields,
};
use crate::tasks::spawn_cleanup_task;
use crate::transport::{HttpTransport, RemoteRequest, Transport};

/// Cache namespace holding sleep records and record pages.
pub const SLEEP_NAMESPACE: &str = "sleep";

const RECORDS_PATH: &str = "sleep";

/// Client for the remote sleep-data API.
#[derive(Clone)]
pub struct SleepClient {
    governor: Governor,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    cleanup_interval: u64,
}

impl SleepClient {
    /// Creates a client over the given transport with fresh cache and limiter state.
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let context = GovernorContext::new(config);
        Self {
            governor: Governor::new(context, config.request_timeout),
            transport,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                ..RetryPolicy::default()
            },
            cleanup_interval: config.cache.cleanup_interval,
        }
    }

    /// Overrides the retry policy for remote calls.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // == Init ==
    /// Validates the configuration, builds the HTTP transport and preloads
    /// the cache when configured to.
    pub async fn init(config: Config) -> Result<Self> {
        let transport = HttpTransport::from_config(&config)?;
        Self::init_with_transport(config, Arc::new(transport)).await
    }

    pub async fn init_with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let client = Self::new(&config, transport);
        info!(environment = ?config.environment, "sleep client initialized");

        if config.cache.preload {
            client.preload().await?;
        }
        Ok(client)
    }

    pub fn governor(&self) -> &Governor {
        &self.governor
    }

    // == Fetch One ==
    /// Fetches a single sleep record by id.
    pub async fn fetch_one(&self, id: &str, options: &FetchOptions) -> Result<GovernedCallResult> {
        let cache_key = format!("record.{}", id);
        validate_key(&cache_key)?;

        let request = GovernedRequest::new(cache_key, SLEEP_NAMESPACE)
            .with_ttl(options.ttl)
            .bypass_cache(!options.use_cache);
        let remote = RemoteRequest::get(format!("{}/{}", RECORDS_PATH, id));

        let transport = &self.transport;
        self.governor
            .execute(&request, &self.retry, move || transport.send(remote.clone()))
            .await
    }

    // == Fetch Many ==
    /// Fetches a page of sleep records, optionally bounded by date and count.
    pub async fn fetch_many(&self, options: &FetchManyOptions) -> Result<GovernedCallResult> {
        if let Some(msg) = options.validate() {
            return Err(SdkError::validation(msg));
        }

        let request = GovernedRequest::new(options.cache_key(), SLEEP_NAMESPACE)
            .with_ttl(options.ttl)
            .bypass_cache(!options.use_cache);

        let mut remote = RemoteRequest::get(RECORDS_PATH);
        if let Some(start) = options.start_date {
            remote = remote.with_query("start_date", start.format("%Y-%m-%d"));
        }
        if let Some(end) = options.end_date {
            remote = remote.with_query("end_date", end.format("%Y-%m-%d"));
        }
        if let Some(limit) = options.limit {
            remote = remote.with_query("limit", limit);
        }

        let transport = &self.transport;
        self.governor
            .execute(&request, &self.retry, move || transport.send(remote.clone()))
            .await
    }

    // == Update ==
    /// Changes fields on a record and invalidates cached sleep data.
    pub async fn update(&self, id: &str, fields: UpdateFields) -> Result<Value> {
        validate_key(id)?;
        if fields.is_empty() {
            return Err(SdkError::validation("update requires at least one field"));
        }

        let remote = RemoteRequest::patch(format!("{}/{}", RECORDS_PATH, id), Value::Object(fields));
        let transport = &self.transport;
        self.governor
            .execute_mutation(
                &format!("update.{}", id),
                Some(SLEEP_NAMESPACE),
                &self.retry,
                move || transport.send(remote.clone()),
            )
            .await
    }

    // == Delete ==
    /// Deletes a record. Requires `force_delete`.
    pub async fn delete(&self, id: &str, options: DeleteOptions) -> Result<Value> {
        if !options.force_delete {
            return Err(SdkError::confirmation_required("delete"));
        }
        validate_key(id)?;

        let remote = RemoteRequest::delete(format!("{}/{}", RECORDS_PATH, id));
        let transport = &self.transport;
        self.governor
            .execute_mutation(
                &format!("delete.{}", id),
                Some(SLEEP_NAMESPACE),
                &self.retry,
                move || transport.send(remote.clone()),
            )
            .await
    }

    // == Preload ==
    /// Warms the cache with the default record page.
    pub async fn preload(&self) -> Result<()> {
        let result = self.fetch_many(&FetchManyOptions::default()).await?;
        info!(from_cache = result.from_cache, "cache preloaded");
        Ok(())
    }

    // == Maintenance ==
    /// Starts the periodic expiry sweep at the configured interval.
    pub fn spawn_cleanup(&self) -> JoinHandle<()> {
        spawn_cleanup_task(self.governor.context().cache.clone(), self.cleanup_interval)
    }

    /// Drops cached data and returns the limiter to Open.
    pub async fn reset(&self, clear_stats: bool) {
        self.governor.context().reset(clear_stats).await;
    }

    pub async fn stats(&self) -> StatsReport {
        let context = self.governor.context();
        StatsReport::new(
            context.cache_stats().await,
            context.limiter.stats().await,
            context.limiter.state().await,
        )
    }
}
