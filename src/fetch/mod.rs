//! Profile fetching: a priority-ordered list of provider endpoints tried in
//! turn, with a per-UID on-disk cache in front.

pub mod cache;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::model::Uid;
use crate::normalize::shapes::has_character_list;
use crate::utils::url::{expand_uid_template, host_of};
use cache::{CachedProfile, ProfileCache};

pub const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(6);
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One candidate provider. `url_template` contains `{uid}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    pub name: String,
    pub url_template: String,
}

impl ProviderEndpoint {
    pub fn new(name: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
        }
    }
}

/// The verbatim body of the first acceptable provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPayload {
    pub uid: u64,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub from_cache: bool,
    pub body: Value,
}

impl From<CachedProfile> for RawPayload {
    fn from(entry: CachedProfile) -> Self {
        RawPayload {
            uid: entry.uid,
            source: entry.source,
            fetched_at: entry.fetched_at,
            from_cache: true,
            body: entry.payload,
        }
    }
}

/// Why one candidate endpoint was rejected.
#[derive(Debug)]
pub enum FetchError {
    Request(reqwest::Error),
    Status(StatusCode),
    Body(serde_json::Error),
    NoCharacterList,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Request(err) if err.is_timeout() => write!(f, "request timed out"),
            FetchError::Request(err) => write!(f, "request failed: {}", err),
            FetchError::Status(status) => write!(f, "provider answered {}", status),
            FetchError::Body(err) => write!(f, "response is not JSON: {}", err),
            FetchError::NoCharacterList => write!(f, "response has no character list"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Request(err) => Some(err),
            FetchError::Body(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Request(err)
    }
}

/// Anything that can produce a raw profile payload for a UID.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// `None` means every candidate failed; failures are logged, not returned.
    async fn fetch(&self, uid: Uid, force_refresh: bool) -> Option<RawPayload>;
}

pub struct ProfileFetcher {
    client: Client,
    endpoints: Vec<ProviderEndpoint>,
    cache: Option<ProfileCache>,
}

impl ProfileFetcher {
    /// `timeout` bounds each candidate request separately.
    pub fn new(endpoints: Vec<ProviderEndpoint>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("relicard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, endpoints))
    }

    pub fn with_client(client: Client, endpoints: Vec<ProviderEndpoint>) -> Self {
        Self {
            client,
            endpoints,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: ProfileCache) -> Self {
        self.cache = Some(cache);
        self
    }

    async fn try_endpoint(&self, endpoint: &ProviderEndpoint, uid: Uid) -> Result<Value, FetchError> {
        let url = expand_uid_template(&endpoint.url_template, uid);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }
        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes).map_err(FetchError::Body)?;
        if !has_character_list(&body) {
            return Err(FetchError::NoCharacterList);
        }
        Ok(body)
    }

    /// Cache reads and writes touch the filesystem, so they run on the
    /// blocking pool instead of the async worker.
    async fn cached(&self, uid: Uid) -> Option<RawPayload> {
        let cache = self.cache.clone()?;
        match tokio::task::spawn_blocking(move || cache.load_fresh(uid)).await {
            Ok(Ok(Some(entry))) => {
                debug!(uid = %uid, source = %entry.source, "Profile cache hit");
                Some(entry.into())
            }
            Ok(Ok(None)) => {
                debug!(uid = %uid, "Profile cache miss");
                None
            }
            Ok(Err(err)) => {
                warn!(uid = %uid, error = %err, "Ignoring unreadable profile cache entry");
                None
            }
            Err(err) => {
                warn!(uid = %uid, error = %err, "Profile cache read worker failed");
                None
            }
        }
    }

    async fn remember(&self, payload: &RawPayload) {
        let Some(cache) = self.cache.clone() else {
            return;
        };
        let entry = CachedProfile {
            uid: payload.uid,
            fetched_at: payload.fetched_at,
            source: payload.source.clone(),
            payload: payload.body.clone(),
        };
        match tokio::task::spawn_blocking(move || cache.store(&entry)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(uid = %payload.uid, error = %err, "Failed to write profile cache"),
            Err(err) => warn!(uid = %payload.uid, error = %err, "Profile cache write worker failed"),
        }
    }
}

#[async_trait]
impl ProfileSource for ProfileFetcher {
    async fn fetch(&self, uid: Uid, force_refresh: bool) -> Option<RawPayload> {
        if !force_refresh {
            if let Some(hit) = self.cached(uid).await {
                return Some(hit);
            }
        }

        for (attempt, endpoint) in self.endpoints.iter().enumerate() {
            let host = host_of(&endpoint.url_template);
            debug!(uid = %uid, provider = %endpoint.name, host = %host, attempt, "Querying provider");
            match self.try_endpoint(endpoint, uid).await {
                Ok(body) => {
                    info!(uid = %uid, provider = %endpoint.name, "Fetched profile");
                    let payload = RawPayload {
                        uid: uid.get(),
                        source: endpoint.name.clone(),
                        fetched_at: Utc::now(),
                        from_cache: false,
                        body,
                    };
                    self.remember(&payload).await;
                    return Some(payload);
                }
                Err(err) => {
                    warn!(uid = %uid, provider = %endpoint.name, error = %err, "Provider attempt failed");
                }
            }
        }

        warn!(uid = %uid, candidates = self.endpoints.len(), "No provider returned a profile");
        None
    }
}

/// Clamp a configured timeout into the accepted per-request window.
pub fn clamp_timeout(timeout: Duration) -> Duration {
    timeout.clamp(MIN_REQUEST_TIMEOUT, MAX_REQUEST_TIMEOUT)
}

#[cfg(test)]
mod tests;
