//! Result cache service.
//!
//! Three moka caches with a shared TTL, each bounded in entry count:
//! prioritization results by fingerprint, chart URLs by fingerprint and
//! chart requests by public chart key. One instance is built per process and
//! handed to the prioritizer; lookups never see entries older than the TTL.

use std::{sync::Arc, time::Duration};

use moka::sync::Cache;
use serde::{Deserialize, Serialize};

use crate::core::{
    profile::UserProfile,
    request::{Fingerprint, PrioritizationRequest},
    requirement::Requirement,
};

/// Cache settings (the `[cache]` config section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig
{
    pub ttl_secs: u64,
    pub max_results: u64,
    pub max_chart_urls: u64,
    pub max_chart_requests: u64,
}

impl Default for CacheConfig
{
    fn default() -> Self
    {
        Self {
            ttl_secs: 60 * 60 * 3,
            max_results: 8_388_608,
            max_chart_urls: 1_048_576,
            max_chart_requests: 8_388_608,
        }
    }
}

/// Ranked phase-2 output of one request, with the profile it was built from
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPrioritization
{
    pub requirements: Vec<Requirement>,
    pub profile: UserProfile,
    pub redirected: bool,
}

/// What a public chart key resolves to
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest
{
    pub request: PrioritizationRequest,
    pub profile: UserProfile,
}

#[derive(Clone)]
pub struct ResultCache
{
    results: Cache<Fingerprint, Arc<CachedPrioritization>>,
    chart_urls: Cache<Fingerprint, String>,
    chart_requests: Cache<String, Arc<ChartRequest>>,
}

impl ResultCache
{
    pub fn new(config: &CacheConfig) -> Self
    {
        Self::with_ttl(config, Duration::from_secs(config.ttl_secs))
    }

    /// Same as [`ResultCache::new`] with an explicit TTL
    pub fn with_ttl(
        config: &CacheConfig,
        ttl: Duration,
    ) -> Self
    {
        Self {
            results: Cache::builder()
                .max_capacity(config.max_results)
                .time_to_live(ttl)
                .build(),
            chart_urls: Cache::builder()
                .max_capacity(config.max_chart_urls)
                .time_to_live(ttl)
                .build(),
            chart_requests: Cache::builder()
                .max_capacity(config.max_chart_requests)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn result(
        &self,
        fingerprint: &Fingerprint,
    ) -> Option<Arc<CachedPrioritization>>
    {
        self.results
            .get(fingerprint)
    }

    /// Last writer wins
    pub fn store_result(
        &self,
        fingerprint: Fingerprint,
        entry: CachedPrioritization,
    ) -> Arc<CachedPrioritization>
    {
        let entry = Arc::new(entry);
        self.results
            .insert(fingerprint, Arc::clone(&entry));
        entry
    }

    pub fn chart_url(
        &self,
        fingerprint: &Fingerprint,
    ) -> Option<String>
    {
        self.chart_urls
            .get(fingerprint)
    }

    pub fn chart_request(
        &self,
        key: &str,
    ) -> Option<Arc<ChartRequest>>
    {
        self.chart_requests
            .get(key)
    }

    pub fn store_chart(
        &self,
        fingerprint: Fingerprint,
        url: String,
        key: String,
        chart: ChartRequest,
    )
    {
        self.chart_urls
            .insert(fingerprint, url);
        self.chart_requests
            .insert(key, Arc::new(chart));
    }

    pub fn invalidate_all(&self)
    {
        self.results
            .invalidate_all();
        self.chart_urls
            .invalidate_all();
        self.chart_requests
            .invalidate_all();
    }
}
