//! End-to-end prioritization.
//!
//! `compute_priorities` runs, per request:
//!
//! 1. Fingerprint the request. A live cache entry with at least
//!    `limit - refetch_slack` requirements is re-filtered and re-scored
//!    against current feedback and returned without touching the tracker.
//! 2. Otherwise build the assignee profile, fetch open candidates, drop
//!    disliked and deferred ones, mark liked ones.
//! 3. Phase 1: score without comment counts, normalize, keep the top `limit`.
//! 4. Fetch comment counts for those only (parallel fan-out).
//! 5. Phase 2: score again with comments, normalize, cache, return.
//!
//! A tracker failure in either phase aborts the call and leaves the cache
//! untouched.

use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    core::{
        cache::{CachedPrioritization, ChartRequest, ResultCache},
        chart::{self, ChartData},
        error::PrioritizeError,
        feedback::FeedbackLedger,
        keywords::KeywordExtractor,
        profile::{UserProfile, UserProfileBuilder},
        request::{Fingerprint, PrioritizationRequest},
        requirement::{IssueId, Requirement},
        scorer::{PriorityMode, ScoreContext, ScoringConfig, ScoringStrategy, normalize, score_batch},
        version::VersionBucketer,
    },
    infra::{
        clock::Clock,
        config::Config,
        source::{BugQuery, BugSource, IssueStatus},
        store::ProfileStore,
    },
};

/// Pipeline settings (the `[prioritizer]` config section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrioritizerConfig
{
    /// Candidates kept after phase 1 (and comment fetches per request)
    pub limit: usize,

    /// Cached results with fewer than `limit - refetch_slack` entries are refetched
    pub refetch_slack: usize,

    /// Oldest issue creation considered, in years
    pub max_age_years: u32,

    pub priority_mode: PriorityMode,

    /// Content-based score multiplier for liked requirements
    pub reward_multiplier: f64,

    pub max_comment_workers: usize,
}

impl Default for PrioritizerConfig
{
    fn default() -> Self
    {
        Self {
            limit: 75,
            refetch_slack: 5,
            max_age_years: 7,
            priority_mode: PriorityMode::Float,
            reward_multiplier: 5.0,
            max_comment_workers: 75,
        }
    }
}

impl PrioritizerConfig
{
    pub fn refetch_threshold(&self) -> usize
    {
        self.limit
            .saturating_sub(self.refetch_slack)
    }
}

/// One entry of a ranked response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRequirement
{
    pub id: IssueId,
    pub summary: String,
    pub product: String,
    pub component: String,
    pub priority: f64,
    pub cc_count: usize,
    pub milestone: Option<String>,
    pub keywords: Vec<String>,
    pub creation_time: DateTime<Utc>,
    pub liked: bool,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizationOutcome
{
    pub ranked: Vec<RankedRequirement>,

    /// Variant assigned to the agent
    pub version: u8,

    /// Keyword signal was degenerate; MAUT without keywords was used
    pub redirected: bool,

    pub from_cache: bool,
}

/// Explicit feedback on one requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback
{
    Like,
    Unlike,
    Dislike,
    Undislike,
    Defer
    {
        interval_days: u32
    },
}

impl Feedback
{
    fn label(self) -> &'static str
    {
        match self
        {
            Feedback::Like => "Like",
            Feedback::Unlike => "Unlike",
            Feedback::Dislike => "Dislike",
            Feedback::Undislike => "Undislike",
            Feedback::Defer { .. } => "Defer",
        }
    }
}

/// Where an issue sits in the cached ranking of a request (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankPosition
{
    pub position: usize,
    pub priority: f64,
}

/// Result of one filter-and-score pass
struct Pass
{
    requirements: Vec<Requirement>,
    redirected: bool,
}

pub struct Prioritizer
{
    source: Arc<dyn BugSource>,
    store: Arc<dyn ProfileStore>,
    cache: ResultCache,
    clock: Arc<dyn Clock>,
    extractor: KeywordExtractor,
    settings: PrioritizerConfig,
    scoring: ScoringConfig,
    reserved: HashMap<String, u8>,
    base_url: String,
}

impl Prioritizer
{
    pub fn new(
        config: &Config,
        source: Arc<dyn BugSource>,
        store: Arc<dyn ProfileStore>,
        cache: ResultCache,
        clock: Arc<dyn Clock>,
    ) -> Result<Self>
    {
        Ok(Self {
            source,
            store,
            cache,
            clock,
            extractor: KeywordExtractor::new(&config.keywords)?,
            settings: config
                .prioritizer
                .clone(),
            scoring: config
                .scoring
                .clone(),
            reserved: config
                .versions
                .reserved
                .clone(),
            base_url: config
                .links
                .base_url
                .clone(),
        })
    }

    pub fn cache(&self) -> &ResultCache
    {
        &self.cache
    }

    /// Rank open requirements for the request's agent
    #[instrument(skip_all, fields(agent = %request.agent_id, fp = %request.fingerprint().digest()))]
    pub fn compute_priorities(
        &self,
        request: &PrioritizationRequest,
    ) -> Result<PrioritizationOutcome, PrioritizeError>
    {
        request.validate()?;
        let fingerprint = request.fingerprint();
        let now = self
            .clock
            .now();
        let assigned = VersionBucketer::new(self.store.as_ref(), &self.reserved).assign(&request.agent_id)?;

        let mut reused = None;
        if let Some(entry) = self
            .cache
            .result(&fingerprint)
        {
            let pass = self.prioritize(request, entry.requirements.clone(), &entry.profile, assigned, now)?;
            if pass.requirements.len() >= self.settings.refetch_threshold()
            {
                reused = Some(pass);
            }
            else
            {
                debug!(remaining = pass.requirements.len(), "Too few cached requirements left, refetching");
            }
        }

        let from_cache = reused.is_some();
        let pass = match reused
        {
            Some(pass) => pass,
            None => self.fetch_and_prioritize(request, &fingerprint, assigned, now)?,
        };

        info!(
            version = assigned.version(),
            redirected = pass.redirected,
            from_cache,
            ranked = pass.requirements.len(),
            "Prioritize"
        );

        let ranked = pass
            .requirements
            .iter()
            .map(|r| self.ranked_entry(r, &fingerprint))
            .collect();

        Ok(PrioritizationOutcome { ranked, version: assigned.version(), redirected: pass.redirected, from_cache })
    }

    fn fetch_and_prioritize(
        &self,
        request: &PrioritizationRequest,
        fingerprint: &Fingerprint,
        assigned: ScoringStrategy,
        now: DateTime<Utc>,
    ) -> Result<Pass, PrioritizeError>
    {
        let profile = self.build_profile(request, now)?;

        let query = BugQuery::new(
            IssueStatus::New,
            &request.products,
            &request.components,
            self.settings
                .max_age_years,
            now,
        );
        let mut candidates: Vec<Requirement> = self
            .source
            .fetch_candidates(&query)?
            .into_iter()
            .map(Requirement::from)
            .collect();
        self.extractor
            .extract(&mut candidates);

        // Phase 1: no comment counts yet
        let mut top = self
            .prioritize(request, candidates, &profile, assigned, now)?
            .requirements;
        top.truncate(
            self.settings
                .limit,
        );

        let ids: Vec<IssueId> = top
            .iter()
            .map(|r| r.id)
            .collect();
        let counts = self
            .source
            .fetch_comment_counts(
                &ids,
                self.settings
                    .max_comment_workers,
            )?;
        for r in &mut top
        {
            r.number_of_comments = Some(
                counts
                    .get(&r.id)
                    .copied()
                    .unwrap_or(0),
            );
        }

        // Phase 2: final ranking
        let pass = self.prioritize(request, top, &profile, assigned, now)?;
        self.cache
            .store_result(
                fingerprint.clone(),
                CachedPrioritization {
                    requirements: pass
                        .requirements
                        .clone(),
                    profile,
                    redirected: pass.redirected,
                },
            );
        Ok(pass)
    }

    /// Feedback filter, reward marking, scoring, normalization and sort
    fn prioritize(
        &self,
        request: &PrioritizationRequest,
        requirements: Vec<Requirement>,
        profile: &UserProfile,
        assigned: ScoringStrategy,
        now: DateTime<Utc>,
    ) -> Result<Pass, PrioritizeError>
    {
        let ledger = FeedbackLedger::new(self.store.as_ref());
        let mut kept = Vec::with_capacity(requirements.len());
        for mut r in requirements
        {
            if !ledger.is_relevant(&request.agent_id, r.id, now)?
            {
                continue;
            }
            r.reward = ledger.is_liked(&request.agent_id, r.id)?;
            kept.push(r);
        }

        let ctx = ScoreContext {
            assignee: &request.assignee,
            profile,
            preferred_keywords: &request.keywords,
            now,
            max_age_years: self
                .settings
                .max_age_years,
            reward_multiplier: self
                .settings
                .reward_multiplier,
            config: &self.scoring,
        };
        let batch = score_batch(assigned, &kept, &ctx);

        let mode = self
            .settings
            .priority_mode;
        for (r, p) in kept
            .iter_mut()
            .zip(normalize(&batch.scores, mode))
        {
            r.computed_priority = p;
        }
        kept.retain(|r| r.computed_priority >= mode.floor());
        // Stable: equal priorities put liked first, then keep fetch order
        kept.sort_by(|a, b| {
            b.computed_priority
                .total_cmp(&a.computed_priority)
                .then(b.reward.cmp(&a.reward))
        });

        Ok(Pass { requirements: kept, redirected: batch.redirected })
    }

    fn build_profile(
        &self,
        request: &PrioritizationRequest,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, PrioritizeError>
    {
        Ok(UserProfileBuilder::new(self.source.as_ref(), &self.extractor).build(
            &request.assignee,
            &request.components,
            &request.products,
            self.settings
                .max_age_years,
            now,
        )?)
    }

    fn ranked_entry(
        &self,
        r: &Requirement,
        fingerprint: &Fingerprint,
    ) -> RankedRequirement
    {
        RankedRequirement {
            id: r.id,
            summary: r
                .summary
                .clone(),
            product: r
                .product
                .clone(),
            component: r
                .component
                .clone(),
            priority: r.computed_priority,
            cc_count: r.cc.len(),
            milestone: r
                .target_milestone
                .clone(),
            keywords: r
                .tokens
                .clone(),
            creation_time: r.creation_time,
            liked: r.reward,
            url: chart::view_url(&self.base_url, r.id, fingerprint),
        }
    }

    /// Record feedback on `id`, given while looking at the ranking of `request`
    #[instrument(skip(self, request), fields(agent = %request.agent_id))]
    pub fn record_feedback(
        &self,
        feedback: Feedback,
        request: &PrioritizationRequest,
        id: IssueId,
    ) -> Result<Option<RankPosition>, PrioritizeError>
    {
        request.validate()?;
        if let Feedback::Defer { interval_days: 0 } = feedback
        {
            return Err(PrioritizeError::InvalidRequest("defer interval must be at least one day".into()));
        }

        let version = VersionBucketer::new(self.store.as_ref(), &self.reserved)
            .persisted(&request.agent_id)?
            .map(ScoringStrategy::version);
        let rank = self.rank_position(request, id);
        info!(
            version = ?version,
            ranked_position = ?rank.map(|r| r.position),
            priority = ?rank.map(|r| r.priority),
            "{}",
            feedback.label()
        );

        let fingerprint = request.fingerprint();
        let ledger = FeedbackLedger::new(self.store.as_ref());
        match feedback
        {
            Feedback::Like => ledger.like(&request.agent_id, id, &fingerprint)?,
            Feedback::Unlike =>
            {
                ledger.unlike(&request.agent_id, id)?;
            }
            Feedback::Dislike => ledger.dislike(&request.agent_id, id, &fingerprint)?,
            Feedback::Undislike =>
            {
                ledger.undislike(&request.agent_id, id)?;
            }
            Feedback::Defer { interval_days } =>
            {
                ledger.defer(
                    &request.agent_id,
                    id,
                    &fingerprint,
                    interval_days,
                    self.clock
                        .now(),
                )?;
            }
        }
        Ok(rank)
    }

    /// Position of `id` in the cached ranking for `request`, if cached
    pub fn rank_position(
        &self,
        request: &PrioritizationRequest,
        id: IssueId,
    ) -> Option<RankPosition>
    {
        let entry = self
            .cache
            .result(&request.fingerprint())?;
        entry
            .requirements
            .iter()
            .position(|r| r.id == id)
            .map(|position| RankPosition {
                position,
                priority: entry.requirements[position].computed_priority,
            })
    }

    /// Remove every feedback and version record of `agent_id`
    pub fn delete_profile(
        &self,
        agent_id: &str,
    ) -> Result<usize, PrioritizeError>
    {
        let version = VersionBucketer::new(self.store.as_ref(), &self.reserved)
            .persisted(agent_id)?
            .map(ScoringStrategy::version);
        info!(agent_id, version = ?version, "Delete profile");
        Ok(FeedbackLedger::new(self.store.as_ref()).delete_profile(agent_id)?)
    }

    /// Public chart URL for the request's resolved-issue profile.
    /// A cached URL is reused while its chart key is alive.
    pub fn generate_chart_url(
        &self,
        request: &PrioritizationRequest,
    ) -> Result<String, PrioritizeError>
    {
        request.validate()?;
        let fingerprint = request.fingerprint();
        if let Some(url) = self
            .cache
            .chart_url(&fingerprint)
        {
            if self
                .cache
                .chart_request(chart::chart_key_of(&url))
                .is_some()
            {
                return Ok(url);
            }
        }

        let key = chart::generate_chart_key(&mut rand::rng());
        let url = chart::chart_url(&self.base_url, &key);
        let profile = self.build_profile(
            request,
            self.clock
                .now(),
        )?;
        info!(chart = %key, "Generated chart");
        self.cache
            .store_chart(fingerprint, url.clone(), key, ChartRequest { request: request.clone(), profile });
        Ok(url)
    }

    /// Keyword frequencies behind a public chart key
    pub fn chart_data_for_key(
        &self,
        key: &str,
    ) -> Result<ChartData, PrioritizeError>
    {
        let chart_request = self
            .cache
            .chart_request(key)
            .ok_or_else(|| PrioritizeError::NotCached(key.to_string()))?;
        Ok(chart::chart_data(&chart_request.profile))
    }

    /// Keyword frequencies of the profile behind a cached prioritization
    pub fn build_chart_data(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<ChartData, PrioritizeError>
    {
        let entry = self
            .cache
            .result(fingerprint)
            .ok_or_else(|| PrioritizeError::NotCached(fingerprint.digest()))?;
        Ok(chart::chart_data(&entry.profile))
    }
}
