//! Issue tracker access.
//!
//! [`BugSource`] is the narrow interface the prioritizer needs: candidate
//! queries plus per-issue comment counts. Comment counts for a batch are
//! fetched in parallel on a rayon pool sized to the batch; one issue failing
//! only degrades that issue, a tracker-level failure fails the batch.

use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::core::requirement::{IssueId, RawIssue};

#[derive(Debug, Error)]
pub enum FetchError
{
    /// The tracker as a whole did not answer
    #[error("issue tracker unreachable: {0}")]
    Unreachable(String),

    /// A single issue's data could not be fetched
    #[error("issue {id} unavailable: {reason}")]
    Issue
    {
        id: IssueId, reason: String
    },

    #[error("failed to start comment workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueStatus
{
    /// Open issues, the ranking candidates
    New,
    /// Closed issues, the profile history
    Resolved,
}

impl IssueStatus
{
    pub fn as_str(self) -> &'static str
    {
        match self
        {
            IssueStatus::New => "NEW",
            IssueStatus::Resolved => "RESOLVED",
        }
    }
}

/// Filters for one candidate query. Empty product/component lists match all.
#[derive(Debug, Clone, PartialEq)]
pub struct BugQuery
{
    pub assignee: Option<String>,
    pub products: Vec<String>,
    pub components: Vec<String>,
    pub status: IssueStatus,

    /// Issues created before this instant are out of range
    pub created_after: DateTime<Utc>,
}

impl BugQuery
{
    pub fn new(
        status: IssueStatus,
        products: &[String],
        components: &[String],
        max_age_years: u32,
        now: DateTime<Utc>,
    ) -> Self
    {
        Self {
            assignee: None,
            products: products.to_vec(),
            components: components.to_vec(),
            status,
            created_after: now - Duration::days(i64::from(max_age_years) * 365),
        }
    }

    pub fn assigned_to(
        mut self,
        assignee: &str,
    ) -> Self
    {
        self.assignee = Some(assignee.to_string());
        self
    }

    /// Whether `issue` satisfies every filter of this query
    pub fn matches(
        &self,
        issue: &RawIssue,
    ) -> bool
    {
        issue
            .status
            .eq_ignore_ascii_case(
                self.status
                    .as_str(),
            )
            && self
                .assignee
                .as_ref()
                .is_none_or(|a| *a == issue.assigned_to)
            && (self
                .products
                .is_empty()
                || self
                    .products
                    .contains(&issue.product))
            && (self
                .components
                .is_empty()
                || self
                    .components
                    .contains(&issue.component))
            && issue.creation_time >= self.created_after
    }
}

pub trait BugSource: Send + Sync
{
    fn fetch_candidates(
        &self,
        query: &BugQuery,
    ) -> Result<Vec<RawIssue>, FetchError>;

    fn fetch_comment_count(
        &self,
        id: IssueId,
    ) -> Result<usize, FetchError>;

    /// Comment counts for a batch, one worker per id up to `max_workers`.
    ///
    /// Ids whose fetch fails with [`FetchError::Issue`] map to 0. Any other
    /// error aborts the batch.
    #[instrument(level = "debug", skip_all, fields(ids = ids.len()))]
    fn fetch_comment_counts(
        &self,
        ids: &[IssueId],
        max_workers: usize,
    ) -> Result<HashMap<IssueId, usize>, FetchError>
    {
        if ids.is_empty()
        {
            return Ok(HashMap::new());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(
                ids.len()
                    .min(max_workers)
                    .max(1),
            )
            .build()?;

        // Blocks until every worker resolved
        let results: Vec<(IssueId, Result<usize, FetchError>)> = pool.install(|| {
            ids.par_iter()
                .map(|id| (*id, self.fetch_comment_count(*id)))
                .collect()
        });

        let mut counts = HashMap::with_capacity(ids.len());
        for (id, result) in results
        {
            match result
            {
                Ok(n) => counts.insert(id, n),
                Err(FetchError::Issue { reason, .. }) =>
                {
                    warn!(id, %reason, "Comment fetch failed, counting 0 comments");
                    counts.insert(id, 0)
                }
                Err(e) => return Err(e),
            };
        }
        debug!(fetched = counts.len(), "Fetched comment counts");
        Ok(counts)
    }
}

/// Tracker export on disk: `{ "bugs": [...], "comments": { "<id>": n } }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerDump
{
    #[serde(default)]
    pub bugs: Vec<RawIssue>,

    #[serde(default)]
    pub comments: HashMap<IssueId, usize>,
}

/// [`BugSource`] over a local tracker dump
#[derive(Debug, Clone, Default)]
pub struct DumpBugSource
{
    dump: TrackerDump,
}

impl DumpBugSource
{
    pub fn new(dump: TrackerDump) -> Self
    {
        Self { dump }
    }

    pub fn open(path: &Path) -> Result<Self>
    {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read tracker dump: {}", path.display()))?;
        let dump: TrackerDump = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse tracker dump: {}", path.display()))?;
        Ok(Self::new(dump))
    }
}

impl BugSource for DumpBugSource
{
    fn fetch_candidates(
        &self,
        query: &BugQuery,
    ) -> Result<Vec<RawIssue>, FetchError>
    {
        Ok(self
            .dump
            .bugs
            .iter()
            .filter(|b| query.matches(b))
            .cloned()
            .collect())
    }

    fn fetch_comment_count(
        &self,
        id: IssueId,
    ) -> Result<usize, FetchError>
    {
        self.dump
            .comments
            .get(&id)
            .copied()
            .ok_or_else(|| FetchError::Issue { id, reason: "no comments recorded".to_string() })
    }
}
