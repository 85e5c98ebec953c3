//! Working representation of tracker issues.
//!
//! `RawIssue` mirrors the tracker's REST record (Bugzilla field names);
//! `Requirement` is the per-request working copy that the keyword extractor
//! and the scorers operate on. Only `tokens`, `normalized_summary`,
//! `number_of_comments`, `computed_priority` and `reward` change after
//! construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tracker-wide issue identifier
pub type IssueId = u64;

/// Issue record as delivered by a `BugSource`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawIssue
{
    pub id: IssueId,

    #[serde(default)]
    pub assigned_to: String,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub product: String,

    #[serde(default)]
    pub component: String,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub severity: Option<String>,

    /// Tracker priority class (P1..P5), not the computed priority
    #[serde(default)]
    pub priority: Option<String>,

    #[serde(default)]
    pub cc: Vec<String>,

    #[serde(default)]
    pub blocks: Vec<IssueId>,

    /// Linked changes (gerrit reviews and other cross references)
    #[serde(default)]
    pub see_also: Vec<String>,

    #[serde(default)]
    pub target_milestone: Option<String>,

    pub creation_time: DateTime<Utc>,
}

/// Issue in the working format used by extraction and scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement
{
    pub id: IssueId,
    pub assigned_to: String,

    /// Summary exactly as the tracker returned it (shown to users)
    pub summary: String,

    /// Lowercased and cleaned summary produced by the keyword extractor
    pub normalized_summary: String,

    /// Tokens left after filtering and stopword removal
    pub tokens: Vec<String>,

    pub product: String,
    pub component: String,
    pub severity: Option<String>,
    pub priority_class: Option<String>,
    pub cc: Vec<String>,
    pub blocks: Vec<IssueId>,
    pub see_also: Vec<String>,
    pub target_milestone: Option<String>,
    pub creation_time: DateTime<Utc>,

    /// Unknown until the comment fetch of phase 2
    pub number_of_comments: Option<usize>,

    pub computed_priority: f64,

    /// Set when the requesting agent liked this requirement before
    pub reward: bool,
}

impl From<RawIssue> for Requirement
{
    fn from(issue: RawIssue) -> Self
    {
        Self {
            id: issue.id,
            assigned_to: issue.assigned_to,
            normalized_summary: issue
                .summary
                .clone(),
            summary: issue.summary,
            tokens: Vec::new(),
            product: issue.product,
            component: issue.component,
            severity: issue.severity,
            priority_class: issue.priority,
            cc: issue.cc,
            blocks: issue.blocks,
            see_also: issue.see_also,
            target_milestone: issue.target_milestone,
            creation_time: issue.creation_time,
            number_of_comments: None,
            computed_priority: 0.0,
            reward: false,
        }
    }
}

impl Requirement
{
    /// Age in (fractional) years at `now`, never negative
    pub fn age_years(
        &self,
        now: DateTime<Utc>,
    ) -> f64
    {
        let days = (now - self.creation_time).num_seconds() as f64 / 86_400.0;
        (days / 365.25).max(0.0)
    }

    pub fn contains_token(
        &self,
        token: &str,
    ) -> bool
    {
        self.tokens
            .iter()
            .any(|t| t == token)
    }
}
