//! Explicit stakeholder feedback kept in the [`ProfileStore`].
//!
//! Record keys are `{KIND}_{agent}_{issue}`; like and dislike records hold
//! the fingerprint of the request they were given under, defer records a
//! [`DeferRecord`]. A missing record is never an error: it means "relevant"
//! and "not liked". Expired defers are deleted the first time they are read.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    core::{request::Fingerprint, requirement::IssueId},
    infra::store::{ProfileStore, StoreError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind
{
    Like,
    Dislike,
    Defer,
}

impl FeedbackKind
{
    pub const ALL: [FeedbackKind; 3] = [FeedbackKind::Like, FeedbackKind::Dislike, FeedbackKind::Defer];

    pub fn prefix(self) -> &'static str
    {
        match self
        {
            FeedbackKind::Like => "LIKE",
            FeedbackKind::Dislike => "DISLIKE",
            FeedbackKind::Defer => "DEFER",
        }
    }

    pub fn key(
        self,
        agent_id: &str,
        id: IssueId,
    ) -> String
    {
        format!("{}_{agent_id}_{id}", self.prefix())
    }
}

pub(crate) const VERSION_PREFIX: &str = "VERSION";

pub(crate) fn version_key(agent_id: &str) -> String
{
    format!("{VERSION_PREFIX}_{agent_id}")
}

/// Agent a store key belongs to, if it is a feedback or version key
fn key_agent(key: &str) -> Option<&str>
{
    if let Some(agent) = key
        .strip_prefix(VERSION_PREFIX)
        .and_then(|rest| rest.strip_prefix('_'))
    {
        return Some(agent);
    }
    FeedbackKind::ALL
        .iter()
        .find_map(|kind| {
            key.strip_prefix(kind.prefix())
                .and_then(|rest| rest.strip_prefix('_'))
        })
        .and_then(|rest| rest.rsplit_once('_'))
        .filter(|(_, id)| id.parse::<IssueId>().is_ok())
        .map(|(agent, _)| agent)
}

/// Temporary suppression of one requirement for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferRecord
{
    pub fingerprint: Fingerprint,
    pub interval_days: u32,
    pub expires_at: DateTime<Utc>,
}

/// Feedback operations over a borrowed store
pub struct FeedbackLedger<'a>
{
    store: &'a dyn ProfileStore,
}

impl<'a> FeedbackLedger<'a>
{
    pub fn new(store: &'a dyn ProfileStore) -> Self
    {
        Self { store }
    }

    pub fn like(
        &self,
        agent_id: &str,
        id: IssueId,
        fingerprint: &Fingerprint,
    ) -> Result<(), StoreError>
    {
        self.store
            .set(&FeedbackKind::Like.key(agent_id, id), Value::String(fingerprint.to_string()))
    }

    /// Remove a like; returns whether one existed
    pub fn unlike(
        &self,
        agent_id: &str,
        id: IssueId,
    ) -> Result<bool, StoreError>
    {
        let key = FeedbackKind::Like.key(agent_id, id);
        if !self
            .store
            .exists(&key)?
        {
            return Ok(false);
        }
        self.store
            .remove(&key)
    }

    pub fn dislike(
        &self,
        agent_id: &str,
        id: IssueId,
        fingerprint: &Fingerprint,
    ) -> Result<(), StoreError>
    {
        self.store
            .set(&FeedbackKind::Dislike.key(agent_id, id), Value::String(fingerprint.to_string()))
    }

    /// Lift a dislike; returns whether one existed
    pub fn undislike(
        &self,
        agent_id: &str,
        id: IssueId,
    ) -> Result<bool, StoreError>
    {
        self.store
            .remove(&FeedbackKind::Dislike.key(agent_id, id))
    }

    /// Hide `id` from `agent_id` for `interval_days` starting at `now`
    pub fn defer(
        &self,
        agent_id: &str,
        id: IssueId,
        fingerprint: &Fingerprint,
        interval_days: u32,
        now: DateTime<Utc>,
    ) -> Result<DeferRecord, StoreError>
    {
        let record = DeferRecord {
            fingerprint: fingerprint.clone(),
            interval_days,
            expires_at: now + Duration::days(i64::from(interval_days)),
        };
        self.store
            .set(&FeedbackKind::Defer.key(agent_id, id), serde_json::to_value(&record)?)?;
        Ok(record)
    }

    pub fn is_liked(
        &self,
        agent_id: &str,
        id: IssueId,
    ) -> Result<bool, StoreError>
    {
        self.store
            .exists(&FeedbackKind::Like.key(agent_id, id))
    }

    /// Whether `id` may be shown to `agent_id` at `now`.
    ///
    /// Disliked issues never are. Deferred issues are hidden until the
    /// expiration has passed; a stale or unreadable defer record is deleted.
    pub fn is_relevant(
        &self,
        agent_id: &str,
        id: IssueId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>
    {
        if self
            .store
            .exists(&FeedbackKind::Dislike.key(agent_id, id))?
        {
            return Ok(false);
        }

        let defer_key = FeedbackKind::Defer.key(agent_id, id);
        let Some(value) = self
            .store
            .get(&defer_key)?
        else
        {
            return Ok(true);
        };

        match serde_json::from_value::<DeferRecord>(value)
        {
            Ok(record) if now <= record.expires_at => Ok(false),
            _ =>
            {
                debug!(agent_id, id, "Removing expired defer record");
                self.store
                    .remove(&defer_key)?;
                Ok(true)
            }
        }
    }

    /// Remove every feedback and version record of `agent_id`
    pub fn delete_profile(
        &self,
        agent_id: &str,
    ) -> Result<usize, StoreError>
    {
        let keys: Vec<String> = self
            .store
            .list_keys()?
            .into_iter()
            .filter(|k| key_agent(k) == Some(agent_id))
            .collect();
        for key in &keys
        {
            self.store
                .remove(key)?;
        }
        debug!(agent_id, removed = keys.len(), "Deleted profile");
        Ok(keys.len())
    }
}
