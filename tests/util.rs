//! Shared test utilities for integration tests
//!
//! Provides an in-memory tracker with failure switches and call counters,
//! a fixed-clock engine harness, and a JSON dump writer for CLI tests.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use chrono::{DateTime, Duration, TimeZone, Utc};
use reqrank::{
    core::{IssueId, PrioritizationRequest, Prioritizer, RawIssue, ResultCache},
    infra::{BugQuery, BugSource, Config, FetchError, FixedClock, MemoryStore},
};
use serde_json::json;

pub const ME: &str = "me@example.org";

/// Reference "now" of every fixture
pub fn now() -> DateTime<Utc>
{
    Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0)
        .unwrap()
}

pub fn issue(
    id: IssueId,
    status: &str,
    component: &str,
    summary: &str,
) -> RawIssue
{
    RawIssue {
        id,
        assigned_to: if status == "RESOLVED" { ME.to_string() } else { "nobody@example.org".to_string() },
        summary: summary.to_string(),
        product: "Platform".to_string(),
        component: component.to_string(),
        status: status.to_string(),
        severity: Some("normal".to_string()),
        priority: Some("P3".to_string()),
        cc: vec![],
        blocks: vec![],
        see_also: vec![],
        target_milestone: None,
        creation_time: now() - Duration::days(200),
    }
}

/// Resolved history of `ME` plus open candidates across two components
pub fn tracker() -> Vec<RawIssue>
{
    let mut bugs = vec![
        issue(100, "RESOLVED", "UI", "Editor crashes on save"),
        issue(101, "RESOLVED", "UI", "Editor toolbar flickers"),
        issue(102, "RESOLVED", "UI", "Outline view throws NPE"),
        issue(103, "RESOLVED", "Debug", "Breakpoint dialog freezes"),
    ];
    let open = [
        (1, "UI", "Editor crashes when saving large files"),
        (2, "UI", "Toolbar icons misaligned"),
        (3, "Debug", "Debugger ignores conditional breakpoint"),
        (4, "UI", "Outline view shows stale entries"),
        (5, "Debug", "Variables view empty"),
        (6, "UI", "Preferences page layout broken"),
        (7, "UI", "Editor freezes on paste"),
        (8, "Debug", "Console output truncated"),
    ];
    for (id, component, summary) in open
    {
        let mut b = issue(id, "NEW", component, summary);
        b.cc = (0..id)
            .map(|i| format!("cc{i}@example.org"))
            .collect();
        bugs.push(b);
    }
    bugs
}

/// In-memory tracker with call counters and failure switches
#[derive(Default)]
pub struct ScriptedSource
{
    pub bugs: Vec<RawIssue>,
    pub comments: HashMap<IssueId, usize>,
    pub candidate_calls: AtomicUsize,
    pub comment_calls: AtomicUsize,
    pub fail_candidates: AtomicBool,
    pub fail_comments: AtomicBool,
}

impl ScriptedSource
{
    pub fn new(bugs: Vec<RawIssue>) -> Self
    {
        let comments = bugs
            .iter()
            .map(|b| (b.id, b.id as usize % 4))
            .collect();
        Self { bugs, comments, ..Self::default() }
    }

    pub fn candidate_calls(&self) -> usize
    {
        self.candidate_calls
            .load(Ordering::SeqCst)
    }

    pub fn comment_calls(&self) -> usize
    {
        self.comment_calls
            .load(Ordering::SeqCst)
    }
}

impl BugSource for ScriptedSource
{
    fn fetch_candidates(
        &self,
        query: &BugQuery,
    ) -> Result<Vec<RawIssue>, FetchError>
    {
        self.candidate_calls
            .fetch_add(1, Ordering::SeqCst);
        if self
            .fail_candidates
            .load(Ordering::SeqCst)
        {
            return Err(FetchError::Unreachable("tracker down".into()));
        }
        Ok(self
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
        self.comment_calls
            .fetch_add(1, Ordering::SeqCst);
        if self
            .fail_comments
            .load(Ordering::SeqCst)
        {
            return Err(FetchError::Unreachable("tracker down".into()));
        }
        self.comments
            .get(&id)
            .copied()
            .ok_or_else(|| FetchError::Issue { id, reason: "missing".into() })
    }
}

/// Engine over in-memory collaborators and a fixed clock
pub struct Harness
{
    pub prioritizer: Prioritizer,
    pub source: Arc<ScriptedSource>,
    pub store: Arc<MemoryStore>,
    pub clock: FixedClock,
}

pub fn harness_with(
    bugs: Vec<RawIssue>,
    config: Config,
) -> Harness
{
    harness_from(ScriptedSource::new(bugs), config)
}

pub fn harness_from(
    source: ScriptedSource,
    config: Config,
) -> Harness
{
    let source = Arc::new(source);
    let store = Arc::new(MemoryStore::new());
    let clock = FixedClock::new(now());
    let prioritizer = Prioritizer::new(
        &config,
        source.clone(),
        store.clone(),
        ResultCache::new(&config.cache),
        Arc::new(clock.clone()),
    )
    .expect("engine");
    Harness { prioritizer, source, store, clock }
}

/// Small limits so cache reuse and refetch both happen with the fixture
pub fn small_config() -> Config
{
    let mut config = Config::default();
    config.prioritizer.limit = 5;
    config.prioritizer.refetch_slack = 1;
    config
}

pub fn harness() -> Harness
{
    harness_with(tracker(), small_config())
}

pub fn request(
    agent: &str,
    components: &[&str],
) -> PrioritizationRequest
{
    PrioritizationRequest {
        agent_id: agent.to_string(),
        assignee: ME.to_string(),
        components: components
            .iter()
            .map(|c| c.to_string())
            .collect(),
        products: vec!["Platform".to_string()],
        keywords: vec![],
    }
}

/// Tracker dump in the on-disk format read by the CLI
pub fn dump_json(bugs: &[RawIssue]) -> String
{
    let comments: HashMap<String, usize> = bugs
        .iter()
        .map(|b| (b.id.to_string(), 2))
        .collect();
    serde_json::to_string_pretty(&json!({ "bugs": bugs, "comments": comments })).expect("dump json")
}
