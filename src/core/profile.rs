//! Stakeholder profiles learned from resolved-issue history.

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    core::{
        keywords::{KeywordExtractor, keyword_frequencies},
        requirement::Requirement,
    },
    infra::source::{BugQuery, BugSource, FetchError, IssueStatus},
};

/// Implicit profile of one assignee; immutable once built
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile
{
    pub assignee: String,
    pub component_frequencies: IndexMap<String, usize>,
    pub keyword_frequencies: IndexMap<String, usize>,
}

impl UserProfile
{
    /// Unique profile keywords in first-seen order
    pub fn keywords(&self) -> impl Iterator<Item = &str>
    {
        self.keyword_frequencies
            .keys()
            .map(String::as_str)
    }

    pub fn keyword_count(&self) -> usize
    {
        self.keyword_frequencies
            .len()
    }

    /// Share of the profile's history spent in `component`, in [0, 1]
    pub fn component_share(
        &self,
        component: &str,
    ) -> f64
    {
        let total: usize = self
            .component_frequencies
            .values()
            .sum();
        if total == 0
        {
            return 0.0;
        }
        let hits = self
            .component_frequencies
            .get(component)
            .copied()
            .unwrap_or(0);
        hits as f64 / total as f64
    }
}

pub struct UserProfileBuilder<'a>
{
    source: &'a dyn BugSource,
    extractor: &'a KeywordExtractor,
}

impl<'a> UserProfileBuilder<'a>
{
    pub fn new(
        source: &'a dyn BugSource,
        extractor: &'a KeywordExtractor,
    ) -> Self
    {
        Self { source, extractor }
    }

    /// Build the profile from the assignee's resolved issues in range
    pub fn build(
        &self,
        assignee: &str,
        components: &[String],
        products: &[String],
        max_age_years: u32,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, FetchError>
    {
        let query = BugQuery::new(IssueStatus::Resolved, products, components, max_age_years, now)
            .assigned_to(assignee);
        let history = self
            .source
            .fetch_candidates(&query)?;
        let mut requirements: Vec<Requirement> = history
            .into_iter()
            .map(Requirement::from)
            .collect();

        Ok(self.build_from_history(assignee, &mut requirements))
    }

    /// Profile over already fetched resolved requirements
    pub fn build_from_history(
        &self,
        assignee: &str,
        requirements: &mut [Requirement],
    ) -> UserProfile
    {
        let mut component_frequencies: IndexMap<String, usize> = IndexMap::new();
        for r in requirements.iter()
        {
            *component_frequencies
                .entry(r.component.clone())
                .or_insert(0) += 1;
        }

        let unique: IndexSet<String> = self
            .extractor
            .extract(requirements);
        let keyword_frequencies = keyword_frequencies(requirements);
        debug_assert_eq!(unique.len(), keyword_frequencies.len());

        debug!(
            assignee,
            resolved = requirements.len(),
            keywords = keyword_frequencies.len(),
            "Built user profile"
        );

        UserProfile { assignee: assignee.to_string(), component_frequencies, keyword_frequencies }
    }
}
