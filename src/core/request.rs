//! Prioritization requests and their canonical fingerprint.
//!
//! The fingerprint identifies a request for caching: assignee plus the
//! *sets* of components, products and keywords. List order and duplicates
//! do not matter; the agent id is not part of it. Every value is
//! length-prefixed, so no component or assignee text can collide with
//! another request's key.

use std::{collections::BTreeSet, fmt};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use crate::core::error::PrioritizeError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrioritizationRequest
{
    pub agent_id: String,
    pub assignee: String,

    #[serde(default)]
    pub components: Vec<String>,

    #[serde(default)]
    pub products: Vec<String>,

    /// Preferred keywords, used verbatim
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl PrioritizationRequest
{
    pub fn validate(&self) -> Result<(), PrioritizeError>
    {
        if self
            .agent_id
            .trim()
            .is_empty()
        {
            return Err(PrioritizeError::InvalidRequest("agent id must not be empty".into()));
        }
        if self
            .assignee
            .trim()
            .is_empty()
        {
            return Err(PrioritizeError::InvalidRequest("assignee must not be empty".into()));
        }
        Ok(())
    }

    pub fn fingerprint(&self) -> Fingerprint
    {
        Fingerprint::new(&self.assignee, &self.components, &self.products, &self.keywords)
    }
}

/// Order-independent cache key of a request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint
{
    pub fn new(
        assignee: &str,
        components: &[String],
        products: &[String],
        keywords: &[String],
    ) -> Self
    {
        Self(format!(
            "{}|{}|{}|{}",
            field(assignee),
            canonical_set(components),
            canonical_set(products),
            canonical_set(keywords)
        ))
    }

    pub fn as_str(&self) -> &str
    {
        &self.0
    }

    /// Short stable digest for log lines
    pub fn digest(&self) -> String
    {
        format!("{:016x}", xxh64(self.0.as_bytes(), 0))
    }
}

impl fmt::Display for Fingerprint
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.write_str(&self.0)
    }
}

impl From<String> for Fingerprint
{
    fn from(raw: String) -> Self
    {
        Self(raw)
    }
}

fn field(value: &str) -> String
{
    format!("{}:{value}", value.len())
}

/// Sorted, deduplicated and count-prefixed: `2[5:Debug,2:UI]`
fn canonical_set(items: &[String]) -> String
{
    let set: BTreeSet<&str> = items
        .iter()
        .map(String::as_str)
        .collect();
    format!(
        "{}[{}]",
        set.len(),
        set.iter()
            .map(|s| field(s))
            .join(",")
    )
}
