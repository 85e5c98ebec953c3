//! Per-agent experiment variant assignment.

use std::collections::HashMap;

use rand::Rng;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    core::{feedback::version_key, scorer::ScoringStrategy},
    infra::store::{ProfileStore, StoreError},
};

/// Demo accounts pinned to one variant each
pub fn default_reserved() -> HashMap<String, u8>
{
    HashMap::from([("a1a1a1a1a".to_string(), 0), ("b2b2b2b2b".to_string(), 1)])
}

pub struct VersionBucketer<'a>
{
    store: &'a dyn ProfileStore,
    reserved: &'a HashMap<String, u8>,
}

impl<'a> VersionBucketer<'a>
{
    pub fn new(
        store: &'a dyn ProfileStore,
        reserved: &'a HashMap<String, u8>,
    ) -> Self
    {
        Self { store, reserved }
    }

    /// Variant for `agent_id`, flipping and persisting a fair coin on first
    /// sight. Reserved agents are never written to the store.
    pub fn assign(
        &self,
        agent_id: &str,
    ) -> Result<ScoringStrategy, StoreError>
    {
        self.assign_with(agent_id, &mut rand::rng())
    }

    pub fn assign_with<R: Rng + ?Sized>(
        &self,
        agent_id: &str,
        rng: &mut R,
    ) -> Result<ScoringStrategy, StoreError>
    {
        if let Some(strategy) = self
            .reserved
            .get(agent_id)
            .and_then(|v| ScoringStrategy::from_version(*v))
        {
            return Ok(strategy);
        }

        if let Some(strategy) = self.persisted(agent_id)?
        {
            return Ok(strategy);
        }

        let strategy = if rng.random_bool(0.5) { ScoringStrategy::ContentBased } else { ScoringStrategy::Maut };
        self.store
            .set(&version_key(agent_id), Value::from(strategy.version()))?;
        info!(agent_id, version = strategy.version(), "Assigned version to new agent");
        Ok(strategy)
    }

    /// Variant already recorded for `agent_id`, without assigning one
    pub fn persisted(
        &self,
        agent_id: &str,
    ) -> Result<Option<ScoringStrategy>, StoreError>
    {
        if let Some(v) = self
            .reserved
            .get(agent_id)
        {
            return Ok(ScoringStrategy::from_version(*v));
        }
        let stored = self
            .store
            .get(&version_key(agent_id))?;
        let strategy = stored
            .as_ref()
            .and_then(Value::as_u64)
            .and_then(|v| u8::try_from(v).ok())
            .and_then(ScoringStrategy::from_version);
        if stored.is_some() && strategy.is_none()
        {
            debug!(agent_id, "Ignoring unreadable version record");
        }
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests
{
    use rand::{SeedableRng, rngs::StdRng};
    use serde_json::json;

    use super::*;
    use crate::infra::store::MemoryStore;

    #[test]
    fn reserved_agents_are_pinned_and_not_persisted()
    {
        let store = MemoryStore::new();
        let reserved = default_reserved();
        let bucketer = VersionBucketer::new(&store, &reserved);

        for _ in 0..10
        {
            assert_eq!(bucketer.assign("a1a1a1a1a").unwrap(), ScoringStrategy::Maut);
            assert_eq!(bucketer.assign("b2b2b2b2b").unwrap(), ScoringStrategy::ContentBased);
        }
        assert!(store.list_keys().unwrap().is_empty());
    }

    #[test]
    fn assignment_is_persistent()
    {
        let store = MemoryStore::new();
        let reserved = default_reserved();
        let bucketer = VersionBucketer::new(&store, &reserved);
        let mut rng = StdRng::seed_from_u64(7);

        let first = bucketer
            .assign_with("agent", &mut rng)
            .unwrap();
        for _ in 0..20
        {
            assert_eq!(bucketer.assign_with("agent", &mut rng).unwrap(), first);
        }
        assert_eq!(store.get("VERSION_agent").unwrap(), Some(json!(first.version())));
        assert_eq!(bucketer.persisted("agent").unwrap(), Some(first));
    }

    #[test]
    fn stored_version_is_respected()
    {
        let store = MemoryStore::new();
        store.set("VERSION_x", json!(1)).unwrap();
        let reserved = HashMap::new();
        let bucketer = VersionBucketer::new(&store, &reserved);
        assert_eq!(bucketer.assign("x").unwrap(), ScoringStrategy::ContentBased);
        assert_eq!(bucketer.persisted("nobody").unwrap(), None);
    }

    #[test]
    fn both_variants_occur()
    {
        let store = MemoryStore::new();
        let reserved = HashMap::new();
        let bucketer = VersionBucketer::new(&store, &reserved);
        let mut rng = StdRng::seed_from_u64(42);

        let versions: Vec<ScoringStrategy> = (0..64)
            .map(|i| {
                bucketer
                    .assign_with(&format!("agent{i}"), &mut rng)
                    .unwrap()
            })
            .collect();
        assert!(versions.contains(&ScoringStrategy::Maut));
        assert!(versions.contains(&ScoringStrategy::ContentBased));
    }
}
