use super::{CacheEntry, CacheKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

type Locations = BTreeMap<String, Option<CacheEntry>>;

/// Diagnostic record of every cache path a plugin consulted.
///
/// Paths that were looked up but missing are kept as `None` so a report can
/// tell "never collected" apart from "collected and empty".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceTrace {
    services: BTreeMap<String, BTreeMap<String, Locations>>,
}

impl SourceTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: CacheKey<'_>, entry: Option<&CacheEntry>) {
        self.services
            .entry(key.call.service.to_string())
            .or_default()
            .entry(key.call.operation.to_string())
            .or_default()
            .insert(key.location.to_string(), entry.cloned());
    }

    /// `None` if the path was never consulted, `Some(None)` if it was consulted
    /// but absent from the cache
    pub fn get(&self, key: CacheKey<'_>) -> Option<Option<&CacheEntry>> {
        self.services
            .get(key.call.service)?
            .get(key.call.operation)?
            .get(key.location)
            .map(Option::as_ref)
    }

    /// Fold another trace into this one
    pub fn merge(&mut self, other: SourceTrace) {
        for (service, operations) in other.services {
            let target = self.services.entry(service).or_default();
            for (operation, locations) in operations {
                target.entry(operation).or_default().extend(locations);
            }
        }
    }

    /// Number of recorded paths
    pub fn len(&self) -> usize {
        self.services
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ApiCall;

    const CLUSTERS: ApiCall = ApiCall::new("managedClusters", "list");

    #[test]
    fn test_merge_keeps_every_path() {
        let mut left = SourceTrace::new();
        left.record(CLUSTERS.at("eastus"), None);

        let mut right = SourceTrace::new();
        right.record(CLUSTERS.at("westus"), Some(&CacheEntry::with_data(vec![])));

        left.merge(right);

        assert_eq!(left.len(), 2);
        assert_eq!(left.get(CLUSTERS.at("eastus")), Some(None));
        assert!(left.get(CLUSTERS.at("westus")).unwrap().is_some());
        assert_eq!(left.get(CLUSTERS.at("centralus")), None);
    }

    #[test]
    fn test_serializes_as_nested_paths() {
        let mut trace = SourceTrace::new();
        trace.record(CLUSTERS.at("eastus"), Some(&CacheEntry::with_data(vec![])));

        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["managedClusters"]["list"]["eastus"]["data"], serde_json::json!([]));
    }
}
