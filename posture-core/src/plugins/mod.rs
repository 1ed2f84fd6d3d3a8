pub mod aks_managed_identity;
pub mod domain_minimum_tls_version;
pub mod registry;

pub use aks_managed_identity::AksManagedIdentity;
pub use domain_minimum_tls_version::DomainMinimumTlsVersion;
pub use registry::{PluginRegistry, RegistryError};

use crate::cache::{ApiCall, Cache, CacheEntry, SourceTrace};
use crate::resources::{resource_id, CloudResource};
use crate::settings::{EffectiveSettings, SettingSpec, SettingsError};
use crate::types::{ResultSink, ResultStatus, Severity};
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Static metadata describing a rule plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PluginDescriptor {
    /// Rule identifier used for selection and suppression
    pub id: &'static str,
    pub title: &'static str,
    pub category: &'static str,
    /// Governance domain
    pub domain: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    pub more_info: &'static str,
    pub recommended_action: &'static str,
    pub link: &'static str,
    /// Collector calls the rule reads; the first one selects the locations
    pub apis: &'static [ApiCall],
    pub settings: &'static [SettingSpec],
    /// Provider write/delete events that should trigger re-evaluation
    pub realtime_triggers: &'static [&'static str],
}

impl PluginDescriptor {
    pub fn primary_api(&self) -> Option<ApiCall> {
        self.apis.first().copied()
    }
}

/// Errors that abort a plugin run. Data problems are never errors; they are
/// reported as `UNKNOWN` results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PluginError {
    #[error("failed to resolve settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("evaluation failed in {location}: {reason}")]
    Location { location: String, reason: String },
}

/// A compliance rule evaluated independently per location
#[async_trait]
pub trait Plugin: Send + Sync {
    fn descriptor(&self) -> &'static PluginDescriptor;

    fn id(&self) -> &'static str {
        self.descriptor().id
    }

    /// Evaluate every resource of one location, appending results to `scope`
    async fn evaluate_location(&self, scope: &mut LocationScope<'_>) -> Result<(), PluginError>;
}

/// Everything one location's evaluation reads and writes
pub struct LocationScope<'a> {
    location: &'a str,
    cache: &'a Cache,
    settings: &'a EffectiveSettings,
    results: ResultSink,
    source: SourceTrace,
}

impl<'a> LocationScope<'a> {
    pub fn new(location: &'a str, cache: &'a Cache, settings: &'a EffectiveSettings) -> Self {
        Self {
            location,
            cache,
            settings,
            results: ResultSink::new(),
            source: SourceTrace::new(),
        }
    }

    pub fn location(&self) -> &'a str {
        self.location
    }

    pub fn settings(&self) -> &'a EffectiveSettings {
        self.settings
    }

    /// Read `call` at this location, recording the lookup
    pub fn lookup(&mut self, call: ApiCall) -> Option<&'a CacheEntry> {
        let cache = self.cache;
        cache.lookup(&mut self.source, call.at(self.location))
    }

    pub fn add_result(&mut self, status: ResultStatus, message: impl Into<String>, resource: Option<&str>) {
        self.results.add_result(status, message, self.location, resource);
    }

    pub fn into_parts(self) -> (ResultSink, SourceTrace) {
        (self.results, self.source)
    }
}

/// How a plugin names the resources it queries in location-level messages
#[derive(Debug, Clone, Copy)]
pub struct ResourceQuery {
    pub call: ApiCall,
    /// Plural noun, e.g. "Event Grid domains"
    pub noun: &'static str,
    pub none_found: &'static str,
}

/// Fetch and decode the resources of one location.
///
/// Handles the location-level outcomes every rule shares: nothing is reported
/// when the collector never ran here, one `UNKNOWN` result when the query
/// failed or returned something other than a list, one `OK` result when no
/// resources exist. Records without a usable id are dropped; every other
/// record is reported on, with fields of the wrong type read as absent. The
/// caller reports on each returned `(id, record)` pair.
pub fn query_resources<T: CloudResource>(
    scope: &mut LocationScope<'_>,
    query: &ResourceQuery,
) -> Vec<(String, T)> {
    let Some(entry) = scope.lookup(query.call) else {
        return Vec::new();
    };

    if entry.is_failed() {
        scope.add_result(
            ResultStatus::Unknown,
            format!("Unable to query for {}: {}", query.noun, entry.error_text()),
            None,
        );
        return Vec::new();
    }

    let Some(data) = entry.records() else {
        scope.add_result(
            ResultStatus::Unknown,
            format!("Unable to query for {}: unexpected data format", query.noun),
            None,
        );
        return Vec::new();
    };

    if data.is_empty() {
        scope.add_result(ResultStatus::Ok, query.none_found, None);
        return Vec::new();
    }

    data.iter()
        .filter_map(|value| {
            let id = resource_id(value)?;
            let record = serde_json::from_value::<T>(value.clone()).unwrap_or_else(|e| {
                debug!(
                    call = %query.call,
                    location = scope.location(),
                    resource = id,
                    error = %e,
                    "Record shape not recognised, evaluating with no fields"
                );
                T::default()
            });
            Some((id.to_string(), record))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::EventGridDomain;
    use serde_json::json;

    const QUERY: ResourceQuery = ResourceQuery {
        call: ApiCall::new("eventGrid", "listDomains"),
        noun: "Event Grid domains",
        none_found: "No Event Grid domains found",
    };

    fn run_query(cache: &Cache) -> (Vec<(String, EventGridDomain)>, ResultSink, SourceTrace) {
        let settings = EffectiveSettings::default();
        let mut scope = LocationScope::new("eastus", cache, &settings);
        let records = query_resources::<EventGridDomain>(&mut scope, &QUERY);
        let (results, source) = scope.into_parts();
        (records, results, source)
    }

    #[test]
    fn test_absent_entry_reports_nothing_but_is_traced() {
        let (records, results, source) = run_query(&Cache::new());
        assert!(records.is_empty());
        assert!(results.is_empty());
        assert_eq!(source.get(QUERY.call.at("eastus")), Some(None));
    }

    #[test]
    fn test_failed_entry_reports_unknown() {
        let cache = Cache::new().with_entry(
            QUERY.call.at("eastus"),
            CacheEntry::with_error(json!({ "message": "AuthorizationFailed" })),
        );
        let (records, results, _) = run_query(&cache);
        assert!(records.is_empty());
        assert_eq!(results.len(), 1);
        let result = &results.as_slice()[0];
        assert_eq!(result.status, ResultStatus::Unknown);
        assert_eq!(
            result.message,
            "Unable to query for Event Grid domains: AuthorizationFailed"
        );
        assert_eq!(result.resource, None);
    }

    #[test]
    fn test_empty_entry_reports_none_found() {
        let cache = Cache::new().with_entry(QUERY.call.at("eastus"), CacheEntry::with_data(vec![]));
        let (_, results, _) = run_query(&cache);
        assert_eq!(results.len(), 1);
        assert_eq!(results.as_slice()[0].status, ResultStatus::Ok);
        assert_eq!(results.as_slice()[0].message, "No Event Grid domains found");
    }

    #[test]
    fn test_non_list_payload_reports_unknown() {
        let cache = Cache::new().with_entry(
            QUERY.call.at("eastus"),
            CacheEntry {
                data: Some(json!({ "kind": "StorageV2" })),
                err: None,
            },
        );
        let (records, results, _) = run_query(&cache);
        assert!(records.is_empty());
        assert_eq!(results.len(), 1);
        assert_eq!(results.as_slice()[0].status, ResultStatus::Unknown);
        assert_eq!(
            results.as_slice()[0].message,
            "Unable to query for Event Grid domains: unexpected data format"
        );
    }

    #[test]
    fn test_records_without_usable_id_are_dropped() {
        let cache = Cache::new().with_entry(
            QUERY.call.at("eastus"),
            CacheEntry::with_data(vec![
                json!({ "name": "no-id" }),
                json!({ "id": "" }),
                json!({ "id": 42 }),
                json!({ "id": "ok", "minimumTlsVersionAllowed": "1.2" }),
                json!("not an object"),
            ]),
        );
        let (records, results, _) = run_query(&cache);
        assert!(results.is_empty());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "ok");
    }

    #[test]
    fn test_badly_typed_fields_keep_the_record() {
        let cache = Cache::new().with_entry(
            QUERY.call.at("eastus"),
            CacheEntry::with_data(vec![
                json!({ "id": "/d/a", "minimumTlsVersionAllowed": true }),
                json!({ "id": "/d/b", "name": 7, "minimumTlsVersionAllowed": "1.2" }),
                json!({ "id": "/d/c", "minimumTlsVersionAllowed": ["1.2"] }),
            ]),
        );
        let (records, results, _) = run_query(&cache);
        assert!(results.is_empty());
        let ids: Vec<&str> = records.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["/d/a", "/d/b", "/d/c"]);
        assert_eq!(records[0].1.minimum_tls_version(), None);
        assert_eq!(records[1].1.minimum_tls_version(), Some(1.2));
        assert_eq!(records[2].1.minimum_tls_version(), None);
    }
}
