use super::{lenient_object, CloudResource};
use serde::Deserialize;
use serde_json::{Map, Value};

/// `managedClusters:list` record
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedCluster {
    #[serde(default, deserialize_with = "lenient_identity")]
    pub identity: Option<ManagedServiceIdentity>,
}

impl ManagedCluster {
    /// True when the cluster carries a non-empty identity assignment
    pub fn has_identity(&self) -> bool {
        self.identity.as_ref().is_some_and(|i| !i.is_empty())
    }
}

impl CloudResource for ManagedCluster {}

fn lenient_identity<'de, D>(deserializer: D) -> Result<Option<ManagedServiceIdentity>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(lenient_object(deserializer)?.map(ManagedServiceIdentity))
}

/// Identity block attached to an Azure resource, kept as its raw fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagedServiceIdentity(pub Map<String, Value>);

impl ManagedServiceIdentity {
    /// `SystemAssigned`, `UserAssigned` or both, when reported
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
