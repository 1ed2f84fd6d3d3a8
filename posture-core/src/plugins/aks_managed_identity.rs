use super::{query_resources, LocationScope, Plugin, PluginDescriptor, PluginError, ResourceQuery};
use crate::cache::ApiCall;
use crate::resources::ManagedCluster;
use crate::types::{ResultStatus, Severity};
use async_trait::async_trait;

const LIST_CLUSTERS: ApiCall = ApiCall::new("managedClusters", "list");

static DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    id: "aksManagedIdentity",
    title: "AKS Cluster Managed Identity Enabled",
    category: "Kubernetes Service",
    domain: "Identity and Access Management",
    severity: Severity::Medium,
    description: "Ensures that managed identity is enabled for Azure Kubernetes Service clusters.",
    more_info: "Managed identities let AKS clusters authenticate to other Azure services without \
                storing service principal credentials, and Azure rotates their credentials automatically.",
    recommended_action: "Modify the AKS cluster and enable a system-assigned or user-assigned managed identity.",
    link: "https://learn.microsoft.com/en-us/azure/aks/use-managed-identity",
    apis: &[LIST_CLUSTERS],
    settings: &[],
    realtime_triggers: &[
        "microsoftcontainerservice:managedclusters:write",
        "microsoftcontainerservice:managedclusters:delete",
    ],
};

const QUERY: ResourceQuery = ResourceQuery {
    call: LIST_CLUSTERS,
    noun: "Kubernetes clusters",
    none_found: "No existing Kubernetes clusters found",
};

/// AKS clusters must carry a managed identity
pub struct AksManagedIdentity;

#[async_trait]
impl Plugin for AksManagedIdentity {
    fn descriptor(&self) -> &'static PluginDescriptor {
        &DESCRIPTOR
    }

    async fn evaluate_location(&self, scope: &mut LocationScope<'_>) -> Result<(), PluginError> {
        for (id, cluster) in query_resources::<ManagedCluster>(scope, &QUERY) {
            if cluster.has_identity() {
                scope.add_result(
                    ResultStatus::Ok,
                    "The managed cluster has identities assigned",
                    Some(&id),
                );
            } else {
                scope.add_result(
                    ResultStatus::Fail,
                    "The managed cluster does not have an identity assigned",
                    Some(&id),
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Cache, CacheEntry};
    use crate::engine::{run_plugin, RunOptions};
    use crate::locations::Locations;
    use crate::settings::CallerSettings;
    use crate::types::RuleResult;
    use serde_json::{json, Value};

    fn clusters() -> Vec<Value> {
        vec![
            json!({
                "id": "/subscriptions/123/resourceGroups/aqua-resource-group/providers/Microsoft.ContainerService/managedClusters/tes-cluster",
                "location": "eastus",
                "name": "tes-cluster",
                "type": "Microsoft.ContainerService/ManagedClusters",
                "provisioningState": "Succeeded",
                "kubernetesVersion": "1.18.14",
                "enableRBAC": true,
                "identity": { "type": "SystemAssigned" }
            }),
            json!({
                "id": "/subscriptions/123/resourceGroups/aqua-resource-group/providers/Microsoft.ContainerService/managedClusters/tes-cluster",
                "location": "eastus",
                "name": "tes-cluster",
                "type": "Microsoft.ContainerService/ManagedClusters",
                "provisioningState": "Succeeded",
                "kubernetesVersion": "1.18.14",
                "enableRBAC": false
            }),
        ]
    }

    async fn run(entry: CacheEntry) -> Vec<RuleResult> {
        let cache = Cache::new().with_entry(LIST_CLUSTERS.at("eastus"), entry);
        run_plugin(
            &AksManagedIdentity,
            &cache,
            &CallerSettings::new(),
            Locations::new(false),
            RunOptions::default(),
        )
        .await
        .unwrap()
        .results
    }

    #[tokio::test]
    async fn test_no_clusters_passes() {
        let results = run(CacheEntry::with_data(vec![])).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ResultStatus::Ok);
        assert!(results[0].message.contains("No existing Kubernetes clusters"));
        assert_eq!(results[0].region, "eastus");
    }

    #[tokio::test]
    async fn test_cluster_without_identity_fails() {
        let results = run(CacheEntry::with_data(vec![clusters()[1].clone()])).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ResultStatus::Fail);
        assert!(results[0]
            .message
            .contains("The managed cluster does not have an identity assigned"));
        assert_eq!(results[0].region, "eastus");
    }

    #[tokio::test]
    async fn test_unqueryable_clusters_are_unknown() {
        let results = run(CacheEntry::default()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ResultStatus::Unknown);
        assert!(results[0]
            .message
            .contains("Unable to query for Kubernetes clusters: "));
        assert_eq!(results[0].region, "eastus");
        assert_eq!(results[0].resource, None);
    }

    #[tokio::test]
    async fn test_cluster_with_identity_passes() {
        let results = run(CacheEntry::with_data(vec![clusters()[0].clone()])).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ResultStatus::Ok);
        assert!(results[0]
            .message
            .contains("The managed cluster has identities assigned"));
        assert_eq!(results[0].region, "eastus");
    }
}
