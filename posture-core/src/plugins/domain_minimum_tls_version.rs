use super::{query_resources, LocationScope, Plugin, PluginDescriptor, PluginError, ResourceQuery};
use crate::cache::ApiCall;
use crate::resources::EventGridDomain;
use crate::settings::{SettingKind, SettingSpec};
use crate::types::{ResultStatus, Severity};
use async_trait::async_trait;

const LIST_DOMAINS: ApiCall = ApiCall::new("eventGrid", "listDomains");

pub const MIN_TLS_VERSION_SETTING: &str = "event_grid_domain_min_tls_version";

static DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    id: "domainMinimumTlsVersion",
    title: "Event Grid Domain Minimum TLS Version",
    category: "Event Grid",
    domain: "Management and Governance",
    severity: Severity::Medium,
    description: "Ensures that Azure Event Grid domain is using the latest TLS version.",
    more_info: "Using latest TLS version for Event Grid domains enforces strict security measures, \
                which requires that clients send and receive data with a newer version of TLS.",
    recommended_action: "Modify Event Grid domain to set the desired minimum TLS version.",
    link: "https://learn.microsoft.com/en-us/azure/event-grid/transport-layer-security-configure-minimum-version",
    apis: &[LIST_DOMAINS],
    settings: &[SettingSpec {
        key: MIN_TLS_VERSION_SETTING,
        name: "Event Grid Domain Minimum TLS Version",
        description: "Minimum desired TLS version for Event Grid domain",
        pattern: r"^(1\.0|1\.1|1\.2)$",
        default: "1.2",
        kind: SettingKind::Number,
    }],
    realtime_triggers: &[
        "microsofteventgrid:domains:write",
        "microsofteventgrid:domains:delete",
    ],
};

const QUERY: ResourceQuery = ResourceQuery {
    call: LIST_DOMAINS,
    noun: "Event Grid domains",
    none_found: "No Event Grid domains found",
};

/// Event Grid domains must require at least the configured TLS version
pub struct DomainMinimumTlsVersion;

#[async_trait]
impl Plugin for DomainMinimumTlsVersion {
    fn descriptor(&self) -> &'static PluginDescriptor {
        &DESCRIPTOR
    }

    async fn evaluate_location(&self, scope: &mut LocationScope<'_>) -> Result<(), PluginError> {
        let settings = scope.settings();
        let desired = settings.number(MIN_TLS_VERSION_SETTING)?;
        let desired_text = settings.text(MIN_TLS_VERSION_SETTING)?;

        for (id, domain) in query_resources::<EventGridDomain>(scope, &QUERY) {
            let configured = domain.minimum_tls_version_allowed.as_deref();

            // Numeric, not lexical: "1.10" would sort below "1.2" as text
            let (status, message) = match (configured, domain.minimum_tls_version()) {
                (Some(text), Some(version)) if version >= desired => (
                    ResultStatus::Ok,
                    format!(
                        "Event Grid domain is using TLS version {text} which is equal to or higher than desired TLS version {desired_text}"
                    ),
                ),
                (Some(text), Some(_)) => (
                    ResultStatus::Fail,
                    format!(
                        "Event Grid domain is using TLS version {text} which is less than desired TLS version {desired_text}"
                    ),
                ),
                (Some(text), None) => (
                    ResultStatus::Fail,
                    format!(
                        "Event Grid domain is using unrecognized TLS version {text}, desired TLS version is {desired_text}"
                    ),
                ),
                (None, _) => (
                    ResultStatus::Fail,
                    format!(
                        "Event Grid domain does not set a minimum TLS version, desired TLS version is {desired_text}"
                    ),
                ),
            };

            scope.add_result(status, message, Some(&id));
        }

        Ok(())
    }
}
