use super::{leading_number, lenient_text, CloudResource};
use serde::Deserialize;

/// `eventGrid:listDomains` record
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventGridDomain {
    #[serde(default, deserialize_with = "lenient_text")]
    pub minimum_tls_version_allowed: Option<String>,
}

impl EventGridDomain {
    /// Configured minimum TLS version read as a number, compared numerically
    pub fn minimum_tls_version(&self) -> Option<f64> {
        self.minimum_tls_version_allowed
            .as_deref()
            .and_then(leading_number)
    }
}

impl CloudResource for EventGridDomain {}
