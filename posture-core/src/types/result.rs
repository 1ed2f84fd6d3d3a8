use serde::{Deserialize, Serialize};
use super::ResultStatus;

/// A single finding emitted by a rule plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    pub status: ResultStatus,

    /// Human-readable explanation, including observed and expected values
    pub message: String,

    /// Location the finding is scoped to
    pub region: String,

    /// Resource identifier, absent for location-wide findings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl RuleResult {
    pub fn new(status: ResultStatus, message: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            region: region.into(),
            resource: None,
        }
    }

    /// Scope the finding to a single resource
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }
}

/// Append-only sequence of results produced during one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSink {
    results: Vec<RuleResult>,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push exactly one result record
    pub fn add_result(
        &mut self,
        status: ResultStatus,
        message: impl Into<String>,
        region: &str,
        resource: Option<&str>,
    ) {
        let mut result = RuleResult::new(status, message, region);
        result.resource = resource.map(str::to_string);
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn as_slice(&self) -> &[RuleResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<RuleResult> {
        self.results
    }
}
