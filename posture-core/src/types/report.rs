use serde::Serialize;
use chrono::{DateTime, Utc};
use crate::cache::SourceTrace;
use crate::plugins::PluginDescriptor;
use super::{ResultStatus, RuleResult, Severity};

/// Metadata about when and where the assessment was run
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentMetadata {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub hostname: String,
    pub govcloud: bool,
}

/// Outcome of one plugin within an assessment
#[derive(Debug, Clone, Serialize)]
pub struct PluginReport {
    pub id: String,
    pub title: String,
    pub category: String,
    pub severity: Severity,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<String>,

    pub results: Vec<RuleResult>,

    /// Cache paths the plugin consulted
    pub source: SourceTrace,

    /// Results removed by a suppression rule
    pub suppressed: usize,

    /// Set when the plugin could not complete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PluginReport {
    pub fn new(descriptor: &PluginDescriptor) -> Self {
        Self {
            id: descriptor.id.to_string(),
            title: descriptor.title.to_string(),
            category: descriptor.category.to_string(),
            severity: descriptor.severity,
            recommended_action: Some(descriptor.recommended_action.to_string())
                .filter(|a| !a.is_empty()),
            results: Vec::new(),
            source: SourceTrace::new(),
            suppressed: 0,
            error: None,
        }
    }

    pub fn count(&self, status: ResultStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// Overall assessment outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssessmentSummary {
    /// Sum of plugin severity scores over all failing results
    pub total_score: u32,

    /// Risk level derived from failing results
    pub risk_level: String,

    /// Count of results by status
    pub ok_count: usize,
    pub warn_count: usize,
    pub fail_count: usize,
    pub unknown_count: usize,

    pub suppressed_count: usize,
    pub errored_plugins: usize,
}

impl AssessmentSummary {
    /// Calculate the summary from plugin reports
    pub fn calculate(reports: &[PluginReport]) -> Self {
        let count = |status: ResultStatus| -> usize {
            reports.iter().map(|r| r.count(status)).sum()
        };
        let failures_at = |severity: Severity| -> usize {
            reports
                .iter()
                .filter(|r| r.severity == severity)
                .map(|r| r.count(ResultStatus::Fail))
                .sum()
        };

        let total_score: u32 = reports
            .iter()
            .map(|r| r.severity.score() * r.count(ResultStatus::Fail) as u32)
            .sum();

        let critical = failures_at(Severity::Critical);
        let high = failures_at(Severity::High);
        let medium = failures_at(Severity::Medium);
        let low = failures_at(Severity::Low);

        let risk_level = if critical > 0 {
            "Critical"
        } else if high > 3 {
            "High"
        } else if high > 0 || medium > 5 {
            "Medium-High"
        } else if medium > 0 {
            "Medium"
        } else if low > 0 {
            "Low"
        } else {
            "Minimal"
        }.to_string();

        Self {
            total_score,
            risk_level,
            ok_count: count(ResultStatus::Ok),
            warn_count: count(ResultStatus::Warn),
            fail_count: count(ResultStatus::Fail),
            unknown_count: count(ResultStatus::Unknown),
            suppressed_count: reports.iter().map(|r| r.suppressed).sum(),
            errored_plugins: reports.iter().filter(|r| r.error.is_some()).count(),
        }
    }
}

/// Complete result of running plugins against one cache
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub metadata: AssessmentMetadata,
    pub plugins: Vec<PluginReport>,
    pub summary: AssessmentSummary,
}

impl Assessment {
    /// Get all results from all plugins
    pub fn all_results(&self) -> Vec<&RuleResult> {
        self.plugins.iter().flat_map(|p| &p.results).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(severity: Severity, statuses: &[ResultStatus]) -> PluginReport {
        PluginReport {
            id: "p".to_string(),
            title: "P".to_string(),
            category: "Test".to_string(),
            severity,
            recommended_action: None,
            results: statuses
                .iter()
                .map(|s| RuleResult::new(*s, "m", "eastus"))
                .collect(),
            source: SourceTrace::new(),
            suppressed: 0,
            error: None,
        }
    }

    #[test]
    fn test_summary_counts_and_score() {
        let reports = vec![
            report(Severity::Medium, &[ResultStatus::Fail, ResultStatus::Ok]),
            report(Severity::High, &[ResultStatus::Fail, ResultStatus::Unknown]),
        ];
        let summary = AssessmentSummary::calculate(&reports);

        assert_eq!(summary.fail_count, 2);
        assert_eq!(summary.ok_count, 1);
        assert_eq!(summary.unknown_count, 1);
        assert_eq!(summary.total_score, 3 + 7);
        assert_eq!(summary.risk_level, "Medium-High");
    }

    #[test]
    fn test_no_failures_is_minimal() {
        let summary = AssessmentSummary::calculate(&[report(
            Severity::Critical,
            &[ResultStatus::Ok, ResultStatus::Unknown],
        )]);
        assert_eq!(summary.risk_level, "Minimal");
        assert_eq!(summary.total_score, 0);
    }
}
