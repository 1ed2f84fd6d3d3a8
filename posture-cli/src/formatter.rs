use anyhow::Result;
use posture_core::plugins::PluginRegistry;
use posture_core::types::{Assessment, ResultStatus};

const HEAVY_RULE: &str = "═══════════════════════════════════════════════════════════════\n";
const LIGHT_RULE: &str = "─────────────────────────────────────────────────────────────\n";

/// Format an assessment as human-readable text
pub fn format_text(assessment: &Assessment) -> String {
    let mut output = String::new();

    // Header
    output.push_str(HEAVY_RULE);
    output.push_str("              Cloud Security Posture Assessment\n");
    output.push_str(HEAVY_RULE);
    output.push('\n');

    // Metadata
    output.push_str(&format!("Tool Version: {}\n", assessment.metadata.version));
    output.push_str(&format!("Timestamp: {}\n", assessment.metadata.timestamp.format("%Y-%m-%d %H:%M:%S UTC")));
    output.push_str(&format!("Hostname: {}\n", assessment.metadata.hostname));
    output.push_str(&format!("Cloud: {}\n", if assessment.metadata.govcloud { "Government" } else { "Public" }));
    output.push('\n');

    // Summary
    let summary = &assessment.summary;
    output.push_str(LIGHT_RULE);
    output.push_str("SUMMARY\n");
    output.push_str(LIGHT_RULE);
    output.push_str(&format!("Overall Risk Level: {}\n", summary.risk_level));
    output.push_str(&format!("Total Score: {}\n\n", summary.total_score));
    output.push_str("Results by Status:\n");
    output.push_str(&format!("  OK:       {}\n", summary.ok_count));
    output.push_str(&format!("  WARN:     {}\n", summary.warn_count));
    output.push_str(&format!("  FAIL:     {}\n", summary.fail_count));
    output.push_str(&format!("  UNKNOWN:  {}\n", summary.unknown_count));
    if summary.suppressed_count > 0 {
        output.push_str(&format!("  Suppressed: {}\n", summary.suppressed_count));
    }
    output.push('\n');

    for plugin in &assessment.plugins {
        output.push_str(LIGHT_RULE);
        output.push_str(&format!("{} [{}] ({})\n", plugin.title, plugin.severity, plugin.id));
        output.push_str(LIGHT_RULE);

        if let Some(ref error) = plugin.error {
            output.push_str(&format!("  Plugin failed: {}\n\n", error));
            continue;
        }

        if plugin.results.is_empty() {
            output.push_str("  No results\n\n");
            continue;
        }

        for result in &plugin.results {
            output.push_str(&format!("  [{}] {}: {}\n", result.status, result.region, result.message));
            if let Some(ref resource) = result.resource {
                output.push_str(&format!("      Resource: {}\n", resource));
            }
        }

        if plugin.count(ResultStatus::Fail) > 0 {
            if let Some(ref action) = plugin.recommended_action {
                output.push_str(&format!("  → {}\n", action));
            }
        }

        output.push('\n');
    }

    output.push_str(HEAVY_RULE);
    output.push_str("                    End of Report\n");
    output.push_str(HEAVY_RULE);

    output
}

/// Format an assessment as JSON
pub fn format_json(assessment: &Assessment, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(assessment)?)
    } else {
        Ok(serde_json::to_string(assessment)?)
    }
}

/// Describe every registered plugin
pub fn format_plugin_list(registry: &PluginRegistry) -> String {
    let mut output = String::new();

    for descriptor in registry.descriptors() {
        output.push_str(&format!("{} [{}]\n", descriptor.id, descriptor.severity));
        output.push_str(&format!("  {} ({} / {})\n", descriptor.title, descriptor.category, descriptor.domain));
        output.push_str(&format!("  {}\n", descriptor.description));

        let apis: Vec<String> = descriptor.apis.iter().map(|a| a.to_string()).collect();
        output.push_str(&format!("  APIs: {}\n", apis.join(", ")));

        for setting in descriptor.settings {
            output.push_str(&format!(
                "  Setting {} (default {}, pattern {}): {}\n",
                setting.key, setting.default, setting.pattern, setting.description
            ));
        }

        output.push_str(&format!("  More info: {}\n\n", descriptor.link));
    }

    output
}
