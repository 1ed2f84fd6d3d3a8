//! Result suppression rules written as `pluginId:region:resourceId`.
//!
//! Each part accepts `*` as a wildcard. The resource part may itself contain
//! colons; only the first two separate fields.

use crate::types::RuleResult;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuppressionError {
    #[error("invalid suppression '{0}', expected pluginId:region:resourceId")]
    Format(String),

    #[error("invalid suppression '{input}': {reason}")]
    Pattern { input: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct Suppression {
    source: String,
    plugin: Regex,
    region: Regex,
    resource: Regex,
}

impl Suppression {
    /// True if `result`, produced by `plugin_id`, should be dropped
    pub fn matches(&self, plugin_id: &str, result: &RuleResult) -> bool {
        self.plugin.is_match(plugin_id)
            && self.region.is_match(&result.region)
            && self.resource.is_match(result.resource.as_deref().unwrap_or(""))
    }

    fn wildcard(input: &str, part: &str) -> Result<Regex, SuppressionError> {
        let pattern = regex::escape(part).replace(r"\*", ".*");
        Regex::new(&format!("^{pattern}$")).map_err(|e| SuppressionError::Pattern {
            input: input.to_string(),
            reason: e.to_string(),
        })
    }
}

impl FromStr for Suppression {
    type Err = SuppressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (Some(plugin), Some(region), Some(resource)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(SuppressionError::Format(s.to_string()));
        };

        if plugin.is_empty() || region.is_empty() || resource.is_empty() {
            return Err(SuppressionError::Format(s.to_string()));
        }

        Ok(Self {
            source: s.to_string(),
            plugin: Self::wildcard(s, plugin)?,
            region: Self::wildcard(s, region)?,
            resource: Self::wildcard(s, resource)?,
        })
    }
}

impl fmt::Display for Suppression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
