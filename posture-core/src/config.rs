//! Assessment configuration loaded from JSON

use crate::engine::{DEFAULT_LOCATION_TIMEOUT, DEFAULT_MAX_CONCURRENT_LOCATIONS};
use crate::settings::CallerSettings;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Options for one assessment run. Every field may be omitted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssessmentConfig {
    /// Evaluate government-cloud regions instead of public ones
    pub govcloud: bool,

    /// Plugin setting overrides, e.g. `event_grid_domain_min_tls_version`
    pub settings: CallerSettings,

    /// Plugin ids to run; empty runs every registered plugin
    pub plugins: Vec<String>,

    /// `pluginId:region:resourceId` suppression patterns
    pub suppress: Vec<String>,

    /// Leave passing results out of the report
    pub ignore_ok: bool,

    pub max_concurrent_locations: usize,

    pub location_timeout_secs: u64,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            govcloud: false,
            settings: CallerSettings::new(),
            plugins: Vec::new(),
            suppress: Vec::new(),
            ignore_ok: false,
            max_concurrent_locations: DEFAULT_MAX_CONCURRENT_LOCATIONS,
            location_timeout_secs: DEFAULT_LOCATION_TIMEOUT.as_secs(),
        }
    }
}

impl AssessmentConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}
