pub mod cache;
pub mod config;
pub mod engine;
pub mod locations;
pub mod plugins;
pub mod resources;
pub mod settings;
pub mod suppress;
pub mod types;

use anyhow::{bail, Result};
use cache::Cache;
use chrono::Utc;
use config::AssessmentConfig;
use engine::{run_plugin, RunOptions};
use locations::Locations;
use plugins::{Plugin, PluginRegistry};
use settings::{CallerSettings, SettingsResolver};
use std::time::Duration;
use suppress::Suppression;
use tracing::{info, warn};
use types::*;

/// Runs a selection of rule plugins against one collector cache
pub struct AssessmentRunner {
    registry: PluginRegistry,
    selection: Vec<String>,
    settings: CallerSettings,
    locations: Locations,
    options: RunOptions,
    suppressions: Vec<Suppression>,
    ignore_ok: bool,
}

impl AssessmentRunner {
    pub fn new(registry: PluginRegistry) -> Self {
        Self {
            registry,
            selection: Vec::new(),
            settings: CallerSettings::new(),
            locations: Locations::default(),
            options: RunOptions::default(),
            suppressions: Vec::new(),
            ignore_ok: false,
        }
    }

    /// Build a runner over the built-in plugins from a loaded configuration.
    ///
    /// Fails if the configuration names unknown plugins, carries malformed
    /// suppressions, or sets values that the selected plugins reject.
    pub fn from_config(config: &AssessmentConfig) -> Result<Self> {
        let suppressions = config
            .suppress
            .iter()
            .map(|s| s.parse::<Suppression>())
            .collect::<Result<Vec<_>, _>>()?;

        let runner = Self::new(PluginRegistry::builtin()?)
            .with_plugins(config.plugins.clone())
            .with_settings(config.settings.clone())
            .with_govcloud(config.govcloud)
            .with_run_options(RunOptions {
                max_concurrent_locations: config.max_concurrent_locations,
                location_timeout: Duration::from_secs(config.location_timeout_secs),
            })
            .with_suppressions(suppressions)
            .with_ignore_ok(config.ignore_ok);

        runner.validate()?;
        Ok(runner)
    }

    /// Restrict the run to these plugin ids; empty selects every plugin
    pub fn with_plugins(mut self, ids: Vec<String>) -> Self {
        self.selection = ids;
        self
    }

    pub fn with_settings(mut self, settings: CallerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_govcloud(mut self, govcloud: bool) -> Self {
        self.locations = Locations::new(govcloud);
        self
    }

    pub fn with_run_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_suppressions(mut self, suppressions: Vec<Suppression>) -> Self {
        self.suppressions = suppressions;
        self
    }

    pub fn with_ignore_ok(mut self, ignore_ok: bool) -> Self {
        self.ignore_ok = ignore_ok;
        self
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    fn selected(&self) -> Result<Vec<&dyn Plugin>> {
        if self.selection.is_empty() {
            Ok(self.registry.plugins().collect())
        } else {
            Ok(self.registry.select(self.selection.as_slice())?)
        }
    }

    /// Check the plugin selection and caller settings before running
    pub fn validate(&self) -> Result<()> {
        let plugins = self.selected()?;

        let errors: Vec<String> = plugins
            .iter()
            .flat_map(|p| SettingsResolver::validate(&self.settings, p.descriptor().settings))
            .map(|e| e.to_string())
            .collect();

        if !errors.is_empty() {
            bail!("Invalid settings:\n  {}", errors.join("\n  "));
        }

        Ok(())
    }

    /// Get hostname
    fn get_hostname() -> String {
        nix::unistd::gethostname()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Run every selected plugin and build the assessment
    pub async fn run(&self, cache: &Cache) -> Result<Assessment> {
        let plugins = self.selected()?;

        let metadata = AssessmentMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            hostname: Self::get_hostname(),
            govcloud: self.locations.is_govcloud(),
        };

        if cache.is_empty() {
            warn!("Cache is empty, every plugin will report nothing");
        }
        info!(plugins = plugins.len(), govcloud = metadata.govcloud, "Starting assessment");

        let mut reports = Vec::with_capacity(plugins.len());
        for plugin in plugins {
            reports.push(self.run_one(plugin, cache).await);
        }

        let summary = AssessmentSummary::calculate(&reports);

        if self.ignore_ok {
            for report in &mut reports {
                report.results.retain(|r| r.status != ResultStatus::Ok);
            }
        }

        Ok(Assessment {
            metadata,
            plugins: reports,
            summary,
        })
    }

    async fn run_one(&self, plugin: &dyn Plugin, cache: &Cache) -> PluginReport {
        let descriptor = plugin.descriptor();
        let mut report = PluginReport::new(descriptor);

        match run_plugin(plugin, cache, &self.settings, self.locations, self.options).await {
            Ok(output) => {
                let before = output.results.len();
                report.results = output
                    .results
                    .into_iter()
                    .filter(|r| !self.suppressions.iter().any(|s| s.matches(descriptor.id, r)))
                    .collect();
                report.suppressed = before - report.results.len();
                report.source = output.source;
            }
            Err(e) => {
                warn!(plugin = descriptor.id, error = %e, "Plugin failed");
                report.error = Some(e.to_string());
            }
        }

        report
    }
}
