mod formatter;

use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use formatter::{format_json, format_plugin_list, format_text};
use posture_core::cache::Cache;
use posture_core::config::AssessmentConfig;
use posture_core::plugins::PluginRegistry;
use posture_core::AssessmentRunner;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "posture-scan")]
#[command(author = "posture-scan contributors")]
#[command(version)]
#[command(about = "Evaluate compliance rules against collected cloud resource metadata", long_about = None)]
struct Cli {
    /// Collector cache file (JSON)
    #[arg(short, long, required_unless_present = "list_plugins")]
    cache: Option<PathBuf>,

    /// Assessment configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run only this plugin (repeatable)
    #[arg(short, long = "plugin")]
    plugins: Vec<String>,

    /// Evaluate government-cloud regions
    #[arg(long)]
    govcloud: bool,

    /// Leave passing results out of the report
    #[arg(long)]
    ignore_ok: bool,

    /// Suppress results matching pluginId:region:resourceId (repeatable, * wildcards)
    #[arg(long)]
    suppress: Vec<String>,

    /// Plugin setting override as key=value (repeatable)
    #[arg(short, long = "setting", value_parser = parse_setting)]
    settings: Vec<(String, String)>,

    /// Maximum locations evaluated at once per plugin
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Deadline for one location's evaluation, in seconds
    #[arg(long)]
    location_timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// List available plugins and exit
    #[arg(long)]
    list_plugins: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
    /// JSON with pretty printing
    JsonPretty,
}

fn parse_setting(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

impl Cli {
    /// Layer command-line flags over the config file
    fn assessment_config(&self) -> Result<AssessmentConfig> {
        let mut config = match &self.config {
            Some(path) => AssessmentConfig::load(path)?,
            None => AssessmentConfig::default(),
        };

        config.govcloud |= self.govcloud;
        config.ignore_ok |= self.ignore_ok;
        if !self.plugins.is_empty() {
            config.plugins = self.plugins.clone();
        }
        config.suppress.extend(self.suppress.iter().cloned());
        config.settings.extend(self.settings.iter().cloned());
        if let Some(max) = self.max_concurrency {
            config.max_concurrent_locations = max;
        }
        if let Some(secs) = self.location_timeout {
            config.location_timeout_secs = secs;
        }

        Ok(config)
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = if cli.list_plugins {
        format_plugin_list(&PluginRegistry::builtin()?)
    } else {
        let config = cli.assessment_config()?;
        let runner = AssessmentRunner::from_config(&config)?;

        let Some(cache_path) = &cli.cache else {
            anyhow::bail!("--cache is required");
        };
        let cache = Cache::load(cache_path)?;
        info!(cache = %cache_path.display(), "Loaded collector cache");

        let assessment = runner.run(&cache).await?;

        match cli.format {
            OutputFormat::Text => format_text(&assessment),
            OutputFormat::Json => format_json(&assessment, false)?,
            OutputFormat::JsonPretty => format_json(&assessment, true)?,
        }
    };

    // Write output
    if let Some(path) = cli.output {
        std::fs::write(path, output)?;
    } else {
        print!("{}", output);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_setting() {
        assert_eq!(
            parse_setting("event_grid_domain_min_tls_version=1.1").unwrap(),
            ("event_grid_domain_min_tls_version".to_string(), "1.1".to_string())
        );
        assert!(parse_setting("novalue").is_err());
        assert!(parse_setting("=1.1").is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "posture-scan",
            "--cache",
            "cache.json",
            "--plugin",
            "aksManagedIdentity",
            "--govcloud",
            "--setting",
            "event_grid_domain_min_tls_version=1.1",
            "--location-timeout",
            "5",
        ]);
        let config = cli.assessment_config().unwrap();
        assert!(config.govcloud);
        assert_eq!(config.plugins, vec!["aksManagedIdentity"]);
        assert_eq!(config.location_timeout_secs, 5);
        assert_eq!(
            config.settings.get("event_grid_domain_min_tls_version").map(String::as_str),
            Some("1.1")
        );
    }

    #[test]
    fn test_cache_required_unless_listing() {
        assert!(Cli::try_parse_from(["posture-scan"]).is_err());
        assert!(Cli::try_parse_from(["posture-scan", "--list-plugins"]).is_ok());
    }
}
