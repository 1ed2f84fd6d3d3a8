//! Fan-out/fan-in driver that runs one plugin over all of its locations.

use crate::cache::{Cache, SourceTrace};
use crate::locations::Locations;
use crate::plugins::{LocationScope, Plugin, PluginError};
use crate::settings::{CallerSettings, SettingsResolver};
use crate::types::{ResultSink, ResultStatus, RuleResult};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Default number of locations evaluated at once
pub const DEFAULT_MAX_CONCURRENT_LOCATIONS: usize = 8;

/// Default deadline for a single location's evaluation
pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub max_concurrent_locations: usize,
    pub location_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_concurrent_locations: DEFAULT_MAX_CONCURRENT_LOCATIONS,
            location_timeout: DEFAULT_LOCATION_TIMEOUT,
        }
    }
}

/// Everything one plugin run produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PluginOutput {
    pub results: Vec<RuleResult>,
    pub source: SourceTrace,
}

/// Run `plugin` against `cache` for every location of its primary service.
///
/// Locations are evaluated concurrently on the current task, at most
/// `max_concurrent_locations` at a time. The function returns only after every
/// location has finished or hit its deadline. Results are ordered by location,
/// then by the order the plugin emitted them, so repeated runs over the same
/// cache are identical.
///
/// A location that exceeds `location_timeout` contributes a single `UNKNOWN`
/// result in place of whatever it had emitted. If any location fails with a
/// [`PluginError`], the remaining locations still run to completion and the
/// first error is returned.
pub async fn run_plugin(
    plugin: &dyn Plugin,
    cache: &Cache,
    caller_settings: &CallerSettings,
    locations: Locations,
    options: RunOptions,
) -> Result<PluginOutput, PluginError> {
    let descriptor = plugin.descriptor();
    let settings = SettingsResolver::effective(caller_settings, descriptor.settings)?;

    let Some(api) = descriptor.primary_api() else {
        warn!(plugin = descriptor.id, "Plugin declares no API calls, nothing to evaluate");
        return Ok(PluginOutput::default());
    };

    let regions = locations.for_service(api.service);
    info!(
        plugin = descriptor.id,
        service = api.service,
        locations = regions.len(),
        "Running plugin"
    );

    let semaphore = Semaphore::new(options.max_concurrent_locations.max(1));
    let settings = &settings;
    let semaphore = &semaphore;

    let mut pending = FuturesUnordered::new();
    for (index, location) in regions.iter().copied().enumerate() {
        pending.push(async move {
            let _permit = semaphore.acquire().await.ok();

            let mut scope = LocationScope::new(location, cache, settings);
            let outcome =
                tokio::time::timeout(options.location_timeout, plugin.evaluate_location(&mut scope))
                    .await;
            let (mut results, source) = scope.into_parts();

            match outcome {
                Ok(Ok(())) => (index, Ok((results, source))),
                Ok(Err(e)) => (index, Err(e)),
                Err(_) => {
                    warn!(
                        plugin = descriptor.id,
                        location,
                        timeout = ?options.location_timeout,
                        "Location evaluation timed out"
                    );
                    results = ResultSink::new();
                    results.add_result(
                        ResultStatus::Unknown,
                        format!(
                            "Evaluation timed out after {:?}",
                            options.location_timeout
                        ),
                        location,
                        None,
                    );
                    (index, Ok((results, source)))
                }
            }
        });
    }

    let mut completed = Vec::with_capacity(regions.len());
    let mut first_error = None;
    while let Some((index, outcome)) = pending.next().await {
        match outcome {
            Ok(parts) => completed.push((index, parts)),
            Err(e) => {
                warn!(plugin = descriptor.id, location = regions[index], error = %e, "Location evaluation failed");
                first_error.get_or_insert(e);
            }
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    completed.sort_by_key(|(index, _)| *index);

    let mut output = PluginOutput::default();
    for (_, (results, source)) in completed {
        output.results.extend(results.into_results());
        output.source.merge(source);
    }

    info!(
        plugin = descriptor.id,
        results = output.results.len(),
        "Plugin finished"
    );

    Ok(output)
}
