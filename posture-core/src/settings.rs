//! Plugin setting schemas and resolution of caller overrides.
//!
//! Caller values arrive as strings. They are checked once, when the
//! configuration is loaded ([`SettingsResolver::validate`]); at run time
//! [`SettingsResolver::effective`] only picks between an accepted caller value
//! and the declared default, so plugins receive already-parsed values.

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, OnceLock};
use thiserror::Error;
use tracing::warn;

/// Caller-supplied setting values keyed by setting name
pub type CallerSettings = BTreeMap<String, String>;

/// How a setting value is interpreted once it passes its pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    Text,
    Number,
}

/// Declared configuration entry of a plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettingSpec {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub pattern: &'static str,
    pub default: &'static str,
    pub kind: SettingKind,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("setting '{key}' has an invalid validation pattern '{pattern}': {reason}")]
    InvalidPattern {
        key: String,
        pattern: String,
        reason: String,
    },

    #[error("setting '{key}' value '{value}' does not match pattern '{pattern}'")]
    PatternMismatch {
        key: String,
        value: String,
        pattern: String,
    },

    #[error("setting '{key}' value '{value}' is not a number")]
    NotANumber { key: String, value: String },

    #[error("setting '{key}' is not declared by this plugin")]
    Undeclared { key: String },
}

/// A resolved setting value
#[derive(Debug, Clone, PartialEq)]
pub struct SettingValue {
    /// Value as written, used verbatim in result messages
    pub raw: String,
    pub number: Option<f64>,
    pub from_default: bool,
}

/// Settings a plugin evaluates with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectiveSettings {
    values: BTreeMap<&'static str, SettingValue>,
}

impl EffectiveSettings {
    pub fn get(&self, key: &str) -> Result<&SettingValue, SettingsError> {
        self.values.get(key).ok_or_else(|| SettingsError::Undeclared {
            key: key.to_string(),
        })
    }

    pub fn text(&self, key: &str) -> Result<&str, SettingsError> {
        Ok(self.get(key)?.raw.as_str())
    }

    /// Numeric value of a `Number` setting
    pub fn number(&self, key: &str) -> Result<f64, SettingsError> {
        let value = self.get(key)?;
        value.number.ok_or_else(|| SettingsError::NotANumber {
            key: key.to_string(),
            value: value.raw.clone(),
        })
    }
}

/// Validates caller overrides and merges them with declared defaults
pub struct SettingsResolver;

impl SettingsResolver {
    /// Check every caller value for a declared key. Values for keys no spec
    /// declares are ignored; they may belong to another plugin.
    pub fn validate(caller: &CallerSettings, specs: &[SettingSpec]) -> Vec<SettingsError> {
        specs
            .iter()
            .filter_map(|spec| {
                let value = caller.get(spec.key)?;
                Self::check(spec, value).err()
            })
            .collect()
    }

    /// Resolve every declared setting to a parsed value
    pub fn effective(
        caller: &CallerSettings,
        specs: &[SettingSpec],
    ) -> Result<EffectiveSettings, SettingsError> {
        let mut values = BTreeMap::new();

        for spec in specs {
            let accepted = caller.get(spec.key).and_then(|value| match Self::check(spec, value) {
                Ok(number) => Some((value.clone(), number)),
                Err(e) => {
                    warn!(setting = spec.key, error = %e, "Ignoring invalid setting, using default");
                    None
                }
            });

            let value = match accepted {
                Some((raw, number)) => SettingValue {
                    raw,
                    number,
                    from_default: false,
                },
                None => SettingValue {
                    raw: spec.default.to_string(),
                    number: Self::check(spec, spec.default)?,
                    from_default: true,
                },
            };

            values.insert(spec.key, value);
        }

        Ok(EffectiveSettings { values })
    }

    /// Validate one value, returning its numeric form for `Number` settings
    fn check(spec: &SettingSpec, value: &str) -> Result<Option<f64>, SettingsError> {
        let re = compiled(spec.pattern).map_err(|e| SettingsError::InvalidPattern {
            key: spec.key.to_string(),
            pattern: spec.pattern.to_string(),
            reason: e.to_string(),
        })?;

        if !re.is_match(value) {
            return Err(SettingsError::PatternMismatch {
                key: spec.key.to_string(),
                value: value.to_string(),
                pattern: spec.pattern.to_string(),
            });
        }

        match spec.kind {
            SettingKind::Text => Ok(None),
            SettingKind::Number => value.trim().parse::<f64>().map(Some).map_err(|_| {
                SettingsError::NotANumber {
                    key: spec.key.to_string(),
                    value: value.to_string(),
                }
            }),
        }
    }
}

/// Compiled setting patterns; a pattern that fails to compile is not kept
static PATTERNS: OnceLock<Mutex<HashMap<&'static str, Regex>>> = OnceLock::new();

fn compiled(pattern: &'static str) -> Result<Regex, regex::Error> {
    let mut patterns = PATTERNS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(re) = patterns.get(pattern) {
        return Ok(re.clone());
    }

    let re = Regex::new(pattern)?;
    patterns.insert(pattern, re.clone());
    Ok(re)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TLS: SettingSpec = SettingSpec {
        key: "min_tls",
        name: "Minimum TLS",
        description: "Minimum TLS version",
        pattern: r"^(1\.0|1\.1|1\.2)$",
        default: "1.2",
        kind: SettingKind::Number,
    };

    const LABEL: SettingSpec = SettingSpec {
        key: "label",
        name: "Label",
        description: "Free text",
        pattern: "^[a-z]+$",
        default: "none",
        kind: SettingKind::Text,
    };

    fn caller(pairs: &[(&str, &str)]) -> CallerSettings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_used_when_absent() {
        let settings = SettingsResolver::effective(&CallerSettings::new(), &[TLS]).unwrap();
        let value = settings.get("min_tls").unwrap();
        assert_eq!(value.raw, "1.2");
        assert!(value.from_default);
        assert_eq!(settings.number("min_tls").unwrap(), 1.2);
    }

    #[test]
    fn test_valid_caller_value_wins() {
        let settings =
            SettingsResolver::effective(&caller(&[("min_tls", "1.0")]), &[TLS, LABEL]).unwrap();
        assert_eq!(settings.number("min_tls").unwrap(), 1.0);
        assert!(!settings.get("min_tls").unwrap().from_default);
        assert_eq!(settings.text("label").unwrap(), "none");
    }

    #[test]
    fn test_invalid_caller_value_falls_back_to_default() {
        let settings = SettingsResolver::effective(&caller(&[("min_tls", "1.3")]), &[TLS]).unwrap();
        assert_eq!(settings.number("min_tls").unwrap(), 1.2);
        assert!(settings.get("min_tls").unwrap().from_default);
    }

    #[test]
    fn test_validate_reports_mismatches_only_for_declared_keys() {
        let errors = SettingsResolver::validate(
            &caller(&[("min_tls", "banana"), ("label", "ok"), ("other_plugin", "x")]),
            &[TLS, LABEL],
        );
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            SettingsError::PatternMismatch { key, .. } if key == "min_tls"
        ));
    }

    #[test]
    fn test_number_kind_requires_numeric_value() {
        let spec = SettingSpec {
            pattern: "^.*$",
            ..TLS
        };
        let errors = SettingsResolver::validate(&caller(&[("min_tls", "latest")]), &[spec]);
        assert!(matches!(errors[0], SettingsError::NotANumber { .. }));
    }

    #[test]
    fn test_broken_default_is_an_error() {
        let spec = SettingSpec {
            default: "2.0",
            ..TLS
        };
        assert!(SettingsResolver::effective(&CallerSettings::new(), &[spec]).is_err());
    }

    #[test]
    fn test_bad_pattern_is_reported() {
        let spec = SettingSpec {
            pattern: "^(1.0",
            ..TLS
        };
        let errors = SettingsResolver::validate(&caller(&[("min_tls", "1.0")]), &[spec]);
        assert!(matches!(errors[0], SettingsError::InvalidPattern { .. }));
    }

    #[test]
    fn test_undeclared_key_lookup() {
        let settings = SettingsResolver::effective(&CallerSettings::new(), &[]).unwrap();
        assert!(matches!(
            settings.number("missing"),
            Err(SettingsError::Undeclared { .. })
        ));
    }

    #[test]
    fn test_patterns_are_compiled_once() {
        const CACHED: &str = r"^cached-[0-9]+$";
        let first = compiled(CACHED).unwrap();
        let second = compiled(CACHED).unwrap();
        assert_eq!(first.as_str(), second.as_str());
        assert!(PATTERNS.get().unwrap().lock().unwrap().contains_key(CACHED));

        assert!(compiled(r"^(unclosed").is_err());
        assert!(!PATTERNS.get().unwrap().lock().unwrap().contains_key(r"^(unclosed"));
    }
}
