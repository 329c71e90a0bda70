use crate::error::RuleError;
use crate::rule::{Comparator, Rule};
use hostwatch_common::types::{Metric, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Global defaults applied to synthesized rules and to list entries that
/// omit `consecutive` / `cooldown_sec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefaults {
    #[serde(default = "default_consecutive")]
    pub consecutive: u32,
    #[serde(default = "default_cooldown_sec")]
    pub cooldown_sec: f64,
}

impl Default for RuleDefaults {
    fn default() -> Self {
        Self {
            consecutive: default_consecutive(),
            cooldown_sec: default_cooldown_sec(),
        }
    }
}

fn default_consecutive() -> u32 {
    3
}

fn default_cooldown_sec() -> f64 {
    10.0
}

/// Rule configuration as handed over by the configuration loader.
///
/// Entries are kept as raw JSON values so that one malformed entry can be
/// skipped without rejecting the whole configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Legacy `{metric: threshold}` map.
    #[serde(default)]
    pub thresholds: BTreeMap<String, Value>,
    /// Explicit rule definitions, see [`RuleDefinition`].
    #[serde(default)]
    pub rules: Vec<Value>,
    #[serde(default)]
    pub alerts: RuleDefaults,
}

/// The shape a [`RulesConfig`] resolves to.
#[derive(Debug, Clone, Copy)]
pub enum RuleSource<'a> {
    RuleList(&'a [Value]),
    LegacyThresholds(&'a BTreeMap<String, Value>),
    Empty,
}

impl RulesConfig {
    pub fn source(&self) -> RuleSource<'_> {
        if !self.rules.is_empty() {
            RuleSource::RuleList(&self.rules)
        } else if !self.thresholds.is_empty() {
            RuleSource::LegacyThresholds(&self.thresholds)
        } else {
            RuleSource::Empty
        }
    }

    /// Builds the normalized rule set, skipping invalid entries with a
    /// warning.
    ///
    /// A rule list that yields no valid rule falls back to the legacy
    /// thresholds when both are configured.
    pub fn build_rules(&self) -> Vec<Rule> {
        match self.source() {
            RuleSource::RuleList(entries) => {
                let rules = build_from_list(entries, &self.alerts);
                if rules.is_empty() && !self.thresholds.is_empty() {
                    tracing::warn!(
                        entries = entries.len(),
                        "No valid rule in rule list, falling back to thresholds"
                    );
                    return build_from_thresholds(&self.thresholds, &self.alerts);
                }
                rules
            }
            RuleSource::LegacyThresholds(thresholds) => {
                build_from_thresholds(thresholds, &self.alerts)
            }
            RuleSource::Empty => Vec::new(),
        }
    }
}

/// One entry of the `rules` list. Everything but `metric` and `threshold`
/// has a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub metric: Option<String>,
    /// A number, or a string holding one.
    #[serde(default)]
    pub threshold: Option<Value>,
    #[serde(default)]
    pub comparator: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    /// A number, or a string holding one. Fractions are truncated.
    #[serde(default)]
    pub consecutive: Option<Value>,
    /// A number, or a string holding one.
    #[serde(default)]
    pub cooldown_sec: Option<Value>,
}

impl RuleDefinition {
    pub fn into_rule(self, defaults: &RuleDefaults) -> Result<Rule, RuleError> {
        let metric_name = self.metric.ok_or(RuleError::MissingMetric)?;
        let metric: Metric = metric_name
            .parse()
            .map_err(|_| RuleError::UnknownMetric(metric_name.clone()))?;
        let threshold = parse_threshold(self.threshold.as_ref().ok_or(RuleError::MissingThreshold)?)?;
        let comparator = match self.comparator.as_deref() {
            None | Some("") => Comparator::GreaterThan,
            Some(s) => s
                .parse()
                .map_err(|_| RuleError::UnknownComparator(s.to_string()))?,
        };
        let severity = match self.severity.as_deref() {
            None | Some("") => Severity::Warning,
            Some(s) => s
                .parse()
                .map_err(|_| RuleError::UnknownSeverity(s.to_string()))?,
        };
        let consecutive = match &self.consecutive {
            Some(v) => parse_number(v)
                .map(|n| n.trunc().clamp(1.0, f64::from(u32::MAX)) as u32)
                .ok_or_else(|| RuleError::InvalidField {
                    field: "consecutive",
                    value: v.to_string(),
                })?,
            None => defaults.consecutive,
        };
        let cooldown_sec = match &self.cooldown_sec {
            Some(v) => parse_number(v).ok_or_else(|| RuleError::InvalidField {
                field: "cooldown_sec",
                value: v.to_string(),
            })?,
            None => defaults.cooldown_sec,
        };
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("{}_rule", metric));

        Ok(Rule {
            name,
            metric,
            threshold,
            comparator,
            severity,
            consecutive: consecutive.max(1),
            cooldown_sec: sanitize_cooldown(cooldown_sec),
        })
    }
}

/// Parses one raw list entry into a rule.
pub fn parse_rule(entry: &Value, defaults: &RuleDefaults) -> Result<Rule, RuleError> {
    let def: RuleDefinition = serde_json::from_value(entry.clone())?;
    def.into_rule(defaults)
}

/// Default rule for a legacy threshold entry: `<metric>_high`, `>`, warning.
pub fn legacy_rule(metric: &str, threshold: &Value, defaults: &RuleDefaults) -> Result<Rule, RuleError> {
    let parsed: Metric = metric
        .parse()
        .map_err(|_| RuleError::UnknownMetric(metric.to_string()))?;
    Ok(Rule {
        name: format!("{}_high", parsed),
        metric: parsed,
        threshold: parse_threshold(threshold)?,
        comparator: Comparator::GreaterThan,
        severity: Severity::Warning,
        consecutive: defaults.consecutive.max(1),
        cooldown_sec: sanitize_cooldown(defaults.cooldown_sec),
    })
}

fn build_from_list(entries: &[Value], defaults: &RuleDefaults) -> Vec<Rule> {
    let mut rules = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match parse_rule(entry, defaults) {
            Ok(rule) => rules.push(rule),
            Err(e) => {
                tracing::warn!(
                    index,
                    entry = %entry,
                    error = %e,
                    "Skipping invalid alert rule"
                );
            }
        }
    }
    rules
}

fn build_from_thresholds(thresholds: &BTreeMap<String, Value>, defaults: &RuleDefaults) -> Vec<Rule> {
    let mut rules = Vec::with_capacity(thresholds.len());
    for (metric, threshold) in thresholds {
        match legacy_rule(metric, threshold, defaults) {
            Ok(rule) => rules.push(rule),
            Err(e) => {
                tracing::warn!(
                    metric = %metric,
                    threshold = %threshold,
                    error = %e,
                    "Skipping invalid threshold"
                );
            }
        }
    }
    rules
}

/// A finite number, given either as a JSON number or as a string.
fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn parse_threshold(value: &Value) -> Result<f64, RuleError> {
    parse_number(value).ok_or_else(|| RuleError::InvalidThreshold(value.to_string()))
}

fn sanitize_cooldown(secs: f64) -> f64 {
    if secs.is_finite() {
        secs.max(0.0)
    } else {
        0.0
    }
}
