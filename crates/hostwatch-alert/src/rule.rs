use chrono::{DateTime, Utc};
use hostwatch_common::types::{Metric, Severity};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Direction in which a reading must cross the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Comparator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" | "gt" | "greater_than" => Ok(Self::GreaterThan),
            "<" | "lt" | "less_than" => Ok(Self::LessThan),
            _ => Err(format!("unknown comparator: {s}")),
        }
    }
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GreaterThan => write!(f, ">"),
            Self::LessThan => write!(f, "<"),
        }
    }
}

impl Comparator {
    pub fn check(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterThan => value > threshold,
            Self::LessThan => value < threshold,
        }
    }
}

/// A normalized threshold rule. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Rule {
    pub name: String,
    pub metric: Metric,
    pub threshold: f64,
    pub comparator: Comparator,
    pub severity: Severity,
    /// Qualifying ticks in a row required before the rule fires (≥ 1).
    pub consecutive: u32,
    /// Minimum seconds between two firings of this rule (≥ 0).
    pub cooldown_sec: f64,
}

impl Rule {
    fn cooled_down(&self, last: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let elapsed_secs = (now - last).num_milliseconds() as f64 / 1000.0;
        elapsed_secs >= self.cooldown_sec
    }
}

/// Details of a single rule firing, turned into an alert event by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerContext {
    pub name: String,
    pub metric: Metric,
    pub threshold: f64,
    pub severity: Severity,
    pub value: f64,
    pub comparator: Comparator,
    pub consecutive: u32,
}

/// Where a rule currently is in its debounce cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulePhase {
    /// No qualifying tick in the current run.
    Idle,
    /// Some qualifying ticks, fewer than `consecutive`.
    Accumulating,
    /// Enough qualifying ticks; held back by the cooldown.
    ReadyToFire,
}

/// Runtime state of one rule: the current streak and the last firing time.
#[derive(Debug, Clone, Default)]
pub struct RuleState {
    streak: u32,
    last_trigger_at: Option<DateTime<Utc>>,
}

impl RuleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one reading taken at `now` and returns a trigger context if the
    /// rule fires.
    ///
    /// An absent reading breaks the streak. After firing the streak starts
    /// over, so the condition must hold for another `consecutive` ticks
    /// before the rule can fire again, cooldown or not.
    pub fn check(
        &mut self,
        rule: &Rule,
        value: Option<f64>,
        now: DateTime<Utc>,
    ) -> Option<TriggerContext> {
        let Some(value) = value else {
            self.streak = 0;
            return None;
        };

        if rule.comparator.check(value, rule.threshold) {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.streak = 0;
        }

        if self.streak < rule.consecutive.max(1) {
            return None;
        }

        let cooled_down = match self.last_trigger_at {
            Some(last) => rule.cooled_down(last, now),
            None => true,
        };
        if !cooled_down {
            return None;
        }

        self.last_trigger_at = Some(now);
        self.streak = 0;
        Some(TriggerContext {
            name: rule.name.clone(),
            metric: rule.metric,
            threshold: rule.threshold,
            severity: rule.severity,
            value,
            comparator: rule.comparator,
            consecutive: rule.consecutive,
        })
    }

    pub fn phase(&self, rule: &Rule) -> RulePhase {
        if self.streak == 0 {
            RulePhase::Idle
        } else if self.streak < rule.consecutive.max(1) {
            RulePhase::Accumulating
        } else {
            RulePhase::ReadyToFire
        }
    }

    #[cfg(test)]
    pub(crate) fn streak(&self) -> u32 {
        self.streak
    }

    #[cfg(test)]
    pub(crate) fn last_trigger_at(&self) -> Option<DateTime<Utc>> {
        self.last_trigger_at
    }
}
