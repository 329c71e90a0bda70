//! Debounced threshold alerting over sampled host metrics.
//!
//! Each [`rule::Rule`] carries a [`rule::RuleState`] that counts consecutive
//! qualifying ticks (the streak) and remembers when the rule last fired (the
//! cooldown). The [`engine::RulesEngine`] runs every rule against each
//! [`MetricSnapshot`](hostwatch_common::types::MetricSnapshot) and hands the
//! resulting [`AlertEvent`](hostwatch_common::types::AlertEvent)s to an
//! [`sink::AlertSink`]. Rules come from a [`config::RulesConfig`], either as
//! an explicit list or synthesized from a legacy `{metric: threshold}` map.

pub mod config;
pub mod engine;
pub mod error;
pub mod rule;
pub mod sink;


pub use config::{RuleDefaults, RuleDefinition, RuleSource, RulesConfig};
pub use engine::RulesEngine;
pub use error::{RuleError, SinkError};
pub use rule::{Comparator, Rule, RulePhase, RuleState, TriggerContext};
pub use sink::AlertSink;
