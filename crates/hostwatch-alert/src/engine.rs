use crate::config::RulesConfig;
use crate::rule::{Rule, RulePhase, RuleState, TriggerContext};
use crate::sink::AlertSink;
use hostwatch_common::id;
use hostwatch_common::types::{
    AlertEvent, EventSource, MetricSnapshot, RuleSummary, EVENT_TYPE_METRIC_THRESHOLD,
    EVENT_VERSION,
};
use std::sync::Arc;

struct ArmedRule {
    rule: Rule,
    state: RuleState,
}

pub struct RulesEngine {
    rules: Vec<ArmedRule>,
    source: EventSource,
    sink: Arc<dyn AlertSink>,
}

impl RulesEngine {
    pub fn new(rules: Vec<Rule>, source: EventSource, sink: Box<dyn AlertSink>) -> Self {
        Self {
            rules: arm(rules),
            source,
            sink: Arc::from(sink),
        }
    }

    pub fn from_config(config: &RulesConfig, source: EventSource, sink: Box<dyn AlertSink>) -> Self {
        let rules = config.build_rules();
        tracing::info!(rule_count = rules.len(), "Alert rules loaded");
        Self::new(rules, source, sink)
    }

    /// Active rule definitions, in evaluation order.
    pub fn rules(&self) -> Vec<Rule> {
        self.rules.iter().map(|r| r.rule.clone()).collect()
    }

    /// The sink fired events are published to.
    pub fn sink(&self) -> Arc<dyn AlertSink> {
        Arc::clone(&self.sink)
    }

    /// Replace all rules with a new set. Streaks and cooldowns start over.
    pub fn replace_rules(&mut self, rules: Vec<Rule>) {
        self.rules = arm(rules);
    }

    /// Rebuild the rule set from configuration. Returns the number of loaded rules.
    pub fn reload(&mut self, config: &RulesConfig) -> usize {
        let rules = config.build_rules();
        let count = rules.len();
        self.replace_rules(rules);
        tracing::info!(rule_count = count, "Alert rules reloaded");
        count
    }

    /// Runs every rule against `snapshot`, using the snapshot timestamp as
    /// the evaluation time, and publishes one event per firing rule.
    ///
    /// Returns the number of events the sink accepted. Sink errors are
    /// logged and never stop the remaining rules.
    pub fn evaluate(&mut self, snapshot: &MetricSnapshot) -> usize {
        let fired = self.check(snapshot);
        publish(self.sink.as_ref(), &fired)
    }

    /// Advances every rule's streak and cooldown against `snapshot` and
    /// returns the events of the rules that fired, without publishing them.
    ///
    /// Callers sharing the engine behind a lock can release it before
    /// handing the events to [`sink`](Self::sink) with [`publish`].
    pub fn check(&mut self, snapshot: &MetricSnapshot) -> Vec<AlertEvent> {
        let now = snapshot.timestamp;
        let mut fired = Vec::new();

        for armed in &mut self.rules {
            let value = snapshot.get(armed.rule.metric);
            let Some(ctx) = armed.state.check(&armed.rule, value, now) else {
                if armed.state.phase(&armed.rule) == RulePhase::ReadyToFire {
                    tracing::debug!(
                        rule = %armed.rule.name,
                        "Alert suppressed (cooldown)"
                    );
                }
                continue;
            };

            let event = build_event(&ctx, snapshot, &self.source);
            tracing::debug!(
                rule = %ctx.name,
                metric = %ctx.metric,
                value = ctx.value,
                threshold = ctx.threshold,
                event_id = %event.id,
                "Alert rule fired"
            );
            fired.push(event);
        }

        fired
    }
}

/// Publishes `events` in order. Returns how many the sink accepted; a
/// failed event is logged and the rest are still attempted.
pub fn publish(sink: &dyn AlertSink, events: &[AlertEvent]) -> usize {
    let mut published = 0;
    for event in events {
        match sink.publish(event) {
            Ok(()) => published += 1,
            Err(e) => {
                tracing::warn!(
                    sink = sink.name(),
                    rule = %event.rule.name,
                    event_id = %event.id,
                    error = %e,
                    "Failed to publish alert event"
                );
            }
        }
    }
    published
}

fn arm(rules: Vec<Rule>) -> Vec<ArmedRule> {
    rules
        .into_iter()
        .map(|rule| ArmedRule {
            rule,
            state: RuleState::new(),
        })
        .collect()
}

fn build_event(ctx: &TriggerContext, snapshot: &MetricSnapshot, source: &EventSource) -> AlertEvent {
    AlertEvent {
        id: id::next_id(),
        timestamp: snapshot.timestamp,
        level: ctx.severity,
        event_type: EVENT_TYPE_METRIC_THRESHOLD.to_string(),
        message: format!(
            "{} {} {:.1} (current {:.1}{}, {} consecutive)",
            ctx.metric,
            ctx.comparator,
            ctx.threshold,
            ctx.value,
            ctx.metric.unit(),
            ctx.consecutive,
        ),
        source: source.clone(),
        metrics: snapshot.clone(),
        rule: RuleSummary {
            name: ctx.name.clone(),
            threshold: ctx.threshold,
            severity: ctx.severity,
        },
        version: EVENT_VERSION.to_string(),
    }
}
