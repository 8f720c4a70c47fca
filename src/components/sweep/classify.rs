use crate::components::google_calendar::models::{CalendarEvent, Mutation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Case-insensitive title keyword paired with the color it assigns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub color_id: String,
}

impl KeywordRule {
    pub fn new(keyword: &str, color_id: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            color_id: color_id.to_string(),
        }
    }

    /// Whether the title contains the keyword, ignoring case
    pub fn matches(&self, title: &str) -> bool {
        title.to_lowercase().contains(&self.keyword.to_lowercase())
    }
}

/// Outcome of classifying one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Matched a rule and needs its color changed
    Update { from: Option<String>, to: String },
    /// Matched a rule and already has its color
    AlreadyCorrect,
    /// No rule matched
    NoMatch,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Update { from, to } => write!(
                f,
                "will be updated from color {} to color {}",
                from.as_deref().unwrap_or("default"),
                to
            ),
            Decision::AlreadyCorrect => write!(f, "skipped, color already set"),
            Decision::NoMatch => write!(f, "skipped, no keyword found"),
        }
    }
}

/// An event together with the decision taken for it
#[derive(Debug, Clone)]
pub struct Classification<'a> {
    pub event: &'a CalendarEvent,
    pub decision: Decision,
}

/// Counters for a recoloring run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecolorSummary {
    pub checked: usize,
    pub updated: usize,
    pub already_correct: usize,
    pub unmatched: usize,
}

/// Decisions for every event plus the color changes they require
#[derive(Debug, Clone, Default)]
pub struct RecolorPlan<'a> {
    pub classifications: Vec<Classification<'a>>,
    pub mutations: Vec<Mutation>,
}

impl RecolorPlan<'_> {
    pub fn summary(&self) -> RecolorSummary {
        let mut summary = RecolorSummary {
            checked: self.classifications.len(),
            ..Default::default()
        };
        for classification in &self.classifications {
            match classification.decision {
                Decision::Update { .. } => summary.updated += 1,
                Decision::AlreadyCorrect => summary.already_correct += 1,
                Decision::NoMatch => summary.unmatched += 1,
            }
        }
        summary
    }
}

/// Decide what a single rule means for a single event
pub fn decide(event: &CalendarEvent, rule: &KeywordRule) -> Decision {
    if !rule.matches(event.title()) {
        return Decision::NoMatch;
    }
    if event.color_id.as_deref() == Some(rule.color_id.as_str()) {
        return Decision::AlreadyCorrect;
    }
    Decision::Update {
        from: event.color_id.clone(),
        to: rule.color_id.clone(),
    }
}

/// Color changes required by one rule, in event order.
///
/// Events already at the rule's color are left out, so applying the result and
/// classifying again yields nothing.
pub fn classify(events: &[CalendarEvent], rule: &KeywordRule) -> Vec<Mutation> {
    events
        .iter()
        .filter_map(|event| match decide(event, rule) {
            Decision::Update { to, .. } => Some(Mutation::set_color(event, &to)),
            _ => None,
        })
        .collect()
}

/// Apply an ordered rule list to every event.
///
/// Rules take effect in list order, so when several rules match an event the
/// last one in the list decides its color. Each event gets at most one
/// mutation, towards that final color.
pub fn plan_recolor<'a>(events: &'a [CalendarEvent], rules: &[KeywordRule]) -> RecolorPlan<'a> {
    let mut plan = RecolorPlan::default();

    for event in events {
        let decision = match rules.iter().rev().find(|rule| rule.matches(event.title())) {
            Some(rule) => decide(event, rule),
            None => Decision::NoMatch,
        };

        if let Decision::Update { to, .. } = &decision {
            plan.mutations.push(Mutation::set_color(event, to));
        }
        plan.classifications.push(Classification { event, decision });
    }

    plan
}
