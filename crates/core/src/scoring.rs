//! Scoring module - rule-table score accumulation
//!
//! A [`ScoringLedger`] maps event names to point values and accumulates a
//! total. It knows nothing about which game produced an event:
//! - falling-block games fire `line_clear_1` .. `line_clear_4` once per clearing pass
//! - merge games fire `merge` with a count equal to the rank's point weight
//!
//! Events missing from the rule table contribute nothing.

use std::collections::BTreeMap;

use crate::types::{line_clear_event, LINE_CLEAR_POINTS, MERGE_EVENT};

/// Per-player score accumulator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScoringLedger {
    rules: BTreeMap<String, u32>,
    total: u32,
}

impl ScoringLedger {
    /// Create a ledger with the given rule table
    pub fn new(rules: BTreeMap<String, u32>) -> Self {
        Self { rules, total: 0 }
    }

    /// Line-clear rules for the falling-block game
    pub fn falling_default_rules() -> BTreeMap<String, u32> {
        LINE_CLEAR_POINTS
            .iter()
            .enumerate()
            .filter_map(|(i, &points)| line_clear_event(i + 1).map(|name| (name.to_string(), points)))
            .collect()
    }

    /// Merge rule for the merge game (`merge = 1`, weighted by the caller)
    pub fn merge_default_rules() -> BTreeMap<String, u32> {
        BTreeMap::from([(MERGE_EVENT.to_string(), 1)])
    }

    /// Add `rules[name] * count` to the total.
    ///
    /// Unknown names are ignored. Returns the points actually added.
    pub fn add_event(&mut self, name: &str, count: u32) -> u32 {
        let Some(&points) = self.rules.get(name) else {
            return 0;
        };
        let gained = points.saturating_mul(count);
        self.total = self.total.saturating_add(gained);
        gained
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn reset(&mut self) {
        self.total = 0;
    }

    pub fn rules(&self) -> &BTreeMap<String, u32> {
        &self.rules
    }
}

/// External player identity as seen by the rules core
///
/// The engines never own players; hosts pass them in and read totals back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Player {
    pub name: String,
    pub score: u32,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0,
        }
    }

    pub fn update_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }
}
