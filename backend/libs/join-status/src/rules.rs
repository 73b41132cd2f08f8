//! Ordered decision tables
//!
//! A table is a slice of rules evaluated top-down; the first rule whose
//! predicate holds decides the result. Rule order is part of the contract:
//! reordering a table changes behaviour.

use crate::status::JoinStatus;

/// One row of a decision table
pub struct Rule<F> {
    /// Short identifier used in traces and test failures
    pub name: &'static str,
    pub when: fn(&F) -> bool,
    pub then: JoinStatus,
}

/// Evaluate `rules` against `facts`, returning the matching rule's result
/// or `fallback` when none matches.
pub fn first_match<F>(rules: &[Rule<F>], facts: &F, fallback: JoinStatus) -> JoinStatus {
    matching_rule(rules, facts)
        .map(|rule| rule.then)
        .unwrap_or(fallback)
}

/// The rule that decides `facts`, if any
pub fn matching_rule<'a, F>(rules: &'a [Rule<F>], facts: &F) -> Option<&'a Rule<F>> {
    rules.iter().find(|rule| (rule.when)(facts))
}
