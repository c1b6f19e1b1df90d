//! VALIDATE stage: structural & semantic checks before any allocation.
//! Deterministic outputs; pure integer reasoning.
//!
//! Errors stop the run (exit code 2 at the CLI). Warnings are reported and
//! logged but never change the allocation.

use duct_core::variables::validate_params;
use duct_core::{DirectionId, EngineParams, WellId};

use crate::load::LoadedEvidence;

/// Issue severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

/// Where the issue occurred (kept small & deterministic).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntityRef {
    Root,
    Param(&'static str),
    EdgeIndex(usize),
    Direction(DirectionId),
    Well(WellId),
}

/// One validation finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub where_: EntityRef,
}

/// Deterministic report: pass = (no Error); ordering of issues is stable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub pass: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }
}

/// Top-level entry point.
pub fn validate(loaded: &LoadedEvidence, params: &EngineParams) -> ValidationReport {
    let mut issues: Vec<ValidationIssue> = Vec::new();

    issues.extend(check_params(params));
    issues.extend(check_skipped_edges(loaded));
    issues.extend(check_dropped_entries(loaded));
    issues.extend(check_real_owner_directions(loaded));
    issues.extend(check_edges_without_supply(loaded));

    sort_issues_stably(&mut issues);
    ValidationReport { pass: !issues.iter().any(|i| i.severity == Severity::Error), issues }
}

// ------------------------------------------------------------------------------------------------
// Checks
// ------------------------------------------------------------------------------------------------

fn check_params(params: &EngineParams) -> Vec<ValidationIssue> {
    match validate_params(params) {
        Ok(()) => Vec::new(),
        Err(e) => vec![ValidationIssue {
            severity: Severity::Error,
            code: "params.domain",
            message: e.to_string(),
            where_: EntityRef::Param(match e {
                duct_core::errors::CoreError::DomainOutOfRange(k) => k,
                _ => "params",
            }),
        }],
    }
}

fn check_skipped_edges(loaded: &LoadedEvidence) -> Vec<ValidationIssue> {
    loaded
        .skipped
        .iter()
        .map(|s| ValidationIssue {
            severity: Severity::Warning,
            code: "edge.skipped",
            message: format!("edge #{} (direction {}) skipped: {}", s.index, s.direction_id, s.reason),
            where_: EntityRef::EdgeIndex(s.index),
        })
        .collect()
}

fn check_dropped_entries(loaded: &LoadedEvidence) -> Vec<ValidationIssue> {
    if loaded.dropped_entries == 0 {
        return Vec::new();
    }
    vec![ValidationIssue {
        severity: Severity::Warning,
        code: "counts.dropped",
        message: format!("{} count entries dropped (bad id or count ≤ 0)", loaded.dropped_entries),
        where_: EntityRef::Root,
    }]
}

/// Real-owner evidence on a direction that is not an edge is never used.
fn check_real_owner_directions(loaded: &LoadedEvidence) -> Vec<ValidationIssue> {
    let ev = &loaded.evidence;
    ev.real_direction_owners
        .keys()
        .filter(|d| ev.edges.binary_search_by(|e| e.direction_id.cmp(d)).is_err())
        .map(|&d| ValidationIssue {
            severity: Severity::Warning,
            code: "real_owners.unused_direction",
            message: format!("real owners given for direction {d}, which has no unaccounted edge"),
            where_: EntityRef::Direction(d),
        })
        .collect()
}

/// Edges with no supply at either end can only end up on `UNKNOWN` in variants 1 and 2.
fn check_edges_without_supply(loaded: &LoadedEvidence) -> Vec<ValidationIssue> {
    let ev = &loaded.evidence;
    let has_supply = |w: &WellId| ev.supply0.get(w).map(|m| !m.is_empty()).unwrap_or(false);
    ev.edges
        .iter()
        .filter(|e| !has_supply(&e.well_a_id) && !has_supply(&e.well_b_id))
        .map(|e| ValidationIssue {
            severity: Severity::Warning,
            code: "edge.no_supply",
            message: format!(
                "direction {} has no supply at wells {} or {}",
                e.direction_id, e.well_a_id, e.well_b_id
            ),
            where_: EntityRef::Direction(e.direction_id),
        })
        .collect()
}

/// Sort by severity (errors first), then location, then code.
fn sort_issues_stably(issues: &mut [ValidationIssue]) {
    issues.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.where_.cmp(&b.where_))
            .then_with(|| a.code.cmp(b.code))
            .then_with(|| a.message.cmp(&b.message))
    });
}
