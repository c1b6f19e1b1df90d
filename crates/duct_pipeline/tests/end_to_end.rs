//! Whole-pipeline runs over evidence bundles written to a temp dir.

use std::fs;
use std::path::{Path, PathBuf};

use assert_json_diff::assert_json_include;
use duct_io::loader::InputSource;
use duct_pipeline::{run_from_paths, ParamsOverride, PipelineError, PipelineOutputs};
use serde_json::{json, Value};

fn write(dir: &Path, name: &str, v: &Value) -> PathBuf {
    let p = dir.join(name);
    fs::write(&p, serde_json::to_vec(v).unwrap()).unwrap();
    p
}

fn run_bundle(v: &Value) -> Result<PipelineOutputs, PipelineError> {
    let dir = tempfile::tempdir().unwrap();
    let p = write(dir.path(), "bundle.json", v);
    run_from_paths(InputSource::Bundle(&p), None, ParamsOverride::default())
}

fn alloc(out: &PipelineOutputs, variant: usize) -> Value {
    serde_json::to_value(&out.scenarios[variant - 1].allocation).unwrap()
}

#[test]
fn single_owner_worked_example() {
    let out = run_bundle(&json!({
        "edges": [{"direction_id": 1, "well_a_id": 100, "well_b_id": 200, "unaccounted_count": 3}],
        "supply": {"100": {"1": 5}, "200": {"1": 2}}
    }))
    .unwrap();
    assert_eq!(alloc(&out, 1), json!({"1": {"1": 2, "unknown": 1}}));
    assert_eq!(alloc(&out, 2), json!({"1": {"1": 3}}));
    assert_eq!(alloc(&out, 3), json!({"1": {"1": 3}}));
}

#[test]
fn disqualified_competitor_worked_example() {
    let out = run_bundle(&json!({
        "edges": [{"direction_id": 1, "well_a_id": 100, "well_b_id": 200, "unaccounted_count": 4}],
        "supply": {"100": {"1": 4, "2": 4}, "200": {"1": 4, "2": 0}}
    }))
    .unwrap();
    assert_eq!(alloc(&out, 1), json!({"1": {"1": 4}}));
    assert_eq!(out.scenarios[0].trace.greedy_steps, 0);
}

#[test]
fn variant_three_remainder_worked_example() {
    let out = run_bundle(&json!({
        "edges": [{"direction_id": 7, "well_a_id": 1, "well_b_id": 2, "unaccounted_count": 5}],
        "real_direction_owners": {"7": {"10": 3, "11": 1}}
    }))
    .unwrap();
    assert_eq!(alloc(&out, 2), json!({"7": {"unknown": 5}}));
    assert_eq!(alloc(&out, 3), json!({"7": {"10": 4, "11": 1}}));
    let rows = serde_json::to_value(&out.scenarios[2].rows).unwrap();
    assert_json_include!(
        actual: rows,
        expected: json!([
            {"direction_id": 7, "owner_id": 10, "count": 4, "confidence": 0.35, "classification": "mixed"},
            {"direction_id": 7, "owner_id": 11, "count": 1, "confidence": 0.35, "classification": "mixed"}
        ])
    );
}

#[test]
fn empty_edges_give_empty_scenarios() {
    let out = run_bundle(&json!({"edges": []})).unwrap();
    assert_eq!(out.scenarios.len(), 3);
    for s in &out.scenarios {
        assert!(s.allocation.is_empty() && s.rows.is_empty());
        assert_eq!(s.stats.total_unaccounted, 0);
    }
}

#[test]
fn supply_is_derived_from_tags_minus_existing() {
    let out = run_bundle(&json!({
        "edges": [{"direction_id": 1, "well_a_id": 1, "well_b_id": 2, "unaccounted_count": 2}],
        "tag_counts": {"1": {"5": 3}, "2": {"5": 3}},
        "existing_well_owner": {"1": {"5": 2}, "2": {"5": 2}}
    }))
    .unwrap();
    // one unit of supply left at each end
    assert_eq!(alloc(&out, 1), json!({"1": {"5": 1, "unknown": 1}}));
    let row = serde_json::to_value(&out.scenarios[0].rows[0]).unwrap();
    assert_json_include!(
        actual: row,
        expected: json!({"evidence": {"well_a_id": 1, "well_b_id": 2, "tags_a": 3, "tags_b": 3, "existing_a": 2, "existing_b": 2}})
    );
}

#[test]
fn malformed_edges_are_skipped_and_recorded() {
    let out = run_bundle(&json!({
        "edges": [
            {"direction_id": 1, "well_a_id": 1, "well_b_id": 2, "unaccounted_count": 1},
            {"direction_id": -2, "well_a_id": 1, "well_b_id": 2, "unaccounted_count": 1},
            {"direction_id": 1, "well_a_id": 3, "well_b_id": 4, "unaccounted_count": 9},
            {"direction_id": 3, "well_a_id": 1, "well_b_id": 2, "unaccounted_count": 4294967296_i64}
        ]
    }))
    .unwrap();
    let skipped = serde_json::to_value(&out.run_record.skipped_edges).unwrap();
    assert_eq!(
        skipped,
        json!([
            {"index": 1, "direction_id": -2, "reason": "invalid_direction_id"},
            {"index": 2, "direction_id": 1, "reason": "duplicate_direction"},
            {"index": 3, "direction_id": 3, "reason": "count_overflow"}
        ])
    );
    assert_eq!(out.scenarios[0].stats.total_unaccounted, 1);
}

#[test]
fn repeated_runs_are_byte_identical() {
    let bundle = json!({
        "edges": [
            {"direction_id": 2, "well_a_id": 1, "well_b_id": 2, "unaccounted_count": 3},
            {"direction_id": 1, "well_a_id": 2, "well_b_id": 3, "unaccounted_count": 2}
        ],
        "tag_counts": {"1": {"1": 2, "2": 1}, "2": {"1": 1, "2": 2}, "3": {"2": 1}},
        "real_direction_owners": {"2": {"9": 1}}
    });
    let a = run_bundle(&bundle).unwrap();
    let b = run_bundle(&bundle).unwrap();
    assert_eq!(a.run_record, b.run_record);
    assert_eq!(a.scenarios, b.scenarios);
}

#[test]
fn zero_iteration_guard_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(dir.path(), "bundle.json", &json!({"edges": []}));
    let r = run_from_paths(
        InputSource::Bundle(&p),
        None,
        ParamsOverride { iteration_guard: Some(0) },
    );
    match r {
        Err(PipelineError::Validate(m)) => assert!(m.starts_with("params.domain"), "{m}"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn huge_support_weight_still_allocates() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(dir.path(), "bundle.json", &json!({
        "edges": [{"direction_id": 1, "well_a_id": 100, "well_b_id": 200, "unaccounted_count": 1}],
        "supply": {"100": {"1": 3, "2": 1}, "200": {"1": 3, "2": 1}},
        "tag_counts": {"100": {"2": 3}, "200": {"2": 3}}
    }));
    let params = write(dir.path(), "params.json", &json!({"weights": {"support": 4611686018427387904_i64}}));
    let out = run_from_paths(InputSource::Bundle(&p), Some(&params), ParamsOverride::default()).unwrap();
    assert_eq!(alloc(&out, 1), json!({"1": {"2": 1}}));
}

#[test]
fn params_file_is_schema_checked_and_applied() {
    let dir = tempfile::tempdir().unwrap();
    let p = write(dir.path(), "bundle.json", &json!({"edges": []}));
    let params = write(dir.path(), "params.json", &json!({"iteration_guard": 7}));
    let out = run_from_paths(InputSource::Bundle(&p), Some(&params), ParamsOverride::default()).unwrap();
    assert_eq!(out.scenarios[0].params.iteration_guard, 7);

    let bad = write(dir.path(), "bad_params.json", &json!({"iteration_guard": 0}));
    match run_from_paths(InputSource::Bundle(&p), Some(&bad), ParamsOverride::default()) {
        Err(PipelineError::Schema(m)) => assert!(m.starts_with("/iteration_guard:"), "{m}"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn schema_errors_map_to_schema_bucket() {
    match run_bundle(&json!({"edges": "nope"})) {
        Err(PipelineError::Schema(m)) => {
            assert!(m.starts_with("/edges:"), "{m}");
            assert!(!m.contains("compile error"), "{m}");
        }
        other => panic!("unexpected: {other:?}"),
    }
}
