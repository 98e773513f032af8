//! Behavioural properties of the comparison pipeline that must hold for any
//! input: symmetry, idempotence and the tolerance boundaries

use crate::common::dataset;
use std::collections::BTreeSet;
use tabcompare::{compare, CellValue, ComparisonJob, ComparisonResult, Dataset, Provenance, ReferenceKey};

fn left() -> Dataset {
    dataset(&[
        vec!["id", "price", "name", "qty"],
        vec!["1", "10.00", "alpha", "1"],
        vec!["2", "20.00", "beta", "2"],
        vec!["3", "30.00", "", "3"],
        vec!["5", "50.00", "epsilon", "5"],
        vec!["6", "", "zeta", "6"],
    ])
}

fn right() -> Dataset {
    dataset(&[
        vec!["id", "price", "name", "qty"],
        vec!["1", "10.02", "alpha", "1"],
        vec!["2", "21.00", "BETA", "2"],
        vec!["3", "30.00", "gamma", "x"],
        vec!["4", "40.00", "delta", "4"],
        vec!["6", "60.00", "zeta", "6"],
    ])
}

fn job() -> ComparisonJob {
    ComparisonJob::new("props", ReferenceKey::new(["id"]).unwrap())
        .with_tolerance("price", 0.05, "abs")
        .with_default("q.*", 1.0, "abs")
}

fn flagged_keys(result: &ComparisonResult) -> BTreeSet<Vec<CellValue>> {
    result.difference_rows().map(|(_, row)| row.key.clone()).collect()
}

#[test]
fn test_swapping_inputs_keeps_counts_and_flagged_keys() {
    let forward = compare(&left(), &right(), &job()).unwrap();
    let backward = compare(&right(), &left(), &job()).unwrap();

    for (column, counter) in &forward.diffs_counter {
        assert_eq!(counter.absolute, backward.diffs_counter[column].absolute, "column {}", column);
    }
    assert_eq!(flagged_keys(&forward), flagged_keys(&backward));

    assert_eq!(forward.join.unmatched_left, backward.join.unmatched_right);
    assert_eq!(forward.join.unmatched_right, backward.join.unmatched_left);
    for (f, b) in forward.merged.rows.iter().zip(&backward.merged.rows) {
        assert_eq!(f.key, b.key);
        let swapped = match f.provenance {
            Provenance::LeftOnly => Provenance::RightOnly,
            Provenance::RightOnly => Provenance::LeftOnly,
            Provenance::Both => Provenance::Both,
        };
        assert_eq!(swapped, b.provenance);
    }
}

#[test]
fn test_comparing_a_dataset_with_itself_finds_nothing() {
    let configurations = vec![
        ComparisonJob::new("none", ReferenceKey::new(["id"]).unwrap()),
        job(),
        ComparisonJob::new("rel", ReferenceKey::new(["id"]).unwrap())
            .with_tolerance("price", 0.0, "rel")
            .with_default(".*", 0.5, "REL"),
    ];

    for config in configurations {
        for data in [left(), right()] {
            let result = compare(&data, &data, &config).unwrap();
            assert!(result.is_clean(), "{}", config.name);
            assert!(result.diffs_counter.values().all(|c| c.absolute == 0), "{}", config.name);
            assert!(result.diff_column_names.is_empty());
            assert_eq!(result.join.matched_both, data.len());
        }
    }
}

#[test]
fn test_absolute_boundary_is_inclusive() {
    for t in [0.05, 0.1, 0.25, 0.001, 7.5, 1.0] {
        let right_at = format!("{}", 10.0 + t);
        let right_over = format!("{}", 10.0 + t + 1e-6);

        let base = dataset(&[vec!["id", "val"], vec!["1", "10"]]);
        let at = dataset(&[vec!["id", "val"], vec!["1", right_at.as_str()]]);
        let over = dataset(&[vec!["id", "val"], vec!["1", right_over.as_str()]]);

        let job = ComparisonJob::new("abs", ReferenceKey::new(["id"]).unwrap()).with_tolerance("val", t, "abs");

        let result = compare(&base, &at, &job).unwrap();
        assert!(result.is_clean(), "10 vs {} should match with t = {}", right_at, t);
        assert_eq!(result.diffs_counter["val"].in_tolerance, 1);

        let result = compare(&base, &over, &job).unwrap();
        assert_eq!(result.differences.len(), 1, "10 vs {} should differ with t = {}", right_over, t);
        assert_eq!(result.diffs_counter["val"].in_tolerance, 0);
    }
}

#[test]
fn test_relative_zero_right_never_matches() {
    let job = ComparisonJob::new("rel", ReferenceKey::new(["id"]).unwrap()).with_tolerance("val", 1e9, "rel");
    let right = dataset(&[vec!["id", "val"], vec!["1", "0"]]);

    for left_value in ["1", "-1", "0.000001", "0.0"] {
        let left = dataset(&[vec!["id", "val"], vec!["1", left_value]]);
        let result = compare(&left, &right, &job).unwrap();

        // 0.0 against 0 is not a difference at all
        if left_value == "0.0" {
            assert!(result.is_clean());
        } else {
            assert_eq!(result.differences.len(), 1, "left = {}", left_value);
            assert_eq!(result.diffs_counter["val"].in_tolerance, 0);
        }
    }
}

#[test]
fn test_explicit_rule_beats_default_pattern() {
    let left = dataset(&[vec!["id", "X1", "X2"], vec!["1", "100", "100"]]);
    let right = dataset(&[vec!["id", "X1", "X2"], vec!["1", "103", "103"]]);
    let job = ComparisonJob::new("prec", ReferenceKey::new(["id"]).unwrap())
        .with_tolerance("X1", 0.01, "abs")
        .with_default("X.", 5.0, "abs");

    let result = compare(&left, &right, &job).unwrap();

    assert_eq!(result.tolerances.get("X1").unwrap().tolerance, 0.01);
    assert_eq!(result.tolerances.get("X2").unwrap().tolerance, 5.0);
    assert_eq!(result.differences.len(), 1);
    assert_eq!(result.differences[0].columns, vec!["X1"]);
}

#[test]
fn test_result_is_deterministic() {
    let first = compare(&left(), &right(), &job()).unwrap();
    let second = compare(&left(), &right(), &job()).unwrap();

    assert_eq!(first.merged, second.merged);
    assert_eq!(first.differences, second.differences);
    assert_eq!(first.diffs_counter, second.diffs_counter);
}
