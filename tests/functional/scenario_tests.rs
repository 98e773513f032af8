//! End-to-end comparison scenarios on in-memory datasets

use crate::common::{dataset, sample_data};
use tabcompare::{compare, CellValue, CompareError, ComparisonJob, Dataset, Provenance, ReferenceKey};

fn key() -> ReferenceKey {
    ReferenceKey::new(["id"]).unwrap()
}

#[test]
fn test_small_drift_within_absolute_tolerance() {
    let left = dataset(&[vec!["id", "val"], vec!["1", "5.00"]]);
    let right = dataset(&[vec!["id", "val"], vec!["1", "5.03"]]);
    let job = ComparisonJob::new("drift", key()).with_tolerance("val", 0.05, "ABS");

    let result = compare(&left, &right, &job).unwrap();

    assert_eq!(result.diffs_counter["val"].absolute, 1);
    assert_eq!(result.diffs_counter["val"].in_tolerance, 1);
    assert!(result.differences.is_empty());
    assert_eq!(result.diff_column_names, vec!["val"]);
}

#[test]
fn test_disjoint_keys_give_one_sided_rows() {
    let left = dataset(&[vec!["id", "val"], vec!["1", "100"]]);
    let right = dataset(&[vec!["id", "val"], vec!["2", "200"]]);

    let result = compare(&left, &right, &ComparisonJob::new("disjoint", key())).unwrap();

    assert_eq!(result.merged.len(), 2);
    assert_eq!(result.merged.rows[0].provenance, Provenance::LeftOnly);
    assert_eq!(result.merged.rows[1].provenance, Provenance::RightOnly);
    assert_eq!(result.join.matched_both, 0);
    assert_eq!(result.join.unmatched_left, 1);
    assert_eq!(result.join.unmatched_right, 1);
}

#[test]
fn test_empty_left_is_noted_not_raised() {
    let left = Dataset::new(["id", "val"]);
    let right = dataset(&[vec!["id", "val"], vec!["1", "100"]]);

    let result = compare(&left, &right, &ComparisonJob::new("empty", key())).unwrap();

    assert!(result.merged.is_empty());
    assert!(result.note.unwrap().contains("Left dataset is empty"));
}

#[test]
fn test_reordered_schema_is_rejected() {
    let left = dataset(&[vec!["A", "B"], vec!["1", "2"]]);
    let right = dataset(&[vec!["B", "A"], vec!["2", "1"]]);
    let job = ComparisonJob::new("schema", ReferenceKey::new(["A"]).unwrap());

    match compare(&left, &right, &job).unwrap_err() {
        CompareError::SchemaMismatch { position, left, right } => {
            assert_eq!(position, 0);
            assert_eq!(left, "A");
            assert_eq!(right, "B");
        }
        other => panic!("Expected SchemaMismatch, got {:?}", other),
    }
}

#[test]
fn test_price_list_reconciliation() {
    let left = dataset(&sample_data::baseline_prices());
    let right = dataset(&sample_data::candidate_prices());
    let job = ComparisonJob::new("prices", key())
        .with_tolerance("price", 0.01, "abs")
        .with_count_difference("qty");

    let result = compare(&left, &right, &job).unwrap();

    assert_eq!(result.join.matched_both, 2);
    assert_eq!(result.join.unmatched_left, 1);
    assert_eq!(result.join.unmatched_right, 1);
    assert_eq!(result.lines.merged, 4);
    assert!(result.anomaly.is_some());

    // Apple drift is tolerated; Banana, Cherry and Date remain
    let keys: Vec<_> = result.difference_rows().map(|(_, row)| row.key[0].clone()).collect();
    assert_eq!(keys, vec![CellValue::Integer(2), CellValue::Integer(3), CellValue::Integer(4)]);

    let (banana, _) = result.difference_rows().next().unwrap();
    assert_eq!(banana.columns, vec!["qty"]);
    assert_eq!(banana.deltas.get("qty"), Some(&5.0));

    assert_eq!(result.diffs_counter["price"].absolute, 3);
    assert_eq!(result.diffs_counter["price"].in_tolerance, 1);
    assert_eq!(result.diff_column_names, vec!["name", "price", "qty"]);
}

#[test]
fn test_relative_tolerance_divides_by_right() {
    let left = dataset(&[vec!["id", "amount"], vec!["1", "110"], vec!["2", "100"]]);
    let right = dataset(&[vec!["id", "amount"], vec!["1", "100"], vec!["2", "110"]]);
    let job = ComparisonJob::new("rel", key()).with_tolerance("amount", 0.095, "rel");

    let result = compare(&left, &right, &job).unwrap();

    // |110 - 100| / 100 = 0.1 differs, |100 - 110| / 110 = 0.0909 is tolerated
    assert_eq!(result.differences.len(), 1);
    assert_eq!(result.merged.rows[result.differences[0].row].key, vec![CellValue::Integer(1)]);
}

#[test]
fn test_text_columns_ignore_tolerance() {
    let left = dataset(&[vec!["id", "code"], vec!["1", "A1"], vec!["2", "7"]]);
    let right = dataset(&[vec!["id", "code"], vec!["1", "A2"], vec!["2", "7x"]]);
    let job = ComparisonJob::new("text", key()).with_tolerance("code", 100.0, "abs");

    let result = compare(&left, &right, &job).unwrap();
    assert_eq!(result.differences.len(), 2);
    assert_eq!(result.diffs_counter["code"].in_tolerance, 0);
}
