//! The `compare` command on files written to disk

use crate::common::{assertions, sample_data, CliTestRunner};
use tabcompare::CompareError;

fn prices(runner: &CliTestRunner) -> (String, String) {
    let left = runner.fixture().create_csv("left.csv", &sample_data::baseline_prices()).unwrap();
    let right = runner.fixture().create_csv("right.csv", &sample_data::candidate_prices()).unwrap();
    (left.to_string_lossy().to_string(), right.to_string_lossy().to_string())
}

#[test]
fn test_compare_pretty_to_stdout() {
    let runner = CliTestRunner::new().unwrap();
    let (left, right) = prices(&runner);

    runner.expect_success(&["compare", &left, &right, "--key", "id", "--tolerance", "price=0.01"]);
}

#[test]
fn test_compare_json_report_file() {
    let runner = CliTestRunner::new().unwrap();
    let (left, right) = prices(&runner);
    let output = runner.fixture().root().join("report.json");

    runner.expect_success(&[
        "compare",
        &left,
        &right,
        "--key",
        "id",
        "--default-tolerance",
        "price=0.01:abs",
        "--count-difference",
        "qty",
        "--format",
        "json",
        "--output",
        output.to_str().unwrap(),
        "--limit",
        "2",
    ]);

    let report = assertions::read_json_with_keys(&output, &["name", "differences", "truncated"]).unwrap();
    assert_eq!(report["name"], "left vs right");
    assert_eq!(report["rows_with_differences"], 3);
    assert_eq!(report["truncated"], true);
    assert_eq!(report["differences"].as_array().unwrap().len(), 2);
    assert_eq!(report["differences"][0]["provenance"], "both");
    assert_eq!(report["differences"][1]["provenance"], "left_only");
}

#[test]
fn test_compare_pretty_report_file() {
    let runner = CliTestRunner::new().unwrap();
    let (left, right) = prices(&runner);
    let output = runner.fixture().root().join("report.txt");

    runner.expect_success(&[
        "compare",
        &left,
        &right,
        "--key",
        "id",
        "--ignore",
        "name",
        "--output",
        output.to_str().unwrap(),
    ]);

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.contains("Comparison: left vs right"));
    assert!(content.contains("Join: 2 matched, 1 left only, 1 right only"));
    assert!(!content.contains("name '"));
}

#[test]
fn test_compare_tab_separated_without_header() {
    let runner = CliTestRunner::new().unwrap();
    let left = runner.fixture().create_csv_raw("left.tsv", "1\t5.00\n2\t7\n").unwrap();
    let right = runner.fixture().create_csv_raw("right.tsv", "1\t5.03\n2\t7\n").unwrap();
    let output = runner.fixture().root().join("out.json");

    runner.expect_success(&[
        "compare",
        left.to_str().unwrap(),
        right.to_str().unwrap(),
        "--key",
        "0",
        "--tolerance",
        "1=0.05",
        "--separator",
        "\t",
        "--no-header",
        "--format",
        "json",
        "--output",
        output.to_str().unwrap(),
    ]);

    let report = assertions::read_json_with_keys(&output, &["diffs_counter"]).unwrap();
    assert_eq!(report["rows_with_differences"], 0);
    assert_eq!(report["diffs_counter"]["1"]["in_tolerance"], 1);
}

#[test]
fn test_compare_schema_mismatch_fails() {
    let runner = CliTestRunner::new().unwrap();
    let left = runner.fixture().create_csv("a.csv", &[vec!["A", "B"], vec!["1", "2"]]).unwrap();
    let right = runner.fixture().create_csv("b.csv", &[vec!["B", "A"], vec!["2", "1"]]).unwrap();

    let err = runner.expect_failure(&["compare", left.to_str().unwrap(), right.to_str().unwrap(), "--key", "A"]);
    assert!(matches!(err, CompareError::SchemaMismatch { position: 0, .. }));
}

#[test]
fn test_compare_invalid_mode_and_format() {
    let runner = CliTestRunner::new().unwrap();
    let (left, right) = prices(&runner);

    let err = runner.expect_failure(&["compare", &left, &right, "--key", "id", "--tolerance", "price=0.1:pct"]);
    assert!(matches!(err, CompareError::InvalidToleranceMode { .. }));

    let err = runner.expect_failure(&["compare", &left, &right, "--key", "id", "--format", "xml"]);
    assert!(matches!(err, CompareError::InvalidInput { .. }));
}

#[test]
fn test_compare_unsupported_file() {
    let runner = CliTestRunner::new().unwrap();
    let left = runner.fixture().create_csv_raw("left.xlsx", "x").unwrap();
    let err = runner.expect_failure(&["compare", left.to_str().unwrap(), left.to_str().unwrap(), "--key", "id"]);
    assert!(matches!(err, CompareError::InvalidInput { .. }));
}
