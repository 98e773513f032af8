//! Unit tests for tolerance resolution through the public API

use tabcompare::tolerance::{resolve_tolerances, ColumnTolerance, DefaultTolerance, RuleSource};
use tabcompare::ToleranceMode;

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_resolution_does_not_touch_inputs() {
    let explicit = vec![ColumnTolerance::new("a", 1.0, "abs")];
    let defaults = vec![DefaultTolerance::new("[a-z]", 2.0, "rel")];
    let before = (explicit.clone(), defaults.clone());

    let set = resolve_tolerances(&explicit, &defaults, &cols(&["a", "b", "c"]), &[]).unwrap();

    assert_eq!((explicit, defaults), before);
    assert_eq!(set.len(), 3);
    let order: Vec<_> = set.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(order, vec!["a", "b", "c"]);
    assert_eq!(set.get("c").unwrap().mode, ToleranceMode::Relative);
}

#[test]
fn test_resolved_set_serializes_with_sources() {
    let defaults = vec![DefaultTolerance::new("amount_.*", 0.01, "abs")];
    let set = resolve_tolerances(
        &[ColumnTolerance::new("qty", 1.0, "Rel")],
        &defaults,
        &cols(&["id", "amount_eur", "qty"]),
        &cols(&["id"]),
    )
    .unwrap();

    let json = serde_json::to_value(&set).unwrap();
    assert_eq!(json["qty"]["mode"], "rel");
    assert_eq!(json["qty"]["source"]["kind"], "explicit");
    assert_eq!(json["amount_eur"]["source"]["kind"], "default");
    assert_eq!(json["amount_eur"]["source"]["pattern"], "amount_.*");
    assert_eq!(set.get("amount_eur").unwrap().source, RuleSource::Default("amount_.*".into()));
}

#[test]
fn test_anchored_patterns_behave_like_unanchored() {
    let defaults = vec![DefaultTolerance::new("^val$", 1.0, "abs")];
    let set = resolve_tolerances(&[], &defaults, &cols(&["val", "value"]), &[]).unwrap();
    assert!(set.get("val").is_some());
    assert!(set.get("value").is_none());
}

#[test]
fn test_default_mode_deserializes_to_abs() {
    let default: DefaultTolerance = serde_json::from_str(r#"{ "name": "x", "tolerance": 0.5 }"#).unwrap();
    assert_eq!(default.tolerance_mode, "abs");
}
