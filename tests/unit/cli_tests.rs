//! Unit tests for CLI argument parsing and validation

use clap::Parser;
use std::path::PathBuf;
use tabcompare::cli::{Cli, Commands, ToleranceArg};

#[test]
fn test_cli_run_command() {
    let cli = Cli::try_parse_from(&["tabcompare", "run", "config.json"]).unwrap();
    match cli.command {
        Commands::Run {
            config,
            workers,
            output,
            quiet,
        } => {
            assert_eq!(config, PathBuf::from("config.json"));
            assert_eq!(workers, None);
            assert_eq!(output, None);
            assert!(!quiet);
        }
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn test_cli_run_command_with_options() {
    let cli = Cli::try_parse_from(&[
        "tabcompare",
        "run",
        "config.json",
        "--workers",
        "4",
        "--output",
        "reports",
        "--quiet",
    ])
    .unwrap();

    match cli.command {
        Commands::Run {
            workers, output, quiet, ..
        } => {
            assert_eq!(workers, Some(4));
            assert_eq!(output, Some(PathBuf::from("reports")));
            assert!(quiet);
        }
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn test_cli_run_rejects_zero_workers() {
    assert!(Cli::try_parse_from(&["tabcompare", "run", "config.json", "--workers", "0"]).is_err());
}

#[test]
fn test_cli_compare_command_defaults() {
    let cli = Cli::try_parse_from(&["tabcompare", "compare", "a.csv", "b.csv", "--key", "id"]).unwrap();
    match cli.command {
        Commands::Compare {
            left,
            right,
            keys,
            tolerances,
            separator,
            no_header,
            format,
            limit,
            ..
        } => {
            assert_eq!(left, PathBuf::from("a.csv"));
            assert_eq!(right, PathBuf::from("b.csv"));
            assert_eq!(keys, vec!["id"]);
            assert!(tolerances.is_empty());
            assert_eq!(separator, ',');
            assert!(!no_header);
            assert_eq!(format, "pretty");
            assert_eq!(limit, None);
        }
        _ => panic!("Expected Compare command"),
    }
}

#[test]
fn test_cli_compare_command_with_tolerances() {
    let cli = Cli::try_parse_from(&[
        "tabcompare",
        "compare",
        "a.csv",
        "b.csv",
        "--key",
        "region",
        "--key",
        "id",
        "--tolerance",
        "price=0.01",
        "--default-tolerance",
        "amount_.*=0.5:rel",
        "--ignore",
        "updated_at",
        "--count-difference",
        "qty",
        "--limit",
        "10",
    ])
    .unwrap();

    match cli.command {
        Commands::Compare {
            keys,
            tolerances,
            default_tolerances,
            ignore,
            count_difference,
            limit,
            ..
        } => {
            assert_eq!(keys, vec!["region", "id"]);
            assert_eq!(
                tolerances,
                vec![ToleranceArg {
                    name: "price".into(),
                    tolerance: 0.01,
                    mode: "abs".into()
                }]
            );
            assert_eq!(default_tolerances[0].name, "amount_.*");
            assert_eq!(default_tolerances[0].mode, "rel");
            assert_eq!(ignore, vec!["updated_at"]);
            assert_eq!(count_difference, vec!["qty"]);
            assert_eq!(limit, Some(10));
        }
        _ => panic!("Expected Compare command"),
    }
}

#[test]
fn test_cli_compare_requires_key() {
    assert!(Cli::try_parse_from(&["tabcompare", "compare", "a.csv", "b.csv"]).is_err());
}

#[test]
fn test_cli_compare_rejects_malformed_tolerance() {
    assert!(Cli::try_parse_from(&[
        "tabcompare",
        "compare",
        "a.csv",
        "b.csv",
        "--key",
        "id",
        "--tolerance",
        "price"
    ])
    .is_err());
}

#[test]
fn test_global_verbose_flag() {
    let cli = Cli::try_parse_from(&["tabcompare", "compare", "a.csv", "b.csv", "--key", "id", "--verbose"]).unwrap();
    assert!(cli.verbose);
}
