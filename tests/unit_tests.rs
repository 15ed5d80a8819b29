use clap::Parser;
use qgen::{DatabaseOpts, OutputFormat, RunOpts};
use qgen_core::{AllowedVerbs, Placeholder, QueryTemplateDocument, TemplateError};
use qgen_mysql::ConnectionOpts;
use std::io::Write;
use std::time::Duration;

#[derive(Parser)]
struct TestCli {
    #[command(flatten)]
    database: DatabaseOpts,

    #[command(flatten)]
    run: RunOpts,
}

fn parse(args: &[&str]) -> TestCli {
    TestCli::try_parse_from(std::iter::once("qgen").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_database_opts_defaults() {
    let cli = parse(&["--username", "alice", "--password", "pw"]);
    let conn = ConnectionOpts::from(&cli.database);

    assert_eq!(conn.host, "localhost");
    assert_eq!(conn.port, 3306);
    assert_eq!(conn.username, "alice");
    assert_eq!(conn.password, "pw");
    // Database name falls back to the username.
    assert_eq!(conn.database, "alice");
}

#[test]
fn test_database_opts_explicit_dbname() {
    let cli = parse(&["--username", "alice", "--dbname", "shop", "--port", "3307"]);
    let conn = ConnectionOpts::from(&cli.database);

    assert_eq!(conn.database, "shop");
    assert_eq!(conn.port, 3307);
}

#[test]
fn test_run_opts_defaults() {
    let cli = parse(&[]);
    let batch = cli.run.batch_options();

    assert_eq!(batch.max_queries, 10);
    assert_eq!(batch.interval, Duration::from_secs(1));
    assert!(!batch.halt_on_error);
    assert!(!batch.dry_run);
    assert_eq!(cli.run.output, OutputFormat::Text);
    assert!(cli.run.seed.is_none());
    assert!(AllowedVerbs::new(&cli.run.verbs).contains("select"));
}

#[test]
fn test_run_opts_flags() {
    let cli = parse(&[
        "--verbs",
        "select",
        "update",
        "--max-queries",
        "50",
        "--interval",
        "250ms",
        "--stop",
        "--dry-run",
        "--seed",
        "7",
        "--output",
        "json",
    ]);
    let batch = cli.run.batch_options();

    assert_eq!(cli.run.verbs, vec!["select", "update"]);
    assert_eq!(batch.max_queries, 50);
    assert_eq!(batch.interval, Duration::from_millis(250));
    assert!(batch.halt_on_error);
    assert!(batch.dry_run);
    assert_eq!(cli.run.seed, Some(7));
    assert_eq!(cli.run.output, OutputFormat::Json);
}

#[test]
fn test_comma_separated_verbs() {
    let cli = parse(&["--verbs", "select,delete"]);
    let verbs = AllowedVerbs::new(&cli.run.verbs);
    assert!(verbs.contains("DELETE"));
    assert!(!verbs.contains("update"));
}

#[test]
fn test_invalid_interval_rejected() {
    for interval in ["soon", "-1", "1e20"] {
        let result = TestCli::try_parse_from(["qgen", "--interval", interval]);
        assert!(result.is_err(), "{interval} should be rejected");
    }
}

#[test]
fn test_load_template_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"select": {{"weight": 2, "queries": ["SELECT {{{{all}}}} FROM {{{{random_table}}}}"]}}}}"#
    )
    .unwrap();

    let doc = QueryTemplateDocument::from_file(file.path()).unwrap();
    let select = doc.verb("select").unwrap();
    assert_eq!(select.weight, 2);
    assert_eq!(select.templates[0].text(), "SELECT {{all}} FROM {{random_table}}");
}

#[test]
fn test_missing_template_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = QueryTemplateDocument::from_file(dir.path().join("missing.json"));
    assert!(matches!(result, Err(TemplateError::Io { .. })));
}

#[test]
fn test_shipped_sample_document() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data/queries.json");
    let doc = QueryTemplateDocument::from_file(path).unwrap();

    let update = doc.verb("update").unwrap();
    let placeholders = update.templates[0].placeholders();
    assert!(placeholders.contains(&Placeholder::AppropriateValue));
    assert!(placeholders.contains(&Placeholder::RandomValue));
    assert!(doc.verb("select").unwrap().weight > update.weight);
}
