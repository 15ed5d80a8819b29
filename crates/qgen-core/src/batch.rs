//! The batch loop: select, render, execute, report.

use crate::database::Database;
use crate::error::{Error, Result};
use crate::executor::QueryRecord;
use crate::generator::QueryGenerator;
use std::time::{Duration, Instant};
use tracing::{debug, info, Instrument};

/// Options for one batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    /// Number of statements to issue.
    pub max_queries: usize,
    /// Pause between consecutive statements.
    pub interval: Duration,
    /// End the batch at the first failing statement.
    pub halt_on_error: bool,
    /// Render statements without sending them.
    pub dry_run: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_queries: 10,
            interval: Duration::from_secs(1),
            halt_on_error: false,
            dry_run: false,
        }
    }
}

/// A lazy, finite sequence of [`QueryRecord`]s.
///
/// Work only happens inside [`BatchRun::next`]; dropping the run stops it.
pub struct BatchRun<'a, D> {
    generator: &'a mut QueryGenerator<D>,
    options: BatchOptions,
    issued: usize,
    started: Option<Instant>,
    finished: bool,
    halted: Option<Error>,
}

impl<'a, D: Database> BatchRun<'a, D> {
    pub(crate) fn new(generator: &'a mut QueryGenerator<D>, options: BatchOptions) -> Self {
        Self {
            generator,
            options,
            issued: 0,
            started: None,
            finished: false,
            halted: None,
        }
    }

    /// Produce the next record.
    ///
    /// Returns `None` once `max_queries` statements were issued, or after a
    /// statement failed with halt-on-error set (see [`BatchRun::halted`]).
    /// Any other error is returned once and ends the run.
    pub async fn next(&mut self) -> Option<Result<QueryRecord>> {
        if self.finished {
            return None;
        }
        if self.issued >= self.options.max_queries {
            self.finish();
            return None;
        }

        if self.issued > 0 && !self.options.interval.is_zero() {
            tokio::time::sleep(self.options.interval).await;
        }
        self.started.get_or_insert_with(Instant::now);
        self.issued += 1;

        let span = self.generator.span.clone();
        match self.step().instrument(span).await {
            Ok(record) => Some(Ok(record)),
            Err(err @ Error::StopRequested { .. }) => {
                self.finished = true;
                self.halted = Some(err);
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }

    /// The failure that halted the run, if any.
    pub fn halted(&self) -> Option<&Error> {
        self.halted.as_ref()
    }

    /// Statements issued so far, including a halting one.
    pub fn issued(&self) -> usize {
        self.issued
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    async fn step(&mut self) -> Result<QueryRecord> {
        let (verb, template) = self.generator.pick_query()?;
        let needs_commit = !verb.eq_ignore_ascii_case("select");
        let statement = self.generator.render(&template).await?;

        let record = if self.options.dry_run {
            debug!("NOT running query {} (dry-run mode)", statement);
            QueryRecord::dry_run(verb, statement)
        } else {
            self.generator
                .execute(&verb, &statement, needs_commit, self.options.halt_on_error)
                .await?
        };

        info!(
            "Query: {}; Results number: {}; Elapsed time: {} ms",
            record.last_executed,
            display_opt(record.results_number),
            display_opt(record.elapsed_time)
        );
        Ok(record)
    }

    fn finish(&mut self) {
        self.finished = true;
        if let Some(started) = self.started {
            let total = started.elapsed().as_secs_f64();
            self.generator
                .span
                .in_scope(|| info!("Total time elapsed: {:.2} s", total));
        }
    }
}

fn display_opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorOptions;
    use crate::template::{AllowedVerbs, QueryTemplateDocument};
    use crate::testing::MemoryDatabase;
    use crate::value::SqlValue;

    fn db() -> MemoryDatabase {
        MemoryDatabase::new().with_table(
            "t",
            &[("id", "int", true), ("name", "varchar", false)],
            vec![vec![SqlValue::Int(1), SqlValue::from("ann")]],
        )
    }

    async fn generator(
        db: MemoryDatabase,
        json: &str,
        verbs: &[&str],
    ) -> QueryGenerator<MemoryDatabase> {
        QueryGenerator::new(
            db,
            QueryTemplateDocument::from_json(json).unwrap(),
            AllowedVerbs::new(verbs.iter().copied()),
            GeneratorOptions {
                seed: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    fn options(max_queries: usize) -> BatchOptions {
        BatchOptions {
            max_queries,
            interval: Duration::ZERO,
            ..Default::default()
        }
    }

    const SELECT_DOC: &str =
        r#"{"select": {"weight": 1, "queries": ["SELECT {{random_column}} FROM {{random_table}}"]}}"#;

    #[tokio::test]
    async fn test_runs_exactly_max_queries() {
        let mut generator = generator(db(), SELECT_DOC, &["select"]).await;
        let mut run = generator.batch_run(options(5));

        let mut records = Vec::new();
        while let Some(record) = run.next().await {
            records.push(record.unwrap());
        }
        assert_eq!(records.len(), 5);
        assert!(records.iter().all(|r| r.results_number == Some(1)));
        assert!(run.halted().is_none());
        assert!(run.is_finished());
        assert!(run.next().await.is_none());
    }

    #[tokio::test]
    async fn test_dry_run_never_executes() {
        let mut generator = generator(db(), SELECT_DOC, &["select"]).await;
        let after_discovery = generator.database().statements().len();

        let mut run = generator.batch_run(BatchOptions {
            dry_run: true,
            ..options(3)
        });
        let mut count = 0;
        while let Some(record) = run.next().await {
            let record = record.unwrap();
            assert!(record.last_executed.starts_with("SELECT "));
            assert!(record.last_executed.ends_with(" FROM t"));
            assert_eq!(record.results_number, None);
            assert_eq!(record.elapsed_time, None);
            count += 1;
        }
        assert_eq!(count, 3);
        assert_eq!(generator.database().statements().len(), after_discovery);
    }

    #[tokio::test]
    async fn test_dry_run_only_reads_random_values() {
        let doc = r#"{"delete": {"weight": 1, "queries": ["DELETE FROM {{random_table}} WHERE {{random_column}} = '{{random_value}}'"]}}"#;
        let mut generator = generator(db(), doc, &["delete"]).await;
        let after_discovery = generator.database().statements().len();

        let mut run = generator.batch_run(BatchOptions {
            dry_run: true,
            ..options(3)
        });
        while let Some(record) = run.next().await {
            let record = record.unwrap();
            assert!(record.last_executed.starts_with("DELETE FROM t WHERE "));
            assert_eq!(record.results_number, None);
        }

        let db = generator.database();
        let issued = &db.statements()[after_discovery..];
        assert_eq!(issued.len(), 3);
        assert!(issued
            .iter()
            .all(|s| s.starts_with("SELECT ") && s.ends_with("ORDER BY RAND() LIMIT 1")));
        assert_eq!(db.commits(), 0);
        assert_eq!(db.rollbacks(), 0);
    }

    #[tokio::test]
    async fn test_failed_value_lookup_does_not_end_run() {
        let db = MemoryDatabase::new()
            .with_table("bad", &[("id", "int", true)], vec![vec![SqlValue::Int(3)]])
            .with_table("t", &[("id", "int", true)], vec![vec![SqlValue::Int(7)]])
            .fail_on("FROM `bad`");
        let doc = r#"{"select": {"weight": 1, "queries": ["SELECT {{all}} FROM {{random_table}} WHERE {{random_column}} = {{random_value}}"]}}"#;
        let mut generator = generator(db, doc, &["select"]).await;

        let mut run = generator.batch_run(options(20));
        let mut count = 0;
        while let Some(record) = run.next().await {
            let record = record.unwrap();
            assert_eq!(record.last_executed, "SELECT * FROM t WHERE id = 7");
            assert!(!record.is_failure());
            count += 1;
        }
        assert_eq!(count, 20);
        assert!(run.halted().is_none());
        assert!(generator.database().rollbacks() > 0);
    }

    #[tokio::test]
    async fn test_halt_on_error_stops_immediately() {
        let doc = r#"{"update": {"weight": 1, "queries": ["UPDATE {{random_table}} SET broken = 1"]}}"#;
        let mut generator = generator(db().fail_on("broken"), doc, &["update"]).await;

        let mut run = generator.batch_run(BatchOptions {
            halt_on_error: true,
            ..options(5)
        });
        assert!(run.next().await.is_none());
        assert!(run.next().await.is_none());
        assert_eq!(run.issued(), 1);
        match run.halted() {
            Some(Error::StopRequested { statement, .. }) => {
                assert_eq!(statement, "UPDATE t SET broken = 1")
            }
            other => panic!("expected halt, got {other:?}"),
        }
        assert_eq!(generator.database().rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_failures_absorbed_without_halt() {
        let doc = r#"{"delete": {"weight": 1, "queries": ["DELETE FROM {{random_table}} WHERE broken"]}}"#;
        let mut generator = generator(db().fail_on("broken"), doc, &["delete"]).await;

        let mut run = generator.batch_run(options(3));
        let mut count = 0;
        while let Some(record) = run.next().await {
            let record = record.unwrap();
            assert_eq!(record.results_number, Some(0));
            assert!(record.is_failure());
            count += 1;
        }
        assert_eq!(count, 3);
        assert_eq!(generator.database().rollbacks(), 3);
    }

    #[tokio::test]
    async fn test_writes_commit() {
        let doc = r#"{"UPDATE": {"weight": 1, "queries": ["UPDATE {{random_table}} SET {{second_random_column}} = '{{appropriate_value}}'"]}}"#;
        let mut generator = generator(db(), doc, &["update"]).await;

        let mut run = generator.batch_run(options(2));
        while let Some(record) = run.next().await {
            assert_eq!(record.unwrap().output, crate::executor::QueryOutput::Committed);
        }
        assert_eq!(generator.database().commits(), 2);
    }

    #[tokio::test]
    async fn test_no_allowed_queries_ends_run() {
        let mut generator = generator(db(), SELECT_DOC, &["delete"]).await;
        let mut run = generator.batch_run(options(3));

        assert!(matches!(run.next().await, Some(Err(Error::NoAllowedQueries))));
        assert!(run.next().await.is_none());
    }

    #[tokio::test]
    async fn test_abandoned_run_does_no_more_work() {
        let mut generator = generator(db(), SELECT_DOC, &["select"]).await;
        let before = generator.database().statements().len();
        {
            let mut run = generator.batch_run(options(100));
            run.next().await.unwrap().unwrap();
        }
        assert_eq!(generator.database().statements().len(), before + 1);
    }

    #[tokio::test]
    async fn test_interval_paces_statements() {
        let mut generator = generator(db(), SELECT_DOC, &["select"]).await;
        let mut run = generator.batch_run(BatchOptions {
            interval: Duration::from_millis(20),
            ..options(3)
        });

        let start = Instant::now();
        while let Some(record) = run.next().await {
            record.unwrap();
        }
        // Two pauses between three statements.
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_each_run_starts_fresh() {
        let mut generator = generator(db(), SELECT_DOC, &["select"]).await;
        for _ in 0..2 {
            let mut run = generator.batch_run(options(2));
            let mut count = 0;
            while let Some(record) = run.next().await {
                record.unwrap();
                count += 1;
            }
            assert_eq!(count, 2);
        }
    }
}
