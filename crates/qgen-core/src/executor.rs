//! Statement execution with commit/rollback and halt-on-error policy.

use crate::database::Database;
use crate::error::{DatabaseError, Error, Result};
use crate::value::Row;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, error, warn};

/// What a statement produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOutput {
    /// Rendered only (dry run).
    NotExecuted,
    /// Rows fetched by a read statement.
    Rows(Vec<Row>),
    /// A write statement was committed.
    Committed,
    /// The statement failed and was rolled back.
    Empty,
}

/// Per-statement result handed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRecord {
    pub verb: String,
    /// Statement text as sent to the server.
    pub last_executed: String,
    pub results_number: Option<usize>,
    pub output: QueryOutput,
    /// Wall-clock milliseconds, rounded to 2 decimals.
    pub elapsed_time: Option<f64>,
    /// Database error message when the statement failed.
    pub error: Option<String>,
}

impl QueryRecord {
    /// Record for a statement that was rendered but not sent.
    pub fn dry_run(verb: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            last_executed: statement.into(),
            results_number: None,
            output: QueryOutput::NotExecuted,
            elapsed_time: None,
            error: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Round a duration in milliseconds to 2 decimals.
pub fn round_millis(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}

/// Run `statement`, then commit it or fetch its rows.
///
/// On failure the transaction is rolled back. With `halt_on_error` the
/// failure is returned as [`Error::StopRequested`]; otherwise a record with
/// zero results and the error message is returned.
pub async fn execute<D: Database + ?Sized>(
    db: &mut D,
    verb: &str,
    statement: &str,
    needs_commit: bool,
    halt_on_error: bool,
) -> Result<QueryRecord> {
    debug!("Running query {}, needs_commit: {}", statement, needs_commit);
    let start = Instant::now();
    let outcome = run_statement(db, statement, needs_commit).await;

    let (results_number, output, failure) = match outcome {
        Ok(output) => {
            let count = match &output {
                QueryOutput::Rows(rows) => rows.len(),
                _ => 0,
            };
            (count, output, None)
        }
        Err(source) => {
            warn!("Cannot run query {}: {}, trying rollback ...", statement, source);
            match db.rollback().await {
                Ok(()) => warn!("Query {} rolled back!", statement),
                Err(e) => error!("Rollback of query {} failed: {}", statement, e),
            }
            (0, QueryOutput::Empty, Some(source))
        }
    };
    let elapsed_time = round_millis(start.elapsed().as_secs_f64() * 1000.0);

    let error_message = match failure {
        Some(source) if halt_on_error => {
            error!("Stopping on error as requested");
            return Err(Error::StopRequested {
                statement: statement.to_string(),
                source,
            });
        }
        Some(source) => Some(source.to_string()),
        None => None,
    };

    Ok(QueryRecord {
        verb: verb.to_string(),
        last_executed: statement.to_string(),
        results_number: Some(results_number),
        output,
        elapsed_time: Some(elapsed_time),
        error: error_message,
    })
}

async fn run_statement<D: Database + ?Sized>(
    db: &mut D,
    statement: &str,
    needs_commit: bool,
) -> Result<QueryOutput, DatabaseError> {
    let rows = db.query(statement).await?;
    if needs_commit {
        db.commit().await?;
        debug!("Query {} committed", statement);
        Ok(QueryOutput::Committed)
    } else {
        debug!("Query output: {} rows", rows.len());
        Ok(QueryOutput::Rows(rows))
    }
}
