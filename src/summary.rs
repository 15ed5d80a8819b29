//! Aggregate statistics over a batch run.

use qgen_core::{QueryOutput, QueryRecord};
use std::fmt;
use std::time::Duration;

/// Totals computed by the caller from the records of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub records: usize,
    pub failures: usize,
    pub committed: usize,
    pub not_executed: usize,
    pub rows_returned: usize,
    /// Sum of per-statement elapsed times, in milliseconds.
    pub statement_time_ms: f64,
    pub wall_time: Duration,
}

impl RunSummary {
    pub fn record(&mut self, record: &QueryRecord) {
        self.records += 1;
        if record.is_failure() {
            self.failures += 1;
        }
        match &record.output {
            QueryOutput::Rows(rows) => self.rows_returned += rows.len(),
            QueryOutput::Committed => self.committed += 1,
            QueryOutput::NotExecuted => self.not_executed += 1,
            QueryOutput::Empty => {}
        }
        self.statement_time_ms += record.elapsed_time.unwrap_or_default();
    }

    /// Mean statement time in milliseconds over executed statements.
    pub fn mean_statement_time_ms(&self) -> Option<f64> {
        let executed = self.records - self.not_executed;
        (executed > 0).then(|| self.statement_time_ms / executed as f64)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} queries ({} failed, {} committed, {} not executed), {} rows returned, \
             {:.2} ms in statements, total time elapsed: {:.2} s",
            self.records,
            self.failures,
            self.committed,
            self.not_executed,
            self.rows_returned,
            self.statement_time_ms,
            self.wall_time.as_secs_f64()
        )
    }
}
