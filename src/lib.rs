//! qgen
//!
//! A pseudo-random workload generator for MySQL: it picks statement templates
//! by verb weight, fills them from the live schema, runs them and reports
//! timing per statement.
//!
//! # Crates
//!
//! - `qgen_core` - schema discovery, template selection and rendering,
//!   statement execution and the batch loop
//! - `qgen_mysql` - the `mysql_async` backend
//!
//! # CLI Usage
//!
//! ```bash
//! # 10 SELECTs, one per second, against the employees database
//! qgen --host localhost --username employees --password secret --dbname employees \
//!   --queries data/queries.json
//!
//! # Mixed workload, stop at the first failing statement
//! qgen --verbs select,update,delete --max-queries 1000 --interval 50ms --stop
//!
//! # Render only
//! qgen --dry-run --output json
//! ```

use clap::{Args, ValueEnum};
use qgen_core::{BatchOptions, DEFAULT_MAX_VALUE_ATTEMPTS};
use qgen_mysql::ConnectionOpts;
use std::path::PathBuf;
use std::time::Duration;

pub mod config;
pub mod summary;

pub use summary::RunSummary;

/// Database connection options
#[derive(Args, Clone, Debug)]
pub struct DatabaseOpts {
    /// The database host
    #[arg(long, default_value = "localhost", env = "QGEN_DB_HOST")]
    pub host: String,

    /// The database port
    #[arg(long, default_value_t = qgen_mysql::DEFAULT_PORT, env = "QGEN_DB_PORT")]
    pub port: u16,

    /// The database username
    #[arg(long, default_value = "employees", env = "QGEN_DB_USER")]
    pub username: String,

    /// The database password
    #[arg(long, default_value = "password", env = "QGEN_DB_PASS", hide_env_values = true)]
    pub password: String,

    /// The database name (defaults to the username)
    #[arg(long, env = "QGEN_DB_NAME")]
    pub dbname: Option<String>,
}

impl From<&DatabaseOpts> for ConnectionOpts {
    fn from(opts: &DatabaseOpts) -> Self {
        Self {
            host: opts.host.clone(),
            port: opts.port,
            username: opts.username.clone(),
            password: opts.password.clone(),
            database: opts
                .dbname
                .clone()
                .unwrap_or_else(|| opts.username.clone()),
        }
    }
}

/// How records are written to stdout
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Statement text followed by elapsed milliseconds
    Text,
    /// One JSON object per record
    Json,
}

/// Batch run options
#[derive(Args, Clone, Debug)]
pub struct RunOpts {
    /// The queries template file
    #[arg(long, default_value = "data/queries.json", env = "QGEN_TEMPLATE_FILE")]
    pub queries: PathBuf,

    /// Allowed verbs like select, update, delete (space or comma separated, default: select)
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub verbs: Vec<String>,

    /// Number of queries to run before stopping
    #[arg(long, default_value_t = 10)]
    pub max_queries: usize,

    /// Pause between queries: plain seconds ("0.5") or with units ("250ms", "2s", "1m")
    #[arg(long, default_value = "1s", value_parser = config::parse_interval)]
    pub interval: Duration,

    /// Do not really execute queries
    #[arg(long)]
    pub dry_run: bool,

    /// Stop immediately on query error
    #[arg(long)]
    pub stop: bool,

    /// Random seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maximum lookups when resolving a random existing value
    #[arg(long, default_value_t = DEFAULT_MAX_VALUE_ATTEMPTS)]
    pub max_value_attempts: usize,

    /// Output format for records
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

impl RunOpts {
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            max_queries: self.max_queries,
            interval: self.interval,
            halt_on_error: self.stop,
            dry_run: self.dry_run,
        }
    }
}
