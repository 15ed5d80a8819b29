//! Pseudo-random SQL workload generation.
//!
//! `qgen-core` picks statement templates by verb weight, fills their
//! placeholders from the live schema, runs them and reports timing.
//!
//! # Architecture
//!
//! ```text
//!   QueryTemplateDocument (JSON)        Database (trait)
//!              │                               │
//!              ▼                               ▼
//!   ┌────────────────────┐  discover  ┌─────────────────┐
//!   │   QueryGenerator   │◀──────────│     Schema      │
//!   │                    │            └─────────────────┘
//!   │  pick_query        │  selector: weighted verb, uniform template
//!   │  render            │  render:   placeholders ← schema + synth
//!   │  execute           │  executor: commit / rollback / halt
//!   └─────────┬──────────┘
//!             │ batch_run
//!             ▼
//!   BatchRun::next() → QueryRecord { last_executed, results_number, output, elapsed_time }
//! ```
//!
//! # Example
//!
//! ```rust
//! use qgen_core::testing::MemoryDatabase;
//! use qgen_core::{AllowedVerbs, BatchOptions, GeneratorOptions, QueryGenerator, QueryTemplateDocument, SqlValue};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let db = MemoryDatabase::new().with_table(
//!     "t",
//!     &[("id", "int", true), ("name", "varchar", false)],
//!     vec![vec![SqlValue::Int(1), SqlValue::from("ann")]],
//! );
//! let document = QueryTemplateDocument::from_json(
//!     r#"{"select": {"weight": 1, "queries": ["SELECT {{random_column}} FROM {{random_table}}"]}}"#,
//! ).unwrap();
//!
//! let mut generator = QueryGenerator::new(db, document, AllowedVerbs::default(), GeneratorOptions::default())
//!     .await
//!     .unwrap();
//! let mut run = generator.batch_run(BatchOptions { max_queries: 2, interval: Duration::ZERO, ..Default::default() });
//! while let Some(record) = run.next().await {
//!     let record = record.unwrap();
//!     println!("{} ({:?} ms)", record.last_executed, record.elapsed_time);
//! }
//! # });
//! ```

pub mod batch;
pub mod database;
pub mod error;
pub mod executor;
pub mod generator;
pub mod render;
pub mod schema;
pub mod selector;
pub mod synth;
pub mod template;
pub mod testing;
pub mod value;

pub use batch::{BatchOptions, BatchRun};
pub use database::Database;
pub use error::{DatabaseError, Error, Result, TemplateError};
pub use executor::{QueryOutput, QueryRecord};
pub use generator::{GeneratorOptions, QueryGenerator};
pub use render::{PlaceholderContext, DEFAULT_MAX_VALUE_ATTEMPTS};
pub use schema::{discover_schema, ColumnCategory, ColumnInfo, Schema, TableSchema};
pub use synth::ValueStrategy;
pub use template::{AllowedVerbs, Placeholder, QueryTemplateDocument, Template};
pub use value::{Row, SqlValue};
