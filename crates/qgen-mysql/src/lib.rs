//! MySQL backend for qgen.
//!
//! Provides [`MySqlDatabase`], the `mysql_async` implementation of
//! [`qgen_core::Database`], and [`connect_generator`] which connects and
//! discovers the schema in one step.

mod client;
pub mod convert;
pub mod testing;

pub use client::MySqlDatabase;

use qgen_core::{AllowedVerbs, GeneratorOptions, QueryGenerator, QueryTemplateDocument};
use std::fmt;

/// Default MySQL port.
pub const DEFAULT_PORT: u16 = 3306;

/// MySQL connection options
#[derive(Clone)]
pub struct ConnectionOpts {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl ConnectionOpts {
    /// `user@host:port/database`, safe for logs.
    pub fn target(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.username, self.host, self.port, self.database
        )
    }
}

impl fmt::Debug for ConnectionOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOpts")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// Connect to MySQL and build a generator over the discovered schema.
pub async fn connect_generator(
    opts: &ConnectionOpts,
    document: QueryTemplateDocument,
    allowed_verbs: AllowedVerbs,
    options: GeneratorOptions,
) -> qgen_core::Result<QueryGenerator<MySqlDatabase>> {
    let db = MySqlDatabase::connect(opts).await?;
    QueryGenerator::new(db, document, allowed_verbs, options).await
}
