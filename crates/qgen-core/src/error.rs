//! Error types for the query generator.

use thiserror::Error;

/// Errors reported by a [`Database`](crate::Database) implementation.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error raised by the underlying driver.
    #[error(transparent)]
    Driver(Box<dyn std::error::Error + Send + Sync + 'static>),

    /// Error described by a plain message.
    #[error("{0}")]
    Message(String),
}

impl DatabaseError {
    /// Wrap a driver error.
    pub fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DatabaseError::Driver(Box::new(err))
    }

    pub fn message(msg: impl Into<String>) -> Self {
        DatabaseError::Message(msg.into())
    }
}

/// Errors raised while parsing or validating a query template document.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Invalid template document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot read template document {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Verb '{0}' must have a positive weight")]
    ZeroWeight(String),

    #[error("Verb '{0}' has no queries")]
    NoQueries(String),

    #[error("Unknown placeholder '{name}' in template: {template}")]
    UnknownPlaceholder { name: String, template: String },

    #[error("Unclosed placeholder in template: {0}")]
    Unclosed(String),
}

/// Errors raised by the query generator.
#[derive(Error, Debug)]
pub enum Error {
    /// The database connection could not be established.
    #[error("Cannot connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: DatabaseError,
    },

    /// A catalog query failed during schema discovery.
    #[error("Cannot get db schema, query '{query}' failed: {source}")]
    SchemaDiscovery {
        query: String,
        #[source]
        source: DatabaseError,
    },

    /// A catalog query returned a row in an unexpected shape.
    #[error("Malformed catalog row: {0}")]
    MalformedCatalog(String),

    /// None of the document verbs is in the allowed verb set.
    #[error("No allowed queries: none of the template verbs is in the allowed verb set")]
    NoAllowedQueries,

    /// The drawn verb has no generator support.
    #[error("Verb '{0}' is not supported")]
    UnsupportedVerb(String),

    /// A statement failed and could not be rolled back.
    #[error("Cannot run query {statement}: {source}")]
    StatementExecution {
        statement: String,
        #[source]
        source: DatabaseError,
    },

    /// A statement failed while halt-on-error was requested.
    #[error("Stopping on error as requested, query {statement} failed: {source}")]
    StopRequested {
        statement: String,
        #[source]
        source: DatabaseError,
    },

    /// No non-empty random value was found within the attempt budget.
    #[error("No non-empty random value found after {attempts} attempts")]
    DataExhausted { attempts: usize },

    /// A template needs a table or column but the schema has none.
    #[error("Schema has no tables to pick from")]
    EmptySchema,

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Result alias for generator operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
