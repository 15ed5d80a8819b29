//! The database seam used by every engine component.

use crate::error::DatabaseError;
use crate::value::Row;
use async_trait::async_trait;

/// A single exclusively-owned database session.
///
/// Implementations keep one transaction open between `commit`/`rollback`
/// calls (autocommit off).
#[async_trait]
pub trait Database: Send {
    /// Run a statement and return every row of its result set.
    ///
    /// Statements without a result set return an empty vector.
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>, DatabaseError>;

    /// Commit the current transaction.
    async fn commit(&mut self) -> Result<(), DatabaseError>;

    /// Roll back the current transaction.
    async fn rollback(&mut self) -> Result<(), DatabaseError>;
}

#[async_trait]
impl<D: Database + ?Sized> Database for Box<D> {
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>, DatabaseError> {
        (**self).query(sql).await
    }

    async fn commit(&mut self) -> Result<(), DatabaseError> {
        (**self).commit().await
    }

    async fn rollback(&mut self) -> Result<(), DatabaseError> {
        (**self).rollback().await
    }
}
