//! MySQL connection implementing the generator's `Database` trait.

use crate::convert::mysql_row_to_row;
use crate::ConnectionOpts;
use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, OptsBuilder};
use qgen_core::{Database, DatabaseError, Error, Row};
use tracing::{debug, info};

/// A single MySQL session with autocommit disabled.
pub struct MySqlDatabase {
    conn: Conn,
}

impl MySqlDatabase {
    /// Connect and disable autocommit so every statement runs in a transaction
    /// that the generator commits or rolls back.
    pub async fn connect(opts: &ConnectionOpts) -> Result<Self, Error> {
        let target = opts.target();
        info!("Connecting to {}", target);

        let builder = OptsBuilder::default()
            .ip_or_hostname(opts.host.clone())
            .tcp_port(opts.port)
            .user(Some(opts.username.clone()))
            .pass(Some(opts.password.clone()))
            .db_name(Some(opts.database.clone()));

        let connection_error = |e: mysql_async::Error| Error::Connection {
            target: target.clone(),
            source: DatabaseError::driver(e),
        };

        let mut conn = Conn::new(builder).await.map_err(connection_error)?;
        conn.query_drop("SET autocommit = 0")
            .await
            .map_err(connection_error)?;
        debug!("Autocommit disabled for {}", target);

        Ok(Self { conn })
    }

    /// Close the connection, rolling back anything uncommitted.
    pub async fn disconnect(self) -> Result<(), DatabaseError> {
        self.conn.disconnect().await.map_err(DatabaseError::driver)
    }
}

#[async_trait]
impl Database for MySqlDatabase {
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>, DatabaseError> {
        let rows: Vec<mysql_async::Row> =
            self.conn.query(sql).await.map_err(DatabaseError::driver)?;
        Ok(rows.into_iter().map(mysql_row_to_row).collect())
    }

    async fn commit(&mut self) -> Result<(), DatabaseError> {
        self.conn
            .query_drop("COMMIT")
            .await
            .map_err(DatabaseError::driver)
    }

    async fn rollback(&mut self) -> Result<(), DatabaseError> {
        self.conn
            .query_drop("ROLLBACK")
            .await
            .map_err(DatabaseError::driver)
    }
}
