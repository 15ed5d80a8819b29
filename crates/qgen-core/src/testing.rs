//! In-memory [`Database`] for tests.
//!
//! `MemoryDatabase` understands just enough SQL to drive the engine:
//!
//! - the catalog queries issued by [`discover_schema`](crate::discover_schema)
//! - the random-value lookup from [`random_value_query`]
//! - `SELECT ... FROM <table> ...`, answered with every row of the table
//!
//! Anything else succeeds with an empty result. Every statement is recorded,
//! and statements containing a configured pattern fail. Rollbacks can be made
//! to fail as well.

use crate::database::Database;
use crate::error::DatabaseError;
use crate::schema::{columns_query, TABLES_QUERY};
use crate::synth::random_value_query;
use crate::value::{Row, SqlValue};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct MemoryColumn {
    name: String,
    data_type: String,
    primary: bool,
}

#[derive(Debug, Clone, Default)]
struct MemoryTable {
    columns: Vec<MemoryColumn>,
    rows: Vec<Vec<SqlValue>>,
}

impl MemoryTable {
    fn to_row(&self, values: &[SqlValue]) -> Row {
        Row::new(
            self.columns
                .iter()
                .zip(values)
                .map(|(c, v)| (c.name.clone(), v.clone()))
                .collect(),
        )
    }
}

#[derive(Debug)]
pub struct MemoryDatabase {
    tables: BTreeMap<String, MemoryTable>,
    failures: Vec<String>,
    rollback_fails: bool,
    statements: Vec<String>,
    commits: usize,
    rollbacks: usize,
    rng: StdRng,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
            failures: Vec::new(),
            rollback_fails: false,
            statements: Vec::new(),
            commits: 0,
            rollbacks: 0,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Add a table. `columns` are `(name, data_type, is_primary)`.
    pub fn with_table(
        mut self,
        name: &str,
        columns: &[(&str, &str, bool)],
        rows: Vec<Vec<SqlValue>>,
    ) -> Self {
        let columns = columns
            .iter()
            .map(|(name, data_type, primary)| MemoryColumn {
                name: name.to_string(),
                data_type: data_type.to_string(),
                primary: *primary,
            })
            .collect();
        self.tables
            .insert(name.to_string(), MemoryTable { columns, rows });
        self
    }

    /// Fail every statement containing `pattern`.
    pub fn fail_on(mut self, pattern: &str) -> Self {
        self.failures.push(pattern.to_string());
        self
    }

    /// Make every rollback fail, as on a dropped connection.
    pub fn fail_rollbacks(mut self) -> Self {
        self.rollback_fails = true;
        self
    }

    /// Every statement received, in order.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks
    }

    fn catalog_rows(&mut self, sql: &str) -> Option<Vec<Row>> {
        if sql == TABLES_QUERY {
            return Some(
                self.tables
                    .keys()
                    .map(|name| {
                        Row::new(vec![("TABLE_NAME".to_string(), SqlValue::from(name.as_str()))])
                    })
                    .collect(),
            );
        }

        for (name, table) in &self.tables {
            if sql == columns_query(name) {
                return Some(
                    table
                        .columns
                        .iter()
                        .map(|c| {
                            Row::new(vec![
                                ("COLUMN_NAME".to_string(), SqlValue::from(c.name.as_str())),
                                ("DATA_TYPE".to_string(), SqlValue::from(c.data_type.as_str())),
                                (
                                    "COLUMN_KEY".to_string(),
                                    SqlValue::from(if c.primary { "PRI" } else { "" }),
                                ),
                            ])
                        })
                        .collect(),
                );
            }
        }

        let mut lookup = None;
        for (name, table) in &self.tables {
            for (index, column) in table.columns.iter().enumerate() {
                if sql == random_value_query(name, &column.name) {
                    lookup = Some((name.clone(), index));
                }
            }
        }
        let (name, index) = lookup?;
        let table = &self.tables[&name];
        if table.rows.is_empty() {
            return Some(Vec::new());
        }
        let row = &table.rows[self.rng.random_range(0..table.rows.len())];
        let column = &table.columns[index];
        let value = row.get(index).cloned().unwrap_or(SqlValue::Null);
        Some(vec![Row::new(vec![(column.name.clone(), value)])])
    }

    fn select_rows(&self, sql: &str) -> Option<Vec<Row>> {
        let upper = sql.to_ascii_uppercase();
        if !upper.trim_start().starts_with("SELECT ") {
            return None;
        }
        let from = upper.find(" FROM ")?;
        let name = sql[from + 6..]
            .split_whitespace()
            .next()?
            .trim_end_matches(';')
            .trim_matches('`');
        let table = self.tables.get(name)?;
        Some(table.rows.iter().map(|r| table.to_row(r)).collect())
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>, DatabaseError> {
        self.statements.push(sql.to_string());

        if self.failures.iter().any(|p| sql.contains(p.as_str())) {
            return Err(DatabaseError::message(format!("simulated failure: {sql}")));
        }
        if let Some(rows) = self.catalog_rows(sql) {
            return Ok(rows);
        }
        Ok(self.select_rows(sql).unwrap_or_default())
    }

    async fn commit(&mut self) -> Result<(), DatabaseError> {
        self.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DatabaseError> {
        if self.rollback_fails {
            return Err(DatabaseError::message("simulated rollback failure"));
        }
        self.rollbacks += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_select_returns_table_rows() {
        let mut db = MemoryDatabase::new().with_table(
            "t",
            &[("id", "int", true)],
            vec![vec![SqlValue::Int(1)], vec![SqlValue::Int(2)]],
        );

        let rows = db.query("SELECT id FROM `t` WHERE id > 0").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("id"), Some(&SqlValue::Int(2)));

        let rows = db.query("UPDATE t SET id = 3").await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(db.statements().len(), 2);
    }

    #[tokio::test]
    async fn test_fail_on_pattern() {
        let mut db = MemoryDatabase::new().fail_on("DROP");
        assert!(db.query("DROP TABLE t").await.is_err());
        assert!(db.query("SELECT 1").await.is_ok());
        db.rollback().await.unwrap();
        assert_eq!(db.rollbacks(), 1);
        assert_eq!(db.commits(), 0);
    }
}
