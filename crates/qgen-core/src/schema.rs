//! Schema discovery and column type categorization.
//!
//! The schema is read once from the live database catalog
//! (`information_schema`) and drives both random table/column picks and
//! type-aware value synthesis.

use crate::database::Database;
use crate::error::{Error, Result};
use crate::value::Row;
use rand::seq::IteratorRandom;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Lists the base tables of the current database.
pub const TABLES_QUERY: &str = "SELECT TABLE_NAME FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE' ORDER BY TABLE_NAME";

/// Column metadata query for one table of the current database.
pub fn columns_query(table: &str) -> String {
    format!(
        "SELECT COLUMN_NAME, DATA_TYPE, COLUMN_KEY FROM information_schema.COLUMNS \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = '{}' ORDER BY ORDINAL_POSITION",
        escape_string_literal(table)
    )
}

fn escape_string_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "''")
}

/// Declared column type, reduced to the categories value synthesis cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnCategory {
    Integer,
    Decimal,
    String,
    Temporal,
    Enumerated,
    Set,
    Unknown,
}

impl ColumnCategory {
    pub const ALL: [ColumnCategory; 7] = [
        ColumnCategory::Integer,
        ColumnCategory::Decimal,
        ColumnCategory::String,
        ColumnCategory::Temporal,
        ColumnCategory::Enumerated,
        ColumnCategory::Set,
        ColumnCategory::Unknown,
    ];

    /// Categorize an `information_schema.COLUMNS.DATA_TYPE` value.
    pub fn from_data_type(data_type: &str) -> Self {
        match data_type.trim().to_lowercase().as_str() {
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "bool"
            | "boolean" | "bit" => ColumnCategory::Integer,
            "decimal" | "numeric" | "float" | "double" | "real" => ColumnCategory::Decimal,
            "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" => {
                ColumnCategory::String
            }
            "date" | "datetime" | "timestamp" | "time" | "year" => ColumnCategory::Temporal,
            "enum" => ColumnCategory::Enumerated,
            "set" => ColumnCategory::Set,
            _ => ColumnCategory::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    /// Raw declared type as reported by the catalog.
    pub data_type: String,
    pub category: ColumnCategory,
    pub is_primary: bool,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, is_primary: bool) -> Self {
        let data_type = data_type.into();
        Self {
            name: name.into(),
            category: ColumnCategory::from_data_type(&data_type),
            data_type,
            is_primary,
        }
    }
}

/// A table with at least one column.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    name: String,
    columns: Vec<ColumnInfo>,
}

impl TableSchema {
    /// Returns `None` when `columns` is empty.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnInfo>) -> Option<Self> {
        if columns.is_empty() {
            return None;
        }
        Some(Self {
            name: name.into(),
            columns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in ordinal order.
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| c.is_primary)
    }

    /// Uniformly pick one column.
    pub fn random_column<R: Rng>(&self, rng: &mut R) -> &ColumnInfo {
        // Non-empty by construction.
        let index = rng.random_range(0..self.columns.len());
        &self.columns[index]
    }
}

/// Mapping from table name to its column metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    tables: BTreeMap<String, TableSchema>,
}

impl Schema {
    pub fn new(tables: impl IntoIterator<Item = TableSchema>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|t| (t.name.clone(), t))
                .collect(),
        }
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&ColumnInfo> {
        self.table(table).and_then(|t| t.column(column))
    }

    /// Tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Uniformly pick one table, `None` for an empty schema.
    pub fn random_table<R: Rng>(&self, rng: &mut R) -> Option<&TableSchema> {
        self.tables.values().choose(rng)
    }
}

/// Read table and column metadata from the live database.
///
/// Runs one table-listing query and one column query per table. Tables whose
/// column query returns nothing are skipped.
pub async fn discover_schema<D: Database + ?Sized>(db: &mut D) -> Result<Schema> {
    let rows = catalog_query(db, TABLES_QUERY).await?;
    let mut table_names = Vec::with_capacity(rows.len());
    for row in &rows {
        table_names.push(text_cell(row, 0, "TABLE_NAME")?.to_string());
    }
    debug!("Found {} tables", table_names.len());

    let mut tables = Vec::with_capacity(table_names.len());
    for table_name in table_names {
        let rows = catalog_query(db, &columns_query(&table_name)).await?;
        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name = text_cell(row, 0, "COLUMN_NAME")?;
            let data_type = text_cell(row, 1, "DATA_TYPE")?;
            let key = row.value(2).and_then(|v| v.as_str()).unwrap_or_default();
            columns.push(ColumnInfo::new(name, data_type, key == "PRI"));
        }

        match TableSchema::new(table_name.clone(), columns) {
            Some(table) => {
                debug!(
                    table = %table_name,
                    columns = table.columns().len(),
                    "Discovered table"
                );
                tables.push(table);
            }
            None => warn!("Table {} has no columns, skipping it", table_name),
        }
    }

    Ok(Schema::new(tables))
}

async fn catalog_query<D: Database + ?Sized>(db: &mut D, query: &str) -> Result<Vec<Row>> {
    db.query(query)
        .await
        .map_err(|source| Error::SchemaDiscovery {
            query: query.to_string(),
            source,
        })
}

fn text_cell<'a>(row: &'a Row, index: usize, what: &str) -> Result<&'a str> {
    row.value(index)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::MalformedCatalog(format!("missing {what} in {row:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryDatabase;
    use crate::value::SqlValue;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_category_mapping() {
        assert_eq!(ColumnCategory::from_data_type("int"), ColumnCategory::Integer);
        assert_eq!(ColumnCategory::from_data_type("TINYINT"), ColumnCategory::Integer);
        assert_eq!(ColumnCategory::from_data_type("bigint"), ColumnCategory::Integer);
        assert_eq!(ColumnCategory::from_data_type("decimal"), ColumnCategory::Decimal);
        assert_eq!(ColumnCategory::from_data_type("double"), ColumnCategory::Decimal);
        assert_eq!(ColumnCategory::from_data_type("varchar"), ColumnCategory::String);
        assert_eq!(ColumnCategory::from_data_type("longtext"), ColumnCategory::String);
        assert_eq!(ColumnCategory::from_data_type("datetime"), ColumnCategory::Temporal);
        assert_eq!(ColumnCategory::from_data_type("date"), ColumnCategory::Temporal);
        assert_eq!(ColumnCategory::from_data_type("enum"), ColumnCategory::Enumerated);
        assert_eq!(ColumnCategory::from_data_type("set"), ColumnCategory::Set);
        assert_eq!(ColumnCategory::from_data_type("geometry"), ColumnCategory::Unknown);
        assert_eq!(ColumnCategory::from_data_type("blob"), ColumnCategory::Unknown);
    }

    #[test]
    fn test_columns_query_escapes_table_name() {
        let q = columns_query("o'brien");
        assert!(q.contains("TABLE_NAME = 'o''brien'"));
    }

    #[test]
    fn test_table_requires_columns() {
        assert!(TableSchema::new("empty", Vec::new()).is_none());
        let t = TableSchema::new("t", vec![ColumnInfo::new("id", "int", true)]).unwrap();
        assert_eq!(t.primary_key().count(), 1);
    }

    #[test]
    fn test_random_picks_cover_schema() {
        let schema = Schema::new(vec![
            TableSchema::new(
                "a",
                vec![
                    ColumnInfo::new("x", "int", true),
                    ColumnInfo::new("y", "varchar", false),
                ],
            )
            .unwrap(),
            TableSchema::new("b", vec![ColumnInfo::new("z", "date", false)]).unwrap(),
        ]);
        let mut rng = StdRng::seed_from_u64(7);

        let mut seen = HashSet::new();
        for _ in 0..200 {
            let table = schema.random_table(&mut rng).unwrap();
            let column = table.random_column(&mut rng);
            seen.insert((table.name().to_string(), column.name.clone()));
        }
        assert_eq!(seen.len(), 3);
        assert!(Schema::default().random_table(&mut rng).is_none());
    }

    #[tokio::test]
    async fn test_discover_schema() {
        let mut db = MemoryDatabase::new()
            .with_table(
                "t",
                &[("id", "int", true), ("name", "varchar", false)],
                vec![vec![SqlValue::Int(1), "ann".into()]],
            )
            .with_table("u", &[("created", "datetime", false)], Vec::new());

        let schema = discover_schema(&mut db).await.unwrap();

        assert_eq!(schema.len(), 2);
        let t = schema.table("t").unwrap();
        assert_eq!(t.columns().len(), 2);
        assert!(t.column("id").unwrap().is_primary);
        assert!(!t.column("name").unwrap().is_primary);
        assert_eq!(t.column("name").unwrap().category, ColumnCategory::String);
        assert_eq!(
            schema.column("u", "created").unwrap().category,
            ColumnCategory::Temporal
        );
        // One listing query plus one column query per table.
        assert_eq!(db.statements().len(), 3);
    }

    #[tokio::test]
    async fn test_discover_schema_failure() {
        let mut db = MemoryDatabase::new()
            .with_table("t", &[("id", "int", true)], Vec::new())
            .fail_on("information_schema.TABLES");

        let err = discover_schema(&mut db).await.unwrap_err();
        assert!(matches!(err, Error::SchemaDiscovery { .. }));
    }
}
