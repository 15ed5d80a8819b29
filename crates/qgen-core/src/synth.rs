//! Value synthesis for template placeholders.
//!
//! Two sources of values exist:
//!
//! - [`random_existing_value`] fetches a value already stored in a column.
//!   It orders the whole table randomly, so it is only called when a
//!   template references `random_value`.
//! - [`synthetic_value`] generates a fresh value from the column's
//!   [`ColumnCategory`] through a [`ValueStrategy`].

use crate::database::Database;
use crate::error::DatabaseError;
use crate::schema::{ColumnCategory, ColumnInfo};
use crate::value::SqlValue;
use rand::Rng;
use tracing::{debug, warn};

/// How a value is generated for a column category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueStrategy {
    /// Uniform integer in `[min, max]`.
    IntRange { min: i64, max: i64 },
    /// Uniform float in `[0, 1)`.
    UnitFloat,
    /// Lowercase ASCII string with a length uniform in `[min_len, max_len]`.
    LowercaseString { min_len: usize, max_len: usize },
    /// No generator exists; yields no value.
    Unsupported,
}

impl ValueStrategy {
    /// Total mapping from category to strategy.
    pub fn for_category(category: ColumnCategory) -> Self {
        match category {
            ColumnCategory::Integer => ValueStrategy::IntRange { min: 0, max: 100 },
            ColumnCategory::Decimal => ValueStrategy::UnitFloat,
            ColumnCategory::String => ValueStrategy::LowercaseString {
                min_len: 1,
                max_len: 20,
            },
            ColumnCategory::Temporal
            | ColumnCategory::Enumerated
            | ColumnCategory::Set
            | ColumnCategory::Unknown => ValueStrategy::Unsupported,
        }
    }

    /// Generate a value, `None` for [`ValueStrategy::Unsupported`].
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Option<SqlValue> {
        match *self {
            ValueStrategy::IntRange { min, max } => Some(SqlValue::Int(rng.random_range(min..=max))),
            ValueStrategy::UnitFloat => Some(SqlValue::Float(rng.random::<f64>())),
            ValueStrategy::LowercaseString { min_len, max_len } => {
                let len = rng.random_range(min_len..=max_len);
                let s: String = (0..len)
                    .map(|_| char::from(rng.random_range(b'a'..=b'z')))
                    .collect();
                Some(SqlValue::Text(s))
            }
            ValueStrategy::Unsupported => None,
        }
    }
}

/// Generate a random value fitting `column`'s declared type.
///
/// Returns `None` when the category has no generator; callers treat that as
/// "no value available".
pub fn synthetic_value<R: Rng>(column: &ColumnInfo, rng: &mut R) -> Option<SqlValue> {
    let strategy = ValueStrategy::for_category(column.category);
    let value = strategy.generate(rng);
    if value.is_none() {
        debug!(
            column = %column.name,
            data_type = %column.data_type,
            "No value generator for column type"
        );
    }
    value
}

/// Statement fetching one random stored value of `column`.
pub fn random_value_query(table: &str, column: &str) -> String {
    format!(
        "SELECT {} FROM {} ORDER BY RAND() LIMIT 1",
        quote_identifier(column),
        quote_identifier(table)
    )
}

/// Quote a MySQL identifier with backticks.
pub fn quote_identifier(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Fetch the value of `column` from one randomly ordered row of `table`.
///
/// An empty table yields `Ok(None)`.
pub async fn random_existing_value<D: Database + ?Sized>(
    db: &mut D,
    table: &str,
    column: &str,
) -> Result<Option<SqlValue>, DatabaseError> {
    let query = random_value_query(table, column);
    let rows = db.query(&query).await?;
    let value = rows.into_iter().next().and_then(|row| row.value(0).cloned());
    if value.is_none() {
        warn!("No output from query {}", query);
    }
    Ok(value)
}
