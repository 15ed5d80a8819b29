//! Template rendering.
//!
//! Rendering builds a [`PlaceholderContext`] for one call and substitutes it
//! into the parsed template. The only database traffic is the random-value
//! lookup, issued solely when the template references `random_value`.

use crate::database::Database;
use crate::error::{Error, Result};
use crate::schema::{Schema, TableSchema};
use crate::synth::{random_existing_value, random_value_query, synthetic_value};
use crate::template::{Placeholder, Segment, Template};
use crate::value::SqlValue;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

/// Default cap on `random_value` lookups per rendering.
pub const DEFAULT_MAX_VALUE_ATTEMPTS: usize = 100;

/// Values available to one rendering call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceholderContext {
    values: BTreeMap<Placeholder, String>,
}

impl PlaceholderContext {
    pub fn new() -> Self {
        let mut ctx = Self::default();
        ctx.insert(Placeholder::All, "*");
        ctx
    }

    pub fn insert(&mut self, placeholder: Placeholder, value: impl Into<String>) {
        self.values.insert(placeholder, value.into());
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        self.values.get(&placeholder).map(String::as_str)
    }

    /// Substitute context values into `template`.
    ///
    /// Placeholders missing from the context render as empty text.
    pub fn apply(&self, template: &Template) -> String {
        let mut out = String::with_capacity(template.text().len());
        for segment in template.segments() {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(p) => out.push_str(self.get(*p).unwrap_or_default()),
            }
        }
        out
    }
}

/// Build the context for `template` and render it.
pub async fn render<D, R>(
    template: &Template,
    schema: &Schema,
    db: &mut D,
    rng: &mut R,
    max_value_attempts: usize,
) -> Result<String>
where
    D: Database + ?Sized,
    R: Rng + Send,
{
    let ctx = build_context(template, schema, db, rng, max_value_attempts).await?;
    Ok(ctx.apply(template))
}

/// Resolve every placeholder `template` references.
pub async fn build_context<D, R>(
    template: &Template,
    schema: &Schema,
    db: &mut D,
    rng: &mut R,
    max_value_attempts: usize,
) -> Result<PlaceholderContext>
where
    D: Database + ?Sized,
    R: Rng + Send,
{
    let mut ctx = PlaceholderContext::new();
    let used = template.placeholders();
    let needs_schema = used.iter().any(|p| *p != Placeholder::All);
    if !needs_schema {
        return Ok(ctx);
    }

    let mut table = schema.random_table(rng).ok_or(Error::EmptySchema)?;
    let mut column = table.random_column(rng).name.clone();

    if used.contains(&Placeholder::RandomValue) {
        let (t, c, value) = find_random_value(schema, db, rng, max_value_attempts).await?;
        table = t;
        column = c;
        ctx.insert(Placeholder::RandomValue, value.to_string());
    }

    ctx.insert(Placeholder::RandomTable, table.name());
    ctx.insert(Placeholder::RandomColumn, column);

    if used.contains(&Placeholder::AppropriateValue)
        || used.contains(&Placeholder::SecondRandomColumn)
    {
        // Independent draw; may equal the first column.
        let second = table.random_column(rng);
        let value = synthetic_value(second, rng).unwrap_or(SqlValue::Null);
        ctx.insert(Placeholder::SecondRandomColumn, second.name.clone());
        ctx.insert(Placeholder::AppropriateValue, value.to_string());
    }

    Ok(ctx)
}

/// Re-pick table and column until a stored non-empty value turns up.
///
/// A failed lookup is rolled back and counts as a spent attempt; a failed
/// rollback ends the search.
async fn find_random_value<'s, D, R>(
    schema: &'s Schema,
    db: &mut D,
    rng: &mut R,
    max_attempts: usize,
) -> Result<(&'s TableSchema, String, SqlValue)>
where
    D: Database + ?Sized,
    R: Rng + Send,
{
    for attempt in 1..=max_attempts {
        let table = schema.random_table(rng).ok_or(Error::EmptySchema)?;
        let column = table.random_column(rng).name.clone();

        let value = match random_existing_value(db, table.name(), &column).await {
            Ok(value) => value,
            Err(source) => {
                let query = random_value_query(table.name(), &column);
                warn!("Cannot run query {}: {}, trying rollback ...", query, source);
                if let Err(e) = db.rollback().await {
                    error!("Rollback of query {} failed: {}", query, e);
                    return Err(Error::StatementExecution {
                        statement: query,
                        source,
                    });
                }
                warn!("Query {} rolled back!", query);
                continue;
            }
        };
        match value {
            Some(value) if !value.is_empty() => return Ok((table, column, value)),
            _ => debug!(
                attempt,
                table = %table.name(),
                column = %column,
                "Empty random value, retrying"
            ),
        }
    }

    warn!("No usable random value after {} attempts", max_attempts);
    Err(Error::DataExhausted {
        attempts: max_attempts,
    })
}
