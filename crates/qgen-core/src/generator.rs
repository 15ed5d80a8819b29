//! The query generator: one connection, one schema, one template document.

use crate::batch::{BatchOptions, BatchRun};
use crate::database::Database;
use crate::error::Result;
use crate::executor::{self, QueryRecord};
use crate::render::{self, DEFAULT_MAX_VALUE_ATTEMPTS};
use crate::schema::{discover_schema, Schema};
use crate::selector;
use crate::template::{AllowedVerbs, QueryTemplateDocument, Template};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, Instrument, Span};

/// Construction options for [`QueryGenerator`].
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Seed for reproducible runs; `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Cap on `random_value` lookups per rendering.
    pub max_value_attempts: usize,
    /// Span all generator logging is recorded under.
    pub span: Option<Span>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            seed: None,
            max_value_attempts: DEFAULT_MAX_VALUE_ATTEMPTS,
            span: None,
        }
    }
}

/// Prepares, checks and runs generated statements against one database.
pub struct QueryGenerator<D> {
    pub(crate) db: D,
    schema: Schema,
    document: QueryTemplateDocument,
    allowed_verbs: AllowedVerbs,
    rng: StdRng,
    max_value_attempts: usize,
    pub(crate) span: Span,
}

impl<D: Database> QueryGenerator<D> {
    /// Discover the schema and build the generator.
    ///
    /// Fails when schema discovery fails; a generator never exists without a schema.
    pub async fn new(
        mut db: D,
        document: QueryTemplateDocument,
        allowed_verbs: AllowedVerbs,
        options: GeneratorOptions,
    ) -> Result<Self> {
        let span = options
            .span
            .unwrap_or_else(|| tracing::info_span!("qgen"));
        let schema = discover_schema(&mut db).instrument(span.clone()).await?;
        span.in_scope(|| info!("Discovered {} tables", schema.len()));

        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            db,
            schema,
            document,
            allowed_verbs,
            rng,
            max_value_attempts: options.max_value_attempts,
            span,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn document(&self) -> &QueryTemplateDocument {
        &self.document
    }

    pub fn allowed_verbs(&self) -> &AllowedVerbs {
        &self.allowed_verbs
    }

    pub fn database(&self) -> &D {
        &self.db
    }

    /// Give back the connection.
    pub fn into_inner(self) -> D {
        self.db
    }

    /// Rediscover the schema; the old one is kept if discovery fails.
    pub async fn refresh_schema(&mut self) -> Result<()> {
        let schema = discover_schema(&mut self.db)
            .instrument(self.span.clone())
            .await?;
        self.schema = schema;
        Ok(())
    }

    /// Pick a `(verb, template)` pair by verb weight.
    pub fn pick_query(&mut self) -> Result<(String, Template)> {
        let (verb, template) =
            selector::pick_query(&self.document, &self.allowed_verbs, &mut self.rng)?;
        Ok((verb.to_string(), template.clone()))
    }

    /// Fill `template`'s placeholders.
    pub async fn render(&mut self, template: &Template) -> Result<String> {
        render::render(
            template,
            &self.schema,
            &mut self.db,
            &mut self.rng,
            self.max_value_attempts,
        )
        .instrument(self.span.clone())
        .await
    }

    /// Run one rendered statement.
    pub async fn execute(
        &mut self,
        verb: &str,
        statement: &str,
        needs_commit: bool,
        halt_on_error: bool,
    ) -> Result<QueryRecord> {
        executor::execute(&mut self.db, verb, statement, needs_commit, halt_on_error)
            .instrument(self.span.clone())
            .await
    }

    /// Start a batch of at most `options.max_queries` statements.
    pub fn batch_run(&mut self, options: BatchOptions) -> BatchRun<'_, D> {
        BatchRun::new(self, options)
    }
}
