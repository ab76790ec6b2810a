//! SQL statement builder.
//!
//! [`SqlBuilder`] combines a [`BuilderConfig`] with a [`FieldSchema`] and
//! renders each statement kind on demand. Rendering is a pure function of the
//! current configuration and schema; nothing is executed here. Operations can
//! be called in any order.
//!
//! The statement kinds are grouped by purpose:
//!
//! - `staging`: drop/create the staging table and `LOAD DATA` into it
//! - `validate`: per-field checks, duplicate keys, missing foreign keys
//! - `sequence`: number rows whose key is still the zero sentinel
//! - `merge`: update matching target rows and insert the rest

mod merge;
mod sequence;
mod staging;
mod validate;

use itertools::Itertools;

pub use validate::{ErrorKind, FieldCheck};

use crate::{
    config::BuilderConfig,
    error::Result,
    schema::{ColumnRule, FieldSchema},
};

const INDENT: &str = "    ";

#[derive(Debug, Clone, Default)]
pub struct SqlBuilder {
    config: BuilderConfig,
    schema: FieldSchema,
}

impl SqlBuilder {
    pub fn new(config: BuilderConfig, schema: FieldSchema) -> Self {
        Self { config, schema }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Settings changed here apply to the next rendered statement.
    pub fn config_mut(&mut self) -> &mut BuilderConfig {
        &mut self.config
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn set_schema<I>(&mut self, rules: I) -> Result<()>
    where
        I: IntoIterator<Item = ColumnRule>,
    {
        self.schema.set_schema(rules)
    }

    /// Staging table name and record-id column, checked together because almost
    /// every statement needs both.
    fn staging(&self) -> Result<(&str, &str)> {
        self.schema.ensure_not_empty()?;
        let table = self.config.staging_table()?;
        let record_id = self.config.record_id()?;
        Ok((table, record_id))
    }
}

/// Joins SQL lines, putting `depth` indents in front of every line after the
/// first.
fn join_lines<I, S>(lines: I, separator: &str, depth: usize) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let glue = format!("{separator}\n{}", INDENT.repeat(depth));
    lines
        .into_iter()
        .map(|line| line.as_ref().to_string())
        .join(&glue)
}
