//! An import session: a [`SqlBuilder`] paired with an [`Executor`].
//!
//! Each method renders one statement and runs it immediately. The usual order
//! is create, import, validate, optionally number, then update and insert, but
//! nothing enforces it. Execution failures come back as
//! [`Error::Execution`](crate::error::Error::Execution); nothing is retried or
//! rolled back here.

use log::{debug, info};
use serde_json::Value;

use crate::{
    builder::SqlBuilder,
    error::Result,
    executor::{Executor, Outcome, Row},
    report::ValidationReport,
    statement::Statement,
};

pub struct Importer<E> {
    builder: SqlBuilder,
    executor: E,
}

impl<E: Executor> Importer<E> {
    pub fn new(builder: SqlBuilder, executor: E) -> Self {
        Self { builder, executor }
    }

    pub fn builder(&self) -> &SqlBuilder {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut SqlBuilder {
        &mut self.builder
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_parts(self) -> (SqlBuilder, E) {
        (self.builder, self.executor)
    }

    fn run(&mut self, statement: Statement) -> Result<Outcome> {
        if self.builder.config().dump_sql {
            info!("----------- {}:\n{}", statement.tag, statement.sql);
        } else {
            debug!("Executing '{}'", statement.tag);
        }
        let outcome =
            self.executor
                .execute(&statement.sql, statement.bindings(), statement.tag)?;
        debug!(
            "'{}' finished with {} row(s)",
            statement.tag,
            outcome.affected()
        );
        Ok(outcome)
    }

    /// Drops any previous staging table, then creates it afresh.
    pub fn create(&mut self) -> Result<Outcome> {
        let drop = self.builder.render_drop_staging()?;
        let create = self.builder.render_create_staging()?;
        self.run(drop)?;
        self.run(create)
    }

    pub fn import(&mut self, path: &str) -> Result<Outcome> {
        let statement = self.builder.render_bulk_load(path)?;
        let outcome = self.run(statement)?;
        info!("Loaded '{}' into staging", path);
        Ok(outcome)
    }

    pub fn validate_all_fields(&mut self) -> Result<ValidationReport> {
        let statement = self.builder.render_validate_all_fields()?;
        let checks = self.builder.field_checks()?;
        let rows = self.run(statement)?.into_rows();
        let report =
            ValidationReport::from_rows(&rows, &self.builder.config().record_id, &checks);
        if report.is_valid() {
            info!("All staged rows passed field validation");
        } else {
            info!(
                "{} staged row(s) failed field validation with {} error(s)",
                report.failures().len(),
                report.error_count()
            );
        }
        Ok(report)
    }

    pub fn validate_duplicate<S: AsRef<str>>(&mut self, columns: &[S]) -> Result<Vec<Row>> {
        let statement = self.builder.render_validate_duplicate(columns)?;
        Ok(self.run(statement)?.into_rows())
    }

    pub fn validate_foreign_key(
        &mut self,
        local_column: &str,
        foreign_column: &str,
        foreign_table: &str,
        condition: Option<&str>,
    ) -> Result<Vec<Row>> {
        let statement = self.builder.render_validate_foreign_key(
            local_column,
            foreign_column,
            foreign_table,
            condition,
        )?;
        Ok(self.run(statement)?.into_rows())
    }

    pub fn assign_sequence(
        &mut self,
        column: &str,
        base_number: u64,
        target_table: Option<&str>,
    ) -> Result<Outcome> {
        let statement = self
            .builder
            .render_assign_sequence(column, base_number, target_table)?;
        self.run(statement)
    }

    pub fn assign_prefixed_sequence(
        &mut self,
        column: &str,
        prefix: &str,
        digit_mask: &str,
        base_number: u64,
        target_table: Option<&str>,
    ) -> Result<Outcome> {
        let statement = self.builder.render_assign_prefixed_sequence(
            column,
            prefix,
            digit_mask,
            base_number,
            target_table,
        )?;
        self.run(statement)
    }

    pub fn update_existing(&mut self, overrides: &[(String, Value)]) -> Result<Outcome> {
        let statement = self.builder.render_merge_update(overrides)?;
        self.run(statement)
    }

    pub fn insert_new(&mut self, overrides: &[(String, Value)]) -> Result<Outcome> {
        let statement = self.builder.render_merge_insert(overrides)?;
        self.run(statement)
    }
}
