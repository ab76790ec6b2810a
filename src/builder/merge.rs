use std::collections::HashSet;

use serde_json::Value;

use super::{INDENT, SqlBuilder, join_lines};
use crate::{
    error::{Error, Result},
    sql,
    statement::{OperationTag, Params, Statement},
};

/// How one target column is filled by a merge statement.
enum Source<'a> {
    Staged(&'a str),
    Bound(&'a str),
}

impl SqlBuilder {
    /// Target columns paired with their source: every non-skipped schema column
    /// in order, then override columns the schema does not merge, in the order
    /// given. An override for a schema column replaces the staged value with a
    /// bound parameter.
    fn merge_sources<'a>(
        &'a self,
        overrides: &'a [(String, Value)],
    ) -> Result<(Vec<Source<'a>>, Params)> {
        let mut params = Params::new();
        for (name, value) in overrides {
            sql::ensure_column_name("override column", name)?;
            params.insert(name.clone(), value.clone());
        }

        let mut sources = Vec::new();
        let mut merged: HashSet<&str> = HashSet::new();
        for rule in self.schema.iter().filter(|rule| !rule.skip) {
            let name = rule.name.as_str();
            merged.insert(name);
            if params.contains_key(name) {
                sources.push(Source::Bound(name));
            } else {
                sources.push(Source::Staged(name));
            }
        }
        for (name, _) in overrides {
            if merged.insert(name.as_str()) {
                sources.push(Source::Bound(name.as_str()));
            }
        }
        if sources.is_empty() {
            return Err(Error::config(
                "every column is skipped and no overrides were given; nothing to merge",
            ));
        }
        Ok((sources, params))
    }

    /// Overwrites target rows that share a primary key with a staged row.
    pub fn render_merge_update(&self, overrides: &[(String, Value)]) -> Result<Statement> {
        let (staging, _) = self.staging()?;
        let target = self.config.target_table(None)?;
        let keys = self.config.primary_key_columns()?;
        let (sources, params) = self.merge_sources(overrides)?;

        let assignments = sources.iter().map(|source| match source {
            Source::Staged(name) => format!("t1.{name} = t2.{name}"),
            Source::Bound(name) => format!("t1.{name} = :{name}"),
        });
        let condition = keys.iter().map(|key| format!("t1.{key} = t2.{key}"));

        let sql = format!(
            "UPDATE\n\
             {INDENT}{target} t1,\n\
             {INDENT}{staging} t2\n\
             SET\n\
             {INDENT}{assignments}\n\
             WHERE\n\
             {INDENT}{condition}",
            assignments = join_lines(assignments, ",", 1),
            condition = join_lines(condition, " AND", 1),
        );
        Ok(Statement::with_params(OperationTag::MergeUpdate, sql, params))
    }

    /// Inserts staged rows whose primary key is not yet in the target table.
    pub fn render_merge_insert(&self, overrides: &[(String, Value)]) -> Result<Statement> {
        let (staging, record_id) = self.staging()?;
        let target = self.config.target_table(None)?;
        let keys = self.config.primary_key_columns()?;
        let (sources, params) = self.merge_sources(overrides)?;

        let mut columns = Vec::with_capacity(sources.len());
        let mut values = Vec::with_capacity(sources.len());
        for source in &sources {
            match source {
                Source::Staged(name) => {
                    columns.push(name.to_string());
                    values.push(format!("t2.{name}"));
                }
                Source::Bound(name) => {
                    columns.push(name.to_string());
                    values.push(format!(":{name}"));
                }
            }
        }
        let join_on = keys.iter().map(|key| format!("t1.{key} = t2.{key}"));
        let missing = keys.iter().map(|key| format!("t1.{key} IS NULL"));

        let sql = format!(
            "INSERT INTO {target}\n\
             {INDENT}({columns})\n\
             SELECT\n\
             {INDENT}{values}\n\
             FROM {staging} t2\n\
             LEFT JOIN {target} t1\n\
             {INDENT}ON {join_on}\n\
             WHERE\n\
             {INDENT}{missing}\n\
             ORDER BY t2.{record_id}",
            columns = columns.join(", "),
            values = values.join(", "),
            join_on = join_lines(join_on, " AND", 1),
            missing = join_lines(missing, " AND", 1),
        );
        Ok(Statement::with_params(OperationTag::MergeInsert, sql, params))
    }
}
