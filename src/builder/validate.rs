use std::{fmt, str::FromStr};

use itertools::Itertools;
use serde::Serialize;

use super::{INDENT, SqlBuilder, join_lines};
use crate::{
    error::{Error, Result},
    schema::{ColumnRule, SqlType},
    sql,
    statement::{OperationTag, Statement},
};

/// Failure kind reported by `validate_all_fields`, used as the alias suffix
/// `<column>_<kind>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    MaxLength,
    Required,
    Custom,
    NotDatetime,
    Alphanumeric,
    NotInteger,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MaxLength => "maxlength",
            ErrorKind::Required => "required",
            ErrorKind::Custom => "custom",
            ErrorKind::NotDatetime => "notdatetime",
            ErrorKind::Alphanumeric => "alphanumeric",
            ErrorKind::NotInteger => "notinteger",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "maxlength" => Ok(ErrorKind::MaxLength),
            "required" => Ok(ErrorKind::Required),
            "custom" => Ok(ErrorKind::Custom),
            "notdatetime" => Ok(ErrorKind::NotDatetime),
            "alphanumeric" => Ok(ErrorKind::Alphanumeric),
            "notinteger" => Ok(ErrorKind::NotInteger),
            other => Err(Error::schema(format!("unknown validation kind '{other}'"))),
        }
    }
}

/// One boolean sub-expression of `validate_all_fields`; true means invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCheck {
    pub column: String,
    pub kind: ErrorKind,
    pub expression: String,
}

impl FieldCheck {
    pub fn alias(&self) -> String {
        format!("{}_{}", self.column, self.kind)
    }
}

impl SqlBuilder {
    /// Every check `render_validate_all_fields` will emit, in output order.
    pub fn field_checks(&self) -> Result<Vec<FieldCheck>> {
        self.schema.ensure_not_empty()?;
        let mut checks = Vec::new();
        for rule in &self.schema {
            self.column_checks(rule, &mut checks)?;
        }
        Ok(checks)
    }

    fn column_checks(&self, rule: &ColumnRule, checks: &mut Vec<FieldCheck>) -> Result<()> {
        let name = rule.name.as_str();
        let mut push = |kind: ErrorKind, expression: String| {
            checks.push(FieldCheck {
                column: name.to_string(),
                kind,
                expression,
            })
        };

        push(
            ErrorKind::MaxLength,
            format!("CHAR_LENGTH({name}) > {}", rule.max_length),
        );
        if rule.required {
            push(ErrorKind::Required, format!("{name} = ''"));
        }
        if let Some(custom) = &rule.custom_expression {
            let expression = if rule.required {
                format!("NOT ({custom})")
            } else {
                format!("({name} != '' AND NOT ({custom}))")
            };
            push(ErrorKind::Custom, expression);
        }

        let not_default = self.schema.not_default_expression(name)?;
        match &rule.sql_type {
            SqlType::Varchar | SqlType::Text => {}
            SqlType::Date | SqlType::DateTime => push(
                ErrorKind::NotDatetime,
                // DAYOFYEAR yields NULL, or 0 for zero dates, when the value is not a date.
                format!(
                    "({not_default} AND {name} != '' AND IFNULL(DAYOFYEAR({name}), 0) = 0)"
                ),
            ),
            SqlType::Alphanumeric => push(
                ErrorKind::Alphanumeric,
                format!(
                    r"({not_default} AND {name} != '' AND NOT {name} REGEXP '^[a-zA-Z0-9\-]+$')"
                ),
            ),
            SqlType::Decimal(spec) => push(
                ErrorKind::NotInteger,
                // Garbage compares equal to 0, so `= 0` without being '0' means unparsable.
                format!(
                    "({not_default} AND {name} = 0 AND {name} != '0') OR CAST({name} AS {spec}) != {name}"
                ),
            ),
        }
        Ok(())
    }

    /// Rows that fail any per-field check, with one aliased flag per check.
    pub fn render_validate_all_fields(&self) -> Result<Statement> {
        let (table, record_id) = self.staging()?;
        let checks = self.field_checks()?;

        let mut selected = vec![record_id.to_string()];
        selected.extend(
            checks
                .iter()
                .map(|check| format!("{} AS {}", check.expression, check.alias())),
        );
        let conditions = checks
            .iter()
            .map(|check| check.expression.as_str())
            .join(&format!("\n{INDENT}OR "));

        let sql = format!(
            "SELECT\n{INDENT}{selected}\nFROM\n{INDENT}{table}\nWHERE\n{INDENT}{conditions}\nORDER BY {record_id}",
            selected = join_lines(&selected, ",", 1),
        );
        Ok(Statement::new(OperationTag::ValidateAllFields, sql))
    }

    /// Rows whose combination of `columns` occurs more than once. Values equal
    /// to a column's empty representation never count as duplicates.
    pub fn render_validate_duplicate<S: AsRef<str>>(&self, columns: &[S]) -> Result<Statement> {
        let (table, record_id) = self.staging()?;
        if columns.is_empty() {
            return Err(Error::config(
                "duplicate detection needs at least one column",
            ));
        }
        let columns = columns.iter().map(|c| c.as_ref()).collect::<Vec<&str>>();
        let not_defaults = columns
            .iter()
            .map(|column| self.schema.not_default_expression(column))
            .collect::<Result<Vec<_>>>()?;

        let field_list = columns.join(", ");
        let t1_fields = columns.iter().map(|c| format!("t1.{c}")).join(", ");
        let join_on = columns
            .iter()
            .map(|c| format!("t1.{c} = t2.{c}"))
            .join(" AND ");

        let sql = format!(
            "SELECT t1.{record_id}, {t1_fields}\n\
             FROM {table} t1\n\
             INNER JOIN\n\
             (\n\
             {INDENT}SELECT {field_list}, COUNT(*) AS ___count\n\
             {INDENT}FROM {table}\n\
             {INDENT}WHERE {not_defaults}\n\
             {INDENT}GROUP BY {field_list}\n\
             {INDENT}ORDER BY NULL\n\
             ) t2\n\
             ON\n\
             {INDENT}{join_on}\n\
             WHERE t2.___count > 1\n\
             ORDER BY t1.{record_id}",
            not_defaults = join_lines(&not_defaults, " AND", 2),
        );
        Ok(Statement::new(OperationTag::ValidateDuplicate, sql))
    }

    /// Rows whose `local_column` value is missing from `foreign_table`.
    /// `condition` is a raw SQL filter on the foreign table.
    pub fn render_validate_foreign_key(
        &self,
        local_column: &str,
        foreign_column: &str,
        foreign_table: &str,
        condition: Option<&str>,
    ) -> Result<Statement> {
        let (table, record_id) = self.staging()?;
        self.schema.require(local_column)?;
        sql::ensure_column_name("foreign key column", foreign_column)?;
        sql::ensure_table_name("foreign table", foreign_table)?;

        let mut filter = format!("{INDENT}{INDENT}{INDENT}1 = 1");
        if let Some(condition) = condition.map(str::trim).filter(|c| !c.is_empty()) {
            filter.push_str(&format!("\n{INDENT}{INDENT}{INDENT}AND {condition}"));
        }
        let sql = format!(
            "SELECT\n\
             {INDENT}{record_id}, {local_column}\n\
             FROM\n\
             {INDENT}{table}\n\
             WHERE\n\
             {INDENT}{local_column} NOT IN\n\
             {INDENT}(\n\
             {INDENT}{INDENT}SELECT\n\
             {INDENT}{INDENT}{INDENT}{foreign_column}\n\
             {INDENT}{INDENT}FROM\n\
             {INDENT}{INDENT}{INDENT}{foreign_table}\n\
             {INDENT}{INDENT}WHERE\n\
             {filter}\n\
             {INDENT})\n\
             ORDER BY {record_id}"
        );
        Ok(Statement::new(OperationTag::ValidateForeignKey, sql))
    }
}
