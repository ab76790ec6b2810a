use log::debug;

use super::{INDENT, SqlBuilder, join_lines};
use crate::{
    error::{Error, Result},
    sql::string_literal,
    statement::{OperationTag, Statement},
};

impl SqlBuilder {
    pub fn render_drop_staging(&self) -> Result<Statement> {
        let (table, _) = self.staging()?;
        Ok(Statement::new(
            OperationTag::DropStaging,
            format!("DROP TABLE IF EXISTS {table}"),
        ))
    }

    /// `CREATE TABLE` for the staging table: an auto-increment record id
    /// followed by one text column per schema rule, in declaration order.
    pub fn render_create_staging(&self) -> Result<Statement> {
        let (table, record_id) = self.staging()?;
        let charset = self.config.table_charset()?;

        let mut lines = Vec::with_capacity(self.schema.len() + 2);
        lines.push(format!("`{record_id}` INT(9) NOT NULL AUTO_INCREMENT"));
        for rule in &self.schema {
            let line = match &rule.raw_column_definition {
                Some(definition) => definition.clone(),
                None => format!(
                    "`{}` {} DEFAULT {}",
                    rule.name,
                    rule.staging_type(),
                    rule.default_expression.as_deref().unwrap_or("''")
                ),
            };
            lines.push(line);
        }
        lines.push(format!("PRIMARY KEY (`{record_id}`)"));

        let create = if self.config.temporary {
            "CREATE TEMPORARY TABLE"
        } else {
            "CREATE TABLE"
        };
        let sql = format!(
            "{create} {table}\n(\n{INDENT}{columns}\n) ENGINE=MyISAM DEFAULT CHARSET={charset}",
            columns = join_lines(&lines, ",", 1),
        );
        debug!(
            "Rendered staging table '{}' with {} CSV column(s)",
            table,
            self.schema.len()
        );
        Ok(Statement::new(OperationTag::CreateStaging, sql))
    }

    /// `LOAD DATA LOCAL INFILE` into the staging table.
    ///
    /// Columns with a default are read into `@var_<name>` and assigned in the
    /// trailing `SET` clause, because the loader stores an empty field as an
    /// empty string instead of applying the column `DEFAULT`.
    pub fn render_bulk_load(&self, path: &str) -> Result<Statement> {
        let (table, _) = self.staging()?;
        if path.trim().is_empty() {
            return Err(Error::config("no CSV file path was given to load"));
        }
        let charset = self.config.csv_charset()?;
        let dialect = &self.config.dialect;

        let mut names = Vec::with_capacity(self.schema.len());
        let mut setters = Vec::new();
        for rule in &self.schema {
            match &rule.default_expression {
                Some(default) => {
                    let name = &rule.name;
                    names.push(format!("@var_{name}"));
                    setters.push(format!(
                        "{name} = CASE @var_{name} WHEN '' THEN {default} ELSE @var_{name} END"
                    ));
                }
                None => names.push(rule.name.clone()),
            }
        }

        let mut sql = format!(
            "LOAD DATA LOCAL INFILE {path}\n\
             INTO TABLE {table}\n\
             CHARACTER SET {charset}\n\
             FIELDS TERMINATED BY {separator}\n\
             OPTIONALLY ENCLOSED BY {enclosure}\n\
             LINES TERMINATED BY {terminator} STARTING BY {line_start}\n",
            path = string_literal(path),
            separator = string_literal(&dialect.separator),
            enclosure = string_literal(&dialect.enclosure),
            terminator = string_literal(&dialect.line_terminator),
            line_start = string_literal(&dialect.line_start),
        );
        if self.config.has_header {
            sql.push_str("IGNORE 1 LINES\n");
        }
        sql.push('(');
        sql.push_str(&names.join(","));
        sql.push(')');
        if !setters.is_empty() {
            sql.push_str("\nSET ");
            sql.push_str(&join_lines(&setters, ",", 1));
        }
        Ok(Statement::new(OperationTag::BulkLoad, sql))
    }
}
