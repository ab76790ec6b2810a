use log::debug;

use super::SqlBuilder;
use crate::{
    error::Result,
    sql::string_literal,
    statement::{OperationTag, Statement},
};

impl SqlBuilder {
    /// Numbers every staging row whose `column` is still `0`.
    ///
    /// Row `n` (by record id) receives `n + max(base, max(column) in staging,
    /// max(column) in target)`, so new numbers never collide with existing ones.
    /// `target_table` falls back to the configured target table.
    pub fn render_assign_sequence(
        &self,
        column: &str,
        base_number: u64,
        target_table: Option<&str>,
    ) -> Result<Statement> {
        let (table, id) = self.staging()?;
        self.schema.require(column)?;
        let target = self.config.target_table(target_table)?;

        let sql = format!(
            "UPDATE {table} t10,
(
    SELECT t2.{id}, t2.{id} + t1.{column} AS {column}
    FROM {table} t2,
    (
        SELECT MAX({column}) AS {column}
        FROM (
            SELECT {base_number} AS {column}
            UNION
            SELECT MAX(CAST({column} AS UNSIGNED)) AS {column}
            FROM {table}
            UNION
            SELECT MAX({column}) AS {column}
            FROM {target}
        ) t0
    ) t1
) t20
SET
    t10.{column} = t20.{column}
WHERE
    t10.{column} = 0
AND t10.{id} = t20.{id}"
        );
        debug!("Rendered sequence for '{column}' above {base_number} against '{target}'");
        Ok(Statement::new(OperationTag::AssignSequence, sql))
    }

    /// Like [`render_assign_sequence`](Self::render_assign_sequence) for codes
    /// shaped `<prefix><number>`.
    ///
    /// The running maximum is read from values longer than the prefix, with the
    /// prefix stripped. A `digit_mask` that is empty or `#` appends the number
    /// as-is; any other mask zero-pads it to the mask's length. Only rows whose
    /// value is empty or the text `'0'` are renumbered; the text comparison
    /// keeps existing prefixed codes from coercing to 0.
    pub fn render_assign_prefixed_sequence(
        &self,
        column: &str,
        prefix: &str,
        digit_mask: &str,
        base_number: u64,
        target_table: Option<&str>,
    ) -> Result<Statement> {
        let (table, id) = self.staging()?;
        self.schema.require(column)?;
        let target = self.config.target_table(target_table)?;

        let prefix_literal = string_literal(prefix);
        let prefix_len = prefix.chars().count();
        let suffix_start = prefix_len + 1;
        let number = format!("t2.{id} + IFNULL(t1.{column}, 0)");
        let new_value = if digit_mask.is_empty() || digit_mask == "#" {
            format!("CONCAT({prefix_literal}, {number})")
        } else {
            let width = digit_mask.chars().count();
            format!("CONCAT({prefix_literal}, LPAD({number}, {width}, '0'))")
        };

        let sql = format!(
            "UPDATE {table} t10,
(
    SELECT t2.{id}, {new_value} AS {column}
    FROM {table} t2,
    (
        SELECT MAX({column}) AS {column}
        FROM (
            SELECT {base_number} AS {column}
            UNION
            SELECT MAX(CAST(SUBSTRING({column}, {suffix_start}) AS UNSIGNED)) AS {column}
            FROM {table}
            WHERE
                CHAR_LENGTH({column}) > {prefix_len}
            UNION
            SELECT MAX(CAST(SUBSTRING({column}, {suffix_start}) AS UNSIGNED)) AS {column}
            FROM {target}
            WHERE
                CHAR_LENGTH({column}) > {prefix_len}
        ) t0
    ) t1
) t20
SET
    t10.{column} = t20.{column}
WHERE
    (t10.{column} = '' OR t10.{column} = '0')
AND t10.{id} = t20.{id}"
        );
        Ok(Statement::new(OperationTag::AssignPrefixedSequence, sql))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        builder::SqlBuilder,
        config::BuilderConfig,
        schema::{ColumnRule, FieldSchema, SqlType},
    };

    fn builder() -> SqlBuilder {
        let config = BuilderConfig::default()
            .with_staging_table("staged")
            .with_target_table("Item");
        let schema = FieldSchema::new([
            ColumnRule::new("itemNo", "decimal(9)".parse().unwrap(), 9),
            ColumnRule::new("sku", SqlType::Alphanumeric, 12),
        ])
        .unwrap();
        SqlBuilder::new(config, schema)
    }

    #[test]
    fn sequence_falls_back_to_configured_target() {
        let sql = builder()
            .render_assign_sequence("itemNo", 100, None)
            .unwrap()
            .sql;
        assert!(sql.contains("SELECT 100 AS itemNo"));
        assert!(sql.contains("FROM Item\n"));
    }

    #[test]
    fn sequence_without_any_target_is_a_config_error() {
        let mut builder = builder();
        builder.config_mut().target_table = None;
        assert!(
            builder
                .render_assign_sequence("itemNo", 0, None)
                .unwrap_err()
                .is_config()
        );
    }

    #[test]
    fn prefix_is_quoted_and_stripped_by_its_length() {
        let sql = builder()
            .render_assign_prefixed_sequence("sku", "SK-", "", 0, None)
            .unwrap()
            .sql;
        assert!(sql.contains("CONCAT('SK-', t2.id + IFNULL(t1.sku, 0)) AS sku"));
        assert!(sql.contains("SUBSTRING(sku, 4)"));
        assert!(sql.contains("CHAR_LENGTH(sku) > 3"));
    }

    #[test]
    fn unknown_sequence_column_is_a_schema_error() {
        assert!(
            builder()
                .render_assign_sequence("nope", 0, None)
                .unwrap_err()
                .is_schema()
        );
    }
}
