#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv_staging::{
    BuilderConfig, ColumnRule, ExecutionError, FieldSchema, OperationTag, Outcome, Params,
    SqlBuilder, SqlType,
};
use tempfile::{TempDir, tempdir};

/// Collapses whitespace runs so statements compare independent of layout.
pub fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn assert_sql_eq(actual: &str, expected: &str) {
    assert_eq!(normalize_sql(actual), normalize_sql(expected), "\nactual SQL:\n{actual}\n");
}

fn decimal(token: &str) -> SqlType {
    token.parse().expect("decimal type")
}

/// The product CSV layout used across the integration tests.
pub fn product_rules() -> Vec<ColumnRule> {
    vec![
        ColumnRule::new("productId", decimal("decimal(15)"), 15),
        ColumnRule::new("categoryId", decimal("decimal(9)"), 9).required(),
        ColumnRule::new("productCode", SqlType::Alphanumeric, 20),
        ColumnRule::new("productName", SqlType::Varchar, 40).required(),
        ColumnRule::new("price", decimal("decimal(8,2)"), 8).required(),
        ColumnRule::new("cost", decimal("decimal(14,5)"), 14).with_default("NULL"),
        ColumnRule::new("deleteFlag", decimal("decimal(1)"), 1)
            .with_default("'0'")
            .with_custom("deleteFlag BETWEEN '0' AND '1'"),
    ]
}

pub fn product_config() -> BuilderConfig {
    BuilderConfig {
        temporary: false,
        csv_charset: "cp932".to_string(),
        ..BuilderConfig::default()
    }
    .with_staging_table("tempCsvData")
    .with_target_table("Product")
    .with_primary_key("productId")
}

pub fn product_builder() -> SqlBuilder {
    let schema = FieldSchema::new(product_rules()).expect("product schema");
    SqlBuilder::new(product_config(), schema)
}

/// One statement as seen by [`RecordingExecutor`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub sql: String,
    pub params: Option<Params>,
    pub tag: OperationTag,
}

/// Executor that remembers every statement and answers queries with canned rows.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub statements: Vec<Recorded>,
    pub rows: Vec<csv_staging::Row>,
    pub fail_on: Option<OperationTag>,
}

impl csv_staging::Executor for RecordingExecutor {
    fn execute(
        &mut self,
        sql: &str,
        params: Option<&Params>,
        tag: OperationTag,
    ) -> Result<Outcome, ExecutionError> {
        self.statements.push(Recorded {
            sql: sql.to_string(),
            params: params.cloned(),
            tag,
        });
        if self.fail_on == Some(tag) {
            return Err(ExecutionError::new(format!("simulated failure in {tag}")));
        }
        if tag.is_query() {
            Ok(Outcome::Rows(self.rows.clone()))
        } else {
            Ok(Outcome::Affected(1))
        }
    }
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

pub const PRODUCT_PROFILE: &str = r#"
staging_table: tempCsvData
target_table: Product
primary_key: productId
temporary: false
csv_charset: cp932
columns:
  - { name: productId, type: decimal(15), maxlength: 15 }
  - { name: categoryId, type: decimal(9), maxlength: 9, required: true }
  - { name: productCode, type: alphanumeric, maxlength: 20 }
  - { name: productName, type: varchar, maxlength: 40, required: true }
  - { name: price, type: "decimal(8,2)", maxlength: 8, required: true }
  - { name: cost, type: "decimal(14,5)", maxlength: 14, default: "NULL" }
  - name: deleteFlag
    type: decimal(1)
    maxlength: 1
    default: "'0'"
    custom: "deleteFlag BETWEEN '0' AND '1'"
"#;
