//! Naming and dialect settings consumed by the statement builder.
//!
//! Table names carry no placeholder defaults: a statement that needs a table
//! that was never configured fails with [`Error::Config`] instead of rendering
//! against a made-up name.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    sql,
};

pub const DEFAULT_RECORD_ID: &str = "id";
pub const DEFAULT_CHARSET: &str = "utf8";

/// Primary key of the target table, as matched between target and staging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Single(String),
    Composite(Vec<String>),
}

impl PrimaryKey {
    pub fn columns(&self) -> Vec<&str> {
        match self {
            PrimaryKey::Single(column) => vec![column.as_str()],
            PrimaryKey::Composite(columns) => columns.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for PrimaryKey {
    fn from(value: &str) -> Self {
        PrimaryKey::Single(value.to_string())
    }
}

impl From<Vec<&str>> for PrimaryKey {
    fn from(values: Vec<&str>) -> Self {
        PrimaryKey::Composite(values.into_iter().map(str::to_string).collect())
    }
}

/// Field and line delimiters handed to `LOAD DATA`, stored as raw characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsvDialect {
    pub separator: String,
    pub enclosure: String,
    pub line_terminator: String,
    pub line_start: String,
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            separator: ",".to_string(),
            enclosure: "\"".to_string(),
            line_terminator: "\r\n".to_string(),
            line_start: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderConfig {
    /// Table the CSV is bulk-loaded into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_table: Option<String>,
    /// Table the staged rows are merged into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<PrimaryKey>,
    /// Auto-increment column of the staging table; doubles as the CSV row number.
    pub record_id: String,
    pub dialect: CsvDialect,
    /// Skip the first line of the file when loading.
    pub has_header: bool,
    /// Create the staging table as `TEMPORARY`.
    pub temporary: bool,
    pub table_charset: String,
    pub csv_charset: String,
    /// Log every statement at info level before it is executed.
    pub dump_sql: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            staging_table: None,
            target_table: None,
            primary_key: None,
            record_id: DEFAULT_RECORD_ID.to_string(),
            dialect: CsvDialect::default(),
            has_header: true,
            temporary: true,
            table_charset: DEFAULT_CHARSET.to_string(),
            csv_charset: DEFAULT_CHARSET.to_string(),
            dump_sql: false,
        }
    }
}

impl BuilderConfig {
    pub fn with_staging_table(mut self, name: impl Into<String>) -> Self {
        self.staging_table = Some(name.into());
        self
    }

    pub fn with_target_table(mut self, name: impl Into<String>) -> Self {
        self.target_table = Some(name.into());
        self
    }

    pub fn with_primary_key(mut self, key: impl Into<PrimaryKey>) -> Self {
        self.primary_key = Some(key.into());
        self
    }

    pub fn staging_table(&self) -> Result<&str> {
        let name = non_empty(self.staging_table.as_deref())
            .ok_or_else(|| Error::config("no staging table to import into is configured"))?;
        sql::ensure_table_name("staging table", name)?;
        Ok(name)
    }

    /// The configured target table, unless `explicit` names another one.
    pub fn target_table<'a>(&'a self, explicit: Option<&'a str>) -> Result<&'a str> {
        let name = non_empty(explicit)
            .or_else(|| non_empty(self.target_table.as_deref()))
            .ok_or_else(|| Error::config("no target table is configured"))?;
        sql::ensure_table_name("target table", name)?;
        Ok(name)
    }

    pub fn primary_key_columns(&self) -> Result<Vec<&str>> {
        let columns = self
            .primary_key
            .as_ref()
            .map(PrimaryKey::columns)
            .unwrap_or_default();
        if columns.is_empty() {
            return Err(Error::config("no target primary key is configured"));
        }
        for column in &columns {
            sql::ensure_column_name("primary key column", column)?;
        }
        Ok(columns)
    }

    pub fn record_id(&self) -> Result<&str> {
        sql::ensure_column_name("record id column", &self.record_id)?;
        Ok(&self.record_id)
    }

    pub fn table_charset(&self) -> Result<&str> {
        sql::ensure_charset("table charset", &self.table_charset)?;
        Ok(&self.table_charset)
    }

    pub fn csv_charset(&self) -> Result<&str> {
        sql::ensure_charset("csv charset", &self.csv_charset)?;
        Ok(&self.csv_charset)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|name| !name.is_empty())
}
