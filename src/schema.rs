//! Field schema model: the ordered column rules that describe a CSV file.
//!
//! A [`FieldSchema`] owns one [`ColumnRule`] per CSV column in declaration
//! order together with a name index. Declaration order is significant: it
//! drives the column order of the staging table, the `LOAD DATA` column list,
//! and the merge `INSERT`.
//!
//! ## Raw SQL fragments
//!
//! [`ColumnRule::default_expression`], [`ColumnRule::custom_expression`], and
//! [`ColumnRule::raw_column_definition`] are written by the schema author and
//! are pasted into statements verbatim. A string default must therefore carry
//! its own quotes (`"'abc'"`), while `NULL`, `'0'`, or `NOW()` are used as-is.
//! They are never escaped or bound as parameters.

use std::{collections::HashMap, fmt, str::FromStr, sync::OnceLock};

use log::warn;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{
    error::{Error, Result},
    sql,
};

const DECIMAL_MAX_PRECISION: u32 = 65;
const DECIMAL_MAX_SCALE: u32 = 30;

/// Widest staging column still rendered as `VARCHAR`; anything wider is `TEXT`.
pub const VARCHAR_MAX_WIDTH: u32 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalSpec {
    pub precision: u32,
    pub scale: Option<u32>,
}

impl DecimalSpec {
    pub fn new(precision: u32, scale: Option<u32>) -> Result<Self> {
        let spec = Self { precision, scale };
        spec.ensure_valid()?;
        Ok(spec)
    }

    fn ensure_valid(&self) -> Result<()> {
        if self.precision == 0 || self.precision > DECIMAL_MAX_PRECISION {
            return Err(Error::schema(format!(
                "decimal precision must be between 1 and {DECIMAL_MAX_PRECISION}, got {}",
                self.precision
            )));
        }
        if let Some(scale) = self.scale
            && (scale > self.precision || scale > DECIMAL_MAX_SCALE)
        {
            return Err(Error::schema(format!(
                "decimal scale {scale} exceeds precision {} or the maximum of {DECIMAL_MAX_SCALE}",
                self.precision
            )));
        }
        Ok(())
    }
}

impl fmt::Display for DecimalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scale {
            Some(scale) => write!(f, "decimal({},{})", self.precision, scale),
            None => write!(f, "decimal({})", self.precision),
        }
    }
}

/// Declared type of a CSV column. Staged values are always text; the type only
/// selects which validation check `validate_all_fields` emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Varchar,
    Text,
    Decimal(DecimalSpec),
    Date,
    DateTime,
    Alphanumeric,
}

impl SqlType {
    pub fn variants() -> &'static [&'static str] {
        &[
            "varchar",
            "text",
            "decimal(n)",
            "decimal(n,m)",
            "date",
            "datetime",
            "alphanumeric",
        ]
    }

    pub fn decimal_spec(&self) -> Option<&DecimalSpec> {
        match self {
            SqlType::Decimal(spec) => Some(spec),
            _ => None,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Varchar => f.write_str("varchar"),
            SqlType::Text => f.write_str("text"),
            SqlType::Decimal(spec) => write!(f, "{spec}"),
            SqlType::Date => f.write_str("date"),
            SqlType::DateTime => f.write_str("datetime"),
            SqlType::Alphanumeric => f.write_str("alphanumeric"),
        }
    }
}

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^decimal\s*\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\)$")
            .expect("decimal pattern compiles")
    })
}

impl FromStr for SqlType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "varchar" => Ok(SqlType::Varchar),
            "text" => Ok(SqlType::Text),
            "date" => Ok(SqlType::Date),
            "datetime" => Ok(SqlType::DateTime),
            "alphanumeric" => Ok(SqlType::Alphanumeric),
            other if other.starts_with("decimal") => {
                let captures = decimal_pattern().captures(other).ok_or_else(|| {
                    Error::schema(format!(
                        "decimal type '{value}' must look like decimal(15) or decimal(8,2)"
                    ))
                })?;
                let parse = |text: &str| {
                    text.parse::<u32>().map_err(|_| {
                        Error::schema(format!("decimal type '{value}' has an oversized digit"))
                    })
                };
                let precision = parse(&captures[1])?;
                let scale = captures.get(2).map(|m| parse(m.as_str())).transpose()?;
                Ok(SqlType::Decimal(DecimalSpec::new(precision, scale)?))
            }
            _ => Err(Error::schema(format!(
                "unknown column type '{value}'. Supported types: {}",
                SqlType::variants().join(", ")
            ))),
        }
    }
}

impl Serialize for SqlType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SqlType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        SqlType::from_str(&token).map_err(de::Error::custom)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Validation and staging rules for one CSV column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnRule {
    pub name: String,
    #[serde(rename = "type")]
    pub sql_type: SqlType,
    #[serde(rename = "maxlength", alias = "max_length")]
    pub max_length: u32,
    /// Full staging column definition used instead of the generated one.
    #[serde(
        default,
        rename = "field",
        alias = "raw_column_definition",
        skip_serializing_if = "Option::is_none"
    )]
    pub raw_column_definition: Option<String>,
    /// SQL expression loaded in place of an empty CSV value.
    #[serde(
        default,
        rename = "default",
        alias = "default_expression",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_expression: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// SQL boolean expression every non-empty value must satisfy.
    #[serde(
        default,
        rename = "custom",
        alias = "custom_expression",
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_expression: Option<String>,
    /// Leave this column out of the merge `UPDATE` and `INSERT`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub skip: bool,
}

impl ColumnRule {
    pub fn new(name: impl Into<String>, sql_type: SqlType, max_length: u32) -> Self {
        Self {
            name: name.into(),
            sql_type,
            max_length,
            raw_column_definition: None,
            default_expression: None,
            required: false,
            custom_expression: None,
            skip: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn with_default(mut self, expression: impl Into<String>) -> Self {
        self.default_expression = Some(expression.into());
        self
    }

    pub fn with_custom(mut self, expression: impl Into<String>) -> Self {
        self.custom_expression = Some(expression.into());
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.raw_column_definition = Some(definition.into());
        self
    }

    /// Width of the staging column: one wider than the accepted length so that
    /// over-long values survive the load and fail `maxlength` instead of being
    /// truncated.
    pub fn staging_width(&self) -> u32 {
        self.max_length.saturating_add(1)
    }

    pub fn staging_type(&self) -> String {
        let width = self.staging_width();
        if width > VARCHAR_MAX_WIDTH {
            "TEXT".to_string()
        } else {
            format!("VARCHAR({width})")
        }
    }

    /// `NULL` defaults get an `IS NOT NULL` test rather than an inequality.
    pub fn defaults_to_null(&self) -> bool {
        self.default_expression
            .as_deref()
            .is_some_and(|expr| expr.trim().eq_ignore_ascii_case("NULL"))
    }

    fn ensure_valid(&self) -> Result<()> {
        if !sql::is_identifier(&self.name) {
            return Err(Error::schema(format!(
                "column name '{}' is not a plain SQL identifier",
                self.name
            )));
        }
        if self.max_length == 0 {
            return Err(Error::schema(format!(
                "column '{}' must declare a positive maxlength",
                self.name
            )));
        }
        if let SqlType::Decimal(spec) = &self.sql_type {
            spec.ensure_valid()
                .map_err(|err| Error::schema(format!("column '{}': {err}", self.name)))?;
        }
        Ok(())
    }
}

/// Ordered set of column rules with a by-name index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSchema {
    rules: Vec<ColumnRule>,
    index: HashMap<String, usize>,
}

impl FieldSchema {
    pub fn new<I>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = ColumnRule>,
    {
        let mut schema = Self::default();
        schema.set_schema(rules)?;
        Ok(schema)
    }

    /// Replaces every rule and rebuilds the name index.
    ///
    /// A rule whose name was already declared replaces the earlier rule in
    /// place: the column keeps its first position but takes the later rule's
    /// settings. The current schema is left untouched when any rule is invalid.
    pub fn set_schema<I>(&mut self, rules: I) -> Result<()>
    where
        I: IntoIterator<Item = ColumnRule>,
    {
        let mut ordered: Vec<ColumnRule> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for rule in rules {
            rule.ensure_valid()?;
            match index.get(&rule.name) {
                Some(&position) => {
                    warn!(
                        "Column '{}' is declared more than once; the later rule replaces the earlier one",
                        rule.name
                    );
                    ordered[position] = rule;
                }
                None => {
                    index.insert(rule.name.clone(), ordered.len());
                    ordered.push(rule);
                }
            }
        }
        self.rules = ordered;
        self.index = index;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnRule> {
        self.rules.iter()
    }

    pub fn rules(&self) -> &[ColumnRule] {
        &self.rules
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&ColumnRule> {
        self.index.get(name).map(|&position| &self.rules[position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub(crate) fn ensure_not_empty(&self) -> Result<()> {
        if self.is_empty() {
            Err(Error::config("the CSV schema does not define any columns"))
        } else {
            Ok(())
        }
    }

    /// Looks up a rule that a statement refers to by name.
    pub fn require(&self, name: &str) -> Result<&ColumnRule> {
        self.ensure_not_empty()?;
        self.get(name)
            .ok_or_else(|| Error::schema(format!("column '{name}' is not part of the schema")))
    }

    /// SQL condition that holds when the staged value of `column` is not the
    /// column's empty representation.
    ///
    /// Required columns have no empty exemption and always yield `1=1`.
    pub fn not_default_expression(&self, column: &str) -> Result<String> {
        let rule = self.require(column)?;
        let name = &rule.name;
        let expression = if rule.required {
            "1=1".to_string()
        } else if rule.defaults_to_null() {
            format!("{name} IS NOT NULL")
        } else if let Some(default) = &rule.default_expression {
            format!("{name} != {default}")
        } else {
            format!("{name} != ''")
        };
        Ok(expression)
    }
}

impl<'a> IntoIterator for &'a FieldSchema {
    type Item = &'a ColumnRule;
    type IntoIter = std::slice::Iter<'a, ColumnRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
