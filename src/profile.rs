//! Import profiles: one YAML file holding the builder settings and the ordered
//! column rules for a CSV layout.
//!
//! ```yaml
//! staging_table: tempCsvData
//! target_table: Product
//! primary_key: productId
//! csv_charset: cp932
//! columns:
//!   - { name: productId, type: decimal(15), maxlength: 15 }
//!   - { name: cost, type: "decimal(14,5)", maxlength: 14, default: "NULL" }
//! ```
//!
//! Quote `NULL` defaults: a bare `NULL` is a YAML null and means "no default".
//! Keys that are neither builder settings nor `columns` are rejected.

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::{builder::SqlBuilder, config::BuilderConfig, schema::{ColumnRule, FieldSchema}};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportProfile {
    #[serde(flatten)]
    pub config: BuilderConfig,
    #[serde(default)]
    pub columns: Vec<ColumnRule>,
    /// Top-level keys not claimed by `config` or `columns`.
    #[serde(flatten, skip_serializing)]
    unknown: BTreeMap<String, serde_yaml::Value>,
}

impl ImportProfile {
    pub fn new(config: BuilderConfig, columns: Vec<ColumnRule>) -> Self {
        Self {
            config,
            columns,
            unknown: BTreeMap::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening profile {path:?}"))?;
        let reader = BufReader::new(file);
        let profile: Self = serde_yaml::from_reader(reader)
            .with_context(|| format!("Parsing profile YAML {path:?}"))?;
        profile
            .ensure_known_keys()
            .with_context(|| format!("Parsing profile YAML {path:?}"))?;
        Ok(profile)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let profile: Self = serde_yaml::from_str(input).context("Parsing profile YAML")?;
        profile.ensure_known_keys()?;
        Ok(profile)
    }

    fn ensure_known_keys(&self) -> Result<()> {
        if self.unknown.is_empty() {
            return Ok(());
        }
        bail!(
            "unknown profile key(s): {}",
            self.unknown.keys().map(|key| format!("`{key}`")).collect::<Vec<_>>().join(", ")
        )
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating profile {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing profile YAML")
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing profile to YAML string")
    }

    pub fn field_schema(&self) -> Result<FieldSchema> {
        FieldSchema::new(self.columns.iter().cloned()).context("Building field schema from profile")
    }

    pub fn into_builder(self) -> Result<SqlBuilder> {
        let schema = self.field_schema()?;
        Ok(SqlBuilder::new(self.config, schema))
    }
}
