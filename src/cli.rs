use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Render staging, validation, and merge SQL for CSV imports",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the column rules defined by an import profile
    Columns(ColumnsArgs),
    /// Render a single statement from an import profile
    Render(RenderArgs),
    /// Render the staging script: drop, create, load, validate, and optionally merge
    Script(ScriptArgs),
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Import profile YAML with builder settings and column rules
    #[arg(short, long)]
    pub profile: PathBuf,
    /// Override the staging table named in the profile
    #[arg(long = "staging-table")]
    pub staging_table: Option<String>,
    /// Override the target table named in the profile
    #[arg(long = "target-table")]
    pub target_table: Option<String>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Import profile YAML with builder settings and column rules
    #[arg(short, long)]
    pub profile: PathBuf,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,
    #[command(subcommand)]
    pub statement: StatementKind,
}

#[derive(Debug, Subcommand)]
pub enum StatementKind {
    /// DROP TABLE IF EXISTS for the staging table
    Drop,
    /// CREATE TABLE for the staging table
    Create,
    /// LOAD DATA from a CSV file into the staging table
    Load {
        /// CSV path as the database server or client will see it
        file: String,
    },
    /// Per-field validation query
    Validate,
    /// Duplicate key query over one or more comma-separated columns
    Duplicates {
        #[arg(value_delimiter = ',', required = true)]
        columns: Vec<String>,
    },
    /// Query for values missing from a foreign table
    ForeignKey {
        /// Staging column to check
        column: String,
        /// Foreign table that must contain the value
        #[arg(long)]
        table: String,
        /// Column of the foreign table (defaults to the staging column name)
        #[arg(long = "foreign-column")]
        foreign_column: Option<String>,
        /// Extra SQL condition applied to the foreign table
        #[arg(long)]
        condition: Option<String>,
    },
    /// Number rows whose column is still 0
    Sequence {
        column: String,
        /// Lowest number to continue from
        #[arg(long, default_value_t = 0)]
        base: u64,
    },
    /// Number rows whose code column is still '0' as <prefix><number>
    PrefixedSequence {
        column: String,
        #[arg(long)]
        prefix: String,
        /// Zero-padding mask such as 00000; '#' appends the number unpadded
        #[arg(long, default_value = "#")]
        mask: String,
        /// Lowest number to continue from
        #[arg(long, default_value_t = 0)]
        base: u64,
    },
    /// UPDATE target rows that match a staged primary key
    Update {
        /// Bind a fixed value to a column, as name=value (JSON or plain text)
        #[arg(long = "set", value_parser = parse_override, action = clap::ArgAction::Append)]
        overrides: Vec<(String, Value)>,
    },
    /// INSERT staged rows missing from the target table
    Insert {
        /// Bind a fixed value to a column, as name=value (JSON or plain text)
        #[arg(long = "set", value_parser = parse_override, action = clap::ArgAction::Append)]
        overrides: Vec<(String, Value)>,
    },
}

#[derive(Debug, Args)]
pub struct ScriptArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,
    /// CSV path to load
    #[arg(short, long)]
    pub input: String,
    /// Also check these comma-separated columns for duplicates
    #[arg(long = "unique", value_delimiter = ',')]
    pub unique: Vec<String>,
    /// Append the merge UPDATE and INSERT statements
    #[arg(long)]
    pub merge: bool,
}

pub fn parse_override(value: &str) -> Result<(String, Value), String> {
    let (name, raw) = value
        .split_once('=')
        .ok_or_else(|| format!("Override '{value}' must use the form name=value"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Override '{value}' is missing a column name"));
    }
    let parsed = serde_json::from_str(raw.trim())
        .unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), parsed))
}
