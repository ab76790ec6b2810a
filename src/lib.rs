//! Stage CSV files into a MySQL table with `LOAD DATA`, then validate and merge
//! them with generated SQL.
//!
//! The core is [`SqlBuilder`]: given a [`BuilderConfig`] and a [`FieldSchema`]
//! it renders every statement of an import as a [`Statement`]. Running them is
//! up to an [`Executor`]; [`Importer`] pairs the two for the usual workflow.

pub mod builder;
pub mod cli;
pub mod columns;
pub mod config;
pub mod error;
pub mod executor;
pub mod importer;
pub mod profile;
pub mod render;
pub mod report;
pub mod schema;
pub mod sql;
pub mod statement;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

pub use crate::{
    builder::{ErrorKind, FieldCheck, SqlBuilder},
    config::{BuilderConfig, CsvDialect, PrimaryKey},
    error::{Error, ExecutionError},
    executor::{DumpExecutor, Executor, Outcome, Row},
    importer::Importer,
    profile::ImportProfile,
    report::{FieldError, RecordFailure, ValidationReport},
    schema::{ColumnRule, DecimalSpec, FieldSchema, SqlType},
    statement::{OperationTag, Overrides, Params, Statement},
};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_staging", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Columns(args) => columns::execute(&args),
        Commands::Render(args) => render::execute(&args),
        Commands::Script(args) => render::execute_script(&args),
    }
}

pub(crate) fn printable_token(token: &str) -> String {
    token
        .chars()
        .map(|ch| match ch {
            '\t' => "\\t".to_string(),
            '\r' => "\\r".to_string(),
            '\n' => "\\n".to_string(),
            other => other.to_string(),
        })
        .collect()
}
