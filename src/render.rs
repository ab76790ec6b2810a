//! `render` and `script` commands: build statements from a profile and print
//! them through the [`DumpExecutor`].

use std::io;

use anyhow::{Context, Result};
use log::info;

use crate::{
    builder::SqlBuilder,
    cli::{ProfileArgs, RenderArgs, ScriptArgs, StatementKind},
    executor::{DumpExecutor, Executor},
    importer::Importer,
    printable_token,
    profile::ImportProfile,
    statement::Statement,
};

fn load_builder(args: &ProfileArgs) -> Result<SqlBuilder> {
    let mut profile = ImportProfile::load(&args.profile)
        .with_context(|| format!("Loading profile from {:?}", args.profile))?;
    if let Some(staging) = &args.staging_table {
        profile.config.staging_table = Some(staging.clone());
    }
    if let Some(target) = &args.target_table {
        profile.config.target_table = Some(target.clone());
    }
    profile.into_builder()
}

pub fn execute(args: &RenderArgs) -> Result<()> {
    let builder = load_builder(&args.profile)?;
    let statement = render_statement(&builder, &args.statement)?;
    let mut dump = DumpExecutor::new(io::stdout().lock());
    dump.execute(&statement.sql, statement.bindings(), statement.tag)
        .context("Writing statement to stdout")?;
    Ok(())
}

fn render_statement(builder: &SqlBuilder, kind: &StatementKind) -> Result<Statement> {
    let statement = match kind {
        StatementKind::Drop => builder.render_drop_staging()?,
        StatementKind::Create => builder.render_create_staging()?,
        StatementKind::Load { file } => builder.render_bulk_load(file)?,
        StatementKind::Validate => builder.render_validate_all_fields()?,
        StatementKind::Duplicates { columns } => builder.render_validate_duplicate(columns)?,
        StatementKind::ForeignKey {
            column,
            table,
            foreign_column,
            condition,
        } => builder.render_validate_foreign_key(
            column,
            foreign_column.as_deref().unwrap_or(column),
            table,
            condition.as_deref(),
        )?,
        StatementKind::Sequence { column, base } => {
            builder.render_assign_sequence(column, *base, None)?
        }
        StatementKind::PrefixedSequence {
            column,
            prefix,
            mask,
            base,
        } => builder.render_assign_prefixed_sequence(column, prefix, mask, *base, None)?,
        StatementKind::Update { overrides } => builder.render_merge_update(overrides)?,
        StatementKind::Insert { overrides } => builder.render_merge_insert(overrides)?,
    };
    Ok(statement)
}

pub fn execute_script(args: &ScriptArgs) -> Result<()> {
    let builder = load_builder(&args.profile)?;
    let dialect = &builder.config().dialect;
    info!(
        "Scripting import of '{}' (separator '{}', line terminator '{}')",
        args.input,
        printable_token(&dialect.separator),
        printable_token(&dialect.line_terminator)
    );

    let mut importer = Importer::new(builder, DumpExecutor::new(io::stdout().lock()));
    importer.create()?;
    importer.import(&args.input)?;
    importer.validate_all_fields()?;
    if !args.unique.is_empty() {
        importer.validate_duplicate(&args.unique)?;
    }
    if args.merge {
        importer.update_existing(&[])?;
        importer.insert_new(&[])?;
    }
    Ok(())
}
