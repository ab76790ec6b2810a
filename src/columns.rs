//! Column listing from an import profile.
//!
//! Loads the profile and renders each column rule (type, accepted length,
//! staging type, and the optional rule settings) as a plain-text table.

use anyhow::{Context, Result};
use log::info;

use crate::{cli::ColumnsArgs, profile::ImportProfile, table};

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let profile = ImportProfile::load(&args.profile)
        .with_context(|| format!("Loading profile from {:?}", args.profile))?;
    let schema = profile.field_schema()?;

    if schema.is_empty() {
        info!("Profile {:?} does not define any columns", args.profile);
        return Ok(());
    }

    let flag = |set: bool| if set { "yes".to_string() } else { String::new() };
    let rows = schema
        .iter()
        .enumerate()
        .map(|(idx, rule)| {
            vec![
                (idx + 1).to_string(),
                rule.name.clone(),
                rule.sql_type.to_string(),
                rule.max_length.to_string(),
                match &rule.raw_column_definition {
                    Some(_) => "custom".to_string(),
                    None => rule.staging_type(),
                },
                flag(rule.required),
                rule.default_expression.clone().unwrap_or_default(),
                rule.custom_expression.clone().unwrap_or_default(),
                flag(rule.skip),
            ]
        })
        .collect::<Vec<_>>();

    table::print_table(
        &[
            "#", "name", "type", "maxlength", "staging", "required", "default", "custom", "skip",
        ],
        &rows,
    );
    info!("Listed {} column(s) from {:?}", schema.len(), args.profile);
    Ok(())
}
