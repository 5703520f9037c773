//! List the registered data categories and their schemas.

use std::io::Write;

use tickvault_core::CategoryRegistry;

use crate::cli::{Cli, OutputFormat};
use crate::error::CliError;
use crate::output;

pub fn run(cli: &Cli) -> Result<(), CliError> {
    let registry = CategoryRegistry::builtin();
    let mut target = output::open_target(None)?;

    match cli.format {
        OutputFormat::Csv => output::write_categories_csv(&mut target, &registry)?,
        OutputFormat::Json => writeln!(
            target,
            "{}",
            output::render_categories_json(&registry, cli.pretty)?
        )?,
        OutputFormat::Table => {
            writeln!(target, "{}", output::render_categories_table(&registry))?;
        }
    }

    Ok(())
}
