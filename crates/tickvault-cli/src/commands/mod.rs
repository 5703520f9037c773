mod categories;
mod download;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Dispatch the parsed command. Returns the number of archives that failed
/// so the caller can pick the partial-failure exit code.
pub async fn run(cli: &Cli) -> Result<usize, CliError> {
    match &cli.command {
        Command::Download(args) => download::run(cli, args).await,
        Command::Categories => {
            categories::run(cli)?;
            Ok(0)
        }
    }
}
