use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    let cli = caseharvest::cli::Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    caseharvest::logging::init(level).context("init logging")?;
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        caseharvest::cli::Command::Cases(args) => {
            caseharvest::cases::run(args).context("cases")?;
        }
        caseharvest::cli::Command::Series(args) => {
            caseharvest::series::run(args).context("series")?;
        }
    }

    Ok(())
}
