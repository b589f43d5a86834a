use anyhow::{Context, Result};
use clap::Parser;
use postman_ses::SesClient;
use postman_utils::{init_logging, resolve_config};

mod cli;
mod commands;
mod output;

use crate::{cli::Cli, commands::run, output::Output};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = resolve_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let service = SesClient::from_config(&config.aws).context("Failed to create SES client")?;

    let mut output = Output::new(std::io::stdout(), cli.verbose);
    run(cli.command, &service, &config, tokio::io::stdin(), &mut output).await
}
