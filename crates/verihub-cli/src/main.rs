mod cli;
mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use client::VerihubClient;
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();
    let client = VerihubClient::new(&cli.server, cli.api_key.clone())?;

    match &cli.command {
        Commands::Generate(args) => commands::token::generate(&client, args, format).await?,
        Commands::Validate(args) => commands::token::validate(&client, args, format).await?,
        Commands::Status => commands::server::status(&client, &cli.server, format).await?,
    }

    Ok(())
}
