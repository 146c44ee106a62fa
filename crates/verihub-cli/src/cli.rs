use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "verihub")]
#[command(about = "Verihub CLI: issue and check verification links")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server base URL
    #[arg(
        short,
        long,
        global = true,
        env = "VERIHUB_URL",
        default_value = "http://localhost:3000"
    )]
    pub server: String,

    /// Caller key sent as x-api-key when generating tokens
    #[arg(long, global = true, env = "VERIHUB_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Issue a verification link for a user id
    Generate(GenerateArgs),
    /// Check a token against a user id
    Validate(ValidateArgs),
    /// Check server health and readiness
    Status,
}

#[derive(clap::Args)]
pub struct GenerateArgs {
    /// Platform user id
    pub uid: String,
    /// Label echoed back by the server
    #[arg(long)]
    pub service: Option<String>,
}

#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Platform user id
    pub uid: String,
    /// Token from the verification link
    pub token: String,
}
