use anyhow::Result;
use colored::Colorize;
use serde_json::{Value, json};

use crate::cli::OutputFormat;
use crate::client::VerihubClient;
use crate::output::{is_json, print_failure, print_json};

pub async fn status(client: &VerihubClient, server: &str, format: OutputFormat) -> Result<()> {
    let (health_code, health_body) = client.probe("healthz").await?;
    let (ready_code, ready_body) = client.probe("readyz").await?;

    if is_json(format) {
        let parse = |b: &str| serde_json::from_str::<Value>(b).unwrap_or(Value::String(b.to_string()));
        print_json(&json!({
            "healthz": { "status": health_code, "body": parse(&health_body) },
            "readyz": { "status": ready_code, "body": parse(&ready_body) },
        }));
    } else if health_code != 200 {
        print_failure(&format!("{} returned {} {}", server.cyan(), health_code.to_string().red(), health_body));
    } else if ready_code == 200 {
        println!("{} {} is {}", "✓".green(), server.cyan(), "ready".green());
    } else {
        println!(
            "{} {} is up but {} ({})",
            "!".yellow(),
            server.cyan(),
            "not ready".yellow(),
            ready_body
        );
    }

    if health_code != 200 {
        anyhow::bail!("server is unhealthy");
    }
    Ok(())
}
