use anyhow::Result;

use crate::cli::{GenerateArgs, OutputFormat, ValidateArgs};
use crate::client::VerihubClient;
use crate::output::{is_json, print_field, print_json, print_success};

pub async fn generate(client: &VerihubClient, args: &GenerateArgs, format: OutputFormat) -> Result<()> {
    let mut issued = client.generate(&args.uid, args.service.as_deref()).await?;
    issued.url = client.absolute(&issued.url);

    if is_json(format) {
        print_json(&serde_json::to_value(&issued)?);
        return Ok(());
    }

    print_success(&format!("Verification link issued for {}", issued.uid));
    print_field("URL", &issued.url);
    print_field("Expires in", &issued.expires_in);
    if let Some(at) = issued.expires_at {
        print_field("Expires at", &at.to_string());
    }
    if let Some(service) = &issued.service {
        print_field("Service", service);
    }
    Ok(())
}

pub async fn validate(client: &VerihubClient, args: &ValidateArgs, format: OutputFormat) -> Result<()> {
    let result = client.validate(&args.uid, &args.token).await?;

    if is_json(format) {
        print_json(&serde_json::to_value(&result)?);
    } else {
        print_success(&format!("Token is valid for {}", result.uid));
    }
    Ok(())
}
