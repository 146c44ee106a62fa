use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Successful `/generate` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IssuedLink {
    pub uid: String,
    pub token: String,
    pub url: String,
    pub expires_in: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

/// Successful `/validate` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidatedUid {
    pub uid: String,
}

pub struct VerihubClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl VerihubClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let parsed = url::Url::parse(base_url)
            .with_context(|| format!("Invalid server URL: {base_url}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Server URL must use http or https: {base_url}");
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Turns a relative verification link into an absolute one.
    pub fn absolute(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            self.url(link)
        }
    }

    pub async fn generate(&self, uid: &str, service: Option<&str>) -> Result<IssuedLink> {
        let api_key = self
            .api_key
            .as_deref()
            .context("An API key is required to generate tokens (--api-key or VERIHUB_API_KEY)")?;

        let mut body = json!({ "uid": uid });
        if let Some(service) = service {
            body["service"] = json!(service);
        }

        let resp = self
            .http
            .post(self.url("generate"))
            .header("x-api-key", api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to connect to server")?;
        let body = handle_response(resp).await?;
        parse_body(body, "generate")
    }

    pub async fn validate(&self, uid: &str, token: &str) -> Result<ValidatedUid> {
        let resp = self
            .http
            .post(self.url("validate"))
            .json(&json!({ "uid": uid, "token": token }))
            .send()
            .await
            .context("Failed to connect to server")?;
        let body = handle_response(resp).await?;
        parse_body(body, "validate")
    }

    pub async fn probe(&self, path: &str) -> Result<(u16, String)> {
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .context("Failed to connect to server")?;
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Ok((status, body))
    }
}

async fn handle_response(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        match error_message(&body) {
            Some(msg) => anyhow::bail!("HTTP {status}: {msg}"),
            None => anyhow::bail!("HTTP {status}: {body}"),
        }
    }

    if body.is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body).context("Failed to parse response JSON")
}

fn parse_body<T: serde::de::DeserializeOwned>(body: Value, endpoint: &str) -> Result<T> {
    serde_json::from_value(body)
        .with_context(|| format!("Unexpected response from /{endpoint}"))
}

/// Extracts `error` from a `{"success": false, "error": ...}` body.
fn error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("error")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_urls() {
        assert!(VerihubClient::new("ftp://example.com", None).is_err());
        assert!(VerihubClient::new("not a url", None).is_err());
        assert!(VerihubClient::new("http://localhost:3000/", None).is_ok());
    }

    #[test]
    fn joins_paths() {
        let client = VerihubClient::new("http://localhost:3000/", None).unwrap();
        assert_eq!(client.url("/validate"), "http://localhost:3000/validate");
        assert_eq!(
            client.absolute("/verify?uid=1&token=t"),
            "http://localhost:3000/verify?uid=1&token=t"
        );
        assert_eq!(
            client.absolute("https://verify.example.com/verify?uid=1"),
            "https://verify.example.com/verify?uid=1"
        );
    }

    #[test]
    fn extracts_error_field() {
        assert_eq!(
            error_message(r#"{"success":false,"error":"Invalid API key"}"#).as_deref(),
            Some("Invalid API key")
        );
        assert!(error_message("<html>").is_none());
    }

    #[test]
    fn parses_issued_link() {
        let link: IssuedLink = parse_body(
            json!({
                "success": true,
                "uid": "12345",
                "token": "a.b.c",
                "url": "/verify?uid=12345&token=a.b.c",
                "expiresIn": "7days",
                "expiresAt": 1_700_000_000,
            }),
            "generate",
        )
        .unwrap();
        assert_eq!(link.uid, "12345");
        assert_eq!(link.expires_at, Some(1_700_000_000));
        assert!(link.service.is_none());
    }

    #[test]
    fn rejects_malformed_issue_responses() {
        for body in [json!([1, 2]), json!("ok"), Value::Null, json!({ "uid": "12345", "token": "t" })] {
            let err = parse_body::<IssuedLink>(body, "generate").unwrap_err();
            assert!(err.to_string().contains("/generate"), "{err}");
        }
    }

    #[tokio::test]
    async fn generate_without_key_fails_locally() {
        let client = VerihubClient::new("http://127.0.0.1:9", None).unwrap();
        let err = client.generate("12345", None).await.unwrap_err();
        assert!(err.to_string().contains("API key"));
    }
}
