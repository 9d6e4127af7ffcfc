use crate::schema::{Arguments, Signature};
use crate::traits::Tool;
use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;

const WIKIPEDIA_API: &str = "https://en.wikipedia.org/w/api.php";
const MAX_RESULTS: i64 = 10;

pub struct WikipediaSearchTool {
    client: reqwest::Client,
    endpoint: String,
}

impl WikipediaSearchTool {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent(concat!("relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build Wikipedia HTTP client")?;

        Ok(Self {
            client,
            endpoint: WIKIPEDIA_API.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Renders an opensearch response: `[query, [titles], [descriptions], [urls]]`.
fn render_opensearch(query: &str, body: &Value) -> anyhow::Result<String> {
    let titles = body
        .get(1)
        .and_then(Value::as_array)
        .context("unexpected response shape from Wikipedia")?;
    let urls = body.get(3).and_then(Value::as_array);

    if titles.is_empty() {
        return Ok(format!("No Wikipedia articles found for '{}'", query));
    }

    let lines: Vec<String> = titles
        .iter()
        .enumerate()
        .filter_map(|(i, title)| {
            let title = title.as_str()?;
            let url = urls
                .and_then(|u| u.get(i))
                .and_then(Value::as_str)
                .unwrap_or_default();
            Some(format!("- {} {}", title, url).trim_end().to_string())
        })
        .collect();

    Ok(lines.join("\n"))
}

#[async_trait]
impl Tool for WikipediaSearchTool {
    fn signature(&self) -> Signature {
        Signature::new("search_wikipedia")
            .doc("Search Wikipedia and return matching article titles with links")
            .param("query", "string")
            .optional("limit", "integer", 3)
    }

    async fn call(&self, args: Arguments) -> anyhow::Result<String> {
        let query = args.str("query")?;
        let limit = args.i64("limit")?.clamp(1, MAX_RESULTS).to_string();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "opensearch"),
                ("format", "json"),
                ("search", query),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .context("Wikipedia request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Wikipedia returned {}", response.status());
        }

        let body: Value = response
            .json()
            .await
            .context("Wikipedia returned invalid JSON")?;

        render_opensearch(query, &body)
    }
}
