//! Web tools -- DuckDuckGo instant answers and raw page fetches.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use clawd_agent::tools::require_str;
use clawd_agent::{ToolArgs, ToolError, ToolHandler, ToolRegistry};

use crate::error::{AdapterError, Result};

/// DuckDuckGo instant-answer API.
pub const DUCKDUCKGO_API_URL: &str = "https://api.duckduckgo.com/";

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Related topics included in a search answer.
const MAX_TOPICS: usize = 3;
/// Characters kept per related topic.
const MAX_TOPIC_CHARS: usize = 200;
/// Characters of a fetched page returned.
pub const MAX_FETCH_CHARS: usize = 5_000;

const USER_AGENT: &str = concat!("clawd/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for the web tools.
#[derive(Debug, Clone)]
pub struct WebTools {
    client: reqwest::Client,
    search_url: String,
}

impl WebTools {
    /// Build the client.  Redirects are followed (reqwest's default policy).
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| AdapterError::ConfigError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            search_url: DUCKDUCKGO_API_URL.to_owned(),
        })
    }

    /// Point `web_search` at another instant-answer compatible endpoint.
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    /// Summary plus up to three related topics, or `No results found`.
    pub async fn search(&self, query: &str) -> Result<String> {
        debug!(query, "web search");
        let answer: Value = self
            .client
            .get(&self.search_url)
            .query(&[("q", query), ("format", "json"), ("no_html", "1")])
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await?
            .json()
            .await?;
        Ok(format_instant_answer(&answer))
    }

    /// The first [`MAX_FETCH_CHARS`] characters of the response body,
    /// whatever the status.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        debug!(url, "fetching url");
        let body = self
            .client
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?
            .text()
            .await?;
        Ok(body.chars().take(MAX_FETCH_CHARS).collect())
    }
}

/// Render an instant-answer document as plain text.
pub fn format_instant_answer(answer: &Value) -> String {
    let mut lines = Vec::new();

    if let Some(summary) = answer["AbstractText"].as_str().filter(|s| !s.is_empty()) {
        lines.push(format!("Summary: {summary}"));
    }

    if let Some(topics) = answer["RelatedTopics"].as_array() {
        lines.extend(topics.iter().take(MAX_TOPICS).filter_map(|topic| {
            let text = topic["Text"].as_str().filter(|t| !t.is_empty())?;
            Some(format!("- {}", text.chars().take(MAX_TOPIC_CHARS).collect::<String>()))
        }));
    }

    if lines.is_empty() {
        "No results found".to_owned()
    } else {
        lines.join("\n")
    }
}

// ---------------------------------------------------------------------------
// Tool wiring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum WebOp {
    Search,
    Fetch,
}

struct WebTool {
    web: Arc<WebTools>,
    op: WebOp,
}

#[async_trait]
impl ToolHandler for WebTool {
    async fn call(&self, args: ToolArgs) -> std::result::Result<String, ToolError> {
        let output = match self.op {
            WebOp::Search => self.web.search(require_str(&args, "query")?).await?,
            WebOp::Fetch => self.web.fetch(require_str(&args, "url")?).await?,
        };
        Ok(output)
    }
}

/// Register `web_search` and `fetch_url`.
pub fn register(registry: &mut ToolRegistry, web: Arc<WebTools>) {
    registry.register(
        "web_search",
        "Search the web for information",
        Arc::new(WebTool {
            web: Arc::clone(&web),
            op: WebOp::Search,
        }),
        Some(json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query"}
            },
            "required": ["query"]
        })),
    );
    registry.register(
        "fetch_url",
        "Fetch content from a URL",
        Arc::new(WebTool {
            web,
            op: WebOp::Fetch,
        }),
        Some(json!({
            "type": "object",
            "properties": {
                "url": {"type": "string", "description": "URL to fetch"}
            },
            "required": ["url"]
        })),
    );
}
