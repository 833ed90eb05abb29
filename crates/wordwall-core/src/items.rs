//! Item store REST client
//!
//! Loads the wall's snapshot at start-up and creates new entries from the
//! command line. Uses the same base URL and token as the live feed.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::feed::{FeedEndpoint, FeedSettings};
use crate::models::Entry;

/// Request timeout in seconds
const REQUEST_TIMEOUT: u64 = 10;

/// Errors from the item store REST API
#[derive(Error, Debug)]
pub enum ItemsError {
    #[error("Item store not configured: missing {0}")]
    Unconfigured(&'static str),

    #[error("Invalid item store URL '{0}': expected http:// or https://")]
    InvalidUrl(String),

    #[error("Entry content cannot be empty")]
    EmptyContent,

    #[error("Item store returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Response envelope used by every items endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct NewItem<'a> {
    content: &'a str,
}

/// Client for `{url}/items/{collection}`
#[derive(Debug, Clone)]
pub struct ItemsClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ItemsClient {
    pub fn new(endpoint: &FeedEndpoint) -> Result<Self, ItemsError> {
        let base_url = endpoint.url.trim().trim_end_matches('/').to_string();
        let has_host = base_url
            .strip_prefix("https://")
            .or_else(|| base_url.strip_prefix("http://"))
            .is_some_and(|rest| !rest.is_empty());
        if !has_host {
            return Err(ItemsError::InvalidUrl(endpoint.url.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT))
            .user_agent(concat!("wordwall/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: endpoint.token.clone(),
        })
    }

    /// Build a client from settings, failing if they are incomplete
    pub fn from_settings(settings: &FeedSettings) -> Result<Self, ItemsError> {
        match settings {
            FeedSettings::Configured(endpoint) => Self::new(endpoint),
            FeedSettings::Unconfigured { missing } => Err(ItemsError::Unconfigured(missing)),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/items/{}", self.base_url, collection)
    }

    /// Fetch every entry in a collection
    ///
    /// Items without an id or content are skipped. No sort is requested, so
    /// collections without a `date_created` field work too; the wall sorts
    /// by creation time itself.
    pub async fn list_entries(&self, collection: &str) -> Result<Vec<Entry>, ItemsError> {
        let url = self.collection_url(collection);
        debug!("Fetching entries from {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("limit", "-1")])
            .send()
            .await?;
        let response = check_status(&url, response).await?;

        let envelope: Envelope<Vec<serde_json::Value>> = response.json().await?;
        let total = envelope.data.len();
        let entries: Vec<Entry> = envelope
            .data
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();

        if entries.len() < total {
            debug!("Skipped {} malformed items", total - entries.len());
        }
        Ok(entries)
    }

    /// Create an entry and return it as stored
    pub async fn create_entry(&self, collection: &str, content: &str) -> Result<Entry, ItemsError> {
        let content = validate_content(content)?;
        let url = self.collection_url(collection);
        debug!("Creating entry in {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&NewItem { content })
            .send()
            .await?;
        let response = check_status(&url, response).await?;

        let envelope: Envelope<Entry> = response.json().await?;
        Ok(envelope.data)
    }
}

/// Trimmed content, or an error if nothing is left
fn validate_content(content: &str) -> Result<&str, ItemsError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ItemsError::EmptyContent);
    }
    Ok(trimmed)
}

async fn check_status(url: &str, response: reqwest::Response) -> Result<reqwest::Response, ItemsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ItemsError::Status {
        url: url.to_string(),
        status,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(url: &str) -> FeedEndpoint {
        FeedEndpoint {
            url: url.to_string(),
            token: "secret".to_string(),
        }
    }

    #[test]
    fn test_collection_url() {
        let client = ItemsClient::new(&endpoint("https://cms.example.com/")).unwrap();
        assert_eq!(
            client.collection_url("texts"),
            "https://cms.example.com/items/texts"
        );
    }

    #[test]
    fn test_rejects_non_http_urls() {
        assert!(matches!(
            ItemsClient::new(&endpoint("wss://cms.example.com")),
            Err(ItemsError::InvalidUrl(_))
        ));
        assert!(matches!(
            ItemsClient::new(&endpoint("http://")),
            Err(ItemsError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_from_unconfigured_settings() {
        let result = ItemsClient::from_settings(&FeedSettings::Unconfigured { missing: "token" });
        match result {
            Err(ItemsError::Unconfigured(missing)) => assert_eq!(missing, "token"),
            other => panic!("Expected Unconfigured error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_validate_content() {
        assert_eq!(validate_content("  hello ").unwrap(), "hello");
        assert!(matches!(validate_content(""), Err(ItemsError::EmptyContent)));
        assert!(matches!(validate_content(" \n\t"), Err(ItemsError::EmptyContent)));
    }

    #[tokio::test]
    async fn test_create_empty_content_makes_no_request() {
        // unroutable port: a request would fail with Http, not EmptyContent
        let client = ItemsClient::new(&endpoint("http://127.0.0.1:9")).unwrap();
        let result = client.create_entry("texts", "   ").await;
        assert!(matches!(result, Err(ItemsError::EmptyContent)));
    }
}
