//! Pinecone memory store.
//!
//! Talks to an index created with integrated embedding, so records are sent
//! as text and Pinecone embeds them server-side.
//!
//! - upsert: `POST {host}/records/namespaces/{ns}/upsert` (NDJSON body)
//! - search: `POST {host}/records/namespaces/{ns}/search`

use super::vectorstore::{MemoryMatch, MemoryStore};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const API_VERSION: &str = "2025-04";
const DEFAULT_NAMESPACE: &str = "__default__";

pub struct PineconeStore {
    client: Client,
    index_host: String,
    namespace: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SearchReply {
    result: SearchResultBody,
}

#[derive(Debug, Deserialize)]
struct SearchResultBody {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: f32,
    #[serde(default)]
    fields: HitFields,
}

#[derive(Debug, Default, Deserialize)]
struct HitFields {
    #[serde(default)]
    text: Option<String>,
}

impl PineconeStore {
    pub fn new(index_host: String, namespace: String, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Memory(format!("Failed to build HTTP client: {}", e)))?;

        let index_host = if index_host.starts_with("http://") || index_host.starts_with("https://") {
            index_host
        } else {
            format!("https://{}", index_host)
        };

        Ok(Self {
            client,
            index_host: index_host.trim_end_matches('/').to_string(),
            namespace,
            api_key,
        })
    }

    fn endpoint(&self, operation: &str) -> String {
        let namespace = if self.namespace.is_empty() {
            DEFAULT_NAMESPACE
        } else {
            &self.namespace
        };
        format!(
            "{}/records/namespaces/{}/{}",
            self.index_host,
            urlencoding::encode(namespace),
            operation
        )
    }

    async fn post(&self, url: String, content_type: &str, body: String) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::Memory(format!("Pinecone unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Memory(format!(
                "Pinecone returned {}: {}",
                status, text
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl MemoryStore for PineconeStore {
    fn provider_name(&self) -> &'static str {
        "pinecone"
    }

    async fn upsert(&self, id: &str, text: &str, keywords: &[String]) -> Result<()> {
        let record = json!({
            "_id": id,
            "text": text,
            "keywords": keywords,
        });
        // NDJSON: one record per line
        let body = format!("{}\n", record);
        self.post(self.endpoint("upsert"), "application/x-ndjson", body)
            .await?;
        tracing::debug!(id, "Upserted record to Pinecone");
        Ok(())
    }

    async fn search(
        &self,
        query_text: &str,
        top_k: usize,
        keyword_filter: Option<&[String]>,
    ) -> Result<Vec<MemoryMatch>> {
        let mut query = json!({
            "inputs": { "text": query_text },
            "top_k": top_k,
        });
        if let Some(keywords) = keyword_filter.filter(|k| !k.is_empty()) {
            query["filter"] = json!({ "keywords": { "$in": keywords } });
        }
        let body = json!({ "query": query, "fields": ["text"] }).to_string();

        let response = self
            .post(self.endpoint("search"), "application/json", body)
            .await?;
        let reply: SearchReply = response
            .json()
            .await
            .map_err(|e| AppError::Memory(format!("Invalid Pinecone search reply: {}", e)))?;

        Ok(reply
            .result
            .hits
            .into_iter()
            .filter_map(|hit| {
                let text = hit.fields.text?;
                Some(MemoryMatch {
                    id: hit.id,
                    text,
                    score: hit.score,
                })
            })
            .collect())
    }
}
