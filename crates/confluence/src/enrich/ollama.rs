//! Ollama-backed enricher.
//!
//! Talks to a local Ollama instance; no API key needed.
//! Install from: https://ollama.ai

use std::time::Duration;

use indexmap::IndexMap;
use reqwest::blocking::Client;
use serde_json::json;

use crate::error::{ConfluenceError, Result};

use super::Enricher;

/// Default Ollama generate endpoint.
const DEFAULT_API_URL: &str = "http://localhost:11434/api/generate";

/// Kept short so a slow model never stalls report generation for long.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Enricher backed by a local Ollama model.
pub struct OllamaEnricher {
    client: Client,
    api_url: String,
    model: String,
}

impl OllamaEnricher {
    /// Create an enricher using the default model.
    pub fn new() -> Result<Self> {
        Self::with_model("llama3")
    }

    /// Create an enricher with a specific model.
    pub fn with_model(model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                ConfluenceError::EnrichmentUnavailable(format!("failed to create HTTP client: {e}"))
            })?;

        let api_url = std::env::var("OLLAMA_HOST")
            .map(|host| format!("{}/api/generate", host.trim_end_matches('/')))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Ok(Self {
            client,
            api_url,
            model: model.into(),
        })
    }

    /// Send a prompt and return the trimmed response text.
    fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false
        });

        let response = self
            .client
            .post(&self.api_url)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ConfluenceError::EnrichmentUnavailable(
                        "failed to connect to Ollama; is it running? Start with: ollama serve"
                            .to_string(),
                    )
                } else {
                    ConfluenceError::EnrichmentUnavailable(format!("Ollama request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(ConfluenceError::EnrichmentUnavailable(format!(
                "Ollama returned status {}",
                response.status()
            )));
        }

        let value: serde_json::Value = response.json().map_err(|e| {
            ConfluenceError::EnrichmentUnavailable(format!("invalid Ollama response: {e}"))
        })?;

        Ok(value
            .get("response")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

impl Enricher for OllamaEnricher {
    fn describe_column(&self, column: &str, samples: &[String]) -> Result<String> {
        let prompt = format!(
            "You are a data analyst. Write a very short (max 10 words) description \
             for a database column.\n\
             Column Name: {column}\n\
             Sample Values: {:?}\n\
             Description:",
            &samples[..samples.len().min(5)]
        );
        self.generate(&prompt)
    }

    fn summarize_dataset(
        &self,
        name: &str,
        schema: &[(String, String)],
        sample_rows: &[IndexMap<String, String>],
    ) -> Result<String> {
        let schema_str = schema
            .iter()
            .take(10)
            .map(|(col, ty)| format!("{col} ({ty})"))
            .collect::<Vec<_>>()
            .join(", ");
        let rows_str = serde_json::to_string(&sample_rows[..sample_rows.len().min(3)])?;

        let prompt = format!(
            "You are a data analyst. Write a concise summary (max 2 sentences) of \
             what this dataset represents.\n\
             Dataset Name: {name}\n\
             Key Columns: {schema_str}\n\
             Sample Data: {rows_str}\n\
             Summary:"
        );
        self.generate(&prompt)
    }

    fn explain_anomalies(
        &self,
        name: &str,
        flagged: &[IndexMap<String, String>],
    ) -> Result<String> {
        let rows_str = serde_json::to_string(&flagged[..flagged.len().min(5)])?;
        let prompt = format!(
            "You are a data analyst. You have detected some anomalies in a dataset. \
             Explain WHY these specific rows might be outliers.\n\
             Dataset Name: {name}\n\
             Anomalous Rows: {rows_str}\n\
             Explanation (max 3 sentences):"
        );
        self.generate(&prompt)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
