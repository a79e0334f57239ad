//! Backend client
//!
//! HTTP interface to the remote search/places/order/NLU/TTS service. JSON in,
//! JSON (or base64 audio) out. Every call is attempted exactly once; non-2xx
//! status or transport failure surfaces as [`Error::Backend`] and the caller
//! decides on the user-facing fallback.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A single web search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result title
    pub title: String,
    /// Result URL
    pub link: String,
    /// Result snippet/description
    #[serde(default)]
    pub snippet: String,
}

/// A nearby place returned by the places endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    /// Place name
    pub name: String,
    /// Aggregate rating, when the service has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Street address, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Acknowledgement of a submitted order
#[derive(Debug, Clone)]
pub struct OrderAck {
    /// The service's textual reply
    pub reply: String,
}

/// Backend health probe result
#[derive(Debug, Deserialize)]
pub struct HealthStatus {
    /// "ok" when the service is up
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    results: Vec<Place>,
}

#[derive(Debug, Serialize)]
struct PlacesRequest<'a> {
    query: &'a str,
    lat: f64,
    lng: f64,
}

#[derive(Debug, Serialize)]
struct GptRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GptResponse {
    reply: String,
}

#[derive(Debug, Serialize)]
struct NluRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct NluResponse {
    parsed: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    lang: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TtsResponse {
    audio_content: String,
}

/// HTTP client for the remote ordering service
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client against the given base URL (e.g. `http://localhost:8080`)
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Search for the given query
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] on non-2xx status or transport failure. An
    /// empty result list is a valid outcome, not an error.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = format!(
            "{}/api/search?query={}",
            self.base_url,
            urlencoding::encode(query)
        );
        tracing::debug!(query = %query, "searching");

        let response = self.client.get(&url).send().await.map_err(transport)?;
        let response = check_status(response).await?;

        let results: Vec<SearchResult> = response.json().await.map_err(transport)?;
        tracing::debug!(count = results.len(), "search complete");
        Ok(results)
    }

    /// Find places near a coordinate
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] on non-2xx status or transport failure
    pub async fn places(&self, query: &str, lat: f64, lng: f64) -> Result<Vec<Place>> {
        let response = self
            .client
            .post(format!("{}/api/places", self.base_url))
            .json(&PlacesRequest { query, lat, lng })
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;

        let body: PlacesResponse = response.json().await.map_err(transport)?;
        Ok(body.results)
    }

    /// Forward an order phrase to the service
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] on non-2xx status or transport failure
    pub async fn submit_order(&self, text: &str) -> Result<OrderAck> {
        tracing::debug!(order = %text, "submitting order");
        let response = self
            .client
            .post(format!("{}/api/gpt", self.base_url))
            .json(&GptRequest { prompt: text })
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;

        let body: GptResponse = response.json().await.map_err(transport)?;
        Ok(OrderAck { reply: body.reply })
    }

    /// Run the service's NLU over a phrase
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] on non-2xx status or transport failure
    pub async fn nlu(&self, text: &str) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(format!("{}/api/nlu", self.base_url))
            .json(&NluRequest { text })
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;

        let body: NluResponse = response.json().await.map_err(transport)?;
        Ok(body.parsed)
    }

    /// Synthesize speech, returning decoded audio bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] on non-2xx status, transport failure, or an
    /// undecodable audio payload
    pub async fn speak(&self, text: &str, lang: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(format!("{}/api/tts", self.base_url))
            .json(&TtsRequest {
                text,
                lang,
                format: "mp3",
            })
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;

        let body: TtsResponse = response.json().await.map_err(transport)?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(body.audio_content)
            .map_err(|e| Error::backend_transport(format!("invalid audio payload: {e}")))?;

        tracing::debug!(bytes = audio.len(), "synthesized audio received");
        Ok(audio)
    }

    /// Probe the service health endpoint
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] on non-2xx status or transport failure
    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self
            .client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;

        response.json().await.map_err(transport)
    }

    /// Base URL this client talks to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Map a transport-level reqwest failure to a backend error
fn transport(e: reqwest::Error) -> Error {
    Error::Backend {
        status: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
    }
}

/// Reject non-2xx responses, carrying the status and body in the error
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = %status, body = %body, "backend request failed");
    Err(Error::backend_status(status.as_u16(), body))
}
