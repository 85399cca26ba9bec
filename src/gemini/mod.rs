//! Gemini integration for concept generation
//!
//! A thin client over the Gemini REST API: one-shot structured generation and
//! server-sent-event streaming. Callers pass the API key per request so a key
//! change takes effect on the next call.

pub mod stream;
pub mod types;

use futures::stream::{BoxStream, StreamExt};
use reqwest::{Client, Response};

use crate::config::GeminiDefaults;
use crate::error::AppError;

pub use types::*;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client
///
/// No request timeout is configured; calls run until the service answers or the
/// caller drops the future.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    config: GeminiDefaults,
}

impl GeminiClient {
    pub fn new(config: GeminiDefaults) -> Result<Self, AppError> {
        let http = Client::builder()
            .user_agent(concat!("mugen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeminiDefaults {
        &self.config
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    /// Generate content and return the text of the first candidate
    pub async fn generate(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<String, AppError> {
        let response = self
            .http
            .post(self.endpoint(model, "generateContent"))
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let body: GenerateContentResponse = response.json().await?;
        Ok(body.text())
    }

    /// Stream generated text deltas as they arrive
    pub async fn stream_generate(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<BoxStream<'static, Result<String, AppError>>, AppError> {
        let response = self
            .http
            .post(format!("{}?alt=sse", self.endpoint(model, "streamGenerateContent")))
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();
        Ok(stream::text_stream(body))
    }

    /// Probe the API key with a trivial request
    ///
    /// Never fails: errors are folded into the returned text as `<Error: ...>`.
    pub async fn check_connection(&self, api_key: &str) -> String {
        let request = GenerateContentRequest::user_text("Just respond with \"OK\".");
        match self
            .generate(api_key, &self.config.probe_model, &request)
            .await
        {
            Ok(text) if text.is_empty() => "<No response>".to_string(),
            Ok(text) => text,
            Err(e) => format!("<Error: {}>", e.details.as_deref().unwrap_or(&e.message)),
        }
    }
}

/// Map non-success statuses to a generation error carrying the API message
async fn ensure_success(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    Err(AppError::generation_failed(format!("Gemini error ({})", status)).with_details(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = GeminiClient::new(GeminiDefaults {
            base_url: "http://localhost:9999/v1beta/".to_string(),
            ..GeminiDefaults::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint("gemini-3-flash-preview", "generateContent"),
            "http://localhost:9999/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[tokio::test]
    async fn test_check_connection_reports_unreachable_service() {
        let client = GeminiClient::new(GeminiDefaults {
            // Port 9 (discard) is closed on test machines
            base_url: "http://127.0.0.1:9/v1beta".to_string(),
            ..GeminiDefaults::default()
        })
        .unwrap();
        let reply = client.check_connection("key").await;
        assert!(reply.starts_with("<Error: "), "unexpected reply: {}", reply);
    }
}
