//! Thin client for the chat-completion and image-generation endpoints.

use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ProviderConfig;
use crate::constants::{IMAGE_SIZE, STORY_TEMPERATURE};
use crate::prompt::ArtStyle;

/// Failures talking to the model provider.
#[derive(Debug)]
pub enum ProviderError {
    /// No API key was configured.
    MissingApiKey,
    /// The request never produced a response.
    Transport(reqwest::Error),
    /// The provider answered with a non-success status.
    Status {
        /// HTTP status code.
        status: u16,
        /// Provider's error message, or the raw body.
        message: String,
    },
    /// A success response we could not make sense of.
    MalformedResponse(String),
}

impl ProviderError {
    /// Status code to mirror back to our caller, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            Self::MissingApiKey | Self::MalformedResponse(_) => None,
        }
    }

    /// True when the provider told us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "OpenAI API key is not configured"),
            Self::Transport(err) => write!(f, "Provider request failed: {err}"),
            Self::Status { message, .. } => f.write_str(message),
            Self::MalformedResponse(detail) => write!(f, "Malformed provider response: {detail}"),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err)
    }
}

// -----------------------------
// Chat completions (text)
// -----------------------------

#[derive(Serialize, Debug)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize, Debug)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// -----------------------------
// Images API
// -----------------------------

/// Request body for POST /images/generations
#[derive(Serialize, Debug)]
struct ImagesGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<&'a str>,

    // For GPT image models.
    #[serde(skip_serializing_if = "Option::is_none")]
    output_format: Option<&'a str>,

    // For dall-e models.
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
struct ImagesGenerateResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize, Debug)]
struct ImageData {
    b64_json: Option<String>,
    url: Option<String>,
    revised_prompt: Option<String>,
}

/// One image returned by the provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Remote URL, or a `data:` URL when the model returned base64.
    pub url: String,
    /// Prompt as rewritten by the provider, if it did so.
    pub revised_prompt: Option<String>,
}

/// Chat and image calls against one configured provider.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl OpenAiClient {
    /// Wraps a shared HTTP client.
    pub fn new(client: reqwest::Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    /// Provider settings in use.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Bytes, ProviderError> {
        let api_key = self.api_key()?;
        let endpoint = self.config.endpoint(path);
        debug!("POST {endpoint}");

        let resp = self
            .client
            .post(&endpoint)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: error_message(&bytes)
                    .unwrap_or_else(|| format!("OpenAI API error {status}")),
            });
        }
        Ok(bytes)
    }

    /// Sends a system instruction plus user message and returns the reply text.
    /// The model is asked for a JSON object.
    pub async fn chat_json(&self, instructions: &str, user: &str) -> Result<String, ProviderError> {
        let body = ChatCompletionRequest {
            model: &self.config.text_model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: instructions,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: STORY_TEMPERATURE,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let bytes = self.post_json("chat/completions", &body).await?;
        let parsed: ChatCompletionResponse = serde_json::from_slice(&bytes)
            .map_err(|err| ProviderError::MalformedResponse(err.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse("no message content".to_string()))
    }

    /// Requests exactly one square image for `prompt`.
    ///
    /// A rate-limited request is retried after a fixed delay, up to the
    /// configured number of attempts; the last 429 is returned after that.
    pub async fn generate_image(
        &self,
        prompt: &str,
        style: ArtStyle,
    ) -> Result<GeneratedImage, ProviderError> {
        let body = image_request(&self.config.image_model, prompt, style);
        let mut attempt = 1;
        loop {
            match self.generate_image_once(&body).await {
                Err(err) if err.is_rate_limited() && attempt < self.config.image_retry_attempts => {
                    warn!(
                        "Image provider rate limited attempt {}/{}, retrying in {:?}",
                        attempt, self.config.image_retry_attempts, self.config.image_retry_delay
                    );
                    tokio::time::sleep(self.config.image_retry_delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn generate_image_once(
        &self,
        body: &ImagesGenerateRequest<'_>,
    ) -> Result<GeneratedImage, ProviderError> {
        let bytes = self.post_json("images/generations", body).await?;
        let parsed: ImagesGenerateResponse = serde_json::from_slice(&bytes)
            .map_err(|err| ProviderError::MalformedResponse(err.to_string()))?;

        let first = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("No image data returned".to_string()))?;

        if let Some(revised_prompt) = first.revised_prompt.as_deref() {
            info!("Revised prompt from provider: {revised_prompt}");
        }

        let url = match (first.url, first.b64_json) {
            (Some(url), _) => url,
            (None, Some(b64_json)) => format!("data:image/png;base64,{b64_json}"),
            (None, None) => {
                return Err(ProviderError::MalformedResponse(
                    "Image response missing b64_json and url fields".to_string(),
                ));
            }
        };
        Ok(GeneratedImage {
            url,
            revised_prompt: first.revised_prompt,
        })
    }
}

fn image_request<'a>(model: &'a str, prompt: &'a str, style: ArtStyle) -> ImagesGenerateRequest<'a> {
    // GPT image models always return base64 and take output_format.
    if model.starts_with("gpt-image") {
        ImagesGenerateRequest {
            model,
            prompt,
            n: 1,
            size: IMAGE_SIZE,
            quality: None,
            output_format: Some("png"),
            response_format: None,
            style: None,
        }
    } else if model == "dall-e-3" {
        ImagesGenerateRequest {
            model,
            prompt,
            n: 1,
            size: IMAGE_SIZE,
            quality: Some("standard"),
            output_format: None,
            response_format: Some("url"),
            style: Some(style.provider_style()),
        }
    } else {
        // dall-e-2 etc
        ImagesGenerateRequest {
            model,
            prompt,
            n: 1,
            size: IMAGE_SIZE,
            quality: None,
            output_format: None,
            response_format: Some("url"),
            style: None,
        }
    }
}

/// Pulls `error.message` out of a provider error body.
fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .pointer("/error/message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dalle3_request_maps_style() {
        let body = serde_json::to_value(image_request("dall-e-3", "a cat", ArtStyle::Realistic))
            .expect("serialize");
        assert_eq!(body["style"], "natural");
        assert_eq!(body["size"], "1024x1024");
        assert_eq!(body["n"], 1);
        assert_eq!(body["quality"], "standard");

        let body = serde_json::to_value(image_request("dall-e-3", "a cat", ArtStyle::Manga))
            .expect("serialize");
        assert_eq!(body["style"], "vivid");
    }

    #[test]
    fn gpt_image_request_omits_dalle_fields() {
        let body = serde_json::to_value(image_request("gpt-image-1", "a cat", ArtStyle::Comic))
            .expect("serialize");
        assert_eq!(body["output_format"], "png");
        assert!(body.get("style").is_none());
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn error_message_prefers_nested_message() {
        assert_eq!(
            error_message(br#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#),
            Some("Rate limit reached".to_string())
        );
        assert_eq!(
            error_message(br#"{"error": "flat"}"#),
            Some("flat".to_string())
        );
        assert_eq!(error_message(b"<html>bad gateway</html>"), None);
    }

    #[test]
    fn status_errors_report_rate_limits() {
        let err = ProviderError::Status {
            status: 429,
            message: "slow down".to_string(),
        };
        assert!(err.is_rate_limited());
        assert_eq!(err.status(), Some(429));
        assert!(!ProviderError::MissingApiKey.is_rate_limited());
        assert_eq!(ProviderError::MissingApiKey.status(), None);
    }
}
