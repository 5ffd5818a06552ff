//! Uniform chat-completion adapter over heterogeneous platform backends.
//!
//! Every supported platform is reached through an OpenAI-compatible
//! `POST {base_url}/chat/completions`. The response body is validated
//! against an explicit schema at this boundary; anything off-shape fails
//! closed to [`PlatformError::Unavailable`] rather than leaking untyped
//! JSON into the analyzer.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;
use crate::platform::PlatformConfig;

/// Raw text reply from one platform, with wall-clock duration.
#[derive(Debug, Clone)]
pub struct PlatformReply {
    pub text: String,
    pub duration_ms: u64,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Expected response shape. Fields beyond these are ignored; missing
/// fields are a schema mismatch and fail the call.
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Stateless HTTP adapter shared by all platform calls.
///
/// Calls are bounded by the construction-time timeout and are never
/// retried here — retry policy belongs to the orchestrator, which decides
/// whether a failed platform is skipped for the run.
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: reqwest::Client,
}

impl ChatCompletionClient {
    /// Creates an adapter whose every request fails fast after
    /// `timeout_secs` (connect timeout 10s).
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::ClientBuild`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, PlatformError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }

    /// Send one prompt to one platform and return its raw text reply.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Unavailable`] on timeout, transport
    /// failure, non-2xx status, schema mismatch, or an empty choice list.
    pub async fn complete(
        &self,
        platform: &PlatformConfig,
        prompt: &str,
    ) -> Result<PlatformReply, PlatformError> {
        let url = format!(
            "{}/chat/completions",
            platform.base_url.trim_end_matches('/')
        );
        let request = ChatCompletionRequest {
            model: &platform.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .bearer_auth(&platform.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| unavailable(platform, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlatformError::Unavailable {
                platform: platform.id,
                reason: format!("unexpected HTTP status {status}"),
            });
        }

        let parsed: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|e| PlatformError::Unavailable {
                    platform: platform.id,
                    reason: format!("response schema mismatch: {e}"),
                })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| PlatformError::Unavailable {
                platform: platform.id,
                reason: "response contained no choices".to_string(),
            })?;

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(PlatformReply { text, duration_ms })
    }
}

fn unavailable(platform: &PlatformConfig, e: &reqwest::Error) -> PlatformError {
    let reason = if e.is_timeout() {
        "request timed out".to_string()
    } else {
        format!("transport error: {e}")
    };
    PlatformError::Unavailable {
        platform: platform.id,
        reason,
    }
}
