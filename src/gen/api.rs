//! `ApiBackend` — REST implementation of [`StoryBackend`].
//!
//! Speaks the Gemini-style generative-language wire format: text and chat go
//! through `models/{model}:generateContent`, narration through the same
//! endpoint with the AUDIO response modality, and illustrations through
//! `models/{model}:predict` with inline base64 image bytes.
//!
//! # No hardcoded URLs
//! All connection details (`base_url`, `api_key`, model ids, voice) come
//! exclusively from the [`AppConfig`] passed to [`ApiBackend::from_config`].

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};

use crate::chat::ChatTurn;
use crate::config::AppConfig;
use crate::gen::backend::{GenError, StoryBackend};
use crate::gen::prompt;

// ---------------------------------------------------------------------------
// ApiBackend
// ---------------------------------------------------------------------------

/// Calls a Gemini-style generative-language REST endpoint.
pub struct ApiBackend {
    client: reqwest::Client,
    config: crate::config::GenerationConfig,
    page_count: usize,
}

impl ApiBackend {
    /// Build an `ApiBackend` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.generation.timeout_secs`.  A default (no-timeout) client is
    /// used as a last-resort fallback if the builder fails (should never
    /// happen in practice).
    pub fn from_config(config: &AppConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.generation.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.generation.clone(),
            page_count: config.story.page_count,
        }
    }

    /// POST `body` to `{base_url}/v1beta/models/{model}:{verb}` and parse the
    /// response as JSON.
    ///
    /// The `x-goog-api-key` header is attached **only** when
    /// `config.api_key` is `Some(key)` and `key` is non-empty — safe for
    /// local proxies that require no authentication.
    async fn post(
        &self,
        model: &str,
        verb: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, GenError> {
        let url = format!("{}/v1beta/models/{model}:{verb}", self.config.base_url);

        let mut req = self.client.post(&url).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.header("x-goog-api-key", key);
        }

        let response = req.send().await?.error_for_status()?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GenError::Parse(e.to_string()))?;

        Ok(json)
    }
}

/// Extract `candidates[0].content.parts[0]` from a generateContent response.
fn first_part(json: &serde_json::Value) -> &serde_json::Value {
    &json["candidates"][0]["content"]["parts"][0]
}

/// Parse the story-model reply (a JSON array of page strings).
///
/// Rejects anything that is not a non-empty array of non-empty strings —
/// a malformed story must fail loudly rather than produce blank pages.
fn parse_story_pages(text: &str) -> Result<Vec<String>, GenError> {
    let pages: Vec<String> = serde_json::from_str(text.trim())
        .map_err(|e| GenError::Parse(format!("story is not a JSON array of strings: {e}")))?;

    if pages.is_empty() || pages.iter().any(|p| p.trim().is_empty()) {
        return Err(GenError::Empty);
    }

    Ok(pages)
}

#[async_trait]
impl StoryBackend for ApiBackend {
    async fn story_pages(&self, topic: &str) -> Result<Vec<String>, GenError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt::story_prompt(topic, self.page_count) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" }
                }
            }
        });

        let json = self.post(&self.config.story_model, "generateContent", body).await?;

        let text = first_part(&json)["text"].as_str().ok_or(GenError::Empty)?;
        parse_story_pages(text)
    }

    async fn illustration(&self, page_text: &str) -> Result<String, GenError> {
        let body = serde_json::json!({
            "instances": [{ "prompt": prompt::illustration_prompt(page_text) }],
            "parameters": { "sampleCount": 1, "aspectRatio": "1:1" }
        });

        let json = self.post(&self.config.image_model, "predict", body).await?;

        let b64 = json["predictions"][0]["bytesBase64Encoded"]
            .as_str()
            .ok_or(GenError::Empty)?;

        Ok(format!("data:image/png;base64,{b64}"))
    }

    async fn narration(&self, page_text: &str) -> Result<Vec<u8>, GenError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt::narration_prompt(page_text) }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.config.voice }
                    }
                }
            }
        });

        let json = self.post(&self.config.tts_model, "generateContent", body).await?;

        let b64 = first_part(&json)["inlineData"]["data"]
            .as_str()
            .ok_or(GenError::Empty)?;

        general_purpose::STANDARD
            .decode(b64)
            .map_err(|e| GenError::Parse(format!("narration payload is not valid base64: {e}")))
    }

    async fn chat_reply(&self, turns: &[ChatTurn], message: &str) -> Result<String, GenError> {
        let mut contents: Vec<serde_json::Value> = turns
            .iter()
            .map(|t| {
                serde_json::json!({
                    "role": t.role.as_str(),
                    "parts": [{ "text": t.text }]
                })
            })
            .collect();
        contents.push(serde_json::json!({
            "role": "user",
            "parts": [{ "text": message }]
        }));

        let body = serde_json::json!({
            "contents": contents,
            "systemInstruction": { "parts": [{ "text": prompt::CHAT_SYSTEM_INSTRUCTION }] }
        });

        let json = self.post(&self.config.chat_model, "generateContent", body).await?;

        let reply = first_part(&json)["text"]
            .as_str()
            .ok_or(GenError::Empty)?
            .trim()
            .to_string();

        if reply.is_empty() {
            return Err(GenError::Empty);
        }

        Ok(reply)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
