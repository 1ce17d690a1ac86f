use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::TextGenerator;
use crate::config::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::error::GenerateError;
use crate::media::MediaAttachment;

/// What a submission asks the model about
#[derive(Debug, Clone, PartialEq)]
pub enum PromptContents {
    /// Plain prompt text, no media
    Text(String),
    /// Inline media followed by an optional text part
    Parts(Vec<Part>),
}

impl PromptContents {
    fn into_request(self) -> GenerateContentRequest {
        let parts = match self {
            PromptContents::Text(text) => vec![Part::Text { text }],
            PromptContents::Parts(parts) => parts,
        };
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: MediaAttachment,
    },
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Shape the request contents for a prompt and optional attachment.
///
/// With media, the inline-data part always comes first and the prompt is
/// appended only when it is non-empty.
pub fn build_contents(prompt: &str, media: Option<&MediaAttachment>) -> PromptContents {
    match media {
        Some(media) => {
            let mut parts = vec![Part::InlineData {
                inline_data: media.clone(),
            }];
            if !prompt.is_empty() {
                parts.push(Part::Text {
                    text: prompt.to_string(),
                });
            }
            PromptContents::Parts(parts)
        }
        None => PromptContents::Text(prompt.to_string()),
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    pub async fn query(
        &self,
        prompt: &str,
        media: Option<&MediaAttachment>,
    ) -> Result<String, GenerateError> {
        let request = build_contents(prompt, media).into_request();

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            return Err(GenerateError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let gemini_response: GenerateContentResponse = response.json().await?;
        let text: String = gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GenerateError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        media: Option<&MediaAttachment>,
    ) -> Result<String, GenerateError> {
        tracing::info!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            media = media.map(|m| m.mime_type.as_str()).unwrap_or("none"),
            "sending generateContent request"
        );

        match self.query(prompt, media).await {
            Ok(text) => {
                tracing::info!(response_chars = text.chars().count(), "generateContent succeeded");
                Ok(text)
            }
            Err(err) => {
                tracing::error!(error = %err, status = ?err.status(), "Gemini API call failed");
                Err(err)
            }
        }
    }
}
