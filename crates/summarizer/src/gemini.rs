//! Gemini batch summarization client.
//!
//! One request per batch: the prompt carries repository context plus a
//! content snippet per file and asks for a single JSON object mapping each
//! path to its summary. Anything the model omits is treated as a miss by the
//! dispatcher.

use crate::error::{Result, SummarizerError};
use crate::Summarize;
use async_trait::async_trait;
use atlas_protocol::{PendingFile, RepoContext};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;

const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const GEMINI_MODEL: &str = "gemini-2.0-flash";
const PROMPT_CONTENT_CHARS: usize = 2_000;

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ContentResponse,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: String,
}

/// External summarization collaborator backed by the Gemini API.
pub struct GeminiSummarizer {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiSummarizer {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: GEMINI_MODEL.to_string(),
            base_url: GEMINI_API_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at a different endpoint (local proxies, tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 4096,
            },
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GeminiResponse = response.json().await?;
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| SummarizerError::MalformedResponse("empty candidate list".to_string()))
    }
}

fn build_prompt(items: &[PendingFile], ctx: &RepoContext) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are summarizing files from the repository \"{}\".",
        ctx.repo_name
    );
    if !ctx.languages.is_empty() {
        let _ = writeln!(prompt, "Main languages: {}.", ctx.languages.join(", "));
    }
    if !ctx.top_dirs.is_empty() {
        let _ = writeln!(
            prompt,
            "Top-level directories: {}.",
            ctx.top_dirs.join(", ")
        );
    }
    prompt.push_str(
        "\nFor each file below, write a 1-2 sentence summary of what it does \
         and its role in the project.\n\
         Respond with a single JSON object mapping each file path to its \
         summary string. Respond with JSON only.\n",
    );

    for item in items {
        let _ = write!(prompt, "\nFile: {}", item.path);
        if let Some(language) = &item.language {
            let _ = write!(prompt, " ({language})");
        }
        let snippet: String = item.content.chars().take(PROMPT_CONTENT_CHARS).collect();
        let _ = write!(prompt, "\n```\n{snippet}\n```\n");
    }
    prompt
}

/// Extract the JSON object from a model reply, tolerating fenced or prefixed
/// output around it.
fn extract_json_object(text: &str) -> Result<HashMap<String, String>> {
    let start = text.find('{');
    let end = text.rfind('}');
    let (Some(start), Some(end)) = (start, end) else {
        return Err(SummarizerError::MalformedResponse(
            "no JSON object in reply".to_string(),
        ));
    };
    if end < start {
        return Err(SummarizerError::MalformedResponse(
            "no JSON object in reply".to_string(),
        ));
    }
    serde_json::from_str(&text[start..=end])
        .map_err(|err| SummarizerError::MalformedResponse(err.to_string()))
}

#[async_trait]
impl Summarize for GeminiSummarizer {
    async fn summarize_batch(
        &self,
        items: &[PendingFile],
        ctx: &RepoContext,
    ) -> Result<HashMap<String, String>> {
        let prompt = build_prompt(items, ctx);
        let reply = self.generate(&prompt).await?;
        extract_json_object(&reply)
    }
}
