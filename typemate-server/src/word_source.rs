use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use typemate_core::tokenize;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const PASSAGE_PROMPT: &str = "Generate a paragraph of random text for a typing test. \
Make it interesting but use common words. Return only the text, no additional context.";

const FALLBACK_PASSAGE: &str = "The morning train was late again so everyone on the platform \
found something to read while they waited for the doors to open and the long day to begin";

/// Produces the word list for a round
#[async_trait]
pub trait WordSource: Send + Sync {
    async fn generate_words(&self) -> Result<Vec<String>>;
}

/// Text generation through the Gemini `generateContent` endpoint
pub struct GeminiWordSource {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
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
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiWordSource {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(api_key, model, GEMINI_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl WordSource for GeminiWordSource {
    async fn generate_words(&self) -> Result<Vec<String>> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: PASSAGE_PROMPT,
                }],
            }],
        };

        tracing::debug!("Requesting passage from model {}", self.model);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .context("Text generation request failed")?;

        if !response.status().is_success() {
            tracing::warn!("Text generation returned status: {}", response.status());
            bail!("Text generation returned status {}", response.status());
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse text generation response")?;

        let text = extract_text(body)?;
        words_from_passage(&text)
    }
}

fn extract_text(response: GenerateResponse) -> Result<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|part| part.text)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .ok_or_else(|| anyhow!("Text generation returned no candidates"))
}

fn words_from_passage(text: &str) -> Result<Vec<String>> {
    let words = tokenize(text);
    if words.is_empty() {
        bail!("Text generation returned an empty passage");
    }
    Ok(words)
}

/// A fixed passage, used by tests and offline runs
#[derive(Debug, Clone)]
pub struct StaticWordSource {
    passage: String,
}

impl StaticWordSource {
    pub fn new(passage: impl Into<String>) -> Self {
        Self {
            passage: passage.into(),
        }
    }
}

impl Default for StaticWordSource {
    fn default() -> Self {
        Self::new(FALLBACK_PASSAGE)
    }
}

#[async_trait]
impl WordSource for StaticWordSource {
    async fn generate_words(&self) -> Result<Vec<String>> {
        words_from_passage(&self.passage)
    }
}
