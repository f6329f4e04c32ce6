use std::env;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

/// Environment variable holding the Gemini credential. Env-only, never
/// written to the config file.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Metadata handed to the description collaborator for one move.
#[derive(Debug, Clone)]
pub struct FileFacts {
    pub original_name: String,
    pub new_name: String,
    pub extension: String,
    pub category: String,
    pub size_bytes: u64,
}

/// Best-effort description collaborator backed by the Gemini REST API.
///
/// Every call is bounded by the configured timeout; the engine treats any
/// failure as "no description" and moves on.
pub struct Describer {
    client: Client,
    api_key: String,
    model: String,
}

impl Describer {
    /// Build a describer if the credential is present in the environment.
    ///
    /// A missing key is not an error: organization degrades gracefully to
    /// records without descriptions.
    pub fn from_env(model: &str, timeout: Duration) -> Result<Option<Self>> {
        let api_key = match env::var(GEMINI_API_KEY_ENV) {
            Ok(key) if !key.is_empty() => key,
            _ => return Ok(None),
        };

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Some(Self {
            client,
            api_key,
            model: model.to_string(),
        }))
    }

    /// Ask for a short description of an organized file.
    pub fn describe(&self, facts: &FileFacts) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(facts),
                }],
            }],
        };

        let url = format!("{}/{}:generateContent", API_BASE, self.model);
        let response = self
            .client
            .post(&url)
            // Header keeps the key out of logged URLs.
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .context("description request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(anyhow!("description API returned {}: {}", status, body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .context("failed to parse description response")?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| anyhow!("description response had no text"))
    }
}

fn build_prompt(facts: &FileFacts) -> String {
    format!(
        "Analyze this file operation and provide a brief, informative description.\n\
         Action: organized and renamed\n\
         Filename: {new_name}\n\
         File extension: {extension}\n\
         File size: {size} bytes\n\
         Category: {category}\n\
         Old name: {old_name}\n\
         New name: {new_name}\n\
         Provide a concise description (max 100 words) of what this file \
         likely contains and the action performed.",
        new_name = facts.new_name,
        extension = facts.extension,
        size = facts.size_bytes,
        category = facts.category,
        old_name = facts.original_name,
    )
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}
