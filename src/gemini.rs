//! Gemini API client
//!
//! HTTP transport for the generateContent endpoint with the provider-side
//! code execution tool enabled, so the model can run analysis code against
//! the dataset inlined in the prompt.
//! The pooled transport is built once per process (`build_http_client`)
//! and cloned into per-request clients; clones share one pool.

use crate::error::AnalysisError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

/// Gemini client over a shared pooled transport
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

/// Build the pooled HTTP transport. `Client` is a cheap handle over its
/// pool, so build this once per process and clone it per request.
pub fn build_http_client() -> Client {
    Client::builder()
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(8)
        .build()
        .expect("Failed to build HTTP client")
}

impl GeminiClient {
    pub fn new(http: Client, model: &str, api_key: String) -> Self {
        Self {
            client: http,
            api_key,
            endpoint: format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                model
            ),
        }
    }

    /// Run one generateContent call and return the reply's text.
    ///
    /// Provider pushback (HTTP errors, blocked replies) surfaces as
    /// `AnalysisError::Agent` carrying the raw provider text, which the
    /// session layer classifies.
    pub async fn generate(&self, system_prompt: &str, user_prompt: &str) -> crate::Result<String> {
        if self.api_key.is_empty() {
            return Err(AnalysisError::Configuration);
        }

        let url = format!("{}?key={}", self.endpoint, self.api_key);

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part::text(user_prompt)],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 2048,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part::text(system_prompt)],
            },
            tools: vec![Tool {
                code_execution: CodeExecutionTool {},
            }],
        };

        info!("Calling Gemini API");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                AnalysisError::Agent(format!("Gemini API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error response ({}): {}", status, error_text);
            return Err(AnalysisError::Agent(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            AnalysisError::Agent(format!("Gemini parse error: {}", e))
        })?;

        if let Some(usage) = &gemini_response.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                reply_tokens = usage.candidates_token_count,
                "Gemini token usage"
            );
        }

        let answer = extract_answer(&gemini_response)?;
        info!("Gemini response received ({} chars)", answer.len());

        Ok(answer)
    }
}

/// Join the reply's text parts, skipping code and execution-output parts.
fn extract_answer(response: &GeminiResponse) -> crate::Result<String> {
    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| AnalysisError::Agent("No response from Gemini API".to_string()))?;

    let content = candidate.content.as_ref().ok_or_else(|| {
        AnalysisError::Agent(format!(
            "Gemini returned no content (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        ))
    })?;

    let answer = content
        .parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if answer.is_empty() {
        return Err(AnalysisError::Agent(
            "Empty response from Gemini".to_string(),
        ));
    }

    Ok(answer)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    executable_code: Option<ExecutableCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code_execution_result: Option<CodeExecutionResult>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            executable_code: None,
            code_execution_result: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ExecutableCode {
    language: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CodeExecutionResult {
    outcome: Option<String>,
    output: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    code_execution: CodeExecutionTool,
}

#[derive(Debug, Serialize)]
struct CodeExecutionTool {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: i32,
    #[serde(default)]
    candidates_token_count: i32,
}
