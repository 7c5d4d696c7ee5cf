//! Gemini-powered analysis agent
//!
//! Hands the dataset and question to Gemini with the code execution tool
//! enabled, so computation happens in the provider's sandbox.

use crate::config::AgentConfig;
use crate::error::AnalysisError;
use crate::gemini::{build_http_client, GeminiClient};
use crate::table::TableContext;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;

pub struct GeminiAgent {
    client: GeminiClient,
}

impl GeminiAgent {
    /// Build an agent with its own transport. The server path goes through
    /// `with_transport` instead, reusing the factory's pool.
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        Self::with_transport(config, build_http_client())
    }

    /// Build an agent over an existing transport. Fails when no credential
    /// is configured, before any provider traffic happens.
    pub fn with_transport(config: &AgentConfig, http: Client) -> Result<Self> {
        if !config.has_credential() {
            return Err(AnalysisError::Configuration);
        }

        Ok(Self {
            client: GeminiClient::new(http, &config.model, config.api_key.clone()),
        })
    }
}

#[async_trait]
impl crate::agent::AnalysisAgent for GeminiAgent {
    async fn ask(&self, question: &str, context: &TableContext) -> Result<String> {
        let user_prompt = build_user_prompt(question, context);

        self.client
            .generate(build_system_prompt(), &user_prompt)
            .await
    }
}

/// Analyst instructions for every request
fn build_system_prompt() -> &'static str {
    r#"You are a data analyst answering questions about one tabular dataset.

Guidelines:
- The full dataset is provided as CSV in the message
- Write and run code whenever the question needs computation
- Base every claim on the provided data, never on outside knowledge
- If the data cannot answer the question, say so plainly

Format: reply with the final answer as short plain text suitable for
display in a web app. No markdown, no code in the final answer."#
}

/// Assemble dataset context and question into the user message
fn build_user_prompt(question: &str, context: &TableContext) -> String {
    format!(
        r#"DATASET ({} rows):
Columns: {}

CSV DATA:
{}

QUESTION:
{}"#,
        context.row_count,
        context.schema_line(),
        context.csv_text,
        question,
    )
}
