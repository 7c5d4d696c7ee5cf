//! Analysis agent trait and implementations
//!
//! The agent answers natural-language questions about one tabular dataset,
//! generating and running analysis code on the provider side.

use crate::error::AnalysisError;
use crate::table::TableContext;
use crate::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub mod gemini;
pub use gemini::GeminiAgent;

/// Trait for question answering over a dataset (LLM controlled)
#[async_trait]
pub trait AnalysisAgent: Send + Sync {
    /// Answer one question given the dataset context
    async fn ask(&self, question: &str, context: &TableContext) -> Result<String>;
}

/// Builds one fresh agent per request. Requests never share agent state.
pub trait AgentFactory: Send + Sync {
    fn create_agent(&self) -> Result<Box<dyn AnalysisAgent>>;
}

/// Factory for provider-backed agents. Holds the process-wide pooled
/// transport; every request gets a fresh agent over the same pool.
pub struct GeminiAgentFactory {
    config: crate::config::AgentConfig,
    http: reqwest::Client,
}

impl GeminiAgentFactory {
    pub fn new(config: crate::config::AgentConfig) -> Self {
        Self {
            http: crate::gemini::build_http_client(),
            config,
        }
    }
}

impl AgentFactory for GeminiAgentFactory {
    fn create_agent(&self) -> Result<Box<dyn AnalysisAgent>> {
        Ok(Box::new(GeminiAgent::with_transport(
            &self.config,
            self.http.clone(),
        )?))
    }
}

/// Mock agent for development & testing
/// Keeps the pipeline functional without a provider dependency
pub struct MockAgent {
    reply: std::result::Result<String, String>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockAgent {
    /// Agent that always answers with the given text.
    pub fn answering(answer: impl Into<String>) -> Self {
        Self {
            reply: Ok(answer.into()),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Agent that always fails with the given raw provider text.
    pub fn failing(raw_fault: impl Into<String>) -> Self {
        Self {
            reply: Err(raw_fault.into()),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep before replying, for deadline tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared counter handle, readable after the agent has been moved.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl AnalysisAgent for MockAgent {
    async fn ask(&self, _question: &str, _context: &TableContext) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            Ok(answer) => Ok(answer.clone()),
            Err(raw) => Err(AnalysisError::Agent(raw.clone())),
        }
    }
}

/// Factory handing out scripted mock agents that share one call counter.
pub struct MockAgentFactory {
    reply: std::result::Result<String, String>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockAgentFactory {
    pub fn answering(answer: impl Into<String>) -> Self {
        Self {
            reply: Ok(answer.into()),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(raw_fault: impl Into<String>) -> Self {
        Self {
            reply: Err(raw_fault.into()),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl AgentFactory for MockAgentFactory {
    fn create_agent(&self) -> Result<Box<dyn AnalysisAgent>> {
        Ok(Box::new(MockAgent {
            reply: self.reply.clone(),
            delay: self.delay,
            calls: Arc::clone(&self.calls),
        }))
    }
}
