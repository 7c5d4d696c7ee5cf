//! Request orchestrator - drives one request through the state machine
//!
//! Received → Validated → Loaded → Sessioned → Answered
//!         ↘ Rejected (client fault)        ↘ Failed (service fault)

use crate::agent::AgentFactory;
use crate::error::AnalysisError;
use crate::models::{AnalysisRequest, AnalysisResult, ExecutionPolicy, RequestState, ResultStatus};
use crate::session::AnalysisSession;
use crate::table::Table;
use crate::Result;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Coordinates validation, loading, session construction and the provider
/// call for one request. Holds no per-request state; every request gets a
/// fresh table, agent and session, all dropped when the result is built.
pub struct RequestOrchestrator {
    factory: Box<dyn AgentFactory>,
    policy: ExecutionPolicy,
}

impl RequestOrchestrator {
    pub fn new(factory: Box<dyn AgentFactory>, policy: ExecutionPolicy) -> Self {
        Self { factory, policy }
    }

    /// Run one request to a terminal state. Never panics on request data;
    /// anything escaping the pipeline becomes a Failed outcome with a
    /// generic message.
    pub async fn handle(&self, request: AnalysisRequest) -> AnalysisResult {
        let started = Instant::now();
        let request_id = request.request_id;
        let mut transitions = Vec::new();

        info!(
            request_id = %request_id,
            filename = %request.filename,
            bytes = request.file_bytes.len(),
            "Orchestrator: request received"
        );
        mark(&mut transitions, request_id, RequestState::Received, &request.filename);

        let outcome = self.run_pipeline(&request, &mut transitions).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let mut result = match outcome {
            Ok(answer) => {
                mark(
                    &mut transitions,
                    request_id,
                    RequestState::Answered,
                    &format!("{} chars", answer.len()),
                );
                AnalysisResult::answered(request_id, answer, transitions)
            }
            Err(error) => {
                let (status, terminal) = terminal_for(&error);
                warn!(
                    request_id = %request_id,
                    status = %status,
                    error = %error,
                    "Orchestrator: request not answered"
                );
                mark(&mut transitions, request_id, terminal, &error.to_string());
                AnalysisResult::not_answered(request_id, status, error.user_message(), transitions)
            }
        };

        result.elapsed_ms = elapsed_ms;
        info!(
            request_id = %request_id,
            status = %result.status,
            elapsed_ms,
            "Orchestrator: request complete"
        );

        result
    }

    async fn run_pipeline(
        &self,
        request: &AnalysisRequest,
        transitions: &mut Vec<String>,
    ) -> Result<String> {
        let request_id = request.request_id;

        // === VALIDATE ===
        // Filename and question checks run before any byte of content is read.
        validate(request)?;
        mark(transitions, request_id, RequestState::Validated, "filename and question ok");

        // === LOAD ===
        let table = Table::load(&request.file_bytes)?;
        let fingerprint = dataset_fingerprint(&request.file_bytes);
        info!(
            request_id = %request_id,
            rows = table.row_count(),
            cols = table.column_count(),
            dataset_sha = %fingerprint,
            "Orchestrator: dataset loaded"
        );
        mark(
            transitions,
            request_id,
            RequestState::Loaded,
            &format!(
                "{} rows, {} cols, sha256 {}",
                table.row_count(),
                table.column_count(),
                fingerprint
            ),
        );

        // === SESSION ===
        let agent = self.factory.create_agent()?;
        let session = AnalysisSession::new(table, agent, self.policy)?;
        mark(transitions, request_id, RequestState::Sessioned, "agent bound to table");

        // === ASK ===
        session.ask(&request.question).await
    }
}

fn validate(request: &AnalysisRequest) -> Result<()> {
    if !request.filename.ends_with(".csv") {
        return Err(AnalysisError::InvalidFileType(request.filename.clone()));
    }

    if request.question.trim().is_empty() {
        return Err(AnalysisError::EmptyQuestion);
    }

    Ok(())
}

/// Map a fault onto its HTTP-facing status and terminal state.
fn terminal_for(error: &AnalysisError) -> (ResultStatus, RequestState) {
    if error.is_client_fault() {
        return (ResultStatus::ClientError, RequestState::Rejected);
    }

    let status = match error {
        AnalysisError::RateLimited(_)
        | AnalysisError::Misconfigured(_)
        | AnalysisError::InputTooLarge(_)
        | AnalysisError::Unclassified(_)
        | AnalysisError::Timeout(_)
        | AnalysisError::Agent(_) => ResultStatus::ProviderError,
        _ => ResultStatus::InternalError,
    };

    (status, RequestState::Failed)
}

fn mark(transitions: &mut Vec<String>, request_id: Uuid, state: RequestState, detail: &str) {
    info!(
        request_id = %request_id,
        state = %state,
        detail = %detail,
        "Orchestrator: transition"
    );
    transitions.push(format!("[{}] {}: {}", Utc::now().to_rfc3339(), state, detail));
}

/// SHA-256 of the upload, so operators can correlate repeat datasets in
/// logs without the data ever being stored.
fn dataset_fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{GeminiAgentFactory, MockAgentFactory};
    use crate::config::AgentConfig;
    use crate::error::{
        CONFIGURATION_MESSAGE, EMPTY_DATA_MESSAGE, EMPTY_QUESTION_MESSAGE,
        INVALID_FILE_TYPE_MESSAGE, RATE_LIMITED_MESSAGE, TIMEOUT_MESSAGE,
    };
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    const SAMPLE_CSV: &[u8] = b"a,b\n1,2\n3,4\n";

    fn orchestrator_with(factory: impl AgentFactory + 'static) -> RequestOrchestrator {
        RequestOrchestrator::new(
            Box::new(factory),
            ExecutionPolicy::new(Duration::from_secs(5)),
        )
    }

    #[tokio::test]
    async fn test_valid_csv_is_answered() {
        let orchestrator = orchestrator_with(MockAgentFactory::answering("4"));
        let request = AnalysisRequest::new("data.csv", SAMPLE_CSV.to_vec(), "What is the max of b?");

        let result = orchestrator.handle(request).await;

        assert!(result.is_success());
        assert_eq!(result.status, ResultStatus::Success);
        assert_eq!(result.answer.as_deref(), Some("4"));
        assert!(result.error_detail.is_none());

        let states = ["Received", "Validated", "Loaded", "Sessioned", "Answered"];
        assert_eq!(result.transitions.len(), states.len());
        for (marker, state) in result.transitions.iter().zip(states) {
            assert!(marker.contains(state), "marker {:?} missing {}", marker, state);
        }
    }

    #[tokio::test]
    async fn test_header_only_upload_is_rejected_before_the_agent() {
        let factory = MockAgentFactory::answering("unreachable");
        let calls = factory.call_counter();
        let orchestrator = orchestrator_with(factory);

        let request = AnalysisRequest::new("data.csv", b"a,b\n".to_vec(), "anything?");
        let result = orchestrator.handle(request).await;

        assert_eq!(result.status, ResultStatus::ClientError);
        assert_eq!(result.error_detail.as_deref(), Some(EMPTY_DATA_MESSAGE));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_csv_filename_is_rejected_before_content_is_read() {
        let factory = MockAgentFactory::answering("unreachable");
        let calls = factory.call_counter();
        let orchestrator = orchestrator_with(factory);

        // Content is not even valid UTF-8. If the loader ran first, the
        // outcome would be a parse fault instead of the extension fault.
        let request = AnalysisRequest::new("data.txt", vec![0xff, 0xfe, 0x00], "anything?");
        let result = orchestrator.handle(request).await;

        assert_eq!(result.status, ResultStatus::ClientError);
        assert_eq!(
            result.error_detail.as_deref(),
            Some(INVALID_FILE_TYPE_MESSAGE)
        );
        assert!(!result.transitions.iter().any(|t| t.contains("Loaded")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_extension_check_is_case_sensitive() {
        let orchestrator = orchestrator_with(MockAgentFactory::answering("unreachable"));
        let request = AnalysisRequest::new("Data.CSV", SAMPLE_CSV.to_vec(), "anything?");

        let result = orchestrator.handle(request).await;

        assert_eq!(result.status, ResultStatus::ClientError);
        assert_eq!(
            result.error_detail.as_deref(),
            Some(INVALID_FILE_TYPE_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected() {
        let factory = MockAgentFactory::answering("unreachable");
        let calls = factory.call_counter();
        let orchestrator = orchestrator_with(factory);

        let request = AnalysisRequest::new("data.csv", SAMPLE_CSV.to_vec(), "   ");
        let result = orchestrator.handle(request).await;

        assert_eq!(result.status, ResultStatus::ClientError);
        assert_eq!(result.error_detail.as_deref(), Some(EMPTY_QUESTION_MESSAGE));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rate_limited_provider_maps_to_fixed_message() {
        let orchestrator = orchestrator_with(MockAgentFactory::failing("Rate limit exceeded"));
        let request = AnalysisRequest::new("data.csv", SAMPLE_CSV.to_vec(), "anything?");

        let result = orchestrator.handle(request).await;

        assert_eq!(result.status, ResultStatus::ProviderError);
        assert_eq!(result.error_detail.as_deref(), Some(RATE_LIMITED_MESSAGE));
        assert!(result
            .transitions
            .last()
            .is_some_and(|t| t.contains("Failed")));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_without_leaking_state() {
        let factory = GeminiAgentFactory::new(AgentConfig::new("gemini-2.0-flash", ""));
        let orchestrator = orchestrator_with(factory);

        let request = AnalysisRequest::new("data.csv", SAMPLE_CSV.to_vec(), "anything?");
        let result = orchestrator.handle(request).await;

        assert_eq!(result.status, ResultStatus::InternalError);
        assert_eq!(result.error_detail.as_deref(), Some(CONFIGURATION_MESSAGE));

        let body = result.error_detail.unwrap_or_default().to_lowercase();
        assert!(!body.contains("key"));
        assert!(!body.contains("gemini"));
    }

    #[tokio::test]
    async fn test_deadline_expiry_maps_to_timeout_message() {
        let factory = MockAgentFactory::answering("late").with_delay(Duration::from_millis(200));
        let orchestrator = RequestOrchestrator::new(
            Box::new(factory),
            ExecutionPolicy::new(Duration::from_millis(20)),
        );

        let request = AnalysisRequest::new("data.csv", SAMPLE_CSV.to_vec(), "anything?");
        let result = orchestrator.handle(request).await;

        assert_eq!(result.status, ResultStatus::ProviderError);
        assert_eq!(result.error_detail.as_deref(), Some(TIMEOUT_MESSAGE));
    }

    #[tokio::test]
    async fn test_identical_requests_produce_identical_outcomes() {
        let orchestrator = RequestOrchestrator::new(
            Box::new(MockAgentFactory::answering("42")),
            ExecutionPolicy::default(),
        );

        let first = orchestrator
            .handle(AnalysisRequest::new(
                "data.csv",
                SAMPLE_CSV.to_vec(),
                "What is six times seven?",
            ))
            .await;
        let second = orchestrator
            .handle(AnalysisRequest::new(
                "data.csv",
                SAMPLE_CSV.to_vec(),
                "What is six times seven?",
            ))
            .await;

        assert_eq!(first.status, second.status);
        assert_eq!(first.answer, second.answer);
        assert_eq!(first.error_detail, second.error_detail);
    }
}
