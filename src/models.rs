//! Core data models for the analytics agent backend

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

//
// ================= Request =================
//

/// One uploaded dataset plus one question about it.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub request_id: Uuid,
    pub filename: String,
    pub file_bytes: Vec<u8>,
    pub question: String,
}

impl AnalysisRequest {
    pub fn new(
        filename: impl Into<String>,
        file_bytes: Vec<u8>,
        question: impl Into<String>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            filename: filename.into(),
            file_bytes,
            question: question.into(),
        }
    }
}

//
// ================= Policy =================
//

/// Session knobs for one analysis run.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionPolicy {
    /// Hard deadline for a single provider call.
    pub ask_timeout: Duration,
}

impl ExecutionPolicy {
    pub fn new(ask_timeout: Duration) -> Self {
        Self { ask_timeout }
    }
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            ask_timeout: Duration::from_secs(crate::config::DEFAULT_ASK_TIMEOUT_SECS),
        }
    }
}

//
// ================= Request States =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    Received,
    Validated,
    Loaded,
    Sessioned,
    Answered,
    Rejected,
    Failed,
}

//
// ================= Result =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    ClientError,
    ProviderError,
    InternalError,
}

/// Terminal outcome of one request. Exactly one of `answer` and
/// `error_detail` is set, depending on `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub request_id: Uuid,
    pub status: ResultStatus,
    pub answer: Option<String>,
    pub error_detail: Option<String>,
    pub transitions: Vec<String>,
    pub elapsed_ms: u64,
}

impl AnalysisResult {
    pub fn answered(request_id: Uuid, answer: String, transitions: Vec<String>) -> Self {
        Self {
            request_id,
            status: ResultStatus::Success,
            answer: Some(answer),
            error_detail: None,
            transitions,
            elapsed_ms: 0,
        }
    }

    pub fn not_answered(
        request_id: Uuid,
        status: ResultStatus,
        error_detail: String,
        transitions: Vec<String>,
    ) -> Self {
        Self {
            request_id,
            status,
            answer: None,
            error_detail: Some(error_detail),
            transitions,
            elapsed_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestState::Received => "Received",
            RequestState::Validated => "Validated",
            RequestState::Loaded => "Loaded",
            RequestState::Sessioned => "Sessioned",
            RequestState::Answered => "Answered",
            RequestState::Rejected => "Rejected",
            RequestState::Failed => "Failed",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResultStatus::Success => "success",
            ResultStatus::ClientError => "client_error",
            ResultStatus::ProviderError => "provider_error",
            ResultStatus::InternalError => "internal_error",
        };
        write!(f, "{}", s)
    }
}
