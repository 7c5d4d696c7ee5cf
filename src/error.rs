//! Error types for the analytics agent backend

use thiserror::Error;

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {

    // =============================
    // Client Faults (HTTP 400)
    // =============================

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error("Could not parse CSV file: {0}")]
    Format(String),

    #[error("The uploaded CSV contains no data rows")]
    EmptyData,

    #[error("Missing multipart field: {0}")]
    MissingField(String),

    #[error("Malformed multipart request: {0}")]
    BadUpload(String),

    // =============================
    // Configuration Faults (HTTP 500)
    // =============================

    #[error("Provider credential is not configured")]
    Configuration,

    // =============================
    // Provider Faults (HTTP 500)
    // =============================

    #[error("Provider rate limit hit: {0}")]
    RateLimited(String),

    #[error("Provider rejected credentials: {0}")]
    Misconfigured(String),

    #[error("Provider context window exceeded: {0}")]
    InputTooLarge(String),

    #[error("Provider call failed: {0}")]
    Unclassified(String),

    #[error("Provider call exceeded the {0}s deadline")]
    Timeout(u64),

    /// Raw provider fault before classification. Never escapes the session.
    #[error("Agent error: {0}")]
    Agent(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================
// Fixed User-Facing Messages
// =============================

pub const INVALID_FILE_TYPE_MESSAGE: &str = "Invalid file type. Please upload a CSV.";
pub const EMPTY_QUESTION_MESSAGE: &str = "Question must not be empty.";
pub const EMPTY_DATA_MESSAGE: &str = "The uploaded CSV contains no data rows.";
pub const CONFIGURATION_MESSAGE: &str =
    "The analysis service is not configured. Please contact the service operator.";
pub const RATE_LIMITED_MESSAGE: &str =
    "The AI service is currently rate limited. Please wait a moment and try again.";
pub const MISCONFIGURED_MESSAGE: &str =
    "The AI service rejected the configured credentials. Please contact the service operator.";
pub const INPUT_TOO_LARGE_MESSAGE: &str =
    "The dataset or question is too large for the AI service. Try a smaller file or a shorter question.";
pub const TIMEOUT_MESSAGE: &str = "The analysis timed out. Please try a simpler question.";
pub const INTERNAL_MESSAGE: &str = "An unexpected error occurred. Please try again.";

impl AnalysisError {
    /// True for faults caused by the request itself rather than the service.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidFileType(_)
                | AnalysisError::EmptyQuestion
                | AnalysisError::Format(_)
                | AnalysisError::EmptyData
                | AnalysisError::MissingField(_)
                | AnalysisError::BadUpload(_)
        )
    }

    /// The stable message shown to the user for this fault.
    ///
    /// Each provider category maps to exactly one fixed string; only format
    /// and unclassified faults carry variable (bounded) detail. Credential
    /// state never appears here.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::InvalidFileType(_) => INVALID_FILE_TYPE_MESSAGE.to_string(),
            AnalysisError::EmptyQuestion => EMPTY_QUESTION_MESSAGE.to_string(),
            AnalysisError::Format(detail) => format!("Could not parse CSV file: {}", detail),
            AnalysisError::EmptyData => EMPTY_DATA_MESSAGE.to_string(),
            AnalysisError::MissingField(name) => format!("Missing form field: {}.", name),
            AnalysisError::BadUpload(detail) => format!("Could not read upload: {}", detail),
            AnalysisError::Configuration => CONFIGURATION_MESSAGE.to_string(),
            AnalysisError::RateLimited(_) => RATE_LIMITED_MESSAGE.to_string(),
            AnalysisError::Misconfigured(_) => MISCONFIGURED_MESSAGE.to_string(),
            AnalysisError::InputTooLarge(_) => INPUT_TOO_LARGE_MESSAGE.to_string(),
            AnalysisError::Timeout(_) => TIMEOUT_MESSAGE.to_string(),
            AnalysisError::Unclassified(detail) | AnalysisError::Agent(detail) => format!(
                "Analysis failed: {}. Please check your question and try again.",
                detail
            ),
            AnalysisError::Serialization(_) | AnalysisError::Http(_) | AnalysisError::Io(_) => {
                INTERNAL_MESSAGE.to_string()
            }
        }
    }
}
