//! Analysis session
//!
//! Binds one agent to one table for one request. Owns the provider-call
//! deadline and fault classification. Sessions are built per request and
//! dropped with it; nothing here is shared or reused.

use crate::agent::AnalysisAgent;
use crate::classifier::{classify_fault, truncate_detail, FaultClassifier, ProviderFault};
use crate::error::AnalysisError;
use crate::models::ExecutionPolicy;
use crate::table::Table;
use crate::Result;
use std::time::Instant;
use tracing::{info, warn};

pub struct AnalysisSession {
    table: Table,
    agent: Box<dyn AnalysisAgent>,
    policy: ExecutionPolicy,
    classifier: FaultClassifier,
}

impl AnalysisSession {
    /// Bind an agent to a table. An empty table is rejected here, before
    /// any provider call can be made for it.
    pub fn new(
        table: Table,
        agent: Box<dyn AnalysisAgent>,
        policy: ExecutionPolicy,
    ) -> Result<Self> {
        if table.row_count() == 0 {
            return Err(AnalysisError::EmptyData);
        }

        Ok(Self {
            table,
            agent,
            policy,
            classifier: classify_fault,
        })
    }

    /// Swap the fault classifier (tests, alternative providers).
    pub fn with_classifier(mut self, classifier: FaultClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Forward one question to the agent under the session deadline.
    pub async fn ask(&self, question: &str) -> Result<String> {
        let started = Instant::now();
        let context = self.table.context();

        info!(
            rows = context.row_count,
            cols = context.columns.len(),
            "Session: asking agent"
        );

        let deadline = self.policy.ask_timeout;
        let reply = tokio::time::timeout(deadline, self.agent.ask(question, &context)).await;

        match reply {
            Err(_elapsed) => {
                warn!(
                    timeout_secs = deadline.as_secs(),
                    "Session: provider call hit the deadline"
                );
                Err(AnalysisError::Timeout(deadline.as_secs()))
            }
            Ok(Ok(answer)) => {
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Session: answer received"
                );
                Ok(answer)
            }
            Ok(Err(error)) => Err(self.classify(error)),
        }
    }

    /// Turn a raw agent fault into its stable category.
    fn classify(&self, error: AnalysisError) -> AnalysisError {
        match error {
            AnalysisError::Agent(raw) => {
                let fault = (self.classifier)(&raw);
                warn!(fault = ?fault, "Session: provider fault");

                match fault {
                    ProviderFault::RateLimited => AnalysisError::RateLimited(raw),
                    ProviderFault::Misconfigured => AnalysisError::Misconfigured(raw),
                    ProviderFault::InputTooLarge => AnalysisError::InputTooLarge(raw),
                    ProviderFault::Unclassified => {
                        AnalysisError::Unclassified(truncate_detail(&raw))
                    }
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::MockAgent;
    use crate::classifier::MAX_DETAIL_LEN;
    use crate::error::{RATE_LIMITED_MESSAGE, TIMEOUT_MESSAGE};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn sample_table() -> Table {
        Table::load(b"a,b\n1,2\n3,4\n").unwrap()
    }

    fn short_deadline() -> ExecutionPolicy {
        ExecutionPolicy::new(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_ask_returns_agent_answer() {
        let session = AnalysisSession::new(
            sample_table(),
            Box::new(MockAgent::answering("4")),
            short_deadline(),
        )
        .unwrap();

        let answer = session.ask("What is the max of b?").await.unwrap();
        assert_eq!(answer, "4");
    }

    #[tokio::test]
    async fn test_empty_table_never_reaches_the_agent() {
        let empty = Table::from_parts(vec!["a".to_string(), "b".to_string()], Vec::new()).unwrap();
        let agent = MockAgent::answering("unreachable");
        let calls = agent.call_counter();

        let result = AnalysisSession::new(empty, Box::new(agent), short_deadline());

        assert!(matches!(result, Err(AnalysisError::EmptyData)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_fault_maps_to_fixed_message() {
        let session = AnalysisSession::new(
            sample_table(),
            Box::new(MockAgent::failing("Rate limit exceeded")),
            short_deadline(),
        )
        .unwrap();

        let error = session.ask("anything").await.unwrap_err();
        assert!(matches!(error, AnalysisError::RateLimited(_)));
        assert_eq!(error.user_message(), RATE_LIMITED_MESSAGE);
    }

    #[tokio::test]
    async fn test_classification_ignores_case() {
        for raw in ["RATE LIMIT EXCEEDED", "Rate Limit exceeded", "rate limit"] {
            let session = AnalysisSession::new(
                sample_table(),
                Box::new(MockAgent::failing(raw)),
                short_deadline(),
            )
            .unwrap();

            let error = session.ask("anything").await.unwrap_err();
            assert!(matches!(error, AnalysisError::RateLimited(_)), "raw: {}", raw);
        }
    }

    #[tokio::test]
    async fn test_credential_and_context_faults_classify() {
        let session = AnalysisSession::new(
            sample_table(),
            Box::new(MockAgent::failing("API key not valid")),
            short_deadline(),
        )
        .unwrap();
        assert!(matches!(
            session.ask("q").await.unwrap_err(),
            AnalysisError::Misconfigured(_)
        ));

        let session = AnalysisSession::new(
            sample_table(),
            Box::new(MockAgent::failing("input exceeds context length")),
            short_deadline(),
        )
        .unwrap();
        assert!(matches!(
            session.ask("q").await.unwrap_err(),
            AnalysisError::InputTooLarge(_)
        ));
    }

    #[tokio::test]
    async fn test_unknown_fault_keeps_truncated_detail() {
        let raw = "y".repeat(MAX_DETAIL_LEN * 3);
        let session = AnalysisSession::new(
            sample_table(),
            Box::new(MockAgent::failing(raw)),
            short_deadline(),
        )
        .unwrap();

        match session.ask("q").await.unwrap_err() {
            AnalysisError::Unclassified(detail) => {
                assert_eq!(detail.chars().count(), MAX_DETAIL_LEN + 3);
                assert!(detail.ends_with("..."));
            }
            other => panic!("expected unclassified fault, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_a_timeout_fault() {
        let agent = MockAgent::answering("too late").with_delay(Duration::from_millis(200));
        let session = AnalysisSession::new(
            sample_table(),
            Box::new(agent),
            ExecutionPolicy::new(Duration::from_millis(20)),
        )
        .unwrap();

        let error = session.ask("q").await.unwrap_err();
        assert!(matches!(error, AnalysisError::Timeout(_)));
        assert_eq!(error.user_message(), TIMEOUT_MESSAGE);
    }

    #[tokio::test]
    async fn test_injected_classifier_wins() {
        fn everything_is_rate_limiting(_raw: &str) -> ProviderFault {
            ProviderFault::RateLimited
        }

        let session = AnalysisSession::new(
            sample_table(),
            Box::new(MockAgent::failing("some novel provider noise")),
            short_deadline(),
        )
        .unwrap()
        .with_classifier(everything_is_rate_limiting);

        assert!(matches!(
            session.ask("q").await.unwrap_err(),
            AnalysisError::RateLimited(_)
        ));
    }
}
