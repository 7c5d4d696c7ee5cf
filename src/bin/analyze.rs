use analytics_agent_backend::{
    agent::GeminiAgentFactory,
    config::AgentConfig,
    models::{AnalysisRequest, ExecutionPolicy},
    orchestrator::RequestOrchestrator,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    dotenv::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let (Some(path), Some(question)) = (args.next(), args.next()) else {
        eprintln!("Usage: analyze <file.csv> \"<question>\"");
        std::process::exit(2);
    };

    let config = AgentConfig::from_env();
    info!(model = %config.model, "Analytics agent - one-shot run");

    let file_bytes = std::fs::read(&path)?;
    let filename = std::path::Path::new(&path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.clone());

    let policy = ExecutionPolicy::new(config.ask_timeout);
    let orchestrator =
        RequestOrchestrator::new(Box::new(GeminiAgentFactory::new(config)), policy);

    let request = AnalysisRequest::new(filename, file_bytes, question);

    info!(
        request_id = %request.request_id,
        filename = %request.filename,
        "Running analysis"
    );

    let result = orchestrator.handle(request).await;

    println!("\n=== ANALYSIS RESULT ===");
    println!("Status: {}", result.status);
    println!("Elapsed: {} ms", result.elapsed_ms);

    println!("\nTransitions:");
    for (i, transition) in result.transitions.iter().enumerate() {
        println!("  {}: {}", i + 1, transition);
    }

    match (result.answer, result.error_detail) {
        (Some(answer), _) => {
            println!("\nAnswer:\n{}", answer);
            Ok(())
        }
        (None, Some(error)) => {
            eprintln!("\nAnalysis failed: {}", error);
            Err(error.into())
        }
        (None, None) => Err("analysis produced no outcome".into()),
    }
}
