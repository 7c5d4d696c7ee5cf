use analytics_agent_backend::{
    agent::GeminiAgentFactory,
    api::start_server,
    config::AgentConfig,
    models::ExecutionPolicy,
    orchestrator::RequestOrchestrator,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = AgentConfig::from_env();

    let api_port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8000".to_string())
        .parse()?;

    info!("🚀 Analytics Agent Backend - API Server");
    info!("📍 Port: {}", api_port);
    info!("🧠 Model: {}", config.model);
    info!("⏱️  Provider deadline: {}s", config.ask_timeout.as_secs());

    if config.has_credential() {
        info!("🔑 Provider credential: found");
    } else {
        warn!("⚠️  GEMINI_API_KEY not set in .env");
        warn!("📌 Analyze requests will fail until a credential is configured");
    }

    // Create orchestrator
    let policy = ExecutionPolicy::new(config.ask_timeout);
    let orchestrator = Arc::new(RequestOrchestrator::new(
        Box::new(GeminiAgentFactory::new(config)),
        policy,
    ));

    info!("✅ Orchestrator initialized");
    info!("📡 Starting API server...");

    // Start API server
    start_server(orchestrator, api_port).await?;

    Ok(())
}
