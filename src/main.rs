use std::sync::Arc;

use anyhow::Context;

use mail_triage::api::triage_routes;
use mail_triage::config::TriageConfig;
use mail_triage::pipeline::MessageProcessor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = TriageConfig::from_env();
    // Validates the config and creates providers once for every request.
    let processor = Arc::new(
        MessageProcessor::from_config(&config).context("Failed to start triage pipeline")?,
    );

    eprintln!("📬 Mail Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/process", config.port);
    eprintln!("   Max upload: {} bytes", config.max_upload_bytes);
    eprintln!(
        "   Arbitration: {}",
        match (config.arbitration_enabled, &config.classifier_llm) {
            (false, _) => "disabled".to_string(),
            (true, Some(llm)) => format!("enabled ({})", llm.model),
            (true, None) => "enabled, no credentials (heuristic only)".to_string(),
        }
    );
    eprintln!(
        "   Replies: {}\n",
        config
            .reply_llm
            .as_ref()
            .map_or("templates".to_string(), |llm| llm.model.clone())
    );

    let app = triage_routes(processor, config.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Triage server started");
    axum::serve(listener, app).await?;

    Ok(())
}

