use std::sync::Arc;

use futures::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use perfume_quiz::api::{HttpApiClient, RecommendationApi};
use perfume_quiz::config::QuizConfig;
use perfume_quiz::quiz::{FlowEvent, QuizController};
use perfume_quiz::terminal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = QuizConfig::from_env()?;

    eprintln!("🧴 Perfume Quiz v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: {}", config.api_base_url);

    let client = HttpApiClient::from_config(&config)?;
    let api: Arc<dyn RecommendationApi> = Arc::new(client);

    // ── Health probe (informational only) ───────────────────────────────
    if !config.skip_health_check {
        match api.health_check().await {
            Ok(health) if health.is_ok() => eprintln!(
                "   Service: ok ({} perfumes, AI {})",
                health.perfumes_loaded,
                if health.gemini_configured {
                    "configured"
                } else {
                    "not configured"
                }
            ),
            Ok(health) => eprintln!("   Service: {}", health.status),
            Err(e) => tracing::warn!("Health check failed: {}", e),
        }
    }
    eprintln!("   Type an option number, n/p to navigate, s to submit, q to quit.\n");

    let mut controller = QuizController::new(Arc::clone(&api));

    // Log every phase change in the background
    let mut events = BroadcastStream::new(controller.subscribe());
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                Ok(FlowEvent::Transition {
                    from,
                    to,
                    attempt_id,
                }) => tracing::debug!(%from, %to, ?attempt_id, "Flow transition"),
                Ok(FlowEvent::Failed { message }) => {
                    tracing::info!(reason = %message, "Quiz flow failed")
                }
                Err(e) => tracing::warn!("Flow event stream lagged: {}", e),
            }
        }
    });

    controller.load().await?;
    terminal::run(&mut controller).await;

    Ok(())
}
