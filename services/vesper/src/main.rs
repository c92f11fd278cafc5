mod automation;
mod config;
mod routes;
mod stats;
mod tts;
mod ws;

use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::fmt::time::ChronoLocal;
use vesper_core::{
    ActionRegistry, Collaborators, CommandResolver, GeminiClassifier, IntentClassifier,
    SpeechGate, SystemClock, TokioSpawner,
};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    tracing::info!("Configuration loaded successfully. Starting Vesper service...");

    // --- 3. Wire Up Collaborators ---
    let gate = Arc::new(SpeechGate::default());
    let speech = Arc::new(tts::TtsSpeech::new(gate.clone()));
    let system_stats = Arc::new(stats::SysinfoStats::new());

    let classifier: Option<Arc<dyn IntentClassifier>> = match &config.gemini_api_key {
        Some(key) => {
            tracing::info!(model = %config.classifier_model, "intent classifier enabled");
            let triggers = ActionRegistry::new().trigger_phrases();
            Some(Arc::new(GeminiClassifier::new(
                key.clone(),
                config.classifier_model.clone(),
                &triggers,
            )))
        }
        None => {
            tracing::warn!(
                "GEMINI_API_KEY not set; unrecognized utterances get a canned reply"
            );
            None
        }
    };

    let resolver = Arc::new(CommandResolver::new(
        config.resolver_config(),
        Collaborators {
            clock: Arc::new(SystemClock),
            speech: speech.clone(),
            automation: Arc::new(automation::DesktopAutomation),
            stats: system_stats,
            spawner: Arc::new(TokioSpawner),
            classifier,
        },
        gate,
    ));

    // --- 4. Serve ---
    // Permissive CORS so the control panel frontend can talk to us from
    // any origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let app = routes::router(routes::AppState { resolver, speech }).layer(cors);

    tracing::info!("Listening on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
