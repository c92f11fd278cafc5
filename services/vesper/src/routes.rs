use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use vesper_core::{CommandResolver, CommandResult, Speech, StatsReport, StatusSnapshot};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<CommandResolver>,
    pub speech: Arc<dyn Speech>,
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct TogglePayload {
    pub state: bool,
}

/// Wire form of a command outcome. Field names are camelCase to match the
/// frontend's expectations.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    /// True when the utterance changed something: a command ran, the
    /// session woke or slept, or a clarification round-trip started.
    pub success: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awake_until: Option<String>,
}

impl CommandResponse {
    pub fn from_result(result: CommandResult) -> Self {
        match result {
            CommandResult::Duplicate => Self::plain(false, "duplicate"),
            CommandResult::Offline => Self::plain(false, "offline"),
            CommandResult::Waiting => Self::plain(false, "waiting"),
            CommandResult::NotExecuted => Self::plain(false, "not_executed"),
            CommandResult::Sleep => Self::plain(true, "asleep"),
            CommandResult::AwaitingClarification => Self::plain(true, "clarifying"),
            CommandResult::Wake { awake_until } => Self {
                success: true,
                status: "awake",
                matched: None,
                awake_until: Some(instant_to_rfc3339(awake_until)),
            },
            CommandResult::Executed {
                matched,
                awake_until,
            } => Self {
                success: true,
                status: "executed",
                matched: Some(matched),
                awake_until: Some(instant_to_rfc3339(awake_until)),
            },
        }
    }

    fn plain(success: bool, status: &'static str) -> Self {
        Self {
            success,
            status,
            matched: None,
            awake_until: None,
        }
    }
}

/// Wire form of a session snapshot, pushed over the WebSocket once a second
/// and returned from GET /api/status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    pub powered_on: bool,
    pub mic_on: bool,
    pub volume_on: bool,
    pub awake: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awake_until: Option<String>,
    pub speaking: bool,
    pub last_command: String,
    pub command_count: usize,
    pub stats: StatsReport,
}

impl StatusPayload {
    pub fn from_snapshot(snap: StatusSnapshot) -> Self {
        Self {
            powered_on: snap.powered_on,
            mic_on: snap.mic_on,
            volume_on: snap.volume_on,
            awake: snap.awake,
            awake_until: snap.awake_until.map(instant_to_rfc3339),
            speaking: snap.speaking,
            last_command: snap.last_command,
            command_count: snap.command_count,
            stats: snap.stats,
        }
    }
}

/// Project a monotonic deadline onto the wall clock for the frontend.
fn instant_to_rfc3339(at: Instant) -> String {
    let remaining = at.saturating_duration_since(Instant::now());
    let remaining =
        chrono::Duration::from_std(remaining).unwrap_or_else(|_| chrono::Duration::zero());
    (chrono::Local::now() + remaining).to_rfc3339()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/command", post(command))
        .route("/api/status", get(status))
        .route("/api/speak", post(speak))
        .route("/api/power", post(power))
        .route("/api/mic", post(mic))
        .route("/api/volume", post(volume))
        .route("/api/reset", post(reset))
        .route("/ws", get(crate::ws::ws_handler))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "vesper" }))
}

async fn command(
    State(state): State<AppState>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, StatusCode> {
    if req.text.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let result = state.resolver.resolve(&req.text).await;
    Ok(Json(CommandResponse::from_result(result)))
}

async fn status(State(state): State<AppState>) -> Json<StatusPayload> {
    Json(StatusPayload::from_snapshot(state.resolver.snapshot().await))
}

/// Direct text-to-speech, bypassing command resolution. Used by the control
/// panel to make announcements.
async fn speak(
    State(state): State<AppState>,
    Json(req): Json<SpeakRequest>,
) -> Result<StatusCode, StatusCode> {
    if req.text.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    state.speech.say(req.text.trim());
    Ok(StatusCode::ACCEPTED)
}

async fn power(
    State(state): State<AppState>,
    Json(toggle): Json<TogglePayload>,
) -> Json<StatusPayload> {
    state.resolver.set_power(toggle.state).await;
    Json(StatusPayload::from_snapshot(state.resolver.snapshot().await))
}

async fn mic(
    State(state): State<AppState>,
    Json(toggle): Json<TogglePayload>,
) -> Json<StatusPayload> {
    state.resolver.set_mic(toggle.state).await;
    Json(StatusPayload::from_snapshot(state.resolver.snapshot().await))
}

async fn volume(
    State(state): State<AppState>,
    Json(toggle): Json<TogglePayload>,
) -> Json<StatusPayload> {
    state.resolver.set_volume(toggle.state).await;
    Json(StatusPayload::from_snapshot(state.resolver.snapshot().await))
}

async fn reset(State(state): State<AppState>) -> Json<StatusPayload> {
    state.resolver.reset().await;
    Json(StatusPayload::from_snapshot(state.resolver.snapshot().await))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executed_result_serializes_with_camel_case_fields() {
        let response = CommandResponse {
            success: true,
            status: "executed",
            matched: Some("open youtube".to_string()),
            awake_until: Some("2026-01-01T00:00:30+00:00".to_string()),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["status"], "executed");
        assert_eq!(value["matched"], "open youtube");
        assert!(value.get("awakeUntil").is_some());
    }

    #[test]
    fn plain_results_omit_optional_fields() {
        let value =
            serde_json::to_value(CommandResponse::from_result(CommandResult::Duplicate)).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["status"], "duplicate");
        assert!(value.get("matched").is_none());
        assert!(value.get("awakeUntil").is_none());
    }

    #[test]
    fn wake_result_carries_a_deadline() {
        let result = CommandResult::Wake {
            awake_until: Instant::now() + std::time::Duration::from_secs(30),
        };
        let response = CommandResponse::from_result(result);
        assert!(response.success);
        assert_eq!(response.status, "awake");
        assert!(response.awake_until.is_some());
    }

    #[test]
    fn clarification_counts_as_success() {
        let response = CommandResponse::from_result(CommandResult::AwaitingClarification);
        assert!(response.success);
        assert_eq!(response.status, "clarifying");
    }

    #[test]
    fn status_payload_uses_frontend_field_names() {
        let payload = StatusPayload {
            powered_on: true,
            mic_on: true,
            volume_on: false,
            awake: true,
            awake_until: None,
            speaking: false,
            last_command: "open google".to_string(),
            command_count: 150,
            stats: StatsReport::unknown(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["poweredOn"], true);
        assert_eq!(value["volumeOn"], false);
        assert_eq!(value["lastCommand"], "open google");
        assert_eq!(value["commandCount"], 150);
        assert_eq!(value["stats"]["cpuPercent"], 0.0);
    }
}
