//! HTTP request handlers
//!
//! Every playback command answers with the engine snapshot taken right
//! after the command was applied.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::server::AppContext;
use crate::error::Error;
use crate::playback::{CommandKind, PlaybackSnapshot};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExitRequest {
    #[serde(default)]
    confirm: bool,
}

type HandlerResult = Result<Json<PlaybackSnapshot>, (StatusCode, Json<StatusResponse>)>;

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "cadence_player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /playback/state
pub async fn get_state(State(ctx): State<AppContext>) -> Json<PlaybackSnapshot> {
    Json(ctx.engine.snapshot())
}

/// POST /playback/pause (toggle)
pub async fn toggle_pause(State(ctx): State<AppContext>) -> HandlerResult {
    command(&ctx, CommandKind::TogglePause).await
}

/// POST /playback/next
pub async fn next(State(ctx): State<AppContext>) -> HandlerResult {
    command(&ctx, CommandKind::Next).await
}

/// POST /playback/previous
pub async fn previous(State(ctx): State<AppContext>) -> HandlerResult {
    command(&ctx, CommandKind::Previous).await
}

/// POST /playback/exit
///
/// Body `{"confirm": true}` is required once the class is under way.
pub async fn exit(State(ctx): State<AppContext>, request: Option<Json<ExitRequest>>) -> HandlerResult {
    let confirm = request.map(|Json(r)| r.confirm).unwrap_or_default();
    command(&ctx, CommandKind::Exit { confirm }).await
}

/// POST /audio/enable
pub async fn enable_audio(State(ctx): State<AppContext>) -> HandlerResult {
    command(&ctx, CommandKind::EnableAudio).await
}

async fn command(ctx: &AppContext, kind: CommandKind) -> HandlerResult {
    match ctx.engine.send(kind).await {
        Ok(snapshot) => {
            info!("{:?} -> {} at segment {}", kind, snapshot.status, snapshot.segment.index);
            Ok(Json(snapshot))
        }
        Err(e) => {
            let status = match &e {
                Error::ConfirmationRequired | Error::InvalidState(_) => StatusCode::CONFLICT,
                Error::EngineStopped => StatusCode::GONE,
                _ => {
                    error!("{:?} failed: {}", kind, e);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            Err((
                status,
                Json(StatusResponse {
                    status: format!("error: {}", e),
                }),
            ))
        }
    }
}
