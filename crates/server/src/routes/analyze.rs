//! POST /analyze_pgn — replay a game record and evaluate every ply.

use axum::{Extension, Json};
use serde::Deserialize;
use tracing::{error, info};

use analysis_core::envelope::ResultEnvelope;
use analysis_core::pipeline::{analyze_game, AnalyzeInput, AnalyzeOptions};

use crate::config::Config;
use crate::stockfish::StockfishEngine;

fn default_depth() -> u32 {
    12
}

fn default_multipv() -> u32 {
    2
}

fn default_time_sec() -> f64 {
    0.05
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub pgn: String,
    pub initial_fen: Option<String>,
    #[serde(default = "default_depth")]
    pub depth: u32,
    #[serde(default = "default_multipv")]
    pub multipv: u32,
    /// Time per ply in seconds. Keep low if depth is the real limit.
    #[serde(default = "default_time_sec")]
    pub time_sec: f64,
}

/// Always answers HTTP 200: the envelope's `status`/`error` fields carry
/// the domain outcome.
pub async fn analyze_pgn(
    Extension(config): Extension<Config>,
    Json(request): Json<AnalyzeRequest>,
) -> Json<ResultEnvelope> {
    let input = AnalyzeInput {
        record: request.pgn,
        initial_position: request.initial_fen,
    };
    let options = AnalyzeOptions {
        depth: request.depth,
        line_count: request.multipv,
        time_budget_seconds: request.time_sec,
    };

    // One engine session per request, released on every exit path.
    let mut engine = match StockfishEngine::spawn(&config.stockfish_path, config.engine_hash_mb)
        .await
    {
        Ok(engine) => engine,
        Err(err) => {
            error!(error = %err, "Failed to start engine session");
            return Json(ResultEnvelope::failure(&err, vec![], vec![]));
        }
    };

    let envelope = analyze_game(&input, &options, &mut engine).await;
    engine.quit().await;

    info!(
        depth = options.depth,
        plies = envelope.per_ply.len(),
        ok = envelope.error.is_none(),
        "Request finished"
    );
    Json(envelope)
}
