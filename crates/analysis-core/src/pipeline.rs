//! Pipeline orchestration: decode, replay, per-ply engine analysis.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::{EngineAdapter, EngineLine, Score, SearchLimits, MAX_LINES, MIN_LINES};
use crate::envelope::{CandidateLine, PlyRecord, ResultEnvelope};
use crate::error::AnalyzeError;
use crate::moments::select_key_moments;
use crate::record;
use crate::replay::{PlayedMove, Replayer};

/// The game to analyze: PGN text plus an optional starting-position
/// override that takes precedence over the record's FEN header.
#[derive(Debug, Clone)]
pub struct AnalyzeInput {
    pub record: String,
    pub initial_position: Option<String>,
}

/// Per-request search settings.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzeOptions {
    pub depth: u32,
    pub line_count: u32,
    pub time_budget_seconds: f64,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            depth: 12,
            line_count: 2,
            time_budget_seconds: 0.05,
        }
    }
}

impl AnalyzeOptions {
    pub fn clamped_line_count(&self) -> u32 {
        self.line_count.clamp(MIN_LINES, MAX_LINES)
    }

    fn limits(&self) -> SearchLimits {
        SearchLimits {
            depth: Some(self.depth),
            movetime: Some(Duration::from_secs_f64(self.time_budget_seconds)),
        }
    }
}

/// Run the full pipeline. Infallible by design: every failure mode is
/// folded into the envelope, with the per-ply prefix (and key moments
/// derived from it) preserved as far as replay got.
pub async fn analyze_game<E: EngineAdapter>(
    input: &AnalyzeInput,
    options: &AnalyzeOptions,
    engine: &mut E,
) -> ResultEnvelope {
    let mut per_ply: Vec<PlyRecord> = Vec::new();

    match run_pipeline(input, options, engine, &mut per_ply).await {
        Ok(()) => {
            let key_moments = select_key_moments(&per_ply);
            info!(
                plies = per_ply.len(),
                key_moments = key_moments.len(),
                "Analysis complete"
            );
            ResultEnvelope::ok(per_ply, key_moments)
        }
        Err(err) => {
            warn!(plies = per_ply.len(), error = %err, "Analysis failed");
            let key_moments = select_key_moments(&per_ply);
            ResultEnvelope::failure(&err, per_ply, key_moments)
        }
    }
}

async fn run_pipeline<E: EngineAdapter>(
    input: &AnalyzeInput,
    options: &AnalyzeOptions,
    engine: &mut E,
    per_ply: &mut Vec<PlyRecord>,
) -> Result<(), AnalyzeError> {
    let record = record::decode(&input.record)?;

    let mut replayer = match &input.initial_position {
        Some(fen) => Replayer::from_fen(fen)?,
        None => match &record.start_fen {
            // A bad FEN *header* is a record problem, not an override problem.
            Some(fen) => Replayer::from_fen(fen)
                .map_err(|e| AnalyzeError::InvalidRecord(format!("FEN header: {e}")))?,
            None => Replayer::new(),
        },
    };

    let limits = options.limits();
    let line_count = options.clamped_line_count();
    debug!(
        moves = record.tokens.len(),
        depth = options.depth,
        line_count,
        "Replaying record"
    );

    for token in &record.tokens {
        let played = replayer.apply(token)?;
        let lines = engine.analyze(&played.fen_after, limits, line_count).await?;
        per_ply.push(build_ply_record(&replayer, played, lines));
    }

    Ok(())
}

/// Normalize heterogeneous engine output into one PlyRecord. Candidate SAN
/// is rendered against the position the engine analyzed (the replayer's
/// current position, i.e. after the played move).
fn build_ply_record(
    replayer: &Replayer,
    played: PlayedMove,
    mut lines: Vec<EngineLine>,
) -> PlyRecord {
    lines.sort_by_key(|line| line.rank);

    let mut pvs: Vec<CandidateLine> = Vec::new();
    let mut eval_cp: Option<i32> = None;

    for line in &lines {
        // Terminal positions can yield lines with no moves; skip them
        // without aborting the ply.
        let Some(best_uci) = line.moves.first() else {
            continue;
        };
        let san = replayer
            .san_for_uci(best_uci)
            .unwrap_or_else(|| best_uci.clone());
        let cp = line.score.map(Score::to_cp);
        if line.rank == 1 {
            eval_cp = cp;
        }
        pvs.push(CandidateLine {
            rank: line.rank,
            uci: best_uci.clone(),
            san,
            eval_cp: cp,
        });
    }

    PlyRecord {
        ply: played.ply,
        played_uci: played.uci,
        played_san: played.san,
        fen_after: played.fen_after,
        eval_cp,
        pvs,
    }
}
