//! Engine adapter capability — abstract multi-line position analysis.
//!
//! The pipeline never talks to an engine process directly; it consumes this
//! trait and leaves session setup/teardown to the surrounding service.

use std::future::Future;
use std::time::Duration;

use crate::error::AnalyzeError;

/// Signed sentinel for forced-mate scores. Collapsing "mate in N" to a
/// large-magnitude centipawn value is deliberately lossy: it keeps forced
/// mates ordered above any material advantage while fitting the single
/// `eval_cp` field.
pub const MATE_SCORE_CP: i32 = 100_000;

/// Bounds on the requested candidate-line count. The cap of 3 is a resource
/// bound, not a caller-configurable ceiling.
pub const MIN_LINES: u32 = 1;
pub const MAX_LINES: u32 = 3;

/// Evaluation from White's perspective, comparable across plies regardless
/// of which side moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawns.
    Cp(i32),
    /// Forced mate in N moves (positive = White mates).
    Mate(i32),
}

impl Score {
    /// Collapse to centipawns, mapping mates to the ±100000 sentinel.
    pub fn to_cp(self) -> i32 {
        match self {
            Score::Cp(v) => v,
            Score::Mate(n) => {
                if n > 0 {
                    MATE_SCORE_CP
                } else {
                    -MATE_SCORE_CP
                }
            }
        }
    }
}

/// Search limits for one `analyze` call. Adapters may honor depth, wall
/// clock, or both.
#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    pub depth: Option<u32>,
    pub movetime: Option<Duration>,
}

/// One ranked candidate line as reported by the engine. `moves` may be
/// empty near terminal positions; `score` is already normalized to White's
/// perspective.
#[derive(Debug, Clone, Default)]
pub struct EngineLine {
    pub rank: u32,
    pub moves: Vec<String>,
    pub score: Option<Score>,
}

/// Abstract analysis-engine capability.
///
/// `line_count` is best-effort: an adapter may return fewer lines than
/// requested (it must return at least one whenever a legal move exists)
/// and must fall back silently if the underlying engine rejects the
/// multi-line configuration. Each call is potentially expensive; the
/// pipeline invokes it at most once per successfully replayed ply.
pub trait EngineAdapter {
    fn analyze(
        &mut self,
        fen: &str,
        limits: SearchLimits,
        line_count: u32,
    ) -> impl Future<Output = Result<Vec<EngineLine>, AnalyzeError>> + Send;
}
