//! Result envelope — the uniform success/error response shape.

use serde::Serialize;
use serde_json::json;

use crate::error::AnalyzeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// One ranked engine suggestion for a ply.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateLine {
    pub rank: u32,
    pub uci: String,
    pub san: String,
    pub eval_cp: Option<i32>,
}

/// Per-ply analysis record. `eval_cp` is the principal-line evaluation and
/// is absent when the engine degraded to no rank-1 line.
#[derive(Debug, Clone, Serialize)]
pub struct PlyRecord {
    pub ply: u32,
    pub played_uci: String,
    pub played_san: String,
    pub fen_after: String,
    pub eval_cp: Option<i32>,
    pub pvs: Vec<CandidateLine>,
}

/// A decisive moment: a ply whose principal evaluation swung hardest
/// against the previous ply's.
#[derive(Debug, Clone, Serialize)]
pub struct KeyMoment {
    pub ply: u32,
    pub played_san: String,
    pub eval_cp: Option<i32>,
    pub swing: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub details: serde_json::Value,
}

/// Every pipeline outcome, success or failure, terminates in this shape.
/// On failure `per_ply` and `key_moments` cover only the prefix processed
/// before the error.
#[derive(Debug, Clone, Serialize)]
pub struct ResultEnvelope {
    pub status: Status,
    pub legal: bool,
    pub per_ply: Vec<PlyRecord>,
    pub key_moments: Vec<KeyMoment>,
    pub error: Option<ErrorBody>,
}

impl ResultEnvelope {
    pub fn ok(per_ply: Vec<PlyRecord>, key_moments: Vec<KeyMoment>) -> Self {
        Self {
            status: Status::Ok,
            legal: true,
            per_ply,
            key_moments,
            error: None,
        }
    }

    pub fn failure(
        err: &AnalyzeError,
        per_ply: Vec<PlyRecord>,
        key_moments: Vec<KeyMoment>,
    ) -> Self {
        let (code, message, details) = match err {
            AnalyzeError::InvalidRecord(msg) => {
                ("INVALID_PGN", format!("Could not parse PGN: {msg}"), json!({}))
            }
            AnalyzeError::InvalidStartPosition(msg) => {
                ("INVALID_FEN", format!("Invalid initial FEN: {msg}"), json!({}))
            }
            AnalyzeError::IllegalMove {
                ply,
                uci,
                fen_before,
            } => (
                "ILLEGAL_MOVE",
                "Move is not legal from reconstructed position.".to_string(),
                json!({
                    "first_illegal_move": {
                        "ply": ply,
                        "uci": uci,
                        "fen_before": fen_before,
                    }
                }),
            ),
            AnalyzeError::Engine(msg) => {
                ("INTERNAL_ERROR", format!("Engine failure: {msg}"), json!({}))
            }
        };

        Self {
            status: Status::Error,
            legal: false,
            per_ply,
            key_moments,
            error: Some(ErrorBody {
                code,
                message,
                details,
            }),
        }
    }
}
