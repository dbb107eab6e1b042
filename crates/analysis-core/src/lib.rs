//! Move-replay-and-analysis pipeline for chess game records.
//!
//! Takes a PGN record, replays it move by move with legality checking,
//! drives an engine adapter per ply (multi-PV), and derives the game's
//! biggest evaluation swings. Everything terminates in a uniform
//! `ResultEnvelope` — no error escapes the pipeline boundary.

pub mod engine;
pub mod envelope;
pub mod error;
pub mod moments;
pub mod pipeline;
pub mod record;
pub mod replay;

pub use engine::{EngineAdapter, EngineLine, Score, SearchLimits};
pub use envelope::{ResultEnvelope, Status};
pub use error::AnalyzeError;
pub use pipeline::{analyze_game, AnalyzeInput, AnalyzeOptions};
