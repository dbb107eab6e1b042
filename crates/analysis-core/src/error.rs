//! Pipeline error taxonomy

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    /// Record text could not be parsed into a well-formed game.
    #[error("Invalid game record: {0}")]
    InvalidRecord(String),

    /// Caller-supplied starting FEN is not a valid position encoding.
    #[error("Invalid start position: {0}")]
    InvalidStartPosition(String),

    /// A mainline move is not legal from the reconstructed position.
    /// Replay halts here; earlier plies keep their records.
    #[error("Illegal move {uci} at ply {ply}")]
    IllegalMove {
        ply: u32,
        uci: String,
        fen_before: String,
    },

    /// Engine adapter failure (spawn, protocol, I/O).
    #[error("Engine error: {0}")]
    Engine(String),
}
