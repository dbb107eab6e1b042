//! Position replay with per-move legality checking.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position};

use crate::error::AnalyzeError;

/// A successfully replayed move in both notations, plus the position after.
#[derive(Debug, Clone)]
pub struct PlayedMove {
    pub ply: u32,
    pub uci: String,
    pub san: String,
    pub fen_after: String,
}

/// State machine over the move sequence: one position, advanced move by
/// move. Each token must resolve to a legal move of the current position
/// or replay halts with `IllegalMove` at that ply.
pub struct Replayer {
    pos: Chess,
    ply: u32,
}

impl Replayer {
    /// Replayer at the standard starting position.
    pub fn new() -> Self {
        Self {
            pos: Chess::default(),
            ply: 0,
        }
    }

    /// Replayer at an arbitrary FEN.
    pub fn from_fen(fen: &str) -> Result<Self, AnalyzeError> {
        let parsed: Fen = fen
            .parse()
            .map_err(|e| AnalyzeError::InvalidStartPosition(format!("{e}: {fen}")))?;
        let pos = parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|e| AnalyzeError::InvalidStartPosition(format!("{e}: {fen}")))?;
        Ok(Self { pos, ply: 0 })
    }

    /// FEN of the current position.
    pub fn current_fen(&self) -> String {
        Fen::from_position(&self.pos, EnPassantMode::Legal).to_string()
    }

    /// Resolve a move token against the current position and apply it.
    /// SAN for the played move is rendered against the position *before*
    /// the move — the same destination square can disambiguate differently
    /// depending on board context.
    pub fn apply(&mut self, token: &str) -> Result<PlayedMove, AnalyzeError> {
        let ply = self.ply + 1;
        let mv = self.resolve(token).ok_or_else(|| AnalyzeError::IllegalMove {
            ply,
            uci: token.to_string(),
            fen_before: self.current_fen(),
        })?;

        let uci = mv.to_uci(CastlingMode::Standard).to_string();
        let san_base = San::from_move(&self.pos, mv).to_string();
        self.pos.play_unchecked(mv);
        self.ply = ply;
        let san = format!("{san_base}{}", check_suffix(&self.pos));

        Ok(PlayedMove {
            ply,
            uci,
            san,
            fen_after: self.current_fen(),
        })
    }

    /// SAN of a UCI move at the current position, if it is legal here.
    /// Used to render engine candidate moves.
    pub fn san_for_uci(&self, uci: &str) -> Option<String> {
        let uci_move: UciMove = uci.parse().ok()?;
        let mv = uci_move.to_move(&self.pos).ok()?;
        let mut after = self.pos.clone();
        after.play_unchecked(mv);
        Some(format!(
            "{}{}",
            San::from_move(&self.pos, mv),
            check_suffix(&after)
        ))
    }

    /// Resolve a token as coordinate notation first, then as SAN. Both
    /// resolutions only ever yield moves legal in the current position.
    fn resolve(&self, token: &str) -> Option<Move> {
        let clean = token.trim_end_matches(|c: char| matches!(c, '+' | '#' | '!' | '?'));

        if let Ok(uci_move) = clean.parse::<UciMove>() {
            // A well-formed coordinate token that does not map onto a
            // legal move is illegal here, not a SAN candidate.
            return uci_move.to_move(&self.pos).ok();
        }

        let san: San = clean.parse().ok()?;
        san.to_move(&self.pos).ok()
    }
}

impl Default for Replayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Check/checkmate marker for a SAN, judged on the position after the move.
fn check_suffix(pos_after: &Chess) -> &'static str {
    if pos_after.is_checkmate() {
        "#"
    } else if pos_after.is_check() {
        "+"
    } else {
        ""
    }
}
