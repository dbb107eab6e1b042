//! Game record decoding — lightweight regex-based PGN parser.
//!
//! Produces move tokens plus the starting position; chess legality is
//! deliberately left to the replayer so a bad move can be reported at the
//! exact ply where replay fails.

use regex::Regex;

use crate::error::AnalyzeError;

/// Decoded game record: an ordered move-token sequence and an optional
/// starting position taken from the `FEN` header.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub start_fen: Option<String>,
    pub tokens: Vec<String>,
}

/// Parse PGN text into a `GameRecord`.
///
/// Tokens are validated for shape only (SAN or coordinate notation, so a
/// syntactically well-formed but illegal move like `g1g9` survives to the
/// replay stage). Fails with `InvalidRecord` on unrecognized tokens or an
/// empty moves section.
pub fn decode(pgn: &str) -> Result<GameRecord, AnalyzeError> {
    if pgn.trim().is_empty() {
        return Err(AnalyzeError::InvalidRecord("empty record".to_string()));
    }

    let start_fen = extract_fen_header(pgn);
    let tokens = extract_moves(pgn)?;

    if tokens.is_empty() {
        return Err(AnalyzeError::InvalidRecord(
            "record contains no moves".to_string(),
        ));
    }

    Ok(GameRecord { start_fen, tokens })
}

/// Extract the FEN header value, if any.
fn extract_fen_header(pgn: &str) -> Option<String> {
    let re = Regex::new(r#"\[FEN\s+"([^"]*)"\]"#).unwrap();
    let value = re.captures(pgn)?.get(1)?.as_str().trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

/// Extract move tokens from PGN text (after removing headers, comments,
/// variations, move numbers, NAGs and the game result).
fn extract_moves(pgn: &str) -> Result<Vec<String>, AnalyzeError> {
    // Remove headers
    let header_re = Regex::new(r"\[[^\]]*\]").unwrap();
    let stripped = header_re.replace_all(pgn, " ");

    // Remove comments
    let comment_re = Regex::new(r"\{[^}]*\}").unwrap();
    let stripped = comment_re.replace_all(&stripped, " ");

    // Remove variations, innermost-first to handle nesting
    let variation_re = Regex::new(r"\([^()]*\)").unwrap();
    let mut stripped = stripped.to_string();
    loop {
        let next = variation_re.replace_all(&stripped, " ").to_string();
        if next == stripped {
            break;
        }
        stripped = next;
    }

    // Remove move numbers ("1.", "12...")
    let number_re = Regex::new(r"\d+\.+").unwrap();
    let stripped = number_re.replace_all(&stripped, " ");

    // SAN ("e4", "Nbd7", "exd8=Q+", "O-O") or coordinate ("e2e4", "e7e8q")
    // shape. The coordinate rank is deliberately loose so malformed squares
    // are rejected by the replayer, not the decoder.
    let san_re =
        Regex::new(r"^(?:[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?|O-O-O|O-O|0-0-0|0-0)[+#!?]*$")
            .unwrap();
    let coord_re = Regex::new(r"^[a-h][0-9][a-h][0-9][qrbnQRBN]?$").unwrap();

    let mut tokens = Vec::new();
    for token in stripped.split_whitespace() {
        match token {
            "1-0" | "0-1" | "1/2-1/2" | "*" => continue,
            _ => {}
        }
        if token.starts_with('$') {
            continue; // NAG
        }
        if san_re.is_match(token) || coord_re.is_match(token) {
            tokens.push(token.to_string());
        } else {
            return Err(AnalyzeError::InvalidRecord(format!(
                "unrecognized move token: {token}"
            )));
        }
    }

    Ok(tokens)
}
