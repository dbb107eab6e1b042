//! Stockfish engine adapter using UCI protocol (async I/O)
//!
//! One engine process per analysis session. Scores are normalized to
//! White's perspective here, at the boundary, so the pipeline can compare
//! evaluations across plies played by alternating sides.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use analysis_core::engine::{EngineAdapter, EngineLine, Score, SearchLimits};
use analysis_core::error::AnalyzeError;

pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI.
    pub async fn spawn(path: &str, hash_mb: u32) -> Result<Self, AnalyzeError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| AnalyzeError::Engine(format!("Failed to spawn Stockfish: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| AnalyzeError::Engine("Stockfish stdin unavailable".to_string()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| AnalyzeError::Engine("Stockfish stdout unavailable".to_string()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        engine.send("setoption name Threads value 1").await?;
        engine
            .send(&format!("setoption name Hash value {hash_mb}"))
            .await?;
        engine.send("setoption name UCI_AnalyseMode value true").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), AnalyzeError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| AnalyzeError::Engine(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| AnalyzeError::Engine(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Read one line from Stockfish. EOF means the process died; surface it
    /// instead of spinning.
    async fn read_line(&mut self) -> Result<String, AnalyzeError> {
        let mut line = String::new();
        let n = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| AnalyzeError::Engine(format!("Failed to read from Stockfish: {e}")))?;
        if n == 0 {
            return Err(AnalyzeError::Engine(
                "Stockfish closed its output stream".to_string(),
            ));
        }
        Ok(line)
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), AnalyzeError> {
        loop {
            let line = self.read_line().await?;
            let trimmed = line.trim();
            debug!(line = trimmed, "SF >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl EngineAdapter for StockfishEngine {
    async fn analyze(
        &mut self,
        fen: &str,
        limits: SearchLimits,
        line_count: u32,
    ) -> Result<Vec<EngineLine>, AnalyzeError> {
        // Best-effort multi-line request: setoption draws no reply, and an
        // engine that rejects it simply keeps reporting a single PV.
        self.send(&format!("setoption name MultiPV value {line_count}"))
            .await?;
        self.send(&format!("position fen {fen}")).await?;
        self.send(&go_command(limits)).await?;

        let white_to_move = fen.split_whitespace().nth(1) != Some("b");
        let mut lines: Vec<EngineLine> = Vec::new();

        loop {
            let line = self.read_line().await?;
            let trimmed = line.trim();

            if trimmed.starts_with("info") && trimmed.contains(" pv ") {
                let rank = parse_multipv_index(trimmed).unwrap_or(1);
                // Deeper iterations keep overwriting the slot for this rank.
                let entry = line_slot(&mut lines, rank);
                entry.score = parse_score(trimmed, white_to_move);
                entry.moves = parse_pv(trimmed);
            } else if trimmed.starts_with("bestmove") {
                break;
            }
        }

        lines.sort_by_key(|line| line.rank);
        Ok(lines)
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Backstop release for early-return paths
        let _ = self.process.start_kill();
    }
}

fn line_slot(lines: &mut Vec<EngineLine>, rank: u32) -> &mut EngineLine {
    if let Some(idx) = lines.iter().position(|line| line.rank == rank) {
        &mut lines[idx]
    } else {
        lines.push(EngineLine {
            rank,
            ..Default::default()
        });
        lines.last_mut().expect("just pushed")
    }
}

/// Build the `go` command from the request limits.
fn go_command(limits: SearchLimits) -> String {
    let mut cmd = String::from("go");
    if let Some(depth) = limits.depth {
        cmd.push_str(&format!(" depth {depth}"));
    }
    if let Some(movetime) = limits.movetime {
        let ms = movetime.as_millis().max(1);
        cmd.push_str(&format!(" movetime {ms}"));
    }
    if cmd == "go" {
        // Never search unbounded
        cmd.push_str(" depth 12");
    }
    cmd
}

/// Parse the score from an info line, normalized to White's perspective.
/// UCI engines report from the side to move.
fn parse_score(line: &str, white_to_move: bool) -> Option<Score> {
    let sign = if white_to_move { 1 } else { -1 };
    if let Some(cp) = parse_keyword_value(line, "cp") {
        return Some(Score::Cp(sign * cp));
    }
    if let Some(mate) = parse_keyword_value(line, "mate") {
        // "mate 0" means the side to move is already mated; keep it on the
        // losing side of the sign flip.
        let mate = if mate == 0 { -1 } else { mate };
        return Some(Score::Mate(sign * mate));
    }
    None
}

/// Parse the integer following `keyword` in an info line
fn parse_keyword_value(line: &str, keyword: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == keyword && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse multipv index from info line
fn parse_multipv_index(line: &str) -> Option<u32> {
    parse_keyword_value(line, "multipv").and_then(|v| u32::try_from(v).ok())
}

/// Parse PV moves from info line
fn parse_pv(line: &str) -> Vec<String> {
    let mut in_pv = false;
    let mut moves = Vec::new();

    for part in line.split_whitespace() {
        if part == "pv" {
            in_pv = true;
            continue;
        }
        if in_pv {
            if part == "string" {
                break;
            }
            moves.push(part.to_string());
        }
    }

    moves
}
