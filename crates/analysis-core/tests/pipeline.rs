//! End-to-end pipeline tests driven by a scripted engine adapter.
//!
//! No engine process involved: the adapter replays canned responses, which
//! keeps every assertion deterministic.

use analysis_core::engine::{EngineAdapter, EngineLine, Score, SearchLimits};
use analysis_core::envelope::Status;
use analysis_core::error::AnalyzeError;
use analysis_core::pipeline::{analyze_game, AnalyzeInput, AnalyzeOptions};

/// Pops one canned response per `analyze` call and records the FENs it was
/// asked about.
struct ScriptedEngine {
    responses: Vec<Vec<EngineLine>>,
    calls: Vec<String>,
}

impl ScriptedEngine {
    fn new(responses: Vec<Vec<EngineLine>>) -> Self {
        Self {
            responses,
            calls: Vec::new(),
        }
    }
}

impl EngineAdapter for ScriptedEngine {
    async fn analyze(
        &mut self,
        fen: &str,
        _limits: SearchLimits,
        _line_count: u32,
    ) -> Result<Vec<EngineLine>, AnalyzeError> {
        self.calls.push(fen.to_string());
        if self.responses.is_empty() {
            return Err(AnalyzeError::Engine("script exhausted".to_string()));
        }
        Ok(self.responses.remove(0))
    }
}

fn line(rank: u32, uci: &str, score: Score) -> EngineLine {
    EngineLine {
        rank,
        moves: vec![uci.to_string()],
        score: Some(score),
    }
}

fn input(pgn: &str) -> AnalyzeInput {
    AnalyzeInput {
        record: pgn.to_string(),
        initial_position: None,
    }
}

/// Responses for "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6" with the given principal
/// evaluations. The suggested reply is always legal in the position the
/// engine was handed.
fn spanish_script(evals: [i32; 6]) -> Vec<Vec<EngineLine>> {
    let replies = ["e7e5", "g1f3", "b8c6", "f1b5", "a7a6", "b5a4"];
    evals
        .iter()
        .zip(replies)
        .map(|(&cp, reply)| vec![line(1, reply, Score::Cp(cp))])
        .collect()
}

const SPANISH: &str = "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6";

#[tokio::test]
async fn legal_game_produces_gap_free_records() {
    let mut engine = ScriptedEngine::new(spanish_script([30, 20, 25, -80, -60, 40]));
    let envelope = analyze_game(&input(SPANISH), &AnalyzeOptions::default(), &mut engine).await;

    assert_eq!(envelope.status, Status::Ok);
    assert!(envelope.legal);
    assert!(envelope.error.is_none());
    assert_eq!(envelope.per_ply.len(), 6);
    assert_eq!(engine.calls.len(), 6);

    for (i, record) in envelope.per_ply.iter().enumerate() {
        assert_eq!(record.ply, i as u32 + 1);
    }
    assert_eq!(envelope.per_ply[0].played_uci, "e2e4");
    assert_eq!(envelope.per_ply[0].played_san, "e4");
    assert_eq!(envelope.per_ply[2].played_san, "Nf3");
    assert_eq!(envelope.per_ply[0].eval_cp, Some(30));

    // The engine analyzed the position after each played move.
    assert_eq!(envelope.per_ply[5].fen_after, engine.calls[5]);
}

#[tokio::test]
async fn key_moments_rank_by_swing() {
    // Swings per ply 2..=6: 10, 5, 105, 20, 100
    let mut engine = ScriptedEngine::new(spanish_script([30, 20, 25, -80, -60, 40]));
    let envelope = analyze_game(&input(SPANISH), &AnalyzeOptions::default(), &mut engine).await;

    assert!(envelope.key_moments.len() <= 5);
    let plies: Vec<u32> = envelope.key_moments.iter().map(|m| m.ply).collect();
    let swings: Vec<i32> = envelope.key_moments.iter().map(|m| m.swing).collect();
    assert_eq!(plies, vec![4, 6, 5, 2, 3]);
    assert_eq!(swings, vec![105, 100, 20, 10, 5]);

    // Every swing equals the absolute adjacent eval difference.
    for moment in &envelope.key_moments {
        let idx = moment.ply as usize - 1;
        let before = envelope.per_ply[idx - 1].eval_cp.unwrap();
        let after = envelope.per_ply[idx].eval_cp.unwrap();
        assert_eq!(moment.swing, (after - before).abs());
    }
}

#[tokio::test]
async fn illegal_move_halts_replay_with_prefix() {
    let mut engine = ScriptedEngine::new(vec![
        vec![line(1, "e7e5", Score::Cp(30))],
        vec![line(1, "g1f3", Score::Cp(20))],
    ]);
    let envelope = analyze_game(
        &input("1. e2e4 e7e5 2. g1g9"),
        &AnalyzeOptions::default(),
        &mut engine,
    )
    .await;

    assert_eq!(envelope.status, Status::Error);
    assert!(!envelope.legal);
    assert_eq!(envelope.per_ply.len(), 2);
    assert_eq!(engine.calls.len(), 2);

    let error = envelope.error.unwrap();
    assert_eq!(error.code, "ILLEGAL_MOVE");
    let illegal = &error.details["first_illegal_move"];
    assert_eq!(illegal["ply"], 3);
    assert_eq!(illegal["uci"], "g1g9");
    // Position before the attempted move, after 1. e4 e5
    assert_eq!(illegal["fen_before"], envelope.per_ply[1].fen_after);
}

#[tokio::test]
async fn malformed_record_is_invalid_pgn() {
    let mut engine = ScriptedEngine::new(vec![]);
    let envelope = analyze_game(
        &input("this is not a chess game"),
        &AnalyzeOptions::default(),
        &mut engine,
    )
    .await;

    assert_eq!(envelope.status, Status::Error);
    assert!(!envelope.legal);
    assert!(envelope.per_ply.is_empty());
    assert!(envelope.key_moments.is_empty());
    assert_eq!(envelope.error.unwrap().code, "INVALID_PGN");
    assert!(engine.calls.is_empty());
}

#[tokio::test]
async fn bad_override_is_invalid_fen() {
    let mut engine = ScriptedEngine::new(vec![]);
    let request = AnalyzeInput {
        record: "1. e4".to_string(),
        initial_position: Some("not a fen at all".to_string()),
    };
    let envelope = analyze_game(&request, &AnalyzeOptions::default(), &mut engine).await;

    assert_eq!(envelope.status, Status::Error);
    assert_eq!(envelope.error.unwrap().code, "INVALID_FEN");
    assert!(envelope.per_ply.is_empty());
}

#[tokio::test]
async fn override_takes_precedence_over_standard_start() {
    // King + pawn endgame where 1. e4 is still legal.
    let start = "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1";
    let mut engine = ScriptedEngine::new(vec![vec![line(1, "e8d7", Score::Cp(150))]]);
    let request = AnalyzeInput {
        record: "1. e4".to_string(),
        initial_position: Some(start.to_string()),
    };
    let envelope = analyze_game(&request, &AnalyzeOptions::default(), &mut engine).await;

    assert_eq!(envelope.status, Status::Ok);
    assert_eq!(envelope.per_ply.len(), 1);
    // Analyzed position derives from the override, not the standard start.
    assert!(engine.calls[0].starts_with("4k3/8/8/8/4P3/8/8/4K3 b"));
}

#[tokio::test]
async fn fen_header_seeds_start_position() {
    let pgn = r#"[FEN "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1"]

1. e4 Kd7"#;
    let mut engine = ScriptedEngine::new(vec![
        vec![line(1, "e8d7", Score::Cp(150))],
        vec![line(1, "e4e5", Score::Cp(170))],
    ]);
    let envelope = analyze_game(&input(pgn), &AnalyzeOptions::default(), &mut engine).await;

    assert_eq!(envelope.status, Status::Ok);
    assert_eq!(envelope.per_ply.len(), 2);
    // Replay started from the header position, not the standard start.
    assert!(engine.calls[0].starts_with("4k3/8/8/8/4P3/8/8/4K3 b"));
    assert_eq!(envelope.per_ply[1].played_san, "Kd7");
}

#[tokio::test]
async fn bad_fen_header_is_invalid_pgn() {
    // A broken FEN *header* is a defect of the record; INVALID_FEN is
    // reserved for the caller's explicit override.
    let pgn = r#"[FEN "not a position"]

1. e4"#;
    let mut engine = ScriptedEngine::new(vec![]);
    let envelope = analyze_game(&input(pgn), &AnalyzeOptions::default(), &mut engine).await;

    assert_eq!(envelope.status, Status::Error);
    assert_eq!(envelope.error.unwrap().code, "INVALID_PGN");
    assert!(envelope.per_ply.is_empty());
    assert!(engine.calls.is_empty());
}

#[tokio::test]
async fn engine_failure_becomes_internal_error() {
    // Script runs out after the first ply.
    let mut engine = ScriptedEngine::new(vec![vec![line(1, "e7e5", Score::Cp(30))]]);
    let envelope = analyze_game(&input(SPANISH), &AnalyzeOptions::default(), &mut engine).await;

    assert_eq!(envelope.status, Status::Error);
    assert_eq!(envelope.error.unwrap().code, "INTERNAL_ERROR");
    // The first ply's record survives.
    assert_eq!(envelope.per_ply.len(), 1);
    assert_eq!(envelope.per_ply[0].played_uci, "e2e4");
}

#[tokio::test]
async fn mate_and_terminal_positions() {
    // Fool's mate: 1. f3 e5 2. g4 Qh4#
    let responses = vec![
        vec![line(1, "e7e5", Score::Cp(-60))],
        vec![line(1, "g2g3", Score::Cp(-80))],
        vec![line(1, "d8h4", Score::Mate(-1))],
        // Checkmated position: one line, no moves.
        vec![EngineLine {
            rank: 1,
            moves: vec![],
            score: Some(Score::Mate(-1)),
        }],
    ];
    let mut engine = ScriptedEngine::new(responses);
    let envelope = analyze_game(
        &input("1. f3 e5 2. g4 Qh4#"),
        &AnalyzeOptions::default(),
        &mut engine,
    )
    .await;

    assert_eq!(envelope.status, Status::Ok);
    assert_eq!(envelope.per_ply.len(), 4);
    assert_eq!(envelope.per_ply[3].played_san, "Qh4#");
    // Mate-in-N collapses to the signed sentinel.
    assert_eq!(envelope.per_ply[2].eval_cp, Some(-100_000));
    assert_eq!(envelope.per_ply[2].pvs[0].san, "Qh4#");
    // Terminal ply: empty line skipped, principal eval absent.
    assert_eq!(envelope.per_ply[3].eval_cp, None);
    assert!(envelope.per_ply[3].pvs.is_empty());
}

#[tokio::test]
async fn identical_runs_are_identical() {
    let run = || async {
        let mut engine = ScriptedEngine::new(spanish_script([30, 20, 25, -80, -60, 40]));
        let envelope =
            analyze_game(&input(SPANISH), &AnalyzeOptions::default(), &mut engine).await;
        serde_json::to_value(&envelope).unwrap()
    };

    assert_eq!(run().await, run().await);
}

#[tokio::test]
async fn wire_field_names() {
    let mut engine = ScriptedEngine::new(spanish_script([30, 20, 25, -80, -60, 40]));
    let envelope = analyze_game(&input(SPANISH), &AnalyzeOptions::default(), &mut engine).await;
    let value = serde_json::to_value(&envelope).unwrap();

    assert_eq!(value["status"], "ok");
    assert_eq!(value["legal"], true);
    let first = &value["per_ply"][0];
    for field in ["ply", "played_uci", "played_san", "fen_after", "eval_cp", "pvs"] {
        assert!(first.get(field).is_some(), "missing per_ply field {field}");
    }
    let pv = &first["pvs"][0];
    for field in ["rank", "uci", "san", "eval_cp"] {
        assert!(pv.get(field).is_some(), "missing pv field {field}");
    }
    let moment = &value["key_moments"][0];
    for field in ["ply", "played_san", "eval_cp", "swing"] {
        assert!(moment.get(field).is_some(), "missing key_moments field {field}");
    }
}
