use std::path::PathBuf;

use anyhow::Context;
use blockfit_engine::{DropOutcome, GameSession};
use serde::Serialize;

use crate::{
    record::RecordedGame,
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ReplayArg {
    /// Path to the recording file (JSON format)
    recording_file: PathBuf,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ReplaySummary {
    placements: usize,
    score: usize,
    game_over: bool,
    board: Vec<String>,
}

pub(crate) fn run(arg: &ReplayArg) -> anyhow::Result<()> {
    let ReplayArg {
        recording_file,
        output,
    } = arg;

    eprintln!("Loading recording from {}", recording_file.display());
    let recording: RecordedGame = util::read_json_file("recording", recording_file)?;
    eprintln!(
        "Loaded {} placements recorded at {}",
        recording.placements.len(),
        recording.recorded_at
    );

    let summary = replay(&recording)
        .with_context(|| format!("Replay of {} failed", recording_file.display()))?;
    eprintln!(
        "Replay verified: {} placements, score {}",
        summary.placements, summary.score
    );

    Output::save_json(&summary, output.clone())
}

/// Plays the recorded placements again under the recorded seed and config,
/// checking every step and the final state against the recording.
fn replay(recording: &RecordedGame) -> anyhow::Result<ReplaySummary> {
    let mut session = GameSession::with_seed(recording.config.clone(), recording.seed)
        .context("Recorded configuration is invalid")?;

    for (turn, record) in recording.placements.iter().enumerate() {
        let outcome = session
            .place(record.shape, record.anchor)
            .with_context(|| format!("Turn {turn}: cannot pick up shape {}", record.shape))?;
        let DropOutcome::Placed(placement) = outcome else {
            anyhow::bail!(
                "Turn {turn}: shape {} at {} was not placed ({outcome:?})",
                record.shape,
                record.anchor
            );
        };
        anyhow::ensure!(
            placement.cleared.len() == record.cleared_lines,
            "Turn {turn}: cleared {} lines, recording says {}",
            placement.cleared.len(),
            record.cleared_lines
        );
    }

    anyhow::ensure!(
        *session.score() == recording.final_score,
        "Final score mismatch: replayed {:?}, recorded {:?}",
        session.score(),
        recording.final_score
    );
    let board = session.board().to_rows();
    anyhow::ensure!(
        board == recording.final_board.to_rows(),
        "Final board mismatch: replayed {board:?}, recorded {:?}",
        recording.final_board.to_rows()
    );
    anyhow::ensure!(
        session.is_game_over() == recording.game_over,
        "Game over mismatch: replayed {}, recorded {}",
        session.is_game_over(),
        recording.game_over
    );

    Ok(ReplaySummary {
        placements: recording.placements.len(),
        score: session.score().score(),
        game_over: session.is_game_over(),
        board,
    })
}

#[cfg(test)]
mod tests {
    use blockfit_engine::{CellPos, SessionConfig, SpawnSeed};

    use crate::{agent::RandomAgent, events::EventLogger, record::RecordingSession};

    use super::*;

    fn recorded_game(turns: usize) -> RecordedGame {
        let mut session = RecordingSession::with_seed(
            SessionConfig::default(),
            SpawnSeed::from_bytes([0x42; 16]),
            EventLogger::default(),
        )
        .unwrap();
        let mut agent = RandomAgent::new(11);
        for _ in 0..turns {
            if agent.play_turn(&mut session).unwrap().is_none() {
                break;
            }
        }
        session.into_recording().0
    }

    #[test]
    fn test_replay_matches_recording() {
        let recording = recorded_game(60);
        let summary = replay(&recording).unwrap();
        assert_eq!(summary.placements, recording.placements.len());
        assert_eq!(summary.score, recording.final_score.score());
        assert_eq!(summary.board, recording.final_board.to_rows());
    }

    #[test]
    fn test_replay_after_json_round_trip() {
        let recording = recorded_game(30);
        let json = serde_json::to_string(&recording).unwrap();
        let loaded: RecordedGame = serde_json::from_str(&json).unwrap();
        assert_eq!(replay(&loaded).unwrap(), replay(&recording).unwrap());
    }

    #[test]
    fn test_tampered_score_is_detected() {
        let mut recording = recorded_game(20);
        recording.final_score.add_lines(1);
        let err = replay(&recording).unwrap_err();
        assert!(err.to_string().contains("Final score mismatch"), "{err:#}");
    }

    #[test]
    fn test_invalid_placement_is_detected() {
        let mut recording = recorded_game(20);
        recording.placements[0].anchor = CellPos::new(-10, -10);
        let err = replay(&recording).unwrap_err();
        assert!(err.to_string().contains("Turn 0"), "{err:#}");
    }

    #[test]
    fn test_wrong_seed_is_detected() {
        let mut recording = recorded_game(20);
        recording.seed = SpawnSeed::from_bytes([0x43; 16]);
        assert!(replay(&recording).is_err());
    }
}
