use std::{
    fs::{self, File},
    io::{BufWriter, Write as _},
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::Context;
use blockfit_engine::{
    Board, CellPos, ConfigError, DropOutcome, GameSession, Point, Score, SelectError,
    SessionConfig, ShapeId, SpawnSeed,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::EventLogger;

/// A wrapper around [`GameSession`] that records every committed placement.
///
/// Offers the same input API as `GameSession`. Use
/// [`into_recording`](Self::into_recording) to extract the recorded game once
/// play has finished.
#[derive(Debug)]
pub struct RecordingSession {
    session: GameSession<EventLogger>,
    placements: Vec<PlacementRecord>,
}

/// Provides read-only access to the underlying `GameSession`.
///
/// Mutable access must go through the recording methods so that no placement
/// is missed, so `DerefMut` is not implemented.
impl Deref for RecordingSession {
    type Target = GameSession<EventLogger>;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl RecordingSession {
    pub fn with_seed(
        config: SessionConfig,
        seed: SpawnSeed,
        logger: EventLogger,
    ) -> Result<Self, ConfigError> {
        let session = GameSession::with_sink(config, seed, logger)?;
        Ok(Self {
            session,
            placements: vec![],
        })
    }

    pub fn pointer_down(&mut self, point: Point) -> Option<ShapeId> {
        self.session.pointer_down(point)
    }

    pub fn pointer_move(&mut self, point: Point) {
        self.session.pointer_move(point);
    }

    pub fn pointer_up(&mut self, point: Point) -> DropOutcome {
        let outcome = self.session.pointer_up(point);
        self.record(&outcome);
        outcome
    }

    pub fn place(&mut self, id: ShapeId, anchor: CellPos) -> Result<DropOutcome, SelectError> {
        let outcome = self.session.place(id, anchor)?;
        self.record(&outcome);
        Ok(outcome)
    }

    fn record(&mut self, outcome: &DropOutcome) {
        if let DropOutcome::Placed(placement) = outcome {
            self.placements.push(PlacementRecord {
                shape: placement.shape,
                anchor: placement.anchor,
                cleared_lines: placement.cleared.len(),
            });
        }
    }

    /// Consumes the session and returns the recorded game and the event logger.
    pub fn into_recording(self) -> (RecordedGame, EventLogger) {
        let recording = RecordedGame {
            recorded_at: Utc::now(),
            seed: self.session.seed(),
            config: self.session.config().clone(),
            final_score: self.session.score().clone(),
            final_board: self.session.board().clone(),
            game_over: self.session.is_game_over(),
            placements: self.placements,
        };
        (recording, self.session.into_sink())
    }
}

/// Recorded play session with everything needed to replay it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedGame {
    /// Timestamp when recording was created (ISO 8601 format)
    pub recorded_at: DateTime<Utc>,
    /// Random seed used for shape generation
    pub seed: SpawnSeed,
    pub config: SessionConfig,
    pub final_score: Score,
    /// Board occupancy after the last placement
    pub final_board: Board,
    pub game_over: bool,
    /// Committed placements in play order
    pub placements: Vec<PlacementRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub shape: ShapeId,
    pub anchor: CellPos,
    /// Rows plus columns cleared by this placement
    pub cleared_lines: usize,
}

impl RecordedGame {
    /// Saves the recording to a JSON file in `record_dir` and returns its path.
    ///
    /// The filename is `{name}_{YYYYMMDD_HHMMSS}.json`, using the recording
    /// timestamp. The directory is created if it doesn't exist.
    pub fn save(&self, record_dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(record_dir)
            .with_context(|| format!("Failed to create directory {}", record_dir.display()))?;

        let filename = format!("{name}_{}.json", self.recorded_at.format("%Y%m%d_%H%M%S"));
        let filepath = record_dir.join(filename);

        let file = File::create(&filepath)
            .with_context(|| format!("Failed to create file: {}", filepath.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("Failed to write JSON to {}", filepath.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush output to {}", filepath.display()))?;

        Ok(filepath)
    }
}
