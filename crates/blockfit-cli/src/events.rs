use blockfit_engine::{EventSink, GameEvent};
use serde::{Deserialize, Serialize};

/// Number of events of each kind seen during a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    pub spawned: usize,
    pub placed: usize,
    pub rejected: usize,
    pub line_clears: usize,
    pub game_over: usize,
}

/// Event sink that counts events and optionally prints them to stderr.
#[derive(Debug, Default, Clone)]
pub struct EventLogger {
    label: String,
    verbose: bool,
    counts: EventCounts,
}

impl EventLogger {
    pub fn new(label: impl Into<String>, verbose: bool) -> Self {
        Self {
            label: label.into(),
            verbose,
            counts: EventCounts::default(),
        }
    }

    pub fn counts(&self) -> EventCounts {
        self.counts
    }
}

impl EventSink for EventLogger {
    fn publish(&mut self, event: GameEvent) {
        if self.verbose {
            eprintln!("[{}] {event:?}", self.label);
        }
        match event {
            GameEvent::ShapeSpawned { .. } => self.counts.spawned += 1,
            GameEvent::ShapePlaced { .. } => self.counts.placed += 1,
            GameEvent::PlacementRejected { .. } => self.counts.rejected += 1,
            GameEvent::LinesCleared { .. } => self.counts.line_clears += 1,
            GameEvent::ScoreChanged { .. } => {}
            GameEvent::GameOver { .. } => self.counts.game_over += 1,
        }
    }
}
