use serde::{Deserialize, Serialize};

use crate::core::{CellPos, Point, ShapeId};

/// Notification published by a [`GameSession`](super::GameSession) for
/// presentation layers (sound, particles, animations).
///
/// Events are fire-and-forget: the engine never reads anything back from the
/// sink, so dropping events changes nothing about the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::IsVariant)]
pub enum GameEvent {
    ShapeSpawned {
        shape: ShapeId,
        slot: usize,
        template: usize,
    },
    ShapePlaced {
        shape: ShapeId,
        anchor: CellPos,
    },
    /// A drop was rejected and the shape went back to its staging slot.
    PlacementRejected {
        shape: ShapeId,
        anchor: CellPos,
    },
    LinesCleared {
        rows: Vec<usize>,
        columns: Vec<usize>,
        /// One representative point per cleared line, rows first.
        centers: Vec<Point>,
    },
    ScoreChanged {
        score: usize,
        gained: usize,
    },
    GameOver {
        score: usize,
    },
}

/// Receiver of [`GameEvent`]s.
pub trait EventSink {
    fn publish(&mut self, event: GameEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiscardEvents;

impl EventSink for DiscardEvents {
    fn publish(&mut self, _event: GameEvent) {}
}

impl EventSink for Vec<GameEvent> {
    fn publish(&mut self, event: GameEvent) {
        self.push(event);
    }
}

impl<S> EventSink for &mut S
where
    S: EventSink + ?Sized,
{
    fn publish(&mut self, event: GameEvent) {
        (**self).publish(event);
    }
}

impl<S> EventSink for Box<S>
where
    S: EventSink + ?Sized,
{
    fn publish(&mut self, event: GameEvent) {
        (**self).publish(event);
    }
}
