use blockfit_engine::{CellPos, DropOutcome, Point, ShapeId};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

use crate::record::RecordingSession;

/// A move chosen by an agent: which shape to drop and where its anchor lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub shape: ShapeId,
    pub anchor: CellPos,
}

/// Plays by picking a uniformly random valid placement each turn.
///
/// Moves are performed through the pointer API like a player would: the shape
/// is grabbed by its reference cell, dragged, and released with some jitter
/// that still snaps to the chosen cell.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    rng: Pcg32,
}

impl RandomAgent {
    const MAX_JITTER: f32 = 0.45;

    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Chooses a random valid placement among every shape of the batch.
    pub fn choose_move(&mut self, session: &RecordingSession) -> Option<Move> {
        let moves: Vec<_> = session
            .batch()
            .flat_map(|shape| {
                session
                    .board()
                    .fitting_anchors(shape.template())
                    .map(move |anchor| Move {
                        shape: shape.id(),
                        anchor,
                    })
            })
            .collect();
        if moves.is_empty() {
            return None;
        }
        Some(moves[self.rng.random_range(0..moves.len())])
    }

    /// Plays one turn. Returns `None` if there is no valid move.
    pub fn play_turn(
        &mut self,
        session: &mut RecordingSession,
    ) -> anyhow::Result<Option<DropOutcome>> {
        let Some(mv) = self.choose_move(session) else {
            return Ok(None);
        };
        let shape = session
            .shape(mv.shape)
            .ok_or_else(|| anyhow::anyhow!("shape {} vanished from the batch", mv.shape))?;
        let (Some(grab), Some(reference)) =
            (shape.cell_points().next(), shape.template().reference_cell())
        else {
            anyhow::bail!("shape {} has no cells", mv.shape);
        };

        let picked = session.pointer_down(grab);
        anyhow::ensure!(
            picked == Some(mv.shape),
            "pointer down at ({}, {}) picked {picked:?}, expected {}",
            grab.x,
            grab.y,
            mv.shape
        );

        // The reference cell is under the pointer, so it has to land on
        // `anchor + reference` for the anchor to snap to `anchor`.
        let target = Point::from(mv.anchor + reference);
        session.pointer_move(self.jittered(Point::new(target.x, grab.y)));
        let outcome = session.pointer_up(self.jittered(target));
        Ok(Some(outcome))
    }

    fn jittered(&mut self, point: Point) -> Point {
        let dx = self.rng.random_range(-Self::MAX_JITTER..=Self::MAX_JITTER);
        let dy = self.rng.random_range(-Self::MAX_JITTER..=Self::MAX_JITTER);
        point + Point::new(dx, dy)
    }
}
