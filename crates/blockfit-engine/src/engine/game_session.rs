use rand::Rng as _;

use crate::{
    ConfigError, SelectError,
    core::{Block, Board, CellPos, ClearedLines, Point, Shape, ShapeId},
};

use super::{
    config::SessionConfig,
    events::{DiscardEvents, EventSink, GameEvent},
    score::Score,
    spawner::{SpawnSeed, Spawner},
};

#[derive(Debug, Clone, Copy, PartialEq, derive_more::IsVariant)]
pub enum SessionState {
    /// No shape is selected.
    Idle,
    /// A shape is picked up and follows the pointer.
    Dragging {
        shape: ShapeId,
        /// Offset from the pointer to the shape's anchor.
        grab: Point,
    },
    /// No shape of the current batch fits the board. Terminal.
    GameOver,
}

/// Result of releasing a dragged shape.
#[derive(Debug, Clone, PartialEq, derive_more::IsVariant)]
pub enum DropOutcome {
    /// Nothing was being dragged.
    NotDragging,
    /// The snapped position was invalid; the shape went back to its slot.
    Rejected { shape: ShapeId, anchor: CellPos },
    /// The shape was committed to the board.
    Placed(Placement),
}

/// Details of a committed placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub shape: ShapeId,
    pub anchor: CellPos,
    pub cleared: ClearedLines,
    /// Points awarded for the cleared lines.
    pub gained: usize,
    /// Whether the placement emptied the batch and a new one was spawned.
    pub respawned: bool,
    /// Whether the session ended after this placement.
    pub game_over: bool,
}

/// One play session: board, spawner and score driven by pointer input.
///
/// The session is single-threaded and turn-driven. Every input call runs to
/// completion before returning: a release validates, commits, clears lines,
/// scores, respawns and checks for the end of the game in one go.
///
/// Presentation layers read the state through the query methods and receive
/// [`GameEvent`]s through the sink `S`. Restarting a game means building a new
/// session.
///
/// # Example
///
/// ```
/// use blockfit_engine::{GameSession, SessionConfig, SpawnSeed};
///
/// let seed = SpawnSeed::from_bytes([7; 16]);
/// let mut session = GameSession::with_seed(SessionConfig::default(), seed).unwrap();
///
/// // Pick up the first staged shape and drop it in the top-left corner.
/// let shape = session.batch().next().unwrap();
/// let id = shape.id();
/// let grab = shape.cell_points().next().unwrap();
/// let reference = shape.template().reference_cell().unwrap();
///
/// assert_eq!(session.pointer_down(grab), Some(id));
/// let outcome = session.pointer_up(reference.into());
///
/// assert!(outcome.is_placed());
/// assert!(session.board().is_occupied(reference));
/// assert_eq!(session.remaining_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct GameSession<S = DiscardEvents> {
    config: SessionConfig,
    seed: SpawnSeed,
    board: Board,
    spawner: Spawner,
    score: Score,
    state: SessionState,
    sink: S,
}

impl GameSession {
    /// Creates a session with a random seed.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        Self::with_seed(config, rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic shape
    /// generation.
    pub fn with_seed(config: SessionConfig, seed: SpawnSeed) -> Result<Self, ConfigError> {
        GameSession::with_sink(config, seed, DiscardEvents)
    }
}

impl<S> GameSession<S>
where
    S: EventSink,
{
    /// Creates a session that publishes its events to `sink`.
    ///
    /// The first batch is spawned immediately, so the session may already be
    /// over if no catalog shape fits the board.
    pub fn with_sink(config: SessionConfig, seed: SpawnSeed, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let board = Board::new(config.board_width, config.board_height)?;
        let spawner = Spawner::with_seed(&config, seed)?;
        let score = Score::new(config.points_per_line);
        let mut this = Self {
            config,
            seed,
            board,
            spawner,
            score,
            state: SessionState::Idle,
            sink,
        };
        this.respawn();
        Ok(this)
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn seed(&self) -> SpawnSeed {
        self.seed
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn score(&self) -> &Score {
        &self.score
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over()
    }

    /// Unplaced shapes of the current batch, in slot order.
    pub fn batch(&self) -> impl Iterator<Item = &Shape> {
        self.spawner.batch()
    }

    /// Current batch slots, with `None` for shapes already placed.
    #[must_use]
    pub fn slots(&self) -> &[Option<Shape>] {
        self.spawner.slots()
    }

    #[must_use]
    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.spawner.shape(id)
    }

    #[must_use]
    pub fn remaining_count(&self) -> usize {
        self.spawner.remaining_count()
    }

    /// The shape being dragged, if any.
    #[must_use]
    pub fn selected_shape(&self) -> Option<&Shape> {
        match self.state {
            SessionState::Dragging { shape, .. } => self.spawner.shape(shape),
            SessionState::Idle | SessionState::GameOver => None,
        }
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Picks up the staged shape under `point`.
    ///
    /// Returns the picked shape, or `None` if the session is not idle or no
    /// shape is under the pointer.
    pub fn pointer_down(&mut self, point: Point) -> Option<ShapeId> {
        if !self.state.is_idle() {
            return None;
        }
        let id = self.spawner.shape_at(point)?;
        self.pick_up(id, point).ok()?;
        Some(id)
    }

    /// Moves the dragged shape so the grabbed cell follows `point`.
    pub fn pointer_move(&mut self, point: Point) {
        let SessionState::Dragging { shape, grab } = self.state else {
            return;
        };
        if let Some(shape) = self.spawner.shape_mut(shape) {
            shape.move_to(point + grab);
        }
    }

    /// Drops the dragged shape at `point`.
    pub fn pointer_up(&mut self, point: Point) -> DropOutcome {
        let SessionState::Dragging { shape, .. } = self.state else {
            return DropOutcome::NotDragging;
        };
        self.pointer_move(point);
        self.release(shape)
    }

    /// Selects shape `id` as if the pointer went down at `pointer`.
    pub fn pick_up(&mut self, id: ShapeId, pointer: Point) -> Result<(), SelectError> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Dragging { shape, .. } => {
                return Err(SelectError::AlreadySelected { id: shape });
            }
            SessionState::GameOver => return Err(SelectError::GameOver),
        }
        let shape = self
            .spawner
            .shape_mut(id)
            .ok_or(SelectError::NotInBatch { id })?;
        let grab = shape.begin_drag(pointer);
        self.state = SessionState::Dragging { shape: id, grab };
        Ok(())
    }

    /// Picks up shape `id` and drops it with its anchor on `anchor`.
    ///
    /// Runs the same pick-up, drag and release path as pointer input.
    pub fn place(&mut self, id: ShapeId, anchor: CellPos) -> Result<DropOutcome, SelectError> {
        let home = self
            .spawner
            .shape(id)
            .ok_or(SelectError::NotInBatch { id })?
            .anchor();
        // Grabbing at the anchor itself makes the pointer and anchor coincide.
        self.pick_up(id, home)?;
        Ok(self.pointer_up(anchor.into()))
    }

    fn release(&mut self, id: ShapeId) -> DropOutcome {
        self.state = SessionState::Idle;
        let Some(shape) = self.spawner.shape_mut(id) else {
            return DropOutcome::NotDragging;
        };

        let anchor = shape.snapped_anchor();
        if !self.board.is_valid_position(shape.template(), anchor) {
            shape.reset();
            self.sink
                .publish(GameEvent::PlacementRejected { shape: id, anchor });
            self.check_end_condition();
            return DropOutcome::Rejected { shape: id, anchor };
        }

        let Some(shape) = self.spawner.notify_placed(id) else {
            return DropOutcome::NotDragging;
        };
        self.board.commit(
            shape.template(),
            anchor,
            Block::new(id, shape.template_index()),
        );
        self.sink
            .publish(GameEvent::ShapePlaced { shape: id, anchor });

        let cleared = self.board.clear_completed_lines();
        if !cleared.is_empty() {
            self.sink.publish(GameEvent::LinesCleared {
                rows: cleared.rows().to_vec(),
                columns: cleared.columns().to_vec(),
                centers: cleared.line_centers(self.board.width(), self.board.height()),
            });
        }

        let gained = self.score.complete_placement(cleared.len());
        if gained > 0 {
            self.sink.publish(GameEvent::ScoreChanged {
                score: self.score.score(),
                gained,
            });
        }

        let respawned = self.spawner.remaining_count() == 0;
        if respawned {
            self.respawn();
        } else {
            self.check_end_condition();
        }

        DropOutcome::Placed(Placement {
            shape: id,
            anchor,
            cleared,
            gained,
            respawned,
            game_over: self.state.is_game_over(),
        })
    }

    fn respawn(&mut self) {
        let slots = self.config.spawn_slots;
        let spawned: Vec<_> = self
            .spawner
            .spawn_batch(slots)
            .enumerate()
            .map(|(slot, shape)| GameEvent::ShapeSpawned {
                shape: shape.id(),
                slot,
                template: shape.template_index(),
            })
            .collect();
        for event in spawned {
            self.sink.publish(event);
        }
        self.check_end_condition();
    }

    /// Enters [`SessionState::GameOver`] if no shape of a non-empty batch fits
    /// the board.
    fn check_end_condition(&mut self) {
        if self.state.is_game_over() || self.spawner.remaining_count() == 0 {
            return;
        }
        let any_fits = self
            .spawner
            .batch()
            .any(|shape| self.board.can_fit(shape.template()));
        if any_fits {
            return;
        }
        self.state = SessionState::GameOver;
        self.sink.publish(GameEvent::GameOver {
            score: self.score.score(),
        });
    }

    #[cfg(test)]
    fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }
}
