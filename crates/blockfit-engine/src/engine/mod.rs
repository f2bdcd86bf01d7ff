//! Session logic built on top of the core grid and shape types.
//!
//! - [`GameSession`] - Pointer-driven play session (board, batch, score, end detection)
//! - [`Spawner`] - Batch generation from the shape catalog
//! - [`Score`] - Score and line-clear statistics
//! - [`SessionConfig`] - Board size, scoring, batch size and catalog
//! - [`GameEvent`] - Notifications for presentation layers
//!
//! # Game Flow
//!
//! 1. A batch of shapes is spawned into the staging slots
//! 2. The player picks a shape up and drags it over the board
//! 3. On release the anchor snaps to the grid and the placement is validated
//! 4. A valid placement is committed, complete rows and columns are cleared and scored
//! 5. Once the whole batch is placed, a new batch is spawned
//! 6. The game ends as soon as no remaining shape fits anywhere on the board
//!
//! # Example
//!
//! ```
//! use blockfit_engine::{DropOutcome, GameSession, SessionConfig};
//!
//! let mut session = GameSession::new(SessionConfig::default()).unwrap();
//!
//! while !session.is_game_over() {
//!     let Some((id, anchor)) = session.batch().find_map(|shape| {
//!         let anchor = session.board().fitting_anchors(shape.template()).next()?;
//!         Some((shape.id(), anchor))
//!     }) else {
//!         break;
//!     };
//!     let outcome = session.place(id, anchor).unwrap();
//!     assert!(matches!(outcome, DropOutcome::Placed(_)));
//!     if session.score().placed_shapes() >= 20 {
//!         break;
//!     }
//! }
//! ```

pub use self::{config::*, events::*, game_session::*, score::*, spawner::*};

mod config;
mod events;
mod game_session;
mod score;
mod spawner;
