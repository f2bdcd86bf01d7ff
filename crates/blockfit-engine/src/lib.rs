pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Invalid session configuration, reported before a session starts.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("board dimensions must be within 1..={max}, got {width}x{height}")]
    InvalidBoardSize {
        width: usize,
        height: usize,
        max: usize,
    },
    #[display("spawn slot count must be non-zero")]
    ZeroSpawnSlots,
    #[display("shape catalog is empty")]
    EmptyCatalog,
    #[display("staging scale must be positive and finite, got {scale}")]
    InvalidStagingScale { scale: f32 },
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ShapeTemplateError {
    #[display("shape template has no occupied cells")]
    Empty,
    #[display("shape template has more than {max} cells")]
    TooManyCells { max: usize },
    #[display("shape template exceeds {max} cells in width or height")]
    TooLarge { max: usize },
    #[display("invalid character {ch:?} in shape template row {row}")]
    InvalidChar { row: usize, ch: char },
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum BoardParseError {
    #[display("board snapshot has no rows")]
    Empty,
    #[display("board snapshot row {row} has width {width}, expected {expected}")]
    RaggedRow {
        row: usize,
        width: usize,
        expected: usize,
    },
    #[display("board snapshot exceeds {max} cells in width or height")]
    TooLarge { max: usize },
    #[display("invalid character {ch:?} in board snapshot row {row}")]
    InvalidChar { row: usize, ch: char },
}

/// Rejected selection request on a [`GameSession`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SelectError {
    #[display("shape {id} is already selected")]
    AlreadySelected { id: ShapeId },
    #[display("shape {id} is not in the current batch")]
    NotInBatch { id: ShapeId },
    #[display("session is over")]
    GameOver,
}
