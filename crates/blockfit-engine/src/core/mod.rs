pub use self::{board::*, shape::*};

pub(crate) mod board;
pub(crate) mod shape;

/// Largest supported board width or height.
pub const MAX_BOARD_DIMENSION: usize = 64;

/// Largest supported shape template width or height.
pub const MAX_SHAPE_EXTENT: usize = 8;

/// Largest number of occupied cells in one shape template.
pub const MAX_SHAPE_CELLS: usize = 25;

// Board and shape extents are bounded by the constants above, so grid indices
// always fit in an `i32` coordinate.
#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub(crate) const fn to_coord(v: usize) -> i32 {
    v as i32
}
