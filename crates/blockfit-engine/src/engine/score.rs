use serde::{Deserialize, Serialize};

/// Score and play statistics of a session.
///
/// Tracks various metrics during a session:
///
/// - **Score**: `points_per_line` for every cleared row or column
/// - **Placed shapes**: Total number of committed placements
/// - **Cleared lines**: Total rows plus columns cleared
/// - **Line clear distribution**: How many placements cleared 0, 1, 2, ... lines
///
/// The score never decreases except through [`Score::reset`].
///
/// # Example
///
/// ```
/// use blockfit_engine::Score;
///
/// let mut score = Score::new(10);
/// score.complete_placement(0);
/// score.complete_placement(2); // a row and a column at once
///
/// assert_eq!(score.score(), 20);
/// assert_eq!(score.placed_shapes(), 2);
/// assert_eq!(score.line_cleared_counter(), [1, 0, 1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    points_per_line: usize,
    score: usize,
    placed_shapes: usize,
    total_cleared_lines: usize,
    line_cleared_counter: Vec<usize>,
}

impl Score {
    /// Creates a score tracker with all counters at zero.
    #[must_use]
    pub const fn new(points_per_line: usize) -> Self {
        Self {
            points_per_line,
            score: 0,
            placed_shapes: 0,
            total_cleared_lines: 0,
            line_cleared_counter: Vec::new(),
        }
    }

    #[must_use]
    pub const fn points_per_line(&self) -> usize {
        self.points_per_line
    }

    /// Returns the current score.
    #[must_use]
    pub const fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub const fn placed_shapes(&self) -> usize {
        self.placed_shapes
    }

    #[must_use]
    pub const fn total_cleared_lines(&self) -> usize {
        self.total_cleared_lines
    }

    /// Returns a histogram of placements by number of lines they cleared.
    ///
    /// Index `n` counts placements that cleared exactly `n` lines. The
    /// histogram grows as needed.
    #[must_use]
    pub fn line_cleared_counter(&self) -> &[usize] {
        &self.line_cleared_counter
    }

    /// Awards points for `lines` cleared lines and returns the points gained.
    pub fn add_lines(&mut self, lines: usize) -> usize {
        // Saturates at `usize::MAX`.
        let gained = lines.saturating_mul(self.points_per_line);
        self.score = self.score.saturating_add(gained);
        self.total_cleared_lines += lines;
        gained
    }

    /// Updates statistics after a placement that cleared `cleared_lines`
    /// lines, and returns the points gained.
    pub fn complete_placement(&mut self, cleared_lines: usize) -> usize {
        self.placed_shapes += 1;
        if self.line_cleared_counter.len() <= cleared_lines {
            self.line_cleared_counter.resize(cleared_lines + 1, 0);
        }
        self.line_cleared_counter[cleared_lines] += 1;
        self.add_lines(cleared_lines)
    }

    /// Resets every counter to zero. The points per line are kept.
    pub fn reset(&mut self) {
        *self = Self::new(self.points_per_line);
    }
}
