use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{BoardParseError, ConfigError};

use super::{
    MAX_BOARD_DIMENSION,
    shape::{CellPos, Point, ShapeId, ShapeTemplate},
    to_coord,
};

/// Identity of a block written into the board by a placement.
///
/// Carries enough information for a renderer to colour the cell and to
/// animate it when its line clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    shape: ShapeId,
    template: usize,
}

impl Block {
    #[must_use]
    pub const fn new(shape: ShapeId, template: usize) -> Self {
        Self { shape, template }
    }

    /// Shape this block was part of when it was placed.
    #[must_use]
    pub const fn shape(self) -> ShapeId {
        self.shape
    }

    /// Catalog index of the template the shape was spawned from.
    #[must_use]
    pub const fn template(self) -> usize {
        self.template
    }
}

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    /// Occupied without shape identity (restored from a snapshot or preset).
    Filled,
    /// Occupied by a block of a placed shape.
    Block(Block),
}

impl Cell {
    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    #[must_use]
    pub fn is_occupied(self) -> bool {
        !self.is_empty()
    }
}

/// Rows and columns removed by one [`Board::clear_completed_lines`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearedLines {
    rows: Vec<usize>,
    columns: Vec<usize>,
}

impl ClearedLines {
    /// Indices of cleared rows, in ascending order.
    #[must_use]
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Indices of cleared columns, in ascending order.
    #[must_use]
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    /// Total number of cleared lines (rows plus columns).
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len() + self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty()
    }

    /// Returns one representative point per cleared line: the centre of the
    /// line on a `width` x `height` board. Rows come first, then columns.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn line_centers(&self, width: usize, height: usize) -> Vec<Point> {
        let center_x = (width as f32 - 1.0) / 2.0;
        let center_y = (height as f32 - 1.0) / 2.0;
        self.rows
            .iter()
            .map(|&y| Point::new(center_x, y as f32))
            .chain(self.columns.iter().map(|&x| Point::new(x as f32, center_y)))
            .collect()
    }
}

/// Occupancy grid of the game.
///
/// The board validates and commits shape placements, clears complete rows and
/// columns, and answers whether a shape fits anywhere.
///
/// Coordinates outside `[0, width) x [0, height)` are treated as occupied, so
/// placement checks never fail with an error.
///
/// # Example
///
/// ```
/// use blockfit_engine::{Block, Board, CellPos, ShapeId, ShapeTemplate};
///
/// let mut board = Board::new(10, 10).unwrap();
/// let bar = ShapeTemplate::from_rows(&["###"]).unwrap();
///
/// let anchor = CellPos::new(7, 0);
/// assert!(board.is_valid_position(&bar, anchor));
/// board.commit(&bar, anchor, Block::new(ShapeId::new(0), 0));
/// assert!(!board.is_valid_position(&bar, anchor));
/// assert!(!board.is_valid_position(&bar, CellPos::new(8, 1)));
/// assert!(board.can_fit(&bar));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates an empty `width` x `height` board.
    pub fn new(width: usize, height: usize) -> Result<Self, ConfigError> {
        let range = 1..=MAX_BOARD_DIMENSION;
        if !range.contains(&width) || !range.contains(&height) {
            return Err(ConfigError::InvalidBoardSize {
                width,
                height,
                max: MAX_BOARD_DIMENSION,
            });
        }
        Ok(Self {
            width,
            height,
            cells: vec![Cell::Empty; width * height],
        })
    }

    /// Parses an occupancy snapshot: one string per row, `#` for occupied
    /// and `.` for empty cells.
    ///
    /// Occupied cells become [`Cell::Filled`].
    pub fn from_rows<S>(rows: &[S]) -> Result<Self, BoardParseError>
    where
        S: AsRef<str>,
    {
        let Some(first) = rows.first() else {
            return Err(BoardParseError::Empty);
        };
        let width = first.as_ref().chars().count();
        let height = rows.len();
        if width == 0 {
            return Err(BoardParseError::Empty);
        }
        if width > MAX_BOARD_DIMENSION || height > MAX_BOARD_DIMENSION {
            return Err(BoardParseError::TooLarge {
                max: MAX_BOARD_DIMENSION,
            });
        }

        let mut cells = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let row_width = row.chars().count();
            if row_width != width {
                return Err(BoardParseError::RaggedRow {
                    row: y,
                    width: row_width,
                    expected: width,
                });
            }
            for ch in row.chars() {
                let cell = match ch {
                    '#' => Cell::Filled,
                    '.' => Cell::Empty,
                    _ => return Err(BoardParseError::InvalidChar { row: y, ch }),
                };
                cells.push(cell);
            }
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn contains(&self, pos: CellPos) -> bool {
        self.index(pos).is_some()
    }

    /// Returns the cell at `pos`, or `None` if it lies outside the board.
    #[must_use]
    pub fn cell(&self, pos: CellPos) -> Option<Cell> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// Returns `true` if the cell at `pos` is occupied or outside the board.
    #[must_use]
    pub fn is_occupied(&self, pos: CellPos) -> bool {
        self.cell(pos).is_none_or(Cell::is_occupied)
    }

    /// Returns an iterator over the rows of the board, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks_exact(self.width)
    }

    /// Returns an iterator over every cell position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = CellPos> + use<> {
        let width = to_coord(self.width);
        let height = to_coord(self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| CellPos::new(x, y)))
    }

    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_occupied()).count()
    }

    /// Overwrites a single cell. Positions outside the board are ignored.
    ///
    /// Intended for presets and tests; gameplay goes through
    /// [`Self::commit`] and [`Self::clear_completed_lines`].
    pub fn set_cell(&mut self, pos: CellPos, cell: Cell) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = cell;
        }
    }

    /// Checks whether `shape` anchored at `anchor` lies entirely on empty
    /// cells inside the board.
    ///
    /// Stops at the first cell that is out of range or occupied. A shape
    /// without cells is never valid.
    #[must_use]
    pub fn is_valid_position(&self, shape: &ShapeTemplate, anchor: CellPos) -> bool {
        !shape.is_empty() && shape.cells_at(anchor).all(|pos| !self.is_occupied(pos))
    }

    /// Writes `block` into every cell covered by `shape` at `anchor`.
    ///
    /// The placement must have been validated with [`Self::is_valid_position`];
    /// committing an invalid placement is a caller bug.
    pub fn commit(&mut self, shape: &ShapeTemplate, anchor: CellPos, block: Block) {
        debug_assert!(
            self.is_valid_position(shape, anchor),
            "committing unvalidated placement at {anchor}"
        );
        for pos in shape.cells_at(anchor) {
            self.set_cell(pos, Cell::Block(block));
        }
    }

    #[must_use]
    pub fn is_row_complete(&self, y: usize) -> bool {
        y < self.height
            && self.cells[y * self.width..][..self.width]
                .iter()
                .all(|c| c.is_occupied())
    }

    #[must_use]
    pub fn is_column_complete(&self, x: usize) -> bool {
        x < self.width
            && self
                .cells
                .iter()
                .skip(x)
                .step_by(self.width)
                .all(|c| c.is_occupied())
    }

    /// Empties every complete row and every complete column.
    ///
    /// Completeness of all rows and columns is decided on the grid as it was
    /// before this call, so a cell shared by a complete row and a complete
    /// column counts for both. Cleared lines are emptied in place; nothing
    /// shifts.
    pub fn clear_completed_lines(&mut self) -> ClearedLines {
        let rows: Vec<usize> = (0..self.height)
            .filter(|&y| self.is_row_complete(y))
            .collect();
        let columns: Vec<usize> = (0..self.width)
            .filter(|&x| self.is_column_complete(x))
            .collect();

        for &y in &rows {
            self.cells[y * self.width..][..self.width].fill(Cell::Empty);
        }
        for &x in &columns {
            for cell in self.cells.iter_mut().skip(x).step_by(self.width) {
                *cell = Cell::Empty;
            }
        }

        ClearedLines { rows, columns }
    }

    /// Returns `true` if `shape` can be placed somewhere on the board.
    ///
    /// Every board cell is tried as the landing spot of the shape's reference
    /// cell. The search is exhaustive and deterministic.
    #[must_use]
    pub fn can_fit(&self, shape: &ShapeTemplate) -> bool {
        self.fitting_anchors(shape).next().is_some()
    }

    /// Returns every anchor at which `shape` is a valid placement, ordered by
    /// the row-major position of the reference cell.
    pub fn fitting_anchors<'a>(
        &'a self,
        shape: &'a ShapeTemplate,
    ) -> impl Iterator<Item = CellPos> + 'a {
        shape
            .reference_cell()
            .into_iter()
            .flat_map(move |reference| self.positions().map(move |pos| pos - reference))
            .filter(move |&anchor| self.is_valid_position(shape, anchor))
    }

    /// Returns the occupancy snapshot accepted by [`Self::from_rows`].
    #[must_use]
    pub fn to_rows(&self) -> Vec<String> {
        self.rows()
            .map(|row| {
                row.iter()
                    .map(|c| if c.is_occupied() { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }

    fn index(&self, pos: CellPos) -> Option<usize> {
        let x = usize::try_from(pos.x).ok().filter(|&x| x < self.width)?;
        let y = usize::try_from(pos.y).ok().filter(|&y| y < self.height)?;
        Some(y * self.width + x)
    }
}

impl Serialize for Board {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Format: ["#.........", "..........", ...]
        self.to_rows().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rows = Vec::<String>::deserialize(deserializer)?;
        Self::from_rows(&rows)
            .map_err(|e| serde::de::Error::custom(format!("invalid board snapshot: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use arrayvec::ArrayVec;

    use super::*;

    const BLOCK: Block = Block::new(ShapeId::new(0), 0);

    fn template(rows: &[&str]) -> ShapeTemplate {
        ShapeTemplate::from_rows(rows).unwrap()
    }

    fn board(rows: &[&str]) -> Board {
        Board::from_rows(rows).unwrap()
    }

    /// Reference oracle: tries every anchor that could put any cell on the board.
    fn brute_force_fit(board: &Board, shape: &ShapeTemplate) -> bool {
        let w = to_coord(board.width());
        let h = to_coord(board.height());
        (-8..w + 8).any(|x| {
            (-8..h + 8).any(|y| board.is_valid_position(shape, CellPos::new(x, y)))
        })
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new(10, 8).unwrap();
        assert_eq!(board.width(), 10);
        assert_eq!(board.height(), 8);
        assert_eq!(board.rows().count(), 8);
        assert_eq!(board.occupied_count(), 0);
        assert!(board.positions().all(|p| board.cell(p) == Some(Cell::Empty)));
    }

    #[test]
    fn test_new_board_rejects_invalid_size() {
        assert!(matches!(
            Board::new(0, 10),
            Err(ConfigError::InvalidBoardSize { width: 0, .. })
        ));
        assert!(matches!(
            Board::new(10, 0),
            Err(ConfigError::InvalidBoardSize { height: 0, .. })
        ));
        assert!(Board::new(MAX_BOARD_DIMENSION + 1, 1).is_err());
        assert!(Board::new(MAX_BOARD_DIMENSION, MAX_BOARD_DIMENSION).is_ok());
    }

    #[test]
    fn test_out_of_range_is_occupied() {
        let board = Board::new(3, 3).unwrap();
        for pos in [
            CellPos::new(-1, 0),
            CellPos::new(0, -1),
            CellPos::new(3, 0),
            CellPos::new(0, 3),
        ] {
            assert!(!board.contains(pos));
            assert_eq!(board.cell(pos), None);
            assert!(board.is_occupied(pos), "{pos} should count as occupied");
        }
    }

    #[test]
    fn test_is_valid_position_rejects_out_of_bounds() {
        let board = Board::new(10, 10).unwrap();
        let bar = template(&["###"]);
        assert!(board.is_valid_position(&bar, CellPos::new(0, 0)));
        assert!(board.is_valid_position(&bar, CellPos::new(7, 9)));
        assert!(!board.is_valid_position(&bar, CellPos::new(8, 0)));
        assert!(!board.is_valid_position(&bar, CellPos::new(-1, 0)));
        assert!(!board.is_valid_position(&bar, CellPos::new(0, 10)));
        assert!(!board.is_valid_position(&bar, CellPos::new(0, -1)));
    }

    #[test]
    fn test_is_valid_position_rejects_overlap() {
        let board = board(&["....", ".#..", "....", "...."]);
        let square = template(&["##", "##"]);
        assert!(!board.is_valid_position(&square, CellPos::new(0, 0)));
        assert!(!board.is_valid_position(&square, CellPos::new(1, 1)));
        assert!(board.is_valid_position(&square, CellPos::new(2, 0)));
        assert!(board.is_valid_position(&square, CellPos::new(0, 2)));
    }

    #[test]
    fn test_empty_shape_is_never_valid() {
        let board = Board::new(4, 4).unwrap();
        let empty = ShapeTemplate {
            cells: ArrayVec::new(),
        };
        assert!(!board.is_valid_position(&empty, CellPos::new(0, 0)));
        assert!(!board.can_fit(&empty));
        assert_eq!(board.fitting_anchors(&empty).count(), 0);
    }

    #[test]
    fn test_commit_occupies_cells_and_blocks_replacement() {
        let mut board = Board::new(10, 10).unwrap();
        let corner = template(&["#.", "##"]);
        let anchor = CellPos::new(4, 6);
        let block = Block::new(ShapeId::new(3), 5);

        assert!(board.is_valid_position(&corner, anchor));
        board.commit(&corner, anchor, block);

        for pos in corner.cells_at(anchor) {
            assert_eq!(board.cell(pos), Some(Cell::Block(block)));
        }
        assert_eq!(board.cell(CellPos::new(5, 6)), Some(Cell::Empty));
        assert_eq!(board.occupied_count(), 3);
        assert!(!board.is_valid_position(&corner, anchor));
    }

    #[test]
    fn test_single_cell_at_origin_completes_nothing() {
        let mut board = Board::new(10, 10).unwrap();
        let dot = template(&["#"]);
        board.commit(&dot, CellPos::new(0, 0), BLOCK);

        assert!(board.is_occupied(CellPos::new(0, 0)));
        assert!(!board.is_row_complete(0));
        assert!(!board.is_column_complete(0));
        assert!(board.clear_completed_lines().is_empty());
        assert_eq!(board.occupied_count(), 1);
    }

    #[test]
    fn test_clear_single_row() {
        let mut board = Board::new(10, 10).unwrap();
        for x in 0..9 {
            board.set_cell(CellPos::new(x, 5), Cell::Block(BLOCK));
        }
        board.set_cell(CellPos::new(3, 4), Cell::Block(BLOCK));
        assert!(!board.is_row_complete(5));

        board.commit(&template(&["#"]), CellPos::new(9, 5), BLOCK);
        assert!(board.is_row_complete(5));

        let cleared = board.clear_completed_lines();
        assert_eq!(cleared.rows(), [5]);
        assert!(cleared.columns().is_empty());
        assert_eq!(cleared.len(), 1);
        for x in 0..10 {
            assert_eq!(board.cell(CellPos::new(x, 5)), Some(Cell::Empty));
        }
        // Cells outside the cleared row do not move.
        assert!(board.is_occupied(CellPos::new(3, 4)));
        assert_eq!(board.occupied_count(), 1);
    }

    #[test]
    fn test_clear_row_and_column_sharing_a_cell() {
        let mut board = board(&[
            "..#..", //
            "..#..", //
            "##.##", //
            "..#..", //
            "..#..", //
        ]);
        board.commit(&template(&["#"]), CellPos::new(2, 2), BLOCK);

        let cleared = board.clear_completed_lines();
        assert_eq!(cleared.rows(), [2]);
        assert_eq!(cleared.columns(), [2]);
        assert_eq!(cleared.len(), 2);
        assert_eq!(board.occupied_count(), 0);
    }

    #[test]
    fn test_clear_uses_pre_clear_snapshot() {
        // Row 0 and column 0 are both complete. Clearing the row first must
        // not hide the column, and vice versa.
        let mut board = board(&[
            "###", //
            "#..", //
            "#.#", //
        ]);
        let cleared = board.clear_completed_lines();
        assert_eq!(cleared.rows(), [0]);
        assert_eq!(cleared.columns(), [0]);
        assert_eq!(board.to_rows(), ["...", "...", "..#"]);
    }

    #[test]
    fn test_clear_full_board() {
        let mut board = board(&["##", "##"]);
        let cleared = board.clear_completed_lines();
        assert_eq!(cleared.rows(), [0, 1]);
        assert_eq!(cleared.columns(), [0, 1]);
        assert_eq!(cleared.len(), 4);
        assert_eq!(board.occupied_count(), 0);
    }

    #[test]
    fn test_line_centers() {
        let mut board = board(&[
            "#...", //
            "####", //
            "#...", //
        ]);
        let cleared = board.clear_completed_lines();
        assert_eq!(
            cleared.line_centers(board.width(), board.height()),
            [Point::new(1.5, 1.0), Point::new(0.0, 1.0)]
        );
    }

    #[test]
    fn test_can_fit_matches_brute_force() {
        let boards = [
            board(&["....", "....", "....", "...."]),
            board(&["#.#.", ".#.#", "#.#.", ".#.#"]),
            board(&["###.", "###.", "###.", "...."]),
            board(&["####", "##.#", "#..#", "####"]),
            board(&["####", "####", "####", "####"]),
        ];
        let shapes = [
            template(&["#"]),
            template(&["##"]),
            template(&["#", "#"]),
            template(&["##", "##"]),
            template(&[".#", "##"]),
            template(&["#.", "##"]),
            template(&["####"]),
            template(&["#####"]),
        ];
        for board in &boards {
            for shape in &shapes {
                assert_eq!(
                    board.can_fit(shape),
                    brute_force_fit(board, shape),
                    "board {:?}, shape {:?}",
                    board.to_rows(),
                    shape.to_rows()
                );
            }
        }
    }

    #[test]
    fn test_can_fit_aligns_reference_cell() {
        // The only gap is the top-right cell; a shape whose reference cell is
        // not its top-left bounding-box corner must still be found.
        let board = board(&[
            "##.", //
            "#..", //
            "###", //
        ]);
        let shape = template(&[".#", "##"]);
        assert!(board.can_fit(&shape));
        let anchors: Vec<_> = board.fitting_anchors(&shape).collect();
        assert_eq!(anchors, [CellPos::new(1, 0)]);
    }

    #[test]
    fn test_can_fit_full_board() {
        let board = board(&["###", "###", "###"]);
        assert!(!board.can_fit(&template(&["#"])));
    }

    #[test]
    fn test_can_fit_shape_larger_than_board() {
        let board = Board::new(3, 3).unwrap();
        assert!(!board.can_fit(&template(&["####"])));
        assert!(board.can_fit(&template(&["###"])));
    }

    #[test]
    fn test_from_rows_errors() {
        assert_eq!(Board::from_rows::<&str>(&[]), Err(BoardParseError::Empty));
        assert_eq!(Board::from_rows(&[""]), Err(BoardParseError::Empty));
        assert_eq!(
            Board::from_rows(&["...", ".."]),
            Err(BoardParseError::RaggedRow {
                row: 1,
                width: 2,
                expected: 3
            })
        );
        assert_eq!(
            Board::from_rows(&["..", ".o"]),
            Err(BoardParseError::InvalidChar { row: 1, ch: 'o' })
        );
    }

    #[test]
    fn test_board_serialization() {
        let mut board = Board::new(3, 2).unwrap();
        board.commit(&template(&["##"]), CellPos::new(1, 1), BLOCK);

        let serialized = serde_json::to_string(&board).unwrap();
        assert_eq!(serialized, r#"["...",".##"]"#);

        let deserialized: Board = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized.to_rows(), board.to_rows());
        assert_eq!(deserialized.cell(CellPos::new(1, 1)), Some(Cell::Filled));

        assert!(serde_json::from_str::<Board>(r#"["..", "..."]"#).is_err());
    }
}
