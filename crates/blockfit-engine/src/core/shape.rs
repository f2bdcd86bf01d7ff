use arrayvec::ArrayVec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ShapeTemplateError;

use super::{MAX_SHAPE_CELLS, MAX_SHAPE_EXTENT, to_coord};

/// Integer grid coordinate.
///
/// Used both for absolute board cells and for offsets relative to a shape's
/// anchor. Coordinates may be negative or exceed the board so that candidate
/// placements outside the grid can be expressed (and rejected).
///
/// - (0, 0) is the top-left cell of the board
/// - X increases rightward (columns)
/// - Y increases downward (rows)
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
    derive_more::Display,
)]
#[display("({x}, {y})")]
pub struct CellPos {
    pub x: i32,
    pub y: i32,
}

impl CellPos {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Continuous position in board space, one unit per cell.
///
/// The centre of cell `(x, y)` is the point `(x, y)`, so a point snaps to the
/// cell it lies over by rounding (see [`snap_to_cell`]).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

impl From<CellPos> for Point {
    #[expect(clippy::cast_precision_loss)]
    fn from(pos: CellPos) -> Self {
        Self::new(pos.x as f32, pos.y as f32)
    }
}

/// Snaps a board-space point to the nearest grid cell, rounding each axis
/// independently.
///
/// Halfway values round away from zero.
///
/// # Example
///
/// ```
/// use blockfit_engine::{CellPos, Point, snap_to_cell};
///
/// assert_eq!(snap_to_cell(Point::new(2.4, 6.6)), CellPos::new(2, 7));
/// assert_eq!(snap_to_cell(Point::new(-0.7, 0.5)), CellPos::new(-1, 1));
/// ```
#[must_use]
#[expect(clippy::cast_possible_truncation)]
pub fn snap_to_cell(point: Point) -> CellPos {
    CellPos::new(point.x.round() as i32, point.y.round() as i32)
}

/// Set of cells that make up a shape, relative to the shape's anchor.
///
/// Templates are normalized on construction: the top-most row and left-most
/// column of the bounding box are at offset 0, and cells are stored in
/// row-major order. The first cell is the *reference cell* used to align the
/// shape when searching the board for a fit.
///
/// Templates serialize as rows of `#` (occupied) and `.` (empty).
///
/// # Example
///
/// ```
/// use blockfit_engine::{CellPos, ShapeTemplate};
///
/// let corner = ShapeTemplate::from_rows(&["#.", "##"]).unwrap();
/// assert_eq!(corner.len(), 3);
/// assert_eq!(corner.reference_cell(), Some(CellPos::new(0, 0)));
/// assert_eq!(corner.to_rows(), ["#.", "##"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeTemplate {
    pub(crate) cells: ArrayVec<CellPos, MAX_SHAPE_CELLS>,
}

impl ShapeTemplate {
    /// Parses a template from rows of `#` (occupied) and `.` or space (empty).
    pub fn from_rows<S>(rows: &[S]) -> Result<Self, ShapeTemplateError>
    where
        S: AsRef<str>,
    {
        if rows.len() > MAX_SHAPE_EXTENT {
            return Err(ShapeTemplateError::TooLarge {
                max: MAX_SHAPE_EXTENT,
            });
        }
        let mut cells = ArrayVec::<CellPos, MAX_SHAPE_CELLS>::new();
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.as_ref().chars().enumerate() {
                match ch {
                    '#' => {}
                    '.' | ' ' => continue,
                    _ => return Err(ShapeTemplateError::InvalidChar { row: y, ch }),
                }
                if x >= MAX_SHAPE_EXTENT {
                    return Err(ShapeTemplateError::TooLarge {
                        max: MAX_SHAPE_EXTENT,
                    });
                }
                cells
                    .try_push(CellPos::new(to_coord(x), to_coord(y)))
                    .map_err(|_| ShapeTemplateError::TooManyCells {
                        max: MAX_SHAPE_CELLS,
                    })?;
            }
        }
        Self::from_cells(cells)
    }

    /// Builds a template from arbitrary cell offsets.
    ///
    /// Duplicate cells are ignored and the result is normalized (see the type
    /// documentation).
    pub fn from_cells<I>(cells: I) -> Result<Self, ShapeTemplateError>
    where
        I: IntoIterator<Item = CellPos>,
    {
        let mut collected = ArrayVec::<CellPos, MAX_SHAPE_CELLS>::new();
        for cell in cells {
            if collected.contains(&cell) {
                continue;
            }
            collected
                .try_push(cell)
                .map_err(|_| ShapeTemplateError::TooManyCells {
                    max: MAX_SHAPE_CELLS,
                })?;
        }

        let (Some(min_x), Some(max_x), Some(min_y), Some(max_y)) = (
            collected.iter().map(|c| c.x).min(),
            collected.iter().map(|c| c.x).max(),
            collected.iter().map(|c| c.y).min(),
            collected.iter().map(|c| c.y).max(),
        ) else {
            return Err(ShapeTemplateError::Empty);
        };

        let max_extent = i64::from(to_coord(MAX_SHAPE_EXTENT));
        if i64::from(max_x) - i64::from(min_x) >= max_extent
            || i64::from(max_y) - i64::from(min_y) >= max_extent
        {
            return Err(ShapeTemplateError::TooLarge {
                max: MAX_SHAPE_EXTENT,
            });
        }

        let origin = CellPos::new(min_x, min_y);
        for cell in &mut collected {
            *cell = *cell - origin;
        }
        collected.sort_unstable_by_key(|c| (c.y, c.x));

        Ok(Self { cells: collected })
    }

    #[must_use]
    pub fn cells(&self) -> &[CellPos] {
        &self.cells
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the cell used as the alignment point in fit searches.
    #[must_use]
    pub fn reference_cell(&self) -> Option<CellPos> {
        self.cells.first().copied()
    }

    /// Width of the bounding box in cells.
    #[must_use]
    pub fn width(&self) -> usize {
        extent(self.cells.iter().map(|c| c.x))
    }

    /// Height of the bounding box in cells.
    #[must_use]
    pub fn height(&self) -> usize {
        extent(self.cells.iter().map(|c| c.y))
    }

    /// Returns the absolute cells covered when the template is anchored at `anchor`.
    pub fn cells_at(&self, anchor: CellPos) -> impl Iterator<Item = CellPos> + '_ {
        self.cells.iter().map(move |&offset| anchor + offset)
    }

    #[must_use]
    pub fn to_rows(&self) -> Vec<String> {
        let mut rows = vec![vec!['.'; self.width()]; self.height()];
        for cell in &self.cells {
            if let (Ok(x), Ok(y)) = (usize::try_from(cell.x), usize::try_from(cell.y)) {
                rows[y][x] = '#';
            }
        }
        rows.into_iter().map(String::from_iter).collect()
    }
}

fn extent(values: impl Iterator<Item = i32>) -> usize {
    values
        .max()
        .and_then(|max| usize::try_from(max + 1).ok())
        .unwrap_or(0)
}

impl Serialize for ShapeTemplate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Format: ["##", "#."]
        self.to_rows().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ShapeTemplate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rows = Vec::<String>::deserialize(deserializer)?;
        Self::from_rows(&rows)
            .map_err(|e| serde::de::Error::custom(format!("invalid shape template {rows:?}: {e}")))
    }
}

/// Identifier of a spawned shape, unique within a session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("#{_0}")]
#[serde(transparent)]
pub struct ShapeId(u32);

impl ShapeId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum ShapeState {
    /// Waiting in its staging slot.
    Staged,
    /// Picked up and following the pointer.
    Dragging,
}

/// A spawned, not yet placed shape.
///
/// The template never changes after spawn. The anchor and scale change while
/// the shape is dragged and are restored from the recorded staging position
/// when a drop is rejected. Once a shape is placed it leaves the batch and its
/// cells become independent board entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    id: ShapeId,
    template_index: usize,
    template: ShapeTemplate,
    anchor: Point,
    scale: f32,
    home: Point,
    home_scale: f32,
    state: ShapeState,
}

impl Shape {
    pub(crate) fn new(
        id: ShapeId,
        template_index: usize,
        template: ShapeTemplate,
        home: Point,
        home_scale: f32,
    ) -> Self {
        Self {
            id,
            template_index,
            template,
            anchor: home,
            scale: home_scale,
            home,
            home_scale,
            state: ShapeState::Staged,
        }
    }

    #[must_use]
    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Index of this shape's template in the session catalog.
    #[must_use]
    pub fn template_index(&self) -> usize {
        self.template_index
    }

    #[must_use]
    pub fn template(&self) -> &ShapeTemplate {
        &self.template
    }

    #[must_use]
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Staging position the shape returns to when a drop is rejected.
    #[must_use]
    pub fn home(&self) -> Point {
        self.home
    }

    #[must_use]
    pub fn state(&self) -> ShapeState {
        self.state
    }

    /// Centres of the shape's cells at the current anchor and scale.
    pub fn cell_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.template
            .cells()
            .iter()
            .map(move |&cell| self.anchor + Point::from(cell).scaled(self.scale))
    }

    /// Returns `true` if `point` lies over one of the shape's cells.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> bool {
        let local = snap_to_cell((point - self.anchor).scaled(self.scale.recip()));
        self.template.cells().contains(&local)
    }

    /// Grid cell the anchor snaps to if the shape is dropped now.
    #[must_use]
    pub fn snapped_anchor(&self) -> CellPos {
        snap_to_cell(self.anchor)
    }

    /// Picks the shape up at full scale, keeping the grabbed cell under the
    /// pointer.
    ///
    /// Returns the offset from the pointer to the anchor for later moves.
    pub(crate) fn begin_drag(&mut self, pointer: Point) -> Point {
        let grab = (self.anchor - pointer).scaled(self.scale.recip());
        self.scale = 1.0;
        self.anchor = pointer + grab;
        self.state = ShapeState::Dragging;
        grab
    }

    pub(crate) fn move_to(&mut self, anchor: Point) {
        self.anchor = anchor;
    }

    pub(crate) fn reset(&mut self) {
        self.anchor = self.home;
        self.scale = self.home_scale;
        self.state = ShapeState::Staged;
    }
}
