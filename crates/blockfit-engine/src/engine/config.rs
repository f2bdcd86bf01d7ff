use serde::{Deserialize, Serialize};

use crate::{
    ConfigError,
    core::{MAX_BOARD_DIMENSION, Point, ShapeTemplate},
};

/// Standard shape patterns, one entry per catalog template.
const STANDARD_PATTERNS: &[&[&str]] = &[
    // Dot
    &["#"],
    // Bars
    &["##"],
    &["#", "#"],
    &["###"],
    &["#", "#", "#"],
    &["####"],
    &["#", "#", "#", "#"],
    &["#####"],
    &["#", "#", "#", "#", "#"],
    // Squares
    &["##", "##"],
    &["###", "###", "###"],
    // Small corners
    &["#.", "##"],
    &[".#", "##"],
    &["##", "#."],
    &["##", ".#"],
    // Large corners
    &["#..", "#..", "###"],
    &["..#", "..#", "###"],
    &["###", "#..", "#.."],
    &["###", "..#", "..#"],
];

/// Returns the standard shape catalog.
///
/// # Example
///
/// ```
/// use blockfit_engine::standard_catalog;
///
/// let catalog = standard_catalog();
/// assert_eq!(catalog.len(), 19);
/// assert!(catalog.iter().all(|shape| !shape.is_empty()));
/// ```
#[must_use]
pub fn standard_catalog() -> Vec<ShapeTemplate> {
    STANDARD_PATTERNS
        .iter()
        .map(|rows| ShapeTemplate::from_rows(rows).expect("standard patterns should be valid"))
        .collect()
}

/// Constants fixed at session construction.
///
/// Missing fields take their default values when deserializing, so a config
/// file only needs to list what it changes.
///
/// # Example
///
/// ```
/// use blockfit_engine::SessionConfig;
///
/// let config: SessionConfig = serde_json::from_str(r#"{ "board_width": 8 }"#).unwrap();
/// assert_eq!(config.board_width, 8);
/// assert_eq!(config.board_height, 10);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub board_width: usize,
    pub board_height: usize,
    /// Points awarded per cleared row or column.
    pub points_per_line: usize,
    /// Number of shapes offered per batch.
    pub spawn_slots: usize,
    /// Scale at which staged (not yet picked up) shapes are displayed.
    pub staging_scale: f32,
    pub catalog: Vec<ShapeTemplate>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            board_width: 10,
            board_height: 10,
            points_per_line: 10,
            spawn_slots: 3,
            staging_scale: 0.5,
            catalog: standard_catalog(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let range = 1..=MAX_BOARD_DIMENSION;
        if !range.contains(&self.board_width) || !range.contains(&self.board_height) {
            return Err(ConfigError::InvalidBoardSize {
                width: self.board_width,
                height: self.board_height,
                max: MAX_BOARD_DIMENSION,
            });
        }
        if self.spawn_slots == 0 {
            return Err(ConfigError::ZeroSpawnSlots);
        }
        if self.catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        if !(self.staging_scale.is_finite() && self.staging_scale > 0.0) {
            return Err(ConfigError::InvalidStagingScale {
                scale: self.staging_scale,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn staging_layout(&self) -> StagingLayout {
        StagingLayout {
            board_width: self.board_width,
            board_height: self.board_height,
            scale: self.staging_scale,
        }
    }
}

/// Where staged shapes wait before being picked up.
///
/// The staging tray sits below the board, one cell below its bottom edge and
/// three cells tall. It is divided into equal-width slots; each staged shape
/// is centred in its slot. Shapes are drawn at the staging scale, shrunk
/// further when needed so that a shape never leaves its slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagingLayout {
    board_width: usize,
    board_height: usize,
    scale: f32,
}

impl StagingLayout {
    const TRAY_GAP: f32 = 1.0;
    const TRAY_HEIGHT: f32 = 3.0;

    /// Configured staging scale, before fitting shapes into their slots.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn slot_width(&self, slots: usize) -> f32 {
        self.board_width as f32 / slots.max(1) as f32
    }

    /// Scale at which `template` is staged when the tray has `slots` slots.
    ///
    /// A staged shape covers `width * scale` by `height * scale`, which must
    /// stay within its slot and the tray height.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn scale_for(&self, slots: usize, template: &ShapeTemplate) -> f32 {
        let fit_x = self.slot_width(slots) / template.width().max(1) as f32;
        let fit_y = Self::TRAY_HEIGHT / template.height().max(1) as f32;
        self.scale.min(fit_x).min(fit_y)
    }

    /// Returns the anchor that centres `template` in slot `slot` of `slots`.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn anchor_for(&self, slot: usize, slots: usize, template: &ShapeTemplate) -> Point {
        // The board spans [-0.5, width - 0.5) since cell centres are integers.
        let slot_width = self.slot_width(slots);
        let center_x = -0.5 + slot_width * (slot as f32 + 0.5);
        let center_y = self.board_height as f32 - 0.5 + Self::TRAY_GAP + Self::TRAY_HEIGHT / 2.0;

        let scale = self.scale_for(slots, template);
        let half_w = (template.width() as f32 - 1.0) * scale / 2.0;
        let half_h = (template.height() as f32 - 1.0) * scale / 2.0;
        Point::new(center_x - half_w, center_y - half_h)
    }
}
