use std::fmt;

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    ConfigError,
    core::{Point, Shape, ShapeId, ShapeTemplate},
};

use super::config::{SessionConfig, StagingLayout};

/// Seed of the spawner's shape draws.
///
/// Every catalog draw of a session comes from a generator seeded with these
/// 128 bits. Replaying the recorded placements under the recorded seed and
/// config therefore offers the same batches in the same slots.
///
/// Serializes as a 32-character hex string; `Display` prints the same form.
///
/// # Example
///
/// ```
/// use blockfit_engine::{GameSession, SessionConfig, SpawnSeed};
/// use rand::Rng as _;
///
/// let seed: SpawnSeed = rand::rng().random();
///
/// let session1 = GameSession::with_seed(SessionConfig::default(), seed).unwrap();
/// let session2 = GameSession::with_seed(SessionConfig::default(), seed).unwrap();
///
/// let templates = |s: &GameSession| {
///     s.batch()
///         .map(|shape| shape.template_index())
///         .collect::<Vec<_>>()
/// };
/// assert_eq!(templates(&session1), templates(&session2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnSeed([u8; 16]);

impl SpawnSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    fn from_hex(hex: &str) -> Result<Self, String> {
        if hex.len() != 32 {
            return Err(format!("invalid hex: expected 32 characters, got {}", hex.len()));
        }
        u128::from_str_radix(hex, 16)
            .map(|num| Self(num.to_be_bytes()))
            .map_err(|e| format!("invalid hex: {hex} ({e})"))
    }
}

impl fmt::Display for SpawnSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl Serialize for SpawnSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SpawnSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// Draws seeds for new sessions, e.g. `rand::rng().random::<SpawnSeed>()`.
impl Distribution<SpawnSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SpawnSeed {
        SpawnSeed(rng.random())
    }
}

/// Produces batches of shapes and owns the current, not yet placed batch.
///
/// Each shape of a batch is drawn uniformly, with replacement, from the
/// catalog. The batch keeps one slot per shape so the staging tray layout is
/// stable: placing a shape empties its slot rather than shifting the others.
#[derive(Debug, Clone)]
pub struct Spawner {
    rng: Pcg32,
    catalog: Vec<ShapeTemplate>,
    staging: StagingLayout,
    slots: Vec<Option<Shape>>,
    next_id: u32,
}

impl Spawner {
    /// Creates a spawner with an empty batch.
    pub fn with_seed(config: &SessionConfig, seed: SpawnSeed) -> Result<Self, ConfigError> {
        if config.catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        Ok(Self {
            rng: Pcg32::from_seed(seed.0),
            catalog: config.catalog.clone(),
            staging: config.staging_layout(),
            slots: Vec::with_capacity(config.spawn_slots),
            next_id: 0,
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &[ShapeTemplate] {
        &self.catalog
    }

    /// Replaces the current batch with `n` freshly drawn shapes, each staged in
    /// its own slot, and returns them in slot order.
    pub fn spawn_batch(&mut self, n: usize) -> impl Iterator<Item = &Shape> {
        self.slots.clear();
        for slot in 0..n {
            let template_index = self.rng.random_range(0..self.catalog.len());
            let template = self.catalog[template_index].clone();
            let home = self.staging.anchor_for(slot, n, &template);
            let scale = self.staging.scale_for(n, &template);
            let id = ShapeId::new(self.next_id);
            self.next_id = self.next_id.wrapping_add(1);
            self.slots.push(Some(Shape::new(
                id,
                template_index,
                template,
                home,
                scale,
            )));
        }
        self.batch()
    }

    /// Number of shapes in the current batch that have not been placed.
    #[must_use]
    pub fn remaining_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Removes a placed shape from its slot and hands it over to the caller.
    ///
    /// Returns `None` if `id` is not in the current batch; the remaining count
    /// is unchanged in that case.
    pub fn notify_placed(&mut self, id: ShapeId) -> Option<Shape> {
        self.slots
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|shape| shape.id() == id))
            .and_then(Option::take)
    }

    /// Unplaced shapes of the current batch, in slot order.
    pub fn batch(&self) -> impl Iterator<Item = &Shape> {
        self.slots.iter().flatten()
    }

    /// Batch slots, including the empty slots of already placed shapes.
    #[must_use]
    pub fn slots(&self) -> &[Option<Shape>] {
        &self.slots
    }

    #[must_use]
    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.batch().find(|shape| shape.id() == id)
    }

    pub(crate) fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.slots.iter_mut().flatten().find(|shape| shape.id() == id)
    }

    /// Returns the unplaced shape under `point`, if any.
    #[must_use]
    pub fn shape_at(&self, point: Point) -> Option<ShapeId> {
        self.batch()
            .find(|shape| shape.hit_test(point))
            .map(Shape::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(byte: u8) -> SpawnSeed {
        SpawnSeed::from_bytes([byte; 16])
    }

    fn spawner(seed: SpawnSeed) -> Spawner {
        Spawner::with_seed(&SessionConfig::default(), seed).unwrap()
    }

    #[test]
    fn test_empty_catalog_is_rejected() {
        let config = SessionConfig {
            catalog: vec![],
            ..SessionConfig::default()
        };
        assert_eq!(
            Spawner::with_seed(&config, seed(0)).unwrap_err(),
            ConfigError::EmptyCatalog
        );
    }

    #[test]
    fn test_spawn_batch_fills_every_slot() {
        let mut spawner = spawner(seed(1));
        assert_eq!(spawner.remaining_count(), 0);

        let shapes: Vec<_> = spawner.spawn_batch(3).cloned().collect();
        assert_eq!(shapes.len(), 3);
        assert_eq!(spawner.remaining_count(), 3);
        assert_eq!(spawner.slots().len(), 3);

        for shape in &shapes {
            assert!(shape.state().is_staged());
            assert_eq!(shape.anchor(), shape.home());
            assert!(shape.template_index() < spawner.catalog().len());
            assert_eq!(
                shape.template(),
                &spawner.catalog()[shape.template_index()]
            );
        }
        let ids: Vec<_> = shapes.iter().map(Shape::id).collect();
        assert_eq!(ids, [ShapeId::new(0), ShapeId::new(1), ShapeId::new(2)]);
    }

    #[test]
    fn test_respawn_assigns_fresh_ids() {
        let mut spawner = spawner(seed(2));
        spawner.spawn_batch(3);
        let ids: Vec<_> = spawner.spawn_batch(3).map(Shape::id).collect();
        assert_eq!(ids, [ShapeId::new(3), ShapeId::new(4), ShapeId::new(5)]);
    }

    #[test]
    fn test_notify_placed_empties_slot() {
        let mut spawner = spawner(seed(3));
        spawner.spawn_batch(3);

        let placed = spawner.notify_placed(ShapeId::new(1)).unwrap();
        assert_eq!(placed.id(), ShapeId::new(1));
        assert_eq!(spawner.remaining_count(), 2);
        assert!(spawner.slots()[1].is_none());
        assert!(spawner.shape(ShapeId::new(1)).is_none());

        // Placing again, or placing an unknown shape, changes nothing.
        assert!(spawner.notify_placed(ShapeId::new(1)).is_none());
        assert!(spawner.notify_placed(ShapeId::new(42)).is_none());
        assert_eq!(spawner.remaining_count(), 2);

        spawner.notify_placed(ShapeId::new(0)).unwrap();
        spawner.notify_placed(ShapeId::new(2)).unwrap();
        assert_eq!(spawner.remaining_count(), 0);
        assert!(spawner.notify_placed(ShapeId::new(2)).is_none());
        assert_eq!(spawner.remaining_count(), 0);
    }

    #[test]
    fn test_same_seed_same_batches() {
        let mut spawner1 = spawner(seed(4));
        let mut spawner2 = spawner(seed(4));
        for _ in 0..20 {
            let a: Vec<_> = spawner1.spawn_batch(3).map(Shape::template_index).collect();
            let b: Vec<_> = spawner2.spawn_batch(3).map(Shape::template_index).collect();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_selection_covers_catalog() {
        let mut spawner = spawner(seed(5));
        let mut seen = vec![false; spawner.catalog().len()];
        for _ in 0..200 {
            let indices: Vec<_> = spawner.spawn_batch(3).map(Shape::template_index).collect();
            for index in indices {
                seen[index] = true;
            }
        }
        assert!(seen.iter().all(|&s| s), "every template should be drawn: {seen:?}");
    }

    #[test]
    fn test_shape_at_hits_staged_shapes() {
        let mut spawner = spawner(seed(6));
        spawner.spawn_batch(3);
        let shapes: Vec<_> = spawner.batch().cloned().collect();
        for shape in &shapes {
            let point = shape.cell_points().next().unwrap();
            assert_eq!(spawner.shape_at(point), Some(shape.id()));
        }
        assert_eq!(spawner.shape_at(Point::new(4.0, 4.0)), None);
    }

    #[test]
    fn test_staged_shapes_never_overlap() {
        let config = SessionConfig {
            staging_scale: 1.0,
            ..SessionConfig::default()
        };
        for byte in 0..40 {
            let mut spawner = Spawner::with_seed(&config, seed(byte)).unwrap();
            spawner.spawn_batch(3);
            for shape in spawner.batch() {
                let edge = shape.scale() * 0.49;
                for center in shape.cell_points() {
                    for offset in [
                        Point::new(0.0, 0.0),
                        Point::new(-edge, -edge),
                        Point::new(edge, -edge),
                        Point::new(-edge, edge),
                        Point::new(edge, edge),
                    ] {
                        let point = center + offset;
                        let hits: Vec<_> = spawner
                            .batch()
                            .filter(|other| other.hit_test(point))
                            .map(Shape::id)
                            .collect();
                        assert_eq!(
                            hits,
                            [shape.id()],
                            "seed {byte}: ({}, {})",
                            point.x,
                            point.y
                        );
                    }
                }
            }
        }
    }

    mod spawn_seed_serialization {
        use super::*;

        #[test]
        fn test_known_value_sequential_bytes() {
            let seed = SpawnSeed::from_bytes([
                0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54,
                0x32, 0x10,
            ]);
            let serialized = serde_json::to_string(&seed).unwrap();
            assert_eq!(serialized, "\"0123456789abcdeffedcba9876543210\"");

            let deserialized: SpawnSeed = serde_json::from_str(&serialized).unwrap();
            assert_eq!(deserialized, seed);
            assert_eq!(seed.to_string(), "0123456789abcdeffedcba9876543210");
        }

        #[test]
        fn test_deserialize_uppercase_hex() {
            let json = "\"0123456789ABCDEFFEDCBA9876543210\"";
            let deserialized: SpawnSeed = serde_json::from_str(json).unwrap();
            assert_eq!(deserialized.0[0], 0x01);
            assert_eq!(deserialized.0[15], 0x10);
        }

        #[test]
        fn test_random_seed_format() {
            let seed: SpawnSeed = rand::rng().random();
            let serialized = serde_json::to_string(&seed).unwrap();
            let hex_str = serialized.trim_matches('"');
            assert_eq!(hex_str.len(), 32);
            assert!(hex_str.chars().all(|c| c.is_ascii_hexdigit()));
        }

        #[test]
        fn test_errors() {
            for json in [
                "\"\"",
                "\"0123456789abcdef0123456789abcde\"",
                "\"0123456789abcdef0123456789abcdef0\"",
                "\"ghijklmnopqrstuvwxyzghijklmnopqr\"",
            ] {
                let err = serde_json::from_str::<SpawnSeed>(json).unwrap_err();
                assert!(err.to_string().contains("invalid hex"), "{json}: {err}");
            }
        }
    }
}
