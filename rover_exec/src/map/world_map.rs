//! Persistent map of accumulated terrain knowledge.
//!
//! The world map is a square grid of cells, each holding one counter per terrain class. Every
//! stable perception pass votes its classified cells into the map, so a cell's counters grow
//! with the weight of evidence for each class. Counters only ever increase, the map is never
//! reset during a run.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ndarray::{Array3, Axis};
use ndarray_stats::QuantileExt;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of data layers held by the map.
pub const NUM_LAYERS: usize = 3;

/// Default number of cells along each axis of the map.
pub const DEFAULT_WORLD_SIZE: usize = 200;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The data layers of the world map, one per terrain class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorldMapLayer {
    Obstacle,
    Sample,
    Navigable,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Persistent world map.
///
/// Cells are addressed by `(x, y)` position with both axes running from 0 to `size - 1`. One
/// cell spans one metre of terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldMap {
    size: usize,

    /// Cell counters in `(layer, y, x)` order.
    data: Array3<u32>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WorldMapLayer {
    /// All layers, in data order.
    pub const ALL: [Self; NUM_LAYERS] = [Self::Obstacle, Self::Sample, Self::Navigable];

    /// The index of this layer in the underlying data array.
    fn index(&self) -> usize {
        match self {
            Self::Obstacle => 0,
            Self::Sample => 1,
            Self::Navigable => 2,
        }
    }
}

impl WorldMap {
    /// Create a new map of `size` by `size` cells with all counters at zero.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            data: Array3::zeros((NUM_LAYERS, size, size)),
        }
    }

    /// Returns the number of cells along each axis of the map.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the counter of the given layer at cell `(x, y)`.
    ///
    /// Panics if the cell lies outside the map.
    pub fn get(&self, layer: WorldMapLayer, x: usize, y: usize) -> u32 {
        self.data[[layer.index(), y, x]]
    }

    /// Add one vote to the given layer at each of `cells`.
    ///
    /// A cell appearing more than once gains one vote per appearance. Panics if a cell lies
    /// outside the map.
    pub fn accumulate(&mut self, layer: WorldMapLayer, cells: &[(usize, usize)]) {
        for (x, y) in cells {
            self.data[[layer.index(), *y, *x]] += 1;
        }
    }

    /// Returns the largest counter in the given layer, or zero if the map is empty.
    pub fn layer_max(&self, layer: WorldMapLayer) -> u32 {
        self.data
            .index_axis(Axis(0), layer.index())
            .max()
            .map(|max| *max)
            .unwrap_or(0)
    }
}

impl Default for WorldMap {
    fn default() -> Self {
        Self::new(DEFAULT_WORLD_SIZE)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_map_is_zeroed() {
        let map = WorldMap::new(10);

        assert_eq!(map.size(), 10);
        for layer in WorldMapLayer::ALL.iter() {
            assert_eq!(map.layer_max(*layer), 0);
        }
    }

    #[test]
    fn test_counters_only_grow() {
        let mut map = WorldMap::new(10);

        map.accumulate(WorldMapLayer::Navigable, &[(3, 4)]);
        assert_eq!(map.get(WorldMapLayer::Navigable, 3, 4), 1);

        map.accumulate(WorldMapLayer::Navigable, &[(3, 4)]);
        assert_eq!(map.get(WorldMapLayer::Navigable, 3, 4), 2);
    }

    #[test]
    fn test_repeated_cells_gain_one_vote_each() {
        let mut map = WorldMap::new(10);

        map.accumulate(WorldMapLayer::Obstacle, &[(5, 5), (5, 5), (5, 5)]);

        assert_eq!(map.get(WorldMapLayer::Obstacle, 5, 5), 3);
        assert_eq!(map.layer_max(WorldMapLayer::Obstacle), 3);
    }

    #[test]
    fn test_layers_accumulate_independently() {
        let mut map = WorldMap::new(10);

        map.accumulate(WorldMapLayer::Obstacle, &[(1, 2)]);
        map.accumulate(WorldMapLayer::Sample, &[(1, 2), (1, 2)]);

        assert_eq!(map.get(WorldMapLayer::Obstacle, 1, 2), 1);
        assert_eq!(map.get(WorldMapLayer::Sample, 1, 2), 2);
        assert_eq!(map.get(WorldMapLayer::Navigable, 1, 2), 0);
    }

    #[test]
    fn test_serialised_round_trip() -> Result<(), serde_json::Error> {
        let mut map = WorldMap::new(4);
        map.accumulate(WorldMapLayer::Sample, &[(0, 3), (2, 1)]);

        let json = serde_json::to_string(&map)?;
        let restored: WorldMap = serde_json::from_str(&json)?;

        assert_eq!(restored, map);

        Ok(())
    }
}
