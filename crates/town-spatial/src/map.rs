//! Static tile map: dimensions, object-occupancy grid, and named regions.

use std::collections::HashMap;

use town_core::Point;

/// A tile map. `objects[y * width + x] == -1` means walkable; any other
/// value means the tile is occupied (spec §3 "object-occupancy grid").
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Map {
    pub width: usize,
    pub height: usize,
    objects: Vec<i32>,
    /// Named tile regions (e.g. "plaza", "cafe"). Not consulted by the core
    /// pathfinder or engine; present so `Map` is a complete tile-map
    /// representation for callers that need named-area queries.
    pub regions: HashMap<String, Vec<(usize, usize)>>,
}

impl Map {
    /// An all-walkable map of the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, objects: vec![-1; width * height], regions: HashMap::new() }
    }

    /// Construct from an explicit object grid (row-major, `y * width + x`).
    pub fn from_objects(width: usize, height: usize, objects: Vec<i32>) -> Self {
        assert_eq!(objects.len(), width * height, "object grid size mismatch");
        Self { width, height, objects, regions: HashMap::new() }
    }

    pub fn set_blocked(&mut self, x: usize, y: usize, value: i32) {
        let idx = y * self.width + x;
        self.objects[idx] = value;
    }

    /// `true` if `p` falls within the map's continuous bounds (off-grid
    /// starting positions are allowed, so this checks the full `[0,
    /// width-1] x [0, height-1]` range, not just integer cells).
    pub fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0.0
            && p.x <= (self.width.saturating_sub(1)) as f64
            && p.y >= 0.0
            && p.y <= (self.height.saturating_sub(1)) as f64
    }

    /// `true` if the object-occupancy cell nearest `p` is non-walkable.
    /// Pathfinder neighbours are always exact grid cells, so the rounding
    /// here only matters for an off-grid starting position.
    pub fn is_blocked(&self, p: Point) -> bool {
        if !self.in_bounds(p) {
            return true;
        }
        let x = p.x.round() as usize;
        let y = p.y.round() as usize;
        self.objects[y * self.width + x] != -1
    }
}
