use serde::{Deserialize, Serialize};

/// Unique identifier of a load request. Ids are never reused while a request is live.
pub type RequestId = String;

/// Horizontal chunk coordinate (columns are loaded as a whole).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the given world position.
    pub fn from_world_pos(x: f64, z: f64, tile_width: f64) -> Self {
        Self {
            x: (x / tile_width).floor() as i32,
            z: (z / tile_width).floor() as i32,
        }
    }

    /// World-space center of this chunk.
    pub fn center(&self, tile_width: f64) -> (f64, f64) {
        (
            (self.x as f64 + 0.5) * tile_width,
            (self.z as f64 + 0.5) * tile_width,
        )
    }

    /// Euclidean distance in world units between a world position and this chunk's center.
    pub fn distance_from(&self, x: f64, z: f64, tile_width: f64) -> f64 {
        let (cx, cz) = self.center(tile_width);
        ((cx - x).powi(2) + (cz - z).powi(2)).sqrt()
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_world_pos_floors_negative() {
        assert_eq!(ChunkCoord::from_world_pos(-0.5, 17.0, 16.0), ChunkCoord::new(-1, 1));
        assert_eq!(ChunkCoord::from_world_pos(15.9, 0.0, 16.0), ChunkCoord::new(0, 0));
    }

    #[test]
    fn distance_from_center() {
        let coord = ChunkCoord::new(0, 0);
        assert_eq!(coord.distance_from(8.0, 8.0, 16.0), 0.0);

        let far = ChunkCoord::new(3, 4);
        // center (56, 72) from (8, 8): dx=48, dz=64 -> 80
        assert!((far.distance_from(8.0, 8.0, 16.0) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn display() {
        assert_eq!(ChunkCoord::new(-2, 5).to_string(), "(-2, 5)");
    }
}
