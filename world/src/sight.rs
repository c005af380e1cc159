//! Line-of-sight tests against the static wall layer.

use glam::Vec2;

use crate::{geometry::LevelGeometry, grid::world_to_cell};

/// Fraction of a tile travelled between two samples along a sight ray.
const SAMPLE_STEP: f32 = 0.25;

/// Reports whether a straight ray between two world positions avoids walls.
///
/// The ray is sampled every quarter tile. Samples outside the grid block the
/// ray. Agents, barricades and doors never block sight.
#[must_use]
pub fn line_of_sight(geometry: &LevelGeometry, from: Vec2, to: Vec2) -> bool {
    let tile_size = geometry.tile_size();
    let step = tile_size * SAMPLE_STEP;
    if step <= 0.0 || !from.is_finite() || !to.is_finite() {
        return false;
    }

    let samples = (from.distance(to) / step).ceil().max(1.0) as u32;
    (0..=samples).all(|sample| {
        let point = from.lerp(to, sample as f32 / samples as f32);
        world_to_cell(point, tile_size, geometry.columns(), geometry.rows())
            .is_some_and(|cell| !geometry.is_wall(cell))
    })
}

/// Per-agent cache of the most recent sight test.
///
/// The answer is reused only for the exact same pair of endpoints; the wall
/// layer never changes after a level loads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SightLine {
    endpoints: Option<(Vec2, Vec2)>,
    clear: bool,
}

impl SightLine {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tests sight between two positions, reusing the cached answer when possible.
    pub fn check(&mut self, geometry: &LevelGeometry, from: Vec2, to: Vec2) -> bool {
        if self.endpoints == Some((from, to)) {
            return self.clear;
        }
        self.endpoints = Some((from, to));
        self.clear = line_of_sight(geometry, from, to);
        self.clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> LevelGeometry {
        let (geometry, _) =
            LevelGeometry::from_ascii(["......", "..#...", "......"], 10.0).expect("map parses");
        geometry
    }

    #[test]
    fn walls_block_sight() {
        let geometry = corridor();
        assert!(!line_of_sight(
            &geometry,
            Vec2::new(5.0, 15.0),
            Vec2::new(55.0, 15.0)
        ));
        assert!(line_of_sight(
            &geometry,
            Vec2::new(5.0, 5.0),
            Vec2::new(55.0, 5.0)
        ));
    }

    #[test]
    fn rays_leaving_the_grid_are_blocked() {
        let geometry = corridor();
        assert!(!line_of_sight(
            &geometry,
            Vec2::new(5.0, 5.0),
            Vec2::new(-20.0, 5.0)
        ));
    }

    #[test]
    fn cache_answers_each_ray_on_its_own() {
        let (geometry, _) = LevelGeometry::from_ascii([".#.", "..."], 10.0).expect("map parses");
        let mut sight = SightLine::new();

        assert!(sight.check(&geometry, Vec2::new(1.0, 9.0), Vec2::new(29.0, 19.0)));
        assert!(sight.check(&geometry, Vec2::new(1.0, 9.0), Vec2::new(29.0, 19.0)));
        assert!(
            !sight.check(&geometry, Vec2::new(9.0, 1.0), Vec2::new(21.0, 11.0)),
            "same cells, but this ray clips the wall"
        );
    }
}
