//! World-space path polylines for placement and spawn consumers.

use bevy::math::Vec3;

use super::paths::Path;
use crate::mesh::{GridFrame, HeightField};

/// One world-space point list per carved path.
///
/// Points sit at the cell's own height, not the blended vertex height the
/// ground mesh uses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathCache {
    paths: Vec<Vec<Vec3>>,
}

impl PathCache {
    pub fn build(frame: GridFrame, origin: Vec3, paths: &[Path], heights: &HeightField) -> Self {
        let paths = paths
            .iter()
            .filter(|p| !p.is_empty())
            .map(|path| {
                path.cells
                    .iter()
                    .map(|cell| {
                        let y = heights.at(*cell).unwrap_or(0.0);
                        origin + frame.cell_center(*cell, y)
                    })
                    .collect()
            })
            .collect();
        Self { paths }
    }

    pub fn paths(&self) -> &[Vec<Vec3>] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TileHeights;
    use crate::generation::grid::{Cell, Grid, GridSize};
    use crate::generation::tiles::TileType;

    #[test]
    fn test_points_use_cell_height_and_origin() {
        let size = GridSize::new(5, 5);
        let mut tiles = Grid::filled(size, TileType::Grass);
        tiles.set(Cell::new(2, 1), TileType::Rock);
        let heights = HeightField::from_tiles(
            &tiles,
            &TileHeights {
                grass: 0.0,
                dirt: 0.5,
                rock: 2.0,
            },
        );
        let frame = GridFrame {
            size,
            cell_size: 2.0,
        };
        let path = Path {
            cells: vec![Cell::new(2, 0), Cell::new(2, 1), Cell::new(2, 2)],
        };
        let cache = PathCache::build(frame, Vec3::new(10.0, 1.0, 0.0), &[path], &heights);

        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.paths()[0],
            vec![
                Vec3::new(10.0, 1.0, -4.0),
                Vec3::new(10.0, 3.0, -2.0),
                Vec3::new(10.0, 1.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_empty_paths_are_skipped() {
        let size = GridSize::new(5, 5);
        let heights = HeightField::from_tiles(&Grid::filled(size, TileType::Grass), &TileHeights::default());
        let frame = GridFrame {
            size,
            cell_size: 1.0,
        };
        let cache = PathCache::build(frame, Vec3::ZERO, &[Path { cells: vec![] }], &heights);
        assert!(cache.is_empty());
    }
}
