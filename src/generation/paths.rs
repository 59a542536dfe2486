//! Edge-to-center path carving.
//!
//! Each path starts on a random boundary cell and walks orthogonally toward
//! the center, choosing uniformly between the x and y step while both still
//! reduce the distance. Paths may overlap and all end on the center cell.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::grid::{Cell, GridSize};
use crate::constants::PATH_START_ATTEMPT_FACTOR;

/// Ordered cells from a boundary cell to the center, inclusive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    pub cells: Vec<Cell>,
}

impl Path {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn start(&self) -> Option<Cell> {
        self.cells.first().copied()
    }

    pub fn end(&self) -> Option<Cell> {
        self.cells.last().copied()
    }
}

/// Carve up to `path_count` paths with distinct start cells.
///
/// Gives up after `path_count * 12` start attempts, so small grids may
/// return fewer paths than requested.
pub fn carve_paths<R: Rng + ?Sized>(size: GridSize, path_count: usize, rng: &mut R) -> Vec<Path> {
    let center = size.center();
    let mut paths = Vec::with_capacity(path_count);
    let mut used_starts = HashSet::new();
    let mut attempts = 0;

    while paths.len() < path_count && attempts < path_count * PATH_START_ATTEMPT_FACTOR {
        attempts += 1;
        let start = random_edge_cell(size, rng);
        if !used_starts.insert(start) {
            continue;
        }
        paths.push(walk_to_center(start, center, rng));
    }

    paths
}

/// Uniform side, then uniform coordinate along it
fn random_edge_cell<R: Rng + ?Sized>(size: GridSize, rng: &mut R) -> Cell {
    let w = size.width as i32;
    let h = size.height as i32;
    match rng.gen_range(0..4) {
        0 => Cell::new(0, rng.gen_range(0..h)),
        1 => Cell::new(w - 1, rng.gen_range(0..h)),
        2 => Cell::new(rng.gen_range(0..w), 0),
        _ => Cell::new(rng.gen_range(0..w), h - 1),
    }
}

fn walk_to_center<R: Rng + ?Sized>(start: Cell, center: Cell, rng: &mut R) -> Path {
    let mut cells = Vec::with_capacity(start.manhattan(center) as usize + 1);
    let mut current = start;
    cells.push(current);

    while current != center {
        let dx = (center.x - current.x).signum();
        let dy = (center.y - current.y).signum();

        let step = match (dx, dy) {
            (0, dy) => (0, dy),
            (dx, 0) => (dx, 0),
            (dx, dy) => {
                if rng.gen_range(0..2) == 0 {
                    (dx, 0)
                } else {
                    (0, dy)
                }
            }
        };

        current = Cell::new(current.x + step.0, current.y + step.1);
        cells.push(current);
    }

    Path { cells }
}
