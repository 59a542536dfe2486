//! Wave Function Collapse tile solver.
//!
//! Every cell holds a domain of still-possible tiles. Path cells start as
//! `{Path}`, everything else as `{Grass, Dirt, Rock}`. The solver propagates
//! from the forced cells, then repeatedly collapses the most constrained
//! unresolved cell and propagates from it. There is no backtracking: the
//! first empty domain fails the whole attempt and the caller retries with
//! a fresh seed and a fresh path layout.

use rand::Rng;
use std::collections::VecDeque;
use thiserror::Error;

use super::grid::{Cell, Grid, GridSize};
use super::paths::Path;
use super::tiles::{TileRules, TileSet, TileType};

/// Solver phase in which a contradiction surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolvePhase {
    InitialPropagation,
    Collapse,
}

/// A cell's domain became empty; the attempt is abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("contradiction at ({}, {}) during {phase:?}", cell.x, cell.y)]
pub struct Contradiction {
    pub cell: Cell,
    pub phase: SolvePhase,
}

/// Per-cell domains for one solver attempt
#[derive(Debug, Clone)]
struct Domains {
    grid: Grid<TileSet>,
}

impl Domains {
    /// Path cells are forced to `{Path}`; free cells may never become Path
    fn seeded(size: GridSize, paths: &[Path]) -> Self {
        let mut grid = Grid::filled(size, TileSet::GROUND);
        for cell in paths.iter().flat_map(|p| p.cells.iter()) {
            grid.set(*cell, TileSet::PATH);
        }
        Self { grid }
    }

    fn get(&self, cell: Cell) -> TileSet {
        self.grid.get(cell).copied().unwrap_or(TileSet::EMPTY)
    }

    fn is_resolved(&self) -> bool {
        self.grid.as_slice().iter().all(|d| d.len() == 1)
    }

    /// Narrow neighbours of every queued cell until nothing changes.
    fn propagate(
        &mut self,
        rules: &TileRules,
        queue: &mut VecDeque<Cell>,
        phase: SolvePhase,
    ) -> Result<(), Contradiction> {
        let size = self.grid.size();
        while let Some(cell) = queue.pop_front() {
            let allowed = rules.neighbor_mask(self.get(cell));

            for neighbor in size.neighbors(cell) {
                let Some(domain) = self.grid.get_mut(neighbor) else {
                    continue;
                };
                let narrowed = domain.intersection(allowed);
                if narrowed == *domain {
                    continue;
                }
                if narrowed.is_empty() {
                    return Err(Contradiction {
                        cell: neighbor,
                        phase,
                    });
                }
                *domain = narrowed;
                queue.push_back(neighbor);
            }
        }
        Ok(())
    }

    /// Smallest domain with more than one option, first in scan order.
    ///
    /// `Err` if any domain is empty, `Ok(None)` once everything is resolved.
    fn lowest_entropy(&self) -> Result<Option<Cell>, Contradiction> {
        let mut best: Option<(usize, Cell)> = None;
        for (cell, domain) in self.grid.iter() {
            let count = domain.len();
            if count == 0 {
                return Err(Contradiction {
                    cell,
                    phase: SolvePhase::Collapse,
                });
            }
            if count == 1 {
                continue;
            }
            if best.map_or(true, |(c, _)| count < c) {
                best = Some((count, cell));
            }
        }
        Ok(best.map(|(_, cell)| cell))
    }

    fn into_tiles(self) -> Grid<TileType> {
        self.grid
            .map(|domain| domain.resolved().unwrap_or(TileType::Grass))
    }
}

/// Assign one tile per cell consistent with the forced path cells and the
/// adjacency rules, or report the first contradiction.
pub fn solve<R: Rng + ?Sized>(
    size: GridSize,
    paths: &[Path],
    rules: &TileRules,
    rng: &mut R,
) -> Result<Grid<TileType>, Contradiction> {
    let mut domains = Domains::seeded(size, paths);

    let mut queue: VecDeque<Cell> = size
        .cells()
        .filter(|c| domains.get(*c).len() == 1)
        .collect();
    domains.propagate(rules, &mut queue, SolvePhase::InitialPropagation)?;

    while let Some(cell) = domains.lowest_entropy()? {
        let domain = domains.get(cell);
        let pick = rng.gen_range(0..domain.len());
        let Some(tile) = domain.nth(pick) else {
            break;
        };
        domains.grid.set(cell, TileSet::single(tile));

        queue.clear();
        queue.push_back(cell);
        domains.propagate(rules, &mut queue, SolvePhase::Collapse)?;
    }

    debug_assert!(domains.is_resolved());
    Ok(domains.into_tiles())
}

/// All grass except carved path cells
pub fn fallback_tiles(size: GridSize, paths: &[Path]) -> Grid<TileType> {
    let mut tiles = Grid::filled(size, TileType::Grass);
    for cell in paths.iter().flat_map(|p| p.cells.iter()) {
        tiles.set(*cell, TileType::Path);
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::paths::carve_paths;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn rng(seed: u64) -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(seed)
    }

    fn assert_adjacency(tiles: &Grid<TileType>, rules: &TileRules) {
        let size = tiles.size();
        for (cell, tile) in tiles.iter() {
            for n in size.neighbors(cell) {
                let other = *tiles.get(n).unwrap();
                assert!(
                    rules.permits(*tile, other),
                    "{:?} at {:?} next to {:?} at {:?}",
                    tile,
                    cell,
                    other,
                    n
                );
            }
        }
    }

    #[test]
    fn test_solve_respects_paths_and_rules() {
        let size = GridSize::new(15, 15);
        let rules = TileRules::standard();
        let mut r = rng(11);
        let paths = carve_paths(size, 4, &mut r);
        let tiles = solve(size, &paths, &rules, &mut r).expect("standard rules never contradict");

        for cell in paths.iter().flat_map(|p| p.cells.iter()) {
            assert_eq!(tiles.get(*cell), Some(&TileType::Path));
        }
        assert_adjacency(&tiles, &rules);
    }

    #[test]
    fn test_free_cells_never_become_path() {
        let size = GridSize::new(9, 9);
        let rules = TileRules::standard();
        let mut r = rng(2);
        let paths = carve_paths(size, 3, &mut r);
        let tiles = solve(size, &paths, &rules, &mut r).unwrap();
        let forced: std::collections::HashSet<_> =
            paths.iter().flat_map(|p| p.cells.iter().copied()).collect();
        for (cell, tile) in tiles.iter() {
            assert_eq!(tile.is_path(), forced.contains(&cell));
        }
    }

    #[test]
    fn test_rock_never_borders_path() {
        let size = GridSize::new(21, 21);
        let rules = TileRules::standard();
        for seed in 0..20 {
            let mut r = rng(seed);
            let paths = carve_paths(size, 3, &mut r);
            let tiles = solve(size, &paths, &rules, &mut r).unwrap();
            for (cell, tile) in tiles.iter() {
                if *tile != TileType::Path {
                    continue;
                }
                for n in size.neighbors(cell) {
                    assert_ne!(tiles.get(n), Some(&TileType::Rock));
                }
            }
        }
    }

    #[test]
    fn test_contradiction_in_initial_propagation() {
        // Nothing lists Path as an allowed neighbour except Path itself
        use TileType::*;
        let rules = TileRules::from_allowed([
            TileSet::of(&[Grass, Dirt, Rock]),
            TileSet::of(&[Grass, Dirt, Rock]),
            TileSet::of(&[Grass, Dirt, Rock]),
            TileSet::of(&[Path]),
        ]);
        let size = GridSize::new(7, 7);
        let mut r = rng(1);
        let paths = carve_paths(size, 3, &mut r);
        let err = solve(size, &paths, &rules, &mut r).unwrap_err();
        assert_eq!(err.phase, SolvePhase::InitialPropagation);
    }

    #[test]
    fn test_no_paths_still_resolves() {
        let size = GridSize::new(5, 5);
        let tiles = solve(size, &[], &TileRules::standard(), &mut rng(0)).unwrap();
        assert!(tiles.as_slice().iter().all(|t| !t.is_path()));
    }

    #[test]
    fn test_solve_is_deterministic() {
        let size = GridSize::new(13, 13);
        let rules = TileRules::standard();
        let run = |seed| {
            let mut r = rng(seed);
            let paths = carve_paths(size, 3, &mut r);
            solve(size, &paths, &rules, &mut r).unwrap()
        };
        assert_eq!(run(77), run(77));
    }

    #[test]
    fn test_fallback_tiles() {
        let size = GridSize::new(7, 7);
        let paths = carve_paths(size, 3, &mut rng(9));
        let tiles = fallback_tiles(size, &paths);
        for (cell, tile) in tiles.iter() {
            let on_path = paths.iter().any(|p| p.cells.contains(&cell));
            assert_eq!(*tile, if on_path { TileType::Path } else { TileType::Grass });
        }
    }
}
