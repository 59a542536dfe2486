//! Terrain generation pipeline.
//!
//! ```text
//! config --clamp--> base seed
//!     attempt k (seed = base + k * 97):
//!         carve paths --> WFC solve --ok--> tiles
//!                                   --contradiction--> next attempt
//!     all attempts failed --> fallback tiles (paths carved at base seed)
//! tiles --> height field --> ground mesh + path decal + path cache --> publish
//! ```
//!
//! A pass always yields usable terrain. The previous [`Terrain`] stays
//! visible until the new one is fully built, then is replaced wholesale.

pub mod grid;
pub mod path_cache;
pub mod paths;
pub mod tiles;
pub mod wfc;

use bevy::math::Vec3;
use bevy::prelude::Resource;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::config::TerrainConfig;
use crate::constants::{PLACEMENT_SEED_OFFSET, RETRY_SEED_STRIDE};
use crate::logging::TimingSpan;
use crate::mesh::{self, GridFrame, HeightField, TerrainMesh};
use grid::{Cell, Grid, GridSize};
use path_cache::PathCache;
use paths::{carve_paths, Path};
use tiles::{TileRules, TileType};

/// Deterministic RNG used for every random decision in a pass
pub type TerrainRng = Xoshiro256PlusPlus;

/// How the published tiles were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationOutcome {
    /// Solver succeeded on this zero-based attempt
    Solved { attempt: u32 },
    /// Every attempt hit a contradiction
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub base_seed: u64,
    /// Seed of the attempt whose tiles were published
    pub attempt_seed: u64,
    pub attempts: u32,
    pub outcome: GenerationOutcome,
}

/// Seed for attempt `attempt` of a pass started from `base`
pub fn attempt_seed(base: u64, attempt: u32) -> u64 {
    base.wrapping_add(u64::from(attempt).wrapping_mul(RETRY_SEED_STRIDE))
}

/// Everything one generation pass produces. Read-only once built.
#[derive(Debug, Clone)]
pub struct Terrain {
    config: TerrainConfig,
    frame: GridFrame,
    tiles: Grid<TileType>,
    heights: HeightField,
    paths: Vec<Path>,
    path_mask: Grid<bool>,
    ground_mesh: TerrainMesh,
    path_mesh: TerrainMesh,
    path_cache: PathCache,
    report: GenerationReport,
}

impl Terrain {
    /// Run the full carve, solve and build pipeline. Never fails.
    pub fn build(config: &TerrainConfig, rules: &TileRules) -> Self {
        let _timing = TimingSpan::new("terrain_generate");
        let config = config.clamped();
        let size = GridSize::new(config.width, config.height);
        let base_seed = config.seed.resolve();

        let (tiles, paths, report) = solve_with_retries(size, &config, rules, base_seed);

        let frame = GridFrame {
            size,
            cell_size: config.cell_size,
        };
        let heights = HeightField::from_tiles(&tiles, &config.heights);
        let ground_mesh = mesh::build_ground_mesh(frame, &heights);
        let path_mesh =
            mesh::build_path_decal_mesh(frame, &paths, &heights, config.path_overlay_height);
        let path_cache = PathCache::build(frame, Vec3::from_array(config.origin), &paths, &heights);

        let mut path_mask = Grid::filled(size, false);
        for cell in paths.iter().flat_map(|p| p.cells.iter()) {
            path_mask.set(*cell, true);
        }

        match report.outcome {
            GenerationOutcome::Solved { attempt } => tracing::info!(
                seed = base_seed,
                attempt,
                width = size.width,
                height = size.height,
                paths = paths.len(),
                "terrain generated"
            ),
            GenerationOutcome::Fallback => tracing::warn!(
                seed = base_seed,
                attempts = report.attempts,
                "terrain solver exhausted retries, using fallback terrain"
            ),
        }

        Self {
            config,
            frame,
            tiles,
            heights,
            paths,
            path_mask,
            ground_mesh,
            path_mesh,
            path_cache,
            report,
        }
    }

    /// Effective (clamped) configuration of this pass
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn size(&self) -> GridSize {
        self.frame.size
    }

    pub fn width(&self) -> usize {
        self.frame.size.width
    }

    pub fn height(&self) -> usize {
        self.frame.size.height
    }

    pub fn cell_size(&self) -> f32 {
        self.frame.cell_size
    }

    pub fn tiles(&self) -> &Grid<TileType> {
        &self.tiles
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<TileType> {
        self.tiles.get(Cell::new(x, y)).copied()
    }

    pub fn heights(&self) -> &HeightField {
        &self.heights
    }

    /// Carved paths in grid coordinates
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn is_path_cell(&self, x: i32, y: i32) -> bool {
        self.path_mask.get(Cell::new(x, y)).copied().unwrap_or(false)
    }

    /// World position of a cell center at its resolved height
    pub fn cell_world_position(&self, x: i32, y: i32) -> Option<Vec3> {
        let cell = Cell::new(x, y);
        let h = self.heights.at(cell)?;
        Some(self.origin() + self.frame.cell_center(cell, h))
    }

    pub fn origin(&self) -> Vec3 {
        Vec3::from_array(self.config.origin)
    }

    /// World position of the center cell's reference point (the grid origin)
    pub fn center_world(&self) -> Vec3 {
        self.origin()
    }

    pub fn paths_world(&self) -> &[Vec<Vec3>] {
        self.path_cache.paths()
    }

    pub fn path_cache(&self) -> &PathCache {
        &self.path_cache
    }

    pub fn ground_mesh(&self) -> &TerrainMesh {
        &self.ground_mesh
    }

    pub fn path_mesh(&self) -> &TerrainMesh {
        &self.path_mesh
    }

    pub fn report(&self) -> &GenerationReport {
        &self.report
    }

    /// Base seed of this pass
    pub fn last_seed_used(&self) -> u64 {
        self.report.base_seed
    }

    /// Seed for placement systems that want a stream correlated with,
    /// but independent of, the terrain
    pub fn placement_seed(&self) -> u64 {
        self.report.base_seed.wrapping_add(PLACEMENT_SEED_OFFSET)
    }

    /// Cells free for placement: not on a path and not the center, in scan order.
    /// May be empty; callers handle that case.
    pub fn placement_candidates(&self) -> Vec<Cell> {
        let center = self.frame.size.center();
        self.frame
            .size
            .cells()
            .filter(|c| *c != center && !self.is_path_cell(c.x, c.y))
            .collect()
    }
}

fn solve_with_retries(
    size: GridSize,
    config: &TerrainConfig,
    rules: &TileRules,
    base_seed: u64,
) -> (Grid<TileType>, Vec<Path>, GenerationReport) {
    for attempt in 0..config.max_retries {
        let seed = attempt_seed(base_seed, attempt);
        let mut rng = TerrainRng::seed_from_u64(seed);
        let paths = carve_paths(size, config.path_count, &mut rng);

        match wfc::solve(size, &paths, rules, &mut rng) {
            Ok(tiles) => {
                let report = GenerationReport {
                    base_seed,
                    attempt_seed: seed,
                    attempts: attempt + 1,
                    outcome: GenerationOutcome::Solved { attempt },
                };
                return (tiles, paths, report);
            }
            Err(contradiction) => {
                tracing::debug!(attempt, seed, %contradiction, "terrain attempt failed");
            }
        }
    }

    let mut rng = TerrainRng::seed_from_u64(base_seed);
    let paths = carve_paths(size, config.path_count, &mut rng);
    let tiles = wfc::fallback_tiles(size, &paths);
    let report = GenerationReport {
        base_seed,
        attempt_seed: base_seed,
        attempts: config.max_retries,
        outcome: GenerationOutcome::Fallback,
    };
    (tiles, paths, report)
}

/// Owns the configuration, the adjacency rules and the currently published
/// terrain. Constructing a generator runs the first pass.
#[derive(Resource, Debug, Clone)]
pub struct TerrainGenerator {
    config: TerrainConfig,
    rules: TileRules,
    terrain: Terrain,
}

impl Default for TerrainGenerator {
    fn default() -> Self {
        Self::new(TerrainConfig::default())
    }
}

impl TerrainGenerator {
    pub fn new(config: TerrainConfig) -> Self {
        Self::with_rules(config, TileRules::standard())
    }

    pub fn with_rules(config: TerrainConfig, rules: TileRules) -> Self {
        if !rules.is_symmetric() {
            tracing::debug!(
                pairs = ?rules.asymmetric_pairs(),
                "adjacency rules are not symmetric; solver uses the derived inverse"
            );
        }
        let terrain = Terrain::build(&config, &rules);
        Self {
            config,
            rules,
            terrain,
        }
    }

    /// Rebuild from the current configuration and publish the result
    pub fn generate(&mut self) -> &Terrain {
        self.terrain = Terrain::build(&self.config, &self.rules);
        &self.terrain
    }

    /// Replace the configuration, then rebuild
    pub fn generate_with(&mut self, config: TerrainConfig) -> &Terrain {
        self.config = config;
        self.generate()
    }

    /// Configuration as supplied (before clamping)
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn rules(&self) -> &TileRules {
        &self.rules
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn width(&self) -> usize {
        self.terrain.width()
    }

    pub fn height(&self) -> usize {
        self.terrain.height()
    }

    pub fn is_path_cell(&self, x: i32, y: i32) -> bool {
        self.terrain.is_path_cell(x, y)
    }

    pub fn cell_world_position(&self, x: i32, y: i32) -> Option<Vec3> {
        self.terrain.cell_world_position(x, y)
    }

    pub fn paths_world(&self) -> &[Vec<Vec3>] {
        self.terrain.paths_world()
    }

    pub fn last_seed_used(&self) -> u64 {
        self.terrain.last_seed_used()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiles::TileSet;

    fn always_contradicts() -> TileRules {
        use TileType::*;
        TileRules::from_allowed([
            TileSet::of(&[Grass, Dirt, Rock]),
            TileSet::of(&[Grass, Dirt, Rock]),
            TileSet::of(&[Grass, Dirt, Rock]),
            TileSet::of(&[Grass, Dirt, Path]),
        ])
    }

    #[test]
    fn test_attempt_seed_stride() {
        assert_eq!(attempt_seed(10, 0), 10);
        assert_eq!(attempt_seed(10, 3), 10 + 3 * 97);
        assert_eq!(attempt_seed(u64::MAX, 1), 96);
    }

    #[test]
    fn test_standard_rules_solve_first_attempt() {
        let gen = TerrainGenerator::new(TerrainConfig::default().with_seed(42));
        assert_eq!(
            gen.terrain().report().outcome,
            GenerationOutcome::Solved { attempt: 0 }
        );
        assert_eq!(gen.terrain().report().attempt_seed, 42);
        assert_eq!(gen.last_seed_used(), 42);
    }

    #[test]
    fn test_fallback_when_rules_always_contradict() {
        let mut cfg = TerrainConfig::default().with_seed(7).with_size(9, 9);
        cfg.max_retries = 2;
        let gen = TerrainGenerator::with_rules(cfg, always_contradicts());
        let terrain = gen.terrain();

        assert_eq!(terrain.report().outcome, GenerationOutcome::Fallback);
        assert_eq!(terrain.report().attempts, 2);
        assert_eq!(terrain.last_seed_used(), 7);
        for (cell, tile) in terrain.tiles().iter() {
            let expected = if terrain.is_path_cell(cell.x, cell.y) {
                TileType::Path
            } else {
                TileType::Grass
            };
            assert_eq!(*tile, expected);
        }
    }

    #[test]
    fn test_fallback_paths_match_first_attempt_layout() {
        // Fallback re-carves at the base seed, which is attempt 0's seed
        let mut cfg = TerrainConfig::default().with_seed(19).with_size(11, 11);
        cfg.max_retries = 1;
        let failing = TerrainGenerator::with_rules(cfg.clone(), always_contradicts());
        let solved = TerrainGenerator::new(cfg);
        assert_eq!(failing.terrain().paths(), solved.terrain().paths());
    }

    /// Dirt never lists Rock, so some collapses contradict and others don't
    fn one_sided_rules() -> TileRules {
        use TileType::*;
        TileRules::from_allowed([
            TileSet::of(&[Grass, Dirt, Rock, Path]),
            TileSet::of(&[Grass, Dirt, Path]),
            TileSet::of(&[Grass, Dirt, Rock, Path]),
            TileSet::of(&[Grass, Dirt, Rock, Path]),
        ])
    }

    #[test]
    fn test_retry_solves_with_fresh_layout() {
        let rules = one_sided_rules();
        let size = GridSize::new(5, 5);

        let retried = (0..200u64).find_map(|seed| {
            let cfg = TerrainConfig::default().with_seed(seed).with_size(5, 5);
            let terrain = Terrain::build(&cfg, &rules);
            let first_layout = carve_paths(size, 3, &mut TerrainRng::seed_from_u64(seed));
            match terrain.report().outcome {
                GenerationOutcome::Solved { attempt }
                    if attempt > 0 && terrain.paths() != first_layout.as_slice() =>
                {
                    Some((seed, attempt, terrain, first_layout))
                }
                _ => None,
            }
        });
        let (seed, attempt, terrain, first_layout) =
            retried.expect("some seed should need a retry");

        let report = terrain.report();
        assert_eq!(report.base_seed, seed);
        assert_eq!(report.attempt_seed, seed + u64::from(attempt) * RETRY_SEED_STRIDE);
        assert_eq!(report.attempts, attempt + 1);
        assert_eq!(terrain.last_seed_used(), seed);

        // attempt 0 really contradicted
        let mut rng = TerrainRng::seed_from_u64(seed);
        let paths = carve_paths(size, 3, &mut rng);
        assert_eq!(paths, first_layout);
        assert!(wfc::solve(size, &paths, &rules, &mut rng).is_err());

        // published paths come from the winning attempt's seed
        let winning = carve_paths(size, 3, &mut TerrainRng::seed_from_u64(report.attempt_seed));
        assert_eq!(terrain.paths(), winning.as_slice());
        for cell in winning.iter().flat_map(|p| p.cells.iter()) {
            assert_eq!(terrain.tile(cell.x, cell.y), Some(TileType::Path));
        }
    }

    #[test]
    fn test_regenerate_replaces_output() {
        let mut gen = TerrainGenerator::new(TerrainConfig::default().with_seed(1).with_size(9, 9));
        let first = gen.terrain().tiles().clone();
        gen.generate_with(TerrainConfig::default().with_seed(1).with_size(15, 15));
        assert_eq!(gen.width(), 15);
        assert_ne!(gen.terrain().tiles(), &first);
        assert_eq!(gen.terrain().ground_mesh().vertex_count(), 16 * 16);
    }

    #[test]
    fn test_placement_candidates_exclude_paths_and_center() {
        let gen = TerrainGenerator::new(TerrainConfig::default().with_seed(3).with_size(9, 9));
        let terrain = gen.terrain();
        let candidates = terrain.placement_candidates();
        let center = terrain.size().center();
        assert!(!candidates.contains(&center));
        assert!(candidates.iter().all(|c| !terrain.is_path_cell(c.x, c.y)));
        let path_cells = terrain.tiles().as_slice().iter().filter(|t| t.is_path()).count();
        assert_eq!(candidates.len(), 81 - path_cells);
        assert_eq!(terrain.placement_seed(), 3 + PLACEMENT_SEED_OFFSET);
    }

    #[test]
    fn test_out_of_range_queries() {
        let gen = TerrainGenerator::new(TerrainConfig::default().with_seed(5));
        assert!(!gen.is_path_cell(-1, 0));
        assert!(!gen.is_path_cell(0, 25));
        assert!(gen.cell_world_position(25, 0).is_none());
        assert!(gen.cell_world_position(0, -1).is_none());
    }
}
