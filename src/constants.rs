//! Centralized tunables for terrain generation.
//!
//! Defaults for the config layer live here so the generator, the FFI bridge
//! and the tests agree on one set of numbers.

// =====================================================
// Grid
// =====================================================

/// Default grid width in cells
pub const DEFAULT_GRID_WIDTH: usize = 25;

/// Default grid height in cells
pub const DEFAULT_GRID_HEIGHT: usize = 25;

/// Smallest grid dimension accepted after clamping (always odd)
pub const MIN_GRID_DIMENSION: usize = 5;

/// Largest grid dimension accepted after clamping (always odd, fits in i32)
pub const MAX_GRID_DIMENSION: usize = 255;

/// Default world units per cell
pub const DEFAULT_CELL_SIZE: f32 = 1.0;

/// Smallest cell size accepted after clamping
pub const MIN_CELL_SIZE: f32 = 0.5;

// =====================================================
// Paths
// =====================================================

/// Minimum number of edge-to-center paths
pub const MIN_PATH_COUNT: usize = 3;

/// Start-cell attempts per requested path before the carver gives up
pub const PATH_START_ATTEMPT_FACTOR: usize = 12;

/// Height of the path decal above the ground surface (avoids z-fighting)
pub const DEFAULT_PATH_OVERLAY_HEIGHT: f32 = 0.02;

// =====================================================
// Solver
// =====================================================

/// Default number of carve+solve attempts before the fallback terrain
pub const DEFAULT_MAX_RETRIES: u32 = 8;

/// Seed stride between attempts: attempt seed = base + attempt * stride
pub const RETRY_SEED_STRIDE: u64 = 97;

/// Mask applied to time-derived seeds (keeps them in positive i32 range)
pub const TIME_SEED_MASK: u64 = 0x7fff_ffff;

// =====================================================
// Heights
// =====================================================

pub const DEFAULT_GRASS_HEIGHT: f32 = 0.0;
pub const DEFAULT_DIRT_HEIGHT: f32 = 0.03;
pub const DEFAULT_ROCK_HEIGHT: f32 = 0.2;

// =====================================================
// Placement
// =====================================================

/// Offset added to the last seed for placement systems that need a
/// correlated but independent random stream
pub const PLACEMENT_SEED_OFFSET: u64 = 1337;
