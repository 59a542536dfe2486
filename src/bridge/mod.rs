//! FFI Bridge Layer: terrain core <-> engine clients
//!
//! C-ABI functions for engines that load the core as a DLL.
//! Data is serialized as JSON across the boundary.
//! Functions returning `*mut c_char` hand over heap-allocated strings; the caller must free them with `free_string`.

use serde::{Deserialize, Serialize};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use crate::config::TerrainConfig;
use crate::generation::{GenerationOutcome, Terrain, TerrainGenerator};

// ========================
// Data transfer types
// ========================

/// Generated terrain for engine-side rendering and placement
#[derive(Debug, Serialize, Deserialize)]
pub struct TerrainSnapshot {
    pub width: usize,
    pub height: usize,
    pub cell_size: f32,
    pub seed: u64,
    pub attempt_seed: u64,
    pub outcome: String,
    /// TileType ids, `[y][x]`
    pub tiles: Vec<Vec<u8>>,
    /// Cell heights, `[y][x]`
    pub heights: Vec<Vec<f32>>,
    pub paths: Vec<Vec<(i32, i32)>>,
    pub paths_world: Vec<Vec<[f32; 3]>>,
    pub ground_vertex_count: usize,
    pub path_vertex_count: usize,
}

impl From<&Terrain> for TerrainSnapshot {
    fn from(terrain: &Terrain) -> Self {
        let report = terrain.report();
        Self {
            width: terrain.width(),
            height: terrain.height(),
            cell_size: terrain.cell_size(),
            seed: report.base_seed,
            attempt_seed: report.attempt_seed,
            outcome: match report.outcome {
                GenerationOutcome::Solved { .. } => "Solved".to_string(),
                GenerationOutcome::Fallback => "Fallback".to_string(),
            },
            tiles: terrain.tiles().map(|t| t.to_id()).to_rows(),
            heights: terrain.heights().as_grid().to_rows(),
            paths: terrain
                .paths()
                .iter()
                .map(|p| p.cells.iter().map(|c| (c.x, c.y)).collect())
                .collect(),
            paths_world: terrain
                .paths_world()
                .iter()
                .map(|p| p.iter().map(|v| v.to_array()).collect())
                .collect(),
            ground_vertex_count: terrain.ground_mesh().vertex_count(),
            path_vertex_count: terrain.path_mesh().vertex_count(),
        }
    }
}

impl TerrainSnapshot {
    pub fn is_path_cell(&self, x: i32, y: i32) -> bool {
        self.paths.iter().any(|p| p.contains(&(x, y)))
    }
}

// ========================
// Helper: safe JSON return
// ========================

fn json_to_cstring<T: Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => CString::new(json).unwrap_or_default().into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

fn parse_cstr(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_owned()) }
}

// ========================
// C-ABI: Core
// ========================

/// Version string
#[no_mangle]
pub extern "C" fn get_version() -> *mut c_char {
    CString::new(env!("CARGO_PKG_VERSION"))
        .unwrap_or_default()
        .into_raw()
}

/// Free a string allocated by Rust.
/// Called from C; ptr must be from a prior Rust FFI allocation or null.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            drop(CString::from_raw(ptr));
        }
    }
}

// ========================
// C-ABI: Terrain Generation
// ========================

/// Default configuration as JSON
#[no_mangle]
pub extern "C" fn terrain_default_config() -> *mut c_char {
    json_to_cstring(&TerrainConfig::default())
}

/// Generate terrain from a config JSON and return the snapshot JSON.
/// Missing fields take their defaults; null on null or malformed input.
#[no_mangle]
pub extern "C" fn generate_terrain(config_json: *const c_char) -> *mut c_char {
    let json_str = match parse_cstr(config_json) {
        Some(s) => s,
        None => return std::ptr::null_mut(),
    };
    let config = match TerrainConfig::from_json_str(&json_str) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "generate_terrain: invalid config");
            return std::ptr::null_mut();
        }
    };

    let generator = TerrainGenerator::new(config);
    json_to_cstring(&TerrainSnapshot::from(generator.terrain()))
}

/// Generate terrain with an explicit seed and grid size (other options default)
#[no_mangle]
pub extern "C" fn generate_terrain_seeded(seed: u64, width: u32, height: u32) -> *mut c_char {
    let config = TerrainConfig::default()
        .with_seed(seed)
        .with_size(width as usize, height as usize);
    let generator = TerrainGenerator::new(config);
    json_to_cstring(&TerrainSnapshot::from(generator.terrain()))
}

/// 1 if the cell is on a path in the given snapshot, 0 if not, -1 on bad input
#[no_mangle]
pub extern "C" fn terrain_is_path_cell(snapshot_json: *const c_char, x: i32, y: i32) -> i32 {
    let json_str = match parse_cstr(snapshot_json) {
        Some(s) => s,
        None => return -1,
    };
    let snapshot: TerrainSnapshot = match serde_json::from_str(&json_str) {
        Ok(s) => s,
        Err(_) => return -1,
    };
    i32::from(snapshot.is_path_cell(x, y))
}
