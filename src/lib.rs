//! Tower Defense - Procedural Terrain Core
//!
//! Deterministic level terrain for the tower defense map:
//! - Edge-to-center path carving
//! - Wave Function Collapse tile solve with retry + fallback
//! - Height field and blended ground mesh, path decal mesh
//! - World-space path polylines for placement and spawn systems
//! - Bevy plugin (meshes, materials, rapier collider)
//! - FFI bridge for engine integration

pub mod bridge;
pub mod config;
pub mod constants;
pub mod generation;
pub mod logging;
pub mod mesh;
pub mod render;

pub use config::{SeedMode, TerrainConfig, TileHeights};
pub use generation::{GenerationOutcome, GenerationReport, Terrain, TerrainGenerator};
