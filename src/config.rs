//! Terrain configuration: defaults, clamping and file loading.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::constants::*;
use crate::generation::tiles::TileType;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Where the base seed of a generation pass comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedMode {
    Explicit(u64),
    TimeDerived,
}

impl Default for SeedMode {
    fn default() -> Self {
        Self::TimeDerived
    }
}

impl SeedMode {
    pub fn resolve(self) -> u64 {
        match self {
            Self::Explicit(seed) => seed,
            Self::TimeDerived => {
                let nanos = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_nanos() as u64)
                    .unwrap_or_default();
                nanos & TIME_SEED_MASK
            }
        }
    }
}

/// Height per tile type. Path shares the grass baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileHeights {
    pub grass: f32,
    pub dirt: f32,
    pub rock: f32,
}

impl Default for TileHeights {
    fn default() -> Self {
        Self {
            grass: DEFAULT_GRASS_HEIGHT,
            dirt: DEFAULT_DIRT_HEIGHT,
            rock: DEFAULT_ROCK_HEIGHT,
        }
    }
}

impl TileHeights {
    pub fn of(&self, tile: TileType) -> f32 {
        match tile {
            TileType::Dirt => self.dirt,
            TileType::Rock => self.rock,
            TileType::Grass | TileType::Path => self.grass,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub width: usize,
    pub height: usize,
    pub cell_size: f32,
    pub seed: SeedMode,
    pub max_retries: u32,
    pub path_count: usize,
    pub heights: TileHeights,
    pub path_overlay_height: f32,
    /// World-space position of the grid center
    pub origin: [f32; 3],
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            cell_size: DEFAULT_CELL_SIZE,
            seed: SeedMode::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            path_count: MIN_PATH_COUNT,
            heights: TileHeights::default(),
            path_overlay_height: DEFAULT_PATH_OVERLAY_HEIGHT,
            origin: [0.0; 3],
        }
    }
}

impl TerrainConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = SeedMode::Explicit(seed);
        self
    }

    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Copy with degenerate values pulled to the nearest valid ones:
    /// odd dimensions between 5 and 255, at least 3 paths, at least one attempt.
    pub fn clamped(&self) -> Self {
        let mut out = self.clone();
        out.width = clamp_dimension(self.width);
        out.height = clamp_dimension(self.height);
        out.path_count = self.path_count.max(MIN_PATH_COUNT);
        out.max_retries = self.max_retries.max(1);
        out.cell_size = if self.cell_size.is_finite() {
            self.cell_size.max(MIN_CELL_SIZE)
        } else {
            DEFAULT_CELL_SIZE
        };

        if out != *self {
            tracing::debug!(
                width = out.width,
                height = out.height,
                path_count = out.path_count,
                max_retries = out.max_retries,
                "terrain config clamped"
            );
        }
        out
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_ron_str(ron_str: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(ron_str)?)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Load from a `.json` or `.ron` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("ron") => Self::from_ron_str(&content),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

fn clamp_dimension(value: usize) -> usize {
    let value = value.clamp(MIN_GRID_DIMENSION, MAX_GRID_DIMENSION);
    if value % 2 == 0 {
        value + 1
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_clamp_even_dimensions() {
        let cfg = TerrainConfig::default().with_size(6, 6).clamped();
        assert_eq!((cfg.width, cfg.height), (7, 7));
    }

    #[test]
    fn test_clamp_minimums() {
        let mut cfg = TerrainConfig::default().with_size(4, 0);
        cfg.path_count = 1;
        cfg.max_retries = 0;
        cfg.cell_size = 0.1;
        let cfg = cfg.clamped();
        assert_eq!(cfg.width, 5);
        assert_eq!(cfg.height, 5);
        assert_eq!(cfg.path_count, 3);
        assert_eq!(cfg.max_retries, 1);
        assert_eq!(cfg.cell_size, MIN_CELL_SIZE);
    }

    #[test]
    fn test_clamp_maximums() {
        let cfg = TerrainConfig::default()
            .with_size(usize::MAX, u32::MAX as usize + 1)
            .clamped();
        assert_eq!((cfg.width, cfg.height), (MAX_GRID_DIMENSION, MAX_GRID_DIMENSION));
        assert!(i32::try_from(cfg.width).is_ok());

        let cfg = TerrainConfig::default().with_size(254, 256).clamped();
        assert_eq!((cfg.width, cfg.height), (255, 255));
    }

    #[test]
    fn test_valid_config_unchanged() {
        let cfg = TerrainConfig::default().with_seed(5);
        assert_eq!(cfg.clamped(), cfg);
    }

    #[test]
    fn test_explicit_seed_resolves_to_itself() {
        assert_eq!(SeedMode::Explicit(42).resolve(), 42);
        assert!(SeedMode::TimeDerived.resolve() <= TIME_SEED_MASK);
    }

    #[test]
    fn test_path_height_matches_grass() {
        let h = TileHeights {
            grass: 0.5,
            dirt: 1.0,
            rock: 2.0,
        };
        assert_eq!(h.of(TileType::Path), h.of(TileType::Grass));
        assert!(h.of(TileType::Grass) < h.of(TileType::Dirt));
        assert!(h.of(TileType::Dirt) < h.of(TileType::Rock));
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let cfg = TerrainConfig::from_json_str(r#"{"width": 11, "seed": {"Explicit": 9}}"#).unwrap();
        assert_eq!(cfg.width, 11);
        assert_eq!(cfg.height, DEFAULT_GRID_HEIGHT);
        assert_eq!(cfg.seed, SeedMode::Explicit(9));
    }

    #[test]
    fn test_load_ron_file() {
        let mut file = Builder::new().suffix(".ron").tempfile().unwrap();
        writeln!(file, "(width: 9, height: 13, path_count: 4, seed: Explicit(7))").unwrap();
        let cfg = TerrainConfig::load(file.path()).unwrap();
        assert_eq!((cfg.width, cfg.height, cfg.path_count), (9, 13, 4));
        assert_eq!(cfg.seed, SeedMode::Explicit(7));
    }

    #[test]
    fn test_load_json_file() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{}", TerrainConfig::default().with_seed(3).to_json()).unwrap();
        let cfg = TerrainConfig::load(file.path()).unwrap();
        assert_eq!(cfg.seed, SeedMode::Explicit(3));
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let file = Builder::new().suffix(".toml").tempfile().unwrap();
        let err = TerrainConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "toml"));
    }

    #[test]
    fn test_load_reports_malformed_json() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(
            TerrainConfig::load(file.path()),
            Err(ConfigError::Json(_))
        ));
    }
}
