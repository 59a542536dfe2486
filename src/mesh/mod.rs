//! Height field and mesh construction.
//!
//! Cell heights come straight from the tile type. The ground surface is a
//! `(width+1) x (height+1)` vertex grid where each vertex averages the
//! heights of the cells that share it, which blends neighbouring tiles
//! instead of producing a stair-stepped heightmap. Path cells get their own
//! decal mesh: one flat quad per path cell, lifted a little above the ground.

use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use serde::{Deserialize, Serialize};

use crate::config::TileHeights;
use crate::generation::grid::{Cell, Grid, GridSize};
use crate::generation::paths::Path;
use crate::generation::tiles::TileType;

/// One height per cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightField {
    heights: Grid<f32>,
}

impl HeightField {
    pub fn from_tiles(tiles: &Grid<TileType>, heights: &TileHeights) -> Self {
        Self {
            heights: tiles.map(|t| heights.of(*t)),
        }
    }

    pub fn size(&self) -> GridSize {
        self.heights.size()
    }

    pub fn at(&self, cell: Cell) -> Option<f32> {
        self.heights.get(cell).copied()
    }

    pub fn as_grid(&self) -> &Grid<f32> {
        &self.heights
    }

    /// Mean height of the up-to-four cells touching vertex `(vx, vy)`.
    /// Vertex `(vx, vy)` is the lower-left corner of cell `(vx, vy)`.
    pub fn vertex_height(&self, vx: i32, vy: i32) -> f32 {
        let mut sum = 0.0;
        let mut count = 0;
        for dy in -1..=0 {
            for dx in -1..=0 {
                if let Some(h) = self.at(Cell::new(vx + dx, vy + dy)) {
                    sum += h;
                    count += 1;
                }
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }
}

/// Plain mesh buffers handed to render/collision consumers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerrainMesh {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl TerrainMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Bevy triangle-list mesh with smooth normals
    pub fn to_bevy_mesh(&self) -> Mesh {
        Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
        )
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, self.positions.clone())
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs.clone())
        .with_inserted_indices(Indices::U32(self.indices.clone()))
        .with_computed_normals()
    }
}

/// Local-space placement shared by the meshes and the path cache
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridFrame {
    pub size: GridSize,
    pub cell_size: f32,
}

impl GridFrame {
    /// Center of `cell` in local space at height `y`
    pub fn cell_center(&self, cell: Cell, y: f32) -> Vec3 {
        let center = self.size.center();
        Vec3::new(
            (cell.x - center.x) as f32 * self.cell_size,
            y,
            (cell.y - center.y) as f32 * self.cell_size,
        )
    }

    /// Vertex `(vx, vy)` in local space at height `y`
    pub fn vertex(&self, vx: i32, vy: i32, y: f32) -> Vec3 {
        let half_w = self.size.width as f32 * 0.5;
        let half_h = self.size.height as f32 * 0.5;
        Vec3::new(
            (vx as f32 - half_w) * self.cell_size,
            y,
            (vy as f32 - half_h) * self.cell_size,
        )
    }
}

/// Full-grid ground surface with blended vertex heights
pub fn build_ground_mesh(frame: GridFrame, heights: &HeightField) -> TerrainMesh {
    let (w, h) = (frame.size.width, frame.size.height);
    let vert_w = w + 1;
    let vert_h = h + 1;

    let mut mesh = TerrainMesh {
        positions: Vec::with_capacity(vert_w * vert_h),
        uvs: Vec::with_capacity(vert_w * vert_h),
        indices: Vec::with_capacity(w * h * 6),
    };

    for vy in 0..vert_h {
        for vx in 0..vert_w {
            let y = heights.vertex_height(vx as i32, vy as i32);
            mesh.positions
                .push(frame.vertex(vx as i32, vy as i32, y).to_array());
            mesh.uvs.push([vx as f32 / w as f32, vy as f32 / h as f32]);
        }
    }

    for y in 0..h {
        for x in 0..w {
            let i = (y * vert_w + x) as u32;
            let row = vert_w as u32;
            mesh.indices
                .extend_from_slice(&[i, i + row, i + row + 1, i, i + row + 1, i + 1]);
        }
    }

    mesh
}

/// One quad per path cell at cell height plus `clearance`.
///
/// Cells shared by several paths get one quad per occurrence.
pub fn build_path_decal_mesh(
    frame: GridFrame,
    paths: &[Path],
    heights: &HeightField,
    clearance: f32,
) -> TerrainMesh {
    let total: usize = paths.iter().map(Path::len).sum();
    let mut mesh = TerrainMesh {
        positions: Vec::with_capacity(total * 4),
        uvs: Vec::with_capacity(total * 4),
        indices: Vec::with_capacity(total * 6),
    };

    let half = frame.cell_size * 0.5;
    for cell in paths.iter().flat_map(|p| p.cells.iter().copied()) {
        let y = heights.at(cell).unwrap_or(0.0) + clearance;
        let center = frame.cell_center(cell, y);
        let v = mesh.positions.len() as u32;

        for offset in [
            Vec3::new(-half, 0.0, -half),
            Vec3::new(-half, 0.0, half),
            Vec3::new(half, 0.0, half),
            Vec3::new(half, 0.0, -half),
        ] {
            mesh.positions.push((center + offset).to_array());
        }
        mesh.uvs
            .extend_from_slice(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]);
        mesh.indices
            .extend_from_slice(&[v, v + 1, v + 2, v, v + 2, v + 3]);
    }

    mesh
}

/// Vertex heights in the column-major layout of a rapier heightfield:
/// rows run along Z (vy), columns along X (vx).
pub fn ground_collider_heights(heights: &HeightField) -> (Vec<f32>, usize, usize) {
    let size = heights.size();
    let rows = size.height + 1;
    let cols = size.width + 1;
    let mut data = Vec::with_capacity(rows * cols);
    for vx in 0..cols {
        for vy in 0..rows {
            data.push(heights.vertex_height(vx as i32, vy as i32));
        }
    }
    (data, rows, cols)
}
