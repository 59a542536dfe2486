//! Bevy integration for generated terrain.
//!
//! Spawns the ground surface (mesh + heightfield collider) and the path
//! overlay whenever the [`TerrainGenerator`] resource changes. The previous
//! entities are despawned in the same command flush that spawns the new
//! ones, so a half-built terrain is never on screen.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::config::TerrainConfig;
use crate::generation::{GenerationOutcome, TerrainGenerator};
use crate::mesh::ground_collider_heights;

pub struct TerrainPlugin {
    pub config: TerrainConfig,
}

impl Default for TerrainPlugin {
    fn default() -> Self {
        Self {
            config: TerrainConfig::default(),
        }
    }
}

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(TerrainGenerator::new(self.config.clone()))
            .init_resource::<TerrainPalette>()
            .add_event::<RegenerateTerrain>()
            .add_event::<TerrainRebuilt>()
            .add_systems(
                Update,
                (handle_regenerate_requests, sync_terrain_entities).chain(),
            );
    }
}

/// Request a full rebuild. `None` keeps the current configuration.
#[derive(Event, Debug, Clone, Default)]
pub struct RegenerateTerrain {
    pub config: Option<TerrainConfig>,
}

/// Sent after new terrain entities were spawned
#[derive(Event, Debug, Clone, Copy)]
pub struct TerrainRebuilt {
    pub seed: u64,
    pub outcome: GenerationOutcome,
}

/// Colors for the two material zones
#[derive(Resource, Debug, Clone)]
pub struct TerrainPalette {
    pub ground: Color,
    pub path: Color,
}

impl Default for TerrainPalette {
    fn default() -> Self {
        Self {
            ground: Color::srgb(0.25, 0.5, 0.25),
            path: Color::srgb(0.55, 0.4, 0.25),
        }
    }
}

/// Marker for the ground surface entity (the path overlay is its child)
#[derive(Component)]
pub struct TerrainGround;

/// Marker for the path decal entity
#[derive(Component)]
pub struct PathOverlay;

fn handle_regenerate_requests(
    mut requests: EventReader<RegenerateTerrain>,
    mut generator: ResMut<TerrainGenerator>,
) {
    // Several requests in one frame collapse into one rebuild; the last config wins
    let mut pending = None;
    for request in requests.read() {
        pending = Some(request.config.clone());
    }

    match pending {
        Some(Some(config)) => {
            generator.generate_with(config);
        }
        Some(None) => {
            generator.generate();
        }
        None => {}
    }
}

fn sync_terrain_entities(
    mut commands: Commands,
    generator: Res<TerrainGenerator>,
    palette: Res<TerrainPalette>,
    existing: Query<Entity, With<TerrainGround>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut rebuilt: EventWriter<TerrainRebuilt>,
) {
    if !generator.is_changed() {
        return;
    }

    for entity in &existing {
        commands.entity(entity).despawn_recursive();
    }

    let terrain = generator.terrain();
    let (heights, rows, cols) = ground_collider_heights(terrain.heights());
    let extent = Vec3::new(
        terrain.width() as f32 * terrain.cell_size(),
        1.0,
        terrain.height() as f32 * terrain.cell_size(),
    );

    let mut ground = commands.spawn((
        Name::new("ProceduralTerrain"),
        Mesh3d(meshes.add(terrain.ground_mesh().to_bevy_mesh())),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: palette.ground,
            perceptual_roughness: 0.9,
            ..default()
        })),
        Transform::from_translation(terrain.origin()),
        RigidBody::Fixed,
        Collider::heightfield(heights, rows, cols, extent),
        TerrainGround,
    ));

    if !terrain.path_mesh().is_empty() {
        let path_mesh = meshes.add(terrain.path_mesh().to_bevy_mesh());
        let path_material = materials.add(StandardMaterial {
            base_color: palette.path,
            perceptual_roughness: 0.9,
            ..default()
        });
        ground.with_children(|parent| {
            parent.spawn((
                Name::new("PathOverlay"),
                Mesh3d(path_mesh),
                MeshMaterial3d(path_material),
                Transform::default(),
                PathOverlay,
            ));
        });
    }

    let report = terrain.report();
    rebuilt.send(TerrainRebuilt {
        seed: report.base_seed,
        outcome: report.outcome,
    });

    info!(
        "Spawned terrain: {}x{}, {} paths, {} ground vertices",
        terrain.width(),
        terrain.height(),
        terrain.paths().len(),
        terrain.ground_mesh().vertex_count()
    );
}
