use anyhow::Context;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use terrain_core::logging;
use terrain_core::render::{RegenerateTerrain, TerrainPlugin, TerrainRebuilt};
use terrain_core::{SeedMode, TerrainConfig, TerrainGenerator};

fn main() -> anyhow::Result<()> {
    logging::init_tracing_default();

    let config = match std::env::args().nth(1) {
        Some(path) => TerrainConfig::load(&path)
            .with_context(|| format!("loading terrain config from {path}"))?,
        None => TerrainConfig::default(),
    };

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Tower Defense - Procedural Terrain".into(),
                        resolution: (1280., 720.).into(),
                        ..default()
                    }),
                    ..default()
                })
                // tracing is initialised above
                .disable::<LogPlugin>(),
        )
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
        .add_plugins(TerrainPlugin { config })
        .add_systems(Startup, setup)
        .add_systems(Update, (regenerate_on_key, log_rebuilds))
        .run();

    Ok(())
}

fn setup(mut commands: Commands, generator: Res<TerrainGenerator>) {
    let terrain = generator.terrain();
    let reach = terrain.width().max(terrain.height()) as f32 * terrain.cell_size();

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, reach * 0.8, reach * 0.9).looking_at(terrain.center_world(), Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.9, 0.5, 0.0)),
    ));

    info!("Procedural terrain viewer ready (press R to regenerate)");
}

/// R rebuilds with a fresh time-derived seed
fn regenerate_on_key(
    keys: Res<ButtonInput<KeyCode>>,
    generator: Res<TerrainGenerator>,
    mut requests: EventWriter<RegenerateTerrain>,
) {
    if keys.just_pressed(KeyCode::KeyR) {
        let mut config = generator.config().clone();
        config.seed = SeedMode::TimeDerived;
        requests.send(RegenerateTerrain {
            config: Some(config),
        });
    }
}

fn log_rebuilds(mut rebuilt: EventReader<TerrainRebuilt>) {
    for event in rebuilt.read() {
        info!("Terrain rebuilt: seed={} outcome={:?}", event.seed, event.outcome);
    }
}
