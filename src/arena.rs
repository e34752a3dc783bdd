//! Arena layout: floor, walls, pillars, spawn points, surface patches and the
//! starter weapons.
//!
//! [`setup_arena`] only spawns gameplay data (colliders, markers, components)
//! so it runs headless in tests.  [`ArenaVisualsPlugin`] adds the camera, a
//! light and primitive meshes for the windowed binary.

use crate::config::{load_game_config, GameConfig};
use crate::enemy::Enemy;
use crate::navigation::NavObstacle;
use crate::player::{spawn_weapon, starter_weapons, Item, Player};
use crate::spawner::SpawnPoint;
use crate::surface::{spawn_surface, Surface, SurfaceKind};
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

const WALL_HEIGHT: f32 = 2.0;
const WALL_THICKNESS: f32 = 0.5;

#[derive(Component, Debug, Clone, Copy)]
pub struct ArenaFloor;

/// Static block that both physics and navigation treat as solid.
pub fn spawn_obstacle(commands: &mut Commands, center: Vec3, half_extents: Vec2) -> Entity {
    commands
        .spawn((
            NavObstacle { half_extents },
            Transform::from_xyz(center.x, WALL_HEIGHT * 0.5, center.z),
            Visibility::default(),
            RigidBody::Fixed,
            Collider::cuboid(half_extents.x, WALL_HEIGHT * 0.5, half_extents.y),
        ))
        .id()
}

/// Startup system: build the arena around the origin.
pub fn setup_arena(mut commands: Commands, config: Res<GameConfig>) {
    let half = config.arena_half_size;

    commands.spawn((
        ArenaFloor,
        Transform::from_xyz(0.0, -0.1, 0.0),
        Visibility::default(),
        RigidBody::Fixed,
        Collider::cuboid(half, 0.1, half),
    ));

    // Perimeter
    let edge = half + WALL_THICKNESS;
    for (center, extents) in [
        (Vec3::new(0.0, 0.0, -edge), Vec2::new(edge, WALL_THICKNESS)),
        (Vec3::new(0.0, 0.0, edge), Vec2::new(edge, WALL_THICKNESS)),
        (Vec3::new(-edge, 0.0, 0.0), Vec2::new(WALL_THICKNESS, edge)),
        (Vec3::new(edge, 0.0, 0.0), Vec2::new(WALL_THICKNESS, edge)),
    ] {
        spawn_obstacle(&mut commands, center, extents);
    }

    // Pillars
    let inner = half * 0.4;
    for (x, z) in [(-inner, -inner), (inner, -inner), (-inner, inner), (inner, inner)] {
        spawn_obstacle(&mut commands, Vec3::new(x, 0.0, z), Vec2::splat(0.75));
    }

    // Spawn points sit in the corners, inside the walls.
    let corner = half - 2.0;
    for (x, z) in [
        (-corner, -corner),
        (corner, -corner),
        (-corner, corner),
        (corner, corner),
    ] {
        commands.spawn((SpawnPoint, Transform::from_xyz(x, 0.0, z)));
    }

    spawn_surface(
        &mut commands,
        SurfaceKind::Oil,
        Vec3::new(-half * 0.5, 0.0, 0.0),
        Vec2::new(2.5, 2.0),
    );
    spawn_surface(
        &mut commands,
        SurfaceKind::Ice,
        Vec3::new(half * 0.5, 0.0, 0.0),
        Vec2::new(3.0, 2.5),
    );
    spawn_surface(
        &mut commands,
        SurfaceKind::Water,
        Vec3::new(0.0, 0.0, half * 0.55),
        Vec2::new(2.0, 1.5),
    );

    for (i, (name, stats)) in starter_weapons().into_iter().enumerate() {
        let x = (i as f32 - 1.0) * 2.5;
        spawn_weapon(&mut commands, name, stats, Vec3::new(x, 0.3, -3.0));
    }

    info!("Arena built ({}×{} units)", half * 2.0, half * 2.0);
}

/// Camera, light and primitive meshes for the windowed build.
pub struct ArenaVisualsPlugin;

impl Plugin for ArenaVisualsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_camera_and_light.after(load_game_config))
            .add_systems(Update, attach_primitive_meshes_system);
    }
}

pub fn setup_camera_and_light(mut commands: Commands, config: Res<GameConfig>) {
    let height = config.arena_half_size * 1.4;
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, height, height * 0.7).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        DirectionalLight {
            illuminance: 10_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.9, 0.4, 0.0)),
    ));
}

fn surface_color(kind: SurfaceKind, burning: bool) -> Color {
    match (kind, burning) {
        (SurfaceKind::Oil, true) => Color::srgb(0.9, 0.35, 0.05),
        (SurfaceKind::Oil, false) => Color::srgb(0.12, 0.1, 0.08),
        (SurfaceKind::Ice, _) => Color::srgb(0.75, 0.9, 1.0),
        (SurfaceKind::Water, _) => Color::srgb(0.15, 0.35, 0.8),
    }
}

/// Give every newly spawned gameplay entity a primitive mesh.
#[allow(clippy::type_complexity)]
#[allow(clippy::too_many_arguments)]
pub fn attach_primitive_meshes_system(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<GameConfig>,
    q_floor: Query<Entity, Added<ArenaFloor>>,
    q_obstacles: Query<(Entity, &NavObstacle), Added<NavObstacle>>,
    q_surfaces: Query<(Entity, &Surface), Added<Surface>>,
    q_actors: Query<(Entity, Has<Player>), Or<(Added<Player>, Added<Enemy>)>>,
    q_items: Query<Entity, Added<Item>>,
) {
    let half = config.arena_half_size;
    for entity in q_floor.iter() {
        commands.entity(entity).insert((
            Mesh3d(meshes.add(Cuboid::new(half * 2.0, 0.2, half * 2.0))),
            MeshMaterial3d(materials.add(Color::srgb(0.3, 0.3, 0.32))),
        ));
    }
    for (entity, obstacle) in q_obstacles.iter() {
        let size = obstacle.half_extents * 2.0;
        commands.entity(entity).insert((
            Mesh3d(meshes.add(Cuboid::new(size.x, WALL_HEIGHT, size.y))),
            MeshMaterial3d(materials.add(Color::srgb(0.45, 0.42, 0.4))),
        ));
    }
    for (entity, surface) in q_surfaces.iter() {
        let size = surface.half_extents * 2.0;
        commands.entity(entity).insert((
            Mesh3d(meshes.add(Cuboid::new(size.x, 0.02, size.y))),
            MeshMaterial3d(materials.add(surface_color(surface.kind, false))),
        ));
    }
    for (entity, is_player) in q_actors.iter() {
        let (radius, color) = if is_player {
            (config.player_radius, Color::srgb(0.2, 0.5, 0.95))
        } else {
            (config.enemy_radius, Color::srgb(0.85, 0.2, 0.2))
        };
        commands.entity(entity).insert((
            Mesh3d(meshes.add(Capsule3d::new(radius, 1.0))),
            MeshMaterial3d(materials.add(color)),
        ));
    }
    for entity in q_items.iter() {
        commands.entity(entity).insert((
            Mesh3d(meshes.add(Cuboid::new(0.24, 0.24, 0.9))),
            MeshMaterial3d(materials.add(Color::srgb(0.7, 0.55, 0.3))),
        ));
    }
}
