//! Coarse navigation grid for enemy steering.
//!
//! [`NavObstacle`] footprints are rasterised into a set of blocked cells.  The
//! grid is baked once after the arena is built and again whenever a
//! [`NavRebakeRequested`] message arrives (the `/rebakenav` console command).
//! Enemies use [`NavGrid::steer`] to side-step blocked cells while seeking.

use bevy::prelude::*;
use std::collections::HashSet;

use crate::config::GameConfig;
use crate::events::NavRebakeRequested;

/// Axis-aligned XZ footprint that enemies cannot walk through.
#[derive(Component, Debug, Clone, Copy)]
pub struct NavObstacle {
    pub half_extents: Vec2,
}

#[derive(Resource, Debug, Clone)]
pub struct NavGrid {
    pub cell_size: f32,
    pub blocked: HashSet<IVec2>,
    /// Incremented on every bake.
    pub generation: u32,
}

impl Default for NavGrid {
    fn default() -> Self {
        Self {
            cell_size: crate::constants::NAV_CELL_SIZE,
            blocked: HashSet::new(),
            generation: 0,
        }
    }
}

impl NavGrid {
    pub fn cell_of(&self, pos: Vec3) -> IVec2 {
        IVec2::new(
            (pos.x / self.cell_size).floor() as i32,
            (pos.z / self.cell_size).floor() as i32,
        )
    }

    pub fn is_blocked(&self, pos: Vec3) -> bool {
        self.blocked.contains(&self.cell_of(pos))
    }

    /// Rasterise every obstacle footprint into blocked cells.
    pub fn bake(
        &mut self,
        obstacles: impl IntoIterator<Item = (Vec3, NavObstacle)>,
        cell_size: f32,
    ) {
        self.cell_size = cell_size.max(0.01);
        self.blocked.clear();
        for (center, obstacle) in obstacles {
            let extent = Vec3::new(obstacle.half_extents.x, 0.0, obstacle.half_extents.y);
            let min = self.cell_of(center - extent);
            let max = self.cell_of(center + extent);
            for x in min.x..=max.x {
                for z in min.y..=max.y {
                    self.blocked.insert(IVec2::new(x, z));
                }
            }
        }
        self.generation += 1;
    }

    /// Pick a walkable direction close to `desired`.
    ///
    /// Probes one cell ahead along `desired`, then rotated by ±45° and ±90°.
    /// Returns zero when every probe is blocked.
    pub fn steer(&self, from: Vec3, desired: Vec3) -> Vec3 {
        let desired = Vec3::new(desired.x, 0.0, desired.z).normalize_or_zero();
        if desired == Vec3::ZERO {
            return desired;
        }
        const PROBES: [f32; 5] = [0.0, 45.0, -45.0, 90.0, -90.0];
        for angle in PROBES {
            let dir = Quat::from_rotation_y(angle.to_radians()) * desired;
            if !self.is_blocked(from + dir * self.cell_size) {
                return dir;
            }
        }
        Vec3::ZERO
    }
}

fn bake_from_world(
    grid: &mut NavGrid,
    config: &GameConfig,
    q_obstacles: &Query<(&Transform, &NavObstacle)>,
) {
    grid.bake(
        q_obstacles.iter().map(|(t, o)| (t.translation, *o)),
        config.nav_cell_size,
    );
    info!(
        "Navigation baked: {} blocked cells (generation {})",
        grid.blocked.len(),
        grid.generation
    );
}

/// PostStartup system: first bake once the arena's obstacles exist.
pub fn initial_nav_bake_system(
    mut grid: ResMut<NavGrid>,
    config: Res<GameConfig>,
    q_obstacles: Query<(&Transform, &NavObstacle)>,
) {
    bake_from_world(&mut grid, &config, &q_obstacles);
}

pub fn nav_rebake_system(
    mut requests: MessageReader<NavRebakeRequested>,
    mut grid: ResMut<NavGrid>,
    config: Res<GameConfig>,
    q_obstacles: Query<(&Transform, &NavObstacle)>,
) {
    // Several requests in one frame collapse into one bake.
    if requests.read().count() == 0 {
        return;
    }
    bake_from_world(&mut grid, &config, &q_obstacles);
}

pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NavGrid>()
            .add_systems(PostStartup, initial_nav_bake_system)
            .add_systems(Update, nav_rebake_system);
    }
}
