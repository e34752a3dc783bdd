//! Threat-budget wave generation.
//!
//! Each wave gets a budget from [`threat_budget`] that grows with the wave
//! number and the number of cleared rooms, plus a bounded random variance.
//! [`compose_wave`] spends that budget greedily on random eligible enemies.
//! The [`EnemySpawner`] resource then drives the wave flow:
//!
//! ```text
//! Intermission ──timer──▶ Spawning ──queue empty──▶ Fighting ──no enemies──▶ Intermission
//!                         (WaveStarted,             (every waves_per_room
//!                          EnemySpawned…)            waves: RoomCleared)
//! ```

use crate::config::GameConfig;
use crate::enemy::{spawn_enemy, Enemy, EnemyCatalog};
use crate::error::GameResult;
use crate::events::{EnemySpawned, RoomCleared, WaveStarted};
use crate::state::{GameRng, GameState};
use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;

/// Budget inputs, split out of [`GameConfig`] so the formula stays pure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreatParams {
    pub base: f32,
    pub per_wave: f32,
    pub per_room: f32,
    pub max_variance: f32,
}

impl ThreatParams {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            base: config.threat_base,
            per_wave: config.threat_per_wave,
            per_room: config.threat_per_room,
            max_variance: config.threat_max_variance,
        }
    }
}

/// `(base + wave·per_wave + rooms·per_room) × (1 + variance)`.
///
/// `variance` is clamped to `±max_variance`; the result is never negative.
pub fn threat_budget(params: &ThreatParams, wave: u32, rooms_completed: u32, variance: f32) -> f32 {
    let spread = params.max_variance.abs();
    let variance = variance.clamp(-spread, spread);
    let nominal =
        params.base + wave as f32 * params.per_wave + rooms_completed as f32 * params.per_room;
    (nominal * (1.0 + variance)).max(0.0)
}

/// Draw a variance uniformly from `[-max_variance, max_variance]`.
pub fn roll_variance<R: Rng + ?Sized>(max_variance: f32, rng: &mut R) -> f32 {
    let spread = max_variance.abs();
    if spread == 0.0 {
        return 0.0;
    }
    rng.gen_range(-spread..=spread)
}

/// Spend `budget` on enemies allowed in `wave`.
///
/// Each step picks uniformly among the eligible enemies that still fit the
/// remaining budget.  Stops when nothing fits or `max_enemies` is reached.
pub fn compose_wave<R: Rng + ?Sized>(
    catalog: &EnemyCatalog,
    budget: f32,
    wave: u32,
    max_enemies: usize,
    rng: &mut R,
) -> Vec<String> {
    let eligible: Vec<_> = catalog
        .enemies
        .iter()
        .filter(|e| e.min_wave <= wave && e.threat_cost > 0.0)
        .collect();

    let mut remaining = budget;
    let mut picked = Vec::new();
    while picked.len() < max_enemies {
        let affordable: Vec<_> = eligible
            .iter()
            .filter(|e| e.threat_cost <= remaining)
            .collect();
        let Some(choice) = affordable.choose(rng) else {
            break;
        };
        remaining -= choice.threat_cost;
        picked.push(choice.name.clone());
    }
    picked
}

/// Marks a location enemies may spawn at; used round-robin.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SpawnPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WavePhase {
    #[default]
    Intermission,
    Spawning,
    Fighting,
}

#[derive(Resource, Debug, Clone)]
pub struct EnemySpawner {
    /// Number of the current (or last started) wave; 0 before the first.
    pub wave: u32,
    pub rooms_completed: u32,
    pub waves_per_room: u32,
    pub phase: WavePhase,
    pub queue: VecDeque<String>,
    pub spawn_timer: f32,
    pub intermission_timer: f32,
    pub spawn_cursor: usize,
}

impl EnemySpawner {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            wave: 0,
            rooms_completed: 0,
            waves_per_room: config.waves_per_room.max(1),
            phase: WavePhase::Intermission,
            queue: VecDeque::new(),
            spawn_timer: 0.0,
            intermission_timer: config.intermission_secs,
            spawn_cursor: 0,
        }
    }

    /// Next spawn location, cycling through `points` or, if there are none,
    /// around a ring of `fallback_radius`.
    pub fn next_spawn_position(&mut self, points: &[Vec3], fallback_radius: f32) -> Vec3 {
        let index = self.spawn_cursor;
        self.spawn_cursor = self.spawn_cursor.wrapping_add(1);
        if !points.is_empty() {
            return points[index % points.len()];
        }
        const RING_SLOTS: usize = 8;
        let angle = (index % RING_SLOTS) as f32 / RING_SLOTS as f32 * std::f32::consts::TAU;
        Vec3::new(angle.cos(), 0.0, angle.sin()) * fallback_radius
    }
}

impl Default for EnemySpawner {
    fn default() -> Self {
        Self::new(&GameConfig::default())
    }
}

pub struct SpawnerPlugin;

impl Plugin for SpawnerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EnemySpawner>()
            .add_systems(Startup, reset_spawner)
            .add_systems(
                Update,
                wave_flow_system.run_if(in_state(GameState::Playing)),
            );
    }
}

/// Startup system: pick up `waves_per_room` and timings from the loaded config.
pub fn reset_spawner(mut spawner: ResMut<EnemySpawner>, config: Res<GameConfig>) {
    *spawner = EnemySpawner::new(&config);
}

/// Spawn one catalog enemy by name at `position`.
pub fn spawn_named(
    commands: &mut Commands,
    catalog: &EnemyCatalog,
    config: &GameConfig,
    name: &str,
    position: Vec3,
) -> GameResult<(Entity, String)> {
    let def = catalog.get(name)?;
    let entity = spawn_enemy(commands, def, position, config);
    Ok((entity, def.name.clone()))
}

#[allow(clippy::too_many_arguments)]
pub fn wave_flow_system(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    catalog: Res<EnemyCatalog>,
    mut spawner: ResMut<EnemySpawner>,
    mut rng: ResMut<GameRng>,
    q_points: Query<&Transform, With<SpawnPoint>>,
    q_enemies: Query<(), With<Enemy>>,
    mut wave_started: MessageWriter<WaveStarted>,
    mut spawned: MessageWriter<EnemySpawned>,
    mut room_cleared: MessageWriter<RoomCleared>,
) {
    let dt = time.delta_secs();

    match spawner.phase {
        WavePhase::Intermission => {
            spawner.intermission_timer -= dt;
            if spawner.intermission_timer > 0.0 {
                return;
            }
            spawner.wave += 1;
            let params = ThreatParams::from_config(&config);
            let variance = roll_variance(params.max_variance, &mut rng.0);
            let budget = threat_budget(&params, spawner.wave, spawner.rooms_completed, variance);
            let roster = compose_wave(
                &catalog,
                budget,
                spawner.wave,
                config.max_enemies_per_wave,
                &mut rng.0,
            );
            info!(
                "Wave {} (room {}): budget {:.1}, {} enemies",
                spawner.wave,
                spawner.rooms_completed + 1,
                budget,
                roster.len()
            );
            wave_started.write(WaveStarted {
                wave: spawner.wave,
                room: spawner.rooms_completed + 1,
                budget,
                enemy_count: roster.len(),
            });
            spawner.queue = roster.into();
            spawner.spawn_timer = 0.0;
            spawner.phase = WavePhase::Spawning;
        }
        WavePhase::Spawning => {
            spawner.spawn_timer -= dt;
            if spawner.spawn_timer > 0.0 {
                return;
            }
            let Some(name) = spawner.queue.pop_front() else {
                spawner.phase = WavePhase::Fighting;
                return;
            };
            let points: Vec<Vec3> = q_points.iter().map(|t| t.translation).collect();
            let position = spawner.next_spawn_position(&points, config.fallback_spawn_radius);
            match spawn_named(&mut commands, &catalog, &config, &name, position) {
                Ok((enemy, name)) => {
                    spawned.write(EnemySpawned {
                        enemy,
                        name,
                        position,
                    });
                }
                Err(e) => warn!("Skipping queued enemy: {e}"),
            }
            spawner.spawn_timer = config.spawn_interval_secs;
            if spawner.queue.is_empty() {
                spawner.phase = WavePhase::Fighting;
            }
        }
        WavePhase::Fighting => {
            if !q_enemies.is_empty() {
                return;
            }
            debug!("Wave {} cleared", spawner.wave);
            if spawner.wave % spawner.waves_per_room.max(1) == 0 {
                spawner.rooms_completed += 1;
                info!("Room cleared ({} total)", spawner.rooms_completed);
                room_cleared.write(RoomCleared {
                    rooms_completed: spawner.rooms_completed,
                });
            }
            spawner.intermission_timer = config.intermission_secs;
            spawner.phase = WavePhase::Intermission;
        }
    }
}
