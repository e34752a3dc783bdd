//! Enemies: data-driven catalog, spawning, seek movement, contact damage and
//! death.
//!
//! Every source of enemy damage (melee, thrown items, explosions, fire) goes
//! through a [`DamageEnemy`] message so death handling lives in one place,
//! [`apply_enemy_damage_system`].

use crate::config::{read_toml_file, GameConfig};
use crate::error::{GameError, GameResult};
use crate::events::{emit_gameplay_triggers_system, DamageEnemy, DamagePlayer, EnemyKilled};
use crate::navigation::NavGrid;
use crate::player::control::approach_velocity;
use crate::player::{thrown_hit_system, Player};
use crate::state::GameState;
use crate::surface::SurfaceContact;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;

pub const ENEMY_CATALOG_PATH: &str = "assets/enemies.toml";

fn default_min_wave() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnemyDefinition {
    pub name: String,
    /// Budget spent to put one of these into a wave.
    pub threat_cost: f32,
    pub max_hp: f32,
    pub move_speed: f32,
    pub contact_damage: f32,
    /// First wave this enemy may appear in.
    #[serde(default = "default_min_wave")]
    pub min_wave: u32,
}

#[derive(Resource, Debug, Clone, Deserialize)]
pub struct EnemyCatalog {
    pub enemies: Vec<EnemyDefinition>,
}

impl EnemyCatalog {
    pub fn get(&self, name: &str) -> GameResult<&EnemyDefinition> {
        self.enemies
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| GameError::UnknownEnemy(name.to_string()))
    }
}

impl Default for EnemyCatalog {
    fn default() -> Self {
        Self {
            enemies: vec![
                EnemyDefinition {
                    name: "grunt".into(),
                    threat_cost: 1.0,
                    max_hp: 20.0,
                    move_speed: 3.5,
                    contact_damage: 8.0,
                    min_wave: 1,
                },
                EnemyDefinition {
                    name: "runner".into(),
                    threat_cost: 2.0,
                    max_hp: 12.0,
                    move_speed: 6.0,
                    contact_damage: 6.0,
                    min_wave: 2,
                },
                EnemyDefinition {
                    name: "brute".into(),
                    threat_cost: 4.0,
                    max_hp: 60.0,
                    move_speed: 2.2,
                    contact_damage: 18.0,
                    min_wave: 3,
                },
                EnemyDefinition {
                    name: "armored_brute".into(),
                    threat_cost: 7.0,
                    max_hp: 110.0,
                    move_speed: 2.0,
                    contact_damage: 25.0,
                    min_wave: 5,
                },
            ],
        }
    }
}

// ── Components ─────────────────────────────────────────────────────────────────

#[derive(Component, Debug, Clone, Copy)]
pub struct Enemy;

/// Catalog name of the enemy.
#[derive(Component, Debug, Clone)]
pub struct EnemyKind(pub String);

#[derive(Component, Debug, Clone, Copy)]
pub struct EnemyHealth {
    pub hp: f32,
    pub max_hp: f32,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct EnemyStats {
    pub move_speed: f32,
    pub contact_damage: f32,
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ContactCooldown {
    pub timer: f32,
}

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EnemyCatalog>()
            .add_systems(Startup, load_enemy_catalog)
            .add_systems(
                Update,
                (enemy_seek_system, enemy_contact_damage_system)
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                PostUpdate,
                apply_enemy_damage_system
                    .after(thrown_hit_system)
                    .before(emit_gameplay_triggers_system)
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

/// Startup system: replace the compiled catalog with `assets/enemies.toml`.
pub fn load_enemy_catalog(mut catalog: ResMut<EnemyCatalog>) {
    match read_toml_file::<EnemyCatalog>(ENEMY_CATALOG_PATH) {
        Ok(Some(loaded)) if !loaded.enemies.is_empty() => {
            info!(
                "Loaded {} enemy definitions from {ENEMY_CATALOG_PATH}",
                loaded.enemies.len()
            );
            *catalog = loaded;
        }
        Ok(Some(_)) => warn!("{ENEMY_CATALOG_PATH} defines no enemies; using defaults"),
        Ok(None) => info!("No {ENEMY_CATALOG_PATH} found; using compiled enemies"),
        Err(e) => error!("{e}; using compiled enemies"),
    }
}

pub fn spawn_enemy(
    commands: &mut Commands,
    def: &EnemyDefinition,
    position: Vec3,
    config: &GameConfig,
) -> Entity {
    commands
        .spawn((
            Enemy,
            EnemyKind(def.name.clone()),
            EnemyHealth {
                hp: def.max_hp,
                max_hp: def.max_hp,
            },
            EnemyStats {
                move_speed: def.move_speed,
                contact_damage: def.contact_damage,
            },
            ContactCooldown::default(),
            SurfaceContact::default(),
            Transform::from_translation(Vec3::new(position.x, 1.0, position.z)),
            Visibility::default(),
            RigidBody::Dynamic,
            Collider::capsule_y(0.5, config.enemy_radius),
            LockedAxes::ROTATION_LOCKED,
            Velocity::zero(),
            ActiveEvents::COLLISION_EVENTS,
        ))
        .id()
}

/// Steer toward the player around blocked navigation cells.
#[allow(clippy::type_complexity)]
pub fn enemy_seek_system(
    time: Res<Time>,
    config: Res<GameConfig>,
    grid: Res<NavGrid>,
    q_player: Query<&Transform, With<Player>>,
    mut q_enemies: Query<
        (&Transform, &EnemyStats, &mut Velocity, Option<&SurfaceContact>),
        (With<Enemy>, Without<Player>),
    >,
) {
    let Ok(player) = q_player.single() else {
        return;
    };
    let dt = time.delta_secs();
    let stop_range = config.enemy_contact_range * 0.8;

    for (transform, stats, mut velocity, contact) in q_enemies.iter_mut() {
        let mut to_player = player.translation - transform.translation;
        to_player.y = 0.0;
        let desired = if to_player.length() <= stop_range {
            Vec3::ZERO
        } else {
            grid.steer(transform.translation, to_player)
        };

        let surface = contact.map(|c| c.properties).unwrap_or_default();
        let target = desired * stats.move_speed * surface.speed_multiplier;
        let max_delta = config.enemy_acceleration * surface.traction * dt;
        velocity.linvel = approach_velocity(velocity.linvel, target, max_delta);
    }
}

pub fn enemy_contact_damage_system(
    time: Res<Time>,
    config: Res<GameConfig>,
    q_player: Query<&Transform, With<Player>>,
    mut q_enemies: Query<(&Transform, &EnemyStats, &EnemyKind, &mut ContactCooldown), With<Enemy>>,
    mut damage: MessageWriter<DamagePlayer>,
) {
    let dt = time.delta_secs();
    let player_pos = q_player.single().ok().map(|t| t.translation);

    for (transform, stats, kind, mut cooldown) in q_enemies.iter_mut() {
        cooldown.timer = (cooldown.timer - dt).max(0.0);
        let Some(player_pos) = player_pos else {
            continue;
        };
        if cooldown.timer > 0.0 {
            continue;
        }
        let mut offset = player_pos - transform.translation;
        offset.y = 0.0;
        if offset.length() > config.enemy_contact_range {
            continue;
        }
        cooldown.timer = config.enemy_contact_cooldown;
        damage.write(DamagePlayer {
            amount: stats.contact_damage,
            source: kind.0.clone(),
            over_time: false,
        });
    }
}

/// Resolve every [`DamageEnemy`] request: subtract hp, apply knockback and
/// despawn the dead.
pub fn apply_enemy_damage_system(
    mut commands: Commands,
    mut requests: MessageReader<DamageEnemy>,
    mut q_enemies: Query<
        (&Transform, &EnemyKind, &mut EnemyHealth, Option<&mut Velocity>),
        With<Enemy>,
    >,
    mut killed: MessageWriter<EnemyKilled>,
) {
    let mut dead: HashSet<Entity> = HashSet::new();

    for request in requests.read() {
        if dead.contains(&request.target) {
            continue;
        }
        let Ok((transform, kind, mut health, velocity)) = q_enemies.get_mut(request.target) else {
            continue;
        };

        health.hp -= request.amount.max(0.0);
        if let Some(mut velocity) = velocity {
            velocity.linvel += request.knockback;
        }

        if health.hp <= 0.0 {
            dead.insert(request.target);
            commands.entity(request.target).despawn();
            debug!("{} killed by {}", kind.0, request.source);
            killed.write(EnemyKilled {
                enemy: request.target,
                name: kind.0.clone(),
                position: transform.translation,
                cause: request.source.clone(),
            });
        }
    }
}
