//! Player module: character entity, input handling, melee, and item handling.
//!
//! ## Sub-module layout
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`state`] | Player components (`Player`, `PlayerHealth`, `HeldItem`, ...) and `PlayerIntent` |
//! | [`control`] | Input systems: WASD movement, surface traction, dash |
//! | [`combat`] | Melee swings, effective weapon stats, incoming damage |
//! | [`throwing`] | Item pickup, holding, throwing and thrown-item hits |
//!
//! All public items are re-exported at this level so that the rest of the crate
//! can use flat `crate::player::*` imports without knowing the sub-module layout.

pub mod combat;
pub mod control;
pub mod state;
pub mod throwing;

// ── Flat re-exports ───────────────────────────────────────────────────────────

pub use combat::{
    apply_player_damage_system, effective_weapon_stats, in_melee_arc, melee_swing_system,
};
pub use control::{keyboard_to_intent_system, player_movement_system, player_timers_system};
pub use state::{
    DashState, Facing, HeldItem, MeleeCooldown, Player, PlayerHealth, PlayerIntent, SpeedBoosts,
};
pub use throwing::{
    held_follow_system, pickup_system, spawn_weapon, starter_weapons, throw_system,
    thrown_hit_system, thrown_settle_system, Held, Item, Pickup, Thrown,
};

use crate::config::GameConfig;
use crate::state::GameState;
use crate::surface::SurfaceContact;
use crate::upgrade::StatModifiers;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerIntent>()
            .add_systems(
                Update,
                (
                    keyboard_to_intent_system,
                    player_timers_system,
                    player_movement_system,
                    pickup_system,
                    throw_system,
                    held_follow_system,
                    melee_swing_system,
                )
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                PostUpdate,
                (
                    thrown_hit_system,
                    thrown_settle_system,
                    apply_player_damage_system,
                )
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

/// Spawn the player character at the arena centre.
///
/// The body is dynamic with locked rotations so rapier resolves contacts
/// while `player_movement_system` owns the horizontal velocity.
pub fn spawn_player(mut commands: Commands, config: Res<GameConfig>) {
    commands.spawn((
        Player,
        state::player_health_from_config(&config),
        Facing::default(),
        DashState::default(),
        MeleeCooldown::default(),
        SpeedBoosts::default(),
        HeldItem::default(),
        StatModifiers::default(),
        SurfaceContact::default(),
        // Physics
        (
            RigidBody::Dynamic,
            Collider::capsule_y(0.5, config.player_radius),
            LockedAxes::ROTATION_LOCKED,
            Velocity::zero(),
            Damping {
                linear_damping: 0.0,
                angular_damping: 1.0,
            },
            ActiveEvents::COLLISION_EVENTS,
        ),
        // Transform / visibility
        Transform::from_xyz(0.0, 1.0, 0.0),
        Visibility::default(),
    ));

    info!("Player spawned at arena centre");
}
