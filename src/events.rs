//! Global event bus.
//!
//! Gameplay modules never call into each other directly when something
//! happens; they write one of the messages below and interested systems read
//! it.  [`emit_gameplay_triggers_system`] folds the domain messages into the
//! single [`GameplayTrigger`] stream consumed by the upgrade system.

use bevy::prelude::*;
use serde::Deserialize;

use crate::state::GameState;

/// Named gameplay event that can activate a triggered upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Kill,
    MeleeHit,
    Throw,
    PickUp,
    Dash,
    DamageTaken,
    WaveStarted,
    RoomCleared,
}

impl TriggerKind {
    pub fn label(self) -> &'static str {
        match self {
            TriggerKind::Kill => "kill",
            TriggerKind::MeleeHit => "melee_hit",
            TriggerKind::Throw => "throw",
            TriggerKind::PickUp => "pick_up",
            TriggerKind::Dash => "dash",
            TriggerKind::DamageTaken => "damage_taken",
            TriggerKind::WaveStarted => "wave_started",
            TriggerKind::RoomCleared => "room_cleared",
        }
    }
}

// ── Domain messages ───────────────────────────────────────────────────────────

#[derive(Message, Debug, Clone)]
pub struct EnemySpawned {
    pub enemy: Entity,
    pub name: String,
    pub position: Vec3,
}

#[derive(Message, Debug, Clone)]
pub struct EnemyKilled {
    pub enemy: Entity,
    pub name: String,
    pub position: Vec3,
    /// What dealt the final blow (weapon name, "fire", upgrade name, ...).
    pub cause: String,
}

#[derive(Message, Debug, Clone)]
pub struct WeaponThrown {
    pub weapon: Entity,
    pub name: String,
    pub position: Vec3,
    pub velocity: Vec3,
}

#[derive(Message, Debug, Clone)]
pub struct WeaponPickedUp {
    pub weapon: Entity,
    pub name: String,
    pub position: Vec3,
}

#[derive(Message, Debug, Clone, Copy)]
pub struct PlayerDashed {
    pub position: Vec3,
    pub direction: Vec3,
}

#[derive(Message, Debug, Clone)]
pub struct MeleeHit {
    pub target: Entity,
    pub weapon_name: String,
    pub damage: f32,
    pub position: Vec3,
}

/// Emitted after damage has actually been applied to the player.
#[derive(Message, Debug, Clone)]
pub struct PlayerDamaged {
    pub amount: f32,
    pub source: String,
    pub position: Vec3,
}

#[derive(Message, Debug, Clone, Copy)]
pub struct WaveStarted {
    pub wave: u32,
    pub room: u32,
    pub budget: f32,
    pub enemy_count: usize,
}

#[derive(Message, Debug, Clone, Copy)]
pub struct RoomCleared {
    pub rooms_completed: u32,
}

#[derive(Message, Debug, Clone)]
pub struct UpgradeGranted {
    pub name: String,
}

#[derive(Message, Debug, Clone)]
pub struct UpgradeActivated {
    pub name: String,
    pub trigger: TriggerKind,
    pub position: Vec3,
}

#[derive(Message, Debug, Clone, Copy, Default)]
pub struct NavRebakeRequested;

// ── Damage requests ───────────────────────────────────────────────────────────

/// Request to damage an enemy; resolved by `enemy::apply_enemy_damage_system`.
#[derive(Message, Debug, Clone)]
pub struct DamageEnemy {
    pub target: Entity,
    pub amount: f32,
    pub source: String,
    /// Velocity impulse added to the enemy's knockback.
    pub knockback: Vec3,
}

impl DamageEnemy {
    pub fn new(target: Entity, amount: f32, source: impl Into<String>) -> Self {
        Self {
            target,
            amount,
            source: source.into(),
            knockback: Vec3::ZERO,
        }
    }

    pub fn with_knockback(mut self, knockback: Vec3) -> Self {
        self.knockback = knockback;
        self
    }
}

/// Request to damage the player; resolved by `player::apply_player_damage_system`.
#[derive(Message, Debug, Clone)]
pub struct DamagePlayer {
    pub amount: f32,
    pub source: String,
    /// Damage-over-time ticks ignore and do not re-arm invulnerability, and
    /// do not raise `PlayerDamaged`.
    pub over_time: bool,
}

// ── Unified trigger stream ────────────────────────────────────────────────────

#[derive(Message, Debug, Clone)]
pub struct GameplayTrigger {
    pub kind: TriggerKind,
    /// Name matched by upgrade name filters (enemy, weapon or damage source).
    pub source: String,
    pub position: Vec3,
}

pub struct EventBusPlugin;

impl Plugin for EventBusPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<EnemySpawned>()
            .add_message::<EnemyKilled>()
            .add_message::<WeaponThrown>()
            .add_message::<WeaponPickedUp>()
            .add_message::<PlayerDashed>()
            .add_message::<MeleeHit>()
            .add_message::<PlayerDamaged>()
            .add_message::<WaveStarted>()
            .add_message::<RoomCleared>()
            .add_message::<UpgradeGranted>()
            .add_message::<UpgradeActivated>()
            .add_message::<NavRebakeRequested>()
            .add_message::<DamageEnemy>()
            .add_message::<DamagePlayer>()
            .add_message::<GameplayTrigger>()
            .add_systems(
                PostUpdate,
                emit_gameplay_triggers_system.run_if(in_state(GameState::Playing)),
            );
    }
}

/// Fold every trigger-worthy domain message into a [`GameplayTrigger`].
#[allow(clippy::too_many_arguments)]
pub fn emit_gameplay_triggers_system(
    mut kills: MessageReader<EnemyKilled>,
    mut hits: MessageReader<MeleeHit>,
    mut throws: MessageReader<WeaponThrown>,
    mut pickups: MessageReader<WeaponPickedUp>,
    mut dashes: MessageReader<PlayerDashed>,
    mut damaged: MessageReader<PlayerDamaged>,
    mut waves: MessageReader<WaveStarted>,
    mut rooms: MessageReader<RoomCleared>,
    mut triggers: MessageWriter<GameplayTrigger>,
) {
    for e in kills.read() {
        triggers.write(GameplayTrigger {
            kind: TriggerKind::Kill,
            source: e.name.clone(),
            position: e.position,
        });
    }
    for e in hits.read() {
        triggers.write(GameplayTrigger {
            kind: TriggerKind::MeleeHit,
            source: e.weapon_name.clone(),
            position: e.position,
        });
    }
    for e in throws.read() {
        triggers.write(GameplayTrigger {
            kind: TriggerKind::Throw,
            source: e.name.clone(),
            position: e.position,
        });
    }
    for e in pickups.read() {
        triggers.write(GameplayTrigger {
            kind: TriggerKind::PickUp,
            source: e.name.clone(),
            position: e.position,
        });
    }
    for e in dashes.read() {
        triggers.write(GameplayTrigger {
            kind: TriggerKind::Dash,
            source: "dash".to_string(),
            position: e.position,
        });
    }
    for e in damaged.read() {
        triggers.write(GameplayTrigger {
            kind: TriggerKind::DamageTaken,
            source: e.source.clone(),
            position: e.position,
        });
    }
    for e in waves.read() {
        triggers.write(GameplayTrigger {
            kind: TriggerKind::WaveStarted,
            source: format!("wave {}", e.wave),
            position: Vec3::ZERO,
        });
    }
    for e in rooms.read() {
        triggers.write(GameplayTrigger {
            kind: TriggerKind::RoomCleared,
            source: format!("room {}", e.rooms_completed),
            position: Vec3::ZERO,
        });
    }
}
