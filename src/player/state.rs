//! Player components and resources.
//!
//! All ECS components and Bevy resources that describe player state live here.
//! Systems that mutate this state are in the sibling modules:
//! - [`super::control`] — input, movement and dash
//! - [`super::combat`] — melee swings and incoming damage
//! - [`super::throwing`] — item pickup, hold and throw

use crate::config::GameConfig;
use crate::constants::PLAYER_MAX_HP;
use bevy::prelude::*;

// ── Components ─────────────────────────────────────────────────────────────────

/// Marker component for the player entity.
#[derive(Component)]
pub struct Player;

/// Current HP and the remaining invulnerability window after a hit or dash.
#[derive(Component, Debug, Clone)]
pub struct PlayerHealth {
    pub hp: f32,
    pub max_hp: f32,
    /// Seconds of invulnerability remaining; decremented each frame.
    pub inv_timer: f32,
}

impl Default for PlayerHealth {
    fn default() -> Self {
        Self {
            hp: PLAYER_MAX_HP,
            max_hp: PLAYER_MAX_HP,
            inv_timer: 0.0,
        }
    }
}

impl PlayerHealth {
    pub fn new(max_hp: f32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            inv_timer: 0.0,
        }
    }

    pub fn heal(&mut self, amount: f32) {
        self.hp = (self.hp + amount.max(0.0)).min(self.max_hp);
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }
}

/// Unit direction the player faces on the ground plane.
///
/// Melee arcs and throws are aimed along this vector.
#[derive(Component, Debug, Clone, Copy)]
pub struct Facing(pub Vec3);

impl Default for Facing {
    fn default() -> Self {
        Self(Vec3::NEG_Z)
    }
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct DashState {
    /// Seconds until the next dash is allowed.
    pub cooldown: f32,
    /// Seconds of the current dash burst left; `0` when not dashing.
    pub active_remaining: f32,
    pub direction: Vec3,
}

impl DashState {
    pub fn is_dashing(&self) -> bool {
        self.active_remaining > 0.0
    }
}

/// Stack of temporary move-speed multipliers granted by upgrades.
#[derive(Component, Debug, Clone, Default)]
pub struct SpeedBoosts {
    /// `(multiplier, seconds remaining)`
    pub active: Vec<(f32, f32)>,
}

impl SpeedBoosts {
    pub fn push(&mut self, multiplier: f32, secs: f32) {
        self.active.push((multiplier.max(0.0), secs));
    }

    pub fn factor(&self) -> f32 {
        self.active.iter().map(|(m, _)| *m).product()
    }

    pub fn tick(&mut self, dt: f32) {
        for (_, remaining) in &mut self.active {
            *remaining -= dt;
        }
        self.active.retain(|(_, remaining)| *remaining > 0.0);
    }
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct MeleeCooldown {
    pub timer: f32,
}

/// The item currently in the player's hands, if any.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct HeldItem(pub Option<Entity>);

// ── Resources ──────────────────────────────────────────────────────────────────

/// Per-frame player input, decoupled from the device that produced it.
///
/// Written by `keyboard_to_intent_system`; consumed by movement, combat and
/// throwing.  Tests insert it directly.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct PlayerIntent {
    /// Desired direction on the XZ plane (x → world X, y → world Z).
    pub move_dir: Vec2,
    pub dash: bool,
    pub melee: bool,
    pub interact: bool,
    pub throw: bool,
}

impl PlayerIntent {
    /// Movement direction in world space, normalised (or zero).
    pub fn world_move_dir(&self) -> Vec3 {
        Vec3::new(self.move_dir.x, 0.0, self.move_dir.y).normalize_or_zero()
    }
}

/// Build a fresh `PlayerHealth` from config.
pub fn player_health_from_config(config: &GameConfig) -> PlayerHealth {
    PlayerHealth::new(config.player_max_hp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heal_never_exceeds_max() {
        let mut hp = PlayerHealth::new(50.0);
        hp.hp = 45.0;
        hp.heal(20.0);
        assert_eq!(hp.hp, 50.0);
        hp.heal(-10.0);
        assert_eq!(hp.hp, 50.0);
    }

    #[test]
    fn speed_boosts_multiply_and_expire() {
        let mut boosts = SpeedBoosts::default();
        assert_eq!(boosts.factor(), 1.0);
        boosts.push(1.5, 1.0);
        boosts.push(2.0, 3.0);
        assert_eq!(boosts.factor(), 3.0);
        boosts.tick(1.5);
        assert_eq!(boosts.factor(), 2.0);
        boosts.tick(2.0);
        assert!(boosts.active.is_empty());
    }

    #[test]
    fn intent_direction_maps_to_ground_plane() {
        let intent = PlayerIntent {
            move_dir: Vec2::new(3.0, -4.0),
            ..Default::default()
        };
        let dir = intent.world_move_dir();
        assert!((dir - Vec3::new(0.6, 0.0, -0.8)).length() < 1e-5);
    }
}
