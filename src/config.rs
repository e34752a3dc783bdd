//! Runtime gameplay configuration loaded from `assets/game.toml`.
//!
//! [`GameConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_game_config`] reads
//! `assets/game.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the values you care about.
//!
//! The enemy and upgrade catalogs follow the same policy through
//! [`read_toml_file`]; see [`crate::enemy::load_enemy_catalog`] and
//! [`crate::upgrade::load_upgrade_catalog`].

use crate::constants::*;
use crate::error::{validate_positive, validate_unit_interval, GameError, GameResult};
use bevy::prelude::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

pub const GAME_CONFIG_PATH: &str = "assets/game.toml";

/// Runtime-tunable gameplay configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // ── Arena ────────────────────────────────────────────────────────────────
    pub arena_half_size: f32,
    pub fallback_spawn_radius: f32,
    pub rng_seed: u64,

    // ── Player: Movement ─────────────────────────────────────────────────────
    pub player_move_speed: f32,
    pub player_acceleration: f32,
    pub dash_speed: f32,
    pub dash_duration: f32,
    pub dash_cooldown: f32,
    pub dash_invulnerability: f32,
    pub player_radius: f32,

    // ── Player: Health ───────────────────────────────────────────────────────
    pub player_max_hp: f32,
    pub player_invulnerability: f32,

    // ── Melee ────────────────────────────────────────────────────────────────
    pub fist_damage: f32,
    pub fist_range: f32,
    pub fist_arc_degrees: f32,
    pub fist_swing_cooldown: f32,
    pub fist_knockback: f32,
    pub min_swing_cooldown: f32,

    // ── Pickup / Throw ───────────────────────────────────────────────────────
    pub pickup_radius: f32,
    pub throw_loft: f32,
    pub thrown_settle_speed: f32,
    pub thrown_max_secs: f32,

    // ── Enemies ──────────────────────────────────────────────────────────────
    pub enemy_contact_range: f32,
    pub enemy_contact_cooldown: f32,
    pub enemy_acceleration: f32,
    pub enemy_radius: f32,

    // ── Waves / Threat budget ────────────────────────────────────────────────
    pub threat_base: f32,
    pub threat_per_wave: f32,
    pub threat_per_room: f32,
    pub threat_max_variance: f32,
    pub max_enemies_per_wave: usize,
    pub waves_per_room: u32,
    pub intermission_secs: f32,
    pub spawn_interval_secs: f32,

    // ── Surfaces ─────────────────────────────────────────────────────────────
    pub ice_traction: f32,
    pub oil_traction: f32,
    pub water_speed_multiplier: f32,
    pub oil_burn_secs: f32,
    pub oil_fire_dps: f32,
    pub burning_secs: f32,
    pub burning_dps: f32,

    // ── Navigation ───────────────────────────────────────────────────────────
    pub nav_cell_size: f32,

    // ── Console ──────────────────────────────────────────────────────────────
    pub console_spawn_distance: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            // Arena
            arena_half_size: ARENA_HALF_SIZE,
            fallback_spawn_radius: FALLBACK_SPAWN_RADIUS,
            rng_seed: RNG_SEED,
            // Player: Movement
            player_move_speed: PLAYER_MOVE_SPEED,
            player_acceleration: PLAYER_ACCELERATION,
            dash_speed: DASH_SPEED,
            dash_duration: DASH_DURATION,
            dash_cooldown: DASH_COOLDOWN,
            dash_invulnerability: DASH_INVULNERABILITY,
            player_radius: PLAYER_RADIUS,
            // Player: Health
            player_max_hp: PLAYER_MAX_HP,
            player_invulnerability: PLAYER_INVULNERABILITY,
            // Melee
            fist_damage: FIST_DAMAGE,
            fist_range: FIST_RANGE,
            fist_arc_degrees: FIST_ARC_DEGREES,
            fist_swing_cooldown: FIST_SWING_COOLDOWN,
            fist_knockback: FIST_KNOCKBACK,
            min_swing_cooldown: MIN_SWING_COOLDOWN,
            // Pickup / Throw
            pickup_radius: PICKUP_RADIUS,
            throw_loft: THROW_LOFT,
            thrown_settle_speed: THROWN_SETTLE_SPEED,
            thrown_max_secs: THROWN_MAX_SECS,
            // Enemies
            enemy_contact_range: ENEMY_CONTACT_RANGE,
            enemy_contact_cooldown: ENEMY_CONTACT_COOLDOWN,
            enemy_acceleration: ENEMY_ACCELERATION,
            enemy_radius: ENEMY_RADIUS,
            // Waves
            threat_base: THREAT_BASE,
            threat_per_wave: THREAT_PER_WAVE,
            threat_per_room: THREAT_PER_ROOM,
            threat_max_variance: THREAT_MAX_VARIANCE,
            max_enemies_per_wave: MAX_ENEMIES_PER_WAVE,
            waves_per_room: WAVES_PER_ROOM,
            intermission_secs: INTERMISSION_SECS,
            spawn_interval_secs: SPAWN_INTERVAL_SECS,
            // Surfaces
            ice_traction: ICE_TRACTION,
            oil_traction: OIL_TRACTION,
            water_speed_multiplier: WATER_SPEED_MULTIPLIER,
            oil_burn_secs: OIL_BURN_SECS,
            oil_fire_dps: OIL_FIRE_DPS,
            burning_secs: BURNING_SECS,
            burning_dps: BURNING_DPS,
            // Navigation
            nav_cell_size: NAV_CELL_SIZE,
            // Console
            console_spawn_distance: CONSOLE_SPAWN_DISTANCE,
        }
    }
}

impl GameConfig {
    /// Checks the values whose misconfiguration would stall or break a system
    /// (zero cell sizes, zero-length intervals, out-of-range fractions).
    pub fn validate(&self) -> GameResult<()> {
        validate_positive("player_move_speed", self.player_move_speed)?;
        validate_positive("player_acceleration", self.player_acceleration)?;
        validate_positive("min_swing_cooldown", self.min_swing_cooldown)?;
        validate_positive("spawn_interval_secs", self.spawn_interval_secs)?;
        validate_positive("nav_cell_size", self.nav_cell_size)?;
        validate_unit_interval("threat_max_variance", self.threat_max_variance)?;
        validate_unit_interval("ice_traction", self.ice_traction)?;
        validate_unit_interval("oil_traction", self.oil_traction)?;
        if !(self.intermission_secs.is_finite() && self.intermission_secs >= 0.0) {
            return Err(GameError::InvalidValue {
                name: "intermission_secs",
                value: self.intermission_secs,
                expected: "[0.0, ∞)",
            });
        }
        if self.max_enemies_per_wave == 0 {
            return Err(GameError::InvalidValue {
                name: "max_enemies_per_wave",
                value: 0.0,
                expected: "[1, ∞)",
            });
        }
        if self.waves_per_room == 0 {
            return Err(GameError::InvalidValue {
                name: "waves_per_room",
                value: 0.0,
                expected: "[1, ∞)",
            });
        }
        Ok(())
    }
}

/// Read and deserialize a TOML data file.
///
/// Returns `Ok(None)` when the file does not exist so callers can keep their
/// compiled defaults.
pub fn read_toml_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> GameResult<Option<T>> {
    let path = path.as_ref();
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => return Ok(None),
    };
    toml::from_str::<T>(&contents)
        .map(Some)
        .map_err(|e| GameError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

/// Startup system: attempt to load `assets/game.toml` and overwrite the
/// `GameConfig` resource with any values present in the file.
///
/// Parse or validation errors are logged and the defaults stay in place.
pub fn load_game_config(mut config: ResMut<GameConfig>) {
    match read_toml_file::<GameConfig>(GAME_CONFIG_PATH) {
        Ok(Some(loaded)) => match loaded.validate() {
            Ok(()) => {
                *config = loaded;
                info!("Loaded game config from {GAME_CONFIG_PATH}");
            }
            Err(e) => error!("Rejected {GAME_CONFIG_PATH}: {e}; using defaults"),
        },
        Ok(None) => info!("No {GAME_CONFIG_PATH} found; using compiled defaults"),
        Err(e) => error!("{e}; using defaults"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let cfg: GameConfig = toml::from_str("dash_speed = 30.0\nwaves_per_room = 5").unwrap();
        assert_eq!(cfg.dash_speed, 30.0);
        assert_eq!(cfg.waves_per_room, 5);
        assert_eq!(cfg.player_move_speed, PLAYER_MOVE_SPEED);
    }

    #[test]
    fn zero_waves_per_room_is_rejected() {
        let cfg = GameConfig {
            waves_per_room: 0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(GameError::InvalidValue {
                name: "waves_per_room",
                ..
            })
        ));
    }

    #[test]
    fn empty_waves_and_negative_intermission_are_rejected() {
        let no_enemies = GameConfig {
            max_enemies_per_wave: 0,
            ..Default::default()
        };
        assert!(matches!(
            no_enemies.validate(),
            Err(GameError::InvalidValue {
                name: "max_enemies_per_wave",
                ..
            })
        ));

        let negative = GameConfig {
            intermission_secs: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            negative.validate(),
            Err(GameError::InvalidValue {
                name: "intermission_secs",
                ..
            })
        ));

        let instant = GameConfig {
            intermission_secs: 0.0,
            ..Default::default()
        };
        assert!(instant.validate().is_ok());
    }

    #[test]
    fn missing_file_yields_none() {
        let loaded = read_toml_file::<GameConfig>("assets/does_not_exist.toml").unwrap();
        assert!(loaded.is_none());
    }
}
