//! Centralised gameplay constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place without source-diving across multiple modules.
//! [`crate::config::GameConfig`] mirrors these as runtime-overridable fields;
//! the values below are the compiled defaults.

// ── Arena ────────────────────────────────────────────────────────────────────

/// Half-width of the square arena floor (world units, XZ plane).
pub const ARENA_HALF_SIZE: f32 = 20.0;

/// Radius of the fallback spawn ring used when no `SpawnPoint` entities exist.
pub const FALLBACK_SPAWN_RADIUS: f32 = 15.0;

/// Seed for the gameplay RNG.  `0` means "seed from entropy".
pub const RNG_SEED: u64 = 0;

// ── Player: Movement ─────────────────────────────────────────────────────────

/// Top ground speed (u/s) on a neutral surface.
pub const PLAYER_MOVE_SPEED: f32 = 7.0;

/// Rate (u/s²) at which velocity approaches the target on full traction.
///
/// Multiplied by surface traction, so ice (0.15) turns this into a long slide.
pub const PLAYER_ACCELERATION: f32 = 60.0;

/// Speed of the dash burst (u/s).
pub const DASH_SPEED: f32 = 22.0;

/// Seconds the dash burst lasts before normal steering resumes.
pub const DASH_DURATION: f32 = 0.18;

/// Minimum interval between dashes.
pub const DASH_COOLDOWN: f32 = 0.9;

/// Invulnerability granted by a dash.
pub const DASH_INVULNERABILITY: f32 = 0.25;

/// Collider radius of the player capsule.
pub const PLAYER_RADIUS: f32 = 0.45;

// ── Player: Health ───────────────────────────────────────────────────────────

pub const PLAYER_MAX_HP: f32 = 100.0;

/// Invulnerability window after taking a hit.
pub const PLAYER_INVULNERABILITY: f32 = 0.6;

// ── Melee ────────────────────────────────────────────────────────────────────

/// Fist damage used when no weapon is held.
pub const FIST_DAMAGE: f32 = 6.0;
pub const FIST_RANGE: f32 = 1.4;
/// Full swing arc in degrees.
pub const FIST_ARC_DEGREES: f32 = 90.0;
pub const FIST_SWING_COOLDOWN: f32 = 0.35;
pub const FIST_KNOCKBACK: f32 = 3.0;

/// Stat modifiers may never push a swing cooldown below this.
pub const MIN_SWING_COOLDOWN: f32 = 0.08;

// ── Pickup / Throw ───────────────────────────────────────────────────────────

/// Radius within which `interact` grabs the nearest item.
pub const PICKUP_RADIUS: f32 = 1.6;

/// Upward velocity component added to a throw so items arc.
pub const THROW_LOFT: f32 = 2.5;

/// Thrown items slower than this (u/s) settle back into pickups.
pub const THROWN_SETTLE_SPEED: f32 = 0.8;

/// Hard limit on how long an item stays in the thrown state.
pub const THROWN_MAX_SECS: f32 = 3.0;

/// Hold offset in front of / above the player.
pub const HELD_OFFSET_FORWARD: f32 = 0.6;
pub const HELD_OFFSET_UP: f32 = 0.4;

// ── Enemies ──────────────────────────────────────────────────────────────────

/// Distance at which an enemy damages the player on contact.
pub const ENEMY_CONTACT_RANGE: f32 = 1.1;

/// Minimum interval between contact hits from the same enemy.
pub const ENEMY_CONTACT_COOLDOWN: f32 = 1.0;

/// Rate (u/s²) at which enemies steer back toward their seek velocity.
///
/// Knockback is an instant velocity impulse, so this also sets how quickly a
/// knocked-back enemy recovers.
pub const ENEMY_ACCELERATION: f32 = 18.0;

pub const ENEMY_RADIUS: f32 = 0.5;

// ── Waves / Threat budget ────────────────────────────────────────────────────

/// Budget granted to the very first wave.
pub const THREAT_BASE: f32 = 4.0;

/// Budget added per wave number.
pub const THREAT_PER_WAVE: f32 = 2.0;

/// Budget added per completed room.
pub const THREAT_PER_ROOM: f32 = 3.0;

/// Maximum relative deviation from the nominal budget (0.2 = ±20 %).
pub const THREAT_MAX_VARIANCE: f32 = 0.2;

/// Cap on enemies composed into one wave regardless of budget.
pub const MAX_ENEMIES_PER_WAVE: usize = 16;

pub const WAVES_PER_ROOM: u32 = 3;

/// Pause between a cleared wave and the next wave start.
pub const INTERMISSION_SECS: f32 = 3.0;

/// Interval between individual spawns inside a wave.
pub const SPAWN_INTERVAL_SECS: f32 = 0.6;

// ── Surfaces ─────────────────────────────────────────────────────────────────

pub const ICE_TRACTION: f32 = 0.15;
pub const OIL_TRACTION: f32 = 0.35;
pub const WATER_SPEED_MULTIPLIER: f32 = 0.6;

/// How long ignited oil keeps burning.
pub const OIL_BURN_SECS: f32 = 6.0;

/// Damage per second dealt to actors standing on burning oil.
pub const OIL_FIRE_DPS: f32 = 12.0;

/// Duration of the `Burning` status after leaving fire.
pub const BURNING_SECS: f32 = 2.0;

/// Damage per second while `Burning`.
pub const BURNING_DPS: f32 = 5.0;

// ── Navigation ───────────────────────────────────────────────────────────────

/// Edge length of a navigation grid cell.
pub const NAV_CELL_SIZE: f32 = 1.0;

// ── Console ──────────────────────────────────────────────────────────────────

pub const MIN_TIMESCALE: f32 = 0.05;
pub const MAX_TIMESCALE: f32 = 10.0;

/// Distance in front of the player where `/spawn` places an enemy.
pub const CONSOLE_SPAWN_DISTANCE: f32 = 4.0;
