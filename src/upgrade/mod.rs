//! Data-driven upgrades.
//!
//! ## Sub-module layout
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`stat`] | `WeaponStat`, `WeaponStats`, `StatModifier` and the player's modifier stack |
//! | [`trigger`] | `TriggerGate`, its evaluation order, and `TriggerUpgrade` |
//! | [`effect`] | `UpgradeEffect` variants and how they act on the world |
//!
//! An upgrade is either *passive* (permanent stat modifiers applied once when
//! granted) or *triggered* (a `TriggerUpgrade` entity parented to the player),
//! or both.  Definitions come from `assets/upgrades.toml`; the compiled
//! [`UpgradeCatalog::default`] is used when that file is absent.

pub mod effect;
pub mod stat;
pub mod trigger;

pub use effect::{run_effect, EffectContext, UpgradeEffect};
pub use stat::{
    compose_stat, tick_stat_modifiers_system, ModifierOp, StatModifier, StatModifiers,
    WeaponStat, WeaponStats,
};
pub use trigger::{GateOutcome, TriggerGate, TriggerUpgrade};

use bevy::prelude::*;
use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::config::read_toml_file;
use crate::error::{GameError, GameResult};
use crate::events::{emit_gameplay_triggers_system, RoomCleared, TriggerKind, UpgradeGranted};
use crate::player::Player;
use crate::state::{GameRng, GameState};

pub const UPGRADE_CATALOG_PATH: &str = "assets/upgrades.toml";

fn default_chance() -> f32 {
    1.0
}

fn default_every_nth() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TriggerSpec {
    pub on: TriggerKind,
    #[serde(default = "default_chance")]
    pub chance: f32,
    #[serde(default)]
    pub cooldown: f32,
    #[serde(default)]
    pub name_filter: Option<String>,
    #[serde(default = "default_every_nth")]
    pub every_nth: u32,
    pub effects: Vec<UpgradeEffect>,
}

impl TriggerSpec {
    pub fn gate(&self) -> TriggerGate {
        TriggerGate {
            kind: self.on,
            chance: self.chance.clamp(0.0, 1.0),
            cooldown_secs: self.cooldown.max(0.0),
            cooldown_remaining: 0.0,
            name_filter: self.name_filter.clone(),
            every_nth: self.every_nth.max(1),
            counter: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpgradeDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub passive: Vec<StatModifier>,
    #[serde(default)]
    pub trigger: Option<TriggerSpec>,
    /// Whether the upgrade may be granted more than once.
    #[serde(default)]
    pub stackable: bool,
}

#[derive(Resource, Debug, Clone, Deserialize)]
pub struct UpgradeCatalog {
    pub upgrades: Vec<UpgradeDefinition>,
}

impl UpgradeCatalog {
    pub fn get(&self, name: &str) -> GameResult<&UpgradeDefinition> {
        self.upgrades
            .iter()
            .find(|u| u.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| GameError::UnknownUpgrade(name.to_string()))
    }
}

impl Default for UpgradeCatalog {
    fn default() -> Self {
        Self {
            upgrades: vec![
                UpgradeDefinition {
                    name: "whetstone".into(),
                    description: "+3 melee damage".into(),
                    passive: vec![StatModifier::add(WeaponStat::Damage, 3.0)],
                    trigger: None,
                    stackable: true,
                },
                UpgradeDefinition {
                    name: "long_reach".into(),
                    description: "+25% range and swing arc".into(),
                    passive: vec![
                        StatModifier::multiply(WeaponStat::Range, 1.25),
                        StatModifier::multiply(WeaponStat::SwingArc, 1.25),
                    ],
                    trigger: None,
                    stackable: false,
                },
                UpgradeDefinition {
                    name: "bloodlust".into(),
                    description: "Kills heal and briefly speed up swings".into(),
                    passive: Vec::new(),
                    trigger: Some(TriggerSpec {
                        on: TriggerKind::Kill,
                        chance: 1.0,
                        cooldown: 0.0,
                        name_filter: None,
                        every_nth: 1,
                        effects: vec![
                            UpgradeEffect::Heal { amount: 4.0 },
                            UpgradeEffect::ModifyStat {
                                modifier: StatModifier::multiply(WeaponStat::SwingCooldown, 0.7),
                                duration: Some(3.0),
                            },
                        ],
                    }),
                    stackable: false,
                },
                UpgradeDefinition {
                    name: "volatile_throw".into(),
                    description: "Every second throw explodes where it left your hand".into(),
                    passive: vec![StatModifier::add(WeaponStat::ThrowDamage, 4.0)],
                    trigger: Some(TriggerSpec {
                        on: TriggerKind::Throw,
                        chance: 1.0,
                        cooldown: 0.0,
                        name_filter: None,
                        every_nth: 2,
                        effects: vec![UpgradeEffect::Explode {
                            radius: 3.0,
                            damage: 15.0,
                        }],
                    }),
                    stackable: false,
                },
                UpgradeDefinition {
                    name: "slipstream".into(),
                    description: "Dashing sometimes grants a burst of speed".into(),
                    passive: Vec::new(),
                    trigger: Some(TriggerSpec {
                        on: TriggerKind::Dash,
                        chance: 0.5,
                        cooldown: 2.0,
                        name_filter: None,
                        every_nth: 1,
                        effects: vec![UpgradeEffect::SpeedBoost {
                            multiplier: 1.4,
                            duration: 2.0,
                        }],
                    }),
                    stackable: false,
                },
                UpgradeDefinition {
                    name: "brute_breaker".into(),
                    description: "Killing a brute sends out a shockwave".into(),
                    passive: Vec::new(),
                    trigger: Some(TriggerSpec {
                        on: TriggerKind::Kill,
                        chance: 1.0,
                        cooldown: 1.0,
                        name_filter: Some("brute".into()),
                        every_nth: 1,
                        effects: vec![UpgradeEffect::Shockwave {
                            radius: 5.0,
                            force: 12.0,
                        }],
                    }),
                    stackable: false,
                },
            ],
        }
    }
}

/// Names of upgrades the player holds, in grant order (repeats for stacks).
#[derive(Resource, Debug, Clone, Default)]
pub struct OwnedUpgrades(pub Vec<String>);

impl OwnedUpgrades {
    pub fn owns(&self, name: &str) -> bool {
        self.0.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

/// Request to give the player an upgrade by catalog name.
#[derive(Message, Debug, Clone)]
pub struct GrantUpgrade {
    pub name: String,
}

/// Startup system: replace the compiled catalog with `assets/upgrades.toml`.
pub fn load_upgrade_catalog(mut catalog: ResMut<UpgradeCatalog>) {
    match read_toml_file::<UpgradeCatalog>(UPGRADE_CATALOG_PATH) {
        Ok(Some(loaded)) if !loaded.upgrades.is_empty() => {
            info!(
                "Loaded {} upgrades from {UPGRADE_CATALOG_PATH}",
                loaded.upgrades.len()
            );
            *catalog = loaded;
        }
        Ok(Some(_)) => warn!("{UPGRADE_CATALOG_PATH} defines no upgrades; using defaults"),
        Ok(None) => info!("No {UPGRADE_CATALOG_PATH} found; using compiled upgrades"),
        Err(e) => error!("{e}; using compiled upgrades"),
    }
}

/// Apply one upgrade definition to the player.
///
/// Passive modifiers go straight onto `mods`; a trigger spawns a
/// [`TriggerUpgrade`] parented to the player.
pub fn grant_upgrade(
    commands: &mut Commands,
    catalog: &UpgradeCatalog,
    owned: &mut OwnedUpgrades,
    player: Entity,
    mods: &mut StatModifiers,
    name: &str,
) -> GameResult<String> {
    let def = catalog.get(name)?;
    if !def.stackable && owned.owns(&def.name) {
        return Err(GameError::UpgradeAlreadyOwned(def.name.clone()));
    }

    for modifier in &def.passive {
        mods.push_permanent(*modifier, def.name.clone());
    }
    if let Some(spec) = &def.trigger {
        commands.spawn((
            TriggerUpgrade {
                name: def.name.clone(),
                gate: spec.gate(),
                effects: spec.effects.clone(),
            },
            ChildOf(player),
        ));
    }
    owned.0.push(def.name.clone());
    Ok(def.name.clone())
}

pub fn grant_upgrade_system(
    mut commands: Commands,
    mut requests: MessageReader<GrantUpgrade>,
    catalog: Res<UpgradeCatalog>,
    mut owned: ResMut<OwnedUpgrades>,
    mut q_player: Query<(Entity, &mut StatModifiers), With<Player>>,
    mut granted: MessageWriter<UpgradeGranted>,
) {
    for request in requests.read() {
        let Ok((player, mut mods)) = q_player.single_mut() else {
            let err = GameError::EntityNotFound {
                context: "grant upgrade",
            };
            warn!("Cannot grant '{}': {err}", request.name);
            continue;
        };
        match grant_upgrade(
            &mut commands,
            &catalog,
            &mut owned,
            player,
            &mut mods,
            &request.name,
        ) {
            Ok(name) => {
                info!("Granted upgrade '{name}'");
                granted.write(UpgradeGranted { name });
            }
            Err(e) => warn!("Cannot grant '{}': {e}", request.name),
        }
    }
}

/// Pick a reward the player can still take: stackables always qualify,
/// others only while unowned.
pub fn pick_room_reward<'a, R: rand::Rng + ?Sized>(
    catalog: &'a UpgradeCatalog,
    owned: &OwnedUpgrades,
    rng: &mut R,
) -> Option<&'a UpgradeDefinition> {
    let candidates: Vec<&UpgradeDefinition> = catalog
        .upgrades
        .iter()
        .filter(|u| u.stackable || !owned.owns(&u.name))
        .collect();
    candidates.choose(rng).copied()
}

/// Every cleared room rewards one random upgrade.
pub fn room_reward_system(
    mut rooms: MessageReader<RoomCleared>,
    catalog: Res<UpgradeCatalog>,
    owned: Res<OwnedUpgrades>,
    mut rng: ResMut<GameRng>,
    mut grants: MessageWriter<GrantUpgrade>,
) {
    for room in rooms.read() {
        if let Some(reward) = pick_room_reward(&catalog, &owned, &mut rng.0) {
            info!(
                "Room {} cleared; rewarding '{}'",
                room.rooms_completed, reward.name
            );
            grants.write(GrantUpgrade {
                name: reward.name.clone(),
            });
        }
    }
}

pub struct UpgradePlugin;

impl Plugin for UpgradePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<UpgradeCatalog>()
            .init_resource::<OwnedUpgrades>()
            .add_message::<GrantUpgrade>()
            .add_systems(Startup, load_upgrade_catalog)
            .add_systems(
                Update,
                (
                    trigger::tick_trigger_cooldowns_system,
                    tick_stat_modifiers_system,
                    grant_upgrade_system,
                )
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                PostUpdate,
                (trigger::trigger_upgrade_system, room_reward_system)
                    .after(emit_gameplay_triggers_system)
                    .run_if(in_state(GameState::Playing)),
            );
    }
}
