//! Child effects run by an activated upgrade.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use serde::Deserialize;

use super::stat::{StatModifier, StatModifiers};
use crate::config::GameConfig;
use crate::enemy::Enemy;
use crate::events::DamageEnemy;
use crate::player::{Player, PlayerHealth, SpeedBoosts};
use crate::state::GameRng;
use crate::surface::{OilFire, Surface, SurfaceKind};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpgradeEffect {
    /// Push a stat modifier onto the player's stack, permanently when no
    /// duration is given.
    ModifyStat {
        modifier: StatModifier,
        #[serde(default)]
        duration: Option<f32>,
    },
    Heal {
        amount: f32,
    },
    /// Damage every enemy within `radius` of the trigger position and ignite
    /// oil under it.
    Explode {
        radius: f32,
        damage: f32,
    },
    SpeedBoost {
        multiplier: f32,
        duration: f32,
    },
    /// Knock enemies away from the trigger position without damaging them.
    Shockwave {
        radius: f32,
        force: f32,
    },
}

/// Everything an effect may touch.
#[derive(SystemParam)]
pub struct EffectContext<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub rng: ResMut<'w, GameRng>,
    pub config: Res<'w, GameConfig>,
    pub players: Query<
        'w,
        's,
        (
            &'static mut PlayerHealth,
            &'static mut StatModifiers,
            &'static mut SpeedBoosts,
        ),
        With<Player>,
    >,
    pub enemies: Query<'w, 's, (Entity, &'static Transform), With<Enemy>>,
    pub surfaces: Query<'w, 's, (Entity, &'static Transform, &'static Surface, Has<OilFire>)>,
    pub enemy_damage: MessageWriter<'w, DamageEnemy>,
}

/// Knockback impulse pointing from `origin` to `target` on the ground plane.
pub fn radial_impulse(origin: Vec3, target: Vec3, force: f32) -> Vec3 {
    let mut dir = target - origin;
    dir.y = 0.0;
    let dir = dir.normalize_or_zero();
    if dir == Vec3::ZERO {
        Vec3::X * force
    } else {
        dir * force
    }
}

pub fn run_effect(
    effect: &UpgradeEffect,
    source: &str,
    position: Vec3,
    ctx: &mut EffectContext,
) {
    match effect {
        UpgradeEffect::ModifyStat { modifier, duration } => {
            for (_, mut mods, _) in ctx.players.iter_mut() {
                match duration {
                    Some(secs) => mods.push_timed(*modifier, *secs, source),
                    None => mods.push_permanent(*modifier, source),
                }
            }
        }
        UpgradeEffect::Heal { amount } => {
            for (mut health, _, _) in ctx.players.iter_mut() {
                health.heal(*amount);
            }
        }
        UpgradeEffect::SpeedBoost {
            multiplier,
            duration,
        } => {
            for (_, _, mut boosts) in ctx.players.iter_mut() {
                boosts.push(*multiplier, *duration);
            }
        }
        UpgradeEffect::Explode { radius, damage } => {
            let r2 = radius * radius;
            for (enemy, transform) in ctx.enemies.iter() {
                if transform.translation.distance_squared(position) <= r2 {
                    ctx.enemy_damage.write(DamageEnemy {
                        target: enemy,
                        amount: *damage,
                        source: source.to_string(),
                        knockback: radial_impulse(position, transform.translation, damage * 0.2),
                    });
                }
            }
            for (entity, transform, surface, burning) in ctx.surfaces.iter() {
                if surface.kind != SurfaceKind::Oil || burning {
                    continue;
                }
                if surface.overlaps_circle(transform.translation, position, *radius) {
                    info!("Explosion from '{source}' ignited oil");
                    ctx.commands.entity(entity).insert(OilFire {
                        remaining_secs: ctx.config.oil_burn_secs,
                    });
                }
            }
        }
        UpgradeEffect::Shockwave { radius, force } => {
            let r2 = radius * radius;
            for (enemy, transform) in ctx.enemies.iter() {
                if transform.translation.distance_squared(position) <= r2 {
                    ctx.enemy_damage.write(DamageEnemy {
                        target: enemy,
                        amount: 0.0,
                        source: source.to_string(),
                        knockback: radial_impulse(position, transform.translation, *force),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{GameplayTrigger, TriggerKind, UpgradeActivated};
    use crate::upgrade::stat::WeaponStat;
    use crate::upgrade::trigger::{trigger_upgrade_system, TriggerGate, TriggerUpgrade};

    #[test]
    fn radial_impulse_ignores_height_and_handles_overlap() {
        let push = radial_impulse(Vec3::ZERO, Vec3::new(0.0, 5.0, 2.0), 3.0);
        assert!((push - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-5);

        let fallback = radial_impulse(Vec3::ONE, Vec3::ONE, 2.0);
        assert_eq!(fallback.length(), 2.0);
    }

    #[test]
    fn effects_parse_from_tagged_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            effects: Vec<UpgradeEffect>,
        }
        let w: Wrapper = toml::from_str(
            r#"
            effects = [
                { type = "heal", amount = 5.0 },
                { type = "modify_stat", modifier = { stat = "damage", op = "add", value = 2.0 } },
                { type = "explode", radius = 3.0, damage = 20.0 },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(w.effects.len(), 3);
        assert!(matches!(
            w.effects[1],
            UpgradeEffect::ModifyStat { duration: None, .. }
        ));
    }

    fn effect_world() -> World {
        let mut world = World::new();
        world.insert_resource(GameConfig::default());
        world.insert_resource(GameRng::from_seed(7));
        world.init_resource::<Messages<GameplayTrigger>>();
        world.init_resource::<Messages<DamageEnemy>>();
        world.init_resource::<Messages<UpgradeActivated>>();
        world
    }

    #[test]
    fn throw_upgrade_explodes_pushes_and_buffs() {
        let mut world = effect_world();
        let player = world
            .spawn((
                Player,
                PlayerHealth::new(100.0),
                StatModifiers::default(),
                SpeedBoosts::default(),
            ))
            .id();
        let near = world
            .spawn((Enemy, Transform::from_xyz(2.0, 0.0, 0.0)))
            .id();
        world.spawn((Enemy, Transform::from_xyz(20.0, 0.0, 0.0)));
        let oil = world
            .spawn((
                Surface {
                    kind: SurfaceKind::Oil,
                    half_extents: Vec2::new(1.0, 1.0),
                },
                Transform::from_xyz(4.0, 0.0, 0.0),
            ))
            .id();
        let far_oil = world
            .spawn((
                Surface {
                    kind: SurfaceKind::Oil,
                    half_extents: Vec2::new(1.0, 1.0),
                },
                Transform::from_xyz(-20.0, 0.0, 0.0),
            ))
            .id();
        world.spawn(TriggerUpgrade {
            name: "volatile_throw".into(),
            gate: TriggerGate::new(TriggerKind::Throw),
            effects: vec![
                UpgradeEffect::Explode {
                    radius: 3.0,
                    damage: 15.0,
                },
                UpgradeEffect::Shockwave {
                    radius: 5.0,
                    force: 6.0,
                },
                UpgradeEffect::SpeedBoost {
                    multiplier: 1.5,
                    duration: 2.0,
                },
                UpgradeEffect::ModifyStat {
                    modifier: StatModifier::add(WeaponStat::Damage, 4.0),
                    duration: Some(5.0),
                },
            ],
        });

        world.write_message(GameplayTrigger {
            kind: TriggerKind::Throw,
            source: "bat".into(),
            position: Vec3::ZERO,
        });
        let mut schedule = Schedule::default();
        schedule.add_systems(trigger_upgrade_system);
        schedule.run(&mut world);

        let damage = world.resource::<Messages<DamageEnemy>>();
        let mut cursor = damage.get_cursor();
        let hits: Vec<&DamageEnemy> = cursor.read(damage).collect();
        assert_eq!(hits.len(), 2, "only the enemy in range is hit");
        assert!(hits.iter().all(|d| d.target == near));
        assert_eq!(hits[0].amount, 15.0);
        assert!((hits[0].knockback - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-4);
        assert_eq!(hits[1].amount, 0.0);
        assert!((hits[1].knockback - Vec3::new(6.0, 0.0, 0.0)).length() < 1e-4);

        let burn_secs = world.resource::<GameConfig>().oil_burn_secs;
        assert_eq!(world.get::<OilFire>(oil).unwrap().remaining_secs, burn_secs);
        assert!(world.get::<OilFire>(far_oil).is_none());

        let boosts = world.get::<SpeedBoosts>(player).unwrap();
        assert_eq!(boosts.active, vec![(1.5, 2.0)]);
        let mods = world.get::<StatModifiers>(player).unwrap();
        assert_eq!(mods.active.len(), 1);
        assert_eq!(mods.active[0].remaining_secs, Some(5.0));
        assert_eq!(mods.active[0].source, "volatile_throw");

        let activated = world.resource::<Messages<UpgradeActivated>>();
        assert_eq!(activated.get_cursor().read(activated).count(), 1);
    }

    #[test]
    fn explosion_leaves_burning_oil_alone() {
        let mut world = effect_world();
        let oil = world
            .spawn((
                Surface {
                    kind: SurfaceKind::Oil,
                    half_extents: Vec2::new(1.0, 1.0),
                },
                OilFire { remaining_secs: 0.5 },
                Transform::default(),
            ))
            .id();
        world.spawn(TriggerUpgrade {
            name: "kaboom".into(),
            gate: TriggerGate::new(TriggerKind::Kill),
            effects: vec![UpgradeEffect::Explode {
                radius: 2.0,
                damage: 5.0,
            }],
        });
        world.write_message(GameplayTrigger {
            kind: TriggerKind::Kill,
            source: "grunt".into(),
            position: Vec3::ZERO,
        });

        let mut schedule = Schedule::default();
        schedule.add_systems(trigger_upgrade_system);
        schedule.run(&mut world);

        assert_eq!(world.get::<OilFire>(oil).unwrap().remaining_secs, 0.5);
    }
}
