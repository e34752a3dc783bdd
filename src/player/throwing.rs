//! Item pickup, holding and throwing.
//!
//! Items cycle through three states:
//!
//! ```text
//!   Pickup ──interact──► Held ──throw──► Thrown ──settles──► Pickup
//! ```
//!
//! While held, an item's rigid body and collider are disabled and it is
//! pinned in front of the player.  A thrown item deals its effective
//! `ThrowDamage` once to each enemy it touches, then settles back into a
//! pickup when it slows down or its flight times out.

use super::state::{Facing, HeldItem, Player, PlayerIntent};
use crate::config::GameConfig;
use crate::constants::{HELD_OFFSET_FORWARD, HELD_OFFSET_UP};
use crate::enemy::Enemy;
use crate::error::GameError;
use crate::events::{DamageEnemy, WeaponPickedUp, WeaponThrown};
use crate::upgrade::{StatModifiers, WeaponStats};
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

/// A named, throwable item.  Weapons also carry [`WeaponStats`].
#[derive(Component, Debug, Clone)]
pub struct Item {
    pub name: String,
}

/// Item lying in the world, available to `interact`.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Pickup;

#[derive(Component, Debug, Clone, Copy)]
pub struct Held {
    pub holder: Entity,
}

#[derive(Component, Debug, Clone)]
pub struct Thrown {
    pub age: f32,
    pub damage: f32,
    pub knockback: f32,
    /// Enemies already damaged by this flight.
    pub hit: Vec<Entity>,
}

/// Closest pickup within `radius` of `origin`, ignoring height.
pub fn nearest_pickup(
    origin: Vec3,
    radius: f32,
    pickups: impl IntoIterator<Item = (Entity, Vec3)>,
) -> Option<Entity> {
    let r2 = radius * radius;
    pickups
        .into_iter()
        .map(|(e, p)| {
            let d = Vec3::new(p.x - origin.x, 0.0, p.z - origin.z).length_squared();
            (e, d)
        })
        .filter(|(_, d2)| *d2 <= r2)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(e, _)| e)
}

/// Throw velocity: along facing at `speed`, plus loft.
pub fn throw_velocity(facing: Vec3, speed: f32, loft: f32) -> Vec3 {
    let flat = Vec3::new(facing.x, 0.0, facing.z).normalize_or(Vec3::NEG_Z);
    flat * speed + Vec3::Y * loft
}

pub fn spawn_weapon(
    commands: &mut Commands,
    name: &str,
    stats: WeaponStats,
    position: Vec3,
) -> Entity {
    commands
        .spawn((
            Item {
                name: name.to_string(),
            },
            stats,
            Pickup,
            Transform::from_translation(position),
            Visibility::default(),
            RigidBody::Dynamic,
            Collider::cuboid(0.12, 0.12, 0.45),
            Velocity::zero(),
            Restitution::coefficient(0.2),
            ActiveEvents::COLLISION_EVENTS,
        ))
        .id()
}

/// Weapons placed in a fresh arena.
pub fn starter_weapons() -> Vec<(&'static str, WeaponStats)> {
    vec![
        (
            "bat",
            WeaponStats {
                damage: 12.0,
                range: 1.9,
                swing_arc_degrees: 110.0,
                swing_cooldown: 0.45,
                knockback: 6.0,
                throw_speed: 14.0,
                throw_damage: 10.0,
            },
        ),
        (
            "pipe",
            WeaponStats {
                damage: 16.0,
                range: 2.2,
                swing_arc_degrees: 80.0,
                swing_cooldown: 0.65,
                knockback: 4.0,
                throw_speed: 12.0,
                throw_damage: 14.0,
            },
        ),
        (
            "brick",
            WeaponStats {
                damage: 5.0,
                range: 1.2,
                swing_arc_degrees: 70.0,
                swing_cooldown: 0.3,
                knockback: 2.0,
                throw_speed: 20.0,
                throw_damage: 22.0,
            },
        ),
    ]
}

pub fn pickup_system(
    mut commands: Commands,
    config: Res<GameConfig>,
    intent: Res<PlayerIntent>,
    mut q_player: Query<(Entity, &Transform, &mut HeldItem), With<Player>>,
    q_pickups: Query<(Entity, &Transform, &Item), With<Pickup>>,
    mut picked: MessageWriter<WeaponPickedUp>,
) {
    if !intent.interact {
        return;
    }
    let Ok((player, transform, mut held)) = q_player.single_mut() else {
        return;
    };
    if held.0.is_some() {
        return;
    }

    let Some(target) = nearest_pickup(
        transform.translation,
        config.pickup_radius,
        q_pickups.iter().map(|(e, t, _)| (e, t.translation)),
    ) else {
        return;
    };
    let Ok((_, item_transform, item)) = q_pickups.get(target) else {
        return;
    };

    commands
        .entity(target)
        .remove::<Pickup>()
        .insert((Held { holder: player }, RigidBodyDisabled, ColliderDisabled));
    held.0 = Some(target);
    picked.write(WeaponPickedUp {
        weapon: target,
        name: item.name.clone(),
        position: item_transform.translation,
    });
}

/// Pin held items in front of their holder.
pub fn held_follow_system(
    q_holders: Query<(&Transform, &Facing), Without<Held>>,
    mut q_held: Query<(&Held, &mut Transform)>,
) {
    for (held, mut transform) in q_held.iter_mut() {
        let Ok((holder, facing)) = q_holders.get(held.holder) else {
            continue;
        };
        transform.translation =
            holder.translation + facing.0 * HELD_OFFSET_FORWARD + Vec3::Y * HELD_OFFSET_UP;
        transform.rotation = holder.rotation;
    }
}

#[allow(clippy::type_complexity)]
pub fn throw_system(
    mut commands: Commands,
    config: Res<GameConfig>,
    intent: Res<PlayerIntent>,
    mut q_player: Query<(&Facing, &StatModifiers, &mut HeldItem), With<Player>>,
    q_items: Query<(&Item, &Transform, Option<&WeaponStats>)>,
    mut thrown: MessageWriter<WeaponThrown>,
) {
    if !intent.throw {
        return;
    }
    let Ok((facing, mods, mut held)) = q_player.single_mut() else {
        return;
    };
    let Some(item_entity) = held.0 else {
        return;
    };
    held.0 = None;

    let Ok((item, transform, stats)) = q_items.get(item_entity) else {
        let err = GameError::EntityNotFound {
            context: "throw held item",
        };
        warn!("{err} ({item_entity:?})");
        return;
    };
    let base = stats.copied().unwrap_or_else(|| WeaponStats::fists(&config));
    let effective = mods.apply(&base, config.min_swing_cooldown);
    let velocity = throw_velocity(facing.0, effective.throw_speed, config.throw_loft);

    commands
        .entity(item_entity)
        .remove::<(Held, RigidBodyDisabled, ColliderDisabled)>()
        .insert((
            Thrown {
                age: 0.0,
                damage: effective.throw_damage,
                knockback: effective.knockback,
                hit: Vec::new(),
            },
            Velocity {
                linvel: velocity,
                angvel: Vec3::new(0.0, 8.0, 0.0),
            },
        ));
    thrown.write(WeaponThrown {
        weapon: item_entity,
        name: item.name.clone(),
        position: transform.translation,
        velocity,
    });
}

/// Thrown items damage each enemy they touch once per flight.
pub fn thrown_hit_system(
    mut collision_events: MessageReader<CollisionEvent>,
    mut q_thrown: Query<(&Item, &Velocity, &mut Thrown)>,
    q_enemies: Query<(), With<Enemy>>,
    mut damage: MessageWriter<DamageEnemy>,
) {
    for event in collision_events.read() {
        let (e1, e2) = match event {
            CollisionEvent::Started(e1, e2, _) => (*e1, *e2),
            CollisionEvent::Stopped(..) => continue,
        };

        let (item_entity, enemy) = if q_thrown.contains(e1) && q_enemies.contains(e2) {
            (e1, e2)
        } else if q_thrown.contains(e2) && q_enemies.contains(e1) {
            (e2, e1)
        } else {
            continue;
        };

        let Ok((item, velocity, mut thrown)) = q_thrown.get_mut(item_entity) else {
            continue;
        };
        if thrown.hit.contains(&enemy) {
            continue;
        }
        thrown.hit.push(enemy);

        let mut push = velocity.linvel;
        push.y = 0.0;
        let push = push.normalize_or_zero() * thrown.knockback;
        damage.write(
            DamageEnemy::new(enemy, thrown.damage, item.name.clone()).with_knockback(push),
        );
    }
}

/// Return slow or timed-out thrown items to the pickup pool.
pub fn thrown_settle_system(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    mut q_thrown: Query<(Entity, &Velocity, &mut Thrown)>,
) {
    const MIN_FLIGHT_SECS: f32 = 0.2;

    for (entity, velocity, mut thrown) in q_thrown.iter_mut() {
        thrown.age += time.delta_secs();
        let slow = thrown.age >= MIN_FLIGHT_SECS
            && velocity.linvel.length() < config.thrown_settle_speed;
        if slow || thrown.age >= config.thrown_max_secs {
            commands.entity(entity).remove::<Thrown>().insert(Pickup);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_rapier3d::rapier::geometry::CollisionEventFlags;

    fn brick() -> WeaponStats {
        starter_weapons()
            .into_iter()
            .find(|(n, _)| *n == "brick")
            .map(|(_, s)| s)
            .unwrap()
    }

    fn throwing_app(intent: PlayerIntent) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(GameConfig::default());
        app.insert_resource(intent);
        app.add_message::<CollisionEvent>();
        app.add_message::<WeaponPickedUp>();
        app.add_message::<WeaponThrown>();
        app.add_message::<DamageEnemy>();
        app
    }

    fn spawn_player(app: &mut App, held: Option<Entity>) -> Entity {
        app.world_mut()
            .spawn((
                Player,
                Transform::default(),
                Facing(Vec3::X),
                StatModifiers::default(),
                HeldItem(held),
            ))
            .id()
    }

    #[test]
    fn nearest_pickup_respects_radius_and_distance() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let found = nearest_pickup(
            Vec3::ZERO,
            2.0,
            [(a, Vec3::new(1.5, 0.0, 0.0)), (b, Vec3::new(0.0, 3.0, 1.0))],
        );
        assert_eq!(found, Some(b));
        assert_eq!(nearest_pickup(Vec3::ZERO, 0.5, [(a, Vec3::X)]), None);
    }

    #[test]
    fn throw_velocity_is_flat_forward_plus_loft() {
        let v = throw_velocity(Vec3::new(0.0, 0.5, 1.0), 10.0, 2.0);
        assert!((v - Vec3::new(0.0, 2.0, 10.0)).length() < 1e-4);
    }

    #[test]
    fn interact_picks_up_the_nearest_item() {
        let mut app = throwing_app(PlayerIntent {
            interact: true,
            ..Default::default()
        });
        app.add_systems(Update, pickup_system);
        let player = spawn_player(&mut app, None);
        let near = app
            .world_mut()
            .spawn((Item { name: "brick".into() }, Pickup, Transform::from_xyz(0.5, 0.0, 0.0)))
            .id();
        let _far = app
            .world_mut()
            .spawn((Item { name: "bat".into() }, Pickup, Transform::from_xyz(1.4, 0.0, 0.0)))
            .id();

        app.update();

        assert_eq!(app.world().get::<HeldItem>(player).unwrap().0, Some(near));
        assert!(app.world().get::<Pickup>(near).is_none());
        assert_eq!(app.world().get::<Held>(near).unwrap().holder, player);
    }

    #[test]
    fn throw_releases_item_with_effective_stats() {
        let mut app = throwing_app(PlayerIntent {
            throw: true,
            ..Default::default()
        });
        app.add_systems(Update, throw_system);
        let item = app
            .world_mut()
            .spawn((
                Item { name: "brick".into() },
                brick(),
                Held {
                    holder: Entity::PLACEHOLDER,
                },
                Transform::default(),
                Velocity::zero(),
            ))
            .id();
        let player = spawn_player(&mut app, Some(item));

        app.update();

        assert_eq!(app.world().get::<HeldItem>(player).unwrap().0, None);
        assert!(app.world().get::<Held>(item).is_none());
        let thrown = app.world().get::<Thrown>(item).unwrap();
        assert_eq!(thrown.damage, brick().throw_damage);
        let v = app.world().get::<Velocity>(item).unwrap().linvel;
        assert!((v.x - brick().throw_speed).abs() < 1e-4);
        assert!(v.y > 0.0);
    }

    #[test]
    fn throwing_a_despawned_item_frees_the_hand_without_a_throw() {
        let mut app = throwing_app(PlayerIntent {
            throw: true,
            ..Default::default()
        });
        app.add_systems(Update, throw_system);
        let gone = app.world_mut().spawn_empty().id();
        app.world_mut().despawn(gone);
        let player = spawn_player(&mut app, Some(gone));

        app.update();

        assert_eq!(app.world().get::<HeldItem>(player).unwrap().0, None);
        let messages = app.world().resource::<Messages<WeaponThrown>>();
        let mut cursor = messages.get_cursor();
        assert_eq!(cursor.read(messages).count(), 0);
    }

    #[test]
    fn thrown_item_damages_each_enemy_once() {
        let mut app = throwing_app(PlayerIntent::default());
        app.add_systems(PostUpdate, thrown_hit_system);
        let item = app
            .world_mut()
            .spawn((
                Item { name: "brick".into() },
                Velocity::linear(Vec3::new(10.0, 0.0, 0.0)),
                Thrown {
                    age: 0.0,
                    damage: 22.0,
                    knockback: 2.0,
                    hit: Vec::new(),
                },
            ))
            .id();
        let enemy = app.world_mut().spawn(Enemy).id();

        for _ in 0..2 {
            app.world_mut().write_message(CollisionEvent::Started(
                enemy,
                item,
                CollisionEventFlags::empty(),
            ));
        }
        app.update();

        let damage = app.world().resource::<Messages<DamageEnemy>>();
        let mut cursor = damage.get_cursor();
        let requests: Vec<_> = cursor.read(damage).cloned().collect();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].target, enemy);
        assert_eq!(requests[0].amount, 22.0);
        assert!(requests[0].knockback.x > 0.0);
    }

    #[test]
    fn slow_thrown_items_become_pickups() {
        let mut world = World::new();
        world.insert_resource(GameConfig::default());
        world.insert_resource(Time::<()>::default());
        let item = world
            .spawn((
                Velocity::zero(),
                Thrown {
                    age: 0.5,
                    damage: 1.0,
                    knockback: 0.0,
                    hit: Vec::new(),
                },
            ))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(thrown_settle_system);
        schedule.run(&mut world);

        assert!(world.get::<Thrown>(item).is_none());
        assert!(world.get::<Pickup>(item).is_some());
    }
}
