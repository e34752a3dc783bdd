//! Melee swings and damage taken by the player.
//!
//! A swing hits every enemy inside a circular sector in front of the player:
//! within the effective `Range` and within half the effective `SwingArc` of
//! [`Facing`].  Effective stats are the held weapon's base [`WeaponStats`] (or
//! fists) composed with the player's [`StatModifiers`] stack.

use super::state::{Facing, HeldItem, MeleeCooldown, Player, PlayerHealth, PlayerIntent};
use super::throwing::Item;
use crate::config::GameConfig;
use crate::enemy::Enemy;
use crate::events::{DamageEnemy, DamagePlayer, MeleeHit, PlayerDamaged};
use crate::state::GameState;
use crate::upgrade::{StatModifiers, WeaponStats};
use bevy::prelude::*;

pub const FISTS_NAME: &str = "fists";

/// Stats of whatever the player is holding after every modifier is applied.
pub fn effective_weapon_stats(
    held: Option<&WeaponStats>,
    mods: &StatModifiers,
    config: &GameConfig,
) -> WeaponStats {
    let base = held.copied().unwrap_or_else(|| WeaponStats::fists(config));
    mods.apply(&base, config.min_swing_cooldown)
}

/// Whether `target` lies inside the swing sector.
///
/// Height is ignored; a target on top of the origin always counts.
pub fn in_melee_arc(
    origin: Vec3,
    facing: Vec3,
    target: Vec3,
    range: f32,
    arc_degrees: f32,
) -> bool {
    let mut offset = target - origin;
    offset.y = 0.0;
    let dist = offset.length();
    if dist > range {
        return false;
    }
    if dist <= f32::EPSILON {
        return true;
    }
    let facing = Vec3::new(facing.x, 0.0, facing.z).normalize_or_zero();
    if facing == Vec3::ZERO {
        return true;
    }
    let half_arc = (arc_degrees.clamp(0.0, 360.0) * 0.5).to_radians();
    let cos = facing.dot(offset / dist).clamp(-1.0, 1.0);
    cos.acos() <= half_arc + 1e-4
}

#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn melee_swing_system(
    time: Res<Time>,
    config: Res<GameConfig>,
    intent: Res<PlayerIntent>,
    mut q_player: Query<
        (&Transform, &Facing, &mut MeleeCooldown, &StatModifiers, &HeldItem),
        With<Player>,
    >,
    q_items: Query<(&Item, &WeaponStats)>,
    q_enemies: Query<(Entity, &Transform), With<Enemy>>,
    mut damage: MessageWriter<DamageEnemy>,
    mut hits: MessageWriter<MeleeHit>,
) {
    let Ok((transform, facing, mut cooldown, mods, held)) = q_player.single_mut() else {
        return;
    };
    cooldown.timer = (cooldown.timer - time.delta_secs()).max(0.0);

    if !intent.melee || cooldown.timer > 0.0 {
        return;
    }

    let held_item = held.0.and_then(|e| q_items.get(e).ok());
    let stats = effective_weapon_stats(held_item.map(|(_, s)| s), mods, &config);
    let weapon_name = held_item
        .map(|(item, _)| item.name.clone())
        .unwrap_or_else(|| FISTS_NAME.to_string());
    cooldown.timer = stats.swing_cooldown;

    let origin = transform.translation;
    for (enemy, enemy_transform) in q_enemies.iter() {
        let target = enemy_transform.translation;
        if !in_melee_arc(origin, facing.0, target, stats.range, stats.swing_arc_degrees) {
            continue;
        }
        let mut push = target - origin;
        push.y = 0.0;
        let push = push.normalize_or(facing.0) * stats.knockback;
        damage.write(
            DamageEnemy::new(enemy, stats.damage, weapon_name.clone()).with_knockback(push),
        );
        hits.write(MeleeHit {
            target: enemy,
            weapon_name: weapon_name.clone(),
            damage: stats.damage,
            position: target,
        });
    }
}

/// Resolve [`DamagePlayer`] requests; hp at zero ends the run.
pub fn apply_player_damage_system(
    config: Res<GameConfig>,
    mut requests: MessageReader<DamagePlayer>,
    mut q_player: Query<(&Transform, &mut PlayerHealth), With<Player>>,
    mut damaged: MessageWriter<PlayerDamaged>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let Ok((transform, mut health)) = q_player.single_mut() else {
        requests.clear();
        return;
    };

    for request in requests.read() {
        if health.is_dead() || request.amount <= 0.0 {
            continue;
        }
        if !request.over_time {
            if health.inv_timer > 0.0 {
                continue;
            }
            health.inv_timer = config.player_invulnerability;
        }
        health.hp = (health.hp - request.amount).max(0.0);
        if !request.over_time {
            damaged.write(PlayerDamaged {
                amount: request.amount,
                source: request.source.clone(),
                position: transform.translation,
            });
        }
        if health.is_dead() {
            info!("Player killed by {}", request.source);
            next_state.set(GameState::GameOver);
        }
    }
}
