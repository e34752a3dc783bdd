//! Weapon stats and declarative stat modifiers.
//!
//! A [`StatModifier`] is an add or multiply delta against one [`WeaponStat`].
//! The player carries a [`StatModifiers`] stack; the effective stats of
//! whatever is in hand are always derived from the held weapon's base
//! [`WeaponStats`] plus that stack, so modifiers survive weapon swaps and
//! throws.
//!
//! ## Composition order
//!
//! `effective = (base + Σ add) × Π multiply`
//!
//! Adds are summed first and multipliers applied afterwards, independent of
//! the order modifiers were granted in.  Results are clamped to `>= 0` and the
//! swing cooldown is floored at `min_swing_cooldown`.

use bevy::prelude::*;
use serde::Deserialize;

use crate::config::GameConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponStat {
    Damage,
    Range,
    /// Full arc of a melee swing, in degrees.
    SwingArc,
    SwingCooldown,
    Knockback,
    ThrowSpeed,
    ThrowDamage,
}

impl WeaponStat {
    pub const ALL: [WeaponStat; 7] = [
        WeaponStat::Damage,
        WeaponStat::Range,
        WeaponStat::SwingArc,
        WeaponStat::SwingCooldown,
        WeaponStat::Knockback,
        WeaponStat::ThrowSpeed,
        WeaponStat::ThrowDamage,
    ];
}

/// Base properties of a weapon item.
#[derive(Component, Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WeaponStats {
    pub damage: f32,
    pub range: f32,
    pub swing_arc_degrees: f32,
    pub swing_cooldown: f32,
    pub knockback: f32,
    pub throw_speed: f32,
    pub throw_damage: f32,
}

impl WeaponStats {
    /// Bare-handed stats used when nothing is held.
    pub fn fists(config: &GameConfig) -> Self {
        Self {
            damage: config.fist_damage,
            range: config.fist_range,
            swing_arc_degrees: config.fist_arc_degrees,
            swing_cooldown: config.fist_swing_cooldown,
            knockback: config.fist_knockback,
            throw_speed: 0.0,
            throw_damage: 0.0,
        }
    }

    pub fn get(&self, stat: WeaponStat) -> f32 {
        match stat {
            WeaponStat::Damage => self.damage,
            WeaponStat::Range => self.range,
            WeaponStat::SwingArc => self.swing_arc_degrees,
            WeaponStat::SwingCooldown => self.swing_cooldown,
            WeaponStat::Knockback => self.knockback,
            WeaponStat::ThrowSpeed => self.throw_speed,
            WeaponStat::ThrowDamage => self.throw_damage,
        }
    }

    pub fn set(&mut self, stat: WeaponStat, value: f32) {
        let slot = match stat {
            WeaponStat::Damage => &mut self.damage,
            WeaponStat::Range => &mut self.range,
            WeaponStat::SwingArc => &mut self.swing_arc_degrees,
            WeaponStat::SwingCooldown => &mut self.swing_cooldown,
            WeaponStat::Knockback => &mut self.knockback,
            WeaponStat::ThrowSpeed => &mut self.throw_speed,
            WeaponStat::ThrowDamage => &mut self.throw_damage,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierOp {
    Add,
    Multiply,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct StatModifier {
    pub stat: WeaponStat,
    pub op: ModifierOp,
    pub value: f32,
}

impl StatModifier {
    pub fn add(stat: WeaponStat, value: f32) -> Self {
        Self {
            stat,
            op: ModifierOp::Add,
            value,
        }
    }

    pub fn multiply(stat: WeaponStat, value: f32) -> Self {
        Self {
            stat,
            op: ModifierOp::Multiply,
            value,
        }
    }
}

/// Compose one stat from its base value and every modifier targeting it.
pub fn compose_stat<'a>(
    stat: WeaponStat,
    base: f32,
    modifiers: impl IntoIterator<Item = &'a StatModifier>,
) -> f32 {
    let mut added = 0.0;
    let mut factor = 1.0;
    for m in modifiers.into_iter().filter(|m| m.stat == stat) {
        match m.op {
            ModifierOp::Add => added += m.value,
            ModifierOp::Multiply => factor *= m.value,
        }
    }
    ((base + added) * factor).max(0.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveModifier {
    pub modifier: StatModifier,
    /// `None` for permanent (passive upgrade) modifiers.
    pub remaining_secs: Option<f32>,
    /// Upgrade that granted the modifier, for logs.
    pub source: String,
}

/// Modifier stack carried by the player.
#[derive(Component, Debug, Clone, Default)]
pub struct StatModifiers {
    pub active: Vec<ActiveModifier>,
}

impl StatModifiers {
    pub fn push_permanent(&mut self, modifier: StatModifier, source: impl Into<String>) {
        self.active.push(ActiveModifier {
            modifier,
            remaining_secs: None,
            source: source.into(),
        });
    }

    pub fn push_timed(&mut self, modifier: StatModifier, secs: f32, source: impl Into<String>) {
        self.active.push(ActiveModifier {
            modifier,
            remaining_secs: Some(secs),
            source: source.into(),
        });
    }

    /// Count down timed modifiers and drop the expired ones; returns how many
    /// were removed.
    pub fn tick(&mut self, dt: f32) -> usize {
        let before = self.active.len();
        for m in &mut self.active {
            if let Some(remaining) = m.remaining_secs.as_mut() {
                *remaining -= dt;
            }
        }
        self.active
            .retain(|m| m.remaining_secs.is_none_or(|remaining| remaining > 0.0));
        before - self.active.len()
    }

    /// Effective stats for `base` under every active modifier.
    pub fn apply(&self, base: &WeaponStats, min_swing_cooldown: f32) -> WeaponStats {
        let mut out = *base;
        for stat in WeaponStat::ALL {
            let value = compose_stat(
                stat,
                base.get(stat),
                self.active.iter().map(|a| &a.modifier),
            );
            out.set(stat, value);
        }
        out.swing_cooldown = out.swing_cooldown.max(min_swing_cooldown);
        out
    }
}

/// Per-frame countdown of timed modifiers.
pub fn tick_stat_modifiers_system(time: Res<Time>, mut q: Query<&mut StatModifiers>) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }
    for mut mods in q.iter_mut() {
        let expired = mods.tick(dt);
        if expired > 0 {
            debug!("{expired} timed stat modifier(s) expired");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sword() -> WeaponStats {
        WeaponStats {
            damage: 10.0,
            range: 2.0,
            swing_arc_degrees: 100.0,
            swing_cooldown: 0.5,
            knockback: 4.0,
            throw_speed: 14.0,
            throw_damage: 12.0,
        }
    }

    #[test]
    fn adds_apply_before_multipliers_regardless_of_order() {
        let mods = [
            StatModifier::multiply(WeaponStat::Damage, 2.0),
            StatModifier::add(WeaponStat::Damage, 5.0),
        ];
        assert_eq!(compose_stat(WeaponStat::Damage, 10.0, &mods), 30.0);
    }

    #[test]
    fn modifiers_only_touch_their_own_stat() {
        let mods = [StatModifier::multiply(WeaponStat::Range, 3.0)];
        assert_eq!(compose_stat(WeaponStat::Damage, 10.0, &mods), 10.0);
        assert_eq!(compose_stat(WeaponStat::Range, 2.0, &mods), 6.0);
    }

    #[test]
    fn composition_clamps_to_zero() {
        let mods = [StatModifier::add(WeaponStat::Knockback, -50.0)];
        assert_eq!(compose_stat(WeaponStat::Knockback, 4.0, &mods), 0.0);
    }

    #[test]
    fn swing_cooldown_respects_floor() {
        let mut stack = StatModifiers::default();
        stack.push_permanent(StatModifier::multiply(WeaponStat::SwingCooldown, 0.01), "frenzy");
        let out = stack.apply(&sword(), 0.08);
        assert!((out.swing_cooldown - 0.08).abs() < 1e-6);
    }

    #[test]
    fn timed_modifiers_expire_and_permanent_ones_stay() {
        let mut stack = StatModifiers::default();
        stack.push_permanent(StatModifier::add(WeaponStat::Damage, 1.0), "whetstone");
        stack.push_timed(StatModifier::multiply(WeaponStat::Damage, 2.0), 0.5, "rage");

        assert_eq!(stack.apply(&sword(), 0.0).damage, 22.0);
        assert_eq!(stack.tick(0.3), 0);
        assert_eq!(stack.tick(0.3), 1);
        assert_eq!(stack.apply(&sword(), 0.0).damage, 11.0);
    }

    #[test]
    fn modifier_parses_from_toml() {
        let m: StatModifier =
            toml::from_str("stat = \"throw_speed\"\nop = \"multiply\"\nvalue = 1.5").unwrap();
        assert_eq!(m, StatModifier::multiply(WeaponStat::ThrowSpeed, 1.5));
    }
}
