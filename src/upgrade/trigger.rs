//! Event-triggered upgrades.
//!
//! Each [`TriggerUpgrade`] listens for one [`TriggerKind`] and, when its
//! [`TriggerGate`] opens, fans out to its child [`UpgradeEffect`]s in
//! declaration order.
//!
//! ## Gate evaluation
//!
//! | Step | Check | On failure |
//! |------|-------|------------|
//! | 1 | trigger kind matches | ignored, counter untouched |
//! | 2 | name filter matches the trigger source | ignored, counter untouched |
//! | 3 | every-Nth counter lands on a multiple of N | rejected |
//! | 4 | cooldown elapsed | rejected |
//! | 5 | chance roll succeeds | rejected |
//!
//! The counter therefore counts *relevant* events, including ones that fall
//! inside the cooldown window.

use bevy::prelude::*;
use rand::Rng;

use super::effect::{run_effect, EffectContext, UpgradeEffect};
use crate::events::{GameplayTrigger, TriggerKind, UpgradeActivated};

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerGate {
    pub kind: TriggerKind,
    /// Activation probability in `[0, 1]`.
    pub chance: f32,
    pub cooldown_secs: f32,
    pub cooldown_remaining: f32,
    /// Case-insensitive substring the trigger source must contain.
    pub name_filter: Option<String>,
    /// Fire on every Nth relevant event; `0` and `1` both mean every event.
    pub every_nth: u32,
    pub counter: u32,
}

/// Why a relevant trigger did not activate; used for debug logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Irrelevant,
    CounterSkipped,
    CoolingDown,
    ChanceFailed,
    Activated,
}

impl TriggerGate {
    pub fn new(kind: TriggerKind) -> Self {
        Self {
            kind,
            chance: 1.0,
            cooldown_secs: 0.0,
            cooldown_remaining: 0.0,
            name_filter: None,
            every_nth: 1,
            counter: 0,
        }
    }

    pub fn matches(&self, kind: TriggerKind, source: &str) -> bool {
        if kind != self.kind {
            return false;
        }
        match &self.name_filter {
            Some(filter) if !filter.is_empty() => source
                .to_ascii_lowercase()
                .contains(&filter.to_ascii_lowercase()),
            _ => true,
        }
    }

    /// Run the gate for one trigger; re-arms the cooldown on activation.
    pub fn evaluate<R: Rng + ?Sized>(
        &mut self,
        kind: TriggerKind,
        source: &str,
        rng: &mut R,
    ) -> GateOutcome {
        if !self.matches(kind, source) {
            return GateOutcome::Irrelevant;
        }

        self.counter = self.counter.wrapping_add(1);
        if self.every_nth > 1 && self.counter % self.every_nth != 0 {
            return GateOutcome::CounterSkipped;
        }

        if self.cooldown_remaining > 0.0 {
            return GateOutcome::CoolingDown;
        }

        let passed = if self.chance >= 1.0 {
            true
        } else if self.chance <= 0.0 {
            false
        } else {
            rng.gen::<f32>() < self.chance
        };
        if !passed {
            return GateOutcome::ChanceFailed;
        }

        self.cooldown_remaining = self.cooldown_secs;
        GateOutcome::Activated
    }

    pub fn tick(&mut self, dt: f32) {
        self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);
    }
}

/// A granted upgrade that reacts to gameplay triggers.
#[derive(Component, Debug, Clone)]
pub struct TriggerUpgrade {
    pub name: String,
    pub gate: TriggerGate,
    pub effects: Vec<UpgradeEffect>,
}

pub fn tick_trigger_cooldowns_system(time: Res<Time>, mut q: Query<&mut TriggerUpgrade>) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }
    for mut upgrade in q.iter_mut() {
        upgrade.gate.tick(dt);
    }
}

/// Route every [`GameplayTrigger`] through every upgrade's gate and run the
/// effects of those that open.
pub fn trigger_upgrade_system(
    mut triggers: MessageReader<GameplayTrigger>,
    mut q_upgrades: Query<&mut TriggerUpgrade>,
    mut ctx: EffectContext,
    mut activated: MessageWriter<UpgradeActivated>,
) {
    for trigger in triggers.read() {
        for mut upgrade in q_upgrades.iter_mut() {
            let outcome = upgrade
                .gate
                .evaluate(trigger.kind, &trigger.source, &mut ctx.rng.0);
            match outcome {
                GateOutcome::Activated => {}
                GateOutcome::Irrelevant => continue,
                other => {
                    debug!("Upgrade '{}' gated: {:?}", upgrade.name, other);
                    continue;
                }
            }

            info!(
                "Upgrade '{}' activated by {} ({})",
                upgrade.name,
                trigger.kind.label(),
                trigger.source
            );
            for effect in &upgrade.effects {
                run_effect(effect, &upgrade.name, trigger.position, &mut ctx);
            }
            activated.write(UpgradeActivated {
                name: upgrade.name.clone(),
                trigger: trigger.kind,
                position: trigger.position,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn wrong_kind_is_irrelevant_and_does_not_count() {
        let mut gate = TriggerGate::new(TriggerKind::Kill);
        gate.every_nth = 2;
        let outcome = gate.evaluate(TriggerKind::Dash, "dash", &mut rng());
        assert_eq!(outcome, GateOutcome::Irrelevant);
        assert_eq!(gate.counter, 0);
    }

    #[test]
    fn name_filter_is_case_insensitive_substring() {
        let mut gate = TriggerGate::new(TriggerKind::Kill);
        gate.name_filter = Some("Brute".into());
        let mut r = rng();
        assert_eq!(gate.evaluate(TriggerKind::Kill, "grunt", &mut r), GateOutcome::Irrelevant);
        assert_eq!(
            gate.evaluate(TriggerKind::Kill, "armored_brute", &mut r),
            GateOutcome::Activated
        );
    }

    #[test]
    fn every_third_event_fires() {
        let mut gate = TriggerGate::new(TriggerKind::Throw);
        gate.every_nth = 3;
        let mut r = rng();
        let outcomes: Vec<_> = (0..6)
            .map(|_| gate.evaluate(TriggerKind::Throw, "bat", &mut r))
            .collect();
        let fired: Vec<usize> = outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| **o == GateOutcome::Activated)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(fired, vec![2, 5]);
    }

    #[test]
    fn cooldown_blocks_until_ticked_away() {
        let mut gate = TriggerGate::new(TriggerKind::Dash);
        gate.cooldown_secs = 1.0;
        let mut r = rng();
        assert_eq!(gate.evaluate(TriggerKind::Dash, "dash", &mut r), GateOutcome::Activated);
        assert_eq!(gate.evaluate(TriggerKind::Dash, "dash", &mut r), GateOutcome::CoolingDown);
        gate.tick(0.6);
        assert_eq!(gate.evaluate(TriggerKind::Dash, "dash", &mut r), GateOutcome::CoolingDown);
        gate.tick(0.6);
        assert_eq!(gate.evaluate(TriggerKind::Dash, "dash", &mut r), GateOutcome::Activated);
    }

    #[test]
    fn zero_chance_never_fires_and_full_chance_always_fires() {
        let mut r = rng();
        let mut never = TriggerGate::new(TriggerKind::Kill);
        never.chance = 0.0;
        let mut always = TriggerGate::new(TriggerKind::Kill);
        always.chance = 1.0;
        for _ in 0..50 {
            assert_eq!(never.evaluate(TriggerKind::Kill, "x", &mut r), GateOutcome::ChanceFailed);
            assert_eq!(always.evaluate(TriggerKind::Kill, "x", &mut r), GateOutcome::Activated);
        }
    }

    #[test]
    fn partial_chance_fires_roughly_proportionally() {
        let mut r = rng();
        let mut gate = TriggerGate::new(TriggerKind::MeleeHit);
        gate.chance = 0.25;
        let fired = (0..4000)
            .filter(|_| {
                gate.evaluate(TriggerKind::MeleeHit, "bat", &mut r) == GateOutcome::Activated
            })
            .count();
        assert!((800..1200).contains(&fired), "fired {fired} of 4000");
    }

    #[test]
    fn failed_chance_roll_does_not_arm_cooldown() {
        let mut gate = TriggerGate::new(TriggerKind::Kill);
        gate.chance = 0.0;
        gate.cooldown_secs = 5.0;
        gate.evaluate(TriggerKind::Kill, "x", &mut rng());
        assert_eq!(gate.cooldown_remaining, 0.0);
    }
}
