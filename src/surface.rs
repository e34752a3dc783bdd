//! Environmental surfaces: oil, ice and water patches on the arena floor.
//!
//! ## Surface properties
//!
//! | Kind  | Traction | Speed | Flammable | Extinguishes |
//! |-------|----------|-------|-----------|--------------|
//! | none  | 1.0      | 1.0   | –         | –            |
//! | Ice   | 0.15     | 1.0   | no        | no           |
//! | Oil   | 0.35     | 1.0   | yes       | no           |
//! | Water | 1.0      | 0.6   | no        | yes          |
//!
//! Traction scales how quickly an actor can change velocity, so low values
//! preserve momentum (sliding).  Overlapping patches resolve by priority
//! Water > Oil > Ice.
//!
//! Ignited oil ([`OilFire`]) damages everything standing on it and sets it
//! [`Burning`]; the patch is consumed when the fire burns out.  Water puts out
//! `Burning`.

use bevy::prelude::*;
use serde::Deserialize;

use crate::config::GameConfig;
use crate::enemy::Enemy;
use crate::events::{DamageEnemy, DamagePlayer};
use crate::player::Player;
use crate::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    Oil,
    Ice,
    Water,
}

impl SurfaceKind {
    pub fn priority(self) -> u8 {
        match self {
            SurfaceKind::Water => 3,
            SurfaceKind::Oil => 2,
            SurfaceKind::Ice => 1,
        }
    }

    pub fn flammable(self) -> bool {
        self == SurfaceKind::Oil
    }

    pub fn extinguishes(self) -> bool {
        self == SurfaceKind::Water
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceProperties {
    pub traction: f32,
    pub speed_multiplier: f32,
}

impl Default for SurfaceProperties {
    fn default() -> Self {
        Self {
            traction: 1.0,
            speed_multiplier: 1.0,
        }
    }
}

pub fn surface_properties(kind: Option<SurfaceKind>, config: &GameConfig) -> SurfaceProperties {
    match kind {
        None => SurfaceProperties::default(),
        Some(SurfaceKind::Ice) => SurfaceProperties {
            traction: config.ice_traction,
            speed_multiplier: 1.0,
        },
        Some(SurfaceKind::Oil) => SurfaceProperties {
            traction: config.oil_traction,
            speed_multiplier: 1.0,
        },
        Some(SurfaceKind::Water) => SurfaceProperties {
            traction: 1.0,
            speed_multiplier: config.water_speed_multiplier,
        },
    }
}

/// Axis-aligned patch on the XZ plane centred on the entity's translation.
#[derive(Component, Debug, Clone, Copy)]
pub struct Surface {
    pub kind: SurfaceKind,
    pub half_extents: Vec2,
}

impl Surface {
    pub fn contains(&self, center: Vec3, point: Vec3) -> bool {
        (point.x - center.x).abs() <= self.half_extents.x
            && (point.z - center.z).abs() <= self.half_extents.y
    }

    pub fn overlaps_circle(&self, center: Vec3, point: Vec3, radius: f32) -> bool {
        let dx = ((point.x - center.x).abs() - self.half_extents.x).max(0.0);
        let dz = ((point.z - center.z).abs() - self.half_extents.y).max(0.0);
        dx * dx + dz * dz <= radius * radius
    }
}

/// An ignited oil patch.
#[derive(Component, Debug, Clone, Copy)]
pub struct OilFire {
    pub remaining_secs: f32,
}

/// Damage-over-time status on an actor.
#[derive(Component, Debug, Clone, Copy)]
pub struct Burning {
    pub remaining_secs: f32,
}

/// What an actor is standing on; refreshed every frame.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SurfaceContact {
    pub kind: Option<SurfaceKind>,
    /// Standing on ignited oil.
    pub on_fire: bool,
    pub properties: SurfaceProperties,
}

/// Highest-priority surface containing `point`, with its burning flag.
pub fn surface_at<'a>(
    point: Vec3,
    surfaces: impl IntoIterator<Item = (Vec3, &'a Surface, bool)>,
) -> Option<(SurfaceKind, bool)> {
    surfaces
        .into_iter()
        .filter(|(center, surface, _)| surface.contains(*center, point))
        .max_by_key(|(_, surface, burning)| (surface.kind.priority(), *burning))
        .map(|(_, surface, burning)| (surface.kind, burning))
}

pub struct SurfacePlugin;

impl Plugin for SurfacePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                surface_contact_system,
                surface_fire_damage_system,
                oil_fire_burnout_system,
            )
                .chain()
                .run_if(in_state(GameState::Playing)),
        );
    }
}

pub fn surface_contact_system(
    config: Res<GameConfig>,
    q_surfaces: Query<(&Transform, &Surface, Has<OilFire>)>,
    mut q_actors: Query<(&Transform, &mut SurfaceContact), Without<Surface>>,
) {
    let surfaces: Vec<(Vec3, &Surface, bool)> = q_surfaces
        .iter()
        .map(|(t, s, burning)| (t.translation, s, burning))
        .collect();

    for (transform, mut contact) in q_actors.iter_mut() {
        let found = surface_at(transform.translation, surfaces.iter().copied());
        let kind = found.map(|(kind, _)| kind);
        *contact = SurfaceContact {
            kind,
            on_fire: found.is_some_and(|(_, burning)| burning),
            properties: surface_properties(kind, &config),
        };
    }
}

/// Fire under an actor damages it and refreshes `Burning`; burning actors
/// keep taking damage until the status runs out or water puts it out.
pub fn surface_fire_damage_system(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    mut q_actors: Query<(
        Entity,
        &SurfaceContact,
        Option<&mut Burning>,
        Has<Player>,
        Has<Enemy>,
    )>,
    mut enemy_damage: MessageWriter<DamageEnemy>,
    mut player_damage: MessageWriter<DamagePlayer>,
) {
    let dt = time.delta_secs();
    for (entity, contact, burning, is_player, is_enemy) in q_actors.iter_mut() {
        if contact.kind.is_some_and(SurfaceKind::extinguishes) {
            if burning.is_some() {
                commands.entity(entity).remove::<Burning>();
            }
            continue;
        }

        let dps = if contact.on_fire {
            match burning {
                Some(mut b) => b.remaining_secs = config.burning_secs,
                None => {
                    commands.entity(entity).insert(Burning {
                        remaining_secs: config.burning_secs,
                    });
                }
            }
            config.oil_fire_dps
        } else if let Some(mut b) = burning {
            b.remaining_secs -= dt;
            if b.remaining_secs <= 0.0 {
                commands.entity(entity).remove::<Burning>();
            }
            config.burning_dps
        } else {
            continue;
        };

        let amount = dps * dt;
        if amount <= 0.0 {
            continue;
        }
        if is_player {
            player_damage.write(DamagePlayer {
                amount,
                source: "fire".to_string(),
                over_time: true,
            });
        } else if is_enemy {
            enemy_damage.write(DamageEnemy::new(entity, amount, "fire"));
        }
    }
}

pub fn oil_fire_burnout_system(
    mut commands: Commands,
    time: Res<Time>,
    mut q_fires: Query<(Entity, &mut OilFire)>,
) {
    for (entity, mut fire) in q_fires.iter_mut() {
        fire.remaining_secs -= time.delta_secs();
        if fire.remaining_secs <= 0.0 {
            info!("Oil fire burned out");
            commands.entity(entity).despawn();
        }
    }
}

pub fn spawn_surface(
    commands: &mut Commands,
    kind: SurfaceKind,
    center: Vec3,
    half_extents: Vec2,
) -> Entity {
    commands
        .spawn((
            Surface { kind, half_extents },
            Transform::from_translation(Vec3::new(center.x, 0.0, center.z)),
            Visibility::default(),
        ))
        .id()
}
