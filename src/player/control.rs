//! Player input handling, ground movement and dash.
//!
//! ## Input pipeline
//!
//! ```text
//! keyboard / mouse ──► keyboard_to_intent_system ──► PlayerIntent
//!                                                        │
//!                     player_movement_system ◄───────────┘
//! ```
//!
//! Movement is velocity-driven: each frame the horizontal velocity moves
//! toward `move_dir × speed` by at most `acceleration × traction × dt`.  On
//! ice or oil the low traction keeps the player sliding.  A dash overrides
//! steering with a fixed-speed burst for `dash_duration`.

use super::state::{DashState, Facing, Player, PlayerHealth, PlayerIntent, SpeedBoosts};
use crate::config::GameConfig;
use crate::console::ConsoleState;
use crate::events::PlayerDashed;
use crate::surface::SurfaceContact;
use bevy::input::mouse::MouseButton;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

/// Map keyboard + mouse to [`PlayerIntent`].
///
/// | Action   | Keys |
/// |----------|------|
/// | move     | WASD / arrow keys |
/// | dash     | Shift / Space |
/// | melee    | left mouse / J |
/// | interact | E |
/// | throw    | right mouse / F |
pub fn keyboard_to_intent_system(
    keys: Res<ButtonInput<KeyCode>>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    console: Option<Res<ConsoleState>>,
    mut intent: ResMut<PlayerIntent>,
) {
    if console.is_some_and(|c| c.open) {
        *intent = PlayerIntent::default();
        return;
    }

    let mut dir = Vec2::ZERO;
    if keys.any_pressed([KeyCode::KeyW, KeyCode::ArrowUp]) {
        dir.y -= 1.0;
    }
    if keys.any_pressed([KeyCode::KeyS, KeyCode::ArrowDown]) {
        dir.y += 1.0;
    }
    if keys.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]) {
        dir.x -= 1.0;
    }
    if keys.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]) {
        dir.x += 1.0;
    }

    *intent = PlayerIntent {
        move_dir: dir,
        dash: keys.any_just_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight, KeyCode::Space]),
        melee: mouse_buttons.just_pressed(MouseButton::Left) || keys.just_pressed(KeyCode::KeyJ),
        interact: keys.just_pressed(KeyCode::KeyE),
        throw: mouse_buttons.just_pressed(MouseButton::Right) || keys.just_pressed(KeyCode::KeyF),
    };
}

/// Move `current`'s horizontal component toward `target` by at most
/// `max_delta`; the vertical component is left to physics.
pub fn approach_velocity(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let horizontal = Vec3::new(current.x, 0.0, current.z);
    let goal = Vec3::new(target.x, 0.0, target.z);
    let delta = goal - horizontal;
    let next = if delta.length() <= max_delta {
        goal
    } else {
        horizontal + delta.normalize_or_zero() * max_delta
    };
    Vec3::new(next.x, current.y, next.z)
}

/// Timers owned by the player: dash, invulnerability and speed boosts.
pub fn player_timers_system(
    time: Res<Time>,
    mut q: Query<(&mut DashState, &mut PlayerHealth, &mut SpeedBoosts), With<Player>>,
) {
    let dt = time.delta_secs();
    for (mut dash, mut health, mut boosts) in q.iter_mut() {
        dash.cooldown = (dash.cooldown - dt).max(0.0);
        dash.active_remaining = (dash.active_remaining - dt).max(0.0);
        health.inv_timer = (health.inv_timer - dt).max(0.0);
        boosts.tick(dt);
    }
}

#[allow(clippy::type_complexity)]
pub fn player_movement_system(
    time: Res<Time>,
    config: Res<GameConfig>,
    intent: Res<PlayerIntent>,
    mut q_player: Query<
        (
            &mut Transform,
            &mut Velocity,
            &mut Facing,
            &mut DashState,
            &mut PlayerHealth,
            &SpeedBoosts,
            Option<&SurfaceContact>,
        ),
        With<Player>,
    >,
    mut dashed: MessageWriter<PlayerDashed>,
) {
    let Ok((mut transform, mut velocity, mut facing, mut dash, mut health, boosts, contact)) =
        q_player.single_mut()
    else {
        return;
    };

    let move_dir = intent.world_move_dir();
    if move_dir != Vec3::ZERO {
        facing.0 = move_dir;
    }

    if intent.dash && dash.cooldown <= 0.0 && !dash.is_dashing() {
        let direction = if move_dir != Vec3::ZERO {
            move_dir
        } else {
            facing.0
        };
        dash.direction = direction;
        dash.active_remaining = config.dash_duration;
        dash.cooldown = config.dash_cooldown;
        health.inv_timer = health.inv_timer.max(config.dash_invulnerability);
        dashed.write(PlayerDashed {
            position: transform.translation,
            direction,
        });
    }

    if dash.is_dashing() {
        let burst = dash.direction * config.dash_speed;
        velocity.linvel = Vec3::new(burst.x, velocity.linvel.y, burst.z);
    } else {
        let surface = contact.map(|c| c.properties).unwrap_or_default();
        let max_speed = config.player_move_speed * surface.speed_multiplier * boosts.factor();
        let max_delta = config.player_acceleration * surface.traction * time.delta_secs();
        velocity.linvel = approach_velocity(velocity.linvel, move_dir * max_speed, max_delta);
    }

    if facing.0 != Vec3::ZERO {
        let target = transform.translation + facing.0;
        transform.look_at(target, Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{SurfaceKind, SurfaceProperties};
    use std::time::Duration;

    fn build_test_world(intent: PlayerIntent) -> World {
        let mut world = World::new();
        world.insert_resource(GameConfig::default());
        world.insert_resource(intent);
        world.insert_resource(Time::<()>::default());
        world.init_resource::<Messages<PlayerDashed>>();
        world
    }

    fn spawn_test_player(world: &mut World, contact: Option<SurfaceContact>) -> Entity {
        let mut e = world.spawn((
            Player,
            Transform::default(),
            Velocity::zero(),
            Facing::default(),
            DashState::default(),
            PlayerHealth::default(),
            SpeedBoosts::default(),
        ));
        if let Some(c) = contact {
            e.insert(c);
        }
        e.id()
    }

    fn step(world: &mut World, secs: f32) {
        world
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(secs));
        let mut schedule = Schedule::default();
        schedule.add_systems(player_movement_system);
        schedule.run(world);
    }

    fn dash_count(world: &World) -> usize {
        let messages = world.resource::<Messages<PlayerDashed>>();
        let mut cursor = messages.get_cursor();
        cursor.read(messages).count()
    }

    #[test]
    fn approach_caps_velocity_change() {
        let v = approach_velocity(Vec3::new(0.0, -2.0, 0.0), Vec3::new(10.0, 0.0, 0.0), 3.0);
        assert!((v - Vec3::new(3.0, -2.0, 0.0)).length() < 1e-5);
        let reached = approach_velocity(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 3.0);
        assert!((reached - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn full_traction_reaches_top_speed_quickly() {
        let mut world = build_test_world(PlayerIntent {
            move_dir: Vec2::new(1.0, 0.0),
            ..Default::default()
        });
        let player = spawn_test_player(&mut world, None);
        step(&mut world, 0.5);

        let v = world.get::<Velocity>(player).unwrap().linvel;
        let cfg = GameConfig::default();
        assert!((v.x - cfg.player_move_speed).abs() < 1e-3, "got {v:?}");
        let facing = world.get::<Facing>(player).unwrap().0;
        assert!((facing - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn ice_slows_acceleration() {
        let cfg = GameConfig::default();
        let ice = SurfaceContact {
            kind: Some(SurfaceKind::Ice),
            on_fire: false,
            properties: SurfaceProperties {
                traction: cfg.ice_traction,
                speed_multiplier: 1.0,
            },
        };
        let mut world = build_test_world(PlayerIntent {
            move_dir: Vec2::new(1.0, 0.0),
            ..Default::default()
        });
        let player = spawn_test_player(&mut world, Some(ice));
        step(&mut world, 0.1);

        let v = world.get::<Velocity>(player).unwrap().linvel;
        let expected = cfg.player_acceleration * cfg.ice_traction * 0.1;
        assert!((v.x - expected).abs() < 1e-3, "got {v:?}");
    }

    #[test]
    fn releasing_input_on_ice_keeps_sliding() {
        let cfg = GameConfig::default();
        let ice = SurfaceContact {
            kind: Some(SurfaceKind::Ice),
            on_fire: false,
            properties: SurfaceProperties {
                traction: cfg.ice_traction,
                speed_multiplier: 1.0,
            },
        };
        let mut world = build_test_world(PlayerIntent::default());
        let player = spawn_test_player(&mut world, Some(ice));
        world.get_mut::<Velocity>(player).unwrap().linvel = Vec3::new(6.0, 0.0, 0.0);
        step(&mut world, 0.1);

        let v = world.get::<Velocity>(player).unwrap().linvel;
        assert!(v.x > 4.0, "ice should preserve momentum, got {v:?}");
    }

    #[test]
    fn dash_bursts_and_respects_cooldown() {
        let mut world = build_test_world(PlayerIntent {
            dash: true,
            ..Default::default()
        });
        let player = spawn_test_player(&mut world, None);
        step(&mut world, 0.016);

        let cfg = GameConfig::default();
        let v = world.get::<Velocity>(player).unwrap().linvel;
        assert!((v.length() - cfg.dash_speed).abs() < 1e-3);
        // Default facing is -Z.
        assert!(v.z < 0.0);
        assert_eq!(dash_count(&world), 1);
        assert!(world.get::<PlayerHealth>(player).unwrap().inv_timer > 0.0);

        // Still on cooldown: a second request is ignored.
        world.get_mut::<DashState>(player).unwrap().active_remaining = 0.0;
        step(&mut world, 0.016);
        assert_eq!(dash_count(&world), 1);
    }
}
