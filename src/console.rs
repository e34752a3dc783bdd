//! In-game debug console.
//!
//! Backquote opens a single input line.  Typed keys accumulate in
//! [`ConsoleState::buffer`]; Enter submits it as a [`ConsoleLine`] message and
//! Escape or backquote closes the console.  Supported commands:
//!
//! | Command | Effect |
//! |---------|--------|
//! | `/timescale <s>` | scale virtual time, `0 < s ≤ 10` |
//! | `/rebakenav` | rebuild the navigation grid |
//! | `/spawn <name>` | spawn a catalog enemy in front of the player |
//! | `/upgrade <name>` | grant an upgrade to the player |

use crate::config::GameConfig;
use crate::constants::{MAX_TIMESCALE, MIN_TIMESCALE};
use crate::enemy::EnemyCatalog;
use crate::error::{GameError, GameResult};
use crate::events::{EnemySpawned, NavRebakeRequested};
use crate::player::{Facing, Player};
use crate::spawner::spawn_named;
use crate::upgrade::{GrantUpgrade, UpgradeCatalog};
use bevy::prelude::*;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    TimeScale(f32),
    RebakeNav,
    Spawn(String),
    Upgrade(String),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> GameResult<Self> {
        let fail = |reason: &'static str| GameError::ConsoleParse {
            input: line.to_string(),
            reason,
        };

        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(fail("empty command"));
        };
        let Some(name) = head.strip_prefix('/') else {
            return Err(fail("commands start with '/'"));
        };
        let arg = words.next();
        if words.next().is_some() {
            return Err(fail("too many arguments"));
        }

        match (name.to_ascii_lowercase().as_str(), arg) {
            ("timescale", Some(raw)) => {
                let scale: f32 = raw.parse().map_err(|_| fail("expected a number"))?;
                if !scale.is_finite() || scale <= 0.0 || scale > MAX_TIMESCALE {
                    return Err(fail("timescale must be in (0, 10]"));
                }
                Ok(ConsoleCommand::TimeScale(scale))
            }
            ("timescale", None) => Err(fail("usage: /timescale <scale>")),
            ("rebakenav", None) => Ok(ConsoleCommand::RebakeNav),
            ("rebakenav", Some(_)) => Err(fail("/rebakenav takes no arguments")),
            ("spawn", Some(enemy)) => Ok(ConsoleCommand::Spawn(enemy.to_string())),
            ("spawn", None) => Err(fail("usage: /spawn <enemy>")),
            ("upgrade", Some(upgrade)) => Ok(ConsoleCommand::Upgrade(upgrade.to_string())),
            ("upgrade", None) => Err(fail("usage: /upgrade <name>")),
            _ => Err(fail("unknown command")),
        }
    }
}

/// A submitted console line.
#[derive(Message, Debug, Clone)]
pub struct ConsoleLine {
    pub text: String,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct ConsoleState {
    pub open: bool,
    pub buffer: String,
    /// Submitted lines, oldest first; at most [`MAX_HISTORY`] entries.
    pub history: VecDeque<String>,
}

pub const MAX_HISTORY: usize = 32;

impl ConsoleState {
    pub fn remember(&mut self, line: String) {
        if self.history.len() >= MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(line);
    }
}

/// Run condition: gameplay keyboard handling is off while the console is open.
pub fn console_closed(console: Option<Res<ConsoleState>>) -> bool {
    console.is_none_or(|c| !c.open)
}

pub struct ConsolePlugin;

impl Plugin for ConsolePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ConsoleState>()
            .add_message::<ConsoleLine>()
            .add_systems(Update, (console_input_system, console_execute_system).chain());
    }
}

const MAX_LINE_LEN: usize = 64;

const TYPED_KEYS: [(KeyCode, char); 40] = [
    (KeyCode::KeyA, 'a'),
    (KeyCode::KeyB, 'b'),
    (KeyCode::KeyC, 'c'),
    (KeyCode::KeyD, 'd'),
    (KeyCode::KeyE, 'e'),
    (KeyCode::KeyF, 'f'),
    (KeyCode::KeyG, 'g'),
    (KeyCode::KeyH, 'h'),
    (KeyCode::KeyI, 'i'),
    (KeyCode::KeyJ, 'j'),
    (KeyCode::KeyK, 'k'),
    (KeyCode::KeyL, 'l'),
    (KeyCode::KeyM, 'm'),
    (KeyCode::KeyN, 'n'),
    (KeyCode::KeyO, 'o'),
    (KeyCode::KeyP, 'p'),
    (KeyCode::KeyQ, 'q'),
    (KeyCode::KeyR, 'r'),
    (KeyCode::KeyS, 's'),
    (KeyCode::KeyT, 't'),
    (KeyCode::KeyU, 'u'),
    (KeyCode::KeyV, 'v'),
    (KeyCode::KeyW, 'w'),
    (KeyCode::KeyX, 'x'),
    (KeyCode::KeyY, 'y'),
    (KeyCode::KeyZ, 'z'),
    (KeyCode::Digit0, '0'),
    (KeyCode::Digit1, '1'),
    (KeyCode::Digit2, '2'),
    (KeyCode::Digit3, '3'),
    (KeyCode::Digit4, '4'),
    (KeyCode::Digit5, '5'),
    (KeyCode::Digit6, '6'),
    (KeyCode::Digit7, '7'),
    (KeyCode::Digit8, '8'),
    (KeyCode::Digit9, '9'),
    (KeyCode::Space, ' '),
    (KeyCode::Period, '.'),
    (KeyCode::Slash, '/'),
    (KeyCode::Minus, '-'),
];

pub fn console_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut console: ResMut<ConsoleState>,
    mut lines: MessageWriter<ConsoleLine>,
) {
    if !console.open {
        if keys.just_pressed(KeyCode::Backquote) {
            console.open = true;
            console.buffer.clear();
        }
        return;
    }

    if keys.any_just_pressed([KeyCode::Backquote, KeyCode::Escape]) {
        console.open = false;
        console.buffer.clear();
        return;
    }
    if keys.any_just_pressed([KeyCode::Enter, KeyCode::NumpadEnter]) {
        let text = std::mem::take(&mut console.buffer);
        console.open = false;
        if !text.trim().is_empty() {
            console.remember(text.clone());
            lines.write(ConsoleLine { text });
        }
        return;
    }
    if keys.just_pressed(KeyCode::Backspace) {
        console.buffer.pop();
    }

    let shift = keys.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
    for (key, ch) in TYPED_KEYS {
        if keys.just_pressed(key) && console.buffer.len() < MAX_LINE_LEN {
            // Shift+Minus for enemy names like armored_brute.
            let ch = if shift && ch == '-' { '_' } else { ch };
            console.buffer.push(ch);
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn console_execute_system(
    mut commands: Commands,
    mut lines: MessageReader<ConsoleLine>,
    mut time: ResMut<Time<Virtual>>,
    config: Res<GameConfig>,
    enemies: Res<EnemyCatalog>,
    upgrades: Res<UpgradeCatalog>,
    q_player: Query<(&Transform, Option<&Facing>), With<Player>>,
    mut rebake: MessageWriter<NavRebakeRequested>,
    mut spawned: MessageWriter<EnemySpawned>,
    mut grants: MessageWriter<GrantUpgrade>,
) {
    for line in lines.read() {
        let command = match ConsoleCommand::parse(&line.text) {
            Ok(command) => command,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };
        info!("Console: {}", line.text.trim());

        match command {
            ConsoleCommand::TimeScale(scale) => {
                time.set_relative_speed(scale.max(MIN_TIMESCALE));
            }
            ConsoleCommand::RebakeNav => {
                rebake.write(NavRebakeRequested);
            }
            ConsoleCommand::Spawn(name) => {
                let position = match q_player.single() {
                    Ok((transform, facing)) => {
                        let forward = facing.map(|f| f.0).unwrap_or(Vec3::NEG_Z);
                        transform.translation + forward * config.console_spawn_distance
                    }
                    Err(_) => Vec3::NEG_Z * config.console_spawn_distance,
                };
                match spawn_named(&mut commands, &enemies, &config, &name, position) {
                    Ok((enemy, name)) => {
                        spawned.write(EnemySpawned {
                            enemy,
                            name,
                            position,
                        });
                    }
                    Err(e) => warn!("{e}"),
                }
            }
            ConsoleCommand::Upgrade(name) => match upgrades.get(&name) {
                Ok(def) => {
                    grants.write(GrantUpgrade {
                        name: def.name.clone(),
                    });
                }
                Err(e) => warn!("{e}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemy::{Enemy, EnemyKind};

    #[test]
    fn parses_every_command() {
        assert_eq!(
            ConsoleCommand::parse("/timescale 0.25"),
            Ok(ConsoleCommand::TimeScale(0.25))
        );
        assert_eq!(
            ConsoleCommand::parse("  /RebakeNav "),
            Ok(ConsoleCommand::RebakeNav)
        );
        assert_eq!(
            ConsoleCommand::parse("/spawn brute"),
            Ok(ConsoleCommand::Spawn("brute".into()))
        );
        assert_eq!(
            ConsoleCommand::parse("/upgrade bloodlust"),
            Ok(ConsoleCommand::Upgrade("bloodlust".into()))
        );
    }

    #[test]
    fn rejects_bad_lines() {
        for line in [
            "",
            "timescale 2",
            "/timescale",
            "/timescale fast",
            "/timescale 0",
            "/timescale -1",
            "/timescale 11",
            "/rebakenav now",
            "/spawn",
            "/spawn a b",
            "/fly",
        ] {
            assert!(
                matches!(
                    ConsoleCommand::parse(line),
                    Err(GameError::ConsoleParse { .. })
                ),
                "{line:?} should be rejected"
            );
        }
    }

    fn console_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(GameConfig::default());
        app.init_resource::<EnemyCatalog>();
        app.init_resource::<UpgradeCatalog>();
        app.init_resource::<ButtonInput<KeyCode>>();
        app.add_message::<NavRebakeRequested>();
        app.add_message::<EnemySpawned>();
        app.add_message::<GrantUpgrade>();
        app.add_plugins(ConsolePlugin);
        app
    }

    fn submit(app: &mut App, text: &str) {
        app.world_mut().write_message(ConsoleLine { text: text.into() });
        app.update();
    }

    fn press(app: &mut App, key: KeyCode) {
        let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
        keys.clear();
        keys.release_all();
        keys.press(key);
        app.update();
    }

    #[test]
    fn typing_and_enter_submit_a_line() {
        let mut app = console_app();
        press(&mut app, KeyCode::Backquote);
        assert!(app.world().resource::<ConsoleState>().open);

        for key in [KeyCode::Slash, KeyCode::KeyR, KeyCode::KeyX, KeyCode::Backspace] {
            press(&mut app, key);
        }
        assert_eq!(app.world().resource::<ConsoleState>().buffer, "/r");

        press(&mut app, KeyCode::Enter);
        let console = app.world().resource::<ConsoleState>();
        assert!(!console.open);
        assert_eq!(console.history, VecDeque::from(["/r".to_string()]));
    }

    #[test]
    fn history_keeps_only_the_newest_lines() {
        let mut console = ConsoleState::default();
        for i in 0..MAX_HISTORY + 8 {
            console.remember(format!("/spawn grunt{i}"));
        }
        assert_eq!(console.history.len(), MAX_HISTORY);
        assert_eq!(console.history.front().unwrap(), "/spawn grunt8");
        assert_eq!(
            console.history.back().unwrap(),
            &format!("/spawn grunt{}", MAX_HISTORY + 7)
        );
    }

    #[test]
    fn escape_closes_without_submitting() {
        let mut app = console_app();
        press(&mut app, KeyCode::Backquote);
        press(&mut app, KeyCode::KeyA);
        press(&mut app, KeyCode::Escape);
        let console = app.world().resource::<ConsoleState>();
        assert!(!console.open);
        assert!(console.buffer.is_empty());
        assert!(console.history.is_empty());
    }

    #[test]
    fn timescale_sets_virtual_speed() {
        let mut app = console_app();
        submit(&mut app, "/timescale 0.5");
        let speed = app.world().resource::<Time<Virtual>>().relative_speed();
        assert!((speed - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rebakenav_requests_a_bake() {
        let mut app = console_app();
        submit(&mut app, "/rebakenav");
        let messages = app.world().resource::<Messages<NavRebakeRequested>>();
        let mut cursor = messages.get_cursor();
        assert_eq!(cursor.read(messages).count(), 1);
    }

    #[test]
    fn spawn_places_enemy_in_front_of_player() {
        let mut app = console_app();
        app.world_mut()
            .spawn((Player, Facing(Vec3::X), Transform::from_xyz(1.0, 1.0, 1.0)));
        submit(&mut app, "/spawn runner");

        let world = app.world_mut();
        let mut q = world.query_filtered::<(&EnemyKind, &Transform), With<Enemy>>();
        let spawned: Vec<_> = q.iter(world).collect();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].0 .0, "runner");
        assert!((spawned[0].1.translation.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn unknown_names_spawn_and_grant_nothing() {
        let mut app = console_app();
        submit(&mut app, "/spawn dragon");
        submit(&mut app, "/upgrade wings");

        let world = app.world_mut();
        let mut q = world.query_filtered::<Entity, With<Enemy>>();
        assert_eq!(q.iter(world).count(), 0);
        let grants = world.resource::<Messages<GrantUpgrade>>();
        let mut cursor = grants.get_cursor();
        assert_eq!(cursor.read(grants).count(), 0);
    }

    #[test]
    fn upgrade_command_requests_a_grant() {
        let mut app = console_app();
        submit(&mut app, "/upgrade Whetstone");
        let grants = app.world().resource::<Messages<GrantUpgrade>>();
        let mut cursor = grants.get_cursor();
        let names: Vec<_> = cursor.read(grants).map(|g| g.name.clone()).collect();
        assert_eq!(names, vec!["whetstone".to_string()]);
    }
}
