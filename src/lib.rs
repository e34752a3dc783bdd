//! Brawlhouse gameplay layer.
//!
//! A 3D arena brawler built on Bevy and Rapier: the player moves, dashes,
//! swings and throws improvised weapons at waves of enemies composed from a
//! threat budget, slides on ice and oil, sets oil on fire, and collects
//! data-driven upgrades whose triggers fire on gameplay events.
//!
//! [`GamePlugin`] wires every gameplay plugin together.  It does not add
//! rendering or physics; the binary adds `DefaultPlugins`, the Rapier plugin
//! and [`arena::ArenaVisualsPlugin`], while tests run it under
//! `MinimalPlugins`.

pub mod arena;
pub mod config;
pub mod console;
pub mod constants;
pub mod enemy;
pub mod error;
pub mod events;
pub mod navigation;
pub mod player;
pub mod spawner;
pub mod state;
pub mod surface;
pub mod upgrade;

use bevy::prelude::*;
use bevy_rapier3d::prelude::CollisionEvent;

use config::{load_game_config, GameConfig};
use state::{pause_toggle_system, seed_game_rng, GameRng, GameState};

pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(GameConfig::default())
            .init_resource::<GameRng>()
            .init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<ButtonInput<MouseButton>>()
            .init_state::<GameState>()
            // Registered by the Rapier plugin in the binary; added here so the
            // thrown-item hit system also runs headless.
            .add_message::<CollisionEvent>()
            .add_plugins((
                events::EventBusPlugin,
                upgrade::UpgradePlugin,
                enemy::EnemyPlugin,
                spawner::SpawnerPlugin,
                player::PlayerPlugin,
                surface::SurfacePlugin,
                navigation::NavigationPlugin,
                console::ConsolePlugin,
            ))
            .add_systems(
                Startup,
                (
                    // Config first so every other startup system sees the final values.
                    load_game_config
                        .before(seed_game_rng)
                        .before(spawner::reset_spawner),
                    seed_game_rng,
                    arena::setup_arena.after(load_game_config),
                    player::spawn_player.after(load_game_config),
                ),
            )
            .add_systems(
                Update,
                pause_toggle_system
                    .run_if(console::console_closed)
                    .before(console::console_input_system),
            );
    }
}
