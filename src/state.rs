use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::GameConfig;

/// Top-level application state machine.
#[derive(States, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    /// Active gameplay; every gameplay system is gated on this state.
    #[default]
    Playing,
    /// Simulation frozen by the player.
    Paused,
    /// Player health reached zero.
    GameOver,
}

/// Shared gameplay RNG.
///
/// A single seeded generator keeps runs reproducible when `rng_seed` is set.
#[derive(Resource)]
pub struct GameRng(pub StdRng);

impl GameRng {
    pub fn from_seed(seed: u64) -> Self {
        if seed == 0 {
            Self(StdRng::from_entropy())
        } else {
            Self(StdRng::seed_from_u64(seed))
        }
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_seed(0)
    }
}

/// Startup system: reseed [`GameRng`] once the config file has been read.
pub fn seed_game_rng(mut rng: ResMut<GameRng>, config: Res<GameConfig>) {
    *rng = GameRng::from_seed(config.rng_seed);
}

/// `Escape` toggles between `Playing` and `Paused`.
pub fn pause_toggle_system(
    keys: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameState>>,
    mut next: ResMut<NextState<GameState>>,
) {
    if !keys.just_pressed(KeyCode::Escape) {
        return;
    }
    match state.get() {
        GameState::Playing => next.set(GameState::Paused),
        GameState::Paused => next.set(GameState::Playing),
        GameState::GameOver => {}
    }
}
