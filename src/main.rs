use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy_rapier3d::prelude::*;

use brawlhouse::arena::ArenaVisualsPlugin;
use brawlhouse::GamePlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Brawlhouse".into(),
                resolution: WindowResolution::new(1280, 720),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.07)))
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
        .add_plugins(GamePlugin)
        .add_plugins(ArenaVisualsPlugin)
        .run();
}
