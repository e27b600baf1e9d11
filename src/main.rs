use bevy::prelude::*;
use arix_tree::audio::ToneAudioPlugin;
use arix_tree::wish::WishPlugin;
use arix_tree::TreePlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Arix Signature Tree".to_string(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins((ToneAudioPlugin, TreePlugin, WishPlugin))
        .run();
}
