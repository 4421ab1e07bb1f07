mod featured;
mod forest;
mod store;
mod visualization;

use bevy::prelude::*;
use featured::FeaturedPlugin;
use forest::ForestPlugin;
use store::StorePlugin;
use tracing_subscriber::EnvFilter;
use visualization::VisualizationPlugin;

fn main() {
    // Default to INFO level if RUST_LOG is not set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Dream Forest".into(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(StorePlugin)
        .add_plugins(ForestPlugin)
        .add_plugins(FeaturedPlugin)
        .add_plugins(VisualizationPlugin)
        .add_systems(Startup, setup)
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn(Camera2dBundle::default());

    info!("Dream Forest display initialized");
}
