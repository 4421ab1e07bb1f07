mod camera;
mod effects;
mod trees;

pub use camera::*;
pub use effects::*;
pub use trees::*;

use bevy::prelude::*;

pub struct VisualizationPlugin;

impl Plugin for VisualizationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraConfig>()
            .add_systems(Startup, setup_visualization)
            .add_systems(
                Update,
                (
                    spawn_tree_sprites,
                    update_tree_sprites,
                    sync_featured_halos,
                    spawn_effect_sprites,
                    animate_effect_sprites,
                    handle_camera_controls,
                ),
            );
    }
}

fn setup_visualization(mut commands: Commands) {
    // Ground backdrop so the forest has visible bounds.
    commands.spawn(SpriteBundle {
        sprite: Sprite {
            color: Color::rgb(0.07, 0.12, 0.08),
            custom_size: Some(Vec2::new(2000.0, 2000.0)),
            ..default()
        },
        transform: Transform::from_translation(Vec3::new(0.0, 0.0, 0.0)),
        ..default()
    });

    info!("Visualization ready");
    info!("Camera controls: WASD/Arrows = Pan, +/- = Zoom, 0 = Reset Zoom, F = Featured Stage, R = Reset Camera");
}
