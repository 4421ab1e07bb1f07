use bevy::prelude::*;

use crate::featured::stage_positions;

/// Camera configuration for the installation operator.
#[derive(Resource)]
pub struct CameraConfig {
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub default_zoom: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            zoom_speed: 0.1,
            pan_speed: 500.0,
            min_zoom: 0.1,
            max_zoom: 5.0,
            default_zoom: 1.0,
        }
    }
}

/// Pan/zoom controls so an operator can frame the forest on the public
/// display, plus a shortcut that jumps to the featured stage row.
pub fn handle_camera_controls(
    mut camera_query: Query<(&mut Transform, &mut OrthographicProjection), With<Camera2d>>,
    keyboard_input: Res<Input<KeyCode>>,
    time: Res<Time>,
    config: Res<CameraConfig>,
) {
    let Ok((mut transform, mut projection)) = camera_query.get_single_mut() else {
        // Camera might not be ready yet, skip this frame
        return;
    };

    let dt = time.delta_seconds();

    let mut pan_direction = Vec2::ZERO;
    if keyboard_input.pressed(KeyCode::W) || keyboard_input.pressed(KeyCode::Up) {
        pan_direction.y += 1.0;
    }
    if keyboard_input.pressed(KeyCode::S) || keyboard_input.pressed(KeyCode::Down) {
        pan_direction.y -= 1.0;
    }
    if keyboard_input.pressed(KeyCode::A) || keyboard_input.pressed(KeyCode::Left) {
        pan_direction.x -= 1.0;
    }
    if keyboard_input.pressed(KeyCode::D) || keyboard_input.pressed(KeyCode::Right) {
        pan_direction.x += 1.0;
    }

    if pan_direction.length() > 0.0 {
        let pan_amount = pan_direction.normalize() * config.pan_speed * dt / projection.scale;
        transform.translation.x += pan_amount.x;
        transform.translation.y += pan_amount.y;
    }

    if keyboard_input.pressed(KeyCode::Equals) {
        projection.scale = (projection.scale - config.zoom_speed * dt).max(config.min_zoom);
    }
    if keyboard_input.pressed(KeyCode::Minus) {
        projection.scale = (projection.scale + config.zoom_speed * dt).min(config.max_zoom);
    }

    if keyboard_input.just_pressed(KeyCode::Key0) {
        projection.scale = config.default_zoom;
    }

    // Center on the featured stage row.
    if keyboard_input.just_pressed(KeyCode::F) {
        let positions = stage_positions();
        let center = positions.iter().sum::<glam::Vec3>() / positions.len() as f32;
        transform.translation.x = center.x;
        transform.translation.y = center.y;
    }

    if keyboard_input.just_pressed(KeyCode::R) {
        transform.translation = Vec3::ZERO;
        projection.scale = config.default_zoom;
    }
}
