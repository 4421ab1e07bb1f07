use bevy::prelude::*;

use crate::forest::{EffectKind, PlayEffect};
use crate::visualization::trees::color_from_hex;

/// A transient burst sprite: expands and fades, then despawns itself.
#[derive(Component)]
pub struct EffectSprite {
    pub kind: EffectKind,
    pub spawned_ms: f64,
    pub duration_ms: f64,
    pub base_color: Color,
    pub expansion: f32,
}

/// Visual parameters per effect kind: color source, footprint, lifetime,
/// how far the ring expands.
fn effect_visual(event: &PlayEffect) -> (Color, f32, f64, f32) {
    let visuals = event.0.stage.visuals();
    match event.0.kind {
        EffectKind::IncrementalPulse => (color_from_hex(visuals.glow_color), 40.0, 900.0, 2.0),
        EffectKind::Evolution => (color_from_hex(visuals.particle_color), 70.0, 1200.0, 3.5),
        EffectKind::NewlyFeatured => (color_from_hex(0xffd700), 80.0, 1400.0, 2.5),
    }
}

/// Spawn a burst sprite for every effect the core requests.
pub fn spawn_effect_sprites(
    mut commands: Commands,
    mut events: EventReader<PlayEffect>,
    time: Res<Time>,
) {
    let now_ms = time.elapsed_seconds_f64() * 1000.0;

    for event in events.read() {
        let (color, base_size, duration_ms, expansion) = effect_visual(event);
        let position = event.0.position;

        commands
            .spawn((
                SpriteBundle {
                    sprite: Sprite {
                        color: color.with_a(0.0),
                        custom_size: Some(Vec2::new(base_size, base_size)),
                        ..default()
                    },
                    transform: Transform::from_translation(Vec3::new(
                        position.x, position.y, 2.0, // Above trees
                    )),
                    ..default()
                },
                EffectSprite {
                    kind: event.0.kind,
                    spawned_ms: now_ms,
                    duration_ms,
                    base_color: color,
                    expansion,
                },
            ))
            .insert(Name::new(format!("Effect-{:?}-{}", event.0.kind, event.0.tree)));
    }
}

/// Drive every burst sprite through its expand-and-fade envelope.
pub fn animate_effect_sprites(
    mut commands: Commands,
    time: Res<Time>,
    mut effect_query: Query<(Entity, &EffectSprite, &mut Transform, &mut Sprite)>,
) {
    let now_ms = time.elapsed_seconds_f64() * 1000.0;

    for (entity, effect, mut transform, mut sprite_component) in effect_query.iter_mut() {
        let t = ((now_ms - effect.spawned_ms) / effect.duration_ms) as f32;
        if t >= 1.0 {
            commands.entity(entity).despawn_recursive();
            continue;
        }

        let pulse = (t * std::f32::consts::PI).sin();
        let opacity = match effect.kind {
            EffectKind::Evolution => 0.6 * pulse,
            _ => 0.45 * pulse,
        };
        sprite_component.color = effect.base_color.with_a(opacity);

        let grow = 1.0 + t * effect.expansion;
        transform.scale = Vec3::splat(grow);
    }
}
