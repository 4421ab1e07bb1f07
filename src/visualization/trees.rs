use std::collections::HashSet;

use bevy::prelude::*;

use crate::featured::SlotAllocator;
use crate::forest::{TreeId, TreeLifecycleController};

/// Marker component for tree sprite entities
#[derive(Component)]
pub struct TreeSprite {
    pub tree: TreeId,
}

/// Floating identity label above a tree (planter name / dream).
#[derive(Component)]
pub struct TreeLabel;

/// Gold floor halo under a featured tree.
#[derive(Component)]
pub struct FeaturedHalo {
    pub tree: TreeId,
}

pub fn color_from_hex(hex: u32) -> Color {
    Color::rgb_u8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// Spawn sprites for trees the controller tracks but the scene doesn't yet.
pub fn spawn_tree_sprites(
    mut commands: Commands,
    controller: Res<TreeLifecycleController>,
    sprite_query: Query<&TreeSprite>,
) {
    let existing: HashSet<&TreeId> = sprite_query.iter().map(|s| &s.tree).collect();

    for (id, state) in controller.iter() {
        if existing.contains(id) {
            continue;
        }

        let visuals = state.current_stage.visuals();
        let height = (state.base_size * visuals.height_factor * 12.0).max(8.0);

        commands
            .spawn((
                SpriteBundle {
                    sprite: Sprite {
                        color: color_from_hex(visuals.leaf_color),
                        custom_size: Some(Vec2::new(height * 0.6, height)),
                        ..default()
                    },
                    transform: Transform::from_translation(Vec3::new(
                        state.position.x,
                        state.position.y,
                        1.0, // Render above background and halos
                    ))
                    .with_scale(Vec3::splat(state.scale)),
                    ..default()
                },
                TreeSprite { tree: id.clone() },
            ))
            .with_children(|parent| {
                // Floating planter/dream card above the canopy.
                parent.spawn((
                    Text2dBundle {
                        text: Text::from_sections([
                            TextSection::new(
                                &state.planter,
                                TextStyle {
                                    font_size: 22.0,
                                    color: Color::rgba(1.0, 0.98, 0.94, 0.95),
                                    ..default()
                                },
                            ),
                            TextSection::new(
                                format!("\n{}", state.dream),
                                TextStyle {
                                    font_size: 16.0,
                                    color: Color::rgba(0.85, 0.92, 0.82, 0.85),
                                    ..default()
                                },
                            ),
                        ])
                        .with_alignment(TextAlignment::Center),
                        transform: Transform::from_translation(Vec3::new(
                            0.0,
                            height * 0.85,
                            0.1,
                        )),
                        ..default()
                    },
                    TreeLabel,
                ));
            })
            .insert(Name::new(format!("Tree-{id}")));
    }
}

/// Sync every tree sprite with its lifecycle state each frame: transform
/// from the animator, silhouette and color from the current stage.
pub fn update_tree_sprites(
    mut commands: Commands,
    controller: Res<TreeLifecycleController>,
    mut sprite_query: Query<(Entity, &TreeSprite, &mut Transform, &mut Sprite, &Children)>,
    mut label_query: Query<&mut Visibility, With<TreeLabel>>,
) {
    for (entity, sprite, mut transform, mut sprite_component, children) in sprite_query.iter_mut() {
        let Some(state) = controller.get(&sprite.tree) else {
            // Tree was disposed, remove its sprite and children.
            commands.entity(entity).despawn_recursive();
            continue;
        };

        transform.translation.x = state.position.x;
        transform.translation.y = state.position.y;
        transform.scale = Vec3::splat(state.scale);
        transform.rotation = Quat::from_rotation_z(state.tilt_z);

        let visuals = state.current_stage.visuals();
        let height = (state.base_size * visuals.height_factor * 12.0).max(8.0);
        sprite_component.color = color_from_hex(visuals.leaf_color);
        sprite_component.custom_size = Some(Vec2::new(height * 0.6, height));

        for child in children.iter() {
            if let Ok(mut visibility) = label_query.get_mut(*child) {
                *visibility = if state.labels_visible {
                    Visibility::Inherited
                } else {
                    Visibility::Hidden
                };
            }
        }
    }
}

/// Keep floor halos in sync with the featured slots: spawn one under each
/// featured tree, remove it on eviction, pulse it during the highlight hold.
pub fn sync_featured_halos(
    mut commands: Commands,
    allocator: Res<SlotAllocator>,
    controller: Res<TreeLifecycleController>,
    mut halo_query: Query<(Entity, &FeaturedHalo, &mut Transform, &mut Sprite)>,
    time: Res<Time>,
) {
    let featured: HashSet<&TreeId> = allocator.slots().iter().flatten().collect();
    let mut haloed: HashSet<TreeId> = HashSet::new();

    for (entity, halo, mut transform, mut sprite_component) in halo_query.iter_mut() {
        if !featured.contains(&halo.tree) || !controller.contains(&halo.tree) {
            commands.entity(entity).despawn_recursive();
            continue;
        }
        haloed.insert(halo.tree.clone());

        if let Some(state) = controller.get(&halo.tree) {
            transform.translation.x = state.position.x;
            transform.translation.y = state.position.y;
        }

        let highlighted = allocator
            .highlight()
            .map_or(false, |h| h.tree == halo.tree);
        let alpha = if highlighted {
            // Emphasis pulse while the "newly featured" styling holds.
            0.5 + (time.elapsed_seconds() * 6.0).sin() * 0.25
        } else {
            0.5
        };
        sprite_component.color = color_from_hex(0xfff2a8).with_a(alpha);
    }

    for id in featured {
        if haloed.contains(id) {
            continue;
        }
        let Some(state) = controller.get(id) else {
            continue;
        };
        commands
            .spawn((
                SpriteBundle {
                    sprite: Sprite {
                        color: color_from_hex(0xfff2a8).with_a(0.5),
                        custom_size: Some(Vec2::new(60.0, 60.0)),
                        ..default()
                    },
                    transform: Transform::from_translation(Vec3::new(
                        state.position.x,
                        state.position.y,
                        0.5, // Below the tree sprite
                    )),
                    ..default()
                },
                FeaturedHalo { tree: id.clone() },
            ))
            .insert(Name::new(format!("Halo-{id}")));
    }
}
