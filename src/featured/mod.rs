mod slots;

use bevy::prelude::*;
use glam::Vec3;

pub use slots::{FeaturedHighlight, SlotAllocator};

use crate::forest::{ForestTuning, PlayEffect, TreeLifecycleController};
use crate::store::{FeaturedRankingChanged, TreeRemoved};

/// Slot the most recently requested tree is pinned to (center of the row).
pub const MAIN_SLOT_INDEX: usize = 5;

/// Fixed world positions of the featured stage: one front row, symmetric
/// about the center, nearest slots in the middle.
pub fn stage_positions() -> Vec<Vec3> {
    [
        (-300.0, -230.0),
        (-280.0, -100.0),
        (-160.0, -250.0),
        (-120.0, -100.0),
        (-45.0, -270.0),
        (45.0, -270.0),
        (120.0, -100.0),
        (160.0, -250.0),
        (280.0, -100.0),
        (300.0, -230.0),
    ]
    .iter()
    .map(|&(x, y)| Vec3::new(x, y, 0.0))
    .collect()
}

pub struct FeaturedPlugin;

impl Plugin for FeaturedPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SlotAllocator::new(stage_positions(), Some(MAIN_SLOT_INDEX)))
            .add_systems(
                Update,
                (apply_featured_ranking, release_removed_trees, expire_highlight),
            );
    }
}

/// Rebuild the featured stage whenever the store pushes a new ranking.
fn apply_featured_ranking(
    mut rankings: EventReader<FeaturedRankingChanged>,
    mut allocator: ResMut<SlotAllocator>,
    mut controller: ResMut<TreeLifecycleController>,
    tuning: Res<ForestTuning>,
    time: Res<Time>,
    mut play: EventWriter<PlayEffect>,
) {
    let now_ms = time.elapsed_seconds_f64() * 1000.0;
    let mut out = Vec::new();
    for ev in rankings.read() {
        debug!("reconciling featured stage with {} ranked trees", ev.ranked.len());
        allocator.reconcile(&ev.ranked, now_ms, &mut controller, &tuning, &mut out);
    }
    for request in out {
        play.send(PlayEffect(request));
    }
}

/// A removed tree frees its slot outright; there is nothing left to restore.
fn release_removed_trees(
    mut removed: EventReader<TreeRemoved>,
    mut allocator: ResMut<SlotAllocator>,
) {
    for ev in removed.read() {
        allocator.release(&ev.id);
    }
}

fn expire_highlight(mut allocator: ResMut<SlotAllocator>, time: Res<Time>) {
    allocator.tick(time.elapsed_seconds_f64() * 1000.0);
}
