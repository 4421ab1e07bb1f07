mod animator;
mod effects;
mod lifecycle;
mod stage;
mod tuning;

use bevy::prelude::*;

pub use animator::{AnimationOptions, AnimationSample, GrowthAnimation};
pub use effects::{EffectHandle, EffectKind, EffectRequest, EffectScheduler};
pub use lifecycle::{TreeId, TreeLifecycleController, TreeLifecycleState};
pub use stage::{clamp_growth, scale_for_growth, GrowthStage, StageVisuals, STAGE_ORDER};
pub use tuning::ForestTuning;

use crate::store::{TreeAdded, TreeGrowthChanged, TreeRemoved};

/// Fire-and-forget command to the rendering collaborator.
#[derive(Event, Debug, Clone)]
pub struct PlayEffect(pub EffectRequest);

pub struct ForestPlugin;

impl Plugin for ForestPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ForestTuning>()
            .init_resource::<TreeLifecycleController>()
            .add_event::<PlayEffect>()
            .add_systems(Update, (ingest_store_changes, advance_lifecycles).chain());
    }
}

/// Feed store change notifications into the lifecycle controller.
fn ingest_store_changes(
    mut controller: ResMut<TreeLifecycleController>,
    tuning: Res<ForestTuning>,
    time: Res<Time>,
    mut added: EventReader<TreeAdded>,
    mut changed: EventReader<TreeGrowthChanged>,
    mut removed: EventReader<TreeRemoved>,
    mut play: EventWriter<PlayEffect>,
) {
    let now_ms = time.elapsed_seconds_f64() * 1000.0;
    let mut out = Vec::new();

    for ev in added.read() {
        let base_size = tuning.base_size_min + fastrand::f32() * tuning.base_size_jitter;
        controller.create(
            ev.id.clone(),
            ev.position,
            base_size,
            ev.growth,
            ev.planter.clone(),
            ev.dream.clone(),
        );
    }
    for ev in changed.read() {
        controller.update(&ev.id, ev.growth, now_ms, &tuning, &mut out);
    }
    for ev in removed.read() {
        controller.dispose(&ev.id);
    }

    for request in out {
        play.send(PlayEffect(request));
    }
}

/// Once per frame: fire due scheduled effects and sample every animation.
fn advance_lifecycles(
    mut controller: ResMut<TreeLifecycleController>,
    tuning: Res<ForestTuning>,
    time: Res<Time>,
    mut play: EventWriter<PlayEffect>,
) {
    let now_ms = time.elapsed_seconds_f64() * 1000.0;
    let mut out = Vec::new();
    controller.tick(now_ms, &tuning, &mut out);
    for request in out {
        play.send(PlayEffect(request));
    }
}
