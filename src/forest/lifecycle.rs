use std::collections::HashMap;
use std::fmt;

use bevy::prelude::*;
use glam::Vec3;

use crate::forest::animator::{lerp, AnimationOptions, GrowthAnimation};
use crate::forest::effects::{EffectKind, EffectRequest, EffectScheduler};
use crate::forest::stage::{clamp_growth, scale_for_growth, GrowthStage};
use crate::forest::tuning::ForestTuning;

/// Opaque stable identifier for a tree, as handed out by the external
/// store (document ids in the production deployment).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeId(String);

impl TreeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// In-memory presentation state for one tree. Created when the tree enters
/// view, dropped on disposal.
#[derive(Debug, Clone)]
pub struct TreeLifecycleState {
    pub current_stage: GrowthStage,
    /// Last observed growth value, clamped to [0, 100].
    pub growth: f32,
    /// Smallest integer percentage for which an incremental pulse has not
    /// yet fired. Always in [1, 101].
    pub next_effect_threshold: u32,
    pub animation: Option<GrowthAnimation>,
    pub scale: f32,
    pub tilt_z: f32,
    pub tilt_x: f32,
    pub position: Vec3,
    /// Where the tree was first planted; restored after stage eviction.
    pub original_position: Vec3,
    pub base_size: f32,
    /// Floating identity labels are hidden while the tree is featured.
    pub labels_visible: bool,
    /// Who planted the tree; shown on its floating label.
    pub planter: String,
    /// The dream the tree stands for; shown on its floating label.
    pub dream: String,
}

/// Owns every tree's lifecycle state plus the effect timer table, and is the
/// single entry point for store notifications about trees.
#[derive(Resource, Debug, Default)]
pub struct TreeLifecycleController {
    trees: HashMap<TreeId, TreeLifecycleState>,
    scheduler: EffectScheduler,
}

impl TreeLifecycleController {
    /// Register a tree that just entered view. The tree appears already at
    /// its correct stage and scale: no animation, no effects. Re-adding an
    /// existing id is a no-op.
    pub fn create(
        &mut self,
        id: TreeId,
        position: Vec3,
        base_size: f32,
        initial_growth: f32,
        planter: impl Into<String>,
        dream: impl Into<String>,
    ) {
        if self.trees.contains_key(&id) {
            debug!("tree {id} already tracked, ignoring duplicate add");
            return;
        }

        let growth = clamp_growth(initial_growth);
        let stage = GrowthStage::resolve(growth);
        debug!("tree {id} created at {stage:?} (growth {growth})");
        self.trees.insert(
            id,
            TreeLifecycleState {
                current_stage: stage,
                growth,
                next_effect_threshold: growth.floor() as u32 + 1,
                animation: None,
                scale: scale_for_growth(growth),
                tilt_z: 0.0,
                tilt_x: 0.0,
                position,
                original_position: position,
                base_size,
                labels_visible: true,
                planter: planter.into(),
                dream: dream.into(),
            },
        );
    }

    /// Apply an observed growth change. Unknown ids (never created, or
    /// already disposed) are ignored: the store's change stream can emit a
    /// final event after local teardown.
    pub fn update(
        &mut self,
        id: &TreeId,
        new_growth: f32,
        now_ms: f64,
        tuning: &ForestTuning,
        effects_out: &mut Vec<EffectRequest>,
    ) {
        let Some(state) = self.trees.get_mut(id) else {
            return;
        };
        let previous_stage = state.current_stage;
        self.scheduler
            .on_growth_changed(id, state, new_growth, now_ms, tuning, effects_out);
        if state.current_stage != previous_stage {
            info!(
                "tree {id} evolved {previous_stage:?} -> {:?} at growth {}",
                state.current_stage, state.growth
            );
        }
    }

    /// Tear a tree down, revoking its outstanding effect timers. Idempotent.
    pub fn dispose(&mut self, id: &TreeId) {
        self.scheduler.cancel_all(id);
        if self.trees.remove(id).is_some() {
            debug!("tree {id} disposed");
        }
    }

    /// Advance one frame: fire due effects, start the pulse animation for
    /// each fired incremental pulse, then sample every tree's animation (or
    /// ease idly toward its growth-derived scale).
    pub fn tick(&mut self, now_ms: f64, tuning: &ForestTuning, effects_out: &mut Vec<EffectRequest>) {
        let mut fired = Vec::new();
        self.scheduler.fire_due(now_ms, &mut fired);

        for request in &mut fired {
            // The tree may have been disposed between scheduling and firing.
            let Some(state) = self.trees.get_mut(&request.tree) else {
                continue;
            };
            // Play where the tree stands now; it may have moved onto the
            // featured stage since the effect was queued.
            request.position = state.position;
            if request.kind == EffectKind::IncrementalPulse {
                state.animation = Some(GrowthAnimation::start(
                    now_ms,
                    state.scale,
                    request.growth,
                    AnimationOptions {
                        overshoot_multiplier: request.stage.visuals().overshoot_multiplier,
                        duration_ms: tuning.growth_anim_duration_ms,
                        wave_intensity: tuning.pulse_wave_intensity,
                        wobble_strength: tuning.pulse_wobble_strength,
                    },
                ));
            }
        }
        effects_out.extend(fired);

        for state in self.trees.values_mut() {
            if let Some(animation) = state.animation {
                let sample = animation.sample(now_ms, state.tilt_z, state.tilt_x);
                state.scale = sample.scale;
                state.tilt_z = sample.tilt_z;
                state.tilt_x = sample.tilt_x;
                if sample.finished {
                    state.animation = None;
                }
            } else {
                // No discrete effect in flight: ease toward the target scale
                // so continuous external growth changes still read smoothly.
                let target = scale_for_growth(state.growth);
                state.scale = lerp(state.scale, target, tuning.idle_scale_smoothing);
                state.tilt_z = lerp(state.tilt_z, 0.0, tuning.idle_tilt_smoothing);
                state.tilt_x = lerp(state.tilt_x, 0.0, tuning.idle_tilt_smoothing);
            }
        }
    }

    pub fn get(&self, id: &TreeId) -> Option<&TreeLifecycleState> {
        self.trees.get(id)
    }

    pub fn get_mut(&mut self, id: &TreeId) -> Option<&mut TreeLifecycleState> {
        self.trees.get_mut(id)
    }

    pub fn contains(&self, id: &TreeId) -> bool {
        self.trees.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TreeId, &TreeLifecycleState)> {
        self.trees.iter()
    }

    #[cfg(test)]
    pub(crate) fn pending_effect_count(&self, id: &TreeId) -> usize {
        self.scheduler.pending_count(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tid(s: &str) -> TreeId {
        TreeId::new(s)
    }

    fn controller_with(growth: f32) -> (TreeLifecycleController, TreeId, ForestTuning) {
        let mut controller = TreeLifecycleController::default();
        let id = tid("tree");
        controller.create(id.clone(), Vec3::new(4.0, 0.0, 0.0), 6.0, growth, "Ana", "run a marathon");
        (controller, id, ForestTuning::default())
    }

    #[test]
    fn create_shows_tree_at_correct_stage_without_effects() {
        // Scenario A: growth 0 comes up as a germinating seed, scale 0.35,
        // nothing fires.
        let (controller, id, _) = controller_with(0.0);
        let state = controller.get(&id).unwrap();
        assert_eq!(state.current_stage, GrowthStage::Germination);
        assert_eq!(state.scale, 0.35);
        assert_eq!(state.next_effect_threshold, 1);
        assert!(state.animation.is_none());
        assert_eq!(controller.pending_effect_count(&id), 0);
    }

    #[test]
    fn create_at_high_growth_needs_no_catchup() {
        let (controller, id, _) = controller_with(87.0);
        let state = controller.get(&id).unwrap();
        assert_eq!(state.current_stage, GrowthStage::Adult);
        assert_eq!(state.next_effect_threshold, 88);
        assert!(state.animation.is_none());
    }

    #[test]
    fn stage_transition_fires_exactly_one_evolution() {
        // Scenario B: 19 is Baby, 20 is Child; the update fires one
        // evolution and zero pulses.
        let (mut controller, id, tuning) = controller_with(19.0);
        let mut out = Vec::new();
        controller.update(&id, 20.0, 0.0, &tuning, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, EffectKind::Evolution);
        assert_eq!(out[0].stage, GrowthStage::Child);
        assert_eq!(controller.pending_effect_count(&id), 0);

        let state = controller.get(&id).unwrap();
        assert_eq!(state.current_stage, GrowthStage::Child);
        assert_eq!(state.next_effect_threshold, 21);
        assert!(state.animation.is_some());
    }

    #[test]
    fn transition_cancels_previously_queued_pulses() {
        let (mut controller, id, tuning) = controller_with(10.0);
        let mut out = Vec::new();

        // Queue pulses for 11..=13, none fired yet.
        controller.update(&id, 13.0, 0.0, &tuning, &mut out);
        assert!(out.is_empty());
        assert_eq!(controller.pending_effect_count(&id), 3);

        // Crossing into Child supersedes them all.
        controller.update(&id, 25.0, 1.0, &tuning, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, EffectKind::Evolution);
        assert_eq!(controller.pending_effect_count(&id), 0);
    }

    #[test]
    fn multi_point_jump_staggers_pulses() {
        // Scenario C: 10 -> 13 queues three pulses at 0, 160, 320.
        let (mut controller, id, tuning) = controller_with(10.0);
        let mut out = Vec::new();
        controller.update(&id, 13.0, 0.0, &tuning, &mut out);
        assert!(out.is_empty(), "pulses are deferred, not immediate");

        controller.tick(0.0, &tuning, &mut out);
        assert_eq!(out.len(), 1);
        controller.tick(159.0, &tuning, &mut out);
        assert_eq!(out.len(), 1);
        controller.tick(160.0, &tuning, &mut out);
        assert_eq!(out.len(), 2);
        controller.tick(320.0, &tuning, &mut out);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|e| e.kind == EffectKind::IncrementalPulse));

        let state = controller.get(&id).unwrap();
        assert_eq!(state.next_effect_threshold, 14);
    }

    #[test]
    fn redundant_update_is_effect_free() {
        let (mut controller, id, tuning) = controller_with(10.0);
        let mut out = Vec::new();
        controller.update(&id, 13.0, 0.0, &tuning, &mut out);
        assert_eq!(controller.pending_effect_count(&id), 3);

        // Same value again: nothing new is queued.
        controller.update(&id, 13.0, 1.0, &tuning, &mut out);
        assert_eq!(controller.pending_effect_count(&id), 3);
        assert!(out.is_empty());
    }

    #[test]
    fn shrinking_is_silent_and_resets_threshold() {
        let (mut controller, id, tuning) = controller_with(13.0);
        let mut out = Vec::new();
        controller.update(&id, 8.0, 0.0, &tuning, &mut out);
        assert!(out.is_empty());
        assert_eq!(controller.pending_effect_count(&id), 0);

        let state = controller.get(&id).unwrap();
        assert_eq!(state.next_effect_threshold, 9);
        assert_eq!(state.growth, 8.0);

        // Growing again fires from the reset threshold.
        controller.update(&id, 9.0, 1.0, &tuning, &mut out);
        assert_eq!(controller.pending_effect_count(&id), 1);
    }

    #[test]
    fn malformed_growth_is_clamped_not_fatal() {
        let (mut controller, id, tuning) = controller_with(50.0);
        let mut out = Vec::new();
        controller.update(&id, f32::NAN, 0.0, &tuning, &mut out);
        let state = controller.get(&id).unwrap();
        assert_eq!(state.growth, 0.0);
        assert_eq!(state.current_stage, GrowthStage::Germination);

        controller.update(&id, 900.0, 1.0, &tuning, &mut out);
        assert_eq!(controller.get(&id).unwrap().growth, 100.0);
    }

    #[test]
    fn dispose_is_idempotent_and_blocks_further_updates() {
        let (mut controller, id, tuning) = controller_with(10.0);
        let mut out = Vec::new();
        controller.update(&id, 13.0, 0.0, &tuning, &mut out);
        assert_eq!(controller.pending_effect_count(&id), 3);

        controller.dispose(&id);
        assert!(!controller.contains(&id));
        assert_eq!(controller.pending_effect_count(&id), 0);
        controller.dispose(&id);

        // A late change-stream event after teardown is a no-op.
        controller.update(&id, 50.0, 1.0, &tuning, &mut out);
        assert!(out.is_empty());
        assert!(!controller.contains(&id));

        // Timers queued before disposal never fire.
        controller.tick(1000.0, &tuning, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn create_keeps_planter_and_dream_for_the_label() {
        let mut controller = TreeLifecycleController::default();
        let id = tid("tree");
        controller.create(id.clone(), Vec3::ZERO, 6.0, 0.0, "Lucía", "open a bakery");

        let state = controller.get(&id).unwrap();
        assert_eq!(state.planter, "Lucía");
        assert_eq!(state.dream, "open a bakery");
        assert!(state.labels_visible);
    }

    #[test]
    fn fired_pulse_plays_at_the_tree_current_position() {
        let (mut controller, id, tuning) = controller_with(10.0);
        let mut out = Vec::new();
        controller.update(&id, 11.0, 0.0, &tuning, &mut out);

        // The tree moves onto the featured stage before the pulse fires.
        let stage_position = Vec3::new(60.0, 50.0, 0.0);
        controller.get_mut(&id).unwrap().position = stage_position;

        controller.tick(0.0, &tuning, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].position, stage_position);
    }

    #[test]
    fn fired_pulse_starts_an_animation() {
        let (mut controller, id, tuning) = controller_with(10.0);
        let mut out = Vec::new();
        controller.update(&id, 11.0, 0.0, &tuning, &mut out);
        assert!(controller.get(&id).unwrap().animation.is_none());

        controller.tick(0.0, &tuning, &mut out);
        assert_eq!(out.len(), 1);
        assert!(controller.get(&id).unwrap().animation.is_some());
    }

    #[test]
    fn idle_tick_eases_scale_toward_growth_target() {
        let (mut controller, id, tuning) = controller_with(0.0);
        let mut out = Vec::new();
        // Push growth without crossing a whole threshold from 0.35 target.
        controller.get_mut(&id).unwrap().growth = 100.0;

        let before = controller.get(&id).unwrap().scale;
        controller.tick(0.0, &tuning, &mut out);
        let after = controller.get(&id).unwrap().scale;
        assert!(after > before);
        assert!(after < 1.1, "eases rather than snapping");
    }

    #[test]
    fn animation_completes_and_clears() {
        let (mut controller, id, tuning) = controller_with(10.0);
        let mut out = Vec::new();
        controller.update(&id, 11.0, 0.0, &tuning, &mut out);
        controller.tick(0.0, &tuning, &mut out);
        assert!(controller.get(&id).unwrap().animation.is_some());

        controller.tick(2000.0, &tuning, &mut out);
        let state = controller.get(&id).unwrap();
        assert!(state.animation.is_none());
        assert!((state.scale - scale_for_growth(11.0)).abs() < 1e-6);
    }

    #[test]
    fn trees_are_independent() {
        let mut controller = TreeLifecycleController::default();
        let tuning = ForestTuning::default();
        let a = tid("a");
        let b = tid("b");
        controller.create(a.clone(), Vec3::ZERO, 6.0, 10.0, "Ana", "run a marathon");
        controller.create(b.clone(), Vec3::X, 6.0, 10.0, "Mateo", "write a novel");

        let mut out = Vec::new();
        controller.update(&a, 12.0, 0.0, &tuning, &mut out);
        controller.update(&b, 25.0, 0.0, &tuning, &mut out);

        assert_eq!(controller.pending_effect_count(&a), 2);
        assert_eq!(controller.pending_effect_count(&b), 0);
        assert_eq!(controller.get(&a).unwrap().current_stage, GrowthStage::Baby);
        assert_eq!(controller.get(&b).unwrap().current_stage, GrowthStage::Child);
    }
}
