use std::collections::HashMap;

use glam::Vec3;
use smallvec::SmallVec;

use crate::forest::animator::{AnimationOptions, GrowthAnimation};
use crate::forest::lifecycle::{TreeId, TreeLifecycleState};
use crate::forest::stage::{clamp_growth, GrowthStage};
use crate::forest::tuning::ForestTuning;

/// The kinds of one-shot visual effect the core can request from the
/// rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Small burst for one integer percentage point gained within a stage.
    IncrementalPulse,
    /// Large burst on a stage transition.
    Evolution,
    /// Highlight when a tree becomes the primary featured tree.
    NewlyFeatured,
}

/// A fire-and-forget effect request. Rendering failures feed nothing back
/// into the core.
#[derive(Debug, Clone)]
pub struct EffectRequest {
    pub tree: TreeId,
    pub kind: EffectKind,
    pub stage: GrowthStage,
    /// World position to play the effect at. Refreshed at fire time for
    /// deferred effects, since the tree may move while they are queued.
    pub position: Vec3,
    /// Growth value the accompanying animation should settle on.
    pub growth: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectHandle(u64);

#[derive(Debug, Clone)]
struct ScheduledEffect {
    handle: EffectHandle,
    fire_at_ms: f64,
    request: EffectRequest,
}

/// Per-tree table of deferred effects, drained by the frame loop. Replaces
/// host timers so cancellation is an explicit table removal.
#[derive(Debug, Default)]
pub struct EffectScheduler {
    next_handle: u64,
    pending: HashMap<TreeId, SmallVec<[ScheduledEffect; 4]>>,
}

impl EffectScheduler {
    /// Queue an effect to fire `delay_ms` from `now_ms`.
    pub fn schedule(&mut self, now_ms: f64, delay_ms: f64, request: EffectRequest) -> EffectHandle {
        self.next_handle += 1;
        let handle = EffectHandle(self.next_handle);
        self.pending
            .entry(request.tree.clone())
            .or_default()
            .push(ScheduledEffect {
                handle,
                fire_at_ms: now_ms + delay_ms,
                request,
            });
        handle
    }

    /// Cancel one pending effect. Cancelling an already-fired or
    /// already-cancelled handle is a no-op.
    pub fn cancel(&mut self, tree: &TreeId, handle: EffectHandle) {
        if let Some(list) = self.pending.get_mut(tree) {
            list.retain(|e| e.handle != handle);
            if list.is_empty() {
                self.pending.remove(tree);
            }
        }
    }

    /// Cancel every pending effect for a tree. Used when a stage transition
    /// supersedes queued pulses and on disposal.
    pub fn cancel_all(&mut self, tree: &TreeId) {
        self.pending.remove(tree);
    }

    /// Drain effects whose time has come, in firing order.
    pub fn fire_due(&mut self, now_ms: f64, out: &mut Vec<EffectRequest>) {
        let mut fired: Vec<ScheduledEffect> = Vec::new();
        self.pending.retain(|_, list| {
            let mut i = 0;
            while i < list.len() {
                if list[i].fire_at_ms <= now_ms {
                    fired.push(list.remove(i));
                } else {
                    i += 1;
                }
            }
            !list.is_empty()
        });
        fired.sort_by(|a, b| a.fire_at_ms.total_cmp(&b.fire_at_ms));
        out.extend(fired.into_iter().map(|e| e.request));
    }

    pub fn pending_count(&self, tree: &TreeId) -> usize {
        self.pending.get(tree).map_or(0, |l| l.len())
    }

    /// React to an observed growth change for one tree.
    ///
    /// A stage transition fires one evolution effect immediately (pushed to
    /// `immediate`), cancels queued pulses, and restarts the growth
    /// animation with extra overshoot. Within a stage, one incremental
    /// pulse is queued per integer threshold crossed, staggered so bursts
    /// cascade instead of overlapping. Shrinking is silent.
    pub fn on_growth_changed(
        &mut self,
        id: &TreeId,
        state: &mut TreeLifecycleState,
        new_growth: f32,
        now_ms: f64,
        tuning: &ForestTuning,
        immediate: &mut Vec<EffectRequest>,
    ) {
        let growth = clamp_growth(new_growth);
        state.growth = growth;

        let desired_stage = GrowthStage::resolve(growth);
        if desired_stage != state.current_stage {
            // The bigger transition effect supersedes any queued pulses.
            self.cancel_all(id);
            state.current_stage = desired_stage;
            state.next_effect_threshold = growth.floor() as u32 + 1;

            immediate.push(EffectRequest {
                tree: id.clone(),
                kind: EffectKind::Evolution,
                stage: desired_stage,
                position: state.position,
                growth,
            });
            state.animation = Some(GrowthAnimation::start(
                now_ms,
                state.scale,
                growth,
                AnimationOptions {
                    overshoot_multiplier: desired_stage.visuals().overshoot_multiplier
                        + tuning.evolution_overshoot_bonus,
                    duration_ms: tuning.evolution_anim_duration_ms,
                    wave_intensity: tuning.evolution_wave_intensity,
                    wobble_strength: tuning.evolution_wobble_strength,
                },
            ));
            return;
        }

        // Growth went down: move the threshold back without firing anything.
        if growth < state.next_effect_threshold as f32 - 1.0 {
            state.next_effect_threshold = growth.floor() as u32 + 1;
        }

        let mut effect_index = 0u32;
        while growth >= state.next_effect_threshold as f32 && state.next_effect_threshold <= 100 {
            let delay = effect_index as f64 * tuning.effect_stagger_ms;
            self.schedule(
                now_ms,
                delay,
                EffectRequest {
                    tree: id.clone(),
                    kind: EffectKind::IncrementalPulse,
                    stage: desired_stage,
                    position: state.position,
                    growth,
                },
            );
            state.next_effect_threshold += 1;
            effect_index += 1;
        }
    }
}
