use bevy::prelude::*;
use glam::Vec3;

use crate::forest::{
    EffectKind, EffectRequest, ForestTuning, TreeId, TreeLifecycleController,
};

/// Emphasis styling for the most recently featured tree, cleared after a
/// hold period.
#[derive(Debug, Clone)]
pub struct FeaturedHighlight {
    pub tree: TreeId,
    pub until_ms: f64,
}

/// Assigns trees to the fixed featured-stage positions from an externally
/// ranked list (most recently requested first). Rebuilt wholesale on every
/// ranking change; slot occupancy is the single source of truth.
#[derive(Resource, Debug)]
pub struct SlotAllocator {
    slots: Vec<Option<TreeId>>,
    positions: Vec<Vec3>,
    /// Slot the top-ranked tree is pinned to, when designated.
    main_slot: Option<usize>,
    last_primary: Option<TreeId>,
    highlight: Option<FeaturedHighlight>,
}

impl SlotAllocator {
    pub fn new(positions: Vec<Vec3>, main_slot: Option<usize>) -> Self {
        let main_slot = main_slot.filter(|i| *i < positions.len());
        Self {
            slots: vec![None; positions.len()],
            positions,
            main_slot,
            last_primary: None,
            highlight: None,
        }
    }

    /// Rebuild slot assignments from a fresh ranked list.
    ///
    /// Trees leaving the list are restored to their original position with
    /// labels shown again; the top-ranked tree is pinned to the main slot;
    /// the rest fill free slots in rank order; overflow ids are dropped. A
    /// change of primary fires a one-shot "newly featured" effect.
    pub fn reconcile(
        &mut self,
        ranked: &[TreeId],
        now_ms: f64,
        controller: &mut TreeLifecycleController,
        tuning: &ForestTuning,
        effects_out: &mut Vec<EffectRequest>,
    ) {
        // Restore everything that fell out of the ranking. The tree may
        // have been removed since the ranking was computed; skip silently.
        for slot in self.slots.iter_mut() {
            let Some(id) = slot.take() else { continue };
            if ranked.contains(&id) {
                continue;
            }
            if let Some(state) = controller.get_mut(&id) {
                state.position = state.original_position;
                state.labels_visible = true;
            }
        }

        // Full rebuild each call; with ten slots a diff is not worth it.
        for slot in self.slots.iter_mut() {
            *slot = None;
        }

        let Some(primary) = ranked.first() else {
            self.last_primary = None;
            self.highlight = None;
            return;
        };

        let mut remaining = ranked.iter();
        if let Some(main) = self.main_slot {
            self.slots[main] = Some(primary.clone());
            remaining.next();
        }

        let mut cursor = 0;
        for id in remaining {
            while cursor < self.slots.len() && self.slots[cursor].is_some() {
                cursor += 1;
            }
            if cursor >= self.slots.len() {
                break;
            }
            self.slots[cursor] = Some(id.clone());
        }

        // Move every assigned tree onto its stage position and tuck its
        // floating labels away (the stage card shows the same info).
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(id) = slot else { continue };
            match controller.get_mut(id) {
                Some(state) => {
                    state.position = self.positions[index];
                    state.labels_visible = false;
                }
                None => {
                    // Ranked id with no live tree behind it.
                    *slot = None;
                }
            }
        }

        if self.last_primary.as_ref() != Some(primary) {
            info!("newly featured tree: {primary}");
            if let Some(state) = controller.get(primary) {
                effects_out.push(EffectRequest {
                    tree: primary.clone(),
                    kind: EffectKind::NewlyFeatured,
                    stage: state.current_stage,
                    position: state.position,
                    growth: state.growth,
                });
            }
            self.highlight = Some(FeaturedHighlight {
                tree: primary.clone(),
                until_ms: now_ms + tuning.highlight_hold_ms,
            });
            self.last_primary = Some(primary.clone());
        }
    }

    /// Drop the highlight once its hold period has passed.
    pub fn tick(&mut self, now_ms: f64) {
        if let Some(h) = &self.highlight {
            if now_ms >= h.until_ms {
                self.highlight = None;
            }
        }
    }

    /// Free the slot of a tree that was removed outright. Restoration is
    /// pointless here, the tree is gone.
    pub fn release(&mut self, id: &TreeId) {
        for slot in self.slots.iter_mut() {
            if slot.as_ref() == Some(id) {
                *slot = None;
            }
        }
        if self.last_primary.as_ref() == Some(id) {
            self.last_primary = None;
        }
        if self.highlight.as_ref().map(|h| &h.tree) == Some(id) {
            self.highlight = None;
        }
    }

    pub fn slot_of(&self, id: &TreeId) -> Option<usize> {
        self.slots.iter().position(|s| s.as_ref() == Some(id))
    }

    pub fn slots(&self) -> &[Option<TreeId>] {
        &self.slots
    }

    pub fn highlight(&self) -> Option<&FeaturedHighlight> {
        self.highlight.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tid(s: &str) -> TreeId {
        TreeId::new(s)
    }

    fn positions(n: usize) -> Vec<Vec3> {
        (0..n).map(|i| Vec3::new(i as f32 * 10.0, 50.0, 0.0)).collect()
    }

    fn forest(ids: &[&str]) -> (TreeLifecycleController, ForestTuning) {
        let mut controller = TreeLifecycleController::default();
        for (i, id) in ids.iter().enumerate() {
            controller.create(
                tid(id),
                Vec3::new(-100.0 - i as f32, 0.0, 0.0),
                6.0,
                30.0,
                "Ana",
                "see the northern lights",
            );
        }
        (controller, ForestTuning::default())
    }

    #[test]
    fn ranked_list_fills_main_slot_then_free_slots() {
        // Scenario D: [T3, T1, T2] with a designated main slot.
        let (mut controller, tuning) = forest(&["t1", "t2", "t3"]);
        let mut allocator = SlotAllocator::new(positions(10), Some(5));
        let mut out = Vec::new();

        allocator.reconcile(
            &[tid("t3"), tid("t1"), tid("t2")],
            0.0,
            &mut controller,
            &tuning,
            &mut out,
        );

        assert_eq!(allocator.slot_of(&tid("t3")), Some(5));
        assert_eq!(allocator.slot_of(&tid("t1")), Some(0));
        assert_eq!(allocator.slot_of(&tid("t2")), Some(1));

        // Every featured tree sits at its slot position with labels hidden.
        for id in ["t1", "t2", "t3"] {
            let slot = allocator.slot_of(&tid(id)).unwrap();
            let state = controller.get(&tid(id)).unwrap();
            assert_eq!(state.position, positions(10)[slot]);
            assert!(!state.labels_visible);
        }
    }

    #[test]
    fn no_tree_in_two_slots_and_no_slot_with_two_trees() {
        let (mut controller, tuning) = forest(&["a", "b", "c", "d"]);
        let mut allocator = SlotAllocator::new(positions(10), Some(5));
        let mut out = Vec::new();

        // Reconcile twice with overlapping rankings.
        allocator.reconcile(
            &[tid("a"), tid("b"), tid("c")],
            0.0,
            &mut controller,
            &tuning,
            &mut out,
        );
        allocator.reconcile(
            &[tid("c"), tid("a"), tid("d")],
            1.0,
            &mut controller,
            &tuning,
            &mut out,
        );

        let occupied: Vec<&TreeId> = allocator.slots().iter().flatten().collect();
        let mut deduped = occupied.clone();
        deduped.sort_by_key(|id| id.as_str().to_owned());
        deduped.dedup();
        assert_eq!(occupied.len(), deduped.len(), "a tree occupies two slots");
        assert_eq!(occupied.len(), 3);
    }

    #[test]
    fn eviction_restores_original_position_and_labels() {
        let (mut controller, tuning) = forest(&["a", "b"]);
        let original = controller.get(&tid("a")).unwrap().original_position;
        let mut allocator = SlotAllocator::new(positions(10), Some(5));
        let mut out = Vec::new();

        allocator.reconcile(&[tid("a")], 0.0, &mut controller, &tuning, &mut out);
        assert!(!controller.get(&tid("a")).unwrap().labels_visible);

        allocator.reconcile(&[tid("b")], 1.0, &mut controller, &tuning, &mut out);
        let state = controller.get(&tid("a")).unwrap();
        assert_eq!(state.position, original);
        assert!(state.labels_visible);
        assert_eq!(allocator.slot_of(&tid("a")), None);
    }

    #[test]
    fn overflow_ids_are_dropped_not_an_error() {
        let names: Vec<String> = (0..6).map(|i| format!("t{i}")).collect();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let (mut controller, tuning) = forest(&refs);
        let mut allocator = SlotAllocator::new(positions(4), Some(1));
        let mut out = Vec::new();

        let ranked: Vec<TreeId> = names.iter().map(|s| tid(s)).collect();
        allocator.reconcile(&ranked, 0.0, &mut controller, &tuning, &mut out);

        let occupied = allocator.slots().iter().flatten().count();
        assert_eq!(occupied, 4);
        assert_eq!(allocator.slot_of(&tid("t4")), None);
        assert_eq!(allocator.slot_of(&tid("t5")), None);
    }

    #[test]
    fn primary_change_fires_one_newly_featured_effect() {
        let (mut controller, tuning) = forest(&["a", "b"]);
        let mut allocator = SlotAllocator::new(positions(10), Some(5));
        let mut out = Vec::new();

        allocator.reconcile(&[tid("a"), tid("b")], 0.0, &mut controller, &tuning, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, EffectKind::NewlyFeatured);
        assert_eq!(out[0].tree, tid("a"));

        // Same primary again: no new effect.
        out.clear();
        allocator.reconcile(&[tid("a"), tid("b")], 1.0, &mut controller, &tuning, &mut out);
        assert!(out.is_empty());

        // New primary: one effect, highlight rearmed.
        allocator.reconcile(&[tid("b"), tid("a")], 2.0, &mut controller, &tuning, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tree, tid("b"));
    }

    #[test]
    fn highlight_clears_after_hold_period() {
        let (mut controller, tuning) = forest(&["a"]);
        let mut allocator = SlotAllocator::new(positions(10), Some(5));
        let mut out = Vec::new();

        allocator.reconcile(&[tid("a")], 0.0, &mut controller, &tuning, &mut out);
        assert!(allocator.highlight().is_some());

        allocator.tick(3999.0);
        assert!(allocator.highlight().is_some());
        allocator.tick(4000.0);
        assert!(allocator.highlight().is_none());
    }

    #[test]
    fn missing_trees_are_skipped_silently() {
        let (mut controller, tuning) = forest(&["a"]);
        let mut allocator = SlotAllocator::new(positions(10), Some(5));
        let mut out = Vec::new();

        // "ghost" was removed between ranking computation and reconcile.
        allocator.reconcile(
            &[tid("ghost"), tid("a")],
            0.0,
            &mut controller,
            &tuning,
            &mut out,
        );
        assert_eq!(allocator.slot_of(&tid("ghost")), None);
        assert_eq!(allocator.slot_of(&tid("a")), Some(0));

        // Evicting a tree that was disposed while featured must not panic.
        controller.dispose(&tid("a"));
        allocator.reconcile(&[], 1.0, &mut controller, &tuning, &mut out);
        assert!(allocator.slots().iter().all(Option::is_none));
    }

    #[test]
    fn empty_ranking_clears_primary_and_highlight() {
        let (mut controller, tuning) = forest(&["a"]);
        let mut allocator = SlotAllocator::new(positions(10), Some(5));
        let mut out = Vec::new();

        allocator.reconcile(&[tid("a")], 0.0, &mut controller, &tuning, &mut out);
        allocator.reconcile(&[], 1.0, &mut controller, &tuning, &mut out);
        assert!(allocator.highlight().is_none());

        // The same tree featured again counts as newly featured.
        out.clear();
        allocator.reconcile(&[tid("a")], 2.0, &mut controller, &tuning, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn release_frees_slot_without_restoration() {
        let (mut controller, tuning) = forest(&["a", "b"]);
        let mut allocator = SlotAllocator::new(positions(10), Some(5));
        let mut out = Vec::new();

        allocator.reconcile(&[tid("a"), tid("b")], 0.0, &mut controller, &tuning, &mut out);
        allocator.release(&tid("a"));
        assert_eq!(allocator.slot_of(&tid("a")), None);
        assert_eq!(allocator.slot_of(&tid("b")), Some(0));
        assert!(allocator.highlight().is_none());
    }

    #[test]
    fn no_main_slot_fills_from_the_front() {
        let (mut controller, tuning) = forest(&["a", "b"]);
        let mut allocator = SlotAllocator::new(positions(4), None);
        let mut out = Vec::new();

        allocator.reconcile(&[tid("a"), tid("b")], 0.0, &mut controller, &tuning, &mut out);
        assert_eq!(allocator.slot_of(&tid("a")), Some(0));
        assert_eq!(allocator.slot_of(&tid("b")), Some(1));
    }
}
