//! The boundary with the real-time document store.
//!
//! The display only ever reacts to change notifications; it never awaits
//! store operations. Those notifications are modeled as Bevy events here.
//! In production they are driven by the store's snapshot listeners; for
//! local runs a cooldown-based demo feed stands in and exercises every
//! notification path.

use std::collections::HashMap;

use bevy::prelude::*;
use glam::Vec3;

use crate::forest::{clamp_growth, TreeId};

/// A tree record appeared in the store.
#[derive(Event, Debug, Clone)]
pub struct TreeAdded {
    pub id: TreeId,
    pub growth: f32,
    pub position: Vec3,
    pub planter: String,
    pub dream: String,
}

/// A tree's growth value changed (watering, fertilizing, admin edits).
#[derive(Event, Debug, Clone)]
pub struct TreeGrowthChanged {
    pub id: TreeId,
    pub growth: f32,
}

/// A tree record was deleted.
#[derive(Event, Debug, Clone)]
pub struct TreeRemoved {
    pub id: TreeId,
}

/// The top-N trees by view-request recency changed, most recent first.
/// Ordering is taken as given; ties are the store's problem.
#[derive(Event, Debug, Clone)]
pub struct FeaturedRankingChanged {
    pub ranked: Vec<TreeId>,
}

/// Display-session bounds supplied by the store side, read-only here.
#[derive(Resource, Debug, Clone)]
pub struct SceneConfig {
    pub max_trees: usize,
    /// How many trees the ranking query returns.
    pub featured_limit: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_trees: 60,
            featured_limit: 10,
        }
    }
}

pub struct StorePlugin;

impl Plugin for StorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneConfig>()
            .init_resource::<DemoFeed>()
            .add_event::<TreeAdded>()
            .add_event::<TreeGrowthChanged>()
            .add_event::<TreeRemoved>()
            .add_event::<FeaturedRankingChanged>()
            .add_systems(Update, drive_demo_feed);
    }
}

const GROWTH_PER_WATERING: f32 = 10.0;
const GROWTH_PER_FERTILIZING: f32 = 20.0;

const DEMO_PLANTERS: [&str; 6] = ["Ana", "Mateo", "Lucía", "Diego", "Valentina", "Sofía"];
const DEMO_DREAMS: [&str; 6] = [
    "learn to play the guitar",
    "run a marathon",
    "open a bakery",
    "see the northern lights",
    "write a novel",
    "plant a real garden",
];

/// Stand-in for the store's change stream: plants trees, nurtures them,
/// issues view requests, and occasionally removes one.
#[derive(Resource, Debug)]
pub struct DemoFeed {
    plant_cooldown: f32,
    nurture_cooldown: f32,
    view_cooldown: f32,
    remove_cooldown: f32,
    next_serial: u64,
    /// The demo's own durable record of each tree's growth.
    growth: HashMap<TreeId, f32>,
    view_requested_at: HashMap<TreeId, f64>,
}

impl Default for DemoFeed {
    fn default() -> Self {
        Self {
            plant_cooldown: 0.5,
            nurture_cooldown: 2.0,
            view_cooldown: 5.0,
            remove_cooldown: 60.0,
            next_serial: 0,
            growth: HashMap::new(),
            view_requested_at: HashMap::new(),
        }
    }
}

impl DemoFeed {
    fn random_tree(&self) -> Option<TreeId> {
        if self.growth.is_empty() {
            return None;
        }
        let ids: Vec<&TreeId> = self.growth.keys().collect();
        Some(ids[fastrand::usize(..ids.len())].clone())
    }

    /// Apply a growth bonus to a tree the feed still tracks, clamped at
    /// full growth. Returns the new value, or `None` for an unknown tree.
    fn nurture(&mut self, id: &TreeId, bonus: f32) -> Option<f32> {
        let entry = self.growth.get_mut(id)?;
        *entry = clamp_growth(*entry + bonus);
        Some(*entry)
    }

    /// Top-N ids by view-request recency, most recent first.
    fn ranking(&self, limit: usize) -> Vec<TreeId> {
        let mut entries: Vec<(&TreeId, f64)> = self
            .view_requested_at
            .iter()
            .map(|(id, at)| (id, *at))
            .collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        entries.into_iter().take(limit).map(|(id, _)| id.clone()).collect()
    }
}

fn drive_demo_feed(
    time: Res<Time>,
    config: Res<SceneConfig>,
    mut feed: ResMut<DemoFeed>,
    mut added: EventWriter<TreeAdded>,
    mut changed: EventWriter<TreeGrowthChanged>,
    mut removed: EventWriter<TreeRemoved>,
    mut ranking: EventWriter<FeaturedRankingChanged>,
) {
    let dt = time.delta_seconds();
    let now_ms = time.elapsed_seconds_f64() * 1000.0;

    feed.plant_cooldown -= dt;
    if feed.plant_cooldown <= 0.0 {
        feed.plant_cooldown = 1.5 + fastrand::f32() * 3.0;
        if feed.growth.len() < config.max_trees {
            feed.next_serial += 1;
            let id = TreeId::new(format!("tree-{:04}", feed.next_serial));
            let position = Vec3::new(
                (fastrand::f32() - 0.5) * 900.0,
                fastrand::f32() * 280.0,
                0.0,
            );
            feed.growth.insert(id.clone(), 0.0);
            added.send(TreeAdded {
                id,
                growth: 0.0,
                position,
                planter: DEMO_PLANTERS[fastrand::usize(..DEMO_PLANTERS.len())].to_owned(),
                dream: DEMO_DREAMS[fastrand::usize(..DEMO_DREAMS.len())].to_owned(),
            });
        }
    }

    feed.nurture_cooldown -= dt;
    if feed.nurture_cooldown <= 0.0 {
        feed.nurture_cooldown = 0.4 + fastrand::f32() * 1.2;
        if let Some(id) = feed.random_tree() {
            let bonus = if fastrand::f32() < 0.7 {
                GROWTH_PER_WATERING
            } else {
                GROWTH_PER_FERTILIZING
            };
            if let Some(growth) = feed.nurture(&id, bonus) {
                changed.send(TreeGrowthChanged { id, growth });
            }
        }
    }

    feed.view_cooldown -= dt;
    if feed.view_cooldown <= 0.0 {
        feed.view_cooldown = 3.0 + fastrand::f32() * 6.0;
        if let Some(id) = feed.random_tree() {
            feed.view_requested_at.insert(id, now_ms);
            ranking.send(FeaturedRankingChanged {
                ranked: feed.ranking(config.featured_limit),
            });
        }
    }

    feed.remove_cooldown -= dt;
    if feed.remove_cooldown <= 0.0 {
        feed.remove_cooldown = 45.0 + fastrand::f32() * 60.0;
        if let Some(id) = feed.random_tree() {
            feed.growth.remove(&id);
            let had_view_request = feed.view_requested_at.remove(&id).is_some();
            removed.send(TreeRemoved { id });
            if had_view_request {
                // The store's ranking query would re-fire without it.
                ranking.send(FeaturedRankingChanged {
                    ranked: feed.ranking(config.featured_limit),
                });
            }
        }
    }
}
