use bevy::prelude::*;

/// Presentation tuning parameters for the forest display - easy balance adjustment
#[derive(Resource, Debug, Clone)]
pub struct ForestTuning {
    // Growth animation
    pub growth_anim_duration_ms: f64,
    pub evolution_anim_duration_ms: f64,
    pub pulse_wave_intensity: f32,
    pub evolution_wave_intensity: f32,
    pub pulse_wobble_strength: f32,
    pub evolution_wobble_strength: f32,
    /// Added on top of the stage's own overshoot multiplier for evolutions.
    pub evolution_overshoot_bonus: f32,

    // Easing applied each frame when no animation is in flight
    pub idle_scale_smoothing: f32,
    pub idle_tilt_smoothing: f32,

    // Effect scheduling
    /// Delay between consecutive incremental pulses in a multi-point jump.
    pub effect_stagger_ms: f64,

    // Featured stage
    /// How long the "newly featured" emphasis styling stays up.
    pub highlight_hold_ms: f64,

    // Tree creation
    pub base_size_min: f32,
    pub base_size_jitter: f32,
}

impl Default for ForestTuning {
    fn default() -> Self {
        Self {
            growth_anim_duration_ms: 1200.0,
            evolution_anim_duration_ms: 1400.0,
            pulse_wave_intensity: 0.08,
            evolution_wave_intensity: 0.12,
            pulse_wobble_strength: 0.06,
            evolution_wobble_strength: 0.1,
            evolution_overshoot_bonus: 0.1,

            idle_scale_smoothing: 0.08,
            idle_tilt_smoothing: 0.12,

            effect_stagger_ms: 160.0,

            highlight_hold_ms: 4000.0,

            base_size_min: 5.0,
            base_size_jitter: 3.0,
        }
    }
}
