use crate::forest::stage::scale_for_growth;

/// Overrides for a growth animation. `Default` gives the values used by a
/// plain incremental pulse.
#[derive(Debug, Clone, Copy)]
pub struct AnimationOptions {
    pub overshoot_multiplier: f32,
    pub duration_ms: f64,
    pub wave_intensity: f32,
    pub wobble_strength: f32,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            overshoot_multiplier: 1.18,
            duration_ms: 1200.0,
            wave_intensity: 0.08,
            wobble_strength: 0.06,
        }
    }
}

/// An in-flight scale/rotation curve for one tree. Replaced wholesale when a
/// new animation starts; cleared once sampled past its duration.
#[derive(Debug, Clone, Copy)]
pub struct GrowthAnimation {
    start_ms: f64,
    duration_ms: f64,
    initial_scale: f32,
    final_scale: f32,
    overshoot_scale: f32,
    wave_intensity: f32,
    wobble_strength: f32,
}

/// One frame's worth of animation output.
#[derive(Debug, Clone, Copy)]
pub struct AnimationSample {
    pub scale: f32,
    pub tilt_z: f32,
    pub tilt_x: f32,
    /// The curve has run its full duration; scale is snapped to the final
    /// value and the animation should be dropped.
    pub finished: bool,
}

// Phase boundaries as fractions of the total duration.
const STRETCH_END: f32 = 0.35;
const WAVE_END: f32 = 0.7;

impl GrowthAnimation {
    /// Begin a curve from the tree's current scale toward the scale implied
    /// by `target_growth`.
    pub fn start(
        now_ms: f64,
        current_scale: f32,
        target_growth: f32,
        options: AnimationOptions,
    ) -> Self {
        let final_scale = scale_for_growth(target_growth);
        Self {
            start_ms: now_ms,
            duration_ms: options.duration_ms,
            initial_scale: current_scale,
            final_scale,
            overshoot_scale: final_scale * options.overshoot_multiplier,
            wave_intensity: options.wave_intensity,
            wobble_strength: options.wobble_strength,
        }
    }

    pub fn final_scale(&self) -> f32 {
        self.final_scale
    }

    /// Sample the curve at `now_ms`. The settle phase eases rotation from
    /// wherever it currently is, so the caller passes the current tilt in.
    pub fn sample(&self, now_ms: f64, current_tilt_z: f32, current_tilt_x: f32) -> AnimationSample {
        let elapsed = now_ms - self.start_ms;
        let t = (elapsed / self.duration_ms).clamp(0.0, 1.0) as f32;

        let mut scale;
        let tilt_z;
        let mut tilt_x = current_tilt_x;

        if t < STRETCH_END {
            // Stretch up past the target with a decaying wobble.
            let stretch_t = t / STRETCH_END;
            let ease_out = 1.0 - (1.0 - stretch_t).powi(3);
            scale = lerp(self.initial_scale, self.overshoot_scale, ease_out);
            tilt_z = (stretch_t * std::f32::consts::PI * 3.0).sin() * self.wobble_strength;
        } else if t < WAVE_END {
            // Damped oscillation around the final scale.
            let wave_t = (t - STRETCH_END) / (WAVE_END - STRETCH_END);
            let damping = 1.0 - wave_t;
            scale = self.final_scale
                + (wave_t * std::f32::consts::PI * 6.0).sin() * self.wave_intensity * damping;
            tilt_z =
                (wave_t * std::f32::consts::PI * 5.0).sin() * self.wave_intensity * 2.0 * damping;
            tilt_x =
                (wave_t * std::f32::consts::PI * 4.0).cos() * self.wave_intensity * damping * 0.5;
        } else {
            // Settle back down onto the final scale.
            let settle_t = (t - WAVE_END) / (1.0 - WAVE_END);
            let ease = 1.0 - (1.0 - settle_t).powi(4);
            scale = lerp(self.overshoot_scale, self.final_scale, ease);
            tilt_z = lerp(current_tilt_z, 0.0, 0.2);
            tilt_x = lerp(current_tilt_x, 0.0, 0.2);
        }

        let finished = elapsed >= self.duration_ms;
        if finished {
            scale = self.final_scale;
        }

        AnimationSample {
            scale,
            tilt_z,
            tilt_x,
            finished,
        }
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
