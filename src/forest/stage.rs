/// Growth stages and their fixed visual parameters.
///
/// A tree's `growth` value (0–100) maps onto five contiguous half-open
/// bands. The upper boundary 100 has no band of its own and resolves to
/// `Adult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrowthStage {
    Germination,
    Baby,
    Child,
    YoungAdult,
    Adult,
}

/// Fixed per-stage presentation data: growth band, proportions, color set,
/// and the overshoot multiplier used by growth animations.
#[derive(Debug, Clone, Copy)]
pub struct StageVisuals {
    pub label: &'static str,
    /// Inclusive lower bound of the growth band.
    pub min: f32,
    /// Exclusive upper bound of the growth band.
    pub max: f32,
    pub height_factor: f32,
    pub trunk_color: u32,
    pub leaf_color: u32,
    pub accent_color: u32,
    pub glow_color: u32,
    pub particle_color: u32,
    pub overshoot_multiplier: f32,
}

/// All stages in band order, youngest first.
pub const STAGE_ORDER: [GrowthStage; 5] = [
    GrowthStage::Germination,
    GrowthStage::Baby,
    GrowthStage::Child,
    GrowthStage::YoungAdult,
    GrowthStage::Adult,
];

const GERMINATION: StageVisuals = StageVisuals {
    label: "Germination",
    min: 0.0,
    max: 5.0,
    height_factor: 0.25,
    trunk_color: 0x5b3a1a,
    leaf_color: 0xc8e6c9,
    accent_color: 0xb2ffd6,
    glow_color: 0x9cffb0,
    particle_color: 0xc8ffdd,
    overshoot_multiplier: 1.18,
};

const BABY: StageVisuals = StageVisuals {
    label: "Baby Plant",
    min: 5.0,
    max: 20.0,
    height_factor: 0.4,
    trunk_color: 0x6d4626,
    leaf_color: 0x9ad9a0,
    accent_color: 0x8dffc5,
    glow_color: 0x7bffd6,
    particle_color: 0xaaffdf,
    overshoot_multiplier: 1.2,
};

const CHILD: StageVisuals = StageVisuals {
    label: "Young Plant",
    min: 20.0,
    max: 50.0,
    height_factor: 0.65,
    trunk_color: 0x7a4d24,
    leaf_color: 0x66bb6a,
    accent_color: 0x6dffc2,
    glow_color: 0x5cfff0,
    particle_color: 0x84ffe6,
    overshoot_multiplier: 1.22,
};

const YOUNG_ADULT: StageVisuals = StageVisuals {
    label: "Young Adult",
    min: 50.0,
    max: 80.0,
    height_factor: 0.85,
    trunk_color: 0x81512a,
    leaf_color: 0x3f9f4a,
    accent_color: 0x64ffd2,
    glow_color: 0x4effff,
    particle_color: 0x66ffe8,
    overshoot_multiplier: 1.25,
};

const ADULT: StageVisuals = StageVisuals {
    label: "Adult Plant",
    min: 80.0,
    max: 100.0,
    height_factor: 1.0,
    trunk_color: 0x8b5a2b,
    leaf_color: 0x2e7d32,
    accent_color: 0x52ffde,
    glow_color: 0x3effff,
    particle_color: 0x4fffe0,
    overshoot_multiplier: 1.3,
};

impl GrowthStage {
    /// Resolve a growth value to its stage. Out-of-range and non-finite
    /// inputs are clamped first; 100 resolves to `Adult`.
    pub fn resolve(growth: f32) -> GrowthStage {
        let g = clamp_growth(growth);
        for stage in STAGE_ORDER {
            let band = stage.visuals();
            if g >= band.min && g < band.max {
                return stage;
            }
        }
        // Only g == 100.0 falls through the half-open bands.
        GrowthStage::Adult
    }

    pub fn visuals(self) -> &'static StageVisuals {
        match self {
            GrowthStage::Germination => &GERMINATION,
            GrowthStage::Baby => &BABY,
            GrowthStage::Child => &CHILD,
            GrowthStage::YoungAdult => &YOUNG_ADULT,
            GrowthStage::Adult => &ADULT,
        }
    }
}

/// Clamp growth to [0, 100]. NaN maps to 0 (max/min chain drops NaN).
pub fn clamp_growth(growth: f32) -> f32 {
    growth.max(0.0).min(100.0)
}

/// Visual scale for a growth value: 0.35 at growth 0, 1.1 at growth 100.
/// A tree is never fully invisible.
pub fn scale_for_growth(growth: f32) -> f32 {
    0.35 + (clamp_growth(growth) / 100.0) * 0.75
}
