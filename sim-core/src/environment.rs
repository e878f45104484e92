//! Scalar state that evolves alongside the particles: ground saturation,
//! lake level, ice, the volcano latch, and the derived risk metrics that
//! only drive visual warnings.

use crate::{config::SoilType, terrain::TerrainPoint, types::Canvas};

pub const SATURATION_MAX: f32 = 1.0;
/// Saturation gained per absorbed drop.
pub const ABSORB_STEP: f32 = 0.01;
/// Erosion gained per runoff contact.
pub const SCOUR_STEP: f32 = 0.002;
/// Lake level gained per drop reaching the lake bottom.
pub const LAKE_FILL_STEP: f32 = 0.1;

pub const FLOOD_WARNING_THRESHOLD: f32 = 0.3;
pub const FLOOD_SEVERE_THRESHOLD: f32 = 0.6;

const ICE_MELT_RATE: f32 = 0.2;
const ICE_SAG_RATE: f32 = 0.1;

/// Discrete warning state derived from a risk value each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Calm,
    Warning,
    Severe,
}

impl RiskLevel {
    /// Thresholds are strict: exactly `0.3` is still calm.
    pub fn from_risk(risk: f32) -> Self {
        if risk > FLOOD_SEVERE_THRESHOLD {
            Self::Severe
        } else if risk > FLOOD_WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Calm
        }
    }
}

/// `(rainfall/10) * (slope/20) * (saturation/100)`, from the slider values.
pub fn flood_risk(rainfall: f32, terrain_slope: f32, ground_saturation: f32) -> f32 {
    (rainfall / 10.0) * (terrain_slope / 20.0) * (ground_saturation / 100.0)
}

/// How well a soil holds together; subtracted from the instability.
pub fn soil_stability(soil: SoilType) -> f32 {
    match soil {
        SoilType::Rock => 0.8,
        SoilType::Clay => 0.3,
        SoilType::Sand | SoilType::Mixed => 0.5,
    }
}

/// `(angle - 15)/45 + water/100 - stability(soil)`.
pub fn landslide_instability(slope_angle: f32, water_content: f32, soil: SoilType) -> f32 {
    (slope_angle - 15.0) / 45.0 + water_content / 100.0 - soil_stability(soil)
}

/// Soaks one drop into `point`. Returns `false`, leaving the point
/// untouched, when the ground is already saturated.
pub fn absorb(point: &mut TerrainPoint) -> bool {
    if point.saturation >= SATURATION_MAX {
        return false;
    }
    point.saturation = (point.saturation + ABSORB_STEP).min(SATURATION_MAX);
    true
}

pub fn scour(point: &mut TerrainPoint) {
    point.erosion = (point.erosion + SCOUR_STEP).min(1.0);
}

/// Ice sheet feeding a glacial lake. Once melting it never refreezes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IceSheet {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub melting: bool,
}

impl IceSheet {
    pub fn over(canvas: Canvas) -> Self {
        Self {
            x: canvas.width * 0.2,
            y: canvas.height * 0.3,
            width: canvas.width * 0.6,
            height: 100.0,
            melting: false,
        }
    }

    /// Thins the sheet by one tick of melt; the top sags as it goes.
    pub fn melt_step(&mut self) {
        if !self.melting || self.height <= 0.0 {
            return;
        }
        self.height = (self.height - ICE_MELT_RATE).max(0.0);
        self.y += ICE_SAG_RATE;
    }

    pub fn is_spent(&self) -> bool {
        self.height <= 0.0
    }

    /// Row of the sheet's underside, where meltwater drips from.
    pub fn base(&self) -> f32 {
        self.y + self.height
    }
}

/// Scenario-wide scalars. Reset wholesale with the scenario; evolves only
/// while ticks run.
///
/// ### Fields
/// - `ground_saturation_avg` - Mean saturation over the terrain.
/// - `lake_water_level` - Depth of the collected lake in pixels.
/// - `lake_capacity` - Ceiling for `lake_water_level`.
/// - `ice_sheet` - Present for glacial lakes only.
/// - `volcano_active` - One-way latch.
/// - `elapsed` - Simulated time, advanced by the scenario's time scale.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvironmentalState {
    pub ground_saturation_avg: f32,
    pub lake_water_level: f32,
    pub lake_capacity: f32,
    pub ice_sheet: Option<IceSheet>,
    pub volcano_active: bool,
    pub elapsed: f32,
}

impl EnvironmentalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lake_capacity(capacity: f32) -> Self {
        Self {
            lake_capacity: capacity.max(0.0),
            ..Self::default()
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    /// Raises the lake by one step, never past `lake_capacity`.
    pub fn fill_lake(&mut self) {
        self.lake_water_level = (self.lake_water_level + LAKE_FILL_STEP).min(self.lake_capacity);
    }

    pub fn has_lake(&self) -> bool {
        self.lake_water_level > 0.0
    }

    /// Sets the volcano latch once `elapsed` passes `threshold`. Returns
    /// `true` only on the tick the latch flips.
    pub fn latch_volcano(&mut self, threshold: f32) -> bool {
        if self.volcano_active || self.elapsed <= threshold {
            return false;
        }
        self.volcano_active = true;
        true
    }

    /// Starts the ice melting once `elapsed` passes `threshold`, then melts
    /// one tick's worth. Returns `true` only on the tick melting starts.
    pub fn melt_ice(&mut self, threshold: f32) -> bool {
        let elapsed = self.elapsed;
        let Some(ice) = self.ice_sheet.as_mut() else {
            return false;
        };
        let started = !ice.melting && elapsed > threshold;
        if started {
            ice.melting = true;
        }
        ice.melt_step();
        started
    }

    pub fn ice_melting(&self) -> bool {
        self.ice_sheet.is_some_and(|ice| ice.melting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(saturation: f32) -> TerrainPoint {
        TerrainPoint {
            x: 0.0,
            y: 300.0,
            original_y: 300.0,
            saturation,
            erosion: 0.0,
        }
    }

    #[test]
    fn flood_risk_reference_case_is_a_warning() {
        let risk = flood_risk(8.0, 15.0, 90.0);
        assert!((risk - 0.54).abs() < 1e-6);
        assert_eq!(RiskLevel::from_risk(risk), RiskLevel::Warning);
    }

    #[test]
    fn risk_levels_use_strict_thresholds() {
        assert_eq!(RiskLevel::from_risk(0.3), RiskLevel::Calm);
        assert_eq!(RiskLevel::from_risk(0.31), RiskLevel::Warning);
        assert_eq!(RiskLevel::from_risk(0.6), RiskLevel::Warning);
        assert_eq!(RiskLevel::from_risk(0.61), RiskLevel::Severe);
        assert_eq!(
            RiskLevel::from_risk(flood_risk(10.0, 20.0, 100.0)),
            RiskLevel::Severe
        );
    }

    #[test]
    fn instability_matches_the_soil_table() {
        assert!((landslide_instability(15.0, 0.0, SoilType::Rock) + 0.8).abs() < 1e-6);
        assert!((landslide_instability(60.0, 100.0, SoilType::Clay) - 1.7).abs() < 1e-6);
        assert_eq!(soil_stability(SoilType::Sand), soil_stability(SoilType::Mixed));
    }

    #[test]
    fn absorb_caps_at_full_saturation() {
        let mut p = point(0.995);
        assert!(absorb(&mut p));
        assert_eq!(p.saturation, SATURATION_MAX);
        assert!(!absorb(&mut p));
        assert_eq!(p.saturation, SATURATION_MAX);
    }

    #[test]
    fn lake_level_is_clamped_to_capacity() {
        let mut env = EnvironmentalState::with_lake_capacity(0.25);
        let mut last = 0.0;
        for _ in 0..10 {
            env.fill_lake();
            assert!(env.lake_water_level >= last);
            last = env.lake_water_level;
        }
        assert_eq!(env.lake_water_level, 0.25);
    }

    #[test]
    fn negative_capacity_means_no_lake() {
        let mut env = EnvironmentalState::with_lake_capacity(-5.0);
        env.fill_lake();
        assert!(!env.has_lake());
    }

    #[test]
    fn volcano_latch_is_one_way() {
        let mut env = EnvironmentalState::new();
        env.advance(30.0);
        assert!(!env.latch_volcano(30.0));
        env.advance(1.0);
        assert!(env.latch_volcano(30.0));
        assert!(!env.latch_volcano(30.0));
        assert!(env.volcano_active);
    }

    #[test]
    fn ice_melts_linearly_and_never_refreezes() {
        let mut env = EnvironmentalState {
            ice_sheet: Some(IceSheet::over(Canvas::default())),
            ..EnvironmentalState::new()
        };
        assert!(!env.melt_ice(50.0));
        assert_eq!(env.ice_sheet.unwrap().height, 100.0);

        env.advance(51.0);
        assert!(env.melt_ice(50.0));
        let h1 = env.ice_sheet.unwrap().height;
        assert!((h1 - 99.8).abs() < 1e-4);

        for _ in 0..1000 {
            env.melt_ice(50.0);
            assert!(env.ice_melting());
        }
        let ice = env.ice_sheet.unwrap();
        assert_eq!(ice.height, 0.0);
        assert!(ice.is_spent());
    }
}
