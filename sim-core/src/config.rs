//! Parameter sets for every scenario plus the engine-wide settings.
//!
//! Each scenario gets a small `Copy` struct with a [`Default`] matching the
//! initial slider positions, inclusive range constants the viewer builds its
//! sliders from, `clamped()` for the configuration boundary and
//! `validate()` for callers that want to reject instead of clamp.

use std::{fmt, ops::RangeInclusive, str::FromStr};

use crate::{error::ConfigError, types::Canvas};

pub const SLOPE_ANGLE_RANGE: RangeInclusive<f32> = 15.0..=60.0;
pub const WATER_CONTENT_RANGE: RangeInclusive<f32> = 0.0..=100.0;
pub const RAINFALL_RANGE: RangeInclusive<f32> = 1.0..=10.0;
pub const TERRAIN_SLOPE_RANGE: RangeInclusive<f32> = 1.0..=20.0;
pub const GROUND_SATURATION_RANGE: RangeInclusive<f32> = 0.0..=100.0;
pub const FORCE_RANGE: RangeInclusive<f32> = 1.0..=10.0;
pub const TIME_SCALE_RANGE: RangeInclusive<f32> = 1.0..=10.0;
pub const SPEED_RANGE: RangeInclusive<f32> = 0.0..=5.0;

fn clamp_to(value: f32, range: &RangeInclusive<f32>) -> f32 {
    value.clamp(*range.start(), *range.end())
}

fn check(name: &'static str, value: f32, range: &RangeInclusive<f32>) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Matches `s` (case-insensitive) against the lowercase tags of `all`.
fn parse_tag<T: Copy>(
    kind: &'static str,
    s: &str,
    all: &[T],
    tag: impl Fn(T) -> &'static str,
) -> Result<T, ConfigError> {
    let wanted = s.trim().to_ascii_lowercase();
    all.iter()
        .copied()
        .find(|&v| tag(v) == wanted)
        .ok_or_else(|| ConfigError::UnknownTag {
            kind,
            tag: s.to_owned(),
        })
}

/// Soil composition of a landslide slope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SoilType {
    #[default]
    Clay,
    Sand,
    Rock,
    Mixed,
}

impl SoilType {
    pub const ALL: [Self; 4] = [Self::Clay, Self::Sand, Self::Rock, Self::Mixed];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Clay => "clay",
            Self::Sand => "sand",
            Self::Rock => "rock",
            Self::Mixed => "mixed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Clay => "Clay",
            Self::Sand => "Sand",
            Self::Rock => "Rock",
            Self::Mixed => "Mixed",
        }
    }
}

/// Process that raises a mountain range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MountainFormation {
    #[default]
    Folding,
    Faulting,
    Volcanic,
}

impl MountainFormation {
    pub const ALL: [Self; 3] = [Self::Folding, Self::Faulting, Self::Volcanic];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Folding => "folding",
            Self::Faulting => "faulting",
            Self::Volcanic => "volcanic",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Folding => "Folding",
            Self::Faulting => "Faulting",
            Self::Volcanic => "Volcanic",
        }
    }
}

/// Process that carves the basin a lake collects in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LakeFormation {
    #[default]
    Glacial,
    Tectonic,
    Volcanic,
    Erosional,
}

impl LakeFormation {
    pub const ALL: [Self; 4] = [
        Self::Glacial,
        Self::Tectonic,
        Self::Volcanic,
        Self::Erosional,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Glacial => "glacial",
            Self::Tectonic => "tectonic",
            Self::Volcanic => "volcanic",
            Self::Erosional => "erosional",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Glacial => "Glacial",
            Self::Tectonic => "Tectonic",
            Self::Volcanic => "Volcanic",
            Self::Erosional => "Erosional",
        }
    }
}

impl FromStr for SoilType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tag("soil type", s, &Self::ALL, Self::tag)
    }
}

impl FromStr for MountainFormation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tag("mountain formation", s, &Self::ALL, Self::tag)
    }
}

impl FromStr for LakeFormation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tag("lake formation", s, &Self::ALL, Self::tag)
    }
}

impl fmt::Display for SoilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for MountainFormation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for LakeFormation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Landslide controls: slope in degrees, water content in percent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LandslideParams {
    pub slope_angle: f32,
    pub water_content: f32,
    pub soil: SoilType,
}

impl Default for LandslideParams {
    fn default() -> Self {
        Self {
            slope_angle: 30.0,
            water_content: 40.0,
            soil: SoilType::Clay,
        }
    }
}

impl LandslideParams {
    pub fn clamped(self) -> Self {
        Self {
            slope_angle: clamp_to(self.slope_angle, &SLOPE_ANGLE_RANGE),
            water_content: clamp_to(self.water_content, &WATER_CONTENT_RANGE),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check("slope_angle", self.slope_angle, &SLOPE_ANGLE_RANGE)?;
        check("water_content", self.water_content, &WATER_CONTENT_RANGE)
    }
}

/// Flash-flood controls. `terrain_slope` and `ground_saturation` are percents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloodParams {
    pub rainfall: f32,
    pub terrain_slope: f32,
    pub ground_saturation: f32,
}

impl Default for FloodParams {
    fn default() -> Self {
        Self {
            rainfall: 5.0,
            terrain_slope: 8.0,
            ground_saturation: 60.0,
        }
    }
}

impl FloodParams {
    pub fn clamped(self) -> Self {
        Self {
            rainfall: clamp_to(self.rainfall, &RAINFALL_RANGE),
            terrain_slope: clamp_to(self.terrain_slope, &TERRAIN_SLOPE_RANGE),
            ground_saturation: clamp_to(self.ground_saturation, &GROUND_SATURATION_RANGE),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check("rainfall", self.rainfall, &RAINFALL_RANGE)?;
        check("terrain_slope", self.terrain_slope, &TERRAIN_SLOPE_RANGE)?;
        check(
            "ground_saturation",
            self.ground_saturation,
            &GROUND_SATURATION_RANGE,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MountainParams {
    pub formation: MountainFormation,
    pub compression_force: f32,
    pub time_scale: f32,
}

impl Default for MountainParams {
    fn default() -> Self {
        Self {
            formation: MountainFormation::Folding,
            compression_force: 5.0,
            time_scale: 3.0,
        }
    }
}

impl MountainParams {
    pub fn clamped(self) -> Self {
        Self {
            compression_force: clamp_to(self.compression_force, &FORCE_RANGE),
            time_scale: clamp_to(self.time_scale, &TIME_SCALE_RANGE),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check("compression_force", self.compression_force, &FORCE_RANGE)?;
        check("time_scale", self.time_scale, &TIME_SCALE_RANGE)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LakeParams {
    pub formation: LakeFormation,
    pub water_flow: f32,
    pub time_scale: f32,
}

impl Default for LakeParams {
    fn default() -> Self {
        Self {
            formation: LakeFormation::Glacial,
            water_flow: 5.0,
            time_scale: 3.0,
        }
    }
}

impl LakeParams {
    pub fn clamped(self) -> Self {
        Self {
            water_flow: clamp_to(self.water_flow, &FORCE_RANGE),
            time_scale: clamp_to(self.time_scale, &TIME_SCALE_RANGE),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check("water_flow", self.water_flow, &FORCE_RANGE)?;
        check("time_scale", self.time_scale, &TIME_SCALE_RANGE)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolarParams {
    pub speed_multiplier: f32,
    pub show_orbits: bool,
}

impl Default for SolarParams {
    fn default() -> Self {
        Self {
            speed_multiplier: 3.0,
            show_orbits: true,
        }
    }
}

impl SolarParams {
    pub fn clamped(self) -> Self {
        Self {
            speed_multiplier: clamp_to(self.speed_multiplier, &SPEED_RANGE),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check("speed_multiplier", self.speed_multiplier, &SPEED_RANGE)
    }
}

/// Settings shared by every scenario instance.
///
/// ### Fields
/// - `canvas` - Drawing surface the scenario lays itself out on.
/// - `seed` - Seed for the scenario RNG; a reset replays the same run.
/// - `particle_cap` - Upper bound on live particles per system. `None`
///   leaves the population unbounded, which under sustained heavy spawning
///   grows without limit.
/// - `cull_margin` - How far outside the canvas a particle may drift
///   before it is removed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    pub canvas: Canvas,
    pub seed: u64,
    pub particle_cap: Option<usize>,
    pub cull_margin: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            seed: 0x5EED_2024,
            particle_cap: Some(4000),
            cull_margin: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_parse_case_insensitively() {
        assert_eq!("Folding".parse::<MountainFormation>(), Ok(MountainFormation::Folding));
        assert_eq!(" glacial ".parse::<LakeFormation>(), Ok(LakeFormation::Glacial));
        assert_eq!("ROCK".parse::<SoilType>(), Ok(SoilType::Rock));
    }

    #[test]
    fn unknown_tag_is_reported() {
        let err = "basalt".parse::<SoilType>().unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownTag {
                kind: "soil type",
                tag: "basalt".into()
            }
        );
        assert_eq!(err.to_string(), "unknown soil type `basalt`");
    }

    #[test]
    fn clamped_pulls_values_into_range() {
        let p = FloodParams {
            rainfall: 50.0,
            terrain_slope: -3.0,
            ground_saturation: 60.0,
        }
        .clamped();
        assert_eq!(p.rainfall, 10.0);
        assert_eq!(p.terrain_slope, 1.0);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn validate_names_the_offending_field() {
        let p = LandslideParams {
            slope_angle: 70.0,
            ..LandslideParams::default()
        };
        match p.validate() {
            Err(ConfigError::OutOfRange { name, max, .. }) => {
                assert_eq!(name, "slope_angle");
                assert_eq!(max, 60.0);
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(LandslideParams::default().validate().is_ok());
        assert!(FloodParams::default().validate().is_ok());
        assert!(MountainParams::default().validate().is_ok());
        assert!(LakeParams::default().validate().is_ok());
        assert!(SolarParams::default().validate().is_ok());
    }
}
