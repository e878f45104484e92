//! The five animations.
//!
//! Four of them ([`Landslide`], [`Flood`], [`Mountain`], [`Lake`]) are the
//! same triad of terrain, particles and environmental state with different
//! rules; [`SolarSystem`] wraps the orbital model. All five implement
//! [`Simulation`], which splits each tick into an update phase
//! ([`Simulation::step`]) and a read-only render phase
//! ([`Simulation::compose`]).

pub mod flood;
pub mod lake;
pub mod landslide;
pub mod mountain;
pub mod solar;

use std::{fmt, str::FromStr};

pub use flood::Flood;
pub use lake::Lake;
pub use landslide::Landslide;
pub use mountain::Mountain;
pub use solar::SolarSystem;

use crate::{
    config::{EngineConfig, FloodParams, LakeParams, LandslideParams, MountainParams, SolarParams},
    error::ConfigError,
    frame::Frame,
    types::Canvas,
};

/// One animation driven a tick at a time.
pub trait Simulation {
    /// Advances the state by exactly one tick.
    fn step(&mut self);

    /// Draws the current state. Must not change anything observable.
    fn compose(&self, frame: &mut Frame);

    /// Discards all mutable state and rebuilds it from the current
    /// parameters and seed. Calling it twice in a row is the same as once.
    fn reset(&mut self);

    /// Simulated time since the last reset, in the scenario's own units.
    fn elapsed(&self) -> f32;

    fn canvas(&self) -> Canvas;

    fn particle_count(&self) -> usize {
        0
    }

    /// Spawns refused by the particle cap since the last reset.
    fn dropped_particles(&self) -> u64 {
        0
    }

    /// Follows a resized drawing surface. Fixed-size scenarios ignore it.
    fn resize(&mut self, _canvas: Canvas) {}
}

/// What a parameter update means for the running scenario.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamChange {
    Unchanged,
    /// Takes effect on the next tick without disturbing state.
    Live,
    /// Terrain depends on the change; the scenario has already been rebuilt
    /// from the new values and the run should be treated as a fresh one.
    Regenerate,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScenarioKind {
    Landslide,
    Flood,
    Mountain,
    Lake,
    #[default]
    Solar,
}

impl ScenarioKind {
    pub const ALL: [Self; 5] = [
        Self::Solar,
        Self::Landslide,
        Self::Flood,
        Self::Mountain,
        Self::Lake,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Landslide => "landslide",
            Self::Flood => "flood",
            Self::Mountain => "mountain",
            Self::Lake => "lake",
            Self::Solar => "solar",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Landslide => "Landslide Simulation",
            Self::Flood => "Flash Flood Simulation",
            Self::Mountain => "Mountain Formation",
            Self::Lake => "Lake Formation",
            Self::Solar => "Solar System",
        }
    }
}

impl FromStr for ScenarioKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.tag() == wanted)
            .ok_or_else(|| ConfigError::UnknownTag {
                kind: "scenario",
                tag: s.to_owned(),
            })
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Parameters for any one scenario, tagged by kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScenarioParams {
    Landslide(LandslideParams),
    Flood(FloodParams),
    Mountain(MountainParams),
    Lake(LakeParams),
    Solar(SolarParams),
}

impl ScenarioParams {
    pub fn defaults(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::Landslide => Self::Landslide(LandslideParams::default()),
            ScenarioKind::Flood => Self::Flood(FloodParams::default()),
            ScenarioKind::Mountain => Self::Mountain(MountainParams::default()),
            ScenarioKind::Lake => Self::Lake(LakeParams::default()),
            ScenarioKind::Solar => Self::Solar(SolarParams::default()),
        }
    }

    /// Checks every field against its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Landslide(p) => p.validate(),
            Self::Flood(p) => p.validate(),
            Self::Mountain(p) => p.validate(),
            Self::Lake(p) => p.validate(),
            Self::Solar(p) => p.validate(),
        }
    }

    pub fn kind(&self) -> ScenarioKind {
        match self {
            Self::Landslide(_) => ScenarioKind::Landslide,
            Self::Flood(_) => ScenarioKind::Flood,
            Self::Mountain(_) => ScenarioKind::Mountain,
            Self::Lake(_) => ScenarioKind::Lake,
            Self::Solar(_) => ScenarioKind::Solar,
        }
    }
}

/// Whichever scenario is currently loaded.
#[derive(Debug, Clone)]
pub enum Scenario {
    Landslide(Landslide),
    Flood(Flood),
    Mountain(Mountain),
    Lake(Lake),
    Solar(SolarSystem),
}

impl Scenario {
    pub fn new(params: ScenarioParams, cfg: EngineConfig) -> Self {
        match params {
            ScenarioParams::Landslide(p) => Self::Landslide(Landslide::new(p, cfg)),
            ScenarioParams::Flood(p) => Self::Flood(Flood::new(p, cfg)),
            ScenarioParams::Mountain(p) => Self::Mountain(Mountain::new(p, cfg)),
            ScenarioParams::Lake(p) => Self::Lake(Lake::new(p, cfg)),
            ScenarioParams::Solar(p) => Self::Solar(SolarSystem::new(p, cfg.canvas)),
        }
    }

    pub fn kind(&self) -> ScenarioKind {
        self.params().kind()
    }

    pub fn params(&self) -> ScenarioParams {
        match self {
            Self::Landslide(s) => ScenarioParams::Landslide(s.params()),
            Self::Flood(s) => ScenarioParams::Flood(s.params()),
            Self::Mountain(s) => ScenarioParams::Mountain(s.params()),
            Self::Lake(s) => ScenarioParams::Lake(s.params()),
            Self::Solar(s) => ScenarioParams::Solar(s.params()),
        }
    }

    /// Stores `params` if they belong to this scenario. Parameters for a
    /// different kind are ignored and reported as [`ParamChange::Unchanged`].
    pub fn set_params(&mut self, params: ScenarioParams) -> ParamChange {
        match (self, params) {
            (Self::Landslide(s), ScenarioParams::Landslide(p)) => s.set_params(p),
            (Self::Flood(s), ScenarioParams::Flood(p)) => s.set_params(p),
            (Self::Mountain(s), ScenarioParams::Mountain(p)) => s.set_params(p),
            (Self::Lake(s), ScenarioParams::Lake(p)) => s.set_params(p),
            (Self::Solar(s), ScenarioParams::Solar(p)) => s.set_params(p),
            _ => ParamChange::Unchanged,
        }
    }

    fn sim(&self) -> &dyn Simulation {
        match self {
            Self::Landslide(s) => s,
            Self::Flood(s) => s,
            Self::Mountain(s) => s,
            Self::Lake(s) => s,
            Self::Solar(s) => s,
        }
    }

    fn sim_mut(&mut self) -> &mut dyn Simulation {
        match self {
            Self::Landslide(s) => s,
            Self::Flood(s) => s,
            Self::Mountain(s) => s,
            Self::Lake(s) => s,
            Self::Solar(s) => s,
        }
    }
}

impl Simulation for Scenario {
    fn step(&mut self) {
        self.sim_mut().step();
    }

    fn compose(&self, frame: &mut Frame) {
        self.sim().compose(frame);
    }

    fn reset(&mut self) {
        self.sim_mut().reset();
    }

    fn elapsed(&self) -> f32 {
        self.sim().elapsed()
    }

    fn canvas(&self) -> Canvas {
        self.sim().canvas()
    }

    fn particle_count(&self) -> usize {
        self.sim().particle_count()
    }

    fn dropped_particles(&self) -> u64 {
        self.sim().dropped_particles()
    }

    fn resize(&mut self, canvas: Canvas) {
        self.sim_mut().resize(canvas);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_tags() {
        for kind in ScenarioKind::ALL {
            assert_eq!(kind.tag().parse::<ScenarioKind>(), Ok(kind));
            let s = Scenario::new(ScenarioParams::defaults(kind), EngineConfig::default());
            assert_eq!(s.kind(), kind);
        }
        assert!("volcano".parse::<ScenarioKind>().is_err());
    }

    #[test]
    fn validate_checks_the_wrapped_params() {
        for kind in ScenarioKind::ALL {
            assert_eq!(ScenarioParams::defaults(kind).validate(), Ok(()));
        }
        let wet = ScenarioParams::Flood(FloodParams {
            ground_saturation: 120.0,
            ..FloodParams::default()
        });
        assert!(matches!(
            wet.validate(),
            Err(ConfigError::OutOfRange { name: "ground_saturation", .. })
        ));
    }

    #[test]
    fn mismatched_params_are_ignored() {
        let mut s = Scenario::new(
            ScenarioParams::defaults(ScenarioKind::Flood),
            EngineConfig::default(),
        );
        let change = s.set_params(ScenarioParams::defaults(ScenarioKind::Lake));
        assert_eq!(change, ParamChange::Unchanged);
        assert_eq!(s.kind(), ScenarioKind::Flood);
    }

    #[test]
    fn capped_scenario_counts_refused_spawns() {
        let cfg = EngineConfig {
            particle_cap: Some(5),
            ..EngineConfig::default()
        };
        let mut s = Scenario::new(
            ScenarioParams::Flood(FloodParams {
                rainfall: 10.0,
                ..FloodParams::default()
            }),
            cfg,
        );
        for _ in 0..200 {
            s.step();
            assert!(s.particle_count() <= 5);
        }
        assert!(s.dropped_particles() > 0);
        s.reset();
        assert_eq!(s.dropped_particles(), 0);
    }

    #[test]
    fn every_scenario_composes_after_a_step() {
        for kind in ScenarioKind::ALL {
            let mut s = Scenario::new(ScenarioParams::defaults(kind), EngineConfig::default());
            s.step();
            let mut frame = Frame::new(s.canvas());
            s.compose(&mut frame);
            assert!(!frame.is_empty(), "{kind:?} drew nothing");
            assert!(s.elapsed() > 0.0, "{kind:?} did not advance");
        }
    }
}
