use glam::Vec2;
use log::debug;
use rand::{Rng, rngs::StdRng};

use super::{ParamChange, Simulation};
use crate::{
    config::{EngineConfig, FloodParams},
    environment::{self, EnvironmentalState, RiskLevel, flood_risk},
    frame::{Frame, Layer},
    particle::{Particle, ParticleKind, ParticleSystem},
    rng::{hash_unit, scenario_rng},
    terrain::{self, Terrain, TerrainShape},
    types::{Canvas, Rgba, rgb, with_alpha},
};

const SALT: u64 = 0xF100_D5ED;

/// Deliberately light: drops fall at close to their spawn speed.
const GRAVITY: f32 = 0.05;
const SPAWN_ROW: f32 = -10.0;
/// Highlight over the lowest fifth of the canvas at severe risk.
const SEVERE_BAND: Rgba = [0xFF, 0xFF, 0x00, 0x4C];
const SEVERE_BAND_TOP: f32 = 0.8;
const RUNOFF_LIFT: f32 = 2.0;
/// Saturation above which standing water is drawn over the ground.
const POOLING_THRESHOLD: f32 = 0.8;

const RAIN: Rgba = rgb(0x46, 0x82, 0xB4);
const SOIL: Rgba = rgb(0x8B, 0x45, 0x13);
const GRASS: Rgba = rgb(0x22, 0x8B, 0x22);
const POOL: Rgba = rgb(0x41, 0x69, 0xE1);

/// Rain falling on a rolling plain that soaks it up until it can't.
///
/// Drops landing on unsaturated ground are absorbed and wet that sample.
/// Once a sample is saturated, drops landing on it turn into runoff and
/// skid downslope.
#[derive(Debug, Clone)]
pub struct Flood {
    params: FloodParams,
    cfg: EngineConfig,
    terrain: Terrain,
    particles: ParticleSystem,
    env: EnvironmentalState,
    ticks: u64,
    rng: StdRng,
}

impl Flood {
    pub fn new(params: FloodParams, cfg: EngineConfig) -> Self {
        let params = params.clamped();
        let terrain = terrain::generate(
            TerrainShape::Rolling {
                slope_percent: params.terrain_slope,
                saturation: params.ground_saturation / 100.0,
            },
            cfg.canvas,
        );
        let env = EnvironmentalState {
            ground_saturation_avg: terrain.mean_saturation(),
            ..EnvironmentalState::new()
        };
        debug!(
            "flood plain regenerated: slope {}%, saturation {}%",
            params.terrain_slope, params.ground_saturation
        );
        Self {
            params,
            cfg,
            terrain,
            particles: ParticleSystem::new(cfg.particle_cap),
            env,
            ticks: 0,
            rng: scenario_rng(cfg.seed, SALT),
        }
    }

    pub fn params(&self) -> FloodParams {
        self.params
    }

    /// Rainfall is live; slope and saturation reshape the plain.
    pub fn set_params(&mut self, params: FloodParams) -> ParamChange {
        let params = params.clamped();
        if params == self.params {
            return ParamChange::Unchanged;
        }
        let reshape = params.terrain_slope != self.params.terrain_slope
            || params.ground_saturation != self.params.ground_saturation;
        self.params = params;
        if reshape {
            self.reset();
            ParamChange::Regenerate
        } else {
            ParamChange::Live
        }
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn environment(&self) -> &EnvironmentalState {
        &self.env
    }

    /// Derived from the slider values, not from the simulated ground.
    pub fn risk(&self) -> f32 {
        flood_risk(
            self.params.rainfall,
            self.params.terrain_slope,
            self.params.ground_saturation,
        )
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_risk(self.risk())
    }

    fn spawn_rain(&mut self) {
        let rainfall = self.params.rainfall;
        if self.rng.random::<f32>() >= rainfall * 0.1 {
            return;
        }
        let width = self.cfg.canvas.width;
        let count = (rainfall * 2.0).round() as usize;
        let rng = &mut self.rng;
        let drops: Vec<Particle> = (0..count)
            .map(|_| {
                let pos = Vec2::new(rng.random::<f32>() * width, SPAWN_ROW);
                let vel = Vec2::new(rng.random_range(-1.0..1.0), 3.0 + rainfall * 0.5);
                let size = 1.0 + rng.random::<f32>();
                let color = with_alpha(RAIN, 0.6 + rng.random::<f32>() * 0.4);
                Particle::new(ParticleKind::Rain, pos, vel, size, color)
            })
            .collect();
        self.particles.spawn_batch(drops);
    }
}

impl Simulation for Flood {
    fn step(&mut self) {
        self.spawn_rain();
        self.particles.integrate(GRAVITY);

        let Self {
            params,
            terrain,
            particles,
            rng,
            ..
        } = self;
        let runoff = params.terrain_slope * 0.1;
        particles.retain_mut(|p| {
            let Some(ground) = terrain.point_at_mut(p.pos.x) else {
                return true;
            };
            if p.pos.y < ground.y {
                return true;
            }
            if environment::absorb(ground) {
                return false;
            }
            p.pos.y = ground.y - RUNOFF_LIFT;
            p.vel.y = 0.0;
            p.vel.x = runoff + rng.random::<f32>() * 2.0;
            if rng.random::<f32>() < 0.1 {
                p.vel.y = -1.0;
            }
            true
        });

        self.particles.cull(self.cfg.canvas, self.cfg.cull_margin);
        self.env.ground_saturation_avg = self.terrain.mean_saturation();
        self.env.advance(1.0);
        self.ticks += 1;
    }

    fn compose(&self, frame: &mut Frame) {
        let canvas = self.cfg.canvas;
        let (w, h) = (canvas.width, canvas.height);
        frame.rect(Layer::Background, Vec2::ZERO, Vec2::new(w, h), rgb(0x70, 0x80, 0x90));
        frame.gradient(
            Vec2::ZERO,
            Vec2::new(w, h * 0.4),
            rgb(0x2F, 0x4F, 0x4F),
            rgb(0x70, 0x80, 0x90),
        );

        frame.fill_under(Layer::Terrain, self.terrain.silhouette(), h, SOIL);
        for p in self.terrain.points.iter().step_by(5) {
            frame.line(
                Layer::Terrain,
                vec![Vec2::new(p.x, p.y), Vec2::new(p.x, p.y - 5.0)],
                1.0,
                GRASS,
            );
        }

        let spacing = self.terrain.spacing();
        for p in self.terrain.points.iter().filter(|p| p.saturation > POOLING_THRESHOLD) {
            let depth = (p.saturation - POOLING_THRESHOLD) * 20.0;
            frame.rect(
                Layer::WaterBody,
                Vec2::new(p.x, p.y - depth),
                Vec2::new(p.x + spacing, p.y),
                with_alpha(POOL, 0.6),
            );
        }

        for p in self.particles.iter() {
            frame.circle(Layer::Particles, p.pos, p.size, p.color);
        }

        let streaks = (self.params.rainfall * 10.0) as u64;
        for i in 0..streaks {
            let top = Vec2::new(
                hash_unit(self.ticks, i * 2) * w,
                hash_unit(self.ticks, i * 2 + 1) * h,
            );
            frame.line(
                Layer::Overlays,
                vec![top, top + Vec2::new(-2.0, 10.0)],
                1.0,
                [0xAE, 0xC2, 0xE0, 0x80],
            );
        }

        let level = self.risk_level();
        if level >= RiskLevel::Warning {
            frame.text(
                Layer::Overlays,
                Vec2::new(w / 2.0 - 90.0, 40.0),
                "FLOOD WARNING",
                24.0,
                rgb(0xFF, 0x00, 0x00),
            );
        }
        if level == RiskLevel::Severe {
            frame.rect(
                Layer::Overlays,
                Vec2::new(0.0, h * SEVERE_BAND_TOP),
                Vec2::new(w, h),
                SEVERE_BAND,
            );
        }

        frame.readouts([
            format!("Rainfall: {:.0}", self.params.rainfall),
            format!(
                "Ground saturation: {:.0}%",
                self.env.ground_saturation_avg * 100.0
            ),
            format!("Flood risk: {:.0}% ({level:?})", self.risk() * 100.0),
        ]);
    }

    fn reset(&mut self) {
        *self = Self::new(self.params, self.cfg);
    }

    fn elapsed(&self) -> f32 {
        self.env.elapsed
    }

    fn canvas(&self) -> Canvas {
        self.cfg.canvas
    }

    fn particle_count(&self) -> usize {
        self.particles.len()
    }

    fn dropped_particles(&self) -> u64 {
        self.particles.dropped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Shape;

    fn flood(rainfall: f32, terrain_slope: f32, ground_saturation: f32) -> Flood {
        Flood::new(
            FloodParams {
                rainfall,
                terrain_slope,
                ground_saturation,
            },
            EngineConfig::default(),
        )
    }

    #[test]
    fn saturation_never_decreases() {
        let mut f = flood(10.0, 8.0, 0.0);
        let mut before: Vec<f32> = f.terrain().points.iter().map(|p| p.saturation).collect();
        for _ in 0..400 {
            f.step();
            let now: Vec<f32> = f.terrain().points.iter().map(|p| p.saturation).collect();
            for (a, b) in before.iter().zip(&now) {
                assert!(b >= a);
                assert!(*b <= environment::SATURATION_MAX);
            }
            before = now;
        }
        assert!(f.environment().ground_saturation_avg > 0.0);
    }

    #[test]
    fn particles_stay_inside_the_cull_margin() {
        let mut f = flood(10.0, 20.0, 100.0);
        let canvas = f.canvas();
        for _ in 0..300 {
            f.step();
            assert!(
                f.particles()
                    .iter()
                    .all(|p| canvas.contains_with_margin(p.pos, 10.0))
            );
        }
    }

    #[test]
    fn dry_ground_absorbs_every_drop() {
        let mut f = flood(10.0, 1.0, 0.0);
        for _ in 0..200 {
            f.step();
        }
        let canvas = f.canvas();
        // Nothing has saturated yet, so every drop that reached the ground is gone.
        assert!(f.terrain().points.iter().all(|p| p.saturation < 1.0));
        for p in f.particles().iter() {
            let ground = f.terrain().height_at(p.pos.x).unwrap_or(canvas.height);
            assert!(p.pos.y < ground);
        }
    }

    #[test]
    fn saturated_ground_turns_rain_into_runoff() {
        let mut f = flood(10.0, 10.0, 100.0);
        for _ in 0..200 {
            f.step();
        }
        let runoff = f
            .particles()
            .iter()
            .filter(|p| {
                let ground = f.terrain().height_at(p.pos.x).unwrap_or(f32::MAX);
                p.pos.y >= ground - 3.0 && p.vel.x > 0.0
            })
            .count();
        assert!(runoff > 0);
        assert!(f.terrain().points.iter().all(|p| p.saturation == 1.0));
    }

    #[test]
    fn warning_text_tracks_risk_level() {
        let texts = |f: &Flood| {
            let mut frame = Frame::new(f.canvas());
            f.compose(&mut frame);
            frame.texts().into_iter().map(str::to_owned).collect::<Vec<_>>()
        };
        let warn = flood(8.0, 15.0, 90.0);
        assert_eq!(warn.risk_level(), RiskLevel::Warning);
        assert!(texts(&warn).iter().any(|t| t == "FLOOD WARNING"));

        let calm = flood(2.0, 5.0, 50.0);
        assert_eq!(calm.risk_level(), RiskLevel::Calm);
        assert!(!texts(&calm).iter().any(|t| t == "FLOOD WARNING"));
    }

    #[test]
    fn severe_risk_keeps_the_warning_and_adds_the_band() {
        let f = flood(10.0, 20.0, 100.0);
        assert_eq!(f.risk_level(), RiskLevel::Severe);
        let mut frame = Frame::new(f.canvas());
        f.compose(&mut frame);
        assert!(frame.texts().contains(&"FLOOD WARNING"));
        let band = frame.shapes_in(Layer::Overlays).any(|s| {
            matches!(s, Shape::Rect { fill, min, .. }
                if *fill == SEVERE_BAND && min.y == f.canvas().height * SEVERE_BAND_TOP)
        });
        assert!(band, "severe band missing");

        let warn = flood(8.0, 15.0, 90.0);
        let mut frame = Frame::new(warn.canvas());
        warn.compose(&mut frame);
        assert!(!frame
            .shapes_in(Layer::Overlays)
            .any(|s| matches!(s, Shape::Rect { fill, .. } if *fill == SEVERE_BAND)));
    }

    #[test]
    fn rainfall_is_live_but_slope_regenerates() {
        let mut f = flood(5.0, 8.0, 60.0);
        for _ in 0..10 {
            f.step();
        }
        let elapsed = f.elapsed();
        let more_rain = FloodParams {
            rainfall: 9.0,
            ..f.params()
        };
        assert_eq!(f.set_params(more_rain), ParamChange::Live);
        assert_eq!(f.elapsed(), elapsed);

        let steeper = FloodParams {
            terrain_slope: 18.0,
            ..f.params()
        };
        assert_eq!(f.set_params(steeper), ParamChange::Regenerate);
        assert_eq!(f.elapsed(), 0.0);
        assert!(f.particles().is_empty());
    }

    #[test]
    fn compose_does_not_touch_state() {
        let mut f = flood(7.0, 12.0, 80.0);
        for _ in 0..50 {
            f.step();
        }
        let particles = f.particles().particles.clone();
        let terrain = f.terrain().clone();
        let mut frame = Frame::new(f.canvas());
        f.compose(&mut frame);
        f.compose(&mut frame);
        assert_eq!(f.particles().particles, particles);
        assert_eq!(f.terrain(), &terrain);
    }
}
