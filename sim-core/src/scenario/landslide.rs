use glam::Vec2;
use log::debug;
use rand::{Rng, rngs::StdRng};

use super::{ParamChange, Simulation};
use crate::{
    config::{EngineConfig, LandslideParams, SoilType},
    environment::{EnvironmentalState, landslide_instability},
    frame::{Frame, Layer},
    particle::{Particle, ParticleKind, ParticleSystem},
    rng::scenario_rng,
    terrain::{self, Terrain, TerrainShape},
    types::{Canvas, Rgba, rgb, with_alpha},
};

const SALT: u64 = 0x1A4D_511D;

/// Added to the instability to get the per-particle release chance, so a
/// marginally stable slope still sheds some debris.
pub const TRIGGER_BIAS: f32 = 0.1;
const GRAVITY: f32 = 0.2;
const DOWNSLOPE_PUSH: f32 = 0.3;
const BURIAL_DEPTH: f32 = 50.0;
const FLOOR_GAP: f32 = 10.0;
const REST_SPEED: f32 = 0.5;
const HALO_THRESHOLD: f32 = 30.0;

/// Debris is kept off the outer tenth of the canvas on each side.
const DEBRIS_MARGIN: f32 = 0.1;

const BROWN: Rgba = rgb(0x8B, 0x45, 0x13);
const WET_BROWN: Rgba = rgb(0x65, 0x43, 0x21);
const SAND: Rgba = rgb(0xF4, 0xA4, 0x60);
const GREY: Rgba = rgb(0x69, 0x69, 0x69);
const HALO: Rgba = rgb(0x41, 0x69, 0xE1);

fn debris_count(soil: SoilType) -> usize {
    match soil {
        SoilType::Rock => 50,
        SoilType::Sand => 150,
        SoilType::Clay | SoilType::Mixed => 100,
    }
}

fn friction(soil: SoilType) -> f32 {
    match soil {
        SoilType::Rock => 0.95,
        SoilType::Sand => 0.98,
        SoilType::Clay | SoilType::Mixed => 0.92,
    }
}

/// Color and radius of one debris grain.
fn grain(soil: SoilType, water_content: f32, rng: &mut StdRng) -> (Rgba, f32) {
    match soil {
        SoilType::Clay if water_content > 50.0 => (WET_BROWN, 2.0),
        SoilType::Clay => (BROWN, 2.0),
        SoilType::Sand => (SAND, 1.5),
        SoilType::Rock => (GREY, 4.0),
        SoilType::Mixed => {
            let color = if rng.random_bool(0.5) { BROWN } else { SAND };
            (color, rng.random_range(2.0..=4.0))
        }
    }
}

/// Debris resting on a hillside until the slope gives way.
///
/// Instability is evaluated once, on the first tick of a run: every buried
/// grain is freed with probability `instability + TRIGGER_BIAS`. Whatever
/// stays settled stays put for the rest of the run.
#[derive(Debug, Clone)]
pub struct Landslide {
    params: LandslideParams,
    cfg: EngineConfig,
    terrain: Terrain,
    particles: ParticleSystem,
    env: EnvironmentalState,
    instability: f32,
    triggered: bool,
    rng: StdRng,
}

impl Landslide {
    pub fn new(params: LandslideParams, cfg: EngineConfig) -> Self {
        let params = params.clamped();
        let canvas = cfg.canvas;
        let mut rng = scenario_rng(cfg.seed, SALT);
        let terrain = terrain::generate(
            TerrainShape::Slope {
                angle_deg: params.slope_angle,
            },
            canvas,
        );

        let mut particles = ParticleSystem::new(cfg.particle_cap);
        let count = debris_count(params.soil);
        let mut batch = Vec::with_capacity(count);
        for _ in 0..count {
            let span = 1.0 - 2.0 * DEBRIS_MARGIN;
            let x = canvas.width * (DEBRIS_MARGIN + rng.random::<f32>() * span);
            let ground = terrain.height_at(x).unwrap_or(canvas.height);
            let y = (ground + rng.random::<f32>() * BURIAL_DEPTH).min(canvas.height - FLOOR_GAP);
            let (color, size) = grain(params.soil, params.water_content, &mut rng);
            batch.push(Particle::at_rest(ParticleKind::Debris, Vec2::new(x, y), size, color));
        }
        particles.spawn_batch(batch);

        let instability = landslide_instability(params.slope_angle, params.water_content, params.soil);
        debug!(
            "landslide regenerated: {} grains, instability {instability:.2}",
            particles.len()
        );

        Self {
            params,
            cfg,
            terrain,
            particles,
            env: EnvironmentalState::new(),
            instability,
            triggered: false,
            rng,
        }
    }

    pub fn params(&self) -> LandslideParams {
        self.params
    }

    /// Every landslide parameter shapes the hillside or its debris, so any
    /// change rebuilds the run.
    pub fn set_params(&mut self, params: LandslideParams) -> ParamChange {
        let params = params.clamped();
        if params == self.params {
            return ParamChange::Unchanged;
        }
        self.params = params;
        self.reset();
        ParamChange::Regenerate
    }

    pub fn instability(&self) -> f32 {
        self.instability
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn moving(&self) -> usize {
        self.particles.count_free()
    }

    fn trigger(&mut self) {
        let chance = self.instability + TRIGGER_BIAS;
        let rng = &mut self.rng;
        let mut released = 0;
        for p in self.particles.particles.iter_mut().filter(|p| p.is_settled()) {
            if rng.random::<f32>() < chance {
                let vel = Vec2::new(
                    (rng.random::<f32>() - 0.5) * 2.0,
                    rng.random::<f32>() * 2.0 + 1.0,
                );
                p.release(vel);
                released += 1;
            }
        }
        self.triggered = true;
        debug!("slope failure released {released} grains (chance {chance:.2})");
    }
}

impl Simulation for Landslide {
    fn step(&mut self) {
        if !self.triggered {
            self.trigger();
        }

        let canvas = self.cfg.canvas;
        let push = self.params.slope_angle.to_radians().sin() * DOWNSLOPE_PUSH;
        let wet = self.params.water_content > 50.0;
        for p in self.particles.free_mut() {
            p.vel.x += push;
            if wet {
                p.vel.x *= 1.02;
                p.vel.y *= 1.01;
            }
        }

        self.particles.integrate(GRAVITY);

        let damping = friction(self.params.soil);
        for p in self.particles.free_mut() {
            p.vel *= damping;

            let floor = canvas.height - p.size;
            if p.pos.y >= floor {
                p.pos.y = floor;
                p.vel.y *= -0.3;
                p.vel.x *= 0.8;
                if p.vel.x.abs() < REST_SPEED && p.vel.y.abs() < REST_SPEED {
                    p.settle();
                }
            }

            if p.pos.x < 0.0 || p.pos.x > canvas.width {
                p.vel.x *= -0.5;
            }
        }

        self.particles.cull(canvas, self.cfg.cull_margin);
        self.env.advance(1.0);
    }

    fn compose(&self, frame: &mut Frame) {
        let canvas = self.cfg.canvas;
        frame.gradient(
            Vec2::ZERO,
            Vec2::new(canvas.width, canvas.height),
            rgb(0x87, 0xCE, 0xEB),
            rgb(0x90, 0xEE, 0x90),
        );

        let silhouette = self.terrain.silhouette();
        frame.fill_under(Layer::Terrain, silhouette.clone(), canvas.height, rgb(0x8B, 0x73, 0x55));
        frame.line(Layer::Terrain, silhouette, 3.0, WET_BROWN);

        let halo = (self.params.water_content > HALO_THRESHOLD)
            .then(|| with_alpha(HALO, self.params.water_content / 200.0));
        for p in self.particles.iter() {
            if let Some(halo) = halo.filter(|_| !p.is_settled()) {
                frame.circle(Layer::Particles, p.pos, p.size + 2.0, halo);
            }
            frame.circle(Layer::Particles, p.pos, p.size, p.color);
        }

        frame.readouts([
            format!("Moving debris: {}", self.moving()),
            format!("Instability: {:.2}", self.instability),
            format!(
                "Slope: {:.0}°  Water: {:.0}%  Soil: {}",
                self.params.slope_angle,
                self.params.water_content,
                self.params.soil.label()
            ),
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
