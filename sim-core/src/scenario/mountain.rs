use glam::Vec2;
use log::{debug, info};
use rand::{Rng, rngs::StdRng};

use super::{ParamChange, Simulation};
use crate::{
    config::{EngineConfig, MountainFormation, MountainParams},
    environment::EnvironmentalState,
    frame::{Frame, Layer},
    particle::{Particle, ParticleKind, ParticleSystem},
    rng::scenario_rng,
    terrain::{self, TerrainLayer},
    types::{Canvas, Rgba, rgb, with_alpha},
};

const SALT: u64 = 0x0307_A1A5;

/// Elapsed time after which a volcanic range starts erupting.
pub const ERUPTION_AFTER: f32 = 100.0;
const LAVA_GRAVITY: f32 = 0.1;
/// Negative: smoke rises.
const SMOKE_LIFT: f32 = -0.02;
const SMOKE_FADE: u8 = 3;
/// Simulated time units per million years shown.
const YEARS_PER_UNIT: f32 = 10.0;

const LAVA: Rgba = rgb(0xFF, 0x45, 0x00);
const SMOKE: Rgba = [0x69, 0x69, 0x69, 0xB0];
const PLATE: Rgba = rgb(0xFF, 0x00, 0x00);

/// A crustal plate pushing toward the centre of the range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plate {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    /// `1.0` moves right, `-1.0` moves left.
    pub direction: f32,
}

fn plates(canvas: Canvas) -> [Plate; 2] {
    let (w, h) = (canvas.width, canvas.height);
    [
        Plate {
            x: 0.0,
            y: h * 0.8,
            width: w * 0.6,
            direction: 1.0,
        },
        Plate {
            x: w * 0.4,
            y: h * 0.8,
            width: w * 0.6,
            direction: -1.0,
        },
    ]
}

pub fn force_label(force: f32) -> &'static str {
    if force < 3.0 {
        "Low"
    } else if force < 7.0 {
        "Medium"
    } else {
        "High"
    }
}

/// Five strata squeezed between two converging plates.
#[derive(Debug, Clone)]
pub struct Mountain {
    params: MountainParams,
    cfg: EngineConfig,
    layers: Vec<TerrainLayer>,
    plates: [Plate; 2],
    particles: ParticleSystem,
    env: EnvironmentalState,
    rng: StdRng,
}

impl Mountain {
    pub fn new(params: MountainParams, cfg: EngineConfig) -> Self {
        let params = params.clamped();
        debug!("strata regenerated for {} formation", params.formation.tag());
        Self {
            params,
            cfg,
            layers: terrain::generate_strata(cfg.canvas),
            plates: plates(cfg.canvas),
            particles: ParticleSystem::new(cfg.particle_cap),
            env: EnvironmentalState::new(),
            rng: scenario_rng(cfg.seed, SALT),
        }
    }

    pub fn params(&self) -> MountainParams {
        self.params
    }

    /// Only the formation changes the strata; force and time scale are live.
    pub fn set_params(&mut self, params: MountainParams) -> ParamChange {
        let params = params.clamped();
        if params == self.params {
            return ParamChange::Unchanged;
        }
        let reshape = params.formation != self.params.formation;
        self.params = params;
        if reshape {
            self.reset();
            ParamChange::Regenerate
        } else {
            ParamChange::Live
        }
    }

    pub fn layers(&self) -> &[TerrainLayer] {
        &self.layers
    }

    pub fn plates(&self) -> &[Plate; 2] {
        &self.plates
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn environment(&self) -> &EnvironmentalState {
        &self.env
    }

    /// Top of the youngest stratum at the centre of the range.
    fn vent(&self) -> Vec2 {
        let x = self.cfg.canvas.width / 2.0;
        let y = self
            .layers
            .first()
            .and_then(|top| top.height_at(x))
            .unwrap_or(self.cfg.canvas.height);
        Vec2::new(x, y)
    }

    fn erupt(&mut self) {
        let vent = self.vent();
        let rng = &mut self.rng;
        let mut batch = Vec::new();
        if rng.random::<f32>() < 0.5 {
            let count = (self.params.compression_force / 2.0).ceil() as usize;
            for _ in 0..count {
                let vel = Vec2::new(
                    (rng.random::<f32>() - 0.5) * 2.0,
                    -(2.0 + rng.random::<f32>() * 3.0),
                );
                let size = 2.0 + rng.random::<f32>() * 2.0;
                batch.push(Particle::new(ParticleKind::Lava, vent, vel, size, LAVA));
            }
        }
        if rng.random::<f32>() < 0.3 {
            let vel = Vec2::new((rng.random::<f32>() - 0.5) * 0.5, -1.0);
            let size = 4.0 + rng.random::<f32>() * 4.0;
            batch.push(Particle::new(ParticleKind::Smoke, vent, vel, size, SMOKE));
        }
        self.particles.spawn_batch(batch);
    }
}

impl Simulation for Mountain {
    fn step(&mut self) {
        let MountainParams {
            formation,
            compression_force,
            time_scale,
        } = self.params;
        let canvas = self.cfg.canvas;

        self.env.advance(time_scale);
        let rate = terrain::compression_rate(formation, compression_force, time_scale);
        terrain::compress(&mut self.layers, formation, rate, canvas);

        if formation == MountainFormation::Volcanic {
            if self.env.latch_volcano(ERUPTION_AFTER) {
                info!("volcano active at t = {:.0}", self.env.elapsed);
            }
            if self.env.volcano_active {
                self.erupt();
            }
        }

        self.particles.integrate_by(|kind| match kind {
            ParticleKind::Smoke => SMOKE_LIFT,
            _ => LAVA_GRAVITY,
        });

        let top = self.layers.first();
        self.particles.retain_mut(|p| match p.kind {
            ParticleKind::Smoke => {
                p.color[3] = p.color[3].saturating_sub(SMOKE_FADE);
                p.color[3] > 0
            }
            _ => {
                let ground = top.and_then(|l| l.height_at(p.pos.x)).unwrap_or(canvas.height);
                !(p.vel.y > 0.0 && p.pos.y >= ground)
            }
        });
        self.particles.cull(canvas, self.cfg.cull_margin);
    }

    fn compose(&self, frame: &mut Frame) {
        let canvas = self.cfg.canvas;
        let (w, h) = (canvas.width, canvas.height);
        frame.gradient(
            Vec2::ZERO,
            Vec2::new(w, h * 0.6),
            rgb(0x87, 0xCE, 0xEB),
            rgb(0xE0, 0xF6, 0xFF),
        );
        frame.rect(Layer::Background, Vec2::new(0.0, h * 0.6), Vec2::new(w, h), rgb(0xE0, 0xF6, 0xFF));

        // Deeper strata paint over the lower part of the ones above.
        for layer in &self.layers {
            frame.fill_under(Layer::Terrain, layer.points.clone(), h, layer.color);
            frame.line(Layer::LayerBoundaries, layer.points.clone(), 1.0, [0, 0, 0, 77]);
        }

        for plate in &self.plates {
            frame.rect(
                Layer::Overlays,
                Vec2::new(plate.x, plate.y),
                Vec2::new(plate.x + plate.width, h),
                with_alpha(PLATE, 0.3),
            );
            let tail = Vec2::new(plate.x + plate.width / 2.0, (plate.y + h) / 2.0);
            let tip = tail + Vec2::new(plate.direction * 40.0, 0.0);
            let barb = Vec2::new(-plate.direction * 8.0, 6.0);
            frame.line(Layer::Overlays, vec![tail, tip], 3.0, PLATE);
            frame.line(
                Layer::Overlays,
                vec![tip + barb, tip, tip + barb * Vec2::new(1.0, -1.0)],
                3.0,
                PLATE,
            );
        }

        for p in self.particles.iter() {
            frame.circle(Layer::Particles, p.pos, p.size, p.color);
        }

        frame.readouts([
            format!(
                "Time: {} million years",
                (self.env.elapsed / YEARS_PER_UNIT).floor()
            ),
            format!("Formation: {}", self.params.formation.label()),
            format!(
                "Tectonic Force: {}",
                force_label(self.params.compression_force)
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

#[cfg(test)]
mod tests {
    use super::*;

    fn mountain(formation: MountainFormation) -> Mountain {
        Mountain::new(
            MountainParams {
                formation,
                compression_force: 5.0,
                time_scale: 3.0,
            },
            EngineConfig::default(),
        )
    }

    fn peak(m: &Mountain) -> f32 {
        m.layers()[0]
            .points
            .iter()
            .map(|p| p.y)
            .fold(f32::INFINITY, f32::min)
    }

    #[test]
    fn compression_raises_the_top_stratum() {
        for formation in MountainFormation::ALL {
            let mut m = mountain(formation);
            let before = peak(&m);
            for _ in 0..100 {
                m.step();
            }
            assert!(peak(&m) < before, "{formation:?} did not rise");
            let h = m.canvas().height;
            for layer in m.layers() {
                assert!(layer.points.iter().all(|p| (0.0..=h).contains(&p.y)));
            }
        }
    }

    #[test]
    fn volcano_latches_after_threshold_and_erupts() {
        let mut m = mountain(MountainFormation::Volcanic);
        // elapsed 99 after 33 ticks at time scale 3.
        for _ in 0..33 {
            m.step();
        }
        assert!(!m.environment().volcano_active);
        assert!(m.particles().is_empty());

        m.step();
        assert!(m.environment().volcano_active);
        for _ in 0..60 {
            m.step();
            assert!(m.environment().volcano_active);
        }
        assert!(m.particles().iter().any(|p| p.kind == ParticleKind::Lava));
    }

    #[test]
    fn folding_never_erupts() {
        let mut m = mountain(MountainFormation::Folding);
        for _ in 0..200 {
            m.step();
        }
        assert!(!m.environment().volcano_active);
        assert!(m.particles().is_empty());
    }

    #[test]
    fn smoke_rises_and_fades() {
        let mut m = mountain(MountainFormation::Volcanic);
        for _ in 0..80 {
            m.step();
        }
        let vent = m.vent();
        for p in m.particles().iter().filter(|p| p.kind == ParticleKind::Smoke) {
            assert!(p.pos.y < vent.y);
            assert!(p.color[3] < SMOKE[3]);
        }
    }

    #[test]
    fn readouts_name_formation_and_force() {
        let mut m = mountain(MountainFormation::Faulting);
        m.step();
        let mut frame = Frame::new(m.canvas());
        m.compose(&mut frame);
        let texts = frame.texts();
        assert!(texts.contains(&"Time: 0 million years"));
        assert!(texts.contains(&"Formation: Faulting"));
        assert!(texts.contains(&"Tectonic Force: Medium"));

        for _ in 0..6 {
            m.step();
        }
        let mut frame = Frame::new(m.canvas());
        m.compose(&mut frame);
        assert!(frame.texts().contains(&"Time: 2 million years"));
        assert_eq!(force_label(2.0), "Low");
        assert_eq!(force_label(7.0), "High");
    }

    #[test]
    fn only_formation_regenerates() {
        let mut m = mountain(MountainFormation::Folding);
        for _ in 0..10 {
            m.step();
        }
        let stronger = MountainParams {
            compression_force: 9.0,
            ..m.params()
        };
        assert_eq!(m.set_params(stronger), ParamChange::Live);
        assert_eq!(m.elapsed(), 30.0);

        let volcanic = MountainParams {
            formation: MountainFormation::Volcanic,
            ..m.params()
        };
        assert_eq!(m.set_params(volcanic), ParamChange::Regenerate);
        assert_eq!(m.elapsed(), 0.0);
        assert_eq!(m.layers(), terrain::generate_strata(m.canvas()).as_slice());
    }
}
