use glam::Vec2;
use log::{debug, info};
use rand::{Rng, rngs::StdRng};

use super::{ParamChange, Simulation};
use crate::{
    config::{EngineConfig, LakeFormation, LakeParams},
    environment::{self, EnvironmentalState, IceSheet},
    frame::{Frame, Layer, Shape},
    particle::{Particle, ParticleKind, ParticleSystem},
    rng::scenario_rng,
    terrain::{self, Terrain, TerrainShape},
    types::{Canvas, Rgba, rgb, with_alpha},
};

const SALT: u64 = 0x1A6E_B451;

pub const MELT_AFTER: f32 = 50.0;
pub const ERUPTION_AFTER: f32 = 30.0;
const GRAVITY: f32 = 0.1;
/// Drops this close above the basin floor count as reaching the lake.
const FLOOR_REACH: f32 = 5.0;
const MAX_RUNOFF: f32 = 3.0;
const REFLECTION_BAND: f32 = 5.0;
const CHANNEL_THRESHOLD: f32 = 0.05;
/// Simulated time units per thousand years shown.
const YEARS_PER_UNIT: f32 = 10.0;

const WATER: Rgba = rgb(0x41, 0x69, 0xE1);
const LAKE: Rgba = rgb(0x46, 0x82, 0xB4);
const GROUND: Rgba = rgb(0x8B, 0x73, 0x55);
const CHANNEL: Rgba = rgb(0x65, 0x43, 0x21);
const LAVA: Rgba = rgb(0xFF, 0x45, 0x00);
const ICE: Rgba = rgb(0xE0, 0xFF, 0xFF);
const MELTING_ICE: Rgba = rgb(0xAD, 0xD8, 0xE6);

/// A basin filling with water from one of four sources.
///
/// The lowest terrain sample is the lake bottom. Water reaching it (or the
/// current lake surface) is taken out of the particle system and added to
/// the lake level; water landing anywhere else runs toward the lake bottom
/// and scours the ground as it goes.
#[derive(Debug, Clone)]
pub struct Lake {
    params: LakeParams,
    cfg: EngineConfig,
    terrain: Terrain,
    lake_bottom: f32,
    deepest: usize,
    particles: ParticleSystem,
    env: EnvironmentalState,
    rng: StdRng,
}

impl Lake {
    pub fn new(params: LakeParams, cfg: EngineConfig) -> Self {
        let params = params.clamped();
        let canvas = cfg.canvas;
        let terrain = terrain::generate(TerrainShape::Basin(params.formation), canvas);
        let (deepest, lake_bottom) = terrain
            .lowest()
            .map_or((0, canvas.height), |(i, p)| (i, p.y));

        let mut env = EnvironmentalState::with_lake_capacity(lake_bottom - canvas.height * 0.3);
        if params.formation == LakeFormation::Glacial {
            env.ice_sheet = Some(IceSheet::over(canvas));
        }
        debug!(
            "{} basin regenerated: bottom {lake_bottom:.0}, capacity {:.0}",
            params.formation.tag(),
            env.lake_capacity
        );

        Self {
            params,
            cfg,
            terrain,
            lake_bottom,
            deepest,
            particles: ParticleSystem::new(cfg.particle_cap),
            env,
            rng: scenario_rng(cfg.seed, SALT),
        }
    }

    pub fn params(&self) -> LakeParams {
        self.params
    }

    /// The formation carves the basin; flow and time scale are live.
    pub fn set_params(&mut self, params: LakeParams) -> ParamChange {
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

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn environment(&self) -> &EnvironmentalState {
        &self.env
    }

    pub fn lake_bottom(&self) -> f32 {
        self.lake_bottom
    }

    /// Row of the water surface.
    pub fn surface(&self) -> f32 {
        self.lake_bottom - self.env.lake_water_level
    }

    /// Sample range currently under water, if there is a lake.
    pub fn flooded_span(&self) -> Option<(usize, usize)> {
        if !self.env.has_lake() {
            return None;
        }
        self.terrain.submerged_span(self.surface(), self.deepest)
    }

    fn water_drop(&mut self, pos: Vec2, vel: Vec2, kind: ParticleKind) -> Particle {
        let size = 1.5 + self.rng.random::<f32>();
        Particle::new(kind, pos, vel, size, with_alpha(WATER, 0.8))
    }

    fn feed(&mut self) {
        let canvas = self.cfg.canvas;
        let (w, h) = (canvas.width, canvas.height);
        let flow = self.params.water_flow;
        let mut batch = Vec::new();

        match self.params.formation {
            LakeFormation::Glacial => {
                if self.env.melt_ice(MELT_AFTER) {
                    info!("ice sheet started melting at t = {:.0}", self.env.elapsed);
                }
                let source = self.env.ice_sheet.filter(|ice| ice.melting && !ice.is_spent());
                if let Some(ice) = source
                    && self.rng.random::<f32>() < 0.3
                {
                    for _ in 0..flow.round() as usize {
                        let x = ice.x + self.rng.random::<f32>() * ice.width;
                        let vel = Vec2::new(0.0, 1.0);
                        batch.push(self.water_drop(
                            Vec2::new(x, ice.base()),
                            vel,
                            ParticleKind::Meltwater,
                        ));
                    }
                }
            }
            LakeFormation::Erosional => {
                if self.rng.random::<f32>() < 0.4 {
                    for _ in 0..(flow / 3.0).ceil() as usize {
                        let pos = Vec2::new(self.rng.random::<f32>() * 50.0, h * 0.4);
                        let vel = Vec2::new(2.0 + self.rng.random::<f32>(), 1.0);
                        batch.push(self.water_drop(pos, vel, ParticleKind::Rain));
                    }
                }
            }
            LakeFormation::Volcanic => {
                if self.env.latch_volcano(ERUPTION_AFTER) {
                    info!("crater active at t = {:.0}", self.env.elapsed);
                }
                if self.env.volcano_active {
                    if self.rng.random::<f32>() < 0.2 {
                        for _ in 0..(flow * 2.0).round() as usize {
                            let pos = Vec2::new(self.rng.random::<f32>() * w, -5.0);
                            let drop = self.water_drop(pos, Vec2::new(0.0, 2.0), ParticleKind::Rain);
                            batch.push(drop);
                        }
                    }
                    if self.rng.random::<f32>() < 0.3 {
                        for _ in 0..2 {
                            let x = w / 2.0 + (self.rng.random::<f32>() - 0.5) * 40.0;
                            let pos = Vec2::new(x, self.surface());
                            let vel = Vec2::new(
                                (self.rng.random::<f32>() - 0.5) * 3.0,
                                -(3.0 + self.rng.random::<f32>() * 2.0),
                            );
                            batch.push(Particle::new(ParticleKind::Lava, pos, vel, 2.0, LAVA));
                        }
                    }
                }
            }
            LakeFormation::Tectonic => {
                if self.rng.random::<f32>() < 0.1 {
                    for _ in 0..(flow / 3.0).ceil() as usize {
                        let x = w / 2.0 + (self.rng.random::<f32>() - 0.5) * 100.0;
                        let pos = Vec2::new(x, self.lake_bottom - 20.0);
                        let seep = Vec2::new(0.0, -0.5);
                        batch.push(self.water_drop(pos, seep, ParticleKind::Meltwater));
                    }
                }
            }
        }

        self.particles.spawn_batch(batch);
    }
}

impl Simulation for Lake {
    fn step(&mut self) {
        self.env.advance(self.params.time_scale);
        self.feed();
        self.particles.integrate(GRAVITY);

        let span = self.flooded_span();
        let surface = self.surface();
        let reach = (self.lake_bottom - FLOOR_REACH).min(surface);
        let lake_x = self.terrain.points.get(self.deepest).map_or(0.0, |p| p.x);
        let Self {
            terrain,
            particles,
            env,
            ..
        } = self;
        particles.retain_mut(|p| {
            let i = terrain.index_at(p.pos.x);
            let ground = terrain.points.get(i).map_or(f32::MAX, |g| g.y);
            if p.kind == ParticleKind::Lava {
                return !(p.vel.y > 0.0 && (p.pos.y >= ground || p.pos.y >= surface));
            }

            let in_lake = span.is_some_and(|(lo, hi)| (lo..=hi).contains(&i)) && p.pos.y >= surface;
            if in_lake || (p.pos.y >= ground && p.pos.y >= reach) {
                env.fill_lake();
                return false;
            }
            if p.pos.y >= ground {
                p.pos.y = ground;
                p.vel.y = 0.0;
                let toward = (lake_x - p.pos.x).signum();
                p.vel.x = (p.vel.x + toward).clamp(-MAX_RUNOFF, MAX_RUNOFF);
                if let Some(g) = terrain.points.get_mut(i) {
                    environment::scour(g);
                }
            }
            true
        });

        self.particles.cull(self.cfg.canvas, self.cfg.cull_margin);
    }

    fn compose(&self, frame: &mut Frame) {
        let canvas = self.cfg.canvas;
        let (w, h) = (canvas.width, canvas.height);
        frame.gradient(
            Vec2::ZERO,
            Vec2::new(w, h * 0.5),
            rgb(0x87, 0xCE, 0xEB),
            rgb(0xB0, 0xE0, 0xE6),
        );
        frame.rect(Layer::Background, Vec2::new(0.0, h * 0.5), Vec2::new(w, h), rgb(0xB0, 0xE0, 0xE6));

        let silhouette = self.terrain.silhouette();
        frame.fill_under(Layer::Terrain, silhouette.clone(), h, GROUND);
        frame.line(Layer::Terrain, silhouette, 2.0, CHANNEL);
        for p in self.terrain.points.iter().filter(|p| p.erosion > CHANNEL_THRESHOLD) {
            frame.line(
                Layer::Terrain,
                vec![Vec2::new(p.x, p.y), Vec2::new(p.x, p.y + p.erosion * 20.0)],
                2.0,
                CHANNEL,
            );
        }

        if let Some((lo, hi)) = self.flooded_span() {
            let surface = self.surface();
            let under = &self.terrain.points[lo..=hi];
            let top: Vec<Vec2> = under.iter().map(|p| Vec2::new(p.x, surface)).collect();
            let bottom: Vec<Vec2> = under.iter().map(|p| Vec2::new(p.x, p.y)).collect();
            frame.push(
                Layer::WaterBody,
                Shape::Area {
                    top,
                    bottom,
                    fill: with_alpha(LAKE, 0.7),
                },
            );
            let band = REFLECTION_BAND.min(self.env.lake_water_level);
            frame.rect(
                Layer::WaterBody,
                Vec2::new(under[0].x, surface),
                Vec2::new(under[under.len() - 1].x, surface + band),
                [255, 255, 255, 51],
            );
        }

        for p in self.particles.iter() {
            frame.circle(Layer::Particles, p.pos, p.size, p.color);
        }

        if let Some(ice) = self.env.ice_sheet.filter(|ice| !ice.is_spent()) {
            let tint = if ice.melting { MELTING_ICE } else { ICE };
            frame.rect(
                Layer::Overlays,
                Vec2::new(ice.x, ice.y),
                Vec2::new(ice.x + ice.width, ice.base()),
                with_alpha(tint, 0.9),
            );
            for k in 0..10 {
                let x = ice.x + (k as f32 + 0.5) * ice.width / 10.0;
                frame.line(
                    Layer::Overlays,
                    vec![Vec2::new(x, ice.y), Vec2::new(x, ice.base())],
                    1.0,
                    [0xFF, 0xFF, 0xFF, 0x99],
                );
            }
        }

        let depth = if self.env.has_lake() {
            format!("Lake Depth: {:.0}m", self.env.lake_water_level)
        } else {
            "No Lake Yet".to_owned()
        };
        frame.readouts([
            format!("Formation: {}", self.params.formation.label()),
            format!(
                "Time: {} thousand years",
                (self.env.elapsed / YEARS_PER_UNIT).floor()
            ),
            depth,
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

    fn lake(formation: LakeFormation, water_flow: f32) -> Lake {
        Lake::new(
            LakeParams {
                formation,
                water_flow,
                time_scale: 3.0,
            },
            EngineConfig::default(),
        )
    }

    #[test]
    fn level_is_monotonic_and_capped() {
        for formation in LakeFormation::ALL {
            let mut l = lake(formation, 10.0);
            let capacity = l.environment().lake_capacity;
            let mut last = 0.0;
            for _ in 0..1500 {
                l.step();
                let level = l.environment().lake_water_level;
                assert!(level >= last, "{formation:?} drained");
                assert!(level <= capacity);
                last = level;
            }
            assert!(last > 0.0, "{formation:?} never filled");
        }
    }

    #[test]
    fn capacity_follows_basin_depth() {
        let l = lake(LakeFormation::Tectonic, 5.0);
        let h = l.canvas().height;
        assert!((l.environment().lake_capacity - (l.lake_bottom() - 0.3 * h)).abs() < 1e-4);
        assert_eq!(
            l.lake_bottom(),
            l.terrain().points.iter().map(|p| p.y).fold(0.0, f32::max)
        );
    }

    #[test]
    fn glacial_lake_waits_for_the_melt() {
        let mut l = lake(LakeFormation::Glacial, 5.0);
        // 16 ticks at time scale 3 is elapsed 48, still frozen.
        for _ in 0..16 {
            l.step();
        }
        assert!(!l.environment().ice_melting());
        assert!(l.particles().is_empty());
        for _ in 0..60 {
            l.step();
            assert!(l.environment().ice_melting());
        }
        assert!(l.environment().ice_sheet.is_some_and(|ice| ice.height < 100.0));
    }

    #[test]
    fn drops_reaching_the_lake_leave_the_particle_system() {
        let mut l = lake(LakeFormation::Tectonic, 10.0);
        for _ in 0..2000 {
            l.step();
        }
        let surface = l.surface();
        let span = l.flooded_span();
        assert!(span.is_some());
        let (lo, hi) = span.unwrap_or_default();
        for p in l.particles().iter() {
            let i = l.terrain().index_at(p.pos.x);
            assert!(!((lo..=hi).contains(&i) && p.pos.y >= surface));
        }
    }

    #[test]
    fn volcanic_crater_latches_after_threshold() {
        let mut l = lake(LakeFormation::Volcanic, 5.0);
        for _ in 0..10 {
            l.step();
        }
        assert!(!l.environment().volcano_active);
        l.step();
        assert!(l.environment().volcano_active);
        l.set_params(LakeParams {
            water_flow: 1.0,
            ..l.params()
        });
        assert!(l.environment().volcano_active);
    }

    #[test]
    fn readouts_report_depth_once_water_collects() {
        let texts = |l: &Lake| {
            let mut f = Frame::new(l.canvas());
            l.compose(&mut f);
            f.texts().into_iter().map(str::to_owned).collect::<Vec<_>>()
        };
        let mut l = lake(LakeFormation::Erosional, 10.0);
        assert!(texts(&l).contains(&"No Lake Yet".to_owned()));
        assert!(texts(&l).contains(&"Formation: Erosional".to_owned()));
        l.step();
        assert!(texts(&l).contains(&"Time: 0 thousand years".to_owned()));
        for _ in 0..1499 {
            l.step();
        }
        assert!(texts(&l).iter().any(|t| t.starts_with("Lake Depth: ")));
        assert!(texts(&l).contains(&"Time: 450 thousand years".to_owned()));
    }

    #[test]
    fn runoff_scours_the_slope() {
        let mut l = lake(LakeFormation::Erosional, 10.0);
        for _ in 0..600 {
            l.step();
        }
        assert!(l.terrain().points.iter().any(|p| p.erosion > 0.0));
        assert!(l.terrain().points.iter().all(|p| p.erosion <= 1.0));
    }
}
