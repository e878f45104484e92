//! Run lifecycle: start, pause, reset, scenario switching, and the frame
//! request handshake with whatever drives the display refresh.
//!
//! The driver asks [`Runner::pending_frame`] for the request to honour and
//! hands it back through [`Runner::on_frame`]. Every reset or switch bumps
//! the [`RunId`], so a request issued for an earlier run can never advance
//! the current one.

use log::{debug, info};

use crate::{
    config::EngineConfig,
    error::ConfigError,
    frame::Frame,
    scenario::{ParamChange, Scenario, ScenarioKind, ScenarioParams, Simulation},
    types::Canvas,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(pub u64);

/// Handle for one scheduled tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameRequest {
    pub run: RunId,
    pub seq: u64,
}

/// Holds at most one outstanding [`FrameRequest`] for the current run.
#[derive(Debug, Default)]
pub struct Scheduler {
    run: RunId,
    next_seq: u64,
    pending: Option<FrameRequest>,
}

impl Scheduler {
    pub fn run(&self) -> RunId {
        self.run
    }

    /// Schedules the next tick, replacing any outstanding request.
    pub fn request(&mut self) -> FrameRequest {
        let req = FrameRequest {
            run: self.run,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.pending = Some(req);
        req
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    /// Starts a new run. Outstanding requests become stale.
    pub fn renew(&mut self) -> RunId {
        self.cancel();
        self.run = RunId(self.run.0 + 1);
        self.next_seq = 0;
        self.run
    }

    /// Consumes `req` if it is the outstanding request. Stale or duplicate
    /// requests return `false`.
    pub fn accept(&mut self, req: FrameRequest) -> bool {
        if self.pending == Some(req) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

/// Owns the active scenario and decides when it ticks.
///
/// ### Fields
/// - `scenario` - The loaded animation.
/// - `cfg` - Engine settings new scenarios are built with.
/// - `scheduler` - Run identity and the outstanding frame request.
/// - `running` - Whether frames are being requested.
/// - `ticks` - Ticks taken in the current run.
#[derive(Debug)]
pub struct Runner {
    scenario: Scenario,
    cfg: EngineConfig,
    scheduler: Scheduler,
    running: bool,
    ticks: u64,
}

impl Runner {
    pub fn new(params: ScenarioParams, cfg: EngineConfig) -> Self {
        Self {
            scenario: Scenario::new(params, cfg),
            cfg,
            scheduler: Scheduler::default(),
            running: false,
            ticks: 0,
        }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn kind(&self) -> ScenarioKind {
        self.scenario.kind()
    }

    pub fn config(&self) -> EngineConfig {
        self.cfg
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn run_id(&self) -> RunId {
        self.scheduler.run()
    }

    pub fn pending_frame(&self) -> Option<FrameRequest> {
        self.scheduler.pending()
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.scheduler.request();
        info!("{} started", self.kind());
    }

    /// Stops requesting frames. State is left exactly as it was.
    pub fn pause(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.scheduler.cancel();
        info!("{} paused after {} ticks", self.kind(), self.ticks);
    }

    pub fn toggle(&mut self) {
        if self.running {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Stops the run and rebuilds the scenario from its current parameters
    /// and seed. Idempotent.
    pub fn reset(&mut self) {
        self.running = false;
        let run = self.scheduler.renew();
        self.scenario.reset();
        self.ticks = 0;
        info!("{} reset (run {})", self.kind(), run.0);
    }

    /// Tears down the current scenario and loads `params` in its place,
    /// stopped.
    pub fn switch(&mut self, params: ScenarioParams) {
        self.running = false;
        let run = self.scheduler.renew();
        self.scenario = Scenario::new(params, self.cfg);
        self.ticks = 0;
        info!("switched to {} (run {})", self.kind(), run.0);
    }

    /// Replaces the engine settings and rebuilds the scenario with them.
    pub fn reconfigure(&mut self, cfg: EngineConfig) {
        if cfg == self.cfg {
            return;
        }
        self.cfg = cfg;
        let params = self.scenario.params();
        self.switch(params);
    }

    /// Honours a frame request: ticks once if `req` is the outstanding
    /// request of the current run, then requests the next frame if still
    /// running. Returns whether a tick happened.
    pub fn on_frame(&mut self, req: FrameRequest) -> bool {
        if !self.running || !self.scheduler.accept(req) {
            return false;
        }
        self.tick();
        self.scheduler.request();
        true
    }

    /// Single manual tick, only while paused.
    pub fn step_once(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.tick();
        true
    }

    fn tick(&mut self) {
        self.scenario.step();
        self.ticks += 1;
    }

    /// Forwards new parameters. A regenerating change starts a new run
    /// without changing whether the runner is running. Out-of-range values
    /// are rejected and leave the scenario untouched.
    pub fn set_params(&mut self, params: ScenarioParams) -> Result<ParamChange, ConfigError> {
        params.validate()?;
        let change = self.scenario.set_params(params);
        if change == ParamChange::Regenerate {
            let run = self.scheduler.renew();
            self.ticks = 0;
            if self.running {
                self.scheduler.request();
            }
            debug!("{} regenerated by parameter change (run {})", self.kind(), run.0);
        }
        Ok(change)
    }

    pub fn resize(&mut self, canvas: Canvas) {
        self.scenario.resize(canvas);
    }

    pub fn canvas(&self) -> Canvas {
        self.scenario.canvas()
    }

    /// Composes the current state into a fresh frame.
    pub fn frame(&self) -> Frame {
        let mut frame = Frame::new(self.scenario.canvas());
        self.scenario.compose(&mut frame);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FloodParams, LakeParams, LandslideParams, SoilType};

    fn flood_runner() -> Runner {
        Runner::new(
            ScenarioParams::Flood(FloodParams {
                rainfall: 10.0,
                ..FloodParams::default()
            }),
            EngineConfig::default(),
        )
    }

    fn pump(r: &mut Runner, frames: usize) {
        for _ in 0..frames {
            if let Some(req) = r.pending_frame() {
                r.on_frame(req);
            }
        }
    }

    #[test]
    fn running_ticks_once_per_frame() {
        let mut r = flood_runner();
        assert!(r.pending_frame().is_none());
        r.start();
        pump(&mut r, 25);
        assert_eq!(r.ticks(), 25);
        assert!(r.pending_frame().is_some());
    }

    #[test]
    fn pause_freezes_elapsed_time() {
        let mut r = flood_runner();
        r.start();
        pump(&mut r, 10);
        let req = r.pending_frame();
        r.pause();
        let elapsed = r.scenario().elapsed();
        pump(&mut r, 10);
        if let Some(req) = req {
            assert!(!r.on_frame(req));
        }
        assert_eq!(r.scenario().elapsed(), elapsed);
        assert!(r.pending_frame().is_none());

        r.start();
        pump(&mut r, 1);
        assert_eq!(r.scenario().elapsed(), elapsed + 1.0);
        assert_eq!(r.ticks(), 11);
    }

    #[test]
    fn reset_empties_particles_and_restores_terrain() {
        let mut r = flood_runner();
        let fresh = match r.scenario() {
            Scenario::Flood(f) => f.terrain().clone(),
            _ => unreachable!(),
        };
        r.start();
        pump(&mut r, 300);
        assert!(r.scenario().particle_count() > 0);

        r.reset();
        assert!(!r.is_running());
        assert_eq!(r.ticks(), 0);
        assert_eq!(r.scenario().particle_count(), 0);
        match r.scenario() {
            Scenario::Flood(f) => assert_eq!(f.terrain(), &fresh),
            _ => unreachable!(),
        }
    }

    #[test]
    fn stale_request_is_ignored_after_reset() {
        let mut r = flood_runner();
        r.start();
        pump(&mut r, 3);
        let stale = r.pending_frame();
        r.reset();
        r.start();
        if let Some(stale) = stale {
            assert!(!r.on_frame(stale));
        }
        assert_eq!(r.ticks(), 0);
        pump(&mut r, 1);
        assert_eq!(r.ticks(), 1);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut r = Runner::new(
            ScenarioParams::Landslide(LandslideParams {
                soil: SoilType::Mixed,
                ..LandslideParams::default()
            }),
            EngineConfig::default(),
        );
        r.start();
        pump(&mut r, 40);
        r.reset();
        let once = r.frame();
        r.reset();
        let twice = r.frame();
        assert_eq!(once.draw_order(), twice.draw_order());
    }

    #[test]
    fn step_once_only_while_paused() {
        let mut r = flood_runner();
        assert!(r.step_once());
        assert_eq!(r.ticks(), 1);
        r.start();
        assert!(!r.step_once());
        assert_eq!(r.ticks(), 1);
    }

    #[test]
    fn switching_scenarios_starts_a_new_stopped_run() {
        let mut r = flood_runner();
        r.start();
        pump(&mut r, 5);
        let before = r.run_id();
        r.switch(ScenarioParams::defaults(ScenarioKind::Mountain));
        assert_eq!(r.kind(), ScenarioKind::Mountain);
        assert!(r.run_id() > before);
        assert!(!r.is_running());
        assert_eq!(r.scenario().elapsed(), 0.0);
    }

    #[test]
    fn regenerating_change_keeps_running() {
        let mut r = Runner::new(
            ScenarioParams::defaults(ScenarioKind::Lake),
            EngineConfig::default(),
        );
        r.start();
        pump(&mut r, 20);
        let before = r.run_id();
        let change = r.set_params(ScenarioParams::Lake(LakeParams {
            formation: crate::config::LakeFormation::Volcanic,
            ..LakeParams::default()
        }));
        assert_eq!(change, Ok(ParamChange::Regenerate));
        assert!(r.is_running());
        assert!(r.run_id() > before);
        assert_eq!(r.ticks(), 0);
        pump(&mut r, 1);
        assert_eq!(r.ticks(), 1);
    }

    #[test]
    fn out_of_range_params_are_rejected() {
        let mut r = flood_runner();
        let before = r.scenario().params();
        let run = r.run_id();
        let result = r.set_params(ScenarioParams::Flood(FloodParams {
            terrain_slope: 45.0,
            ..FloodParams::default()
        }));
        assert!(matches!(
            result,
            Err(ConfigError::OutOfRange { name: "terrain_slope", .. })
        ));
        assert_eq!(r.scenario().params(), before);
        assert_eq!(r.run_id(), run);
    }

    #[test]
    fn scheduler_rejects_duplicates() {
        let mut s = Scheduler::default();
        let req = s.request();
        assert!(s.accept(req));
        assert!(!s.accept(req));
        let replaced = s.request();
        let newest = s.request();
        assert!(!s.accept(replaced));
        assert!(s.accept(newest));
    }
}
