//! Interactive viewer for the geology and orbital animations, built with
//! eframe/egui.
//!
//! [`Viewer`] owns a [`Runner`] plus the parameters edited in the side
//! panel, and implements [`eframe::App`] to drive the run from the display
//! refresh and paint each composed [`Frame`].

use eframe::App;
use egui::{Color32, Pos2, Rect, Stroke};
use geosim_core::{
    config::{
        EngineConfig, FORCE_RANGE, FloodParams, GROUND_SATURATION_RANGE, LakeFormation,
        LakeParams, LandslideParams, MountainFormation, MountainParams, RAINFALL_RANGE,
        SLOPE_ANGLE_RANGE, SPEED_RANGE, SoilType, SolarParams, TERRAIN_SLOPE_RANGE,
        TIME_SCALE_RANGE, WATER_CONTENT_RANGE,
    },
    frame::{Frame, Shape},
    runner::Runner,
    scenario::{ScenarioKind, ScenarioParams, Simulation},
    types::{Canvas, Rgba},
};
use glam::Vec2;
use log::warn;
use rand::Rng;

/// Placement of the canvas inside the central panel.
///
/// Canvas pixels are scaled uniformly by `scale` and offset so the canvas
/// sits centred in the panel; y points down in both spaces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub rect: Rect,
    pub scale: f32,
}

impl Viewport {
    /// Largest uniformly scaled copy of `canvas` that fits in `avail`.
    pub fn fit(avail: Rect, canvas: Canvas) -> Self {
        let scale = (avail.width() / canvas.width)
            .min(avail.height() / canvas.height)
            .max(f32::EPSILON);
        let size = egui::vec2(canvas.width * scale, canvas.height * scale);
        Self {
            rect: Rect::from_center_size(avail.center(), size),
            scale,
        }
    }

    /// Converts a canvas position to screen space.
    ///
    /// ### Parameters
    /// - `p` - Canvas position in pixels, origin top-left.
    ///
    /// ### Returns
    /// The corresponding egui position in screen space.
    pub fn canvas_to_screen(&self, p: Vec2) -> Pos2 {
        self.rect.min + egui::vec2(p.x, p.y) * self.scale
    }

    /// Inverse of [`Viewport::canvas_to_screen`] (up to rounding).
    pub fn screen_to_canvas(&self, p: Pos2) -> Vec2 {
        let d = (p - self.rect.min) / self.scale;
        Vec2::new(d.x, d.y)
    }
}

fn color(c: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3])
}

/// Paints every shape of `frame` in layer order.
fn paint_frame(painter: &egui::Painter, frame: &Frame, vp: &Viewport) {
    let to_screen = |p: &Vec2| vp.canvas_to_screen(*p);
    for (_, shape) in frame.draw_order() {
        match shape {
            Shape::VerticalGradient {
                min,
                max,
                top,
                bottom,
            } => {
                let (a, b) = (to_screen(min), to_screen(max));
                let mut mesh = egui::Mesh::default();
                mesh.colored_vertex(a, color(*top));
                mesh.colored_vertex(egui::pos2(b.x, a.y), color(*top));
                mesh.colored_vertex(b, color(*bottom));
                mesh.colored_vertex(egui::pos2(a.x, b.y), color(*bottom));
                mesh.add_triangle(0, 1, 2);
                mesh.add_triangle(0, 2, 3);
                painter.add(egui::Shape::mesh(mesh));
            }
            Shape::Rect { min, max, fill } => {
                let rect = Rect::from_two_pos(to_screen(min), to_screen(max));
                painter.rect_filled(rect, 0.0, color(*fill));
            }
            Shape::Circle {
                center,
                radius,
                fill,
            } => {
                painter.circle_filled(to_screen(center), radius * vp.scale, color(*fill));
            }
            Shape::Ring {
                center,
                radius,
                width,
                color: c,
            } => {
                painter.circle_stroke(
                    to_screen(center),
                    radius * vp.scale,
                    Stroke::new(*width, color(*c)),
                );
            }
            Shape::Polyline {
                points,
                width,
                color: c,
                closed,
            } => {
                let pts: Vec<Pos2> = points.iter().map(to_screen).collect();
                let stroke = Stroke::new(width * vp.scale, color(*c));
                if *closed {
                    painter.add(egui::Shape::closed_line(pts, stroke));
                } else {
                    painter.add(egui::Shape::line(pts, stroke));
                }
            }
            Shape::Area { top, bottom, fill } => {
                let fill = color(*fill);
                let mut mesh = egui::Mesh::default();
                for (t, b) in top.iter().zip(bottom) {
                    mesh.colored_vertex(to_screen(t), fill);
                    mesh.colored_vertex(to_screen(b), fill);
                }
                let columns = top.len().min(bottom.len()) as u32;
                for i in 0..columns.saturating_sub(1) {
                    let k = i * 2;
                    mesh.add_triangle(k, k + 1, k + 2);
                    mesh.add_triangle(k + 1, k + 3, k + 2);
                }
                painter.add(egui::Shape::mesh(mesh));
            }
            Shape::Text {
                pos,
                text,
                size,
                color: c,
            } => {
                painter.text(
                    to_screen(pos),
                    egui::Align2::LEFT_BOTTOM,
                    text,
                    egui::FontId::proportional(size * vp.scale),
                    color(*c),
                );
            }
        }
    }
}

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The engine: a [`Runner`] holding the active scenario.
/// - The parameters of all five scenarios, kept while switching so each
///   scenario comes back the way it was left.
/// - eframe/egui callbacks for drawing and user interaction.
///
/// The typical per-frame update is:
/// 1. Build the panels; edits are forwarded to the runner.
/// 2. If a frame request is pending, honour it (one tick).
/// 3. Compose the scenario and paint it into the central panel.
///
/// ### Fields
/// - `runner` - Active scenario and its run lifecycle.
/// - `engine` - Seed, particle cap and cull margin for new scenarios.
///
/// - `landslide`, `flood`, `mountain`, `lake`, `solar` - Per-scenario parameters.
///
/// - `rng` - Source for the "New seed" button.
///
/// - `last_step_time` - Time stamp of the last tick (egui time).
/// - `last_step_dt` - Actual time delta between the last two ticks (for display only).
pub struct Viewer {
    runner: Runner,
    engine: EngineConfig,

    landslide: LandslideParams,
    flood: FloodParams,
    mountain: MountainParams,
    lake: LakeParams,
    solar: SolarParams,

    rng: rand::rngs::ThreadRng,

    last_step_time: f64,
    last_step_dt: f64,
}

impl Viewer {
    /// Creates a stopped viewer showing `kind` with default parameters.
    pub fn new(kind: ScenarioKind) -> Self {
        let engine = EngineConfig::default();
        Self {
            runner: Runner::new(ScenarioParams::defaults(kind), engine),
            engine,
            landslide: LandslideParams::default(),
            flood: FloodParams::default(),
            mountain: MountainParams::default(),
            lake: LakeParams::default(),
            solar: SolarParams::default(),
            rng: rand::rng(),
            last_step_time: 0.0,
            last_step_dt: 0.0,
        }
    }

    fn params_for(&self, kind: ScenarioKind) -> ScenarioParams {
        match kind {
            ScenarioKind::Landslide => ScenarioParams::Landslide(self.landslide),
            ScenarioKind::Flood => ScenarioParams::Flood(self.flood),
            ScenarioKind::Mountain => ScenarioParams::Mountain(self.mountain),
            ScenarioKind::Lake => ScenarioParams::Lake(self.lake),
            ScenarioKind::Solar => ScenarioParams::Solar(self.solar),
        }
    }

    /// Switches to `kind`, stopped, with its remembered parameters.
    fn select(&mut self, kind: ScenarioKind) {
        if kind == self.runner.kind() {
            return;
        }
        self.runner.switch(self.params_for(kind));
        self.last_step_time = 0.0;
    }

    fn reset(&mut self) {
        self.runner.reset();
        self.last_step_time = 0.0;
    }

    fn reset_params(&mut self) {
        match self.runner.kind() {
            ScenarioKind::Landslide => self.landslide = LandslideParams::default(),
            ScenarioKind::Flood => self.flood = FloodParams::default(),
            ScenarioKind::Mountain => self.mountain = MountainParams::default(),
            ScenarioKind::Lake => self.lake = LakeParams::default(),
            ScenarioKind::Solar => self.solar = SolarParams::default(),
        }
    }

    /// Pushes panel edits into the engine. Cheap when nothing changed.
    fn apply_edits(&mut self) {
        self.runner.reconfigure(self.engine);
        if let Err(e) = self.runner.set_params(self.params_for(self.runner.kind())) {
            warn!("ignoring edit: {e}");
        }
    }

    fn record_tick(&mut self, now: f64) {
        if self.last_step_time > 0.0 {
            self.last_step_dt = now - self.last_step_time;
        }
        self.last_step_time = now;
    }

    /// Advances the paused scenario by a single tick.
    fn step_once(&mut self, now: f64) {
        if self.runner.step_once() {
            self.record_tick(now);
        }
    }

    /// Helper to draw a labeled `f32` [`egui::Slider`].
    fn labeled_slider(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        step: f64,
    ) {
        ui.add(egui::Slider::new(value, range).text(label).step_by(step));
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (scenario picker, run controls).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for kind in ScenarioKind::ALL {
                    if ui
                        .selectable_label(self.runner.kind() == kind, kind.title())
                        .clicked()
                    {
                        self.select(kind);
                    }
                }

                ui.separator();

                if ui
                    .button(if self.runner.is_running() {
                        "⏸ Pause"
                    } else {
                        "▶ Run"
                    })
                    .clicked()
                {
                    self.runner.toggle();
                }

                if ui.button("Step").clicked() {
                    let now = ctx.input(|i| i.time);
                    self.step_once(now);
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }
            });
        });
    }

    /// Builds the bottom status bar (run, ticks, time, particles).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                let scenario = self.runner.scenario();
                ui.label(format!("dropped = {}", scenario.dropped_particles()));
                ui.label(format!("particles = {}", scenario.particle_count()));
                ui.label(format!("t = {:.2}", scenario.elapsed()));
                ui.label(format!("ticks = {}", self.runner.ticks()));
                ui.label(format!("run = {}", self.runner.run_id().0));
            });
        });
    }

    fn ui_landslide(&mut self, ui: &mut egui::Ui) {
        let p = &mut self.landslide;
        Self::labeled_slider(ui, "Slope angle (°)", &mut p.slope_angle, SLOPE_ANGLE_RANGE, 1.0);
        Self::labeled_slider(ui, "Water content (%)", &mut p.water_content, WATER_CONTENT_RANGE, 1.0);
        egui::ComboBox::from_label("Soil type")
            .selected_text(p.soil.label())
            .show_ui(ui, |ui| {
                for soil in SoilType::ALL {
                    ui.selectable_value(&mut p.soil, soil, soil.label());
                }
            });
    }

    fn ui_flood(&mut self, ui: &mut egui::Ui) {
        let p = &mut self.flood;
        Self::labeled_slider(ui, "Rainfall intensity", &mut p.rainfall, RAINFALL_RANGE, 1.0);
        Self::labeled_slider(ui, "Terrain slope (%)", &mut p.terrain_slope, TERRAIN_SLOPE_RANGE, 1.0);
        Self::labeled_slider(
            ui,
            "Ground saturation (%)",
            &mut p.ground_saturation,
            GROUND_SATURATION_RANGE,
            1.0,
        );
    }

    fn ui_mountain(&mut self, ui: &mut egui::Ui) {
        let p = &mut self.mountain;
        egui::ComboBox::from_label("Formation")
            .selected_text(p.formation.label())
            .show_ui(ui, |ui| {
                for formation in MountainFormation::ALL {
                    ui.selectable_value(&mut p.formation, formation, formation.label());
                }
            });
        Self::labeled_slider(ui, "Compression force", &mut p.compression_force, FORCE_RANGE, 1.0);
        Self::labeled_slider(ui, "Time scale", &mut p.time_scale, TIME_SCALE_RANGE, 1.0);
    }

    fn ui_lake(&mut self, ui: &mut egui::Ui) {
        let p = &mut self.lake;
        egui::ComboBox::from_label("Formation")
            .selected_text(p.formation.label())
            .show_ui(ui, |ui| {
                for formation in LakeFormation::ALL {
                    ui.selectable_value(&mut p.formation, formation, formation.label());
                }
            });
        Self::labeled_slider(ui, "Water flow", &mut p.water_flow, FORCE_RANGE, 1.0);
        Self::labeled_slider(ui, "Time scale", &mut p.time_scale, TIME_SCALE_RANGE, 1.0);
    }

    fn ui_solar(&mut self, ui: &mut egui::Ui) {
        let p = &mut self.solar;
        Self::labeled_slider(ui, "Speed", &mut p.speed_multiplier, SPEED_RANGE, 0.1);
        ui.checkbox(&mut p.show_orbits, "Show orbits");
    }

    /// Builds the right-hand configuration panel for the active scenario
    /// and the engine settings.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                let kind = self.runner.kind();
                ui.heading(kind.title());

                ui.separator();
                match kind {
                    ScenarioKind::Landslide => self.ui_landslide(ui),
                    ScenarioKind::Flood => self.ui_flood(ui),
                    ScenarioKind::Mountain => self.ui_mountain(ui),
                    ScenarioKind::Lake => self.ui_lake(ui),
                    ScenarioKind::Solar => self.ui_solar(ui),
                }

                ui.separator();
                if ui.button("Reset params to default").clicked() {
                    self.reset_params();
                }

                ui.separator();
                ui.label("Engine");
                ui.horizontal(|ui| {
                    ui.label("seed:");
                    ui.add(egui::DragValue::new(&mut self.engine.seed).speed(1.0));
                    if ui.button("New seed").clicked() {
                        self.engine.seed = self.rng.random();
                    }
                });

                let mut capped = self.engine.particle_cap.is_some();
                ui.checkbox(&mut capped, "Cap particles");
                match (capped, self.engine.particle_cap) {
                    (true, None) => {
                        self.engine.particle_cap = Some(EngineConfig::default().particle_cap.unwrap_or(4000));
                    }
                    (false, Some(_)) => self.engine.particle_cap = None,
                    _ => {}
                }
                if let Some(cap) = self.engine.particle_cap.as_mut() {
                    Self::labeled_drag_usize(ui, "particle_cap:", cap, 100..=20_000, 10.0);
                }
            });
    }

    /// Builds the central panel: drives pending frames and paints the scenario.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::hover());
            let avail = response.rect;

            // The solar system fills the panel; terrain scenarios keep their canvas.
            if self.runner.kind() == ScenarioKind::Solar {
                let canvas = Canvas::new(avail.width().max(1.0), avail.height().max(1.0));
                if canvas != self.runner.canvas() {
                    self.runner.resize(canvas);
                }
            }

            if let Some(req) = self.runner.pending_frame() {
                let now = ctx.input(|i| i.time);
                if self.runner.on_frame(req) {
                    self.record_tick(now);
                }
                ctx.request_repaint();
            }

            let vp = Viewport::fit(avail, self.runner.canvas());
            let painter = ui.painter_at(avail);
            painter.rect_filled(avail, 0.0, Color32::from_gray(24));
            paint_frame(&painter, &self.runner.frame(), &vp);

            if let Some(hover) = response.hover_pos()
                && vp.rect.contains(hover)
            {
                let p = vp.screen_to_canvas(hover);
                painter.text(
                    vp.rect.left_bottom() + egui::vec2(6.0, -6.0),
                    egui::Align2::LEFT_BOTTOM,
                    format!("({:.0}, {:.0})", p.x, p.y),
                    egui::FontId::monospace(12.0),
                    Color32::from_white_alpha(160),
                );
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.apply_edits();
        self.ui_central_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rect() -> Rect {
        Rect::from_min_size(Pos2::new(0.0, 0.0), egui::vec2(1000.0, 1000.0))
    }

    #[test]
    fn canvas_to_screen_and_back_is_roundtrip() {
        let vp = Viewport::fit(test_rect(), Canvas::default());
        let eps = 1e-3;
        for p in [
            Vec2::new(0.0, 0.0),
            Vec2::new(800.0, 450.0),
            Vec2::new(123.5, 77.25),
        ] {
            let back = vp.screen_to_canvas(vp.canvas_to_screen(p));
            assert!(
                (back - p).length() < eps,
                "roundtrip mismatch: p={p:?}, back={back:?}"
            );
        }
    }

    #[test]
    fn fit_letterboxes_and_centres_the_canvas() {
        let vp = Viewport::fit(test_rect(), Canvas::default());
        assert!((vp.scale - 1.25).abs() < 1e-6);
        assert!((vp.rect.width() - 1000.0).abs() < 1e-3);
        assert!((vp.rect.height() - 562.5).abs() < 1e-3);
        assert!((vp.rect.center().y - 500.0).abs() < 1e-3);
        assert_eq!(vp.canvas_to_screen(Vec2::ZERO), vp.rect.min);
    }

    #[test]
    fn select_switches_and_stops() {
        let mut viewer = Viewer::new(ScenarioKind::Flood);
        viewer.runner.start();
        viewer.select(ScenarioKind::Lake);
        assert_eq!(viewer.runner.kind(), ScenarioKind::Lake);
        assert!(!viewer.runner.is_running());
    }

    #[test]
    fn edits_reach_the_running_scenario() {
        let mut viewer = Viewer::new(ScenarioKind::Mountain);
        viewer.runner.start();
        viewer.mountain.formation = MountainFormation::Volcanic;
        viewer.apply_edits();
        assert_eq!(
            viewer.runner.scenario().params(),
            ScenarioParams::Mountain(viewer.mountain)
        );
        assert!(viewer.runner.is_running());
    }

    #[test]
    fn reset_params_restores_defaults_for_active_scenario() {
        let mut viewer = Viewer::new(ScenarioKind::Landslide);
        viewer.landslide.slope_angle = 55.0;
        viewer.flood.rainfall = 9.0;
        viewer.reset_params();
        assert_eq!(viewer.landslide, LandslideParams::default());
        assert_eq!(viewer.flood.rainfall, 9.0);
    }

    #[test]
    fn step_is_ignored_while_running_and_reset_stops() {
        let mut viewer = Viewer::new(ScenarioKind::Solar);
        viewer.step_once(1.0);
        assert_eq!(viewer.runner.ticks(), 1);
        viewer.runner.start();
        viewer.step_once(2.0);
        assert_eq!(viewer.runner.ticks(), 1);
        viewer.reset();
        assert!(!viewer.runner.is_running());
        assert_eq!(viewer.runner.ticks(), 0);
        assert_eq!(viewer.runner.scenario().elapsed(), 0.0);
    }

    #[test]
    fn engine_edits_rebuild_the_scenario() {
        let mut viewer = Viewer::new(ScenarioKind::Landslide);
        let before = viewer.runner.run_id();
        viewer.engine.seed = 7;
        viewer.apply_edits();
        assert_eq!(viewer.runner.config().seed, 7);
        assert!(viewer.runner.run_id() > before);
    }
}
