use glam::Vec2;

use super::{ParamChange, Simulation};
use crate::{
    config::SolarParams,
    frame::{Frame, Layer, Shape, ellipse_points},
    orbit::{self, PLANETS, SUN_RADIUS, TICK_TIME},
    types::{Canvas, rgb, with_alpha},
};

const RING_SEGMENTS: usize = 48;

/// The eight planets and their moons on circular orbits around the
/// centre of the canvas. Fills whatever surface it is given.
#[derive(Debug, Clone)]
pub struct SolarSystem {
    params: SolarParams,
    canvas: Canvas,
    time: f32,
}

impl SolarSystem {
    pub fn new(params: SolarParams, canvas: Canvas) -> Self {
        Self {
            params: params.clamped(),
            canvas,
            time: 0.0,
        }
    }

    pub fn params(&self) -> SolarParams {
        self.params
    }

    /// Nothing here shapes terrain, so every change is live.
    pub fn set_params(&mut self, params: SolarParams) -> ParamChange {
        let params = params.clamped();
        if params == self.params {
            return ParamChange::Unchanged;
        }
        self.params = params;
        ParamChange::Live
    }
}

impl Simulation for SolarSystem {
    fn step(&mut self) {
        self.time += TICK_TIME * self.params.speed_multiplier;
    }

    fn compose(&self, frame: &mut Frame) {
        let (w, h) = (self.canvas.width, self.canvas.height);
        let center = self.canvas.center();
        let orbits = self.params.show_orbits;

        frame.gradient(Vec2::ZERO, Vec2::new(w, h), rgb(0x00, 0x00, 0x11), rgb(0x00, 0x00, 0x33));

        if orbits {
            for body in &PLANETS {
                frame.push(
                    Layer::Background,
                    Shape::Ring {
                        center,
                        radius: body.orbit_radius,
                        width: 1.0,
                        color: [255, 255, 255, 26],
                    },
                );
            }
        }

        frame.radial(
            Layer::Particles,
            center,
            SUN_RADIUS,
            &[
                (0.0, rgb(0xFF, 0xD7, 0x00)),
                (0.7, rgb(0xFF, 0xA5, 0x00)),
                (1.0, rgb(0xFF, 0x45, 0x00)),
            ],
            8,
        );

        for placement in orbit::place_all(self.time, center) {
            let body = placement.body;
            let pos = placement.pos;

            if body.ringed {
                for radii in [
                    Vec2::new(body.size + 8.0, body.size + 4.0),
                    Vec2::new(body.size + 12.0, body.size + 6.0),
                ] {
                    frame.push(
                        Layer::Particles,
                        Shape::Polyline {
                            points: ellipse_points(pos, radii, placement.spin, RING_SEGMENTS),
                            width: 2.0,
                            color: [0xC8, 0xB2, 0x8A, 0xB0],
                            closed: true,
                        },
                    );
                }
            }

            frame.circle(Layer::Particles, pos, body.size + 3.0, with_alpha(body.color, 0.3));
            frame.circle(Layer::Particles, pos, body.size, body.color);
            let marker = pos + Vec2::from_angle(placement.spin) * body.size;
            frame.line(Layer::Particles, vec![pos, marker], 1.0, [0, 0, 0, 90]);

            for (moon, moon_pos) in body.satellites.iter().zip(&placement.moons) {
                if orbits {
                    frame.push(
                        Layer::Background,
                        Shape::Ring {
                            center: pos,
                            radius: moon.orbit_radius,
                            width: 0.5,
                            color: [255, 255, 255, 20],
                        },
                    );
                }
                frame.circle(Layer::Particles, *moon_pos, moon.size, moon.color);
            }

            frame.text(
                Layer::Overlays,
                pos + Vec2::new(-body.size, body.size + 12.0),
                body.name,
                10.0,
                [255, 255, 255, 180],
            );
        }

        frame.text(
            Layer::Readouts,
            Vec2::new(10.0, 30.0),
            format!("Speed: {:.1}x", self.params.speed_multiplier),
            14.0,
            [255, 255, 255, 204],
        );
    }

    fn reset(&mut self) {
        self.time = 0.0;
    }

    fn elapsed(&self) -> f32 {
        self.time
    }

    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn resize(&mut self, canvas: Canvas) {
        self.canvas = canvas;
    }
}
