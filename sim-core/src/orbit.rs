//! Closed-form orbital positions for the solar system view.
//!
//! Positions are a pure function of simulated time `t`: no integration and
//! no history, so any `t` can be evaluated directly and a run restarts
//! exactly by setting `t` back to zero.

use std::f32::consts::TAU;

use glam::Vec2;

use crate::types::{Rgba, rgb};

/// Orbit angle per unit of `t * orbit_speed`.
pub const ORBIT_ANGLE_SCALE: f32 = 0.01;
/// Spin angle per unit of `t * rotation_speed`.
pub const SPIN_SCALE: f32 = 0.1;
/// Simulated time added per tick at 1x speed.
pub const TICK_TIME: f32 = 0.016;
pub const SUN_RADIUS: f32 = 25.0;

#[derive(Debug, PartialEq)]
pub struct Moon {
    pub name: &'static str,
    pub orbit_radius: f32,
    pub size: f32,
    pub color: Rgba,
    pub orbit_speed: f32,
}

/// A planet in the static catalog. Never mutated at runtime.
#[derive(Debug, PartialEq)]
pub struct CelestialBody {
    pub name: &'static str,
    pub orbit_radius: f32,
    pub size: f32,
    pub color: Rgba,
    pub orbit_speed: f32,
    pub rotation_speed: f32,
    pub ringed: bool,
    pub satellites: &'static [Moon],
}

const fn moon(name: &'static str, orbit_radius: f32, size: f32, color: Rgba, orbit_speed: f32) -> Moon {
    Moon {
        name,
        orbit_radius,
        size,
        color,
        orbit_speed,
    }
}

const GREY_BROWN: Rgba = rgb(0x8C, 0x78, 0x53);
const SILVER: Rgba = rgb(0xC0, 0xC0, 0xC0);

pub static PLANETS: [CelestialBody; 8] = [
    CelestialBody {
        name: "Mercury",
        orbit_radius: 80.0,
        size: 4.0,
        color: GREY_BROWN,
        orbit_speed: 4.15,
        rotation_speed: 0.017,
        ringed: false,
        satellites: &[],
    },
    CelestialBody {
        name: "Venus",
        orbit_radius: 110.0,
        size: 7.0,
        color: rgb(0xFF, 0xC6, 0x49),
        orbit_speed: 1.62,
        rotation_speed: -0.004,
        ringed: false,
        satellites: &[],
    },
    CelestialBody {
        name: "Earth",
        orbit_radius: 150.0,
        size: 8.0,
        color: rgb(0x6B, 0x93, 0xD6),
        orbit_speed: 1.0,
        rotation_speed: 1.0,
        ringed: false,
        satellites: &[moon("Moon", 15.0, 2.0, SILVER, 13.4)],
    },
    CelestialBody {
        name: "Mars",
        orbit_radius: 200.0,
        size: 6.0,
        color: rgb(0xCD, 0x5C, 0x5C),
        orbit_speed: 0.53,
        rotation_speed: 0.97,
        ringed: false,
        satellites: &[
            moon("Phobos", 12.0, 1.0, GREY_BROWN, 7.6),
            moon("Deimos", 18.0, 1.0, GREY_BROWN, 1.3),
        ],
    },
    CelestialBody {
        name: "Jupiter",
        orbit_radius: 280.0,
        size: 20.0,
        color: rgb(0xD8, 0xCA, 0x9D),
        orbit_speed: 0.084,
        rotation_speed: 2.4,
        ringed: false,
        satellites: &[
            moon("Io", 30.0, 2.0, rgb(0xFF, 0xFF, 0x99), 17.3),
            moon("Europa", 35.0, 2.0, rgb(0x87, 0xCE, 0xEB), 8.5),
            moon("Ganymede", 40.0, 3.0, GREY_BROWN, 4.3),
            moon("Callisto", 45.0, 3.0, rgb(0x69, 0x69, 0x69), 2.4),
        ],
    },
    CelestialBody {
        name: "Saturn",
        orbit_radius: 380.0,
        size: 18.0,
        color: rgb(0xFA, 0xD5, 0xA5),
        orbit_speed: 0.034,
        rotation_speed: 2.3,
        ringed: true,
        satellites: &[
            moon("Titan", 35.0, 3.0, rgb(0xFF, 0xA5, 0x00), 6.2),
            moon("Enceladus", 25.0, 1.0, rgb(0xF0, 0xF8, 0xFF), 32.9),
        ],
    },
    CelestialBody {
        name: "Uranus",
        orbit_radius: 480.0,
        size: 14.0,
        color: rgb(0x4F, 0xD0, 0xE7),
        orbit_speed: 0.012,
        rotation_speed: -1.4,
        ringed: false,
        satellites: &[moon("Miranda", 20.0, 1.0, SILVER, 13.5)],
    },
    CelestialBody {
        name: "Neptune",
        orbit_radius: 580.0,
        size: 14.0,
        color: rgb(0x4B, 0x70, 0xDD),
        orbit_speed: 0.006,
        rotation_speed: 1.5,
        ringed: false,
        satellites: &[moon("Triton", 25.0, 2.0, rgb(0xFF, 0xB6, 0xC1), -5.9)],
    },
];

/// Point on a circular orbit of `radius` around `center` at time `t`.
#[inline]
pub fn orbit_position(center: Vec2, radius: f32, orbit_speed: f32, t: f32) -> Vec2 {
    let angle = t * orbit_speed * ORBIT_ANGLE_SCALE;
    center + Vec2::new(angle.cos(), angle.sin()) * radius
}

#[inline]
pub fn spin_angle(rotation_speed: f32, t: f32) -> f32 {
    t * rotation_speed * SPIN_SCALE
}

/// Time for one full orbit at `orbit_speed`.
pub fn orbital_period(orbit_speed: f32) -> f32 {
    TAU / (orbit_speed.abs() * ORBIT_ANGLE_SCALE)
}

/// Where a body and its satellites sit at one instant.
#[derive(Debug, Clone)]
pub struct Placement {
    pub body: &'static CelestialBody,
    pub pos: Vec2,
    pub spin: f32,
    /// Same order as `body.satellites`.
    pub moons: Vec<Vec2>,
}

/// Places every catalog body at time `t`, orbiting `center`. Satellites
/// orbit their parent's current position, not `center`.
pub fn place_all(t: f32, center: Vec2) -> Vec<Placement> {
    PLANETS
        .iter()
        .map(|body| {
            let pos = orbit_position(center, body.orbit_radius, body.orbit_speed, t);
            let moons = body
                .satellites
                .iter()
                .map(|m| orbit_position(pos, m.orbit_radius, m.orbit_speed, t))
                .collect();
            Placement {
                body,
                pos,
                spin: spin_angle(body.rotation_speed, t),
                moons,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2, eps: f32) -> bool {
        (a - b).length() < eps
    }

    #[test]
    fn position_is_periodic() {
        let center = Vec2::new(400.0, 300.0);
        for body in &PLANETS {
            let period = orbital_period(body.orbit_speed);
            let t = 12.5;
            let a = orbit_position(center, body.orbit_radius, body.orbit_speed, t);
            let b = orbit_position(center, body.orbit_radius, body.orbit_speed, t + period);
            // Large periods lose precision in f32; allow a pixel-scale slack.
            assert!(
                close(a, b, body.orbit_radius * 1e-3),
                "{} drifted: {a:?} vs {b:?}",
                body.name
            );
        }
    }

    #[test]
    fn earth_period_matches_closed_form() {
        let period = orbital_period(1.0);
        assert!((period - TAU / 0.01).abs() < 1e-2);
        let center = Vec2::ZERO;
        let start = orbit_position(center, 150.0, 1.0, 0.0);
        let half = orbit_position(center, 150.0, 1.0, period / 2.0);
        assert!(close(start, Vec2::new(150.0, 0.0), 1e-4));
        assert!(close(half, Vec2::new(-150.0, 0.0), 1e-2));
    }

    #[test]
    fn bodies_stay_on_their_circle() {
        let center = Vec2::new(10.0, -20.0);
        for p in place_all(987.0, center) {
            let r = (p.pos - center).length();
            assert!((r - p.body.orbit_radius).abs() < 1e-2, "{}", p.body.name);
        }
    }

    #[test]
    fn moons_orbit_their_parent() {
        let center = Vec2::new(640.0, 360.0);
        let placements = place_all(321.0, center);
        let jupiter = placements.iter().find(|p| p.body.name == "Jupiter").unwrap();
        assert_eq!(jupiter.moons.len(), 4);
        for (moon, pos) in jupiter.body.satellites.iter().zip(&jupiter.moons) {
            let r = (*pos - jupiter.pos).length();
            assert!((r - moon.orbit_radius).abs() < 1e-2, "{}", moon.name);
        }
    }

    #[test]
    fn placement_is_a_pure_function_of_time() {
        let center = Vec2::new(1.0, 2.0);
        let a = place_all(42.0, center);
        let b = place_all(42.0, center);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.spin, y.spin);
            assert_eq!(x.moons, y.moons);
        }
    }

    #[test]
    fn spin_is_linear_in_time() {
        assert_eq!(spin_angle(2.0, 0.0), 0.0);
        assert!((spin_angle(2.0, 10.0) - 2.0).abs() < 1e-6);
        assert!((spin_angle(-1.4, 10.0) + 1.4).abs() < 1e-6);
    }
}
