//! Headless engine for the geology and orbital animations.
//!
//! Main components:
//! - [`terrain`] - procedural height-fields and mountain strata.
//! - [`particle`] - particle population with spawn, integrate and cull.
//! - [`environment`] - saturation, lake level, ice, volcano latch and risk.
//! - [`orbit`] - closed-form planet and moon positions.
//! - [`frame`] - layered draw list the viewer paints.
//! - [`scenario`] - the five animations built on the pieces above.
//! - [`runner`] - run lifecycle and frame scheduling.
//! - [`config`] - parameter structs, ranges and engine settings.

pub mod config;
pub mod environment;
pub mod error;
pub mod frame;
pub mod orbit;
pub mod particle;
pub mod rng;
pub mod runner;
pub mod scenario;
pub mod terrain;
pub mod types;
