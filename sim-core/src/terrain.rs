//! Procedural height-fields for the terrain scenarios.
//!
//! Everything here is deterministic: the same shape and canvas always give
//! the same samples. Scenarios keep the returned [`Terrain`] as their ground
//! snapshot and regenerate it wholesale when their shape parameters change.

use std::f32::consts::PI;

use glam::Vec2;

use crate::{
    config::{LakeFormation, MountainFormation},
    types::{Canvas, Rgba, rgb},
};

/// Number of samples for the evenly divided shapes (slope, rolling plain).
pub const EVEN_SAMPLES: usize = 100;
/// Horizontal spacing of basin samples.
pub const BASIN_STEP: f32 = 5.0;
/// Basins never reach closer than this to the bottom edge.
const BASIN_FLOOR_MARGIN: f32 = 20.0;

pub const STRATA_COUNT: usize = 5;
const STRATA_STEP: f32 = 10.0;
const STRATA_GAP: f32 = 20.0;
/// Top (youngest) to bottom (oldest).
const STRATA_COLORS: [Rgba; STRATA_COUNT] = [
    rgb(0xF4, 0xA4, 0x60),
    rgb(0xDE, 0xB8, 0x87),
    rgb(0xCD, 0x85, 0x3F),
    rgb(0xA0, 0x52, 0x2D),
    rgb(0x8B, 0x45, 0x13),
];

/// One sample of a terrain silhouette.
///
/// ### Fields
/// - `x` - Horizontal position in canvas pixels.
/// - `y` - Ground height as a canvas row (larger is lower).
/// - `original_y` - Output of the shaping function before clamping.
/// - `saturation` - Water held by the ground, `0.0..=1.0`.
/// - `erosion` - Accumulated scouring by runoff, `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainPoint {
    pub x: f32,
    pub y: f32,
    pub original_y: f32,
    pub saturation: f32,
    pub erosion: f32,
}

/// Ordered left-to-right ground samples with a fixed spacing.
#[derive(Clone, Debug, PartialEq)]
pub struct Terrain {
    pub points: Vec<TerrainPoint>,
    spacing: f32,
}

/// Maps a horizontal position onto a sample index, clamped to `0..len`.
///
/// Particles routinely sit a few pixels outside the canvas, so the lookup
/// must never index past either end.
pub(crate) fn bucket(x: f32, origin: f32, spacing: f32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let i = ((x - origin) / spacing).floor();
    if i.is_nan() || i <= 0.0 {
        0
    } else {
        (i as usize).min(len - 1)
    }
}

impl Terrain {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Index of the sample whose bucket contains `x`.
    pub fn index_at(&self, x: f32) -> usize {
        let origin = self.points.first().map_or(0.0, |p| p.x);
        bucket(x, origin, self.spacing, self.points.len())
    }

    pub fn point_at(&self, x: f32) -> Option<&TerrainPoint> {
        self.points.get(self.index_at(x))
    }

    pub fn point_at_mut(&mut self, x: f32) -> Option<&mut TerrainPoint> {
        let i = self.index_at(x);
        self.points.get_mut(i)
    }

    pub fn height_at(&self, x: f32) -> Option<f32> {
        self.point_at(x).map(|p| p.y)
    }

    /// The deepest sample (largest `y`) and its index.
    pub fn lowest(&self) -> Option<(usize, &TerrainPoint)> {
        self.points
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.y.total_cmp(&b.1.y))
    }

    pub fn mean_saturation(&self) -> f32 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.points.iter().map(|p| p.saturation).sum::<f32>() / self.points.len() as f32
    }

    /// Contiguous run of samples at or below `surface`, grown outward from
    /// `around`. `None` when the sample at `around` is above the surface.
    pub fn submerged_span(&self, surface: f32, around: usize) -> Option<(usize, usize)> {
        let below = |i: usize| self.points.get(i).is_some_and(|p| p.y >= surface);
        if !below(around) {
            return None;
        }
        let mut lo = around;
        while lo > 0 && below(lo - 1) {
            lo -= 1;
        }
        let mut hi = around;
        while below(hi + 1) {
            hi += 1;
        }
        Some((lo, hi))
    }

    pub fn silhouette(&self) -> Vec<Vec2> {
        self.points.iter().map(|p| Vec2::new(p.x, p.y)).collect()
    }
}

/// Shaping rule selecting how [`generate`] lays out the ground.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TerrainShape {
    /// Straight hillside at `angle_deg` with a faint ripple.
    Slope { angle_deg: f32 },
    /// Rolling flood plain tilted by `slope_percent`, pre-wetted to
    /// `saturation` in `0.0..=1.0`.
    Rolling { slope_percent: f32, saturation: f32 },
    /// Lake basin carved by the given process.
    Basin(LakeFormation),
}

/// Samples the ground for `shape` on `canvas`.
///
/// Pure: identical arguments always give identical terrain, and the sample
/// count depends only on the shape family and the canvas width.
pub fn generate(shape: TerrainShape, canvas: Canvas) -> Terrain {
    let (xs, spacing) = match shape {
        TerrainShape::Slope { .. } | TerrainShape::Rolling { .. } => {
            let spacing = canvas.width / EVEN_SAMPLES as f32;
            let xs: Vec<f32> = (0..EVEN_SAMPLES).map(|i| i as f32 * spacing).collect();
            (xs, spacing)
        }
        TerrainShape::Basin(_) => {
            let n = (canvas.width / BASIN_STEP).floor() as usize;
            let xs: Vec<f32> = (0..=n).map(|i| i as f32 * BASIN_STEP).collect();
            (xs, BASIN_STEP)
        }
    };

    let saturation = match shape {
        TerrainShape::Rolling { saturation, .. } => saturation.clamp(0.0, 1.0),
        _ => 0.0,
    };

    let points = xs
        .into_iter()
        .map(|x| {
            let (shaped, limit) = match shape {
                TerrainShape::Slope { angle_deg } => {
                    (slope_height(x, angle_deg, canvas), canvas.height)
                }
                TerrainShape::Rolling { slope_percent, .. } => {
                    (rolling_height(x, slope_percent, canvas), canvas.height)
                }
                TerrainShape::Basin(formation) => (
                    basin_height(formation, x, canvas),
                    canvas.height - BASIN_FLOOR_MARGIN,
                ),
            };
            TerrainPoint {
                x,
                y: shaped.clamp(0.0, limit),
                original_y: shaped,
                saturation,
                erosion: 0.0,
            }
        })
        .collect();

    Terrain { points, spacing }
}

fn slope_height(x: f32, angle_deg: f32, canvas: Canvas) -> f32 {
    let (w, h) = (canvas.width, canvas.height);
    h * 0.3 + (x / w) * angle_deg.to_radians().tan() * h * 0.4 + (x * 0.03).sin() * 3.0
}

fn rolling_height(x: f32, slope_percent: f32, canvas: Canvas) -> f32 {
    let (w, h) = (canvas.width, canvas.height);
    let tilt = (x / w) * slope_percent * 0.01 * h;
    let ripple = ((x * 0.02).sin() + (x * 0.015).cos()) * 20.0;
    (h * 0.7 + tilt + ripple).max(h * 0.4)
}

fn basin_height(formation: LakeFormation, x: f32, canvas: Canvas) -> f32 {
    let (w, h) = (canvas.width, canvas.height);
    match formation {
        LakeFormation::Glacial => {
            let from_center = (x - w / 2.0).abs();
            h * 0.7 + (100.0 - from_center / w * 200.0).max(0.0)
        }
        LakeFormation::Tectonic => {
            if x > w * 0.3 && x < w * 0.7 {
                h * 0.8 + ((x - w * 0.3) / (w * 0.4) * PI).sin() * 50.0
            } else {
                h * 0.7
            }
        }
        LakeFormation::Volcanic => {
            let from_center = (x - w / 2.0).abs();
            if from_center < w * 0.2 {
                h * 0.6 + (from_center / (w * 0.2) * PI / 2.0).cos() * 80.0
            } else {
                h * 0.7
            }
        }
        LakeFormation::Erosional => h * 0.6 + (x * 0.01).sin() * 30.0 + (x / w) * 40.0,
    }
}

/// One rock stratum of the mountain scenario.
///
/// `hardness` is fixed at creation; only the points move.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainLayer {
    pub points: Vec<Vec2>,
    spacing: f32,
    pub color: Rgba,
    pub age: f32,
    hardness: f32,
}

impl TerrainLayer {
    pub fn hardness(&self) -> f32 {
        self.hardness
    }

    pub fn index_at(&self, x: f32) -> usize {
        let origin = self.points.first().map_or(0.0, |p| p.x);
        bucket(x, origin, self.spacing, self.points.len())
    }

    pub fn height_at(&self, x: f32) -> Option<f32> {
        self.points.get(self.index_at(x)).map(|p| p.y)
    }
}

/// Five flat-lying strata, index 0 on top (youngest, softest).
pub fn generate_strata(canvas: Canvas) -> Vec<TerrainLayer> {
    let n = (canvas.width / STRATA_STEP).floor() as usize;
    (0..STRATA_COUNT)
        .map(|i| {
            let base = canvas.height * 0.8 - (STRATA_COUNT - 1 - i) as f32 * STRATA_GAP;
            let points = (0..=n)
                .map(|k| {
                    let x = k as f32 * STRATA_STEP;
                    Vec2::new(x, (base + (x * 0.01).sin() * 5.0).clamp(0.0, canvas.height))
                })
                .collect();
            TerrainLayer {
                points,
                spacing: STRATA_STEP,
                color: STRATA_COLORS[i],
                age: i as f32 * 10.0,
                hardness: 0.5 + i as f32 * 0.1,
            }
        })
        .collect()
}

/// Per-tick uplift intensity for a formation under the given force.
pub fn compression_rate(formation: MountainFormation, force: f32, time_scale: f32) -> f32 {
    let coefficient = match formation {
        MountainFormation::Folding => 0.1,
        MountainFormation::Faulting => 0.05,
        MountainFormation::Volcanic => 0.08,
    };
    coefficient * force * time_scale * 0.01
}

/// Unitless uplift profile at `x`. Positive raises the ground.
pub fn uplift_profile(formation: MountainFormation, x: f32, canvas: Canvas, hardness: f32) -> f32 {
    let w = canvas.width;
    match formation {
        MountainFormation::Folding => (x / w * PI * 4.0).sin() * hardness,
        MountainFormation::Faulting => {
            if x > w / 2.0 {
                1.0
            } else {
                -0.3
            }
        }
        MountainFormation::Volcanic => (1.0 - (x - w / 2.0).abs() / (w * 0.3)).max(0.0),
    }
}

/// Applies one tick of compression to every stratum. Upper layers move
/// the most; heights stay inside the canvas.
pub fn compress(layers: &mut [TerrainLayer], formation: MountainFormation, rate: f32, canvas: Canvas) {
    let count = layers.len();
    for (i, layer) in layers.iter_mut().enumerate() {
        let depth_factor = (count - i) as f32;
        let hardness = layer.hardness;
        for p in &mut layer.points {
            let lift = uplift_profile(formation, p.x, canvas, hardness);
            p.y = (p.y - lift * rate * depth_factor).clamp(0.0, canvas.height);
        }
    }
}
