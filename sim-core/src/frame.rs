//! Frame compositor: a toolkit-neutral draw list with a fixed z-order.
//!
//! Scenarios push shapes tagged with a [`Layer`] in whatever order is
//! convenient; [`Frame::draw_order`] hands them back sorted by layer, and
//! within a layer in push order. Painting the list is the viewer's job.

use std::f32::consts::TAU;

use glam::Vec2;

use crate::types::{Canvas, Rgba, lerp_color};

/// Z-order of a frame, back to front.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Background,
    Terrain,
    LayerBoundaries,
    WaterBody,
    Particles,
    Overlays,
    Readouts,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Axis-aligned rectangle blending from `top` to `bottom`.
    VerticalGradient {
        min: Vec2,
        max: Vec2,
        top: Rgba,
        bottom: Rgba,
    },
    Rect {
        min: Vec2,
        max: Vec2,
        fill: Rgba,
    },
    Circle {
        center: Vec2,
        radius: f32,
        fill: Rgba,
    },
    Ring {
        center: Vec2,
        radius: f32,
        width: f32,
        color: Rgba,
    },
    Polyline {
        points: Vec<Vec2>,
        width: f32,
        color: Rgba,
        closed: bool,
    },
    /// The band between two polylines sampled at the same x positions.
    /// `top[i]` and `bottom[i]` share an x; painted as one quad per segment.
    Area {
        top: Vec<Vec2>,
        bottom: Vec<Vec2>,
        fill: Rgba,
    },
    /// `pos` is the left end of the text baseline.
    Text {
        pos: Vec2,
        text: String,
        size: f32,
        color: Rgba,
    },
}

const READOUT_ORIGIN: Vec2 = Vec2::new(10.0, 30.0);
const READOUT_LINE: f32 = 20.0;
const READOUT_SIZE: f32 = 14.0;
const READOUT_COLOR: Rgba = [0, 0, 0, 204];

#[derive(Clone, Debug, Default)]
pub struct Frame {
    pub width: f32,
    pub height: f32,
    items: Vec<(Layer, Shape)>,
}

impl Frame {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            items: Vec::with_capacity(512),
        }
    }

    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, layer: Layer, shape: Shape) {
        self.items.push((layer, shape));
    }

    /// Shapes in painting order: by layer, then by push order.
    pub fn draw_order(&self) -> Vec<(Layer, &Shape)> {
        let mut out: Vec<(Layer, &Shape)> = self.items.iter().map(|(l, s)| (*l, s)).collect();
        out.sort_by_key(|(l, _)| *l);
        out
    }

    pub fn shapes_in(&self, layer: Layer) -> impl Iterator<Item = &Shape> {
        self.items
            .iter()
            .filter(move |(l, _)| *l == layer)
            .map(|(_, s)| s)
    }

    /// Every text string on the frame, in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.draw_order()
            .into_iter()
            .filter_map(|(_, s)| match s {
                Shape::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn rect(&mut self, layer: Layer, min: Vec2, max: Vec2, fill: Rgba) {
        self.push(layer, Shape::Rect { min, max, fill });
    }

    pub fn circle(&mut self, layer: Layer, center: Vec2, radius: f32, fill: Rgba) {
        self.push(
            layer,
            Shape::Circle {
                center,
                radius,
                fill,
            },
        );
    }

    pub fn line(&mut self, layer: Layer, points: Vec<Vec2>, width: f32, color: Rgba) {
        self.push(
            layer,
            Shape::Polyline {
                points,
                width,
                color,
                closed: false,
            },
        );
    }

    pub fn gradient(&mut self, min: Vec2, max: Vec2, top: Rgba, bottom: Rgba) {
        self.push(
            Layer::Background,
            Shape::VerticalGradient {
                min,
                max,
                top,
                bottom,
            },
        );
    }

    /// Fills the area under `silhouette` down to row `floor`.
    pub fn fill_under(&mut self, layer: Layer, silhouette: Vec<Vec2>, floor: f32, fill: Rgba) {
        let bottom = silhouette.iter().map(|p| Vec2::new(p.x, floor)).collect();
        self.push(
            layer,
            Shape::Area {
                top: silhouette,
                bottom,
                fill,
            },
        );
    }

    pub fn text(&mut self, layer: Layer, pos: Vec2, text: impl Into<String>, size: f32, color: Rgba) {
        self.push(
            layer,
            Shape::Text {
                pos,
                text: text.into(),
                size,
                color,
            },
        );
    }

    /// Stacks readout lines in the top-left corner.
    pub fn readouts<S: Into<String>>(&mut self, lines: impl IntoIterator<Item = S>) {
        for (i, line) in lines.into_iter().enumerate() {
            let pos = READOUT_ORIGIN + Vec2::new(0.0, i as f32 * READOUT_LINE);
            self.text(Layer::Readouts, pos, line, READOUT_SIZE, READOUT_COLOR);
        }
    }

    /// Radial gradient approximated by concentric discs, outermost first.
    /// `stops` are `(offset, color)` pairs with offsets ascending in `0..=1`.
    pub fn radial(&mut self, layer: Layer, center: Vec2, radius: f32, stops: &[(f32, Rgba)], rings: usize) {
        for k in (1..=rings).rev() {
            let t = k as f32 / rings as f32;
            self.circle(layer, center, radius * t, sample_stops(stops, t));
        }
    }
}

fn sample_stops(stops: &[(f32, Rgba)], t: f32) -> Rgba {
    let Some(&(_, first)) = stops.first() else {
        return [0, 0, 0, 0];
    };
    let mut color = first;
    for pair in stops.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t >= t0 {
            color = if t1 > t0 {
                lerp_color(c0, c1, (t - t0) / (t1 - t0))
            } else {
                c1
            };
        }
    }
    color
}

/// Closed outline of an ellipse with radii `radii`, rotated by `rotation`.
pub fn ellipse_points(center: Vec2, radii: Vec2, rotation: f32, segments: usize) -> Vec<Vec2> {
    let rot = Vec2::from_angle(rotation);
    (0..segments)
        .map(|i| {
            let a = i as f32 / segments as f32 * TAU;
            center + rot.rotate(Vec2::new(a.cos() * radii.x, a.sin() * radii.y))
        })
        .collect()
}
