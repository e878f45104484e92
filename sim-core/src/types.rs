use glam::Vec2;

/// Straight-alpha RGBA color, one byte per channel.
///
/// The core never talks to a windowing toolkit; the viewer converts these
/// into its own color type when painting a [`crate::frame::Frame`].
pub type Rgba = [u8; 4];

/// Opaque color from its three channels.
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgba {
    [r, g, b, 255]
}

/// Returns `color` with its alpha replaced by `alpha` in `0.0..=1.0`.
pub fn with_alpha(color: Rgba, alpha: f32) -> Rgba {
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    [color[0], color[1], color[2], a]
}

/// Linear blend between two colors, `t` clamped to `0.0..=1.0`.
pub fn lerp_color(a: Rgba, b: Rgba, t: f32) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2]), mix(a[3], b[3])]
}

/// Size of a drawing surface in canvas pixels.
///
/// Canvas space has its origin in the top-left corner and `y` grows
/// downward, so a terrain "height" is a screen row: larger `y` is lower
/// ground.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// `true` if `p` lies inside `[-margin, width + margin] × [-margin, height + margin]`.
    pub fn contains_with_margin(&self, p: Vec2, margin: f32) -> bool {
        p.x >= -margin
            && p.x <= self.width + margin
            && p.y >= -margin
            && p.y <= self.height + margin
    }
}

impl Default for Canvas {
    /// The 800×450 surface every terrain scenario is laid out on.
    fn default() -> Self {
        Self::new(800.0, 450.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_test_is_inclusive() {
        let canvas = Canvas::new(100.0, 50.0);
        assert!(canvas.contains_with_margin(Vec2::new(-10.0, -10.0), 10.0));
        assert!(canvas.contains_with_margin(Vec2::new(110.0, 60.0), 10.0));
        assert!(!canvas.contains_with_margin(Vec2::new(110.5, 25.0), 10.0));
        assert!(!canvas.contains_with_margin(Vec2::new(50.0, -10.5), 10.0));
    }

    #[test]
    fn lerp_color_hits_both_ends() {
        let a = rgb(0, 0, 0);
        let b = rgb(200, 100, 50);
        assert_eq!(lerp_color(a, b, 0.0), a);
        assert_eq!(lerp_color(a, b, 1.0), b);
        assert_eq!(lerp_color(a, b, 0.5), [100, 50, 25, 255]);
    }

    #[test]
    fn with_alpha_keeps_channels() {
        assert_eq!(with_alpha(rgb(1, 2, 3), 0.5), [1, 2, 3, 128]);
    }
}
