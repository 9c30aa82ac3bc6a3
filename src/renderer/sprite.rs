//! Sprite descriptors and the atlas lookup table

use super::vertex::colors;

/// Pixel-space rectangle inside the texture atlas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasRegion {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl AtlasRegion {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// Sprite definitions in `graphics.png`
pub mod atlas {
    use super::AtlasRegion;

    pub const PADDLE: AtlasRegion = AtlasRegion::new(0.0, 0.0, 64.0, 16.0);
    pub const BALL: AtlasRegion = AtlasRegion::new(0.0, 16.0, 16.0, 16.0);
    /// Debug contact markers reuse the ball image, drawn small and tinted
    pub const MARKER: AtlasRegion = BALL;
    pub const MARKER_SIZE: f32 = 4.0;
}

/// One quad to draw this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub region: AtlasRegion,
    pub color: [f32; 4],
}

impl Sprite {
    /// Untinted sprite at its atlas size
    pub fn new(x: f32, y: f32, region: AtlasRegion) -> Self {
        Self {
            x,
            y,
            w: region.w,
            h: region.h,
            region,
            color: colors::WHITE,
        }
    }

    pub fn with_size(mut self, w: f32, h: f32) -> Self {
        self.w = w;
        self.h = h;
        self
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }
}
