//! 2x2 linear transform for sprite corners and paddle geometry
//!
//! Composition is right-multiplication: after
//! `m.load_identity().rotate(a).scale(sx, sy)`, a transformed point is
//! scaled first and rotated second. The matrix is linear only; callers add
//! any translation themselves after `transform`.

use glam::{Mat2, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteMatrix {
    m: Mat2,
}

impl Default for SpriteMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl SpriteMatrix {
    pub const fn identity() -> Self {
        Self { m: Mat2::IDENTITY }
    }

    /// Build from row-major storage `[m00, m01, m10, m11]`
    pub fn from_rows(rows: [f32; 4]) -> Self {
        Self {
            m: Mat2::from_cols_array(&[rows[0], rows[2], rows[1], rows[3]]),
        }
    }

    /// Row-major storage `[m00, m01, m10, m11]`
    pub fn rows(&self) -> [f32; 4] {
        let [c0, c1] = self.m.to_cols_array_2d();
        [c0[0], c1[0], c0[1], c1[1]]
    }

    /// Pure rotation by `degrees`
    pub fn from_rotation(degrees: f32) -> Self {
        let mut m = Self::identity();
        m.rotate(degrees);
        m
    }

    pub fn load_identity(&mut self) -> &mut Self {
        self.m = Mat2::IDENTITY;
        self
    }

    /// `self = self * other`; `other` acts on points first
    pub fn multiply(&mut self, other: &SpriteMatrix) -> &mut Self {
        self.m *= other.m;
        self
    }

    pub fn rotate(&mut self, degrees: f32) -> &mut Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        self.multiply(&Self::from_rows([cos, -sin, sin, cos]))
    }

    pub fn scale(&mut self, x: f32, y: f32) -> &mut Self {
        self.multiply(&Self::from_rows([x, 0.0, 0.0, y]))
    }

    pub fn shear(&mut self, x: f32, y: f32) -> &mut Self {
        self.multiply(&Self::from_rows([1.0, x, y, 1.0]))
    }

    /// Apply the linear part to a point
    #[inline]
    pub fn transform(&self, point: Vec2) -> Vec2 {
        self.m * point
    }
}
