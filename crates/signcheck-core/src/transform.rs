use serde::{Deserialize, Serialize};

use crate::geom::Vec2;
use crate::path::{PathSeg, SubPath};

/// Row-major 2x3 affine transform matching the SVG matrix(a b c d e f) form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2D {
    pub const fn identity() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 }
    }

    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: tx, f: ty }
    }

    pub const fn scaling(sx: f64, sy: f64) -> Self {
        Self { a: sx, b: 0.0, c: 0.0, d: sy, e: 0.0, f: 0.0 }
    }

    pub fn is_identity(&self) -> bool {
        (self.a - 1.0).abs() < 1e-12
            && self.b.abs() < 1e-12
            && self.c.abs() < 1e-12
            && (self.d - 1.0).abs() < 1e-12
            && self.e.abs() < 1e-12
            && self.f.abs() < 1e-12
    }

    /// self ∘ other: applies `other` first, then `self`.
    pub fn mul(&self, other: &Transform2D) -> Transform2D {
        Transform2D {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn apply_subpath(&self, sub: &SubPath) -> SubPath {
        SubPath {
            start: self.apply_point(sub.start),
            segs: sub
                .segs
                .iter()
                .map(|seg| match *seg {
                    PathSeg::Line { to } => PathSeg::Line { to: self.apply_point(to) },
                    PathSeg::Cubic { c1, c2, to } => PathSeg::Cubic {
                        c1: self.apply_point(c1),
                        c2: self.apply_point(c2),
                        to: self.apply_point(to),
                    },
                })
                .collect(),
            closed: sub.closed,
        }
    }

    /// Average absolute scale factor, used to carry lengths through a chain.
    pub fn mean_scale(&self) -> f64 {
        let sx = (self.a * self.a + self.b * self.b).sqrt();
        let sy = (self.c * self.c + self.d * self.d).sqrt();
        (sx + sy) * 0.5
    }
}
