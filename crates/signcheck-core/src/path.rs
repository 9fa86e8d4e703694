use serde::{Deserialize, Serialize};

use crate::geom::{polyline_length, Vec2};

/// Distance a cubic handle sits from the endpoint when approximating a
/// quarter circle of radius 1.
pub const CIRCLE_KAPPA: f64 = 0.5523;

/// A drawing command relative to the previous segment's endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathSeg {
    Line { to: Vec2 },
    Cubic { c1: Vec2, c2: Vec2, to: Vec2 },
}

impl PathSeg {
    pub fn end(&self) -> Vec2 {
        match *self {
            PathSeg::Line { to } => to,
            PathSeg::Cubic { to, .. } => to,
        }
    }
}

/// One continuous pen stroke: a moveto followed by segments. Compound paths
/// carry several of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubPath {
    pub start: Vec2,
    pub segs: Vec<PathSeg>,
    /// True when the source data carried an explicit closepath.
    pub closed: bool,
}

impl SubPath {
    pub fn new(start: Vec2) -> Self {
        Self { start, segs: Vec::new(), closed: false }
    }

    pub fn end_point(&self) -> Vec2 {
        self.segs.last().map_or(self.start, |s| s.end())
    }

    /// Closed either explicitly or because the endpoints coincide within
    /// `tol` drawing units.
    pub fn is_closed(&self, tol: f64) -> bool {
        if self.segs.is_empty() {
            return false;
        }
        self.closed || self.start.distance_to(self.end_point()) <= tol
    }

    /// Polyline approximation, cubics sampled at `steps` points each. The
    /// first point is the subpath start; the closing edge is implied, not
    /// repeated.
    pub fn flatten(&self, steps: usize) -> Vec<Vec2> {
        let steps = steps.max(2);
        let mut points = vec![self.start];
        let mut cursor = self.start;
        for seg in &self.segs {
            match *seg {
                PathSeg::Line { to } => points.push(to),
                PathSeg::Cubic { c1, c2, to } => {
                    for k in 1..=steps {
                        let t = k as f64 / steps as f64;
                        points.push(cubic_point(cursor, c1, c2, to, t));
                    }
                }
            }
            cursor = seg.end();
        }
        if points.len() > 1 && points[0].distance_to(points[points.len() - 1]) < 1e-9 {
            points.pop();
        }
        points
    }

    pub fn length(&self, steps: usize) -> f64 {
        let mut pts = self.flatten(steps);
        if self.is_closed(0.5) {
            if let Some(&first) = pts.first() {
                pts.push(first);
            }
        }
        polyline_length(&pts)
    }
}

pub fn cubic_point(p0: Vec2, c1: Vec2, c2: Vec2, p3: Vec2, t: f64) -> Vec2 {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Vec2::new(
        a * p0.x + b * c1.x + c * c2.x + d * p3.x,
        a * p0.y + b * c1.y + c * c2.y + d * p3.y,
    )
}

/// Raises a quadratic Bezier to the equivalent cubic.
pub fn quad_to_cubic(p0: Vec2, ctrl: Vec2, to: Vec2) -> PathSeg {
    let c1 = p0.add(ctrl.sub(p0).scale(2.0 / 3.0));
    let c2 = to.add(ctrl.sub(to).scale(2.0 / 3.0));
    PathSeg::Cubic { c1, c2, to }
}

/// Four-cubic approximation of an axis-aligned ellipse, starting at the
/// rightmost point and winding counter-clockwise.
pub fn ellipse_subpath(center: Vec2, rx: f64, ry: f64) -> SubPath {
    let hx = rx * CIRCLE_KAPPA;
    let hy = ry * CIRCLE_KAPPA;
    let right = Vec2::new(center.x + rx, center.y);
    let top = Vec2::new(center.x, center.y + ry);
    let left = Vec2::new(center.x - rx, center.y);
    let bottom = Vec2::new(center.x, center.y - ry);
    let mut sub = SubPath::new(right);
    sub.segs.push(PathSeg::Cubic {
        c1: Vec2::new(right.x, right.y + hy),
        c2: Vec2::new(top.x + hx, top.y),
        to: top,
    });
    sub.segs.push(PathSeg::Cubic {
        c1: Vec2::new(top.x - hx, top.y),
        c2: Vec2::new(left.x, left.y + hy),
        to: left,
    });
    sub.segs.push(PathSeg::Cubic {
        c1: Vec2::new(left.x, left.y - hy),
        c2: Vec2::new(bottom.x - hx, bottom.y),
        to: bottom,
    });
    sub.segs.push(PathSeg::Cubic {
        c1: Vec2::new(bottom.x + hx, bottom.y),
        c2: Vec2::new(right.x, right.y - hy),
        to: right,
    });
    sub.closed = true;
    sub
}
