use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(self, s: f64) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }

    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z component of the 3D cross).
    pub fn cross(self, other: Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn distance_to(self, other: Vec2) -> f64 {
        self.sub(other).length()
    }

    /// Returns `None` for a near-zero vector.
    pub fn normalized(self) -> Option<Vec2> {
        let len = self.length();
        if len < 1e-12 {
            None
        } else {
            Some(self.scale(1.0 / len))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl BBox2 {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vec2::new(f64::INFINITY, f64::INFINITY),
            max: Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn include_point(&mut self, point: Vec2) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    pub fn from_points(points: &[Vec2]) -> Self {
        let mut bbox = Self::empty();
        for &p in points {
            bbox.include_point(p);
        }
        bbox
    }

    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self {
            min: Vec2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vec2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.min.x + self.max.x) * 0.5, (self.min.y + self.max.y) * 0.5)
    }

    pub fn width(&self) -> f64 {
        (self.max.x - self.min.x).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.max.y - self.min.y).max(0.0)
    }

    pub fn diag(&self) -> f64 {
        let w = self.width();
        let h = self.height();
        (w * w + h * h).sqrt()
    }

    pub fn expand(&self, delta: f64) -> Self {
        Self {
            min: Vec2::new(self.min.x - delta, self.min.y - delta),
            max: Vec2::new(self.max.x + delta, self.max.y + delta),
        }
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    pub fn contains_bbox(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    pub fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = if self.max.x < other.min.x {
            other.min.x - self.max.x
        } else if other.max.x < self.min.x {
            self.min.x - other.max.x
        } else {
            0.0
        };
        let dy = if self.max.y < other.min.y {
            other.min.y - self.max.y
        } else if other.max.y < self.min.y {
            self.min.y - other.max.y
        } else {
            0.0
        };
        (dx * dx + dy * dy).sqrt()
    }
}

/// Signed area of a ring (positive for counter-clockwise in y-up coordinates).
/// The ring need not repeat its first point.
pub fn ring_signed_area(ring: &[Vec2]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        sum += a.cross(b);
    }
    sum * 0.5
}

pub fn ring_area(ring: &[Vec2]) -> f64 {
    ring_signed_area(ring).abs()
}

pub fn ring_perimeter(ring: &[Vec2]) -> f64 {
    if ring.len() < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..ring.len() {
        sum += ring[i].distance_to(ring[(i + 1) % ring.len()]);
    }
    sum
}

pub fn polyline_length(points: &[Vec2]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(w[1])).sum()
}

/// Area-weighted centroid of a ring; falls back to the vertex mean when the
/// ring is degenerate.
pub fn ring_centroid(ring: &[Vec2]) -> Vec2 {
    let area2 = ring_signed_area(ring) * 2.0;
    if area2.abs() < 1e-12 {
        let n = ring.len().max(1) as f64;
        let mut acc = Vec2::new(0.0, 0.0);
        for &p in ring {
            acc = acc.add(p);
        }
        return acc.scale(1.0 / n);
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        let w = a.cross(b);
        cx += (a.x + b.x) * w;
        cy += (a.y + b.y) * w;
    }
    Vec2::new(cx / (3.0 * area2), cy / (3.0 * area2))
}

/// Even-odd point-in-ring test. Points exactly on an edge count as inside.
pub fn point_in_ring(point: Vec2, ring: &[Vec2]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[j];
        if distance_point_to_segment(point, a, b) < 1e-9 {
            return true;
        }
        if (a.y > point.y) != (b.y > point.y) {
            let t = (point.y - a.y) / (b.y - a.y);
            if point.x < a.x + t * (b.x - a.x) {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

pub fn distance_point_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let ab = b.sub(a);
    let len2 = ab.dot(ab);
    if len2 < 1e-18 {
        return p.distance_to(a);
    }
    let t = (p.sub(a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance_to(a.add(ab.scale(t)))
}

/// Minimum distance from a point to any edge of a ring.
pub fn distance_point_to_ring(p: Vec2, ring: &[Vec2]) -> f64 {
    if ring.is_empty() {
        return f64::INFINITY;
    }
    let mut best = f64::INFINITY;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        best = best.min(distance_point_to_segment(p, a, b));
    }
    best
}

/// Closest point on a ring boundary to `p`.
pub fn closest_point_on_ring(p: Vec2, ring: &[Vec2]) -> Option<Vec2> {
    if ring.is_empty() {
        return None;
    }
    let mut best = f64::INFINITY;
    let mut best_point = None;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        let ab = b.sub(a);
        let len2 = ab.dot(ab);
        let q = if len2 < 1e-18 {
            a
        } else {
            let t = (p.sub(a).dot(ab) / len2).clamp(0.0, 1.0);
            a.add(ab.scale(t))
        };
        let d = p.distance_to(q);
        if d < best {
            best = d;
            best_point = Some(q);
        }
    }
    best_point
}

fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let d1 = a2.sub(a1);
    let d2 = b2.sub(b1);
    let denom = d1.cross(d2);
    if denom.abs() < 1e-18 {
        return false;
    }
    let t = b1.sub(a1).cross(d2) / denom;
    let u = b1.sub(a1).cross(d1) / denom;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

/// Minimum distance between the boundaries of two rings, zero if edges cross.
pub fn ring_min_distance(a: &[Vec2], b: &[Vec2]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return f64::INFINITY;
    }
    let mut best = f64::INFINITY;
    for i in 0..a.len() {
        let a1 = a[i];
        let a2 = a[(i + 1) % a.len()];
        for j in 0..b.len() {
            let b1 = b[j];
            let b2 = b[(j + 1) % b.len()];
            if segments_intersect(a1, a2, b1, b2) {
                return 0.0;
            }
            best = best.min(distance_point_to_segment(a1, b1, b2));
            best = best.min(distance_point_to_segment(b1, a1, a2));
        }
    }
    best
}

/// Offsets a ring outward by `delta` using mitred joins. The ring is assumed
/// simple; near-parallel joins fall back to a plain normal offset. `delta`
/// may be negative to shrink.
pub fn offset_ring_mitred(ring: &[Vec2], delta: f64) -> Vec<Vec2> {
    if ring.len() < 3 {
        return ring.to_vec();
    }
    // Outward is away from the interior regardless of winding.
    let orientation = if ring_signed_area(ring) >= 0.0 { 1.0 } else { -1.0 };
    let n = ring.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = ring[(i + n - 1) % n];
        let cur = ring[i];
        let next = ring[(i + 1) % n];
        let d_in = match cur.sub(prev).normalized() {
            Some(d) => d,
            None => continue,
        };
        let d_out = match next.sub(cur).normalized() {
            Some(d) => d,
            None => continue,
        };
        // Right normals, flipped for clockwise rings so they point outward.
        let n_in = Vec2::new(d_in.y, -d_in.x).scale(orientation);
        let n_out = Vec2::new(d_out.y, -d_out.x).scale(orientation);
        let bisector = n_in.add(n_out);
        let denom = 1.0 + n_in.dot(n_out);
        if denom.abs() < 1e-9 {
            out.push(cur.add(n_in.scale(delta)));
        } else {
            out.push(cur.add(bisector.scale(delta / denom)));
        }
    }
    out
}

/// Casts a ray from `origin` in `direction` and returns the distance to the
/// nearest ring-edge hit, if any.
pub fn ray_ring_intersection(origin: Vec2, direction: Vec2, ring: &[Vec2]) -> Option<f64> {
    let dir = direction.normalized()?;
    let mut best: Option<f64> = None;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        let edge = b.sub(a);
        let denom = dir.cross(edge);
        if denom.abs() < 1e-18 {
            continue;
        }
        let diff = a.sub(origin);
        let t = diff.cross(edge) / denom;
        let u = diff.cross(dir) / denom;
        if t > 1e-9 && (0.0..=1.0).contains(&u) {
            best = Some(best.map_or(t, |b: f64| b.min(t)));
        }
    }
    best
}
