use signcheck_core::geom::{ring_area, ring_signed_area, Vec2};
use signcheck_core::model::PathEntity;
use signcheck_core::path::{PathSeg, SubPath, CIRCLE_KAPPA};

pub const POINTS_PER_INCH: f64 = 72.0;

/// One detected corner. Sharp corners carry a zero radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerInfo {
    pub radius_inches: f64,
    pub is_convex: bool,
    pub is_sharp: bool,
    pub position: Vec2,
}

/// Extracts corner data for every sub-loop of an entity. Interior sub-loops
/// (cutout counters in compound paths) get their convexity flipped so that
/// "convex" always means bulging into material.
pub fn analyze_entity_corners(entity: &PathEntity, scale: f64) -> Vec<CornerInfo> {
    let subpaths = &entity.global.subpaths;
    let exterior = largest_subpath_index(subpaths);
    let mut corners = Vec::new();
    for (i, sub) in subpaths.iter().enumerate() {
        let invert = exterior.map_or(false, |ext| i != ext);
        corners.extend(analyze_subpath_corners(sub, scale, invert));
    }
    corners
}

fn largest_subpath_index(subpaths: &[SubPath]) -> Option<usize> {
    if subpaths.len() < 2 {
        return None;
    }
    subpaths
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            let area_a = ring_area(&a.flatten(8));
            let area_b = ring_area(&b.flatten(8));
            area_a.partial_cmp(&area_b).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
}

/// Walks segment triples looking for Line -> Cubic -> Line (rounded corner,
/// radius recovered from the Bezier handle length) and Line -> Line with an
/// actual direction change (sharp corner). Closed sub-loops wrap around.
pub fn analyze_subpath_corners(sub: &SubPath, scale: f64, invert_convexity: bool) -> Vec<CornerInfo> {
    let segs = segment_spans(sub);
    if segs.len() < 2 {
        return Vec::new();
    }
    let closed = sub.is_closed(0.5);
    let orientation = subpath_orientation(sub);
    let n = segs.len();
    let last = if closed { n } else { n - 1 };

    let mut corners = Vec::new();
    for i in 0..last {
        let cur = &segs[i];
        let next = &segs[(i + 1) % n];
        match (&cur.seg, &next.seg) {
            (PathSeg::Line { .. }, PathSeg::Cubic { c1, c2, to }) => {
                // The cubic is a corner only when it lands on another line.
                let after = &segs[(i + 2) % n];
                if !closed && i + 2 >= n {
                    continue;
                }
                let PathSeg::Line { .. } = after.seg else { continue };
                let h1 = c1.distance_to(next.start);
                let h2 = c2.distance_to(*to);
                let radius_units = (h1 + h2) * 0.5 / CIRCLE_KAPPA;
                let d_in = direction(cur.start, cur.seg.end());
                let d_out = direction(after.start, after.seg.end());
                let (Some(d_in), Some(d_out)) = (d_in, d_out) else { continue };
                let mut convex = d_in.cross(d_out) * orientation > 0.0;
                if invert_convexity {
                    convex = !convex;
                }
                corners.push(CornerInfo {
                    radius_inches: radius_units / (POINTS_PER_INCH * scale),
                    is_convex: convex,
                    is_sharp: false,
                    position: next.start,
                });
            }
            (PathSeg::Line { .. }, PathSeg::Line { .. }) => {
                let d_in = direction(cur.start, cur.seg.end());
                let d_out = direction(next.start, next.seg.end());
                let (Some(d_in), Some(d_out)) = (d_in, d_out) else { continue };
                let cross = d_in.cross(d_out);
                if cross.abs() <= 1e-6 {
                    continue;
                }
                let mut convex = cross * orientation > 0.0;
                if invert_convexity {
                    convex = !convex;
                }
                corners.push(CornerInfo {
                    radius_inches: 0.0,
                    is_convex: convex,
                    is_sharp: true,
                    position: next.start,
                });
            }
            _ => {}
        }
    }
    corners
}

struct SegSpan {
    start: Vec2,
    seg: PathSeg,
}

fn segment_spans(sub: &SubPath) -> Vec<SegSpan> {
    let mut spans = Vec::with_capacity(sub.segs.len() + 1);
    let mut cursor = sub.start;
    for &seg in &sub.segs {
        spans.push(SegSpan { start: cursor, seg });
        cursor = seg.end();
    }
    // An explicit close with a gap behaves like a final line segment.
    if sub.closed && cursor.distance_to(sub.start) > 1e-9 {
        spans.push(SegSpan { start: cursor, seg: PathSeg::Line { to: sub.start } });
    }
    spans
}

fn direction(from: Vec2, to: Vec2) -> Option<Vec2> {
    to.sub(from).normalized()
}

/// +1 / -1 matching the sign of the sub-loop's signed area, so the convexity
/// test is independent of winding direction.
fn subpath_orientation(sub: &SubPath) -> f64 {
    if ring_signed_area(&sub.flatten(8)) >= 0.0 {
        1.0
    } else {
        -1.0
    }
}
