use signcheck_core::geom::{polyline_length, BBox2};
use signcheck_core::model::{CircleFit, GlobalGeometry, PathEntity, RawGeometry, SignDocument};
use signcheck_core::path::SubPath;

use crate::layers::{layer_for_shape, LayerResolution};
use crate::parse::{ParsedDocument, ParsedShape};

/// Endpoint gap below which a subpath counts as closed, in drawing units.
pub const CLOSE_TOLERANCE: f64 = 0.5;
/// Bezier flattening resolution for area/containment work.
pub const FLATTEN_STEPS: usize = 16;
/// Circles must be square and have a circumference-consistent arc length
/// within this fraction. Tight enough to reject squares and hexagons.
const CIRCLE_RATIO_TOL: f64 = 0.02;

pub fn build_document(parsed: &ParsedDocument, resolution: &LayerResolution) -> SignDocument {
    let mut entities = Vec::with_capacity(parsed.shapes.len());
    for (i, shape) in parsed.shapes.iter().enumerate() {
        entities.push(build_entity(i as u64 + 1, shape, resolution));
    }

    let mut layers: Vec<String> = Vec::new();
    for name in &resolution.group_names {
        if !layers.contains(name) {
            layers.push(name.clone());
        }
    }

    SignDocument { width: parsed.width, height: parsed.height, entities, layers }
}

fn build_entity(id: u64, shape: &ParsedShape, resolution: &LayerResolution) -> PathEntity {
    let global_subpaths: Vec<SubPath> = shape
        .subpaths
        .iter()
        .map(|s| shape.transform.apply_subpath(s))
        .collect();

    PathEntity {
        id,
        source_id: shape.source_id.clone(),
        layer: layer_for_shape(shape, resolution),
        transform: shape.transform,
        raw: RawGeometry { subpaths: shape.subpaths.clone() },
        global: build_global(&global_subpaths),
        style: shape.style.clone(),
        data_signature: shape.data_signature.clone(),
    }
}

/// Derives the analysis shapes once: bbox always, polygon when every
/// subpath closes, circle fit when the outline passes both roundness tests.
pub fn build_global(subpaths: &[SubPath]) -> GlobalGeometry {
    let flattened: Vec<Vec<signcheck_core::geom::Vec2>> =
        subpaths.iter().map(|s| s.flatten(FLATTEN_STEPS)).collect();

    let mut bbox = BBox2::empty();
    for ring in &flattened {
        for &p in ring {
            bbox.include_point(p);
        }
    }

    let all_closed =
        !subpaths.is_empty() && subpaths.iter().all(|s| s.is_closed(CLOSE_TOLERANCE));
    let polygon = if all_closed {
        signcheck_core::polygon::Polygon::from_rings(flattened.clone())
    } else {
        None
    };

    let circle = if all_closed && subpaths.len() == 1 {
        fit_circle(&subpaths[0], &bbox)
    } else {
        None
    };

    GlobalGeometry { subpaths: subpaths.to_vec(), polygon, bbox, circle }
}

fn fit_circle(sub: &SubPath, bbox: &BBox2) -> Option<CircleFit> {
    let w = bbox.width();
    let h = bbox.height();
    if w < 1e-9 || h < 1e-9 {
        return None;
    }
    let aspect = w.min(h) / w.max(h);
    if aspect < 1.0 - CIRCLE_RATIO_TOL {
        return None;
    }
    let diameter = (w + h) * 0.5;
    let expected_circumference = std::f64::consts::PI * diameter;

    let mut points = sub.flatten(FLATTEN_STEPS);
    if let Some(&first) = points.first() {
        points.push(first);
    }
    let arc_length = polyline_length(&points);
    let ratio = arc_length / expected_circumference;
    if (ratio - 1.0).abs() > CIRCLE_RATIO_TOL {
        return None;
    }
    Some(CircleFit { center: bbox.center(), diameter })
}
