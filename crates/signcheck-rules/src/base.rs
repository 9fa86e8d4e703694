//! Method-agnostic document checks: duplicate traces, stroke presentation,
//! coarse mounting-hole counts on large panels, and open paths.

use serde_json::json;
use std::collections::BTreeMap;

use signcheck_core::config::RuleOptions;
use signcheck_core::model::SignDocument;
use signcheck_core::report::ValidationIssue;

use crate::common::units_to_inches;

const LAYER_DEFS: &str = "_defs_";

/// Flags entities whose path data, transform, and layer are identical and
/// whose bounding boxes coincide within tolerance. Stacked duplicates get
/// cut twice by the router.
pub fn check_duplicate_overlapping(doc: &SignDocument, opts: &RuleOptions) -> Vec<ValidationIssue> {
    let tolerance = opts.get_f64("tolerance", 0.01);
    let mut issues = Vec::new();

    let mut groups: BTreeMap<(String, String, String), Vec<usize>> = BTreeMap::new();
    for (i, entity) in doc.entities.iter().enumerate() {
        if entity.layer == LAYER_DEFS {
            continue;
        }
        let t = entity.transform;
        let key = (
            entity.layer.clone(),
            entity.data_signature.clone(),
            format!("{:.6} {:.6} {:.6} {:.6} {:.6} {:.6}", t.a, t.b, t.c, t.d, t.e, t.f),
        );
        groups.entry(key).or_default().push(i);
    }

    for ((layer, _, _), members) in &groups {
        if members.len() < 2 {
            continue;
        }
        for (pos, &ai) in members.iter().enumerate() {
            for &bi in &members[pos + 1..] {
                let a = &doc.entities[ai];
                let b = &doc.entities[bi];
                let ba = a.global.bbox;
                let bb = b.global.bbox;
                let coincident = (ba.min.x - bb.min.x).abs() < tolerance
                    && (ba.min.y - bb.min.y).abs() < tolerance
                    && (ba.max.x - bb.max.x).abs() < tolerance
                    && (ba.max.y - bb.max.y).abs() < tolerance;
                if coincident {
                    issues.push(
                        ValidationIssue::error(
                            "no_duplicate_overlapping",
                            "no_duplicate_overlapping",
                            format!(
                                "Duplicate overlapping paths on layer \"{layer}\": path_{} and path_{}",
                                a.id, b.id
                            ),
                        )
                        .detail("duplicate_of", format!("path_{}", b.id))
                        .detail("layer", layer.clone()),
                    );
                }
            }
        }
    }

    issues
}

/// Stroke color, stroke width, and fill presence against the production
/// profile. All violations are errors; the cutter keys off these.
pub fn check_stroke_requirements(doc: &SignDocument, opts: &RuleOptions) -> Vec<ValidationIssue> {
    let required_color = opts
        .0
        .get("required_color")
        .and_then(serde_json::Value::as_str)
        .map(str::to_ascii_lowercase);
    let required_width = opts.0.get("required_width").and_then(serde_json::Value::as_f64);
    let width_tolerance = opts.get_f64("tolerance", 0.1);
    let allow_fill = opts.get_bool("allow_fill", true);

    let mut issues = Vec::new();
    for entity in &doc.entities {
        let label = format!("path_{}", entity.id);

        if let (Some(required), Some(actual)) = (&required_color, &entity.style.stroke) {
            if !actual.eq_ignore_ascii_case(required) {
                issues.push(
                    ValidationIssue::error(
                        "stroke_requirements",
                        "stroke_requirements",
                        format!(
                            "Path {label} has incorrect stroke color: {actual} (expected {required})"
                        ),
                    )
                    .detail("actual_stroke", actual.clone())
                    .detail("expected", required.clone()),
                );
            }
        }

        if let (Some(required), Some(actual)) = (required_width, entity.style.stroke_width_pt) {
            if (actual - required).abs() > width_tolerance {
                issues.push(
                    ValidationIssue::error(
                        "stroke_requirements",
                        "stroke_requirements",
                        format!(
                            "Path {label} has incorrect stroke width: {actual:.2}pt (expected {required}pt)"
                        ),
                    )
                    .detail("actual_width", json!(actual))
                    .detail("expected", json!(required)),
                );
            }
        }

        if !allow_fill {
            if let Some(fill) = &entity.style.fill {
                issues.push(
                    ValidationIssue::error(
                        "stroke_requirements",
                        "stroke_requirements",
                        format!("Path {label} has fill: {fill} (expected no fill)"),
                    )
                    .detail("actual_fill", fill.clone()),
                );
            }
        }
    }
    issues
}

/// Coarse mounting-hole suggestion for any large closed panel, independent
/// of letter analysis. Counts a compound path's interior rings as its holes.
/// Small paths (under the perimeter floor) are skipped entirely.
pub fn check_structural_mounting_holes(
    doc: &SignDocument,
    opts: &RuleOptions,
) -> Vec<ValidationIssue> {
    let min_holes = opts.get_usize("min_holes", 2);
    let holes_per_sq_inch = opts.get_f64("holes_per_sq_inch", 0.01);
    let min_perimeter_inches = opts.get_f64("min_perimeter_for_holes", 48.0);

    let mut issues = Vec::new();
    for entity in &doc.entities {
        let Some(poly) = &entity.global.polygon else { continue };

        // This rule predates scale detection; sizes are full-scale inches.
        let area_sq_inches = poly.net_area() / (72.0 * 72.0);
        let perimeter_inches = units_to_inches(poly.exterior_perimeter(), 1.0);
        if perimeter_inches < min_perimeter_inches {
            continue;
        }

        let by_area = (area_sq_inches * holes_per_sq_inch).trunc().max(0.0) as usize;
        let required = min_holes.max(by_area);
        let actual = poly.interiors.len();

        if actual < required {
            issues.push(
                ValidationIssue::warning(
                    "structural_mounting_holes",
                    "structural_mounting_holes",
                    format!(
                        "Path path_{} may need more mounting holes: has {actual}, suggested {required} based on {area_sq_inches:.1} sq in area",
                        entity.id
                    ),
                )
                .detail("actual_holes", actual as u64)
                .detail("suggested_holes", required as u64)
                .detail("area_sq_inches", json!(area_sq_inches))
                .detail("perimeter_inches", json!(perimeter_inches)),
            );
        }
    }
    issues
}

/// Open paths longer than a hair are probably meant to be closed outlines.
pub fn check_path_closure(doc: &SignDocument, opts: &RuleOptions) -> Vec<ValidationIssue> {
    let min_length = opts.get_f64("min_length", 10.0);

    let mut issues = Vec::new();
    for entity in &doc.entities {
        if entity.is_closed() {
            continue;
        }
        let length: f64 = entity.global.subpaths.iter().map(|s| s.length(16)).sum();
        if length > min_length {
            issues.push(
                ValidationIssue::warning(
                    "path_closure",
                    "path_closure",
                    format!("Path path_{} may not be properly closed", entity.id),
                )
                .detail("length", json!(length)),
            );
        }
    }
    issues
}
