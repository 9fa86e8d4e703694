//! Push-thru signs: acrylic letters push through cutouts routed into a
//! backer panel. The backer arrives as compound paths (panel exterior plus
//! cutout interiors), acrylic letters live on their own layer, and a lexan
//! diffuser sheet must cover every cutout with clearance.

use serde_json::json;

use signcheck_analysis::{analyze_entity_corners, analyze_subpath_corners, CornerInfo};
use signcheck_core::config::RuleOptions;
use signcheck_core::geom::{point_in_ring, ring_area, ring_centroid, ring_min_distance, BBox2, Vec2};
use signcheck_core::model::{LetterAnalysisResult, PathEntity, SignDocument};
use signcheck_core::report::ValidationIssue;

use crate::common::{units_to_inches, units_to_mm};

const RULE: &str = "push_thru_structure";

struct Cutout {
    /// Entity carrying the compound path this ring came from.
    source_id: u64,
    ring: Vec<Vec2>,
    bbox: BBox2,
    centroid: Vec2,
    area: f64,
}

struct PushThruOptions {
    backer_layer: String,
    acrylic_layer: String,
    lexan_layer: String,
    cutout_offset_mm: f64,
    cutout_offset_tol_mm: f64,
    corner_tol_pct: f64,
    acrylic_convex_r: f64,
    acrylic_concave_r: f64,
    cutout_convex_r: f64,
    cutout_concave_r: f64,
    min_acrylic_inset_inches: f64,
    lexan_inset_inches: f64,
    max_cutout_area_ratio: f64,
    min_lexan_cutout_clearance: f64,
    max_match_distance: f64,
}

impl PushThruOptions {
    fn from_options(opts: &RuleOptions) -> Self {
        Self {
            backer_layer: opts.get_str("backer_layer", "backer").to_string(),
            acrylic_layer: opts.get_str("acrylic_layer", "push_thru_acrylic").to_string(),
            lexan_layer: opts.get_str("lexan_layer", "lexan").to_string(),
            cutout_offset_mm: opts.get_f64("cutout_offset_mm", 0.8),
            cutout_offset_tol_mm: opts.get_f64("cutout_offset_tolerance_mm", 0.05),
            corner_tol_pct: opts.get_f64("corner_radius_tolerance_pct", 0.05),
            acrylic_convex_r: opts.get_f64("acrylic_convex_radius_inches", 0.028),
            acrylic_concave_r: opts.get_f64("acrylic_concave_radius_inches", 0.059),
            cutout_convex_r: opts.get_f64("cutout_convex_radius_inches", 0.059),
            cutout_concave_r: opts.get_f64("cutout_concave_radius_inches", 0.028),
            min_acrylic_inset_inches: opts.get_f64("min_acrylic_inset_from_box_inches", 3.0),
            lexan_inset_inches: opts.get_f64("lexan_inset_from_box_inches", 2.25),
            max_cutout_area_ratio: opts.get_f64("max_cutout_area_ratio", 0.67),
            min_lexan_cutout_clearance: opts.get_f64("min_lexan_cutout_clearance_inches", 0.25),
            max_match_distance: opts.get_f64("max_match_distance", 50.0),
        }
    }
}

pub fn check_push_thru_structure(
    doc: &SignDocument,
    analysis: &LetterAnalysisResult,
    opts: &RuleOptions,
) -> Vec<ValidationIssue> {
    let cfg = PushThruOptions::from_options(opts);
    let scale = analysis.scale;
    let mut issues = Vec::new();

    let (boxes, cutouts) = decompose_backer(doc, &cfg.backer_layer);

    let mut layers: Vec<String> = analysis.stats.per_layer_paths.keys().cloned().collect();
    layers.sort();

    issues.push(
        ValidationIssue::info(
            RULE,
            "push_thru_structure",
            format!(
                "Backer: {} box(es), {} cutout(s). Layers: {}",
                boxes.len(),
                cutouts.len(),
                layers.join(", ")
            ),
        )
        .detail("backer_boxes", boxes.len() as u64)
        .detail("backer_cutouts", cutouts.len() as u64)
        .detail("layers", json!(layers)),
    );

    if boxes.is_empty() {
        issues.push(
            ValidationIssue::warning(
                RULE,
                "push_thru_structure",
                format!(
                    "No compound paths with cutouts found on \"{}\" layer",
                    cfg.backer_layer
                ),
            )
            .detail("available_layers", json!(layers)),
        );
        return issues;
    }

    let acrylic: Vec<&PathEntity> = doc
        .entities
        .iter()
        .filter(|e| {
            e.layer.eq_ignore_ascii_case(&cfg.acrylic_layer)
                && e.is_closed()
                && !e.is_circle()
        })
        .collect();

    issues.push(
        ValidationIssue::info(
            RULE,
            "push_thru_structure",
            format!(
                "Found {} acrylic letter(s) on {} layer",
                acrylic.len(),
                cfg.acrylic_layer
            ),
        )
        .detail("acrylic_count", acrylic.len() as u64)
        .detail("layer", cfg.acrylic_layer.clone()),
    );

    if acrylic.is_empty() {
        issues.push(
            ValidationIssue::error(
                RULE,
                "push_thru_cutout_count",
                format!("No acrylic letters found on \"{}\" layer", cfg.acrylic_layer),
            )
            .detail("available_layers", json!(layers)),
        );
        return issues;
    }

    // Acrylic to cutout matching is exclusive: each cutout hosts one letter.
    let matches = match_acrylic_to_cutouts(&acrylic, &cutouts, cfg.max_match_distance);
    let unmatched_acrylic: Vec<&&PathEntity> = matches
        .iter()
        .filter(|(_, cutout, _)| cutout.is_none())
        .map(|(a, _, _)| a)
        .collect();

    if acrylic.len() != cutouts.len() {
        issues.push(
            ValidationIssue::error(
                RULE,
                "push_thru_cutout_count",
                format!(
                    "Cutout count ({}) does not match acrylic count ({})",
                    cutouts.len(),
                    acrylic.len()
                ),
            )
            .detail("cutout_count", cutouts.len() as u64)
            .detail("acrylic_count", acrylic.len() as u64)
            .detail("unmatched_acrylic", unmatched_acrylic.len() as u64),
        );
    }

    for entity in &unmatched_acrylic {
        issues.push(ValidationIssue::error(
            RULE,
            "push_thru_cutout_count",
            format!("Acrylic letter {} has no matching backer cutout", label(entity)),
        ));
    }

    // Cutout offset: the routed hole sits a fixed uniform offset outside
    // the acrylic on every side.
    for (entity, cutout, _) in &matches {
        let Some(cutout) = cutout else { continue };
        let acr = entity.global.bbox;
        let offsets_mm = [
            ("left", units_to_mm(acr.min.x - cutout.bbox.min.x, scale)),
            ("top", units_to_mm(acr.min.y - cutout.bbox.min.y, scale)),
            ("right", units_to_mm(cutout.bbox.max.x - acr.max.x, scale)),
            ("bottom", units_to_mm(cutout.bbox.max.y - acr.max.y, scale)),
        ];
        let wrong = offsets_mm
            .iter()
            .any(|(_, v)| (v - cfg.cutout_offset_mm).abs() > cfg.cutout_offset_tol_mm);
        if wrong {
            let detail: serde_json::Map<String, serde_json::Value> = offsets_mm
                .iter()
                .map(|(side, v)| (side.to_string(), json!((v * 1000.0).round() / 1000.0)))
                .collect();
            issues.push(
                ValidationIssue::error(
                    RULE,
                    "push_thru_cutout_offset",
                    format!(
                        "Cutout for {} offset is wrong (L:{:.2}mm R:{:.2}mm T:{:.2}mm B:{:.2}mm, expected {}mm \u{b1}{}mm)",
                        label(entity),
                        offsets_mm[0].1,
                        offsets_mm[2].1,
                        offsets_mm[1].1,
                        offsets_mm[3].1,
                        cfg.cutout_offset_mm,
                        cfg.cutout_offset_tol_mm
                    ),
                )
                .detail("offsets_mm", serde_json::Value::Object(detail))
                .detail("expected_offset_mm", json!(cfg.cutout_offset_mm))
                .detail("tolerance_mm", json!(cfg.cutout_offset_tol_mm)),
            );
        }
    }

    check_acrylic_corners(&mut issues, &acrylic, scale, &cfg);
    check_cutout_corners(&mut issues, doc, scale, &cfg);
    check_acrylic_inset(&mut issues, &acrylic, &boxes, scale, &cfg);
    check_lexan_layer(&mut issues, doc, &boxes, &cutouts, scale, &cfg);

    issues
}

/// Splits the backer layer's compound paths into panel exteriors and cutout
/// interior rings. Simple backer paths (LED boxes and the like) are left to
/// the other checks.
fn decompose_backer(doc: &SignDocument, backer_layer: &str) -> (Vec<Vec<Vec2>>, Vec<Cutout>) {
    let mut boxes = Vec::new();
    let mut cutouts = Vec::new();
    for entity in &doc.entities {
        if !entity.layer.eq_ignore_ascii_case(backer_layer) {
            continue;
        }
        let Some(poly) = &entity.global.polygon else { continue };
        if poly.interiors.is_empty() {
            continue;
        }
        boxes.push(poly.exterior.clone());
        for ring in &poly.interiors {
            let area = ring_area(ring);
            if area <= 0.0 {
                continue;
            }
            cutouts.push(Cutout {
                source_id: entity.id,
                ring: ring.clone(),
                bbox: BBox2::from_points(ring),
                centroid: ring_centroid(ring),
                area,
            });
        }
    }
    (boxes, cutouts)
}

/// Greedy nearest-centroid matching; each cutout is claimed at most once.
fn match_acrylic_to_cutouts<'a, 'c>(
    acrylic: &'a [&'a PathEntity],
    cutouts: &'c [Cutout],
    max_distance: f64,
) -> Vec<(&'a PathEntity, Option<&'c Cutout>, f64)> {
    let mut used = vec![false; cutouts.len()];
    let mut matches = Vec::with_capacity(acrylic.len());
    for entity in acrylic {
        let centroid = entity.centroid();
        let mut best: Option<usize> = None;
        let mut best_distance = f64::INFINITY;
        for (i, cutout) in cutouts.iter().enumerate() {
            if used[i] {
                continue;
            }
            let d = centroid.distance_to(cutout.centroid);
            if d < best_distance {
                best_distance = d;
                best = Some(i);
            }
        }
        match best {
            Some(i) if best_distance <= max_distance => {
                used[i] = true;
                matches.push((*entity, Some(&cutouts[i]), best_distance));
            }
            _ => matches.push((*entity, None, best_distance)),
        }
    }
    matches
}

struct RadiusViolation {
    convex: bool,
    radius_inches: f64,
}

fn split_corner_violations(
    corners: &[CornerInfo],
    convex_min: f64,
    concave_min: f64,
    tol_pct: f64,
) -> (Vec<CornerInfo>, Vec<RadiusViolation>) {
    let mut sharp = Vec::new();
    let mut undersized = Vec::new();
    for corner in corners {
        if corner.is_sharp {
            sharp.push(*corner);
            continue;
        }
        let min = if corner.is_convex { convex_min } else { concave_min };
        if corner.radius_inches < min * (1.0 - tol_pct) {
            undersized.push(RadiusViolation {
                convex: corner.is_convex,
                radius_inches: corner.radius_inches,
            });
        }
    }
    (sharp, undersized)
}

fn format_radius_violations(
    undersized: &[RadiusViolation],
    convex_min: f64,
    concave_min: f64,
) -> String {
    let mut parts = Vec::new();
    let convex: Vec<&RadiusViolation> = undersized.iter().filter(|v| v.convex).collect();
    let concave: Vec<&RadiusViolation> = undersized.iter().filter(|v| !v.convex).collect();
    if !convex.is_empty() {
        let worst = convex.iter().map(|v| v.radius_inches).fold(f64::INFINITY, f64::min);
        parts.push(format!("{} convex (worst {worst:.4}\", min {convex_min}\")", convex.len()));
    }
    if !concave.is_empty() {
        let worst = concave.iter().map(|v| v.radius_inches).fold(f64::INFINITY, f64::min);
        parts.push(format!("{} concave (worst {worst:.4}\", min {concave_min}\")", concave.len()));
    }
    parts.join("; ")
}

fn check_acrylic_corners(
    issues: &mut Vec<ValidationIssue>,
    acrylic: &[&PathEntity],
    scale: f64,
    cfg: &PushThruOptions,
) {
    for entity in acrylic {
        let corners = analyze_entity_corners(entity, scale);
        let (sharp, undersized) = split_corner_violations(
            &corners,
            cfg.acrylic_convex_r,
            cfg.acrylic_concave_r,
            cfg.corner_tol_pct,
        );

        if !sharp.is_empty() {
            issues.push(
                ValidationIssue::error(
                    RULE,
                    "push_thru_sharp_corners",
                    format!(
                        "Acrylic letter {} has {} sharp corner(s)",
                        label(entity),
                        sharp.len()
                    ),
                )
                .detail("sharp_count", sharp.len() as u64)
                .detail(
                    "sharp_corners",
                    json!(sharp
                        .iter()
                        .map(|c| json!({
                            "x": c.position.x,
                            "y": c.position.y,
                            "is_convex": c.is_convex,
                        }))
                        .collect::<Vec<_>>()),
                ),
            );
        }

        if !undersized.is_empty() {
            issues.push(
                ValidationIssue::error(
                    RULE,
                    "push_thru_acrylic_corner_radius",
                    format!(
                        "Acrylic {} undersized radii: {}",
                        label(entity),
                        format_radius_violations(&undersized, cfg.acrylic_convex_r, cfg.acrylic_concave_r)
                    ),
                )
                .detail("violation_count", undersized.len() as u64),
            );
        }
    }
}

/// Corner radii of the cutout rings. Only the compound path's non-exterior
/// sub-loops are walked; their convexity is inverted so "convex" means
/// bulging into the routed opening.
fn check_cutout_corners(
    issues: &mut Vec<ValidationIssue>,
    doc: &SignDocument,
    scale: f64,
    cfg: &PushThruOptions,
) {
    for entity in &doc.entities {
        if !entity.layer.eq_ignore_ascii_case(&cfg.backer_layer) || !entity.is_compound() {
            continue;
        }
        let subpaths = &entity.global.subpaths;
        let exterior = subpaths
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                ring_area(&a.flatten(8))
                    .partial_cmp(&ring_area(&b.flatten(8)))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i);

        let mut corners = Vec::new();
        for (i, sub) in subpaths.iter().enumerate() {
            if Some(i) == exterior {
                continue;
            }
            corners.extend(analyze_subpath_corners(sub, scale, true));
        }

        let (sharp, undersized) = split_corner_violations(
            &corners,
            cfg.cutout_convex_r,
            cfg.cutout_concave_r,
            cfg.corner_tol_pct,
        );

        if !sharp.is_empty() {
            issues.push(
                ValidationIssue::error(
                    RULE,
                    "push_thru_sharp_corners",
                    format!(
                        "Backer cutout(s) in {} have {} sharp corner(s)",
                        label(entity),
                        sharp.len()
                    ),
                )
                .detail("sharp_count", sharp.len() as u64)
                .detail("layer", cfg.backer_layer.clone()),
            );
        }

        if !undersized.is_empty() {
            issues.push(
                ValidationIssue::error(
                    RULE,
                    "push_thru_cutout_corner_radius",
                    format!(
                        "Cutout(s) in {} undersized radii: {}",
                        label(entity),
                        format_radius_violations(&undersized, cfg.cutout_convex_r, cfg.cutout_concave_r)
                    ),
                )
                .detail("violation_count", undersized.len() as u64)
                .detail("layer", cfg.backer_layer.clone()),
            );
        }
    }
}

/// Acrylic letters must keep a margin from the panel edge so the routed
/// opening does not weaken the border.
fn check_acrylic_inset(
    issues: &mut Vec<ValidationIssue>,
    acrylic: &[&PathEntity],
    boxes: &[Vec<Vec2>],
    scale: f64,
    cfg: &PushThruOptions,
) {
    for entity in acrylic {
        let Some(poly) = &entity.global.polygon else { continue };
        let mut best = f64::INFINITY;
        for ring in boxes {
            best = best.min(ring_min_distance(&poly.exterior, ring));
        }
        if !best.is_finite() {
            continue;
        }
        let inset_inches = units_to_inches(best, scale);
        if inset_inches < cfg.min_acrylic_inset_inches {
            issues.push(
                ValidationIssue::error(
                    RULE,
                    "push_thru_acrylic_inset",
                    format!(
                        "Acrylic {} is {inset_inches:.2}\" from box edge (min {}\")",
                        label(entity),
                        cfg.min_acrylic_inset_inches
                    ),
                )
                .detail("inset_inches", json!(inset_inches))
                .detail("required_inches", json!(cfg.min_acrylic_inset_inches)),
            );
        }
    }
}

/// Lexan diffuser sheet: one or more simple closed paths that cover every
/// cutout with clearance, sit inside the panel by a fixed inset, and leave
/// enough solid material around the openings.
fn check_lexan_layer(
    issues: &mut Vec<ValidationIssue>,
    doc: &SignDocument,
    boxes: &[Vec<Vec2>],
    cutouts: &[Cutout],
    scale: f64,
    cfg: &PushThruOptions,
) {
    let lexan: Vec<&PathEntity> = doc
        .entities
        .iter()
        .filter(|e| e.layer.eq_ignore_ascii_case(&cfg.lexan_layer) && e.is_closed())
        .collect();

    if lexan.is_empty() {
        issues.push(
            ValidationIssue::error(
                RULE,
                "push_thru_lexan_exists",
                format!("Working file must include a {} layer", cfg.lexan_layer),
            )
            .detail("lexan_layer", cfg.lexan_layer.clone()),
        );
        return;
    }

    for entity in &lexan {
        if entity.is_compound() {
            issues.push(
                ValidationIssue::error(
                    RULE,
                    "push_thru_lexan_simple",
                    format!(
                        "Lexan path {} must be a simple outline, not a compound path",
                        label(entity)
                    ),
                )
                .detail("layer", cfg.lexan_layer.clone()),
            );
        }
    }

    // Every cutout must fall inside some lexan sheet.
    let mut uncovered = 0usize;
    let mut coverage: Vec<Vec<&Cutout>> = vec![Vec::new(); lexan.len()];
    for cutout in cutouts {
        let mut covered = false;
        for (i, sheet) in lexan.iter().enumerate() {
            let Some(poly) = &sheet.global.polygon else { continue };
            if point_in_ring(cutout.centroid, &poly.exterior) {
                coverage[i].push(cutout);
                covered = true;
                break;
            }
        }
        if !covered {
            uncovered += 1;
        }
    }
    if uncovered > 0 {
        issues.push(
            ValidationIssue::error(
                RULE,
                "push_thru_lexan_containment",
                format!(
                    "{uncovered} backer cutout(s) are not covered by the {} layer",
                    cfg.lexan_layer
                ),
            )
            .detail("uncovered_cutouts", uncovered as u64)
            .detail("cutout_count", cutouts.len() as u64),
        );
    }

    for (i, sheet) in lexan.iter().enumerate() {
        let Some(poly) = &sheet.global.polygon else { continue };
        let sheet_label = label(sheet);

        // Inset from the panel edge.
        let mut edge_distance = f64::INFINITY;
        for ring in boxes {
            edge_distance = edge_distance.min(ring_min_distance(&poly.exterior, ring));
        }
        if edge_distance.is_finite() {
            let inset_inches = units_to_inches(edge_distance, scale);
            if inset_inches < cfg.lexan_inset_inches {
                issues.push(
                    ValidationIssue::error(
                        RULE,
                        "push_thru_lexan_inset",
                        format!(
                            "Lexan {sheet_label} is {inset_inches:.2}\" from box edge (min {}\")",
                            cfg.lexan_inset_inches
                        ),
                    )
                    .detail("inset_inches", json!(inset_inches))
                    .detail("required_inches", json!(cfg.lexan_inset_inches)),
                );
            }
        }

        // Openings must not dominate the sheet.
        let sheet_area = poly.exterior_area();
        if sheet_area > 0.0 {
            let cutout_area: f64 = coverage[i].iter().map(|c| c.area).sum();
            let ratio = cutout_area / sheet_area;
            if ratio > cfg.max_cutout_area_ratio {
                issues.push(
                    ValidationIssue::error(
                        RULE,
                        "push_thru_lexan_area_ratio",
                        format!(
                            "Lexan {sheet_label} cutout area ratio {ratio:.2} exceeds max {:.2}",
                            cfg.max_cutout_area_ratio
                        ),
                    )
                    .detail("area_ratio", json!(ratio))
                    .detail("max_ratio", json!(cfg.max_cutout_area_ratio)),
                );
            }
        }

        // Clearance between each covered cutout and the sheet boundary.
        for cutout in &coverage[i] {
            let clearance = ring_min_distance(&cutout.ring, &poly.exterior);
            let clearance_inches = units_to_inches(clearance, scale);
            if clearance_inches < cfg.min_lexan_cutout_clearance {
                issues.push(
                    ValidationIssue::error(
                        RULE,
                        "push_thru_lexan_cutout_clearance",
                        format!(
                            "Cutout from path_{} is {clearance_inches:.2}\" from the edge of lexan {sheet_label} (min {}\")",
                            cutout.source_id, cfg.min_lexan_cutout_clearance
                        ),
                    )
                    .detail("clearance_inches", json!(clearance_inches))
                    .detail("required_inches", json!(cfg.min_lexan_cutout_clearance)),
                );
            }
        }
    }
}

fn label(entity: &PathEntity) -> String {
    match &entity.source_id {
        Some(id) => id.clone(),
        None => format!("path_{}", entity.id),
    }
}
