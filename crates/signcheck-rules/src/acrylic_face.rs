//! Front-lit letters with a routed acrylic face instead of a trim cap. The
//! face sits slightly larger than the return, adjacent faces need router
//! clearance, and each face should carry an engraving path inset a fixed
//! distance from its outline.

use serde_json::json;

use signcheck_core::config::RuleOptions;
use signcheck_core::model::{HoleType, LetterAnalysisResult, SignDocument};
use signcheck_core::report::ValidationIssue;

use crate::common::{
    buffered_spacing, layer_metrics, layers_found, letter_hole_issues, match_by_centroid,
    mm_to_units, required_mounting_holes, units_to_inches, units_to_mm, OffsetDirection,
    PairedOffsetSpec, RateRounding,
};

const RULE: &str = "front_lit_acrylic_face_structure";

/// Reclassifies non-circular inner paths on the face layer as engraving
/// paths when all four bounding-box insets match the configured offset.
/// Runs after hole-size classification, before issue generation. Returns a
/// warning per face letter with no engraving path.
pub fn classify_engraving_paths(
    doc: &SignDocument,
    analysis: &mut LetterAnalysisResult,
    opts: &RuleOptions,
) -> Vec<ValidationIssue> {
    let face_layer = opts.get_str("face_layer", "face").to_string();
    let offset_mm = opts.get_f64("engraving_offset_mm", 0.4);
    let tolerance_mm = opts.get_f64("engraving_offset_tolerance_mm", 0.15);
    let scale = analysis.scale;

    let mut issues = Vec::new();
    for group in &mut analysis.letters {
        if !group.layer.eq_ignore_ascii_case(&face_layer) {
            continue;
        }
        let Some(letter_entity) = doc.entity(group.entity_id) else { continue };
        let letter_bbox = letter_entity.global.bbox;
        if letter_bbox.width() <= 0.0 || letter_bbox.height() <= 0.0 {
            continue;
        }
        let letter_label = match &letter_entity.source_id {
            Some(id) => id.clone(),
            None => format!("path_{}", letter_entity.id),
        };

        let mut found_engraving = false;
        for hole in &mut group.holes {
            // Only non-circular inner paths; circles keep their size class.
            if hole.diameter > 0.0 {
                continue;
            }
            if !matches!(hole.hole_type, HoleType::Unclassified | HoleType::Unknown) {
                continue;
            }
            let Some(hole_entity) = doc.entity(hole.entity_id) else { continue };
            let hole_bbox = hole_entity.global.bbox;

            let insets_mm = [
                units_to_mm(hole_bbox.min.x - letter_bbox.min.x, scale),
                units_to_mm(hole_bbox.min.y - letter_bbox.min.y, scale),
                units_to_mm(letter_bbox.max.x - hole_bbox.max.x, scale),
                units_to_mm(letter_bbox.max.y - hole_bbox.max.y, scale),
            ];
            if insets_mm.iter().all(|i| (i - offset_mm).abs() <= tolerance_mm) {
                hole.hole_type = HoleType::Engraving;
                hole.size_name = Some("Engraving Path".to_string());
                found_engraving = true;
            }
        }

        if !found_engraving {
            issues.push(
                ValidationIssue::warning(
                    RULE,
                    "acrylic_face_engraving_missing",
                    format!("Face letter {letter_label} has no engraving path"),
                )
                .detail("layer", face_layer.clone())
                .detail("letter_id", letter_label)
                .detail("expected_offset_mm", json!(offset_mm))
                .detail("tolerance_mm", json!(tolerance_mm)),
            );
        }
    }
    issues
}

pub fn check_front_lit_acrylic_face_structure(
    doc: &SignDocument,
    analysis: &LetterAnalysisResult,
    opts: &RuleOptions,
) -> Vec<ValidationIssue> {
    let return_layer = opts.get_str("return_layer", "return").to_string();
    let face_layer = opts.get_str("face_layer", "face").to_string();
    let check_wire_holes = opts.get_bool("check_wire_holes", true);
    let min_mounting_holes = opts.get_usize("min_mounting_holes", 2);
    let holes_per_inch_perimeter = opts.get_f64("mounting_holes_per_inch_perimeter", 0.05);
    let holes_per_sq_inch_area = opts.get_f64("mounting_holes_per_sq_inch_area", 0.0123);
    let face_offset_min_mm = opts.get_f64("face_offset_min_mm", 0.3);
    let min_spacing_inches = opts.get_f64("min_face_spacing_inches", 0.10);
    let max_match_distance = opts.get_f64("max_match_distance", 10.0);

    let scale = analysis.scale;
    let mut issues = Vec::new();

    let return_letters = layer_metrics(doc, analysis, &return_layer);
    if return_letters.is_empty() {
        let available = layers_found(analysis);
        issues.push(
            ValidationIssue::warning(
                RULE,
                "acrylic_face_structure",
                format!(
                    "No letters found in \"{return_layer}\" layer. Available layers: {}",
                    available.join(", ")
                ),
            )
            .detail("available_layers", json!(available)),
        );
        return issues;
    }

    issues.push(
        ValidationIssue::info(
            RULE,
            "acrylic_face_structure",
            format!("Found {} letter(s) in {return_layer} layer", return_letters.len()),
        )
        .detail("layer", return_layer.clone())
        .detail("count", return_letters.len() as u64),
    );

    issues.extend(letter_hole_issues(doc, analysis, &return_layer, check_wire_holes, RULE));

    for letter in &return_letters {
        let perimeter_inches = units_to_inches(letter.perimeter, scale);
        let area_sq_inches = letter.area / (72.0 * scale).powi(2);
        let (required, by_perimeter, by_area) = required_mounting_holes(
            min_mounting_holes,
            perimeter_inches,
            holes_per_inch_perimeter,
            area_sq_inches,
            holes_per_sq_inch_area,
            RateRounding::Nearest,
        );
        let actual = letter.mounting_hole_count();
        if actual < required {
            let unknown = letter.unknown_holes();
            issues.push(
                ValidationIssue::warning(
                    RULE,
                    "acrylic_face_mounting_holes",
                    format!(
                        "Letter {} needs {required} mounting holes, has {actual}",
                        letter.label()
                    ),
                )
                .detail("layer", letter.group.layer.clone())
                .detail("actual_holes", actual as u64)
                .detail("required_holes", required as u64)
                .detail("real_perimeter_inches", json!(perimeter_inches))
                .detail("real_area_sq_inches", json!(area_sq_inches))
                .detail("holes_by_perimeter", by_perimeter as u64)
                .detail("holes_by_area", by_area as u64)
                .detail("unknown_hole_count", unknown.len() as u64),
            );
        }
    }

    // Face layer must mirror the return letters.
    let face_letters = layer_metrics(doc, analysis, &face_layer);
    issues.push(
        ValidationIssue::info(
            RULE,
            "acrylic_face_structure",
            format!("Found {} letter(s) in {face_layer} layer", face_letters.len()),
        )
        .detail("layer", face_layer.clone())
        .detail("count", face_letters.len() as u64),
    );

    if face_letters.is_empty() {
        issues.push(
            ValidationIssue::error(
                RULE,
                "acrylic_face_missing",
                format!("Working file must include a {face_layer} layer with letters"),
            )
            .detail("face_layer", face_layer.clone())
            .detail("return_count", return_letters.len() as u64),
        );
    } else if face_letters.len() != return_letters.len() {
        issues.push(
            ValidationIssue::error(
                RULE,
                "acrylic_face_count",
                format!(
                    "{face_layer} layer has {} letters, {return_layer} has {}",
                    face_letters.len(),
                    return_letters.len()
                ),
            )
            .detail("face_count", face_letters.len() as u64)
            .detail("return_count", return_letters.len() as u64)
            .detail("face_layer", face_layer.clone())
            .detail("return_layer", return_layer.clone()),
        );
    }

    // Face offset: grows past the return with no upper band; the acrylic
    // just needs enough overhang to seat on the return.
    let spec = PairedOffsetSpec {
        direction: OffsetDirection::Grow,
        min_mm: face_offset_min_mm,
        max_mm: f64::INFINITY,
        miter_factor: 1.0,
        tolerance_mm: 0.0,
    };
    if !face_letters.is_empty() {
        for m in match_by_centroid(&face_letters, &return_letters) {
            let face = &face_letters[m.derived];
            let Some(source_idx) = m.source.filter(|_| m.distance <= max_match_distance) else {
                issues.push(
                    ValidationIssue::warning(
                        RULE,
                        "acrylic_face_offset",
                        format!(
                            "Face letter {} has no matching return letter (nearest {:.1} units away)",
                            face.label(),
                            m.distance
                        ),
                    )
                    .detail("face_path_id", face.label())
                    .detail("distance", json!(m.distance)),
                );
                continue;
            };
            let ret = &return_letters[source_idx];
            let measured = spec.measure(face, ret, scale);

            if measured.width_diff_mm < 0.0 || measured.height_diff_mm < 0.0 {
                issues.push(
                    ValidationIssue::error(
                        RULE,
                        "acrylic_face_offset",
                        format!("Return is larger than face for {}", face.label()),
                    )
                    .detail("layer", face_layer.clone())
                    .detail("face_path_id", face.label())
                    .detail("return_path_id", ret.label())
                    .detail("width_diff_mm", json!(measured.width_diff_mm))
                    .detail("height_diff_mm", json!(measured.height_diff_mm)),
                );
                continue;
            }

            if measured.width_per_side_mm < face_offset_min_mm
                || measured.height_per_side_mm < face_offset_min_mm
            {
                issues.push(
                    ValidationIssue::error(
                        RULE,
                        "acrylic_face_offset",
                        format!(
                            "Face {} offset too small: {:.2}mm W, {:.2}mm H per side (min {face_offset_min_mm}mm)",
                            face.label(),
                            measured.width_per_side_mm,
                            measured.height_per_side_mm
                        ),
                    )
                    .detail("layer", face_layer.clone())
                    .detail("face_path_id", face.label())
                    .detail("return_path_id", ret.label())
                    .detail("width_diff_mm", json!(measured.width_diff_mm))
                    .detail("height_diff_mm", json!(measured.height_diff_mm))
                    .detail("width_per_side_mm", json!(measured.width_per_side_mm))
                    .detail("height_per_side_mm", json!(measured.height_per_side_mm))
                    .detail("required_min_per_side_mm", json!(face_offset_min_mm)),
                );
            }
        }
    }

    // Face spacing, simulated by buffering the return shapes outward.
    if return_letters.len() >= 2 {
        let buffer_units = mm_to_units(face_offset_min_mm, scale);
        for pair in buffered_spacing(&return_letters, buffer_units) {
            let distance_inches = units_to_inches(pair.distance_units, scale);
            if distance_inches < min_spacing_inches {
                let a = &return_letters[pair.a];
                let b = &return_letters[pair.b];
                issues.push(
                    ValidationIssue::error(
                        RULE,
                        "acrylic_face_spacing",
                        format!(
                            "Face letters {} and {} are {distance_inches:.3}\" apart (min {min_spacing_inches}\")",
                            a.label(),
                            b.label()
                        ),
                    )
                    .detail("letter_a", a.label())
                    .detail("letter_b", b.label())
                    .detail("distance_inches", json!(distance_inches))
                    .detail("required_inches", json!(min_spacing_inches))
                    .detail("distance_file_units", json!(pair.distance_units)),
                );
            }
        }
    }

    issues
}
