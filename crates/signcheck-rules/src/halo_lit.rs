//! Halo-lit channel letters: light washes the wall behind the sign. The
//! return layer must be hole-free, the back panel sits smaller than the
//! return and carries the wire and mounting holes, and the face overhangs
//! the return.

use serde_json::json;
use std::collections::BTreeMap;

use signcheck_core::config::RuleOptions;
use signcheck_core::model::{HoleType, LetterAnalysisResult, SignDocument};
use signcheck_core::report::ValidationIssue;

use crate::common::{
    check_hole_centering, layer_metrics, layers_found, match_by_centroid,
    required_mounting_holes, units_to_inches, CenteringConfig, LetterMetrics, OffsetDirection,
    PairedOffsetSpec, RateRounding,
};

const RULE: &str = "halo_lit_structure";

pub fn check_halo_lit_structure(
    doc: &SignDocument,
    analysis: &LetterAnalysisResult,
    opts: &RuleOptions,
) -> Vec<ValidationIssue> {
    let return_layer = opts.get_str("return_layer", "return").to_string();
    let back_layer = opts.get_str("back_layer", "back").to_string();
    let face_layer = opts.get_str("face_layer", "face").to_string();
    let check_wire_holes = opts.get_bool("check_wire_holes", true);
    let expected_mounting_names = opts
        .0
        .get("expected_mounting_names")
        .and_then(serde_json::Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(serde_json::Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        });
    let min_mounting_holes = opts.get_usize("min_mounting_holes", 2);
    let holes_per_inch_perimeter = opts.get_f64("mounting_holes_per_inch_perimeter", 0.05);
    let holes_per_sq_inch_area = opts.get_f64("mounting_holes_per_sq_inch_area", 0.0123);
    let max_match_distance = opts.get_f64("max_match_distance", 10.0);
    let miter_factor = opts.get_f64("miter_factor", 4.5);
    let back_offset = PairedOffsetSpec {
        direction: OffsetDirection::Shrink,
        min_mm: opts.get_f64("back_offset_min_mm", 2.0),
        max_mm: opts.get_f64("back_offset_min_mm", 2.0),
        miter_factor,
        tolerance_mm: 0.05,
    };
    let face_offset = PairedOffsetSpec {
        direction: OffsetDirection::Grow,
        min_mm: opts.get_f64("face_offset_min_mm", 1.2),
        max_mm: opts.get_f64("face_offset_min_mm", 1.2),
        miter_factor,
        tolerance_mm: 0.05,
    };

    let scale = analysis.scale;
    let mut issues = Vec::new();

    issues.extend(per_letter_issues(
        doc,
        analysis,
        &return_layer,
        &back_layer,
        check_wire_holes,
        expected_mounting_names.as_deref(),
    ));

    let return_letters = layer_metrics(doc, analysis, &return_layer);
    if return_letters.is_empty() {
        let available = layers_found(analysis);
        issues.push(
            ValidationIssue::warning(
                RULE,
                "halo_lit_structure",
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
            "halo_lit_structure",
            format!("Found {} letter(s) in {return_layer} layer", return_letters.len()),
        )
        .detail("layer", return_layer.clone())
        .detail("count", return_letters.len() as u64),
    );

    // Back layer: count, mounting holes, and the shrink offset.
    let back_letters = layer_metrics(doc, analysis, &back_layer);
    issues.push(
        ValidationIssue::info(
            RULE,
            "halo_lit_structure",
            format!("Found {} letter(s) in {back_layer} layer", back_letters.len()),
        )
        .detail("layer", back_layer.clone())
        .detail("count", back_letters.len() as u64),
    );

    if back_letters.is_empty() {
        issues.push(
            ValidationIssue::error(
                RULE,
                "halo_lit_back_missing",
                format!("Working file must include a {back_layer} layer with letters"),
            )
            .detail("back_layer", back_layer.clone())
            .detail("return_count", return_letters.len() as u64),
        );
    } else if back_letters.len() != return_letters.len() {
        issues.push(
            ValidationIssue::error(
                RULE,
                "halo_lit_back_count",
                format!(
                    "{back_layer} layer has {} letters, {return_layer} has {}",
                    back_letters.len(),
                    return_letters.len()
                ),
            )
            .detail("back_count", back_letters.len() as u64)
            .detail("return_count", return_letters.len() as u64)
            .detail("back_layer", back_layer.clone())
            .detail("return_layer", return_layer.clone()),
        );
    }

    for letter in &back_letters {
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
            issues.push(
                ValidationIssue::warning(
                    RULE,
                    "halo_lit_back_mounting",
                    format!(
                        "Back letter {} needs {required} mounting holes, has {actual}",
                        letter.label()
                    ),
                )
                .detail("layer", letter.group.layer.clone())
                .detail("actual_holes", actual as u64)
                .detail("required_holes", required as u64)
                .detail("real_perimeter_inches", json!(perimeter_inches))
                .detail("real_area_sq_inches", json!(area_sq_inches))
                .detail("holes_by_perimeter", by_perimeter as u64)
                .detail("holes_by_area", by_area as u64),
            );
        }
    }

    issues.extend(paired_offset_issues(
        &back_letters,
        &return_letters,
        &back_offset,
        scale,
        max_match_distance,
        &back_layer,
        "halo_lit_back_offset",
        "Back",
        "is larger than return (should be smaller)",
    ));

    // Face layer: count and the grow offset.
    let face_letters = layer_metrics(doc, analysis, &face_layer);
    issues.push(
        ValidationIssue::info(
            RULE,
            "halo_lit_structure",
            format!("Found {} letter(s) in {face_layer} layer", face_letters.len()),
        )
        .detail("layer", face_layer.clone())
        .detail("count", face_letters.len() as u64),
    );

    if face_letters.is_empty() {
        issues.push(
            ValidationIssue::error(
                RULE,
                "halo_lit_face_missing",
                format!("Working file must include a {face_layer} layer with letters"),
            )
            .detail("face_layer", face_layer.clone())
            .detail("return_count", return_letters.len() as u64),
        );
    } else if face_letters.len() != return_letters.len() {
        issues.push(
            ValidationIssue::error(
                RULE,
                "halo_lit_face_count",
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

    issues.extend(paired_offset_issues(
        &face_letters,
        &return_letters,
        &face_offset,
        scale,
        max_match_distance,
        &face_layer,
        "halo_lit_face_offset",
        "Face",
        "is smaller than return (should be larger)",
    ));

    // Mounting holes live on the back panel, so centering runs there.
    let centering = CenteringConfig::from_options(opts);
    issues.extend(check_hole_centering(doc, analysis, &back_layer, &centering, RULE));

    issues
}

/// Return letters must have no holes at all; the back panel carries them.
fn per_letter_issues(
    doc: &SignDocument,
    analysis: &LetterAnalysisResult,
    return_layer: &str,
    back_layer: &str,
    check_wire_holes: bool,
    expected_mounting_names: Option<&[String]>,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for letter in layer_metrics(doc, analysis, return_layer) {
        if letter.group.holes.is_empty() {
            continue;
        }
        let wire = letter.wire_hole_count();
        let mounting = letter.mounting_hole_count();
        let unknown = letter.unknown_holes().len();
        let mut parts = Vec::new();
        if wire > 0 {
            parts.push(format!("{wire} wire"));
        }
        if mounting > 0 {
            parts.push(format!("{mounting} mounting"));
        }
        if unknown > 0 {
            parts.push(format!("{unknown} unknown"));
        }
        issues.push(
            ValidationIssue::error(
                RULE,
                "halo_lit_return_no_holes",
                format!(
                    "Return letter {} has holes ({}): return layer must have no holes",
                    letter.label(),
                    parts.join(", ")
                ),
            )
            .detail("layer", letter.group.layer.clone())
            .detail("wire_count", wire as u64)
            .detail("mounting_count", mounting as u64)
            .detail("unknown_count", unknown as u64),
        );
    }

    for letter in layer_metrics(doc, analysis, back_layer) {
        let label = letter.label();
        let wire = letter.wire_hole_count();
        if check_wire_holes {
            if wire == 0 {
                issues.push(
                    ValidationIssue::error(
                        RULE,
                        "halo_lit_back_wire_hole",
                        format!("Back letter {label} has no wire hole"),
                    )
                    .detail("layer", letter.group.layer.clone())
                    .detail(
                        "hole_counts",
                        json!({
                            "wire": wire,
                            "mounting": letter.mounting_hole_count(),
                            "unknown": letter.unknown_holes().len(),
                        }),
                    ),
                );
            } else if wire > 1 {
                issues.push(
                    ValidationIssue::warning(
                        RULE,
                        "halo_lit_back_multiple_wire_holes",
                        format!("Back letter {label} has {wire} wire holes, expected 1"),
                    )
                    .detail("wire_hole_count", wire as u64),
                );
            }
        } else if wire > 0 {
            issues.push(
                ValidationIssue::warning(
                    RULE,
                    "halo_lit_back_unexpected_wire_hole",
                    format!("Back letter {label} has {wire} wire hole(s) but none are expected"),
                )
                .detail("wire_hole_count", wire as u64),
            );
        }

        if let Some(expected) = expected_mounting_names {
            let mut unexpected: BTreeMap<&str, usize> = BTreeMap::new();
            for hole in letter.holes_of(HoleType::Mounting) {
                if let Some(name) = &hole.size_name {
                    if !expected.iter().any(|e| e == name) {
                        *unexpected.entry(name.as_str()).or_insert(0) += 1;
                    }
                }
            }
            for (name, count) in unexpected {
                let plural = if count > 1 { "s" } else { "" };
                issues.push(
                    ValidationIssue::warning(
                        RULE,
                        "unexpected_mounting_type",
                        format!(
                            "Back letter {label} has {count}x {name} hole{plural} (expected {})",
                            expected.join(", ")
                        ),
                    )
                    .detail("layer", letter.group.layer.clone())
                    .detail("letter_id", label.clone())
                    .detail("unexpected_type", name)
                    .detail("count", count as u64)
                    .detail("expected_types", json!(expected)),
                );
            }
        }

        for hole in letter.unknown_holes() {
            issues.push(
                ValidationIssue::info(
                    RULE,
                    "unknown_hole_size",
                    format!(
                        "Hole path_{} in back letter {label} has unusual diameter {:.2}mm",
                        hole.entity_id, hole.real_diameter_mm
                    ),
                )
                .detail("layer", letter.group.layer.clone())
                .detail("letter_id", label.clone())
                .detail("diameter_real_mm", json!(hole.real_diameter_mm)),
            );
        }
    }

    issues
}

#[allow(clippy::too_many_arguments)]
fn paired_offset_issues(
    derived: &[LetterMetrics],
    source: &[LetterMetrics],
    spec: &PairedOffsetSpec,
    scale: f64,
    max_match_distance: f64,
    layer: &str,
    code: &str,
    role: &str,
    wrong_direction_note: &str,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if derived.is_empty() || source.is_empty() {
        return issues;
    }

    for m in match_by_centroid(derived, source) {
        let d = &derived[m.derived];
        let Some(source_idx) = m.source.filter(|_| m.distance <= max_match_distance) else {
            issues.push(
                ValidationIssue::warning(
                    RULE,
                    code,
                    format!(
                        "{role} letter {} has no matching return letter (nearest {:.1} units away)",
                        d.label(),
                        m.distance
                    ),
                )
                .detail("path_id", d.label())
                .detail("distance", json!(m.distance)),
            );
            continue;
        };
        let s = &source[source_idx];
        let measured = spec.measure(d, s, scale);

        if measured.width_diff_mm < 0.0 || measured.height_diff_mm < 0.0 {
            issues.push(
                ValidationIssue::error(
                    RULE,
                    code,
                    format!("{role} letter {} {wrong_direction_note}", d.label()),
                )
                .detail("layer", layer)
                .detail("path_id", d.label())
                .detail("return_path_id", s.label())
                .detail("width_diff_mm", json!(measured.width_diff_mm))
                .detail("height_diff_mm", json!(measured.height_diff_mm)),
            );
            continue;
        }

        let width_ok = spec.per_side_ok(measured.width_per_side_mm);
        let height_ok = spec.per_side_ok(measured.height_per_side_mm);
        if !width_ok || !height_ok {
            let expected_total_min = spec.min_mm * 2.0;
            let expected_total_max = spec.max_per_side_mm() * 2.0;
            issues.push(
                ValidationIssue::error(
                    RULE,
                    code,
                    format!(
                        "{role} {} offset: {:.1}mm W x {:.1}mm H (expected {expected_total_min:.1}-{expected_total_max:.1}mm total)",
                        d.label(),
                        measured.width_diff_mm,
                        measured.height_diff_mm
                    ),
                )
                .detail("layer", layer)
                .detail("path_id", d.label())
                .detail("return_path_id", s.label())
                .detail("width_diff_mm", json!(measured.width_diff_mm))
                .detail("height_diff_mm", json!(measured.height_diff_mm))
                .detail("width_per_side_mm", json!(measured.width_per_side_mm))
                .detail("height_per_side_mm", json!(measured.height_per_side_mm))
                .detail("centroid_distance", json!(m.distance))
                .detail("expected_min_per_side_mm", json!(spec.min_mm))
                .detail("expected_max_per_side_mm", json!(spec.max_per_side_mm()))
                .detail("miter_factor", json!(spec.miter_factor)),
            );
        }
    }

    issues
}
