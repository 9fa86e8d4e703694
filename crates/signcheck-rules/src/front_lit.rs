//! Front-lit channel letters: a trim-cap layer wraps each return letter.
//! Every return letter needs one wire hole and enough mounting holes; the
//! trim layer must match the return letters one-to-one and sit a fixed
//! offset larger per side.

use serde_json::json;

use signcheck_core::config::RuleOptions;
use signcheck_core::model::{LetterAnalysisResult, SignDocument};
use signcheck_core::report::ValidationIssue;

use crate::common::{
    layer_metrics, layers_found, letter_hole_issues, match_by_centroid, required_mounting_holes,
    units_to_inches, OffsetDirection, PairedOffsetSpec, RateRounding,
};

const RULE: &str = "front_lit_structure";

pub fn check_front_lit_structure(
    doc: &SignDocument,
    analysis: &LetterAnalysisResult,
    opts: &RuleOptions,
) -> Vec<ValidationIssue> {
    let return_layer = opts.get_str("return_layer", "return").to_string();
    let trim_layer = opts.get_str("trim_layer", "trimcap").to_string();
    let check_wire_holes = opts.get_bool("check_wire_holes", true);
    let min_mounting_holes = opts.get_usize("min_mounting_holes", 2);
    let holes_per_inch_perimeter = opts.get_f64("mounting_holes_per_inch_perimeter", 0.05);
    let holes_per_sq_inch_area = opts.get_f64("mounting_holes_per_sq_inch_area", 0.0123);
    let max_match_distance = opts.get_f64("max_match_distance", 10.0);
    let offset = PairedOffsetSpec {
        direction: OffsetDirection::Grow,
        min_mm: opts.get_f64("trim_offset_min_mm", 1.9),
        max_mm: opts.get_f64("trim_offset_max_mm", 2.1),
        miter_factor: opts.get_f64("miter_factor", 4.0),
        tolerance_mm: 0.0,
    };

    let scale = analysis.scale;
    let mut issues = Vec::new();

    let return_letters = layer_metrics(doc, analysis, &return_layer);
    if return_letters.is_empty() {
        let available = layers_found(analysis);
        issues.push(
            ValidationIssue::warning(
                RULE,
                "front_lit_structure",
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
            "front_lit_structure",
            format!("Found {} letter(s) in {return_layer} layer", return_letters.len()),
        )
        .detail("layer", return_layer.clone())
        .detail("count", return_letters.len() as u64),
    );

    issues.extend(letter_hole_issues(doc, analysis, &return_layer, check_wire_holes, RULE));

    // Mounting holes scale with perimeter and area.
    for letter in &return_letters {
        let perimeter_inches = units_to_inches(letter.perimeter, scale);
        let area_sq_inches = letter.area / (72.0 * scale).powi(2);
        let (required, by_perimeter, by_area) = required_mounting_holes(
            min_mounting_holes,
            perimeter_inches,
            holes_per_inch_perimeter,
            area_sq_inches,
            holes_per_sq_inch_area,
            RateRounding::Truncate,
        );
        let actual = letter.mounting_hole_count();
        if actual < required {
            issues.push(
                ValidationIssue::warning(
                    RULE,
                    "front_lit_mounting_holes",
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
                .detail("holes_by_area", by_area as u64),
            );
        }
    }

    // Trim layer must mirror the return letters.
    let trim_letters = layer_metrics(doc, analysis, &trim_layer);
    issues.push(
        ValidationIssue::info(
            RULE,
            "front_lit_structure",
            format!("Found {} letter(s) in {trim_layer} layer", trim_letters.len()),
        )
        .detail("layer", trim_layer.clone())
        .detail("count", trim_letters.len() as u64),
    );

    if trim_letters.len() != return_letters.len() {
        issues.push(
            ValidationIssue::error(
                RULE,
                "front_lit_trim_count",
                format!(
                    "{trim_layer} layer has {} letters, {return_layer} has {}",
                    trim_letters.len(),
                    return_letters.len()
                ),
            )
            .detail("trim_count", trim_letters.len() as u64)
            .detail("return_count", return_letters.len() as u64)
            .detail("trim_layer", trim_layer.clone())
            .detail("return_layer", return_layer.clone()),
        );
    }

    if !trim_letters.is_empty() {
        for m in match_by_centroid(&trim_letters, &return_letters) {
            let trim = &trim_letters[m.derived];
            let Some(source_idx) = m.source.filter(|_| m.distance <= max_match_distance) else {
                issues.push(
                    ValidationIssue::warning(
                        RULE,
                        "front_lit_trim_offset",
                        format!(
                            "Trim letter {} has no matching return letter (nearest is {:.1} units away)",
                            trim.label(),
                            m.distance
                        ),
                    )
                    .detail("trim_path_id", trim.label())
                    .detail("distance", json!(m.distance)),
                );
                continue;
            };
            let ret = &return_letters[source_idx];
            let measured = offset.measure(trim, ret, scale);

            let width_ok = offset.per_side_ok(measured.width_per_side_mm);
            let height_ok = offset.per_side_ok(measured.height_per_side_mm);
            if !width_ok || !height_ok {
                let expected_total_min = offset.min_mm * 2.0;
                let expected_total_max = offset.max_per_side_mm() * 2.0;
                issues.push(
                    ValidationIssue::error(
                        RULE,
                        "front_lit_trim_offset",
                        format!(
                            "Trim {} offset incorrect: width diff {:.2}mm, height diff {:.2}mm (expected {expected_total_min:.2}-{expected_total_max:.2}mm total)",
                            trim.label(),
                            measured.width_diff_mm,
                            measured.height_diff_mm
                        ),
                    )
                    .detail("trim_path_id", trim.label())
                    .detail("return_path_id", ret.label())
                    .detail("width_diff_mm", json!(measured.width_diff_mm))
                    .detail("height_diff_mm", json!(measured.height_diff_mm))
                    .detail("centroid_distance", json!(m.distance))
                    .detail("expected_min_total", json!(expected_total_min))
                    .detail("expected_max_total", json!(expected_total_max))
                    .detail("miter_factor", json!(offset.miter_factor)),
                );
            }
        }
    }

    issues
}
