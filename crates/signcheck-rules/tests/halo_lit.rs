use signcheck_core::config::RulesConfig;
use signcheck_core::report::{Severity, Status, ValidationResult};
use signcheck_rules::Validator;

const INKSCAPE_NS: &str = "xmlns:inkscape=\"http://www.inkscape.org/namespaces/inkscape\"";

fn validate(svg: &str) -> ValidationResult {
    let config = RulesConfig::from_json(r#"{"halo_lit_structure": {}}"#).unwrap();
    Validator::new(config).validate_svg_text(svg, "test.svg", "halo_lit")
}

fn count_code(result: &ValidationResult, code: &str, severity: Severity) -> usize {
    result
        .issues
        .iter()
        .filter(|i| i.code == code && i.severity == severity)
        .count()
}

/// Hole-free return, back panel 2.0mm smaller per side carrying the wire
/// and mounting holes, face 1.2mm larger per side.
fn clean_sign() -> String {
    format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 400 400">
            <g inkscape:label="return">
                <rect x="100" y="100" width="144" height="144"/>
            </g>
            <g inkscape:label="back">
                <rect x="102" y="102" width="140" height="140"/>
                <circle cx="172" cy="172" r="5"/>
                <circle cx="130" cy="130" r="2"/>
                <circle cx="214" cy="214" r="2"/>
            </g>
            <g inkscape:label="face">
                <rect x="98.8" y="98.8" width="146.4" height="146.4"/>
            </g>
        </svg>"#
    )
}

#[test]
fn compliant_sign_passes() {
    let result = validate(&clean_sign());
    assert_eq!(Status::Passed, result.status);
    assert_eq!(0, result.error_count());
    assert_eq!(0, result.warning_count());
}

#[test]
fn holes_on_return_layer_are_an_error() {
    let svg = clean_sign().replace(
        r#"<rect x="100" y="100" width="144" height="144"/>"#,
        r#"<rect x="100" y="100" width="144" height="144"/><circle cx="120" cy="120" r="2"/>"#,
    );
    let result = validate(&svg);
    assert_eq!(Status::Failed, result.status);
    assert_eq!(1, count_code(&result, "halo_lit_return_no_holes", Severity::Error));
    let issue = result.issues.iter().find(|i| i.code == "halo_lit_return_no_holes").unwrap();
    assert!(issue.message.contains("1 mounting"));
}

#[test]
fn back_larger_than_return_is_wrong_direction() {
    let svg = clean_sign().replace(
        r#"<rect x="102" y="102" width="140" height="140"/>"#,
        r#"<rect x="96" y="96" width="152" height="152"/>"#,
    );
    let result = validate(&svg);
    assert_eq!(Status::Failed, result.status);
    assert_eq!(1, count_code(&result, "halo_lit_back_offset", Severity::Error));
    let issue = result.issues.iter().find(|i| i.code == "halo_lit_back_offset").unwrap();
    assert!(issue.message.contains("is larger than return (should be smaller)"));
}

#[test]
fn face_smaller_than_return_is_wrong_direction() {
    let svg = clean_sign().replace(
        r#"<rect x="98.8" y="98.8" width="146.4" height="146.4"/>"#,
        r#"<rect x="101" y="101" width="142" height="142"/>"#,
    );
    let result = validate(&svg);
    assert_eq!(1, count_code(&result, "halo_lit_face_offset", Severity::Error));
    let issue = result.issues.iter().find(|i| i.code == "halo_lit_face_offset").unwrap();
    assert!(issue.message.contains("is smaller than return (should be larger)"));
}

#[test]
fn back_offset_outside_tolerance_fails() {
    // 1.5mm per side instead of 2.0 +/-0.05.
    let svg = clean_sign().replace(
        r#"<rect x="102" y="102" width="140" height="140"/>"#,
        r#"<rect x="101.5" y="101.5" width="141" height="141"/>"#,
    );
    let result = validate(&svg);
    assert_eq!(1, count_code(&result, "halo_lit_back_offset", Severity::Error));
}

#[test]
fn back_without_wire_hole_is_error() {
    let svg = clean_sign().replace(r#"<circle cx="172" cy="172" r="5"/>"#, "");
    let result = validate(&svg);
    assert_eq!(Status::Failed, result.status);
    assert_eq!(1, count_code(&result, "halo_lit_back_wire_hole", Severity::Error));
}

#[test]
fn missing_back_layer_is_error() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 400 400">
            <g inkscape:label="return"><rect x="100" y="100" width="144" height="144"/></g>
            <g inkscape:label="face"><rect x="98.8" y="98.8" width="146.4" height="146.4"/></g>
        </svg>"#
    );
    let result = validate(&svg);
    assert_eq!(1, count_code(&result, "halo_lit_back_missing", Severity::Error));
}

#[test]
fn missing_face_layer_is_error() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 400 400">
            <g inkscape:label="return"><rect x="100" y="100" width="144" height="144"/></g>
            <g inkscape:label="back">
                <rect x="102" y="102" width="140" height="140"/>
                <circle cx="172" cy="172" r="5"/>
                <circle cx="130" cy="130" r="2"/>
                <circle cx="214" cy="214" r="2"/>
            </g>
        </svg>"#
    );
    let result = validate(&svg);
    assert_eq!(1, count_code(&result, "halo_lit_face_missing", Severity::Error));
}

#[test]
fn unexpected_mounting_type_warns_when_restricted() {
    // Pins are present but the order only allows rivnuts.
    let config = RulesConfig::from_json(
        r#"{"halo_lit_structure": {"expected_mounting_names": ["Rivnut"]}}"#,
    )
    .unwrap();
    let result = Validator::new(config).validate_svg_text(&clean_sign(), "test.svg", "halo_lit");
    assert_eq!(1, count_code(&result, "unexpected_mounting_type", Severity::Warning));
    let issue = result.issues.iter().find(|i| i.code == "unexpected_mounting_type").unwrap();
    assert!(issue.message.contains("2x Pin Thread Mounting"));
}
