use signcheck_core::config::RulesConfig;
use signcheck_core::model::HoleType;
use signcheck_core::report::{Severity, Status, ValidationResult};
use signcheck_rules::Validator;

const INKSCAPE_NS: &str = "xmlns:inkscape=\"http://www.inkscape.org/namespaces/inkscape\"";

fn validate(svg: &str) -> ValidationResult {
    let config = RulesConfig::from_json(r#"{"front_lit_acrylic_face_structure": {}}"#).unwrap();
    Validator::new(config).validate_svg_text(svg, "test.svg", "front_lit_acrylic_face")
}

fn count_code(result: &ValidationResult, code: &str, severity: Severity) -> usize {
    result
        .issues
        .iter()
        .filter(|i| i.code == code && i.severity == severity)
        .count()
}

/// Return letter with wire and mounting holes; acrylic face 0.5mm larger
/// per side with an engraving rectangle inset 0.4mm from the face outline.
fn clean_sign() -> String {
    format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 400 400">
            <g inkscape:label="return">
                <rect x="100" y="100" width="144" height="144"/>
                <circle cx="172" cy="172" r="5"/>
                <circle cx="130" cy="130" r="2"/>
                <circle cx="214" cy="214" r="2"/>
            </g>
            <g inkscape:label="face">
                <rect x="99.5" y="99.5" width="145" height="145"/>
                <rect x="99.9" y="99.9" width="144.2" height="144.2"/>
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
fn engraving_path_is_reclassified() {
    let result = validate(&clean_sign());
    let analysis = result.letter_analysis.as_ref().unwrap();
    let face = analysis
        .letters
        .iter()
        .find(|l| l.layer == "face")
        .expect("face letter");
    assert_eq!(1, face.holes.len());
    assert_eq!(HoleType::Engraving, face.holes[0].hole_type);
    assert_eq!(Some("Engraving Path"), face.holes[0].size_name.as_deref());
}

#[test]
fn missing_engraving_path_warns() {
    let svg = clean_sign().replace(
        r#"<rect x="99.9" y="99.9" width="144.2" height="144.2"/>"#,
        "",
    );
    let result = validate(&svg);
    assert_eq!(Status::Warning, result.status);
    assert_eq!(1, count_code(&result, "acrylic_face_engraving_missing", Severity::Warning));
}

#[test]
fn badly_inset_inner_path_is_not_engraving() {
    // 3mm inset misses the 0.4mm +/-0.15 band, so the inner path stays an
    // unclassified hole and the engraving warning fires.
    let svg = clean_sign().replace(
        r#"<rect x="99.9" y="99.9" width="144.2" height="144.2"/>"#,
        r#"<rect x="102.5" y="102.5" width="139" height="139"/>"#,
    );
    let result = validate(&svg);
    assert_eq!(1, count_code(&result, "acrylic_face_engraving_missing", Severity::Warning));
}

#[test]
fn face_smaller_than_return_is_error() {
    let svg = clean_sign()
        .replace(
            r#"<rect x="99.5" y="99.5" width="145" height="145"/>"#,
            r#"<rect x="101" y="101" width="142" height="142"/>"#,
        )
        .replace(
            r#"<rect x="99.9" y="99.9" width="144.2" height="144.2"/>"#,
            r#"<rect x="101.4" y="101.4" width="141.2" height="141.2"/>"#,
        );
    let result = validate(&svg);
    assert_eq!(Status::Failed, result.status);
    assert_eq!(1, count_code(&result, "acrylic_face_offset", Severity::Error));
    let issue = result.issues.iter().find(|i| i.code == "acrylic_face_offset").unwrap();
    assert!(issue.message.contains("Return is larger than face"));
}

#[test]
fn face_overhang_below_minimum_is_error() {
    // 0.1mm per side is under the 0.3mm minimum seat.
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 400 400">
            <g inkscape:label="return">
                <rect x="100" y="100" width="144" height="144"/>
                <circle cx="172" cy="172" r="5"/>
                <circle cx="130" cy="130" r="2"/>
                <circle cx="214" cy="214" r="2"/>
            </g>
            <g inkscape:label="face">
                <rect x="99.9" y="99.9" width="144.2" height="144.2"/>
                <rect x="100.3" y="100.3" width="143.4" height="143.4"/>
            </g>
        </svg>"#
    );
    let result = validate(&svg);
    assert_eq!(1, count_code(&result, "acrylic_face_offset", Severity::Error));
    let issue = result.issues.iter().find(|i| i.code == "acrylic_face_offset").unwrap();
    assert!(issue.message.contains("offset too small"));
}

#[test]
fn adjacent_letters_too_close_is_spacing_error() {
    // Two 2" letters 4 units (0.056") apart; after the 0.3mm face buffer on
    // each they sit well under the 0.10" router clearance.
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 600 400">
            <g inkscape:label="return">
                <rect x="100" y="100" width="144" height="144"/>
                <circle cx="172" cy="172" r="5"/>
                <circle cx="130" cy="130" r="2"/>
                <circle cx="214" cy="214" r="2"/>
                <rect x="248" y="100" width="144" height="144"/>
                <circle cx="320" cy="172" r="5"/>
                <circle cx="278" cy="130" r="2"/>
                <circle cx="362" cy="214" r="2"/>
            </g>
            <g inkscape:label="face">
                <rect x="99.5" y="99.5" width="145" height="145"/>
                <rect x="99.9" y="99.9" width="144.2" height="144.2"/>
                <rect x="247.5" y="99.5" width="145" height="145"/>
                <rect x="247.9" y="99.9" width="144.2" height="144.2"/>
            </g>
        </svg>"#
    );
    let result = validate(&svg);
    assert_eq!(1, count_code(&result, "acrylic_face_spacing", Severity::Error));
}

#[test]
fn well_spaced_letters_pass_spacing() {
    // 30 units (0.42") apart clears the 0.10" minimum.
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 600 400">
            <g inkscape:label="return">
                <rect x="100" y="100" width="144" height="144"/>
                <circle cx="172" cy="172" r="5"/>
                <circle cx="130" cy="130" r="2"/>
                <circle cx="214" cy="214" r="2"/>
                <rect x="274" y="100" width="144" height="144"/>
                <circle cx="346" cy="172" r="5"/>
                <circle cx="304" cy="130" r="2"/>
                <circle cx="388" cy="214" r="2"/>
            </g>
            <g inkscape:label="face">
                <rect x="99.5" y="99.5" width="145" height="145"/>
                <rect x="99.9" y="99.9" width="144.2" height="144.2"/>
                <rect x="273.5" y="99.5" width="145" height="145"/>
                <rect x="273.9" y="99.9" width="144.2" height="144.2"/>
            </g>
        </svg>"#
    );
    let result = validate(&svg);
    assert_eq!(0, count_code(&result, "acrylic_face_spacing", Severity::Error));
}

#[test]
fn missing_face_layer_is_error() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 400 400">
            <g inkscape:label="return">
                <rect x="100" y="100" width="144" height="144"/>
                <circle cx="172" cy="172" r="5"/>
                <circle cx="130" cy="130" r="2"/>
                <circle cx="214" cy="214" r="2"/>
            </g>
        </svg>"#
    );
    let result = validate(&svg);
    assert_eq!(1, count_code(&result, "acrylic_face_missing", Severity::Error));
}
