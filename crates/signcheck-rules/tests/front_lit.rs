use signcheck_core::config::RulesConfig;
use signcheck_core::report::{Severity, Status, ValidationResult};
use signcheck_rules::Validator;

const INKSCAPE_NS: &str = "xmlns:inkscape=\"http://www.inkscape.org/namespaces/inkscape\"";

fn validate(svg: &str) -> ValidationResult {
    let config = RulesConfig::from_json(r#"{"front_lit_structure": {}}"#).unwrap();
    Validator::new(config).validate_svg_text(svg, "test.svg", "front_lit")
}

fn count_code(result: &ValidationResult, code: &str, severity: Severity) -> usize {
    result
        .issues
        .iter()
        .filter(|i| i.code == code && i.severity == severity)
        .count()
}

/// Return letter 2"x2" at full scale with one 10mm wire hole and two 4mm
/// pin holes; trim cap exactly 2.0mm larger per side.
fn clean_sign() -> String {
    format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 400 400">
            <g inkscape:label="return">
                <rect x="100" y="100" width="144" height="144"/>
                <circle cx="172" cy="172" r="5"/>
                <circle cx="130" cy="130" r="2"/>
                <circle cx="214" cy="214" r="2"/>
            </g>
            <g inkscape:label="trimcap">
                <rect x="98" y="98" width="148" height="148"/>
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
    assert_eq!("front_lit", result.method);
    let analysis = result.letter_analysis.as_ref().unwrap();
    assert!((analysis.scale - 1.0).abs() < 1e-12);
    assert_eq!(2, analysis.letters.len());
}

#[test]
fn missing_wire_hole_is_exactly_one_error() {
    let svg = clean_sign().replace(r#"<circle cx="172" cy="172" r="5"/>"#, "");
    let result = validate(&svg);
    assert_eq!(Status::Failed, result.status);
    assert_eq!(1, count_code(&result, "letter_no_wire_hole", Severity::Error));
    assert_eq!(1, result.error_count());
}

#[test]
fn zero_trim_offset_fails() {
    let svg = clean_sign().replace(
        r#"<rect x="98" y="98" width="148" height="148"/>"#,
        r#"<rect x="100" y="100" width="144" height="144"/>"#,
    );
    let result = validate(&svg);
    assert_eq!(Status::Failed, result.status);
    assert_eq!(1, count_code(&result, "front_lit_trim_offset", Severity::Error));
    let issue = result.issues.iter().find(|i| i.code == "front_lit_trim_offset").unwrap();
    assert!(issue.message.contains("expected 3.80-16.80mm total"));
}

#[test]
fn oversized_trim_offset_fails() {
    // 10mm per side is past the 2.1mm x 4.0 miter allowance.
    let svg = clean_sign().replace(
        r#"<rect x="98" y="98" width="148" height="148"/>"#,
        r#"<rect x="90" y="90" width="164" height="164"/>"#,
    );
    let result = validate(&svg);
    assert_eq!(1, count_code(&result, "front_lit_trim_offset", Severity::Error));
}

#[test]
fn mitred_corner_overhang_is_allowed() {
    // 6mm per side: over the straight-edge max but inside the miter band.
    let svg = clean_sign().replace(
        r#"<rect x="98" y="98" width="148" height="148"/>"#,
        r#"<rect x="94" y="94" width="156" height="156"/>"#,
    );
    let result = validate(&svg);
    assert_eq!(0, count_code(&result, "front_lit_trim_offset", Severity::Error));
}

#[test]
fn missing_trim_layer_is_count_error() {
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
    assert_eq!(Status::Failed, result.status);
    assert_eq!(1, count_code(&result, "front_lit_trim_count", Severity::Error));
}

#[test]
fn empty_return_layer_warns_and_stops() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 400 400">
            <g inkscape:label="trimcap"><rect x="98" y="98" width="148" height="148"/></g>
        </svg>"#
    );
    let result = validate(&svg);
    assert_eq!(Status::Warning, result.status);
    assert_eq!(1, count_code(&result, "front_lit_structure", Severity::Warning));
}

#[test]
fn too_few_mounting_holes_warns() {
    let svg = clean_sign().replace(r#"<circle cx="214" cy="214" r="2"/>"#, "");
    let result = validate(&svg);
    assert_eq!(Status::Warning, result.status);
    assert_eq!(1, count_code(&result, "front_lit_mounting_holes", Severity::Warning));
}

#[test]
fn orphan_hole_is_error() {
    let svg = clean_sign().replace(
        r#"<circle cx="172" cy="172" r="5"/>"#,
        r#"<circle cx="172" cy="172" r="5"/><circle cx="350" cy="350" r="5"/>"#,
    );
    let result = validate(&svg);
    assert_eq!(Status::Failed, result.status);
    assert_eq!(1, count_code(&result, "orphan_hole", Severity::Error));
}

#[test]
fn wire_hole_check_can_be_disabled() {
    let svg = clean_sign().replace(r#"<circle cx="172" cy="172" r="5"/>"#, "");
    let config =
        RulesConfig::from_json(r#"{"front_lit_structure": {"check_wire_holes": false}}"#).unwrap();
    let result = Validator::new(config).validate_svg_text(&svg, "test.svg", "front_lit");
    assert_eq!(0, count_code(&result, "letter_no_wire_hole", Severity::Error));
}

#[test]
fn unknown_method_is_fatal() {
    let result = {
        let config = RulesConfig::default();
        Validator::new(config).validate_svg_text(&clean_sign(), "test.svg", "edge_lit")
    };
    assert_eq!(Status::Error, result.status);
    assert!(result.error.as_deref().unwrap().contains("edge_lit"));
}

#[test]
fn unparseable_svg_is_fatal_not_panic() {
    let config = RulesConfig::default();
    let result = Validator::new(config).validate_svg_text("not xml at all", "bad.svg", "front_lit");
    assert_eq!(Status::Error, result.status);
    assert!(result.error.is_some());
    assert!(result.issues.is_empty());
}

#[test]
fn repeated_runs_produce_identical_results() {
    // A defective sign, so the issue list is non-trivial.
    let svg = clean_sign().replace(r#"<circle cx="172" cy="172" r="5"/>"#, "");
    let first = validate(&svg);
    let second = validate(&svg);

    let summarize = |r: &ValidationResult| -> Vec<(String, String, Severity, String)> {
        r.issues
            .iter()
            .map(|i| (i.rule.clone(), i.code.clone(), i.severity, i.message.clone()))
            .collect()
    };
    assert_eq!(first.status, second.status);
    assert_eq!(summarize(&first), summarize(&second));
    assert_eq!(first.stats.total_paths, second.stats.total_paths);
    assert_eq!(first.stats.per_layer_paths, second.stats.per_layer_paths);

    let a = first.letter_analysis.as_ref().unwrap();
    let b = second.letter_analysis.as_ref().unwrap();
    assert_eq!(a.scale, b.scale);
    assert_eq!(a.letters.len(), b.letters.len());
    for (la, lb) in a.letters.iter().zip(&b.letters) {
        assert_eq!(la.entity_id, lb.entity_id);
        assert_eq!(la.holes.len(), lb.holes.len());
    }
}
