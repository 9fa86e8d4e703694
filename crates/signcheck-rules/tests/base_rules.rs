use signcheck_core::config::RulesConfig;
use signcheck_core::report::{Severity, Status, ValidationResult};
use signcheck_rules::Validator;

const INKSCAPE_NS: &str = "xmlns:inkscape=\"http://www.inkscape.org/namespaces/inkscape\"";

fn validate(svg: &str, config_json: &str) -> ValidationResult {
    let config = RulesConfig::from_json(config_json).unwrap();
    Validator::new(config).validate_svg_text(svg, "test.svg", "push_thru")
}

fn count_code(result: &ValidationResult, code: &str, severity: Severity) -> usize {
    result
        .issues
        .iter()
        .filter(|i| i.code == code && i.severity == severity)
        .count()
}

#[test]
fn stacked_duplicates_are_errors() {
    let svg = format!(
        r##"<svg {INKSCAPE_NS} viewBox="0 0 400 400">
            <g inkscape:label="frame">
                <rect x="100" y="100" width="144" height="144"/>
                <rect x="100" y="100" width="144" height="144"/>
            </g>
        </svg>"##
    );
    let result = validate(
        &svg,
        r##"{"push_thru_structure": {}, "no_duplicate_overlapping": {"tolerance": 0.01}}"##,
    );
    assert_eq!(Status::Failed, result.status);
    assert_eq!(1, count_code(&result, "no_duplicate_overlapping", Severity::Error));
    let issue = result
        .issues
        .iter()
        .find(|i| i.code == "no_duplicate_overlapping")
        .unwrap();
    assert!(issue.message.contains("frame"));
}

#[test]
fn shifted_copy_is_not_a_duplicate() {
    // Same path data, different position: coincidence test must fail.
    let svg = format!(
        r##"<svg {INKSCAPE_NS} viewBox="0 0 400 400">
            <g inkscape:label="frame">
                <rect x="100" y="100" width="144" height="144"/>
                <rect x="110" y="100" width="144" height="144"/>
            </g>
        </svg>"##
    );
    let result = validate(
        &svg,
        r##"{"push_thru_structure": {}, "no_duplicate_overlapping": {}}"##,
    );
    assert_eq!(0, count_code(&result, "no_duplicate_overlapping", Severity::Error));
}

#[test]
fn duplicates_ignored_when_rule_disabled() {
    let svg = format!(
        r##"<svg {INKSCAPE_NS} viewBox="0 0 400 400">
            <g inkscape:label="frame">
                <rect x="100" y="100" width="144" height="144"/>
                <rect x="100" y="100" width="144" height="144"/>
            </g>
        </svg>"##
    );
    let result = validate(&svg, r##"{"push_thru_structure": {}}"##);
    assert_eq!(0, count_code(&result, "no_duplicate_overlapping", Severity::Error));
}

#[test]
fn stroke_profile_violations_are_errors() {
    let svg = format!(
        r##"<svg {INKSCAPE_NS} viewBox="0 0 600 400">
            <g inkscape:label="frame">
                <rect x="20" y="20" width="100" height="80" stroke="#000000" stroke-width="1pt"/>
                <rect x="160" y="20" width="120" height="80" stroke="#ff0000" stroke-width="2.5pt"/>
                <rect x="320" y="20" width="140" height="80" stroke="#ff0000" stroke-width="1pt" fill="blue"/>
            </g>
        </svg>"##
    );
    let result = validate(
        &svg,
        r##"{"push_thru_structure": {},
            "stroke_requirements": {"required_color": "#ff0000", "required_width": 1.0, "allow_fill": false}}"##,
    );
    assert_eq!(3, count_code(&result, "stroke_requirements", Severity::Error));
    assert!(result
        .issues
        .iter()
        .any(|i| i.message.contains("incorrect stroke color")));
    assert!(result
        .issues
        .iter()
        .any(|i| i.message.contains("incorrect stroke width")));
    assert!(result.issues.iter().any(|i| i.message.contains("has fill: #0000ff")));
}

#[test]
fn unstyled_paths_pass_stroke_profile() {
    let svg = format!(
        r##"<svg {INKSCAPE_NS} viewBox="0 0 400 400">
            <g inkscape:label="frame">
                <rect x="100" y="100" width="144" height="144"/>
            </g>
        </svg>"##
    );
    let result = validate(
        &svg,
        r##"{"push_thru_structure": {},
            "stroke_requirements": {"required_color": "#ff0000", "required_width": 1.0}}"##,
    );
    assert_eq!(0, count_code(&result, "stroke_requirements", Severity::Error));
}

#[test]
fn large_panel_without_holes_gets_mounting_warning() {
    // 1000x1000 units is a 13.9" square at full scale, over the 48"
    // perimeter floor, and carries no interior rings.
    let svg = format!(
        r##"<svg {INKSCAPE_NS} viewBox="0 0 1200 1200">
            <g inkscape:label="frame">
                <rect x="50" y="50" width="1000" height="1000"/>
            </g>
        </svg>"##
    );
    let result = validate(
        &svg,
        r##"{"push_thru_structure": {}, "structural_mounting_holes": {}}"##,
    );
    assert_eq!(Status::Warning, result.status);
    assert_eq!(1, count_code(&result, "structural_mounting_holes", Severity::Warning));
    let issue = result
        .issues
        .iter()
        .find(|i| i.code == "structural_mounting_holes")
        .unwrap();
    assert_eq!(Some(0), issue.details["actual_holes"].as_u64());
    assert_eq!(Some(2), issue.details["suggested_holes"].as_u64());
}

#[test]
fn small_paths_skip_mounting_suggestion() {
    let svg = format!(
        r##"<svg {INKSCAPE_NS} viewBox="0 0 400 400">
            <g inkscape:label="frame">
                <rect x="100" y="100" width="144" height="144"/>
            </g>
        </svg>"##
    );
    let result = validate(
        &svg,
        r##"{"push_thru_structure": {}, "structural_mounting_holes": {}}"##,
    );
    assert_eq!(0, count_code(&result, "structural_mounting_holes", Severity::Warning));
}

#[test]
fn long_open_path_gets_closure_warning() {
    let svg = format!(
        r##"<svg {INKSCAPE_NS} viewBox="0 0 600 400">
            <g inkscape:label="sketch">
                <path d="M10 10 L500 10"/>
                <path d="M10 50 L15 50"/>
            </g>
        </svg>"##
    );
    let result = validate(&svg, r##"{"push_thru_structure": {}, "path_closure": {}}"##);
    assert_eq!(1, count_code(&result, "path_closure", Severity::Warning));
    let issue = result.issues.iter().find(|i| i.code == "path_closure").unwrap();
    assert!(issue.message.contains("may not be properly closed"));
}
