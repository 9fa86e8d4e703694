use signcheck_core::geom::Vec2;
use signcheck_core::report::{DocumentStats, Severity, Status, ValidationIssue, ValidationResult};
use signcheck_core::transform::Transform2D;

fn result_with(issues: Vec<ValidationIssue>) -> ValidationResult {
    let mut result = ValidationResult {
        status: Status::Passed,
        method: "front_lit".to_string(),
        input_file: "sign.svg".to_string(),
        issues,
        stats: DocumentStats::default(),
        letter_analysis: None,
        error: None,
    };
    result.aggregate_status();
    result
}

#[test]
fn empty_result_passes() {
    let result = result_with(vec![]);
    assert_eq!(Status::Passed, result.status);
}

#[test]
fn info_issues_do_not_change_status() {
    let result = result_with(vec![ValidationIssue::info("r", "c", "found 2 letters")]);
    assert_eq!(Status::Passed, result.status);
    assert_eq!(0, result.error_count());
}

#[test]
fn worst_severity_wins() {
    let result = result_with(vec![
        ValidationIssue::info("r", "a", "info"),
        ValidationIssue::warning("r", "b", "warn"),
    ]);
    assert_eq!(Status::Warning, result.status);

    let result = result_with(vec![
        ValidationIssue::warning("r", "b", "warn"),
        ValidationIssue::error("r", "c", "err"),
    ]);
    assert_eq!(Status::Failed, result.status);
    assert_eq!(1, result.error_count());
    assert_eq!(1, result.warning_count());
}

#[test]
fn fatal_result_is_never_downgraded() {
    let mut result = ValidationResult::fatal("halo_lit", "broken.ai", "conversion failed");
    assert_eq!(Status::Error, result.status);
    assert_eq!(Some("conversion failed".to_string()), result.error);
    result.aggregate_status();
    assert_eq!(Status::Error, result.status);
}

#[test]
fn issue_details_accumulate() {
    let issue = ValidationIssue::error("rule", "code", "msg")
        .detail("count", 3u64)
        .detail("layer", "return");
    assert_eq!(Severity::Error, issue.severity);
    assert_eq!(Some(3), issue.details["count"].as_u64());
    assert_eq!(Some("return"), issue.details["layer"].as_str());
}

#[test]
fn transform_chain_applies_inner_first() {
    // translate(10, 0) after scale(2): point maps through the scale first.
    let t = Transform2D::translation(10.0, 0.0).mul(&Transform2D::scaling(2.0, 2.0));
    let p = t.apply_point(Vec2::new(3.0, 4.0));
    assert!((p.x - 16.0).abs() < 1e-12);
    assert!((p.y - 8.0).abs() < 1e-12);
}

#[test]
fn chained_identity_is_identity() {
    let t = Transform2D::identity().mul(&Transform2D::identity());
    assert!(t.is_identity());
    let s = Transform2D::scaling(3.0, 3.0);
    assert!((s.mean_scale() - 3.0).abs() < 1e-12);
}
