use signcheck_analysis::{
    analyze_entity_corners, associate, classify_hole, classify_holes, detect_scale,
    AssociationConfig, ScaleConfig,
};
use signcheck_core::config::default_hole_sizes;
use signcheck_core::geom::Vec2;
use signcheck_core::model::{HoleInfo, HoleType};
use signcheck_import_svg::import_svg_text;

const INKSCAPE_NS: &str = "xmlns:inkscape=\"http://www.inkscape.org/namespaces/inkscape\"";

fn doc_from(svg: &str) -> signcheck_core::model::SignDocument {
    import_svg_text(svg, &[]).unwrap()
}

#[test]
fn full_scale_wins_on_full_size_diameters() {
    let table = default_hole_sizes();
    // 10mm wire and 4mm pin holes drawn at full size.
    let scale = detect_scale(&[10.0, 4.0, 4.1], &table, &ScaleConfig::default());
    assert!((scale - 1.0).abs() < 1e-12);
}

#[test]
fn tenth_scale_wins_on_shrunk_diameters() {
    let table = default_hole_sizes();
    // The same holes in a 10% working file: 1.0 and 0.4 drawing units.
    let scale = detect_scale(&[1.0, 0.4, 0.4], &table, &ScaleConfig::default());
    assert!((scale - 0.1).abs() < 1e-12);
}

#[test]
fn empty_input_defaults_to_full_scale() {
    let table = default_hole_sizes();
    assert!((detect_scale(&[], &table, &ScaleConfig::default()) - 1.0).abs() < 1e-12);
}

#[test]
fn circles_inside_letters_become_holes() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 500 400">
            <g inkscape:label="return">
                <rect x="100" y="100" width="100" height="80"/>
                <circle cx="150" cy="140" r="5"/>
                <circle cx="120" cy="120" r="2"/>
                <circle cx="400" cy="300" r="5"/>
            </g>
        </svg>"#
    );
    let doc = doc_from(&svg);
    let table = default_hole_sizes();
    let analysis = associate(
        &doc,
        &["return".to_string()],
        &table,
        &AssociationConfig::default(),
    );
    assert_eq!(1, analysis.letters.len());
    assert_eq!(2, analysis.letters[0].holes.len());
    assert_eq!(1, analysis.orphan_holes.len());
    assert!((analysis.orphan_holes[0].center.x - 400.0).abs() < 1e-6);
}

#[test]
fn off_layer_paths_are_unassigned() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 500 400">
            <g inkscape:label="return"><rect x="100" y="100" width="100" height="80"/></g>
            <g inkscape:label="notes"><rect x="300" y="100" width="50" height="50"/></g>
        </svg>"#
    );
    let doc = doc_from(&svg);
    let analysis = associate(
        &doc,
        &["return".to_string()],
        &default_hole_sizes(),
        &AssociationConfig::default(),
    );
    assert_eq!(1, analysis.letters.len());
    assert_eq!(1, analysis.unassigned.len());
}

#[test]
fn classification_assigns_standard_names() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 500 400">
            <g inkscape:label="return">
                <rect x="100" y="100" width="100" height="80"/>
                <circle cx="150" cy="140" r="5"/>
                <circle cx="120" cy="120" r="2"/>
            </g>
        </svg>"#
    );
    let doc = doc_from(&svg);
    let table = default_hole_sizes();
    let mut analysis =
        associate(&doc, &["return".to_string()], &table, &AssociationConfig::default());
    classify_holes(&mut analysis, &table);

    let holes = &analysis.letters[0].holes;
    let types: Vec<HoleType> = holes.iter().map(|h| h.hole_type).collect();
    assert!(types.contains(&HoleType::Wire));
    assert!(types.contains(&HoleType::Mounting));
    let wire = holes.iter().find(|h| h.hole_type == HoleType::Wire).unwrap();
    assert_eq!(Some("Wire Pass-Through"), wire.size_name.as_deref());
}

#[test]
fn nonstandard_diameter_classifies_unknown() {
    let mut hole = HoleInfo {
        entity_id: 1,
        center: Vec2::new(0.0, 0.0),
        diameter: 25.0,
        real_diameter_mm: 25.0,
        hole_type: HoleType::Unclassified,
        size_name: None,
    };
    classify_hole(&mut hole, &default_hole_sizes());
    assert_eq!(HoleType::Unknown, hole.hole_type);
    assert!(hole.size_name.is_none());
}

#[test]
fn already_typed_holes_are_left_alone() {
    let mut hole = HoleInfo {
        entity_id: 1,
        center: Vec2::new(0.0, 0.0),
        diameter: 10.0,
        real_diameter_mm: 10.0,
        hole_type: HoleType::Engraving,
        size_name: Some("Engraving Path".to_string()),
    };
    classify_hole(&mut hole, &default_hole_sizes());
    assert_eq!(HoleType::Engraving, hole.hole_type);
}

#[test]
fn square_corners_are_sharp_and_convex() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 200 200">
            <g inkscape:label="push_thru_acrylic">
                <path d="M10 10 L110 10 L110 110 L10 110 Z"/>
            </g>
        </svg>"#
    );
    let doc = doc_from(&svg);
    let corners = analyze_entity_corners(&doc.entities[0], 1.0);
    assert_eq!(4, corners.len());
    assert!(corners.iter().all(|c| c.is_sharp));
    assert!(corners.iter().all(|c| c.is_convex));
}

#[test]
fn rounded_corner_radius_recovered_from_bezier() {
    // One 90-degree corner rounded with r=7.2 units (0.1" at full scale),
    // drawn with the standard kappa handle length.
    let r = 7.2;
    let k = 0.5522847498 * r;
    let d = format!(
        "M10 10 L{x1} 10 C{c1x} 10 100 {c2y} 100 {y2} L100 100 L10 100 Z",
        x1 = 100.0 - r,
        c1x = 100.0 - r + k,
        c2y = 10.0 + r - k,
        y2 = 10.0 + r,
    );
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 200 200">
            <g inkscape:label="push_thru_acrylic"><path d="{d}"/></g>
        </svg>"#
    );
    let doc = doc_from(&svg);
    let corners = analyze_entity_corners(&doc.entities[0], 1.0);
    let rounded: Vec<_> = corners.iter().filter(|c| !c.is_sharp).collect();
    assert_eq!(1, rounded.len());
    assert!((rounded[0].radius_inches - 0.1).abs() < 0.005);
    assert!(rounded[0].is_convex);
}

#[test]
fn compound_interior_corners_invert_convexity() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 200 200">
            <g inkscape:label="backer">
                <path d="M0 0 L100 0 L100 100 L0 100 Z M30 30 L70 30 L70 70 L30 70 Z"/>
            </g>
        </svg>"#
    );
    let doc = doc_from(&svg);
    let corners = analyze_entity_corners(&doc.entities[0], 1.0);
    assert_eq!(8, corners.len());
    let convex = corners.iter().filter(|c| c.is_convex).count();
    // Outer square corners are convex; the inner loop's are flipped to
    // concave because they cut into material.
    assert_eq!(4, convex);
}
