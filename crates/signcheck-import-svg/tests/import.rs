use signcheck_import_svg::{import_svg_text, LAYER_DEFS, LAYER_NONE};

const INKSCAPE_NS: &str = "xmlns:inkscape=\"http://www.inkscape.org/namespaces/inkscape\"";

#[test]
fn explicit_labels_name_layers() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 100 100">
            <g inkscape:label="return"><rect x="10" y="10" width="30" height="20"/></g>
            <g inkscape:label="trimcap"><rect x="8" y="8" width="34" height="24"/></g>
        </svg>"#
    );
    let doc = import_svg_text(&svg, &[]).unwrap();
    assert_eq!(vec!["return".to_string(), "trimcap".to_string()], doc.layers);
    assert_eq!(2, doc.entities.len());
    assert_eq!("return", doc.entities[0].layer);
    assert_eq!("trimcap", doc.entities[1].layer);
}

#[test]
fn authoritative_names_tail_align_with_groups() {
    // Converter chrome group first, then the two real layers; ids are
    // meaningless so only the recovered container names can name them.
    let svg = r#"<svg viewBox="0 0 100 100">
        <g id="surface1"><rect x="0" y="0" width="1" height="1"/></g>
        <g id="g12"><rect x="10" y="10" width="30" height="20"/></g>
        <g id="g13"><rect x="8" y="8" width="34" height="24"/></g>
    </svg>"#;
    let names = vec!["return".to_string(), "trimcap".to_string()];
    let doc = import_svg_text(svg, &names).unwrap();
    assert_eq!(3, doc.entities.len());
    assert_eq!("Layer_1", doc.entities[0].layer);
    assert_eq!("return", doc.entities[1].layer);
    assert_eq!("trimcap", doc.entities[2].layer);
}

#[test]
fn separator_names_are_filtered() {
    let svg = r#"<svg viewBox="0 0 100 100">
        <g id="g1"><rect x="10" y="10" width="30" height="20"/></g>
    </svg>"#;
    let names = vec!["----".to_string(), "return".to_string()];
    let doc = import_svg_text(svg, &names).unwrap();
    assert_eq!("return", doc.entities[0].layer);
}

#[test]
fn defs_and_orphan_shapes_get_sentinel_layers() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 100 100">
            <defs><rect x="0" y="0" width="5" height="5"/></defs>
            <rect x="50" y="50" width="5" height="5"/>
            <g inkscape:label="return"><rect x="10" y="10" width="30" height="20"/></g>
        </svg>"#
    );
    let doc = import_svg_text(&svg, &[]).unwrap();
    let layers: Vec<&str> = doc.entities.iter().map(|e| e.layer.as_str()).collect();
    assert!(layers.contains(&LAYER_DEFS));
    assert!(layers.contains(&LAYER_NONE));
    assert!(layers.contains(&"return"));
}

#[test]
fn hidden_group_marks_shapes_hidden() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 100 100">
            <g inkscape:label="return" display="none"><rect x="10" y="10" width="30" height="20"/></g>
        </svg>"#
    );
    let doc = import_svg_text(&svg, &[]).unwrap();
    assert_eq!("_hidden_", doc.entities[0].layer);
}

#[test]
fn circle_element_produces_circle_fit() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 100 100">
            <g inkscape:label="return"><circle cx="40" cy="40" r="5"/></g>
        </svg>"#
    );
    let doc = import_svg_text(&svg, &[]).unwrap();
    let circle = doc.entities[0].global.circle.expect("circle fit");
    assert!((circle.diameter - 10.0).abs() < 0.1);
    assert!((circle.center.x - 40.0).abs() < 1e-6);
    assert!((circle.center.y - 40.0).abs() < 1e-6);
}

#[test]
fn rect_is_not_a_circle() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 100 100">
            <g inkscape:label="return"><rect x="10" y="10" width="20" height="20"/></g>
        </svg>"#
    );
    let doc = import_svg_text(&svg, &[]).unwrap();
    assert!(doc.entities[0].global.circle.is_none());
    assert!(doc.entities[0].is_closed());
}

#[test]
fn compound_path_keeps_interior_ring() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 100 100">
            <g inkscape:label="backer">
                <path d="M0 0 L60 0 L60 60 L0 60 Z M20 20 L40 20 L40 40 L20 40 Z"/>
            </g>
        </svg>"#
    );
    let doc = import_svg_text(&svg, &[]).unwrap();
    let entity = &doc.entities[0];
    assert!(entity.is_compound());
    let poly = entity.global.polygon.as_ref().expect("polygon");
    assert_eq!(1, poly.interiors.len());
    assert!((poly.net_area() - (3600.0 - 400.0)).abs() < 1e-6);
}

#[test]
fn group_transform_applies_to_geometry() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 100 100">
            <g inkscape:label="return" transform="translate(10, 5)">
                <rect x="0" y="0" width="20" height="10"/>
            </g>
        </svg>"#
    );
    let doc = import_svg_text(&svg, &[]).unwrap();
    let bbox = doc.entities[0].global.bbox;
    assert!((bbox.min.x - 10.0).abs() < 1e-9);
    assert!((bbox.min.y - 5.0).abs() < 1e-9);
    assert!((bbox.max.x - 30.0).abs() < 1e-9);
}

#[test]
fn duplicate_paths_share_a_data_signature() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 100 100">
            <g inkscape:label="return">
                <path d="M0 0 L10 0 L10 10 L0 10 Z"/>
                <path d="M0 0 L10 0 L10 10 L0 10 Z"/>
                <path d="M0 0 L12 0 L12 10 L0 10 Z"/>
            </g>
        </svg>"#
    );
    let doc = import_svg_text(&svg, &[]).unwrap();
    assert_eq!(doc.entities[0].data_signature, doc.entities[1].data_signature);
    assert_ne!(doc.entities[0].data_signature, doc.entities[2].data_signature);
}

#[test]
fn open_path_is_not_closed() {
    let svg = format!(
        r#"<svg {INKSCAPE_NS} viewBox="0 0 100 100">
            <g inkscape:label="return"><path d="M0 0 L50 0 L50 50"/></g>
        </svg>"#
    );
    let doc = import_svg_text(&svg, &[]).unwrap();
    assert!(!doc.entities[0].is_closed());
    assert!(doc.entities[0].global.polygon.is_none());
}
