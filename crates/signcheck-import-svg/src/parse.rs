use roxmltree::Node;
use signcheck_core::geom::Vec2;
use signcheck_core::model::PathStyle;
use signcheck_core::path::{ellipse_subpath, quad_to_cubic, PathSeg, SubPath};
use signcheck_core::transform::Transform2D;

/// One drawable element, geometry still in element-local coordinates.
#[derive(Debug, Clone)]
pub struct ParsedShape {
    pub source_id: Option<String>,
    pub subpaths: Vec<SubPath>,
    /// Full ancestor chain including the element's own transform.
    pub transform: Transform2D,
    pub style: PathStyle,
    pub in_defs: bool,
    pub hidden: bool,
    /// Index into `ParsedDocument::groups` when the shape sits under a
    /// top-level group.
    pub top_group: Option<usize>,
    pub data_signature: String,
}

/// Structure summary of one top-level group, used by layer resolution.
#[derive(Debug, Clone, Default)]
pub struct GroupInfo {
    pub label: Option<String>,
    pub id: Option<String>,
    pub has_transform: bool,
    pub direct_shape_count: usize,
    pub child_group_count: usize,
}

impl GroupInfo {
    /// Wraps sub-groups only: no direct shapes and no transform of its own.
    pub fn is_container(&self) -> bool {
        self.child_group_count > 0 && self.direct_shape_count == 0 && !self.has_transform
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub width: f64,
    pub height: f64,
    pub shapes: Vec<ParsedShape>,
    pub groups: Vec<GroupInfo>,
}

const SHAPE_TAGS: [&str; 7] = ["path", "rect", "circle", "ellipse", "polygon", "polyline", "line"];

pub fn parse_document(xml: &str) -> anyhow::Result<ParsedDocument> {
    let doc = roxmltree::Document::parse(xml)?;
    let svg = doc
        .descendants()
        .find(|n| n.has_tag_name("svg"))
        .ok_or_else(|| anyhow::anyhow!("no <svg> root element"))?;

    let vb = parse_viewbox(svg.attribute("viewBox"));
    let width = svg
        .attribute("width")
        .and_then(parse_len)
        .or(vb.map(|v| v.2))
        .unwrap_or(0.0);
    let height = svg
        .attribute("height")
        .and_then(parse_len)
        .or(vb.map(|v| v.3))
        .unwrap_or(0.0);

    let mut out = ParsedDocument { width, height, ..Default::default() };

    // Wrapper-style documents put a single chrome <g> between the root and
    // the layer groups; descend through it so its children become the
    // top-level groups.
    let top = top_level_parent(svg);

    for child in top.children().filter(Node::is_element) {
        let tag = child.tag_name().name();
        if tag == "defs" || tag == "clipPath" {
            collect_shapes(child, Transform2D::identity(), None, true, false, &mut out.shapes);
        } else if tag == "g" {
            let group_index = out.groups.len();
            out.groups.push(summarize_group(child));
            let hidden = is_hidden(child);
            collect_shapes(
                child,
                Transform2D::identity(),
                Some(group_index),
                false,
                hidden,
                &mut out.shapes,
            );
        } else if SHAPE_TAGS.contains(&tag) {
            collect_shapes(child, Transform2D::identity(), None, false, false, &mut out.shapes);
        }
    }
    // Shapes above the wrapper (rare, converter chrome) still count.
    if top.id() != svg.id() {
        for child in svg.children().filter(Node::is_element) {
            if child.id() == top.id() {
                continue;
            }
            let tag = child.tag_name().name();
            if tag == "defs" || tag == "clipPath" {
                collect_shapes(child, Transform2D::identity(), None, true, false, &mut out.shapes);
            } else if SHAPE_TAGS.contains(&tag) || tag == "g" {
                collect_shapes(child, Transform2D::identity(), None, false, false, &mut out.shapes);
            }
        }
    }

    Ok(out)
}

/// Picks the node whose element children are the layer candidates: the root
/// itself, or its single <g> wrapper when that wrapper only wraps groups.
fn top_level_parent<'a, 'd>(svg: Node<'a, 'd>) -> Node<'a, 'd> {
    let elements: Vec<Node> = svg
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() != "defs" && n.tag_name().name() != "metadata")
        .collect();
    if elements.len() == 1 && elements[0].tag_name().name() == "g" {
        let wrapper = elements[0];
        let wraps_groups = wrapper
            .children()
            .filter(Node::is_element)
            .any(|c| c.tag_name().name() == "g");
        let has_direct_shapes = wrapper
            .children()
            .filter(Node::is_element)
            .any(|c| SHAPE_TAGS.contains(&c.tag_name().name()));
        if wraps_groups && !has_direct_shapes {
            return wrapper;
        }
    }
    svg
}

fn summarize_group(node: Node<'_, '_>) -> GroupInfo {
    let label = node
        .attribute(("http://www.inkscape.org/namespaces/inkscape", "label"))
        .or_else(|| node.attribute("data-name"))
        .map(str::to_string);
    let mut info = GroupInfo {
        label,
        id: node.attribute("id").map(str::to_string),
        has_transform: node.attribute("transform").is_some(),
        ..Default::default()
    };
    for child in node.children().filter(Node::is_element) {
        let tag = child.tag_name().name();
        if tag == "g" {
            info.child_group_count += 1;
        } else if SHAPE_TAGS.contains(&tag) {
            info.direct_shape_count += 1;
        }
    }
    info
}

fn is_hidden(node: Node<'_, '_>) -> bool {
    if node.attribute("display") == Some("none") || node.attribute("visibility") == Some("hidden") {
        return true;
    }
    node.attribute("style").map_or(false, |style| {
        style.split(';').any(|part| {
            let part = part.trim();
            part == "display:none"
                || part == "display: none"
                || part == "visibility:hidden"
                || part == "visibility: hidden"
        })
    })
}

fn collect_shapes(
    node: Node<'_, '_>,
    parent_tx: Transform2D,
    top_group: Option<usize>,
    in_defs: bool,
    hidden: bool,
    shapes: &mut Vec<ParsedShape>,
) {
    let node_tx = parse_transform(node.attribute("transform"));
    let hidden = hidden || is_hidden(node);
    let tag = node.tag_name().name();

    let subpaths = match tag {
        "path" => node.attribute("d").map(|d| parse_path_data(d)).unwrap_or_default(),
        "rect" => parse_rect(node),
        "circle" => parse_circle(node),
        "ellipse" => parse_ellipse(node),
        "polygon" => parse_poly(node, true),
        "polyline" => parse_poly(node, false),
        "line" => parse_line(node),
        _ => Vec::new(),
    };

    if !subpaths.is_empty() {
        // The element's own transform applies to the shape but stays out of
        // the raw geometry.
        let full = parent_tx.mul(&node_tx);
        let signature = signature_for(&subpaths);
        shapes.push(ParsedShape {
            source_id: node.attribute("id").map(str::to_string),
            subpaths,
            transform: full,
            style: parse_style(node),
            in_defs,
            hidden,
            top_group,
            data_signature: signature,
        });
    }

    let child_tx = parent_tx.mul(&node_tx);
    for child in node.children().filter(Node::is_element) {
        let child_in_defs =
            in_defs || child.tag_name().name() == "defs" || child.tag_name().name() == "clipPath";
        collect_shapes(child, child_tx, top_group, child_in_defs, hidden, shapes);
    }
}

/// Rounded coordinate dump of the raw path data, stable across identical
/// duplicate elements regardless of attribute order.
fn signature_for(subpaths: &[SubPath]) -> String {
    use std::fmt::Write;
    let mut sig = String::new();
    for sub in subpaths {
        let _ = write!(sig, "M{:.3},{:.3}", sub.start.x, sub.start.y);
        for seg in &sub.segs {
            match *seg {
                PathSeg::Line { to } => {
                    let _ = write!(sig, "L{:.3},{:.3}", to.x, to.y);
                }
                PathSeg::Cubic { c1, c2, to } => {
                    let _ = write!(
                        sig,
                        "C{:.3},{:.3} {:.3},{:.3} {:.3},{:.3}",
                        c1.x, c1.y, c2.x, c2.y, to.x, to.y
                    );
                }
            }
        }
        if sub.closed {
            sig.push('Z');
        }
    }
    sig
}

pub fn parse_path_data(d: &str) -> Vec<SubPath> {
    let mut subpaths: Vec<SubPath> = Vec::new();
    let mut cur = Vec2::new(0.0, 0.0);
    let mut prev_cubic_c2: Option<Vec2> = None;
    let mut prev_quad_ctrl: Option<Vec2> = None;

    let mut parser = svgtypes::PathParser::from(d);
    while let Some(seg) = parser.next() {
        let seg = match seg {
            Ok(s) => s,
            Err(_) => break,
        };
        use svgtypes::PathSegment::*;
        let mut new_cubic_c2 = None;
        let mut new_quad_ctrl = None;
        match seg {
            MoveTo { abs, x, y } => {
                cur = resolve(abs, cur, x, y);
                subpaths.push(SubPath::new(cur));
            }
            LineTo { abs, x, y } => {
                cur = resolve(abs, cur, x, y);
                push_seg(&mut subpaths, PathSeg::Line { to: cur });
            }
            HorizontalLineTo { abs, x } => {
                cur = if abs { Vec2::new(x, cur.y) } else { Vec2::new(cur.x + x, cur.y) };
                push_seg(&mut subpaths, PathSeg::Line { to: cur });
            }
            VerticalLineTo { abs, y } => {
                cur = if abs { Vec2::new(cur.x, y) } else { Vec2::new(cur.x, cur.y + y) };
                push_seg(&mut subpaths, PathSeg::Line { to: cur });
            }
            CurveTo { abs, x1, y1, x2, y2, x, y } => {
                let c1 = resolve(abs, cur, x1, y1);
                let c2 = resolve(abs, cur, x2, y2);
                let to = resolve(abs, cur, x, y);
                push_seg(&mut subpaths, PathSeg::Cubic { c1, c2, to });
                new_cubic_c2 = Some(c2);
                cur = to;
            }
            SmoothCurveTo { abs, x2, y2, x, y } => {
                let c1 = match prev_cubic_c2 {
                    Some(c2) => cur.add(cur.sub(c2)),
                    None => cur,
                };
                let c2 = resolve(abs, cur, x2, y2);
                let to = resolve(abs, cur, x, y);
                push_seg(&mut subpaths, PathSeg::Cubic { c1, c2, to });
                new_cubic_c2 = Some(c2);
                cur = to;
            }
            Quadratic { abs, x1, y1, x, y } => {
                let ctrl = resolve(abs, cur, x1, y1);
                let to = resolve(abs, cur, x, y);
                push_seg(&mut subpaths, quad_to_cubic(cur, ctrl, to));
                new_quad_ctrl = Some(ctrl);
                cur = to;
            }
            SmoothQuadratic { abs, x, y } => {
                let ctrl = match prev_quad_ctrl {
                    Some(c) => cur.add(cur.sub(c)),
                    None => cur,
                };
                let to = resolve(abs, cur, x, y);
                push_seg(&mut subpaths, quad_to_cubic(cur, ctrl, to));
                new_quad_ctrl = Some(ctrl);
                cur = to;
            }
            EllipticalArc { abs, rx, ry, x_axis_rotation, large_arc, sweep, x, y } => {
                let to = resolve(abs, cur, x, y);
                for p in arc_to_points(cur, rx, ry, x_axis_rotation, large_arc, sweep, to) {
                    push_seg(&mut subpaths, PathSeg::Line { to: p });
                }
                cur = to;
            }
            ClosePath { .. } => {
                if let Some(sub) = subpaths.last_mut() {
                    sub.closed = true;
                    cur = sub.start;
                }
            }
        }
        prev_cubic_c2 = new_cubic_c2;
        prev_quad_ctrl = new_quad_ctrl;
    }
    subpaths.retain(|s| !s.segs.is_empty());
    subpaths
}

fn resolve(abs: bool, cur: Vec2, x: f64, y: f64) -> Vec2 {
    if abs {
        Vec2::new(x, y)
    } else {
        Vec2::new(cur.x + x, cur.y + y)
    }
}

fn push_seg(subpaths: &mut Vec<SubPath>, seg: PathSeg) {
    if subpaths.is_empty() {
        // Path data starting without a moveto; tolerate it.
        subpaths.push(SubPath::new(Vec2::new(0.0, 0.0)));
    }
    if let Some(sub) = subpaths.last_mut() {
        sub.segs.push(seg);
    }
}

/// Endpoint-to-center arc conversion, sampled as a polyline. Radii are
/// corrected per the SVG arc implementation notes.
fn arc_to_points(
    from: Vec2,
    rx: f64,
    ry: f64,
    rotation_deg: f64,
    large_arc: bool,
    sweep: bool,
    to: Vec2,
) -> Vec<Vec2> {
    const STEPS: usize = 16;
    let mut rx = rx.abs();
    let mut ry = ry.abs();
    if rx < 1e-12 || ry < 1e-12 || from.distance_to(to) < 1e-12 {
        return vec![to];
    }
    let phi = rotation_deg.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let dx = (from.x - to.x) / 2.0;
    let dy = (from.y - to.y) / 2.0;
    let x1p = cos_phi * dx + sin_phi * dy;
    let y1p = -sin_phi * dx + cos_phi * dy;

    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    let num = rx * rx * ry * ry - rx * rx * y1p * y1p - ry * ry * x1p * x1p;
    let den = rx * rx * y1p * y1p + ry * ry * x1p * x1p;
    let mut coef = (num.max(0.0) / den).sqrt();
    if large_arc == sweep {
        coef = -coef;
    }
    let cxp = coef * rx * y1p / ry;
    let cyp = -coef * ry * x1p / rx;
    let cx = cos_phi * cxp - sin_phi * cyp + (from.x + to.x) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (from.y + to.y) / 2.0;

    let angle = |ux: f64, uy: f64, vx: f64, vy: f64| -> f64 {
        let dot = ux * vx + uy * vy;
        let len = (ux * ux + uy * uy).sqrt() * (vx * vx + vy * vy).sqrt();
        let mut a = (dot / len).clamp(-1.0, 1.0).acos();
        if ux * vy - uy * vx < 0.0 {
            a = -a;
        }
        a
    };
    let theta1 = angle(1.0, 0.0, (x1p - cxp) / rx, (y1p - cyp) / ry);
    let mut delta = angle(
        (x1p - cxp) / rx,
        (y1p - cyp) / ry,
        (-x1p - cxp) / rx,
        (-y1p - cyp) / ry,
    );
    if !sweep && delta > 0.0 {
        delta -= 2.0 * std::f64::consts::PI;
    } else if sweep && delta < 0.0 {
        delta += 2.0 * std::f64::consts::PI;
    }

    let mut points = Vec::with_capacity(STEPS);
    for k in 1..=STEPS {
        let t = theta1 + delta * (k as f64 / STEPS as f64);
        let (sin_t, cos_t) = t.sin_cos();
        points.push(Vec2::new(
            cx + rx * cos_t * cos_phi - ry * sin_t * sin_phi,
            cy + rx * cos_t * sin_phi + ry * sin_t * cos_phi,
        ));
    }
    if let Some(last) = points.last_mut() {
        *last = to;
    }
    points
}

fn parse_rect(node: Node<'_, '_>) -> Vec<SubPath> {
    let x = node.attribute("x").and_then(parse_len).unwrap_or(0.0);
    let y = node.attribute("y").and_then(parse_len).unwrap_or(0.0);
    let w = match node.attribute("width").and_then(parse_len) {
        Some(w) if w > 0.0 => w,
        _ => return Vec::new(),
    };
    let h = match node.attribute("height").and_then(parse_len) {
        Some(h) if h > 0.0 => h,
        _ => return Vec::new(),
    };
    let mut sub = SubPath::new(Vec2::new(x, y));
    sub.segs.push(PathSeg::Line { to: Vec2::new(x + w, y) });
    sub.segs.push(PathSeg::Line { to: Vec2::new(x + w, y + h) });
    sub.segs.push(PathSeg::Line { to: Vec2::new(x, y + h) });
    sub.segs.push(PathSeg::Line { to: Vec2::new(x, y) });
    sub.closed = true;
    vec![sub]
}

fn parse_circle(node: Node<'_, '_>) -> Vec<SubPath> {
    let cx = node.attribute("cx").and_then(parse_len).unwrap_or(0.0);
    let cy = node.attribute("cy").and_then(parse_len).unwrap_or(0.0);
    match node.attribute("r").and_then(parse_len) {
        Some(r) if r > 0.0 => vec![ellipse_subpath(Vec2::new(cx, cy), r, r)],
        _ => Vec::new(),
    }
}

fn parse_ellipse(node: Node<'_, '_>) -> Vec<SubPath> {
    let cx = node.attribute("cx").and_then(parse_len).unwrap_or(0.0);
    let cy = node.attribute("cy").and_then(parse_len).unwrap_or(0.0);
    let rx = node.attribute("rx").and_then(parse_len).unwrap_or(0.0);
    let ry = node.attribute("ry").and_then(parse_len).unwrap_or(0.0);
    if rx > 0.0 && ry > 0.0 {
        vec![ellipse_subpath(Vec2::new(cx, cy), rx, ry)]
    } else {
        Vec::new()
    }
}

fn parse_poly(node: Node<'_, '_>, closed: bool) -> Vec<SubPath> {
    let Some(points) = node.attribute("points") else {
        return Vec::new();
    };
    let coords: Vec<f64> = points
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    if coords.len() < 4 {
        return Vec::new();
    }
    let mut sub = SubPath::new(Vec2::new(coords[0], coords[1]));
    for pair in coords[2..].chunks_exact(2) {
        sub.segs.push(PathSeg::Line { to: Vec2::new(pair[0], pair[1]) });
    }
    sub.closed = closed;
    vec![sub]
}

fn parse_line(node: Node<'_, '_>) -> Vec<SubPath> {
    let x1 = node.attribute("x1").and_then(parse_len).unwrap_or(0.0);
    let y1 = node.attribute("y1").and_then(parse_len).unwrap_or(0.0);
    let x2 = node.attribute("x2").and_then(parse_len).unwrap_or(0.0);
    let y2 = node.attribute("y2").and_then(parse_len).unwrap_or(0.0);
    let mut sub = SubPath::new(Vec2::new(x1, y1));
    sub.segs.push(PathSeg::Line { to: Vec2::new(x2, y2) });
    vec![sub]
}

fn parse_style(node: Node<'_, '_>) -> PathStyle {
    let stroke = attr_or_style(node, "stroke").and_then(normalize_color);
    let fill = attr_or_style(node, "fill").and_then(normalize_color);
    let stroke_width_pt = attr_or_style(node, "stroke-width")
        .as_deref()
        .and_then(parse_width_pt);
    PathStyle { stroke, stroke_width_pt, fill }
}

fn attr_or_style(node: Node<'_, '_>, name: &str) -> Option<String> {
    if let Some(v) = node.attribute(name) {
        return Some(v.trim().to_string());
    }
    let style = node.attribute("style")?;
    for part in style.split(';') {
        let mut it = part.splitn(2, ':');
        let key = it.next()?.trim();
        if key == name {
            return it.next().map(|v| v.trim().to_string());
        }
    }
    None
}

/// Lowercase 6-digit hex, or `None` for "none"/unparseable values.
fn normalize_color(value: String) -> Option<String> {
    let value = value.to_ascii_lowercase();
    if value == "none" || value.is_empty() {
        return None;
    }
    if let Some(hex) = value.strip_prefix('#') {
        return match hex.len() {
            3 => {
                let mut full = String::with_capacity(7);
                full.push('#');
                for ch in hex.chars() {
                    full.push(ch);
                    full.push(ch);
                }
                Some(full)
            }
            6 => Some(format!("#{hex}")),
            _ => None,
        };
    }
    match value.as_str() {
        "black" => Some("#000000".to_string()),
        "white" => Some("#ffffff".to_string()),
        "red" => Some("#ff0000".to_string()),
        "green" => Some("#008000".to_string()),
        "blue" => Some("#0000ff".to_string()),
        _ => Some(value),
    }
}

/// Stroke width converted to points.
fn parse_width_pt(value: &str) -> Option<f64> {
    let value = value.trim();
    let split = value.find(|c: char| c.is_ascii_alphabetic() || c == '%');
    let (num, unit) = match split {
        Some(i) => value.split_at(i),
        None => (value, ""),
    };
    let n: f64 = num.trim().parse().ok()?;
    let factor = match unit.trim() {
        "" | "px" => 0.75,
        "pt" => 1.0,
        "mm" => 2.835,
        "cm" => 28.35,
        "in" => 72.0,
        _ => return None,
    };
    Some(n * factor)
}

pub fn parse_len(s: &str) -> Option<f64> {
    let mut end = 0usize;
    for (i, ch) in s.char_indices() {
        if ch.is_ascii_digit() || ch == '.' || ch == '-' || ch == '+' || ch == 'e' || ch == 'E' {
            end = i + ch.len_utf8();
        } else {
            break;
        }
    }
    s[..end].trim().parse().ok()
}

fn parse_transform(transform: Option<&str>) -> Transform2D {
    let Some(t) = transform else {
        return Transform2D::identity();
    };
    match t.parse::<svgtypes::Transform>() {
        Ok(m) => Transform2D { a: m.a, b: m.b, c: m.c, d: m.d, e: m.e, f: m.f },
        Err(_) => Transform2D::identity(),
    }
}

fn parse_viewbox(viewbox: Option<&str>) -> Option<(f64, f64, f64, f64)> {
    let vb = viewbox?;
    let parts: Vec<_> = vb.split([' ', ',']).filter(|s| !s.is_empty()).collect();
    if parts.len() != 4 {
        return None;
    }
    let a = parts[0].parse().ok()?;
    let b = parts[1].parse().ok()?;
    let c = parts[2].parse().ok()?;
    let d = parts[3].parse().ok()?;
    Some((a, b, c, d))
}
