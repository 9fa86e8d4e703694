//! Primitives shared by the per-method rule modules: unit conversion,
//! per-layer letter metrics, cross-layer matching, the paired-layer offset
//! band, buffered spacing, mounting-hole heuristics, and hole centering.

use serde_json::json;

use signcheck_analysis::POINTS_PER_INCH;
use signcheck_core::config::RuleOptions;
use signcheck_core::geom::{
    closest_point_on_ring, distance_point_to_ring, offset_ring_mitred, ring_min_distance, Vec2,
};
use signcheck_core::model::{
    HoleInfo, HoleType, LetterAnalysisResult, LetterGroup, PathEntity, SignDocument,
};
use signcheck_core::polygon::Polygon;
use signcheck_core::report::ValidationIssue;

/// Working-file units to real millimetres at the detected scale. The hole
/// tables are calibrated against this conversion, so every mm comparison in
/// the rule modules goes through here.
pub fn units_to_mm(units: f64, scale: f64) -> f64 {
    units / scale
}

pub fn mm_to_units(mm: f64, scale: f64) -> f64 {
    mm * scale
}

/// Working-file units to real inches (72 units per inch at full scale).
pub fn units_to_inches(units: f64, scale: f64) -> f64 {
    units / (POINTS_PER_INCH * scale)
}

pub fn inches_to_units(inches: f64, scale: f64) -> f64 {
    inches * POINTS_PER_INCH * scale
}

/// One letter on one layer with the derived numbers the structural rules
/// compare. Borrows the group and its entity so hole lists stay accessible.
pub struct LetterMetrics<'a> {
    pub group: &'a LetterGroup,
    pub entity: &'a PathEntity,
    pub width: f64,
    pub height: f64,
    pub area: f64,
    pub perimeter: f64,
    pub centroid: Vec2,
}

impl<'a> LetterMetrics<'a> {
    pub fn label(&self) -> String {
        match &self.entity.source_id {
            Some(id) => id.clone(),
            None => format!("path_{}", self.entity.id),
        }
    }

    pub fn holes_of(&self, kind: HoleType) -> impl Iterator<Item = &HoleInfo> {
        self.group.holes.iter().filter(move |h| h.hole_type == kind)
    }

    pub fn wire_hole_count(&self) -> usize {
        self.holes_of(HoleType::Wire).count()
    }

    pub fn mounting_hole_count(&self) -> usize {
        self.holes_of(HoleType::Mounting).count()
    }

    pub fn unknown_holes(&self) -> Vec<&HoleInfo> {
        self.holes_of(HoleType::Unknown).collect()
    }

    pub fn polygon(&self) -> Option<&Polygon> {
        self.entity.global.polygon.as_ref()
    }

    pub fn size_inches(&self, scale: f64) -> (f64, f64) {
        (units_to_inches(self.width, scale), units_to_inches(self.height, scale))
    }
}

/// Collects metrics for every letter on `layer` (case-insensitive, matching
/// how layer names arrive from heterogeneous source files).
pub fn layer_metrics<'a>(
    doc: &'a SignDocument,
    analysis: &'a LetterAnalysisResult,
    layer: &str,
) -> Vec<LetterMetrics<'a>> {
    let mut metrics = Vec::new();
    for group in &analysis.letters {
        if !group.layer.eq_ignore_ascii_case(layer) {
            continue;
        }
        let Some(entity) = doc.entity(group.entity_id) else { continue };
        let bbox = entity.global.bbox;
        let (area, perimeter) = match &entity.global.polygon {
            Some(poly) => (poly.net_area(), poly.exterior_perimeter()),
            None => (0.0, 0.0),
        };
        metrics.push(LetterMetrics {
            group,
            entity,
            width: bbox.width(),
            height: bbox.height(),
            area,
            perimeter,
            centroid: entity.centroid(),
        });
    }
    metrics
}

/// Layer names present in the analysis, for "available layers" diagnostics.
pub fn layers_found(analysis: &LetterAnalysisResult) -> Vec<String> {
    let mut names: Vec<String> = analysis.stats.per_layer_paths.keys().cloned().collect();
    names.sort();
    names
}

pub struct LayerMatch {
    pub derived: usize,
    pub source: Option<usize>,
    pub distance: f64,
}

/// Pairs each derived-layer letter with its nearest source-layer letter by
/// centroid distance. Matching is not exclusive; count mismatches are
/// reported separately by the per-method count checks.
pub fn match_by_centroid(derived: &[LetterMetrics], source: &[LetterMetrics]) -> Vec<LayerMatch> {
    derived
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let mut best: Option<usize> = None;
            let mut best_distance = f64::INFINITY;
            for (j, s) in source.iter().enumerate() {
                let distance = d.centroid.distance_to(s.centroid);
                if distance < best_distance {
                    best_distance = distance;
                    best = Some(j);
                }
            }
            LayerMatch { derived: i, source: best, distance: best_distance }
        })
        .collect()
}

/// Direction a paired layer is expected to differ from its source layer.
/// Trim and face layers grow past the return; halo back panels shrink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetDirection {
    Grow,
    Shrink,
}

/// Per-side offset band for a paired layer. `max_mm` is the straight-edge
/// maximum; mitred corners may extend it by `miter_factor`.
#[derive(Debug, Clone, Copy)]
pub struct PairedOffsetSpec {
    pub direction: OffsetDirection,
    pub min_mm: f64,
    pub max_mm: f64,
    pub miter_factor: f64,
    pub tolerance_mm: f64,
}

pub struct OffsetMeasurement {
    /// Bounding-box size difference in the expected direction, real mm.
    /// Negative means the pair differs the wrong way.
    pub width_diff_mm: f64,
    pub height_diff_mm: f64,
    pub width_per_side_mm: f64,
    pub height_per_side_mm: f64,
}

impl PairedOffsetSpec {
    pub fn measure(
        &self,
        derived: &LetterMetrics,
        source: &LetterMetrics,
        scale: f64,
    ) -> OffsetMeasurement {
        let (dw, dh) = match self.direction {
            OffsetDirection::Grow => {
                (derived.width - source.width, derived.height - source.height)
            }
            OffsetDirection::Shrink => {
                (source.width - derived.width, source.height - derived.height)
            }
        };
        let width_diff_mm = units_to_mm(dw, scale);
        let height_diff_mm = units_to_mm(dh, scale);
        OffsetMeasurement {
            width_diff_mm,
            height_diff_mm,
            width_per_side_mm: width_diff_mm / 2.0,
            height_per_side_mm: height_diff_mm / 2.0,
        }
    }

    pub fn max_per_side_mm(&self) -> f64 {
        self.max_mm * self.miter_factor
    }

    pub fn per_side_ok(&self, per_side_mm: f64) -> bool {
        per_side_mm >= self.min_mm - self.tolerance_mm
            && per_side_mm <= self.max_per_side_mm() + self.tolerance_mm
    }
}

/// Rounding used by the mounting-hole heuristics. Trim-cap methods truncate
/// the rates; the halo and acrylic-face methods round to nearest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateRounding {
    Truncate,
    Nearest,
}

pub fn required_mounting_holes(
    min_holes: usize,
    perimeter_inches: f64,
    holes_per_inch_perimeter: f64,
    area_sq_inches: f64,
    holes_per_sq_inch: f64,
    rounding: RateRounding,
) -> (usize, usize, usize) {
    let apply = |value: f64| -> usize {
        let v = match rounding {
            RateRounding::Truncate => value.trunc(),
            RateRounding::Nearest => value.round(),
        };
        if v.is_finite() && v > 0.0 { v as usize } else { 0 }
    };
    let by_perimeter = apply(perimeter_inches * holes_per_inch_perimeter);
    let by_area = apply(area_sq_inches * holes_per_sq_inch);
    (min_holes.max(by_perimeter).max(by_area), by_perimeter, by_area)
}

pub struct SpacingPair {
    pub a: usize,
    pub b: usize,
    pub distance_units: f64,
}

/// Buffers each letter's exterior outward by `buffer_units` with mitred
/// joins (simulating trim/face material over the return) and measures every
/// pair's minimum boundary distance.
pub fn buffered_spacing(letters: &[LetterMetrics], buffer_units: f64) -> Vec<SpacingPair> {
    let buffered: Vec<Option<Vec<Vec2>>> = letters
        .iter()
        .map(|l| l.polygon().map(|p| offset_ring_mitred(&p.exterior, buffer_units)))
        .collect();

    let mut pairs = Vec::new();
    for a in 0..buffered.len() {
        let Some(ring_a) = &buffered[a] else { continue };
        for b in (a + 1)..buffered.len() {
            let Some(ring_b) = &buffered[b] else { continue };
            pairs.push(SpacingPair {
                a,
                b,
                distance_units: ring_min_distance(ring_a, ring_b),
            });
        }
    }
    pairs
}

const CENTERING_RAY_DEGREES: [f64; 7] = [120.0, 140.0, 160.0, 180.0, 200.0, 220.0, 240.0];

#[derive(Debug, Clone)]
pub struct CenteringConfig {
    pub ratio_threshold: f64,
    pub exempt_distance_inches: f64,
    pub min_edge_distance_inches: f64,
    pub min_letter_size_inches: f64,
    pub target_names: Vec<String>,
}

impl Default for CenteringConfig {
    fn default() -> Self {
        Self {
            ratio_threshold: 0.30,
            exempt_distance_inches: 2.0,
            min_edge_distance_inches: 0.5,
            min_letter_size_inches: 3.0,
            target_names: vec!["Pin Thread Mounting".to_string(), "Rivnut".to_string()],
        }
    }
}

impl CenteringConfig {
    pub fn from_options(opts: &RuleOptions) -> Self {
        let defaults = Self::default();
        Self {
            ratio_threshold: opts
                .get_f64("hole_centering_ratio_threshold", defaults.ratio_threshold),
            exempt_distance_inches: opts
                .get_f64("hole_centering_exempt_inches", defaults.exempt_distance_inches),
            min_edge_distance_inches: opts
                .get_f64("hole_centering_min_edge_inches", defaults.min_edge_distance_inches),
            min_letter_size_inches: opts.get_f64(
                "hole_centering_min_letter_size_inches",
                defaults.min_letter_size_inches,
            ),
            target_names: opts
                .get_string_list("hole_centering_names", &["Pin Thread Mounting", "Rivnut"]),
        }
    }
}

struct CenteringOutcome {
    d_min: f64,
    d_opposite: f64,
    ratio: f64,
    rays_missed: usize,
    rays_total: usize,
    on_edge: bool,
}

fn polygon_rings(poly: &Polygon) -> impl Iterator<Item = &[Vec2]> {
    std::iter::once(poly.exterior.as_slice()).chain(poly.interiors.iter().map(Vec::as_slice))
}

/// Nearest boundary distance plus a fan of rays cast across the 120-240
/// degree arc facing away from the nearest boundary point. The centering
/// ratio is d_min / (d_min + farthest ray hit).
fn measure_centering(poly: &Polygon, center: Vec2) -> Option<CenteringOutcome> {
    let mut d_min = f64::INFINITY;
    let mut nearest = None;
    for ring in polygon_rings(poly) {
        let d = distance_point_to_ring(center, ring);
        if d < d_min {
            d_min = d;
            nearest = closest_point_on_ring(center, ring);
        }
    }
    let nearest = nearest?;
    if d_min < 1e-9 {
        return Some(CenteringOutcome {
            d_min: 0.0,
            d_opposite: 0.0,
            ratio: 0.0,
            rays_missed: 0,
            rays_total: CENTERING_RAY_DEGREES.len(),
            on_edge: true,
        });
    }

    let toward_nearest = nearest.sub(center).normalized()?;
    let mut d_opposite: f64 = 0.0;
    let mut rays_missed = 0;
    for degrees in CENTERING_RAY_DEGREES {
        let theta = degrees.to_radians();
        let (sin, cos) = theta.sin_cos();
        let dir = Vec2::new(
            toward_nearest.x * cos - toward_nearest.y * sin,
            toward_nearest.x * sin + toward_nearest.y * cos,
        );
        let mut hit: Option<f64> = None;
        for ring in polygon_rings(poly) {
            if let Some(t) = signcheck_core::geom::ray_ring_intersection(center, dir, ring) {
                hit = Some(hit.map_or(t, |h: f64| h.min(t)));
            }
        }
        match hit {
            Some(t) => d_opposite = d_opposite.max(t),
            None => rays_missed += 1,
        }
    }

    let ratio = if d_min + d_opposite > 0.0 { d_min / (d_min + d_opposite) } else { 0.0 };
    Some(CenteringOutcome {
        d_min,
        d_opposite,
        ratio,
        rays_missed,
        rays_total: CENTERING_RAY_DEGREES.len(),
        on_edge: false,
    })
}

/// Mounting-hole centering check for one layer. Off-center pin thread and
/// rivnut holes concentrate load near one edge of the stroke.
pub fn check_hole_centering(
    doc: &SignDocument,
    analysis: &LetterAnalysisResult,
    layer: &str,
    config: &CenteringConfig,
    rule: &str,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let scale = analysis.scale;
    let on_edge_threshold_inches = 0.01;

    for letter in layer_metrics(doc, analysis, layer) {
        let Some(poly) = letter.polygon() else { continue };

        let (real_w, real_h) = letter.size_inches(scale);
        if real_w < config.min_letter_size_inches || real_h < config.min_letter_size_inches {
            continue;
        }

        for hole in letter.holes_of(HoleType::Mounting) {
            let Some(name) = &hole.size_name else { continue };
            if !config.target_names.iter().any(|n| n == name) {
                continue;
            }
            let Some(result) = measure_centering(poly, hole.center) else { continue };

            let d_min_inches = units_to_inches(result.d_min, scale);
            let d_opposite_inches = units_to_inches(result.d_opposite, scale);
            let letter_label = letter.label();
            let hole_label = format!("path_{}", hole.entity_id);

            if result.on_edge || d_min_inches < on_edge_threshold_inches {
                issues.push(
                    ValidationIssue::error(
                        rule,
                        "hole_centering",
                        format!(
                            "{name} hole {hole_label} in letter {letter_label} is on the letter edge"
                        ),
                    )
                    .detail("letter_id", letter_label.clone())
                    .detail("hole_matched_name", name.clone())
                    .detail("d_min_inches", json!(d_min_inches))
                    .detail("centering_ratio", json!(0.0)),
                );
                continue;
            }

            if result.rays_missed == result.rays_total {
                issues.push(
                    ValidationIssue::error(
                        rule,
                        "hole_centering",
                        format!(
                            "{name} hole {hole_label} in letter {letter_label} may be outside the letter boundary"
                        ),
                    )
                    .detail("letter_id", letter_label.clone())
                    .detail("hole_matched_name", name.clone())
                    .detail("rays_missed", result.rays_missed as u64),
                );
                continue;
            }

            if d_min_inches < config.min_edge_distance_inches {
                issues.push(
                    ValidationIssue::warning(
                        rule,
                        "hole_centering",
                        format!(
                            "{name} hole {hole_label} in letter {letter_label} is only {d_min_inches:.2}\" from the nearest edge (minimum {:.2}\")",
                            config.min_edge_distance_inches
                        ),
                    )
                    .detail("letter_id", letter_label.clone())
                    .detail("hole_matched_name", name.clone())
                    .detail("d_min_inches", json!(d_min_inches))
                    .detail("d_opposite_inches", json!(d_opposite_inches))
                    .detail("min_edge_distance_inches", json!(config.min_edge_distance_inches)),
                );
                // Still check the ratio below.
            }

            if d_min_inches >= config.exempt_distance_inches {
                continue;
            }

            if result.ratio < config.ratio_threshold {
                issues.push(
                    ValidationIssue::warning(
                        rule,
                        "hole_centering",
                        format!(
                            "{name} hole {hole_label} in letter {letter_label} may be off-center: {d_min_inches:.2}\" from nearest edge vs {d_opposite_inches:.2}\" from opposite edge"
                        ),
                    )
                    .detail("letter_id", letter_label)
                    .detail("hole_matched_name", name.clone())
                    .detail("d_min_inches", json!(d_min_inches))
                    .detail("d_opposite_inches", json!(d_opposite_inches))
                    .detail("centering_ratio", json!(result.ratio)),
                );
            }
        }
    }
    issues
}

/// Per-letter and orphan-hole issues shared by the trim-cap style methods:
/// orphans are always errors, return letters need exactly one wire hole,
/// unknown hole sizes are surfaced as diagnostics.
pub fn letter_hole_issues(
    doc: &SignDocument,
    analysis: &LetterAnalysisResult,
    return_layer: &str,
    check_wire_holes: bool,
    rule: &str,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for hole in &analysis.orphan_holes {
        issues.push(
            ValidationIssue::error(
                rule,
                "orphan_hole",
                format!(
                    "Hole path_{} ({}, {:.2}mm) is outside all letters",
                    hole.entity_id,
                    hole_type_name(hole.hole_type),
                    hole.real_diameter_mm
                ),
            )
            .detail("hole_type", hole_type_name(hole.hole_type))
            .detail("diameter_mm", json!(hole.real_diameter_mm))
            .detail("center", json!([hole.center.x, hole.center.y])),
        );
    }

    for letter in layer_metrics(doc, analysis, return_layer) {
        let label = letter.label();
        let wire = letter.wire_hole_count();
        if check_wire_holes && wire == 0 {
            let (w, h) = letter.size_inches(analysis.scale);
            issues.push(
                ValidationIssue::error(
                    rule,
                    "letter_no_wire_hole",
                    format!("Letter {label} has no wire hole"),
                )
                .detail("layer", letter.group.layer.clone())
                .detail("size_inches", json!([w, h]))
                .detail(
                    "hole_counts",
                    json!({
                        "wire": wire,
                        "mounting": letter.mounting_hole_count(),
                        "unknown": letter.unknown_holes().len(),
                    }),
                ),
            );
        }
        if check_wire_holes && wire > 1 {
            issues.push(
                ValidationIssue::warning(
                    rule,
                    "letter_multiple_wire_holes",
                    format!("Letter {label} has {wire} wire holes, expected 1"),
                )
                .detail("wire_hole_count", wire as u64),
            );
        }
        for hole in letter.unknown_holes() {
            issues.push(
                ValidationIssue::info(
                    rule,
                    "unknown_hole_size",
                    format!(
                        "Hole path_{} in letter {label} has unusual diameter {:.2}mm",
                        hole.entity_id, hole.real_diameter_mm
                    ),
                )
                .detail("letter_id", label.clone())
                .detail("diameter_mm", json!(hole.real_diameter_mm)),
            );
        }
    }

    issues
}

pub fn hole_type_name(kind: HoleType) -> &'static str {
    match kind {
        HoleType::Unclassified => "unclassified",
        HoleType::Wire => "wire",
        HoleType::Mounting => "mounting",
        HoleType::Engraving => "engraving",
        HoleType::Unknown => "unknown",
    }
}
