use rstar::{RTree, RTreeObject, AABB};

use signcheck_core::config::{RuleOptions, StandardHoleSize};
use signcheck_core::geom::{offset_ring_mitred, point_in_ring, Vec2};
use signcheck_core::model::{
    AssociationStats, HoleInfo, HoleType, LetterAnalysisResult, LetterGroup, PathEntity,
    SignDocument, UnassignedPath, UnassignedReason,
};

use crate::scale::{detect_scale, ScaleConfig};

pub const LAYER_DEFS: &str = "_defs_";
pub const LAYER_NONE: &str = "_no_layer_";
pub const LAYER_HIDDEN: &str = "_hidden_";

#[derive(Debug, Clone)]
pub struct AssociationConfig {
    /// Buffer distance for the fallback containment test, drawing units.
    pub containment_tolerance: f64,
    /// Inner paths within this area ratio of their letter are duplicate
    /// traces, not holes.
    pub phantom_area_ratio: f64,
    /// Circles smaller than this fraction of the largest document extent
    /// are rendering artifacts unless they match a standard size.
    pub artifact_fraction: f64,
    /// Circles larger than this real diameter are letter geometry (dots on
    /// an "i", round logos), not holes.
    pub max_hole_real_mm: f64,
    pub scale: ScaleConfig,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            containment_tolerance: 0.5,
            phantom_area_ratio: 0.001,
            artifact_fraction: 0.02,
            max_hole_real_mm: 16.0,
            scale: ScaleConfig::default(),
        }
    }
}

impl AssociationConfig {
    pub fn from_options(opts: &RuleOptions) -> Self {
        let defaults = Self::default();
        Self {
            containment_tolerance: opts
                .get_f64("containment_tolerance", defaults.containment_tolerance),
            phantom_area_ratio: opts.get_f64("phantom_area_ratio", defaults.phantom_area_ratio),
            artifact_fraction: opts.get_f64("artifact_fraction", defaults.artifact_fraction),
            max_hole_real_mm: opts.get_f64("max_hole_real_mm", defaults.max_hole_real_mm),
            scale: ScaleConfig {
                tolerance_10pct: opts
                    .get_f64("scale_detection_tolerance_10pct", defaults.scale.tolerance_10pct),
                tolerance_100pct: opts
                    .get_f64("scale_detection_tolerance_100pct", defaults.scale.tolerance_100pct),
            },
        }
    }
}

struct IndexedBBox {
    /// Position in the per-layer candidate list.
    slot: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedBBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn envelope_of(entity: &PathEntity) -> AABB<[f64; 2]> {
    let b = entity.global.bbox;
    AABB::from_corners([b.min.x, b.min.y], [b.max.x, b.max.y])
}

/// Partitions the document's closed paths into letters, contained holes,
/// orphan holes, and unassigned paths. `analysis_layers` is the post-filter
/// layer list; everything else is off-layer. Output holes are always
/// unclassified.
pub fn associate(
    doc: &SignDocument,
    analysis_layers: &[String],
    table: &[StandardHoleSize],
    config: &AssociationConfig,
) -> LetterAnalysisResult {
    let mut stats = AssociationStats {
        total_paths: doc.entities.len(),
        ..Default::default()
    };
    for entity in &doc.entities {
        *stats.per_layer_paths.entry(entity.layer.clone()).or_insert(0) += 1;
    }

    let mut unassigned: Vec<UnassignedPath> = Vec::new();
    let mut candidates: Vec<&PathEntity> = Vec::new();
    for entity in &doc.entities {
        let reason = if entity.layer == LAYER_DEFS {
            Some(UnassignedReason::DefsPath)
        } else if entity.layer == LAYER_HIDDEN
            || entity.layer == LAYER_NONE
            || !analysis_layers.iter().any(|l| l == &entity.layer)
        {
            Some(UnassignedReason::OffLayer)
        } else if !entity.is_closed() {
            Some(UnassignedReason::OpenPath)
        } else {
            None
        };
        match reason {
            Some(reason) => unassigned.push(UnassignedPath {
                entity_id: entity.id,
                layer: entity.layer.clone(),
                reason,
            }),
            None => candidates.push(entity),
        }
    }

    let circle_diameters: Vec<f64> = candidates
        .iter()
        .filter_map(|e| e.global.circle.map(|c| c.diameter))
        .collect();
    let scale = detect_scale(&circle_diameters, table, &config.scale);

    let largest_extent = doc
        .width
        .max(doc.height)
        .max(doc.extents().map_or(0.0, |b| b.width().max(b.height())));

    let mut letters: Vec<LetterGroup> = Vec::new();
    let mut orphan_holes: Vec<HoleInfo> = Vec::new();

    for layer in analysis_layers {
        let layer_entities: Vec<&PathEntity> = candidates
            .iter()
            .copied()
            .filter(|e| &e.layer == layer)
            .collect();
        if layer_entities.is_empty() {
            continue;
        }
        associate_layer(
            layer,
            &layer_entities,
            table,
            config,
            scale,
            largest_extent,
            &mut letters,
            &mut orphan_holes,
            &mut unassigned,
        );
    }

    stats.letter_count = letters.len();
    stats.hole_count = letters.iter().map(|l| l.holes.len()).sum();
    stats.orphan_count = orphan_holes.len();
    stats.unassigned_count = unassigned.len();

    LetterAnalysisResult { scale, letters, orphan_holes, unassigned, stats }
}

#[allow(clippy::too_many_arguments)]
fn associate_layer(
    layer: &str,
    entities: &[&PathEntity],
    table: &[StandardHoleSize],
    config: &AssociationConfig,
    scale: f64,
    largest_extent: f64,
    letters: &mut Vec<LetterGroup>,
    orphan_holes: &mut Vec<HoleInfo>,
    unassigned: &mut Vec<UnassignedPath>,
) {
    // Oversized circles are letter geometry.
    let is_letter_material = |e: &PathEntity| match e.global.circle {
        None => true,
        Some(c) => c.diameter / scale > config.max_hole_real_mm,
    };

    let letter_candidates: Vec<&PathEntity> = entities
        .iter()
        .copied()
        .filter(|e| is_letter_material(e))
        .collect();
    let circles: Vec<&PathEntity> = entities
        .iter()
        .copied()
        .filter(|e| !is_letter_material(e))
        .collect();

    let tree: RTree<IndexedBBox> = RTree::bulk_load(
        letter_candidates
            .iter()
            .enumerate()
            .map(|(slot, e)| IndexedBBox { slot, envelope: envelope_of(e) })
            .collect(),
    );

    // A candidate is a letter iff no larger-area candidate contains it.
    let container_of = |target: &PathEntity| -> Option<usize> {
        let mut best: Option<(f64, usize)> = None;
        for hit in tree.locate_in_envelope_intersecting(&envelope_of(target)) {
            let other = letter_candidates[hit.slot];
            if other.id == target.id || other.area() <= target.area() {
                continue;
            }
            if !entity_contains_point(other, target.centroid(), config.containment_tolerance) {
                continue;
            }
            match best {
                Some((area, _)) if area <= other.area() => {}
                _ => best = Some((other.area(), hit.slot)),
            }
        }
        best.map(|(_, slot)| slot)
    };

    let mut letter_slot_to_group: Vec<Option<usize>> = vec![None; letter_candidates.len()];
    let mut inner_paths: Vec<(usize, &PathEntity)> = Vec::new();
    for (slot, candidate) in letter_candidates.iter().enumerate() {
        match container_of(candidate) {
            None => {
                letter_slot_to_group[slot] = Some(letters.len());
                letters.push(LetterGroup {
                    entity_id: candidate.id,
                    layer: layer.to_string(),
                    holes: Vec::new(),
                });
            }
            Some(container_slot) => inner_paths.push((container_slot, candidate)),
        }
    }

    // Inner non-circle paths: duplicate traces get dropped, the rest become
    // unclassified non-circular holes (counters are already baked into the
    // letter polygon as interior rings; these are separate elements).
    for (container_slot, inner) in inner_paths {
        let container = letter_candidates[container_slot];
        let ratio = if container.area() > 0.0 { inner.area() / container.area() } else { 0.0 };
        if (ratio - 1.0).abs() <= config.phantom_area_ratio {
            unassigned.push(UnassignedPath {
                entity_id: inner.id,
                layer: layer.to_string(),
                reason: UnassignedReason::Unclassified,
            });
            continue;
        }
        // Resolve the containing letter; the container itself may be an
        // inner path of a bigger letter.
        let mut slot = container_slot;
        while letter_slot_to_group[slot].is_none() {
            match container_of(letter_candidates[slot]) {
                Some(up) if up != slot => slot = up,
                _ => break,
            }
        }
        if let Some(group) = letter_slot_to_group[slot] {
            letters[group].holes.push(HoleInfo {
                entity_id: inner.id,
                center: inner.centroid(),
                diameter: 0.0,
                real_diameter_mm: 0.0,
                hole_type: HoleType::Unclassified,
                size_name: None,
            });
        } else {
            unassigned.push(UnassignedPath {
                entity_id: inner.id,
                layer: layer.to_string(),
                reason: UnassignedReason::Unclassified,
            });
        }
    }

    for circle_entity in circles {
        let Some(circle) = circle_entity.global.circle else { continue };
        let real_mm = circle.diameter / scale;

        let is_artifact = largest_extent > 0.0
            && circle.diameter < config.artifact_fraction * largest_extent
            && !table.iter().any(|s| s.matches(real_mm));
        if is_artifact {
            unassigned.push(UnassignedPath {
                entity_id: circle_entity.id,
                layer: layer.to_string(),
                reason: UnassignedReason::Unclassified,
            });
            continue;
        }

        let hole = HoleInfo {
            entity_id: circle_entity.id,
            center: circle.center,
            diameter: circle.diameter,
            real_diameter_mm: real_mm,
            hole_type: HoleType::Unclassified,
            size_name: None,
        };

        let mut best: Option<(f64, usize)> = None;
        for hit in tree.locate_in_envelope_intersecting(&envelope_of(circle_entity)) {
            let Some(group) = letter_slot_to_group[hit.slot] else { continue };
            let letter_entity = letter_candidates[hit.slot];
            if !entity_contains_point(letter_entity, circle.center, config.containment_tolerance) {
                continue;
            }
            match best {
                Some((area, _)) if area <= letter_entity.area() => {}
                _ => best = Some((letter_entity.area(), group)),
            }
        }
        match best {
            Some((_, group)) => letters[group].holes.push(hole),
            None => orphan_holes.push(hole),
        }
    }
}

/// Centroid-in-polygon first; a miss within `tolerance` of the boundary
/// still counts (touching or borderline-numeric cases).
fn entity_contains_point(entity: &PathEntity, point: Vec2, tolerance: f64) -> bool {
    let Some(polygon) = &entity.global.polygon else {
        return false;
    };
    if polygon.contains_point(point) {
        return true;
    }
    if tolerance <= 0.0 {
        return false;
    }
    let buffered = offset_ring_mitred(&polygon.exterior, tolerance);
    point_in_ring(point, &buffered)
}
