use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geom::{BBox2, Vec2};
use crate::path::SubPath;
use crate::polygon::Polygon;
use crate::transform::Transform2D;

/// Presentation attributes carried through from the source file. Colors are
/// normalized to lowercase 6-digit hex; stroke width is in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PathStyle {
    pub stroke: Option<String>,
    pub stroke_width_pt: Option<f64>,
    pub fill: Option<String>,
}

/// Geometry exactly as written in the source element, before any transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGeometry {
    pub subpaths: Vec<SubPath>,
}

/// Result of fitting a circle to a closed subpath.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleFit {
    pub center: Vec2,
    pub diameter: f64,
}

/// Geometry with the full ancestor transform chain applied, plus the derived
/// shapes analysis works on. Derived once at build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalGeometry {
    pub subpaths: Vec<SubPath>,
    /// Present when every subpath is closed.
    pub polygon: Option<Polygon>,
    pub bbox: BBox2,
    pub circle: Option<CircleFit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathEntity {
    pub id: u64,
    /// Element id attribute from the source, when present.
    pub source_id: Option<String>,
    pub layer: String,
    pub transform: Transform2D,
    pub raw: RawGeometry,
    pub global: GlobalGeometry,
    pub style: PathStyle,
    /// Normalized path data string, used for duplicate detection.
    pub data_signature: String,
}

impl PathEntity {
    pub fn is_closed(&self) -> bool {
        self.global.polygon.is_some()
    }

    pub fn is_circle(&self) -> bool {
        self.global.circle.is_some()
    }

    pub fn is_compound(&self) -> bool {
        self.global.polygon.as_ref().map_or(false, Polygon::is_compound)
    }

    pub fn area(&self) -> f64 {
        self.global.polygon.as_ref().map_or(0.0, Polygon::net_area)
    }

    pub fn centroid(&self) -> Vec2 {
        match &self.global.polygon {
            Some(poly) => poly.centroid(),
            None => self.global.bbox.center(),
        }
    }
}

/// A parsed drawing after layer resolution: every entity is tagged with a
/// layer name, possibly a sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignDocument {
    pub width: f64,
    pub height: f64,
    pub entities: Vec<PathEntity>,
    /// Resolved layer names in document order, sentinels excluded.
    pub layers: Vec<String>,
}

impl SignDocument {
    pub fn extents(&self) -> Option<BBox2> {
        let mut bbox = BBox2::empty();
        for e in &self.entities {
            bbox = bbox.union(&e.global.bbox);
        }
        if bbox.is_empty() { None } else { Some(bbox) }
    }

    pub fn entity(&self, id: u64) -> Option<&PathEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entities_on_layer<'a>(&'a self, layer: &'a str) -> impl Iterator<Item = &'a PathEntity> {
        self.entities.iter().filter(move |e| e.layer == layer)
    }
}

/// Physical function assigned to a circular hole. Assignment is one-shot:
/// once a hole leaves `Unclassified` it is never reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoleType {
    Unclassified,
    Wire,
    Mounting,
    Engraving,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoleInfo {
    pub entity_id: u64,
    pub center: Vec2,
    /// Diameter in working-file units.
    pub diameter: f64,
    /// Diameter in millimetres at the detected document scale.
    pub real_diameter_mm: f64,
    pub hole_type: HoleType,
    /// Standard-size name once classified, e.g. "Pin Thread Mounting".
    pub size_name: Option<String>,
}

/// A letter body on one layer together with the holes it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterGroup {
    pub entity_id: u64,
    pub layer: String,
    pub holes: Vec<HoleInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedReason {
    OpenPath,
    DefsPath,
    OffLayer,
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnassignedPath {
    pub entity_id: u64,
    pub layer: String,
    pub reason: UnassignedReason,
}

/// Path accounting for one association run. Every input path lands in
/// exactly one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AssociationStats {
    pub total_paths: usize,
    pub letter_count: usize,
    pub hole_count: usize,
    pub orphan_count: usize,
    pub unassigned_count: usize,
    pub per_layer_paths: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterAnalysisResult {
    /// Detected document scale (1.0 = full size, 0.1 = 10%).
    pub scale: f64,
    pub letters: Vec<LetterGroup>,
    /// Circular holes contained by no letter. Always rule violations.
    pub orphan_holes: Vec<HoleInfo>,
    pub unassigned: Vec<UnassignedPath>,
    pub stats: AssociationStats,
}

impl LetterAnalysisResult {
    pub fn letters_on_layer<'a>(&'a self, layer: &'a str) -> impl Iterator<Item = &'a LetterGroup> {
        self.letters.iter().filter(move |l| l.layer == layer)
    }

    pub fn all_holes_mut(&mut self) -> impl Iterator<Item = &mut HoleInfo> {
        self.letters
            .iter_mut()
            .flat_map(|l| l.holes.iter_mut())
            .chain(self.orphan_holes.iter_mut())
    }
}
