use serde::{Deserialize, Serialize};

use crate::geom::{
    point_in_ring, ring_area, ring_centroid, ring_min_distance, ring_perimeter, BBox2, Vec2,
};

/// A filled region: one exterior ring and zero or more interior rings
/// (counters). Rings do not repeat their first point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Vec<Vec2>,
    pub interiors: Vec<Vec<Vec2>>,
}

impl Polygon {
    pub fn new(exterior: Vec<Vec2>) -> Self {
        Self { exterior, interiors: Vec::new() }
    }

    /// Builds a polygon from flattened rings, taking the largest-area ring
    /// as the exterior and the rest as interiors. Returns `None` when no
    /// ring has positive area.
    pub fn from_rings(mut rings: Vec<Vec<Vec2>>) -> Option<Self> {
        rings.retain(|r| r.len() >= 3 && ring_area(r) > 0.0);
        if rings.is_empty() {
            return None;
        }
        let mut largest = 0;
        let mut largest_area = 0.0;
        for (i, ring) in rings.iter().enumerate() {
            let area = ring_area(ring);
            if area > largest_area {
                largest_area = area;
                largest = i;
            }
        }
        let exterior = rings.swap_remove(largest);
        Some(Self { exterior, interiors: rings })
    }

    /// Exterior area minus counter areas.
    pub fn net_area(&self) -> f64 {
        let holes: f64 = self.interiors.iter().map(|r| ring_area(r)).sum();
        (ring_area(&self.exterior) - holes).max(0.0)
    }

    pub fn exterior_area(&self) -> f64 {
        ring_area(&self.exterior)
    }

    pub fn exterior_perimeter(&self) -> f64 {
        ring_perimeter(&self.exterior)
    }

    pub fn centroid(&self) -> Vec2 {
        ring_centroid(&self.exterior)
    }

    pub fn bbox(&self) -> BBox2 {
        BBox2::from_points(&self.exterior)
    }

    /// Inside the exterior and outside every counter.
    pub fn contains_point(&self, p: Vec2) -> bool {
        if !point_in_ring(p, &self.exterior) {
            return false;
        }
        !self.interiors.iter().any(|hole| point_in_ring(p, hole))
    }

    pub fn is_compound(&self) -> bool {
        !self.interiors.is_empty()
    }

    /// Minimum exterior-boundary distance to another polygon's exterior.
    pub fn min_distance_to(&self, other: &Polygon) -> f64 {
        ring_min_distance(&self.exterior, &other.exterior)
    }
}
