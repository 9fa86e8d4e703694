pub mod associate;
pub mod classify;
pub mod corners;
pub mod scale;

pub use associate::{associate, AssociationConfig};
pub use classify::{classify_hole, classify_holes};
pub use corners::{analyze_entity_corners, analyze_subpath_corners, CornerInfo, POINTS_PER_INCH};
pub use scale::{detect_scale, ScaleConfig};
