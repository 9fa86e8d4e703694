use signcheck_core::config::StandardHoleSize;
use signcheck_core::model::{HoleInfo, HoleType, LetterAnalysisResult};

/// Assigns a standard size to every unclassified circular hole: the size
/// with the smallest diameter deviation among those whose tolerance admits
/// the hole; distance ties keep the earlier table row. Classification is
/// one-shot, so already-typed holes (engraving reclassification, reruns)
/// are left alone. Non-circular holes (diameter 0) stay unclassified.
pub fn classify_holes(analysis: &mut LetterAnalysisResult, table: &[StandardHoleSize]) {
    for hole in analysis.all_holes_mut() {
        classify_hole(hole, table);
    }
}

pub fn classify_hole(hole: &mut HoleInfo, table: &[StandardHoleSize]) {
    if hole.hole_type != HoleType::Unclassified || hole.diameter <= 0.0 {
        return;
    }
    let mut best: Option<(f64, &StandardHoleSize)> = None;
    for size in table {
        let deviation = (hole.real_diameter_mm - size.diameter_mm).abs();
        if deviation > size.tolerance_mm {
            continue;
        }
        match best {
            Some((best_dev, _)) if deviation >= best_dev => {}
            _ => best = Some((deviation, size)),
        }
    }
    match best {
        Some((_, size)) => {
            hole.hole_type = size.category;
            hole.size_name = Some(size.name.clone());
        }
        None => hole.hole_type = HoleType::Unknown,
    }
}
