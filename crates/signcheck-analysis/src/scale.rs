use signcheck_core::config::StandardHoleSize;

/// Vote tolerances for the two working-scale hypotheses, in drawing units.
#[derive(Debug, Clone)]
pub struct ScaleConfig {
    pub tolerance_10pct: f64,
    pub tolerance_100pct: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self { tolerance_10pct: 0.3, tolerance_100pct: 3.0 }
    }
}

/// Detects whether the file is drawn at 10% or full scale by matching
/// candidate circle diameters against the standard hole sizes under each
/// hypothesis. Ties and empty inputs default to full scale.
pub fn detect_scale(
    circle_diameters: &[f64],
    table: &[StandardHoleSize],
    config: &ScaleConfig,
) -> f64 {
    if circle_diameters.is_empty() || table.is_empty() {
        return 1.0;
    }
    let mut votes_10 = 0usize;
    let mut votes_100 = 0usize;
    for &d in circle_diameters {
        let hit_10 = table
            .iter()
            .any(|s| (d - s.diameter_mm * 0.1).abs() < config.tolerance_10pct);
        let hit_100 = table
            .iter()
            .any(|s| (d - s.diameter_mm).abs() < config.tolerance_100pct);
        if hit_10 {
            votes_10 += 1;
        } else if hit_100 {
            votes_100 += 1;
        }
    }
    if votes_10 > votes_100 {
        0.1
    } else {
        1.0
    }
}
