//! Validation pipeline: convert, import, filter layers, analyze letters,
//! then run the configured rules for the requested sign method.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use signcheck_analysis::{associate, classify_holes, AssociationConfig};
use signcheck_import_svg::{LAYER_DEFS, LAYER_HIDDEN, LAYER_NONE};
use signcheck_convert::{convert_to_svg, detect_ai_version, extract_ocg_layer_names};
use signcheck_core::config::RulesConfig;
use signcheck_core::error::SigncheckError;
use signcheck_core::model::SignDocument;
use signcheck_core::report::{DocumentStats, ValidationIssue, ValidationResult};
use signcheck_import_svg::import_svg_text;

use crate::{acrylic_face, base, front_lit, halo_lit, push_thru};

/// Sign methods the rule engine knows how to validate.
pub const METHODS: &[&str] = &["front_lit", "front_lit_acrylic_face", "halo_lit", "push_thru"];

pub struct Validator {
    config: RulesConfig,
}

impl Validator {
    pub fn new(config: RulesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Validates an artwork file. Never panics and never returns Err: any
    /// pipeline failure becomes a result with `Status::Error`.
    pub fn validate_file(&self, path: &Path, method: &str) -> ValidationResult {
        let input = path.display().to_string();
        match self.run_file(path, method) {
            Ok(result) => result,
            Err(err) => ValidationResult::fatal(method, &input, format!("{err:#}")),
        }
    }

    /// Validates SVG text directly, skipping the converter chain.
    pub fn validate_svg_text(
        &self,
        svg: &str,
        input_name: &str,
        method: &str,
    ) -> ValidationResult {
        match self.run_svg(svg, &[], input_name, method, Vec::new()) {
            Ok(result) => result,
            Err(err) => ValidationResult::fatal(method, input_name, format!("{err:#}")),
        }
    }

    fn run_file(&self, path: &Path, method: &str) -> Result<ValidationResult> {
        let input = path.display().to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if extension == "svg" {
            let svg = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            return self.run_svg(&svg, &[], &input, method, Vec::new());
        }

        // Layer names from the PDF-compatible stream survive conversion
        // tools that mangle or drop SVG group labels.
        let authoritative = extract_ocg_layer_names(path);
        let version = detect_ai_version(path);
        let outcome = convert_to_svg(path)
            .with_context(|| format!("converting {}", path.display()))?;

        let mut preamble = Vec::new();
        preamble.push(
            ValidationIssue::info(
                "file_info",
                "source_format",
                format!(
                    "{} file converted via {}",
                    version.display_name, outcome.converter
                ),
            )
            .detail("converter", outcome.converter.clone())
            .detail(
                "ai_version",
                version.raw_version.clone().unwrap_or_default(),
            ),
        );

        self.run_svg(&outcome.svg_text, &authoritative, &input, method, preamble)
    }

    fn run_svg(
        &self,
        svg: &str,
        authoritative_names: &[String],
        input: &str,
        method: &str,
        mut issues: Vec<ValidationIssue>,
    ) -> Result<ValidationResult> {
        if !METHODS.contains(&method) {
            return Err(SigncheckError::UnknownMethod(method.to_string()).into());
        }
        let rule_key = format!("{method}_structure");

        let doc = import_svg_text(svg, authoritative_names).context("parsing SVG")?;
        let analysis_layers = analysis_layers(&doc);

        let table = self.config.standard_hole_sizes();
        let method_opts = self.config.rule(&rule_key);
        let assoc_config = AssociationConfig::from_options(&method_opts);
        let mut analysis = associate(&doc, &analysis_layers, &table, &assoc_config);
        classify_holes(&mut analysis, &table);

        match method {
            "front_lit" => {
                issues.extend(front_lit::check_front_lit_structure(&doc, &analysis, &method_opts));
            }
            "front_lit_acrylic_face" => {
                issues.extend(acrylic_face::classify_engraving_paths(
                    &doc,
                    &mut analysis,
                    &method_opts,
                ));
                issues.extend(acrylic_face::check_front_lit_acrylic_face_structure(
                    &doc,
                    &analysis,
                    &method_opts,
                ));
            }
            "halo_lit" => {
                issues.extend(halo_lit::check_halo_lit_structure(&doc, &analysis, &method_opts));
            }
            "push_thru" => {
                issues.extend(push_thru::check_push_thru_structure(&doc, &analysis, &method_opts));
            }
            _ => unreachable!(),
        }

        if self.config.has_rule("no_duplicate_overlapping") {
            issues.extend(base::check_duplicate_overlapping(
                &doc,
                &self.config.rule("no_duplicate_overlapping"),
            ));
        }
        if self.config.has_rule("stroke_requirements") {
            issues.extend(base::check_stroke_requirements(
                &doc,
                &self.config.rule("stroke_requirements"),
            ));
        }
        if self.config.has_rule("structural_mounting_holes") {
            issues.extend(base::check_structural_mounting_holes(
                &doc,
                &self.config.rule("structural_mounting_holes"),
            ));
        }
        if self.config.has_rule("path_closure") {
            issues.extend(base::check_path_closure(&doc, &self.config.rule("path_closure")));
        }

        let mut stats = document_stats(&doc);
        stats.detected_scale = Some(analysis.scale);

        let mut result = ValidationResult {
            status: signcheck_core::report::Status::Passed,
            method: method.to_string(),
            input_file: input.to_string(),
            issues,
            stats,
            letter_analysis: Some(analysis),
            error: None,
        };
        result.aggregate_status();
        Ok(result)
    }
}

/// Layers that carry sign geometry: sentinels and the editor's unnamed
/// "Layer 1" style defaults are dropped before analysis.
fn analysis_layers(doc: &SignDocument) -> Vec<String> {
    doc.layers
        .iter()
        .filter(|name| {
            let n = name.as_str();
            n != LAYER_NONE && n != LAYER_DEFS && n != LAYER_HIDDEN && !is_default_layer_name(n)
        })
        .cloned()
        .collect()
}

/// Matches auto-generated names like "Layer 1" or "Layer_12".
fn is_default_layer_name(name: &str) -> bool {
    let rest = match name.strip_prefix("Layer") {
        Some(rest) => rest,
        None => return false,
    };
    let mut chars = rest.chars();
    match chars.next() {
        Some(' ') | Some('_') => {}
        _ => return false,
    }
    let digits = chars.as_str();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn document_stats(doc: &SignDocument) -> DocumentStats {
    let mut stats = DocumentStats {
        total_paths: doc.entities.len(),
        ..Default::default()
    };
    for entity in &doc.entities {
        *stats.per_layer_paths.entry(entity.layer.clone()).or_insert(0) += 1;
        if entity.is_closed() {
            stats.closed_paths += 1;
            if let Some(poly) = &entity.global.polygon {
                stats.total_area += poly.net_area();
                stats.total_perimeter += poly.exterior_perimeter();
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::is_default_layer_name;

    #[test]
    fn default_layer_names() {
        assert!(is_default_layer_name("Layer 1"));
        assert!(is_default_layer_name("Layer_12"));
        assert!(!is_default_layer_name("Layer"));
        assert!(!is_default_layer_name("Layer one"));
        assert!(!is_default_layer_name("return"));
        assert!(!is_default_layer_name("Layer 1a"));
    }
}
