pub mod build;
pub mod layers;
pub mod parse;

use anyhow::{Context, Result};
use std::path::Path;

use signcheck_core::model::SignDocument;

pub use layers::{LayerResolution, LayerStrategy, LAYER_DEFS, LAYER_HIDDEN, LAYER_NONE};

/// Parses SVG text and resolves layers against the authoritative name list
/// recovered from the original container (pass an empty slice when none is
/// available).
pub fn import_svg_text(xml: &str, authoritative_names: &[String]) -> Result<SignDocument> {
    let parsed = parse::parse_document(xml).context("parse SVG document")?;
    let resolution = layers::resolve_layers(&parsed, authoritative_names);
    Ok(build::build_document(&parsed, &resolution))
}

pub fn import_svg(path: &Path, authoritative_names: &[String]) -> Result<SignDocument> {
    let xml = std::fs::read_to_string(path).with_context(|| format!("read SVG: {path:?}"))?;
    import_svg_text(&xml, authoritative_names)
}
