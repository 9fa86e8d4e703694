use crate::parse::{GroupInfo, ParsedDocument, ParsedShape};

pub const LAYER_DEFS: &str = "_defs_";
pub const LAYER_NONE: &str = "_no_layer_";
pub const LAYER_HIDDEN: &str = "_hidden_";

/// How the group-to-layer mapping was decided, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerStrategy {
    ExplicitLabel,
    NativeId,
    ContainerPartition,
    PositionalOffset,
    Synthetic,
}

#[derive(Debug, Clone)]
pub struct LayerResolution {
    pub strategy: LayerStrategy,
    /// One resolved name per top-level group, in document order.
    pub group_names: Vec<String>,
}

/// A layer entry with no alphanumeric characters is a visual separator in
/// the authoring tool and never receives geometry.
pub fn is_separator_name(name: &str) -> bool {
    !name.chars().any(|c| c.is_ascii_alphanumeric())
}

pub fn filter_layer_names(names: &[String]) -> Vec<String> {
    names
        .iter()
        .filter(|n| !is_separator_name(n))
        .cloned()
        .collect()
}

/// Resolves a name for every top-level group. `authoritative_names` is the
/// ordered layer list recovered from the original container, possibly empty.
/// Never fails: the last resort is synthetic `Layer_N` names.
pub fn resolve_layers(doc: &ParsedDocument, authoritative_names: &[String]) -> LayerResolution {
    let filtered = filter_layer_names(authoritative_names);

    if let Some(names) = try_explicit_labels(&doc.groups) {
        return LayerResolution { strategy: LayerStrategy::ExplicitLabel, group_names: names };
    }
    if let Some(names) = try_native_ids(&doc.groups) {
        return LayerResolution { strategy: LayerStrategy::NativeId, group_names: names };
    }
    if let Some(names) = try_container_partition(&doc.groups, &filtered) {
        return LayerResolution {
            strategy: LayerStrategy::ContainerPartition,
            group_names: names,
        };
    }
    if !filtered.is_empty() && !doc.groups.is_empty() {
        return LayerResolution {
            strategy: LayerStrategy::PositionalOffset,
            group_names: positional_offset(doc.groups.len(), &filtered),
        };
    }
    LayerResolution {
        strategy: LayerStrategy::Synthetic,
        group_names: synthetic_names(doc.groups.len()),
    }
}

/// Applies a resolution to every shape. Defs and hidden sentinels win over
/// any group mapping.
pub fn layer_for_shape(shape: &ParsedShape, resolution: &LayerResolution) -> String {
    if shape.in_defs {
        return LAYER_DEFS.to_string();
    }
    if shape.hidden {
        return LAYER_HIDDEN.to_string();
    }
    match shape.top_group {
        Some(index) => resolution
            .group_names
            .get(index)
            .cloned()
            .unwrap_or_else(|| synthetic_name(index)),
        None => LAYER_NONE.to_string(),
    }
}

fn try_explicit_labels(groups: &[GroupInfo]) -> Option<Vec<String>> {
    if groups.is_empty() || !groups.iter().all(|g| g.label.is_some()) {
        return None;
    }
    Some(
        groups
            .iter()
            .map(|g| g.label.clone().unwrap_or_default())
            .collect(),
    )
}

fn try_native_ids(groups: &[GroupInfo]) -> Option<Vec<String>> {
    if groups.is_empty() {
        return None;
    }
    let ids: Option<Vec<&String>> = groups.iter().map(|g| g.id.as_ref()).collect();
    let ids = ids?;
    if ids.iter().all(|id| is_meaningful_id(id)) {
        Some(ids.into_iter().map(|id| id.replace('_', " ")).collect())
    } else {
        None
    }
}

/// Converter-generated ids look like "g123" / "surface1" / "layer2"; native
/// authoring ids carry real words.
fn is_meaningful_id(id: &str) -> bool {
    let id = id.trim();
    if id.is_empty() || id.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let lower = id.to_ascii_lowercase();
    for prefix in ["g", "surface", "layer", "id", "path", "group"] {
        if let Some(rest) = lower.strip_prefix(prefix) {
            if rest.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '_') {
                return false;
            }
        }
    }
    true
}

/// Flattened-layer reconciliation: the converter turned each original layer
/// into a run of orphan groups followed by one container group. Applies only
/// when the container count matches the authoritative name count and at
/// least one orphan exists; otherwise the structure gives no signal.
fn try_container_partition(groups: &[GroupInfo], filtered: &[String]) -> Option<Vec<String>> {
    if groups.is_empty() || filtered.is_empty() {
        return None;
    }
    let container_count = groups.iter().filter(|g| g.is_container()).count();
    let orphan_count = groups.len() - container_count;
    if orphan_count == 0 || container_count != filtered.len() {
        return None;
    }

    let mut names = vec![String::new(); groups.len()];
    let mut name_iter = filtered.iter();
    let mut segment_start = 0;
    let mut last_name: Option<String> = None;
    for (i, group) in groups.iter().enumerate() {
        if group.is_container() {
            let name = name_iter.next().cloned().unwrap_or_else(|| synthetic_name(i));
            for slot in names.iter_mut().take(i + 1).skip(segment_start) {
                *slot = name.clone();
            }
            last_name = Some(name);
            segment_start = i + 1;
        }
    }
    // Trailing orphans after the last container join its layer.
    if segment_start < groups.len() {
        let name = last_name.unwrap_or_else(|| synthetic_name(segment_start));
        for slot in names.iter_mut().skip(segment_start) {
            *slot = name.clone();
        }
    }
    Some(names)
}

/// Tail-aligns the group list with the name list; leading surplus groups are
/// converter chrome and get synthetic names.
fn positional_offset(group_count: usize, filtered: &[String]) -> Vec<String> {
    let offset = group_count.saturating_sub(filtered.len());
    (0..group_count)
        .map(|i| {
            if i < offset {
                synthetic_name(i)
            } else {
                filtered
                    .get(i - offset)
                    .cloned()
                    .unwrap_or_else(|| synthetic_name(i))
            }
        })
        .collect()
}

fn synthetic_name(index: usize) -> String {
    format!("Layer_{}", index + 1)
}

fn synthetic_names(count: usize) -> Vec<String> {
    (0..count).map(synthetic_name).collect()
}
