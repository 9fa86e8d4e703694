use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::model::HoleType;

/// Options for a single rule, as loose JSON values. Typed accessors fall
/// back to the caller's default when the key is absent or the wrong type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleOptions(pub BTreeMap<String, Value>);

impl RuleOptions {
    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.0.get(key).and_then(Value::as_f64).unwrap_or(default)
    }

    pub fn get_usize(&self, key: &str, default: usize) -> usize {
        self.0
            .get(key)
            .and_then(Value::as_u64)
            .map(|v| v as usize)
            .unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.0.get(key).and_then(Value::as_str).unwrap_or(default)
    }

    pub fn get_string_list(&self, key: &str, default: &[&str]) -> Vec<String> {
        match self.0.get(key).and_then(Value::as_array) {
            Some(values) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None => default.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Rules map keyed by rule name. Unrecognized keys are simply never looked
/// up, so stale configuration does not break validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig(pub BTreeMap<String, RuleOptions>);

impl RulesConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn rule(&self, name: &str) -> RuleOptions {
        self.0.get(name).cloned().unwrap_or_default()
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Standard hole-size table from `letter_hole_analysis.standard_hole_sizes`,
    /// falling back to the built-in table.
    pub fn standard_hole_sizes(&self) -> Vec<StandardHoleSize> {
        let opts = self.rule("letter_hole_analysis");
        match opts.0.get("standard_hole_sizes") {
            Some(value) => parse_hole_sizes(value).unwrap_or_else(default_hole_sizes),
            None => default_hole_sizes(),
        }
    }
}

/// One row of the standard hole-size table. Table order breaks distance
/// ties during classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardHoleSize {
    pub name: String,
    /// Nominal real-world diameter in millimetres.
    pub diameter_mm: f64,
    pub tolerance_mm: f64,
    pub category: HoleType,
}

impl StandardHoleSize {
    pub fn matches(&self, real_diameter_mm: f64) -> bool {
        (real_diameter_mm - self.diameter_mm).abs() <= self.tolerance_mm
    }
}

pub fn default_hole_sizes() -> Vec<StandardHoleSize> {
    vec![
        StandardHoleSize {
            name: "Wire Pass-Through".to_string(),
            diameter_mm: 10.0,
            tolerance_mm: 2.0,
            category: HoleType::Wire,
        },
        StandardHoleSize {
            name: "Pin Thread Mounting".to_string(),
            diameter_mm: 4.0,
            tolerance_mm: 1.0,
            category: HoleType::Mounting,
        },
        StandardHoleSize {
            name: "Rivnut".to_string(),
            diameter_mm: 7.0,
            tolerance_mm: 0.8,
            category: HoleType::Mounting,
        },
    ]
}

fn parse_hole_sizes(value: &Value) -> Option<Vec<StandardHoleSize>> {
    let rows = value.as_array()?;
    let mut table = Vec::with_capacity(rows.len());
    for row in rows {
        let obj = row.as_object()?;
        let category = match obj.get("category").and_then(Value::as_str)? {
            "wire" => HoleType::Wire,
            "mounting" => HoleType::Mounting,
            "engraving" => HoleType::Engraving,
            _ => HoleType::Unknown,
        };
        table.push(StandardHoleSize {
            name: obj.get("name").and_then(Value::as_str)?.to_string(),
            diameter_mm: obj.get("diameter_mm").and_then(Value::as_f64)?,
            tolerance_mm: obj.get("tolerance_mm").and_then(Value::as_f64).unwrap_or(0.5),
            category,
        });
    }
    Some(table)
}
