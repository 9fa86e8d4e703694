use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::model::LetterAnalysisResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Passed,
    Warning,
    Failed,
    Error,
}

/// One finding from one rule. `code` is stable and machine-readable;
/// `message` is for people; `details` carries the measured numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub rule: String,
    pub code: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
}

impl ValidationIssue {
    pub fn error(rule: &str, code: &str, message: impl Into<String>) -> Self {
        Self::with_severity(rule, code, Severity::Error, message)
    }

    pub fn warning(rule: &str, code: &str, message: impl Into<String>) -> Self {
        Self::with_severity(rule, code, Severity::Warning, message)
    }

    pub fn info(rule: &str, code: &str, message: impl Into<String>) -> Self {
        Self::with_severity(rule, code, Severity::Info, message)
    }

    pub fn with_severity(rule: &str, code: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            code: code.to_string(),
            severity,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DocumentStats {
    pub total_paths: usize,
    pub closed_paths: usize,
    pub total_area: f64,
    pub total_perimeter: f64,
    pub per_layer_paths: BTreeMap<String, usize>,
    pub detected_scale: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub status: Status,
    pub method: String,
    pub input_file: String,
    pub issues: Vec<ValidationIssue>,
    pub stats: DocumentStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_analysis: Option<LetterAnalysisResult>,
    /// Fatal pipeline error text, set only when `status` is `Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn fatal(method: &str, input_file: &str, error: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            method: method.to_string(),
            input_file: input_file.to_string(),
            issues: Vec::new(),
            stats: DocumentStats::default(),
            letter_analysis: None,
            error: Some(error.into()),
        }
    }

    /// Worst issue severity decides the status; `Error` is never downgraded.
    pub fn aggregate_status(&mut self) {
        if self.status == Status::Error {
            return;
        }
        self.status = if self.issues.iter().any(|i| i.severity == Severity::Error) {
            Status::Failed
        } else if self.issues.iter().any(|i| i.severity == Severity::Warning) {
            Status::Warning
        } else {
            Status::Passed
        };
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Warning).count()
    }
}
