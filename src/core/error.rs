//! Error types for Allotment.
//!
//! Two families live here:
//! - Findings ([`ValidationError`]): consistency problems in the input data.
//!   They are data, collected into a list, and never propagated with `?`.
//! - Failures ([`AllotmentError`] and friends): the call itself could not
//!   proceed (unreadable JSON, wrong input shape, bad config file).

use crate::core::types::Entity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Top-level error type for Allotment.
#[derive(Error, Debug)]
pub enum AllotmentError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The input does not have the shape `{clients, workers, tasks, rules}`.
///
/// This is the only condition under which validation fails as a call
/// rather than returning findings.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("invalid input shape: malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input shape: top-level value must be an object")]
    NotAnObject,

    #[error("invalid input shape: missing '{0}' table")]
    MissingTable(&'static str),

    #[error("invalid input shape: '{table}' must be an array of row objects: {reason}")]
    InvalidTable { table: &'static str, reason: String },

    #[error("invalid input shape: 'rules' must be an array of rule objects: {0}")]
    InvalidRules(String),
}

/// Errors loading validation options.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("phase_count must be at least 1")]
    ZeroPhaseCount,
}

/// Why a single cell could not be decoded.
///
/// Never escapes a validation stage: a stage that hits one reports a finding
/// (or skips the row) and carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("value is empty")]
    Empty,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a list")]
    NotAList,

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("element {index} ('{value}') is not {expected}")]
    InvalidElement {
        index: usize,
        value: String,
        expected: &'static str,
    },

    #[error("'{0}' is not a number")]
    NotNumeric(String),

    #[error("invalid phase range '{0}'")]
    InvalidRange(String),
}

/// Result type alias for per-cell decoding.
pub type FieldResult<T> = Result<T, FieldError>;

/// Result type alias for Allotment operations.
pub type AllotmentResult<T> = Result<T, AllotmentError>;

// ============================================================================
// Findings
// ============================================================================

/// Broad class of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorCategory {
    Schema,
    Integrity,
    Reference,
    Graph,
    Capacity,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Schema => "SchemaError",
            ErrorCategory::Integrity => "IntegrityError",
            ErrorCategory::Reference => "ReferenceError",
            ErrorCategory::Graph => "GraphError",
            ErrorCategory::Capacity => "CapacityError",
        };
        f.write_str(name)
    }
}

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FindingKind {
    MissingColumn,
    MissingId,
    DuplicateId,
    MalformedList,
    OutOfRange,
    InvalidJson,
    MalformedPhases,
    MalformedRule,
    InvalidRule,
    UnknownReference,
    CoRunCycle,
    PhaseWindowConflict,
    WorkerOverload,
    PhaseSaturation,
    SkillCoverageGap,
    ConcurrencyInfeasible,
    LoadLimitInfeasible,
    SlotRestrictionInfeasible,
    #[default]
    Other,
}

impl FindingKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FindingKind::MissingColumn => ErrorCategory::Schema,
            FindingKind::MissingId
            | FindingKind::DuplicateId
            | FindingKind::MalformedList
            | FindingKind::OutOfRange
            | FindingKind::InvalidJson
            | FindingKind::MalformedPhases
            | FindingKind::MalformedRule
            | FindingKind::InvalidRule
            | FindingKind::Other => ErrorCategory::Integrity,
            FindingKind::UnknownReference => ErrorCategory::Reference,
            FindingKind::CoRunCycle | FindingKind::PhaseWindowConflict => ErrorCategory::Graph,
            FindingKind::WorkerOverload
            | FindingKind::PhaseSaturation
            | FindingKind::SkillCoverageGap
            | FindingKind::ConcurrencyInfeasible
            | FindingKind::LoadLimitInfeasible
            | FindingKind::SlotRestrictionInfeasible => ErrorCategory::Capacity,
        }
    }
}

/// One consistency problem found in the input.
///
/// Serializes as `{error, entity, rowId, field?}`. `row_id` is a row's ID,
/// `"all"` for table-wide problems, or a synthetic key such as `phase_3`,
/// `rule_2`, `skill_coverage` or `T1_T2`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("[{entity}:{row_id}] {error}")]
pub struct ValidationError {
    pub error: String,
    pub entity: Entity,
    #[serde(rename = "rowId")]
    pub row_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip)]
    pub kind: FindingKind,
}

impl ValidationError {
    pub fn new(
        kind: FindingKind,
        entity: Entity,
        row_id: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            entity,
            row_id: row_id.into(),
            field: None,
            kind,
        }
    }

    /// Attach the offending column.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Get suggestion for fixing this finding.
    pub fn suggested_fix(&self) -> Option<String> {
        match self.kind {
            FindingKind::MissingColumn => {
                Some(format!("Add the column to the {} table", self.entity))
            }
            FindingKind::DuplicateId => Some(format!("Give row '{}' a unique ID", self.row_id)),
            FindingKind::MalformedList => {
                Some("Use a JSON array like [1,2,3] or a comma list like 1,2,3".to_string())
            }
            FindingKind::UnknownReference => {
                Some("Add the task to the tasks table or remove the reference".to_string())
            }
            FindingKind::MalformedRule => {
                Some("Fix the rule's field values or remove the rule".to_string())
            }
            FindingKind::CoRunCycle => Some("Break the co-run chain so it does not loop".to_string()),
            FindingKind::SkillCoverageGap => {
                Some("Add a worker with this skill or drop it from the tasks".to_string())
            }
            _ => None,
        }
    }
}

// ============================================================================
// Validation Report
// ============================================================================

/// Outcome of running a validation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether validation passed without findings.
    pub success: bool,
    /// Findings, in stage order.
    pub errors: Vec<ValidationError>,
    /// Time taken for validation in milliseconds.
    pub duration_ms: u64,
}

impl ValidationReport {
    /// Create a new empty report (success).
    pub fn new() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Add a finding to the report.
    pub fn add_error(&mut self, error: ValidationError) {
        self.success = false;
        self.errors.push(error);
    }

    pub fn extend<I: IntoIterator<Item = ValidationError>>(&mut self, errors: I) {
        for error in errors {
            self.add_error(error);
        }
    }

    /// Whether the problem statement can be handed to a scheduler.
    pub fn is_valid(&self) -> bool {
        self.success
    }

    /// Findings for one table.
    pub fn errors_for(&self, entity: Entity) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.entity == entity)
    }

    pub fn count_by_category(&self) -> BTreeMap<ErrorCategory, usize> {
        let mut counts = BTreeMap::new();
        for error in &self.errors {
            *counts.entry(error.category()).or_insert(0) += 1;
        }
        counts
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        if self.success {
            "✓ Data and rules are consistent".to_string()
        } else {
            let breakdown = self
                .count_by_category()
                .iter()
                .map(|(category, count)| format!("{} {}", count, category))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "✗ Validation failed with {} error(s) ({})",
                self.errors.len(),
                breakdown
            )
        }
    }

    /// Get detailed error messages with suggestions.
    pub fn detailed_errors(&self) -> Vec<String> {
        self.errors
            .iter()
            .enumerate()
            .map(|(i, error)| {
                let mut msg = format!("{}. {}", i + 1, error);
                if let Some(field) = &error.field {
                    msg.push_str(&format!(" (field: {})", field));
                }
                if let Some(fix) = error.suggested_fix() {
                    msg.push_str(&format!("\n   → Suggestion: {}", fix));
                }
                msg
            })
            .collect()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duplicate(id: &str) -> ValidationError {
        ValidationError::new(
            FindingKind::DuplicateId,
            Entity::Tasks,
            id,
            format!("Duplicate TaskID: {}", id),
        )
    }

    #[test]
    fn test_finding_json_shape() {
        let error = duplicate("T1");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "Duplicate TaskID: T1", "entity": "tasks", "rowId": "T1"})
        );

        let with_field = error.with_field("TaskID");
        let json = serde_json::to_value(&with_field).unwrap();
        assert_eq!(json["field"], "TaskID");
    }

    #[test]
    fn test_finding_display() {
        assert_eq!(duplicate("T9").to_string(), "[tasks:T9] Duplicate TaskID: T9");
    }

    #[test]
    fn test_kind_categories() {
        assert_eq!(FindingKind::MissingColumn.category(), ErrorCategory::Schema);
        assert_eq!(FindingKind::UnknownReference.category(), ErrorCategory::Reference);
        assert_eq!(FindingKind::CoRunCycle.category(), ErrorCategory::Graph);
        assert_eq!(FindingKind::PhaseSaturation.category(), ErrorCategory::Capacity);
        assert_eq!(FindingKind::InvalidJson.category(), ErrorCategory::Integrity);
        assert_eq!(FindingKind::MalformedRule.category(), ErrorCategory::Integrity);
    }

    #[test]
    fn test_validation_report() {
        let mut report = ValidationReport::new();
        assert!(report.is_valid());

        report.add_error(duplicate("T1"));
        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors_for(Entity::Tasks).count(), 1);
        assert_eq!(report.errors_for(Entity::Workers).count(), 0);
        assert!(report.summary().contains("1 IntegrityError"));
        assert!(report.detailed_errors()[0].contains("Suggestion"));
    }

    #[test]
    fn test_input_error_is_distinguishable() {
        let err: AllotmentError = InputError::MissingTable("tasks").into();
        assert!(matches!(err, AllotmentError::Input(InputError::MissingTable("tasks"))));
        assert!(err.to_string().contains("invalid input shape"));

        let err: AllotmentError = ConfigError::ZeroPhaseCount.into();
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
