//! Per-row integrity checks: IDs, list cells, numeric ranges, embedded JSON.

use crate::core::context::{Cell, ValidationContext};
use crate::core::error::{FindingKind, ValidationError};
use crate::core::types::{columns, Entity};
use crate::validation::stages::ValidationStage;
use std::collections::HashSet;

/// Duplicate and blank IDs.
///
/// Every repeat of an ID is reported, so N occurrences give N-1 findings.
/// A blank ID cell is reported under `row_<index>`; a missing ID column is
/// left to the schema check.
pub struct DuplicateIdValidation;

impl ValidationStage for DuplicateIdValidation {
    fn name(&self) -> &str {
        "Duplicate ID Validation"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for entity in Entity::TABLES {
            let Some(id_column) = entity.id_column() else {
                continue;
            };
            let mut seen = HashSet::new();

            for (index, row) in ctx.dataset.rows(entity).iter().enumerate() {
                if !row.has_column(id_column) {
                    continue;
                }
                let id = row.text(id_column);
                if id.is_empty() {
                    errors.push(
                        ValidationError::new(
                            FindingKind::MissingId,
                            entity,
                            format!("row_{}", index),
                            format!("Missing {} at row {}", id_column, index),
                        )
                        .with_field(id_column),
                    );
                } else if !seen.insert(id) {
                    errors.push(ValidationError::new(
                        FindingKind::DuplicateId,
                        entity,
                        id,
                        format!("Duplicate {}: {}", id_column, id),
                    ));
                }
            }
        }

        errors
    }
}

fn malformed<T>(
    cell: &Cell<T>,
    entity: Entity,
    row_key: &str,
    label: &str,
    column: &str,
) -> Option<ValidationError> {
    let Some(Err(reason)) = cell else {
        return None;
    };
    Some(
        ValidationError::new(
            FindingKind::MalformedList,
            entity,
            row_key,
            format!("Malformed {} for {} {}: {}", column, label, row_key, reason),
        )
        .with_field(column),
    )
}

/// List cells: `AvailableSlots`, `Skills`, `RequiredSkills`.
pub struct MalformedListValidation;

impl ValidationStage for MalformedListValidation {
    fn name(&self) -> &str {
        "Malformed List Validation"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for worker in &ctx.workers {
            let key = worker.row_key();
            errors.extend(malformed(&worker.slots, Entity::Workers, &key, "Worker", columns::AVAILABLE_SLOTS));
            errors.extend(malformed(&worker.skills, Entity::Workers, &key, "Worker", columns::SKILLS));
        }

        for task in &ctx.tasks {
            let key = task.row_key();
            errors.extend(malformed(
                &task.required_skills,
                Entity::Tasks,
                &key,
                "Task",
                columns::REQUIRED_SKILLS,
            ));
        }

        errors
    }
}

/// A numeric cell and the rule it must satisfy.
struct NumericCheck<'c> {
    cell: &'c Cell<f64>,
    accept: fn(f64) -> bool,
    entity: Entity,
    column: &'static str,
    message: String,
}

impl NumericCheck<'_> {
    fn run(&self, row_key: &str) -> Option<ValidationError> {
        let bad = match self.cell {
            None => false,
            Some(Ok(value)) => !(self.accept)(*value),
            Some(Err(_)) => true,
        };
        bad.then(|| {
            ValidationError::new(FindingKind::OutOfRange, self.entity, row_key, self.message.clone())
                .with_field(self.column)
        })
    }
}

/// Numeric ranges: `PriorityLevel` in 1..=5, `MaxLoadPerPhase` >= 0,
/// `Duration` >= 1, `MaxConcurrent` >= 1.
pub struct NumericRangeValidation;

impl ValidationStage for NumericRangeValidation {
    fn name(&self) -> &str {
        "Numeric Range Validation"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for client in &ctx.clients {
            let key = client.row_key();
            let check = NumericCheck {
                cell: &client.priority,
                accept: |v| (1.0..=5.0).contains(&v),
                entity: Entity::Clients,
                column: columns::PRIORITY_LEVEL,
                message: format!("PriorityLevel out of range (1-5) for Client {}", key),
            };
            errors.extend(check.run(&key));
        }

        for worker in &ctx.workers {
            let key = worker.row_key();
            let check = NumericCheck {
                cell: &worker.max_load,
                accept: |v| v >= 0.0,
                entity: Entity::Workers,
                column: columns::MAX_LOAD_PER_PHASE,
                message: format!("Invalid MaxLoadPerPhase for Worker {} (must be >= 0)", key),
            };
            errors.extend(check.run(&key));
        }

        for task in &ctx.tasks {
            let key = task.row_key();
            let checks = [
                NumericCheck {
                    cell: &task.duration,
                    accept: |v| v >= 1.0,
                    entity: Entity::Tasks,
                    column: columns::DURATION,
                    message: format!("Duration must be >= 1 for Task {}", key),
                },
                NumericCheck {
                    cell: &task.max_concurrent,
                    accept: |v| v >= 1.0,
                    entity: Entity::Tasks,
                    column: columns::MAX_CONCURRENT,
                    message: format!("MaxConcurrent must be >= 1 for Task {}", key),
                },
            ];
            errors.extend(checks.iter().filter_map(|check| check.run(&key)));
        }

        errors
    }
}

/// `AttributesJSON` cells that look like a JSON object must parse as one.
pub struct AttributesJsonValidation;

impl ValidationStage for AttributesJsonValidation {
    fn name(&self) -> &str {
        "Attributes JSON Validation"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        ctx.clients
            .iter()
            .filter_map(|client| {
                let Some(Err(reason)) = &client.attributes else {
                    return None;
                };
                let key = client.row_key();
                Some(
                    ValidationError::new(
                        FindingKind::InvalidJson,
                        Entity::Clients,
                        &key,
                        format!("Invalid JSON in AttributesJSON for Client {}: {}", key, reason),
                    )
                    .with_field(columns::ATTRIBUTES_JSON),
                )
            })
            .collect()
    }
}

/// Non-blank `PreferredPhases` must be a phase, a range or a phase list.
pub struct PhaseSpecValidation;

impl ValidationStage for PhaseSpecValidation {
    fn name(&self) -> &str {
        "Preferred Phase Validation"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        ctx.tasks
            .iter()
            .filter_map(|task| {
                let Some(Err(reason)) = &task.preferred_phases else {
                    return None;
                };
                let key = task.row_key();
                Some(
                    ValidationError::new(
                        FindingKind::MalformedPhases,
                        Entity::Tasks,
                        &key,
                        format!("Malformed PreferredPhases for Task {}: {}", key, reason),
                    )
                    .with_field(columns::PREFERRED_PHASES),
                )
            })
            .collect()
    }
}
