//! Cross-table reference checks.

use crate::core::context::ValidationContext;
use crate::core::error::{FindingKind, ValidationError};
use crate::core::rule::Rule;
use crate::core::types::{columns, Entity};
use crate::validation::stages::ValidationStage;

/// Unknown task IDs in client requests and pattern-match rules.
pub struct ReferenceValidation;

impl ValidationStage for ReferenceValidation {
    fn name(&self) -> &str {
        "Reference Validation"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for client in &ctx.clients {
            let key = client.row_key();
            for id in client.requested_tasks.iter().filter(|id| !ctx.has_task(id)) {
                errors.push(
                    ValidationError::new(
                        FindingKind::UnknownReference,
                        Entity::Clients,
                        &key,
                        format!("Unknown TaskID '{}' in RequestedTaskIDs for Client {}", id, key),
                    )
                    .with_field(columns::REQUESTED_TASK_IDS),
                );
            }
        }

        for (index, rule) in ctx.rules().iter().enumerate() {
            let Rule::PatternMatch(pattern) = rule else {
                continue;
            };
            for id in pattern.tasks.iter().filter(|id| !ctx.has_task(id)) {
                errors.push(ValidationError::new(
                    FindingKind::UnknownReference,
                    Entity::Rules,
                    Rule::row_key(index),
                    format!("Pattern-match rule references unknown TaskID '{}'", id),
                ));
            }
        }

        errors
    }
}
