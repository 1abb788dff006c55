//! Required-column checks and unreadable rule documents.

use crate::core::context::ValidationContext;
use crate::core::error::{FindingKind, ValidationError};
use crate::core::rule::Rule;
use crate::core::types::Entity;
use crate::validation::stages::ValidationStage;

/// Schema validation - every table has its required columns and every rule
/// document could be read.
///
/// Only the first row is inspected; tables are assumed homogeneous. An empty
/// table is missing every column.
pub struct SchemaValidation;

impl ValidationStage for SchemaValidation {
    fn name(&self) -> &str {
        "Schema Validation"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for entity in Entity::TABLES {
            let first = ctx.dataset.rows(entity).first();
            for &column in entity.required_columns() {
                if !first.is_some_and(|row| row.has_column(column)) {
                    errors.push(ValidationError::new(
                        FindingKind::MissingColumn,
                        entity,
                        "all",
                        format!("Missing required column: {}", column),
                    ));
                }
            }
        }

        for (index, rule) in ctx.rules().iter().enumerate() {
            if let Rule::Invalid { kind, reason } = rule {
                let message = if kind.is_empty() {
                    format!("Malformed rule: {}", reason)
                } else {
                    format!("Malformed {} rule: {}", kind, reason)
                };
                errors.push(ValidationError::new(
                    FindingKind::MalformedRule,
                    Entity::Rules,
                    Rule::row_key(index),
                    message,
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Record;
    use crate::validation::stages::fixtures::{client, run, task, worker};

    #[test]
    fn test_complete_tables_pass() {
        let errors = run(
            &SchemaValidation,
            vec![client("C1", "1", "T1", "")],
            vec![worker("W1", "1", "a", "1")],
            vec![task("T1", "1", "a", "1")],
            vec![],
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_empty_table_misses_every_column() {
        let errors = run(
            &SchemaValidation,
            vec![client("C1", "1", "T1", "")],
            vec![],
            vec![task("T1", "1", "a", "1")],
            vec![],
        );
        assert_eq!(errors.len(), 4);
        assert!(errors
            .iter()
            .all(|e| e.entity == Entity::Workers && e.row_id == "all"));
    }

    #[test]
    fn test_unreadable_rules_are_reported_in_place() {
        let rules = vec![
            Rule::co_run(["T1", "T2"]),
            Rule::from_value(serde_json::json!({"type": "Load Limit", "maxSlotsPerPhase": "lots"})),
            Rule::from_value(serde_json::json!({"TaskIDs": "T1"})),
        ];
        let errors = run(
            &SchemaValidation,
            vec![client("C1", "1", "T1", "")],
            vec![worker("W1", "1", "a", "1")],
            vec![task("T1", "1", "a", "1")],
            rules,
        );

        let found: Vec<_> = errors.iter().map(|e| (e.row_id.as_str(), e.kind)).collect();
        assert_eq!(
            found,
            vec![
                ("rule_1", FindingKind::MalformedRule),
                ("rule_2", FindingKind::MalformedRule)
            ]
        );
        assert!(errors[0]
            .error
            .starts_with("Malformed Load Limit rule: 'lots' is not a whole number"));
        assert_eq!(errors[1].error, "Malformed rule: missing rule type");
        assert!(errors.iter().all(|e| e.entity == Entity::Rules));
    }

    #[test]
    fn test_only_first_row_is_inspected() {
        let tasks = vec![
            Record::new().with("TaskID", "T1").with("Duration", "1"),
            task("T2", "1", "a", "1"),
        ];
        let errors = run(
            &SchemaValidation,
            vec![client("C1", "1", "", "")],
            vec![worker("W1", "1", "a", "1")],
            tasks,
            vec![],
        );
        let messages: Vec<_> = errors.iter().map(|e| e.error.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Missing required column: RequiredSkills",
                "Missing required column: MaxConcurrent"
            ]
        );
    }
}
