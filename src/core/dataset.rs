//! The problem statement handed to validation: three tables plus rules.

use crate::core::error::{AllotmentResult, InputError};
use crate::core::rule::Rule;
use crate::core::types::{Entity, Record, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;

/// A fresh snapshot of clients, workers, tasks and rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub clients: Vec<Record>,
    pub workers: Vec<Record>,
    pub tasks: Vec<Record>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Dataset {
    pub fn new(
        clients: Vec<Record>,
        workers: Vec<Record>,
        tasks: Vec<Record>,
        rules: Vec<Rule>,
    ) -> Self {
        Self {
            clients,
            workers,
            tasks,
            rules,
        }
    }

    /// Parse `{"clients": [...], "workers": [...], "tasks": [...], "rules": [...]}`.
    ///
    /// Fails only when the input does not have that shape; the contents of
    /// the rows and of each rule are left for validation to judge.
    pub fn from_json(input: &str) -> Result<Self, InputError> {
        let value: JsonValue = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Read and parse a dataset document from disk.
    pub fn from_file(path: impl AsRef<Path>) -> AllotmentResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&text)?)
    }

    pub fn from_value(value: JsonValue) -> Result<Self, InputError> {
        let JsonValue::Object(mut object) = value else {
            return Err(InputError::NotAnObject);
        };

        let mut table = |entity: Entity| -> Result<Vec<Record>, InputError> {
            let name = entity.as_str();
            let rows = object.remove(name).ok_or(InputError::MissingTable(name))?;
            serde_json::from_value(rows).map_err(|e| InputError::InvalidTable {
                table: name,
                reason: e.to_string(),
            })
        };
        let clients = table(Entity::Clients)?;
        let workers = table(Entity::Workers)?;
        let tasks = table(Entity::Tasks)?;

        let rules = match object.remove("rules") {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::Array(items)) => items.into_iter().map(Rule::from_value).collect(),
            Some(other) => {
                return Err(InputError::InvalidRules(format!(
                    "expected an array, found {}",
                    other
                )))
            }
        };

        Ok(Self::new(clients, workers, tasks, rules))
    }

    /// Assemble a dataset from ingested tables, matched by name.
    ///
    /// The first table whose name mentions "client", "worker" or "task" fills
    /// that slot; a missing table is an input-shape error.
    pub fn from_tables(tables: Vec<Table>, rules: Vec<Rule>) -> Result<Self, InputError> {
        let mut clients = None;
        let mut workers = None;
        let mut tasks = None;

        for table in tables {
            let slot = match table.entity() {
                Some(Entity::Clients) => &mut clients,
                Some(Entity::Workers) => &mut workers,
                Some(Entity::Tasks) => &mut tasks,
                _ => {
                    log::debug!("ignoring table '{}'", table.name);
                    continue;
                }
            };
            if slot.is_none() {
                *slot = Some(table.rows);
            }
        }

        Ok(Self::new(
            clients.ok_or(InputError::MissingTable("clients"))?,
            workers.ok_or(InputError::MissingTable("workers"))?,
            tasks.ok_or(InputError::MissingTable("tasks"))?,
            rules,
        ))
    }

    /// Rows of one table; empty for `Entity::Rules`.
    pub fn rows(&self, entity: Entity) -> &[Record] {
        match entity {
            Entity::Clients => &self.clients,
            Entity::Workers => &self.workers,
            Entity::Tasks => &self.tasks,
            Entity::Rules => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
            && self.workers.is_empty()
            && self.tasks.is_empty()
            && self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_full_shape() {
        let dataset = Dataset::from_json(
            r#"{
                "clients": [{"ClientID": "C1", "PriorityLevel": 3}],
                "workers": [],
                "tasks": [{"TaskID": "T1"}],
                "rules": [{"type": "co-run", "tasks": ["T1", "T2"]}]
            }"#,
        )
        .unwrap();

        assert_eq!(dataset.clients.len(), 1);
        assert_eq!(dataset.clients[0].get("PriorityLevel"), Some("3"));
        assert!(dataset.workers.is_empty());
        assert_eq!(dataset.rules.len(), 1);
    }

    #[test]
    fn test_rules_are_optional() {
        let dataset = Dataset::from_json(r#"{"clients": [], "workers": [], "tasks": []}"#).unwrap();
        assert!(dataset.rules.is_empty());
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_shape_errors_fail_fast() {
        assert!(matches!(Dataset::from_json("[]"), Err(InputError::NotAnObject)));
        assert!(matches!(Dataset::from_json("{"), Err(InputError::Json(_))));
        assert!(matches!(
            Dataset::from_json(r#"{"clients": [], "workers": []}"#),
            Err(InputError::MissingTable("tasks"))
        ));
        assert!(matches!(
            Dataset::from_json(r#"{"clients": [], "workers": [], "tasks": "T1"}"#),
            Err(InputError::InvalidTable { table: "tasks", .. })
        ));
        assert!(matches!(
            Dataset::from_json(r#"{"clients": [], "workers": [], "tasks": [], "rules": {}}"#),
            Err(InputError::InvalidRules(_))
        ));
    }

    #[test]
    fn test_unreadable_rule_keeps_its_slot() {
        let dataset = Dataset::from_json(
            r#"{
                "clients": [], "workers": [], "tasks": [],
                "rules": [
                    {"type": "co-run", "TaskIDs": "T1,T2"},
                    {"type": "precedence-override", "priority": "high"},
                    {"Type": "Load Limit", "group": "G", "maxSlotsPerPhase": 2}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(dataset.rules.len(), 3);
        assert_eq!(dataset.rules[0], Rule::co_run(["T1", "T2"]));
        assert!(matches!(dataset.rules[1], Rule::Invalid { .. }));
        assert_eq!(dataset.rules[2], Rule::load_limit("G", 2));
    }

    #[test]
    fn test_from_file() {
        use crate::core::error::AllotmentError;
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"clients": [], "workers": [], "tasks": [{{"TaskID": "T1"}}]}}"#).unwrap();
        let dataset = Dataset::from_file(file.path()).unwrap();
        assert_eq!(dataset.tasks.len(), 1);

        assert!(matches!(
            Dataset::from_file("/nonexistent/dataset.json"),
            Err(AllotmentError::Io(_))
        ));
    }

    #[test]
    fn test_from_tables_matches_names() {
        let tables = vec![
            Table::new("Tasks", vec![Record::new().with("TaskID", "T1")]),
            Table::new("readme", vec![]),
            Table::new("clients.csv", vec![]),
            Table::new("worker_sheet", vec![Record::new().with("WorkerID", "W1")]),
        ];
        let dataset = Dataset::from_tables(tables, vec![]).unwrap();
        assert_eq!(dataset.tasks.len(), 1);
        assert_eq!(dataset.workers.len(), 1);
        assert!(dataset.clients.is_empty());

        let missing = Dataset::from_tables(vec![Table::new("tasks", vec![])], vec![]);
        assert!(matches!(missing, Err(InputError::MissingTable("clients"))));
    }
}
