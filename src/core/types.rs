//! Row-level types for the three entity tables.
//!
//! Cells arrive from spreadsheets, so every cell is kept as text. Numeric and
//! list coercion happens inside the validation stages, never at ingestion.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Column names used by the checks.
pub mod columns {
    pub const CLIENT_ID: &str = "ClientID";
    pub const PRIORITY_LEVEL: &str = "PriorityLevel";
    pub const REQUESTED_TASK_IDS: &str = "RequestedTaskIDs";
    pub const ATTRIBUTES_JSON: &str = "AttributesJSON";
    pub const GROUP_TAG: &str = "GroupTag";

    pub const WORKER_ID: &str = "WorkerID";
    pub const AVAILABLE_SLOTS: &str = "AvailableSlots";
    pub const SKILLS: &str = "Skills";
    pub const MAX_LOAD_PER_PHASE: &str = "MaxLoadPerPhase";
    pub const WORKER_GROUP: &str = "WorkerGroup";

    pub const TASK_ID: &str = "TaskID";
    pub const DURATION: &str = "Duration";
    pub const REQUIRED_SKILLS: &str = "RequiredSkills";
    pub const MAX_CONCURRENT: &str = "MaxConcurrent";
    pub const PREFERRED_PHASES: &str = "PreferredPhases";
}

/// The table (or rule set) a finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Clients,
    Workers,
    Tasks,
    Rules,
}

impl Entity {
    /// The three row-bearing tables, in canonical order.
    pub const TABLES: [Entity; 3] = [Entity::Clients, Entity::Workers, Entity::Tasks];

    /// Lowercase plural name, as used in the finding JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Clients => "clients",
            Entity::Workers => "workers",
            Entity::Tasks => "tasks",
            Entity::Rules => "rules",
        }
    }

    /// Name of the ID column for row-bearing tables.
    pub fn id_column(&self) -> Option<&'static str> {
        match self {
            Entity::Clients => Some(columns::CLIENT_ID),
            Entity::Workers => Some(columns::WORKER_ID),
            Entity::Tasks => Some(columns::TASK_ID),
            Entity::Rules => None,
        }
    }

    /// Columns that must exist in the table's first row.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Entity::Clients => &[
                columns::CLIENT_ID,
                columns::PRIORITY_LEVEL,
                columns::REQUESTED_TASK_IDS,
                columns::ATTRIBUTES_JSON,
            ],
            Entity::Workers => &[
                columns::WORKER_ID,
                columns::AVAILABLE_SLOTS,
                columns::SKILLS,
                columns::MAX_LOAD_PER_PHASE,
            ],
            Entity::Tasks => &[
                columns::TASK_ID,
                columns::DURATION,
                columns::REQUIRED_SKILLS,
                columns::MAX_CONCURRENT,
            ],
            Entity::Rules => &[],
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One spreadsheet row: column name to cell text, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    cells: IndexMap<String, String>,
}

impl Record {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style cell setter.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a cell, replacing any previous value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.insert(column.into(), value.into());
    }

    /// Raw cell text, if the column is present in this row.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    /// Whether the column is present (even if empty).
    pub fn has_column(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    /// Trimmed cell text; absent columns read as empty.
    pub fn text(&self, column: &str) -> &str {
        self.get(column).map(str::trim).unwrap_or("")
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, serde_json::Value>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(column, value)| (column, cell_text(value)))
            .collect())
    }
}

/// Spreadsheet exporters emit numbers and booleans untyped; keep their text.
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// A named table as produced by file ingestion (one per CSV file or sheet).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<Record>,
}

impl Table {
    pub fn new(name: impl Into<String>, rows: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Which entity this table holds, judged by its name.
    pub fn entity(&self) -> Option<Entity> {
        let name = self.name.to_lowercase();
        if name.contains("client") {
            Some(Entity::Clients)
        } else if name.contains("worker") {
            Some(Entity::Workers)
        } else if name.contains("task") {
            Some(Entity::Tasks)
        } else {
            None
        }
    }
}
