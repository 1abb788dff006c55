//! The parsed snapshot every validation stage reads.
//!
//! Each cell is decoded exactly once, here. Stages consume the decoded form
//! and never re-parse raw text, so a malformed cell is reported by the stage
//! that owns it and silently skipped by the others.

use crate::core::config::ValidationOptions;
use crate::core::dataset::Dataset;
use crate::core::error::FieldResult;
use crate::core::fields::{parse_id_list, parse_json_object, parse_list, parse_number, parse_phase_spec};
use crate::core::types::{columns, Record};
use crate::graph::{CoRunGraph, PhaseWindows};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashSet;

/// A decoded cell: `None` when the column is absent from the row.
pub type Cell<T> = Option<FieldResult<T>>;

/// Key used for findings about a row: its ID, or `row_<index>` when blank.
fn row_key(id: &str, index: usize) -> String {
    if id.is_empty() {
        format!("row_{}", index)
    } else {
        id.to_string()
    }
}

fn decode<T>(record: &Record, column: &str, parse: impl Fn(&str) -> FieldResult<T>) -> Cell<T> {
    record.get(column).map(parse)
}

fn ok<T>(cell: &Cell<T>) -> Option<&T> {
    cell.as_ref().and_then(|result| result.as_ref().ok())
}

/// A client row, decoded.
#[derive(Debug, Clone)]
pub struct ClientView<'a> {
    pub index: usize,
    pub id: &'a str,
    pub record: &'a Record,
    pub priority: Cell<f64>,
    pub requested_tasks: Vec<String>,
    /// `None` also when the cell is not JSON-object shaped.
    pub attributes: Option<FieldResult<Map<String, JsonValue>>>,
}

impl<'a> ClientView<'a> {
    fn new(index: usize, record: &'a Record) -> Self {
        Self {
            index,
            id: record.text(columns::CLIENT_ID),
            record,
            priority: decode(record, columns::PRIORITY_LEVEL, parse_number),
            requested_tasks: parse_id_list(record.text(columns::REQUESTED_TASK_IDS)),
            attributes: record
                .get(columns::ATTRIBUTES_JSON)
                .and_then(parse_json_object),
        }
    }

    pub fn row_key(&self) -> String {
        row_key(self.id, self.index)
    }

    pub fn group_tag(&self) -> Option<&'a str> {
        Some(self.record.text(columns::GROUP_TAG)).filter(|tag| !tag.is_empty())
    }
}

/// A worker row, decoded.
#[derive(Debug, Clone)]
pub struct WorkerView<'a> {
    pub index: usize,
    pub id: &'a str,
    pub record: &'a Record,
    pub slots: Cell<Vec<u32>>,
    pub skills: Cell<Vec<String>>,
    pub max_load: Cell<f64>,
}

impl<'a> WorkerView<'a> {
    fn new(index: usize, record: &'a Record) -> Self {
        Self {
            index,
            id: record.text(columns::WORKER_ID),
            record,
            slots: decode(record, columns::AVAILABLE_SLOTS, parse_list::<u32>),
            skills: decode(record, columns::SKILLS, parse_list::<String>),
            max_load: decode(record, columns::MAX_LOAD_PER_PHASE, parse_number),
        }
    }

    pub fn row_key(&self) -> String {
        row_key(self.id, self.index)
    }

    pub fn slots_ok(&self) -> Option<&[u32]> {
        ok(&self.slots).map(Vec::as_slice)
    }

    pub fn skills_ok(&self) -> Option<&[String]> {
        ok(&self.skills).map(Vec::as_slice)
    }

    pub fn max_load_ok(&self) -> Option<f64> {
        ok(&self.max_load).copied()
    }

    pub fn group(&self) -> Option<&'a str> {
        Some(self.record.text(columns::WORKER_GROUP)).filter(|group| !group.is_empty())
    }

    /// Whether this worker holds every skill in `required`.
    pub fn qualifies_for(&self, required: &[String]) -> bool {
        self.skills_ok()
            .map(|skills| required.iter().all(|skill| skills.contains(skill)))
            .unwrap_or(false)
    }

    /// Per-phase capacity: `min(MaxLoadPerPhase, number of slots)`.
    pub fn phase_capacity(&self) -> Option<f64> {
        let slots = self.slots_ok()?;
        let max_load = self.max_load_ok()?;
        Some(max_load.min(slots.len() as f64))
    }
}

/// A task row, decoded.
#[derive(Debug, Clone)]
pub struct TaskView<'a> {
    pub index: usize,
    pub id: &'a str,
    pub record: &'a Record,
    pub duration: Cell<f64>,
    pub required_skills: Cell<Vec<String>>,
    pub max_concurrent: Cell<f64>,
    /// `None` when the column is absent or blank.
    pub preferred_phases: Cell<Vec<u32>>,
}

impl<'a> TaskView<'a> {
    fn new(index: usize, record: &'a Record) -> Self {
        let phases = record.text(columns::PREFERRED_PHASES);
        Self {
            index,
            id: record.text(columns::TASK_ID),
            record,
            duration: decode(record, columns::DURATION, parse_number),
            required_skills: decode(record, columns::REQUIRED_SKILLS, parse_list::<String>),
            max_concurrent: decode(record, columns::MAX_CONCURRENT, parse_number),
            preferred_phases: (!phases.is_empty()).then(|| parse_phase_spec(phases)),
        }
    }

    pub fn row_key(&self) -> String {
        row_key(self.id, self.index)
    }

    pub fn duration_ok(&self) -> Option<f64> {
        ok(&self.duration).copied()
    }

    pub fn required_skills_ok(&self) -> Option<&[String]> {
        ok(&self.required_skills).map(Vec::as_slice)
    }

    pub fn max_concurrent_ok(&self) -> Option<f64> {
        ok(&self.max_concurrent).copied()
    }

    pub fn preferred_phases_ok(&self) -> Option<&[u32]> {
        ok(&self.preferred_phases).map(Vec::as_slice)
    }
}

/// Immutable, decoded view of one dataset plus the options of the run.
///
/// Shared by reference across stages (and across threads when the pipeline
/// runs in parallel).
#[derive(Debug)]
pub struct ValidationContext<'a> {
    pub dataset: &'a Dataset,
    pub options: &'a ValidationOptions,
    pub clients: Vec<ClientView<'a>>,
    pub workers: Vec<WorkerView<'a>>,
    pub tasks: Vec<TaskView<'a>>,
    pub co_run: CoRunGraph<'a>,
    pub windows: PhaseWindows<'a>,
    task_ids: HashSet<&'a str>,
}

impl<'a> ValidationContext<'a> {
    /// Decode every row of `dataset`.
    pub fn new(dataset: &'a Dataset, options: &'a ValidationOptions) -> Self {
        let tasks: Vec<TaskView<'a>> = dataset
            .tasks
            .iter()
            .enumerate()
            .map(|(i, record)| TaskView::new(i, record))
            .collect();
        let task_ids = tasks
            .iter()
            .map(|task| task.id)
            .filter(|id| !id.is_empty())
            .collect();

        Self {
            dataset,
            options,
            clients: dataset
                .clients
                .iter()
                .enumerate()
                .map(|(i, record)| ClientView::new(i, record))
                .collect(),
            workers: dataset
                .workers
                .iter()
                .enumerate()
                .map(|(i, record)| WorkerView::new(i, record))
                .collect(),
            tasks,
            co_run: CoRunGraph::from_rules(&dataset.rules),
            windows: PhaseWindows::from_rules(&dataset.rules),
            task_ids,
        }
    }

    /// Whether a task with this ID exists.
    pub fn has_task(&self, id: &str) -> bool {
        self.task_ids.contains(id)
    }

    pub fn rules(&self) -> &'a [crate::core::rule::Rule] {
        &self.dataset.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::FieldError;

    fn worker(slots: &str, skills: &str, max_load: &str) -> Record {
        Record::new()
            .with("WorkerID", "W1")
            .with("AvailableSlots", slots)
            .with("Skills", skills)
            .with("MaxLoadPerPhase", max_load)
    }

    #[test]
    fn test_worker_view_decodes_once() {
        let dataset = Dataset::new(vec![], vec![worker("[1,3]", "ml, data", "4")], vec![], vec![]);
        let options = ValidationOptions::default();
        let ctx = ValidationContext::new(&dataset, &options);

        let w = &ctx.workers[0];
        assert_eq!(w.slots_ok(), Some(&[1, 3][..]));
        assert_eq!(w.skills_ok().map(<[String]>::len), Some(2));
        assert_eq!(w.phase_capacity(), Some(2.0));
        assert!(w.qualifies_for(&["ml".to_string()]));
        assert!(!w.qualifies_for(&["ml".to_string(), "ops".to_string()]));
    }

    #[test]
    fn test_absent_column_is_none_not_error() {
        let dataset = Dataset::new(
            vec![],
            vec![Record::new().with("WorkerID", "W1")],
            vec![],
            vec![],
        );
        let options = ValidationOptions::default();
        let ctx = ValidationContext::new(&dataset, &options);

        assert!(ctx.workers[0].slots.is_none());
        assert!(ctx.workers[0].phase_capacity().is_none());
    }

    #[test]
    fn test_malformed_cell_is_kept_as_error() {
        let dataset = Dataset::new(vec![], vec![worker("one,two", "x", "1")], vec![], vec![]);
        let options = ValidationOptions::default();
        let ctx = ValidationContext::new(&dataset, &options);

        assert!(matches!(
            ctx.workers[0].slots,
            Some(Err(FieldError::InvalidElement { index: 0, .. }))
        ));
        assert!(ctx.workers[0].slots_ok().is_none());
    }

    #[test]
    fn test_task_index_and_row_keys() {
        let dataset = Dataset::new(
            vec![],
            vec![],
            vec![
                Record::new().with("TaskID", "T1").with("PreferredPhases", "1-2"),
                Record::new().with("TaskID", " "),
            ],
            vec![],
        );
        let options = ValidationOptions::default();
        let ctx = ValidationContext::new(&dataset, &options);

        assert!(ctx.has_task("T1"));
        assert!(!ctx.has_task(""));
        assert_eq!(ctx.tasks[0].preferred_phases_ok(), Some(&[1, 2][..]));
        assert!(ctx.tasks[1].preferred_phases.is_none());
        assert_eq!(ctx.tasks[1].row_key(), "row_1");
    }
}
