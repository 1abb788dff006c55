//! Co-run chains and phase windows.
//!
//! Each co-run rule contributes chain edges between consecutive tasks in its
//! declared order (not a complete graph over the group). Phase-window rules
//! give tasks an inclusive `[start, end]` interval; a co-run edge between two
//! windowed tasks whose intervals do not overlap can never be satisfied.

use crate::core::rule::Rule;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Directed graph of co-run chain edges, in rule order.
#[derive(Debug, Clone, Default)]
pub struct CoRunGraph<'a> {
    adjacency: IndexMap<&'a str, Vec<&'a str>>,
}

impl<'a> CoRunGraph<'a> {
    /// Build the chain edges from every co-run rule.
    pub fn from_rules(rules: &'a [Rule]) -> Self {
        let mut adjacency: IndexMap<&'a str, Vec<&'a str>> = IndexMap::new();
        for rule in rules {
            if let Rule::CoRun(co_run) = rule {
                for pair in co_run.tasks.0.windows(2) {
                    adjacency
                        .entry(pair[0].as_str())
                        .or_default()
                        .push(pair[1].as_str());
                }
            }
        }
        Self { adjacency }
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Tasks with outgoing edges, in first-edge order.
    pub fn sources(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn successors(&self, task: &str) -> &[&'a str] {
        self.adjacency.get(task).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All `(task, next)` edges, grouped by source in first-edge order.
    pub fn edges(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.adjacency
            .iter()
            .flat_map(|(&from, tos)| tos.iter().map(move |&to| (from, to)))
    }

    /// Whether a walk from `start` can revisit a node already on its path.
    ///
    /// Each start gets a fresh traversal; nodes fully explored without
    /// finding a loop are not walked twice within it.
    pub fn reaches_cycle(&self, start: &'a str) -> bool {
        let mut on_path: HashSet<&str> = HashSet::new();
        let mut finished: HashSet<&str> = HashSet::new();
        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
        on_path.insert(start);

        while let Some(&(node, next_index)) = stack.last() {
            match self.successors(node).get(next_index) {
                Some(&next) => {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                    if on_path.contains(next) {
                        return true;
                    }
                    if !finished.contains(next) {
                        on_path.insert(next);
                        stack.push((next, 0));
                    }
                }
                None => {
                    stack.pop();
                    on_path.remove(node);
                    finished.insert(node);
                }
            }
        }

        false
    }

    /// Every source task from which a cycle is reachable.
    ///
    /// O(V·E): one traversal per source. Fine for the tens to hundreds of
    /// tasks a sheet carries.
    pub fn cyclic_tasks(&self) -> Vec<&'a str> {
        self.sources()
            .filter(|&task| self.reaches_cycle(task))
            .collect()
    }

    /// Edges whose endpoints both have windows that do not overlap.
    pub fn window_conflicts(&self, windows: &PhaseWindows<'a>) -> Vec<WindowConflict<'a>> {
        self.edges()
            .filter_map(|(task, dependent)| {
                let task_window = windows.get(task)?;
                let dependent_window = windows.get(dependent)?;
                (!overlaps(task_window, dependent_window)).then_some(WindowConflict {
                    task,
                    dependent,
                    task_window,
                    dependent_window,
                })
            })
            .collect()
    }
}

/// A co-run edge that no phase assignment can satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConflict<'a> {
    pub task: &'a str,
    pub dependent: &'a str,
    pub task_window: (u32, u32),
    pub dependent_window: (u32, u32),
}

impl WindowConflict<'_> {
    /// Synthetic row key `<task>_<dependent>`.
    pub fn row_key(&self) -> String {
        format!("{}_{}", self.task, self.dependent)
    }
}

/// Inclusive intervals `a` and `b` share at least one phase.
pub fn overlaps(a: (u32, u32), b: (u32, u32)) -> bool {
    !(a.1 < b.0 || b.1 < a.0)
}

/// Task to phase-window interval, from phase-window rules.
///
/// A task named by several rules keeps the last one. Windows starting at 0
/// or ending before they start are not recorded.
#[derive(Debug, Clone, Default)]
pub struct PhaseWindows<'a> {
    windows: IndexMap<&'a str, (u32, u32)>,
}

impl<'a> PhaseWindows<'a> {
    pub fn from_rules(rules: &'a [Rule]) -> Self {
        let mut windows = IndexMap::new();
        for rule in rules {
            if let Rule::PhaseWindow(phase_window) = rule {
                if let Some(window @ (start, end)) = phase_window.window() {
                    if start == 0 || start > end {
                        continue;
                    }
                    for task in phase_window.tasks.iter() {
                        windows.insert(task, window);
                    }
                }
            }
        }
        Self { windows }
    }

    pub fn get(&self, task: &str) -> Option<(u32, u32)> {
        self.windows.get(task).copied()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_edges_only() {
        let rules = vec![Rule::co_run(["T1", "T2", "T3"])];
        let graph = CoRunGraph::from_rules(&rules);

        let edges: Vec<_> = graph.edges().collect();
        assert_eq!(edges, vec![("T1", "T2"), ("T2", "T3")]);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.successors("T3").is_empty());
    }

    #[test]
    fn test_closed_chain_is_cyclic() {
        let rules = vec![Rule::co_run(["T1", "T2", "T3", "T1"])];
        let graph = CoRunGraph::from_rules(&rules);

        assert_eq!(graph.cyclic_tasks(), vec!["T1", "T2", "T3"]);
    }

    #[test]
    fn test_open_chain_is_acyclic() {
        let rules = vec![Rule::co_run(["T1", "T2", "T3"])];
        let graph = CoRunGraph::from_rules(&rules);
        assert!(graph.cyclic_tasks().is_empty());
    }

    #[test]
    fn test_cycle_across_rules() {
        let rules = vec![Rule::co_run(["A", "B"]), Rule::co_run(["B", "A"])];
        let graph = CoRunGraph::from_rules(&rules);
        assert_eq!(graph.cyclic_tasks(), vec!["A", "B"]);
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let rules = vec![
            Rule::co_run(["A", "B", "D"]),
            Rule::co_run(["A", "C", "D"]),
        ];
        let graph = CoRunGraph::from_rules(&rules);
        assert!(graph.cyclic_tasks().is_empty());
    }

    #[test]
    fn test_tail_into_cycle_is_reported_per_start() {
        // X leads into the B<->C loop without being on it.
        let rules = vec![Rule::co_run(["X", "B", "C", "B"])];
        let graph = CoRunGraph::from_rules(&rules);
        assert_eq!(graph.cyclic_tasks(), vec!["X", "B", "C"]);
    }

    #[test]
    fn test_self_loop() {
        let rules = vec![Rule::co_run(["T1", "T1"])];
        let graph = CoRunGraph::from_rules(&rules);
        assert!(graph.reaches_cycle("T1"));
    }

    #[test]
    fn test_window_conflicts() {
        let rules = vec![
            Rule::co_run(["T1", "T2", "T3"]),
            Rule::phase_window(["T1"], 1, 2),
            Rule::phase_window(["T2"], 4, 5),
            Rule::phase_window(["T3"], 5, 5),
        ];
        let graph = CoRunGraph::from_rules(&rules);
        let windows = PhaseWindows::from_rules(&rules);

        let conflicts = graph.window_conflicts(&windows);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].row_key(), "T1_T2");
        assert_eq!(conflicts[0].task_window, (1, 2));
    }

    #[test]
    fn test_unwindowed_tasks_never_conflict() {
        let rules = vec![Rule::co_run(["T1", "T2"]), Rule::phase_window(["T1"], 1, 1)];
        let graph = CoRunGraph::from_rules(&rules);
        let windows = PhaseWindows::from_rules(&rules);
        assert!(graph.window_conflicts(&windows).is_empty());
    }

    #[test]
    fn test_later_window_wins() {
        let rules = vec![
            Rule::phase_window(["T1"], 1, 1),
            Rule::phase_window(["T1", "T2"], 3, 4),
        ];
        let windows = PhaseWindows::from_rules(&rules);
        assert_eq!(windows.get("T1"), Some((3, 4)));
        assert_eq!(windows.len(), 2);
    }

    #[test]
    fn test_unusable_windows_are_not_recorded() {
        let rules = vec![
            Rule::co_run(["T1", "T2"]),
            Rule::phase_window(["T1"], 4, 2),
            Rule::phase_window(["T2"], 0, 1),
            Rule::phase_window(["T3"], 2, 2),
        ];
        let graph = CoRunGraph::from_rules(&rules);
        let windows = PhaseWindows::from_rules(&rules);

        assert_eq!(windows.get("T1"), None);
        assert_eq!(windows.get("T2"), None);
        assert_eq!(windows.get("T3"), Some((2, 2)));
        assert!(graph.window_conflicts(&windows).is_empty());
    }

    #[test]
    fn test_overlaps() {
        assert!(overlaps((1, 3), (3, 5)));
        assert!(overlaps((2, 2), (1, 4)));
        assert!(!overlaps((1, 2), (3, 4)));
        assert!(!overlaps((5, 6), (1, 4)));
    }
}
