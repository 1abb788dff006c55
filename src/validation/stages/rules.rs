//! Checks over the rule set: co-run graph analysis, rule well-formedness and
//! group feasibility.

use crate::core::context::{ValidationContext, WorkerView};
use crate::core::error::{FindingKind, ValidationError};
use crate::core::rule::{GroupKind, LoadLimitRule, Rule, SlotRestrictionRule};
use crate::core::types::Entity;
use crate::validation::stages::ValidationStage;
use indexmap::IndexSet;
use std::collections::BTreeMap;

/// Co-run chains that loop back on themselves.
///
/// One finding per task from which a loop is reachable, keyed by the task.
pub struct CoRunCycleValidation;

impl ValidationStage for CoRunCycleValidation {
    fn name(&self) -> &str {
        "Co-run Cycle Validation"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        ctx.co_run
            .cyclic_tasks()
            .into_iter()
            .map(|task| {
                ValidationError::new(
                    FindingKind::CoRunCycle,
                    Entity::Rules,
                    task,
                    format!("Circular co-run dependency detected involving Task {}", task),
                )
            })
            .collect()
    }
}

/// Co-run edges between tasks whose phase windows never meet.
pub struct PhaseWindowConflictValidation;

impl ValidationStage for PhaseWindowConflictValidation {
    fn name(&self) -> &str {
        "Phase Window Conflict Validation"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        ctx.co_run
            .window_conflicts(&ctx.windows)
            .into_iter()
            .map(|conflict| {
                ValidationError::new(
                    FindingKind::PhaseWindowConflict,
                    Entity::Rules,
                    conflict.row_key(),
                    format!(
                        "Co-run constraint conflicts with phase-window for Tasks {} and {} ({}-{} vs {}-{})",
                        conflict.task,
                        conflict.dependent,
                        conflict.task_window.0,
                        conflict.task_window.1,
                        conflict.dependent_window.0,
                        conflict.dependent_window.1,
                    ),
                )
            })
            .collect()
    }
}

/// The first problem that makes `rule` unusable, if any.
fn rule_problem(rule: &Rule) -> Option<String> {
    match rule {
        Rule::CoRun(co_run) if co_run.tasks.len() < 2 => Some(format!(
            "Co-run rule needs at least 2 tasks, found {}",
            co_run.tasks.len()
        )),
        Rule::PhaseWindow(window) => {
            if window.tasks.is_empty() {
                return Some("Phase-window rule names no tasks".to_string());
            }
            match window.window() {
                None => Some("Phase-window rule has no start/end or phases".to_string()),
                Some((0, _)) => Some("Phase-window rule start must be >= 1".to_string()),
                Some((start, end)) if start > end => Some(format!(
                    "Phase-window rule start {} is after end {}",
                    start, end
                )),
                Some(_) => None,
            }
        }
        Rule::LoadLimit(limit) if limit.group.trim().is_empty() => {
            Some("Load-limit rule has no worker group".to_string())
        }
        Rule::LoadLimit(limit) if limit.max_slots_per_phase == 0 => {
            Some("Load-limit rule maxSlotsPerPhase must be >= 1".to_string())
        }
        Rule::SlotRestriction(slots) if slots.group.trim().is_empty() => {
            Some("Slot-restriction rule has no group".to_string())
        }
        Rule::SlotRestriction(slots) if slots.min_common_slots == 0 => {
            Some("Slot-restriction rule minCommonSlots must be >= 1".to_string())
        }
        Rule::PatternMatch(pattern) if pattern.pattern.trim().is_empty() && pattern.tasks.is_empty() => {
            Some("Pattern-match rule has neither a pattern nor tasks".to_string())
        }
        _ => None,
    }
}

/// Structurally unusable rules: too few tasks, bad windows, empty groups,
/// zero limits, empty pattern-match rules.
pub struct RuleIntegrityValidation;

impl ValidationStage for RuleIntegrityValidation {
    fn name(&self) -> &str {
        "Rule Integrity Validation"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        ctx.rules()
            .iter()
            .enumerate()
            .filter_map(|(index, rule)| {
                let message = rule_problem(rule)?;
                Some(ValidationError::new(
                    FindingKind::InvalidRule,
                    Entity::Rules,
                    Rule::row_key(index),
                    message,
                ))
            })
            .collect()
    }
}

fn group_workers<'c, 'a>(
    ctx: &'c ValidationContext<'a>,
    group: &'c str,
) -> impl Iterator<Item = &'c WorkerView<'a>> + 'c {
    ctx.workers
        .iter()
        .filter(move |worker| worker.group() == Some(group))
}

/// Render `{phase: workers}` as `1(2 workers), 3(1 workers)`.
fn phase_counts(counts: &BTreeMap<u32, usize>) -> String {
    counts
        .iter()
        .map(|(phase, count)| format!("{}({} workers)", phase, count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Count, per phase, how many of `workers` list it in `AvailableSlots`.
fn slot_counts<'c, 'a: 'c>(workers: impl Iterator<Item = &'c WorkerView<'a>>) -> BTreeMap<u32, usize> {
    let mut counts = BTreeMap::new();
    for worker in workers {
        let distinct: IndexSet<u32> = worker.slots_ok().unwrap_or(&[]).iter().copied().collect();
        for phase in distinct {
            *counts.entry(phase).or_insert(0) += 1;
        }
    }
    counts
}

fn check_load_limit(ctx: &ValidationContext<'_>, rule: &LoadLimitRule) -> Option<String> {
    let group = rule.group.trim();
    let members: Vec<_> = group_workers(ctx, group).collect();
    if members.is_empty() {
        return Some(format!("No workers found in WorkerGroup '{}'", group));
    }

    let capacity: f64 = members
        .iter()
        .filter_map(|worker| worker.max_load_ok())
        .filter(|load| *load > 0.0)
        .sum();
    (capacity < f64::from(rule.max_slots_per_phase)).then(|| {
        format!(
            "Load Limit too high: WorkerGroup '{}' has total capacity of {} tasks per phase, but Load Limit is set to {}",
            group, capacity, rule.max_slots_per_phase
        )
    })
}

/// Load-limit rules whose worker group cannot carry the limit.
///
/// Rules with an empty group or a zero limit are left to
/// [`RuleIntegrityValidation`].
pub struct LoadLimitFeasibility;

impl ValidationStage for LoadLimitFeasibility {
    fn name(&self) -> &str {
        "Load Limit Feasibility"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        ctx.rules()
            .iter()
            .enumerate()
            .filter_map(|(index, rule)| match rule {
                Rule::LoadLimit(limit)
                    if !limit.group.trim().is_empty() && limit.max_slots_per_phase > 0 =>
                {
                    check_load_limit(ctx, limit).map(|message| {
                        ValidationError::new(
                            FindingKind::LoadLimitInfeasible,
                            Entity::Rules,
                            Rule::row_key(index),
                            message,
                        )
                    })
                }
                _ => None,
            })
            .collect()
    }
}

fn check_worker_group(ctx: &ValidationContext<'_>, group: &str, min: u32) -> Option<String> {
    let members: Vec<_> = group_workers(ctx, group).collect();
    if members.is_empty() {
        return Some(format!("No workers found in WorkerGroup '{}'", group));
    }

    let counts = slot_counts(members.into_iter());
    if counts.is_empty() {
        return Some(format!(
            "No valid available slots found for workers in group '{}'",
            group
        ));
    }

    let shared = counts.values().any(|&count| count >= min as usize);
    (!shared).then(|| {
        format!(
            "Slot Restriction failed for WorkerGroup '{}': Required at least 1 slot available to {}+ workers. Current slot counts: [{}]",
            group,
            min,
            phase_counts(&counts)
        )
    })
}

fn check_client_group(ctx: &ValidationContext<'_>, group: &str, min: u32) -> Option<String> {
    let members: Vec<_> = ctx
        .clients
        .iter()
        .filter(|client| client.group_tag() == Some(group))
        .collect();
    if members.is_empty() {
        return Some(format!("No clients found in ClientGroup '{}'", group));
    }

    let requested: Vec<&str> = members
        .iter()
        .flat_map(|client| client.requested_tasks.iter().map(String::as_str))
        .collect();
    if requested.is_empty() {
        return Some(format!("No valid TaskIDs found for ClientGroup '{}'", group));
    }

    let skills: IndexSet<&str> = requested
        .iter()
        .filter_map(|&id| ctx.tasks.iter().find(|task| task.id == id))
        .filter_map(|task| task.required_skills_ok())
        .flatten()
        .map(String::as_str)
        .collect();
    if skills.is_empty() {
        return Some(format!(
            "No required skills found for tasks requested by ClientGroup '{}'",
            group
        ));
    }

    let qualified: Vec<_> = ctx
        .workers
        .iter()
        .filter(|worker| {
            worker
                .skills_ok()
                .is_some_and(|held| held.iter().any(|skill| skills.contains(skill.as_str())))
        })
        .collect();
    if qualified.is_empty() {
        return Some(format!(
            "No qualified workers found for tasks requested by ClientGroup '{}'",
            group
        ));
    }

    let counts = slot_counts(qualified.into_iter());
    (counts.len() < min as usize).then(|| {
        format!(
            "ClientGroup '{}' validation failed: Required at least {} unique phases with qualified workers, but found only {}. Current phase counts: [{}]",
            group,
            min,
            counts.len(),
            phase_counts(&counts)
        )
    })
}

fn check_slot_restriction(ctx: &ValidationContext<'_>, rule: &SlotRestrictionRule) -> Option<String> {
    let group = rule.group.trim();
    match rule.group_kind {
        GroupKind::WorkerGroup => check_worker_group(ctx, group, rule.min_common_slots),
        GroupKind::ClientGroup => check_client_group(ctx, group, rule.min_common_slots),
    }
}

/// Slot-restriction rules no phase assignment can honour.
///
/// Worker groups need one phase shared by at least `minCommonSlots` members.
/// Client groups need the workers qualified for their requested tasks to
/// cover at least `minCommonSlots` distinct phases.
pub struct SlotRestrictionFeasibility;

impl ValidationStage for SlotRestrictionFeasibility {
    fn name(&self) -> &str {
        "Slot Restriction Feasibility"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        ctx.rules()
            .iter()
            .enumerate()
            .filter_map(|(index, rule)| match rule {
                Rule::SlotRestriction(slots)
                    if !slots.group.trim().is_empty() && slots.min_common_slots > 0 =>
                {
                    check_slot_restriction(ctx, slots).map(|message| {
                        ValidationError::new(
                            FindingKind::SlotRestrictionInfeasible,
                            Entity::Rules,
                            Rule::row_key(index),
                            message,
                        )
                    })
                }
                _ => None,
            })
            .collect()
    }
}
