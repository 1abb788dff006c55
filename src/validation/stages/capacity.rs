//! Capacity analysis: worker load, phase saturation, skill coverage and
//! task concurrency.

use crate::core::context::ValidationContext;
use crate::core::error::{FindingKind, ValidationError};
use crate::core::types::{columns, Entity};
use crate::validation::stages::ValidationStage;
use indexmap::IndexSet;
use std::collections::{BTreeMap, HashSet};

/// Workers asked to carry more load per phase than they have slots.
pub struct OverloadValidation;

impl ValidationStage for OverloadValidation {
    fn name(&self) -> &str {
        "Worker Overload Validation"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        ctx.workers
            .iter()
            .filter_map(|worker| {
                let load = worker.max_load_ok()?;
                let slots = worker.slots_ok()?.len();
                if load <= slots as f64 {
                    return None;
                }
                let key = worker.row_key();
                Some(
                    ValidationError::new(
                        FindingKind::WorkerOverload,
                        Entity::Workers,
                        &key,
                        format!(
                            "Worker {} MaxLoadPerPhase exceeds available slots: {} > {}",
                            key, load, slots
                        ),
                    )
                    .with_field(columns::MAX_LOAD_PER_PHASE),
                )
            })
            .collect()
    }
}

/// Per-phase demand against per-phase supply.
///
/// A task spreads its `Duration` evenly over its preferred phases. Every
/// worker contributes `min(MaxLoadPerPhase, slot count)` to each phase in
/// `1..=phase_count`; phases outside that range have no supply.
pub struct PhaseSaturationValidation;

impl PhaseSaturationValidation {
    /// Demand per phase, ascending. Tasks without a usable duration or
    /// phase list contribute nothing.
    pub fn demand(ctx: &ValidationContext<'_>) -> BTreeMap<u32, f64> {
        let mut demand = BTreeMap::new();
        for task in &ctx.tasks {
            let (Some(duration), Some(phases)) = (task.duration_ok(), task.preferred_phases_ok()) else {
                continue;
            };
            if phases.is_empty() {
                continue;
            }
            let share = duration / phases.len() as f64;
            for &phase in phases {
                *demand.entry(phase).or_insert(0.0) += share;
            }
        }
        demand
    }

    /// Supply of a single phase.
    pub fn supply(ctx: &ValidationContext<'_>, phase: u32) -> f64 {
        if !ctx.options.phases().contains(&phase) {
            return 0.0;
        }
        ctx.workers
            .iter()
            .filter_map(|worker| worker.phase_capacity())
            .map(|capacity| capacity.max(0.0))
            .sum()
    }
}

impl ValidationStage for PhaseSaturationValidation {
    fn name(&self) -> &str {
        "Phase Saturation Validation"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        Self::demand(ctx)
            .into_iter()
            .filter_map(|(phase, demand)| {
                let supply = Self::supply(ctx, phase);
                (demand > supply).then(|| {
                    ValidationError::new(
                        FindingKind::PhaseSaturation,
                        Entity::Tasks,
                        format!("phase_{}", phase),
                        format!(
                            "Phase {} is oversaturated: total task duration {} > total worker slots {}",
                            phase,
                            demand.round(),
                            supply
                        ),
                    )
                })
            })
            .collect()
    }
}

/// Required skills that no worker holds.
pub struct SkillCoverageValidation;

impl ValidationStage for SkillCoverageValidation {
    fn name(&self) -> &str {
        "Skill Coverage Validation"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        let available: HashSet<&str> = ctx
            .workers
            .iter()
            .filter_map(|worker| worker.skills_ok())
            .flatten()
            .map(String::as_str)
            .collect();
        let required: IndexSet<&str> = ctx
            .tasks
            .iter()
            .filter_map(|task| task.required_skills_ok())
            .flatten()
            .map(String::as_str)
            .collect();

        required
            .into_iter()
            .filter(|skill| !available.contains(skill))
            .map(|skill| {
                ValidationError::new(
                    FindingKind::SkillCoverageGap,
                    Entity::Tasks,
                    "skill_coverage",
                    format!("Required skill '{}' is not available in any worker", skill),
                )
                .with_field(columns::REQUIRED_SKILLS)
            })
            .collect()
    }
}

/// Tasks that allow more parallel assignments than there are qualified
/// workers.
pub struct ConcurrencyValidation;

impl ValidationStage for ConcurrencyValidation {
    fn name(&self) -> &str {
        "Concurrency Feasibility Validation"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        ctx.tasks
            .iter()
            .filter_map(|task| {
                let max = task.max_concurrent_ok()?;
                let required = task.required_skills_ok()?;
                let qualified = ctx
                    .workers
                    .iter()
                    .filter(|worker| worker.qualifies_for(required))
                    .count();
                if max <= qualified as f64 {
                    return None;
                }
                let key = task.row_key();
                Some(
                    ValidationError::new(
                        FindingKind::ConcurrencyInfeasible,
                        Entity::Tasks,
                        &key,
                        format!(
                            "Task {} MaxConcurrent exceeds qualified workers: {} > {}",
                            key, max, qualified
                        ),
                    )
                    .with_field(columns::MAX_CONCURRENT),
                )
            })
            .collect()
    }
}
