//! Constraint rules authored over the data tables.
//!
//! Rules are a closed set of kinds, each with its own payload. Stages
//! pattern-match on the kinds they care about and ignore the rest. Each rule
//! document is decoded on its own: one that cannot be read becomes
//! [`Rule::Invalid`] and is reported as a finding, never a call failure.

use crate::core::fields::parse_id_list;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// An ordered list of task IDs.
///
/// Deserializes from either a JSON array or a comma-separated string
/// (`"T1, T2"`), which is how the rule forms and spreadsheets emit it.
/// Numeric IDs in an array are taken as their text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TaskIdList(pub Vec<String>);

impl TaskIdList {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for TaskIdList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match JsonValue::deserialize(deserializer)? {
            JsonValue::Null => Ok(Self::default()),
            JsonValue::String(text) => Ok(Self(parse_id_list(&text))),
            JsonValue::Array(items) => {
                let mut ids = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        JsonValue::String(id) if id.trim().is_empty() => {}
                        JsonValue::String(id) => ids.push(id.trim().to_string()),
                        JsonValue::Number(n) => ids.push(n.to_string()),
                        other => {
                            return Err(de::Error::custom(format!(
                                "task ID must be text, found {}",
                                other
                            )))
                        }
                    }
                }
                Ok(Self(ids))
            }
            other => Err(de::Error::custom(format!(
                "expected task IDs as text or a list, found {}",
                other
            ))),
        }
    }
}

/// Rule forms send counts either as numbers or as numeric text; a blank
/// cell means "not given".
mod lenient {
    use serde::{de, Deserialize, Deserializer};
    use serde_json::Value as JsonValue;

    fn to_count<E: de::Error>(value: JsonValue) -> Result<Option<u32>, E> {
        let invalid = |shown: String| E::custom(format!("{} is not a whole number >= 0", shown));
        match value {
            JsonValue::Null => Ok(None),
            JsonValue::String(text) if text.trim().is_empty() => Ok(None),
            JsonValue::String(text) => text
                .trim()
                .parse::<u32>()
                .map(Some)
                .map_err(|_| invalid(format!("'{}'", text))),
            JsonValue::Number(n) => {
                if let Some(whole) = n.as_u64() {
                    return u32::try_from(whole)
                        .map(Some)
                        .map_err(|_| invalid(whole.to_string()));
                }
                match n.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) => {
                        Ok(Some(f as u32))
                    }
                    _ => Err(invalid(n.to_string())),
                }
            }
            other => Err(invalid(other.to_string())),
        }
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        Ok(to_count(JsonValue::deserialize(deserializer)?)?.unwrap_or(0))
    }

    pub fn optional_count<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u32>, D::Error> {
        to_count(JsonValue::deserialize(deserializer)?)
    }
}

/// Which table a slot-restriction group is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupKind {
    #[default]
    #[serde(alias = "workerGroup", alias = "worker")]
    WorkerGroup,
    #[serde(alias = "clientGroup", alias = "client")]
    ClientGroup,
}

/// Tasks that must run together, in the declared order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoRunRule {
    #[serde(default, alias = "TaskIDs", alias = "taskIds")]
    pub tasks: TaskIdList,
}

/// A group whose members must share a minimum number of common slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotRestrictionRule {
    #[serde(default)]
    pub group: String,
    #[serde(default, rename = "groupType", alias = "groupKind")]
    pub group_kind: GroupKind,
    #[serde(default, rename = "minCommonSlots", deserialize_with = "lenient::count")]
    pub min_common_slots: u32,
}

/// Caps how many slots a worker group may fill per phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadLimitRule {
    #[serde(default, alias = "workerGroup")]
    pub group: String,
    #[serde(
        default,
        rename = "maxSlotsPerPhase",
        alias = "max",
        deserialize_with = "lenient::count"
    )]
    pub max_slots_per_phase: u32,
}

/// Restricts tasks to an inclusive phase interval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseWindowRule {
    #[serde(default, alias = "task", alias = "TaskIDs", alias = "taskIds")]
    pub tasks: TaskIdList,
    #[serde(
        default,
        alias = "WindowStart",
        alias = "windowStart",
        deserialize_with = "lenient::optional_count"
    )]
    pub start: Option<u32>,
    #[serde(
        default,
        alias = "WindowEnd",
        alias = "windowEnd",
        deserialize_with = "lenient::optional_count"
    )]
    pub end: Option<u32>,
    /// Explicit phase list; its min and max form the window when bounds are absent.
    #[serde(default)]
    pub phases: Vec<u32>,
}

impl PhaseWindowRule {
    pub fn new(tasks: TaskIdList, start: u32, end: u32) -> Self {
        Self {
            tasks,
            start: Some(start),
            end: Some(end),
            phases: Vec::new(),
        }
    }

    /// The declared `[start, end]` interval, if one can be formed.
    pub fn window(&self) -> Option<(u32, u32)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => {
                let min = self.phases.iter().min()?;
                let max = self.phases.iter().max()?;
                Some((*min, *max))
            }
        }
    }
}

/// Tasks selected by a name pattern (regex-style rules).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternMatchRule {
    #[serde(default, alias = "regex")]
    pub pattern: String,
    #[serde(default, alias = "TaskIDs", alias = "taskIds")]
    pub tasks: TaskIdList,
}

/// Explicit priority for the rule set; carried through, not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrecedenceOverrideRule {
    #[serde(default)]
    pub priority: i64,
}

/// A constraint rule, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Rule {
    #[serde(rename = "co-run")]
    CoRun(CoRunRule),

    #[serde(rename = "slot-restriction")]
    SlotRestriction(SlotRestrictionRule),

    #[serde(rename = "load-limit")]
    LoadLimit(LoadLimitRule),

    #[serde(rename = "phase-window")]
    PhaseWindow(PhaseWindowRule),

    #[serde(rename = "pattern-match")]
    PatternMatch(PatternMatchRule),

    #[serde(rename = "precedence-override")]
    PrecedenceOverride(PrecedenceOverrideRule),

    /// A document whose fields could not be read.
    #[serde(rename = "invalid")]
    Invalid {
        /// The `type` as written, empty when there was none.
        kind: String,
        reason: String,
    },

    /// Any kind this crate does not know; skipped by every stage.
    #[serde(rename = "unknown")]
    Unknown,
}

/// Lowercase `kind` and drop whitespace, `_` and `-`, so `"Load Limit"`,
/// `"load_limit"` and `"loadLimit"` compare equal.
fn normalize_kind(kind: &str) -> String {
    kind.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn payload<T: DeserializeOwned>(fields: serde_json::Map<String, JsonValue>) -> Result<T, String> {
    serde_json::from_value(JsonValue::Object(fields)).map_err(|e| e.to_string())
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(Rule::from_value)
    }
}

impl Rule {
    /// Decode one rule document.
    ///
    /// The kind is read from `type` (or `Type`) and matched after
    /// [`normalize_kind`]. A document that is not an object, has no kind, or
    /// has unreadable fields becomes [`Rule::Invalid`].
    pub fn from_value(value: JsonValue) -> Self {
        let mut fields = match value {
            JsonValue::Object(fields) => fields,
            other => {
                return Rule::Invalid {
                    kind: String::new(),
                    reason: format!("expected a rule object, found {}", other),
                }
            }
        };

        let kind = match fields.remove("type").or_else(|| fields.remove("Type")) {
            Some(JsonValue::String(kind)) => kind,
            Some(other) => {
                return Rule::Invalid {
                    kind: other.to_string(),
                    reason: "rule type must be text".to_string(),
                }
            }
            None => {
                return Rule::Invalid {
                    kind: String::new(),
                    reason: "missing rule type".to_string(),
                }
            }
        };

        let decoded = match normalize_kind(&kind).as_str() {
            "corun" => payload(fields).map(Rule::CoRun),
            "slotrestriction" => payload(fields).map(Rule::SlotRestriction),
            "loadlimit" => payload(fields).map(Rule::LoadLimit),
            "phasewindow" => payload(fields).map(Rule::PhaseWindow),
            "patternmatch" | "regex" => payload(fields).map(Rule::PatternMatch),
            "precedenceoverride" => payload(fields).map(Rule::PrecedenceOverride),
            _ => Ok(Rule::Unknown),
        };
        decoded.unwrap_or_else(|reason| Rule::Invalid { kind, reason })
    }

    pub fn co_run<I, S>(tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::CoRun(CoRunRule {
            tasks: TaskIdList::new(tasks),
        })
    }

    pub fn phase_window<I, S>(tasks: I, start: u32, end: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::PhaseWindow(PhaseWindowRule::new(TaskIdList::new(tasks), start, end))
    }

    pub fn pattern_match<I, S>(pattern: impl Into<String>, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::PatternMatch(PatternMatchRule {
            pattern: pattern.into(),
            tasks: TaskIdList::new(tasks),
        })
    }

    pub fn load_limit(group: impl Into<String>, max_slots_per_phase: u32) -> Self {
        Rule::LoadLimit(LoadLimitRule {
            group: group.into(),
            max_slots_per_phase,
        })
    }

    pub fn slot_restriction(
        group: impl Into<String>,
        group_kind: GroupKind,
        min_common_slots: u32,
    ) -> Self {
        Rule::SlotRestriction(SlotRestrictionRule {
            group: group.into(),
            group_kind,
            min_common_slots,
        })
    }

    /// Kebab-case kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            Rule::CoRun(_) => "co-run",
            Rule::SlotRestriction(_) => "slot-restriction",
            Rule::LoadLimit(_) => "load-limit",
            Rule::PhaseWindow(_) => "phase-window",
            Rule::PatternMatch(_) => "pattern-match",
            Rule::PrecedenceOverride(_) => "precedence-override",
            Rule::Invalid { .. } => "invalid",
            Rule::Unknown => "unknown",
        }
    }

    /// Synthetic row key for findings about the rule at `index`.
    pub fn row_key(index: usize) -> String {
        format!("rule_{}", index)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}
