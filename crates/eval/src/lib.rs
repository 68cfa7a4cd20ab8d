//! zmanim-eval: formula evaluator -- accepts parsed zman sets plus an
//! evaluation context, produces concrete times.
//!
//! The evaluator consumes ASTs from `zmanim-core`, resolves the set's
//! dependency order, and walks each formula against two collaborators:
//! a [`SolarCalculator`] for astronomical events and a
//! [`CalendarProvider`] for conditional predicates. Failures are
//! isolated per zman -- one formula hitting a polar edge case never
//! blocks the rest of the set.

pub mod astronomy;
pub mod calendar;
pub mod evaluator;
pub mod explain;
pub mod proportional;
pub mod provider;
pub mod types;

pub use astronomy::{AstronomyError, SolarCalculator, StaticAlmanac};
pub use calendar::{CalendarError, CalendarProvider, StaticCalendar};
pub use evaluator::Evaluator;
pub use explain::{explain, FormulaError, HumanReadableError};
pub use provider::{AlmanacProvider, AlmanacProviderError, StaticAlmanacProvider};
pub use types::{EvalContext, EvalError};

use std::collections::BTreeMap;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use zmanim_core::{resolve, DependencyError, ZmanDefinition};

/// Outcome of evaluating a full zman set: one result per key.
#[derive(Debug, Clone)]
pub struct ZmanSetResult {
    pub outcomes: BTreeMap<String, Result<OffsetDateTime, EvalError>>,
}

impl ZmanSetResult {
    pub fn time(&self, key: &str) -> Option<OffsetDateTime> {
        match self.outcomes.get(key) {
            Some(Ok(at)) => Some(*at),
            _ => None,
        }
    }

    pub fn error(&self, key: &str) -> Option<&EvalError> {
        match self.outcomes.get(key) {
            Some(Err(e)) => Some(e),
            _ => None,
        }
    }

    /// Serialize for API and CLI output.
    pub fn to_json(&self) -> serde_json::Value {
        let mut zmanim = serde_json::Map::new();
        for (key, outcome) in &self.outcomes {
            let entry = match outcome {
                Ok(at) => serde_json::json!({
                    "status": "ok",
                    "time": at.format(&Rfc3339).unwrap_or_else(|_| at.to_string()),
                }),
                Err(e) => serde_json::json!({
                    "status": "error",
                    "message": explain(&FormulaError::from(e.clone())).headline,
                }),
            };
            zmanim.insert(key.clone(), entry);
        }
        serde_json::json!({ "zmanim": zmanim })
    }
}

/// Evaluate a whole zman set in dependency order.
///
/// Set-level validation failures (cycles, dangling references) fail
/// the call; per-zman evaluation failures land in the result, and any
/// zman downstream of a failed dependency reports that dependency's
/// error without being evaluated.
pub fn evaluate_set(
    definitions: &[ZmanDefinition],
    context: &EvalContext,
    astro: &dyn SolarCalculator,
    calendar: &dyn CalendarProvider,
) -> Result<ZmanSetResult, DependencyError> {
    let order = resolve(definitions)?;

    let mut by_key: BTreeMap<&str, &ZmanDefinition> = BTreeMap::new();
    for def in definitions {
        by_key.entry(def.key.as_str()).or_insert(def);
    }

    let evaluator = Evaluator::new(astro, calendar);
    let mut resolved: BTreeMap<String, OffsetDateTime> = BTreeMap::new();
    let mut outcomes: BTreeMap<String, Result<OffsetDateTime, EvalError>> = BTreeMap::new();

    for key in order.keys() {
        // SAFETY: resolve() only emits keys present in the definitions
        let def = by_key.get(key.as_str()).unwrap();

        let failed_dep = def
            .formula
            .dependencies()
            .into_iter()
            .find(|dep| matches!(outcomes.get(dep), Some(Err(_))));
        if let Some(dep) = failed_dep {
            // SAFETY: failed_dep only matches keys that hold an Err
            let err = outcomes.get(&dep).unwrap().clone().unwrap_err();
            outcomes.insert(key.clone(), Err(err));
            continue;
        }

        match evaluator.evaluate(&def.formula, context, &resolved) {
            Ok(at) => {
                resolved.insert(key.clone(), at);
                outcomes.insert(key.clone(), Ok(at));
            }
            Err(e) => {
                outcomes.insert(key.clone(), Err(e));
            }
        }
    }

    Ok(ZmanSetResult { outcomes })
}

// ──────────────────────────────────────────────
// Integration tests
// ──────────────────────────────────────────────
