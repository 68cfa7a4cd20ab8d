//! Dependency resolution across a publisher's zman set.
//!
//! Builds the `@key` reference graph, rejects cycles and dangling
//! references, and produces a deterministic evaluation order. The
//! graph is rebuilt from scratch on every call -- formula sets are
//! small and correctness beats incremental bookkeeping.

use std::collections::{BTreeMap, HashSet};

use crate::ast::Expr;
use crate::error::DependencyError;

/// One zman in a publisher's set. Keys are unique within a set.
#[derive(Debug, Clone)]
pub struct ZmanDefinition {
    pub key: String,
    pub formula: Expr,
}

impl ZmanDefinition {
    pub fn new(key: impl Into<String>, formula: Expr) -> Self {
        ZmanDefinition {
            key: key.into(),
            formula,
        }
    }
}

/// A topological ordering of zman keys: every key appears after all of
/// its dependencies. Ties are broken by input order, so the same set
/// always yields the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationOrder(pub Vec<String>);

impl EvaluationOrder {
    pub fn keys(&self) -> &[String] {
        &self.0
    }
}

/// Validate a zman set and compute its evaluation order.
///
/// Fails with [`DependencyError::CircularReference`] naming the full
/// cycle, or [`DependencyError::UndefinedReference`] when a formula
/// points at a key the set does not define. A silently-missing
/// dependency would produce a wrong time, so this fails loudly.
pub fn resolve(definitions: &[ZmanDefinition]) -> Result<EvaluationOrder, DependencyError> {
    let mut by_key: BTreeMap<&str, &ZmanDefinition> = BTreeMap::new();
    for def in definitions {
        // First definition wins; keys are unique by contract.
        by_key.entry(def.key.as_str()).or_insert(def);
    }

    let mut visited: HashSet<String> = HashSet::new();
    let mut in_stack: Vec<String> = Vec::new();
    let mut order: Vec<String> = Vec::new();

    for def in definitions {
        if !visited.contains(&def.key) {
            visit(&def.key, &by_key, &mut visited, &mut in_stack, &mut order)?;
        }
    }

    Ok(EvaluationOrder(order))
}

fn visit(
    key: &str,
    by_key: &BTreeMap<&str, &ZmanDefinition>,
    visited: &mut HashSet<String>,
    in_stack: &mut Vec<String>,
    order: &mut Vec<String>,
) -> Result<(), DependencyError> {
    in_stack.push(key.to_owned());

    // SAFETY: callers only pass keys present in by_key
    let def = by_key.get(key).unwrap();
    for dep in def.formula.dependencies() {
        if let Some(pos) = in_stack.iter().position(|k| k == &dep) {
            let mut cycle: Vec<String> = in_stack[pos..].to_vec();
            cycle.push(dep);
            return Err(DependencyError::CircularReference { cycle });
        }
        if visited.contains(&dep) {
            continue;
        }
        if !by_key.contains_key(dep.as_str()) {
            return Err(DependencyError::UndefinedReference {
                key: dep,
                referenced_by: key.to_owned(),
            });
        }
        visit(&dep, by_key, visited, in_stack, order)?;
    }

    in_stack.pop();
    visited.insert(key.to_owned());
    order.push(key.to_owned());
    Ok(())
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;

    fn def(key: &str, formula: &str) -> ZmanDefinition {
        ZmanDefinition::new(key, parse_formula(formula).unwrap())
    }

    #[test]
    fn dependency_comes_first() {
        let order = resolve(&[def("a", "@b + 18min"), def("b", "sunrise")]).unwrap();
        assert_eq!(order, EvaluationOrder(vec!["b".to_owned(), "a".to_owned()]));
    }

    #[test]
    fn two_zman_cycle_names_both_keys() {
        let err = resolve(&[def("a", "@b + 2min"), def("b", "@a - 2min")]).unwrap_err();
        let DependencyError::CircularReference { cycle } = err else {
            panic!("expected a cycle");
        };
        assert!(cycle.contains(&"a".to_owned()));
        assert!(cycle.contains(&"b".to_owned()));
        // The cycle closes on its opening key.
        assert_eq!(cycle.first(), cycle.last());
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let err = resolve(&[def("a", "@a + 1min")]).unwrap_err();
        assert!(matches!(
            err,
            DependencyError::CircularReference { cycle } if cycle == vec!["a".to_owned(), "a".to_owned()]
        ));
    }

    #[test]
    fn undefined_reference_fails_loudly() {
        let err = resolve(&[def("a", "@ghost + 5min")]).unwrap_err();
        assert_eq!(
            err,
            DependencyError::UndefinedReference {
                key: "ghost".to_owned(),
                referenced_by: "a".to_owned(),
            }
        );
    }

    #[test]
    fn independent_zmanim_keep_input_order() {
        let order = resolve(&[
            def("alos", "solar(16.1, before_sunrise)"),
            def("netz", "sunrise"),
            def("shkia", "sunset"),
        ])
        .unwrap();
        assert_eq!(
            order.keys(),
            &["alos".to_owned(), "netz".to_owned(), "shkia".to_owned()]
        );
    }

    #[test]
    fn diamond_dependencies_resolve_once() {
        let order = resolve(&[
            def("sof_zman_shma", "midpoint(@alos, @chatzos)"),
            def("alos", "sunrise - 72min"),
            def("chatzos", "midpoint(@alos, @tzeis)"),
            def("tzeis", "sunset + 72min"),
        ])
        .unwrap();
        let keys = order.keys();
        let pos = |k: &str| keys.iter().position(|x| x == k).unwrap();
        assert!(pos("alos") < pos("sof_zman_shma"));
        assert!(pos("alos") < pos("chatzos"));
        assert!(pos("tzeis") < pos("chatzos"));
        assert!(pos("chatzos") < pos("sof_zman_shma"));
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn resolution_is_deterministic() {
        let defs = [
            def("c", "@a + 1min"),
            def("b", "sunset"),
            def("a", "@b + 1min"),
        ];
        let first = resolve(&defs).unwrap();
        let second = resolve(&defs).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.keys(),
            &["b".to_owned(), "a".to_owned(), "c".to_owned()]
        );
    }
}
