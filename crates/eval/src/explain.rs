//! Human-readable error explanations.
//!
//! Every user-facing surface renders errors through [`explain`]
//! rather than showing raw `Display` output: each structured error
//! maps to a headline plus an actionable suggestion, with misspelled
//! names fuzzy-matched against the symbol table.

use serde::Serialize;

use crate::types::EvalError;
use zmanim_core::symbols;
use zmanim_core::{DependencyError, ParseError};

/// Edit-distance ceiling for primitive and function suggestions.
const NAME_SUGGEST_DISTANCE: usize = 3;
/// Edit-distance ceiling for direction and base-system suggestions.
const TOKEN_SUGGEST_DISTANCE: usize = 4;

/// Raw error messages longer than this are not echoed to users.
const RAW_MESSAGE_LIMIT: usize = 200;

const REFERENCE_DOC: &str = "docs/formula-reference.md";

/// Any error the formula engine can produce, for presentation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Dependency(#[from] DependencyError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// A presentation-ready error: headline plus actionable suggestion,
/// never a raw parser state or stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HumanReadableError {
    pub headline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_link: Option<String>,
}

/// Explain an error for display.
pub fn explain(error: &FormulaError) -> HumanReadableError {
    match error {
        FormulaError::Parse(e) => explain_parse(e),
        FormulaError::Dependency(e) => explain_dependency(e),
        FormulaError::Eval(e) => explain_eval(e),
    }
}

fn explain_parse(error: &ParseError) -> HumanReadableError {
    match error {
        ParseError::UnexpectedToken {
            found,
            expected,
            offset,
        } => HumanReadableError {
            headline: format!("Unexpected {}", found),
            explanation: Some(format!("At position {}.", offset)),
            suggestion: format!("Expected {} here.", expected),
            example_code: None,
            reference_link: Some(format!("{}#syntax", REFERENCE_DOC)),
        },

        ParseError::UnbalancedParentheses { offset } => HumanReadableError {
            headline: "Unbalanced parentheses".to_owned(),
            explanation: Some(format!("At position {}.", offset)),
            suggestion: "Check that every '(' has a matching ')'.".to_owned(),
            example_code: None,
            reference_link: None,
        },

        ParseError::WrongArgumentCount {
            function,
            expected,
            got,
            ..
        } => {
            let example = symbols::function_signature(function).map(|s| s.usage.to_owned());
            HumanReadableError {
                headline: format!(
                    "{} takes {} argument{}, not {}",
                    function,
                    expected,
                    if *expected == 1 { "" } else { "s" },
                    got
                ),
                explanation: None,
                suggestion: format!("Adjust the call to pass exactly {} arguments.", expected),
                example_code: example,
                reference_link: Some(format!("{}#functions", REFERENCE_DOC)),
            }
        }

        ParseError::UnknownFunction { name, .. } => {
            let candidates: Vec<&str> =
                symbols::list_functions().iter().map(|s| s.name).collect();
            let matches = suggest(name, &candidates, NAME_SUGGEST_DISTANCE);
            let example = matches
                .first()
                .and_then(|m| symbols::function_signature(m))
                .map(|s| s.usage.to_owned());
            HumanReadableError {
                headline: format!("Unknown function '{}'", name),
                explanation: None,
                suggestion: did_you_mean(&matches, &candidates),
                example_code: example,
                reference_link: Some(format!("{}#functions", REFERENCE_DOC)),
            }
        }

        ParseError::UnknownPrimitive { name, .. } => {
            let mut candidates: Vec<&str> = symbols::list_primitives().to_vec();
            candidates.extend(symbols::list_functions().iter().map(|s| s.name));
            let matches = suggest(name, &candidates, NAME_SUGGEST_DISTANCE);
            HumanReadableError {
                headline: format!("Unknown name '{}'", name),
                explanation: None,
                suggestion: did_you_mean(&matches, symbols::list_primitives()),
                example_code: None,
                reference_link: Some(format!("{}#primitives", REFERENCE_DOC)),
            }
        }

        ParseError::InvalidDirection { token, .. } => {
            let matches = suggest(token, symbols::list_directions(), TOKEN_SUGGEST_DISTANCE);
            HumanReadableError {
                headline: format!("'{}' is not a direction", token),
                explanation: None,
                suggestion: did_you_mean(&matches, symbols::list_directions()),
                example_code: Some("solar(16.1, before_sunrise)".to_owned()),
                reference_link: Some(format!("{}#directions", REFERENCE_DOC)),
            }
        }

        ParseError::InvalidBaseSystem { token, .. } => {
            let matches = suggest(token, symbols::list_base_systems(), TOKEN_SUGGEST_DISTANCE);
            HumanReadableError {
                headline: format!("'{}' is not a base system", token),
                explanation: None,
                suggestion: did_you_mean(&matches, symbols::list_base_systems()),
                example_code: Some("proportional_hours(4, gra)".to_owned()),
                reference_link: Some(format!("{}#base-systems", REFERENCE_DOC)),
            }
        }

        ParseError::DegreesOutOfRange { value, .. } => HumanReadableError {
            headline: format!("{} degrees is out of range", value),
            explanation: Some(
                "Solar depression angles run from 0 (the horizon) to 90 (directly below)."
                    .to_owned(),
            ),
            suggestion: "Use an angle between 0 and 90.".to_owned(),
            example_code: Some("solar(16.1, before_sunrise)".to_owned()),
            reference_link: Some(format!("{}#functions", REFERENCE_DOC)),
        },

        ParseError::InvalidDurationFormat { text, .. } => HumanReadableError {
            headline: format!("'{}' is not a valid duration", text),
            explanation: None,
            suggestion:
                "Write durations as a whole number immediately followed by min, like 72min."
                    .to_owned(),
            example_code: Some("sunrise - 72min".to_owned()),
            reference_link: Some(format!("{}#durations", REFERENCE_DOC)),
        },

        ParseError::TooDeeplyNested { limit } => HumanReadableError {
            headline: "Formula is nested too deeply".to_owned(),
            explanation: Some(format!("Nesting is limited to {} levels.", limit)),
            suggestion:
                "Split the formula into separate zmanim and combine them with @references."
                    .to_owned(),
            example_code: None,
            reference_link: None,
        },

        ParseError::CannotCombineTwoTimes { .. } => HumanReadableError {
            headline: "Cannot add two times together".to_owned(),
            explanation: Some(
                "Both sides of the '+' or '-' are absolute times; the result would be meaningless."
                    .to_owned(),
            ),
            suggestion:
                "Offset a time by a duration like 18min, or use midpoint(a, b) for the halfway point."
                    .to_owned(),
            example_code: Some("midpoint(sunrise, sunset)".to_owned()),
            reference_link: Some(format!("{}#durations", REFERENCE_DOC)),
        },
    }
}

fn explain_dependency(error: &DependencyError) -> HumanReadableError {
    match error {
        DependencyError::CircularReference { cycle } => HumanReadableError {
            headline: "These zmanim reference each other in a loop".to_owned(),
            explanation: Some(cycle.join(" \u{2192} ")),
            suggestion:
                "Remove one of the @references so every zman can be computed before the ones that use it."
                    .to_owned(),
            example_code: None,
            reference_link: Some(format!("{}#references", REFERENCE_DOC)),
        },

        DependencyError::UndefinedReference { key, referenced_by } => HumanReadableError {
            headline: format!("'@{}' is not defined", key),
            explanation: Some(format!("Referenced from '{}'.", referenced_by)),
            suggestion: format!(
                "Define a zman with key '{}' or fix the reference to point at an existing one.",
                key
            ),
            example_code: None,
            reference_link: Some(format!("{}#references", REFERENCE_DOC)),
        },
    }
}

fn explain_eval(error: &EvalError) -> HumanReadableError {
    match error {
        EvalError::DegreesOutOfRange { degrees } => HumanReadableError {
            headline: format!("{} degrees is out of range", degrees),
            explanation: None,
            suggestion: "Use a depression angle between 0 and 90.".to_owned(),
            example_code: Some("solar(16.1, before_sunrise)".to_owned()),
            reference_link: Some(format!("{}#functions", REFERENCE_DOC)),
        },

        EvalError::SunAngleUnreachable { degrees } => HumanReadableError {
            headline: format!(
                "The sun does not reach {} degrees below the horizon on this date",
                degrees
            ),
            explanation: Some(
                "At extreme latitudes the sun may never get that far below the horizon in summer, or above it in winter."
                    .to_owned(),
            ),
            suggestion:
                "Cap the zman with min()/max() against a fixed-offset alternative for high-latitude locations."
                    .to_owned(),
            example_code: Some("min(solar(16.1, before_sunrise), sunrise - 120min)".to_owned()),
            reference_link: Some(format!("{}#edge-cases", REFERENCE_DOC)),
        },

        EvalError::Internal { message } => fallback(message),
    }
}

/// Generic presentation for conditions with no curated mapping. The
/// raw message is echoed only when it is short enough to be readable.
fn fallback(raw: &str) -> HumanReadableError {
    HumanReadableError {
        headline: "Something went wrong inside the formula engine".to_owned(),
        explanation: (raw.len() < RAW_MESSAGE_LIMIT).then(|| raw.to_owned()),
        suggestion:
            "This looks like a bug rather than a formula problem -- report it along with the formula text."
                .to_owned(),
        example_code: None,
        reference_link: Some(format!("{}#examples", REFERENCE_DOC)),
    }
}

fn did_you_mean(matches: &[String], all: &[&str]) -> String {
    if matches.is_empty() {
        format!("Available: {}.", all.join(", "))
    } else {
        format!("Did you mean {}?", matches.join(" or "))
    }
}

// ──────────────────────────────────────────────
// Fuzzy matching
// ──────────────────────────────────────────────

/// Candidates within `max_distance` edits of `input`, closest first.
/// Ties sort alphabetically so suggestions are deterministic.
fn suggest(input: &str, candidates: &[&str], max_distance: usize) -> Vec<String> {
    let mut scored: Vec<(usize, &str)> = candidates
        .iter()
        .filter_map(|c| {
            let d = levenshtein(input, c);
            (d <= max_distance).then_some((d, *c))
        })
        .collect();
    scored.sort();
    scored.into_iter().map(|(_, c)| c.to_owned()).collect()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut cur = vec![0usize; b_chars.len() + 1];

    for (i, ac) in a_chars.iter().enumerate() {
        cur[0] = i + 1;
        for (j, bc) in b_chars.iter().enumerate() {
            let cost = usize::from(ac != bc);
            cur[j + 1] = (prev[j + 1] + 1).min(cur[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    prev[b_chars.len()]
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_distance() {
        assert_eq!(levenshtein("sunrise", "sunrise"), 0);
        assert_eq!(levenshtein("sunrize", "sunrise"), 1);
        assert_eq!(levenshtein("sunris", "sunrise"), 1);
        assert_eq!(levenshtein("gro", "gra"), 1);
        assert_eq!(levenshtein("", "gra"), 3);
    }

    #[test]
    fn misspelled_primitive_gets_a_suggestion() {
        let err = FormulaError::from(ParseError::UnknownPrimitive {
            name: "sunrize".to_owned(),
            offset: 0,
        });
        let human = explain(&err);
        assert!(human.suggestion.contains("sunrise"), "{}", human.suggestion);
    }

    #[test]
    fn hopeless_names_list_the_vocabulary() {
        let err = FormulaError::from(ParseError::UnknownPrimitive {
            name: "zzzzzzzzzzzz".to_owned(),
            offset: 0,
        });
        let human = explain(&err);
        assert!(human.suggestion.starts_with("Available:"));
        assert!(human.suggestion.contains("sunrise"));
    }

    #[test]
    fn direction_threshold_is_looser() {
        // Four edits away from before_sunrise: inside the direction
        // threshold, outside the name threshold.
        assert_eq!(levenshtein("bef_sunris", "before_sunrise"), 4);
        let err = FormulaError::from(ParseError::InvalidDirection {
            token: "bef_sunris".to_owned(),
            offset: 0,
        });
        let human = explain(&err);
        assert!(human.suggestion.contains("before_sunrise"));
    }

    #[test]
    fn misspelled_function_carries_example_usage() {
        let err = FormulaError::from(ParseError::UnknownFunction {
            name: "midpont".to_owned(),
            offset: 0,
        });
        let human = explain(&err);
        assert!(human.suggestion.contains("midpoint"));
        assert_eq!(
            human.example_code.as_deref(),
            Some("midpoint(sunrise, sunset)")
        );
    }

    #[test]
    fn wrong_argument_count_shows_the_signature() {
        let err = FormulaError::from(ParseError::WrongArgumentCount {
            function: "solar".to_owned(),
            expected: 2,
            got: 1,
            offset: 0,
        });
        let human = explain(&err);
        assert_eq!(human.headline, "solar takes 2 arguments, not 1");
        assert_eq!(
            human.example_code.as_deref(),
            Some("solar(16.1, before_sunrise)")
        );
    }

    #[test]
    fn cycle_explanation_names_every_key() {
        let err = FormulaError::from(DependencyError::CircularReference {
            cycle: vec!["alos".to_owned(), "tzeis".to_owned(), "alos".to_owned()],
        });
        let human = explain(&err);
        let explanation = human.explanation.unwrap();
        assert!(explanation.contains("alos"));
        assert!(explanation.contains("tzeis"));
    }

    #[test]
    fn internal_errors_echo_only_short_messages() {
        let short = FormulaError::from(EvalError::internal("missing entry"));
        assert_eq!(explain(&short).explanation.as_deref(), Some("missing entry"));

        let long = FormulaError::from(EvalError::internal("x".repeat(300)));
        let human = explain(&long);
        assert!(human.explanation.is_none());
        assert!(human.reference_link.is_some());
    }

    #[test]
    fn suggestions_are_deterministic() {
        let first = suggest("mn", &["min", "max", "man"], 3);
        let second = suggest("mn", &["min", "max", "man"], 3);
        assert_eq!(first, second);
        // Distance-1 matches come before distance-2 ones.
        assert_eq!(first[0], "man");
    }
}
