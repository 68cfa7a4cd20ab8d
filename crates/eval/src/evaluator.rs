//! Per-node formula evaluation.
//!
//! Evaluation is a pure function of the AST, the context, and the
//! already-resolved reference map -- no clock reads, no hidden state.
//! The parser has already validated signatures and operand kinds;
//! the checks repeated here guard trees constructed programmatically,
//! and their failures are `Internal` rather than user errors, except
//! for the degree range which stays a first-class error either way.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use crate::astronomy::SolarCalculator;
use crate::calendar::CalendarProvider;
use crate::proportional;
use crate::types::{EvalContext, EvalError};
use zmanim_core::ast::{BinOp, Expr};

/// Intermediate value of a sub-expression: an absolute time or a span.
enum Computed {
    Time(OffsetDateTime),
    Span(Duration),
}

/// Evaluates formulas against a pair of collaborators.
pub struct Evaluator<'a> {
    astro: &'a dyn SolarCalculator,
    calendar: &'a dyn CalendarProvider,
}

impl<'a> Evaluator<'a> {
    pub fn new(astro: &'a dyn SolarCalculator, calendar: &'a dyn CalendarProvider) -> Self {
        Evaluator { astro, calendar }
    }

    /// Evaluate one formula to a concrete timestamp.
    ///
    /// `resolved` must already hold a timestamp for every `@key` the
    /// formula references, in the order the dependency resolver
    /// produced -- a missing entry is a contract violation.
    pub fn evaluate(
        &self,
        formula: &Expr,
        context: &EvalContext,
        resolved: &BTreeMap<String, OffsetDateTime>,
    ) -> Result<OffsetDateTime, EvalError> {
        match self.eval(formula, context, resolved)? {
            Computed::Time(at) => Ok(at),
            Computed::Span(_) => Err(EvalError::internal(
                "formula evaluated to a duration, not a time",
            )),
        }
    }

    fn eval(
        &self,
        expr: &Expr,
        context: &EvalContext,
        resolved: &BTreeMap<String, OffsetDateTime>,
    ) -> Result<Computed, EvalError> {
        match expr {
            Expr::Primitive { name } => {
                let at = self.astro.primitive(name, context)?;
                Ok(Computed::Time(at))
            }

            Expr::Duration { minutes } => Ok(Computed::Span(Duration::minutes(*minutes))),

            Expr::Number { .. } => Err(EvalError::internal(
                "a bare number has no time value outside a function argument",
            )),

            Expr::Direction { .. } | Expr::BaseSystem { .. } | Expr::CalendarFlag { .. } => {
                Err(EvalError::internal(
                    "literal argument evaluated outside a function call",
                ))
            }

            Expr::Reference { key } => match resolved.get(key) {
                Some(at) => Ok(Computed::Time(*at)),
                None => Err(EvalError::internal(format!(
                    "reference '@{}' was not resolved before evaluation",
                    key
                ))),
            },

            Expr::Call { function, args } => self.eval_call(function, args, context, resolved),

            Expr::BinaryOp { op, left, right } => {
                let lhs = self.eval(left, context, resolved)?;
                let rhs = self.eval(right, context, resolved)?;
                match (lhs, rhs, op) {
                    (Computed::Time(t), Computed::Span(d), BinOp::Add) => {
                        Ok(Computed::Time(t + d))
                    }
                    (Computed::Time(t), Computed::Span(d), BinOp::Subtract) => {
                        Ok(Computed::Time(t - d))
                    }
                    (Computed::Span(a), Computed::Span(b), BinOp::Add) => {
                        Ok(Computed::Span(a + b))
                    }
                    (Computed::Span(a), Computed::Span(b), BinOp::Subtract) => {
                        Ok(Computed::Span(a - b))
                    }
                    (Computed::Time(_), Computed::Time(_), _) => {
                        Err(EvalError::internal("cannot combine two times"))
                    }
                    (Computed::Span(_), Computed::Time(_), _) => Err(EvalError::internal(
                        "the right operand of '+'/'-' must be a duration",
                    )),
                }
            }

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                let Expr::CalendarFlag { name } = condition.as_ref() else {
                    return Err(EvalError::internal(
                        "conditional condition is not a calendar flag",
                    ));
                };
                let held = self
                    .calendar
                    .holds(name, context.date)
                    .map_err(|e| EvalError::internal(e.to_string()))?;
                // Only the taken branch is evaluated; the other side may
                // reference data that is invalid for the untaken path.
                if held {
                    self.eval(then_branch, context, resolved)
                } else {
                    self.eval(else_branch, context, resolved)
                }
            }
        }
    }

    fn eval_call(
        &self,
        function: &str,
        args: &[Expr],
        context: &EvalContext,
        resolved: &BTreeMap<String, OffsetDateTime>,
    ) -> Result<Computed, EvalError> {
        match function {
            "solar" => {
                let [Expr::Number { value: degrees }, Expr::Direction { value: direction }] = args
                else {
                    return Err(EvalError::internal("malformed solar() arguments"));
                };
                if *degrees < Decimal::ZERO || *degrees > Decimal::from(90) {
                    return Err(EvalError::DegreesOutOfRange { degrees: *degrees });
                }
                let at = self.astro.solar_depression(*degrees, *direction, context)?;
                Ok(Computed::Time(at))
            }

            "proportional_hours" => {
                let [Expr::Number { value: hours }, Expr::BaseSystem { value: base }] = args
                else {
                    return Err(EvalError::internal(
                        "malformed proportional_hours() arguments",
                    ));
                };
                let at = proportional::proportional_time(*hours, *base, context, self.astro)?;
                Ok(Computed::Time(at))
            }

            "midpoint" => {
                let (a, b) = self.eval_time_pair(function, args, context, resolved)?;
                // Averaging unix seconds keeps midpoint(a, b) == midpoint(b, a).
                let mid = (a.unix_timestamp() + b.unix_timestamp()).div_euclid(2);
                let at = OffsetDateTime::from_unix_timestamp(mid)
                    .map_err(|e| EvalError::internal(format!("midpoint out of range: {}", e)))?
                    .to_offset(a.offset());
                Ok(Computed::Time(at))
            }

            "min" => {
                let (a, b) = self.eval_time_pair(function, args, context, resolved)?;
                Ok(Computed::Time(a.min(b)))
            }

            "max" => {
                let (a, b) = self.eval_time_pair(function, args, context, resolved)?;
                Ok(Computed::Time(a.max(b)))
            }

            other => Err(EvalError::internal(format!("unknown function '{}'", other))),
        }
    }

    fn eval_time_pair(
        &self,
        function: &str,
        args: &[Expr],
        context: &EvalContext,
        resolved: &BTreeMap<String, OffsetDateTime>,
    ) -> Result<(OffsetDateTime, OffsetDateTime), EvalError> {
        let [first, second] = args else {
            return Err(EvalError::internal(format!(
                "{}() takes exactly two arguments",
                function
            )));
        };
        let a = self.eval_time(first, context, resolved)?;
        let b = self.eval_time(second, context, resolved)?;
        Ok((a, b))
    }

    fn eval_time(
        &self,
        expr: &Expr,
        context: &EvalContext,
        resolved: &BTreeMap<String, OffsetDateTime>,
    ) -> Result<OffsetDateTime, EvalError> {
        match self.eval(expr, context, resolved)? {
            Computed::Time(at) => Ok(at),
            Computed::Span(_) => Err(EvalError::internal(
                "expected a time-valued argument, got a duration",
            )),
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astronomy::StaticAlmanac;
    use crate::calendar::StaticCalendar;
    use time::macros::{date, datetime};
    use zmanim_core::ast::Direction;
    use zmanim_core::parse_formula;

    /// Brooklyn, summer solstice 2025.
    fn context() -> EvalContext {
        EvalContext {
            date: date!(2025 - 06 - 21),
            latitude: "40.6782".parse().unwrap(),
            longitude: "-73.9442".parse().unwrap(),
            timezone: "America/New_York".to_owned(),
            elevation: None,
        }
    }

    fn almanac() -> StaticAlmanac {
        let mut a = StaticAlmanac::new();
        a.set_primitive("sunrise", datetime!(2025-06-21 05:25:00 -4));
        a.set_primitive("sunset", datetime!(2025-06-21 20:31:00 -4));
        a.set_solar(
            "16.1".parse().unwrap(),
            Direction::BeforeSunrise,
            datetime!(2025-06-21 03:04:00 -4),
        );
        a
    }

    fn eval_formula(formula: &str) -> Result<OffsetDateTime, EvalError> {
        eval_with(formula, &almanac(), &StaticCalendar::new())
    }

    fn eval_with(
        formula: &str,
        astro: &StaticAlmanac,
        calendar: &StaticCalendar,
    ) -> Result<OffsetDateTime, EvalError> {
        let ast = parse_formula(formula).unwrap();
        Evaluator::new(astro, calendar).evaluate(&ast, &context(), &BTreeMap::new())
    }

    #[test]
    fn duration_offsets_are_exact() {
        assert_eq!(
            eval_formula("sunrise - 72min").unwrap(),
            datetime!(2025-06-21 04:13:00 -4)
        );
        assert_eq!(
            eval_formula("sunset + 18min").unwrap(),
            datetime!(2025-06-21 20:49:00 -4)
        );
    }

    #[test]
    fn midpoint_is_commutative() {
        let one = eval_formula("midpoint(sunrise, sunset)").unwrap();
        let other = eval_formula("midpoint(sunset, sunrise)").unwrap();
        assert_eq!(one, other);
        assert_eq!(one, datetime!(2025-06-21 12:58:00 -4));
    }

    #[test]
    fn min_and_max_pick_the_right_operand() {
        assert_eq!(
            eval_formula("min(sunrise, sunset)").unwrap(),
            datetime!(2025-06-21 05:25:00 -4)
        );
        assert_eq!(
            eval_formula("max(sunrise, sunset)").unwrap(),
            datetime!(2025-06-21 20:31:00 -4)
        );
    }

    #[test]
    fn solar_dawn_is_before_sunrise() {
        let dawn = eval_formula("solar(16.1, before_sunrise)").unwrap();
        let sunrise = eval_formula("sunrise").unwrap();
        assert!(dawn < sunrise);
    }

    #[test]
    fn untaken_branch_is_not_evaluated() {
        // The else branch names an angle the almanac has no entry
        // for; evaluating it would fail. The taken branch must not
        // touch it.
        let mut calendar = StaticCalendar::new();
        calendar.set("erev_shabbos", true);
        let at = eval_with(
            "if (erev_shabbos) { sunset - 40min } else { solar(20, after_sunset) }",
            &almanac(),
            &calendar,
        )
        .unwrap();
        assert_eq!(at, datetime!(2025-06-21 19:51:00 -4));
    }

    #[test]
    fn conditional_takes_the_else_branch() {
        let mut calendar = StaticCalendar::new();
        calendar.set("erev_shabbos", false);
        let at = eval_with(
            "if (erev_shabbos) { sunset - 40min } else { sunset - 18min }",
            &almanac(),
            &calendar,
        )
        .unwrap();
        assert_eq!(at, datetime!(2025-06-21 20:13:00 -4));
    }

    #[test]
    fn unknown_calendar_flag_is_internal() {
        let err = eval_formula("if (erev_pesach) { sunset } else { sunrise }").unwrap_err();
        assert!(matches!(err, EvalError::Internal { .. }));
    }

    #[test]
    fn degrees_rechecked_for_programmatic_trees() {
        // Bypasses the parser, which would reject 120 outright.
        let ast = Expr::Call {
            function: "solar".to_owned(),
            args: vec![
                Expr::Number {
                    value: Decimal::from(120),
                },
                Expr::Direction {
                    value: Direction::BeforeSunrise,
                },
            ],
        };
        let calendar = StaticCalendar::new();
        let err = Evaluator::new(&almanac(), &calendar)
            .evaluate(&ast, &context(), &BTreeMap::new())
            .unwrap_err();
        assert_eq!(
            err,
            EvalError::DegreesOutOfRange {
                degrees: Decimal::from(120)
            }
        );
    }

    #[test]
    fn two_times_rejected_for_programmatic_trees() {
        let ast = Expr::BinaryOp {
            op: BinOp::Add,
            left: Box::new(Expr::Primitive {
                name: "sunrise".to_owned(),
            }),
            right: Box::new(Expr::Primitive {
                name: "sunset".to_owned(),
            }),
        };
        let calendar = StaticCalendar::new();
        let err = Evaluator::new(&almanac(), &calendar)
            .evaluate(&ast, &context(), &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, EvalError::Internal { .. }));
    }

    #[test]
    fn unreachable_angle_propagates() {
        let mut a = almanac();
        let degrees: Decimal = "16.1".parse().unwrap();
        a.mark_solar_unreachable(degrees, Direction::BeforeSunrise);
        let err = eval_with(
            "solar(16.1, before_sunrise)",
            &a,
            &StaticCalendar::new(),
        )
        .unwrap_err();
        assert_eq!(err, EvalError::SunAngleUnreachable { degrees });
    }

    #[test]
    fn unresolved_reference_is_internal() {
        let err = eval_formula("@alos + 18min").unwrap_err();
        assert!(matches!(err, EvalError::Internal { .. }));
    }

    #[test]
    fn references_resolve_from_the_map() {
        let ast = parse_formula("@alos + 18min").unwrap();
        let mut resolved = BTreeMap::new();
        resolved.insert("alos".to_owned(), datetime!(2025-06-21 03:04:00 -4));
        let calendar = StaticCalendar::new();
        let at = Evaluator::new(&almanac(), &calendar)
            .evaluate(&ast, &context(), &resolved)
            .unwrap();
        assert_eq!(at, datetime!(2025-06-21 03:22:00 -4));
    }

    #[test]
    fn evaluation_is_deterministic() {
        for _ in 0..2 {
            assert_eq!(
                eval_formula("midpoint(sunrise, sunset)").unwrap(),
                datetime!(2025-06-21 12:58:00 -4)
            );
        }
    }
}
