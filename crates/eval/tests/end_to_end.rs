//! Full pipeline: formula text → AST → dependency order → times.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use time::macros::{date, datetime};
use time::OffsetDateTime;
use zmanim_core::ast::Direction;
use zmanim_core::{parse_formula, ZmanDefinition};
use zmanim_eval::{
    evaluate_set, explain, EvalContext, Evaluator, FormulaError, StaticAlmanac, StaticCalendar,
};

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
    a.set_solar(
        "8.5".parse().unwrap(),
        Direction::AfterSunset,
        datetime!(2025-06-21 21:23:00 -4),
    );
    a
}

fn def(key: &str, formula: &str) -> ZmanDefinition {
    ZmanDefinition::new(key, parse_formula(formula).unwrap())
}

#[test]
fn solar_dawn_parses_and_lands_before_sunrise() {
    let ast = parse_formula("solar(16.1, before_sunrise)").unwrap();
    let calendar = StaticCalendar::new();
    let evaluator = Evaluator::new(&almanac(), &calendar);

    let dawn = evaluator
        .evaluate(&ast, &context(), &BTreeMap::new())
        .unwrap();
    let sunrise = evaluator
        .evaluate(
            &parse_formula("sunrise").unwrap(),
            &context(),
            &BTreeMap::new(),
        )
        .unwrap();
    assert!(dawn < sunrise);
}

#[test]
fn publisher_set_round_trip() {
    let mut calendar = StaticCalendar::new();
    calendar.set("erev_shabbos", false);

    let defs = [
        def("alos", "solar(16.1, before_sunrise)"),
        def("netz", "sunrise"),
        def("chatzos", "midpoint(sunrise, sunset)"),
        def("sof_zman_shma", "proportional_hours(3, gra)"),
        def("candle_lighting", "if (erev_shabbos) { sunset - 40min } else { sunset - 18min }"),
        def("shkia", "sunset"),
        def("tzeis", "min(@shkia + 72min, solar(8.5, after_sunset))"),
    ];

    let result = evaluate_set(&defs, &context(), &almanac(), &calendar).unwrap();

    assert_eq!(result.time("alos"), Some(datetime!(2025-06-21 03:04:00 -4)));
    assert_eq!(result.time("netz"), Some(datetime!(2025-06-21 05:25:00 -4)));
    assert_eq!(
        result.time("chatzos"),
        Some(datetime!(2025-06-21 12:58:00 -4))
    );
    // 15h06m of daylight -- one shaah is 75.5 minutes; three land at 09:11:30.
    assert_eq!(
        result.time("sof_zman_shma"),
        Some(datetime!(2025-06-21 09:11:30 -4))
    );
    assert_eq!(
        result.time("candle_lighting"),
        Some(datetime!(2025-06-21 20:13:00 -4))
    );
    // 20:31 + 72min = 21:43, geonim dusk 21:23 -- min picks the geonim time.
    assert_eq!(
        result.time("tzeis"),
        Some(datetime!(2025-06-21 21:23:00 -4))
    );
}

#[test]
fn evaluation_round_trip_is_deterministic() {
    let formula = "max(proportional_hours(6.5, mga), midpoint(sunrise, sunset))";
    let ast = parse_formula(formula).unwrap();
    let calendar = StaticCalendar::new();
    let evaluator = Evaluator::new(&almanac(), &calendar);

    let results: Vec<OffsetDateTime> = (0..2)
        .map(|_| {
            evaluator
                .evaluate(&ast, &context(), &BTreeMap::new())
                .unwrap()
        })
        .collect();
    assert_eq!(results[0], results[1]);
}

#[test]
fn parse_failures_explain_with_suggestions() {
    let err = parse_formula("sunrize - 72min").unwrap_err();
    let human = explain(&FormulaError::from(err));
    assert!(human.suggestion.contains("sunrise"));
}

#[test]
fn polar_summer_reports_unreachable_not_a_crash() {
    // Tromsø in late June: the sun never dips 16.1 degrees below the
    // horizon, but civil events still exist in the almanac.
    let mut a = StaticAlmanac::new();
    a.set_primitive("sunrise", datetime!(2025-06-21 01:00:00 +2));
    a.set_primitive("sunset", datetime!(2025-06-21 23:59:00 +2));
    let degrees: Decimal = "16.1".parse().unwrap();
    a.mark_solar_unreachable(degrees, Direction::BeforeSunrise);

    let ctx = EvalContext {
        date: date!(2025 - 06 - 21),
        latitude: "69.6492".parse().unwrap(),
        longitude: "18.9553".parse().unwrap(),
        timezone: "Europe/Oslo".to_owned(),
        elevation: None,
    };

    let defs = [
        def("alos", "solar(16.1, before_sunrise)"),
        def("netz", "sunrise"),
    ];
    let result = evaluate_set(&defs, &ctx, &a, &StaticCalendar::new()).unwrap();
    assert!(result.error("alos").is_some());
    assert_eq!(result.time("netz"), Some(datetime!(2025-06-21 01:00:00 +2)));

    let human = explain(&FormulaError::from(result.error("alos").unwrap().clone()));
    assert!(human.headline.contains("16.1"));
}
