//! Proportional ("shaos zmanios") hour arithmetic.
//!
//! Each base system defines a halachic day window; one shaah zmanis
//! is a twelfth of that window. `proportional_hours(h, base)` lands
//! `h` shaos after the window opens. All scaling runs through
//! `Decimal` and collapses to whole seconds only at the end.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use crate::astronomy::SolarCalculator;
use crate::types::{EvalContext, EvalError};
use zmanim_core::ast::{BaseSystem, Direction};

fn depression_16_1() -> Decimal {
    Decimal::new(161, 1)
}

/// The day window for a base system: `(start, end)`.
pub fn day_window(
    base: BaseSystem,
    context: &EvalContext,
    astro: &dyn SolarCalculator,
) -> Result<(OffsetDateTime, OffsetDateTime), EvalError> {
    let window = match base {
        BaseSystem::Gra => {
            let start = astro.primitive("sunrise", context)?;
            let end = astro.primitive("sunset", context)?;
            (start, end)
        }
        BaseSystem::Mga => fixed_offset_window(context, astro, 72)?,
        BaseSystem::Mga90 => fixed_offset_window(context, astro, 90)?,
        BaseSystem::Mga120 => fixed_offset_window(context, astro, 120)?,
        BaseSystem::Alos16_1 => {
            let start =
                astro.solar_depression(depression_16_1(), Direction::BeforeSunrise, context)?;
            let end = astro.solar_depression(depression_16_1(), Direction::AfterSunset, context)?;
            (start, end)
        }
    };

    if window.1 <= window.0 {
        return Err(EvalError::internal(format!(
            "day window for base system '{}' ends before it starts",
            base.as_str()
        )));
    }
    Ok(window)
}

fn fixed_offset_window(
    context: &EvalContext,
    astro: &dyn SolarCalculator,
    minutes: i64,
) -> Result<(OffsetDateTime, OffsetDateTime), EvalError> {
    let sunrise = astro.primitive("sunrise", context)?;
    let sunset = astro.primitive("sunset", context)?;
    Ok((
        sunrise - Duration::minutes(minutes),
        sunset + Duration::minutes(minutes),
    ))
}

/// The moment `hours` proportional hours after the window opens.
/// `hours` may be fractional (`6.5`, `10.75`).
pub fn proportional_time(
    hours: Decimal,
    base: BaseSystem,
    context: &EvalContext,
    astro: &dyn SolarCalculator,
) -> Result<OffsetDateTime, EvalError> {
    let (start, end) = day_window(base, context, astro)?;
    let day_seconds = Decimal::from((end - start).whole_seconds());
    let offset_seconds = (day_seconds * hours / Decimal::from(12)).round();
    let seconds = offset_seconds.to_i64().ok_or_else(|| {
        EvalError::internal(format!("proportional offset overflow: {} hours", hours))
    })?;
    Ok(start + Duration::seconds(seconds))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astronomy::StaticAlmanac;
    use time::macros::{date, datetime};

    fn context() -> EvalContext {
        EvalContext {
            date: date!(2025 - 03 - 20),
            latitude: "31.778".parse().unwrap(),
            longitude: "35.235".parse().unwrap(),
            timezone: "Asia/Jerusalem".to_owned(),
            elevation: None,
        }
    }

    /// Equinox-like fixture: a 12-hour day makes one shaah exactly
    /// one clock hour under gra.
    fn almanac() -> StaticAlmanac {
        let mut a = StaticAlmanac::new();
        a.set_primitive("sunrise", datetime!(2025-03-20 06:00:00 +2));
        a.set_primitive("sunset", datetime!(2025-03-20 18:00:00 +2));
        a
    }

    #[test]
    fn gra_third_hour() {
        let at = proportional_time(Decimal::from(3), BaseSystem::Gra, &context(), &almanac())
            .unwrap();
        assert_eq!(at, datetime!(2025-03-20 09:00:00 +2));
    }

    #[test]
    fn mga_extends_the_window() {
        // 04:48 .. 19:12 gives a 72-minute shaah; three shaos from
        // 04:48 is 08:24.
        let at = proportional_time(Decimal::from(3), BaseSystem::Mga, &context(), &almanac())
            .unwrap();
        assert_eq!(at, datetime!(2025-03-20 08:24:00 +2));
    }

    #[test]
    fn fractional_hours() {
        let at = proportional_time(
            "10.75".parse().unwrap(),
            BaseSystem::Gra,
            &context(),
            &almanac(),
        )
        .unwrap();
        assert_eq!(at, datetime!(2025-03-20 16:45:00 +2));
    }

    #[test]
    fn depression_based_window() {
        let mut a = almanac();
        a.set_solar(
            "16.1".parse().unwrap(),
            Direction::BeforeSunrise,
            datetime!(2025-03-20 04:40:00 +2),
        );
        a.set_solar(
            "16.1".parse().unwrap(),
            Direction::AfterSunset,
            datetime!(2025-03-20 19:20:00 +2),
        );
        // 04:40 .. 19:20 is 880 minutes; half the day is 440.
        let at = proportional_time(Decimal::from(6), BaseSystem::Alos16_1, &context(), &a)
            .unwrap();
        assert_eq!(at, datetime!(2025-03-20 12:00:00 +2));
    }

    #[test]
    fn inverted_window_is_internal() {
        let mut a = StaticAlmanac::new();
        a.set_primitive("sunrise", datetime!(2025-03-20 18:00:00 +2));
        a.set_primitive("sunset", datetime!(2025-03-20 06:00:00 +2));
        let err =
            proportional_time(Decimal::from(3), BaseSystem::Gra, &context(), &a).unwrap_err();
        assert!(matches!(err, EvalError::Internal { .. }));
    }
}
