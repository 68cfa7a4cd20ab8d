//! Astronomical calculation collaborator.
//!
//! The engine never does solar math itself; it delegates every
//! primitive and depression-angle lookup to a [`SolarCalculator`].
//! Production deployments wrap a real ephemeris service.
//! [`StaticAlmanac`] is the table-backed implementation used by
//! tests, fixtures, and the CLI.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::types::{EvalContext, EvalError};
use zmanim_core::ast::Direction;

/// Depression angle conventionally treated as the visible horizon
/// (solar semidiameter plus standard refraction), reported when a
/// horizon primitive itself never occurs.
pub fn horizon_depression() -> Decimal {
    Decimal::new(833, 3)
}

/// Errors a calculator can return.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AstronomyError {
    /// The sun never reaches the requested angle on this date at this
    /// location (polar regions and seasons).
    #[error("the sun does not reach {degrees} degrees below the horizon")]
    AngleUnreachable { degrees: Decimal },

    /// A calculator-specific failure (missing data, backend fault).
    #[error("astronomy provider error: {0}")]
    Provider(String),
}

impl From<AstronomyError> for EvalError {
    fn from(err: AstronomyError) -> EvalError {
        match err {
            AstronomyError::AngleUnreachable { degrees } => {
                EvalError::SunAngleUnreachable { degrees }
            }
            AstronomyError::Provider(message) => EvalError::internal(message),
        }
    }
}

/// Supplies concrete timestamps for astronomical events.
///
/// Implementations must be pure with respect to their inputs: the
/// same `(request, context)` pair always yields the same timestamp.
pub trait SolarCalculator: Send + Sync {
    /// A named primitive event (`sunrise`, `sunset`, `solar_noon`, ...)
    /// for the context's date and location.
    fn primitive(
        &self,
        name: &str,
        context: &EvalContext,
    ) -> Result<OffsetDateTime, AstronomyError>;

    /// The moment the sun is `degrees` below the horizon on the given
    /// side of sunrise, sunset, or noon.
    fn solar_depression(
        &self,
        degrees: Decimal,
        direction: Direction,
        context: &EvalContext,
    ) -> Result<OffsetDateTime, AstronomyError>;
}

// ──────────────────────────────────────────────
// StaticAlmanac
// ──────────────────────────────────────────────

/// A [`SolarCalculator`] backed by a fixed table of timestamps for one
/// date and location. Events can also be marked unreachable to model
/// polar edge cases.
#[derive(Debug, Clone, Default)]
pub struct StaticAlmanac {
    primitives: BTreeMap<String, OffsetDateTime>,
    solar: BTreeMap<String, OffsetDateTime>,
    unreachable: BTreeSet<String>,
}

fn solar_key(degrees: Decimal, direction: Direction) -> String {
    format!("{} {}", degrees.normalize(), direction.as_str())
}

impl StaticAlmanac {
    pub fn new() -> Self {
        StaticAlmanac::default()
    }

    pub fn set_primitive(&mut self, name: &str, at: OffsetDateTime) {
        self.primitives.insert(name.to_owned(), at);
    }

    pub fn set_solar(&mut self, degrees: Decimal, direction: Direction, at: OffsetDateTime) {
        self.solar.insert(solar_key(degrees, direction), at);
    }

    /// Mark a primitive as never occurring on this date (polar day/night).
    pub fn mark_primitive_unreachable(&mut self, name: &str) {
        self.unreachable.insert(name.to_owned());
    }

    /// Mark a depression angle as never reached on this date.
    pub fn mark_solar_unreachable(&mut self, degrees: Decimal, direction: Direction) {
        self.unreachable.insert(solar_key(degrees, direction));
    }
}

impl SolarCalculator for StaticAlmanac {
    fn primitive(
        &self,
        name: &str,
        _context: &EvalContext,
    ) -> Result<OffsetDateTime, AstronomyError> {
        if self.unreachable.contains(name) {
            return Err(AstronomyError::AngleUnreachable {
                degrees: horizon_depression(),
            });
        }
        self.primitives.get(name).copied().ok_or_else(|| {
            AstronomyError::Provider(format!("no almanac entry for '{}'", name))
        })
    }

    fn solar_depression(
        &self,
        degrees: Decimal,
        direction: Direction,
        _context: &EvalContext,
    ) -> Result<OffsetDateTime, AstronomyError> {
        let key = solar_key(degrees, direction);
        if self.unreachable.contains(&key) {
            return Err(AstronomyError::AngleUnreachable { degrees });
        }
        self.solar.get(&key).copied().ok_or_else(|| {
            AstronomyError::Provider(format!("no almanac entry for '{}'", key))
        })
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
