//! Hebrew-calendar collaborator.
//!
//! Conditional formulas branch on named calendar predicates
//! (`erev_shabbos`, `yom_tov`, ...). The predicate vocabulary belongs
//! to the calendar service, not the formula engine -- the engine only
//! asks whether a flag holds on a date. An unknown flag is a loud
//! error, never silently false.

use std::collections::BTreeMap;

use time::Date;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error("unknown calendar flag '{name}'")]
    UnknownFlag { name: String },
}

/// Answers calendar predicates for conditional formulas.
pub trait CalendarProvider: Send + Sync {
    fn holds(&self, flag: &str, date: Date) -> Result<bool, CalendarError>;
}

/// A [`CalendarProvider`] with an explicit flag table. Flags not in
/// the table are unknown, not false.
#[derive(Debug, Clone, Default)]
pub struct StaticCalendar {
    flags: BTreeMap<String, bool>,
}

impl StaticCalendar {
    pub fn new() -> Self {
        StaticCalendar::default()
    }

    pub fn set(&mut self, flag: &str, value: bool) {
        self.flags.insert(flag.to_owned(), value);
    }
}

impl CalendarProvider for StaticCalendar {
    fn holds(&self, flag: &str, _date: Date) -> Result<bool, CalendarError> {
        self.flags
            .get(flag)
            .copied()
            .ok_or_else(|| CalendarError::UnknownFlag {
                name: flag.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn unknown_flag_is_an_error_not_false() {
        let mut calendar = StaticCalendar::new();
        calendar.set("erev_shabbos", false);

        let day = date!(2025 - 06 - 20);
        assert_eq!(calendar.holds("erev_shabbos", day), Ok(false));
        assert_eq!(
            calendar.holds("erev_pesach", day),
            Err(CalendarError::UnknownFlag {
                name: "erev_pesach".to_owned()
            })
        );
    }
}
