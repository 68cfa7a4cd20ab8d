//! Static symbol registry for the formula language.
//!
//! Pure, read-only, process-wide data. Both the parser (signature
//! validation) and the error explainer (fuzzy suggestions) consult it.

/// Expected kind of one function argument position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Numeric literal, solar depression degrees in [0, 90]
    Degrees,
    /// Numeric literal, a count of proportional hours
    Hours,
    /// One of the direction tokens
    Direction,
    /// One of the base-system tokens
    BaseSystem,
    /// Any time-valued expression
    Time,
}

impl ArgKind {
    pub fn describe(&self) -> &'static str {
        match self {
            ArgKind::Degrees => "a degrees literal between 0 and 90",
            ArgKind::Hours => "a number of proportional hours",
            ArgKind::Direction => "a direction such as before_sunrise",
            ArgKind::BaseSystem => "a base system such as gra",
            ArgKind::Time => "a time-valued expression",
        }
    }
}

/// Declared signature of a built-in function.
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub name: &'static str,
    pub arg_kinds: &'static [ArgKind],
    /// One-line usage shown in error suggestions and editor tooltips
    pub usage: &'static str,
}

impl Signature {
    pub fn arity(&self) -> usize {
        self.arg_kinds.len()
    }
}

/// Astronomical primitives the calculation collaborator resolves.
static PRIMITIVES: &[&str] = &[
    "sunrise",
    "sunset",
    "solar_noon",
    "midnight",
    "visible_sunrise",
    "visible_sunset",
];

static FUNCTIONS: &[Signature] = &[
    Signature {
        name: "solar",
        arg_kinds: &[ArgKind::Degrees, ArgKind::Direction],
        usage: "solar(16.1, before_sunrise)",
    },
    Signature {
        name: "proportional_hours",
        arg_kinds: &[ArgKind::Hours, ArgKind::BaseSystem],
        usage: "proportional_hours(4, gra)",
    },
    Signature {
        name: "midpoint",
        arg_kinds: &[ArgKind::Time, ArgKind::Time],
        usage: "midpoint(sunrise, sunset)",
    },
    Signature {
        name: "min",
        arg_kinds: &[ArgKind::Time, ArgKind::Time],
        usage: "min(@tzeis_geonim, sunset + 30min)",
    },
    Signature {
        name: "max",
        arg_kinds: &[ArgKind::Time, ArgKind::Time],
        usage: "max(@alos, sunrise - 90min)",
    },
];

static DIRECTIONS: &[&str] = &[
    "before_sunrise",
    "after_sunrise",
    "before_sunset",
    "after_sunset",
    "before_noon",
    "after_noon",
];

static BASE_SYSTEMS: &[&str] = &["gra", "mga", "mga_90", "mga_120", "alos_16_1"];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

pub fn list_primitives() -> &'static [&'static str] {
    PRIMITIVES
}

pub fn function_signature(name: &str) -> Option<&'static Signature> {
    FUNCTIONS.iter().find(|s| s.name == name)
}

pub fn list_functions() -> &'static [Signature] {
    FUNCTIONS
}

pub fn is_direction(token: &str) -> bool {
    DIRECTIONS.contains(&token)
}

pub fn list_directions() -> &'static [&'static str] {
    DIRECTIONS
}

pub fn is_base_system(token: &str) -> bool {
    BASE_SYSTEMS.contains(&token)
}

pub fn list_base_systems() -> &'static [&'static str] {
    BASE_SYSTEMS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BaseSystem, Direction};

    #[test]
    fn signatures_are_binary() {
        for sig in list_functions() {
            assert_eq!(sig.arity(), 2, "{} should take two arguments", sig.name);
        }
    }

    #[test]
    fn direction_table_matches_ast_enum() {
        for token in list_directions() {
            assert!(Direction::parse(token).is_some(), "{}", token);
        }
    }

    #[test]
    fn base_system_table_matches_ast_enum() {
        for token in list_base_systems() {
            assert!(BaseSystem::parse(token).is_some(), "{}", token);
        }
    }

    #[test]
    fn primitives_and_functions_do_not_overlap() {
        for sig in list_functions() {
            assert!(!is_primitive(sig.name));
        }
    }
}
