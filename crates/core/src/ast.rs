//! Formula AST produced by the parser.
//!
//! Function signatures (arity, per-position argument kinds, degree
//! ranges) are enforced at parse time, so a well-formed `Expr` tree
//! already satisfies them. The evaluator still re-checks the few
//! invariants that matter for trees constructed programmatically.

use rust_decimal::Decimal;
use serde::Serialize;

/// Offset direction for `solar(degrees, direction)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    BeforeSunrise,
    AfterSunrise,
    BeforeSunset,
    AfterSunset,
    BeforeNoon,
    AfterNoon,
}

impl Direction {
    pub fn parse(token: &str) -> Option<Direction> {
        match token {
            "before_sunrise" => Some(Direction::BeforeSunrise),
            "after_sunrise" => Some(Direction::AfterSunrise),
            "before_sunset" => Some(Direction::BeforeSunset),
            "after_sunset" => Some(Direction::AfterSunset),
            "before_noon" => Some(Direction::BeforeNoon),
            "after_noon" => Some(Direction::AfterNoon),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::BeforeSunrise => "before_sunrise",
            Direction::AfterSunrise => "after_sunrise",
            Direction::BeforeSunset => "before_sunset",
            Direction::AfterSunset => "after_sunset",
            Direction::BeforeNoon => "before_noon",
            Direction::AfterNoon => "after_noon",
        }
    }
}

/// Halachic day-boundary system for `proportional_hours(hours, base)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseSystem {
    /// Sunrise to sunset, divided into 12
    Gra,
    /// 72 minutes before sunrise to 72 minutes after sunset
    Mga,
    /// 90-minute variant of MGA
    Mga90,
    /// 120-minute variant of MGA
    Mga120,
    /// 16.1° dawn to 16.1° dusk
    Alos16_1,
}

impl BaseSystem {
    pub fn parse(token: &str) -> Option<BaseSystem> {
        match token {
            "gra" => Some(BaseSystem::Gra),
            "mga" => Some(BaseSystem::Mga),
            "mga_90" => Some(BaseSystem::Mga90),
            "mga_120" => Some(BaseSystem::Mga120),
            "alos_16_1" => Some(BaseSystem::Alos16_1),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BaseSystem::Gra => "gra",
            BaseSystem::Mga => "mga",
            BaseSystem::Mga90 => "mga_90",
            BaseSystem::Mga120 => "mga_120",
            BaseSystem::Alos16_1 => "alos_16_1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
}

/// One variant per syntactic form of the formula language.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Expr {
    /// An astronomical primitive, e.g. `sunrise`
    Primitive { name: String },
    /// A bare numeric literal -- only valid as a function argument
    Number { value: Decimal },
    /// A duration from `72min` syntax
    Duration { minutes: i64 },
    /// A call like `solar(16.1, before_sunrise)`
    Call { function: String, args: Vec<Expr> },
    /// `@key` -- the value of another zman in the same set
    Reference { key: String },
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Direction { value: Direction },
    BaseSystem { value: BaseSystem },
    /// A calendar predicate name in `if (...)` position, resolved by
    /// the calendar collaborator at evaluation time
    CalendarFlag { name: String },
}

/// What an expression evaluates to. Used by the parser's semantic
/// checks; literal-only kinds never appear outside function arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Time,
    Duration,
    Number,
    Direction,
    BaseSystem,
    Flag,
}

impl Expr {
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Expr::Primitive { .. } => ValueKind::Time,
            Expr::Number { .. } => ValueKind::Number,
            Expr::Duration { .. } => ValueKind::Duration,
            Expr::Call { .. } => ValueKind::Time,
            Expr::Reference { .. } => ValueKind::Time,
            Expr::Conditional { .. } => ValueKind::Time,
            Expr::Direction { .. } => ValueKind::Direction,
            Expr::BaseSystem { .. } => ValueKind::BaseSystem,
            Expr::CalendarFlag { .. } => ValueKind::Flag,
            Expr::BinaryOp { left, right, .. } => {
                match (left.value_kind(), right.value_kind()) {
                    (ValueKind::Duration, ValueKind::Duration) => ValueKind::Duration,
                    _ => ValueKind::Time,
                }
            }
        }
    }

    /// All `@key` references reachable in this tree, in order of first
    /// appearance, deduplicated. Derived, never authored.
    pub fn dependencies(&self) -> Vec<String> {
        let mut keys = Vec::new();
        self.collect_references(&mut keys);
        keys
    }

    fn collect_references(&self, keys: &mut Vec<String>) {
        match self {
            Expr::Reference { key } => {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_references(keys);
                }
            }
            Expr::BinaryOp { left, right, .. } => {
                left.collect_references(keys);
                right.collect_references(keys);
            }
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.collect_references(keys);
                then_branch.collect_references(keys);
                else_branch.collect_references(keys);
            }
            _ => {}
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
