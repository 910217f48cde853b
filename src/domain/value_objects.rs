// Domain value objects: variable domains, native/canonical statuses, backend choice

use serde::{Deserialize, Serialize};
use std::fmt;

/// Finite stand-in for "unbounded" on integer columns.
///
/// Integer columns must carry finite bounds in the native engine, so the
/// largest 32-bit signed integer is used instead of infinity.
pub const BOUNDARY_VALUE: f64 = i32::MAX as f64;

/// Type classification of a model variable
///
/// The `*Constant*` variants mark values known while the model is being built.
/// A variable in a constant domain always carries a precomputed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    /// Integer in [-BOUNDARY, BOUNDARY]
    AnyInteger,
    /// Integer in [0, BOUNDARY]
    PositiveOrZeroInteger,
    /// Integer in {0, 1}
    BinaryInteger,
    AnyConstantInteger,
    PositiveOrZeroConstantInteger,
    BinaryConstantInteger,
    /// Real in (-inf, inf)
    AnyReal,
    /// Real in [0, inf)
    PositiveOrZeroReal,
    AnyConstantReal,
    PositiveOrZeroConstantReal,
    /// Real in [0, 1]; kept for completeness of the domain set
    BinaryReal,
}

impl Domain {
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Domain::AnyInteger
                | Domain::PositiveOrZeroInteger
                | Domain::BinaryInteger
                | Domain::AnyConstantInteger
                | Domain::PositiveOrZeroConstantInteger
                | Domain::BinaryConstantInteger
        )
    }

    pub fn is_constant(self) -> bool {
        matches!(
            self,
            Domain::AnyConstantInteger
                | Domain::PositiveOrZeroConstantInteger
                | Domain::BinaryConstantInteger
                | Domain::AnyConstantReal
                | Domain::PositiveOrZeroConstantReal
        )
    }

    pub fn is_binary(self) -> bool {
        matches!(
            self,
            Domain::BinaryInteger | Domain::BinaryConstantInteger | Domain::BinaryReal
        )
    }

    /// Non-constant counterpart of this domain (identity for non-constant domains)
    pub fn variable_counterpart(self) -> Domain {
        match self {
            Domain::AnyConstantInteger => Domain::AnyInteger,
            Domain::PositiveOrZeroConstantInteger => Domain::PositiveOrZeroInteger,
            Domain::BinaryConstantInteger => Domain::BinaryInteger,
            Domain::AnyConstantReal => Domain::AnyReal,
            Domain::PositiveOrZeroConstantReal => Domain::PositiveOrZeroReal,
            other => other,
        }
    }

    /// Native column kind used to represent this domain
    pub fn column_kind(self) -> ColumnKind {
        match self.variable_counterpart() {
            Domain::BinaryInteger => ColumnKind::Binary,
            Domain::AnyInteger | Domain::PositiveOrZeroInteger => ColumnKind::Integer,
            _ => ColumnKind::Continuous,
        }
    }

    /// Lower and upper bound of a native column in this domain
    pub fn bounds(self) -> (f64, f64) {
        match self.variable_counterpart() {
            Domain::AnyInteger => (-BOUNDARY_VALUE, BOUNDARY_VALUE),
            Domain::PositiveOrZeroInteger => (0.0, BOUNDARY_VALUE),
            Domain::BinaryInteger | Domain::BinaryReal => (0.0, 1.0),
            Domain::PositiveOrZeroReal => (0.0, f64::INFINITY),
            _ => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Representation of a column inside the native model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Continuous real column
    Continuous,
    /// General integer column
    Integer,
    /// Integer column restricted to {0, 1}
    Binary,
}

impl ColumnKind {
    pub fn is_integer(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Binary)
    }
}

/// Comparison of a native row against its right-hand side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSense {
    /// Less than or equal (≤)
    LessOrEqual,
    /// Equal (=)
    Equal,
    /// Greater than or equal (≥)
    GreaterOrEqual,
}

impl RowSense {
    pub fn symbol(self) -> &'static str {
        match self {
            RowSense::LessOrEqual => "<=",
            RowSense::Equal => "=",
            RowSense::GreaterOrEqual => ">=",
        }
    }

    /// Whether `lhs sense rhs` holds, up to `tolerance`
    pub fn holds(self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            RowSense::LessOrEqual => lhs <= rhs + tolerance,
            RowSense::Equal => (lhs - rhs).abs() <= tolerance,
            RowSense::GreaterOrEqual => lhs + tolerance >= rhs,
        }
    }
}

/// Direction of the native objective
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

/// Status reported by the native engine after a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeStatus {
    /// No solve has run on the current model
    Unsolved,
    Optimal,
    /// A feasible, not proven optimal, solution exists
    Feasible,
    /// The objective is bounded but no proven optimum was reached
    Bounded,
    Infeasible,
    Unbounded,
    InfeasibleOrUnbounded,
    /// The engine failed
    Error,
    Unknown,
}

impl NativeStatus {
    /// Whether column values are available for this status
    pub fn has_solution(self) -> bool {
        matches!(self, NativeStatus::Optimal | NativeStatus::Feasible)
    }
}

/// Canonical status exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// Found optimal solution
    Optimal,
    /// Found feasible solution (may not be optimal)
    Feasible,
    /// Problem has no feasible solution
    Infeasible,
    /// Objective can be improved infinitely
    Unbounded,
    Unknown,
}

impl From<NativeStatus> for SolutionStatus {
    fn from(status: NativeStatus) -> Self {
        match status {
            NativeStatus::Optimal => SolutionStatus::Optimal,
            NativeStatus::Unbounded | NativeStatus::InfeasibleOrUnbounded => {
                SolutionStatus::Unbounded
            }
            NativeStatus::Infeasible => SolutionStatus::Infeasible,
            NativeStatus::Feasible | NativeStatus::Bounded => SolutionStatus::Feasible,
            NativeStatus::Unsolved | NativeStatus::Error | NativeStatus::Unknown => {
                SolutionStatus::Unknown
            }
        }
    }
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "Optimal"),
            SolutionStatus::Feasible => write!(f, "Feasible"),
            SolutionStatus::Infeasible => write!(f, "Infeasible"),
            SolutionStatus::Unbounded => write!(f, "Unbounded"),
            SolutionStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Solver backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverBackend {
    /// Automatically select best available solver
    #[default]
    Auto,
    /// Pure-Rust microlp through good_lp
    MicroLp,
    /// COIN-OR CBC through good_lp
    CoinCbc,
    /// HiGHS
    Highs,
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Auto => write!(f, "Auto"),
            SolverBackend::MicroLp => write!(f, "microlp"),
            SolverBackend::CoinCbc => write!(f, "COIN-OR CBC"),
            SolverBackend::Highs => write!(f, "HiGHS"),
        }
    }
}
