// Domain service interface for native solving engines
// Defines the contract that any backend must follow (Dependency Inversion Principle)

use super::models::Solution;
use super::value_objects::NativeStatus;
use crate::native::{EnvId, NativeModel};

/// Error types for the session adapter and its backends
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Operand '{operand}' is not constant, cannot perform division")]
    OperandNotConstant { operand: String },

    #[error("Division of '{dividend}' by constant '{divisor}' equal to zero")]
    DivisionByZero { dividend: String, divisor: String },

    #[error("Product of '{left}' and '{right}' is not linear: neither operand is constant")]
    NonLinearProduct { left: String, right: String },

    #[error("Cannot equate '{left}' = {left_value} with '{right}' = {right_value}")]
    ConflictingConstants {
        left: String,
        left_value: f64,
        right: String,
        right_value: f64,
    },

    #[error("Domain {domain} requires a precomputed value for '{name}'")]
    MissingConstantValue {
        name: String,
        domain: super::value_objects::Domain,
    },

    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("Handle '{0}' does not belong to this session's native environment")]
    ForeignHandle(String),

    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error("No solution available (status: {0:?})")]
    NoSolution(NativeStatus),

    #[error("Session has been disposed")]
    Disposed,

    #[error("Model file error at line {line}: {message}")]
    ModelFormat { line: usize, message: String },

    #[error("Column '{column}' (persistence index {index}) is missing from the reloaded model")]
    Remap { column: String, index: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata serialization error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Domain service interface for native solving engines
///
/// The engine is an opaque black box: it receives the native model and
/// reports a native status plus column values. Backends can be swapped
/// without touching the session adapter.
pub trait SolverService: Send + Sync {
    /// Solve the native model
    fn solve(&self, model: &NativeModel) -> Result<Solution>;

    /// Validate a model without solving it
    fn validate(&self, model: &NativeModel) -> Result<Vec<String>> {
        let mut errors = Vec::new();
        let num_columns = model.columns.len();

        for (i, column) in model.columns.iter().enumerate() {
            if column.lower_bound > column.upper_bound {
                errors.push(format!(
                    "Column {} '{}' has lower bound ({}) > upper bound ({})",
                    i, column.name, column.lower_bound, column.upper_bound
                ));
            }
            if column.kind.is_integer() && !self.supports_mip() {
                errors.push(format!(
                    "Column {} '{}' is integer but {} does not support MIP",
                    i,
                    column.name,
                    self.name()
                ));
            }
        }

        for row in &model.rows {
            if let Some(index) = row.expr.max_column() {
                if index >= num_columns {
                    errors.push(format!(
                        "Row '{}' references column {} but model has {} columns",
                        row.name, index, num_columns
                    ));
                }
            }
            if !row.rhs.is_finite() || row.expr.terms().any(|(_, c)| !c.is_finite()) {
                errors.push(format!("Row '{}' has a non-finite coefficient", row.name));
            }
        }

        if let Some(objective) = &model.objective {
            if let Some(index) = objective.expr.max_column() {
                if index >= num_columns {
                    errors.push(format!(
                        "Objective references column {} but model has {} columns",
                        index, num_columns
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(Vec::new())
        } else {
            Err(SolverError::InvalidProblem(errors.join("; ")))
        }
    }

    /// Outcome of models the engine never needs to see: an empty column set,
    /// or a row without columns that can never hold.
    fn trivial_outcome(&self, model: &NativeModel) -> Option<Solution> {
        if let Some(row) = model.violated_constant_row() {
            return Some(Solution::new(
                NativeStatus::Infeasible,
                format!("Row '{}' has no columns and never holds", row.name),
            ));
        }
        if model.columns.is_empty() {
            let objective_value = model.objective.as_ref().map(|o| o.expr.constant());
            return Some(Solution::optimal(Vec::new(), objective_value));
        }
        None
    }

    /// Called once when a session releases the environment `env`
    fn release(&self, _env: EnvId) {}

    /// Get the name of this solver backend
    fn name(&self) -> &str;

    /// Check if this solver supports mixed-integer programming
    fn supports_mip(&self) -> bool;
}
