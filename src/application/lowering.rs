//! Lowering of the model algebra onto native environment calls.
//!
//! Every operation returns a fresh [`Variable`] bound to a new native
//! expression, and folds precomputed values alongside: a result carries a
//! value exactly when every operand value it depends on is known.

use crate::domain::{
    solver_service::{Result, SolverError},
    value_objects::{Domain, ObjectiveSense, RowSense},
    Variable,
};
use crate::native::{NativeEnvironment, NativeRef};
use tracing::debug;

const EQUALITY_TOLERANCE: f64 = 1e-9;

fn derived(
    domain: Domain,
    native: NativeRef,
    name: String,
    precomputed_value: Option<f64>,
) -> Result<Variable> {
    if domain.is_constant() && precomputed_value.is_none() {
        return Err(SolverError::MissingConstantValue { name, domain });
    }
    Ok(Variable::new(domain, native, name, precomputed_value, None))
}

fn check_operands(env: &NativeEnvironment, operands: &[&Variable]) -> Result<()> {
    operands
        .iter()
        .try_for_each(|operand| env.check(operand.native(), operand.name()))
}

/// Allocate a column with the bounds of `domain`.
///
/// `native_name` names the column inside the native model, `name` is the
/// caller-facing key.
pub fn create_column(
    env: &mut NativeEnvironment,
    domain: Domain,
    name: String,
    native_name: &str,
    precomputed_value: Option<f64>,
) -> Result<Variable> {
    if domain.is_constant() && precomputed_value.is_none() {
        return Err(SolverError::MissingConstantValue { name, domain });
    }
    let (lower, upper) = domain.bounds();
    let (index, native) = env.add_column(native_name, domain.column_kind(), lower, upper);
    debug!(name = name.as_str(), %domain, index, "column created");
    Ok(Variable::new(domain, native, name, precomputed_value, Some(index)))
}

pub fn from_constant(
    env: &NativeEnvironment,
    value: f64,
    domain: Domain,
    name: String,
) -> Result<Variable> {
    derived(domain, env.constant(value), name, Some(value))
}

pub fn sum(
    env: &NativeEnvironment,
    first: &Variable,
    second: &Variable,
    domain: Domain,
    name: String,
) -> Result<Variable> {
    check_operands(env, &[first, second])?;
    let value = first
        .precomputed_value()
        .zip(second.precomputed_value())
        .map(|(a, b)| a + b);
    derived(domain, env.sum(first.native(), second.native()), name, value)
}

pub fn negate(
    env: &NativeEnvironment,
    variable: &Variable,
    domain: Domain,
    name: String,
) -> Result<Variable> {
    check_operands(env, &[variable])?;
    let value = variable.precomputed_value().map(|v| -v);
    derived(domain, env.negative(variable.native()), name, value)
}

/// Product of two operands, at least one of them constant.
///
/// A known precomputed value is folded in as a scalar, so a column whose
/// value was fixed by an equality still multiplies linearly.
pub fn multiply_by_constant(
    env: &NativeEnvironment,
    variable: &Variable,
    constant: &Variable,
    domain: Domain,
    name: String,
) -> Result<Variable> {
    check_operands(env, &[variable, constant])?;
    let native = match (variable.precomputed_value(), constant.precomputed_value()) {
        (_, Some(factor)) => env.scale(variable.native(), factor),
        (Some(factor), None) => env.scale(constant.native(), factor),
        (None, None) => env
            .product(variable.native(), constant.native())
            .ok_or_else(|| SolverError::NonLinearProduct {
                left: variable.name().to_string(),
                right: constant.name().to_string(),
            })?,
    };
    let value = variable
        .precomputed_value()
        .zip(constant.precomputed_value())
        .map(|(a, b)| a * b);
    derived(domain, native, name, value)
}

/// Division by an operand with a known value, lowered as `variable * (1 / value)`
pub fn divide_by_constant(
    env: &NativeEnvironment,
    variable: &Variable,
    constant: &Variable,
    domain: Domain,
    name: String,
) -> Result<Variable> {
    check_operands(env, &[variable, constant])?;
    let divisor = constant
        .precomputed_value()
        .ok_or_else(|| SolverError::OperandNotConstant {
            operand: constant.name().to_string(),
        })?;
    if divisor == 0.0 {
        return Err(SolverError::DivisionByZero {
            dividend: variable.name().to_string(),
            divisor: constant.name().to_string(),
        });
    }
    let value = variable.precomputed_value().map(|v| v / divisor);
    derived(domain, env.scale(variable.native(), 1.0 / divisor), name, value)
}

fn relate(
    env: &mut NativeEnvironment,
    variable: &Variable,
    sense: RowSense,
    bound: &Variable,
) -> Result<()> {
    check_operands(env, &[variable, bound])?;
    env.add_row(variable.native(), sense, bound.native());
    Ok(())
}

pub fn set_less_or_equal(
    env: &mut NativeEnvironment,
    variable: &Variable,
    bound: &Variable,
) -> Result<()> {
    relate(env, variable, RowSense::LessOrEqual, bound)
}

pub fn set_greater_or_equal(
    env: &mut NativeEnvironment,
    variable: &Variable,
    bound: &Variable,
) -> Result<()> {
    relate(env, variable, RowSense::GreaterOrEqual, bound)
}

/// Equality row plus constant propagation.
///
/// When exactly one side has a precomputed value the other side adopts it.
/// Two different known values are rejected before any row is added.
pub fn set_equal(
    env: &mut NativeEnvironment,
    variable: &mut Variable,
    bound: &mut Variable,
) -> Result<()> {
    check_operands(env, &[&*variable, &*bound])?;
    match (variable.precomputed_value(), bound.precomputed_value()) {
        (Some(left), Some(right)) if (left - right).abs() > EQUALITY_TOLERANCE => {
            return Err(SolverError::ConflictingConstants {
                left: variable.name().to_string(),
                left_value: left,
                right: bound.name().to_string(),
                right_value: right,
            });
        }
        (Some(value), None) => {
            bound.adopt_value(value);
        }
        (None, Some(value)) => {
            variable.adopt_value(value);
        }
        _ => {}
    }
    env.add_row(variable.native(), RowSense::Equal, bound.native());
    Ok(())
}

/// Make `expression` the single objective, maximized
pub fn add_goal(env: &mut NativeEnvironment, expression: &Variable) -> Result<()> {
    check_operands(env, &[expression])?;
    env.set_objective(ObjectiveSense::Maximize, expression.native());
    Ok(())
}
