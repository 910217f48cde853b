// good_lp Solver Adapter
// Translates the native model into a good_lp problem and runs it through
// microlp (pure Rust) or COIN-OR CBC

use crate::domain::{
    models::Solution,
    solver_service::{Result, SolverService},
    value_objects::{ColumnKind, NativeStatus, ObjectiveSense, RowSense},
};
use crate::native::{LinearExpr, NativeModel};
#[cfg(feature = "coin_cbc")]
use good_lp::solvers::coin_cbc;
use good_lp::{
    solvers::microlp, variable, variables, Constraint, Expression, ResolutionError,
    Solution as GoodLpSolutionTrait, SolverModel, Variable as GoodLpVariable,
};
use tracing::debug;

/// Engine behind good_lp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoodLpEngine {
    MicroLp,
    #[cfg(feature = "coin_cbc")]
    CoinCbc,
}

pub struct GoodLpSolver {
    engine: GoodLpEngine,
}

impl GoodLpSolver {
    pub fn new(engine: GoodLpEngine) -> Self {
        Self { engine }
    }

    pub fn microlp() -> Self {
        Self::new(GoodLpEngine::MicroLp)
    }

    #[cfg(feature = "coin_cbc")]
    pub fn coin_cbc() -> Self {
        Self::new(GoodLpEngine::CoinCbc)
    }

    fn to_expression(expr: &LinearExpr, lp_variables: &[GoodLpVariable]) -> Expression {
        let mut out: Expression = 0.into();
        for (index, coeff) in expr.terms() {
            out += coeff * lp_variables[index];
        }
        out
    }

    fn run<M>(
        mut lp_model: M,
        constraints: Vec<Constraint>,
        lp_variables: &[GoodLpVariable],
    ) -> std::result::Result<Vec<f64>, ResolutionError>
    where
        M: SolverModel<Error = ResolutionError>,
    {
        for constraint in constraints {
            lp_model = lp_model.with(constraint);
        }
        let solution = lp_model.solve()?;
        Ok(lp_variables.iter().map(|&var| solution.value(var)).collect())
    }
}

impl Default for GoodLpSolver {
    fn default() -> Self {
        Self::microlp()
    }
}

impl SolverService for GoodLpSolver {
    fn solve(&self, model: &NativeModel) -> Result<Solution> {
        // Validate first
        self.validate(model)?;

        // Build variables using good_lp
        let mut vars = variables!();
        let mut lp_variables: Vec<GoodLpVariable> = Vec::with_capacity(model.columns.len());

        for column in &model.columns {
            let lower = column.lower_bound;
            let upper = column.upper_bound;

            let var = match column.kind {
                ColumnKind::Binary | ColumnKind::Integer => {
                    vars.add(variable().integer().min(lower).max(upper))
                }
                ColumnKind::Continuous => vars.add(variable().min(lower).max(upper)),
            };
            lp_variables.push(var);
        }

        // Constant part of the objective does not move the optimum
        let objective = model.objective.as_ref();
        let obj_expr = objective
            .map(|o| Self::to_expression(&o.expr, &lp_variables))
            .unwrap_or_else(|| 0.into());

        // Rows without columns were already checked by the caller
        let constraints: Vec<Constraint> = model
            .rows
            .iter()
            .filter(|row| !row.is_constant())
            .map(|row| {
                let lhs = Self::to_expression(&row.expr, &lp_variables);
                match row.sense {
                    RowSense::LessOrEqual => lhs.leq(row.rhs),
                    RowSense::Equal => lhs.eq(row.rhs),
                    RowSense::GreaterOrEqual => lhs.geq(row.rhs),
                }
            })
            .collect();

        let problem = match objective.map(|o| o.sense) {
            Some(ObjectiveSense::Maximize) => vars.maximise(obj_expr),
            _ => vars.minimise(obj_expr),
        };

        debug!(
            solver = self.name(),
            columns = lp_variables.len(),
            rows = constraints.len(),
            mip = model.is_mixed_integer(),
            "running good_lp"
        );

        let outcome = match self.engine {
            GoodLpEngine::MicroLp => {
                Self::run(problem.using(microlp::microlp), constraints, &lp_variables)
            }
            #[cfg(feature = "coin_cbc")]
            GoodLpEngine::CoinCbc => {
                Self::run(problem.using(coin_cbc::coin_cbc), constraints, &lp_variables)
            }
        };

        // Process result
        Ok(match outcome {
            Ok(column_values) => {
                let objective_value = objective.and_then(|o| o.expr.evaluate(&column_values));
                Solution::optimal(column_values, objective_value)
            }
            Err(ResolutionError::Infeasible) => Solution::new(
                NativeStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            ),
            Err(ResolutionError::Unbounded) => Solution::new(
                NativeStatus::Unbounded,
                "Problem is unbounded: objective can be improved infinitely",
            ),
            Err(e) => Solution::new(NativeStatus::Error, format!("{:?}", e)),
        })
    }

    fn name(&self) -> &str {
        match self.engine {
            GoodLpEngine::MicroLp => "microlp",
            #[cfg(feature = "coin_cbc")]
            GoodLpEngine::CoinCbc => "COIN-OR CBC",
        }
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
