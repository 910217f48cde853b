// HiGHS Solver Adapter
// Implements the SolverService interface for HiGHS
// This is an adapter pattern - translates the native model to the HiGHS API

use crate::domain::{
    models::Solution,
    solver_service::{Result, SolverService},
    value_objects::{ColumnKind, NativeStatus, ObjectiveSense, RowSense},
};
use crate::native::NativeModel;
use highs::{HighsModelStatus, RowProblem, Sense};
use tracing::debug;

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for HighsSolver {
    fn solve(&self, model: &NativeModel) -> Result<Solution> {
        // Validate first
        self.validate(model)?;

        let objective = model.objective.as_ref();

        // Use HiGHS RowProblem (add columns first, then rows)
        let mut pb = RowProblem::default();
        let mut cols = Vec::with_capacity(model.columns.len());

        for (index, column) in model.columns.iter().enumerate() {
            let lower = column.lower_bound;
            let upper = column.upper_bound;
            let obj_coeff = objective.map_or(0.0, |o| o.expr.coefficient(index));

            let col = match column.kind {
                ColumnKind::Integer | ColumnKind::Binary => {
                    pb.add_integer_column(obj_coeff, lower..upper)
                }
                ColumnKind::Continuous => pb.add_column(obj_coeff, lower..upper),
            };
            cols.push(col);
        }

        for row in model.rows.iter().filter(|row| !row.is_constant()) {
            let terms: Vec<_> = row
                .expr
                .terms()
                .map(|(index, coeff)| (cols[index], coeff))
                .collect();

            match row.sense {
                RowSense::LessOrEqual => {
                    pb.add_row(..=row.rhs, &terms);
                }
                RowSense::Equal => {
                    pb.add_row(row.rhs..=row.rhs, &terms);
                }
                RowSense::GreaterOrEqual => {
                    pb.add_row(row.rhs.., &terms);
                }
            }
        }

        let sense = match objective.map(|o| o.sense) {
            Some(ObjectiveSense::Maximize) => Sense::Maximise,
            _ => Sense::Minimise,
        };

        debug!(solver = self.name(), columns = cols.len(), "running HiGHS");
        let solved = pb.optimise(sense).solve();

        Ok(match solved.status() {
            HighsModelStatus::Optimal => {
                let column_values = solved.get_solution().columns().to_vec();
                let objective_value = objective.and_then(|o| o.expr.evaluate(&column_values));
                Solution::optimal(column_values, objective_value)
            }
            HighsModelStatus::Infeasible => Solution::new(
                NativeStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            ),
            HighsModelStatus::Unbounded => Solution::new(
                NativeStatus::Unbounded,
                "Problem is unbounded: objective can be improved infinitely",
            ),
            HighsModelStatus::UnboundedOrInfeasible => Solution::new(
                NativeStatus::InfeasibleOrUnbounded,
                "Problem is infeasible or unbounded",
            ),
            status => Solution::new(
                NativeStatus::Unknown,
                format!("HiGHS solver returned status: {:?}", status),
            ),
        })
    }

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
