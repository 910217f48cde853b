use super::expr::{EnvId, LinearExpr, NativeRef};
use super::lp_format;
use super::model::{Column, NativeModel, Objective, Row};
use crate::domain::models::{Solution, SolverStatistics};
use crate::domain::solver_service::{Result, SolverError, SolverService};
use crate::domain::value_objects::{ColumnKind, NativeStatus, ObjectiveSense, RowSense};
use std::time::Instant;
use tracing::debug;

/// In-memory native session: model, last solution and the identity that
/// every handle it issues is tagged with
#[derive(Debug)]
pub struct NativeEnvironment {
    id: EnvId,
    model: NativeModel,
    solution: Option<Solution>,
}

impl NativeEnvironment {
    pub fn new() -> Self {
        Self::from_model(NativeModel::default())
    }

    pub fn from_model(model: NativeModel) -> Self {
        let id = EnvId::next();
        debug!(
            env = %id,
            columns = model.columns.len(),
            rows = model.rows.len(),
            "native environment created"
        );
        Self {
            id,
            model,
            solution: None,
        }
    }

    /// Import LP text into a fresh environment
    pub fn import_lp(source: &str) -> Result<Self> {
        Ok(Self::from_model(lp_format::read_lp(source)?))
    }

    pub fn export_lp(&self) -> Result<String> {
        lp_format::write_lp(&self.model)
    }

    pub fn id(&self) -> EnvId {
        self.id
    }

    pub fn model(&self) -> &NativeModel {
        &self.model
    }

    /// Reject handles issued by another environment
    pub fn check(&self, handle: &NativeRef, label: &str) -> Result<()> {
        if handle.env() != self.id {
            return Err(SolverError::ForeignHandle(label.to_string()));
        }
        Ok(())
    }

    /// Wrap an expression over this environment's columns in a handle
    pub fn bind(&self, expr: LinearExpr) -> Result<NativeRef> {
        if let Some(index) = expr.max_column() {
            if index >= self.model.columns.len() {
                return Err(SolverError::InvalidProblem(format!(
                    "Column {} does not exist in {}",
                    index, self.id
                )));
            }
        }
        Ok(NativeRef::new(self.id, expr))
    }

    pub fn column_ref(&self, index: usize) -> Result<NativeRef> {
        self.bind(LinearExpr::column(index))
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.model.column_index(name)
    }

    /// Add a column; a name already in use gets a numeric suffix
    pub fn add_column(
        &mut self,
        name: &str,
        kind: ColumnKind,
        lower_bound: f64,
        upper_bound: f64,
    ) -> (usize, NativeRef) {
        let mut unique = name.to_string();
        let mut suffix = 1;
        while self.model.column_index(&unique).is_some() {
            unique = format!("{name}_{suffix}");
            suffix += 1;
        }
        let index = self.model.columns.len();
        self.model
            .columns
            .push(Column::new(unique, kind, lower_bound, upper_bound));
        self.invalidate();
        (index, NativeRef::new(self.id, LinearExpr::column(index)))
    }

    pub fn constant(&self, value: f64) -> NativeRef {
        NativeRef::new(self.id, LinearExpr::constant_value(value))
    }

    pub fn sum(&self, first: &NativeRef, second: &NativeRef) -> NativeRef {
        NativeRef::new(self.id, first.expr().add(second.expr()))
    }

    pub fn negative(&self, value: &NativeRef) -> NativeRef {
        NativeRef::new(self.id, value.expr().scale(-1.0))
    }

    pub fn scale(&self, value: &NativeRef, factor: f64) -> NativeRef {
        NativeRef::new(self.id, value.expr().scale(factor))
    }

    /// Product of two handles, `None` if the result would not be linear
    pub fn product(&self, first: &NativeRef, second: &NativeRef) -> Option<NativeRef> {
        first
            .expr()
            .mul(second.expr())
            .map(|expr| NativeRef::new(self.id, expr))
    }

    pub fn add_row(&mut self, lhs: &NativeRef, sense: RowSense, rhs: &NativeRef) -> usize {
        let index = self.model.rows.len();
        let row = Row::between(format!("c{index}"), lhs.expr(), sense, rhs.expr());
        debug!(env = %self.id, row = row.name.as_str(), sense = sense.symbol(), "row added");
        self.model.rows.push(row);
        self.invalidate();
        index
    }

    pub fn set_objective(&mut self, sense: ObjectiveSense, expr: &NativeRef) {
        self.model.objective = Some(Objective {
            sense,
            expr: expr.expr().clone(),
        });
        self.invalidate();
    }

    pub fn clear_objective(&mut self) {
        self.model.objective = None;
        self.invalidate();
    }

    /// Drop every column, row and the objective
    pub fn clear(&mut self) {
        self.model = NativeModel::default();
        self.invalidate();
    }

    pub fn solve(&mut self, solver: &dyn SolverService) -> Result<NativeStatus> {
        let start_time = Instant::now();
        let mut solution = match solver.trivial_outcome(&self.model) {
            Some(solution) => solution,
            None => solver.solve(&self.model)?,
        };
        solution.statistics = SolverStatistics {
            solve_time_ms: start_time.elapsed().as_secs_f64() * 1000.0,
            num_columns: self.model.columns.len() as u32,
            num_rows: self.model.rows.len() as u32,
            num_integer_columns: self.model.num_integer_columns() as u32,
            num_binary_columns: self.model.num_binary_columns() as u32,
        };
        let status = solution.status;
        self.solution = Some(solution);
        Ok(status)
    }

    pub fn status(&self) -> NativeStatus {
        self.solution
            .as_ref()
            .map_or(NativeStatus::Unsolved, |s| s.status)
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    pub fn value(&self, handle: &NativeRef) -> Result<f64> {
        let solution = self
            .solution
            .as_ref()
            .filter(|s| s.has_values())
            .ok_or(SolverError::NoSolution(self.status()))?;
        handle
            .expr()
            .evaluate(&solution.column_values)
            .ok_or(SolverError::NoSolution(solution.status))
    }

    /// Release the environment; handles it issued become unusable.
    pub fn release(self) {
        debug!(env = %self.id, "native environment released");
    }

    // A changed model makes the previous solution meaningless
    fn invalidate(&mut self) {
        self.solution = None;
    }
}

impl Default for NativeEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
