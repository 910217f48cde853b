//! Session adapter: owns the native environment and the name table, runs the
//! lowering functions and maps native results back to callers.

use super::lowering;
use super::persistence::{ModelMetadata, RemapTable};
use crate::domain::{
    models::{SaveFileSettings, SessionSettings, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{Domain, NativeStatus, SolutionStatus},
    Variable,
};
use crate::infrastructure::files;
use crate::native::{EnvId, NativeEnvironment, NativeModel};
use crate::solver::SolverFactory;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Column map from an environment replaced by `load_model` to its successor
struct Rehydration {
    from: EnvId,
    remap: RemapTable,
}

/// Owner of one native environment.
///
/// Variables handed out by a session are only valid with that session and
/// only until it is disposed. Disposal happens at most once, either through
/// [`Session::dispose`] or on drop.
pub struct Session {
    env: Option<NativeEnvironment>,
    solver: Arc<dyn SolverService>,
    settings: SessionSettings,
    variables: HashMap<String, Variable>,
    has_goal: bool,
    goal_name: Option<String>,
    next_name_id: usize,
    next_expression_id: usize,
    rehydration: Option<Rehydration>,
}

impl Session {
    /// Session with default settings and the default backend
    pub fn new() -> Self {
        Self::open(SessionSettings::default(), SolverFactory::default_solver())
    }

    pub fn with_settings(settings: SessionSettings) -> Result<Self> {
        settings.validate()?;
        let solver = SolverFactory::create_from_backend(settings.backend)?;
        Ok(Self::open(settings, solver))
    }

    pub fn with_solver(settings: SessionSettings, solver: Arc<dyn SolverService>) -> Result<Self> {
        settings.validate()?;
        Ok(Self::open(settings, solver))
    }

    fn open(settings: SessionSettings, solver: Arc<dyn SolverService>) -> Self {
        let env = NativeEnvironment::new();
        info!(env = %env.id(), solver = solver.name(), "session opened");
        Self {
            env: Some(env),
            solver,
            settings,
            variables: HashMap::new(),
            has_goal: false,
            goal_name: None,
            next_name_id: 0,
            next_expression_id: 0,
            rehydration: None,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn solver_name(&self) -> &str {
        self.solver.name()
    }

    fn env(&self) -> Result<&NativeEnvironment> {
        self.env.as_ref().ok_or(SolverError::Disposed)
    }

    fn env_mut(&mut self) -> Result<&mut NativeEnvironment> {
        self.env.as_mut().ok_or(SolverError::Disposed)
    }

    fn next_native_name(&mut self) -> String {
        let name = format!("{}{}", self.settings.variable_prefix, self.next_name_id);
        self.next_name_id += 1;
        name
    }

    fn next_expression_name(&mut self) -> String {
        let name = format!("expr_{}", self.next_expression_id);
        self.next_expression_id += 1;
        name
    }

    // Create

    /// New column named `name`. A name already in the table is rebound to the
    /// new column; the previous variable and its column stay usable.
    ///
    /// Constant domains are rejected with `MissingConstantValue`, since a
    /// fresh column has no value yet. Build constants with
    /// [`Session::from_constant`] or pin a column with [`Session::set_equal`].
    pub fn create(&mut self, name: impl Into<String>, domain: Domain) -> Result<Variable> {
        let name = name.into();
        self.env()?;
        let native_name = self.next_native_name();
        let variable = lowering::create_column(self.env_mut()?, domain, name, &native_name, None)?;
        self.register(variable.clone());
        Ok(variable)
    }

    /// New column whose name is generated from the session counter
    pub fn create_anonymous(&mut self, domain: Domain) -> Result<Variable> {
        self.env()?;
        let native_name = self.next_native_name();
        let variable = lowering::create_column(
            self.env_mut()?,
            domain,
            native_name.clone(),
            &native_name,
            None,
        )?;
        self.register(variable.clone());
        Ok(variable)
    }

    fn register(&mut self, variable: Variable) {
        let name = variable.name().to_string();
        if let Some(previous) = self.variables.insert(name, variable) {
            warn!(
                name = previous.name(),
                previous_index = ?previous.persistence_index(),
                "variable name reused, table entry rebound"
            );
        }
    }

    pub fn from_constant(&mut self, value: f64, domain: Domain) -> Result<Variable> {
        self.env()?;
        let name = self.next_expression_name();
        lowering::from_constant(self.env()?, value, domain, name)
    }

    pub fn from_integer(&mut self, value: i32, domain: Domain) -> Result<Variable> {
        self.from_constant(f64::from(value), domain)
    }

    // Operations

    pub fn sum(&mut self, first: &Variable, second: &Variable, domain: Domain) -> Result<Variable> {
        self.env()?;
        let name = self.next_expression_name();
        lowering::sum(self.env()?, first, second, domain, name)
    }

    pub fn negate(&mut self, variable: &Variable, domain: Domain) -> Result<Variable> {
        self.env()?;
        let name = self.next_expression_name();
        lowering::negate(self.env()?, variable, domain, name)
    }

    pub fn multiply_by_constant(
        &mut self,
        variable: &Variable,
        constant: &Variable,
        domain: Domain,
    ) -> Result<Variable> {
        self.env()?;
        let name = self.next_expression_name();
        lowering::multiply_by_constant(self.env()?, variable, constant, domain, name)
    }

    pub fn divide_by_constant(
        &mut self,
        variable: &Variable,
        constant: &Variable,
        domain: Domain,
    ) -> Result<Variable> {
        self.env()?;
        let name = self.next_expression_name();
        lowering::divide_by_constant(self.env()?, variable, constant, domain, name)
    }

    // Constraints

    pub fn set_less_or_equal(&mut self, variable: &Variable, bound: &Variable) -> Result<()> {
        lowering::set_less_or_equal(self.env_mut()?, variable, bound)
    }

    pub fn set_greater_or_equal(&mut self, variable: &Variable, bound: &Variable) -> Result<()> {
        lowering::set_greater_or_equal(self.env_mut()?, variable, bound)
    }

    /// Equality row. A value known on one side is copied to the other side,
    /// in the caller's variables and in the name table.
    pub fn set_equal(&mut self, variable: &mut Variable, bound: &mut Variable) -> Result<()> {
        lowering::set_equal(self.env_mut()?, variable, bound)?;
        self.sync_entry(variable);
        self.sync_entry(bound);
        Ok(())
    }

    fn sync_entry(&mut self, variable: &Variable) {
        if let Some(entry) = self.variables.get_mut(variable.name()) {
            if entry.native() == variable.native() {
                *entry = variable.clone();
            }
        }
    }

    // Goal

    /// Maximize `expression`; a later goal replaces the previous one
    pub fn add_goal(&mut self, name: impl Into<String>, expression: &Variable) -> Result<()> {
        let name = name.into();
        lowering::add_goal(self.env_mut()?, expression)?;
        if self.has_goal {
            debug!(previous = ?self.goal_name, goal = name.as_str(), "goal replaced");
        }
        self.has_goal = true;
        self.goal_name = Some(name);
        Ok(())
    }

    pub fn has_goal(&self) -> bool {
        self.has_goal
    }

    pub fn goal_name(&self) -> Option<&str> {
        self.goal_name.as_deref()
    }

    pub fn goal_expression(&self) -> Result<Variable> {
        self.env()?;
        Err(SolverError::NotImplemented("goal expression introspection"))
    }

    pub fn save_solver_data(&self, _path: &Path) -> Result<()> {
        self.env()?;
        Err(SolverError::NotImplemented("solver state export"))
    }

    // Lookup

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn get_by_name(&self, name: &str) -> Result<Variable> {
        self.env()?;
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| SolverError::UnknownVariable(name.to_string()))
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn model(&self) -> Result<&NativeModel> {
        Ok(self.env()?.model())
    }

    // Solve

    pub fn solve(&mut self) -> Result<SolutionStatus> {
        let solver = Arc::clone(&self.solver);
        let env = self.env_mut()?;
        let native = env.solve(solver.as_ref())?;
        let status = SolutionStatus::from(native);

        if let Some(solution) = env.solution() {
            let stats = &solution.statistics;
            info!(
                solver = solver.name(),
                %status,
                native = ?native,
                time_ms = stats.solve_time_ms,
                columns = stats.num_columns,
                rows = stats.num_rows,
                integer_columns = stats.num_integer_columns,
                "solve finished"
            );
            if !solution.has_values() {
                warn!(%status, message = solution.message.as_str(), "solve produced no solution");
            }
        }
        Ok(status)
    }

    pub fn status(&self) -> Result<SolutionStatus> {
        Ok(SolutionStatus::from(self.native_status()?))
    }

    pub fn native_status(&self) -> Result<NativeStatus> {
        Ok(self.env()?.status())
    }

    /// Value of `variable` in the last solution
    pub fn value(&self, variable: &Variable) -> Result<f64> {
        let env = self.env()?;
        env.check(variable.native(), variable.name())?;
        env.value(variable.native())
    }

    pub fn objective_value(&self) -> Result<Option<f64>> {
        Ok(self.env()?.solution().and_then(|s| s.objective_value))
    }

    pub fn statistics(&self) -> Result<Option<&SolverStatistics>> {
        Ok(self.env()?.solution().map(|s| &s.statistics))
    }

    // Persistence

    /// Write the model as LP text plus the metadata side channel
    pub fn save_model(&self, settings: &SaveFileSettings) -> Result<()> {
        let env = self.env()?;
        let lp_text = env.export_lp()?;
        let metadata = ModelMetadata::capture(
            env.model(),
            self.has_goal,
            self.goal_name(),
            self.variables.values(),
        );

        files::write_model(&settings.model_path, &lp_text)?;
        files::write_metadata(&settings.metadata_path(), &metadata)?;
        info!(
            path = %settings.model_path.display(),
            columns = metadata.columns.len(),
            variables = metadata.variables.len(),
            has_goal = metadata.has_goal,
            "model saved"
        );
        Ok(())
    }

    /// Replace the current model with a saved one.
    ///
    /// The name table is rebuilt from the metadata. Variables obtained before
    /// the load can be carried over with [`Session::rehydrate`]. On error the
    /// session keeps its current model.
    pub fn load_model(&mut self, settings: &SaveFileSettings) -> Result<()> {
        self.env()?;
        let lp_text = files::read_model(&settings.model_path)?;
        let metadata = files::read_metadata(&settings.metadata_path())?;

        let mut fresh = NativeEnvironment::import_lp(&lp_text)?;
        if !metadata.has_goal {
            fresh.clear_objective();
        }

        let remap = RemapTable::build(&metadata.columns, &fresh);
        let mut variables = HashMap::with_capacity(metadata.variables.len());
        for record in &metadata.variables {
            let index = remap.index(record.persistence_index)?;
            let variable = Variable::new(
                record.domain,
                fresh.column_ref(index)?,
                record.name.clone(),
                record.precomputed_value,
                Some(index),
            );
            variables.insert(record.name.clone(), variable);
        }

        let loaded_ids = fresh
            .model()
            .columns
            .iter()
            .filter_map(|c| c.name.strip_prefix(self.settings.variable_prefix.as_str()))
            .filter_map(|suffix| suffix.parse::<usize>().ok())
            .map(|id| id + 1)
            .max()
            .unwrap_or(0);

        let fresh_id = fresh.id();
        self.rehydration = self.env.as_ref().map(|old| {
            let old_columns: Vec<String> =
                old.model().columns.iter().map(|c| c.name.clone()).collect();
            Rehydration {
                from: old.id(),
                remap: RemapTable::build(&old_columns, &fresh),
            }
        });
        if let Some(mut old) = self.env.replace(fresh) {
            let old_id = old.id();
            old.clear();
            old.release();
            self.solver.release(old_id);
        }
        self.variables = variables;
        self.has_goal = metadata.has_goal;
        self.goal_name = if metadata.has_goal { metadata.goal_name } else { None };
        self.next_name_id = self.next_name_id.max(loaded_ids);

        info!(
            path = %settings.model_path.display(),
            env = %fresh_id,
            variables = self.variables.len(),
            has_goal = self.has_goal,
            "model loaded"
        );
        Ok(())
    }

    /// Re-bind a variable created before the last `load_model` to the
    /// reloaded environment. Variables already bound to it are returned as is.
    pub fn rehydrate(&self, variable: &Variable) -> Result<Variable> {
        let env = self.env()?;
        if variable.native().env() == env.id() {
            return Ok(variable.clone());
        }
        let rehydration = self
            .rehydration
            .as_ref()
            .filter(|r| r.from == variable.native().env())
            .ok_or_else(|| SolverError::ForeignHandle(variable.name().to_string()))?;

        let expr = rehydration.remap.expr(variable.native().expr())?;
        let index = variable
            .persistence_index()
            .map(|index| rehydration.remap.index(index))
            .transpose()?;
        debug!(name = variable.name(), ?index, "variable rehydrated");
        Ok(variable.rebind(env.bind(expr)?, index))
    }

    // Lifecycle

    /// Release the native environment. Returns `true` only for the call that
    /// actually released it.
    pub fn dispose(&mut self) -> bool {
        match self.env.take() {
            Some(mut env) => {
                let id = env.id();
                env.clear();
                env.release();
                self.solver.release(id);
                self.variables.clear();
                self.rehydration = None;
                info!(env = %id, "session disposed");
                true
            }
            None => false,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.env.is_none()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("env", &self.env.as_ref().map(NativeEnvironment::id))
            .field("solver", &self.solver.name())
            .field("variables", &self.variables.len())
            .field("has_goal", &self.has_goal)
            .field("goal_name", &self.goal_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_follow_the_counter() {
        let mut session = Session::new();
        let a = session.create_anonymous(Domain::AnyInteger).unwrap();
        let b = session.create("b", Domain::AnyInteger).unwrap();
        let c = session.create_anonymous(Domain::AnyInteger).unwrap();

        assert_eq!(a.name(), "x_0");
        assert_eq!(b.name(), "b");
        assert_eq!(c.name(), "x_2");
        let columns: Vec<&str> = session
            .model()
            .unwrap()
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(columns, ["x_0", "x_1", "x_2"]);
    }

    #[test]
    fn prefix_comes_from_settings() {
        let settings = SessionSettings::default().with_variable_prefix("v");
        let mut session = Session::with_settings(settings).unwrap();
        let v = session.create_anonymous(Domain::AnyReal).unwrap();
        assert_eq!(v.name(), "v0");
    }

    #[test]
    fn set_equal_updates_the_name_table() {
        let mut session = Session::new();
        let mut x = session.create("x", Domain::AnyInteger).unwrap();
        let mut five = session.from_integer(5, Domain::AnyConstantInteger).unwrap();

        session.set_equal(&mut x, &mut five).unwrap();
        assert_eq!(x.precomputed_value(), Some(5.0));
        assert_eq!(session.variable("x").unwrap().precomputed_value(), Some(5.0));
    }

    #[test]
    fn goal_name_is_tracked() {
        let mut session = Session::new();
        let x = session.create("x", Domain::PositiveOrZeroInteger).unwrap();
        assert!(!session.has_goal());

        session.add_goal("first", &x).unwrap();
        session.add_goal("second", &x).unwrap();
        assert!(session.has_goal());
        assert_eq!(session.goal_name(), Some("second"));
    }

    #[test]
    fn constant_domains_cannot_back_a_fresh_column() {
        let mut session = Session::new();
        assert!(matches!(
            session.create("k", Domain::AnyConstantInteger),
            Err(SolverError::MissingConstantValue { .. })
        ));
        assert!(session.create_anonymous(Domain::PositiveOrZeroConstantReal).is_err());
        assert!(session.variable("k").is_none());
    }

    #[test]
    fn invalid_prefix_is_rejected_up_front() {
        let settings = SessionSettings::default().with_variable_prefix("");
        assert!(matches!(
            Session::with_settings(settings.clone()),
            Err(SolverError::InvalidProblem(_))
        ));
        assert!(Session::with_solver(settings, SolverFactory::default_solver()).is_err());
    }

    #[test]
    fn unknown_names_are_reported() {
        let session = Session::new();
        assert!(session.variable("nope").is_none());
        assert!(matches!(
            session.get_by_name("nope"),
            Err(SolverError::UnknownVariable(name)) if name == "nope"
        ));
    }

    #[test]
    fn variables_from_another_session_are_rejected() {
        let mut first = Session::new();
        let mut second = Session::new();
        let x = first.create("x", Domain::AnyReal).unwrap();
        let y = second.create("y", Domain::AnyReal).unwrap();

        assert!(matches!(
            second.set_less_or_equal(&y, &x),
            Err(SolverError::ForeignHandle(name)) if name == "x"
        ));
        assert!(matches!(second.rehydrate(&x), Err(SolverError::ForeignHandle(_))));
    }
}
