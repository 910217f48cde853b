use milpkit::{
    Domain, NativeModel, NativeStatus, Session, SessionSettings, Solution, SolutionStatus,
    SolverError, SolverService, Variable,
};
use milpkit::native::EnvId;
use milpkit::GoodLpSolver;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const EPS: f64 = 1e-6;

/// Backend that reports a fixed status with every column at 1.0
struct FixedStatusSolver(NativeStatus);

impl SolverService for FixedStatusSolver {
    fn solve(&self, model: &NativeModel) -> milpkit::Result<Solution> {
        let mut solution = Solution::new(self.0, "fixed");
        if self.0.has_solution() {
            solution.column_values = vec![1.0; model.columns.len()];
        }
        Ok(solution)
    }

    fn name(&self) -> &str {
        "fixed"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}

/// microlp backend that counts released environments
#[derive(Default)]
struct CountingSolver {
    inner: GoodLpSolver,
    released: AtomicUsize,
}

impl SolverService for CountingSolver {
    fn solve(&self, model: &NativeModel) -> milpkit::Result<Solution> {
        self.inner.solve(model)
    }

    fn release(&self, _env: EnvId) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn supports_mip(&self) -> bool {
        self.inner.supports_mip()
    }
}

fn weighted_sum(session: &mut Session, terms: &[(&Variable, i32)]) -> Variable {
    let mut total = session.from_integer(0, Domain::AnyConstantInteger).unwrap();
    for (variable, coefficient) in terms {
        let factor = session.from_integer(*coefficient, Domain::AnyConstantInteger).unwrap();
        let term = session
            .multiply_by_constant(variable, &factor, Domain::AnyInteger)
            .unwrap();
        total = session.sum(&total, &term, Domain::AnyInteger).unwrap();
    }
    total
}

#[test]
fn knapsack_reaches_its_optimum() {
    let mut session = Session::new();
    let items = [
        ("tent", 7, 150),
        ("stove", 3, 90),
        ("food", 4, 120),
        ("water", 5, 100),
        ("camera", 2, 80),
    ];

    let picks: Vec<Variable> = items
        .iter()
        .map(|(name, _, _)| session.create(*name, Domain::BinaryInteger).unwrap())
        .collect();
    let weights: Vec<(&Variable, i32)> = picks
        .iter()
        .zip(&items)
        .map(|(p, (_, w, _))| (p, *w))
        .collect();
    let values: Vec<(&Variable, i32)> = picks
        .iter()
        .zip(&items)
        .map(|(p, (_, _, v))| (p, *v))
        .collect();

    let weight = weighted_sum(&mut session, &weights);
    let value = weighted_sum(&mut session, &values);
    let capacity = session.from_integer(15, Domain::AnyConstantInteger).unwrap();
    session.set_less_or_equal(&weight, &capacity).unwrap();
    session.add_goal("value", &value).unwrap();

    assert_eq!(session.solve().unwrap(), SolutionStatus::Optimal);
    assert!((session.value(&value).unwrap() - 390.0).abs() < EPS);
    assert!((session.objective_value().unwrap().unwrap() - 390.0).abs() < EPS);

    let taken: Vec<f64> = picks.iter().map(|p| session.value(p).unwrap().round()).collect();
    assert_eq!(taken, [0.0, 1.0, 1.0, 1.0, 1.0]);

    let stats = session.statistics().unwrap().unwrap();
    assert_eq!(stats.num_columns, 5);
    assert_eq!(stats.num_binary_columns, 5);
    assert_eq!(stats.num_rows, 1);
}

#[test]
fn duplicate_names_rebind_the_table() {
    let mut session = Session::new();
    let first = session.create("x", Domain::PositiveOrZeroInteger).unwrap();
    let second = session.create("x", Domain::PositiveOrZeroInteger).unwrap();

    assert_eq!(session.get_by_name("x").unwrap(), second);
    assert_ne!(first.persistence_index(), second.persistence_index());

    // x_first <= 3, x_second <= 5, maximize both
    let three = session.from_integer(3, Domain::AnyConstantInteger).unwrap();
    let five = session.from_integer(5, Domain::AnyConstantInteger).unwrap();
    session.set_less_or_equal(&first, &three).unwrap();
    session.set_less_or_equal(&second, &five).unwrap();
    let both = session.sum(&first, &second, Domain::AnyInteger).unwrap();
    session.add_goal("both", &both).unwrap();

    assert_eq!(session.solve().unwrap(), SolutionStatus::Optimal);
    assert!((session.value(&first).unwrap() - 3.0).abs() < EPS);
    assert!((session.value(&second).unwrap() - 5.0).abs() < EPS);
}

#[test]
fn dispose_releases_once() {
    let mut session = Session::new();
    let x = session.create("x", Domain::AnyReal).unwrap();

    assert!(session.dispose());
    assert!(!session.dispose());
    assert!(session.is_disposed());

    assert!(matches!(session.create("y", Domain::AnyReal), Err(SolverError::Disposed)));
    assert!(matches!(session.solve(), Err(SolverError::Disposed)));
    assert!(matches!(session.value(&x), Err(SolverError::Disposed)));
    assert!(matches!(session.add_goal("g", &x), Err(SolverError::Disposed)));
    assert!(session.variable("x").is_none());
}

#[test]
fn drop_releases_the_environment() {
    let solver = Arc::new(CountingSolver::default());
    {
        let mut session = Session::with_solver(SessionSettings::default(), solver.clone()).unwrap();
        let x = session.create("x", Domain::PositiveOrZeroInteger).unwrap();
        let two = session.from_integer(2, Domain::AnyConstantInteger).unwrap();
        session.set_less_or_equal(&x, &two).unwrap();
        session.add_goal("x", &x).unwrap();
        assert_eq!(session.solve().unwrap(), SolutionStatus::Optimal);
        assert_eq!(solver.released.load(Ordering::SeqCst), 0);
    }
    assert_eq!(solver.released.load(Ordering::SeqCst), 1);

    // An explicit dispose is not repeated on drop
    let mut session = Session::with_solver(SessionSettings::default(), solver.clone()).unwrap();
    assert!(session.dispose());
    drop(session);
    assert_eq!(solver.released.load(Ordering::SeqCst), 2);
}

#[test]
fn native_statuses_map_to_canonical_ones() {
    let cases = [
        (NativeStatus::Optimal, SolutionStatus::Optimal),
        (NativeStatus::Feasible, SolutionStatus::Feasible),
        (NativeStatus::Bounded, SolutionStatus::Feasible),
        (NativeStatus::Infeasible, SolutionStatus::Infeasible),
        (NativeStatus::Unbounded, SolutionStatus::Unbounded),
        (NativeStatus::InfeasibleOrUnbounded, SolutionStatus::Unbounded),
        (NativeStatus::Error, SolutionStatus::Unknown),
        (NativeStatus::Unknown, SolutionStatus::Unknown),
    ];

    for (native, expected) in cases {
        let solver = Arc::new(FixedStatusSolver(native));
        let mut session = Session::with_solver(SessionSettings::default(), solver).unwrap();
        let x = session.create("x", Domain::AnyReal).unwrap();

        assert_eq!(session.solve().unwrap(), expected, "native status {native:?}");
        assert_eq!(session.native_status().unwrap(), native);
        assert_eq!(session.value(&x).is_ok(), native.has_solution());
    }
}

#[test]
fn value_before_solve_is_an_error() {
    let mut session = Session::new();
    let x = session.create("x", Domain::AnyReal).unwrap();
    assert_eq!(session.native_status().unwrap(), NativeStatus::Unsolved);
    assert_eq!(session.status().unwrap(), SolutionStatus::Unknown);
    assert!(matches!(
        session.value(&x),
        Err(SolverError::NoSolution(NativeStatus::Unsolved))
    ));
}

#[test]
fn unbounded_and_infeasible_models() {
    let mut session = Session::new();
    let x = session.create("x", Domain::PositiveOrZeroReal).unwrap();
    session.add_goal("grow", &x).unwrap();
    assert_eq!(session.solve().unwrap(), SolutionStatus::Unbounded);
    assert!(matches!(session.value(&x), Err(SolverError::NoSolution(_))));

    let mut session = Session::new();
    let y = session.create("y", Domain::AnyReal).unwrap();
    let one = session.from_constant(1.0, Domain::AnyConstantReal).unwrap();
    let two = session.from_constant(2.0, Domain::AnyConstantReal).unwrap();
    session.set_less_or_equal(&y, &one).unwrap();
    session.set_greater_or_equal(&y, &two).unwrap();
    assert_eq!(session.solve().unwrap(), SolutionStatus::Infeasible);
}

#[test]
fn division_and_equality_fold_constants() {
    let mut session = Session::new();
    let nine = session.from_constant(9.0, Domain::AnyConstantReal).unwrap();
    let four = session.from_constant(4.0, Domain::AnyConstantReal).unwrap();
    let quotient = session.divide_by_constant(&nine, &four, Domain::AnyConstantReal).unwrap();
    assert_eq!(quotient.precomputed_value(), Some(2.25));

    let mut x = session.create("x", Domain::AnyReal).unwrap();
    match session.divide_by_constant(&nine, &x, Domain::AnyReal) {
        Err(SolverError::OperandNotConstant { operand }) => assert_eq!(operand, "x"),
        other => panic!("expected OperandNotConstant, got {other:?}"),
    }

    let mut fixed = quotient.clone();
    session.set_equal(&mut x, &mut fixed).unwrap();
    assert_eq!(x.precomputed_value(), Some(2.25));
    assert_eq!(fixed.precomputed_value(), Some(2.25));

    assert_eq!(session.solve().unwrap(), SolutionStatus::Optimal);
    assert!((session.value(&x).unwrap() - 2.25).abs() < EPS);
}

#[test]
fn unimplemented_facilities_say_so() {
    let session = Session::new();
    assert!(matches!(session.goal_expression(), Err(SolverError::NotImplemented(_))));
    assert!(matches!(
        session.save_solver_data(Path::new("solver.dat")),
        Err(SolverError::NotImplemented(_))
    ));
}
