// Solver adapters module

pub mod factory;
pub mod good_lp_solver;
#[cfg(feature = "highs")]
pub mod highs_solver;

pub use factory::SolverFactory;
pub use good_lp_solver::{GoodLpEngine, GoodLpSolver};
#[cfg(feature = "highs")]
pub use highs_solver::HighsSolver;
