// Domain layer: variable domains, the variable handle, solver contract
pub mod domain;

// Native layer: in-process linear model, expressions and the LP file format
pub mod native;

// Application layer: operation lowering, session adapter, persistence
pub mod application;

// Infrastructure layer: logging and file IO
pub mod infrastructure;

// Solver adapters: concrete implementations of SolverService
pub mod solver;

// Re-export commonly used types
pub use domain::{
    Domain, NativeStatus, Result, SaveFileSettings, SessionSettings, Solution, SolutionStatus,
    SolverBackend, SolverError, SolverService, SolverStatistics, Variable,
};

pub use application::Session;

pub use infrastructure::init_tracing;

pub use native::NativeModel;

pub use solver::{GoodLpSolver, SolverFactory};

#[cfg(feature = "highs")]
pub use solver::HighsSolver;
