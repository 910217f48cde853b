// Domain module: variable domains, handles, errors and the backend contract

pub mod models;
pub mod solver_service;
pub mod value_objects;
pub mod variable;

pub use models::*;
pub use solver_service::*;
pub use value_objects::*;
pub use variable::Variable;
