// Native layer: the engine-side model, handles and the LP interchange format

pub mod environment;
pub mod expr;
pub mod lp_format;
pub mod model;

pub use environment::NativeEnvironment;
pub use expr::{EnvId, LinearExpr, NativeRef};
pub use model::{Column, NativeModel, Objective, Row};
