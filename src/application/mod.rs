// Application layer: the session adapter and the lowering it drives

pub mod lowering;
pub mod persistence;
pub mod session;

pub use persistence::{ModelMetadata, RemapTable, VariableRecord};
pub use session::Session;
