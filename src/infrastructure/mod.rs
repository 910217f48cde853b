pub mod files;
pub mod logging;

pub use logging::init_tracing;
