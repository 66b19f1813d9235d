pub mod fixtures;
pub mod probe;

pub use fixtures::*;
pub use probe::ProbeStore;
