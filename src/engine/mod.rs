pub mod presence;
pub mod proximity;
pub mod retention;
pub mod snapshot;
