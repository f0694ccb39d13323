//! Pipeline module - the stages and the workspace that sequences them

pub mod analysis;
pub mod cleaning;
pub mod correlation;
pub mod error;
pub mod loader;
pub mod ranking;
pub mod sorting;
pub mod workspace;

pub use analysis::*;
pub use cleaning::*;
pub use correlation::*;
pub use error::*;
pub use loader::*;
pub use ranking::*;
pub use sorting::*;
pub use workspace::*;
