//! Report module - plots, HTML assembly, exports and the run summary

pub mod artifacts;
pub mod export;
pub mod html;
pub mod statistics;
pub mod summary;

pub use artifacts::*;
pub use export::*;
pub use html::*;
pub use statistics::*;
pub use summary::*;
