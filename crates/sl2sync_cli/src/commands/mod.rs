//! CLI command implementations.

pub mod preview;
pub mod remote;
pub mod status;
pub mod sync;
