//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod check;
mod read_store;

pub use check::Check;
pub use read_store::ReadStore;
