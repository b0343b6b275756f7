//! Shared components between unit tests and downstream integration tests.

mod common;
mod entry_builder;
mod mock;

pub use common::*;
pub use entry_builder::*;
pub use mock::*;
