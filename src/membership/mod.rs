mod config_state;
mod reconciler;
mod replica_state;

pub use config_state::*;
pub use reconciler::*;
pub use replica_state::*;

#[cfg(test)]
mod reconciler_test;
