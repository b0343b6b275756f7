mod processor;
mod queue;

pub(crate) use processor::*;
pub use queue::*;
