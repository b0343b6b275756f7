use std::fmt::Debug;

use crate::storage::Journal;
use crate::workers::WorkerRegistry;

/// **This coding style learned from OpenRaft project type config.**
///
/// Binds the collaborator implementations a deployment wires into the
/// follower: the journal it replicates into and the registry its background
/// workers live in.
pub trait TypeConfig:
    Sync + Send + Sized + Debug + Clone + Copy + Default + Eq + PartialEq + Ord + PartialOrd + 'static
{
    type J: Journal;

    type W: WorkerRegistry;
}

pub mod alias {
    use super::TypeConfig;

    pub type JOF<T> = <T as TypeConfig>::J;

    pub type WOF<T> = <T as TypeConfig>::W;
}
