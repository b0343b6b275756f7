//! Configuration for the follower replication core.
//!
//! Hierarchical loading with deferred validation:
//! 1. Default values from code implementation
//! 2. Configuration file specified by `CONFIG_PATH`
//! 3. Environment variables with `REPLICA__` prefix (highest priority)

mod replication;

use std::env;
use std::fmt::Debug;
use std::path::Path;

use config::Config;
use config::Environment;
use config::File;
pub use replication::*;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

#[cfg(test)]
mod config_test;

/// Main configuration container for the replica's components.
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct ReplicaConfig {
    /// Ingress queue sizing and stop-drain behaviour
    #[serde(default)]
    pub replication: ReplicationConfig,
}

impl Debug for ReplicaConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ReplicaConfig")
            .field("replication", &self.replication)
            .finish()
    }
}

impl ReplicaConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Callers MUST call [`validate`](Self::validate) before using the
    /// configuration; validation is deferred so runtime overrides can still
    /// be applied via [`with_override_config`](Self::with_override_config).
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("REPLICA")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from a file without
    /// validation.
    pub fn with_override_config<P: AsRef<Path>>(
        self,
        path: P,
    ) -> Result<Self> {
        let builder = Config::builder()
            .add_source(Config::try_from(&self)?)
            .add_source(File::from(path.as_ref()).required(true));

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validates every component section, consuming and returning the
    /// configuration so loading chains read naturally.
    pub fn validate(self) -> Result<Self> {
        self.replication.validate()?;
        Ok(self)
    }
}
