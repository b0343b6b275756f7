use std::io::Write;

use crate::config::ReplicaConfig;
use crate::config::ReplicationConfig;

#[test]
fn test_default_values() {
    let config = ReplicaConfig::default();
    assert_eq!(config.replication.cached_requests, 1024);
    assert_eq!(config.replication.drain_poll_interval_ms, 50);
}

#[test]
fn test_validate_accepts_defaults() {
    let config = ReplicaConfig::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_zero_cached_requests() {
    let config = ReplicaConfig {
        replication: ReplicationConfig {
            cached_requests: 0,
            ..Default::default()
        },
    };
    let result = config.validate();
    assert!(result.is_err());
    let message = format!("{:?}", result.err());
    assert!(
        message.contains("cached_requests"),
        "error should name the offending field, got: {message}"
    );
}

#[test]
fn test_validate_rejects_zero_drain_interval() {
    let config = ReplicaConfig {
        replication: ReplicationConfig {
            drain_poll_interval_ms: 0,
            ..Default::default()
        },
    };
    assert!(config.validate().is_err());
}

/// Test: file override replaces only the fields it names
///
/// Scenario: a TOML override sets cached_requests
/// Expected: cached_requests comes from the file, everything else keeps its
/// default
#[test]
fn test_with_override_config_from_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    writeln!(file, "[replication]\ncached_requests = 4").expect("write config");

    let config = ReplicaConfig::default()
        .with_override_config(file.path())
        .expect("override should load")
        .validate()
        .expect("overridden config should validate");

    assert_eq!(config.replication.cached_requests, 4);
    assert_eq!(config.replication.drain_poll_interval_ms, 50);
}
