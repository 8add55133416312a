//! Loading configuration files from disk

use std::path::Path;

use assert_matches::assert_matches;
use diskwatch::{
    config::{ConfigError, read_config_file},
    runner::{Outcome, execute},
};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::helpers::*;

#[test]
fn test_missing_config_exits_with_two_before_sampling() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let sampler = TableSampler::new(&[("/", 99.0)]);

    let mut out: Vec<u8> = Vec::new();
    let outcome = execute(&path, true, &sampler, |_, _| Ok(()), &mut out);

    assert_eq!(outcome, Outcome::ConfigFailed);
    assert_eq!(outcome.code(), 2);
    assert!(sampler.sampled.borrow().is_empty());
    assert!(out.is_empty());
}

#[test]
fn test_malformed_config_exits_with_two() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut file, b"{ \"paths\": [\"/\"").unwrap();
    let sampler = TableSampler::new(&[("/", 99.0)]);

    assert_matches!(
        read_config_file(file.path()),
        Err(ConfigError::Parse { .. })
    );
    assert_eq!(
        execute(file.path(), false, &sampler, |_, _| Ok(()), &mut Vec::<u8>::new()),
        Outcome::ConfigFailed
    );
}

#[test]
fn test_missing_config_message_names_the_file() {
    let error = read_config_file(Path::new("/nonexistent/diskwatch.json")).unwrap_err();
    assert_eq!(
        error.to_string(),
        "config not found: /nonexistent/diskwatch.json"
    );
}

#[test]
fn test_nested_sections_merge_from_file() {
    let file = create_config_file(&json!({
        "threshold_percent": 70.5,
        "smtp": { "host": "relay.internal", "use_tls": false },
        "mail": { "from": "disk@internal" }
    }));

    let config = read_config_file(file.path()).unwrap();

    assert_eq!(config.threshold_percent, 70.5);
    assert_eq!(config.paths, vec!["/".to_string()]);
    assert_eq!(config.check_interval_minutes, 10.0);
    assert_eq!(config.smtp.host, "relay.internal");
    assert!(!config.smtp.use_tls);
    assert_eq!(config.smtp.port, 587);
    assert_eq!(config.mail.from, "disk@internal");
    assert_eq!(config.mail.to, vec!["admin@example.com".to_string()]);
    assert_eq!(config.mail.subject_prefix, "[ALERTA DISCO]");
    assert!(!config.dry_run);
}

#[test]
fn test_null_section_exits_with_two() {
    for section in ["smtp", "mail"] {
        let file = create_config_file(&json!({ "paths": ["/"], section: null }));
        let sampler = TableSampler::new(&[("/", 99.0)]);

        assert_matches!(
            read_config_file(file.path()),
            Err(ConfigError::Parse { .. })
        );
        assert_eq!(
            execute(file.path(), true, &sampler, |_, _| Ok(()), &mut Vec::<u8>::new()),
            Outcome::ConfigFailed
        );
    }
}
