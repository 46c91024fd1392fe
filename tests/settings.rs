mod common;

use std::collections::HashMap;

use bitemporal::BitemporalError;
use bitemporal::clock::ManualClock;
use bitemporal::entity::Record;
use bitemporal::manager::BitemporalManager;
use bitemporal::settings::{Settings, TransitionPolicy};
use common::day;

#[test]
fn defaults_require_live_version_for_delete() {
    let settings = Settings::default();
    assert!(settings.transitions.require_live_for_delete);
    assert_eq!(settings.transitions, TransitionPolicy::default());
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let settings = Settings::load("bitemporal_settings_that_do_not_exist").expect("settings");
    assert!(settings.transitions.require_live_for_delete);
}

#[test]
fn file_overrides_defaults() {
    let path = std::env::temp_dir().join("bitemporal_settings_test.toml");
    std::fs::write(&path, "[transitions]\nrequire_live_for_delete = false\n").expect("write");
    let settings = Settings::load(path.to_str().unwrap()).expect("settings");
    let _ = std::fs::remove_file(&path);
    assert!(!settings.transitions.require_live_for_delete);

    // the relaxed policy reaches the manager
    let manager = BitemporalManager::from_settings(ManualClock::new(day(5)), &settings);
    let t = manager
        .update(Record::initial(1u32, "Nick".to_string(), day(1)), day(11), |_| {})
        .expect("update ok");
    assert!(manager.delete(t.expired, day(8)).is_ok());
}

#[test]
fn malformed_file_is_a_config_error() {
    let path = std::env::temp_dir().join("bitemporal_settings_broken.toml");
    std::fs::write(&path, "[transitions]\nrequire_live_for_delete = \"sometimes\"\n").expect("write");
    let result = Settings::load(path.to_str().unwrap());
    let _ = std::fs::remove_file(&path);
    assert!(matches!(result, Err(BitemporalError::Config(_))));
}

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn environment_overrides_defaults() {
    let settings = Settings::load_with_vars(
        "bitemporal_settings_that_do_not_exist",
        vars(&[("BITEMPORAL__TRANSITIONS__REQUIRE_LIVE_FOR_DELETE", "false")]),
    )
    .expect("settings");
    assert!(!settings.transitions.require_live_for_delete);
}

#[test]
fn environment_overrides_file() {
    let path = std::env::temp_dir().join("bitemporal_settings_layered.toml");
    std::fs::write(&path, "[transitions]\nrequire_live_for_delete = false\n").expect("write");
    let settings = Settings::load_with_vars(
        path.to_str().unwrap(),
        vars(&[("BITEMPORAL__TRANSITIONS__REQUIRE_LIVE_FOR_DELETE", "true")]),
    );
    let _ = std::fs::remove_file(&path);
    assert!(settings.expect("settings").transitions.require_live_for_delete);
}

#[test]
fn unrelated_variables_are_ignored() {
    let settings = Settings::load_with_vars(
        "bitemporal_settings_that_do_not_exist",
        vars(&[("OTHER__TRANSITIONS__REQUIRE_LIVE_FOR_DELETE", "false")]),
    )
    .expect("settings");
    assert_eq!(settings, Settings::default());
}
