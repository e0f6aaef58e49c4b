#![allow(missing_docs)]

use ndtile::config::{global_config, global_config_mut, Config};
use ndtile::partitioner::PartitionerOptions;
use serial_test::serial;

#[test]
fn config_from_partial_json() {
    let config: Config = serde_json::from_str(r#"{"memory_budget": 1024}"#).unwrap();
    assert_eq!(config.memory_budget(), 1024);
    assert_eq!(config.memory_budget_var(), Config::default().memory_budget_var());

    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(
        json,
        r#"{"memory_budget":1024,"memory_budget_var":10737418240,"multi_range_reduction_in_split":0.3}"#
    );
    assert_eq!(serde_json::from_str::<Config>(&json).unwrap(), config);
}

#[test]
#[serial]
fn partitioner_options_follow_global_config() {
    let original = global_config().clone();
    global_config_mut()
        .set_memory_budget(64)
        .set_memory_budget_var(128)
        .set_multi_range_reduction_in_split(0.5);
    let options = PartitionerOptions::default();
    *global_config_mut() = original;

    assert_eq!(options.memory_budget(), 64);
    assert_eq!(options.memory_budget_var(), 128);
    assert!((options.multi_range_reduction_in_split() - 0.5).abs() < f64::EPSILON);
}

#[test]
#[serial]
fn partitioner_options_override_global_config() {
    let options = PartitionerOptions::default().with_memory_budget(1);
    assert_eq!(options.memory_budget(), 1);
    assert_eq!(
        options.memory_budget_var(),
        global_config().memory_budget_var()
    );
}
