use gradebox::config::{Config, ConfigError};
use gradebox::{BatchRequest, BatchStatus, Grader, Manifest, ParamType, ParameterSpec, TestCase};

use super::{FIXTURES_PATH, init_tracing};

#[test]
fn test_load_valid_config() {
    let path = format!("{FIXTURES_PATH}/configs/valid_full.toml");
    let config = Config::from_file(&path).expect("Failed to load config");

    assert_eq!(config.entry_point, "solve");
    assert_eq!(config.runtime.name, "Python 3 (fixture)");
    assert_eq!(config.default_limits.wall_time_limit, Some(2.0));
    assert_eq!(config.default_limits.max_code_length, Some(4096));
}

#[test]
fn test_load_minimal_config() {
    let path = format!("{FIXTURES_PATH}/configs/valid_minimal.toml");
    let config = Config::from_file(&path).expect("Failed to load config");

    assert_eq!(config.entry_point, "execute");
    assert_eq!(config.runtime.command[1], "{driver}");
}

#[test]
fn test_load_invalid_entry_point() {
    let path = format!("{FIXTURES_PATH}/configs/invalid_entry_point.toml");
    assert!(matches!(Config::from_file(&path), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_load_invalid_command() {
    let path = format!("{FIXTURES_PATH}/configs/invalid_command.toml");
    assert!(matches!(Config::from_file(&path), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_load_missing_file() {
    let path = format!("{FIXTURES_PATH}/configs/does_not_exist.toml");
    assert!(matches!(Config::from_file(&path), Err(ConfigError::ReadFile { .. })));
}

#[tokio::test]
async fn test_configured_entry_point_is_invoked() {
    init_tracing();
    let path = format!("{FIXTURES_PATH}/configs/valid_full.toml");
    let grader = Grader::new(Config::from_file(&path).expect("Failed to load config"));

    let manifest = Manifest::new(vec![ParameterSpec::new("n", ParamType::Integer)]).unwrap();
    let request = BatchRequest::free_form(
        "def solve(n):\n    return n + 1\n",
        manifest,
        vec![TestCase::new(["1"], "2")],
    );

    let report = grader.grade(&request).await;

    assert_eq!(report.status, BatchStatus::Passed, "{report:#?}");
    assert_eq!(report.driver.as_deref(), Some("Python 3 (fixture)"));
}
