use std::env;
use std::sync::{Mutex, OnceLock};

use liftline_cli::commands::{ask, config, doctor};
use serde_json::Value;

#[test]
fn ask_fails_fast_when_config_is_invalid() {
    with_env(&[("LIFTLINE_NETWORK_MAX_TURNS", "0")], || {
        let result = ask::run("who won?", None);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "ask");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn ask_fails_fast_without_an_api_key() {
    with_env(&[], || {
        let result = ask::run("who won?", Some("t-cli".to_string()));
        assert_eq!(result.exit_code, 3, "expected llm configuration failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "ask");
        assert_eq!(payload["error_class"], "llm_not_configured");
    });
}

#[test]
fn config_lists_effective_values_and_redacts_the_api_key() {
    with_env(&[("LIFTLINE_LLM_API_KEY", "sk-test")], || {
        let output = config::run();

        assert!(output.contains("store.table = powerlifting-records"));
        assert!(output.contains("llm.api_key = <redacted> (source: env (LIFTLINE_LLM_API_KEY))"));
        assert!(output.contains("network.max_turns = 12"));
        assert!(!output.contains("sk-test"));
    });
}

#[test]
fn config_marks_unset_key_and_default_sources() {
    with_env(&[], || {
        let output = config::run();

        assert!(output.contains("llm.api_key = <unset>"));
        assert!(output.contains("history.url = sqlite://liftline-history.db (source: default)"));
    });
}

#[test]
fn doctor_reports_missing_api_key() {
    with_env(&[], || {
        let report = parse_payload(&doctor::run(true));

        assert_eq!(report["overall_status"], "fail");
        let checks = report["checks"].as_array().expect("checks array");

        let config_check = find_check(checks, "config_validation");
        assert_eq!(config_check["status"], "pass");

        let llm_check = find_check(checks, "llm_key_presence");
        assert_eq!(llm_check["status"], "fail");
    });
}

#[test]
fn doctor_skips_connectivity_checks_when_config_is_invalid() {
    with_env(&[("LIFTLINE_NETWORK_MAX_TURNS", "0")], || {
        let report = parse_payload(&doctor::run(true));

        assert_eq!(report["overall_status"], "fail");
        let checks = report["checks"].as_array().expect("checks array");

        assert_eq!(find_check(checks, "config_validation")["status"], "fail");
        assert_eq!(find_check(checks, "store_connectivity")["status"], "skipped");
        assert_eq!(find_check(checks, "history_connectivity")["status"], "skipped");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn find_check<'a>(checks: &'a [Value], name: &str) -> &'a Value {
    checks
        .iter()
        .find(|check| check["name"] == name)
        .unwrap_or_else(|| panic!("missing check `{name}`"))
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "LIFTLINE_STORE_URL",
        "LIFTLINE_STORE_DATABASE",
        "LIFTLINE_STORE_TABLE",
        "LIFTLINE_LLM_API_KEY",
        "LIFTLINE_LLM_MODEL",
        "LIFTLINE_HISTORY_URL",
        "LIFTLINE_NETWORK_MAX_TURNS",
        "LIFTLINE_LOG_LEVEL",
        "LIFTLINE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
