//! Integration tests for individual commands

mod integration_test_helpers;

use integration_test_helpers::*;

#[test]
fn test_init_then_sync() {
    let project = TestProject::new();

    let stdout = project.run_command_success(&["init"]);
    assert!(stdout.contains("Project initialized"));
    assert!(project.file_exists("controlpath-native.yaml"));
    assert!(project.file_exists("lekko/default.ts"));

    let stdout = project.run_command_success(&["sync", "--verify"]);
    assert!(stdout.contains("✓ Synced default"));
    assert!(project.file_exists(&TestProject::config_file("default", "new-checkout")));
    assert!(project.file_exists(&TestProject::config_file("default", "checkout-theme")));
    assert!(project.file_exists(".controlpath/repo/proto/default/default.proto"));
}

#[test]
fn test_sync_writes_config_json() {
    let project = TestProject::with_namespace("checkout", CHECKOUT_SOURCE);
    project.run_command_success(&["sync"]);

    let config: serde_json::Value =
        serde_json::from_str(&project.read_file(&TestProject::config_file("checkout", "discount")))
            .unwrap();
    assert_eq!(config["key"], "discount");
    assert_eq!(config["type"], "FEATURE_TYPE_FLOAT");
    assert_eq!(config["tree"]["default"]["doubleValue"], 0.0);
    assert_eq!(
        config["tree"]["constraints"][0]["ruleAstNew"]["atom"]["comparisonOperator"],
        "COMPARISON_OPERATOR_CONTAINED_WITHIN"
    );
}

#[test]
fn test_eval_command() {
    let project = TestProject::with_namespace("checkout", CHECKOUT_SOURCE);
    project.run_command_success(&["sync"]);

    let stdout = project.run_command_success(&[
        "eval",
        "--namespace",
        "checkout",
        "--key",
        "new-checkout",
        "--context",
        r#"{"env":"prod","userId":"user-1"}"#,
    ]);
    assert!(stdout.contains("Value: true"));
    assert!(stdout.contains("Path: [0]"));

    let stdout = project.run_command_success(&[
        "eval",
        "--namespace",
        "checkout",
        "--key",
        "banner",
    ]);
    assert!(stdout.contains("Upgrade today"));
    assert!(stdout.contains("Path: default"));
}

#[test]
fn test_compile_command() {
    let project = TestProject::with_namespace("checkout", CHECKOUT_SOURCE);
    let stdout = project.run_command_success(&["compile", "--output", "dist/configs.msgpack"]);
    assert!(stdout.contains("Compiled 3 configs in 1 namespaces"));

    let bytes = std::fs::read(project.path("dist/configs.msgpack")).unwrap();
    let bundle = controlpath_native::deserialize_bundle(&bytes).unwrap();
    assert_eq!(bundle.namespaces.len(), 1);
    assert_eq!(bundle.namespaces[0].configs.len(), 3);
}

#[test]
fn test_validate_after_sync() {
    let project = TestProject::with_namespace("checkout", CHECKOUT_SOURCE);
    project.run_command_success(&["sync"]);
    let stdout = project.run_command_success(&["validate"]);
    assert!(stdout.contains("Validation passed (3 configs)"));
}

#[test]
fn test_pull_round_trip() {
    let project = TestProject::with_namespace("checkout", CHECKOUT_SOURCE);
    project.run_command_success(&["sync"]);
    project.run_command_success(&["pull", "--out", "pulled"]);
    assert!(project.file_exists("pulled/checkout.ts"));

    // Syncing the pulled source leaves the repository unchanged
    let before = project.read_file(&TestProject::config_file("checkout", "banner"));
    project.run_command_success(&["sync", "--dir", "pulled", "--verify"]);
    assert_eq!(
        project.read_file(&TestProject::config_file("checkout", "banner")),
        before
    );
}

#[test]
fn test_rewrite_command() {
    let project = TestProject::with_namespace("checkout", CHECKOUT_SOURCE);
    let stdout = project.run_command_success(&["rewrite", "--file", "lekko/checkout.ts"]);
    assert!(stdout.starts_with("import { get, type ConfigClient } from \"@controlpath/runtime\";"));
    assert!(stdout.contains("return get(\"checkout\", \"discount\", { country }, client);"));
}

#[test]
fn test_completion_command() {
    let project = TestProject::new();
    let stdout = project.run_command_success(&["completion", "bash"]);
    assert!(stdout.contains("controlpath-native"));
}

#[test]
fn test_version_flag() {
    let project = TestProject::new();
    let stdout = project.run_command_success(&["--version"]);
    assert!(stdout.starts_with("controlpath-native "));
}
