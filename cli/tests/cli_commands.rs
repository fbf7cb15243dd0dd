use std::process::Command;

fn run_switchyard(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_switchyard"))
        .args(args)
        .env_remove("SWITCHYARD_BACKEND")
        .env_remove("SWITCHYARD_RECURSION_LIMIT")
        .env_remove("LOG_FILE")
        .output()
        .expect("failed to run switchyard binary")
}

#[test]
fn cli_help_lists_subcommands() {
    let out = run_switchyard(&["--help"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Switchyard"));
    assert!(stdout.contains("router-loop"));
    assert!(stdout.contains("tools"));
}

#[test]
fn cli_tools_list_json_succeeds() {
    let out = run_switchyard(&["tools", "list", "--json"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.trim_start().starts_with('['));
    assert!(stdout.contains("get_current_weather"));
}

#[test]
fn cli_tools_show_missing_fails() {
    let out = run_switchyard(&["tools", "show", "no_such_tool"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("tool not found"), "{}", stderr);
}

#[test]
fn cli_graph_mermaid_needs_no_model() {
    let out = run_switchyard(&["graph", "router-loop", "--format", "mermaid"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("graph TD;"), "{}", stdout);
    assert!(stdout.contains("evaluate"));
}

#[test]
fn cli_chain_prints_appended_text() {
    let out = run_switchyard(&["chain", "--input", "Rust is", "--count", "2"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout.trim(), "Rust is Amazing_ Amazing_");
}

#[test]
fn cli_branch_with_verbose_prints_node_headers() {
    let out = run_switchyard(&["-v", "branch", "human"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("==> [1]"), "{}", stdout);
    assert!(stdout.contains("not Amazing always!"), "{}", stdout);
}

#[test]
fn cli_unknown_backend_fails() {
    let out = run_switchyard(&["--backend", "carrier-pigeon", "chain"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.starts_with("switchyard: settings:"), "{}", stderr);
}

#[test]
fn cli_zero_recursion_limit_fails() {
    let out = run_switchyard(&["--recursion-limit", "0", "chain"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("invalid argument"), "{}", stderr);
}
