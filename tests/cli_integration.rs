//! CLI integration tests
//!
//! Run the built binary and check output, files written and exit codes.
//! Nothing here needs Docker or network access.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper to get the path to the dockhand binary
fn dockhand_bin() -> PathBuf {
    // In tests, the binary should be at target/debug/dockhand
    let mut path = env::current_exe()
        .expect("Failed to get current executable path")
        .parent()
        .expect("No parent")
        .to_path_buf();

    // If we're in deps/, go up one more level
    if path.ends_with("deps") {
        path = path.parent().expect("No parent").to_path_buf();
    }

    path.join("dockhand")
}

/// Command with the DOCKHAND_* environment cleared
fn dockhand() -> Command {
    let mut cmd = Command::new(dockhand_bin());
    for (key, _) in env::vars() {
        if key.starts_with("DOCKHAND_") {
            cmd.env_remove(key);
        }
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("Failed to execute dockhand")
}

fn create_node_prisma_repo(dir: &TempDir) -> PathBuf {
    let repo_path = dir.path().to_path_buf();
    fs::write(
        repo_path.join("package.json"),
        r#"{"name":"shop","version":"1.4.0","scripts":{"build":"tsc","start":"node dist/server.js"}}"#,
    )
    .expect("Failed to write package.json");
    fs::create_dir_all(repo_path.join("prisma")).expect("Failed to create prisma directory");
    fs::write(repo_path.join("prisma/schema.prisma"), "datasource db {}\n")
        .expect("Failed to write schema.prisma");
    repo_path
}

#[test]
fn test_cli_help() {
    let output = run(dockhand().arg("--help"));

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("dockhand"));
    for command in ["generate", "migrate", "troubleshoot", "notify"] {
        assert!(stdout.contains(command), "help is missing {}", command);
    }
}

#[test]
fn test_cli_version() {
    let output = run(dockhand().arg("--version"));

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_migrate_help_lists_db_type() {
    let output = run(dockhand().args(["migrate", "--help"]));

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--dbType"));
    assert!(stdout.contains("--vps"));
}

#[test]
fn test_generate_json_output() {
    let temp = TempDir::new().unwrap();
    let repo = create_node_prisma_repo(&temp);

    let output = run(dockhand().current_dir(&repo).args([
        "--non-interactive",
        "generate",
        "--port",
        "3000",
        "--entrypoint",
        "dist/server.js",
        "--format",
        "json",
    ]));

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON");
    assert_eq!(parsed["artifacts"].as_array().map(Vec::len), Some(2));
    assert!(parsed["detection"].is_object());

    let recipe = fs::read_to_string(repo.join("Dockerfile")).unwrap();
    assert!(recipe.contains("npx prisma generate"));
    assert!(repo.join("docker-compose.yml").exists());
}

#[test]
fn test_generate_twice_without_force_declines() {
    let temp = TempDir::new().unwrap();
    let repo = create_node_prisma_repo(&temp);
    let args = [
        "--non-interactive",
        "generate",
        "--stack",
        "node-prisma",
        "--port",
        "3000",
        "--entrypoint",
        "dist/server.js",
    ];

    assert!(run(dockhand().current_dir(&repo).args(args)).status.success());
    fs::write(repo.join("Dockerfile"), "FROM scratch\n").unwrap();

    let second = run(dockhand().current_dir(&repo).args(args));
    assert_eq!(second.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&second.stderr).contains("--force"));
    assert_eq!(
        fs::read_to_string(repo.join("Dockerfile")).unwrap(),
        "FROM scratch\n"
    );

    let forced = run(dockhand().current_dir(&repo).args(args).arg("--force"));
    assert!(forced.status.success());
    assert_ne!(
        fs::read_to_string(repo.join("Dockerfile")).unwrap(),
        "FROM scratch\n"
    );
}

#[test]
fn test_generate_writes_to_output_dir() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("requirements.txt"), "flask\n").unwrap();
    let out = temp.path().join("deploy");

    let output = run(dockhand().current_dir(temp.path()).args([
        "--non-interactive",
        "generate",
        "--output",
        "deploy",
        "--format",
        "yaml",
    ]));

    assert!(output.status.success());
    let recipe = fs::read_to_string(out.join("Dockerfile")).unwrap();
    assert!(recipe.contains("FROM python:3.12-slim"));
    assert!(!temp.path().join("Dockerfile").exists());
}

#[test]
fn test_migrate_without_artifacts_exits_2() {
    let temp = TempDir::new().unwrap();

    let output = run(dockhand().current_dir(temp.path()).args([
        "--non-interactive",
        "migrate",
        "--image",
        "registry.example.com/shop:1.4.0",
    ]));

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Dockerfile"));
    assert!(stderr.contains("dockhand generate"));
}

#[test]
fn test_migrate_rejects_unknown_db_type() {
    let output = run(dockhand().args(["migrate", "--image", "shop:1", "--dbType", "oracle"]));
    assert_eq!(output.status.code(), Some(10));
    assert!(String::from_utf8_lossy(&output.stderr).contains("oracle"));
}

#[test]
fn test_usage_error_and_missing_artifacts_exit_differently() {
    let temp = TempDir::new().unwrap();

    let usage = run(dockhand()
        .current_dir(temp.path())
        .args(["migrate", "--image", "shop:1", "--no-such-flag"]));
    let missing = run(dockhand()
        .current_dir(temp.path())
        .args(["--non-interactive", "migrate", "--image", "shop:1"]));

    assert_eq!(usage.status.code(), Some(10));
    assert_eq!(missing.status.code(), Some(2));
}

#[test]
fn test_missing_subcommand_is_usage_error() {
    let output = run(&mut dockhand());
    assert_eq!(output.status.code(), Some(10));
}

#[test]
fn test_notify_without_webhook_exits_8() {
    let output = run(dockhand().args([
        "notify",
        "--to",
        "ops@example.com",
        "--subject",
        "Staging ready",
        "--body",
        "shop:1.4.0 is up",
    ]));

    assert_eq!(output.status.code(), Some(8));
    assert!(String::from_utf8_lossy(&output.stderr).contains("DOCKHAND_NOTIFY_WEBHOOK"));
}

#[test]
fn test_notify_requires_body() {
    let output = run(dockhand().args(["notify", "--to", "ops@example.com", "--subject", "x"]));
    assert_eq!(output.status.code(), Some(10));
}
