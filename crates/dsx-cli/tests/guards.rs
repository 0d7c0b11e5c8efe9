use assert_cmd::Command;
use predicates::prelude::*;

fn dsx(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dsx"));
    cmd.current_dir(dir.path())
        .env_remove("DATASTORE_PROJECT_ID")
        .env_remove("DSX_CACHE_TTL_MS")
        .env_remove("DSX_FAN_OUT_CONCURRENCY")
        // Nothing listens here; these tests must fail before any request.
        .env("DATASTORE_EMULATOR_HOST", "127.0.0.1:9");
    cmd
}

#[test]
fn missing_project_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    dsx(&dir)
        .arg("kinds")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATASTORE_PROJECT_ID"));
}

#[test]
fn project_is_read_from_dotenv() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join(".env"), "DATASTORE_PROJECT_ID=demo\n").expect("write .env");
    dsx(&dir)
        .args(["delete-kind", "Task", "--database", "my-db"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("my-db"))
        .stderr(predicate::str::contains("DATASTORE_PROJECT_ID").not());
}

#[test]
fn delete_in_named_database_is_refused_offline() {
    let dir = tempfile::tempdir().expect("tempdir");
    dsx(&dir)
        .args(["--project", "demo", "delete", "Task", "7", "--database", "my-db"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("default database"));
}

#[test]
fn malformed_cache_ttl_is_a_configuration_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    dsx(&dir)
        .env("DSX_CACHE_TTL_MS", "soon")
        .args(["--project", "demo", "namespaces"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DSX_CACHE_TTL_MS"));
}
