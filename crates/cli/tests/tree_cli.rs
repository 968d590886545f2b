use chatforest_core::testing::{child_of, record, with_messages};
use chatforest_core::ChatRecord;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn make_home() -> tempfile::TempDir {
    tempfile::tempdir().expect("tempdir")
}

fn write_records(dir: &Path, records: &[ChatRecord]) -> PathBuf {
    let path = dir.join("records.json");
    fs::write(&path, serde_json::to_string(records).expect("encode records"))
        .expect("write records");
    path
}

fn run_cli(home: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_chatforest"))
        .args(args)
        .env("HOME", home)
        .env_remove("RUST_LOG")
        .output()
        .expect("run chatforest")
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn tree_prints_grouped_forest_with_connectors() {
    let home = make_home();
    let file = write_records(
        home.path(),
        &[
            record("root", 100),
            child_of("a", 90, "root"),
            child_of("b", 80, "root"),
            record("solo", 10),
        ],
    );

    let output = run_cli(home.path(), &["tree", file.to_str().expect("utf8 path")]);
    assert!(output.status.success(), "{output:?}");
    let out = stdout(&output);
    assert!(out.contains("── 3 sessions"), "{out}");
    assert!(out.contains("root (1 msgs)\n├─ a (1 msgs)\n└─ b (1 msgs)"), "{out}");
    assert!(out.contains("── 1 session,"), "{out}");
    assert!(out.contains("Total: 4 session(s)"), "{out}");
}

#[test]
fn tree_hides_checkpoints_unless_requested() {
    let home = make_home();
    let mut cp = record("snapshot", 50);
    cp.is_checkpoint = true;
    let file = write_records(home.path(), &[cp, record("live", 10)]);
    let path = file.to_str().expect("utf8 path");

    let hidden = stdout(&run_cli(home.path(), &["tree", path]));
    assert!(!hidden.contains("snapshot"), "{hidden}");

    let shown = stdout(&run_cli(home.path(), &["tree", path, "--show-checkpoints"]));
    assert!(shown.contains("snapshot (1 msgs) [checkpoint]"), "{shown}");
}

#[test]
fn lineage_reports_similarity_links() {
    let home = make_home();
    let file = write_records(
        home.path(),
        &[
            with_messages("x", 10, &["hi", "plan", "go", "left"], 8),
            with_messages("y", 20, &["hi", "plan", "go", "right"], 4),
        ],
    );

    let output = run_cli(home.path(), &["lineage", file.to_str().expect("utf8 path")]);
    assert!(output.status.success(), "{output:?}");
    let out = stdout(&output);
    assert!(out.contains("Strategy: content-similarity"), "{out}");
    assert!(out.contains("  y -> x"), "{out}");
}

#[test]
fn missing_records_file_fails_with_context() {
    let home = make_home();
    let missing = home.path().join("nope.json");
    let output = run_cli(home.path(), &["tree", missing.to_str().expect("utf8 path")]);
    assert!(!output.status.success());
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("Failed to load sessions"), "{err}");
}

#[test]
fn config_reads_file_from_home() {
    let home = make_home();
    let dir = home.path().join(".config").join("chatforest");
    fs::create_dir_all(&dir).expect("config dir");
    fs::write(
        dir.join("chatforest.toml"),
        "[display]\npreview_length = 12\n",
    )
    .expect("write config");

    let output = run_cli(home.path(), &["config"]);
    assert!(output.status.success(), "{output:?}");
    let out = stdout(&output);
    assert!(out.contains("preview_length = 12"), "{out}");
    assert!(!out.contains("(defaults)"), "{out}");
}
