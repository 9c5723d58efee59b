//! CLI tests for `litguard check`, `build` and `state`.
//!
//! Spawns the litguard binary against a real git repository, with a shell
//! script standing in for the generator, and verifies exit codes and the
//! persisted `.litstate`.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use litguard::exit_codes;
use litguard::test_support::TestRepo;
use tempfile::TempDir;

const GENERATED: &str = "// generated from lib.md\n";

/// Generator stand-in: `--dry-run <doc>` prints the file map, `<doc>` writes it.
const GENERATOR_SCRIPT: &str = r#"#!/bin/sh
if [ "$1" = "--dry-run" ]; then
  printf '{"src/gen.rs": "generated"}'
  exit 0
fi
echo "regenerating $1" >&2
mkdir -p src
printf '// generated from lib.md\n' > src/gen.rs
"#;

struct Fixture {
    repo: TestRepo,
    _tools: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let repo = TestRepo::new().expect("repo");
        let tools = tempfile::tempdir().expect("tools dir");
        let script = tools.path().join("gen.sh");
        fs::write(&script, GENERATOR_SCRIPT).expect("write generator");

        repo.write(
            "litguard.toml",
            &format!(
                r#"
[generator]
command = ["sh", "{}"]

[tests]
command = ["sh", "-c", "echo tests ran"]

[[sources]]
path = "lib/lib.md"
workdir = "lib"
"#,
                script.display()
            ),
        )
        .expect("write config");
        repo.write(".gitignore", ".litstate\n").expect("write gitignore");
        repo.write("lib/lib.md", "# lib\n").expect("write source");
        repo.write("lib/src/gen.rs", GENERATED).expect("write generated");
        repo.commit_all("init").expect("commit");

        Self {
            repo,
            _tools: tools,
        }
    }

    fn path(&self) -> &Path {
        self.repo.path()
    }

    fn litguard(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_litguard"))
            .arg("--root")
            .arg(self.path())
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .expect("run litguard")
    }

    fn state(&self) -> String {
        self.repo.read(".litstate").expect("read state")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn clean_repository_builds_and_records_sync() {
    let fixture = Fixture::new();

    let output = fixture.litguard(&["build"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let out = stdout(&output);
    assert!(out.contains("everything is in sync"), "stdout: {out}");
    assert!(out.contains("Generating source files done!"), "stdout: {out}");
    assert!(out.contains("tests ran"), "stdout: {out}");
    assert!(String::from_utf8_lossy(&output.stderr).contains("regenerating lib.md"));
    assert_eq!(fixture.state(), "sync");
}

#[test]
fn manual_edit_to_generated_file_blocks() {
    let fixture = Fixture::new();
    fixture
        .repo
        .write("lib/src/gen.rs", "// hand-tuned\n")
        .expect("edit generated file");

    let output = fixture.litguard(&["build"]);

    assert_eq!(
        output.status.code(),
        Some(exit_codes::ERR_CONFLICTING_MODIFICATIONS)
    );
    let out = stdout(&output);
    assert!(out.contains("could not build because some changes would be overwritten"));
    assert!(out.contains("lib/src/gen.rs"));
    assert!(!out.contains("tests ran"));
    assert_eq!(fixture.state(), "manual code changes");
    assert_eq!(
        fixture.repo.read("lib/src/gen.rs").expect("read generated"),
        "// hand-tuned\n"
    );
}

#[test]
fn staged_edit_to_generated_file_blocks() {
    let fixture = Fixture::new();
    fixture
        .repo
        .write("lib/src/gen.rs", "// hand-tuned\n")
        .expect("edit generated file");
    fixture.repo.stage("lib/src/gen.rs").expect("stage");

    let output = fixture.litguard(&["check"]);

    assert_eq!(
        output.status.code(),
        Some(exit_codes::ERR_CONFLICTING_MODIFICATIONS)
    );
    assert!(stdout(&output).contains("  lib/src/gen.rs"));
    assert_eq!(fixture.state(), "manual code changes");
}

#[test]
fn literate_edit_is_tracked_then_regenerated() {
    let fixture = Fixture::new();
    fixture
        .repo
        .write("lib/lib.md", "# lib\n\nmore prose\n")
        .expect("edit source");

    let check = fixture.litguard(&["check"]);
    assert_eq!(check.status.code(), Some(exit_codes::OK));
    let out = stdout(&check);
    assert!(out.contains("found lib/lib.md"), "stdout: {out}");
    assert!(out.contains("changing files: lib/src/gen.rs"), "stdout: {out}");
    assert!(out.contains("checking done"));
    assert_eq!(fixture.state(), "literate source changes");

    // The regenerated file now differs from HEAD, which is expected after a
    // literate-source edit and must not block the next build.
    fixture
        .repo
        .write("lib/src/gen.rs", "// regenerated\n")
        .expect("simulate regeneration");
    let build = fixture.litguard(&["build"]);
    assert_eq!(build.status.code(), Some(exit_codes::OK));
    assert_eq!(fixture.state(), "literate source changes");
}

#[test]
fn repeated_checks_on_clean_tree_are_stable() {
    let fixture = Fixture::new();

    for _ in 0..2 {
        let output = fixture.litguard(&["check"]);
        assert_eq!(output.status.code(), Some(exit_codes::OK));
        assert_eq!(fixture.state(), "sync");
    }
}

#[test]
fn state_and_reset_commands_round_trip() {
    let fixture = Fixture::new();

    let missing = fixture.litguard(&["state"]);
    assert_eq!(stdout(&missing), "manual code changes\n");

    let reset = fixture.litguard(&["reset", "--state", "literate source changes"]);
    assert_eq!(reset.status.code(), Some(exit_codes::OK));
    assert_eq!(fixture.state(), "literate source changes");

    let shown = fixture.litguard(&["state"]);
    assert_eq!(stdout(&shown), "literate source changes\n");
}

#[test]
fn malformed_dry_run_output_fails_without_touching_state() {
    let fixture = Fixture::new();
    fixture
        .repo
        .write(
            "litguard.toml",
            r#"
[generator]
command = ["sh", "-c", "echo not json"]

[[sources]]
path = "lib/lib.md"
"#,
        )
        .expect("rewrite config");

    let output = fixture.litguard(&["check"]);

    assert_eq!(output.status.code(), Some(exit_codes::ERROR));
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed dry-run output"));
    assert!(!fixture.path().join(".litstate").exists());
}
