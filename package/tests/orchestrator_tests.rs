//! Tests for the orchestrator against a scripted command runner

use assert_matches::assert_matches;
use conforge_config::{Profile, ProfileRegistry};
use conforge_package::{BuildCommand, CommandRunner, Error, Invocation, Orchestrator};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Runner that records every invocation and replays scripted exit codes
struct ScriptedRunner {
    calls: RefCell<Vec<Vec<String>>>,
    exit_codes: RefCell<VecDeque<i32>>,
}

impl ScriptedRunner {
    fn new(exit_codes: &[i32]) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            exit_codes: RefCell::new(exit_codes.iter().copied().collect()),
        }
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(
        &self,
        args: &[String],
        _cwd: &Path,
        _env: &[(String, String)],
    ) -> conforge_package::Result<Invocation> {
        self.calls.borrow_mut().push(args.to_vec());
        let exit_code = self.exit_codes.borrow_mut().pop_front().unwrap_or(0);
        Ok(Invocation {
            exit_code,
            stdout: String::new(),
            stderr: if exit_code == 0 {
                String::new()
            } else {
                "ERROR: build failed".to_string()
            },
        })
    }
}

fn profile(name: &str, compiler: &str) -> Profile {
    let text = format!(
        "[settings]\nos=Linux\narch=x86_64\ncompiler={}\ncompiler.version=15\nbuild_type=Release\n",
        compiler
    );
    Profile::parse(name, &text, &PathBuf::from(format!("{name}.profile"))).unwrap()
}

fn registry() -> ProfileRegistry {
    ProfileRegistry::from_profiles([
        profile("linux-clang15", "clang"),
        profile("linux-gcc11", "gcc"),
    ])
}

#[test]
fn test_install_arguments() {
    let registry = registry();
    let runner = ScriptedRunner::new(&[0]);
    let orchestrator = Orchestrator::new(&registry, runner, ".");

    let result = orchestrator
        .install(Some("linux-gcc11"), false, false)
        .unwrap();
    assert!(result.success());
    assert_eq!(result.command, BuildCommand::Install);
    assert_eq!(result.profile, "linux-gcc11");
}

#[test]
fn test_install_verbose_flag() {
    let registry = registry();
    let runner = ScriptedRunner::new(&[0]);
    let orchestrator = Orchestrator::new(&registry, &runner, ".");

    orchestrator
        .install(Some("linux-clang15"), true, false)
        .unwrap();

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    let args = &calls[0];
    assert_eq!(args[0], "install");
    assert!(args.contains(&"--profile=linux-clang15".to_string()));
    assert!(args.contains(&"--build=missing".to_string()));
    assert!(args.contains(&"-vverbose".to_string()));
}

#[test]
fn test_unknown_profile_fails_before_spawn() {
    let registry = registry();
    let runner = ScriptedRunner::new(&[0]);
    let orchestrator = Orchestrator::new(&registry, &runner, ".");

    let err = orchestrator
        .install(Some("nonexistent"), false, false)
        .unwrap_err();
    assert_matches!(
        err,
        Error::Config(conforge_config::ConfigError::ProfileNotFound(name)) if name == "nonexistent"
    );
    assert!(runner.calls().is_empty());
}

#[test]
fn test_default_profile_resolution() {
    let registry = registry();
    let runner = ScriptedRunner::new(&[0]);
    let orchestrator = Orchestrator::new(&registry, &runner, ".");

    // First alphabetically among the fixture profiles
    let result = orchestrator.install(None, false, false).unwrap();
    assert_eq!(result.profile, "linux-clang15");
}

#[test]
fn test_build_chains_to_test_on_success() {
    let registry = registry();
    let runner = ScriptedRunner::new(&[0, 0]);
    let orchestrator = Orchestrator::new(&registry, &runner, ".");

    let result = orchestrator
        .build(Some("linux-gcc11"), false, false, true)
        .unwrap();

    assert!(result.success());
    assert_eq!(result.command, BuildCommand::Test);

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0][0], "build");
    assert_eq!(calls[1][0], "test");
    assert_eq!(calls[1][1], "test_package");
}

#[test]
fn test_build_failure_does_not_chain() {
    let registry = registry();
    let runner = ScriptedRunner::new(&[1]);
    let orchestrator = Orchestrator::new(&registry, &runner, ".");

    let result = orchestrator
        .build(Some("linux-gcc11"), false, false, true)
        .unwrap();

    assert!(!result.success());
    assert_eq!(result.command, BuildCommand::Build);
    assert_eq!(result.exit_code, 1);
    assert!(result.stderr.contains("ERROR"));
    assert_eq!(runner.calls().len(), 1);
}

#[test]
fn test_clean_removes_build_dir() {
    let project = tempfile::tempdir().unwrap();
    let build_dir = project.path().join("build");
    std::fs::create_dir(&build_dir).unwrap();
    std::fs::write(build_dir.join("stale.o"), b"stale").unwrap();

    let registry = registry();
    let runner = ScriptedRunner::new(&[0]);
    let orchestrator = Orchestrator::new(&registry, &runner, project.path());

    orchestrator
        .install(Some("linux-gcc11"), false, true)
        .unwrap();
    assert!(!build_dir.exists());
}

#[test]
fn test_build_without_test_runs_once() {
    let registry = registry();
    let runner = ScriptedRunner::new(&[0]);
    let orchestrator = Orchestrator::new(&registry, &runner, ".");

    let result = orchestrator
        .build(Some("linux-gcc11"), false, false, false)
        .unwrap();
    assert_eq!(result.command, BuildCommand::Build);
    assert_eq!(runner.calls().len(), 1);
}
