//! Profile-driven build orchestration
//!
//! This module drives the external package manager for the install / build /
//! test lifecycle. Each call resolves a profile against the registry, spawns
//! one child process through the [`CommandRunner`], and reports the outcome
//! as a [`BuildResult`] value. A non-zero exit code is an ordinary outcome,
//! not an error; the caller decides whether to keep going.
//!
//! Builds against a given project directory share the `build/` output
//! directory with no locking, so concurrent invocations against the same
//! project must be serialized by the caller.

use crate::runner::{CommandRunner, Invocation};
use crate::{Error, Result};
use conforge_config::{Profile, ProfileRegistry};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Cache-home override consumed by the external tool, passed through verbatim
pub const CONAN_HOME_ENV: &str = "CONAN_HOME";

/// Name of the build output directory cleared by `--clean`
pub const BUILD_DIR: &str = "build";

/// Effective tool cache home: the env override when set, else `~/.conan2`
pub fn conan_home() -> Option<PathBuf> {
    std::env::var_os(CONAN_HOME_ENV)
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".conan2")))
}

/// Lifecycle step handed to the external tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BuildCommand {
    Install,
    Build,
    Test,
}

impl std::fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildCommand::Install => write!(f, "install"),
            BuildCommand::Build => write!(f, "build"),
            BuildCommand::Test => write!(f, "test"),
        }
    }
}

/// Outcome of one orchestrated step
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// Profile the step ran under
    pub profile: String,
    /// Which lifecycle step ran
    pub command: BuildCommand,
    /// Exit code of the child process
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Wall-clock duration of the child process
    pub duration: Duration,
}

impl BuildResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Orchestrates external package-manager invocations under named profiles
///
/// Holds a shared reference to an explicitly constructed registry; it never
/// mutates profile state. One child process is spawned per call with no
/// retries and no timeout, since package builds legitimately run for minutes.
pub struct Orchestrator<'a, R: CommandRunner> {
    registry: &'a ProfileRegistry,
    runner: R,
    project_root: PathBuf,
}

impl<'a, R: CommandRunner> Orchestrator<'a, R> {
    pub fn new(registry: &'a ProfileRegistry, runner: R, project_root: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            runner,
            project_root: project_root.into(),
        }
    }

    /// Project directory the tool runs in
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Resolve an optional profile name against the registry
    ///
    /// Fails with `ProfileNotFound` before any process is spawned.
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<&Profile> {
        let name = match name {
            Some(name) => name,
            None => self.registry.default_profile(),
        };
        Ok(self.registry.get(name)?)
    }

    /// Install dependencies under the resolved profile
    pub fn install(
        &self,
        profile: Option<&str>,
        verbose: bool,
        clean: bool,
    ) -> Result<BuildResult> {
        let profile_name = self.resolve_profile(profile)?.name.clone();
        if clean {
            self.clean_build_dir()?;
        }

        let mut args = vec![
            "install".to_string(),
            ".".to_string(),
            format!("--profile={}", profile_name),
            "--build=missing".to_string(),
        ];
        if verbose {
            args.push("-vverbose".to_string());
        }

        self.invoke(BuildCommand::Install, &profile_name, args)
    }

    /// Build the package under the resolved profile
    ///
    /// With `test` set, chains to the test step only when the build exited 0;
    /// the returned result is then the test step's. A failed build is
    /// returned as-is so the caller sees its exit code and stderr.
    pub fn build(
        &self,
        profile: Option<&str>,
        verbose: bool,
        clean: bool,
        test: bool,
    ) -> Result<BuildResult> {
        let profile_name = self.resolve_profile(profile)?.name.clone();
        if clean {
            self.clean_build_dir()?;
        }

        let mut args = vec![
            "build".to_string(),
            ".".to_string(),
            format!("--profile={}", profile_name),
        ];
        if verbose {
            args.push("-vverbose".to_string());
        }

        let result = self.invoke(BuildCommand::Build, &profile_name, args)?;
        if !result.success() {
            warn!(
                "Build failed under profile {} (exit {})",
                profile_name, result.exit_code
            );
            return Ok(result);
        }

        if test {
            return self.test(Some(&profile_name), verbose);
        }
        Ok(result)
    }

    /// Run the package test step under the resolved profile
    pub fn test(&self, profile: Option<&str>, verbose: bool) -> Result<BuildResult> {
        let profile_name = self.resolve_profile(profile)?.name.clone();

        let mut args = vec![
            "test".to_string(),
            "test_package".to_string(),
            format!("--profile={}", profile_name),
        ];
        if verbose {
            args.push("-vverbose".to_string());
        }

        self.invoke(BuildCommand::Test, &profile_name, args)
    }

    /// Version string reported by the external tool
    pub fn tool_version(&self) -> Result<String> {
        let invocation =
            self.runner
                .run(&["--version".to_string()], &self.project_root, &self.passthrough_env())?;
        if !invocation.success() {
            return Err(Error::Invocation {
                message: format!("--version exited with {}", invocation.exit_code),
                hint: "check the conan installation".to_string(),
            });
        }
        Ok(invocation.stdout.trim().to_string())
    }

    fn invoke(
        &self,
        command: BuildCommand,
        profile_name: &str,
        args: Vec<String>,
    ) -> Result<BuildResult> {
        info!("Running {} under profile {}", command, profile_name);
        let start = Instant::now();
        let Invocation {
            exit_code,
            stdout,
            stderr,
        } = self
            .runner
            .run(&args, &self.project_root, &self.passthrough_env())?;
        let duration = start.elapsed();

        debug!("{} finished in {:?} (exit {})", command, duration, exit_code);

        Ok(BuildResult {
            profile: profile_name.to_string(),
            command,
            exit_code,
            stdout,
            stderr,
            duration,
        })
    }

    fn passthrough_env(&self) -> Vec<(String, String)> {
        let mut env = Vec::new();
        if let Ok(home) = std::env::var(CONAN_HOME_ENV) {
            env.push((CONAN_HOME_ENV.to_string(), home));
        }
        env
    }

    fn clean_build_dir(&self) -> Result<()> {
        let build_dir = self.project_root.join(BUILD_DIR);
        if build_dir.is_dir() {
            info!("Removing {}", build_dir.display());
            std::fs::remove_dir_all(&build_dir)?;
        }
        Ok(())
    }
}
