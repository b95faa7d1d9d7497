//! External tool invocation
//!
//! The orchestrator never talks to the package manager binary directly; it
//! goes through the narrow [`CommandRunner`] trait so tests can substitute a
//! recording implementation and a native API binding could slot in later.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::debug;

/// Environment variable overriding the path to the external tool
pub const TOOL_PATH_ENV: &str = "CONFORGE_CONAN";

/// Name of the external package manager binary
pub const TOOL_NAME: &str = "conan";

/// Captured outcome of one child-process invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl Invocation {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Narrow interface over "run this command and give me the outcome"
pub trait CommandRunner {
    /// Run the external tool with `args` in `cwd`, with `env` added to the
    /// child environment. Blocks until the child exits.
    fn run(&self, args: &[String], cwd: &Path, env: &[(String, String)]) -> Result<Invocation>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, args: &[String], cwd: &Path, env: &[(String, String)]) -> Result<Invocation> {
        (**self).run(args, cwd, env)
    }
}

/// [`CommandRunner`] backed by the real `conan` binary
pub struct ConanRunner {
    tool_path: PathBuf,
}

impl ConanRunner {
    /// Use an explicit tool path
    pub fn new(tool_path: impl Into<PathBuf>) -> Self {
        Self {
            tool_path: tool_path.into(),
        }
    }

    /// Locate the tool via the override env var, then PATH
    pub fn locate() -> Result<Self> {
        if let Some(path) = std::env::var_os(TOOL_PATH_ENV) {
            return Ok(Self::new(PathBuf::from(path)));
        }
        let found = which::which(TOOL_NAME).map_err(|e| Error::Invocation {
            message: format!("{} not found: {}", TOOL_NAME, e),
            hint: format!(
                "install conan 2.x and ensure it is on PATH, or set {}",
                TOOL_PATH_ENV
            ),
        })?;
        Ok(Self::new(found))
    }

    /// Path to the tool binary
    pub fn tool_path(&self) -> &Path {
        &self.tool_path
    }
}

impl CommandRunner for ConanRunner {
    fn run(&self, args: &[String], cwd: &Path, env: &[(String, String)]) -> Result<Invocation> {
        debug!("Running: {} {}", self.tool_path.display(), args.join(" "));

        let output = std::process::Command::new(&self.tool_path)
            .args(args)
            .current_dir(cwd)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::Invocation {
                message: format!("failed to start {}: {}", self.tool_path.display(), e),
                hint: format!(
                    "install conan 2.x and ensure it is on PATH, or set {}",
                    TOOL_PATH_ENV
                ),
            })?;

        Ok(Invocation {
            // A killed child has no code; report the conventional 1
            exit_code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_success() {
        let ok = Invocation {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(ok.success());

        let failed = Invocation {
            exit_code: 6,
            stdout: String::new(),
            stderr: "ERROR: recipe not found".to_string(),
        };
        assert!(!failed.success());
    }

    #[test]
    fn test_runner_spawn_failure_has_hint() {
        let runner = ConanRunner::new("/nonexistent/conan-binary");
        let err = runner
            .run(&["--version".to_string()], Path::new("."), &[])
            .unwrap_err();
        match err {
            Error::Invocation { hint, .. } => assert!(hint.contains(TOOL_PATH_ENV)),
            other => panic!("unexpected error: {other}"),
        }
    }
}
