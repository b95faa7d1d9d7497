//! Conforge build orchestration
//!
//! Core library behind the `conforge` CLI.
//!
//! # Architecture
//!
//! - **Runner**: narrow [`runner::CommandRunner`] interface over the external
//!   package manager, mockable in tests
//! - **Orchestrator**: profile-driven install / build / test lifecycle with
//!   per-step [`BuildResult`] reporting
//! - **Graph**: requirements-manifest analysis with naive same-name,
//!   distinct-version conflict detection
//! - **Recipe**: declarative catalog of the openssl-* package descriptors

pub mod error;
pub mod graph;
pub mod orchestrator;
pub mod recipe;
pub mod runner;

pub use error::{Error, Result};
pub use graph::{analyze_json, analyze_path, analyze_str, Conflict, GraphReport, PackageReference};
pub use orchestrator::{
    conan_home, BuildCommand, BuildResult, Orchestrator, BUILD_DIR, CONAN_HOME_ENV,
};
pub use recipe::{CopySpec, EnvExport, Recipe, RecipeOption, RecipeSet};
pub use runner::{CommandRunner, ConanRunner, Invocation, TOOL_NAME, TOOL_PATH_ENV};
