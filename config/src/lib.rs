//! Conforge build profile configuration
//!
//! This crate models the named build profiles that parameterize package
//! builds and the registry that loads them from disk.
//!
//! # Overview
//!
//! - [`profile`]: the [`Profile`] type and the `*.profile` file parser
//! - [`registry`]: the name-keyed [`ProfileRegistry`] plus starter-profile
//!   provisioning
//! - [`error`]: the [`ConfigError`] taxonomy
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use conforge_config::ProfileRegistry;
//!
//! let registry = ProfileRegistry::load("profiles").unwrap();
//! let profile = registry.get("linux-clang15").unwrap();
//! println!("{}: {}", profile.name, profile.summary());
//! ```
//!
//! Profiles are immutable once loaded and the registry is constructed
//! explicitly by the caller; nothing in this crate holds process-wide state.

pub mod error;
pub mod profile;
pub mod registry;

pub use error::{ConfigError, Result};
pub use profile::{Arch, BuildType, Os, Profile};
pub use registry::{write_default_profiles, ProfileRegistry, CI_ENV, PROFILE_EXT};
