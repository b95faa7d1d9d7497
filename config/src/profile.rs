//! Build profile model
//!
//! A profile is a named bundle of build settings (os/arch/compiler/build
//! type) plus tool configuration, parsed from a `<name>.profile` file. The
//! file format mirrors what the external package manager consumes, so raw
//! keys are preserved verbatim alongside the typed fields.

use crate::{ConfigError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Target operating system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Os {
    Linux,
    Windows,
    Macos,
    FreeBsd,
    Android,
    Ios,
    /// Any OS token we don't model explicitly, passed through as-is
    Other(String),
}

impl Os {
    /// Parse an OS token as spelled in profile files
    pub fn parse(token: &str) -> Self {
        match token {
            "Linux" => Os::Linux,
            "Windows" => Os::Windows,
            "Macos" => Os::Macos,
            "FreeBSD" => Os::FreeBsd,
            "Android" => Os::Android,
            "iOS" => Os::Ios,
            other => Os::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Os::Linux => write!(f, "Linux"),
            Os::Windows => write!(f, "Windows"),
            Os::Macos => write!(f, "Macos"),
            Os::FreeBsd => write!(f, "FreeBSD"),
            Os::Android => write!(f, "Android"),
            Os::Ios => write!(f, "iOS"),
            Os::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Target architecture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arch {
    X86_64,
    Armv8,
    X86,
    Riscv64,
    /// Unmodeled architecture token, passed through as-is
    Other(String),
}

impl Arch {
    /// Parse an architecture token as spelled in profile files
    pub fn parse(token: &str) -> Self {
        match token {
            "x86_64" => Arch::X86_64,
            "armv8" => Arch::Armv8,
            "x86" => Arch::X86,
            "riscv64" => Arch::Riscv64,
            other => Arch::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arch::X86_64 => write!(f, "x86_64"),
            Arch::Armv8 => write!(f, "armv8"),
            Arch::X86 => write!(f, "x86"),
            Arch::Riscv64 => write!(f, "riscv64"),
            Arch::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Build type for the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildType {
    Debug,
    Release,
    RelWithDebInfo,
}

impl Default for BuildType {
    fn default() -> Self {
        BuildType::Release
    }
}

impl BuildType {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "Debug" => Some(BuildType::Debug),
            "Release" => Some(BuildType::Release),
            "RelWithDebInfo" => Some(BuildType::RelWithDebInfo),
            _ => None,
        }
    }
}

impl std::fmt::Display for BuildType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildType::Debug => write!(f, "Debug"),
            BuildType::Release => write!(f, "Release"),
            BuildType::RelWithDebInfo => write!(f, "RelWithDebInfo"),
        }
    }
}

/// A named build profile
///
/// Immutable once loaded. The typed fields cover the settings every profile
/// must carry; `settings` keeps the full raw `[settings]` section (including
/// keys like `compiler.libcxx`) and `conf` keeps the `[conf]` section, both
/// in file order so the profile round-trips to the external tool unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Profile name (file stem, e.g. "linux-clang15")
    pub name: String,
    /// Target operating system
    pub os: Os,
    /// Target architecture
    pub arch: Arch,
    /// Compiler identifier (e.g. "clang", "gcc", "msvc")
    pub compiler: String,
    /// Compiler version string (e.g. "15", "193")
    pub compiler_version: String,
    /// Build type
    pub build_type: BuildType,
    /// Raw `[settings]` entries in file order
    pub settings: IndexMap<String, String>,
    /// Raw `[conf]` entries in file order
    pub conf: IndexMap<String, String>,
    /// Any other sections, preserved verbatim for pass-through
    pub extra_sections: IndexMap<String, Vec<String>>,
}

impl Profile {
    /// Parse a profile from file contents
    ///
    /// `path` is used only for error reporting; `name` is the file stem.
    pub fn parse(name: &str, text: &str, path: &Path) -> Result<Self> {
        let mut settings: IndexMap<String, String> = IndexMap::new();
        let mut conf: IndexMap<String, String> = IndexMap::new();
        let mut extra_sections: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut section: Option<String> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                section = Some(line[1..line.len() - 1].trim().to_string());
                continue;
            }

            let Some(ref current) = section else {
                return Err(ConfigError::ProfileParse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    message: format!("entry outside of any section: {}", line),
                });
            };

            match current.as_str() {
                "settings" | "conf" => {
                    let Some((key, value)) = line.split_once('=') else {
                        return Err(ConfigError::ProfileParse {
                            path: path.to_path_buf(),
                            line: idx + 1,
                            message: format!("expected key=value, got: {}", line),
                        });
                    };
                    let target = if current == "settings" {
                        &mut settings
                    } else {
                        &mut conf
                    };
                    target.insert(key.trim().to_string(), value.trim().to_string());
                }
                // Unknown sections ([options], [buildenv], ...) are kept
                // verbatim so the file stays compatible with the tool.
                _ => {
                    extra_sections
                        .entry(current.clone())
                        .or_default()
                        .push(line.to_string());
                }
            }
        }

        let required = |key: &str| -> Result<String> {
            settings.get(key).cloned().ok_or_else(|| {
                ConfigError::InvalidProfile(format!(
                    "{}: missing [settings] key '{}'",
                    path.display(),
                    key
                ))
            })
        };

        let os = Os::parse(&required("os")?);
        let arch = Arch::parse(&required("arch")?);
        let compiler = required("compiler")?;
        let compiler_version = required("compiler.version")?;
        let build_type_raw = required("build_type")?;
        let build_type = BuildType::parse(&build_type_raw).ok_or_else(|| {
            ConfigError::InvalidProfile(format!(
                "{}: unknown build_type '{}'",
                path.display(),
                build_type_raw
            ))
        })?;

        Ok(Self {
            name: name.to_string(),
            os,
            arch,
            compiler,
            compiler_version,
            build_type,
            settings,
            conf,
            extra_sections,
        })
    }

    /// One-line human summary used by profile listings
    pub fn summary(&self) -> String {
        format!(
            "{} {} {} ({})",
            self.os, self.compiler, self.compiler_version, self.build_type
        )
    }
}
