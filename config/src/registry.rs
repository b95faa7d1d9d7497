//! Profile registry
//!
//! Loads every `*.profile` file from a directory into an immutable,
//! name-keyed registry. The registry is constructed explicitly and handed to
//! whoever needs it; there is no process-wide profile state.

use crate::{ConfigError, Profile, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extension for profile definitions
pub const PROFILE_EXT: &str = "profile";

/// Environment variable signalling CI mode; affects default profile choice
pub const CI_ENV: &str = "CI";

/// Starter profiles written by `write_default_profiles`
pub const STARTER_PROFILES: &[(&str, &str)] = &[
    (
        "linux-gcc11",
        "[settings]\n\
         os=Linux\n\
         arch=x86_64\n\
         compiler=gcc\n\
         compiler.version=11\n\
         compiler.libcxx=libstdc++11\n\
         build_type=Release\n\
         \n\
         [conf]\n\
         tools.cmake.cmaketoolchain:generator=Ninja\n\
         tools.system.package_manager:mode=install\n",
    ),
    (
        "linux-clang15",
        "[settings]\n\
         os=Linux\n\
         arch=x86_64\n\
         compiler=clang\n\
         compiler.version=15\n\
         compiler.libcxx=libstdc++11\n\
         build_type=Release\n\
         \n\
         [conf]\n\
         tools.cmake.cmaketoolchain:generator=Ninja\n\
         tools.system.package_manager:mode=install\n",
    ),
    (
        "windows-msvc2022",
        "[settings]\n\
         os=Windows\n\
         arch=x86_64\n\
         compiler=msvc\n\
         compiler.version=193\n\
         compiler.runtime=dynamic\n\
         build_type=Release\n\
         \n\
         [conf]\n\
         tools.cmake.cmaketoolchain:generator=Visual Studio 17 2022\n",
    ),
    (
        "macos-clang14",
        "[settings]\n\
         os=Macos\n\
         arch=armv8\n\
         compiler=apple-clang\n\
         compiler.version=14\n\
         compiler.libcxx=libc++\n\
         build_type=Release\n\
         \n\
         [conf]\n\
         tools.cmake.cmaketoolchain:generator=Ninja\n",
    ),
];

/// Immutable mapping of profile name to [`Profile`]
///
/// Keys are file stems. Populated once by [`ProfileRegistry::load`] and read
/// thereafter; a BTreeMap keeps name listings deterministic.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, Profile>,
    root: PathBuf,
}

impl ProfileRegistry {
    /// Load all profiles from a directory
    ///
    /// Fails with [`ConfigError::NoProfiles`] when the directory is missing
    /// or holds no `*.profile` files, so lookups never run against an empty
    /// registry. Non-profile files are skipped with a log line.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ConfigError::NoProfiles(dir.to_path_buf()));
        }

        let mut profiles = BTreeMap::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PROFILE_EXT) {
                if path.is_file() {
                    warn!("Skipping non-profile file: {}", path.display());
                }
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let text = std::fs::read_to_string(&path)?;
            let profile = Profile::parse(stem, &text, &path)?;
            debug!("Loaded profile {} from {}", stem, path.display());
            profiles.insert(stem.to_string(), profile);
        }

        if profiles.is_empty() {
            return Err(ConfigError::NoProfiles(dir.to_path_buf()));
        }

        Ok(Self {
            profiles,
            root: dir.to_path_buf(),
        })
    }

    /// Build a registry from already-parsed profiles (used by tests)
    pub fn from_profiles(profiles: impl IntoIterator<Item = Profile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
            root: PathBuf::new(),
        }
    }

    /// Look up a profile by name
    pub fn get(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))
    }

    /// Sorted profile names
    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(|s| s.as_str()).collect()
    }

    /// Iterate profiles in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Profile)> {
        self.profiles.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Directory the registry was loaded from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the default profile
    ///
    /// A profile literally named `default` always wins. Otherwise, in CI
    /// mode a profile named `ci` is preferred when present. Falls back to
    /// the first name alphabetically.
    pub fn default_profile(&self) -> &str {
        self.default_profile_in(std::env::var_os(CI_ENV).is_some())
    }

    /// Default profile selection with an explicit CI-mode flag
    pub fn default_profile_in(&self, ci_mode: bool) -> &str {
        if self.profiles.contains_key("default") {
            return "default";
        }
        if ci_mode && self.profiles.contains_key("ci") {
            return "ci";
        }
        // Registry is never empty after load
        self.profiles
            .keys()
            .next()
            .map(|s| s.as_str())
            .unwrap_or("default")
    }
}

/// Write the starter profiles into `dir`
///
/// Existing files are left alone unless `force` is set. Returns the names of
/// the profiles actually written.
pub fn write_default_profiles(dir: impl AsRef<Path>, force: bool) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for (name, body) in STARTER_PROFILES {
        let path = dir.join(format!("{}.{}", name, PROFILE_EXT));
        if path.exists() && !force {
            debug!("Keeping existing profile {}", path.display());
            continue;
        }
        std::fs::write(&path, body)?;
        written.push(name.to_string());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn fixture_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_default_profiles(dir.path(), false).unwrap();
        dir
    }

    #[test]
    fn test_load_keys_match_file_stems() {
        let dir = fixture_dir();
        let registry = ProfileRegistry::load(dir.path()).unwrap();

        let expected: BTreeSet<&str> = STARTER_PROFILES.iter().map(|(n, _)| *n).collect();
        let actual: BTreeSet<&str> = registry.names().into_iter().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_get_round_trips_fields() {
        let dir = fixture_dir();
        let registry = ProfileRegistry::load(dir.path()).unwrap();

        let profile = registry.get("windows-msvc2022").unwrap();
        assert_eq!(profile.compiler, "msvc");
        assert_eq!(profile.compiler_version, "193");
        assert_eq!(
            profile.settings.get("compiler.runtime").map(|s| s.as_str()),
            Some("dynamic")
        );
    }

    #[test]
    fn test_get_unknown_profile() {
        let dir = fixture_dir();
        let registry = ProfileRegistry::load(dir.path()).unwrap();
        assert_matches!(
            registry.get("nonexistent"),
            Err(ConfigError::ProfileNotFound(name)) if name == "nonexistent"
        );
    }

    #[test]
    fn test_load_missing_directory() {
        let result = ProfileRegistry::load("/nonexistent/profiles");
        assert_matches!(result, Err(ConfigError::NoProfiles(_)));
    }

    #[test]
    fn test_load_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProfileRegistry::load(dir.path());
        assert_matches!(result, Err(ConfigError::NoProfiles(_)));
    }

    #[test]
    fn test_load_malformed_profile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.profile"), "os=Linux\n").unwrap();
        let result = ProfileRegistry::load(dir.path());
        assert_matches!(result, Err(ConfigError::ProfileParse { .. }));
    }

    #[test]
    fn test_default_profile_alphabetical() {
        let dir = fixture_dir();
        let registry = ProfileRegistry::load(dir.path()).unwrap();
        assert_eq!(registry.default_profile_in(false), "linux-clang15");
    }

    #[test]
    fn test_default_profile_ci_mode() {
        let dir = fixture_dir();
        std::fs::write(
            dir.path().join("ci.profile"),
            STARTER_PROFILES[0].1,
        )
        .unwrap();
        let registry = ProfileRegistry::load(dir.path()).unwrap();

        assert_eq!(registry.default_profile_in(true), "ci");
        // Without CI mode the ci profile is just another entry
        assert_eq!(registry.default_profile_in(false), "ci");
    }

    #[test]
    fn test_default_profile_named_default_wins() {
        let dir = fixture_dir();
        std::fs::write(
            dir.path().join("default.profile"),
            STARTER_PROFILES[0].1,
        )
        .unwrap();
        std::fs::write(dir.path().join("ci.profile"), STARTER_PROFILES[0].1).unwrap();
        let registry = ProfileRegistry::load(dir.path()).unwrap();

        assert_eq!(registry.default_profile_in(true), "default");
    }

    #[test]
    fn test_write_default_profiles_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_default_profiles(dir.path(), false).unwrap();
        assert_eq!(first.len(), STARTER_PROFILES.len());

        let second = write_default_profiles(dir.path(), false).unwrap();
        assert!(second.is_empty());

        let forced = write_default_profiles(dir.path(), true).unwrap();
        assert_eq!(forced.len(), STARTER_PROFILES.len());
    }
}
