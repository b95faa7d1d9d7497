//! Declarative recipe catalog
//!
//! A recipe describes one package of the openssl-* family as pure data:
//! identity, dependency references, build options, the copy steps of the
//! package stage, and the environment variables the package exports. The
//! per-option environment emission that upstream recipes spelled as chains
//! of conditionals is a table here, iterated once.

use crate::graph::PackageReference;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Option values treated as enabled when gating an env export
fn is_truthy(value: &str) -> bool {
    matches!(value, "True" | "true" | "1")
}

/// A configurable build option with its allowed values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeOption {
    /// Allowed values; boolean options use ["True", "False"]
    pub values: Vec<String>,
    /// Default value, always one of `values`
    pub default: String,
}

/// One copy step of the package stage, as data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopySpec {
    /// Glob pattern relative to `src`
    pub pattern: String,
    /// Source subdirectory relative to the source folder
    pub src: String,
    /// Destination subdirectory relative to the package folder
    pub dst: String,
}

/// A resolved copy step with absolute endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCopy {
    pub pattern: String,
    pub src: PathBuf,
    pub dst: PathBuf,
}

/// One row of the environment-export table
///
/// Exactly one of `literal`, `from_option`, `package_folder` supplies the
/// value. An entry with `option` set is emitted only when that option is
/// truthy in the effective option set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvExport {
    /// Gate: emit only when this option is enabled
    #[serde(default)]
    pub option: Option<String>,
    /// Environment variable name
    pub var: String,
    /// Fixed value
    #[serde(default)]
    pub literal: Option<String>,
    /// Take the effective value of the named option
    #[serde(default)]
    pub from_option: Option<String>,
    /// Use the package folder path
    #[serde(default)]
    pub package_folder: bool,
}

/// A declarative package descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub topics: Vec<String>,
    /// Dependency references as `name/version` tokens
    #[serde(default)]
    pub requires: Vec<String>,
    /// Build options in declaration order
    #[serde(default)]
    pub options: IndexMap<String, RecipeOption>,
    /// Package-stage copy steps
    #[serde(default)]
    pub exports: Vec<CopySpec>,
    /// Environment-export table
    #[serde(default, rename = "env")]
    pub env_exports: Vec<EnvExport>,
}

impl Recipe {
    /// The recipe's own `name/version` reference
    pub fn reference(&self) -> PackageReference {
        PackageReference::new(&self.name, &self.version)
    }

    /// Dependency references parsed from the `requires` tokens
    pub fn requirements(&self) -> Vec<PackageReference> {
        self.requires
            .iter()
            .map(|token| PackageReference::parse(token))
            .collect()
    }

    /// Effective option values: defaults overridden by `overrides`
    ///
    /// Unknown override keys are ignored; the external tool is the authority
    /// on rejecting those.
    pub fn effective_options(
        &self,
        overrides: &IndexMap<String, String>,
    ) -> IndexMap<String, String> {
        self.options
            .iter()
            .map(|(name, option)| {
                let value = overrides.get(name).unwrap_or(&option.default).clone();
                (name.clone(), value)
            })
            .collect()
    }

    /// Environment variables the package exports, from the table
    pub fn environment(
        &self,
        package_folder: &Path,
        overrides: &IndexMap<String, String>,
    ) -> Vec<(String, String)> {
        let options = self.effective_options(overrides);
        let mut env = Vec::new();

        for export in &self.env_exports {
            if let Some(gate) = &export.option {
                let enabled = options.get(gate).map(|v| is_truthy(v)).unwrap_or(false);
                if !enabled {
                    continue;
                }
            }

            let value = if let Some(literal) = &export.literal {
                literal.clone()
            } else if let Some(option) = &export.from_option {
                match options.get(option) {
                    Some(value) => value.clone(),
                    None => continue,
                }
            } else if export.package_folder {
                package_folder.display().to_string()
            } else {
                continue;
            };

            env.push((export.var.clone(), value));
        }

        env
    }

    /// Copy steps resolved against concrete source and package folders
    pub fn package_plan(&self, source_folder: &Path, package_folder: &Path) -> Vec<ResolvedCopy> {
        self.exports
            .iter()
            .map(|spec| ResolvedCopy {
                pattern: spec.pattern.clone(),
                src: source_folder.join(&spec.src),
                dst: package_folder.join(&spec.dst),
            })
            .collect()
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |message: String| Error::Recipe {
            path: path.to_path_buf(),
            message,
        };

        if self.name.is_empty() {
            return Err(invalid("recipe name is empty".to_string()));
        }
        if self.version.is_empty() {
            return Err(invalid(format!("recipe {} has no version", self.name)));
        }

        for (name, option) in &self.options {
            if !option.values.contains(&option.default) {
                return Err(invalid(format!(
                    "option '{}' default '{}' is not among its values",
                    name, option.default
                )));
            }
        }

        for export in &self.env_exports {
            let sources = usize::from(export.literal.is_some())
                + usize::from(export.from_option.is_some())
                + usize::from(export.package_folder);
            if sources != 1 {
                return Err(invalid(format!(
                    "env export '{}' must set exactly one of literal, from_option, package_folder",
                    export.var
                )));
            }
            if let Some(gate) = &export.option {
                if !self.options.contains_key(gate) {
                    return Err(invalid(format!(
                        "env export '{}' gated on unknown option '{}'",
                        export.var, gate
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Name-keyed catalog of recipes loaded from a directory of TOML descriptors
#[derive(Debug, Clone, Default)]
pub struct RecipeSet {
    recipes: BTreeMap<String, Recipe>,
}

impl RecipeSet {
    /// Load every `*.toml` descriptor in `dir`
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut recipes = BTreeMap::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }

            let text = std::fs::read_to_string(&path)?;
            let recipe: Recipe = toml::from_str(&text).map_err(|e| Error::Recipe {
                path: path.clone(),
                message: e.to_string(),
            })?;
            recipe.validate(&path)?;
            debug!("Loaded recipe {} from {}", recipe.name, path.display());

            if recipes.contains_key(&recipe.name) {
                return Err(Error::DuplicateRecipe(recipe.name));
            }
            recipes.insert(recipe.name.clone(), recipe);
        }

        Ok(Self { recipes })
    }

    pub fn get(&self, name: &str) -> Result<&Recipe> {
        self.recipes
            .get(name)
            .ok_or_else(|| Error::RecipeNotFound(name.to_string()))
    }

    /// Sorted recipe names
    pub fn names(&self) -> Vec<&str> {
        self.recipes.keys().map(|s| s.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Recipe)> {
        self.recipes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Render the union of all recipe requirements as a `[requires]` manifest
    ///
    /// Exact duplicate references collapse; distinct versions of one name are
    /// kept so the graph analyzer can flag them.
    pub fn requirements_manifest(&self) -> String {
        let mut seen: Vec<PackageReference> = Vec::new();
        for recipe in self.recipes.values() {
            for reference in recipe.requirements() {
                if !seen.contains(&reference) {
                    seen.push(reference);
                }
            }
        }

        let mut out = String::from("[requires]\n");
        for reference in &seen {
            out.push_str(&reference.to_string());
            out.push('\n');
        }
        out
    }
}
