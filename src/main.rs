//! Conforge CLI
//!
//! Profile-driven build orchestration for Conan package development.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{write_default_profiles, ProfileRegistry};
use console::style;
use package::{analyze_path, conan_home, BuildResult, ConanRunner, Orchestrator, RecipeSet};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "conforge",
    about = "Profile-driven build orchestration for Conan package development",
    version,
    author
)]
struct Cli {
    /// Directory holding *.profile definitions
    #[arg(
        long = "profiles-dir",
        env = "CONFORGE_PROFILES",
        default_value = "profiles",
        global = true
    )]
    profiles_dir: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up the development environment (write starter profiles)
    Setup {
        /// Recreate profiles even when they already exist
        #[arg(short, long)]
        force: bool,
    },

    /// Install dependencies under a profile
    Install {
        /// Profile to use (registry default when omitted)
        #[arg(short, long)]
        profile: Option<String>,

        /// Remove the build directory first
        #[arg(short, long)]
        clean: bool,
    },

    /// Build the package under a profile
    Build {
        /// Profile to use (registry default when omitted)
        #[arg(short, long)]
        profile: Option<String>,

        /// Remove the build directory first
        #[arg(short, long)]
        clean: bool,

        /// Run the test step after a successful build
        #[arg(short, long)]
        test: bool,
    },

    /// Run the package test step under a profile
    Test {
        /// Profile to use (registry default when omitted)
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// List available profiles
    ListProfiles,

    /// Show environment information
    Info,

    /// Analyze a requirements manifest for dependency conflicts
    Graph {
        /// Manifest path (conanfile.txt when omitted)
        manifest: Option<PathBuf>,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", style("error:").red().bold(), e);
            ExitCode::from(1)
        }
    }
}

/// Dispatch a subcommand; `Ok(false)` is an ordinary failure (exit 1)
fn run(cli: Cli) -> Result<bool> {
    let verbose = cli.verbose > 0;

    match cli.command {
        Commands::Setup { force } => {
            let written = write_default_profiles(&cli.profiles_dir, force)
                .context("failed to write starter profiles")?;
            if written.is_empty() {
                println!(
                    "Profiles in {} already present (use --force to recreate)",
                    cli.profiles_dir.display()
                );
            } else {
                println!("Wrote {} profiles to {}:", written.len(), cli.profiles_dir.display());
                for name in written {
                    println!("  {}", style(name).green());
                }
            }
            println!();
            println!("Next: conforge install");
            Ok(true)
        }

        Commands::Install { profile, clean } => {
            let registry = load_registry(&cli.profiles_dir)?;
            let orchestrator = orchestrator(&registry)?;
            let result = orchestrator.install(profile.as_deref(), verbose, clean)?;
            report_result(&result);
            Ok(result.success())
        }

        Commands::Build {
            profile,
            clean,
            test,
        } => {
            let registry = load_registry(&cli.profiles_dir)?;
            let orchestrator = orchestrator(&registry)?;
            let result = orchestrator.build(profile.as_deref(), verbose, clean, test)?;
            report_result(&result);
            Ok(result.success())
        }

        Commands::Test { profile } => {
            let registry = load_registry(&cli.profiles_dir)?;
            let orchestrator = orchestrator(&registry)?;
            let result = orchestrator.test(profile.as_deref(), verbose)?;
            report_result(&result);
            Ok(result.success())
        }

        Commands::ListProfiles => {
            let registry = load_registry(&cli.profiles_dir)?;
            let default = registry.default_profile().to_string();
            println!("Available profiles:");
            for (name, profile) in registry.iter() {
                let marker = if name == default { " (default)" } else { "" };
                println!(
                    "  {:20} {}{}",
                    style(name).cyan(),
                    profile.summary(),
                    style(marker).dim()
                );
            }
            Ok(true)
        }

        Commands::Info => {
            let cwd = std::env::current_dir()?;
            println!("Project root:  {}", cwd.display());
            println!("Profiles dir:  {}", cli.profiles_dir.display());

            match conan_home() {
                Some(home) => println!("Conan home:    {}", home.display()),
                None => println!("Conan home:    (default)"),
            }

            match load_registry(&cli.profiles_dir) {
                Ok(registry) => {
                    println!(
                        "Profiles:      {} loaded, default {}",
                        registry.len(),
                        style(registry.default_profile()).cyan()
                    );
                    if let Ok(orchestrator) = orchestrator(&registry) {
                        match orchestrator.tool_version() {
                            Ok(version) => println!("Tool:          {}", version),
                            Err(e) => println!("Tool:          {}", style(e).yellow()),
                        }
                    }
                }
                Err(e) => println!("Profiles:      {}", style(e).yellow()),
            }

            if let Ok(recipes) = RecipeSet::load("recipes") {
                println!("Recipes:       {}", recipes.len());
            }
            Ok(true)
        }

        Commands::Graph { manifest, json } => {
            let path = manifest.unwrap_or_else(|| PathBuf::from("conanfile.txt"));
            let report = analyze_path(&path)
                .with_context(|| format!("failed to analyze {}", path.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Total dependencies: {}", report.total_deps);
                for dep in &report.dependencies {
                    println!("  {}", dep);
                }
                if let Some(message) = &report.message {
                    println!("{}", style(message).dim());
                }
                if report.has_conflicts() {
                    println!();
                    println!("{}", style("Conflicts:").red().bold());
                    for conflict in &report.conflicts {
                        println!("  {}: {}", conflict.name, conflict.versions.join(", "));
                    }
                }
            }
            // Conflicts are findings, not failures
            Ok(true)
        }
    }
}

fn load_registry(profiles_dir: &PathBuf) -> Result<ProfileRegistry> {
    ProfileRegistry::load(profiles_dir).with_context(|| {
        format!(
            "failed to load profiles from {} (run 'conforge setup' first)",
            profiles_dir.display()
        )
    })
}

fn orchestrator(registry: &ProfileRegistry) -> Result<Orchestrator<'_, ConanRunner>> {
    let runner = ConanRunner::locate()?;
    let project_root = std::env::current_dir()?;
    Ok(Orchestrator::new(registry, runner, project_root))
}

fn report_result(result: &BuildResult) {
    if result.success() {
        println!(
            "{} {} under {} in {:.1?}",
            style("OK").green().bold(),
            result.command,
            result.profile,
            result.duration
        );
    } else {
        println!(
            "{} {} under {} exited with {}",
            style("FAILED").red().bold(),
            result.command,
            result.profile,
            result.exit_code
        );
        let stderr = result.stderr.trim();
        if !stderr.is_empty() {
            for line in stderr.lines().rev().take(20).collect::<Vec<_>>().into_iter().rev() {
                eprintln!("  {}", line);
            }
        }
    }
}
