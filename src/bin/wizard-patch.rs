//! CLI for the wizard-patch engine.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wizard_patch::prelude::*;
use wizard_patch::recipes;

#[derive(Parser)]
#[command(name = "wizard-patch")]
#[command(author, version, about = "Idempotent code and config patches for SDK setup", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ParamArgs {
    /// Organization slug
    #[arg(long)]
    org: Option<String>,

    /// Project slug
    #[arg(long)]
    project: Option<String>,

    /// Plugin or SDK version
    #[arg(long)]
    version: Option<String>,

    /// Client DSN
    #[arg(long)]
    dsn: Option<String>,

    /// Native target name (Xcode)
    #[arg(long)]
    target: Option<String>,
}

impl From<ParamArgs> for RecipeParams {
    fn from(args: ParamArgs) -> Self {
        RecipeParams {
            org: args.org,
            project: args.project,
            version: args.version,
            dsn: args.dsn,
            target: args.target,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a built-in recipe to one file
    Apply {
        /// Recipe name (see `recipes`)
        recipe: String,

        /// File to patch (defaults to the recipe's usual path)
        file: Option<PathBuf>,

        #[command(flatten)]
        params: ParamArgs,

        /// Preview changes without applying
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a YAML or JSON plan
    Run {
        /// Plan file
        plan: PathBuf,

        /// Directory that step paths are relative to
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Preview changes without applying
        #[arg(long)]
        dry_run: bool,
    },

    /// Check whether a recipe's change is already present
    Probe {
        /// Recipe name
        recipe: String,

        /// File to check
        file: Option<PathBuf>,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// List built-in recipes
    Recipes,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env("WIZARD_PATCH_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            recipe,
            file,
            params,
            dry_run,
        } => cmd_apply(&recipe, file, params.into(), dry_run),
        Commands::Run {
            plan,
            root,
            dry_run,
        } => cmd_run(&plan, &root, dry_run),
        Commands::Probe {
            recipe,
            file,
            params,
        } => cmd_probe(&recipe, file, params.into()),
        Commands::Recipes => cmd_recipes(),
    }
}

fn print_outcome(path: &Path, outcome: &Outcome, dry_run: bool) {
    match outcome {
        Outcome::Applied(change) if dry_run => {
            println!("{}", colorized_diff(&change.original, &change.transformed, path));
            println!("\n{}", DiffSummary::from_diff(&change.original, &change.transformed));
        }
        Outcome::Applied(_) => println!("Updated {}", path.display()),
        Outcome::AlreadyConfigured { reason } => {
            println!("{} is already configured ({reason})", path.display())
        }
        // Already printed by the driver.
        Outcome::FallbackShown(_) => {}
    }
}

fn cmd_apply(recipe: &str, file: Option<PathBuf>, params: RecipeParams, dry_run: bool) -> Result<()> {
    let recipe = recipes::by_name(recipe)?;
    let path = file.unwrap_or_else(|| PathBuf::from(recipe.default_path()));
    let driver = Driver::new().dry_run(dry_run);
    let outcome = recipe
        .run(&driver, &path, &params)
        .with_context(|| format!("Failed to apply {} to {}", recipe.name(), path.display()))?;
    print_outcome(&path, &outcome, dry_run);
    Ok(())
}

fn cmd_run(plan_path: &Path, root: &Path, dry_run: bool) -> Result<()> {
    let plan = PatchPlan::load(plan_path).context("Failed to load plan")?;
    let driver = Driver::new().dry_run(dry_run);
    let reports = run_plan(&plan, &driver, root);

    let mut failed = 0;
    for report in &reports {
        match &report.result {
            Ok(outcome) => print_outcome(&report.path, outcome, driver.is_dry_run() || plan.dry_run),
            Err(message) => {
                failed += 1;
                eprintln!("{}: {message}", report.path.display());
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} step(s) failed", reports.len());
    }
    Ok(())
}

fn cmd_probe(recipe: &str, file: Option<PathBuf>, params: RecipeParams) -> Result<()> {
    let recipe = recipes::by_name(recipe)?;
    let path = file.unwrap_or_else(|| PathBuf::from(recipe.default_path()));
    let result = recipe
        .probe(&path, &params)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let status = if result.configured { "configured" } else { "not configured" };
    match result.reason {
        Some(reason) => println!("{}: {status} ({reason})", path.display()),
        None => println!("{}: {status}", path.display()),
    }
    Ok(())
}

fn cmd_recipes() -> Result<()> {
    println!("Built-in recipes:");
    for recipe in recipes::all() {
        println!("  {:<22} {} ({})", recipe.name(), recipe.description(), recipe.default_path());
    }
    Ok(())
}
