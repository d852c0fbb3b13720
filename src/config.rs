//! Serializable multi-file patch plans.
//!
//! ```yaml
//! dry_run: false
//! steps:
//!   - recipe: nextjs-config
//!     path: next.config.mjs
//!     params: { org: acme, project: web }
//!   - path: wrangler.jsonc
//!     updates:
//!       - key: upload_source_maps
//!         value: true
//!   - path: ios/Podfile
//!     patch:
//!       type: insert_line
//!       content: pod 'Sentry'
//!       already: "pod 'Sentry'"
//!       anchors: [{ pattern: '^\s*pod\s' }]
//! ```

use crate::driver::{Driver, Outcome};
use crate::error::{PatchError, Result};
use crate::probe::Signature;
use crate::recipes::{self, RecipeParams};
use crate::transform::{ConfigUpdate, LinePatch, Patch};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One file operation in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanStep {
    /// A built-in recipe.
    Recipe {
        recipe: String,
        path: PathBuf,
        #[serde(default)]
        params: RecipeParams,
    },
    /// JS/TS patches.
    Code {
        path: PathBuf,
        patches: Vec<Patch>,
        #[serde(default)]
        signatures: Vec<Signature>,
    },
    /// JSON/JSONC updates.
    Config {
        path: PathBuf,
        updates: Vec<ConfigUpdate>,
    },
    /// A line-oriented patch.
    Text { path: PathBuf, patch: LinePatch },
}

impl PlanStep {
    pub fn path(&self) -> &Path {
        match self {
            PlanStep::Recipe { path, .. }
            | PlanStep::Code { path, .. }
            | PlanStep::Config { path, .. }
            | PlanStep::Text { path, .. } => path,
        }
    }

    /// Runs the step against a file, resolving relative paths from `root`.
    pub fn run(&self, driver: &Driver, root: &Path) -> Result<Outcome> {
        let path = root.join(self.path());
        match self {
            PlanStep::Recipe { recipe, params, .. } => recipes::by_name(recipe)?.run(driver, &path, params),
            PlanStep::Code {
                patches, signatures, ..
            } => driver.apply_code(&path, patches, signatures),
            PlanStep::Config { updates, .. } => driver.apply_config(&path, updates),
            PlanStep::Text { patch, .. } => driver.apply_text(&path, patch),
        }
    }
}

fn default_continue() -> bool {
    true
}

/// An ordered list of file operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchPlan {
    #[serde(default)]
    pub steps: Vec<PlanStep>,
    #[serde(default)]
    pub dry_run: bool,
    /// Keep going after a step returns an error.
    #[serde(default = "default_continue")]
    pub continue_on_error: bool,
}

impl Default for PatchPlan {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            dry_run: false,
            continue_on_error: true,
        }
    }
}

impl PatchPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: PlanStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Load a plan from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_plan(path.as_ref())?;
        serde_yaml::from_str(&content)
            .map_err(|e| PatchError::InvalidConfig(format!("Failed to parse YAML plan: {}", e)))
    }

    /// Load a plan from a JSON file.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_plan(path.as_ref())?;
        serde_json::from_str(&content)
            .map_err(|e| PatchError::InvalidConfig(format!("Failed to parse JSON plan: {}", e)))
    }

    /// Load a plan, choosing the format by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(path),
            Some("yaml" | "yml") => Self::from_yaml(path),
            other => Err(PatchError::InvalidConfig(format!(
                "unsupported plan format: {}",
                other.unwrap_or("(none)")
            ))),
        }
    }
}

fn read_plan(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        PatchError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read plan file {}: {}", path.display(), e),
        ))
    })
}

/// Result of one plan step.
#[derive(Debug, Serialize)]
pub struct StepReport {
    pub path: PathBuf,
    /// The outcome, or the error message if the step could not run.
    pub result: std::result::Result<Outcome, String>,
}

impl StepReport {
    pub fn is_error(&self) -> bool {
        self.result.is_err()
    }
}

/// Runs every step in order. Files are resolved relative to `root`.
///
/// A step's error is recorded in its report. Later steps still run unless the
/// plan sets `continue_on_error: false`.
pub fn run_plan(plan: &PatchPlan, driver: &Driver, root: &Path) -> Vec<StepReport> {
    let driver = driver.clone().dry_run(driver.is_dry_run() || plan.dry_run);
    let mut reports = Vec::with_capacity(plan.steps.len());
    for step in &plan.steps {
        let result = step.run(&driver, root);
        match &result {
            Ok(outcome) => info!(path = %step.path().display(), outcome = outcome.name(), "step finished"),
            Err(err) => warn!(path = %step.path().display(), error = %err, "step failed"),
        }
        let failed = result.is_err();
        reports.push(StepReport {
            path: step.path().to_path_buf(),
            result: result.map_err(|e| e.to_string()),
        });
        if failed && !plan.continue_on_error {
            break;
        }
    }
    reports
}
