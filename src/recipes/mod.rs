//! Framework recipes: named bundles of signatures and patches for one file.
//!
//! A recipe holds no logic of its own. It describes the change, and the
//! [`Driver`] for the file kind does the probing, patching and writing.
//!
//! # Example
//!
//! ```rust,no_run
//! use wizard_patch::driver::Driver;
//! use wizard_patch::recipes::{RecipeParams, by_name};
//! use std::path::Path;
//!
//! let recipe = by_name("nextjs-config")?;
//! let params = RecipeParams::default().org("acme").project("web");
//! let outcome = recipe.run(&Driver::new(), Path::new("next.config.mjs"), &params)?;
//! println!("{}", outcome.name());
//! # Ok::<(), wizard_patch::error::PatchError>(())
//! ```

mod javascript;
mod native;
mod wrangler;

pub use javascript::{CloudflareWorker, NextjsConfig, ReactRouterRoutes, ViteConfig};
pub use native::{AndroidGradle, FastlaneGemfile, Podfile, ReactNativeXcode, XcodeUploadPhase};
pub use wrangler::{WranglerJsonc, WranglerToml, wrangler_main_entry};

use crate::driver::{Driver, Outcome};
use crate::error::{PatchError, Result};
use crate::probe::{ProbeResult, Signature, probe_file};
use crate::transform::{ConfigUpdate, LinePatch, Patch};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Values substituted into a recipe's patches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeParams {
    pub org: Option<String>,
    pub project: Option<String>,
    pub version: Option<String>,
    pub dsn: Option<String>,
    /// Native target name (Xcode).
    pub target: Option<String>,
}

impl RecipeParams {
    pub fn org(mut self, org: impl Into<String>) -> Self {
        self.org = Some(org.into());
        self
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = Some(dsn.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    fn org_or_placeholder(&self) -> &str {
        self.org.as_deref().unwrap_or("___ORG_SLUG___")
    }

    fn project_or_placeholder(&self) -> &str {
        self.project.as_deref().unwrap_or("___PROJECT_SLUG___")
    }

    fn dsn_or_placeholder(&self) -> &str {
        self.dsn.as_deref().unwrap_or("___PUBLIC_DSN___")
    }
}

/// The change a recipe makes, by file kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Code(Vec<Patch>),
    Config(Vec<ConfigUpdate>),
    Text(LinePatch),
}

/// A reusable wizard step for one kind of file.
pub trait Recipe: Send + Sync {
    /// Unique name for this recipe.
    fn name(&self) -> &str;

    /// Human-readable description of what this recipe does.
    fn description(&self) -> &str;

    /// Where the file usually lives, relative to the project root.
    fn default_path(&self) -> &str;

    /// Evidence that the change is already present.
    fn signatures(&self, _params: &RecipeParams) -> Vec<Signature> {
        Vec::new()
    }

    /// The change for the file at `path`.
    fn change(&self, path: &Path, params: &RecipeParams) -> Change;

    /// Applies the change through the driver for its file kind.
    fn run(&self, driver: &Driver, path: &Path, params: &RecipeParams) -> Result<Outcome> {
        match self.change(path, params) {
            Change::Code(patches) => driver.apply_code(path, &patches, &self.signatures(params)),
            Change::Config(updates) => {
                driver.apply_config_probed(path, &updates, &self.signatures(params))
            }
            Change::Text(patch) => driver.apply_text(path, &patch),
        }
    }

    /// Checks the file without changing it.
    fn probe(&self, path: &Path, params: &RecipeParams) -> Result<ProbeResult> {
        probe_file(path, &self.signatures(params))
    }
}

/// Returns every built-in recipe.
pub fn all() -> Vec<Box<dyn Recipe>> {
    vec![
        Box::new(NextjsConfig),
        Box::new(ViteConfig),
        Box::new(ReactRouterRoutes),
        Box::new(CloudflareWorker),
        Box::new(WranglerJsonc),
        Box::new(WranglerToml),
        Box::new(Podfile),
        Box::new(FastlaneGemfile),
        Box::new(AndroidGradle),
        Box::new(ReactNativeXcode),
        Box::new(XcodeUploadPhase),
    ]
}

/// Looks up a built-in recipe by name.
pub fn by_name(name: &str) -> Result<Box<dyn Recipe>> {
    all()
        .into_iter()
        .find(|r| r.name() == name)
        .ok_or_else(|| PatchError::UnknownRecipe(name.to_string()))
}
