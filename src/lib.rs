//! # wizard-patch
//!
//! Idempotent, format-preserving edits to the files an SDK setup wizard
//! touches: JS/TS config modules, JSON/JSONC configs and line-oriented build
//! files (Podfile, Gemfile, Gradle, Xcode projects).
//!
//! Every file operation follows the same path: load, probe for an existing
//! integration, locate an insertion point, mutate, print and write. When any
//! step cannot be done safely the file is left untouched and the user gets a
//! copy-paste snippet instead.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wizard_patch::prelude::*;
//!
//! let outcome = apply_code_mutation(
//!     "next.config.mjs",
//!     &[
//!         Patch::AddImport(ImportSpec::named("@sentry/nextjs", "withSentryConfig")),
//!         Patch::WrapDefaultExport(
//!             WrapSpec::new("withSentryConfig")
//!                 .trailing_arg(ConfigValue::object([("org", ConfigValue::string("acme"))])),
//!         ),
//!     ],
//!     &[Signature::calls("withSentryConfig")],
//! )?;
//! println!("{}", outcome.name());
//! # Ok::<(), wizard_patch::error::PatchError>(())
//! ```
//!
//! ## Config files
//!
//! ```rust,no_run
//! use wizard_patch::prelude::*;
//!
//! // Comments, trailing commas and indentation survive.
//! apply_config_mutation(
//!     "wrangler.jsonc",
//!     &[
//!         ConfigUpdate::union("compatibility_flags", ConfigValue::strings(["nodejs_als"])),
//!         ConfigUpdate::overwrite("upload_source_maps", true.into()),
//!     ],
//! )?;
//! # Ok::<(), wizard_patch::error::PatchError>(())
//! ```
//!
//! ## Recipes
//!
//! ```rust,no_run
//! use wizard_patch::prelude::*;
//! use std::path::Path;
//!
//! let recipe = recipes::by_name("podfile")?;
//! recipe.run(&Driver::new(), Path::new("ios/Podfile"), &RecipeParams::default())?;
//! # Ok::<(), wizard_patch::error::PatchError>(())
//! ```

pub mod config;
pub mod diff;
pub mod document;
pub mod driver;
pub mod error;
pub mod fallback;
pub mod jsonc;
pub mod lang;
pub mod locate;
pub mod probe;
pub mod recipes;
pub mod syntax;
pub mod transform;
pub mod value;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{PatchPlan, PlanStep, StepReport, run_plan};
    pub use crate::diff::{DiffSummary, colorized_diff, unified_diff};
    pub use crate::document::SourceDocument;
    pub use crate::driver::{
        Driver, Outcome, apply_code_mutation, apply_config_mutation, apply_text_mutation, probe,
        toml_instructions,
    };
    pub use crate::error::{PatchError, Result};
    pub use crate::fallback::{Fallback, FallbackReason, FallbackSnippet};
    pub use crate::lang::{Dialect, Language, LanguageRegistry, Tsx, TypeScript};
    pub use crate::locate::{Anchor, InsertionPoint, Occurrence};
    pub use crate::probe::{ProbeResult, Signature, ValueShape, has_integration};
    pub use crate::recipes::{self, Change, Recipe, RecipeParams};
    pub use crate::transform::{
        ArraySpec, ArrayTarget, BuildPhaseSpec, ConfigUpdate, ElementMatch, FileChange,
        GradlePlugin, ImportBinding, ImportSpec, InsertLine, LinePatch, MergeStrategy, ModuleStyle,
        ObjectIdGenerator, Patch, PropertySpec, SequentialIdGenerator, Transform,
        TransformBuilder, WrapMode, WrapSpec,
    };
    pub use crate::value::{ConfigValue, RenderStyle};
}

pub use prelude::*;
