//! Patch descriptions: pure data, no document attached.

use crate::value::ConfigValue;
use serde::{Deserialize, Serialize};

/// One semantic change to a JavaScript/TypeScript module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Patch {
    AddImport(ImportSpec),
    WrapDefaultExport(WrapSpec),
    AddArrayElement(ArraySpec),
    SetOrMergeProperty(PropertySpec),
}

/// Which module system new import statements use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStyle {
    /// Follow the file: ESM if it has import/export statements, CommonJS if
    /// it uses `require`/`module.exports`.
    #[default]
    Auto,
    Esm,
    CommonJs,
}

/// The binding an import introduces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportBinding {
    /// `import name from "m"`
    Default(String),
    /// `import { name } from "m"`
    Named(String),
    /// `import * as name from "m"`
    Namespace(String),
    /// `import "m"`
    SideEffect,
}

impl ImportBinding {
    /// The local name the binding introduces.
    pub fn local_name(&self) -> Option<&str> {
        match self {
            ImportBinding::Default(name)
            | ImportBinding::Named(name)
            | ImportBinding::Namespace(name) => Some(name),
            ImportBinding::SideEffect => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    pub module: String,
    pub binding: ImportBinding,
    #[serde(default)]
    pub style: ModuleStyle,
}

impl ImportSpec {
    pub fn named(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            binding: ImportBinding::Named(name.into()),
            style: ModuleStyle::Auto,
        }
    }

    pub fn default_import(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            binding: ImportBinding::Default(name.into()),
            style: ModuleStyle::Auto,
        }
    }

    pub fn namespace(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            binding: ImportBinding::Namespace(name.into()),
            style: ModuleStyle::Auto,
        }
    }

    pub fn with_style(mut self, style: ModuleStyle) -> Self {
        self.style = style;
        self
    }
}

/// What to do when the export is already wrapped by the same callee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    /// Leave an existing wrap untouched.
    #[default]
    KeepExisting,
    /// Peel the existing wrap and apply it again with the new arguments.
    Rewrap,
}

/// Wraps the exported expression `E` as `callee(leading..., E, trailing...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrapSpec {
    pub callee: String,
    #[serde(default)]
    pub leading_args: Vec<ConfigValue>,
    #[serde(default)]
    pub trailing_args: Vec<ConfigValue>,
    #[serde(default)]
    pub mode: WrapMode,
}

impl WrapSpec {
    pub fn new(callee: impl Into<String>) -> Self {
        Self {
            callee: callee.into(),
            leading_args: Vec::new(),
            trailing_args: Vec::new(),
            mode: WrapMode::KeepExisting,
        }
    }

    pub fn leading_arg(mut self, arg: ConfigValue) -> Self {
        self.leading_args.push(arg);
        self
    }

    pub fn trailing_arg(mut self, arg: ConfigValue) -> Self {
        self.trailing_args.push(arg);
        self
    }

    pub fn rewrap(mut self) -> Self {
        self.mode = WrapMode::Rewrap;
        self
    }
}

/// How array elements are compared when skipping duplicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementMatch {
    /// Same value, or same source text ignoring whitespace and quote style.
    #[default]
    Text,
    /// Additionally, two calls to the same callee are the same element.
    Callee,
}

/// The array an element is appended to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayTarget {
    /// `export default [...]`, possibly `satisfies T`.
    DefaultExport,
    /// A property of the exported config object, by key path.
    Property(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArraySpec {
    pub target: ArrayTarget,
    pub elements: Vec<ConfigValue>,
    #[serde(default)]
    pub matching: ElementMatch,
}

/// How a value is combined with an existing property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Replace the value.
    #[default]
    Overwrite,
    /// Existing elements in order, then new ones not already present.
    UnionDedupe,
    /// Recurse into objects; insert missing keys, overwrite the rest.
    DeepMergeObject,
}

/// Sets `key` on the object at `path` (relative to the exported config
/// object, or to the root of a JSON document).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    #[serde(default)]
    pub path: Vec<String>,
    pub key: String,
    pub value: ConfigValue,
    #[serde(default)]
    pub strategy: MergeStrategy,
}

/// A config-file update is a property update on the document root.
pub type ConfigUpdate = PropertySpec;

impl PropertySpec {
    pub fn new(key: impl Into<String>, value: ConfigValue, strategy: MergeStrategy) -> Self {
        Self {
            path: Vec::new(),
            key: key.into(),
            value,
            strategy,
        }
    }

    pub fn overwrite(key: impl Into<String>, value: ConfigValue) -> Self {
        Self::new(key, value, MergeStrategy::Overwrite)
    }

    pub fn union(key: impl Into<String>, value: ConfigValue) -> Self {
        Self::new(key, value, MergeStrategy::UnionDedupe)
    }

    pub fn deep_merge(key: impl Into<String>, value: ConfigValue) -> Self {
        Self::new(key, value, MergeStrategy::DeepMergeObject)
    }

    pub fn at(mut self, path: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }
}
