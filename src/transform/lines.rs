//! Regex-anchored mutators for line-oriented build files.

use super::xcode::{self, BuildPhaseSpec, ObjectIdGenerator};
use crate::error::{PatchError, Result};
use crate::locate::lines::{find_block, lines};
use crate::locate::{Anchor, InsertionPoint, LineLocator};
use crate::syntax::{end_of_content_before, line_ending};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One change to a line-oriented file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinePatch {
    /// Insert a line after an anchor line.
    InsertLine(InsertLine),
    /// Register a Gradle plugin.
    GradlePlugin(GradlePlugin),
    /// Route the React Native bundle phase through `sentry-xcode.sh`.
    ReactNativeXcode,
    /// Add a shell-script build phase to an Xcode project.
    XcodeBuildPhase(BuildPhaseSpec),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertLine {
    /// The line to insert, without indentation.
    pub content: String,
    /// Multi-line regex that matches when the line is already present.
    pub already: String,
    /// Anchors in precedence order.
    pub anchors: Vec<Anchor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradlePlugin {
    pub id: String,
    pub version: String,
    /// Kotlin DSL (`build.gradle.kts`) syntax.
    #[serde(default)]
    pub kotlin: bool,
}

/// Script shipped by the React Native SDK that wraps the bundler.
pub const SENTRY_XCODE_SCRIPT: &str = "../node_modules/@sentry/react-native/scripts/sentry-xcode.sh";
const REACT_NATIVE_XCODE_TOKEN: &str = "$REACT_NATIVE_XCODE";
const REACT_NATIVE_XCODE_SCRIPT: &str = "react-native-xcode.sh";

impl LinePatch {
    /// Returns true if the file already contains the change.
    pub fn is_applied(&self, text: &str) -> Result<bool> {
        Ok(match self {
            LinePatch::InsertLine(insert) => Regex::new(&insert.already)?.is_match(text),
            LinePatch::GradlePlugin(plugin) => {
                Regex::new(&format!(r#"['"]{}['"]"#, regex::escape(&plugin.id)))?.is_match(text)
            }
            LinePatch::ReactNativeXcode => text.contains("sentry-xcode.sh"),
            LinePatch::XcodeBuildPhase(spec) => xcode::has_build_phase(text, spec),
        })
    }

    /// Computes the patched text. Fails with a locator miss when no anchor
    /// is found.
    pub fn apply(&self, text: &str, ids: &mut dyn ObjectIdGenerator) -> Result<String> {
        match self {
            LinePatch::InsertLine(insert) => insert_line(text, insert),
            LinePatch::GradlePlugin(plugin) => add_gradle_plugin(text, plugin),
            LinePatch::ReactNativeXcode => wrap_react_native_xcode(text),
            LinePatch::XcodeBuildPhase(spec) => xcode::add_build_phase(text, spec, ids),
        }
    }

    /// Returns a short description of the change.
    pub fn describe(&self) -> String {
        match self {
            LinePatch::InsertLine(insert) => format!("add `{}`", insert.content),
            LinePatch::GradlePlugin(plugin) => format!("apply the {} Gradle plugin", plugin.id),
            LinePatch::ReactNativeXcode => "run sentry-xcode.sh around the bundler".to_string(),
            LinePatch::XcodeBuildPhase(spec) => format!("add the \"{}\" build phase", spec.name),
        }
    }

    /// Returns the lines a user would add by hand.
    pub fn instructions(&self) -> Vec<String> {
        match self {
            LinePatch::InsertLine(insert) => vec![insert.content.clone()],
            LinePatch::GradlePlugin(plugin) => vec![
                "plugins {".to_string(),
                format!("    {}", plugin.declaration()),
                "}".to_string(),
            ],
            LinePatch::ReactNativeXcode => vec![
                "/bin/sh -c \"$WITH_ENVIRONMENT \\\"/bin/sh ".to_string()
                    + SENTRY_XCODE_SCRIPT
                    + " $REACT_NATIVE_XCODE\\\"\"",
            ],
            LinePatch::XcodeBuildPhase(spec) => spec.script.lines().map(str::to_string).collect(),
        }
    }
}

/// Inserts `line` after the anchor line, copying its indentation.
fn insert_after(text: &str, point: InsertionPoint<'_>, line: &str) -> String {
    let nl = line_ending(text);
    let (end, indent) = match point {
        InsertionPoint::AfterLine { end, indent } => (end, indent),
        other => (other.offset(), ""),
    };
    let mut out = String::with_capacity(text.len() + line.len() + 8);
    out.push_str(&text[..end]);
    out.push_str(nl);
    out.push_str(indent);
    out.push_str(line);
    if end == text.len() {
        out.push_str(nl);
    }
    out.push_str(&text[end..]);
    out
}

fn insert_line(text: &str, insert: &InsertLine) -> Result<String> {
    let point = LineLocator::new(&insert.anchors)?
        .locate(text)
        .ok_or_else(|| PatchError::locator_miss(format!("an anchor line for `{}`", insert.content)))?;
    Ok(insert_after(text, point, &insert.content))
}

impl GradlePlugin {
    /// The `plugins {}` entry for this plugin.
    pub fn declaration(&self) -> String {
        if self.kotlin {
            format!("id(\"{}\") version \"{}\"", self.id, self.version)
        } else {
            format!("id \"{}\" version \"{}\"", self.id, self.version)
        }
    }

    fn apply_line(&self) -> String {
        if self.kotlin {
            format!("apply(plugin = \"{}\")", self.id)
        } else {
            format!("apply plugin: '{}'", self.id)
        }
    }
}

fn add_gradle_plugin(text: &str, plugin: &GradlePlugin) -> Result<String> {
    let nl = line_ending(text);
    if let Some(block) = find_block(text, "plugins") {
        let indent = block
            .inner_indent
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}    ", block.indent));
        let at = end_of_content_before(text, block.close).max(block.open + 1);
        let mut insertion = format!("{nl}{indent}{}", plugin.declaration());
        if !text[at..block.close].contains('\n') {
            insertion.push_str(nl);
            insertion.push_str(block.indent);
        }
        let mut out = text.to_string();
        out.insert_str(at, &insertion);
        return Ok(out);
    }

    let locator = LineLocator::new(&[
        Anchor::last(r#"^\s*apply\s+plugin:\s*['"]com\.android\.application['"]"#),
        Anchor::last(r#"^\s*apply\(\s*plugin\s*=\s*"com\.android\.application"\s*\)"#),
    ])?;
    let point = locator
        .locate(text)
        .ok_or_else(|| PatchError::locator_miss("a plugins block or com.android.application plugin"))?;
    Ok(insert_after(text, point, &plugin.apply_line()))
}

fn wrap_react_native_xcode(text: &str) -> Result<String> {
    // The token appears in the invocation, never in the `REACT_NATIVE_XCODE=` assignment.
    if let Some(pos) = text.rfind(REACT_NATIVE_XCODE_TOKEN) {
        let replacement = format!("\\\"/bin/sh {SENTRY_XCODE_SCRIPT} {REACT_NATIVE_XCODE_TOKEN}\\\"");
        let mut out = text.to_string();
        out.replace_range(pos..pos + REACT_NATIVE_XCODE_TOKEN.len(), &replacement);
        return Ok(out);
    }

    let invocation = lines(text)
        .filter(|(_, line)| line.contains(REACT_NATIVE_XCODE_SCRIPT) && !line.trim_start().starts_with('#'))
        .last()
        .ok_or_else(|| PatchError::locator_miss("the react-native-xcode.sh invocation"))?;
    let (start, line) = invocation;
    let script_start = line[..line.find(REACT_NATIVE_XCODE_SCRIPT).unwrap_or(0)]
        .rfind(|c: char| c.is_whitespace() || c == '"' || c == '\'')
        .map(|i| i + 1)
        .unwrap_or(0);
    let mut out = text.to_string();
    out.insert_str(start + script_start, &format!("{SENTRY_XCODE_SCRIPT} "));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::xcode::SequentialIdGenerator;

    fn podfile_patch() -> LinePatch {
        LinePatch::InsertLine(InsertLine {
            content: "pod 'Sentry'".to_string(),
            already: r#"(?m)^\s*pod\s+['"]Sentry['"]"#.to_string(),
            anchors: vec![Anchor::last(r"^\s*pod\s"), Anchor::first(r"^\s*use_frameworks!")],
        })
    }

    fn apply(patch: &LinePatch, text: &str) -> Result<String> {
        patch.apply(text, &mut SequentialIdGenerator::default())
    }

    #[test]
    fn test_podfile_insertion() {
        let patch = podfile_patch();
        assert_eq!(apply(&patch, "pod \"OtherPod\"").unwrap(), "pod \"OtherPod\"\npod 'Sentry'\n");
        assert_eq!(apply(&patch, "pod \"OtherPod\"\n").unwrap(), "pod \"OtherPod\"\npod 'Sentry'\n");
        assert!(patch.is_applied("pod \"OtherPod\"\npod 'Sentry'\n").unwrap());

        let out = apply(&patch, "target 'App' do\n  use_frameworks!\n\nend\n").unwrap();
        assert_eq!(out, "target 'App' do\n  use_frameworks!\n  pod 'Sentry'\n\nend\n");

        let err = apply(&patch, "platform :ios, '13.0'\n").unwrap_err();
        assert!(matches!(err, PatchError::LocatorMiss { .. }));
    }

    #[test]
    fn test_gradle_plugins_block() {
        let patch = LinePatch::GradlePlugin(GradlePlugin {
            id: "io.sentry.android.gradle".to_string(),
            version: "4.14.1".to_string(),
            kotlin: false,
        });
        let text = "plugins {\n    id 'com.android.application'\n}\n\nandroid {\n}\n";
        let out = apply(&patch, text).unwrap();
        assert_eq!(
            out,
            "plugins {\n    id 'com.android.application'\n    id \"io.sentry.android.gradle\" version \"4.14.1\"\n}\n\nandroid {\n}\n"
        );
        assert!(patch.is_applied(&out).unwrap());

        let out = apply(&patch, "plugins {}\n").unwrap();
        assert_eq!(out, "plugins {\n    id \"io.sentry.android.gradle\" version \"4.14.1\"\n}\n");
    }

    #[test]
    fn test_gradle_kotlin_and_apply_fallback() {
        let kotlin = LinePatch::GradlePlugin(GradlePlugin {
            id: "io.sentry.android.gradle".to_string(),
            version: "4.14.1".to_string(),
            kotlin: true,
        });
        let out = apply(&kotlin, "plugins {\n  id(\"com.android.application\")\n}\n").unwrap();
        assert!(out.contains("\n  id(\"io.sentry.android.gradle\") version \"4.14.1\"\n}"));

        let groovy = LinePatch::GradlePlugin(GradlePlugin {
            id: "io.sentry.android.gradle".to_string(),
            version: "4.14.1".to_string(),
            kotlin: false,
        });
        let out = apply(&groovy, "apply plugin: \"com.android.application\"\n\nandroid {}\n").unwrap();
        assert_eq!(
            out,
            "apply plugin: \"com.android.application\"\napply plugin: 'io.sentry.android.gradle'\n\nandroid {}\n"
        );
        assert!(apply(&groovy, "android {}\n").is_err());
    }

    #[test]
    fn test_react_native_xcode_token() {
        let script = "set -e\n\nWITH_ENVIRONMENT=\"../node_modules/react-native/scripts/xcode/with-environment.sh\"\nREACT_NATIVE_XCODE=\"../node_modules/react-native/scripts/react-native-xcode.sh\"\n\n/bin/sh -c \"$WITH_ENVIRONMENT $REACT_NATIVE_XCODE\"\n";
        let out = apply(&LinePatch::ReactNativeXcode, script).unwrap();
        assert!(out.ends_with(
            "/bin/sh -c \"$WITH_ENVIRONMENT \\\"/bin/sh ../node_modules/@sentry/react-native/scripts/sentry-xcode.sh $REACT_NATIVE_XCODE\\\"\"\n"
        ));
        assert!(LinePatch::ReactNativeXcode.is_applied(&out).unwrap());
    }

    #[test]
    fn test_react_native_xcode_legacy_invocation() {
        let script = "export NODE_BINARY=node\n../node_modules/react-native/scripts/react-native-xcode.sh\n";
        let out = apply(&LinePatch::ReactNativeXcode, script).unwrap();
        assert_eq!(
            out,
            "export NODE_BINARY=node\n../node_modules/@sentry/react-native/scripts/sentry-xcode.sh ../node_modules/react-native/scripts/react-native-xcode.sh\n"
        );
        assert!(apply(&LinePatch::ReactNativeXcode, "echo hi\n").is_err());
    }
}
