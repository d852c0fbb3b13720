//! Recipes for line-oriented build files.

use super::{Change, Recipe, RecipeParams};
use crate::locate::Anchor;
use crate::probe::Signature;
use crate::transform::{BuildPhaseSpec, GradlePlugin, InsertLine, LinePatch};
use std::path::Path;

const SENTRY_GRADLE_PLUGIN: &str = "io.sentry.android.gradle";
const SENTRY_GRADLE_PLUGIN_VERSION: &str = "4.14.1";

const POD_ALREADY: &str = r#"(?m)^\s*pod\s+['"]Sentry(/[^'"]*)?['"]"#;
const GEM_ALREADY: &str = r#"(?m)^\s*gem\s+['"]fastlane-plugin-sentry['"]"#;

/// Adds the Sentry pod to a CocoaPods `Podfile`.
pub struct Podfile;

impl Recipe for Podfile {
    fn name(&self) -> &str {
        "podfile"
    }

    fn description(&self) -> &str {
        "Add pod 'Sentry' to the Podfile"
    }

    fn default_path(&self) -> &str {
        "ios/Podfile"
    }

    fn signatures(&self, _params: &RecipeParams) -> Vec<Signature> {
        vec![Signature::matches(POD_ALREADY)]
    }

    fn change(&self, _path: &Path, _params: &RecipeParams) -> Change {
        Change::Text(LinePatch::InsertLine(InsertLine {
            content: "pod 'Sentry'".to_string(),
            already: POD_ALREADY.to_string(),
            anchors: vec![
                Anchor::last(r"^\s*pod\s"),
                Anchor::first(r"^\s*use_frameworks!"),
                Anchor::first(r"^\s*target\s.*\bdo\s*$"),
            ],
        }))
    }
}

/// Adds the Sentry fastlane plugin to a `Gemfile` (or `Pluginfile`).
pub struct FastlaneGemfile;

impl Recipe for FastlaneGemfile {
    fn name(&self) -> &str {
        "fastlane-gemfile"
    }

    fn description(&self) -> &str {
        "Add gem 'fastlane-plugin-sentry' to the Gemfile"
    }

    fn default_path(&self) -> &str {
        "Gemfile"
    }

    fn signatures(&self, _params: &RecipeParams) -> Vec<Signature> {
        vec![Signature::matches(GEM_ALREADY)]
    }

    fn change(&self, _path: &Path, _params: &RecipeParams) -> Change {
        Change::Text(LinePatch::InsertLine(InsertLine {
            content: "gem 'fastlane-plugin-sentry'".to_string(),
            already: GEM_ALREADY.to_string(),
            anchors: vec![Anchor::last(r"^\s*gem\s"), Anchor::first(r"^\s*source\s")],
        }))
    }
}

/// Applies the Sentry Android Gradle plugin in the app module.
pub struct AndroidGradle;

impl Recipe for AndroidGradle {
    fn name(&self) -> &str {
        "android-gradle"
    }

    fn description(&self) -> &str {
        "Apply the Sentry Android Gradle plugin"
    }

    fn default_path(&self) -> &str {
        "app/build.gradle"
    }

    fn signatures(&self, _params: &RecipeParams) -> Vec<Signature> {
        vec![Signature::contains(SENTRY_GRADLE_PLUGIN)]
    }

    fn change(&self, path: &Path, params: &RecipeParams) -> Change {
        let kotlin = path.extension().and_then(|e| e.to_str()) == Some("kts");
        Change::Text(LinePatch::GradlePlugin(GradlePlugin {
            id: SENTRY_GRADLE_PLUGIN.to_string(),
            version: params
                .version
                .clone()
                .unwrap_or_else(|| SENTRY_GRADLE_PLUGIN_VERSION.to_string()),
            kotlin,
        }))
    }
}

/// Routes the React Native bundle build phase through `sentry-xcode.sh`.
pub struct ReactNativeXcode;

impl Recipe for ReactNativeXcode {
    fn name(&self) -> &str {
        "react-native-xcode"
    }

    fn description(&self) -> &str {
        "Run sentry-xcode.sh around the React Native bundler"
    }

    fn default_path(&self) -> &str {
        "ios/bundle-react-native.sh"
    }

    fn signatures(&self, _params: &RecipeParams) -> Vec<Signature> {
        vec![Signature::contains("sentry-xcode.sh")]
    }

    fn change(&self, _path: &Path, _params: &RecipeParams) -> Change {
        Change::Text(LinePatch::ReactNativeXcode)
    }
}

/// Adds a debug-symbol upload phase to an Xcode target.
pub struct XcodeUploadPhase;

impl XcodeUploadPhase {
    fn script(params: &RecipeParams) -> String {
        let mut script = String::new();
        if let Some(org) = &params.org {
            script.push_str(&format!("export SENTRY_ORG={org}\n"));
        }
        if let Some(project) = &params.project {
            script.push_str(&format!("export SENTRY_PROJECT={project}\n"));
        }
        script.push_str(concat!(
            "if which sentry-cli >/dev/null; then\n",
            "ERROR=$(sentry-cli debug-files upload --include-sources \"$DWARF_DSYM_FOLDER_PATH\" 2>&1 >/dev/null)\n",
            "if [ ! $? -eq 0 ]; then\n",
            "echo \"warning: sentry-cli - $ERROR\"\n",
            "fi\n",
            "else\n",
            "echo \"warning: sentry-cli not installed, download from https://github.com/getsentry/sentry-cli/releases\"\n",
            "fi\n",
        ));
        script
    }

    /// The target named by the params, else the `.xcodeproj` bundle name.
    fn target(path: &Path, params: &RecipeParams) -> String {
        params
            .target
            .clone()
            .or_else(|| {
                path.parent()
                    .filter(|dir| dir.extension().and_then(|e| e.to_str()) == Some("xcodeproj"))
                    .and_then(|dir| dir.file_stem())
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "App".to_string())
    }
}

impl Recipe for XcodeUploadPhase {
    fn name(&self) -> &str {
        "xcode-upload-phase"
    }

    fn description(&self) -> &str {
        "Add an \"Upload Debug Symbols to Sentry\" build phase"
    }

    fn default_path(&self) -> &str {
        "ios/App.xcodeproj/project.pbxproj"
    }

    fn signatures(&self, _params: &RecipeParams) -> Vec<Signature> {
        vec![Signature::contains(crate::transform::xcode::UPLOAD_PHASE_NAME)]
    }

    fn change(&self, path: &Path, params: &RecipeParams) -> Change {
        Change::Text(LinePatch::XcodeBuildPhase(BuildPhaseSpec::new(
            Self::target(path, params),
            Self::script(params),
        )))
    }
}
