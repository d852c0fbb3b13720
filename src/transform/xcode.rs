//! Xcode project (`project.pbxproj`) build-phase insertion.
//!
//! The project file is patched as text. Object IDs are 24 uppercase hex
//! digits and come from an [`ObjectIdGenerator`], so callers (and tests)
//! decide how IDs are made.

use crate::error::{PatchError, Result};
use crate::locate::lines::lines;
use crate::syntax::line_indent;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default name of the debug-symbol upload phase.
pub const UPLOAD_PHASE_NAME: &str = "Upload Debug Symbols to Sentry";

const SECTION_BEGIN: &str = "/* Begin PBXShellScriptBuildPhase section */";
const SECTION_END: &str = "/* End PBXShellScriptBuildPhase section */";
/// Sections are sorted by isa; the shell-script section precedes this one.
const NEXT_SECTION: &str = "/* Begin PBXSourcesBuildPhase section */";

/// Produces fresh object IDs.
pub trait ObjectIdGenerator {
    /// Returns an ID that is not in `taken`.
    fn next_id(&mut self, taken: &HashSet<String>) -> String;
}

/// Deterministic generator: a fixed prefix followed by a counter.
#[derive(Debug, Clone, Default)]
pub struct SequentialIdGenerator {
    prefix: u32,
    counter: u64,
}

impl SequentialIdGenerator {
    /// Creates a generator whose IDs start with the given 8-digit prefix.
    pub fn with_prefix(prefix: u32) -> Self {
        Self { prefix, counter: 0 }
    }

    /// Creates a generator seeded from some text, typically the target name.
    pub fn seeded(seed: &str) -> Self {
        // FNV-1a
        let hash = seed
            .bytes()
            .fold(0x811c_9dc5_u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193));
        Self::with_prefix(hash)
    }
}

impl ObjectIdGenerator for SequentialIdGenerator {
    fn next_id(&mut self, taken: &HashSet<String>) -> String {
        loop {
            self.counter += 1;
            let id = format!("{:08X}{:016X}", self.prefix, self.counter);
            if !taken.contains(&id) {
                return id;
            }
        }
    }
}

/// A shell-script build phase to add to one native target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPhaseSpec {
    /// Name of the `PBXNativeTarget`.
    pub target: String,
    #[serde(default = "default_phase_name")]
    pub name: String,
    pub script: String,
}

fn default_phase_name() -> String {
    UPLOAD_PHASE_NAME.to_string()
}

impl BuildPhaseSpec {
    pub fn new(target: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            name: default_phase_name(),
            script: script.into(),
        }
    }
}

/// Collects every object ID mentioned in the project.
pub fn taken_ids(text: &str) -> HashSet<String> {
    Regex::new(r"\b[0-9A-F]{24}\b")
        .map(|re| re.find_iter(text).map(|m| m.as_str().to_string()).collect())
        .unwrap_or_default()
}

/// Returns true if a phase with the spec's name exists.
pub fn has_build_phase(text: &str, spec: &BuildPhaseSpec) -> bool {
    text.contains(&format!("name = {};", quote(&spec.name)))
        || text.contains(&format!("/* {} */", spec.name))
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn phase_object(id: &str, spec: &BuildPhaseSpec) -> String {
    let mut out = String::new();
    out.push_str(&format!("\t\t{id} /* {} */ = {{\n", spec.name));
    for line in [
        "isa = PBXShellScriptBuildPhase;",
        "buildActionMask = 2147483647;",
        "files = (",
        ");",
        "inputPaths = (",
        ");",
    ] {
        out.push_str(&format!("\t\t\t{line}\n"));
    }
    out.push_str(&format!("\t\t\tname = {};\n", quote(&spec.name)));
    for line in [
        "outputPaths = (",
        ");",
        "runOnlyForDeploymentPostprocessing = 0;",
        "shellPath = /bin/sh;",
    ] {
        out.push_str(&format!("\t\t\t{line}\n"));
    }
    out.push_str(&format!("\t\t\tshellScript = {};\n", quote(&spec.script)));
    out.push_str("\t\t};\n");
    out
}

/// Finds the insertion offset inside the target's `buildPhases = ( ... );`
/// list, with the indentation of its entries.
fn build_phases_slot(text: &str, target: &str) -> Result<PhaseSlot> {
    let header = Regex::new(&format!(
        r"(?m)^\s*[0-9A-F]{{24}} /\* {} \*/ = \{{\s*\n\s*isa = PBXNativeTarget;",
        regex::escape(target)
    ))?;
    let found = header
        .find(text)
        .ok_or_else(|| PatchError::locator_miss(format!("native target `{target}`")))?;
    let rest = &text[found.end()..];
    let open = rest
        .find("buildPhases = (")
        .ok_or_else(|| PatchError::locator_miss(format!("buildPhases of `{target}`")))?;
    let list_start = found.end() + open;
    let close_rel = text[list_start..]
        .find(");")
        .ok_or_else(|| PatchError::locator_miss(format!("end of buildPhases of `{target}`")))?;
    let close = list_start + close_rel;

    // `buildPhases = ();` on one line
    if !text[list_start..close].contains('\n') {
        let indent = line_indent(text, list_start);
        return Ok(PhaseSlot {
            at: close,
            prefix: format!("\n{indent}\t"),
            suffix: format!("\n{indent}"),
        });
    }

    let line_start = text[..close].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let entry_indent = lines(&text[list_start..line_start])
        .nth(1)
        .map(|(start, _)| line_indent(text, list_start + start).to_string())
        .unwrap_or_else(|| format!("{}\t", line_indent(text, close)));
    Ok(PhaseSlot {
        at: line_start,
        prefix: entry_indent,
        suffix: "\n".to_string(),
    })
}

/// Where a phase reference goes in a target's `buildPhases` list.
struct PhaseSlot {
    at: usize,
    prefix: String,
    suffix: String,
}

/// Adds the build phase object and registers it with the target.
pub fn add_build_phase(
    text: &str,
    spec: &BuildPhaseSpec,
    ids: &mut dyn ObjectIdGenerator,
) -> Result<String> {
    let slot = build_phases_slot(text, &spec.target)?;
    let id = ids.next_id(&taken_ids(text));
    let object = phase_object(&id, spec);

    let (section_at, section_text) = match text.find(SECTION_END) {
        Some(end) => (text[..end].rfind('\n').map(|i| i + 1).unwrap_or(0), object),
        None => {
            let next = text
                .find(NEXT_SECTION)
                .ok_or_else(|| PatchError::locator_miss("PBXSourcesBuildPhase section"))?;
            (next, format!("{SECTION_BEGIN}\n{object}{SECTION_END}\n\n"))
        }
    };

    let entry = format!("{}{id} /* {} */,{}", slot.prefix, spec.name, slot.suffix);
    let mut edits = [(slot.at, entry), (section_at, section_text)];
    edits.sort_by_key(|(at, _)| std::cmp::Reverse(*at));
    let mut out = text.to_string();
    for (at, insertion) in edits {
        out.insert_str(at, &insertion);
    }
    Ok(out)
}
