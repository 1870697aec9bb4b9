//! Best-effort metadata from build descriptors (`pom.xml`, Gradle scripts).
//!
//! Text scanning only; nothing here evaluates a build.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;

use crate::store;

pub const POM_FILE: &str = "pom.xml";
pub const GRADLE_BUILD_FILES: [&str; 2] = ["build.gradle", "build.gradle.kts"];
pub const GRADLE_SETTINGS_FILES: [&str; 2] = ["settings.gradle", "settings.gradle.kts"];

static XML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));
static XML_CDATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[.*?\]\]>").expect("valid cdata regex"));
static XML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([\w.:-]+)[^>]*?(/?)>").expect("valid tag regex"));
static POM_MODULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<module>\s*([^<]+?)\s*</module>").expect("valid module regex")
});
static GRADLE_ROOT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"rootProject\.name\s*=\s*['"]([^'"]+)['"]"#).expect("valid gradle regex")
});
static GRADLE_PROJECT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"project\.name\s*=\s*['"]([^'"]+)['"]"#).expect("valid gradle regex")
});
static GRADLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bname\s*=\s*['"]([^'"]+)['"]"#).expect("valid gradle regex")
});
static GRADLE_INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*include\b(.*)$").expect("valid include regex"));
static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).expect("valid quoted regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MavenManifest {
    pub artifact_id: Option<String>,
    pub modules: Vec<String>,
    pub declares_modules: bool,
}

pub fn parse_pom(content: &str) -> MavenManifest {
    let stripped = XML_COMMENT.replace_all(content, "");
    let stripped = XML_CDATA.replace_all(&stripped, "");

    MavenManifest {
        artifact_id: project_artifact_id(&stripped),
        modules: POM_MODULE
            .captures_iter(&stripped)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect(),
        declares_modules: stripped.contains("<modules>") || stripped.contains("<module>"),
    }
}

/// First `<artifactId>` whose only open ancestor is `<project>`, so ids inside
/// `<parent>`, `<dependencies>`, `<build>` and friends are never picked up.
fn project_artifact_id(xml: &str) -> Option<String> {
    let mut stack: Vec<&str> = Vec::new();

    for caps in XML_TAG.captures_iter(xml) {
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let self_closing = caps.get(3).is_some_and(|m| !m.as_str().is_empty());
        let (Some(whole), Some(tag)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let tag = tag.as_str();

        if closing {
            if let Some(pos) = stack.iter().rposition(|open| *open == tag) {
                stack.truncate(pos);
            }
            continue;
        }
        if self_closing {
            continue;
        }

        if tag == "artifactId" && stack.len() == 1 && stack[0] == "project" {
            let rest = &xml[whole.end()..];
            let text = rest.split('<').next().unwrap_or("").trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }

        stack.push(tag);
    }

    None
}

/// Project name from a Gradle script, trying `rootProject.name`, then
/// `project.name`, then a bare `name =` assignment.
pub fn gradle_project_name(content: &str) -> Option<String> {
    [&*GRADLE_ROOT_NAME, &*GRADLE_PROJECT_NAME, &*GRADLE_NAME]
        .iter()
        .find_map(|re| re.captures(content).and_then(|c| c.get(1)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Module paths from `include` statements, with leading `:` removed.
pub fn gradle_includes(content: &str) -> Vec<String> {
    GRADLE_INCLUDE
        .captures_iter(content)
        .filter_map(|c| c.get(1))
        .flat_map(|args| {
            QUOTED
                .captures_iter(args.as_str())
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str().trim_start_matches(':').replace(':', "/"))
                .collect::<Vec<_>>()
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// `include` lines or `project(':x')` references both mark a multi-module build.
pub fn gradle_settings_declares_modules(content: &str) -> bool {
    content.contains("include") || content.contains("project(")
}

pub fn find_gradle_build_file(dir: &Path) -> Option<std::path::PathBuf> {
    GRADLE_BUILD_FILES
        .iter()
        .map(|f| dir.join(f))
        .find(|p| p.is_file())
}

pub fn find_gradle_settings_file(dir: &Path) -> Option<std::path::PathBuf> {
    GRADLE_SETTINGS_FILES
        .iter()
        .map(|f| dir.join(f))
        .find(|p| p.is_file())
}

/// Declared project name of the build descriptor in `dir`, if `dir` has one.
///
/// A Gradle script that does not name its project is named after its
/// directory, matching Gradle's own default.
pub fn descriptor_project_name(dir: &Path) -> Option<String> {
    let pom = dir.join(POM_FILE);
    if pom.is_file() {
        return read_descriptor(&pom).and_then(|content| parse_pom(&content).artifact_id);
    }

    let gradle_files: Vec<_> = GRADLE_SETTINGS_FILES
        .iter()
        .chain(GRADLE_BUILD_FILES.iter())
        .map(|f| dir.join(f))
        .filter(|p| p.is_file())
        .collect();
    if gradle_files.is_empty() {
        return None;
    }

    gradle_files
        .iter()
        .filter_map(|p| read_descriptor(p))
        .find_map(|content| gradle_project_name(&content))
        .or_else(|| dir.file_name().map(|n| n.to_string_lossy().to_string()))
}

pub fn read_descriptor(path: &Path) -> Option<String> {
    match store::read_text(path) {
        Ok(content) => Some(content),
        Err(err) => {
            warn!(error = %err, "skipping unreadable build descriptor");
            None
        }
    }
}
