use ignore::{DirEntry, WalkBuilder};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::entry::JavaEntry;
use crate::error::{Error, Result};
use crate::manifest::{self, POM_FILE};
use crate::project::{BuildInfo, ProjectInfo, ProjectType};
use crate::store;

/// Directories never descended into: version control, dependency caches and
/// build output.
pub const NOISE_DIRS: [&str; 10] = [
    ".git",
    ".svn",
    ".hg",
    ".gradle",
    ".m2",
    ".idea",
    "node_modules",
    "target",
    "build",
    "out",
];

/// Scan a project root into a fresh [`ProjectInfo`].
///
/// Unreadable individual source files are logged and skipped; only an
/// unusable root or an undetectable project type fail the scan.
pub fn scan_project(root: &Path) -> Result<ProjectInfo> {
    if !root.is_dir() {
        return Err(Error::WorkspaceNotFound(root.to_path_buf()));
    }
    std::fs::read_dir(root).map_err(|e| Error::Scan {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    let started = Instant::now();
    let project_type = detect_project_type(root);
    info!(root = %root.display(), %project_type, "scanning project");

    let build_info = build_info(root, project_type)?;
    let files = find_java_files(root, &build_info);
    debug!(count = files.len(), "collected java sources");

    let mut names = ProjectNameResolver::new(root);
    let mut entries: Vec<JavaEntry> = Vec::new();
    for file in &files {
        let source = match store::read_text_lossy(file) {
            Ok(source) => source,
            Err(err) => {
                warn!(file = %file.display(), error = %err, "skipping unreadable source file");
                continue;
            }
        };
        let project_name = names.resolve(file);
        let found = classify(&source, file, &project_name);
        debug!(file = %file.display(), entries = found.len(), "classified");
        entries.extend(found);
    }

    let is_multi_module = is_multi_module(root, project_type);
    let project = ProjectInfo::new(
        root_project_name(root, project_type),
        root.to_path_buf(),
        build_info,
        entries,
        is_multi_module,
        Vec::new(),
    );

    info!(
        entries = project.java_entries.len(),
        files = files.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scan finished"
    );
    Ok(project)
}

pub fn detect_project_type(root: &Path) -> ProjectType {
    if root.join(POM_FILE).is_file() {
        ProjectType::Maven
    } else if manifest::find_gradle_build_file(root).is_some() {
        ProjectType::Gradle
    } else if !walk_java_files(root, true).is_empty() {
        ProjectType::PlainJava
    } else {
        ProjectType::Unknown
    }
}

pub fn build_info(root: &Path, project_type: ProjectType) -> Result<BuildInfo> {
    let conventional = |output: PathBuf, build_file: Option<PathBuf>, modules: Vec<String>| BuildInfo {
        project_type,
        build_file_path: build_file,
        source_directories: vec![
            root.join("src").join("main").join("java"),
            root.join("src").join("main").join("resources"),
        ],
        test_directories: vec![
            root.join("src").join("test").join("java"),
            root.join("src").join("test").join("resources"),
        ],
        output_directory: output,
        modules,
    };

    match project_type {
        ProjectType::Maven => {
            let pom = root.join(POM_FILE);
            let modules = manifest::read_descriptor(&pom)
                .map(|content| manifest::parse_pom(&content).modules)
                .unwrap_or_default();
            Ok(conventional(root.join("target").join("classes"), Some(pom), modules))
        }
        ProjectType::Gradle => {
            let modules = manifest::find_gradle_settings_file(root)
                .and_then(|p| manifest::read_descriptor(&p))
                .map(|content| manifest::gradle_includes(&content))
                .unwrap_or_default();
            Ok(conventional(
                root.join("build").join("classes"),
                manifest::find_gradle_build_file(root),
                modules,
            ))
        }
        ProjectType::PlainJava => {
            let src = root.join("src");
            let source_dir = if src.is_dir() { src } else { root.to_path_buf() };
            Ok(BuildInfo {
                project_type,
                build_file_path: None,
                source_directories: vec![source_dir],
                test_directories: Vec::new(),
                output_directory: root.join("out"),
                modules: Vec::new(),
            })
        }
        ProjectType::Unknown => Err(Error::UnsupportedProjectType(root.to_path_buf())),
    }
}

/// Java files under the declared source and test directories, falling back to
/// a whole-tree search when those yield nothing. Overlapping directories are
/// not de-duplicated.
///
/// Noise directories are only skipped when walking from the project root;
/// inside a source directory `build` or `out` is an ordinary package.
pub fn find_java_files(root: &Path, build_info: &BuildInfo) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in build_info
        .source_directories
        .iter()
        .chain(build_info.test_directories.iter())
    {
        if dir.is_dir() {
            files.extend(walk_java_files(dir, dir == root));
        }
    }

    if files.is_empty() {
        debug!(root = %root.display(), "no sources in conventional directories; searching whole tree");
        files = walk_java_files(root, true);
    }

    files
}

pub fn is_multi_module(root: &Path, project_type: ProjectType) -> bool {
    match project_type {
        ProjectType::Maven => manifest::read_descriptor(&root.join(POM_FILE))
            .is_some_and(|content| manifest::parse_pom(&content).declares_modules),
        ProjectType::Gradle => manifest::find_gradle_settings_file(root)
            .and_then(|p| manifest::read_descriptor(&p))
            .is_some_and(|content| manifest::gradle_settings_declares_modules(&content)),
        ProjectType::PlainJava | ProjectType::Unknown => false,
    }
}

fn root_project_name(root: &Path, project_type: ProjectType) -> String {
    let declared = match project_type {
        ProjectType::Maven | ProjectType::Gradle => manifest::descriptor_project_name(root),
        ProjectType::PlainJava | ProjectType::Unknown => None,
    };
    declared.unwrap_or_else(|| dir_name(root))
}

fn walk_java_files(dir: &Path, skip_noise: bool) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(dir);
    builder
        .hidden(false)
        .ignore(false)
        .parents(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false);
    if skip_noise {
        builder.filter_entry(|entry| entry.depth() == 0 || !is_noise_dir(entry));
    }
    let walker = builder.build();

    let mut files = Vec::new();
    for result in walker {
        match result {
            Ok(entry) => {
                let path = entry.path();
                if entry.file_type().is_some_and(|t| t.is_file())
                    && path.extension().is_some_and(|e| e == "java")
                {
                    files.push(path.to_path_buf());
                }
            }
            Err(err) => warn!(error = %err, "skipping unreadable path during scan"),
        }
    }

    files.sort();
    files
}

fn is_noise_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_some_and(|t| t.is_dir())
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| NOISE_DIRS.contains(&name))
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Attributes each source file to the nearest enclosing build descriptor,
/// memoising per directory so a descriptor is read at most once per scan.
struct ProjectNameResolver<'a> {
    root: &'a Path,
    by_dir: HashMap<PathBuf, Option<String>>,
}

impl<'a> ProjectNameResolver<'a> {
    fn new(root: &'a Path) -> Self {
        Self {
            root,
            by_dir: HashMap::new(),
        }
    }

    fn resolve(&mut self, file: &Path) -> String {
        let mut dir = file.parent();
        while let Some(current) = dir {
            if !current.starts_with(self.root) {
                break;
            }
            let declared = self
                .by_dir
                .entry(current.to_path_buf())
                .or_insert_with(|| manifest::descriptor_project_name(current));
            if let Some(name) = declared {
                return name.clone();
            }
            if current == self.root {
                break;
            }
            dir = current.parent();
        }

        name_before_src(self.root, file).unwrap_or_else(|| dir_name(self.root))
    }
}

/// The path segment right before `src`, relative to the root.
fn name_before_src(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let segments: Vec<&str> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();
    let src = segments.iter().position(|s| *s == "src")?;
    if src == 0 {
        return None;
    }
    Some(segments[src - 1].to_string())
}
