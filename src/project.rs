use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::entry::JavaEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectType {
    Maven,
    Gradle,
    PlainJava,
    Unknown,
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProjectType::Maven => "maven",
            ProjectType::Gradle => "gradle",
            ProjectType::PlainJava => "plain-java",
            ProjectType::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Conventional layout of a detected build system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_file_path: Option<PathBuf>,
    pub source_directories: Vec<PathBuf>,
    pub test_directories: Vec<PathBuf>,
    pub output_directory: PathBuf,
    /// Module names declared by the build descriptor.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatistics {
    pub total_entries: usize,
    pub spring_boot_apps: usize,
    pub java_applications: usize,
    pub test_classes: usize,
    pub test_methods: usize,
    pub sub_modules: usize,
}

/// Snapshot produced by one scan. Rebuilt from scratch every time; all views
/// are computed from `java_entries` and `sub_modules` on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub name: String,
    pub root_path: PathBuf,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub build_info: BuildInfo,
    pub java_entries: Vec<JavaEntry>,
    pub is_multi_module: bool,
    pub sub_modules: Vec<ProjectInfo>,
    pub scanned_at: DateTime<Utc>,
}

impl ProjectInfo {
    pub fn new(
        name: String,
        root_path: PathBuf,
        build_info: BuildInfo,
        java_entries: Vec<JavaEntry>,
        is_multi_module: bool,
        sub_modules: Vec<ProjectInfo>,
    ) -> Self {
        Self {
            name,
            root_path,
            project_type: build_info.project_type,
            build_info,
            java_entries,
            is_multi_module,
            sub_modules,
            scanned_at: Utc::now(),
        }
    }

    /// Own entries followed by every sub-module's entries, depth first.
    pub fn all_java_entries(&self) -> Vec<&JavaEntry> {
        let mut all: Vec<&JavaEntry> = self.java_entries.iter().collect();
        for module in &self.sub_modules {
            all.extend(module.all_java_entries());
        }
        all
    }

    pub fn spring_boot_entries(&self) -> Vec<&JavaEntry> {
        self.all_java_entries()
            .into_iter()
            .filter(|e| e.is_spring_boot_app())
            .collect()
    }

    pub fn test_entries(&self) -> Vec<&JavaEntry> {
        self.all_java_entries()
            .into_iter()
            .filter(|e| e.is_test_entry())
            .collect()
    }

    pub fn java_application_entries(&self) -> Vec<&JavaEntry> {
        self.all_java_entries()
            .into_iter()
            .filter(|e| !e.is_test_entry() && !e.is_spring_boot_app())
            .collect()
    }

    pub fn find_entry_by_class_name(&self, qualified_class_name: &str) -> Option<&JavaEntry> {
        self.all_java_entries()
            .into_iter()
            .find(|e| e.qualified_class_name == qualified_class_name)
    }

    pub fn find_entries_by_file_path(&self, path: &Path) -> Vec<&JavaEntry> {
        self.all_java_entries()
            .into_iter()
            .filter(|e| e.source_file_path == path)
            .collect()
    }

    pub fn is_maven_project(&self) -> bool {
        self.project_type == ProjectType::Maven
    }

    pub fn is_gradle_project(&self) -> bool {
        self.project_type == ProjectType::Gradle
    }

    pub fn has_spring_boot_app(&self) -> bool {
        self.all_java_entries().iter().any(|e| e.is_spring_boot_app())
    }

    pub fn has_tests(&self) -> bool {
        self.all_java_entries().iter().any(|e| e.is_test_entry())
    }

    /// Entries matching `query` anywhere in their names; a blank query
    /// matches nothing.
    pub fn search(&self, query: &str) -> Vec<&JavaEntry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.all_java_entries()
            .into_iter()
            .filter(|e| e.matches(&needle))
            .collect()
    }

    pub fn statistics(&self) -> ProjectStatistics {
        let mut stats = ProjectStatistics {
            sub_modules: self.sub_modules.len(),
            ..ProjectStatistics::default()
        };

        for entry in self.all_java_entries() {
            stats.total_entries += 1;
            if entry.is_spring_boot_app() {
                stats.spring_boot_apps += 1;
            } else if !entry.is_test_entry() {
                stats.java_applications += 1;
            } else if entry.method_name.is_some() {
                stats.test_methods += 1;
            } else {
                stats.test_classes += 1;
            }
        }

        stats
    }
}
