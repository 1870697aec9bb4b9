use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    SpringBootApplication,
    MainClass,
    JunitTestClass,
    JunitTestMethod,
    TestngTestClass,
    TestngTestMethod,
}

impl EntryKind {
    pub fn is_test(self) -> bool {
        matches!(
            self,
            EntryKind::JunitTestClass
                | EntryKind::JunitTestMethod
                | EntryKind::TestngTestClass
                | EntryKind::TestngTestMethod
        )
    }

    pub fn is_method_level(self) -> bool {
        matches!(self, EntryKind::JunitTestMethod | EntryKind::TestngTestMethod)
    }

    /// Prefix used in display names; unique per kind so list entries can be
    /// told apart at a glance.
    pub fn display_prefix(self) -> &'static str {
        match self {
            EntryKind::SpringBootApplication => "🍃",
            EntryKind::MainClass => "☕",
            EntryKind::JunitTestClass => "🧪",
            EntryKind::JunitTestMethod => "🔬",
            EntryKind::TestngTestClass => "🧫",
            EntryKind::TestngTestMethod => "🔭",
        }
    }
}

/// Test framework inferred from the whole file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestFramework {
    #[serde(rename = "JUnit4")]
    JUnit4,
    #[serde(rename = "JUnit5")]
    JUnit5,
    #[serde(rename = "TestNG")]
    TestNg,
    #[serde(rename = "JUnit")]
    JUnit,
}

impl TestFramework {
    pub fn label(self) -> &'static str {
        match self {
            TestFramework::JUnit4 => "JUnit4",
            TestFramework::JUnit5 => "JUnit5",
            TestFramework::TestNg => "TestNG",
            TestFramework::JUnit => "JUnit",
        }
    }

    pub fn class_kind(self) -> EntryKind {
        match self {
            TestFramework::TestNg => EntryKind::TestngTestClass,
            _ => EntryKind::JunitTestClass,
        }
    }

    pub fn method_kind(self) -> EntryKind {
        match self {
            TestFramework::TestNg => EntryKind::TestngTestMethod,
            _ => EntryKind::JunitTestMethod,
        }
    }
}

/// Identity shared by entries, launch history and generated launch records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryIdentity {
    pub class_name: String,
    pub method_name: Option<String>,
}

impl EntryIdentity {
    pub fn new(class_name: impl Into<String>, method_name: Option<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name,
        }
    }
}

/// A runnable unit discovered in one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaEntry {
    pub kind: EntryKind,
    pub qualified_class_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
    pub source_file_path: PathBuf,
    pub project_name: String,
    pub display_name: String,
    pub line_number: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl JavaEntry {
    pub fn identity(&self) -> EntryIdentity {
        EntryIdentity::new(self.qualified_class_name.clone(), self.method_name.clone())
    }

    pub fn full_identifier(&self) -> String {
        match &self.method_name {
            Some(method) => format!("{}.{method}", self.qualified_class_name),
            None => self.qualified_class_name.clone(),
        }
    }

    pub fn simple_class_name(&self) -> &str {
        simple_name(&self.qualified_class_name)
    }

    pub fn is_test_entry(&self) -> bool {
        self.kind.is_test()
    }

    pub fn is_spring_boot_app(&self) -> bool {
        self.kind == EntryKind::SpringBootApplication
    }

    /// Case-insensitive substring match on class, display name, method and
    /// project. `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        [
            Some(self.qualified_class_name.as_str()),
            Some(self.display_name.as_str()),
            self.method_name.as_deref(),
            Some(self.project_name.as_str()),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
    }

    pub fn framework(&self) -> Option<&str> {
        self.annotations.get("framework").map(String::as_str)
    }
}

pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

pub fn display_name(kind: EntryKind, qualified_class_name: &str, method: Option<&str>) -> String {
    let simple = simple_name(qualified_class_name);
    match method {
        Some(m) if kind.is_method_level() => format!("{} {simple}-{m}", kind.display_prefix()),
        _ => format!("{} {simple}", kind.display_prefix()),
    }
}
