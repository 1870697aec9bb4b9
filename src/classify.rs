//! Text-pattern classification of Java sources into runnable entries.
//!
//! This is not a parser: every decision is a regex match over
//! the raw file content, so comments and string literals can produce false
//! positives and unusual formatting can produce false negatives. The rules
//! favour generous matching.

use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Component, Path};
use std::sync::LazyLock;

use crate::entry::{EntryKind, JavaEntry, TestFramework, display_name};

static CLASS_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bclass\s+(\w+)").expect("valid class regex"));
static PACKAGE_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bpackage\s+([\w.]+)\s*;").expect("valid package regex"));
static SPRING_BOOT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@SpringBootApplication\b").expect("valid spring regex"));
static MAIN_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"public\s+static\s+void\s+main\s*\(\s*(?:final\s+)?String\s*(?:\[\s*\]|\.\.\.)\s*\w+\s*\)",
    )
    .expect("valid main regex")
});
static TEST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(?:Test|ParameterizedTest|RepeatedTest|RunWith|ExtendWith|TestMethodOrder)\b")
        .expect("valid test marker regex")
});
static TEST_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@Test\b").expect("valid @Test regex"));
static RUN_WITH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@RunWith\b").expect("valid @RunWith regex"));
static JUNIT5_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(?:ExtendWith|TestMethodOrder)\b").expect("valid junit5 marker regex")
});
static JUPITER_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"org\.junit\.jupiter").expect("valid jupiter regex"));
static TESTNG_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"org\.testng").expect("valid testng regex"));
static TEST_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"@(?:Test|ParameterizedTest|RepeatedTest)\b(?:\s*\([^)]*\))?",
        r"(?:\s*@\w+(?:\s*\([^)]*\))?)*",
        r"\s+(?:(?:public|protected|private|static|final|synchronized)\s+)*",
        r"[\w<>\[\],.?]+\s+(\w+)\s*\(",
    ))
    .expect("valid test method regex")
});

/// Classify one source file. Never fails; unrecognised content yields no entries.
pub fn classify(source: &str, file_path: &Path, project_name: &str) -> Vec<JavaEntry> {
    let class_name = declared_class_name(source).unwrap_or_else(|| file_stem(file_path));
    let qualified = match package_name(source) {
        Some(pkg) => format!("{pkg}.{class_name}"),
        None => class_name,
    };

    let ctx = EntryContext {
        qualified: &qualified,
        file_path,
        project_name,
    };

    let mut entries = Vec::new();
    let has_spring_marker = SPRING_BOOT_MARKER.find(source);
    let main_signature = MAIN_SIGNATURE.find(source);

    match (has_spring_marker, main_signature) {
        (Some(marker), Some(_)) => {
            let mut annotations = BTreeMap::new();
            annotations.insert("SpringBootApplication".to_string(), "true".to_string());
            entries.push(ctx.entry(
                EntryKind::SpringBootApplication,
                None,
                line_of(source, marker.start()),
                "Spring Boot application".to_string(),
                annotations,
            ));
        }
        (None, Some(signature)) => {
            entries.push(ctx.entry(
                EntryKind::MainClass,
                None,
                line_of(source, signature.start()),
                "Java application".to_string(),
                BTreeMap::new(),
            ));
        }
        _ => {}
    }

    if is_test_source(source, file_path) {
        entries.extend(test_entries(source, &ctx));
    }

    entries
}

pub fn declared_class_name(source: &str) -> Option<String> {
    CLASS_DECL
        .captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn package_name(source: &str) -> Option<String> {
    PACKAGE_DECL
        .captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// A file is a test source when it lives under a `test` directory, declares a
/// class ending in `Test`, or carries any test annotation.
pub fn is_test_source(source: &str, file_path: &Path) -> bool {
    let in_test_dir = file_path
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name == "test"));
    let test_class_name = declared_class_name(source).is_some_and(|n| n.ends_with("Test"));

    in_test_dir || test_class_name || TEST_MARKER.is_match(source)
}

/// Framework inference over the whole file.
///
/// Every test method in a file receives the same framework, even when a file
/// mixes markers from several frameworks.
pub fn infer_framework(source: &str) -> TestFramework {
    let junit5 = JUNIT5_MARKER.is_match(source) || JUPITER_IMPORT.is_match(source);
    let testng = TESTNG_IMPORT.is_match(source);
    let junit4 = (RUN_WITH.is_match(source) || TEST_ANNOTATION.is_match(source)) && !junit5 && !testng;

    if junit4 {
        TestFramework::JUnit4
    } else if junit5 {
        TestFramework::JUnit5
    } else if testng {
        TestFramework::TestNg
    } else {
        TestFramework::JUnit
    }
}

fn test_entries(source: &str, ctx: &EntryContext<'_>) -> Vec<JavaEntry> {
    let framework = infer_framework(source);
    let mut annotations = BTreeMap::new();
    annotations.insert("framework".to_string(), framework.label().to_string());

    let mut entries = Vec::new();

    let class_line = CLASS_DECL
        .find(source)
        .map(|m| line_of(source, m.start()))
        .unwrap_or(1);
    entries.push(ctx.entry(
        framework.class_kind(),
        None,
        class_line,
        format!("{} test class", framework.label()),
        annotations.clone(),
    ));

    for caps in TEST_METHOD.captures_iter(source) {
        let Some(name) = caps.get(1) else {
            continue;
        };
        entries.push(ctx.entry(
            framework.method_kind(),
            Some(name.as_str().to_string()),
            line_of(source, name.start()),
            format!("{} test method", framework.label()),
            annotations.clone(),
        ));
    }

    entries
}

struct EntryContext<'a> {
    qualified: &'a str,
    file_path: &'a Path,
    project_name: &'a str,
}

impl EntryContext<'_> {
    fn entry(
        &self,
        kind: EntryKind,
        method_name: Option<String>,
        line_number: usize,
        description: String,
        annotations: BTreeMap<String, String>,
    ) -> JavaEntry {
        JavaEntry {
            kind,
            qualified_class_name: self.qualified.to_string(),
            display_name: display_name(kind, self.qualified, method_name.as_deref()),
            method_name,
            source_file_path: self.file_path.to_path_buf(),
            project_name: self.project_name.to_string(),
            line_number,
            description: Some(description),
            annotations,
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// 1-based line number of a byte offset.
fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn main_path(name: &str) -> PathBuf {
        PathBuf::from(format!("/ws/demo/src/main/java/com/acme/{name}.java"))
    }

    fn test_path(name: &str) -> PathBuf {
        PathBuf::from(format!("/ws/demo/src/test/java/com/acme/{name}.java"))
    }

    fn kinds(entries: &[JavaEntry]) -> Vec<EntryKind> {
        entries.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn spring_boot_application_wins_over_main_class() {
        let source = r#"package com.acme;

import org.springframework.boot.SpringApplication;
import org.springframework.boot.autoconfigure.SpringBootApplication;

@SpringBootApplication
public class DemoApplication {
    public static void main(String[] args) {
        SpringApplication.run(DemoApplication.class, args);
    }
}
"#;
        let entries = classify(source, &main_path("DemoApplication"), "demo");
        assert_eq!(kinds(&entries), vec![EntryKind::SpringBootApplication]);

        let app = &entries[0];
        assert_eq!(app.qualified_class_name, "com.acme.DemoApplication");
        assert_eq!(app.line_number, 6);
        assert_eq!(app.display_name, "🍃 DemoApplication");
        assert_eq!(app.project_name, "demo");
        assert!(app.method_name.is_none());
        assert_eq!(
            app.annotations.get("SpringBootApplication").map(String::as_str),
            Some("true")
        );
    }

    #[test]
    fn main_method_without_spring_marker_is_main_class() {
        let source = r#"package com.acme.tools;

public final class Migrate {

    public static void main(final String... args) {
        System.out.println("go");
    }
}
"#;
        let entries = classify(source, &main_path("Migrate"), "demo");
        assert_eq!(kinds(&entries), vec![EntryKind::MainClass]);
        assert_eq!(entries[0].qualified_class_name, "com.acme.tools.Migrate");
        assert_eq!(entries[0].line_number, 5);
        assert_eq!(entries[0].display_name, "☕ Migrate");
    }

    #[test]
    fn spring_marker_without_main_yields_nothing() {
        let source = "@SpringBootApplication\npublic class Config {}\n";
        assert!(classify(source, &main_path("Config"), "demo").is_empty());
    }

    #[test]
    fn junit5_class_and_methods() {
        let source = r#"package com.acme;

import org.junit.jupiter.api.Test;
import org.junit.jupiter.api.DisplayName;

class CalculatorTest {

    @Test
    void addsNumbers() {
    }

    @Test
    @DisplayName("subtracts")
    public void subtractsNumbers() throws Exception {
    }

    private void helper() {
    }
}
"#;
        let entries = classify(source, &test_path("CalculatorTest"), "demo");
        assert_eq!(
            kinds(&entries),
            vec![
                EntryKind::JunitTestClass,
                EntryKind::JunitTestMethod,
                EntryKind::JunitTestMethod
            ]
        );
        assert_eq!(entries[0].line_number, 6);
        assert_eq!(entries[0].framework(), Some("JUnit5"));
        assert_eq!(entries[1].method_name.as_deref(), Some("addsNumbers"));
        assert_eq!(entries[1].line_number, 9);
        assert_eq!(entries[1].display_name, "🔬 CalculatorTest-addsNumbers");
        assert_eq!(entries[2].method_name.as_deref(), Some("subtractsNumbers"));
        assert_eq!(entries[2].line_number, 15);
        assert_eq!(entries[2].full_identifier(), "com.acme.CalculatorTest.subtractsNumbers");
    }

    #[test]
    fn junit4_with_runner() {
        let source = r#"package com.acme;

import org.junit.Test;
import org.junit.runner.RunWith;

@RunWith(SpringRunner.class)
public class LegacyTest {
    @Test(expected = IllegalStateException.class)
    public void failsLoudly() {
    }
}
"#;
        let entries = classify(source, &test_path("LegacyTest"), "demo");
        assert_eq!(
            kinds(&entries),
            vec![EntryKind::JunitTestClass, EntryKind::JunitTestMethod]
        );
        assert_eq!(entries[0].framework(), Some("JUnit4"));
        assert_eq!(entries[1].method_name.as_deref(), Some("failsLoudly"));
    }

    #[test]
    fn testng_import_yields_testng_kinds() {
        let source = r#"package com.acme;

import org.testng.annotations.Test;

public class OrderSpec {
    @Test
    public void placesOrder() {
    }
}
"#;
        let entries = classify(source, &main_path("OrderSpec"), "demo");
        assert_eq!(
            kinds(&entries),
            vec![EntryKind::TestngTestClass, EntryKind::TestngTestMethod]
        );
        assert_eq!(entries[0].display_name, "🧫 OrderSpec");
        assert_eq!(entries[1].display_name, "🔭 OrderSpec-placesOrder");
    }

    #[test]
    fn test_directory_alone_makes_a_generic_test_class() {
        let source = "package com.acme;\n\npublic class Fixtures {\n}\n";
        let entries = classify(source, &test_path("Fixtures"), "demo");
        assert_eq!(kinds(&entries), vec![EntryKind::JunitTestClass]);
        assert_eq!(entries[0].framework(), Some("JUnit"));
        assert_eq!(entries[0].line_number, 3);
    }

    #[test]
    fn class_name_ending_in_test_is_a_test_source() {
        let source = "public class SmokeTest {\n}\n";
        let entries = classify(source, &main_path("SmokeTest"), "demo");
        assert_eq!(kinds(&entries), vec![EntryKind::JunitTestClass]);
        assert_eq!(entries[0].qualified_class_name, "SmokeTest");
    }

    #[test]
    fn main_and_test_entries_can_coexist() {
        let source = r#"public class RunnerTest {
    public static void main(String[] args) {}

    @Test
    public void runs() {}
}
"#;
        let entries = classify(source, &main_path("RunnerTest"), "demo");
        assert_eq!(
            kinds(&entries),
            vec![
                EntryKind::MainClass,
                EntryKind::JunitTestClass,
                EntryKind::JunitTestMethod
            ]
        );
    }

    #[test]
    fn falls_back_to_file_stem_without_class_declaration() {
        let source = "package com.acme;\n\npublic interface Api {\n    @Test\n    void contract();\n}\n";
        let entries = classify(source, &main_path("Api"), "demo");
        assert_eq!(entries[0].qualified_class_name, "com.acme.Api");
        assert_eq!(entries[0].line_number, 1);
    }

    #[test]
    fn plain_class_yields_nothing() {
        let source = "package com.acme;\n\npublic class Money {\n    private long cents;\n}\n";
        assert!(classify(source, &main_path("Money"), "demo").is_empty());
        assert!(classify("", &main_path("Empty"), "demo").is_empty());
    }

    #[test]
    fn mixed_framework_file_shares_one_framework() {
        let source = r#"import org.junit.jupiter.api.Test;
import org.testng.annotations.BeforeClass;

class MixedTest {
    @Test
    void one() {}
}
"#;
        let entries = classify(source, &test_path("MixedTest"), "demo");
        assert!(entries.iter().all(|e| e.framework() == Some("JUnit5")));
    }

    #[test]
    fn test_method_order_is_not_a_method_marker() {
        let source = r#"import org.junit.jupiter.api.*;

@TestMethodOrder(MethodOrderer.OrderAnnotation.class)
class OrderedTest {
    @Test
    @Order(1)
    void first() {}
}
"#;
        let entries = classify(source, &test_path("OrderedTest"), "demo");
        let methods: Vec<_> = entries
            .iter()
            .filter_map(|e| e.method_name.as_deref())
            .collect();
        assert_eq!(methods, vec!["first"]);
    }
}
