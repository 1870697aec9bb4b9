//! Generated launch records and the `launch.json` document that holds them.
//!
//! The document keeps every record as raw JSON so configurations this crate
//! did not write (other debuggers, hand-edited fields) survive a merge.

use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;

use crate::entry::{EntryIdentity, EntryKind, JavaEntry};
use crate::error::{Error, Result};
use crate::store;

pub const LAUNCH_JSON_VERSION: &str = "0.2.0";
pub const WORKSPACE_FOLDER: &str = "${workspaceFolder}";
pub const DEFAULT_PROFILE: &str = "dev";

/// Flags every generated record starts with.
pub const DEFAULT_VM_ARGS: [&str; 3] = [
    "-Dcom.sun.management.jmxremote=false",
    "-Djava.awt.headless=true",
    "-XX:+DisableAttachMechanism",
];

pub const SPRING_PROFILE_FLAG: &str = "-Dspring.profiles.active=";
pub const JMX_REMOTE_FLAG: &str = "-Dcom.sun.management.jmxremote=";

const TESTS_FLAG: &str = "--tests";
const JAVA_RECORD_KIND: &str = "Java launch configuration for class";

static PROFILE_ARG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-Dspring\.profiles\.active=\S*").expect("valid profile regex"));
static JMX_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-Dcom\.sun\.management\.jmxremote=(true|false)\b").expect("valid jmx regex")
});
static PROFILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid profile name regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConsoleKind {
    InternalConsole,
    IntegratedTerminal,
    ExternalTerminal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
    #[serde(rename = "type")]
    pub config_type: String,
    pub name: String,
    pub request: String,
    pub main_class: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub args: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vm_args: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console: Option<ConsoleKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_on_entry: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LaunchConfig {
    fn base(name: &str, main_class: &str, project_name: &str, vm_args: String) -> Self {
        Self {
            config_type: "java".to_string(),
            name: name.to_string(),
            request: "launch".to_string(),
            main_class: main_class.to_string(),
            project_name: project_name.to_string(),
            args: String::new(),
            vm_args,
            env_file: None,
            env: None,
            cwd: Some(WORKSPACE_FOLDER.to_string()),
            console: Some(ConsoleKind::IntegratedTerminal),
            stop_on_entry: None,
            extra: Map::new(),
        }
    }

    pub fn spring_boot(
        name: &str,
        main_class: &str,
        project_name: &str,
        profile: &str,
        extra_vm_args: &[String],
    ) -> Self {
        let profile_flag = format!("{SPRING_PROFILE_FLAG}{profile}");
        let vm_args = join_vm_args(
            DEFAULT_VM_ARGS
                .into_iter()
                .chain([profile_flag.as_str()])
                .chain(extra_vm_args.iter().map(String::as_str)),
        );
        let mut config = Self::base(name, main_class, project_name, vm_args);
        config.env_file = Some(format!("{WORKSPACE_FOLDER}/.env"));
        config
    }

    pub fn application(
        name: &str,
        main_class: &str,
        project_name: &str,
        extra_vm_args: &[String],
    ) -> Self {
        let vm_args = join_vm_args(
            DEFAULT_VM_ARGS
                .into_iter()
                .chain(extra_vm_args.iter().map(String::as_str)),
        );
        Self::base(name, main_class, project_name, vm_args)
    }

    /// Test record; a method narrows execution to `Class.method`.
    pub fn test(
        name: &str,
        main_class: &str,
        project_name: &str,
        method: Option<&str>,
        extra_vm_args: &[String],
    ) -> Self {
        let vm_args = join_vm_args(
            DEFAULT_VM_ARGS
                .into_iter()
                .chain(["-ea"])
                .chain(extra_vm_args.iter().map(String::as_str)),
        );
        let mut config = Self::base(name, main_class, project_name, vm_args);
        if let Some(method) = method {
            config.args = format!("{TESTS_FLAG} {main_class}.{method}");
        }
        config
    }

    pub fn for_entry(entry: &JavaEntry, profile: &str, extra_vm_args: &[String]) -> Self {
        let name = entry.display_name.as_str();
        let class = entry.qualified_class_name.as_str();
        let project = entry.project_name.as_str();

        match entry.kind {
            EntryKind::SpringBootApplication => {
                Self::spring_boot(name, class, project, profile, extra_vm_args)
            }
            EntryKind::MainClass => Self::application(name, class, project, extra_vm_args),
            EntryKind::JunitTestClass | EntryKind::TestngTestClass => {
                Self::test(name, class, project, None, extra_vm_args)
            }
            EntryKind::JunitTestMethod | EntryKind::TestngTestMethod => Self::test(
                name,
                class,
                project,
                entry.method_name.as_deref(),
                extra_vm_args,
            ),
        }
    }

    pub fn identity(&self) -> EntryIdentity {
        EntryIdentity::new(
            self.main_class.clone(),
            test_method_from_args(&self.args, &self.main_class),
        )
    }

    pub fn is_test(&self) -> bool {
        self.vm_args.split_whitespace().any(|a| a == "-ea")
            || self.args.split_whitespace().any(|a| a == TESTS_FLAG)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Whitespace-separated VM arguments joined by single spaces; later
/// duplicates of an argument are dropped.
pub fn join_vm_args<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for arg in parts.into_iter().flat_map(str::split_whitespace) {
        if !seen.contains(&arg) {
            seen.push(arg);
        }
    }
    seen.join(" ")
}

/// Method named by `--tests Class.method` when it targets `main_class`.
pub fn test_method_from_args(args: &str, main_class: &str) -> Option<String> {
    let mut tokens = args.split_whitespace();
    while let Some(token) = tokens.next() {
        if token != TESTS_FLAG {
            continue;
        }
        let target = tokens.next()?;
        return target
            .strip_prefix(main_class)
            .and_then(|rest| rest.strip_prefix('.'))
            .filter(|m| !m.is_empty())
            .map(str::to_string);
    }
    None
}

/// Identity of a raw record, if it names a main class.
pub fn record_identity(record: &Value) -> Option<EntryIdentity> {
    let main_class = record.get("mainClass")?.as_str()?;
    let args = record.get("args").and_then(Value::as_str).unwrap_or("");
    Some(EntryIdentity::new(
        main_class,
        test_method_from_args(args, main_class),
    ))
}

/// Trimmed profile name; only letters, digits, `-` and `_` are accepted.
pub fn validate_profile(profile: &str) -> Result<&str> {
    let profile = profile.trim();
    if profile.is_empty() {
        return Err(Error::InvalidInput("profile name must not be empty".to_string()));
    }
    if !PROFILE_NAME.is_match(profile) {
        return Err(Error::InvalidInput(format!(
            "invalid profile name '{profile}': use letters, digits, '-' or '_'"
        )));
    }
    Ok(profile)
}

/// First active Spring profile named in `vm_args`.
pub fn spring_profile(vm_args: &str) -> Option<&str> {
    PROFILE_ARG
        .find(vm_args)
        .map(|m| &m.as_str()[SPRING_PROFILE_FLAG.len()..])
        .filter(|p| !p.is_empty())
}

/// Every profile flag rewritten to `profile`, or one appended.
pub fn with_spring_profile(vm_args: &str, profile: &str) -> String {
    let flag = format!("{SPRING_PROFILE_FLAG}{profile}");
    if PROFILE_ARG.is_match(vm_args) {
        PROFILE_ARG.replace_all(vm_args, NoExpand(&flag)).into_owned()
    } else {
        append_vm_arg(vm_args, &flag)
    }
}

/// `Some(enabled)` when `vm_args` sets `com.sun.management.jmxremote`.
pub fn jmx_remote(vm_args: &str) -> Option<bool> {
    JMX_ARG.captures(vm_args).map(|c| &c[1] == "true")
}

pub fn with_jmx_remote(vm_args: &str, enabled: bool) -> String {
    let flag = format!("{JMX_REMOTE_FLAG}{enabled}");
    if JMX_ARG.is_match(vm_args) {
        JMX_ARG.replace_all(vm_args, NoExpand(&flag)).into_owned()
    } else {
        append_vm_arg(vm_args, &flag)
    }
}

fn append_vm_arg(vm_args: &str, flag: &str) -> String {
    match vm_args.trim() {
        "" => flag.to_string(),
        current => format!("{current} {flag}"),
    }
}

fn record_name(record: &Value) -> Option<&str> {
    record.get("name").and_then(Value::as_str)
}

/// A `java` record that names a main class.
fn is_java_record(record: &Value) -> bool {
    record.get("type").and_then(Value::as_str) == Some("java")
        && record
            .get("mainClass")
            .and_then(Value::as_str)
            .is_some_and(|m| !m.is_empty())
}

/// VM arguments as text; absent or null is empty, any other non-string is `None`.
fn record_vm_args(record: &Value) -> Option<&str> {
    match record.get("vmArgs") {
        None | Some(Value::Null) => Some(""),
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => None,
    }
}

fn set_record_vm_args(record: &mut Value, vm_args: String) {
    if let Value::Object(map) = record {
        map.insert("vmArgs".to_string(), Value::String(vm_args));
    }
}

/// JMX remote state across the Java records of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JmxStatus {
    pub enabled: usize,
    pub disabled: usize,
    pub not_set: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JmxUpdate {
    pub jmx_remote: bool,
    pub before: JmxStatus,
    pub java_configs: usize,
    pub modified: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Added,
    Updated,
}

/// The generated-configs store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchDocument {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub configurations: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_version() -> String {
    LAUNCH_JSON_VERSION.to_string()
}

impl Default for LaunchDocument {
    fn default() -> Self {
        Self {
            version: default_version(),
            configurations: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl LaunchDocument {
    /// Strict load: an absent file is an empty document, unreadable or
    /// corrupt content is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !store::exists(path) {
            return Ok(Self::default());
        }
        store::read_json(path)
    }

    /// Load for in-place edits: an absent file is [`Error::NotFound`].
    pub fn load_existing(path: &Path) -> Result<Self> {
        if !store::exists(path) {
            return Err(Error::not_found("Launch file", path.display().to_string()));
        }
        store::read_json(path)
    }

    /// Lenient load used by generation: anything unusable becomes an empty
    /// document.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unusable launch configuration store");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        store::write_json(path, self)
    }

    /// Record names, trimmed, skipping blank ones.
    pub fn names(&self) -> Vec<String> {
        self.configurations
            .iter()
            .filter_map(record_name)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.configurations
            .iter()
            .position(|r| record_name(r).is_some_and(|n| n == name || n.trim() == name))
    }

    /// The named record as a typed launch config.
    pub fn find(&self, name: &str) -> Result<Option<LaunchConfig>> {
        let Some(idx) = self.position(name) else {
            return Ok(None);
        };
        serde_json::from_value(self.configurations[idx].clone())
            .map(Some)
            .map_err(|e| Error::InvalidInput(format!("launch configuration '{name}' is not a Java launch record: {e}")))
    }

    /// Replace the record with the same name in place, or append it.
    /// Unknown keys on a replaced record are carried over.
    pub fn upsert(&mut self, config: &LaunchConfig) -> Upsert {
        let mut record = config.to_value();
        match self.position(&config.name) {
            Some(idx) => {
                if let (Value::Object(old), Value::Object(new)) = (&self.configurations[idx], &mut record) {
                    for (key, value) in old {
                        if !new.contains_key(key) && !is_managed_key(key) {
                            new.insert(key.clone(), value.clone());
                        }
                    }
                }
                self.configurations[idx] = record;
                Upsert::Updated
            }
            None => {
                self.configurations.push(record);
                Upsert::Added
            }
        }
    }

    /// Active profile of the first Java record launching `main_class`.
    pub fn spring_profile_of(&self, main_class: &str) -> Option<String> {
        let idx = self.java_class_position(main_class)?;
        record_vm_args(&self.configurations[idx])
            .and_then(spring_profile)
            .map(str::to_string)
    }

    /// Sets the profile on the named record; returns the profile it replaced.
    pub fn set_spring_profile(&mut self, name: &str, profile: &str) -> Result<Option<String>> {
        let profile = validate_profile(profile)?;
        let idx = self
            .position(name)
            .ok_or_else(|| Error::not_found("Launch configuration", name))?;
        if !is_java_record(&self.configurations[idx]) {
            return Err(Error::InvalidInput(format!(
                "launch configuration '{name}' is not a Java launch record"
            )));
        }
        self.set_profile_at(idx, name, profile)
    }

    /// Sets the profile on the first Java record launching `main_class`.
    pub fn set_spring_profile_for_class(
        &mut self,
        main_class: &str,
        profile: &str,
    ) -> Result<Option<String>> {
        let profile = validate_profile(profile)?;
        let idx = self
            .java_class_position(main_class)
            .ok_or_else(|| Error::not_found(JAVA_RECORD_KIND, main_class))?;
        self.set_profile_at(idx, main_class, profile)
    }

    fn set_profile_at(&mut self, idx: usize, label: &str, profile: &str) -> Result<Option<String>> {
        let record = &mut self.configurations[idx];
        let current = record_vm_args(record).ok_or_else(|| {
            Error::InvalidInput(format!("vmArgs of '{label}' is not a string"))
        })?;
        let previous = spring_profile(current).map(str::to_string);
        let updated = with_spring_profile(current, profile);
        set_record_vm_args(record, updated);
        Ok(previous)
    }

    fn java_class_position(&self, main_class: &str) -> Option<usize> {
        self.configurations.iter().position(|r| {
            is_java_record(r) && r.get("mainClass").and_then(Value::as_str) == Some(main_class)
        })
    }

    pub fn java_record_count(&self) -> usize {
        self.configurations.iter().filter(|r| is_java_record(r)).count()
    }

    pub fn jmx_status(&self) -> JmxStatus {
        let mut status = JmxStatus::default();
        for record in self.configurations.iter().filter(|r| is_java_record(r)) {
            match record_vm_args(record).and_then(jmx_remote) {
                Some(true) => status.enabled += 1,
                Some(false) => status.disabled += 1,
                None => status.not_set += 1,
            }
        }
        status
    }

    /// Writes the JMX remote flag into every Java record. Records whose
    /// `vmArgs` is not a string are left alone.
    pub fn set_jmx_remote(&mut self, enabled: bool) -> JmxUpdate {
        let before = self.jmx_status();
        let mut java_configs = 0;
        let mut modified = 0;
        for record in self.configurations.iter_mut().filter(|r| is_java_record(r)) {
            java_configs += 1;
            let Some(current) = record_vm_args(record) else {
                warn!(name = record_name(record).unwrap_or(""), "vmArgs is not a string; skipping");
                continue;
            };
            let updated = with_jmx_remote(current, enabled);
            if updated != current {
                set_record_vm_args(record, updated);
                modified += 1;
            }
        }
        JmxUpdate {
            jmx_remote: enabled,
            before,
            java_configs,
            modified,
        }
    }
}

/// Keys the generator owns; dropping one from a template must remove it.
fn is_managed_key(key: &str) -> bool {
    matches!(
        key,
        "type" | "name" | "request" | "mainClass" | "projectName" | "args" | "vmArgs" | "envFile" | "env" | "cwd" | "console" | "stopOnEntry"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn spring_boot_template() {
        let config = LaunchConfig::spring_boot("🍃 App", "com.acme.App", "shop", "dev", &[]);
        assert_eq!(
            config.vm_args,
            "-Dcom.sun.management.jmxremote=false -Djava.awt.headless=true -XX:+DisableAttachMechanism -Dspring.profiles.active=dev"
        );
        assert_eq!(config.env_file.as_deref(), Some("${workspaceFolder}/.env"));
        assert_eq!(config.cwd.as_deref(), Some("${workspaceFolder}"));
        assert_eq!(config.console, Some(ConsoleKind::IntegratedTerminal));
        assert!(config.args.is_empty());

        let value = config.to_value();
        assert_eq!(value["type"], "java");
        assert_eq!(value["request"], "launch");
        assert_eq!(value["console"], "integratedTerminal");
        assert!(value.get("args").is_none());
    }

    #[test]
    fn test_method_template_scopes_args() {
        let config = LaunchConfig::test("🔬 FooTest-works", "a.FooTest", "demo", Some("works"), &[]);
        assert_eq!(config.args, "--tests a.FooTest.works");
        assert!(config.vm_args.ends_with(" -ea"));
        assert!(config.env_file.is_none());
        assert_eq!(
            config.identity(),
            EntryIdentity::new("a.FooTest", Some("works".to_string()))
        );
        assert!(config.is_test());
    }

    #[test]
    fn vm_args_are_never_duplicated() {
        let extra = vec!["-ea -Xmx512m".to_string(), "-Djava.awt.headless=true".to_string()];
        let config = LaunchConfig::test("t", "a.T", "demo", None, &extra);
        assert_eq!(
            config.vm_args,
            "-Dcom.sun.management.jmxremote=false -Djava.awt.headless=true -XX:+DisableAttachMechanism -ea -Xmx512m"
        );
    }

    #[test]
    fn test_method_parsing_requires_matching_class() {
        assert_eq!(
            test_method_from_args("--tests a.B.run", "a.B").as_deref(),
            Some("run")
        );
        assert_eq!(test_method_from_args("--tests a.Bc.run", "a.B"), None);
        assert_eq!(test_method_from_args("--tests", "a.B"), None);
        assert_eq!(test_method_from_args("", "a.B"), None);
    }

    #[test]
    fn upsert_replaces_in_place_and_keeps_unknown_keys() {
        let mut doc: LaunchDocument = serde_json::from_value(json!({
            "version": "0.2.0",
            "configurations": [
                {"type": "node", "name": "web", "request": "launch"},
                {"type": "java", "name": "☕ Tool", "request": "launch", "mainClass": "a.Tool",
                 "vmArgs": "-Xold", "preLaunchTask": "build"}
            ],
            "compounds": []
        }))
        .unwrap();

        let config = LaunchConfig::application("☕ Tool", "a.Tool", "demo", &[]);
        assert_eq!(doc.upsert(&config), Upsert::Updated);
        let fresh = LaunchConfig::application("☕ Other", "a.Other", "demo", &[]);
        assert_eq!(doc.upsert(&fresh), Upsert::Added);

        assert_eq!(doc.names(), vec!["web", "☕ Tool", "☕ Other"]);
        assert_eq!(doc.configurations[1]["preLaunchTask"], "build");
        assert_ne!(doc.configurations[1]["vmArgs"], "-Xold");
        assert!(doc.extra.contains_key("compounds"));

        let found = doc.find("☕ Tool").unwrap().unwrap();
        assert_eq!(found.main_class, "a.Tool");
        assert_eq!(found.extra.get("preLaunchTask"), Some(&json!("build")));
        assert!(doc.find("web").is_err());
        assert!(doc.find("missing").unwrap().is_none());
    }

    #[test]
    fn names_skip_blank_entries() {
        let doc: LaunchDocument = serde_json::from_value(json!({
            "configurations": [{"name": "  "}, {"name": " padded "}, {"type": "java"}]
        }))
        .unwrap();
        assert_eq!(doc.version, "0.2.0");
        assert_eq!(doc.names(), vec!["padded"]);
        assert!(doc.contains("padded"));
    }

    #[test]
    fn record_identity_reads_main_class_and_tests_flag() {
        let record = json!({"mainClass": "a.T", "args": "--tests a.T.go"});
        assert_eq!(
            record_identity(&record),
            Some(EntryIdentity::new("a.T", Some("go".to_string())))
        );
        assert_eq!(record_identity(&json!({"name": "x"})), None);
    }

    #[test]
    fn profile_names_are_trimmed_and_restricted() {
        assert_eq!(validate_profile(" prod ").unwrap(), "prod");
        assert_eq!(validate_profile("local_2-eu").unwrap(), "local_2-eu");
        assert!(matches!(validate_profile("  "), Err(Error::InvalidInput(_))));
        assert!(matches!(validate_profile("dev local"), Err(Error::InvalidInput(_))));
        assert!(matches!(validate_profile("dev,local"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn profile_flags_are_replaced_or_appended() {
        assert_eq!(
            with_spring_profile(
                "-Xmx1g -Dspring.profiles.active=dev -ea -Dspring.profiles.active=test",
                "prod"
            ),
            "-Xmx1g -Dspring.profiles.active=prod -ea -Dspring.profiles.active=prod"
        );
        assert_eq!(
            with_spring_profile("  -Xmx1g ", "prod"),
            "-Xmx1g -Dspring.profiles.active=prod"
        );
        assert_eq!(with_spring_profile("", "prod"), "-Dspring.profiles.active=prod");

        assert_eq!(
            spring_profile("-ea -Dspring.profiles.active=dev,local -Xmx1g"),
            Some("dev,local")
        );
        assert_eq!(spring_profile("-Dspring.profiles.active= -ea"), None);
        assert_eq!(spring_profile("-ea"), None);
    }

    #[test]
    fn jmx_flag_is_toggled_or_appended() {
        let defaults = join_vm_args(DEFAULT_VM_ARGS);
        assert_eq!(jmx_remote(&defaults), Some(false));
        let enabled = with_jmx_remote(&defaults, true);
        assert!(enabled.starts_with("-Dcom.sun.management.jmxremote=true "));
        assert_eq!(jmx_remote(&enabled), Some(true));

        assert_eq!(
            with_jmx_remote("-Xmx1g", false),
            "-Xmx1g -Dcom.sun.management.jmxremote=false"
        );
        let port = "-Dcom.sun.management.jmxremote.port=9010";
        assert_eq!(jmx_remote(port), None);
        assert_eq!(
            with_jmx_remote(port, true),
            "-Dcom.sun.management.jmxremote.port=9010 -Dcom.sun.management.jmxremote=true"
        );
    }

    #[test]
    fn profile_edits_touch_only_the_target_record() {
        let mut doc: LaunchDocument = serde_json::from_value(json!({
            "configurations": [
                {"type": "node", "name": "web", "request": "launch"},
                {"type": "java", "name": "🍃 App", "mainClass": "a.App",
                 "vmArgs": "-Dspring.profiles.active=dev", "preLaunchTask": "build"},
                {"type": "java", "name": "🍃 Other", "mainClass": "a.Other"}
            ]
        }))
        .unwrap();

        assert_eq!(doc.set_spring_profile("🍃 App", "prod").unwrap().as_deref(), Some("dev"));
        assert_eq!(doc.configurations[1]["vmArgs"], "-Dspring.profiles.active=prod");
        assert_eq!(doc.configurations[1]["preLaunchTask"], "build");

        assert_eq!(doc.set_spring_profile_for_class("a.Other", " qa ").unwrap(), None);
        assert_eq!(doc.configurations[2]["vmArgs"], "-Dspring.profiles.active=qa");
        assert_eq!(doc.spring_profile_of("a.App").as_deref(), Some("prod"));
        assert!(doc.configurations[0].get("vmArgs").is_none());

        assert!(matches!(
            doc.set_spring_profile_for_class("a.Missing", "prod"),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(doc.set_spring_profile("nope", "prod"), Err(Error::NotFound { .. })));
        assert!(matches!(doc.set_spring_profile("web", "prod"), Err(Error::InvalidInput(_))));
        assert!(matches!(doc.set_spring_profile("🍃 App", "bad name"), Err(Error::InvalidInput(_))));
        assert_eq!(doc.spring_profile_of("a.App").as_deref(), Some("prod"));
    }

    #[test]
    fn jmx_toggle_counts_java_records() {
        let mut doc: LaunchDocument = serde_json::from_value(json!({
            "configurations": [
                {"type": "java", "name": "A", "mainClass": "a.A",
                 "vmArgs": "-Dcom.sun.management.jmxremote=false -ea"},
                {"type": "java", "name": "B", "mainClass": "a.B"},
                {"type": "java", "name": "C", "mainClass": "a.C",
                 "vmArgs": "-Dcom.sun.management.jmxremote=true"},
                {"type": "node", "name": "D", "request": "launch"},
                {"type": "java", "name": "E", "mainClass": "a.E", "vmArgs": ["-Xmx1g"]}
            ]
        }))
        .unwrap();

        assert_eq!(doc.java_record_count(), 4);
        assert_eq!(
            doc.jmx_status(),
            JmxStatus { enabled: 1, disabled: 1, not_set: 2 }
        );

        let update = doc.set_jmx_remote(true);
        assert_eq!(update.java_configs, 4);
        assert_eq!(update.modified, 2);
        assert_eq!(update.before.disabled, 1);
        assert_eq!(doc.configurations[0]["vmArgs"], "-Dcom.sun.management.jmxremote=true -ea");
        assert_eq!(doc.configurations[1]["vmArgs"], "-Dcom.sun.management.jmxremote=true");
        assert!(doc.configurations[3].get("vmArgs").is_none());
        assert_eq!(doc.configurations[4]["vmArgs"], json!(["-Xmx1g"]));
        assert_eq!(
            doc.jmx_status(),
            JmxStatus { enabled: 3, disabled: 0, not_set: 1 }
        );
    }

    #[test]
    fn editing_requires_an_existing_launch_file() {
        let path = std::env::temp_dir().join(format!(
            "java_launcher_launch_config_test_{}_missing/launch.json",
            std::process::id()
        ));
        assert!(matches!(LaunchDocument::load_existing(&path), Err(Error::NotFound { .. })));
        assert!(LaunchDocument::load(&path).unwrap().configurations.is_empty());
    }
}
