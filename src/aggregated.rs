use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::config::{aggregated_store_path, launch_json_path};
use crate::error::{Error, Result};
use crate::launch_config::LaunchDocument;
use crate::sequence::{CancelToken, FailureDecider, Launcher, ProgressSink, RunReport, run_sequence};
use crate::store;

pub const AGGREGATED_STORE_VERSION: &str = "1.0.0";
const CONFIG_KIND: &str = "Aggregated launch config";
const ITEM_KIND: &str = "Aggregated launch item";

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedLaunchItem {
    /// Name of a generated launch config.
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Milliseconds to wait before this item is launched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
}

impl AggregatedLaunchItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            delay: None,
        }
    }
}

/// `NAME[@DELAY_MS][:off]`
impl FromStr for AggregatedLaunchItem {
    type Err = Error;

    fn from_str(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let (rest, enabled) = match spec.strip_suffix(":off") {
            Some(rest) => (rest, false),
            None => (spec.strip_suffix(":on").unwrap_or(spec), true),
        };

        let (name, delay) = match rest.rsplit_once('@') {
            Some((name, delay)) if !delay.is_empty() && delay.bytes().all(|b| b.is_ascii_digit()) => {
                let delay = delay
                    .parse::<u64>()
                    .map_err(|e| Error::InvalidInput(format!("invalid delay in '{spec}': {e}")))?;
                (name.trim(), Some(delay))
            }
            _ => (rest.trim(), None),
        };

        if name.is_empty() {
            return Err(Error::InvalidInput(format!("item '{spec}' has no name")));
        }

        Ok(Self {
            name: name.to_string(),
            enabled,
            delay,
        })
    }
}

/// Partial change to one item. A delay of zero clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub enabled: Option<bool>,
    pub delay: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    pub description: Option<String>,
    /// Replaces the whole item list.
    pub items: Option<Vec<AggregatedLaunchItem>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedLaunchConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Execution order.
    #[serde(default)]
    pub items: Vec<AggregatedLaunchItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AggregatedLaunchConfig {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        items: Vec<AggregatedLaunchItem>,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: description.into(),
            items,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn enabled_items(&self) -> Vec<&AggregatedLaunchItem> {
        self.items.iter().filter(|i| i.enabled).collect()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn enabled_item_count(&self) -> usize {
        self.items.iter().filter(|i| i.enabled).count()
    }

    pub fn contains_launch_config(&self, name: &str) -> bool {
        self.items.iter().any(|i| i.name == name)
    }

    fn touched(&self, description: String, items: Vec<AggregatedLaunchItem>) -> Self {
        Self {
            name: self.name.clone(),
            description,
            items,
            created_at: self.created_at,
            updated_at: Utc::now().max(self.created_at),
        }
    }

    pub fn with_item_added(&self, item: AggregatedLaunchItem) -> Self {
        let mut items = self.items.clone();
        items.push(item);
        self.touched(self.description.clone(), items)
    }

    pub fn with_item_removed(&self, name: &str) -> Self {
        let items = self
            .items
            .iter()
            .filter(|i| i.name != name)
            .cloned()
            .collect();
        self.touched(self.description.clone(), items)
    }

    pub fn with_item_updated(&self, name: &str, patch: &ItemPatch) -> Self {
        let items = self
            .items
            .iter()
            .map(|i| {
                if i.name != name {
                    return i.clone();
                }
                let mut updated = i.clone();
                if let Some(enabled) = patch.enabled {
                    updated.enabled = enabled;
                }
                if let Some(delay) = patch.delay {
                    updated.delay = (delay > 0).then_some(delay);
                }
                updated
            })
            .collect();
        self.touched(self.description.clone(), items)
    }

    pub fn with_patch(&self, patch: &ConfigPatch) -> Self {
        self.touched(
            patch
                .description
                .clone()
                .unwrap_or_else(|| self.description.clone()),
            patch.items.clone().unwrap_or_else(|| self.items.clone()),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AggregatedStore {
    #[serde(default = "default_store_version")]
    version: String,
    #[serde(default)]
    configs: Vec<AggregatedLaunchConfig>,
}

fn default_store_version() -> String {
    AGGREGATED_STORE_VERSION.to_string()
}

/// CRUD over `.vscode/aggregated-launch.json` plus execution.
///
/// Every operation re-reads the store, mutates and writes it back. There is
/// no locking between processes.
#[derive(Debug)]
pub struct AggregatedLaunchManager {
    store_path: PathBuf,
    launch_json_path: PathBuf,
    configs: Vec<AggregatedLaunchConfig>,
}

impl AggregatedLaunchManager {
    pub fn new(workspace: &Path) -> Self {
        Self {
            store_path: aggregated_store_path(workspace),
            launch_json_path: launch_json_path(workspace),
            configs: Vec::new(),
        }
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn load_configs(&mut self) -> Result<&[AggregatedLaunchConfig]> {
        self.configs = if store::exists(&self.store_path) {
            store::read_json::<AggregatedStore>(&self.store_path)?.configs
        } else {
            Vec::new()
        };
        debug!(count = self.configs.len(), "loaded aggregated launch configs");
        Ok(&self.configs)
    }

    pub fn save_configs(&self) -> Result<()> {
        let doc = AggregatedStore {
            version: default_store_version(),
            configs: self.configs.clone(),
        };
        store::write_json(&self.store_path, &doc)
    }

    pub fn configs(&mut self) -> Result<Vec<AggregatedLaunchConfig>> {
        Ok(self.load_configs()?.to_vec())
    }

    pub fn get_config_by_name(&mut self, name: &str) -> Result<Option<AggregatedLaunchConfig>> {
        Ok(self
            .load_configs()?
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    /// Configs whose name contains `query`, ignoring case; a blank query
    /// matches nothing.
    pub fn search(&mut self, query: &str) -> Result<Vec<AggregatedLaunchConfig>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .load_configs()?
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.configs
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| Error::not_found(CONFIG_KIND, name))
    }

    pub fn create_config(
        &mut self,
        name: &str,
        description: &str,
        items: Vec<AggregatedLaunchItem>,
    ) -> Result<AggregatedLaunchConfig> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput(
                "aggregated launch config name must not be empty".to_string(),
            ));
        }

        self.load_configs()?;
        if self.configs.iter().any(|c| c.name == name) {
            return Err(Error::NameExists(name.to_string()));
        }

        let config = AggregatedLaunchConfig::new(name, description, items);
        self.configs.push(config.clone());
        self.save_configs()?;
        info!(name, items = config.item_count(), "created aggregated launch config");
        Ok(config)
    }

    pub fn update_config(&mut self, name: &str, patch: &ConfigPatch) -> Result<AggregatedLaunchConfig> {
        self.replace(name, |config| Ok(config.with_patch(patch)))
    }

    pub fn delete_config(&mut self, name: &str) -> Result<()> {
        self.load_configs()?;
        let idx = self.position(name)?;
        self.configs.remove(idx);
        self.save_configs()?;
        info!(name, "deleted aggregated launch config");
        Ok(())
    }

    pub fn add_item(&mut self, name: &str, item: AggregatedLaunchItem) -> Result<AggregatedLaunchConfig> {
        self.replace(name, |config| Ok(config.with_item_added(item)))
    }

    pub fn remove_item(&mut self, name: &str, item_name: &str) -> Result<AggregatedLaunchConfig> {
        self.replace(name, |config| {
            if !config.contains_launch_config(item_name) {
                return Err(Error::not_found(ITEM_KIND, item_name));
            }
            Ok(config.with_item_removed(item_name))
        })
    }

    pub fn update_item(
        &mut self,
        name: &str,
        item_name: &str,
        patch: &ItemPatch,
    ) -> Result<AggregatedLaunchConfig> {
        self.replace(name, |config| {
            if !config.contains_launch_config(item_name) {
                return Err(Error::not_found(ITEM_KIND, item_name));
            }
            Ok(config.with_item_updated(item_name, patch))
        })
    }

    fn replace(
        &mut self,
        name: &str,
        change: impl FnOnce(&AggregatedLaunchConfig) -> Result<AggregatedLaunchConfig>,
    ) -> Result<AggregatedLaunchConfig> {
        self.load_configs()?;
        let idx = self.position(name)?;
        let updated = change(&self.configs[idx])?;
        self.configs[idx] = updated.clone();
        self.save_configs()?;
        debug!(name, "updated aggregated launch config");
        Ok(updated)
    }

    /// Names of the generated launch configs an item may refer to.
    pub fn available_launch_configs(&self) -> Result<Vec<String>> {
        Ok(LaunchDocument::load(&self.launch_json_path)?.names())
    }

    pub fn validate_launch_config(&self, name: &str) -> Result<bool> {
        Ok(self
            .available_launch_configs()?
            .iter()
            .any(|n| n == name))
    }

    /// Run the named config's enabled items in order.
    pub async fn execute(
        &mut self,
        name: &str,
        launcher: &dyn Launcher,
        decider: &dyn FailureDecider,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<RunReport> {
        let config = self
            .get_config_by_name(name)?
            .ok_or_else(|| Error::not_found(CONFIG_KIND, name))?;
        Ok(run_sequence(&config, launcher, decider, progress, cancel).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{FailureAction, FixedDecision, NoProgress};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "java_launcher_aggregated_test_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    fn items(specs: &[&str]) -> Vec<AggregatedLaunchItem> {
        specs.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn item_spec_parsing() {
        let item: AggregatedLaunchItem = "🍃 App@1500".parse().unwrap();
        assert_eq!(item.name, "🍃 App");
        assert_eq!(item.delay, Some(1500));
        assert!(item.enabled);

        let item: AggregatedLaunchItem = "worker@home:off".parse().unwrap();
        assert_eq!(item.name, "worker@home");
        assert_eq!(item.delay, None);
        assert!(!item.enabled);

        assert!("@20".parse::<AggregatedLaunchItem>().is_err());
        assert!("  ".parse::<AggregatedLaunchItem>().is_err());
    }

    #[test]
    fn create_then_lookup_round_trips() -> Result<()> {
        let ws = temp_dir("create");
        let mut manager = AggregatedLaunchManager::new(&ws);

        let created = manager.create_config("stack", "all services", items(&["A", "B@200:off"]))?;
        assert!(created.created_at <= created.updated_at);

        let mut fresh = AggregatedLaunchManager::new(&ws);
        let found = fresh.get_config_by_name("stack")?.unwrap();
        assert_eq!(found.description, "all services");
        assert_eq!(found.items, items(&["A", "B@200:off"]));
        assert!(found.created_at <= found.updated_at);

        let _ = std::fs::remove_dir_all(ws);
        Ok(())
    }

    #[test]
    fn search_matches_config_names_ignoring_case() -> Result<()> {
        let ws = temp_dir("search");
        let mut manager = AggregatedLaunchManager::new(&ws);
        manager.create_config("Backend Stack", "", items(&["A", "B:off"]))?;
        manager.create_config("frontend", "", Vec::new())?;

        let found = manager.search("STACK")?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Backend Stack");
        assert_eq!(found[0].enabled_item_count(), 1);
        assert_eq!(manager.search("end")?.len(), 2);
        assert!(manager.search(" ")?.is_empty());

        let _ = std::fs::remove_dir_all(ws);
        Ok(())
    }

    #[test]
    fn duplicate_names_are_rejected() -> Result<()> {
        let ws = temp_dir("duplicate");
        let mut manager = AggregatedLaunchManager::new(&ws);

        manager.create_config("stack", "first", Vec::new())?;
        let err = manager
            .create_config("stack", "second", items(&["X"]))
            .unwrap_err();
        assert!(matches!(err, Error::NameExists(_)));

        let configs = manager.configs()?;
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].description, "first");

        let _ = std::fs::remove_dir_all(ws);
        Ok(())
    }

    #[test]
    fn update_and_delete_require_existing_config() -> Result<()> {
        let ws = temp_dir("missing");
        let mut manager = AggregatedLaunchManager::new(&ws);

        let err = manager
            .update_config("ghost", &ConfigPatch::default())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(matches!(
            manager.delete_config("ghost").unwrap_err(),
            Error::NotFound { .. }
        ));

        manager.create_config("stack", "", items(&["A"]))?;
        manager.delete_config("stack")?;
        assert!(manager.get_config_by_name("stack")?.is_none());

        let _ = std::fs::remove_dir_all(ws);
        Ok(())
    }

    #[test]
    fn patch_replaces_items_and_keeps_created_at() -> Result<()> {
        let ws = temp_dir("patch");
        let mut manager = AggregatedLaunchManager::new(&ws);
        let created = manager.create_config("stack", "old", items(&["A", "B"]))?;

        let updated = manager.update_config(
            "stack",
            &ConfigPatch {
                description: None,
                items: Some(items(&["C@10"])),
            },
        )?;
        assert_eq!(updated.description, "old");
        assert_eq!(updated.items, items(&["C@10"]));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);

        let _ = std::fs::remove_dir_all(ws);
        Ok(())
    }

    #[test]
    fn item_operations() -> Result<()> {
        let ws = temp_dir("items");
        let mut manager = AggregatedLaunchManager::new(&ws);
        manager.create_config("stack", "", items(&["A", "B@100"]))?;

        manager.add_item("stack", "C".parse()?)?;
        let updated = manager.update_item(
            "stack",
            "B",
            &ItemPatch {
                enabled: Some(false),
                delay: Some(0),
            },
        )?;
        assert_eq!(updated.items[1], items(&["B:off"])[0]);
        assert_eq!(updated.enabled_item_count(), 2);

        let removed = manager.remove_item("stack", "A")?;
        assert_eq!(removed.item_count(), 2);
        assert!(!removed.contains_launch_config("A"));
        assert!(matches!(
            manager.remove_item("stack", "A").unwrap_err(),
            Error::NotFound { .. }
        ));

        let _ = std::fs::remove_dir_all(ws);
        Ok(())
    }

    #[test]
    fn value_operations_leave_original_untouched() {
        let original = AggregatedLaunchConfig::new("stack", "", items(&["A"]));
        let grown = original.with_item_added(AggregatedLaunchItem::new("B"));
        assert_eq!(original.item_count(), 1);
        assert_eq!(grown.item_count(), 2);
        assert_eq!(grown.created_at, original.created_at);
        assert!(grown.updated_at >= original.updated_at);
    }

    #[test]
    fn available_targets_come_from_launch_json() -> Result<()> {
        let ws = temp_dir("targets");
        store::write_text(
            &launch_json_path(&ws),
            r#"{"version":"0.2.0","configurations":[{"name":"🍃 App"},{"name":" "}]}"#,
        )?;
        let manager = AggregatedLaunchManager::new(&ws);
        assert_eq!(manager.available_launch_configs()?, vec!["🍃 App"]);
        assert!(manager.validate_launch_config("🍃 App")?);
        assert!(!manager.validate_launch_config("☕ Gone")?);

        let _ = std::fs::remove_dir_all(ws);
        Ok(())
    }

    #[test]
    fn corrupt_store_propagates() -> Result<()> {
        let ws = temp_dir("corrupt");
        let mut manager = AggregatedLaunchManager::new(&ws);
        store::write_text(manager.store_path(), "not json")?;
        let err = manager.create_config("stack", "", Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Json { .. }));

        let _ = std::fs::remove_dir_all(ws);
        Ok(())
    }

    struct Recorder(Mutex<Vec<String>>);

    #[async_trait]
    impl Launcher for Recorder {
        async fn start_launch(&self, target: &str) -> Result<bool> {
            self.0.lock().unwrap().push(target.to_string());
            Ok(true)
        }
    }

    #[tokio::test]
    async fn execute_unknown_config_is_not_found() {
        let ws = temp_dir("execute");
        let mut manager = AggregatedLaunchManager::new(&ws);
        let launcher = Recorder(Mutex::new(Vec::new()));

        let err = manager
            .execute(
                "ghost",
                &launcher,
                &FixedDecision(FailureAction::Stop),
                &NoProgress,
                &CancelToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        manager
            .create_config("stack", "", items(&["A", "B:off", "C@5"]))
            .unwrap();
        let report = manager
            .execute(
                "stack",
                &launcher,
                &FixedDecision(FailureAction::Stop),
                &NoProgress,
                &CancelToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(report.launched, vec!["A", "C"]);
        assert_eq!(*launcher.0.lock().unwrap(), vec!["A", "C"]);

        let _ = std::fs::remove_dir_all(ws);
    }
}
