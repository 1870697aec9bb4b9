use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::config::{history_store_path, launch_json_path};
use crate::entry::EntryIdentity;
use crate::error::Result;
use crate::launch_config::{LaunchDocument, record_identity};
use crate::store;

pub const HISTORY_STORE_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchHistoryItem {
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
    /// Epoch milliseconds.
    pub last_launch_time: u64,
    pub launch_count: u32,
}

impl LaunchHistoryItem {
    fn matches(&self, identity: &EntryIdentity) -> bool {
        self.class_name == identity.class_name && self.method_name == identity.method_name
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryStore {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    history: Vec<LaunchHistoryItem>,
}

fn default_version() -> String {
    HISTORY_STORE_VERSION.to_string()
}

/// Launch counts and recency per entry identity, kept in
/// `.vscode/java-launch-history.json`.
#[derive(Debug)]
pub struct RecentLaunchManager {
    store_path: PathBuf,
    launch_json_path: PathBuf,
    history: Vec<LaunchHistoryItem>,
}

impl RecentLaunchManager {
    pub fn new(workspace: &Path) -> Self {
        Self {
            store_path: history_store_path(workspace),
            launch_json_path: launch_json_path(workspace),
            history: Vec::new(),
        }
    }

    /// History is only a ranking signal: an unreadable store starts empty.
    pub fn load_history(&mut self) -> &[LaunchHistoryItem] {
        self.history = if store::exists(&self.store_path) {
            match store::read_json::<HistoryStore>(&self.store_path) {
                Ok(doc) => doc.history,
                Err(err) => {
                    warn!(error = %err, "ignoring unreadable launch history");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        &self.history
    }

    pub fn save_history(&self) -> Result<()> {
        let doc = HistoryStore {
            version: default_version(),
            history: self.history.clone(),
        };
        store::write_json(&self.store_path, &doc)
    }

    pub fn record_launch(&mut self, identity: &EntryIdentity) -> Result<LaunchHistoryItem> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        self.record_launch_at(identity, now)
    }

    fn record_launch_at(&mut self, identity: &EntryIdentity, now: u64) -> Result<LaunchHistoryItem> {
        self.load_history();

        let item = match self.history.iter_mut().find(|h| h.matches(identity)) {
            Some(existing) => {
                existing.last_launch_time = now.max(existing.last_launch_time);
                existing.launch_count = existing.launch_count.saturating_add(1);
                existing.clone()
            }
            None => {
                let item = LaunchHistoryItem {
                    class_name: identity.class_name.clone(),
                    method_name: identity.method_name.clone(),
                    last_launch_time: now,
                    launch_count: 1,
                };
                self.history.push(item.clone());
                item
            }
        };

        self.save_history()?;
        debug!(class = %item.class_name, count = item.launch_count, "recorded launch");
        Ok(item)
    }

    pub fn launch_info(&mut self, class_name: &str, method_name: Option<&str>) -> Option<LaunchHistoryItem> {
        let identity = EntryIdentity::new(class_name, method_name.map(str::to_string));
        self.load_history()
            .iter()
            .find(|h| h.matches(&identity))
            .cloned()
    }

    /// Most recent first. Ties keep store order.
    pub fn recent(&mut self, limit: Option<usize>) -> Vec<LaunchHistoryItem> {
        let mut sorted = self.load_history().to_vec();
        sorted.sort_by(|a, b| b.last_launch_time.cmp(&a.last_launch_time));
        if let Some(limit) = limit {
            sorted.truncate(limit);
        }
        sorted
    }

    /// Reorder `launch.json` so records launched more recently come first;
    /// records without history keep their relative order after them.
    /// Returns whether the file was rewritten.
    pub fn reorder_launch_json(&mut self) -> Result<bool> {
        if !store::exists(&self.launch_json_path) {
            return Ok(false);
        }
        self.load_history();

        let mut doc = LaunchDocument::load(&self.launch_json_path)?;
        let mut keyed: Vec<(Option<u64>, usize, serde_json::Value)> = doc
            .configurations
            .drain(..)
            .enumerate()
            .map(|(idx, record)| {
                let last = record_identity(&record).and_then(|id| {
                    self.history
                        .iter()
                        .find(|h| h.matches(&id))
                        .map(|h| h.last_launch_time)
                });
                (last, idx, record)
            })
            .collect();

        keyed.sort_by(|a, b| match (a.0, b.0) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        let changed = keyed.iter().enumerate().any(|(pos, (_, idx, _))| pos != *idx);
        doc.configurations = keyed.into_iter().map(|(_, _, record)| record).collect();
        if changed {
            doc.save(&self.launch_json_path)?;
        }
        Ok(changed)
    }
}
