use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::launch_json_path;
use crate::error::Result;
use crate::launch_config::{DEFAULT_PROFILE, LAUNCH_JSON_VERSION, LaunchConfig, LaunchDocument, Upsert};
use crate::project::ProjectInfo;
use crate::store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    pub profile: String,
    pub extra_vm_args: Vec<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            extra_vm_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReport {
    pub path: PathBuf,
    pub generated: usize,
    pub added: usize,
    pub updated: usize,
    /// False when the merged store was identical to what was on disk.
    pub written: bool,
}

/// One launch config per discovered entry, in entry order.
pub fn launch_configs(project: &ProjectInfo, options: &GenerateOptions) -> Vec<LaunchConfig> {
    project
        .all_java_entries()
        .into_iter()
        .map(|entry| LaunchConfig::for_entry(entry, &options.profile, &options.extra_vm_args))
        .collect()
}

/// The configs that would be generated, as a standalone document.
pub fn preview(project: &ProjectInfo, options: &GenerateOptions) -> Result<String> {
    let configs: Vec<_> = launch_configs(project, options)
        .iter()
        .map(LaunchConfig::to_value)
        .collect();
    let doc = json!({
        "version": LAUNCH_JSON_VERSION,
        "configurations": configs,
    });
    store::to_json_document(Path::new("preview"), &doc)
}

struct Merged {
    document: LaunchDocument,
    generated: usize,
    added: usize,
    updated: usize,
}

fn merge(project: &ProjectInfo, options: &GenerateOptions, path: &Path) -> Merged {
    let mut document = LaunchDocument::load_or_default(path);
    document.version = LAUNCH_JSON_VERSION.to_string();

    let configs = launch_configs(project, options);
    let (mut added, mut updated) = (0, 0);
    for config in &configs {
        match document.upsert(config) {
            Upsert::Added => {
                debug!(name = %config.name, "adding launch configuration");
                added += 1;
            }
            Upsert::Updated => {
                debug!(name = %config.name, "updating launch configuration");
                updated += 1;
            }
        }
    }

    Merged {
        document,
        generated: configs.len(),
        added,
        updated,
    }
}

/// Upsert every generated config into `<dir>/.vscode/launch.json`.
///
/// Existing records with other names are left alone. Generating twice from
/// the same project leaves the store unchanged.
pub fn generate(project: &ProjectInfo, dir: &Path, options: &GenerateOptions) -> Result<GenerateReport> {
    let path = launch_json_path(dir);

    if project.all_java_entries().is_empty() {
        info!("no entry points found; skipping launch configuration generation");
        return Ok(GenerateReport {
            path,
            generated: 0,
            added: 0,
            updated: 0,
            written: false,
        });
    }

    let merged = merge(project, options, &path);
    let content = store::to_json_document(&path, &merged.document)?;
    let unchanged = store::exists(&path)
        && store::read_text(&path).is_ok_and(|current| current == content);

    if !unchanged {
        store::write_text(&path, &content)?;
    }
    info!(
        path = %path.display(),
        generated = merged.generated,
        added = merged.added,
        updated = merged.updated,
        written = !unchanged,
        "launch configurations generated"
    );

    Ok(GenerateReport {
        path,
        generated: merged.generated,
        added: merged.added,
        updated: merged.updated,
        written: !unchanged,
    })
}

/// Whether [`generate`] would change the store on disk.
pub fn needs_update(project: &ProjectInfo, dir: &Path, options: &GenerateOptions) -> Result<bool> {
    let path = launch_json_path(dir);
    if !store::exists(&path) {
        return Ok(!project.all_java_entries().is_empty());
    }

    let merged = merge(project, options, &path);
    let expected = store::to_json_document(&path, &merged.document)?;
    let current = store::read_text(&path)?;
    Ok(store::hash_content(&expected) != store::hash_content(&current))
}
