use anyhow::{Context, Result};
use clap::Parser;
use java_launcher::aggregated::{AggregatedLaunchItem, AggregatedLaunchManager, ConfigPatch, ItemPatch};
use java_launcher::cli::{AggregateCommand, Cli, Commands, OutputFormat};
use java_launcher::config::{
    Settings, launch_json_path, load_settings, resolve_java_binary, resolve_workspace,
};
use java_launcher::error::Error;
use java_launcher::generate::{GenerateOptions, generate, preview};
use java_launcher::history::RecentLaunchManager;
use java_launcher::launch_config::{LaunchDocument, validate_profile};
use java_launcher::launcher::JavaLauncher;
use java_launcher::logging::{LoggingConfig, init_logging};
use java_launcher::progress::{BarProgress, decider_for};
use java_launcher::project::ProjectInfo;
use java_launcher::scan::scan_project;
use java_launcher::sequence::{CancelToken, Launcher, RunState};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

const LAUNCH_CONFIG_KIND: &str = "Launch configuration";
const AGGREGATED_CONFIG_KIND: &str = "Aggregated launch config";

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(LoggingConfig::resolve(cli.log_level.as_deref(), cli.log_json));

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            let code = err.downcast_ref::<Error>().map(Error::exit_code).unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let workspace = resolve_workspace(cli)?;
    let settings = load_settings(cli).context("failed to load settings")?;

    match cli.command.clone() {
        Commands::Scan { format } => {
            let project = scan_project(&workspace)?;
            match format {
                OutputFormat::Json => print_json(&project)?,
                OutputFormat::Text => print_project_text(&project),
            }
        }
        Commands::Generate {
            profile,
            vm_args,
            dry_run,
        } => {
            let project = scan_project(&workspace)?;
            let options = generate_options(&settings, profile, vm_args);
            if dry_run {
                println!("{}", preview(&project, &options)?.trim_end());
            } else {
                print_json(&generate(&project, &workspace, &options)?)?;
            }
        }
        Commands::Targets => {
            let manager = AggregatedLaunchManager::new(&workspace);
            print_json(&manager.available_launch_configs()?)?;
        }
        Commands::Launch { name } => {
            let launcher = java_launcher(cli, &workspace, &settings);
            return launch_one(&workspace, &launcher, &name);
        }
        Commands::Recent { limit } => {
            let mut history = RecentLaunchManager::new(&workspace);
            print_json(&history.recent(limit))?;
        }
        Commands::SetProfile { profile, name, all } => {
            return set_profile(&workspace, &profile, name.filter(|_| !all).as_deref());
        }
        Commands::SetJmx { state } => {
            let path = launch_json_path(&workspace);
            let mut doc = LaunchDocument::load_existing(&path)?;
            let update = doc.set_jmx_remote(state.enabled());
            if update.modified > 0 {
                doc.save(&path)?;
            }
            if update.java_configs == 0 {
                eprintln!("warning: no Java launch configurations in {}", path.display());
            }
            print_json(&update)?;
        }
        Commands::Search { query } => {
            let project = scan_project(&workspace)?;
            let mut manager = AggregatedLaunchManager::new(&workspace);
            let aggregated: Vec<_> = manager
                .search(&query)?
                .iter()
                .map(|c| {
                    json!({
                        "name": c.name,
                        "description": c.description,
                        "enabledItems": c.enabled_item_count(),
                        "totalItems": c.item_count(),
                    })
                })
                .collect();
            print_json(&json!({
                "entries": project.search(&query),
                "aggregated": aggregated,
            }))?;
        }
        Commands::Aggregate { command } => {
            return aggregate(cli, &workspace, &settings, command);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn generate_options(settings: &Settings, profile: Option<String>, vm_args: Vec<String>) -> GenerateOptions {
    let mut extra_vm_args = settings.extra_vm_args.clone();
    extra_vm_args.extend(vm_args);
    GenerateOptions {
        profile: profile.unwrap_or_else(|| settings.spring_profile.clone()),
        extra_vm_args,
    }
}

fn java_launcher(cli: &Cli, workspace: &Path, settings: &Settings) -> JavaLauncher {
    JavaLauncher::from_settings(workspace.to_path_buf(), resolve_java_binary(cli), settings)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

fn launch_one(workspace: &Path, launcher: &JavaLauncher, name: &str) -> Result<ExitCode> {
    let doc = LaunchDocument::load(&launch_json_path(workspace))?;
    let config = doc
        .find(name)?
        .ok_or_else(|| Error::not_found(LAUNCH_CONFIG_KIND, name))?;

    let started = runtime()?.block_on(launcher.start_launch(name))?;
    if !started {
        return Err(Error::LaunchFailure {
            target: name.to_string(),
            reason: "process exited during startup".to_string(),
        }
        .into());
    }

    let mut history = RecentLaunchManager::new(workspace);
    let item = history.record_launch(&config.identity())?;
    let reordered = history.reorder_launch_json()?;
    print_json(&json!({
        "name": name,
        "started": true,
        "history": item,
        "reordered": reordered,
    }))?;
    Ok(ExitCode::SUCCESS)
}

/// Edits one named record, or every detected Spring Boot application when
/// `name` is `None`.
fn set_profile(workspace: &Path, profile: &str, name: Option<&str>) -> Result<ExitCode> {
    let profile = validate_profile(profile)?;
    let path = launch_json_path(workspace);
    let mut doc = LaunchDocument::load_existing(&path)?;
    let project = scan_project(workspace)?;
    let spring_apps = project.spring_boot_entries();

    if let Some(name) = name {
        let config = doc
            .find(name)?
            .ok_or_else(|| Error::not_found(LAUNCH_CONFIG_KIND, name))?;
        if !spring_apps.iter().any(|e| e.qualified_class_name == config.main_class) {
            return Err(Error::InvalidInput(format!(
                "'{name}' does not launch a Spring Boot application"
            ))
            .into());
        }
        let previous = doc.set_spring_profile(name, profile)?;
        doc.save(&path)?;
        print_json(&json!({
            "name": name,
            "mainClass": config.main_class,
            "previous": previous,
            "profile": profile,
        }))?;
        return Ok(ExitCode::SUCCESS);
    }

    if spring_apps.is_empty() {
        warn!("no Spring Boot applications detected");
        eprintln!("warning: no Spring Boot applications detected");
    }
    let mut updated = Vec::new();
    let mut failed = Vec::new();
    for entry in &spring_apps {
        match doc.set_spring_profile_for_class(&entry.qualified_class_name, profile) {
            Ok(previous) => updated.push(json!({
                "name": entry.display_name,
                "mainClass": entry.qualified_class_name,
                "previous": previous,
            })),
            Err(err) => {
                warn!(class = %entry.qualified_class_name, error = %err, "profile not updated");
                failed.push(json!({
                    "name": entry.display_name,
                    "mainClass": entry.qualified_class_name,
                    "error": err.to_string(),
                }));
            }
        }
    }
    if !updated.is_empty() {
        doc.save(&path)?;
    }

    print_json(&json!({
        "profile": profile,
        "updated": updated,
        "failed": failed,
    }))?;
    Ok(if failed.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn aggregate(
    cli: &Cli,
    workspace: &Path,
    settings: &Settings,
    command: AggregateCommand,
) -> Result<ExitCode> {
    let mut manager = AggregatedLaunchManager::new(workspace);

    match command {
        AggregateCommand::List => print_json(&manager.configs()?)?,
        AggregateCommand::Show { name } => {
            let config = manager
                .get_config_by_name(&name)?
                .ok_or_else(|| Error::not_found(AGGREGATED_CONFIG_KIND, &name))?;
            print_json(&config)?;
        }
        AggregateCommand::Create {
            name,
            description,
            items,
        } => {
            warn_unknown_targets(&manager, &items);
            let config = manager.create_config(&name, description.as_deref().unwrap_or(""), items)?;
            print_json(&config)?;
        }
        AggregateCommand::Update {
            name,
            description,
            items,
        } => {
            if description.is_none() && items.is_empty() {
                return Err(Error::InvalidInput(
                    "update needs --description or at least one --item".to_string(),
                )
                .into());
            }
            warn_unknown_targets(&manager, &items);
            let patch = ConfigPatch {
                description,
                items: (!items.is_empty()).then_some(items),
            };
            print_json(&manager.update_config(&name, &patch)?)?;
        }
        AggregateCommand::AddItem { name, item } => {
            warn_unknown_targets(&manager, std::slice::from_ref(&item));
            print_json(&manager.add_item(&name, item)?)?;
        }
        AggregateCommand::RemoveItem { name, item } => {
            print_json(&manager.remove_item(&name, &item)?)?;
        }
        AggregateCommand::SetItem {
            name,
            item,
            enable,
            disable,
            delay,
        } => {
            let enabled = match (enable, disable) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            if enabled.is_none() && delay.is_none() {
                return Err(Error::InvalidInput(
                    "set-item needs --enable, --disable or --delay".to_string(),
                )
                .into());
            }
            let patch = ItemPatch { enabled, delay };
            print_json(&manager.update_item(&name, &item, &patch)?)?;
        }
        AggregateCommand::Delete { name } => {
            manager.delete_config(&name)?;
            print_json(&json!({ "deleted": name }))?;
        }
        AggregateCommand::Run { name, on_failure } => {
            let launcher = java_launcher(cli, workspace, settings);
            let progress = BarProgress::new();
            let decider = decider_for(
                on_failure.unwrap_or(settings.on_failure),
                Some(progress.bar()),
            );
            let cancel = CancelToken::new();

            let report = runtime()?.block_on(async {
                let token = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        token.cancel();
                    }
                });
                manager
                    .execute(&name, &launcher, decider.as_ref(), &progress, &cancel)
                    .await
            })?;

            print_json(&report)?;
            if report.state == RunState::AbortedOnFailure || !report.failed.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Items may name configs that are generated later; only warn.
fn warn_unknown_targets(manager: &AggregatedLaunchManager, items: &[AggregatedLaunchItem]) {
    let available = match manager.available_launch_configs() {
        Ok(names) => names,
        Err(err) => {
            warn!(error = %err, "cannot read launch configurations");
            return;
        }
    };
    for item in items.iter().filter(|i| !available.contains(&i.name)) {
        warn!(item = %item.name, "no launch configuration with this name");
        eprintln!("warning: no launch configuration named '{}'", item.name);
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_project_text(project: &ProjectInfo) {
    let stats = project.statistics();
    println!("{} ({})", project.name, project.project_type);
    println!(
        "entries: {} (spring boot: {}, applications: {}, test classes: {}, test methods: {})",
        stats.total_entries,
        stats.spring_boot_apps,
        stats.java_applications,
        stats.test_classes,
        stats.test_methods
    );

    for entry in project.all_java_entries() {
        let file = relative_to(&project.root_path, &entry.source_file_path);
        println!(
            "{}\t{}\t{}:{}",
            entry.display_name,
            entry.full_identifier(),
            file.display(),
            entry.line_number
        );
    }
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
