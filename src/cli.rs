use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::aggregated::AggregatedLaunchItem;
use crate::config::FailurePolicy;

#[derive(Debug, Clone, Parser)]
#[command(name = "java-launcher")]
#[command(about = "Discover Java entry points, generate launch configurations and run aggregated launches")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    #[arg(long, global = true, value_name = "FILE")]
    pub java: Option<PathBuf>,

    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Scan the workspace for entry points
    Scan {
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Write detected entry points into .vscode/launch.json
    Generate {
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,

        #[arg(long = "vm-arg", value_name = "ARG", allow_hyphen_values = true)]
        vm_args: Vec<String>,

        #[arg(long)]
        dry_run: bool,
    },
    /// List launch configuration names usable as aggregated items
    Targets,
    /// Start one generated launch configuration
    Launch { name: String },
    /// Recently launched entries, most recent first
    Recent {
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },
    /// Set the active Spring profile in launch.json
    SetProfile {
        profile: String,

        /// Launch configuration to edit
        #[arg(long, value_name = "NAME", conflicts_with = "all", required_unless_present = "all")]
        name: Option<String>,

        /// Every detected Spring Boot application
        #[arg(long)]
        all: bool,
    },
    /// Turn JMX remote management on or off for every Java launch configuration
    SetJmx {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Find entry points and aggregated launches by name
    Search { query: String },
    /// Manage and run aggregated launches
    Aggregate {
        #[command(subcommand)]
        command: AggregateCommand,
    },
}

/// Item specs use `NAME[@DELAY_MS][:off]`.
#[derive(Debug, Clone, Subcommand)]
pub enum AggregateCommand {
    List,
    Show {
        name: String,
    },
    Create {
        name: String,

        #[arg(long, value_name = "TEXT")]
        description: Option<String>,

        #[arg(long = "item", value_name = "SPEC")]
        items: Vec<AggregatedLaunchItem>,
    },
    /// `--item` replaces the whole item list
    Update {
        name: String,

        #[arg(long, value_name = "TEXT")]
        description: Option<String>,

        #[arg(long = "item", value_name = "SPEC")]
        items: Vec<AggregatedLaunchItem>,
    },
    AddItem {
        name: String,
        item: AggregatedLaunchItem,
    },
    RemoveItem {
        name: String,
        item: String,
    },
    SetItem {
        name: String,
        item: String,

        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "disable")]
        enable: bool,

        #[arg(long, action = ArgAction::SetTrue)]
        disable: bool,

        /// Milliseconds; 0 clears the delay
        #[arg(long, value_name = "MS")]
        delay: Option<u64>,
    },
    Delete {
        name: String,
    },
    Run {
        name: String,

        #[arg(long, value_enum, value_name = "POLICY")]
        on_failure: Option<FailurePolicy>,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn enabled(self) -> bool {
        self == Switch::On
    }
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "java-launcher",
            "aggregate",
            "run",
            "stack",
            "--on-failure",
            "continue",
            "--workspace",
            "/tmp/ws",
        ]);
        assert_eq!(cli.workspace, Some(PathBuf::from("/tmp/ws")));
        match cli.command {
            Commands::Aggregate {
                command: AggregateCommand::Run { name, on_failure },
            } => {
                assert_eq!(name, "stack");
                assert_eq!(on_failure, Some(FailurePolicy::Continue));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn item_specs_parse() {
        let cli = Cli::parse_from([
            "java-launcher",
            "aggregate",
            "create",
            "stack",
            "--item",
            "A",
            "--item",
            "B:off",
            "--item",
            "C@50",
        ]);
        let Commands::Aggregate {
            command: AggregateCommand::Create { items, .. },
        } = cli.command
        else {
            panic!("expected create");
        };
        assert_eq!(items.len(), 3);
        assert!(!items[1].enabled);
        assert_eq!(items[2].delay, Some(50));
    }

    #[test]
    fn vm_args_accept_leading_dash() {
        let cli = Cli::parse_from(["java-launcher", "generate", "--vm-arg", "-Xmx1g", "--dry-run"]);
        let Commands::Generate { vm_args, dry_run, .. } = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(vm_args, vec!["-Xmx1g"]);
        assert!(dry_run);
    }

    #[test]
    fn set_profile_needs_exactly_one_target() {
        let cli = Cli::parse_from(["java-launcher", "set-profile", "prod", "--all"]);
        let Commands::SetProfile { profile, name, all } = cli.command else {
            panic!("expected set-profile");
        };
        assert_eq!(profile, "prod");
        assert_eq!(name, None);
        assert!(all);

        let cli = Cli::parse_from(["java-launcher", "set-profile", "qa", "--name", "🍃 App"]);
        assert!(matches!(cli.command, Commands::SetProfile { all: false, name: Some(_), .. }));

        assert!(Cli::try_parse_from(["java-launcher", "set-profile", "qa"]).is_err());
        assert!(
            Cli::try_parse_from(["java-launcher", "set-profile", "qa", "--all", "--name", "x"]).is_err()
        );
    }

    #[test]
    fn jmx_switch_values() {
        let cli = Cli::parse_from(["java-launcher", "set-jmx", "off"]);
        let Commands::SetJmx { state } = cli.command else {
            panic!("expected set-jmx");
        };
        assert!(!state.enabled());
        assert!(Cli::try_parse_from(["java-launcher", "set-jmx", "maybe"]).is_err());
    }
}
