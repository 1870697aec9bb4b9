//! # java-launcher
//!
//! Java entry-point discovery, launch configuration generation and
//! sequenced multi-target launches for a workspace.
//!
//! ## Architecture
//!
//! - **classify**: Finds Spring Boot apps, main classes and tests in one source file
//! - **manifest**: Project names and module lists from pom.xml and Gradle files
//! - **scan**: Walks a project root and collects entries into a [`project::ProjectInfo`]
//! - **generate**: Merges one launch config per entry into `.vscode/launch.json`
//! - **aggregated**: Named, ordered launch groups stored in `.vscode/aggregated-launch.json`
//! - **sequence**: Serial execution of a group with delays, failure policy and cancellation
//! - **launcher**: Spawns the JVM for a generated launch config
//! - **history**: Launch recency and counts, used to reorder `launch.json`
//! - **progress**: Terminal progress bar and failure prompt
//! - **store**: Atomic text/JSON file access and content hashing

pub mod aggregated;
pub mod classify;
pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod generate;
pub mod history;
pub mod launch_config;
pub mod launcher;
pub mod logging;
pub mod manifest;
pub mod progress;
pub mod project;
pub mod scan;
pub mod sequence;
pub mod store;

pub use error::{Error, Result};
