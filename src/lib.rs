pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{toml_config::TomlConfig, LocalStorage};

pub use adapters::delivery::EmailServiceRegistry;
pub use crate::core::{engine::MergeEngine, pipeline::MergePipeline};
pub use crate::core::resolver::{ComputedValues, Resolver};
pub use crate::core::template::{scan, ParsedTemplate, ScanMode, Scanner, Skeleton};
pub use domain::model::MergeReport;
pub use utils::error::{MergeError, Result};
