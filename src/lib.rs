pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use core::{etl::EtlEngine, pipeline::BenefitPipeline};
pub use domain::model::{RunOutcome, RunParameters, TeamCode};
pub use utils::error::{EtlError, Result};
