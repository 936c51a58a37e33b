pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::domain::model::columns::DEFAULT_OFFER_COLUMNS;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_list, validate_non_negative,
    validate_non_empty_string, validate_path, validate_range,
};

#[cfg(feature = "cli")]
use crate::domain::model::{RunParameters, TeamCode};
#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const INPUT_EXTENSIONS: [&str; 1] = ["csv"];

pub fn default_offer_columns() -> Vec<String> {
    DEFAULT_OFFER_COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// CLI 與 TOML 共用的配置檢查
pub fn validate_provider<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_non_empty_list("input", config.input_files())?;
    validate_file_extensions("input", config.input_files(), &INPUT_EXTENSIONS)?;
    validate_file_extensions("margin_files", config.margin_files(), &INPUT_EXTENSIONS)?;
    validate_path("output_path", config.output_path())?;

    let columns = config.offer_columns();
    validate_non_empty_list("offer_columns", &columns)?;
    for column in &columns {
        validate_non_empty_string("offer_columns", column)?;
    }

    let params = config.parameters();
    validate_range("commission_percent", params.commission_percent, 0.0, 100.0)?;
    validate_non_negative("min_commission", params.min_commission)?;
    if let Some(ceiling) = params.margin_ceiling {
        validate_non_negative("margin_ceiling", ceiling)?;
    }

    if params.margin_ceiling.is_some() && config.margin_files().is_empty() {
        tracing::warn!("⚠️ margin_ceiling is set but no margin files were given; it will be ignored");
    }
    Ok(())
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "benefit-etl")]
#[command(about = "Extracts the best benefit offer per client and builds the commission CSV")]
pub struct CliConfig {
    /// Primary CSV exports, comma separated
    #[arg(long = "input", value_delimiter = ',', required = true)]
    pub input_files: Vec<String>,

    /// Margin CSV files used to enrich and filter the primary records
    #[arg(long, value_delimiter = ',')]
    pub margin_files: Vec<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_enum, default_value_t = TeamCode::Outbound)]
    pub team: TeamCode,

    /// Bank commission in percent
    #[arg(long, default_value_t = crate::domain::model::DEFAULT_COMMISSION_PERCENT)]
    pub commission_percent: f64,

    /// Minimum commission (R$) a record must reach
    #[arg(long, default_value_t = crate::domain::model::DEFAULT_MIN_COMMISSION)]
    pub min_commission: f64,

    /// Maximum loan margin available, only applied with margin files
    #[arg(long)]
    pub margin_ceiling: Option<f64>,

    #[arg(long, help = "Keep only records with a positive Saldo_Devedor")]
    pub require_positive_balance: bool,

    /// Candidate columns holding the pipe-delimited offers, first present wins
    #[arg(long, value_delimiter = ',', default_value = "Simulacoes,Observacoes")]
    pub offer_columns: Vec<String>,

    #[arg(long, help = "Write run_summary.json next to the output CSV")]
    pub summary: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_files(&self) -> &[String] {
        &self.input_files
    }

    fn margin_files(&self) -> &[String] {
        &self.margin_files
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn offer_columns(&self) -> Vec<String> {
        if self.offer_columns.is_empty() {
            default_offer_columns()
        } else {
            self.offer_columns.clone()
        }
    }

    fn parameters(&self) -> RunParameters {
        RunParameters {
            team: self.team,
            commission_percent: self.commission_percent,
            min_commission: self.min_commission,
            margin_ceiling: self.margin_ceiling,
            require_positive_balance: self.require_positive_balance,
        }
    }

    fn write_summary(&self) -> bool {
        self.summary
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}
