use crate::config::{default_offer_columns, validate_provider};
use crate::core::ConfigProvider;
use crate::domain::model::{
    RunParameters, TeamCode, DEFAULT_COMMISSION_PERCENT, DEFAULT_MIN_COMMISSION,
};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

// 匹配 ${VAR_NAME} 格式
static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub parameters: ParametersConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub files: Vec<String>,
    #[serde(default)]
    pub margin_files: Vec<String>,
    pub offer_columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParametersConfig {
    #[serde(default = "default_team")]
    pub team: TeamCode,
    #[serde(default = "default_commission_percent")]
    pub commission_percent: f64,
    #[serde(default = "default_min_commission")]
    pub min_commission: f64,
    pub margin_ceiling: Option<f64>,
    #[serde(default)]
    pub require_positive_balance: bool,
}

fn default_team() -> TeamCode {
    TeamCode::Outbound
}

fn default_commission_percent() -> f64 {
    DEFAULT_COMMISSION_PERCENT
}

fn default_min_commission() -> f64 {
    DEFAULT_MIN_COMMISSION
}

impl Default for ParametersConfig {
    fn default() -> Self {
        Self {
            team: default_team(),
            commission_percent: default_commission_percent(),
            min_commission: default_min_commission(),
            margin_ceiling: None,
            require_positive_balance: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    #[serde(default)]
    pub summary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${INPUT_DIR})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_files(&self) -> &[String] {
        &self.input.files
    }

    fn margin_files(&self) -> &[String] {
        &self.input.margin_files
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn offer_columns(&self) -> Vec<String> {
        self.input
            .offer_columns
            .clone()
            .unwrap_or_else(default_offer_columns)
    }

    fn parameters(&self) -> RunParameters {
        RunParameters {
            team: self.parameters.team,
            commission_percent: self.parameters.commission_percent,
            min_commission: self.parameters.min_commission,
            margin_ceiling: self.parameters.margin_ceiling,
            require_positive_balance: self.parameters.require_positive_balance,
        }
    }

    fn write_summary(&self) -> bool {
        self.load.summary
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}
