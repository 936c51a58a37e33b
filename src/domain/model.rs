use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod columns {
    pub const CPF: &str = "CPF";
    pub const NOME_CLIENTE: &str = "Nome_Cliente";
    pub const SIMULACOES: &str = "Simulacoes";
    pub const OBSERVACOES: &str = "Observacoes";
    pub const CONVENIO: &str = "Convenio";
    pub const SALDO_DEVEDOR: &str = "Saldo_Devedor";
    pub const MG_BENEFICIO_SAQUE_DISPONIVEL: &str = "MG_Beneficio_Saque_Disponivel";
    pub const MG_EMPRESTIMO_TOTAL: &str = "MG_Emprestimo_Total";
    pub const MG_EMPRESTIMO_DISPONIVEL: &str = "MG_Emprestimo_Disponivel";
    pub const VINCULO_SERVIDOR: &str = "Vinculo_Servidor";
    pub const LOTACAO: &str = "Lotacao";
    pub const SECRETARIA: &str = "Secretaria";

    pub const PRAZO_BENEFICIO: &str = "prazo_beneficio";
    pub const VALOR_LIBERADO_BENEFICIO: &str = "valor_liberado_beneficio";
    pub const VALOR_PARCELA_BENEFICIO: &str = "valor_parcela_beneficio";
    pub const COMISSAO_BENEFICIO: &str = "comissao_beneficio";
    pub const BANCO_BENEFICIO: &str = "banco_beneficio";
    pub const CAMPANHA: &str = "Campanha";

    /// 多筆報價文字欄位，依檔案格式只會出現其中一個
    pub const DEFAULT_OFFER_COLUMNS: [&str; 2] = [SIMULACOES, OBSERVACOES];

    /// 保證金檔案覆蓋主檔的欄位
    pub const MARGIN_OVERRIDE_COLUMNS: [&str; 5] = [
        MG_EMPRESTIMO_TOTAL,
        MG_EMPRESTIMO_DISPONIVEL,
        VINCULO_SERVIDOR,
        LOTACAO,
        SECRETARIA,
    ];

    /// 主檔預期會有的欄位，缺少時只記錄警告
    pub const EXPECTED_PRIMARY_COLUMNS: [&str; 4] =
        [CPF, NOME_CLIENTE, CONVENIO, MG_BENEFICIO_SAQUE_DISPONIVEL];

    pub const EXPECTED_MARGIN_COLUMNS: [&str; 2] = [CPF, MG_EMPRESTIMO_DISPONIVEL];
}

/// 檔案中的一列，欄位名稱對應原始文字；空白儲存格為 `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub data: HashMap<String, Option<String>>,
}

impl RawRecord {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, Option<V>)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            data: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.map(Into::into)))
                .collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.data.get(column).and_then(|v| v.as_deref())
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.data.contains_key(column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfferCandidate {
    pub term: u32,
    pub released_amount: f64,
    pub installment_amount: f64,
}

/// 經過識別欄位清理與報價投影後的記錄
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRecord {
    /// 只含數字的 CPF
    pub document: Option<String>,
    pub client_name: Option<String>,
    pub offer: Option<OfferCandidate>,
    /// 其餘欄位原樣保留
    pub columns: HashMap<String, Option<String>>,
}

impl NormalizedRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).and_then(|v| v.as_deref())
    }

    pub fn set(&mut self, column: &str, value: Option<String>) {
        self.columns.insert(column.to_string(), value);
    }

    pub fn released_amount(&self) -> Option<f64> {
        self.offer.map(|o| o.released_amount)
    }
}

/// 套用所有篩選與衍生欄位後的記錄
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: NormalizedRecord,
    pub campaign: String,
    pub commission: f64,
}

/// 固定輸出欄位順序下的一列，缺少的欄位為 `None`
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub values: Vec<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum TeamCode {
    Outbound,
    Csapp,
    Csport,
    Cscdx,
    Csativacao,
    Cscp,
}

impl TeamCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamCode::Outbound => "outbound",
            TeamCode::Csapp => "csapp",
            TeamCode::Csport => "csport",
            TeamCode::Cscdx => "cscdx",
            TeamCode::Csativacao => "csativacao",
            TeamCode::Cscp => "cscp",
        }
    }
}

impl std::fmt::Display for TeamCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_COMMISSION_PERCENT: f64 = 10.0;
pub const DEFAULT_MIN_COMMISSION: f64 = 50.0;

/// 操作員提供的批次參數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    pub team: TeamCode,
    /// 銀行佣金百分比，例如 10.0 代表 10%
    pub commission_percent: f64,
    pub min_commission: f64,
    pub margin_ceiling: Option<f64>,
    pub require_positive_balance: bool,
}

impl RunParameters {
    pub fn commission_rate(&self) -> f64 {
        self.commission_percent / 100.0
    }
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            team: TeamCode::Outbound,
            commission_percent: DEFAULT_COMMISSION_PERCENT,
            min_commission: DEFAULT_MIN_COMMISSION,
            margin_ceiling: None,
            require_positive_balance: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Primary,
    Margin,
}

/// 單一輸入檔的處理結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub file: String,
    pub role: FileRole,
    pub delimiter: Option<char>,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub missing_columns: Vec<String>,
    pub error: Option<String>,
}

impl FileReport {
    pub fn failed(file: &str, role: FileRole, error: String) -> Self {
        Self {
            file: file.to_string(),
            role,
            delimiter: None,
            rows_read: 0,
            rows_kept: 0,
            missing_columns: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.error.is_some()
    }
}

/// 已解碼並切好欄位的檔案內容
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub file: String,
    pub role: FileRole,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub rows: Vec<RawRecord>,
}

impl SourceTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn missing_columns(&self, expected: &[&str]) -> Vec<String> {
        expected
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect()
    }
}

/// Extract 階段的輸出：可讀的檔案與每個檔案的報告
#[derive(Debug, Clone, Default)]
pub struct ExtractResult {
    pub tables: Vec<SourceTable>,
    pub reports: Vec<FileReport>,
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub records: Vec<OutputRecord>,
    pub csv_output: Vec<u8>,
    pub file_name: Option<String>,
    pub reports: Vec<FileReport>,
}

/// 一次批次的結果；沒有任何記錄通過篩選時不產生檔案
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Written { path: String, records: usize },
    Empty,
}
