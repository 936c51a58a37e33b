//! 篩選與衍生欄位
//!
//! 順序有意義：後面的步驟依賴前面衍生的欄位。

use crate::domain::model::{columns, EnrichedRecord, NormalizedRecord, RunParameters, TeamCode};
use crate::domain::services::margin::MarginIndex;
use crate::domain::services::numeric::{parse_decimal, parse_decimal_opt, round_cents};
use chrono::NaiveDate;

pub const DEFAULT_CONVENIO: &str = "geral";
pub const CAMPAIGN_CHANNEL: &str = "benef";

/// 單一檔案內哪些選用欄位存在
#[derive(Debug, Clone, Copy, Default)]
pub struct FileColumns {
    pub withdrawal_margin: bool,
    pub outstanding_balance: bool,
}

pub fn has_positive_offer(record: &NormalizedRecord) -> bool {
    record.released_amount().is_some_and(|v| v > 0.0)
}

/// 空值視為 0；有值但無法解析或為負數時剔除
pub fn withdrawal_margin_ok(record: &NormalizedRecord) -> bool {
    match record.get(columns::MG_BENEFICIO_SAQUE_DISPONIVEL) {
        None => true,
        Some(value) => parse_decimal(value).is_some_and(|v| v >= 0.0),
    }
}

pub fn has_positive_balance(record: &NormalizedRecord) -> bool {
    parse_decimal_opt(record.get(columns::SALDO_DEVEDOR)).is_some_and(|v| v > 0.0)
}

/// 每個檔案各自套用的篩選
pub fn apply_file_filters(
    records: Vec<NormalizedRecord>,
    present: FileColumns,
    params: &RunParameters,
) -> Vec<NormalizedRecord> {
    records
        .into_iter()
        .filter(has_positive_offer)
        .filter(|r| !present.withdrawal_margin || withdrawal_margin_ok(r))
        .filter(|r| {
            !(params.require_positive_balance && present.outstanding_balance)
                || has_positive_balance(r)
        })
        .collect()
}

pub fn within_margin_ceiling(record: &NormalizedRecord, ceiling: f64) -> bool {
    parse_decimal_opt(record.get(columns::MG_EMPRESTIMO_DISPONIVEL)).is_some_and(|v| v <= ceiling)
}

pub fn campaign_label(convenio: Option<&str>, date: NaiveDate, team: TeamCode) -> String {
    let convenio = convenio
        .map(str::to_lowercase)
        .unwrap_or_else(|| DEFAULT_CONVENIO.to_string());
    format!(
        "{}_{}_{}_{}",
        convenio,
        date.format("%d%m%Y"),
        CAMPAIGN_CHANNEL,
        team.as_str()
    )
}

pub fn commission(released_amount: f64, rate: f64) -> f64 {
    round_cents(released_amount * rate)
}

/// 合併後整批資料的篩選與衍生欄位
pub struct BatchFilter<'a> {
    params: &'a RunParameters,
    run_date: NaiveDate,
    margins: Option<&'a MarginIndex>,
}

impl<'a> BatchFilter<'a> {
    pub fn new(params: &'a RunParameters, run_date: NaiveDate) -> Self {
        Self {
            params,
            run_date,
            margins: None,
        }
    }

    pub fn with_margins(mut self, margins: &'a MarginIndex) -> Self {
        self.margins = Some(margins);
        self
    }

    pub fn apply(&self, mut records: Vec<NormalizedRecord>) -> Vec<EnrichedRecord> {
        if let Some(margins) = self.margins {
            let matched = margins.enrich(&mut records);
            tracing::info!(
                "🔗 Margin merge matched {} of {} records ({} documents indexed)",
                matched,
                records.len(),
                margins.len()
            );

            if let Some(ceiling) = self.params.margin_ceiling {
                let before = records.len();
                records.retain(|r| within_margin_ceiling(r, ceiling));
                tracing::info!(
                    "Margin ceiling {:.2}: kept {} of {} records",
                    ceiling,
                    records.len(),
                    before
                );
            }
        }

        let rate = self.params.commission_rate();
        let before = records.len();
        let enriched: Vec<EnrichedRecord> = records
            .into_iter()
            .filter_map(|mut record| {
                let released = record.released_amount()?;
                let campaign =
                    campaign_label(record.get(columns::CONVENIO), self.run_date, self.params.team);
                let commission = commission(released, rate);
                if commission < self.params.min_commission {
                    return None;
                }

                // 此通路輸出一律不回報貸款可用額度
                record.set(columns::MG_EMPRESTIMO_DISPONIVEL, Some("0".to_string()));
                Some(EnrichedRecord {
                    record,
                    campaign,
                    commission,
                })
            })
            .collect();

        tracing::debug!(
            "Minimum commission {:.2}: kept {} of {} records",
            self.params.min_commission,
            enriched.len(),
            before
        );
        enriched
    }
}
