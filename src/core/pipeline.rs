use crate::adapters::ingest;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{
    columns, ExtractResult, FileReport, FileRole, NormalizedRecord, RunOutcome, RunParameters,
    SourceTable, TransformResult,
};
use crate::domain::services::filters::{apply_file_filters, BatchFilter, FileColumns};
use crate::domain::services::margin::MarginIndex;
use crate::domain::services::output;
use crate::domain::services::record::normalize_record;
use crate::utils::error::Result;
use chrono::NaiveDate;
use serde::Serialize;

pub const SUMMARY_FILE_NAME: &str = "run_summary.json";

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    run_date: String,
    parameters: RunParameters,
    output_file: Option<&'a str>,
    records_written: usize,
    files: &'a [FileReport],
}

pub struct BenefitPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    run_date: NaiveDate,
}

impl<S: Storage, C: ConfigProvider> BenefitPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            run_date: chrono::Local::now().date_naive(),
        }
    }

    /// 固定批次日期，讓同一份輸入產出相同結果
    pub fn with_run_date(mut self, run_date: NaiveDate) -> Self {
        self.run_date = run_date;
        self
    }

    pub fn run_date(&self) -> NaiveDate {
        self.run_date
    }

    async fn read_source(&self, file: &str, role: FileRole) -> Result<SourceTable> {
        let bytes = self.storage.read_file(file).await.map_err(|e| {
            crate::utils::error::EtlError::FileReadError {
                file: file.to_string(),
                message: e.to_string(),
            }
        })?;
        ingest::read_table(file, &bytes, role)
    }

    fn normalize_table(&self, table: SourceTable, offer_columns: &[String]) -> Vec<NormalizedRecord> {
        let present = FileColumns {
            withdrawal_margin: table.has_column(columns::MG_BENEFICIO_SAQUE_DISPONIVEL),
            outstanding_balance: table.has_column(columns::SALDO_DEVEDOR),
        };
        let params = self.config.parameters();

        if !offer_columns.iter().any(|c| table.has_column(c)) {
            tracing::warn!(
                "⚠️ No offer column ({}) found in '{}'; no record from it can qualify",
                offer_columns.join(" / "),
                table.file
            );
        }
        if params.require_positive_balance && !present.outstanding_balance {
            tracing::warn!(
                "⚠️ '{}' has no {} column; positive balance filter skipped",
                table.file,
                columns::SALDO_DEVEDOR
            );
        }

        let normalized: Vec<NormalizedRecord> = table
            .rows
            .into_iter()
            .map(|raw| normalize_record(raw, offer_columns))
            .collect();
        apply_file_filters(normalized, present, &params)
    }
}

fn report_for<'a>(
    reports: &'a mut [FileReport],
    file: &str,
    role: FileRole,
) -> Option<&'a mut FileReport> {
    reports
        .iter_mut()
        .find(|r| r.file == file && r.role == role && !r.is_skipped())
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for BenefitPipeline<S, C> {
    async fn extract(&self) -> Result<ExtractResult> {
        let mut result = ExtractResult::default();

        let sources = self
            .config
            .input_files()
            .iter()
            .map(|f| (f, FileRole::Primary))
            .chain(self.config.margin_files().iter().map(|f| (f, FileRole::Margin)));

        for (file, role) in sources {
            tracing::info!("📄 Reading {:?} file: {}", role, file);

            match self.read_source(file, role).await {
                Ok(table) => {
                    let expected: &[&str] = match role {
                        FileRole::Primary => &columns::EXPECTED_PRIMARY_COLUMNS,
                        FileRole::Margin => &columns::EXPECTED_MARGIN_COLUMNS,
                    };
                    let missing_columns = table.missing_columns(expected);
                    if !missing_columns.is_empty() {
                        tracing::warn!("⚠️ '{}' is missing columns: {:?}", file, missing_columns);
                    }
                    tracing::info!("'{}': {} rows read", file, table.rows.len());

                    result.reports.push(FileReport {
                        file: file.clone(),
                        role,
                        delimiter: Some(table.delimiter),
                        rows_read: table.rows.len(),
                        rows_kept: 0,
                        missing_columns,
                        error: None,
                    });
                    result.tables.push(table);
                }
                Err(e) => {
                    // 單一檔案失敗不影響其他檔案
                    tracing::error!("❌ Skipping '{}': {}", file, e);
                    tracing::error!("💡 {}", e.recovery_suggestion());
                    result
                        .reports
                        .push(FileReport::failed(file, role, e.to_string()));
                }
            }
        }

        Ok(result)
    }

    async fn transform(&self, data: ExtractResult) -> Result<TransformResult> {
        let ExtractResult {
            tables,
            mut reports,
        } = data;
        let params = self.config.parameters();
        let offer_columns = self.config.offer_columns();

        let (primary, margin): (Vec<SourceTable>, Vec<SourceTable>) =
            tables.into_iter().partition(|t| t.role == FileRole::Primary);

        let mut records = Vec::new();
        for table in primary {
            let file = table.file.clone();
            let rows_read = table.rows.len();

            let kept = self.normalize_table(table, &offer_columns);
            tracing::info!("'{}': {} of {} rows left after filters", file, kept.len(), rows_read);

            if let Some(report) = report_for(&mut reports, &file, FileRole::Primary) {
                report.rows_kept = kept.len();
            }
            records.extend(kept);
        }

        let margin_index = if margin.is_empty() {
            None
        } else {
            let refs: Vec<&SourceTable> = margin.iter().collect();
            let index = MarginIndex::from_tables(&refs);
            tracing::info!(
                "🔗 Margin index: {} documents, {} duplicate rows resolved",
                index.len(),
                index.duplicates()
            );
            for table in &margin {
                let rows = table.rows.len();
                if let Some(report) = report_for(&mut reports, &table.file, FileRole::Margin) {
                    report.rows_kept = rows;
                }
            }
            Some(index)
        };

        let mut batch = BatchFilter::new(&params, self.run_date);
        if let Some(index) = margin_index.as_ref() {
            batch = batch.with_margins(index);
        }
        let enriched = batch.apply(records);

        if enriched.is_empty() {
            return Ok(TransformResult {
                reports,
                ..Default::default()
            });
        }

        let rows = output::assemble(&enriched);
        let csv_output = output::to_csv_bytes(&rows)?;
        let file_name = output::output_file_name(&enriched, params.team, self.run_date);

        Ok(TransformResult {
            records: rows,
            csv_output,
            file_name: Some(file_name),
            reports,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<RunOutcome> {
        let outcome = match result.file_name.as_deref() {
            Some(file_name) if !result.records.is_empty() => {
                tracing::debug!(
                    "Writing {} records ({} bytes) to {}",
                    result.records.len(),
                    result.csv_output.len(),
                    file_name
                );
                self.storage.write_file(file_name, &result.csv_output).await?;
                RunOutcome::Written {
                    path: format!("{}/{}", self.config.output_path(), file_name),
                    records: result.records.len(),
                }
            }
            _ => {
                tracing::warn!("⚠️ No records left after filters; no output file written");
                RunOutcome::Empty
            }
        };

        if self.config.write_summary() {
            let summary = RunSummary {
                run_date: self.run_date.format("%Y-%m-%d").to_string(),
                parameters: self.config.parameters(),
                output_file: result.file_name.as_deref(),
                records_written: result.records.len(),
                files: &result.reports,
            };
            let json = serde_json::to_vec_pretty(&summary)?;
            self.storage.write_file(SUMMARY_FILE_NAME, &json).await?;
            tracing::debug!("Run summary written to {}", SUMMARY_FILE_NAME);
        }

        Ok(outcome)
    }
}
