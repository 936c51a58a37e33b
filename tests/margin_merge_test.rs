use anyhow::Result;
use benefit_etl::core::{ConfigProvider, Pipeline, Storage};
use benefit_etl::domain::model::FileRole;
use benefit_etl::utils::error::EtlError;
use benefit_etl::{BenefitPipeline, EtlEngine, RunOutcome, RunParameters, TeamCode};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct MockStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MockStorage {
    async fn put(&self, path: &str, data: &str) {
        self.files
            .lock()
            .await
            .insert(path.to_string(), data.as_bytes().to_vec());
    }

    async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().await.get(path).cloned()
    }
}

impl Storage for MockStorage {
    async fn read_file(&self, path: &str) -> benefit_etl::Result<Vec<u8>> {
        let files = self.files.lock().await;
        files.get(path).cloned().ok_or_else(|| {
            EtlError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path),
            ))
        })
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> benefit_etl::Result<()> {
        let mut files = self.files.lock().await;
        files.insert(path.to_string(), data.to_vec());
        Ok(())
    }
}

struct MockConfig {
    input_files: Vec<String>,
    margin_files: Vec<String>,
    params: RunParameters,
    summary: bool,
}

impl ConfigProvider for MockConfig {
    fn input_files(&self) -> &[String] {
        &self.input_files
    }

    fn margin_files(&self) -> &[String] {
        &self.margin_files
    }

    fn output_path(&self) -> &str {
        "mock"
    }

    fn offer_columns(&self) -> Vec<String> {
        vec!["Simulacoes".to_string()]
    }

    fn parameters(&self) -> RunParameters {
        self.params.clone()
    }

    fn write_summary(&self) -> bool {
        self.summary
    }
}

const BASE: &str = "\
CPF;Nome_Cliente;Convenio;Lotacao;MG_Emprestimo_Disponivel;Simulacoes
111.111.111-11;ANA;PREF-RJ;;;12x: 1.000,00 (parcela: 90,00)
222.222.222-22;BRUNO;PREF-RJ;HOSPITAL B;;12x: 2.000,00 (parcela: 180,00)
333.333.333-33;CARLOS;PREF-RJ;;;12x: 3.000,00 (parcela: 270,00)
444.444.444-44;DANI;PREF-RJ;;;12x: 4.000,00 (parcela: 360,00)
";

const MARGIN: &str = "\
CPF,MG_Emprestimo_Total,MG_Emprestimo_Disponivel,Lotacao,Secretaria
11111111111,500,150,ESCOLA A,SEC-1
22222222222,400,50,,SEC-X
222.222.222-22,400,120,,SEC-2
33333333333,1000,900,POLO C,SEC-3
";

const OUTPUT_FILE: &str = "PREF-RJ_BENEFICIO_CSCP_05032024.csv";

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
}

async fn storage_with_inputs() -> MockStorage {
    let storage = MockStorage::default();
    storage.put("base.csv", BASE).await;
    storage.put("margem.csv", MARGIN).await;
    storage.put("margem_vazia.csv", "").await;
    storage
}

fn config(margin_ceiling: Option<f64>, summary: bool) -> MockConfig {
    MockConfig {
        input_files: vec!["base.csv".to_string()],
        margin_files: vec!["margem.csv".to_string(), "margem_vazia.csv".to_string()],
        params: RunParameters {
            team: TeamCode::Cscp,
            commission_percent: 10.0,
            min_commission: 50.0,
            margin_ceiling,
            require_positive_balance: false,
        },
        summary,
    }
}

fn rows_by_cpf(bytes: &[u8]) -> HashMap<String, HashMap<String, String>> {
    let body = bytes.strip_prefix("\u{FEFF}".as_bytes()).unwrap();
    let mut reader = csv::ReaderBuilder::new().delimiter(b';').from_reader(body);
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();

    reader
        .records()
        .map(|r| {
            let row: HashMap<String, String> = headers
                .iter()
                .cloned()
                .zip(r.unwrap().iter().map(String::from))
                .collect();
            (row["CPF"].clone(), row)
        })
        .collect()
}

#[tokio::test]
async fn test_margin_merge_and_ceiling() -> Result<()> {
    let storage = storage_with_inputs().await;
    let pipeline =
        BenefitPipeline::new(storage.clone(), config(Some(200.0), true)).with_run_date(run_date());

    let outcome = EtlEngine::new(pipeline).run().await?;
    assert_eq!(
        outcome,
        RunOutcome::Written {
            path: format!("mock/{}", OUTPUT_FILE),
            records: 2,
        }
    );

    let rows = rows_by_cpf(&storage.get_file(OUTPUT_FILE).await.unwrap());
    assert_eq!(rows.len(), 2);

    // 主檔缺值由保證金檔補上
    let ana = &rows["11111111111"];
    assert_eq!(ana["Lotacao"], "ESCOLA A");
    assert_eq!(ana["Secretaria"], "SEC-1");
    assert_eq!(ana["MG_Emprestimo_Total"], "500");
    assert_eq!(ana["MG_Emprestimo_Disponivel"], "0");

    // 保證金檔缺值時保留主檔；重複 CPF 取可用額度最大者
    let bruno = &rows["22222222222"];
    assert_eq!(bruno["Lotacao"], "HOSPITAL B");
    assert_eq!(bruno["Secretaria"], "SEC-2");
    assert_eq!(bruno["MG_Emprestimo_Disponivel"], "0");

    assert!(!rows.contains_key("33333333333"));
    assert!(!rows.contains_key("44444444444"));
    Ok(())
}

#[tokio::test]
async fn test_merge_without_ceiling_keeps_all_records() -> Result<()> {
    let storage = storage_with_inputs().await;
    let pipeline =
        BenefitPipeline::new(storage.clone(), config(None, false)).with_run_date(run_date());

    let outcome = EtlEngine::new(pipeline).run().await?;
    assert!(matches!(outcome, RunOutcome::Written { records: 4, .. }));

    let rows = rows_by_cpf(&storage.get_file(OUTPUT_FILE).await.unwrap());
    assert_eq!(rows["33333333333"]["Lotacao"], "POLO C");
    assert_eq!(rows["44444444444"]["Lotacao"], "");
    for row in rows.values() {
        assert_eq!(row["MG_Emprestimo_Disponivel"], "0");
        assert_eq!(row["banco_beneficio"], "243");
    }
    assert!(storage.get_file("run_summary.json").await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_run_summary_reports_every_file() -> Result<()> {
    let storage = storage_with_inputs().await;
    let pipeline =
        BenefitPipeline::new(storage.clone(), config(Some(200.0), true)).with_run_date(run_date());
    EtlEngine::new(pipeline).run().await?;

    let summary: serde_json::Value =
        serde_json::from_slice(&storage.get_file("run_summary.json").await.unwrap())?;

    assert_eq!(summary["run_date"], "2024-03-05");
    assert_eq!(summary["records_written"], 2);
    assert_eq!(summary["output_file"], OUTPUT_FILE);
    assert_eq!(summary["parameters"]["team"], "cscp");

    let files = summary["files"].as_array().unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(files[0]["file"], "base.csv");
    assert_eq!(files[0]["rows_read"], 4);
    assert_eq!(files[0]["rows_kept"], 4);
    assert_eq!(files[1]["role"], "margin");
    assert_eq!(files[1]["delimiter"], ",");
    assert!(files[2]["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_unreadable_margin_file_is_skipped_in_extract() -> Result<()> {
    let storage = storage_with_inputs().await;
    let pipeline = BenefitPipeline::new(storage, config(None, false)).with_run_date(run_date());

    let extracted = pipeline.extract().await?;
    assert_eq!(extracted.tables.len(), 2);
    assert_eq!(extracted.reports.len(), 3);

    let skipped: Vec<_> = extracted.reports.iter().filter(|r| r.is_skipped()).collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].file, "margem_vazia.csv");
    assert_eq!(skipped[0].role, FileRole::Margin);
    Ok(())
}
