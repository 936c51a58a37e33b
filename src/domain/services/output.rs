use crate::domain::model::{columns, EnrichedRecord, OutputRecord, TeamCode};
use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;

pub const OUTPUT_DELIMITER: u8 = b';';
pub const BENEFIT_BANK_CODE: &str = "243";
const UTF8_BOM: &str = "\u{FEFF}";

pub const OUTPUT_COLUMNS: [&str; 35] = [
    "Origem_Dado",
    "Nome_Cliente",
    "Matricula",
    "CPF",
    "Data_Nascimento",
    "MG_Emprestimo_Total",
    "MG_Emprestimo_Disponivel",
    "MG_Beneficio_Saque_Total",
    "MG_Beneficio_Saque_Disponivel",
    "MG_Cartao_Total",
    "MG_Cartao_Disponivel",
    "Convenio",
    "Vinculo_Servidor",
    "Lotacao",
    "Secretaria",
    "FONE1",
    "FONE2",
    "FONE3",
    "FONE4",
    "valor_liberado_emprestimo",
    "valor_liberado_beneficio",
    "valor_liberado_cartao",
    "comissao_emprestimo",
    "comissao_beneficio",
    "comissao_cartao",
    "valor_parcela_emprestimo",
    "valor_parcela_beneficio",
    "valor_parcela_cartao",
    "banco_emprestimo",
    "banco_beneficio",
    "banco_cartao",
    "prazo_emprestimo",
    "prazo_beneficio",
    "prazo_cartao",
    "Campanha",
];

/// 金額輸出：整數也保留一位小數，例如 `100.0`
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

pub fn assemble_record(enriched: &EnrichedRecord) -> OutputRecord {
    let record = &enriched.record;
    let offer = record.offer;

    let values = OUTPUT_COLUMNS
        .iter()
        .map(|column| match *column {
            columns::CPF => record.document.clone(),
            columns::NOME_CLIENTE => record.client_name.clone(),
            columns::PRAZO_BENEFICIO => offer.map(|o| o.term.to_string()),
            columns::VALOR_LIBERADO_BENEFICIO => offer.map(|o| format_amount(o.released_amount)),
            columns::VALOR_PARCELA_BENEFICIO => {
                offer.map(|o| format_amount(o.installment_amount))
            }
            columns::COMISSAO_BENEFICIO => Some(format_amount(enriched.commission)),
            columns::BANCO_BENEFICIO => Some(BENEFIT_BANK_CODE.to_string()),
            columns::CAMPANHA => Some(enriched.campaign.clone()),
            other => record.get(other).map(str::to_string),
        })
        .collect();

    OutputRecord { values }
}

pub fn assemble(records: &[EnrichedRecord]) -> Vec<OutputRecord> {
    records.iter().map(assemble_record).collect()
}

/// 以 `;` 分隔並加上 UTF-8 BOM；缺值輸出為空欄位
pub fn to_csv_bytes(records: &[OutputRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(OUTPUT_DELIMITER)
        .from_writer(UTF8_BOM.as_bytes().to_vec());

    writer.write_record(OUTPUT_COLUMNS)?;
    for record in records {
        writer.write_record(record.values.iter().map(|v| v.as_deref().unwrap_or("")))?;
    }

    writer.into_inner().map_err(|e| EtlError::ProcessingError {
        message: format!("Failed to flush CSV output: {}", e),
    })
}

/// 例如 `GOV-SP_BENEFICIO_CSAPP_05032024.csv`
pub fn output_file_name(records: &[EnrichedRecord], team: TeamCode, date: NaiveDate) -> String {
    let convenio = records
        .first()
        .and_then(|r| r.record.get(columns::CONVENIO))
        .unwrap_or("GERAL");
    let convenio: String = convenio
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();

    format!(
        "{}_BENEFICIO_{}_{}.csv",
        convenio,
        team.as_str().to_uppercase(),
        date.format("%d%m%Y")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{NormalizedRecord, OfferCandidate};

    fn enriched() -> EnrichedRecord {
        let mut record = NormalizedRecord {
            document: Some("12345678909".to_string()),
            client_name: Some("Maria Souza".to_string()),
            offer: Some(OfferCandidate {
                term: 12,
                released_amount: 1200.5,
                installment_amount: 100.0,
            }),
            ..Default::default()
        };
        record.set("Convenio", Some("GOV-SP".to_string()));
        record.set("Lotacao", None);
        record.set("MG_Emprestimo_Disponivel", Some("0".to_string()));
        record.set("Coluna_Extra", Some("ignored".to_string()));

        EnrichedRecord {
            record,
            campaign: "gov-sp_05032024_benef_csapp".to_string(),
            commission: 120.05,
        }
    }

    fn value<'a>(row: &'a OutputRecord, column: &str) -> Option<&'a str> {
        let idx = OUTPUT_COLUMNS.iter().position(|c| *c == column).unwrap();
        row.values[idx].as_deref()
    }

    #[test]
    fn test_record_has_every_schema_column() {
        let row = assemble_record(&enriched());
        assert_eq!(row.values.len(), OUTPUT_COLUMNS.len());

        assert_eq!(value(&row, "CPF"), Some("12345678909"));
        assert_eq!(value(&row, "Nome_Cliente"), Some("Maria Souza"));
        assert_eq!(value(&row, "prazo_beneficio"), Some("12"));
        assert_eq!(value(&row, "valor_liberado_beneficio"), Some("1200.5"));
        assert_eq!(value(&row, "valor_parcela_beneficio"), Some("100.0"));
        assert_eq!(value(&row, "comissao_beneficio"), Some("120.05"));
        assert_eq!(value(&row, "banco_beneficio"), Some("243"));
        assert_eq!(value(&row, "MG_Emprestimo_Disponivel"), Some("0"));
        assert_eq!(value(&row, "Campanha"), Some("gov-sp_05032024_benef_csapp"));
        assert_eq!(value(&row, "Lotacao"), None);
        assert_eq!(value(&row, "FONE1"), None);
    }

    #[test]
    fn test_csv_output_layout() {
        let bytes = to_csv_bytes(&assemble(&[enriched()])).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with('\u{FEFF}'));
        let mut lines = text.trim_start_matches('\u{FEFF}').lines();
        let header = lines.next().unwrap();
        assert_eq!(header, OUTPUT_COLUMNS.join(";"));

        let row: Vec<&str> = lines.next().unwrap().split(';').collect();
        assert_eq!(row.len(), 35);
        assert_eq!(row[0], "");
        assert_eq!(row[3], "12345678909");
        assert_eq!(row[34], "gov-sp_05032024_benef_csapp");
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_output_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            output_file_name(&[enriched()], TeamCode::Csapp, date),
            "GOV-SP_BENEFICIO_CSAPP_05032024.csv"
        );
        assert_eq!(
            output_file_name(&[], TeamCode::Cscp, date),
            "GERAL_BENEFICIO_CSCP_05032024.csv"
        );
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(100.0), "100.0");
        assert_eq!(format_amount(1722.47), "1722.47");
        assert_eq!(format_amount(0.5), "0.5");
    }
}
