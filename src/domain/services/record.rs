use crate::domain::model::{columns, NormalizedRecord, RawRecord};
use crate::domain::services::offer;

/// 去除所有非數字字元
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// 每段連續字母的第一個字大寫，其餘小寫
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_is_letter = false;

    for c in value.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}

/// 取第一個有值的報價欄位
pub fn offer_text<'a>(raw: &'a RawRecord, offer_columns: &[String]) -> Option<&'a str> {
    offer_columns.iter().find_map(|column| raw.get(column))
}

pub fn normalize_record(raw: RawRecord, offer_columns: &[String]) -> NormalizedRecord {
    let offer = offer::best_offer(offer_text(&raw, offer_columns));

    let mut data = raw.data;
    let document = data
        .remove(columns::CPF)
        .flatten()
        .map(|cpf| digits_only(&cpf));
    let client_name = data
        .remove(columns::NOME_CLIENTE)
        .flatten()
        .map(|name| title_case(&name));

    // 衍生的報價欄位一律以解析結果為準
    for derived in [
        columns::PRAZO_BENEFICIO,
        columns::VALOR_LIBERADO_BENEFICIO,
        columns::VALOR_PARCELA_BENEFICIO,
    ] {
        data.remove(derived);
    }

    NormalizedRecord {
        document,
        client_name,
        offer,
        columns: data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer_columns() -> Vec<String> {
        columns::DEFAULT_OFFER_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("123.456.789-09"), "12345678909");
        assert_eq!(digits_only("abc"), "");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("MARIA DA SILVA"), "Maria Da Silva");
        assert_eq!(title_case("joão d'ávila"), "João D'Ávila");
        assert_eq!(title_case("ana-paula  souza"), "Ana-Paula  Souza");
    }

    #[test]
    fn test_normalize_record_projects_best_offer() {
        let raw = RawRecord::from_pairs([
            ("CPF", Some("111.222.333-44")),
            ("Nome_Cliente", Some("JOSE SANTOS")),
            ("Convenio", Some("GOV-SP")),
            (
                "Simulacoes",
                Some("6x: 300,00 (parcela: 60,00)|24x: 1.000,00 (parcela: 55,00)"),
            ),
        ]);

        let record = normalize_record(raw, &offer_columns());

        assert_eq!(record.document.as_deref(), Some("11122233344"));
        assert_eq!(record.client_name.as_deref(), Some("Jose Santos"));
        assert_eq!(record.get("Convenio"), Some("GOV-SP"));
        let offer = record.offer.unwrap();
        assert_eq!(offer.term, 24);
        assert_eq!(offer.released_amount, 1000.0);
        assert_eq!(offer.installment_amount, 55.0);
    }

    #[test]
    fn test_normalize_record_reads_observacoes_variant() {
        let raw = RawRecord::from_pairs([(
            "Observacoes",
            Some("9x: 30,00 (parcela: 3,00)"),
        )]);

        let record = normalize_record(raw, &offer_columns());
        assert_eq!(record.offer.map(|o| o.term), Some(9));
    }

    #[test]
    fn test_missing_fields_stay_absent() {
        let raw = RawRecord::from_pairs([("CPF", None::<String>), ("Lotacao", Some("X".to_string()))]);

        let record = normalize_record(raw, &offer_columns());
        assert!(record.document.is_none());
        assert!(record.client_name.is_none());
        assert!(record.offer.is_none());
        assert_eq!(record.get("Lotacao"), Some("X"));
    }
}
