//! 報價文字解析
//!
//! `Simulacoes` / `Observacoes` 欄位以 `|` 分隔多筆報價，每筆格式為
//! `<期數>x: <放款金額> (parcela: <每期金額>)`。不符合格式的片段直接略過。

use crate::domain::model::OfferCandidate;
use crate::domain::services::numeric::parse_decimal;

pub const SEGMENT_DELIMITER: char = '|';

const TERM_MARKER: &str = "x: ";
const INSTALLMENT_MARKER: &str = " (parcela: ";
const CLOSING_MARKER: &str = ")";

/// 依來源順序切出片段；欄位缺少時回傳空序列
pub fn split_segments(field: Option<&str>) -> Vec<&str> {
    match field {
        Some(text) if !text.is_empty() => text.split(SEGMENT_DELIMITER).collect(),
        _ => Vec::new(),
    }
}

/// 在片段中尋找第一個符合格式的報價
pub fn parse_segment(segment: &str) -> Option<OfferCandidate> {
    let starts = segment
        .char_indices()
        .filter(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i);

    for start in starts {
        if let Some(tokens) = OfferTokens::read(&segment[start..]) {
            // 格式相符但數值無效時整筆作廢，不再往後找
            return tokens.into_candidate();
        }
    }
    None
}

pub fn parse_offers(field: Option<&str>) -> Vec<OfferCandidate> {
    split_segments(field)
        .into_iter()
        .filter_map(parse_segment)
        .collect()
}

/// 期數最大者勝出；期數相同時保留先出現的
pub fn select_best(candidates: &[OfferCandidate]) -> Option<OfferCandidate> {
    let mut best: Option<OfferCandidate> = None;
    for candidate in candidates {
        match best {
            Some(current) if candidate.term <= current.term => {}
            _ => best = Some(*candidate),
        }
    }
    best
}

pub fn best_offer(field: Option<&str>) -> Option<OfferCandidate> {
    select_best(&parse_offers(field))
}

struct OfferTokens<'a> {
    term: &'a str,
    released: &'a str,
    installment: &'a str,
}

impl<'a> OfferTokens<'a> {
    fn read(input: &'a str) -> Option<Self> {
        let (term, rest) = take_while(input, |c| c.is_ascii_digit());
        let rest = rest.strip_prefix(TERM_MARKER)?;
        let (released, rest) = take_while(rest, is_amount_char);
        let rest = rest.strip_prefix(INSTALLMENT_MARKER)?;
        let (installment, rest) = take_while(rest, is_amount_char);
        rest.strip_prefix(CLOSING_MARKER)?;

        if term.is_empty() || released.is_empty() || installment.is_empty() {
            return None;
        }

        Some(Self {
            term,
            released,
            installment,
        })
    }

    fn into_candidate(self) -> Option<OfferCandidate> {
        let term = self.term.parse::<u32>().ok().filter(|t| *t > 0)?;
        let released_amount = parse_decimal(self.released).filter(|v| *v >= 0.0)?;
        let installment_amount = parse_decimal(self.installment).filter(|v| *v >= 0.0)?;

        Some(OfferCandidate {
            term,
            released_amount,
            installment_amount,
        })
    }
}

fn is_amount_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.' || c == ','
}

fn take_while(input: &str, pred: impl Fn(char) -> bool) -> (&str, &str) {
    let end = input
        .char_indices()
        .find(|(_, c)| !pred(*c))
        .map(|(i, _)| i)
        .unwrap_or(input.len());
    input.split_at(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selects_longest_term() {
        let field = "5x: 100,00 (parcela: 20,00)|12x: 1.200,50 (parcela: 100,00)|7x: 50,00 (parcela: 7,00)";
        let best = best_offer(Some(field)).unwrap();

        assert_eq!(best.term, 12);
        assert_eq!(best.released_amount, 1200.50);
        assert_eq!(best.installment_amount, 100.00);
    }

    #[test]
    fn test_tie_keeps_first_offer() {
        let best = best_offer(Some("10x: 1,00 (parcela: 1,00)|10x: 2,00 (parcela: 2,00)")).unwrap();
        assert_eq!(best.term, 10);
        assert_eq!(best.released_amount, 1.00);
    }

    #[test]
    fn test_malformed_segment_is_skipped() {
        let offers = parse_offers(Some("notanoffer|9x: 30,00 (parcela: 3,00)"));
        assert_eq!(offers.len(), 1);

        let best = select_best(&offers).unwrap();
        assert_eq!(best.term, 9);
        assert_eq!(best.released_amount, 30.0);
        assert_eq!(best.installment_amount, 3.0);
    }

    #[test]
    fn test_missing_field_yields_no_segments() {
        assert!(split_segments(None).is_empty());
        assert!(split_segments(Some("")).is_empty());
        assert!(best_offer(None).is_none());
    }

    #[test]
    fn test_segment_order_is_preserved() {
        let segments = split_segments(Some("a|b||c"));
        assert_eq!(segments, vec!["a", "b", "", "c"]);
    }

    #[test]
    fn test_offer_embedded_in_surrounding_text() {
        let offer = parse_segment(" Saque: 24x: 1722.47 (parcela: 80.10) via app").unwrap();
        assert_eq!(offer.term, 24);
        assert_eq!(offer.released_amount, 1722.47);
        assert_eq!(offer.installment_amount, 80.10);
    }

    #[test]
    fn test_invalid_amount_discards_candidate() {
        assert!(parse_segment("12x: 1.2.3 (parcela: 10,00)").is_none());
        assert!(parse_segment("0x: 10,00 (parcela: 1,00)").is_none());
        assert!(parse_segment("12x: (parcela: 1,00)").is_none());
        assert!(parse_segment("12x: 10,00 (parcela: 1,00").is_none());
    }

    #[test]
    fn test_invalid_longer_term_does_not_win() {
        let field = "6x: 60,00 (parcela: 10,00)|48x: abc (parcela: 1,00)";
        let best = best_offer(Some(field)).unwrap();
        assert_eq!(best.term, 6);
    }

    #[test]
    fn test_select_best_empty() {
        assert!(select_best(&[]).is_none());
    }
}
