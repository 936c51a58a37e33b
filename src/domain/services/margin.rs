//! 保證金檔案合併
//!
//! 以 CPF 為鍵 left-join 主檔；保證金檔有值時才覆蓋主檔欄位。

use crate::domain::model::{columns, NormalizedRecord, RawRecord, SourceTable};
use crate::domain::services::numeric::parse_decimal_opt;
use crate::domain::services::record::digits_only;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
struct MarginRow {
    available: Option<f64>,
    values: Vec<(&'static str, Option<String>)>,
}

impl MarginRow {
    fn from_raw(raw: &RawRecord) -> Self {
        Self {
            available: parse_decimal_opt(raw.get(columns::MG_EMPRESTIMO_DISPONIVEL)),
            values: columns::MARGIN_OVERRIDE_COLUMNS
                .iter()
                .map(|column| (*column, raw.get(column).map(str::to_string)))
                .collect(),
        }
    }

    /// 無法解析的可用額度排在最後
    fn outranks(&self, other: &MarginRow) -> bool {
        match (self.available, other.available) {
            (Some(a), Some(b)) => a > b,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarginIndex {
    rows: HashMap<String, MarginRow>,
    duplicates: usize,
}

impl MarginIndex {
    pub fn from_tables(tables: &[&SourceTable]) -> Self {
        let mut index = Self::default();
        for table in tables {
            for raw in &table.rows {
                index.insert(raw);
            }
        }
        index
    }

    fn insert(&mut self, raw: &RawRecord) {
        let Some(document) = raw
            .get(columns::CPF)
            .map(digits_only)
            .filter(|d| !d.is_empty())
        else {
            return;
        };

        let row = MarginRow::from_raw(raw);
        match self.rows.get_mut(&document) {
            Some(existing) => {
                self.duplicates += 1;
                if row.outranks(existing) {
                    *existing = row;
                }
            }
            None => {
                self.rows.insert(document, row);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn available_for(&self, document: &str) -> Option<f64> {
        self.rows.get(document).and_then(|row| row.available)
    }

    /// 回傳被合併到的記錄數
    pub fn enrich(&self, records: &mut [NormalizedRecord]) -> usize {
        let mut matched = 0;
        for record in records.iter_mut() {
            let Some(row) = record.document.as_ref().and_then(|d| self.rows.get(d)) else {
                continue;
            };
            matched += 1;
            for (column, value) in &row.values {
                if value.is_some() {
                    record.set(column, value.clone());
                }
            }
        }
        matched
    }
}
