//! 檔案讀取：Latin-1 解碼、分隔符號偵測、CSV 切欄
//!
//! 所有值都保留為文字，型別轉換留給後續步驟。

use crate::domain::model::{FileRole, RawRecord, SourceTable};
use crate::utils::error::{EtlError, Result};
use encoding_rs::{UTF_8, WINDOWS_1252};
use std::borrow::Cow;
use std::collections::HashMap;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// 匯出檔為 Latin-1；帶 BOM 的 UTF-8 檔另外處理
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match bytes.strip_prefix(UTF8_BOM) {
        Some(body) => UTF_8.decode_without_bom_handling(body).0,
        None => WINDOWS_1252.decode_without_bom_handling(bytes).0,
    }
}

/// 第一行 `;` 比 `,` 多才用 `;`，相同時用 `,`
pub fn detect_delimiter(first_line: &str) -> char {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    if semicolons > commas {
        ';'
    } else {
        ','
    }
}

fn read_error(file: &str, message: impl Into<String>) -> EtlError {
    EtlError::FileReadError {
        file: file.to_string(),
        message: message.into(),
    }
}

fn cell(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn read_table(file: &str, bytes: &[u8], role: FileRole) -> Result<SourceTable> {
    let text = decode(bytes);
    let first_line = text
        .lines()
        .next()
        .filter(|line| !line.trim().is_empty())
        .ok_or_else(|| read_error(file, "file is empty or has no header line"))?;

    let delimiter = detect_delimiter(first_line);
    tracing::info!("🔎 Detected delimiter for '{}': '{}'", file, delimiter);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| read_error(file, e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    let mut extra_fields = 0usize;
    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(|e| read_error(file, format!("row {}: {}", line + 2, e)))?;
        if record.len() > headers.len() {
            extra_fields += 1;
        }

        let data: HashMap<String, Option<String>> = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), record.get(i).and_then(cell)))
            .collect();
        rows.push(RawRecord { data });
    }

    if extra_fields > 0 {
        tracing::warn!(
            "'{}': {} rows had more fields than the header; extra fields ignored",
            file,
            extra_fields
        );
    }
    tracing::debug!("Columns found in '{}': {:?}", file, headers);

    Ok(SourceTable {
        file: file.to_string(),
        role,
        delimiter,
        headers,
        rows,
    })
}
