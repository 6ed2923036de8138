//! Stateless helper utilities used by the spreadsheet builder.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;
use serde_json::Value;

use crate::conf::{
    C_FILE_EXTENSION_XLSX, N_LEN_EXCEL_CELL_TEXT_MAX, N_LEN_EXCEL_SHEET_NAME_MAX, TUP_DATE_LAYOUTS, TUP_DATETIME_LAYOUTS,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::EnumCellValue;

/// Leading `d{1,4} sep d{1,2} sep d{1,4}` shape shared by every accepted layout.
static RE_DATE_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,4}[-/]\d{1,2}[-/]\d{1,4}").expect("static date-shape regex")
});

////////////////////////////////////////////////////////////////////////////////
// #region CellAddressing

/// Convert a 0-based column index to letters (`0 -> A`, `26 -> AA`).
pub fn derive_column_letter(col_idx: usize) -> String {
    let mut n_rest = col_idx + 1;
    let mut l_chars = Vec::new();
    while n_rest > 0 {
        let n_digit = (n_rest - 1) % 26;
        l_chars.push(char::from(b'A' + n_digit as u8));
        n_rest = (n_rest - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

/// Convert column letters back to a 0-based index. Case-insensitive.
pub fn derive_column_index(column: &str) -> Option<usize> {
    if column.is_empty() {
        return None;
    }

    let mut n_idx = 0usize;
    for chr in column.chars() {
        if !chr.is_ascii_alphabetic() {
            return None;
        }
        let n_digit = usize::from(chr.to_ascii_uppercase() as u8 - b'A') + 1;
        n_idx = n_idx.checked_mul(26)?.checked_add(n_digit)?;
    }
    Some(n_idx - 1)
}

/// A1-style reference from 1-based row and 0-based column.
pub fn derive_cell_reference(row: u32, col: u16) -> String {
    format!("{}{row}", derive_column_letter(usize::from(col)))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Convert one JSON field into a cell value.
pub fn convert_json_value_to_cell(value: &Value) -> EnumCellValue {
    match value {
        Value::Number(num) => match num.as_i64() {
            Some(val) => EnumCellValue::Integer(val),
            None => EnumCellValue::Text(num.to_string()),
        },
        Value::String(val) => EnumCellValue::Text(val.clone()),
        Value::Bool(val) => EnumCellValue::Text(val.to_string()),
        Value::Null => EnumCellValue::Text(String::new()),
        Value::Array(_) | Value::Object(_) => EnumCellValue::Nested(value.clone()),
    }
}

/// Excel 1900-system serial for a date/time.
///
/// Returns `None` before 1900-01-01, which the format cannot represent.
pub fn convert_datetime_to_excel_serial(value: &NaiveDateTime) -> Option<f64> {
    let date_value = value.date();
    if date_value < NaiveDate::from_ymd_opt(1900, 1, 1)? {
        return None;
    }

    // Serials from 1900-03-01 on count the nonexistent 1900-02-29.
    let date_epoch = if date_value < NaiveDate::from_ymd_opt(1900, 3, 1)? {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };

    let n_days = (date_value - date_epoch).num_days() as f64;
    let n_secs = f64::from(value.time().num_seconds_from_midnight())
        + f64::from(value.time().nanosecond()) / 1e9;
    Some(n_days + n_secs / 86_400.0)
}

/// Parse a loosely formatted date/time string.
///
/// Accepts RFC 3339 plus the layouts in [`TUP_DATETIME_LAYOUTS`] and
/// [`TUP_DATE_LAYOUTS`]. Anything else yields `None`.
pub fn parse_datetime_heuristic(value: &str) -> Option<NaiveDateTime> {
    let c_value = value.trim();
    if !RE_DATE_SHAPE.is_match(c_value) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(c_value) {
        return Some(dt.naive_local());
    }
    for c_layout in TUP_DATETIME_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(c_value, c_layout) {
            return Some(dt);
        }
    }
    for c_layout in TUP_DATE_LAYOUTS {
        if let Ok(date_value) = NaiveDate::parse_from_str(c_value, c_layout) {
            return Some(date_value.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Translate an Excel date format code into a `chrono` format string.
///
/// Only date/time tokens are translated; `m` after an hour token means minutes.
pub fn convert_num_format_to_chrono(num_format: &str) -> String {
    let l_chars: Vec<char> = num_format.chars().collect();
    let mut c_out = String::with_capacity(num_format.len() * 2);
    let mut if_after_hour = false;

    let mut n_idx = 0;
    while n_idx < l_chars.len() {
        let chr = l_chars[n_idx];
        let chr_lower = chr.to_ascii_lowercase();
        if !matches!(chr_lower, 'y' | 'm' | 'd' | 'h' | 's') {
            match chr {
                '%' => c_out.push_str("%%"),
                '\\' | '"' => {}
                _ => c_out.push(chr),
            }
            n_idx += 1;
            continue;
        }

        let mut n_idx_end = n_idx;
        while n_idx_end < l_chars.len() && l_chars[n_idx_end].to_ascii_lowercase() == chr_lower {
            n_idx_end += 1;
        }
        let c_token = match (chr_lower, n_idx_end - n_idx) {
            ('y', 1..=2) => "%y",
            ('y', _) => "%Y",
            ('m', _) if if_after_hour => "%M",
            ('m', 1..=2) => "%m",
            ('m', 3) => "%b",
            ('m', _) => "%B",
            ('d', 1..=2) => "%d",
            ('d', 3) => "%a",
            ('d', _) => "%A",
            ('h', _) => "%H",
            _ => "%S",
        };
        c_out.push_str(c_token);
        if_after_hour = chr_lower == 'h';
        n_idx = n_idx_end;
    }

    c_out
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region NameNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    // Cut first so the trim also sees an apostrophe exposed by the cut.
    c_name = c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect();
    c_name = c_name
        .trim_matches(|chr: char| chr.is_whitespace() || chr == '\'')
        .to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }
    if c_name.eq_ignore_ascii_case("history") {
        c_name.push_str(replace_to);
    }

    c_name
}

/// Cut text to the Excel cell limit. `None` when it already fits.
pub fn truncate_cell_text(value: &str) -> Option<String> {
    if value.chars().count() <= N_LEN_EXCEL_CELL_TEXT_MAX {
        return None;
    }
    Some(value.chars().take(N_LEN_EXCEL_CELL_TEXT_MAX).collect())
}

/// Make a download file name header-safe and ensure the `.xlsx` extension.
pub fn sanitize_file_name(name: &str, replace_to: &str) -> String {
    let mut c_name = String::with_capacity(name.len() + C_FILE_EXTENSION_XLSX.len());
    for chr in name.chars() {
        if chr.is_control() || matches!(chr, '"' | '/' | '\\' | ':' | '*' | '?' | '<' | '>' | '|')
        {
            c_name.push_str(replace_to);
        } else {
            c_name.push(chr);
        }
    }

    let mut c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "export".to_string();
    }
    if !c_name.to_ascii_lowercase().ends_with(C_FILE_EXTENSION_XLSX) {
        c_name.push_str(C_FILE_EXTENSION_XLSX);
    }
    c_name
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
