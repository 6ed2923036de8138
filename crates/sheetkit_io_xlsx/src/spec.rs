//! Shared XLSX models: input rows, build options, document grid and report.

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde_json::Value;

use crate::conf::C_DATE_NUM_FORMAT_DEFAULT;
use crate::error::XlsxBuildError;
use crate::util::{
    convert_json_value_to_cell, convert_num_format_to_chrono, derive_cell_reference,
    derive_column_index,
};

////////////////////////////////////////////////////////////////////////////////
// #region InputDataModel

/// One input field value.
///
/// `Nested` marks relationship fields (arrays/objects); they never produce a
/// heading or a data cell.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Whole number, written as a numeric cell. Magnitudes above 2^53 are
    /// written as text since a worksheet number would round them.
    Integer(i64),
    /// Plain text, written as a string cell.
    Text(String),
    /// Date/time, written as a serial-date number with a date format.
    Temporal(NaiveDateTime),
    /// Collection-valued field, excluded from output.
    Nested(Value),
}

impl EnumCellValue {
    /// Whether this value is excluded from tabular output.
    pub fn is_nested(&self) -> bool {
        matches!(self, Self::Nested(_))
    }

    /// String form used when the value lands in a text cell.
    pub fn to_text(&self) -> String {
        match self {
            Self::Integer(val) => val.to_string(),
            Self::Text(val) => val.clone(),
            Self::Temporal(val) => val.format("%Y-%m-%d %H:%M:%S").to_string(),
            Self::Nested(val) => val.to_string(),
        }
    }
}

impl From<i64> for EnumCellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for EnumCellValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDateTime> for EnumCellValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Temporal(value)
    }
}

impl From<NaiveDate> for EnumCellValue {
    fn from(value: NaiveDate) -> Self {
        Self::Temporal(value.and_time(chrono::NaiveTime::MIN))
    }
}

/// One input record: column name -> value, insertion order preserved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecRow {
    cells: IndexMap<String, EnumCellValue>,
}

impl SpecRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<EnumCellValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a field. Replacing keeps the original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<EnumCellValue>) {
        self.cells.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&EnumCellValue> {
        self.cells.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.cells.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &EnumCellValue> {
        self.cells.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EnumCellValue)> {
        self.cells.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for SpecRow
where
    K: Into<String>,
    V: Into<EnumCellValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = SpecRow::new();
        for (key, value) in iter {
            row.insert(key, value);
        }
        row
    }
}

/// Ordered sequence of rows. Row order is output order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecDataset {
    rows: Vec<SpecRow>,
}

impl SpecDataset {
    pub fn new(rows: Vec<SpecRow>) -> Self {
        Self { rows }
    }

    /// Convert a JSON array of objects into a dataset.
    ///
    /// Integers become [`EnumCellValue::Integer`], arrays/objects become
    /// [`EnumCellValue::Nested`], everything else becomes text.
    pub fn from_json(value: &Value) -> Result<Self, XlsxBuildError> {
        let Value::Array(l_items) = value else {
            return Err(XlsxBuildError::InvalidInput(
                "Dataset JSON must be an array of objects.".to_string(),
            ));
        };

        let mut l_rows: Vec<SpecRow> = Vec::with_capacity(l_items.len());
        for (n_idx, item) in l_items.iter().enumerate() {
            let Value::Object(dict_fields) = item else {
                return Err(XlsxBuildError::InvalidInput(format!(
                    "Dataset element {n_idx} is not an object."
                )));
            };
            l_rows.push(
                dict_fields
                    .iter()
                    .map(|(key, val)| (key.clone(), convert_json_value_to_cell(val)))
                    .collect(),
            );
        }

        Ok(Self::new(l_rows))
    }

    pub fn rows(&self) -> &[SpecRow] {
        &self.rows
    }

    pub fn first(&self) -> Option<&SpecRow> {
        self.rows.first()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<SpecRow>> for SpecDataset {
    fn from(rows: Vec<SpecRow>) -> Self {
        Self::new(rows)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region BuildOptions

/// Which values are written as dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumDateDetectionMode {
    /// Only [`EnumCellValue::Temporal`] values are dates; integers are numeric.
    #[default]
    Explicit,
    /// Every scalar is offered to the date parser first; non-dates become text.
    Heuristic,
}

/// How data-row values are mapped onto heading columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumColumnAlignmentMode {
    /// Look each heading name up in every row.
    #[default]
    ByName,
    /// Walk each row's values in order, advancing only on scalar values.
    ByValue,
}

/// HTTP delivery flavour for exported documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumDeliveryMode {
    /// OOXML content type, plain attachment disposition.
    #[default]
    Attachment,
    /// `application/vnd.ms-excel` with caching disabled.
    Streamed,
}

/// Builder-wide options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxBuildOptions {
    /// Date detection policy.
    pub date_detection: EnumDateDetectionMode,
    /// Column alignment policy for data rows.
    pub column_alignment: EnumColumnAlignmentMode,
    /// Number format code applied to date cells.
    pub date_num_format: String,
    /// Fixed document creation timestamp; current time when `None`.
    pub creation_datetime: Option<NaiveDateTime>,
    /// Render heading cells bold.
    pub if_bold_header: bool,
}

impl Default for SpecXlsxBuildOptions {
    fn default() -> Self {
        Self {
            date_detection: EnumDateDetectionMode::Explicit,
            column_alignment: EnumColumnAlignmentMode::ByName,
            date_num_format: C_DATE_NUM_FORMAT_DEFAULT.to_string(),
            creation_datetime: None,
            if_bold_header: false,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DocumentModel

/// Typed content of one document cell.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumSheetCellKind {
    /// String cell.
    Text(String),
    /// Numeric cell.
    Number(f64),
    /// Serial-date number with a display format.
    Date {
        /// Excel 1900-system serial value.
        serial: f64,
        /// Source date/time.
        value: NaiveDateTime,
        /// Display format code.
        num_format: String,
    },
}

/// One addressed document cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheetCell {
    /// 1-based row number (row 1 holds headings).
    pub row: u32,
    /// 0-based column index (0 = `A`).
    pub col: u16,
    /// Typed value.
    pub kind: EnumSheetCellKind,
}

impl SpecSheetCell {
    /// A1-style reference, e.g. `B2`.
    pub fn reference(&self) -> String {
        derive_cell_reference(self.row, self.col)
    }

    /// Text as a spreadsheet application would display it.
    pub fn display_text(&self) -> String {
        match &self.kind {
            EnumSheetCellKind::Text(val) => val.clone(),
            EnumSheetCellKind::Number(val) => {
                if val.fract() == 0.0 && val.abs() < 1e15 {
                    format!("{}", *val as i64)
                } else {
                    val.to_string()
                }
            }
            EnumSheetCellKind::Date {
                value, num_format, ..
            } => value
                .format(&convert_num_format_to_chrono(num_format))
                .to_string(),
        }
    }
}

/// In-memory single-sheet document.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheetDocument {
    /// Document title (workbook property).
    pub title: String,
    /// Worksheet name derived from the title.
    pub sheet_name: String,
    /// Author metadata.
    pub creator: String,
    /// Cells in write order.
    pub cells: Vec<SpecSheetCell>,
}

impl SpecSheetDocument {
    /// Look a cell up by A1 reference. Returns `None` for unparsable refs.
    pub fn cell(&self, reference: &str) -> Option<&SpecSheetCell> {
        let n_split = reference.find(|chr: char| chr.is_ascii_digit())?;
        let (c_column, c_row) = reference.split_at(n_split);
        let n_row = c_row.parse::<u32>().ok()?;
        self.cell_at(n_row, c_column)
    }

    /// Look a cell up by 1-based row and column letters.
    pub fn cell_at(&self, row: u32, column: &str) -> Option<&SpecSheetCell> {
        let n_col = derive_column_index(column)?;
        self.cells
            .iter()
            .find(|cell| cell.row == row && usize::from(cell.col) == n_col)
    }

    /// Cells of one row, ordered by column.
    pub fn row_cells(&self, row: u32) -> Vec<&SpecSheetCell> {
        let mut l_cells: Vec<&SpecSheetCell> =
            self.cells.iter().filter(|cell| cell.row == row).collect();
        l_cells.sort_by_key(|cell| cell.col);
        l_cells
    }

    /// Display texts of one row, ordered by column.
    pub fn row_texts(&self, row: u32) -> Vec<String> {
        self.row_cells(row)
            .into_iter()
            .map(SpecSheetCell::display_text)
            .collect()
    }

    /// Heading texts (row 1).
    pub fn headings(&self) -> Vec<String> {
        self.row_texts(1)
    }

    /// Highest populated row number, 0 when empty.
    pub fn n_rows(&self) -> u32 {
        self.cells.iter().map(|cell| cell.row).max().unwrap_or(0)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Report

/// Build report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Number of data rows written (headings excluded).
    pub n_rows_data: usize,
    /// Number of heading columns.
    pub n_cols: usize,
    /// First-row keys skipped because their value is nested.
    pub columns_skipped: Vec<String>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
