//! Spreadsheet builder that maps row records onto a single-sheet workbook.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use chrono::{NaiveDateTime, NaiveTime};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook, Worksheet};
use tracing::{debug, info, warn};

use crate::conf::{
    N_INT_EXACT_F64_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, derive_default_xlsx_build_options,
};
use crate::error::{XlsxBuildError, derive_xlsx_error};
use crate::export::SpecXlsxExport;
use crate::spec::{
    EnumCellValue, EnumColumnAlignmentMode, EnumDateDetectionMode, EnumDeliveryMode,
    EnumSheetCellKind, SpecDataset, SpecRow, SpecSheetCell, SpecSheetDocument,
    SpecXlsxBuildOptions, SpecXlsxReport,
};
use crate::util::{
    convert_datetime_to_excel_serial, derive_cell_reference, parse_datetime_heuristic,
    sanitize_file_name, sanitize_sheet_name, truncate_cell_text,
};

/// Single-use builder: the document is fully built on construction and can
/// then be serialized any number of times.
#[derive(Debug, Clone)]
pub struct SpreadsheetBuilder {
    document: SpecSheetDocument,
    options: SpecXlsxBuildOptions,
    report: SpecXlsxReport,
}

impl SpreadsheetBuilder {
    /// Build with default options.
    pub fn new(title: &str, data: &SpecDataset, creator: &str) -> Result<Self, XlsxBuildError> {
        Self::with_options(title, data, creator, derive_default_xlsx_build_options())
    }

    /// Build the heading row and content rows from `data`.
    ///
    /// Fails with [`XlsxBuildError::InvalidInput`] when `data` has no rows or
    /// exceeds the worksheet limits.
    pub fn with_options(
        title: &str,
        data: &SpecDataset,
        creator: &str,
        options: SpecXlsxBuildOptions,
    ) -> Result<Self, XlsxBuildError> {
        let mut report = SpecXlsxReport::default();
        let document = build_document(title, data, creator, &options, &mut report)?;

        for c_msg in &report.warnings {
            warn!(title, "{c_msg}");
        }
        debug!(
            title,
            n_rows_data = report.n_rows_data,
            n_cols = report.n_cols,
            n_cells = document.cells.len(),
            "Built sheet document"
        );

        Ok(Self {
            document,
            options,
            report,
        })
    }

    pub fn document(&self) -> &SpecSheetDocument {
        &self.document
    }

    pub fn report(&self) -> &SpecXlsxReport {
        &self.report
    }

    pub fn options(&self) -> &SpecXlsxBuildOptions {
        &self.options
    }

    /// Write the workbook to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), XlsxBuildError> {
        let path = path.as_ref();
        let mut workbook = self.create_workbook()?;
        workbook.save(path).map_err(derive_xlsx_error)?;
        info!(path = %path.display(), title = %self.document.title, "Saved workbook");
        Ok(())
    }

    /// Serialize the workbook into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>, XlsxBuildError> {
        let mut workbook = self.create_workbook()?;
        workbook.save_to_buffer().map_err(derive_xlsx_error)
    }

    /// Serialize for HTTP delivery.
    ///
    /// `filename` defaults to the title; `.xlsx` is appended when missing.
    pub fn export(
        &self,
        filename: Option<&str>,
        delivery_mode: EnumDeliveryMode,
    ) -> Result<SpecXlsxExport, XlsxBuildError> {
        let c_filename = sanitize_file_name(filename.unwrap_or(&self.document.title), "_");
        let v_bytes = self.to_bytes()?;
        info!(
            filename = %c_filename,
            n_bytes = v_bytes.len(),
            ?delivery_mode,
            "Exported workbook"
        );
        Ok(SpecXlsxExport::new(v_bytes, c_filename, delivery_mode))
    }

    /// Stream the serialized workbook into a caller-owned sink.
    ///
    /// Returns the number of bytes written. The sink is flushed on success.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<usize, XlsxBuildError> {
        let v_bytes = self.to_bytes()?;
        writer.write_all(&v_bytes)?;
        writer.flush()?;
        Ok(v_bytes.len())
    }

    fn create_workbook(&self) -> Result<Workbook, XlsxBuildError> {
        let mut workbook = Workbook::new();

        let mut properties = DocProperties::new()
            .set_title(&self.document.title)
            .set_author(&self.document.creator);
        if let Some(dt_creation) = &self.options.creation_datetime {
            properties = properties.set_creation_datetime(&derive_excel_datetime(dt_creation)?);
        }
        workbook.set_properties(&properties);

        let fmt_header = if self.options.if_bold_header {
            Format::new().set_bold()
        } else {
            Format::new()
        };

        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&self.document.sheet_name)
            .map_err(derive_xlsx_error)?;

        for cell in &self.document.cells {
            let fmt_text = if cell.row == 1 && self.options.if_bold_header {
                Some(&fmt_header)
            } else {
                None
            };
            write_cell(worksheet, cell, fmt_text)?;
        }

        Ok(workbook)
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region DocumentBuild

fn build_document(
    title: &str,
    data: &SpecDataset,
    creator: &str,
    options: &SpecXlsxBuildOptions,
    report: &mut SpecXlsxReport,
) -> Result<SpecSheetDocument, XlsxBuildError> {
    let Some(row_first) = data.first() else {
        return Err(XlsxBuildError::InvalidInput(
            "Dataset is empty; at least one row is required to derive headings.".to_string(),
        ));
    };
    if data.len() >= N_NROWS_EXCEL_MAX {
        return Err(XlsxBuildError::InvalidInput(format!(
            "Dataset has {} rows; a sheet holds at most {} data rows.",
            data.len(),
            N_NROWS_EXCEL_MAX - 1
        )));
    }

    let sheet_name = sanitize_sheet_name(title, "_");
    if sheet_name != title {
        report.warn(format!(
            "Sheet name {title:?} is not valid in Excel; using {sheet_name:?}."
        ));
    }

    let l_headings = derive_headings(row_first, report);
    if l_headings.len() > N_NCOLS_EXCEL_MAX {
        return Err(XlsxBuildError::InvalidInput(format!(
            "First row has {} scalar columns; a sheet holds at most {N_NCOLS_EXCEL_MAX}.",
            l_headings.len()
        )));
    }
    report.n_cols = l_headings.len();

    let mut l_cells = Vec::with_capacity((data.len() + 1) * l_headings.len());
    // Lookup keeps the full key; only the written heading is cut.
    for (n_idx_col, c_heading) in l_headings.iter().enumerate() {
        let n_col = cast_col_num(n_idx_col)?;
        l_cells.push(SpecSheetCell {
            row: 1,
            col: n_col,
            kind: plan_text_kind(c_heading.clone(), 1, n_col, report),
        });
    }

    let set_keys_first: BTreeSet<&str> = row_first.keys().collect();
    for (n_idx_row, row) in data.rows().iter().enumerate() {
        let n_row = cast_row_num(n_idx_row + 2)?;
        match options.column_alignment {
            EnumColumnAlignmentMode::ByName => {
                let set_keys_row: BTreeSet<&str> = row.keys().collect();
                if set_keys_row != set_keys_first {
                    report.warn(format!(
                        "Row {n_row} keys differ from the first row; unmatched fields are not written."
                    ));
                }
                plan_row_by_name(row, n_row, &l_headings, options, report, &mut l_cells)?;
            }
            EnumColumnAlignmentMode::ByValue => {
                plan_row_by_value(row, n_row, l_headings.len(), options, report, &mut l_cells)?;
            }
        }
        report.n_rows_data += 1;
    }

    Ok(SpecSheetDocument {
        title: title.to_string(),
        sheet_name,
        creator: creator.to_string(),
        cells: l_cells,
    })
}

/// Heading names: first-row keys whose first-row value is not nested.
fn derive_headings(row_first: &SpecRow, report: &mut SpecXlsxReport) -> Vec<String> {
    let mut l_headings = Vec::with_capacity(row_first.len());
    for (c_key, value) in row_first.iter() {
        if value.is_nested() {
            debug!(column = c_key, "Skipping nested column");
            report.columns_skipped.push(c_key.to_string());
            continue;
        }
        l_headings.push(c_key.to_string());
    }

    if l_headings.is_empty() {
        report.warn("First row has no scalar fields; heading row is empty.");
    }
    l_headings
}

fn plan_row_by_name(
    row: &SpecRow,
    n_row: u32,
    headings: &[String],
    options: &SpecXlsxBuildOptions,
    report: &mut SpecXlsxReport,
    cells: &mut Vec<SpecSheetCell>,
) -> Result<(), XlsxBuildError> {
    for (n_idx_col, c_heading) in headings.iter().enumerate() {
        let Some(value) = row.get(c_heading) else {
            continue;
        };
        let n_col = cast_col_num(n_idx_col)?;
        if let Some(kind) = plan_cell_kind(value, n_row, n_col, options, report) {
            cells.push(SpecSheetCell {
                row: n_row,
                col: n_col,
                kind,
            });
        }
    }
    Ok(())
}

/// Column cursor advances only on scalar values, independent of key names.
fn plan_row_by_value(
    row: &SpecRow,
    n_row: u32,
    n_headings: usize,
    options: &SpecXlsxBuildOptions,
    report: &mut SpecXlsxReport,
    cells: &mut Vec<SpecSheetCell>,
) -> Result<(), XlsxBuildError> {
    let mut n_idx_col = 0usize;
    for value in row.values() {
        if value.is_nested() {
            continue;
        }
        let n_col = cast_col_num(n_idx_col)?;
        if let Some(kind) = plan_cell_kind(value, n_row, n_col, options, report) {
            cells.push(SpecSheetCell {
                row: n_row,
                col: n_col,
                kind,
            });
        }
        n_idx_col += 1;
    }

    if n_idx_col != n_headings {
        report.warn(format!(
            "Row {n_row} has {n_idx_col} scalar values for {n_headings} headings; columns may be misaligned."
        ));
    }
    Ok(())
}

/// Dispatch one value to a typed cell. `None` for nested values.
fn plan_cell_kind(
    value: &EnumCellValue,
    n_row: u32,
    n_col: u16,
    options: &SpecXlsxBuildOptions,
    report: &mut SpecXlsxReport,
) -> Option<EnumSheetCellKind> {
    match (value, options.date_detection) {
        (EnumCellValue::Nested(_), _) => None,
        (EnumCellValue::Temporal(dt), _) => {
            Some(plan_date_kind(dt, n_row, n_col, options, report))
        }
        (EnumCellValue::Integer(val), EnumDateDetectionMode::Explicit) => {
            if val.unsigned_abs() > N_INT_EXACT_F64_MAX {
                report.warn(format!(
                    "Cell {} integer {val} exceeds 2^53; written as text to keep every digit.",
                    derive_cell_reference(n_row, n_col)
                ));
                return Some(EnumSheetCellKind::Text(val.to_string()));
            }
            Some(EnumSheetCellKind::Number(*val as f64))
        }
        (EnumCellValue::Text(val), EnumDateDetectionMode::Explicit) => {
            Some(plan_text_kind(val.clone(), n_row, n_col, report))
        }
        (_, EnumDateDetectionMode::Heuristic) => {
            let c_text = value.to_text();
            Some(match parse_datetime_heuristic(&c_text) {
                Some(dt) => plan_date_kind(&dt, n_row, n_col, options, report),
                None => plan_text_kind(c_text, n_row, n_col, report),
            })
        }
    }
}

/// Text cell, cut to the Excel cell limit with a warning when longer.
fn plan_text_kind(
    text: String,
    n_row: u32,
    n_col: u16,
    report: &mut SpecXlsxReport,
) -> EnumSheetCellKind {
    match truncate_cell_text(&text) {
        Some(c_cut) => {
            report.warn(format!(
                "Cell {} text has {} characters; truncated to the Excel limit.",
                derive_cell_reference(n_row, n_col),
                text.chars().count()
            ));
            EnumSheetCellKind::Text(c_cut)
        }
        None => EnumSheetCellKind::Text(text),
    }
}

fn plan_date_kind(
    dt: &NaiveDateTime,
    n_row: u32,
    n_col: u16,
    options: &SpecXlsxBuildOptions,
    report: &mut SpecXlsxReport,
) -> EnumSheetCellKind {
    match convert_datetime_to_excel_serial(dt) {
        Some(serial) => EnumSheetCellKind::Date {
            serial,
            value: *dt,
            num_format: options.date_num_format.clone(),
        },
        None => {
            let c_layout = if dt.time() == NaiveTime::MIN {
                "%Y-%m-%d"
            } else {
                "%Y-%m-%d %H:%M:%S"
            };
            report.warn(format!(
                "Cell {} predates 1900-01-01; written as text.",
                derive_cell_reference(n_row, n_col)
            ));
            EnumSheetCellKind::Text(dt.format(c_layout).to_string())
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WorkbookRender

fn write_cell(
    worksheet: &mut Worksheet,
    cell: &SpecSheetCell,
    fmt_text: Option<&Format>,
) -> Result<(), XlsxBuildError> {
    // Document rows are 1-based, worksheet rows 0-based.
    let n_row = cell.row.saturating_sub(1);
    match &cell.kind {
        EnumSheetCellKind::Text(val) => match fmt_text {
            Some(format) => {
                worksheet
                    .write_string_with_format(n_row, cell.col, val, format)
                    .map_err(derive_xlsx_error)?;
            }
            None => {
                worksheet
                    .write_string(n_row, cell.col, val)
                    .map_err(derive_xlsx_error)?;
            }
        },
        EnumSheetCellKind::Number(val) => {
            worksheet
                .write_number(n_row, cell.col, *val)
                .map_err(derive_xlsx_error)?;
        }
        EnumSheetCellKind::Date {
            serial, num_format, ..
        } => {
            let fmt_date = Format::new().set_num_format(num_format);
            worksheet
                .write_number_with_format(n_row, cell.col, *serial, &fmt_date)
                .map_err(derive_xlsx_error)?;
        }
    }
    Ok(())
}

fn derive_excel_datetime(dt: &NaiveDateTime) -> Result<ExcelDateTime, XlsxBuildError> {
    ExcelDateTime::parse_from_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string())
        .map_err(derive_xlsx_error)
}

fn cast_row_num(value: usize) -> Result<u32, XlsxBuildError> {
    u32::try_from(value)
        .ok()
        .filter(|n_row| (*n_row as usize) <= N_NROWS_EXCEL_MAX)
        .ok_or_else(|| XlsxBuildError::InvalidInput(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, XlsxBuildError> {
    u16::try_from(value)
        .ok()
        .filter(|n_col| usize::from(*n_col) < N_NCOLS_EXCEL_MAX)
        .ok_or_else(|| XlsxBuildError::InvalidInput(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
