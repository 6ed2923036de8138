//! `sheetkit_io_xlsx` v1:
//! Row-record to XLSX spreadsheet builder.
//!
//! Modules:
//! - `conf`   : constants and default presets
//! - `spec`   : input data model, options, document model, report
//! - `error`  : error type
//! - `util`   : pure helper functions
//! - `writer` : spreadsheet builder and workbook rendering
//! - `export` : in-memory export payload for HTTP delivery
pub mod conf;
pub mod error;
pub mod export;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_CONTENT_TYPE_XLS_STREAM, C_CONTENT_TYPE_XLSX, C_DATE_NUM_FORMAT_DEFAULT,
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
};
pub use error::XlsxBuildError;
pub use export::SpecXlsxExport;
pub use spec::{
    EnumCellValue, EnumColumnAlignmentMode, EnumDateDetectionMode, EnumDeliveryMode,
    EnumSheetCellKind, SpecDataset, SpecRow, SpecSheetCell, SpecSheetDocument,
    SpecXlsxBuildOptions, SpecXlsxReport,
};
pub use util::{
    convert_datetime_to_excel_serial, derive_column_letter, parse_datetime_heuristic,
    sanitize_file_name, sanitize_sheet_name,
};
pub use writer::SpreadsheetBuilder;
