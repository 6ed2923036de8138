//! XLSX constants and default preset factories.

use crate::spec::SpecXlsxBuildOptions;

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Excel cell text maximum length, in characters.
pub const N_LEN_EXCEL_CELL_TEXT_MAX: usize = 32_767;
/// Largest integer magnitude a worksheet number holds exactly (2^53).
pub const N_INT_EXACT_F64_MAX: u64 = 1 << 53;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Number format applied to temporal cells.
pub const C_DATE_NUM_FORMAT_DEFAULT: &str = "dd-mm-yyyy";
/// Extension appended to exported file names.
pub const C_FILE_EXTENSION_XLSX: &str = ".xlsx";

/// Content type for OOXML spreadsheet attachments.
pub const C_CONTENT_TYPE_XLSX: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Looser content type used by the streamed download variant.
pub const C_CONTENT_TYPE_XLS_STREAM: &str = "application/vnd.ms-excel";
/// Cache policy header value for streamed downloads.
pub const C_CACHE_CONTROL_STREAM: &str = "max-age=0";

/// Date/time layouts accepted by heuristic date detection, tried in order.
pub const TUP_DATETIME_LAYOUTS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
/// Date-only layouts accepted by heuristic date detection, tried in order.
pub const TUP_DATE_LAYOUTS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y", "%Y/%m/%d"];

/// Build default build options.
pub fn derive_default_xlsx_build_options() -> SpecXlsxBuildOptions {
    SpecXlsxBuildOptions::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{EnumColumnAlignmentMode, EnumDateDetectionMode};

    #[test]
    fn test_default_build_options_follow_explicit_by_name_policy() {
        let options = derive_default_xlsx_build_options();
        assert_eq!(options.date_detection, EnumDateDetectionMode::Explicit);
        assert_eq!(options.column_alignment, EnumColumnAlignmentMode::ByName);
        assert_eq!(options.date_num_format, C_DATE_NUM_FORMAT_DEFAULT);
        assert!(options.creation_datetime.is_none());
        assert!(!options.if_bold_header);
    }
}
