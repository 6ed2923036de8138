//! Round-trip tests: build, serialize, then re-read with calamine.

use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;
use sheetkit_io_xlsx::{
    EnumDateDetectionMode, EnumDeliveryMode, SpecDataset, SpecRow, SpecXlsxBuildOptions,
    SpreadsheetBuilder, XlsxBuildError,
};

fn derive_people() -> SpecDataset {
    SpecDataset::new(vec![
        SpecRow::new()
            .with("name", "Alice")
            .with("age", 30)
            .with("joined", NaiveDate::from_ymd_opt(2024, 1, 15).expect("date")),
        SpecRow::new()
            .with("name", "Bob")
            .with("age", 41)
            .with("joined", NaiveDate::from_ymd_opt(2023, 6, 1).expect("date")),
    ])
}

fn derive_fixed_options() -> SpecXlsxBuildOptions {
    SpecXlsxBuildOptions {
        creation_datetime: NaiveDateTime::parse_from_str("2024-01-01 00:00:00", "%Y-%m-%d %H:%M:%S")
            .ok(),
        ..Default::default()
    }
}

fn read_sheet(bytes: Vec<u8>, sheet_name: &str) -> Range<Data> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).expect("open workbook");
    workbook.worksheet_range(sheet_name).expect("sheet range")
}

fn read_text(range: &Range<Data>, row: u32, col: u32) -> Option<String> {
    match range.get_value((row, col)) {
        Some(Data::String(val)) => Some(val.clone()),
        _ => None,
    }
}

fn read_number(range: &Range<Data>, row: u32, col: u32) -> Option<f64> {
    match range.get_value((row, col)) {
        Some(Data::Float(val)) => Some(*val),
        Some(Data::Int(val)) => Some(*val as f64),
        Some(Data::DateTime(val)) => Some(val.as_f64()),
        _ => None,
    }
}

#[test]
fn test_saved_file_round_trips_text_and_numbers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("people.xlsx");

    let builder = SpreadsheetBuilder::new("People", &derive_people(), "hr").expect("build");
    builder.save(&path).expect("save");

    let mut workbook: Xlsx<_> = open_workbook(&path).expect("open workbook");
    let range = workbook.worksheet_range("People").expect("sheet range");

    assert_eq!(range.get_size(), (3, 3));
    assert_eq!(read_text(&range, 0, 0).as_deref(), Some("name"));
    assert_eq!(read_text(&range, 0, 1).as_deref(), Some("age"));
    assert_eq!(read_text(&range, 0, 2).as_deref(), Some("joined"));
    assert_eq!(read_text(&range, 1, 0).as_deref(), Some("Alice"));
    assert_eq!(read_number(&range, 1, 1), Some(30.0));
    assert_eq!(read_number(&range, 1, 2), Some(45306.0));
    assert_eq!(read_text(&range, 2, 0).as_deref(), Some("Bob"));
    assert_eq!(read_number(&range, 2, 1), Some(41.0));
}

#[test]
fn test_save_overwrites_existing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.xlsx");
    std::fs::write(&path, b"stale").expect("seed file");

    let builder = SpreadsheetBuilder::new("People", &derive_people(), "").expect("build");
    builder.save(&path).expect("save");

    let v_bytes = std::fs::read(&path).expect("read back");
    assert!(v_bytes.starts_with(b"PK"));
}

#[test]
fn test_save_to_unwritable_path_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing").join("nested").join("out.xlsx");

    let builder = SpreadsheetBuilder::new("People", &derive_people(), "").expect("build");
    let err = builder.save(&path).expect_err("must fail");
    assert!(matches!(err, XlsxBuildError::Io(_)), "got {err:?}");
}

#[test]
fn test_repeated_saves_are_byte_identical_with_fixed_timestamp() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path_a = dir.path().join("a.xlsx");
    let path_b = dir.path().join("b.xlsx");

    let builder =
        SpreadsheetBuilder::with_options("People", &derive_people(), "hr", derive_fixed_options())
            .expect("build");
    builder.save(&path_a).expect("save a");
    builder.save(&path_b).expect("save b");

    assert_eq!(
        std::fs::read(&path_a).expect("read a"),
        std::fs::read(&path_b).expect("read b")
    );
    assert_eq!(
        builder.to_bytes().expect("bytes"),
        std::fs::read(&path_a).expect("read a")
    );
}

#[test]
fn test_json_dataset_skips_nested_fields_in_output() {
    let data = SpecDataset::from_json(&json!([
        {"id": 1, "roles": ["admin"], "email": "a@example.com"},
        {"id": 2, "roles": [], "email": "b@example.com"}
    ]))
    .expect("dataset");

    let builder = SpreadsheetBuilder::new("Users", &data, "").expect("build");
    let export = builder
        .export(Some("users"), EnumDeliveryMode::Attachment)
        .expect("export");
    assert_eq!(export.filename, "users.xlsx");

    let range = read_sheet(export.bytes, "Users");
    assert_eq!(range.get_size(), (3, 2));
    assert_eq!(read_text(&range, 0, 1).as_deref(), Some("email"));
    assert_eq!(read_number(&range, 2, 0), Some(2.0));
    assert_eq!(read_text(&range, 2, 1).as_deref(), Some("b@example.com"));
}

#[test]
fn test_heuristic_mode_round_trip() {
    let data = SpecDataset::new(vec![
        SpecRow::new()
            .with("when", "2024-01-15 12:00:00")
            .with("label", "not-a-date")
            .with("count", 7),
    ]);
    let options = SpecXlsxBuildOptions {
        date_detection: EnumDateDetectionMode::Heuristic,
        ..Default::default()
    };
    let builder = SpreadsheetBuilder::with_options("H", &data, "", options).expect("build");

    let range = read_sheet(builder.to_bytes().expect("bytes"), "H");
    assert_eq!(read_number(&range, 1, 0), Some(45306.5));
    assert_eq!(read_text(&range, 1, 1).as_deref(), Some("not-a-date"));
    assert_eq!(read_text(&range, 1, 2).as_deref(), Some("7"));
}

#[test]
fn test_write_to_matches_export_bytes() {
    let builder =
        SpreadsheetBuilder::with_options("People", &derive_people(), "", derive_fixed_options())
            .expect("build");

    let mut v_sink = Vec::new();
    builder.write_to(&mut v_sink).expect("write");
    let export = builder
        .export(None, EnumDeliveryMode::Streamed)
        .expect("export");

    assert_eq!(v_sink, export.bytes);
    assert_eq!(
        export.headers(),
        vec![
            ("Content-Type", "application/vnd.ms-excel".to_string()),
            (
                "Content-Disposition",
                "attachment; filename=\"People.xlsx\"".to_string()
            ),
            ("Cache-Control", "max-age=0".to_string()),
        ]
    );
}
