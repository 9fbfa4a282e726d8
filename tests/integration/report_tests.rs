use crate::common::{single_column_dbf, write_xlsx, XCell};
use std::fs;
use tabdupe::cli::OutputFormat;
use tabdupe::duplicates::DuplicateScanner;
use tabdupe::error::ExitCode;
use tabdupe::output::{DirectorySink, ReportSink, ScanReport, WriterSink};
use tabdupe::source::open_source;
use tempfile::tempdir;

fn report_for(path: &std::path::Path, column: usize) -> ScanReport {
    let mut source = open_source(path).unwrap();
    let (groups, summary) = DuplicateScanner::default()
        .scan(source.as_mut(), column)
        .unwrap();
    ScanReport::from_scan(source.as_ref(), column, groups, summary).unwrap()
}

#[test]
fn test_directory_sink_writes_text_report() {
    let dir = tempdir().unwrap();
    let table = dir.path().join("clients.dbf");
    single_column_dbf("ID", 4, &["1001", "1002", "1001"]).write(&table);

    let report = report_for(&table, 0);
    assert_eq!(report.exit_code(), ExitCode::Success);

    let reports = dir.path().join("Reports");
    let mut sink = DirectorySink::new(&reports);
    let saved = sink.deliver(&report).unwrap().unwrap();

    assert!(saved.starts_with(&reports));
    let name = saved.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("report_clients_"));
    assert!(name.ends_with(".txt"));
    // report_clients_YYYYMMDD_HHMMSS.txt
    assert_eq!(name.len(), "report_clients_".len() + 15 + 4);

    let text = fs::read_to_string(&saved).unwrap();
    assert!(text.contains("File name: clients.dbf"));
    assert!(text.contains("Records in table: 3"));
    assert!(text.contains("Analysed column: ID"));
    assert!(text.contains("1. Value: \"1001\"\n   Rows: 2, 4"));
}

#[test]
fn test_spreadsheet_report_counts_header() {
    let dir = tempdir().unwrap();
    let table = dir.path().join("people.xlsx");
    write_xlsx(
        &table,
        &[
            vec!["Name".into()],
            vec!["Ann".into()],
            vec![XCell::Text("Bob".into())],
        ],
    );

    let report = report_for(&table, 0);
    assert_eq!(report.exit_code(), ExitCode::NoDuplicates);

    let mut sink = WriterSink::new(Vec::new(), OutputFormat::Text);
    assert!(sink.deliver(&report).unwrap().is_none());
    let text = String::from_utf8(sink.into_inner()).unwrap();
    assert!(text.contains("Rows in table (including header): 3"));
    assert!(text.contains("File encoding: utf-8"));
    assert!(text.contains("No duplicates found."));
}

#[test]
fn test_writer_sink_json_and_csv() {
    let dir = tempdir().unwrap();
    let table = dir.path().join("codes.dbf");
    single_column_dbf("CODE", 3, &["a", "b", "a", "b", "b"]).write(&table);
    let report = report_for(&table, 0);

    let mut json_sink = WriterSink::new(Vec::new(), OutputFormat::Json);
    json_sink.deliver(&report).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&json_sink.into_inner()).unwrap();
    assert_eq!(value["file"]["name"], "codes.dbf");
    assert_eq!(value["file"]["format"], "dbf");
    assert_eq!(value["duplicates"][0]["value"], "a");
    assert_eq!(value["duplicates"][0]["rows"], serde_json::json!([2, 4]));
    assert_eq!(value["duplicates"][1]["rows"], serde_json::json!([3, 5, 6]));
    assert_eq!(value["summary"]["duplicate_rows"], 5);

    let mut csv_sink = WriterSink::new(Vec::new(), OutputFormat::Csv);
    csv_sink.deliver(&report).unwrap();
    let csv = String::from_utf8(csv_sink.into_inner()).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines[0], "group_id,value,value_type,row");
    assert_eq!(lines[1], "1,a,text,2");
    assert_eq!(lines[5], "2,b,text,6");
}

#[test]
fn test_directory_sink_reports_unwritable_target() {
    let dir = tempdir().unwrap();
    let table = dir.path().join("t.dbf");
    single_column_dbf("ID", 2, &["1"]).write(&table);
    let report = report_for(&table, 0);

    // a file where the directory should be
    let blocker = dir.path().join("Reports");
    fs::write(&blocker, b"").unwrap();

    let err = DirectorySink::new(&blocker).deliver(&report).unwrap_err();
    assert!(err.to_string().contains("Failed to write report"));
}
