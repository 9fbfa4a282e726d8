use crate::common::{fixture_path, single_column_dbf, write_xlsx, write_xlsx_sheet, sheet_xml, DbfBuilder, XCell};
use std::fs;
use tabdupe::duplicates::{DuplicateScanner, ScanOptions};
use tabdupe::source::{open_source, CellError, CellValue, SourceFormat, TabularSource};
use tempfile::tempdir;

fn scan_column(source: &mut dyn TabularSource, column: usize) -> Vec<(CellValue, Vec<usize>)> {
    let (groups, _) = DuplicateScanner::default().scan(source, column).unwrap();
    groups
        .iter()
        .map(|g| (g.value.clone(), g.rows.clone()))
        .collect()
}

#[test]
fn test_xlsx_duplicates_use_viewer_row_numbers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ids.xlsx");
    write_xlsx(
        &path,
        &[
            vec!["ID".into()],
            vec![1.0.into()],
            vec![2.0.into()],
            vec![1.0.into()],
        ],
    );

    let mut source = open_source(&path).unwrap();
    assert_eq!(source.format(), SourceFormat::Xlsx);
    assert_eq!(source.columns(), ["ID".to_string()]);
    assert_eq!(source.row_count(), 4);
    assert_eq!(source.encoding(), "utf-8");

    let groups = scan_column(source.as_mut(), 0);
    assert_eq!(groups, vec![(CellValue::Number(1.0), vec![2, 4])]);
}

#[test]
fn test_xls_duplicates_use_viewer_row_numbers() {
    // BIFF8 workbook: ID | Name | City, three data rows, rows 1 and 3 repeat
    let path = fixture_path("ids.xls");

    let mut source = open_source(&path).unwrap();
    assert_eq!(source.format(), SourceFormat::Xls);
    assert_eq!(
        source.columns(),
        ["ID".to_string(), "Name".to_string(), "City".to_string()]
    );
    assert_eq!(source.row_count(), 4);
    assert_eq!(source.encoding(), "cp1251");

    assert_eq!(
        scan_column(source.as_mut(), 0),
        vec![(CellValue::Number(1.0), vec![2, 4])]
    );
    assert!(scan_column(source.as_mut(), 1).is_empty());
    assert_eq!(
        scan_column(source.as_mut(), 2),
        vec![(CellValue::from("Москва"), vec![2, 4])]
    );
}

#[test]
fn test_dbf_duplicates_use_viewer_row_numbers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ids.dbf");
    single_column_dbf("ID", 5, &["1", "2", "1"]).write(&path);

    let mut source = open_source(&path).unwrap();
    assert_eq!(source.format(), SourceFormat::Dbf);
    assert_eq!(source.columns(), ["ID".to_string()]);
    assert_eq!(source.row_count(), 3);

    let groups = scan_column(source.as_mut(), 0);
    assert_eq!(groups, vec![(CellValue::from("1"), vec![2, 4])]);
}

#[test]
fn test_no_duplicates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unique.dbf");
    single_column_dbf("CODE", 4, &["a", "b", "c"]).write(&path);

    let mut source = open_source(&path).unwrap();
    let (groups, summary) = DuplicateScanner::default()
        .scan(source.as_mut(), 0)
        .unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.rows_scanned, 3);
    assert_eq!(summary.distinct_values, 3);
}

#[test]
fn test_header_only_and_empty_tables() {
    let dir = tempdir().unwrap();

    let xlsx = dir.path().join("header.xlsx");
    write_xlsx(&xlsx, &[vec!["ID".into(), "Name".into()]]);
    let mut source = open_source(&xlsx).unwrap();
    assert_eq!(source.columns().len(), 2);
    assert!(scan_column(source.as_mut(), 1).is_empty());

    let dbf = dir.path().join("empty.dbf");
    DbfBuilder::new().field("ID", 'C', 3).write(&dbf);
    let mut source = open_source(&dbf).unwrap();
    assert_eq!(source.row_count(), 0);
    assert!(scan_column(source.as_mut(), 0).is_empty());
}

#[test]
fn test_scan_twice_gives_same_result() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("twice.dbf");
    single_column_dbf("V", 3, &["x", "y", "x", "y", "x"]).write(&path);

    let mut source = open_source(&path).unwrap();
    let first = scan_column(source.as_mut(), 0);
    let second = scan_column(source.as_mut(), 0);
    assert_eq!(first, second);
    assert_eq!(first[0], (CellValue::from("x"), vec![2, 4, 6]));
    assert_eq!(first[1], (CellValue::from("y"), vec![3, 5]));
}

#[test]
fn test_text_and_number_are_distinct_in_xlsx() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mixed.xlsx");
    write_xlsx(
        &path,
        &[
            vec!["Code".into()],
            vec![1.0.into()],
            vec!["1".into()],
            vec![XCell::Bool(true)],
            vec![1.0.into()],
        ],
    );

    let mut source = open_source(&path).unwrap();
    let groups = scan_column(source.as_mut(), 0);
    assert_eq!(groups, vec![(CellValue::Number(1.0), vec![2, 5])]);
}

#[test]
fn test_xlsx_leading_empty_column_keeps_positions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("offset.xlsx");
    write_xlsx(
        &path,
        &[
            vec![XCell::Empty, "ID".into()],
            vec![XCell::Empty, "a".into()],
            vec![XCell::Empty, "a".into()],
        ],
    );

    let mut source = open_source(&path).unwrap();
    assert_eq!(source.columns(), ["".to_string(), "ID".to_string()]);
    let groups = scan_column(source.as_mut(), 1);
    assert_eq!(groups, vec![(CellValue::from("a"), vec![2, 3])]);
}

#[test]
fn test_xlsx_row_numbers_follow_sheet_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gaps.xlsx");
    let mut xml = sheet_xml(&[vec!["ID".into()], vec!["k".into()]], 0);
    // a second "k" on sheet row 6, leaving rows 3-5 empty
    xml = xml.replace(
        "</sheetData>",
        r#"<row r="6"><c r="A6" t="inlineStr"><is><t>k</t></is></c></row></sheetData>"#,
    );
    write_xlsx_sheet(&path, &xml);

    let mut source = open_source(&path).unwrap();
    assert_eq!(source.row_count(), 6);
    let groups = scan_column(source.as_mut(), 0);
    assert_eq!(groups[0], (CellValue::from("k"), vec![2, 6]));
    // the three blank rows group together as empty cells
    assert_eq!(groups[1], (CellValue::Empty, vec![3, 4, 5]));
}

#[test]
fn test_skip_empty_option() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blanks.dbf");
    single_column_dbf("V", 3, &["", "a", "", "b"]).write(&path);

    let mut source = open_source(&path).unwrap();
    assert_eq!(
        scan_column(source.as_mut(), 0),
        vec![(CellValue::from(""), vec![2, 4])]
    );

    let scanner = DuplicateScanner::new(ScanOptions::default().with_skip_empty(true));
    let (groups, summary) = scanner.scan(source.as_mut(), 0).unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.blank_cells, 2);
}

#[test]
fn test_dbf_second_column_and_numeric_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("orders.dbf");
    DbfBuilder::new()
        .field("ORDER", 'C', 6)
        .field("QTY", 'N', 6)
        .record(&["A1", "   5.0"])
        .record(&["A2", "     5"])
        .record(&["A3", "   7"])
        .write(&path);

    let mut source = open_source(&path).unwrap();
    assert_eq!(source.columns(), ["ORDER".to_string(), "QTY".to_string()]);
    let groups = scan_column(source.as_mut(), 1);
    assert_eq!(groups, vec![(CellValue::Number(5.0), vec![2, 3])]);
}

#[test]
fn test_dbf_malformed_cell_is_skipped_not_renumbered() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.dbf");
    DbfBuilder::new()
        .field("QTY", 'N', 4)
        .record(&["1"])
        .record(&["x?"])
        .record(&["1"])
        .write(&path);

    let mut source = open_source(&path).unwrap();
    let (groups, summary) = DuplicateScanner::default()
        .scan(source.as_mut(), 0)
        .unwrap();

    assert_eq!(groups.get(&CellValue::Number(1.0)).unwrap().rows, vec![2, 4]);
    assert_eq!(summary.rows_skipped, 1);
    assert_eq!(summary.warnings[0].row, 3);
    assert!(matches!(
        summary.warnings[0].reason,
        CellError::Malformed { kind: "numeric", .. }
    ));
}

#[test]
fn test_dbf_deleted_records_are_scanned() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("deleted.dbf");
    DbfBuilder::new()
        .field("ID", 'C', 2)
        .record(&["7"])
        .deleted_record(&["7"])
        .write(&path);

    let mut source = open_source(&path).unwrap();
    assert_eq!(
        scan_column(source.as_mut(), 0),
        vec![(CellValue::from("7"), vec![2, 3])]
    );
}

#[test]
fn test_dbf_truncated_last_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("short.dbf");
    let builder = DbfBuilder::new()
        .field("A", 'C', 4)
        .field("B", 'C', 4)
        .record(&["x", "y"])
        .record(&["x", "z"])
        .eof_marker(false);
    let mut bytes = builder.build();
    // cut the second record in the middle of field B
    bytes.truncate(builder.header_len() + builder.record_len() + 6);
    fs::write(&path, bytes).unwrap();

    let mut source = open_source(&path).unwrap();
    let (groups, summary) = DuplicateScanner::default()
        .scan(source.as_mut(), 0)
        .unwrap();
    // field A is complete in the cut record, so its value still counts
    assert_eq!(groups.get(&CellValue::from("x")).unwrap().rows, vec![2, 3]);
    assert_eq!(summary.rows_scanned, 2);
    assert_eq!(summary.rows_skipped, 0);

    let (groups, summary) = DuplicateScanner::default()
        .scan(source.as_mut(), 1)
        .unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.rows_skipped, 1);
    assert!(matches!(
        summary.warnings[0].reason,
        CellError::Truncated { .. }
    ));
}

#[test]
fn test_dbf_stops_at_end_of_file_marker() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("overcount.dbf");
    DbfBuilder::new()
        .field("ID", 'C', 2)
        .record(&["1"])
        .record(&["1"])
        .declared_records(10)
        .write(&path);

    let mut source = open_source(&path).unwrap();
    let (groups, summary) = DuplicateScanner::default()
        .scan(source.as_mut(), 0)
        .unwrap();
    assert_eq!(summary.rows_scanned, 2);
    assert_eq!(groups.len(), 1);
}

#[test]
fn test_dbf_codepage_decoding() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("names.dbf");
    let (ivan, _, _) = encoding_rs::IBM866.encode("Иван");
    let (petr, _, _) = encoding_rs::IBM866.encode("Петр");
    DbfBuilder::new()
        .codepage(0x65)
        .field("NAME", 'C', 10)
        .record_bytes(&[&ivan], false)
        .record_bytes(&[&petr], false)
        .record_bytes(&[&ivan], false)
        .write(&path);

    let mut source = open_source(&path).unwrap();
    assert_eq!(source.encoding(), "cp866");
    assert_eq!(
        scan_column(source.as_mut(), 0),
        vec![(CellValue::from("Иван"), vec![2, 4])]
    );
}

#[test]
fn test_dbf_without_codepage_is_sniffed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plain.dbf");
    single_column_dbf("ID", 4, &["abc", "def"]).write(&path);

    let source = open_source(&path).unwrap();
    assert_eq!(source.encoding(), "ascii");
}

#[test]
fn test_dbf_undecodable_codepage_keeps_declared_label() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dos.dbf");
    DbfBuilder::new()
        .codepage(0x01)
        .field("CODE", 'C', 4)
        .record(&["A1"])
        .record(&["A1"])
        .write(&path);

    let mut source = open_source(&path).unwrap();
    assert_eq!(source.encoding(), "cp437");
    assert_eq!(
        scan_column(source.as_mut(), 0),
        vec![(CellValue::from("A1"), vec![2, 3])]
    );
}

#[test]
fn test_dbf_without_codepage_decodes_sniffed_cyrillic() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("people.dbf");
    let names = [
        "Иванов Иван Иванович",
        "Петрова Мария Сергеевна",
        "Сидоров Алексей Петрович",
        "Иванов Иван Иванович",
        "Кузнецова Ольга Владимировна",
        "Смирнов Дмитрий Александрович",
        "Петрова Мария Сергеевна",
    ];
    let encoded: Vec<Vec<u8>> = names
        .iter()
        .map(|n| encoding_rs::WINDOWS_1251.encode(n).0.into_owned())
        .collect();
    let mut builder = DbfBuilder::new().codepage(0x00).field("FIO", 'C', 40);
    for raw in &encoded {
        builder = builder.record_bytes(&[raw.as_slice()], false);
    }
    builder.write(&path);

    let mut source = open_source(&path).unwrap();
    assert_eq!(source.encoding(), "windows-1251");
    assert_eq!(
        scan_column(source.as_mut(), 0),
        vec![
            (CellValue::from("Иванов Иван Иванович"), vec![2, 5]),
            (CellValue::from("Петрова Мария Сергеевна"), vec![3, 8]),
        ]
    );
}
