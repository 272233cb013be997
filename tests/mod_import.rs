use folio::Collection;
use folio::import::{ImportFormat, ImportOptions, load_file, load_reader};
use std::io::Cursor;
use tempfile::tempdir;

#[test]
fn test_import_ndjson_basic() {
    let data = "{\"title\":\"1984\",\"author\":\"George Orwell\"}\n\n{\"title\":\"Animal Farm\",\"author\":\"George Orwell\"}\n";
    let mut col = Collection::new("books");
    let report =
        load_reader(Cursor::new(data.as_bytes()), ImportFormat::Ndjson, &ImportOptions::default(), &mut col).unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(col.len(), 2);
    assert_eq!(col.documents()[1].get_str("title").unwrap(), "Animal Farm");
}

#[test]
fn test_import_json_array() {
    let data = "  [{\"title\":\"1984\",\"published_year\":1949},{\"title\":\"Dune\",\"published_year\":1965}]";
    let mut col = Collection::new("books");
    let report =
        load_reader(Cursor::new(data.as_bytes()), ImportFormat::Ndjson, &ImportOptions::default(), &mut col).unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(col.documents()[0].get_i32("published_year").unwrap(), 1949);
}

#[test]
fn test_import_csv_type_inference() {
    let data = "title,author,genre,published_year,price,in_stock\nAnimal Farm,George Orwell,Political Satire,1945,8.99,true\n";
    let mut col = Collection::new("books");
    let report =
        load_reader(Cursor::new(data.as_bytes()), ImportFormat::Csv, &ImportOptions::default(), &mut col).unwrap();
    assert_eq!(report.inserted, 1);
    let d = &col.documents()[0];
    assert_eq!(d.get_str("title").unwrap(), "Animal Farm");
    assert_eq!(d.get_i32("published_year").unwrap(), 1945);
    assert_eq!(d.get_f64("price").unwrap(), 8.99);
    assert!(d.get_bool("in_stock").unwrap());
}

#[test]
fn test_import_csv_without_inference_keeps_strings() {
    let data = "title,published_year\n1984,1949\n";
    let mut opts = ImportOptions::default();
    opts.csv.type_infer = false;
    let mut col = Collection::new("books");
    load_reader(Cursor::new(data.as_bytes()), ImportFormat::Csv, &opts, &mut col).unwrap();
    assert_eq!(col.documents()[0].get_str("published_year").unwrap(), "1949");
}

#[test]
fn test_import_malformed_line_fails_or_skips() {
    let data = "{\"title\":\"ok\"}\n{not json}\n[1,2]\n{\"title\":\"also ok\"}\n";
    let mut col = Collection::new("books");
    let err = load_reader(Cursor::new(data.as_bytes()), ImportFormat::Ndjson, &ImportOptions::default(), &mut col)
        .unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);

    let opts = ImportOptions { skip_errors: true, ..ImportOptions::default() };
    let mut col = Collection::new("books");
    let report = load_reader(Cursor::new(data.as_bytes()), ImportFormat::Ndjson, &opts, &mut col).unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped, 2);
}

#[test]
fn test_load_file_detects_format() {
    let dir = tempdir().unwrap();
    let csv_path = dir.path().join("books.csv");
    std::fs::write(&csv_path, "title,author\nDune,Frank Herbert\nEmma,Jane Austen\n").unwrap();
    let (col, report) = load_file(&csv_path, &ImportOptions::default()).unwrap();
    assert_eq!(col.name(), "books");
    assert_eq!(report.inserted, 2);

    let raw_path = dir.path().join("books.data");
    std::fs::write(&raw_path, "{\"title\":\"Dune\"}\n").unwrap();
    let (col, _) = load_file(&raw_path, &ImportOptions::default()).unwrap();
    assert_eq!(col.len(), 1);
}

#[test]
fn test_auto_format_must_be_resolved_for_readers() {
    let mut col = Collection::new("books");
    let err = load_reader(Cursor::new(b"{}".as_slice()), ImportFormat::Auto, &ImportOptions::default(), &mut col)
        .unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}
