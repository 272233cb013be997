//! Format detection heuristics for import.

use std::io::{self, BufRead};
use std::path::Path;

use super::ImportFormat;

pub fn detect_format<R: BufRead>(reader: &mut R, path: &Path) -> io::Result<ImportFormat> {
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        match ext.to_lowercase().as_str() {
            "jsonl" | "ndjson" | "json" => return Ok(ImportFormat::Ndjson),
            "csv" => return Ok(ImportFormat::Csv),
            _ => {}
        }
    }
    let buf = reader.fill_buf()?; // peek without consuming
    let s = String::from_utf8_lossy(&buf[..std::cmp::min(256, buf.len())]);
    if s.trim_start().starts_with('{') || s.trim_start().starts_with('[') {
        return Ok(ImportFormat::Ndjson);
    }
    Ok(ImportFormat::Csv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_format_by_extension() {
        let data = b"title,author\n";
        let mut r = std::io::BufReader::new(&data[..]);
        assert_eq!(detect_format(&mut r, Path::new("books.jsonl")).unwrap(), ImportFormat::Ndjson);
        let mut r = std::io::BufReader::new(&data[..]);
        assert_eq!(detect_format(&mut r, Path::new("books.CSV")).unwrap(), ImportFormat::Csv);
    }

    #[test]
    fn detect_format_by_content() {
        let data = b"  [{\"title\":\"1984\"}]";
        let mut r = std::io::BufReader::new(&data[..]);
        assert_eq!(detect_format(&mut r, Path::new("books.dat")).unwrap(), ImportFormat::Ndjson);
        let data = b"title,author\n1984,George Orwell\n";
        let mut r = std::io::BufReader::new(&data[..]);
        assert_eq!(detect_format(&mut r, Path::new("books")).unwrap(), ImportFormat::Csv);
    }
}
