use std::io::{self, BufRead, BufReader, Read};

use super::options::{ImportOptions, ImportReport};
use crate::collection::Collection;
use crate::utils::json::json_value_to_bson_document;

fn invalid_data(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e.to_string())
}

/// Reads one JSON object per line. A payload whose first non-blank byte is `[`
/// is read as a single JSON array of objects instead.
pub fn import_ndjson<R: Read>(
    collection: &mut Collection,
    reader: R,
    opts: &ImportOptions,
    report: &mut ImportReport,
) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let array_mode = {
        let buf = reader.fill_buf()?;
        buf.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'[')
    };
    if array_mode {
        let mut s = String::new();
        reader.read_to_string(&mut s)?;
        let val: serde_json::Value = serde_json::from_str(&s).map_err(invalid_data)?;
        let arr = val.as_array().ok_or_else(|| invalid_data("expected JSON array"))?;
        for (i, v) in arr.iter().enumerate() {
            match json_value_to_bson_document(v) {
                Ok(doc) => {
                    collection.insert(doc);
                    report.inserted += 1;
                }
                Err(e) if opts.skip_errors => {
                    log::warn!("skipping array element {i}: {e}");
                    report.skipped += 1;
                }
                Err(e) => return Err(invalid_data(e)),
            }
        }
        return Ok(());
    }
    let mut line_no: usize = 0;
    let mut buf = String::with_capacity(8 * 1024);
    loop {
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim();
        if line.is_empty() {
            continue;
        }
        let parsed = serde_json::from_str::<serde_json::Value>(line)
            .map_err(invalid_data)
            .and_then(|v| json_value_to_bson_document(&v).map_err(invalid_data));
        match parsed {
            Ok(doc) => {
                collection.insert(doc);
                report.inserted += 1;
                if let Some(every) = opts.progress_every
                    && every > 0
                    && line_no % every == 0
                {
                    log::info!("imported {} records (ndjson)", report.inserted);
                }
            }
            Err(e) if opts.skip_errors => {
                log::warn!("skipping line {line_no}: {e}");
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
