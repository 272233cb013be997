use bson::Document as BsonDocument;
use std::io::{self, Read};

use super::options::{ImportOptions, ImportReport};
use super::util::field_to_bson;
use crate::collection::Collection;

/// Reads a headed CSV file; each row becomes one document keyed by header.
pub fn import_csv<R: Read>(
    collection: &mut Collection,
    reader: R,
    opts: &ImportOptions,
    report: &mut ImportReport,
) -> io::Result<()> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(opts.csv.delimiter)
        .from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut row_no: usize = 0;
    for rec in rdr.records() {
        row_no += 1;
        let rec = match rec {
            Ok(r) => r,
            Err(e) if opts.skip_errors => {
                log::warn!("skipping csv row {row_no}: {e}");
                report.skipped += 1;
                continue;
            }
            Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidData, e)),
        };
        let mut map = BsonDocument::new();
        for (i, field) in rec.iter().enumerate() {
            let key = headers.get(i).cloned().unwrap_or_else(|| format!("field_{i}"));
            map.insert(key, field_to_bson(field, opts.csv.type_infer));
        }
        collection.insert(map);
        report.inserted += 1;
        if let Some(every) = opts.progress_every
            && every > 0
            && row_no % every == 0
        {
            log::info!("imported {} records (csv)", report.inserted);
        }
    }
    Ok(())
}
