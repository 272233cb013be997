use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use super::csv::import_csv;
use super::detect::detect_format;
use super::ndjson::import_ndjson;
use super::options::{ImportFormat, ImportOptions, ImportReport};
use crate::collection::Collection;

/// Loads a data file into a fresh collection named `opts.collection`.
///
/// # Errors
/// Returns I/O errors on read failures and parse errors (wrapped as `InvalidData`).
pub fn load_file<P: AsRef<Path>>(
    path: P,
    opts: &ImportOptions,
) -> io::Result<(Collection, ImportReport)> {
    log::info!("import: path={}, collection={}", path.as_ref().display(), opts.collection);
    let file = File::open(&path)?;
    let mut reader = BufReader::new(file);
    let format = match opts.format {
        ImportFormat::Auto => detect_format(&mut reader, path.as_ref())?,
        other => other,
    };
    let mut collection = Collection::new(opts.collection.clone());
    let report = load_reader(reader, format, opts, &mut collection)?;
    log::info!(
        "import: collection={} inserted={} skipped={}",
        collection.name(),
        report.inserted,
        report.skipped
    );
    Ok((collection, report))
}

/// Appends records from an arbitrary reader to `collection`.
///
/// # Errors
/// Returns I/O errors on read failures and parse errors (`InvalidData`).
/// `ImportFormat::Auto` is rejected as `InvalidInput`: resolve it with
/// `detect_format` first.
pub fn load_reader<R: Read>(
    reader: R,
    format: ImportFormat,
    opts: &ImportOptions,
    collection: &mut Collection,
) -> io::Result<ImportReport> {
    let mut report = ImportReport::default();
    match format {
        ImportFormat::Ndjson => import_ndjson(collection, reader, opts, &mut report)?,
        ImportFormat::Csv => import_csv(collection, reader, opts, &mut report)?,
        ImportFormat::Auto => {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "format must be resolved before reading"));
        }
    }
    Ok(report)
}
