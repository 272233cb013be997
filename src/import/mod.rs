mod csv;
mod detect;
mod loader;
mod ndjson;
mod options;
mod util;

pub use detect::detect_format;
pub use loader::{load_file, load_reader};
pub use options::{CsvOptions, ImportFormat, ImportOptions, ImportReport};
