#![no_main]
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    if data.len() > 16384 { return; }
    let opts = folio::import::ImportOptions { skip_errors: true, ..Default::default() };
    let mut col = folio::Collection::new("fuzz");
    let _ = folio::import::load_reader(Cursor::new(data), folio::import::ImportFormat::Csv, &opts, &mut col);
});
