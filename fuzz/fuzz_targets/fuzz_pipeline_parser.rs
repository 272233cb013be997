#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    let Ok(s) = std::str::from_utf8(data) else { return };
    // Parsing and evaluating arbitrary pipelines should error, never panic
    let Ok(pipeline) = folio::aggregate::parse_pipeline_json(s) else { return };
    let docs = vec![
        bson::doc! {"author": "a", "published_year": 1949, "price": 10.5},
        bson::doc! {"author": "b", "published_year": 987, "price": "free"},
        bson::doc! {"title": "x", "nested": {"k": [1, 2]}},
    ];
    let _ = folio::aggregate::evaluate(&docs, &pipeline);
});
