use bson::{Bson, Document, doc};
use folio::aggregate::{
    Accumulator, KeyExpr, Operand, Pipeline, SortSpec, Stage, decade_key, evaluate, group_by, limit, sort_by,
};
use folio::{AggError, Collection, samples};

fn books() -> Vec<Document> {
    vec![
        doc! {"title": "To Kill a Mockingbird", "author": "Harper Lee", "genre": "Fiction", "published_year": 1960, "price": 12.99, "in_stock": true},
        doc! {"title": "1984", "author": "George Orwell", "genre": "Dystopian", "published_year": 1949, "price": 10.99, "in_stock": true},
        doc! {"title": "Animal Farm", "author": "George Orwell", "genre": "Political Satire", "published_year": 1945, "price": 8.5, "in_stock": false},
        doc! {"title": "The Great Gatsby", "author": "F. Scott Fitzgerald", "genre": "Fiction", "published_year": 1925, "price": 9.99, "in_stock": true},
        doc! {"title": "Brave New World", "author": "Aldous Huxley", "genre": "Dystopian", "published_year": 1932, "price": 11.5, "in_stock": false},
        doc! {"title": "The Alchemist", "author": "Paulo Coelho", "genre": "Fiction", "published_year": 1988, "price": 10.5, "in_stock": true},
    ]
}

fn sorted_by_id(mut docs: Vec<Document>) -> Vec<Document> {
    docs.sort_by(|a, b| a.get_str("_id").unwrap_or("").cmp(b.get_str("_id").unwrap_or("")));
    docs
}

#[test]
fn avg_price_by_genre_scenario() {
    let docs = vec![
        doc! {"genre": "Fiction", "price": 10},
        doc! {"genre": "Fiction", "price": 20},
        doc! {"genre": "Sci-Fi", "price": 15},
    ];
    let out = sorted_by_id(evaluate(&docs, &samples::avg_price_by_genre()).unwrap());
    assert_eq!(
        out,
        vec![doc! {"_id": "Fiction", "avgPrice": 15.0}, doc! {"_id": "Sci-Fi", "avgPrice": 15.0}]
    );
}

#[test]
fn top_author_scenario() {
    let docs = vec![doc! {"author": "A"}, doc! {"author": "A"}, doc! {"author": "B"}];
    let out = evaluate(&docs, &samples::top_author()).unwrap();
    assert_eq!(out, vec![doc! {"_id": "A", "count": 2_i64}]);
}

#[test]
fn decade_scenario() {
    assert_eq!(decade_key(1984), "1980s");
    assert_eq!(decade_key(2012), "2010s");
}

#[test]
fn books_by_decade_on_catalog() {
    let out = evaluate(&books(), &samples::books_by_decade()).unwrap();
    let counts: Vec<(String, i64)> = out
        .iter()
        .map(|d| (d.get_str("_id").unwrap().to_string(), d.get_i64("count").unwrap()))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("1960s".to_string(), 1),
            ("1940s".to_string(), 2),
            ("1920s".to_string(), 1),
            ("1930s".to_string(), 1),
            ("1980s".to_string(), 1),
        ]
    );
}

#[test]
fn top_author_on_catalog() {
    let col = Collection::from_documents("books", books());
    let out = col.aggregate(&samples::top_author()).unwrap();
    assert_eq!(out, vec![doc! {"_id": "George Orwell", "count": 2_i64}]);
    assert_eq!(col.len(), 6);
}

#[test]
fn groups_cover_every_document() {
    let docs = books();
    let out = group_by(&docs, &KeyExpr::field("genre"), &[("n".into(), Accumulator::Count)]).unwrap();
    let total: i64 = out.iter().map(|d| d.get_i64("n").unwrap()).sum();
    assert_eq!(total, docs.len() as i64);
}

#[test]
fn sum_of_prices_per_author() {
    let p = Pipeline::default()
        .group(KeyExpr::field("author"), vec![("total", Accumulator::Sum(Operand::Field("price".into())))])
        .sort(vec![SortSpec::desc("total")])
        .limit(1);
    let out = evaluate(&books(), &p).unwrap();
    assert_eq!(out[0].get_str("_id").unwrap(), "George Orwell");
    assert!((out[0].get_f64("total").unwrap() - 19.49).abs() < 1e-9);
}

#[test]
fn sort_then_limit_without_group() {
    let p = Pipeline::default().sort(vec![SortSpec::asc("price")]).limit(2);
    let out = evaluate(&books(), &p).unwrap();
    let titles: Vec<&str> = out.iter().map(|d| d.get_str("title").unwrap()).collect();
    assert_eq!(titles, vec!["Animal Farm", "The Great Gatsby"]);
}

#[test]
fn limit_zero_and_oversized() {
    let docs = books();
    assert!(limit(docs.clone(), 0).unwrap().is_empty());
    assert_eq!(limit(docs.clone(), 100).unwrap(), docs);
}

#[test]
fn negative_limit_fails_before_any_stage_runs() {
    let _g = folio::utils::devlog::enable_thread_sink();
    let p = Pipeline::new(vec![
        Stage::Group { key: KeyExpr::field("genre"), accumulators: vec![] },
        Stage::Limit { count: -1 },
    ]);
    assert!(matches!(evaluate(&books(), &p), Err(AggError::InvalidArgument(_))));
    assert!(folio::utils::devlog::drain().is_empty());
}

#[test]
fn avg_over_non_numeric_price_fails() {
    let mut docs = books();
    docs.push(doc! {"title": "Free Book", "genre": "Fiction", "price": "free"});
    let err = evaluate(&docs, &samples::avg_price_by_genre()).unwrap_err();
    assert!(matches!(err, AggError::InvalidAccumulator { ref field, .. } if field == "price"));
}

#[test]
fn count_needs_no_numeric_field() {
    let docs = vec![doc! {"genre": "Fiction", "price": "free"}, doc! {"genre": "Fiction"}];
    let p = Pipeline::default().group(KeyExpr::field("genre"), vec![("count", Accumulator::Count)]);
    assert_eq!(evaluate(&docs, &p).unwrap(), vec![doc! {"_id": "Fiction", "count": 2_i64}]);
}

#[test]
fn sort_by_descending_is_stable() {
    let docs = vec![
        doc! {"_id": "a", "count": 1},
        doc! {"_id": "b", "count": 3},
        doc! {"_id": "c", "count": 1},
    ];
    let out = sort_by(docs, &[SortSpec::desc("count")]).unwrap();
    let ids: Vec<&str> = out.iter().map(|d| d.get_str("_id").unwrap()).collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
}

#[test]
fn evaluate_leaves_input_untouched() {
    let docs = books();
    let before = docs.clone();
    let _ = evaluate(&docs, &samples::top_author()).unwrap();
    assert_eq!(docs, before);
}

#[test]
fn empty_collection_yields_no_groups() {
    assert!(evaluate(&[], &samples::avg_price_by_genre()).unwrap().is_empty());
    assert_eq!(evaluate(&[], &Pipeline::default()).unwrap(), Vec::<Document>::new());
}

#[test]
fn decade_key_for_three_digit_year() {
    let docs = vec![doc! {"published_year": 987}];
    let out = evaluate(&docs, &samples::books_by_decade()).unwrap();
    assert_eq!(out[0].get("_id"), Some(&Bson::String("9870s".into())));
}

fn decimal(bytes_le: [u8; 16]) -> Bson {
    Bson::Decimal128(bson::Decimal128::from_bytes(bytes_le))
}

// 1.5 as IEEE 754-2008 decimal128 (BID), little-endian.
const DECIMAL_ONE_AND_A_HALF: [u8; 16] = [15, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x3e, 0x30];

#[test]
fn sort_orders_integers_beyond_f64_precision() {
    let base: i64 = 1 << 53;
    let docs = vec![doc! {"n": base}, doc! {"n": base + 1}, doc! {"n": base - 1}];
    let out = evaluate(&docs, &Pipeline::default().sort(vec![SortSpec::desc("n")])).unwrap();
    let ns: Vec<i64> = out.iter().map(|d| d.get_i64("n").unwrap()).collect();
    assert_eq!(ns, vec![base + 1, base, base - 1]);
}

#[test]
fn sort_mixes_integers_and_doubles_exactly() {
    let docs = vec![doc! {"n": i64::MAX}, doc! {"n": 9.3e18}, doc! {"n": i64::MAX - 1}, doc! {"n": -0.5}, doc! {"n": 0}];
    let out = evaluate(&docs, &Pipeline::default().sort(vec![SortSpec::asc("n")])).unwrap();
    let got: Vec<&Bson> = out.iter().map(|d| d.get("n").unwrap()).collect();
    assert_eq!(
        got,
        vec![&Bson::Double(-0.5), &Bson::Int32(0), &Bson::Int64(i64::MAX - 1), &Bson::Int64(i64::MAX), &Bson::Double(9.3e18)]
    );
}

#[test]
fn group_key_merges_large_integral_double() {
    let big: i64 = 10_i64.pow(16);
    let docs = vec![doc! {"k": big}, doc! {"k": 1e16}, doc! {"k": big + 1}];
    let p = Pipeline::default().group(KeyExpr::field("k"), vec![("n", Accumulator::Count)]);
    let out = evaluate(&docs, &p).unwrap();
    assert_eq!(out, vec![doc! {"_id": big, "n": 2_i64}, doc! {"_id": big + 1, "n": 1_i64}]);
}

#[test]
fn sums_overflowing_i64_fall_back_to_double() {
    let docs = vec![doc! {"g": "a", "v": i64::MAX}, doc! {"g": "a", "v": 1_i64}];
    let p = Pipeline::default().group(
        KeyExpr::field("g"),
        vec![
            ("constant", Accumulator::Sum(Operand::Const(i64::MAX))),
            ("field", Accumulator::Sum(Operand::Field("v".into()))),
        ],
    );
    let out = evaluate(&docs, &p).unwrap();
    assert!(matches!(out[0].get("constant"), Some(Bson::Double(_))));
    assert!(matches!(out[0].get("field"), Some(Bson::Double(_))));
}

#[test]
fn decimal128_values_average_and_sort_as_numbers() {
    let docs = vec![doc! {"g": "a", "price": decimal(DECIMAL_ONE_AND_A_HALF)}, doc! {"g": "a", "price": 2}];
    let p = Pipeline::default().group(KeyExpr::field("g"), vec![("avgPrice", Accumulator::Avg("price".into()))]);
    assert_eq!(evaluate(&docs, &p).unwrap()[0].get_f64("avgPrice").unwrap(), 1.75);

    let sorted = evaluate(&docs, &Pipeline::default().sort(vec![SortSpec::desc("price")])).unwrap();
    assert_eq!(sorted[0].get_i32("price").unwrap(), 2);
}
