//! The bookstore aggregation examples as ready-made pipelines.

use crate::aggregate::{Accumulator, KeyExpr, Operand, Pipeline, SortSpec};

pub const NAMES: &[&str] = &["avg-price-by-genre", "top-author", "books-by-decade"];

/// Average price per genre.
#[must_use]
pub fn avg_price_by_genre() -> Pipeline {
    Pipeline::default().group(KeyExpr::field("genre"), vec![("avgPrice", Accumulator::Avg("price".into()))])
}

/// The author with the most books.
#[must_use]
pub fn top_author() -> Pipeline {
    Pipeline::default()
        .group(KeyExpr::field("author"), vec![("count", Accumulator::Sum(Operand::Const(1)))])
        .sort(vec![SortSpec::desc("count")])
        .limit(1)
}

/// Book count per publication decade, bucketed as `"1980s"`.
#[must_use]
pub fn books_by_decade() -> Pipeline {
    Pipeline::default().group(
        KeyExpr::decade_of("published_year"),
        vec![("count", Accumulator::Sum(Operand::Const(1)))],
    )
}

#[must_use]
pub fn by_name(name: &str) -> Option<Pipeline> {
    match name {
        "avg-price-by-genre" => Some(avg_price_by_genre()),
        "top-author" => Some(top_author()),
        "books-by-decade" => Some(books_by_decade()),
        _ => None,
    }
}
