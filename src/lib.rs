//! Aggregation pipelines (`$group`, `$sort`, `$limit`) evaluated over an
//! in-memory collection of BSON documents.
//!
//! ```
//! use bson::doc;
//! use folio::aggregate::evaluate;
//!
//! let books = vec![
//!     doc! {"author": "George Orwell", "title": "1984"},
//!     doc! {"author": "George Orwell", "title": "Animal Farm"},
//!     doc! {"author": "Harper Lee", "title": "To Kill a Mockingbird"},
//! ];
//! let top = evaluate(&books, &folio::samples::top_author()).unwrap();
//! assert_eq!(top, vec![doc! {"_id": "George Orwell", "count": 2_i64}]);
//! ```

pub mod aggregate;
pub mod cli;
pub mod collection;
pub mod config;
pub mod errors;
pub mod import;
pub mod samples;
pub mod utils;

pub use aggregate::{Pipeline, Stage, decade_key, evaluate};
pub use collection::Collection;
pub use errors::AggError;
