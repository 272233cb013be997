// Submodules for separation of concerns
mod eval;
mod exec;
mod expr;
mod parse;
mod types;

// Public API re-exports
pub use eval::{compare_bson, compare_docs, get_path};
pub use exec::{evaluate, group_by, limit, sort_by, validate};
pub use expr::{decade_key, eval_key, substr_chars};
pub use parse::{StageSerde, parse_pipeline_json, pipeline_to_json};
pub use types::{Accumulator, KeyExpr, Operand, Order, Pipeline, SortSpec, Stage};
