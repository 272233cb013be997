mod command;
mod runner;
mod util;

pub use command::{Command, PipelineSource};
pub use runner::{OutputMode, run, run_with_format};
pub use util::parse_import_format;
