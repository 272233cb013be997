use std::path::PathBuf;

/// Where an `Aggregate` command gets its pipeline from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineSource {
    File(PathBuf),
    Inline(String),
    Sample(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Aggregate { data: PathBuf, pipeline: PipelineSource, format: Option<String> },
    Samples,
    Sample { name: String },
    Decade { year: i64 },
}
