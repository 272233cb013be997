use std::io::Write;

use super::command::{Command, PipelineSource};
use super::util::parse_import_format;
use crate::aggregate::{self, Pipeline, decade_key, parse_pipeline_json, pipeline_to_json};
use crate::errors::AggError;
use crate::import::{ImportOptions, load_file};
use crate::samples;
use crate::utils::json::document_to_json_line;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputMode {
    /// One compact JSON document per line.
    Json,
    /// A single indented JSON array.
    Pretty,
}

pub fn run<W: Write>(cmd: Command, out: &mut W) -> Result<(), AggError> {
    run_with_format(cmd, OutputMode::Json, out)
}

pub fn run_with_format<W: Write>(cmd: Command, mode: OutputMode, out: &mut W) -> Result<(), AggError> {
    match cmd {
        Command::Aggregate { data, pipeline, format } => {
            let pipeline = resolve_pipeline(&pipeline)?;
            let opts = ImportOptions { format: parse_import_format(format.as_deref())?, ..ImportOptions::default() };
            let (collection, report) = load_file(&data, &opts)?;
            if report.skipped > 0 {
                log::warn!("skipped {} malformed records in {}", report.skipped, data.display());
            }
            let results = collection.aggregate(&pipeline)?;
            match mode {
                OutputMode::Json => {
                    for doc in &results {
                        writeln!(out, "{}", document_to_json_line(doc)?)?;
                    }
                }
                OutputMode::Pretty => writeln!(out, "{}", serde_json::to_string_pretty(&results)?)?,
            }
            Ok(())
        }
        Command::Samples => {
            for name in samples::NAMES {
                writeln!(out, "{name}")?;
            }
            Ok(())
        }
        Command::Sample { name } => {
            let p = samples::by_name(&name).ok_or_else(|| unknown_sample(&name))?;
            let json = pipeline_to_json(&p);
            match mode {
                OutputMode::Json => writeln!(out, "{json}")?,
                OutputMode::Pretty => writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?,
            }
            Ok(())
        }
        Command::Decade { year } => {
            writeln!(out, "{}", decade_key(year))?;
            Ok(())
        }
    }
}

fn unknown_sample(name: &str) -> AggError {
    AggError::InvalidArgument(format!("unknown sample '{name}' (expected one of: {})", samples::NAMES.join(", ")))
}

fn resolve_pipeline(src: &PipelineSource) -> Result<Pipeline, AggError> {
    let p = match src {
        PipelineSource::File(path) => parse_pipeline_json(&std::fs::read_to_string(path)?)?,
        PipelineSource::Inline(json) => parse_pipeline_json(json)?,
        PipelineSource::Sample(name) => samples::by_name(name).ok_or_else(|| unknown_sample(name))?,
    };
    aggregate::validate(&p)?;
    Ok(p)
}
