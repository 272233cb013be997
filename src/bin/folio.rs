use clap::{Parser, Subcommand};
use folio::cli::{self as prog_cli, Command, OutputMode, PipelineSource};
use folio::config::{self, AppConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "folio", version, about = "Aggregation pipelines over in-memory document collections", long_about = None)]
struct Cli {
    #[arg(long, help = "Path to a config file (TOML). If omitted, defaults are used.")]
    config: Option<PathBuf>,
    #[arg(long, help = "Directory for rolling log files; logs go to stderr when unset")]
    log_dir: Option<PathBuf>,
    #[arg(long, help = "Log level: error|warn|info|debug|trace")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run a pipeline over a data file; prints NDJSON to stdout")]
    Aggregate {
        #[arg(long, help = "Input file (NDJSON, JSON array or CSV); falls back to data_path from config")]
        data: Option<PathBuf>,
        #[arg(long, conflicts_with_all = ["inline", "sample"], help = "Pipeline JSON file")]
        pipeline: Option<PathBuf>,
        #[arg(long, conflicts_with = "sample", help = "Pipeline JSON text")]
        inline: Option<String>,
        #[arg(long, help = "Built-in sample pipeline name")]
        sample: Option<String>,
        #[arg(long, help = "Format override: ndjson|csv; defaults to auto-detect")]
        format: Option<String>,
        #[arg(long, help = "Print one indented JSON array instead of NDJSON")]
        pretty: bool,
    },
    #[command(about = "List the built-in sample pipelines")]
    Samples,
    #[command(about = "Print a built-in sample pipeline as JSON")]
    Sample {
        name: String,
        #[arg(long)]
        pretty: bool,
    },
    #[command(about = "Print the decade bucket for a year")]
    Decade {
        #[arg(allow_hyphen_values = true)]
        year: i64,
    },
}

fn to_command(cmd: Commands, cfg: &AppConfig) -> Result<(Command, OutputMode), String> {
    let mode = |pretty: bool| if pretty { OutputMode::Pretty } else { OutputMode::Json };
    Ok(match cmd {
        Commands::Aggregate { data, pipeline, inline, sample, format, pretty } => {
            let data = data
                .or_else(|| cfg.data_path.clone())
                .ok_or("no input: pass --data or set data_path in config")?;
            let source = match (pipeline, inline, sample.or_else(|| cfg.default_sample.clone())) {
                (Some(p), _, _) => PipelineSource::File(p),
                (None, Some(json), _) => PipelineSource::Inline(json),
                (None, None, Some(name)) => PipelineSource::Sample(name),
                (None, None, None) => return Err("no pipeline: pass --pipeline, --inline or --sample".into()),
            };
            (Command::Aggregate { data, pipeline: source, format }, mode(pretty))
        }
        Commands::Samples => (Command::Samples, OutputMode::Json),
        Commands::Sample { name, pretty } => (Command::Sample { name }, mode(pretty)),
        Commands::Decade { year } => (Command::Decade { year }, OutputMode::Json),
    })
}

fn main() {
    let cli = Cli::parse();
    let overrides = AppConfig { log_dir: cli.log_dir, log_level: cli.log_level, ..AppConfig::default() };
    let cfg = match config::load(cli.config.as_deref(), overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    if let Err(e) = folio::utils::logger::configure_from_config(&cfg) {
        eprintln!("{e}");
    }
    let (cmd, mode) = match to_command(cli.command, &cfg) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = prog_cli::run_with_format(cmd, mode, &mut out) {
        log::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
