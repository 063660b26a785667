use anyhow::Context;
use clap::{Parser, Subcommand};
use jurisbot::config::FileConfig;
use jurisbot::loader;
use jurisbot::prelude::*;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "jurisbot.yml";

/// Keyword frequency analysis over STF/STJ decision summaries
#[derive(Parser, Debug)]
#[command(name = "jurisbot")]
#[command(about = "Count keywords in STF/STJ decision summaries")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load decisions, count keywords and print a JSON report
    Analyze {
        /// Config file (default: ./jurisbot.yml when present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// STF export location (default: ./corte_aberta_stf.xlsx, or JURISBOT_DATA env var)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Court: STF (A), STJ (B) or BOTH (AMBOS)
        #[arg(long)]
        court: Option<String>,

        /// Number of synthetic STJ decisions (50 to 1000, step 50)
        #[arg(long)]
        count: Option<usize>,

        /// Comma-separated keywords
        #[arg(short, long)]
        keywords: Option<String>,

        /// Table on disk to use when the STF export is missing
        #[arg(long, conflicts_with = "upload")]
        alternate: Option<PathBuf>,

        /// Like --alternate, but the table is read into memory as an upload
        #[arg(long)]
        upload: Option<PathBuf>,

        /// Seed for synthetic data and sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Number of decisions in the sample
        #[arg(long)]
        sample_size: Option<usize>,

        /// Number of outcome labels in the distribution
        #[arg(long)]
        top: Option<usize>,

        /// Read one keyword list per line from stdin, one report per line
        #[arg(long)]
        stdin: bool,

        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Show how a table's columns resolve to summary, outcome and id
    Columns {
        /// Path to an XLSX, XLS or CSV export
        path: PathBuf,
    },
}

fn print_available_commands() {
    println!("Available commands:");
    println!("  analyze   Load decisions, count keywords and print a JSON report");
    println!("  columns   Show how a table's columns resolve");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jurisbot=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_file_config(path: Option<PathBuf>) -> anyhow::Result<Option<FileConfig>> {
    // An explicit path must exist; the implicit one is optional
    let path = match path {
        Some(path) => path,
        None if Path::new(CONFIG_FILE).exists() => PathBuf::from(CONFIG_FILE),
        None => return Ok(None),
    };
    let file = FileConfig::load(&path)
        .with_context(|| format!("Failed to load config file: {}", path.display()))?;
    Ok(Some(file))
}

/// Advisory messages go to stderr so stdout stays JSON
fn print_notices(report: &AnalysisReport) {
    if report.is_no_data() {
        eprintln!("No data available for court {}", report.court);
    }
    for notice in &report.notices {
        eprintln!("Notice: {}", notice);
    }
}

fn print_report(report: &AnalysisReport, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    println!("{}", json);
    Ok(())
}

async fn run_analyze_command(cmd: Command) -> anyhow::Result<()> {
    let Command::Analyze {
        config,
        data,
        court,
        count,
        keywords,
        alternate,
        upload,
        seed,
        sample_size,
        top,
        stdin,
        pretty,
    } = cmd
    else {
        unreachable!()
    };

    // Precedence: flags, then environment, then config file, then defaults
    let mut builder = ConfigBuilder::default();
    if let Some(file) = load_file_config(config)? {
        builder = builder.apply_file(file)?;
    }
    if let Ok(data) = std::env::var("JURISBOT_DATA") {
        builder = builder.default_source(data);
    }
    if let Some(data) = data {
        builder = builder.default_source(data);
    }
    if let Some(court) = court {
        builder = builder.court_str(&court)?;
    }
    if let Some(count) = count {
        builder = builder.synthetic_count(count);
    }
    if let Some(keywords) = keywords {
        builder = builder.keywords(keywords);
    }
    if let Some(path) = alternate {
        builder = builder.alternate_source(TableSource::path(path));
    }
    if let Some(path) = upload {
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read upload: {}", path.display()))?;
        let name = path.display().to_string();
        builder = builder.alternate_source(TableSource::bytes(name, bytes));
    }
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    if let Some(size) = sample_size {
        builder = builder.sample_size(size);
    }
    if let Some(top) = top {
        builder = builder.top_outcomes(top);
    }

    let pipeline = AnalysisPipeline::new(builder.build()?);

    if stdin {
        let stdin = io::stdin();
        let lines = stdin
            .lock()
            .lines()
            .enumerate()
            .filter_map(|(index, line)| match line {
                Ok(line) => Some(line),
                Err(e) => {
                    tracing::warn!(line = index + 1, error = %e, "skipping unreadable stdin line");
                    None
                }
            })
            .filter(|line| !line.trim().is_empty());

        let mut stream = pipeline.process_keyword_lines(lines);
        while let Some(report) = stream.next().await {
            print_notices(&report);
            print_report(&report, pretty)?;
        }
    } else {
        let report = pipeline.run().await;
        print_notices(&report);
        print_report(&report, pretty)?;
    }

    Ok(())
}

fn run_columns_command(path: PathBuf) -> anyhow::Result<()> {
    let layout = loader::inspect_columns(&TableSource::path(&path))
        .with_context(|| format!("Failed to inspect columns of {}", path.display()))?;
    println!("{}", serde_json::to_string_pretty(&layout)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    match args.command {
        Some(cmd @ Command::Analyze { .. }) => run_analyze_command(cmd).await,
        Some(Command::Columns { path }) => run_columns_command(path),
        None => {
            print_available_commands();
            Ok(())
        }
    }
}
