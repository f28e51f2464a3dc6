//! mcmock CLI
//!
//! Command-line interface for generating C mocks from headers.

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use mcmock_core::{Error, Function, GeneratorConfig};
use mcmock_generator::{
    find_headers, write_runtime, BatchGenerator, FsWriter, MockData, MockGenerator, ProgressPhase,
};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "mcmock")]
#[command(author, version, about = "Generate C mocks from header files", long_about = None)]
struct Cli {
    /// Log more (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate mock_<name>.h and mock_<name>.c for headers
    Generate {
        /// Header files to mock
        #[arg(short = 'm', long = "mock", value_name = "HEADER", num_args = 1..)]
        headers: Vec<PathBuf>,

        /// Directories searched recursively; every header found is mocked
        #[arg(short, long, value_name = "DIR", num_args = 1..)]
        source: Vec<PathBuf>,

        /// Additional directories searched for included headers
        #[arg(short, long, value_name = "DIR", num_args = 1..)]
        include: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,

        /// Worker threads (default: one per core)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Show the functions and mock APIs derived from a header
    Inspect {
        /// Header file
        #[arg(value_name = "HEADER")]
        header: PathBuf,

        /// Additional directories searched for included headers
        #[arg(short, long, value_name = "DIR", num_args = 1..)]
        include: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Write the mcmock.h / mcmock.c runtime the generated mocks link against
    Runtime {
        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            headers,
            source,
            include,
            output,
            jobs,
        } => collect_config(headers, &source, include, output)
            .and_then(|config| cmd_generate(&config, jobs)),
        Commands::Inspect {
            header,
            include,
            format,
        } => cmd_inspect(&header, include, format).map(|()| true),
        Commands::Runtime { output } => cmd_runtime(&output).map(|()| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("mcmock: error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Build and validate the run configuration before any header is parsed
fn collect_config(
    mut headers: Vec<PathBuf>,
    source_dirs: &[PathBuf],
    include_paths: Vec<PathBuf>,
    output_dir: PathBuf,
) -> Result<GeneratorConfig> {
    for dir in source_dirs {
        if !dir.is_dir() {
            return Err(Error::Config(format!(
                "source directory {} does not exist",
                dir.display()
            ))
            .into());
        }
        headers.extend(find_headers(dir));
    }
    // The same header may be named by -m and found again by -s
    let mut seen = HashSet::new();
    headers.retain(|header| {
        let key = header.canonicalize().unwrap_or_else(|_| header.clone());
        seen.insert(key)
    });

    let config = GeneratorConfig {
        headers,
        include_paths,
        output_dir,
    };
    config.validate()?;
    debug!("Configuration: {:?}", config);
    Ok(config)
}

/// Returns whether every header was mocked
fn cmd_generate(config: &GeneratorConfig, jobs: Option<usize>) -> Result<bool> {
    let mut batch =
        BatchGenerator::new(MockGenerator::from_config(config)).with_progress(|event| {
            if event.phase == ProgressPhase::Generating {
                info!("[{}/{}] {}", event.current, event.total, event.message);
            }
        });
    if let Some(jobs) = jobs {
        batch = batch.with_jobs(jobs);
    }

    let mut failed = 0;
    for (header, result) in batch.generate_all(&config.headers)? {
        match result {
            Ok(files) => {
                for warning in &files.warnings {
                    eprintln!("mcmock: warning: {}: {}", header.display(), warning);
                }
                println!(
                    "{} -> {}, {}",
                    header.display(),
                    files.header_path.display(),
                    files.source_path.display()
                );
            }
            Err(e) => {
                failed += 1;
                eprintln!("mcmock: error: {}: {}", header.display(), e);
            }
        }
    }
    Ok(failed == 0)
}

fn cmd_runtime(output: &Path) -> Result<()> {
    if !output.is_dir() {
        return Err(Error::Config(format!(
            "output directory {} does not exist",
            output.display()
        ))
        .into());
    }
    let (header, source) = write_runtime(&FsWriter, output)?;
    println!("{}, {}", header.display(), source.display());
    Ok(())
}

#[derive(Serialize)]
struct InspectReport<'a> {
    header: String,
    includes: Vec<&'a str>,
    functions: &'a [Function],
    mock: &'a MockData,
    warnings: Vec<String>,
}

fn cmd_inspect(header: &Path, include_paths: Vec<PathBuf>, format: Format) -> Result<()> {
    let generator = MockGenerator::new(include_paths, ".");
    let plan = generator.plan(header)?;
    let parsed = &plan.parsed;

    let report = InspectReport {
        header: header.display().to_string(),
        includes: parsed.includes.iter().map(|h| h.name()).collect(),
        functions: &parsed.functions,
        mock: &plan.data,
        warnings: parsed.warnings.iter().map(ToString::to_string).collect(),
    };

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &InspectReport<'_>) {
    println!("{}", report.header);
    if !report.includes.is_empty() {
        println!("  includes: {}", report.includes.join(", "));
    }
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }

    for function in report.functions {
        println!();
        println!(
            "  {} {}({})",
            function.return_type,
            function.name,
            function.parameter_list()
        );
        for param in &function.params {
            println!("      {:<16} {:?}", param.name, param.kind);
        }
        for api in report.mock.apis_for(&function.name) {
            println!("    {}({})", api.name(), api.signature.parameter_list());
        }
    }
}
