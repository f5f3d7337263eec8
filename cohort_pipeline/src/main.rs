//! Command-line entry point of the cohort reasoning pipeline.

use clap::Parser;
use cohort_pipeline::{Pipeline, PipelineConfig, PipelineError};
use log::{error, info, LevelFilter};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(
    name = "cohort-pipeline",
    version,
    about = "Infer subset and attraction relationships over patient gene-expression data."
)]
struct Args {
    /// Directory of knowledge-base (.scm) files [default: ./cancer_data/]
    #[arg(long)]
    datapath: Option<PathBuf>,

    /// Results directory [default: ./results/cancer-<today>/]
    #[arg(long)]
    outputpath: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(args: Args) -> Result<PathBuf, PipelineError> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(datapath) = args.datapath {
        config.data_path = datapath;
    }
    if let Some(outputpath) = args.outputpath {
        config.output_path = Some(outputpath);
    }

    let output_dir = config.output_dir(chrono::Local::now().date_naive());
    info!("data path {}", config.data_path.display());

    let mut pipeline = Pipeline::from_config(config, output_dir)?;
    let summary = pipeline.run()?;

    info!(
        "{} patients retained ({} filtered out), {} subset and {} attraction links exported",
        summary.total_patients,
        summary.patients_removed.len(),
        summary.exported.subset_links,
        summary.exported.attraction_links
    );
    Ok(summary.output_dir)
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(output_dir) => println!("Output path {}", output_dir.display()),
        Err(e) => {
            error!("{}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                error!("  caused by: {}", cause);
                source = cause.source();
            }
            process::exit(1);
        }
    }
}
