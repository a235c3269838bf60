//! switchtower CLI
//!
//! Analyses a sliced multi-material file and writes the post-processed result.

use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use std::path::PathBuf;

use switchtower::gcode::{PassthroughWriter, TowerAction};
use switchtower::{PostProcessor, Result, SlicerKind};

#[derive(Parser, Debug)]
#[command(name = "switchtower", version, about = "Purge tower post-processor for sliced G-code")]
struct Cli {
    /// Sliced G-code file
    input: PathBuf,

    /// Where to write the processed G-code
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Slicer that produced the file
    #[arg(long, default_value = "kisslicer")]
    slicer: SlicerKind,

    /// Print a JSON report of the layer analysis to stdout
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    info!("switchtower v{}", env!("CARGO_PKG_VERSION"));

    let print = PostProcessor::new(cli.slicer).process_file(&cli.input)?;

    if !print.config().is_version_verified() {
        warn!("Running with an unverified slicer version");
    }
    info!(
        "{} layers, {} tools, {} tower slots ({} switch, {} infill)",
        print.layers().len(),
        print.config().tool_count(),
        print.max_slots(),
        print.action_count(TowerAction::Switch),
        print.action_count(TowerAction::Infill)
    );

    if let Some(output) = &cli.output {
        print.write_to_file(&mut PassthroughWriter::new(), output)?;
        info!("Wrote {}", output.display());
    }

    if cli.json {
        println!("{}", print.report().to_json()?);
    }

    Ok(())
}
