use clap::Parser;
use std::path::PathBuf;

use detsift::{ClassTable, Exporter, write_artifact};

#[derive(Parser)]
#[command(name = "detsift-export")]
#[command(about = "Export a detector run's label output to pixel-space detection JSON")]
struct Cli {
    /// Directory containing the detector run (images + labels)
    #[arg(long, value_name = "DIR")]
    runs_dir: PathBuf,

    /// Destination JSON file
    #[arg(long, value_name = "FILE")]
    output: PathBuf,

    /// Explicit labels directory (defaults to <runs-dir>/labels or the first
    /// nested labels directory)
    #[arg(long, value_name = "DIR")]
    labels_dir: Option<PathBuf>,

    /// Class names file (one per line, index = class id)
    #[arg(long, value_name = "FILE")]
    class_names: Option<PathBuf>,

    /// Store image paths relative to the runs directory
    #[arg(long)]
    relative_paths: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let mut exporter = Exporter::new(&args.runs_dir)
        .with_relative_paths(args.relative_paths)
        .with_verbose(args.verbose);

    if let Some(labels_dir) = args.labels_dir {
        exporter = exporter.with_labels_dir(labels_dir);
    }
    if let Some(class_names) = &args.class_names {
        exporter = exporter.with_class_table(ClassTable::load(class_names)?);
    }

    let outcome = exporter.run()?;

    for failure in &outcome.failures {
        eprintln!("Warning: {}", failure);
    }
    if outcome.sets.is_empty() {
        eprintln!("Warning: no detections exported; check the runs directory and label files.");
    }

    write_artifact(&args.output, &outcome.sets)?;

    println!(
        "Exported {} image entries to {}",
        outcome.sets.len(),
        args.output.display()
    );
    if !outcome.failures.is_empty() {
        println!(
            "Skipped {} label files (see warnings above)",
            outcome.failures.len()
        );
    }

    Ok(())
}
