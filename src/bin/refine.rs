use clap::Parser;
use std::path::PathBuf;

use detsift::{AllowList, ClassTable, Refiner, read_artifact, write_artifact};

#[derive(Parser)]
#[command(name = "detsift-refine")]
#[command(about = "Refine detection JSON by confidence and class filters")]
struct Cli {
    /// Source JSON produced by detsift-export
    #[arg(long, value_name = "FILE")]
    input: PathBuf,

    /// Destination JSON file
    #[arg(long, value_name = "FILE")]
    output: PathBuf,

    /// Class names file from the detector's model artifact (one per line,
    /// index = class id)
    #[arg(long, value_name = "FILE")]
    class_names: PathBuf,

    /// Minimum confidence threshold (inclusive)
    #[arg(long, default_value_t = 0.0, value_name = "CONF")]
    min_conf: f32,

    /// Comma-separated class-name filter (keeps only listed classes)
    #[arg(long, value_name = "NAMES")]
    classes: Option<String>,

    /// Skip images with zero detections after filtering
    #[arg(long)]
    drop_empty: bool,

    /// Sort detections by confidence descending (default keeps input order)
    #[arg(long)]
    sort_desc: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let table = ClassTable::load(&args.class_names)?;
    let mut refiner = Refiner::new(table, args.min_conf)?
        .with_drop_empty(args.drop_empty)
        .with_sort_desc(args.sort_desc)
        .with_verbose(args.verbose);

    if let Some(classes) = &args.classes {
        refiner = refiner.with_allow_list(AllowList::parse(classes)?);
    }

    let sets = read_artifact(&args.input)?;
    let (refined, report) = refiner.run(sets);

    if report.dropped_unresolved > 0 {
        eprintln!(
            "Warning: class filter discarded {} detections whose class id has no name in the table",
            report.dropped_unresolved
        );
    }
    if refined.is_empty() {
        eprintln!("Warning: no records remaining after refinement.");
    }

    write_artifact(&args.output, &refined)?;

    println!("Saved refined detections to {}", args.output.display());
    println!(
        "  Images: {} in, {} out",
        report.images_in, report.images_out
    );
    println!(
        "  Detections: {} in, {} kept",
        report.detections_in, report.detections_out
    );
    println!("  Dropped by confidence: {}", report.dropped_confidence);
    println!("  Dropped by class filter: {}", report.dropped_class);
    if report.unresolved_names > 0 {
        println!("  Unresolved class ids: {}", report.unresolved_names);
    }

    Ok(())
}
