use clap::Parser;
use std::path::PathBuf;

use detsift::summary::{format_table, write_summary};
use detsift::{SortBy, read_artifact, summarize};

#[derive(Parser)]
#[command(name = "detsift-summary")]
#[command(about = "Summarize detection JSON as per-class statistics")]
struct Cli {
    /// Detection JSON (exported or refined)
    #[arg(long, value_name = "FILE")]
    input: PathBuf,

    /// Optional output file (.csv or .json); prints only when omitted
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Column used to sort the summary (descending)
    #[arg(long, value_enum, default_value = "num-detections")]
    sort_by: SortBy,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let sets = read_artifact(&args.input)?;
    let rows = summarize(&sets, args.sort_by);

    if rows.is_empty() {
        println!("No detections to summarise.");
    } else {
        print!("{}", format_table(&rows));
    }

    if let Some(output) = &args.output {
        write_summary(&rows, output)?;
        println!("Summary saved to {}", output.display());
    }

    Ok(())
}
