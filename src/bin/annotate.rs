use clap::Parser;
use image::ImageReader;
use std::path::PathBuf;

use detsift::Annotator;
use detsift::annotate::{default_output_path, find_set_for_image};
use detsift::read_artifact;

#[derive(Parser)]
#[command(name = "detsift-annotate")]
#[command(about = "Draw recorded detections back onto their source image")]
struct Cli {
    /// Detection JSON (exported or refined)
    #[arg(long, value_name = "FILE")]
    detections: PathBuf,

    /// Source image to annotate
    #[arg(long, value_name = "IMAGE")]
    image: PathBuf,

    /// Output path (default: <image-stem>_annotated.png beside the input)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Label font file (TTF/OTF); common system fonts are probed when omitted
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Draw an RFC 3339 timestamp footer
    #[arg(long)]
    timestamp: bool,

    /// Box outline thickness in pixels
    #[arg(long, default_value_t = 3, value_name = "PX")]
    thickness: u32,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let sets = read_artifact(&args.detections)?;
    let set = find_set_for_image(&sets, &args.image).ok_or_else(|| {
        anyhow::anyhow!(
            "No detections recorded for {} in {}",
            args.image.display(),
            args.detections.display()
        )
    })?;

    if args.verbose {
        println!("Loading image: {:?}", args.image);
    }
    let img = ImageReader::open(&args.image)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;

    let mut annotator = Annotator::new()
        .with_thickness(args.thickness)
        .with_timestamp(args.timestamp)
        .with_verbose(args.verbose);
    annotator = match &args.font {
        Some(font) => annotator.with_font_path(font)?,
        None => annotator.with_system_font(),
    };

    if args.verbose {
        println!("Drawing {} detections...", set.detections.len());
    }
    let annotated = annotator.annotate(&img, set)?;

    let output = args.output.unwrap_or_else(|| default_output_path(&args.image));
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    annotated.save(&output)?;

    println!("Annotation completed");
    println!("  Input : {}", args.image.display());
    println!("  Output: {}", output.display());
    println!("  Boxes : {}", set.detections.len());

    Ok(())
}
