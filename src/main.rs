use clap::{Parser, Subcommand, ValueEnum};
use image::{DynamicImage, ImageReader};
use std::path::{Path, PathBuf};

use imtools::contours::{find_contour_corners, find_external_contours, rotated_bounding_rectangle, sort_contours};
use imtools::features::{connected_components, extract_largest_component, find_colour, histogram_peak, Connectivity, TargetColour};
use imtools::geometry::fit_regular_hexagon;
use imtools::segmentation::preprocessing::threshold;
use imtools::segmentation::steps::WatershedStep;
use imtools::{Pipeline, ThresholdMode, ToolConfig};

#[derive(Parser)]
#[command(name = "imtools")]
#[command(about = "Segment images and fit simple shapes to what they contain")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON file overriding the default parameters
    #[arg(long, value_name = "JSON", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watershed segmentation; saves the image with region boundaries painted
    Watershed {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        #[arg(short, long, value_name = "OUT", default_value = "watershed.png")]
        output: PathBuf,

        /// Save debug outputs to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,
    },
    /// Print statistics for every connected component of the thresholded image
    Components {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        #[arg(long, value_enum, default_value = "8")]
        connectivity: ConnectivityArg,
    },
    /// Save a mask of the largest connected component
    Largest {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        #[arg(short, long, value_name = "OUT")]
        output: PathBuf,
    },
    /// Print the most common intensity, ignoring near-black pixels
    Peak {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,
    },
    /// Save a mask of pixels bluer than the dominant colour
    Blue {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        #[arg(short, long, value_name = "OUT")]
        output: PathBuf,
    },
    /// Print rotated rectangles, corners and hexagon fits of the objects
    Shapes {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        /// Number of corners to look for
        #[arg(long, default_value_t = 6)]
        sides: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ConnectivityArg {
    #[value(name = "4")]
    Four,
    #[value(name = "8")]
    Eight,
}

impl From<ConnectivityArg> for Connectivity {
    fn from(arg: ConnectivityArg) -> Self {
        match arg {
            ConnectivityArg::Four => Connectivity::Four,
            ConnectivityArg::Eight => Connectivity::Eight,
        }
    }
}

fn load_image(path: &Path) -> anyhow::Result<DynamicImage> {
    log::info!("Loading image: {:?}", path);
    let img = ImageReader::open(path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    log::info!("Image loaded: {}x{}", img.width(), img.height());
    Ok(img)
}

fn otsu_mask(img: &DynamicImage) -> image::GrayImage {
    threshold(&img.to_luma8(), None, ThresholdMode::Binary)
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &args.config {
        Some(path) => ToolConfig::load(path)?,
        None => ToolConfig::default(),
    };

    match args.command {
        Command::Watershed { image_path, output, debug_out } => {
            let img = load_image(&image_path)?;

            let mut pipeline = Pipeline::new().add_step_boxed(Box::new(WatershedStep {
                config: config.watershed.clone(),
                emit_regions: false,
            }));
            if let Some(debug_dir) = debug_out {
                pipeline = pipeline.with_debug(debug_dir)?;
            }

            let results = pipeline.run(img)?;
            for item in &results {
                item.image
                    .save(&output)
                    .map_err(|e| anyhow::anyhow!("Failed to save {}: {}", output.display(), e))?;
                println!("Regions: {}", item.get_int("seeds").unwrap_or(0));
                println!("Saved annotated image to {}", output.display());
            }
        }
        Command::Components { image_path, connectivity } => {
            let img = load_image(&image_path)?;
            let components = connected_components(&otsu_mask(&img), connectivity.into());

            println!("Labels (including background): {}", components.num_labels());
            for (label, s) in components.foreground() {
                println!(
                    "  {:>4}: area {:>7} box ({}, {}) {}x{} centroid ({:.1}, {:.1})",
                    label, s.area, s.left, s.top, s.width, s.height, s.centroid.x, s.centroid.y
                );
            }
        }
        Command::Largest { image_path, output } => {
            let img = load_image(&image_path)?;
            let mask = extract_largest_component(&otsu_mask(&img))?;
            mask.save(&output)
                .map_err(|e| anyhow::anyhow!("Failed to save {}: {}", output.display(), e))?;
            println!("Saved largest component to {}", output.display());
        }
        Command::Peak { image_path } => {
            let img = load_image(&image_path)?;
            match histogram_peak(&img.to_luma8(), config.peak) {
                Some(peak) => println!("Peak: {}", peak),
                None => println!("Peak range [{}, {}) is empty", config.peak.lower, config.peak.upper),
            }
        }
        Command::Blue { image_path, output } => {
            let img = load_image(&image_path)?;
            let mask = find_colour(&img.to_rgb8(), TargetColour::Blue, config.colour).ok_or_else(|| {
                anyhow::anyhow!(
                    "Peak range [{}, {}) is empty",
                    config.colour.peak.lower,
                    config.colour.peak.upper
                )
            })?;
            mask.save(&output)
                .map_err(|e| anyhow::anyhow!("Failed to save {}: {}", output.display(), e))?;
            println!("Saved blue mask to {}", output.display());
        }
        Command::Shapes { image_path, sides } => {
            let img = load_image(&image_path)?;
            let contours = sort_contours(find_external_contours(&otsu_mask(&img)));

            println!("\n=== Shapes ===");
            println!("Objects: {}", contours.len());
            for (i, contour) in contours.iter().enumerate() {
                let rect = rotated_bounding_rectangle(contour)?;
                println!(
                    "\n  Object {} ({} points): rect at ({:.1}, {:.1}) {:.1}x{:.1} angle {:.1}",
                    i + 1,
                    contour.len(),
                    rect.center.x,
                    rect.center.y,
                    rect.length,
                    rect.width,
                    rect.angle
                );

                match find_contour_corners(contour, sides, sides == 6) {
                    Ok((corners, _)) => {
                        let points: Vec<String> = corners
                            .iter()
                            .map(|&idx| format!("({:.0}, {:.0})", contour.points[idx].x, contour.points[idx].y))
                            .collect();
                        println!("    corners: {}", points.join(" "));
                    }
                    Err(e) => println!("    corners: {}", e),
                }

                match fit_regular_hexagon(contour, &config.hex_fit) {
                    Ok(hex) => println!(
                        "    hexagon: centre ({:.1}, {:.1}) radius {:.1} rotation {:.3}{}",
                        hex.center.x,
                        hex.center.y,
                        hex.radius,
                        hex.rotation,
                        if hex.converged { "" } else { " (not converged)" }
                    ),
                    Err(e) => println!("    hexagon: {}", e),
                }
            }
        }
    }

    Ok(())
}
