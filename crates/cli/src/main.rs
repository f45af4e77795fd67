//! Canopy CLI - individual tree detection from height rasters

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use canopy_algorithms::canopy::{
    align_grids, build_height_model, crown_polygons, tree_points, CrownParams, DetectionParams,
    DetectionReport, TreeDetector,
};
use canopy_core::io::{read_geotiff, write_geojson, write_geotiff};
use canopy_core::{Raster, CRS};
use canopy_parallel::ProcessingMode;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "canopy")]
#[command(author, version, about = "Individual tree detection from canopy height rasters", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Worker threads (1 runs sequentially, default uses all cores)
    #[arg(short, long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Build a canopy height model (surface minus ground)
    Chm {
        /// Ground elevation raster
        ground: PathBuf,
        /// Canopy surface raster
        surface: PathBuf,
        /// Output GeoTIFF
        output: PathBuf,
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Detect individual trees and write them as GeoJSON points
    Detect {
        /// Ground elevation raster
        ground: PathBuf,
        /// Canopy surface raster
        surface: PathBuf,
        /// Output GeoJSON with one point per tree
        output: PathBuf,
        /// Also write circular crown polygons to this GeoJSON file
        #[arg(long)]
        crowns: Option<PathBuf>,
        /// Crown diameter as a fraction of tree height
        #[arg(long, default_value = "0.15")]
        crown_k: f64,
        /// Vertices per crown polygon
        #[arg(long, default_value = "36")]
        crown_segments: usize,
        #[command(flatten)]
        params: ParamArgs,
    },
}

/// Detection parameter overrides; unset flags keep the file or default value
#[derive(Args)]
struct ParamArgs {
    /// JSON parameter file
    #[arg(short, long)]
    params: Option<PathBuf>,
    /// Ground resolution in map units (derived from the grid when omitted)
    #[arg(long)]
    pixel_size: Option<f64>,
    /// EPSG code expected for both inputs
    #[arg(long)]
    epsg: Option<u32>,
    /// Tile edge length in cells
    #[arg(long)]
    tile_size: Option<usize>,
    /// Context cells read around each tile
    #[arg(long)]
    tile_overlap: Option<usize>,
    /// Edge of the denoise window
    #[arg(long)]
    denoise_window: Option<usize>,
    /// Smallest local-maximum window
    #[arg(long)]
    min_window: Option<usize>,
    /// Standard deviations below the mean for the marker floor
    #[arg(long)]
    threshold_std_factor: Option<f64>,
    /// Minimum tree height (-inf keeps only the relative floor)
    #[arg(long, allow_hyphen_values = true)]
    min_tree_height: Option<f64>,
    /// Crown cut-off as a fraction of the segment apex
    #[arg(long)]
    crown_prop: Option<f64>,
    /// Clustering radius in multiples of the resolution
    #[arg(long)]
    eps_multiplier: Option<f64>,
    /// Minimum points for a cluster core
    #[arg(long)]
    min_cluster_size: Option<usize>,
}

impl ParamArgs {
    fn resolve(&self) -> Result<DetectionParams> {
        let mut params = match &self.params {
            Some(path) => DetectionParams::from_json_file(path)
                .with_context(|| format!("Failed to load parameters from {}", path.display()))?,
            None => DetectionParams::default(),
        };

        if let Some(v) = self.pixel_size {
            params.pixel_size = Some(v);
        }
        if let Some(code) = self.epsg {
            params.crs = Some(CRS::from_epsg(code));
        }
        if let Some(v) = self.tile_size {
            params.tile_size = v;
        }
        if let Some(v) = self.tile_overlap {
            params.tile_overlap = v;
        }
        if let Some(v) = self.denoise_window {
            params.denoise_window = v;
        }
        if let Some(v) = self.min_window {
            params.min_window = v;
        }
        if let Some(v) = self.threshold_std_factor {
            params.threshold_std_factor = v;
        }
        if let Some(v) = self.min_tree_height {
            params.min_tree_height = v;
        }
        if let Some(v) = self.crown_prop {
            params.crown_prop = v;
        }
        if let Some(v) = self.eps_multiplier {
            params.eps_multiplier = v;
        }
        if let Some(v) = self.min_cluster_size {
            params.min_cluster_size = v;
        }

        params.validate().context("Invalid detection parameters")?;
        Ok(params)
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install log subscriber")
}

fn processing_mode(threads: Option<usize>) -> ProcessingMode {
    match threads {
        None | Some(0) => ProcessingMode::Parallel,
        Some(1) => ProcessingMode::Sequential,
        Some(n) => ProcessingMode::ParallelWith(n),
    }
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_raster(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner(&format!("Reading {}...", path.display()));
    let raster = read_geotiff::<f64, _>(path)
        .with_context(|| format!("Failed to read raster: {}", path.display()))?;
    pb.finish_and_clear();
    Ok(raster)
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn print_report(report: &DetectionReport, trees: usize) {
    println!("Trees detected: {}", trees);
    println!("  Resolution: {}", report.resolution);
    if report.resampled {
        println!("  Surface resampled onto the ground grid");
    }
    println!(
        "  Tiles: {} processed, {} skipped",
        report.tiles_processed, report.tiles_skipped
    );
    println!(
        "  Candidates: {} ({} clusters, {} noise)",
        report.candidates, report.clusters, report.noise
    );
    if let (Some(mean), Some(max)) = (report.mean_height, report.max_height) {
        println!("  Canopy height: mean {:.2}, max {:.2}", mean, max);
    }
    if report.negative_cells > 0 {
        println!("  Negative heights clipped: {}", report.negative_cells);
    }
    if !report.warnings.is_empty() {
        println!("  Warnings: {}", report.warnings.len());
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    let mode = processing_mode(cli.threads);

    match cli.command {
        Commands::Info { input } => {
            let raster = read_raster(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.resolution());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            if let Some(std_dev) = stats.std_dev {
                println!("  Std dev: {:.4}", std_dev);
            }
            if !raster.is_empty() {
                println!(
                    "  Valid cells: {} ({:.1}%)",
                    stats.valid_count,
                    100.0 * stats.valid_count as f64 / raster.len() as f64
                );
            }
        }

        Commands::Chm {
            ground,
            surface,
            output,
            params,
        } => {
            let params = params.resolve()?;
            let ground = read_raster(&ground)?;
            let surface = read_raster(&surface)?;

            let start = Instant::now();
            let pb = spinner("Building canopy height model...");
            let aligned = align_grids(&ground, &surface, &params).context("Failed to align grids")?;
            let model = build_height_model(&aligned.ground, &aligned.surface)
                .context("Failed to build height model")?;
            pb.finish_and_clear();

            let stats = model.statistics();
            info!(
                "Height model: {} valid cells, {} negative cells clipped",
                stats.valid_count, model.negative_cells
            );

            let pb = spinner("Writing output...");
            write_geotiff(&model.grid, &output)
                .with_context(|| format!("Failed to write output: {}", output.display()))?;
            pb.finish_and_clear();
            done("Canopy height model", &output, start.elapsed());
        }

        Commands::Detect {
            ground,
            surface,
            output,
            crowns,
            crown_k,
            crown_segments,
            params,
        } => {
            let params = params.resolve()?;
            let crown_params = CrownParams {
                k: crown_k,
                segments: crown_segments,
            };
            crown_params.validate().context("Invalid crown parameters")?;

            let ground = read_raster(&ground)?;
            let surface = read_raster(&surface)?;

            let start = Instant::now();
            let pb = spinner("Detecting trees...");
            let detector = TreeDetector::new(params).with_mode(mode);
            let result = detector
                .detect(&ground, &surface)
                .context("Tree detection failed")?;
            pb.finish_and_clear();

            let crs = ground.crs().or(surface.crs()).or(detector.params().crs.as_ref());

            let pb = spinner("Writing output...");
            write_geojson(&tree_points(&result.trees, crs), &output)
                .with_context(|| format!("Failed to write output: {}", output.display()))?;
            if let Some(path) = &crowns {
                let polygons = crown_polygons(&result.trees, &crown_params, crs)?;
                write_geojson(&polygons, path)
                    .with_context(|| format!("Failed to write crowns: {}", path.display()))?;
            }
            pb.finish_and_clear();

            print_report(&result.report, result.trees.len());
            done("Tree points", &output, start.elapsed());
            if let Some(path) = &crowns {
                println!("Crown polygons saved to: {}", path.display());
            }
        }
    }

    Ok(())
}
