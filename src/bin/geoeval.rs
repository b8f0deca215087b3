//! geoeval - georeference detections and score them against ground truth

use anyhow::{anyhow, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use geo_eval::annotation::load_labelme_ground_truth;
use geo_eval::config::EvalConfig;
use geo_eval::crs::Crs;
use geo_eval::evaluator::{evaluate_files, georeference_detections, write_curve_outputs};
use geo_eval::export::write_to_file;
use geo_eval::loader::load_raw_detections;
use geo_eval::transform::{GeoTransform, RasterGeoreference};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "geoeval", author, version, about)]
struct Args {
    /// TOML configuration file; defaults apply when absent.
    #[arg(long, global = true, env = "GEOEVAL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sweep IoU thresholds and write the precision-recall plot and JSON
    Curve {
        /// Ground-truth GeoJSON collection.
        #[arg(long)]
        ground_truth: PathBuf,
        /// Prediction GeoJSON collection.
        #[arg(long)]
        predictions: PathBuf,
        /// Directory receiving the plot and pr_curve.json.
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },

    /// Georeference raw pixel detections into a GeoJSON collection
    Detections {
        /// Raw detection JSON array.
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        georef: GeorefArgs,
        /// CRS to write; defaults to reprojection.target_crs.
        #[arg(long)]
        target_crs: Option<Crs>,
        #[arg(long)]
        output: PathBuf,
    },

    /// Convert LabelMe annotations into a ground-truth GeoJSON collection
    GroundTruth {
        /// LabelMe annotation JSON.
        #[arg(long)]
        labelme: PathBuf,
        #[command(flatten)]
        georef: GeorefArgs,
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(ClapArgs, Debug)]
struct GeorefArgs {
    /// Affine transform as six comma-separated values a,b,c,d,e,f.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required_unless_present = "world_file")]
    transform: Option<Vec<f64>>,
    /// ESRI world file of the raster.
    #[arg(long, conflicts_with = "transform")]
    world_file: Option<PathBuf>,
    /// CRS of the raster, e.g. EPSG:32718.
    #[arg(long)]
    crs: Crs,
}

impl GeorefArgs {
    fn resolve(&self) -> Result<RasterGeoreference> {
        let transform = match (&self.transform, &self.world_file) {
            (Some(values), _) => match values.as_slice() {
                &[a, b, c, d, e, f] => GeoTransform::new(a, b, c, d, e, f),
                _ => return Err(anyhow!("--transform needs 6 values, got {}", values.len())),
            },
            (None, Some(path)) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read world file {}", path.display()))?;
                GeoTransform::from_world_file(&text)
                    .with_context(|| format!("invalid world file {}", path.display()))?
            }
            (None, None) => return Err(anyhow!("either --transform or --world-file is required")),
        };
        Ok(RasterGeoreference::new(transform, self.crs))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EvalConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EvalConfig::default(),
    };

    match args.command {
        Command::Curve {
            ground_truth,
            predictions,
            output_dir,
        } => cmd_curve(&ground_truth, &predictions, &output_dir, &config),
        Command::Detections {
            input,
            georef,
            target_crs,
            output,
        } => cmd_detections(&input, &georef, target_crs, &output, &config),
        Command::GroundTruth {
            labelme,
            georef,
            output,
        } => cmd_ground_truth(&labelme, &georef, &output, &config),
    }
}

fn cmd_curve(ground_truth: &Path, predictions: &Path, output_dir: &Path, config: &EvalConfig) -> Result<()> {
    let curve = evaluate_files(ground_truth, predictions, config).context("evaluation failed")?;

    if !curve.failures.is_empty() {
        warn!("{} threshold(s) could not be evaluated", curve.failures.len());
    }
    if let Some(best) = curve.best_f1() {
        info!(
            "Best F1 {:.3} at threshold {:.2} (precision {:.3}, recall {:.3})",
            best.f1(),
            best.iou_threshold,
            best.precision,
            best.recall
        );
    }

    write_curve_outputs(&curve, output_dir, &config.plot)
        .with_context(|| format!("failed to write results to {}", output_dir.display()))?;
    Ok(())
}

fn cmd_detections(
    input: &Path,
    georef: &GeorefArgs,
    target_crs: Option<Crs>,
    output: &Path,
    config: &EvalConfig,
) -> Result<()> {
    let georef = georef.resolve()?;
    let target = target_crs.unwrap_or(config.reprojection.target_crs);

    let raw = load_raw_detections(input).with_context(|| format!("failed to load {}", input.display()))?;
    let detections = georeference_detections(&raw, &georef, target)
        .with_context(|| format!("failed to georeference detections into {}", target))?;

    write_to_file(&detections, output).with_context(|| format!("failed to write {}", output.display()))?;
    info!("Wrote {} detections in {} to {}", detections.len(), target, output.display());
    Ok(())
}

fn cmd_ground_truth(labelme: &Path, georef: &GeorefArgs, output: &Path, config: &EvalConfig) -> Result<()> {
    let georef = georef.resolve()?;
    let (ground_truth, _stats) = load_labelme_ground_truth(labelme, &georef, &config.annotations)
        .with_context(|| format!("failed to convert {}", labelme.display()))?;

    write_to_file(&ground_truth, output).with_context(|| format!("failed to write {}", output.display()))?;
    info!("Wrote {} ground-truth records to {}", ground_truth.len(), output.display());
    Ok(())
}
