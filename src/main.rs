use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cog_tools::{generate, pipeline, CogConfig, GeneratorConfig, IdPolicy};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate XML metadata sidecars for rasters matched against a CSV table
    Metadata {
        /// Directory containing .tif files
        #[arg(value_name = "DIRECTORY")]
        directory: PathBuf,

        /// Path to CSV with metadata values
        #[arg(long, default_value = "metadata_values.csv")]
        csv: PathBuf,

        /// Path to the XML template
        #[arg(long, default_value = "template_cog.xml")]
        template: PathBuf,

        /// Read bounding box, resolution, CRS, id and dates from each raster
        #[arg(long)]
        enrich: bool,

        /// How raster file names map to fileIdentifier keys
        #[arg(long, value_enum, default_value_t = IdPolicy::FileName)]
        id_policy: IdPolicy,

        /// Continue with the remaining rasters when one fails
        #[arg(long)]
        keep_going: bool,
    },

    /// Reproject a GeoTIFF, rebuild overviews and compress it into a COG
    Cog {
        /// Source GeoTIFF
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output directory for the final COG
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        /// NoData value
        #[arg(long, default_value_t = 255.0)]
        nodata: f64,

        /// Target EPSG code
        #[arg(long, default_value_t = 3857)]
        epsg: u32,

        /// Target resolution in target-CRS units
        #[arg(long)]
        resolution: Option<f64>,

        /// gdalwarp resampling method
        #[arg(long, default_value = "near")]
        resampling: String,

        /// Output pixel type (e.g. Byte)
        #[arg(long = "ot")]
        output_type: Option<String>,

        /// GDAL_CACHEMAX in megabytes
        #[arg(long, default_value_t = 2048)]
        cache_max: u32,

        /// COG validator script
        #[arg(long, default_value = "validate_cloud_optimized_geotiff.py")]
        validator: PathBuf,
    },
}

fn main() -> Result<()> {
    // Per-file notices belong on stdout; RUST_LOG adjusts verbosity.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stdout)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Metadata {
            directory,
            csv,
            template,
            enrich,
            id_policy,
            keep_going,
        } => {
            let config = GeneratorConfig {
                directory,
                csv,
                template,
                enrich,
                id_policy,
                keep_going,
            };
            let summary = generate::run(&config)?;
            info!(
                "Done: {} generated, {} skipped, {} failed",
                summary.generated, summary.skipped, summary.failed
            );
        }
        Command::Cog {
            input,
            output,
            nodata,
            epsg,
            resolution,
            resampling,
            output_type,
            cache_max,
            validator,
        } => {
            let config = CogConfig {
                input,
                output_dir: output,
                nodata,
                target_epsg: epsg,
                resolution,
                resampling,
                output_type,
                cache_max_mb: cache_max,
                validator,
            };
            let cog = pipeline::run(&config)?;
            info!("COG written: {}", cog.display());
        }
    }

    Ok(())
}
