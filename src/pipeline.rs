use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

/// Parameters for one COG build run.
///
/// Every knob the pipeline uses is carried here explicitly; nothing is read
/// from module-level state.
#[derive(Debug, Clone)]
pub struct CogConfig {
    /// Source GeoTIFF.
    pub input: PathBuf,
    /// Directory the final COG is written into.
    pub output_dir: PathBuf,
    /// NoData value forwarded to gdalwarp as both src and dst nodata.
    pub nodata: f64,
    /// Target spatial reference, e.g. 3857 for Web Mercator.
    pub target_epsg: u32,
    /// Target resolution in target-CRS units, applied to both axes.
    pub resolution: Option<f64>,
    /// gdalwarp resampling method (`near`, `bilinear`, ...).
    pub resampling: String,
    /// Output pixel type (`Byte`, `UInt16`, ...); source type when `None`.
    pub output_type: Option<String>,
    /// GDAL_CACHEMAX in megabytes for overview and translate steps.
    pub cache_max_mb: u32,
    /// COG validator script, run through python3. Its failure is reported,
    /// never fatal.
    pub validator: PathBuf,
}

impl CogConfig {
    fn reprojected_name(&self) -> String {
        format!("{}_repr.tif", self.input_stem())
    }

    fn cog_name(&self) -> String {
        format!("{}_EPSG{}.tif", self.input_stem(), self.target_epsg)
    }

    fn input_stem(&self) -> String {
        self.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string())
    }
}

/// Reproject, rebuild overviews, compress and validate one GeoTIFF.
///
/// Intermediate files live in a scratch directory under the output directory
/// and are removed when the run ends, successfully or not. Each external tool
/// runs to completion before the next starts; any non-zero exit outside the
/// validator aborts the run.
pub fn run(config: &CogConfig) -> Result<PathBuf> {
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let scratch = tempfile::Builder::new()
        .prefix("tmp")
        .tempdir_in(&config.output_dir)
        .context("Failed to create scratch directory")?;

    let reprojected = scratch.path().join(config.reprojected_name());
    let cog = config.output_dir.join(config.cog_name());

    info!(
        "Reprojecting {} to EPSG:{}",
        config.input.display(),
        config.target_epsg
    );
    run_tool("gdalwarp", &warp_args(config, &reprojected))?;

    info!("Rebuilding overviews");
    run_tool("gdaladdo", &overview_clean_args(&reprojected))?;
    run_tool("gdaladdo", &overview_build_args(config, &reprojected))?;

    info!("Writing COG to {}", cog.display());
    run_tool("gdal_translate", &translate_args(config, &reprojected, &cog))?;

    validate_cog(config, &cog);

    // Scratch directory is removed on drop.
    Ok(cog)
}

/// gdalwarp: reproject to the target SRS with tiled DEFLATE output.
pub fn warp_args(config: &CogConfig, destination: &Path) -> Vec<String> {
    let mut args = vec![
        "-t_srs".to_string(),
        format!("EPSG:{}", config.target_epsg),
        "-srcnodata".to_string(),
        config.nodata.to_string(),
        "-dstnodata".to_string(),
        config.nodata.to_string(),
    ];
    if let Some(ref output_type) = config.output_type {
        args.push("-ot".to_string());
        args.push(output_type.clone());
    }
    args.push("-r".to_string());
    args.push(config.resampling.clone());
    if let Some(resolution) = config.resolution {
        args.push("-tr".to_string());
        args.push(resolution.to_string());
        args.push(resolution.to_string());
    }
    args.extend(
        [
            "-co",
            "COMPRESS=DEFLATE",
            "-co",
            "TILED=YES",
            "-co",
            "BIGTIFF=YES",
            "-overwrite",
        ]
        .map(String::from),
    );
    args.push(config.input.to_string_lossy().into_owned());
    args.push(destination.to_string_lossy().into_owned());
    args
}

/// gdaladdo -clean: strip any pre-existing overviews.
pub fn overview_clean_args(raster: &Path) -> Vec<String> {
    vec![
        "-clean".to_string(),
        raster.to_string_lossy().into_owned(),
    ]
}

/// gdaladdo -ro: external DEFLATE-compressed overviews at default levels.
pub fn overview_build_args(config: &CogConfig, raster: &Path) -> Vec<String> {
    vec![
        "-ro".to_string(),
        "--config".to_string(),
        "COMPRESS_OVERVIEW".to_string(),
        "DEFLATE".to_string(),
        "--config".to_string(),
        "GDAL_CACHEMAX".to_string(),
        config.cache_max_mb.to_string(),
        raster.to_string_lossy().into_owned(),
    ]
}

/// gdal_translate: final tiled COG, copying the external overviews in.
pub fn translate_args(config: &CogConfig, source: &Path, destination: &Path) -> Vec<String> {
    vec![
        source.to_string_lossy().into_owned(),
        destination.to_string_lossy().into_owned(),
        "-co".to_string(),
        "TILED=YES".to_string(),
        "-co".to_string(),
        "COMPRESS=DEFLATE".to_string(),
        "-co".to_string(),
        "COPY_SRC_OVERVIEWS=YES".to_string(),
        "-co".to_string(),
        "NUM_THREADS=ALL_CPUS".to_string(),
        "-co".to_string(),
        "BIGTIFF=YES".to_string(),
        "--config".to_string(),
        "GDAL_CACHEMAX".to_string(),
        config.cache_max_mb.to_string(),
    ]
}

/// Validator command line, run through python3.
pub fn validator_args(config: &CogConfig, cog: &Path) -> Vec<String> {
    vec![
        config.validator.to_string_lossy().into_owned(),
        "--full-check=yes".to_string(),
        cog.to_string_lossy().into_owned(),
    ]
}

fn run_tool(program: &str, args: &[String]) -> Result<()> {
    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("Failed to execute {}", program))?;
    if !status.success() {
        bail!("{} exited with {}", program, status);
    }
    Ok(())
}

// The one guarded external call: a failed validation is reported with the
// validator's output instead of aborting the pipeline.
fn validate_cog(config: &CogConfig, cog: &Path) {
    let output = match Command::new("python3")
        .args(validator_args(config, cog))
        .output()
    {
        Ok(output) => output,
        Err(err) => {
            warn!("Could not run COG validator: {}", err);
            return;
        }
    };

    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    if output.status.success() {
        info!("COG validation passed: {}", combined.trim());
    } else {
        warn!("COG validation failed: {}", combined.trim());
    }
}
