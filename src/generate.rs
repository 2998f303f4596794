use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::discover::{discover_rasters, resolve_identifier, IdPolicy};
use crate::extract;
use crate::render::TemplateRenderer;
use crate::table::{MetadataTable, Record};

/// One metadata-generation run over a raster directory.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Directory scanned recursively for `.tif` files.
    pub directory: PathBuf,
    /// CSV table with a `fileIdentifier` column.
    pub csv: PathBuf,
    /// XML template with `{{ field }}` placeholders.
    pub template: PathBuf,
    /// Open each raster and merge derived geospatial fields into its record.
    pub enrich: bool,
    pub id_policy: IdPolicy,
    /// Log raster failures and continue instead of aborting the run.
    pub keep_going: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Walk the directory, match each raster against the table and write one XML
/// sidecar per match. Rasters without a table entry are reported and skipped.
///
/// A raster that fails to process aborts the run unless `keep_going` is set.
pub fn run(config: &GeneratorConfig) -> Result<RunSummary> {
    let table = MetadataTable::from_csv(&config.csv)?;
    let renderer = TemplateRenderer::from_file(&config.template)?;
    debug!(
        "Loaded {} metadata records from {}",
        table.len(),
        config.csv.display()
    );

    let mut summary = RunSummary::default();
    for raster in discover_rasters(&config.directory) {
        let Some(identifier) = resolve_identifier(&raster, config.id_policy) else {
            debug!("Skipping non-UTF-8 file name: {}", raster.display());
            continue;
        };

        let Some(record) = table.get(&identifier) else {
            info!("No CSV entry found for {}, skipping", identifier);
            summary.skipped += 1;
            continue;
        };

        match process_raster(&raster, &identifier, record, &renderer, config.enrich) {
            Ok(output) => {
                info!("Generated: {}", output.display());
                summary.generated += 1;
            }
            Err(err) if config.keep_going => {
                error!("Failed to process {}: {:#}", raster.display(), err);
                summary.failed += 1;
            }
            Err(err) => {
                return Err(err.context(format!("Failed to process {}", raster.display())))
            }
        }
    }

    Ok(summary)
}

fn process_raster(
    raster: &Path,
    identifier: &str,
    record: &Record,
    renderer: &TemplateRenderer,
    enrich: bool,
) -> Result<PathBuf> {
    let record = if enrich {
        let mut merged = record.clone();
        // Derived fields win over same-named CSV columns.
        merged.extend(extract::raster_fields(raster, identifier)?);
        merged
    } else {
        record.clone()
    };

    let xml = renderer.render(&record)?;
    let output = sidecar_path(raster, identifier);
    fs::write(&output, xml)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(output)
}

/// `<identifier>.xml` in the same directory as the raster.
pub fn sidecar_path(raster: &Path, identifier: &str) -> PathBuf {
    raster
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}.xml", identifier))
}
