use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::Dataset;
use uuid::Uuid;

/// Axes closer than this count as square pixels.
const RESOLUTION_TOLERANCE: f64 = 1e-6;

const WGS84_EPSG: i32 = 4326;

/// Geographic bounding box in EPSG:4326 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

/// Derive the template fields read from a raster: bounding box, resolution,
/// CRS descriptor, a fresh unique identifier and the modification dates.
///
/// The returned map overwrites same-named CSV columns when merged into a
/// record. The unique identifier embeds a random UUID, so no two calls
/// produce the same value.
pub fn raster_fields(path: &Path, identifier: &str) -> Result<HashMap<String, String>> {
    let dataset = Dataset::open(path)
        .with_context(|| format!("Failed to open raster {}", path.display()))?;

    let geo_transform = dataset
        .geo_transform()
        .with_context(|| format!("Failed to read geo transform of {}", path.display()))?;
    let (width, height) = dataset.raster_size();

    let spatial_ref = dataset.spatial_ref().ok();

    let bbox = bounding_box(&geo_transform, width, height, spatial_ref.as_ref())
        .with_context(|| format!("Failed to compute bounding box of {}", path.display()))?;
    let resolution = format_resolution(geo_transform[1].abs(), geo_transform[5].abs());
    let crs = crs_descriptor(spatial_ref.as_ref());

    let modified = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("Failed to read modification time of {}", path.display()))?;
    let date = DateTime::<Utc>::from(modified).format("%Y-%m-%d").to_string();

    let mut fields = HashMap::new();
    fields.insert("west_bounding_longitude".to_string(), bbox.west.to_string());
    fields.insert("east_bounding_longitude".to_string(), bbox.east.to_string());
    fields.insert("south_bounding_latitude".to_string(), bbox.south.to_string());
    fields.insert("north_bounding_latitude".to_string(), bbox.north.to_string());
    fields.insert("spatial_resolution".to_string(), resolution);
    fields.insert("coordinate_reference_system".to_string(), crs);
    fields.insert(
        "unique_resource_identifier".to_string(),
        format!("{}_{}", identifier, Uuid::new_v4()),
    );
    fields.insert("date_of_last_revision".to_string(), date.clone());
    fields.insert("metadata_date".to_string(), date);

    Ok(fields)
}

/// Native raster bounds reprojected into EPSG:4326.
///
/// A dataset without a CRS, or one already in EPSG:4326, passes its bounds
/// through untouched.
fn bounding_box(
    geo_transform: &[f64; 6],
    width: usize,
    height: usize,
    spatial_ref: Option<&SpatialRef>,
) -> Result<BoundingBox> {
    let min_x = geo_transform[0];
    let max_y = geo_transform[3];
    let max_x = min_x + width as f64 * geo_transform[1];
    let min_y = max_y + height as f64 * geo_transform[5];

    let (min_x, max_x) = (min_x.min(max_x), min_x.max(max_x));
    let (min_y, max_y) = (min_y.min(max_y), min_y.max(max_y));

    let spatial_ref = match spatial_ref {
        Some(srs) if !is_wgs84(srs) => srs,
        _ => {
            return Ok(BoundingBox {
                west: min_x,
                east: max_x,
                south: min_y,
                north: max_y,
            })
        }
    };

    let mut target = SpatialRef::from_epsg(WGS84_EPSG as u32)
        .context("Failed to create EPSG:4326 spatial reference")?;
    // Traditional GIS axis order keeps x=longitude, y=latitude.
    target.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);

    let transform = CoordTransform::new(spatial_ref, &target)
        .context("Failed to create coordinate transformation to EPSG:4326")?;

    // Transform all four corners for accuracy.
    let mut xs = [min_x, max_x, max_x, min_x];
    let mut ys = [min_y, min_y, max_y, max_y];
    let mut zs = [0.0; 4];
    transform
        .transform_coords(&mut xs, &mut ys, &mut zs)
        .context("Failed to transform raster bounds to EPSG:4326")?;

    Ok(BoundingBox {
        west: xs.iter().copied().fold(f64::INFINITY, f64::min),
        east: xs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        south: ys.iter().copied().fold(f64::INFINITY, f64::min),
        north: ys.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

fn is_wgs84(srs: &SpatialRef) -> bool {
    matches!(
        (srs.auth_name().as_deref(), srs.auth_code()),
        (Some("EPSG"), Ok(WGS84_EPSG))
    )
}

/// Ground sample distance as a display string: square pixels render as one
/// value, rectangular pixels as both axes.
pub fn format_resolution(x: f64, y: f64) -> String {
    if (x - y).abs() < RESOLUTION_TOLERANCE {
        format!("{} m", x)
    } else {
        format!("{} x {} m", x, y)
    }
}

/// CRS display string: an `EPSG:<code>` when the authority resolves, the full
/// WKT otherwise, or `Unknown` when the dataset carries no CRS at all.
pub fn crs_descriptor(spatial_ref: Option<&SpatialRef>) -> String {
    let Some(srs) = spatial_ref else {
        return "Unknown".to_string();
    };

    if let (Some(name), Ok(code)) = (srs.auth_name(), srs.auth_code()) {
        if name == "EPSG" {
            return format!("EPSG:{}", code);
        }
    }

    srs.to_wkt().unwrap_or_else(|_| "Unknown".to_string())
}
