use std::fs;

use cog_tools::generate::{self, GeneratorConfig};
use cog_tools::IdPolicy;
use gdal::spatial_ref::SpatialRef;
use gdal::DriverManager;
use tempfile::TempDir;

fn gtiff_available() -> bool {
    DriverManager::get_driver_by_name("GTiff").is_ok()
}

#[test]
fn test_enriched_sidecar_carries_derived_fields() {
    if !gtiff_available() {
        eprintln!("Skipping test: GTiff driver not available");
        return;
    }

    let dir = TempDir::new().unwrap();
    let raster_path = dir.path().join("scene.tif");
    {
        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let mut dataset = driver
            .create_with_band_type::<u8, _>(&raster_path, 4, 4, 1)
            .unwrap();
        dataset
            .set_geo_transform(&[135.0, 0.01, 0.0, 35.0, 0.0, -0.01])
            .unwrap();
        let srs = SpatialRef::from_epsg(4326).unwrap();
        dataset.set_projection(&srs.to_wkt().unwrap()).unwrap();
    }

    let csv_path = dir.path().join("metadata_values.csv");
    fs::write(
        &csv_path,
        "fileIdentifier,title,coordinate_reference_system\nscene.tif,Scene,from-csv\n",
    )
    .unwrap();

    let template_path = dir.path().join("template_cog.xml");
    fs::write(
        &template_path,
        "<meta>\
         <crs>{{ coordinate_reference_system }}</crs>\
         <res>{{ spatial_resolution }}</res>\
         <west>{{ west_bounding_longitude }}</west>\
         <uid>{{ unique_resource_identifier }}</uid>\
         <rev>{{ date_of_last_revision }}</rev>\
         <md>{{ metadata_date }}</md>\
         </meta>",
    )
    .unwrap();

    let config = GeneratorConfig {
        directory: dir.path().to_path_buf(),
        csv: csv_path,
        template: template_path,
        enrich: true,
        id_policy: IdPolicy::FileName,
        keep_going: false,
    };

    let summary = generate::run(&config).unwrap();
    assert_eq!(summary.generated, 1);

    let sidecar = fs::read_to_string(dir.path().join("scene.tif.xml")).unwrap();

    // Derived fields override the CSV column of the same name.
    assert!(sidecar.contains("<crs>EPSG:4326</crs>"));
    assert!(sidecar.contains("<res>0.01 m</res>"));
    assert!(sidecar.contains("<west>135</west>"));
    assert!(sidecar.contains("<uid>scene.tif_"));

    // Revision and metadata dates are always identical.
    let rev = sidecar
        .split("<rev>")
        .nth(1)
        .and_then(|s| s.split("</rev>").next())
        .unwrap();
    assert!(sidecar.contains(&format!("<md>{}</md>", rev)));
}
