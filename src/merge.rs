use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{common, config::MergeConfig, layer::Layer};

/// Paths of the files written by [`run_merge`].
#[derive(Debug, Clone)]
pub struct MergeOutputs {
    pub shapefile: PathBuf,
    pub geojson: PathBuf,
}

/// Merge block population and VAP, precinct election returns, and enacted
/// districts into one precinct layer, and write it to `output_dir`.
pub fn run_merge(config: &MergeConfig, output_dir: &Path) -> Result<MergeOutputs> {
    let load = |path: &Path, what: &str| -> Result<Layer> {
        info!(path = %path.display(), "loading {what}");
        let layer = Layer::from_shapefile(path)
            .with_context(|| format!("[merge] Failed to load {what} layer"))?;
        layer.doctor()
            .with_context(|| format!("[merge] {what} layer failed validation"))?;
        Ok(layer)
    };

    let population = load(&config.population, "population")?;
    let vap = load(&config.vap, "voting-age population")?;
    let mut precincts = load(&config.precincts, "precinct")?;
    let districts = load(&config.districts, "district")?;

    // Every layer shares the precincts' UTM zone.
    let zone = precincts.geoms().estimate_utm_zone();
    let project = |layer: &Layer| match zone {
        Some(zone) => layer.to_utm_zone(zone),
        None => Ok(layer.clone()),
    };
    let (population, vap, districts) = (project(&population)?, project(&vap)?, project(&districts)?);
    precincts = project(&precincts)?;
    if let Some(zone) = zone { info!(epsg = zone.epsg(), "reprojected all layers to UTM") }

    let merge_blocks = |precincts: &mut Layer, blocks: &Layer, columns: &[String], what: &str| -> Result<()> {
        let columns = columns.iter().map(String::as_str).collect::<Vec<_>>();
        let assignment = blocks.geoms().assign_to(precincts.geoms())
            .with_context(|| format!("[merge] Failed to assign {what} blocks to precincts"))?;
        precincts.aggregate_from(blocks, &assignment, &columns)?;
        if !precincts.log_conservation(blocks, &columns) {
            warn!("{what} totals changed during aggregation");
        }
        Ok(())
    };
    merge_blocks(&mut precincts, &population, &config.pop_columns, "population")?;
    merge_blocks(&mut precincts, &vap, &config.vap_columns, "voting-age population")?;

    let assignment = precincts.geoms().assign_to(districts.geoms())
        .context("[merge] Failed to assign precincts to districts")?;
    precincts.relabel(&assignment, &districts, &config.district_column, &config.assignment_column)?;

    precincts.rename(&config.rename)?;
    precincts.drop_columns(&config.drop)?;

    common::ensure_dir_exists(output_dir)?;
    let outputs = MergeOutputs {
        shapefile: output_dir.join(format!("{}.shp", config.output_name)),
        geojson: output_dir.join(format!("{}.geojson", config.output_name)),
    };
    precincts.write_shapefile(&outputs.shapefile)?;
    precincts.write_geojson(&outputs.geojson)?;
    info!(units = precincts.len(), shapefile = %outputs.shapefile.display(), geojson = %outputs.geojson.display(), "wrote merged layer");

    Ok(outputs)
}
