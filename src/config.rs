use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{election::Election, geom::AdjacencyMethod};

/// Read a TOML file into a config struct; missing keys take their defaults.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("[config] Failed to read {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("[config] Failed to parse {}", path.display()))
}

/// One election's column names and the alias used in ensemble column names.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ElectionConfig {
    pub name: String,
    pub alias: String,
    pub dem: String,
    pub rep: String,
}

impl From<&ElectionConfig> for Election {
    fn from(config: &ElectionConfig) -> Self {
        Election::new(&config.name, &config.alias, &config.dem, &config.rep)
    }
}

/// Parameters of a ReCom chain over a districted precinct layer.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
    /// Column holding the enacted district of each precinct.
    pub assignment_column: String,
    /// Column holding each precinct's population.
    pub pop_column: String,
    pub num_districts: u32,
    /// Allowed deviation from the ideal district population, as a fraction.
    pub pop_tolerance: f64,
    pub steps: usize,
    pub seed: u64,
    /// Spanning trees drawn per root before a new root is picked.
    pub node_repeats: usize,
    /// Spanning trees drawn before a proposal gives up.
    pub max_attempts: usize,
    /// Reject plans with more than this multiple of the initial cut-edge count.
    pub cut_edge_factor: Option<f64>,
    pub contiguous: bool,
    pub adjacency: AdjacencyMethod,
    /// Log progress every this many steps.
    pub progress_interval: usize,
    pub elections: Vec<ElectionConfig>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            assignment_column: "SSD".into(),
            pop_column: "TOTPOP".into(),
            num_districts: 59,
            pop_tolerance: 0.1,
            steps: 50_000,
            seed: 382_946,
            node_repeats: 1,
            max_attempts: 100_000,
            cut_edge_factor: None,
            contiguous: false,
            adjacency: AdjacencyMethod::SharedSegments,
            progress_interval: 1_000,
            elections: vec![
                ElectionConfig { name: "G20PRE".into(), alias: "pres".into(), dem: "G20PRED".into(), rep: "G20PRER".into() },
                ElectionConfig { name: "G20USS".into(), alias: "sen".into(), dem: "G20USSD".into(), rep: "G20USSR".into() },
            ],
        }
    }
}

impl ChainConfig {
    pub fn elections(&self) -> Vec<Election> {
        self.elections.iter().map(Election::from).collect()
    }

    /// Node weight columns the chain needs from the layer.
    pub fn series(&self) -> Vec<&str> {
        let mut series = vec![self.pop_column.as_str()];
        for name in self.elections.iter().flat_map(|e| [e.dem.as_str(), e.rep.as_str()]) {
            if !series.contains(&name) { series.push(name) }
        }
        series
    }
}

/// Inputs and column conventions for merging census and election data onto precincts.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// Census blocks with population (P2) columns.
    pub population: PathBuf,
    /// Census blocks with voting-age population (P4) columns.
    pub vap: PathBuf,
    /// Precincts with election returns.
    pub precincts: PathBuf,
    /// Enacted districts.
    pub districts: PathBuf,
    pub pop_columns: Vec<String>,
    pub vap_columns: Vec<String>,
    /// District label column in the district layer.
    pub district_column: String,
    /// Column created on the precinct layer holding its district label.
    pub assignment_column: String,
    pub rename: Vec<(String, String)>,
    pub drop: Vec<String>,
    /// Base name of the output files.
    pub output_name: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        let columns = |table: &str| ["1", "2", "5", "6", "7", "8", "9", "10", "11"].iter()
            .map(|n| format!("{table}{n:0>4}"))
            .collect::<Vec<_>>();

        let rename = [
            ("P0020001", "TOTPOP"), ("P0020002", "HISP"), ("P0020005", "NH_WHITE"),
            ("P0020006", "NH_BLACK"), ("P0020007", "NH_AMIN"), ("P0020008", "NH_ASIAN"),
            ("P0020009", "NH_NHPI"), ("P0020010", "NH_OTHER"), ("P0020011", "NH_2MORE"),
            ("P0040001", "VAP"), ("P0040002", "HVAP"), ("P0040005", "WVAP"),
            ("P0040006", "BVAP"), ("P0040007", "AMINVAP"), ("P0040008", "ASIANVAP"),
            ("P0040009", "NHPIVAP"), ("P0040010", "OTHERVAP"), ("P0040011", "2MOREVAP"),
            ("G20PREDBID", "G20PRED"), ("G20PRERTRU", "G20PRER"),
            ("G20USSDDUR", "G20USSD"), ("G20USSRCUR", "G20USSR"),
        ];

        Self {
            population: "il_pl2020_b/il_pl2020_p2_b.shp".into(),
            vap: "il_pl2020_b/il_pl2020_p4_b.shp".into(),
            precincts: "il_vest_20/il_vest_20.shp".into(),
            districts: "il_sldu_2021/il_sldu_2021.shp".into(),
            pop_columns: columns("P002"),
            vap_columns: columns("P004"),
            district_column: "DISTRICTN".into(),
            assignment_column: "SSD".into(),
            rename: rename.iter().map(|&(a, b)| (a.to_string(), b.to_string())).collect(),
            drop: ["G20PRELJOR", "G20PREGHAW", "G20PREACAR", "G20PRESLAR", "G20USSIWIL", "G20USSLMAL", "G20USSGBLA"]
                .iter().map(|s| s.to_string()).collect(),
            output_name: "IL".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_defaults_match_census_tables() {
        let config = MergeConfig::default();
        assert_eq!(config.pop_columns, vec![
            "P0020001", "P0020002", "P0020005", "P0020006", "P0020007",
            "P0020008", "P0020009", "P0020010", "P0020011",
        ]);
        assert_eq!(config.vap_columns.last().map(String::as_str), Some("P0040011"));
        assert_eq!(config.rename.len(), 22);
        assert_eq!(config.drop.len(), 7);
    }

    #[test]
    fn chain_series_lists_population_then_votes() {
        assert_eq!(ChainConfig::default().series(), vec!["TOTPOP", "G20PRED", "G20PRER", "G20USSD", "G20USSR"]);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chain.toml");
        fs::write(&path, "steps = 10\ncut_edge_factor = 2.0\nadjacency = \"relate\"\n").unwrap();

        let config: ChainConfig = load_toml(&path).unwrap();
        assert_eq!(config.steps, 10);
        assert_eq!(config.cut_edge_factor, Some(2.0));
        assert_eq!(config.adjacency, AdjacencyMethod::Relate);
        assert_eq!(config.seed, 382_946);
        assert_eq!(config.elections.len(), 2);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chain.toml");
        fs::write(&path, "stepz = 10\n").unwrap();
        assert!(load_toml::<ChainConfig>(&path).is_err());
    }
}
