use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{ID_COLUMN, OUTPUT_COLUMNS, Species};
use crate::error::MirError;
use crate::sheet::check_sheet_name;

pub const CONFIG_FILE: &str = "mirmerge.json";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUTPUT: &str = "merged_data.xlsx";
pub const DEFAULT_BASE_URL: &str = "https://mirgenedb.org";
pub const DEFAULT_MAX_COLUMN_WIDTH: usize = 50;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub max_column_width: Option<usize>,
    #[serde(default)]
    pub id_label: Option<String>,
    #[serde(default)]
    pub species: Vec<SpeciesEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SpeciesEntry {
    Shorthand(String),
    Detailed(SpeciesEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SpeciesEntryObject {
    pub code: String,
    #[serde(default)]
    pub sheet_name: Option<String>,
}

/// A species to process and the sheet it is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesTarget {
    pub species: Species,
    pub sheet_name: String,
}

impl From<Species> for SpeciesTarget {
    fn from(species: Species) -> Self {
        Self {
            species,
            sheet_name: species.display_name().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub data_dir: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub base_url: String,
    pub max_column_width: usize,
    pub id_label: String,
    pub species: Vec<SpeciesTarget>,
}

impl ResolvedConfig {
    /// Narrows the species list to `only`, keeping configured order and names.
    pub fn restrict_species(&mut self, only: &[Species]) {
        if only.is_empty() {
            return;
        }
        let mut targets: Vec<SpeciesTarget> = self
            .species
            .iter()
            .filter(|target| only.contains(&target.species))
            .cloned()
            .collect();
        for species in only {
            if !targets.iter().any(|target| target.species == *species) {
                targets.push(SpeciesTarget::from(*species));
            }
        }
        self.species = targets;
    }

    pub fn merge_config(&self) -> MergeConfig {
        MergeConfig {
            species: self.species.clone(),
            columns: default_columns(),
            id_label: self.id_label.clone(),
            max_column_width: self.max_column_width,
        }
    }
}

/// Everything the merge engine needs besides its inputs.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub species: Vec<SpeciesTarget>,
    pub columns: Vec<String>,
    pub id_label: String,
    pub max_column_width: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            species: default_species(),
            columns: default_columns(),
            id_label: ID_COLUMN.to_string(),
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit `path` must exist; otherwise `mirmerge.json` is read when
    /// present and defaults are used when it is not.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, MirError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| MirError::ConfigRead(config_path.clone()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|err| MirError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, MirError> {
        let species = if config.species.is_empty() {
            default_species()
        } else {
            config
                .species
                .into_iter()
                .map(|entry| match entry {
                    SpeciesEntry::Shorthand(code) => {
                        Ok(SpeciesTarget::from(code.parse::<Species>()?))
                    }
                    SpeciesEntry::Detailed(obj) => {
                        let species: Species = obj.code.parse()?;
                        Ok(SpeciesTarget {
                            species,
                            sheet_name: obj
                                .sheet_name
                                .unwrap_or_else(|| species.display_name().to_string()),
                        })
                    }
                })
                .collect::<Result<Vec<_>, MirError>>()?
        };
        validate_targets(&species)?;

        Ok(ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            data_dir: Utf8PathBuf::from(
                config
                    .data_dir
                    .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            ),
            output: Utf8PathBuf::from(
                config
                    .output
                    .unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
            ),
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_column_width: config.max_column_width.unwrap_or(DEFAULT_MAX_COLUMN_WIDTH),
            id_label: config.id_label.unwrap_or_else(|| ID_COLUMN.to_string()),
            species,
        })
    }
}

/// Each species at most once, each sheet name valid and unique.
/// Workbooks compare sheet names case-insensitively.
pub fn validate_targets(targets: &[SpeciesTarget]) -> Result<(), MirError> {
    let mut species = HashSet::new();
    let mut names = HashSet::new();
    for target in targets {
        if !species.insert(target.species) {
            return Err(MirError::InvalidConfig(format!(
                "species {} is listed more than once",
                target.species
            )));
        }
        check_sheet_name(&target.sheet_name)?;
        if !names.insert(target.sheet_name.to_lowercase()) {
            return Err(MirError::InvalidConfig(format!(
                "sheet name {:?} is used more than once",
                target.sheet_name
            )));
        }
    }
    Ok(())
}

pub fn default_species() -> Vec<SpeciesTarget> {
    Species::ALL.into_iter().map(SpeciesTarget::from).collect()
}

pub fn default_columns() -> Vec<String> {
    OUTPUT_COLUMNS.iter().map(|column| column.to_string()).collect()
}
