//! Region directory
//!
//! The OKATO directory is a two-level tree: federal regions and their
//! districts. It is built once per run (fetched or loaded from the JSON
//! cache) and only read while crashes are retrieved.

mod cache;
mod directory;

pub use cache::{load_directory, save_directory};
pub use directory::{latest_year_month, DirectoryClient, MAP_DATA_PATH};

use crate::{ConfigError, GibddError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A leaf administrative unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCode {
    pub name: String,
    #[serde(default)]
    pub okato: Option<String>,
}

impl RegionCode {
    pub fn new(name: impl Into<String>, okato: Option<&str>) -> Self {
        Self {
            name: name.into(),
            okato: okato.map(str::to_string),
        }
    }

    /// The OKATO code, or `MissingOkato` naming this region
    pub fn okato_code(&self) -> Result<&str> {
        self.okato.as_deref().ok_or_else(|| GibddError::MissingOkato {
            region: self.name.clone(),
        })
    }
}

/// A top-level region with its districts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalRegion {
    pub name: String,
    #[serde(default)]
    pub okato: Option<String>,
    #[serde(default)]
    pub districts: Vec<RegionCode>,
}

impl FederalRegion {
    pub fn okato_code(&self) -> Result<&str> {
        self.okato.as_deref().ok_or_else(|| GibddError::MissingOkato {
            region: self.name.clone(),
        })
    }
}

/// Result of a directory lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region<'a> {
    Federal(&'a FederalRegion),
    Subregion {
        parent: &'a FederalRegion,
        region: &'a RegionCode,
    },
}

impl<'a> Region<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Region::Federal(federal) => &federal.name,
            Region::Subregion { region, .. } => &region.name,
        }
    }

    pub fn okato(&self) -> Option<&'a str> {
        match self {
            Region::Federal(federal) => federal.okato.as_deref(),
            Region::Subregion { region, .. } => region.okato.as_deref(),
        }
    }
}

/// The whole country: every federal region with its districts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryDirectory {
    #[serde(default)]
    pub regions: Vec<FederalRegion>,
}

impl CountryDirectory {
    pub const NAME: &'static str = "Российская Федерация";
    pub const OKATO: &'static str = "877";

    pub fn new(regions: Vec<FederalRegion>) -> Self {
        Self { regions }
    }

    /// Finds a region by OKATO code, federal regions first
    pub fn get_region(&self, okato: &str) -> Option<Region<'_>> {
        if let Some(federal) = self
            .regions
            .iter()
            .find(|r| r.okato.as_deref() == Some(okato))
        {
            return Some(Region::Federal(federal));
        }

        self.regions.iter().find_map(|parent| {
            parent
                .districts
                .iter()
                .find(|d| d.okato.as_deref() == Some(okato))
                .map(|region| Region::Subregion { parent, region })
        })
    }

    /// Case-insensitive substring search over federal and district names
    pub fn find_region(&self, query: &str) -> Vec<Region<'_>> {
        let query = query.to_lowercase();
        let mut found = Vec::new();

        for federal in &self.regions {
            if federal.name.to_lowercase().contains(&query) {
                found.push(Region::Federal(federal));
            }
            for district in &federal.districts {
                if district.name.to_lowercase().contains(&query) {
                    found.push(Region::Subregion {
                        parent: federal,
                        region: district,
                    });
                }
            }
        }

        found
    }

    /// Checks OKATO uniqueness across federal regions and within each parent
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let mut federal_codes = HashSet::new();

        for federal in &self.regions {
            if let Some(code) = &federal.okato {
                if !federal_codes.insert(code.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "Duplicate federal okato code '{}' ({})",
                        code, federal.name
                    )));
                }
            }

            let mut district_codes = HashSet::new();
            for district in &federal.districts {
                if let Some(code) = &district.okato {
                    if !district_codes.insert(code.as_str()) {
                        return Err(ConfigError::Validation(format!(
                            "Duplicate okato code '{}' ({}) in {}",
                            code, district.name, federal.name
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    pub fn district_count(&self) -> usize {
        self.regions.iter().map(|r| r.districts.len()).sum()
    }
}
