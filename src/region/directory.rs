//! OKATO directory fetch
//!
//! `getMainMapData` lists the children of a region code. Asking for the
//! country code yields federal regions; asking for a federal code yields its
//! districts. The response nests JSON strings two levels deep.

use crate::crashes::date_tag;
use crate::region::{CountryDirectory, FederalRegion, RegionCode};
use crate::transport::Transport;
use crate::{GibddError, Result};
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Path of the region map endpoint
pub const MAP_DATA_PATH: &str = "/map/getMainMapData";

/// The last fully completed month before `today`
///
/// In January this is December of the previous year.
pub fn latest_year_month(today: NaiveDate) -> (i32, u32) {
    match today.month() {
        1 => (today.year() - 1, 12),
        month => (today.year(), month - 1),
    }
}

#[derive(Debug, Deserialize)]
struct MapDataEnvelope {
    metabase: String,
}

#[derive(Debug, Deserialize)]
struct MetabaseEntry {
    maps: String,
}

#[derive(Debug, Deserialize)]
struct MapEntry {
    id: Value,
    name: String,
}

fn map_entry_code(id: Value) -> String {
    match id {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Parses the children listed in a map data response body
fn parse_map_data(body: &str, region_code: &str) -> Result<Vec<RegionCode>> {
    let malformed = |message: String| GibddError::MalformedResponse {
        context: format!("map data for region {}", region_code),
        message,
    };

    let envelope: MapDataEnvelope =
        serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    let metabase: Vec<MetabaseEntry> =
        serde_json::from_str(&envelope.metabase).map_err(|e| malformed(e.to_string()))?;
    let first = metabase
        .into_iter()
        .next()
        .ok_or_else(|| malformed("empty metabase".to_string()))?;
    let maps: Vec<MapEntry> =
        serde_json::from_str(&first.maps).map_err(|e| malformed(e.to_string()))?;

    Ok(maps
        .into_iter()
        .map(|entry| RegionCode {
            name: entry.name,
            okato: Some(map_entry_code(entry.id)),
        })
        .collect())
}

/// Builds the region directory from the map endpoint
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    transport: Arc<Transport>,
    as_of: (i32, u32),
}

impl DirectoryClient {
    /// Queries codes as of the last completed month
    pub fn new(transport: Arc<Transport>) -> Self {
        Self {
            transport,
            as_of: latest_year_month(Local::now().date_naive()),
        }
    }

    /// Queries codes as of a fixed year and month
    pub fn with_period(transport: Arc<Transport>, year: i32, month: u32) -> Self {
        Self {
            transport,
            as_of: (year, month),
        }
    }

    /// Lists the child regions of a region code
    pub async fn fetch_children(&self, region_code: &str) -> Result<Vec<RegionCode>> {
        let (year, month) = self.as_of;
        let date = serde_json::to_string(&[date_tag(year, month)])?;
        let body = serde_json::json!({
            "maptype": 1,
            "region": region_code,
            "date": date,
            "pok": "1",
        });

        let response = self.transport.post_json(MAP_DATA_PATH, &body).await?;
        let children = parse_map_data(&response.body, region_code)?;
        tracing::info!(
            "Received {} okato codes for region {}",
            children.len(),
            region_code
        );
        Ok(children)
    }

    /// Lists federal regions without their districts
    pub async fn fetch_federal_regions(&self) -> Result<Vec<FederalRegion>> {
        let children = self.fetch_children(CountryDirectory::OKATO).await?;
        Ok(children
            .into_iter()
            .map(|c| FederalRegion {
                name: c.name,
                okato: c.okato,
                districts: Vec::new(),
            })
            .collect())
    }

    /// Fills in the districts of one federal region
    pub async fn fetch_districts(&self, region: &FederalRegion) -> Result<FederalRegion> {
        let districts = self.fetch_children(region.okato_code()?).await?;
        Ok(FederalRegion {
            name: region.name.clone(),
            okato: region.okato.clone(),
            districts,
        })
    }

    /// Builds the full directory
    ///
    /// A federal region whose districts cannot be fetched is skipped with a
    /// warning, so the directory may be incomplete.
    pub async fn fetch_country_directory(&self) -> Result<CountryDirectory> {
        let federal = self.fetch_federal_regions().await?;
        let mut regions = Vec::with_capacity(federal.len());

        for region in &federal {
            match self.fetch_districts(region).await {
                Ok(full) => regions.push(full),
                Err(e) => {
                    tracing::warn!(
                        "Districts for region {} could not be fetched, the directory will be incomplete: {}",
                        region.name,
                        e
                    );
                }
            }
        }

        Ok(CountryDirectory::new(regions))
    }
}
