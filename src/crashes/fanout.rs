//! Region-level fan-out
//!
//! Runs a [`SubregionAggregator`] for every district of a federal region,
//! either in declaration order or on a bounded pool of tokio tasks. The
//! country-level fetch walks federal regions one at a time so the number of
//! open connections never exceeds one pool.

use crate::config::FetchConfig;
use crate::crashes::aggregator::SubregionAggregator;
use crate::crashes::page::{CrashPage, PageFetcher};
use crate::crashes::window::split_range;
use crate::region::{CountryDirectory, FederalRegion};
use crate::transport::Transport;
use crate::{GibddError, Result};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Crash pages per subregion name
pub type RegionCrashes = HashMap<String, Vec<CrashPage>>;

/// Region results per federal region name
pub type CountryCrashes = HashMap<String, RegionCrashes>;

/// A district with its resolved code
struct DistrictTask {
    name: String,
    okato: String,
}

/// Checks every code a region fetch needs before any request is sent
fn resolve_region(region: &FederalRegion) -> Result<(String, Vec<DistrictTask>)> {
    let region_code = region.okato_code()?.to_string();
    let districts = region
        .districts
        .iter()
        .map(|district| {
            Ok(DistrictTask {
                name: district.name.clone(),
                okato: district.okato_code()?.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((region_code, districts))
}

fn insert_unique(results: &mut RegionCrashes, name: String, pages: Vec<CrashPage>) {
    if results.insert(name.clone(), pages).is_some() {
        tracing::warn!("Duplicate subregion name '{}', keeping the last result", name);
    }
}

/// Fetches crashes for whole federal regions and the whole country
#[derive(Debug, Clone)]
pub struct RegionFanOut {
    aggregator: SubregionAggregator,
    concurrency: usize,
}

impl RegionFanOut {
    pub fn new(aggregator: SubregionAggregator, concurrency: usize) -> Self {
        Self {
            aggregator,
            concurrency: concurrency.max(1),
        }
    }

    /// Wires fetcher, aggregator and fan-out over one shared transport
    pub fn from_config(transport: Arc<Transport>, config: &FetchConfig) -> Self {
        let fetcher = PageFetcher::new(transport);
        let aggregator = SubregionAggregator::new(fetcher, config.legacy_page_size);
        Self::new(aggregator, config.concurrency)
    }

    pub fn aggregator(&self) -> &SubregionAggregator {
        &self.aggregator
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetches every district of a region one after another
    pub async fn fetch_region_sequential(
        &self,
        region: &FederalRegion,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<RegionCrashes> {
        let (region_code, districts) = resolve_region(region)?;
        split_range(period_start, period_end)?;

        let mut results = RegionCrashes::with_capacity(districts.len());
        for district in districts {
            let pages = self
                .aggregator
                .fetch_range(&region_code, &district.okato, period_start, period_end)
                .await?;
            insert_unique(&mut results, district.name, pages);
        }

        tracing::info!("Region {} collected: {} subregions", region.name, results.len());
        Ok(results)
    }

    /// Fetches every district of a region on a bounded worker pool
    ///
    /// The first failing district aborts the remaining work and its error is
    /// returned. Result order carries no meaning.
    pub async fn fetch_region(
        &self,
        region: &FederalRegion,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<RegionCrashes> {
        let (region_code, districts) = resolve_region(region)?;
        split_range(period_start, period_end)?;

        tracing::info!(
            "Fetching {} subregions of {} with {} workers",
            districts.len(),
            region.name,
            self.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();

        for district in districts {
            let aggregator = self.aggregator.clone();
            let semaphore = Arc::clone(&semaphore);
            let region_code = region_code.clone();

            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| GibddError::Worker(e.to_string()))?;
                let pages = aggregator
                    .fetch_range(&region_code, &district.okato, period_start, period_end)
                    .await?;
                Ok::<_, GibddError>((district.name, pages))
            });
        }

        let mut results = RegionCrashes::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok((name, pages))) => insert_unique(&mut results, name, pages),
                Ok(Err(e)) => {
                    tracing::error!("Fetch for region {} failed: {}", region.name, e);
                    return Err(e);
                }
                Err(join_err) => return Err(GibddError::Worker(join_err.to_string())),
            }
        }

        tracing::info!("Region {} collected: {} subregions", region.name, results.len());
        Ok(results)
    }

    /// Fetches every federal region of the directory, one region at a time
    pub async fn fetch_country(
        &self,
        directory: &CountryDirectory,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<CountryCrashes> {
        let mut results = CountryCrashes::with_capacity(directory.regions.len());
        for region in &directory.regions {
            let crashes = self.fetch_region(region, period_start, period_end).await?;
            results.insert(region.name.clone(), crashes);
        }
        Ok(results)
    }

    /// Counts crashes of every district of a region with probe requests only
    pub async fn count_region(
        &self,
        region: &FederalRegion,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<u64> {
        let (region_code, districts) = resolve_region(region)?;
        split_range(period_start, period_end)?;

        let mut total = 0;
        for district in districts {
            total += self
                .aggregator
                .count_range(&region_code, &district.okato, period_start, period_end)
                .await?;
        }
        Ok(total)
    }
}
