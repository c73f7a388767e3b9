//! Per-subregion crash aggregation
//!
//! Each date window is fetched in two requests: a one-card probe that
//! reports the total count, then one request sized to exactly that count.
//! Multi-year periods are split into per-year windows and fetched in
//! chronological order.

use crate::crashes::page::{CrashPage, PageFetcher, PageOutcome};
use crate::crashes::window::{split_range, CardWindow, DateWindow};
use crate::{GibddError, Result};
use chrono::NaiveDate;

/// Fetches every crash of one subregion over a date range
#[derive(Debug, Clone)]
pub struct SubregionAggregator {
    fetcher: PageFetcher,
    legacy_page_size: u32,
}

impl SubregionAggregator {
    pub fn new(fetcher: PageFetcher, legacy_page_size: u32) -> Self {
        Self {
            fetcher,
            legacy_page_size: legacy_page_size.max(1),
        }
    }

    pub fn fetcher(&self) -> &PageFetcher {
        &self.fetcher
    }

    /// Learns how many cards a window holds with a one-card request
    ///
    /// `None` means there is nothing to fetch: upstream returned no payload,
    /// or reported a count of zero.
    pub async fn probe_count(
        &self,
        region: &str,
        subregion: &str,
        window: &DateWindow,
    ) -> Result<Option<u32>> {
        let outcome = self
            .fetcher
            .fetch_window(region, subregion, window, CardWindow::PROBE)
            .await?;

        Ok(match outcome {
            PageOutcome::Fetched(page) if page.total_count > 0 => Some(page.total_count),
            _ => None,
        })
    }

    /// Fetches all cards of one date window
    ///
    /// A window without crashes yields an empty page, not an error. A sized
    /// fetch that comes back empty after a non-zero probe is reported as
    /// `CrashesNotFound`.
    pub async fn fetch_year(
        &self,
        region: &str,
        subregion: &str,
        window: &DateWindow,
    ) -> Result<CrashPage> {
        let count = match self.probe_count(region, subregion, window).await? {
            Some(count) => count,
            None => {
                tracing::debug!("No crashes for subregion {} in {}", subregion, window);
                return Ok(CrashPage::empty(*window));
            }
        };

        let outcome = self
            .fetcher
            .fetch_window(region, subregion, window, CardWindow::sized(count))
            .await?;

        match outcome {
            PageOutcome::Fetched(page) => {
                if page.len() < count as usize {
                    // Upstream data may change between the probe and the fetch
                    tracing::warn!(
                        "Subregion {} in {}: probe reported {} cards, fetch returned {}",
                        subregion,
                        window,
                        count,
                        page.len()
                    );
                }
                Ok(page)
            }
            PageOutcome::Empty => Err(GibddError::CrashesNotFound {
                context: format!(
                    "subregion {} of region {} in {} after probe reported {} cards",
                    subregion, region, window, count
                ),
            }),
        }
    }

    /// Fetches all cards between two dates, one page per year window
    ///
    /// Pages are returned in chronological order. Windows without crashes
    /// are kept as empty pages. Failures carry the region, subregion and
    /// window they happened in.
    pub async fn fetch_range(
        &self,
        region: &str,
        subregion: &str,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Vec<CrashPage>> {
        let windows = split_range(period_start, period_end)?;
        tracing::info!(
            "Retrieving crashes for region {}, subregion {} ({} windows)",
            region,
            subregion,
            windows.len()
        );

        let mut pages = Vec::with_capacity(windows.len());
        for window in &windows {
            let page = self
                .fetch_year(region, subregion, window)
                .await
                .map_err(|e| with_context(e, region, subregion, window))?;
            pages.push(page);
        }

        let total: usize = pages.iter().map(CrashPage::len).sum();
        tracing::info!(
            "Data for subregion {} in region {} collected: {} crashes",
            subregion,
            region,
            total
        );

        Ok(pages)
    }

    /// Counts crashes between two dates with probe requests only
    pub async fn count_range(
        &self,
        region: &str,
        subregion: &str,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<u64> {
        let mut total = 0u64;
        for window in &split_range(period_start, period_end)? {
            let count = self
                .probe_count(region, subregion, window)
                .await
                .map_err(|e| with_context(e, region, subregion, window))?;
            total += u64::from(count.unwrap_or(0));
        }
        Ok(total)
    }

    /// Walks a window in fixed-size card pages until upstream runs dry
    ///
    /// Costs one request per page instead of two per window.
    #[deprecated(note = "Use fetch_year; pages shift when upstream data changes")]
    pub async fn fetch_year_paged(
        &self,
        region: &str,
        subregion: &str,
        window: &DateWindow,
    ) -> Result<Vec<CrashPage>> {
        let size = self.legacy_page_size;
        let mut pages = Vec::new();
        let mut start = 0u32;

        loop {
            let cards = CardWindow::new(start, start + size)?;
            let page = match self
                .fetcher
                .fetch_window(region, subregion, window, cards)
                .await?
            {
                PageOutcome::Fetched(page) if !page.is_empty() => page,
                _ => break,
            };

            let short = page.len() < size as usize;
            pages.push(page);
            if short {
                break;
            }
            start += size;
        }

        tracing::info!(
            "Data for subregion {} in region {} collected in {} pages",
            subregion,
            region,
            pages.len()
        );
        Ok(pages)
    }
}

fn with_context(
    error: GibddError,
    region: &str,
    subregion: &str,
    window: &DateWindow,
) -> GibddError {
    GibddError::Fetch {
        region: region.to_string(),
        subregion: subregion.to_string(),
        window: window.to_string(),
        source: Box::new(error),
    }
}
