//! Crash retrieval module
//!
//! This module contains the pagination and aggregation logic, including:
//! - Date range splitting into per-year month windows
//! - Single card-window fetches with empty/malformed classification
//! - Probe-then-fetch aggregation per subregion
//! - Concurrent fan-out across the districts of a federal region

mod aggregator;
mod fanout;
mod models;
mod page;
mod window;

pub use aggregator::SubregionAggregator;
pub use fanout::{CountryCrashes, RegionCrashes, RegionFanOut};
pub use models::{
    CardDataPayload, CardDataRequest, CardOrder, CrashCard, CrashInfo, ParticipantInfo,
    VehicleInfo,
};
pub use page::{decode_card_response, CrashPage, PageFetcher, PageOutcome, CARD_DATA_PATH};
pub use window::{date_tag, split_range, CardWindow, DateWindow};
