//! Single-window crash card fetch
//!
//! One call here is one upstream request: a card window inside one
//! region/subregion/date window. Undecodable payloads are the upstream's way
//! of saying "nothing here" and come back as [`PageOutcome::Empty`]; transport
//! failures propagate unchanged.

use crate::crashes::models::{CardDataEnvelope, CardDataPayload, CardDataRequest, CrashCard};
use crate::crashes::window::{CardWindow, DateWindow};
use crate::transport::{RawResponse, Transport};
use crate::Result;
use std::sync::Arc;

/// Path of the crash card endpoint
pub const CARD_DATA_PATH: &str = "/map/getDTPCardData";

/// Crash cards for one date window of one subregion
#[derive(Debug, Clone, PartialEq)]
pub struct CrashPage {
    /// Date window the cards were requested for
    pub window: DateWindow,

    /// Region display name as reported upstream (empty for empty pages)
    pub region_name: String,

    /// Total cards available for the query, regardless of the card window
    pub total_count: u32,

    /// Cards in upstream order (by date, ascending)
    pub cards: Vec<CrashCard>,
}

impl CrashPage {
    /// A page for a window without crashes
    pub fn empty(window: DateWindow) -> Self {
        Self {
            window,
            region_name: String::new(),
            total_count: 0,
            cards: Vec::new(),
        }
    }

    fn from_payload(window: DateWindow, payload: CardDataPayload) -> Self {
        Self {
            window,
            region_name: payload.region_name,
            total_count: payload.total_count,
            cards: payload.cards,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }
}

/// Result of one window fetch that reached upstream
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// A decodable page
    Fetched(CrashPage),
    /// Upstream returned no usable payload for the window
    Empty,
}

impl PageOutcome {
    pub fn into_page(self) -> Option<CrashPage> {
        match self {
            PageOutcome::Fetched(page) => Some(page),
            PageOutcome::Empty => None,
        }
    }
}

/// Decodes the doubly-encoded card payload
///
/// Returns `None` when the envelope, its `data` string, or the payload inside
/// it is missing or malformed.
pub fn decode_card_response(response: &RawResponse) -> Option<CardDataPayload> {
    let envelope: CardDataEnvelope = match response.json() {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!("Card response is not a JSON envelope: {}", e);
            return None;
        }
    };

    let data = envelope.data.filter(|d| !d.trim().is_empty())?;

    match serde_json::from_str(&data) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::debug!("Card payload could not be decoded: {}", e);
            None
        }
    }
}

/// Fetches card windows from the crash card endpoint
#[derive(Debug, Clone)]
pub struct PageFetcher {
    transport: Arc<Transport>,
}

impl PageFetcher {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// Fetches one card window
    ///
    /// # Arguments
    ///
    /// * `region` - OKATO code of the federal region
    /// * `subregion` - OKATO code of the subregion
    /// * `window` - Month span inside one year
    /// * `cards` - Slice of the result set to return
    ///
    /// # Returns
    ///
    /// * `Ok(PageOutcome::Fetched)` - Decoded page
    /// * `Ok(PageOutcome::Empty)` - No data for this window
    /// * `Err(GibddError)` - Transport or HTTP failure
    pub async fn fetch_window(
        &self,
        region: &str,
        subregion: &str,
        window: &DateWindow,
        cards: CardWindow,
    ) -> Result<PageOutcome> {
        let request = CardDataRequest::new(region, subregion, window, cards);
        let form = request.to_form()?;

        let response = self.transport.post_json(CARD_DATA_PATH, &form).await?;

        match decode_card_response(&response) {
            Some(payload) => {
                tracing::debug!(
                    "Fetched cards {}-{} of {} for subregion {} ({}), {} total",
                    cards.start(),
                    cards.end(),
                    window,
                    subregion,
                    payload.region_name,
                    payload.total_count
                );
                Ok(PageOutcome::Fetched(CrashPage::from_payload(*window, payload)))
            }
            None => {
                tracing::debug!("No crashes for subregion {} in {}", subregion, window);
                Ok(PageOutcome::Empty)
            }
        }
    }
}
