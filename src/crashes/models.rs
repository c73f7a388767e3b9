//! Wire models for the crash card endpoint
//!
//! Upstream uses short locale-specific field names and is loose about types
//! (numbers arrive as strings, lists as `null`), so every field is decoded
//! leniently and missing fields fall back to defaults.

use crate::crashes::window::{CardWindow, DateWindow};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Sort order sent with every card request
#[derive(Debug, Clone, Serialize)]
pub struct CardOrder {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(rename = "fieldName")]
    pub field_name: String,
}

impl Default for CardOrder {
    /// By date, ascending
    fn default() -> Self {
        Self {
            kind: 1,
            field_name: "dat".to_string(),
        }
    }
}

/// Body of a `getDTPCardData` request before it is escaped into `data`
#[derive(Debug, Clone, Serialize)]
pub struct CardDataRequest {
    pub date: Vec<String>,
    #[serde(rename = "ParReg")]
    pub region: String,
    pub order: CardOrder,
    #[serde(rename = "reg")]
    pub subregion: String,
    pub ind: String,
    pub st: String,
    pub en: String,
}

impl CardDataRequest {
    pub fn new(region: &str, subregion: &str, window: &DateWindow, cards: CardWindow) -> Self {
        Self {
            date: window.date_tags(),
            region: region.to_string(),
            order: CardOrder::default(),
            subregion: subregion.to_string(),
            ind: "1".to_string(),
            st: cards.start().to_string(),
            en: cards.end().to_string(),
        }
    }

    /// The form upstream expects: the request JSON escaped into a string field
    pub fn to_form(&self) -> serde_json::Result<Value> {
        let data = serde_json::to_string(self)?;
        Ok(serde_json::json!({ "data": data }))
    }
}

/// Outer response object; `data` holds a JSON-encoded string
#[derive(Debug, Deserialize)]
pub(crate) struct CardDataEnvelope {
    #[serde(default)]
    pub data: Option<String>,
}

/// Decoded contents of the `data` string
#[derive(Debug, Clone, Deserialize)]
pub struct CardDataPayload {
    #[serde(rename = "RegName", deserialize_with = "lenient::string")]
    pub region_name: String,

    #[serde(rename = "countCard", deserialize_with = "lenient::number")]
    pub total_count: u32,

    #[serde(default, deserialize_with = "lenient::number")]
    pub start: u32,

    #[serde(default, deserialize_with = "lenient::number")]
    pub end: u32,

    #[serde(rename = "tab", default, deserialize_with = "lenient::list")]
    pub cards: Vec<CrashCard>,
}

/// One incident as returned by upstream
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CrashCard {
    /// Upstream card id; zero when the card carries none
    #[serde(rename = "KartId", default, deserialize_with = "lenient::number")]
    pub id: u64,

    #[serde(rename = "DTP_V", default, deserialize_with = "lenient::string")]
    pub crash_type: String,

    #[serde(rename = "District", default, deserialize_with = "lenient::string")]
    pub district: String,

    #[serde(rename = "K_TS", default, deserialize_with = "lenient::number")]
    pub vehicles_amount: u32,

    #[serde(rename = "K_UCH", default, deserialize_with = "lenient::number")]
    pub participants_amount: u32,

    #[serde(rename = "POG", default, deserialize_with = "lenient::number")]
    pub deceased: u32,

    #[serde(rename = "RAN", default, deserialize_with = "lenient::number")]
    pub wounded: u32,

    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,

    #[serde(rename = "Time", default, deserialize_with = "lenient::string")]
    pub time: String,

    #[serde(rename = "rowNum", default, deserialize_with = "lenient::number")]
    pub row: u32,

    #[serde(rename = "infoDtp", default)]
    pub info: CrashInfo,
}

/// Location, road and environment details of a crash
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CrashInfo {
    #[serde(rename = "COORD_L", default, deserialize_with = "lenient::float")]
    pub longitude: f64,

    #[serde(rename = "COORD_W", default, deserialize_with = "lenient::float")]
    pub latitude: f64,

    #[serde(rename = "OBJ_DTP", default, deserialize_with = "lenient::string_list")]
    pub objects_near_crash: Vec<String>,

    #[serde(rename = "change_org_motion", default, deserialize_with = "lenient::string")]
    pub motion_changes: String,

    #[serde(rename = "dor", default, deserialize_with = "lenient::string")]
    pub main_road: String,

    #[serde(rename = "dor_k", default, deserialize_with = "lenient::string")]
    pub road_category: String,

    #[serde(rename = "dor_z", default, deserialize_with = "lenient::string")]
    pub road_significance: String,

    #[serde(rename = "factor", default, deserialize_with = "lenient::string_list")]
    pub motion_affecting_factors: Vec<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub house: String,

    #[serde(rename = "k_ul", default, deserialize_with = "lenient::string")]
    pub street_category: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub km: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub m: String,

    #[serde(rename = "n_p", default, deserialize_with = "lenient::string")]
    pub settlement: String,

    #[serde(rename = "ndu", default, deserialize_with = "lenient::string_list")]
    pub road_deficiencies: Vec<String>,

    #[serde(rename = "osv", default, deserialize_with = "lenient::string")]
    pub light_conditions: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub s_dtp: String,

    #[serde(rename = "s_pch", default, deserialize_with = "lenient::string")]
    pub road_conditions: String,

    #[serde(rename = "s_pog", default, deserialize_with = "lenient::string_list")]
    pub weather: Vec<String>,

    #[serde(rename = "sdor", default, deserialize_with = "lenient::string_list")]
    pub road_objects: Vec<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub street: String,

    #[serde(rename = "ts_info", default, deserialize_with = "lenient::list")]
    pub vehicles: Vec<VehicleInfo>,

    #[serde(rename = "uchInfo", default, deserialize_with = "lenient::list")]
    pub participants: Vec<ParticipantInfo>,
}

/// A vehicle involved in a crash, with its occupants
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VehicleInfo {
    #[serde(default, deserialize_with = "lenient::string")]
    pub color: String,

    #[serde(rename = "f_sob", default, deserialize_with = "lenient::string")]
    pub property_form: String,

    #[serde(rename = "g_v", default, deserialize_with = "lenient::string")]
    pub issued_year: String,

    #[serde(rename = "m_pov", default, deserialize_with = "lenient::string")]
    pub damage_points: String,

    #[serde(rename = "m_ts", default, deserialize_with = "lenient::string")]
    pub model: String,

    #[serde(rename = "marka_ts", default, deserialize_with = "lenient::string")]
    pub brand: String,

    #[serde(rename = "n_ts", default, deserialize_with = "lenient::string")]
    pub number: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub o_pf: String,

    #[serde(rename = "r_rul", default, deserialize_with = "lenient::string")]
    pub steering: String,

    #[serde(rename = "t_n", default, deserialize_with = "lenient::string")]
    pub technical_defects: String,

    #[serde(rename = "t_ts", default, deserialize_with = "lenient::string")]
    pub vehicle_type: String,

    #[serde(rename = "ts_s", default, deserialize_with = "lenient::string")]
    pub left_crash_site: String,

    #[serde(rename = "ts_uch", default, deserialize_with = "lenient::list")]
    pub occupants: Vec<ParticipantInfo>,
}

/// A person involved in a crash
///
/// The driver-only fields are empty for crash-level participants.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ParticipantInfo {
    #[serde(rename = "ALCO", default, deserialize_with = "lenient::string")]
    pub alcohol_level: String,

    #[serde(rename = "K_UCH", default, deserialize_with = "lenient::string")]
    pub category: String,

    #[serde(rename = "POL", default, deserialize_with = "lenient::string")]
    pub gender: String,

    #[serde(rename = "NPDD", default, deserialize_with = "lenient::string_list")]
    pub direct_violations: Vec<String>,

    #[serde(rename = "N_UCH", default, deserialize_with = "lenient::string")]
    pub number: String,

    #[serde(rename = "SOP_NPDD", default, deserialize_with = "lenient::string_list")]
    pub supplemental_violations: Vec<String>,

    #[serde(rename = "S_SM", default, deserialize_with = "lenient::string")]
    pub left_crash_site: String,

    #[serde(rename = "S_T", default, deserialize_with = "lenient::string")]
    pub injury_severity: String,

    #[serde(rename = "V_ST", default, deserialize_with = "lenient::string")]
    pub driving_experience: String,

    #[serde(rename = "INJURED_CARD_ID", default, deserialize_with = "lenient::string")]
    pub injured_card_id: String,

    #[serde(rename = "SAFETY_BELT", default, deserialize_with = "lenient::string")]
    pub safety_belt: String,

    #[serde(rename = "S_SEAT_GROUP", default, deserialize_with = "lenient::string")]
    pub seat_group: String,
}

mod lenient {
    use super::*;
    use serde::de::{DeserializeOwned, Error};
    use std::str::FromStr;

    fn scalar_to_string(value: Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        }
    }

    /// String, number, bool or null as a string
    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(scalar_to_string(Value::deserialize(deserializer)?))
    }

    /// Number or numeric string; null and empty string become zero
    pub fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr + Default,
        T::Err: std::fmt::Display,
    {
        let text = scalar_to_string(Value::deserialize(deserializer)?);
        let text = text.trim();
        if text.is_empty() {
            return Ok(T::default());
        }
        text.parse::<T>().map_err(D::Error::custom)
    }

    /// Float or numeric string; unparsable values become zero
    pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => n.as_f64().unwrap_or_default(),
            other => scalar_to_string(other).trim().parse().unwrap_or_default(),
        })
    }

    /// List of scalars; a single scalar becomes a one-element list
    pub fn string_list<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => Vec::new(),
            Value::Array(items) => items.into_iter().map(scalar_to_string).collect(),
            other => vec![scalar_to_string(other)],
        })
    }

    /// List of objects; null becomes empty
    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Vec::new()),
            other => serde_json::from_value(other).map_err(D::Error::custom),
        }
    }
}
