//! XML response wrapper types and custom deserializers.

use chrono::{DateTime, FixedOffset};
use serde::de::Error;
use serde::{Deserialize, Deserializer};

use super::error::RadikoError;
use super::time::{parse_radiko_date, parse_radiko_datetime};
use super::types::{DailySchedule, Program, StationSchedule};

/// Deserializes empty strings as `None` (for `String` fields).
pub fn deserialize_empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let result = Option::deserialize(deserializer);
    let s: Option<String> = result.map_err(D::Error::custom)?;
    Ok(s.filter(|s| !s.trim().is_empty()))
}

/// Deserializes empty strings as `None` (for `u32` fields).
pub fn deserialize_empty_string_as_none_u32<'de, D>(
    deserializer: D,
) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let result = Option::deserialize(deserializer);
    let s: Option<String> = result.map_err(D::Error::custom)?;
    match s.as_deref() {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse::<u32>()
            .map(Some)
            .map_err(|e| D::Error::custom(format!("failed to parse u32: {e}"))),
    }
}

/// Deserializes a `YYYYMMDDhhmmss` JST attribute into an instant.
pub fn deserialize_radiko_datetime<'de, D>(
    deserializer: D,
) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_radiko_datetime(&s).map_err(D::Error::custom)
}

/// `<radiko>` root of every `v3/program/*` response.
#[derive(Debug, Deserialize)]
#[serde(rename = "radiko")]
pub struct ProgramResponse {
    /// Station list (absent when the area or station is unknown).
    #[serde(default)]
    pub stations: Option<StationItems>,
}

/// `<stations>` container.
#[derive(Debug, Deserialize)]
pub struct StationItems {
    #[serde(rename = "station", default)]
    pub items: Vec<StationItem>,
}

/// `<station>` element.
#[derive(Debug, Deserialize)]
pub struct StationItem {
    /// Station ID.
    #[serde(rename = "@id")]
    pub id: String,
    /// Station display name.
    #[serde(default)]
    pub name: String,
    /// One `<progs>` element per broadcast day.
    #[serde(rename = "progs", default)]
    pub progs: Vec<ProgItems>,
}

/// `<progs>` element: one broadcast day.
#[derive(Debug, Deserialize)]
pub struct ProgItems {
    /// Broadcast date (`YYYYMMDD`).
    pub date: String,
    #[serde(rename = "prog", default)]
    pub items: Vec<Program>,
}

impl StationItem {
    /// Converts into a [`StationSchedule`], tagging every program with the
    /// station ID.
    ///
    /// # Errors
    ///
    /// Returns `RadikoError::Decode` if a `<date>` is malformed.
    pub fn into_schedule(self) -> Result<StationSchedule, RadikoError> {
        let station_id = self.id;
        let days = self
            .progs
            .into_iter()
            .map(|day| {
                let date = parse_radiko_date(&day.date)?;
                let programs = day
                    .items
                    .into_iter()
                    .map(|program| Program {
                        station_id: station_id.clone(),
                        ..program
                    })
                    .collect();
                Ok(DailySchedule { date, programs })
            })
            .collect::<Result<Vec<_>, RadikoError>>()?;

        Ok(StationSchedule {
            station_id,
            station_name: self.name,
            days,
        })
    }
}
