//! radiko domain types.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;

use super::xml::{
    deserialize_empty_string_as_none, deserialize_empty_string_as_none_u32,
    deserialize_radiko_datetime,
};

/// Session token issued by `auth1` and activated by `auth2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wraps a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single broadcast from a `<prog>` element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Program {
    /// Station the program airs on (filled from the enclosing `<station>`).
    #[serde(skip)]
    pub station_id: String,
    /// Program ID.
    #[serde(
        rename = "@id",
        deserialize_with = "deserialize_empty_string_as_none",
        default
    )]
    pub id: Option<String>,
    /// Start instant (`ft`, JST on the wire).
    #[serde(rename = "@ft", deserialize_with = "deserialize_radiko_datetime")]
    pub start: DateTime<FixedOffset>,
    /// End instant (`to`, JST on the wire).
    #[serde(rename = "@to", deserialize_with = "deserialize_radiko_datetime")]
    pub end: DateTime<FixedOffset>,
    /// Duration in seconds.
    #[serde(
        rename = "@dur",
        deserialize_with = "deserialize_empty_string_as_none_u32",
        default
    )]
    pub duration_secs: Option<u32>,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Performers.
    #[serde(
        rename = "pfm",
        deserialize_with = "deserialize_empty_string_as_none",
        default
    )]
    pub performers: Option<String>,
    /// Short description.
    #[serde(deserialize_with = "deserialize_empty_string_as_none", default)]
    pub desc: Option<String>,
    /// Long description (HTML fragment).
    #[serde(deserialize_with = "deserialize_empty_string_as_none", default)]
    pub info: Option<String>,
    /// Program web page.
    #[serde(deserialize_with = "deserialize_empty_string_as_none", default)]
    pub url: Option<String>,
    /// Program image.
    #[serde(
        rename = "img",
        deserialize_with = "deserialize_empty_string_as_none",
        default
    )]
    pub image: Option<String>,
    /// Genre classification.
    #[serde(default)]
    pub genre: Option<Genre>,
}

/// `<genre>` element of a program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Genre {
    /// Personality genre (e.g. comedian, musician).
    #[serde(default)]
    pub personality: Option<GenreTag>,
    /// Program genre (e.g. variety, news).
    #[serde(default)]
    pub program: Option<GenreTag>,
}

/// One genre entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenreTag {
    /// Genre code.
    #[serde(rename = "@id")]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Programs of one station for one broadcast day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySchedule {
    /// Broadcast date (radiko days start at 05:00 JST).
    pub date: NaiveDate,
    /// Programs in airing order.
    pub programs: Vec<Program>,
}

/// Day-partitioned schedule of one station.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub struct StationSchedule {
    /// Station ID (e.g. `LFR`).
    pub station_id: String,
    /// Station display name.
    pub station_name: String,
    /// Daily schedules in chronological order.
    pub days: Vec<DailySchedule>,
}

impl StationSchedule {
    /// Iterates over every program of every day, in order.
    pub fn programs(&self) -> impl Iterator<Item = &Program> {
        self.days.iter().flat_map(|day| day.programs.iter())
    }
}

/// A station's schedule across the current week.
pub type WeeklySchedule = StationSchedule;
