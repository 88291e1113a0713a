//! `RadikoApi` trait definition.
#![allow(clippy::future_not_send)]

use chrono::NaiveDate;

use super::area::Area;
use super::error::Result;
use super::types::{StationSchedule, WeeklySchedule};

/// radiko program schedule API trait.
///
/// Abstracts the fetch-and-decode operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(RadikoApi: Send)]
pub trait LocalRadikoApi {
    /// Fetches one station's schedule for the current week.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or XML decoding fails.
    async fn weekly_programs(&self, station_id: &str) -> Result<WeeklySchedule>;

    /// Fetches every station's schedule of one broadcast date in an area.
    /// Falls back to the configured area when `area_id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if no area is known, or the HTTP request or XML
    /// decoding fails.
    async fn programs_by_date(
        &self,
        date: NaiveDate,
        area_id: Option<&str>,
    ) -> Result<Vec<StationSchedule>>;

    /// Fetches the programs currently on air in an area.
    /// Falls back to the configured area when `area_id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if no area is known, or the HTTP request or XML
    /// decoding fails.
    async fn now_programs(&self, area_id: Option<&str>) -> Result<Vec<StationSchedule>>;

    /// Detects the broadcast area of the caller's IP address.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the area is not in Japan.
    async fn detect_area(&self) -> Result<Area>;
}
