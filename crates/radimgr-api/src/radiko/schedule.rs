//! Program lookup by exact start time.

use chrono::{DateTime, FixedOffset};
use tracing::instrument;

use super::api::LocalRadikoApi;
use super::error::{RadikoError, Result};
use super::types::Program;

/// Finds the program of `station_id` that starts exactly at `target_start`.
///
/// Scans the station's weekly schedule day by day and returns the first
/// program whose start instant equals `target_start`. Instants compare
/// across offsets, so a UTC value matches the JST schedule.
///
/// # Errors
///
/// - `RadikoError::InvalidArgument` if `station_id` is empty (nothing is fetched).
/// - `RadikoError::ProgramNotFound` if no program starts at `target_start`.
/// - Any error of [`LocalRadikoApi::weekly_programs`].
#[instrument(skip_all, fields(%station_id))]
pub async fn find_program_by_start_time(
    api: &(impl LocalRadikoApi + Sync),
    station_id: &str,
    target_start: DateTime<FixedOffset>,
) -> Result<Program> {
    if station_id.is_empty() {
        return Err(RadikoError::InvalidArgument("station id must not be empty"));
    }

    let weekly = api.weekly_programs(station_id).await?;
    tracing::debug!(
        days = weekly.days.len(),
        target = %target_start,
        "searching weekly schedule"
    );

    let found = weekly
        .programs()
        .find(|program| program.start == target_start)
        .cloned();
    found.ok_or(RadikoError::ProgramNotFound)
}
