//! radiko API client module.
//!
//! Performs the two-step `auth1`/`auth2` handshake, locates programs by
//! their start time and retrieves the `v3/program` schedule listings.

mod api;
mod area;
mod auth;
mod client;
mod error;
mod schedule;
mod time;
mod transport;
mod types;
pub(crate) mod xml;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalRadikoApi, RadikoApi};
pub use area::{Area, parse_area_response};
pub use auth::{
    AUTH_KEY, Challenge, authorize_token, derive_partial_key, request_challenge,
    submit_partial_key, verify_auth2_response,
};
#[allow(clippy::module_name_repetitions)]
pub use client::{DEFAULT_BASE_URL, RadikoClient, RadikoClientBuilder};
#[allow(clippy::module_name_repetitions)]
pub use error::{BoxError, RadikoError, Result};
pub use schedule::find_program_by_start_time;
pub use time::{
    JST, broadcast_date, parse_jst_datetime, parse_radiko_date, parse_radiko_datetime,
    to_radiko_date, to_radiko_datetime,
};
#[allow(clippy::module_name_repetitions)]
pub use transport::{LocalRadikoTransport, RadikoTransport, TransportRequest, TransportResponse};
pub use types::{AuthToken, DailySchedule, Genre, GenreTag, Program, StationSchedule, WeeklySchedule};
