//! API client library for radimgr.
//!
//! Provides the radiko client: token authorization, program lookup by
//! start time and schedule listings.

/// radiko API client.
pub mod radiko;
