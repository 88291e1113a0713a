//! Area detection from the radiko `area` endpoint.

use std::sync::LazyLock;

use regex::Regex;

use super::error::{RadikoError, Result};

/// Regex for the `<span class="JP13">TOKYO JAPAN</span>` fragment.
#[allow(clippy::expect_used)]
static AREA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"class="(JP\d+)"\s*>([^<]*)<"#).expect("failed to compile area regex")
});

/// Broadcast area resolved from the caller's IP address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    /// Area ID (e.g. `JP13`).
    pub id: String,
    /// Area name (e.g. `TOKYO JAPAN`).
    pub name: String,
}

/// Extracts the area from the `area` endpoint body.
///
/// # Input format
///
/// ```text
/// document.write('<span class="JP13">TOKYO JAPAN</span>');
/// ```
///
/// # Errors
///
/// Returns `RadikoError::Area` if the body carries no `JP` area, which is
/// what the endpoint answers outside Japan.
pub fn parse_area_response(body: &str) -> Result<Area> {
    let caps = AREA_RE
        .captures(body)
        .ok_or_else(|| RadikoError::Area(body.trim().to_owned()))?;
    let id = caps.get(1).map_or("", |m| m.as_str());
    let name = caps.get(2).map_or("", |m| m.as_str().trim());
    Ok(Area {
        id: id.to_owned(),
        name: name.to_owned(),
    })
}
