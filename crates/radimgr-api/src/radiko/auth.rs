//! Two-step (`auth1` / `auth2`) handshake against the radiko backend.
//!
//! `auth1` hands out a token plus an (offset, length) challenge. The client
//! answers on `auth2` with the base64 of that slice of [`AUTH_KEY`], and the
//! server replies with the caller's area, which must be inside Japan.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::instrument;

use super::error::{RadikoError, Result};
use super::transport::{LocalRadikoTransport, TransportRequest, TransportResponse};
use super::types::AuthToken;

/// Key material shared with the radiko HTML5 player.
pub const AUTH_KEY: &str = "bcd151073c03b352e1ef2fd66c32209da9ca0afa";

/// Challenge endpoint.
const AUTH1_PATH: &str = "v2/api/auth1";

/// Response endpoint.
const AUTH2_PATH: &str = "v2/api/auth2";

/// Identity headers sent on both handshake requests.
const IDENTITY_HEADERS: [(&str, &str); 4] = [
    ("X-Radiko-App", "pc_html5"),
    ("X-Radiko-App-Version", "0.0.1"),
    ("X-Radiko-User", "dummy_user"),
    ("X-Radiko-Device", "pc"),
];

/// Session token header (auth1 response, auth2 request, later requests).
pub(crate) const AUTH_TOKEN_HEADER: &str = "X-Radiko-AuthToken";

const KEY_LENGTH_HEADER: &str = "X-Radiko-KeyLength";
const KEY_OFFSET_HEADER: &str = "X-Radiko-KeyOffset";
const PARTIAL_KEY_HEADER: &str = "X-Radiko-Partialkey";

/// Region prefix the first `auth2` token must carry.
const REGION_PREFIX: &str = "JP";

/// Challenge parameters returned by `auth1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Token to activate in `auth2`.
    pub auth_token: AuthToken,
    /// Number of key bytes to send back.
    pub length: usize,
    /// Start of the slice within the key.
    pub offset: usize,
}

/// Builds a request carrying the identity headers.
fn identity_request(path: &str) -> TransportRequest {
    IDENTITY_HEADERS
        .iter()
        .fold(TransportRequest::get(path).handshake(), |req, &(name, value)| {
            req.header(name, value)
        })
}

/// Reads a decimal challenge header. A missing header reads as empty and
/// fails like any other malformed value.
fn parse_key_header(response: &TransportResponse, header: &'static str) -> Result<usize> {
    let value = response.header(header).unwrap_or_default();
    value.parse::<usize>().map_err(|source| RadikoError::Parse {
        header,
        value: value.to_owned(),
        source,
    })
}

/// Base64 of `key[offset..offset + length]`, bounds checked.
fn slice_key(key: &str, offset: usize, length: usize) -> Result<String> {
    let out_of_range = || RadikoError::Range {
        offset,
        length,
        key_len: key.len(),
    };
    let end = offset.checked_add(length).ok_or_else(out_of_range)?;
    let bytes = key.as_bytes().get(offset..end).ok_or_else(out_of_range)?;
    Ok(STANDARD.encode(bytes))
}

/// Splits the `auth2` body on `,`. A blank body yields no tokens.
fn split_auth2_body(body: &str) -> Vec<String> {
    if body.trim().is_empty() {
        return Vec::new();
    }
    body.split(',').map(String::from).collect()
}

/// Derives the partial key for an `auth1` challenge.
///
/// # Errors
///
/// Returns `RadikoError::Range` if `offset + length` exceeds [`AUTH_KEY`].
pub fn derive_partial_key(offset: usize, length: usize) -> Result<String> {
    slice_key(AUTH_KEY, offset, length)
}

/// Checks the `auth2` tokens: the first one, trimmed, must start with `JP`.
///
/// # Errors
///
/// - `RadikoError::EmptyResponse` if there are no tokens.
/// - `RadikoError::InvalidToken` if the first token is outside the region.
pub fn verify_auth2_response<S: AsRef<str>>(tokens: &[S]) -> Result<()> {
    let first = tokens.first().ok_or(RadikoError::EmptyResponse)?;
    let first = first.as_ref().trim();
    if !first.starts_with(REGION_PREFIX) {
        return Err(RadikoError::InvalidToken(first.to_owned()));
    }
    Ok(())
}

/// Step 1: requests a token and key challenge.
///
/// # Errors
///
/// - `RadikoError::Transport` if the exchange fails.
/// - `RadikoError::Parse` if the key length or offset is not a decimal integer.
#[instrument(skip_all)]
pub async fn request_challenge(
    transport: &(impl LocalRadikoTransport + Sync),
) -> Result<Challenge> {
    let response = transport.send(identity_request(AUTH1_PATH)).await?;

    let auth_token = AuthToken::new(response.header(AUTH_TOKEN_HEADER).unwrap_or_default());
    let length = parse_key_header(&response, KEY_LENGTH_HEADER)?;
    let offset = parse_key_header(&response, KEY_OFFSET_HEADER)?;

    tracing::debug!(length, offset, "auth1 challenge received");
    Ok(Challenge {
        auth_token,
        length,
        offset,
    })
}

/// Step 2: activates `auth_token` with the partial key and returns the
/// comma-separated tokens of the response body.
///
/// # Errors
///
/// Returns `RadikoError::Transport` if the exchange fails.
#[instrument(skip_all)]
pub async fn submit_partial_key(
    transport: &(impl LocalRadikoTransport + Sync),
    auth_token: &AuthToken,
    partial_key: &str,
) -> Result<Vec<String>> {
    let request = identity_request(AUTH2_PATH)
        .header(AUTH_TOKEN_HEADER, auth_token.as_str())
        .header(PARTIAL_KEY_HEADER, partial_key);
    let response = transport.send(request).await?;

    tracing::debug!(body_len = response.body.len(), "auth2 response received");
    Ok(split_auth2_body(&response.body))
}

/// Runs the full handshake: challenge, partial key, response, verification.
///
/// Stops at the first failing stage and returns its error unchanged.
///
/// # Errors
///
/// Any error of [`request_challenge`], [`derive_partial_key`],
/// [`submit_partial_key`] or [`verify_auth2_response`].
#[instrument(skip_all)]
pub async fn authorize_token(transport: &(impl LocalRadikoTransport + Sync)) -> Result<AuthToken> {
    let challenge = request_challenge(transport).await?;
    let partial_key = derive_partial_key(challenge.offset, challenge.length)?;
    let tokens = submit_partial_key(transport, &challenge.auth_token, &partial_key).await?;
    verify_auth2_response(&tokens)?;

    let area = tokens.first().map_or("", |t| t.trim());
    tracing::info!(%area, "radiko authorization succeeded");
    Ok(challenge.auth_token)
}
