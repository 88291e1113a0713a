//! `RadikoError` - error kinds surfaced by the radiko client.

use std::num::ParseIntError;

/// Underlying error kept as the `source` of transport and decode failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias for radiko operations.
pub type Result<T> = std::result::Result<T, RadikoError>;

/// Errors returned by the handshake, the schedule locator and the
/// collaborators they drive.
///
/// Callers branch on the variant, never on the message text.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum RadikoError {
    /// The request/response exchange failed (network error or non-2xx status).
    #[error("{context}")]
    Transport {
        /// What was being exchanged.
        context: String,
        /// Underlying HTTP client error, absent for status failures.
        #[source]
        source: Option<BoxError>,
    },

    /// A challenge header did not hold a non-negative decimal integer.
    #[error("invalid {header} header value: {value:?}")]
    Parse {
        /// Header name.
        header: &'static str,
        /// Raw header value.
        value: String,
        /// Integer parse failure.
        #[source]
        source: ParseIntError,
    },

    /// The challenge selects bytes outside the key material.
    #[error("partial key range out of bounds: offset={offset}, length={length}, key length={key_len}")]
    Range {
        /// Requested offset.
        offset: usize,
        /// Requested length.
        length: usize,
        /// Length of the key material.
        key_len: usize,
    },

    /// `auth2` returned no token at all.
    #[error("missing token in auth2 response")]
    EmptyResponse,

    /// `auth2` returned a token outside the `JP` region.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The caller supplied an unusable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// No program starts at the requested instant.
    #[error("program not found")]
    ProgramNotFound,

    /// A response body or timestamp could not be decoded.
    #[error("{context}")]
    Decode {
        /// What was being decoded.
        context: String,
        /// Underlying decoder error.
        #[source]
        source: BoxError,
    },

    /// The area detection page did not contain an area.
    #[error("unrecognised area response: {0}")]
    Area(String),
}

impl RadikoError {
    /// Builds a `Transport` error wrapping an HTTP client failure.
    pub(crate) fn transport(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    /// Builds a `Transport` error for an unsuccessful HTTP status.
    pub(crate) fn status(context: impl Into<String>) -> Self {
        Self::Transport {
            context: context.into(),
            source: None,
        }
    }

    /// Builds a `Decode` error.
    pub(crate) fn decode(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Decode {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Returns `true` for [`RadikoError::ProgramNotFound`].
    #[must_use]
    pub const fn is_program_not_found(&self) -> bool {
        matches!(self, Self::ProgramNotFound)
    }
}
