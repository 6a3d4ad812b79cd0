//! Errors surfaced by a [`super::Connector`] implementation.

use std::io;

use crate::error::Error;

/// Transport-level errors, distinct from DESFire status codes returned
/// *by the card* (those are [`crate::status::Status`] /
/// [`crate::client::ClientErrorKind::Protocol`]).
pub type ConnectorError = Error<ConnectorErrorKind>;

/// Transport error kinds
#[derive(Copy, Clone, Eq, PartialEq, Debug, Fail)]
pub enum ConnectorErrorKind {
    /// The reader could not be reached, or the card left the field
    #[fail(display = "connection failed")]
    ConnectionFailed,

    /// The underlying I/O operation failed
    #[fail(display = "I/O error")]
    IoError,

    /// The card's response was malformed for the chosen framing (e.g. a
    /// wrapped response shorter than the 2-byte status word)
    #[fail(display = "malformed response")]
    MalformedResponse,

    /// The transceive call did not complete before its deadline
    #[fail(display = "transport timed out")]
    Timeout,
}

impl From<io::Error> for ConnectorError {
    fn from(err: io::Error) -> Self {
        err!(ConnectorErrorKind::IoError, "{}", err)
    }
}
