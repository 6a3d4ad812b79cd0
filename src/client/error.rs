//! Errors surfaced by [`super::Client`], aggregating every lower layer.

use crate::connector::ConnectorError;
use crate::crypto::CryptoError;
use crate::error::Error;
use crate::session::{SessionError, SessionErrorKind};
use crate::status::KnownStatus;

/// Client-level errors
pub type ClientError = Error<ClientErrorKind>;

/// Client-level error kinds (`spec.md` §7's four error kinds)
#[derive(Copy, Clone, Eq, PartialEq, Debug, Fail)]
pub enum ClientErrorKind {
    /// The reader/transport failed; session integrity is indeterminate
    /// and the session must be discarded.
    #[fail(display = "transport error")]
    TransportError,

    /// The card returned a known status other than success/additional-frame
    #[fail(display = "card returned {}", status)]
    ProtocolError {
        /// The status the card returned
        status: KnownStatus,
    },

    /// The three-pass authentication exchange did not verify
    #[fail(display = "authentication failed")]
    AuthenticationError,

    /// A CMAC or CRC check failed; the session was cleared unconditionally
    #[fail(display = "integrity error")]
    IntegrityError,

    /// A crypto primitive rejected its input (bad key/IV length, etc.)
    #[fail(display = "crypto error")]
    CryptoError,
}

impl From<ConnectorError> for ClientError {
    fn from(err: ConnectorError) -> Self {
        err!(ClientErrorKind::TransportError, "{}", err)
    }
}

impl From<CryptoError> for ClientError {
    fn from(err: CryptoError) -> Self {
        err!(ClientErrorKind::CryptoError, "{}", err)
    }
}

impl From<SessionError> for ClientError {
    fn from(err: SessionError) -> Self {
        let kind = match err.kind() {
            SessionErrorKind::TransportError => ClientErrorKind::TransportError,
            SessionErrorKind::AuthenticationError => ClientErrorKind::AuthenticationError,
            SessionErrorKind::IntegrityError => ClientErrorKind::IntegrityError,
            SessionErrorKind::CryptoError => ClientErrorKind::CryptoError,
            SessionErrorKind::ProtocolError { status } => ClientErrorKind::ProtocolError { status },
            // Malformed framing has no transport-level cause of its own, but
            // the session is just as unusable as after a transceive failure.
            SessionErrorKind::Framing => ClientErrorKind::TransportError,
        };
        err!(kind, "{}", err)
    }
}
