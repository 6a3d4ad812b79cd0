//! Errors raised by the session/framing layer.

use crate::crypto::CryptoError;
use crate::error::Error;
use crate::status::KnownStatus;

/// Session-layer errors
pub type SessionError = Error<SessionErrorKind>;

/// Session-layer error kinds
#[derive(Copy, Clone, Eq, PartialEq, Debug, Fail)]
pub enum SessionErrorKind {
    /// The transport failed to deliver a request or return a response;
    /// the session's CMAC state is indeterminate afterwards.
    #[fail(display = "transport error")]
    TransportError,

    /// The three-pass mutual authentication exchange did not verify
    #[fail(display = "authentication failed")]
    AuthenticationError,

    /// A received CMAC did not match, or a CRC inside a decrypted payload
    /// was wrong. The session's running IV may have diverged from the
    /// card's and is unconditionally cleared.
    #[fail(display = "integrity check failed")]
    IntegrityError,

    /// The card returned a known status other than success/additional-frame
    #[fail(display = "card returned {}", status)]
    ProtocolError {
        /// The status the card returned
        status: KnownStatus,
    },

    /// Framing was malformed: a native response shorter than one status
    /// byte, a wrapped response shorter than the 2-byte status word, a
    /// status byte this crate doesn't recognize, an oversized command, etc.
    #[fail(display = "protocol framing error")]
    Framing,

    /// A crypto primitive failed (bad key/IV length, non-block-aligned
    /// input)
    #[fail(display = "crypto error")]
    CryptoError,
}

impl From<CryptoError> for SessionError {
    fn from(err: CryptoError) -> Self {
        err!(SessionErrorKind::CryptoError, "{}", err)
    }
}
