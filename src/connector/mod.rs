//! The transport interface the core consumes (`spec.md` §6): a single
//! `transceive` operation, plus the `Framing` choice a transport is built
//! with (native vs. ISO 7816-4 wrapped — `spec.md` §4.3.4).

mod error;

pub use self::error::{ConnectorError, ConnectorErrorKind};

/// How the session layer frames outgoing APDUs and parses incoming ones.
/// A construction-time property of the client, not something the session
/// decides per-command.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Framing {
    /// `[INS, params…]`; the response's first byte is the status, the rest
    /// is payload.
    Native,

    /// `[0x90, INS, 0x00, 0x00, Lc, params…, 0x00]`, `Lc = len(params)`;
    /// the response carries the 2-byte status word `91 XX`.
    IsoWrapped,
}

/// Anything able to physically transceive a framed APDU to a DESFire card
/// and return its response. One contactless field, one card: a `Connector`
/// is not expected to be used by more than one caller at a time (`spec.md`
/// §5).
pub trait Connector {
    /// Send `request` (already framed per the connector's [`Framing`]) and
    /// return the card's raw response bytes.
    fn transceive(&mut self, request: &[u8]) -> Result<Vec<u8>, ConnectorError>;

    /// The framing this connector's transport expects.
    fn framing(&self) -> Framing;
}
