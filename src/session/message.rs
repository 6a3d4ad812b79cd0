//! APDU request/response framing, in both supported wire shapes
//! (`spec.md` §4.3.4).

use crate::connector::Framing;
use crate::status::Status;

use super::error::{SessionError, SessionErrorKind::Framing as FramingError};

/// The `0xAF` instruction byte used both for authentication pass 2 and for
/// 0xAF continuation frames.
pub const INS_ADDITIONAL_FRAME: u8 = 0xAF;

/// An outgoing instruction plus its parameter bytes, not yet wire-framed.
#[derive(Debug)]
pub struct ApduRequest {
    pub ins: u8,
    pub data: Vec<u8>,
}

impl ApduRequest {
    pub fn new(ins: u8, data: Vec<u8>) -> Self {
        ApduRequest { ins, data }
    }

    /// A bare continuation request, `0xAF` with no parameters.
    pub fn continuation() -> Self {
        ApduRequest::new(INS_ADDITIONAL_FRAME, Vec::new())
    }

    /// Frame this request per `framing`.
    pub fn to_bytes(&self, framing: Framing) -> Vec<u8> {
        match framing {
            Framing::Native => {
                let mut bytes = Vec::with_capacity(1 + self.data.len());
                bytes.push(self.ins);
                bytes.extend_from_slice(&self.data);
                bytes
            }
            Framing::IsoWrapped => {
                let mut bytes = Vec::with_capacity(5 + self.data.len() + 1);
                bytes.push(0x90);
                bytes.push(self.ins);
                bytes.push(0x00);
                bytes.push(0x00);
                bytes.push(self.data.len() as u8);
                bytes.extend_from_slice(&self.data);
                bytes.push(0x00);
                bytes
            }
        }
    }
}

/// A parsed card response: its status byte and trailing payload, with
/// wrapped-mode's status word and native-mode's leading status byte both
/// normalized away.
#[derive(Debug)]
pub struct ApduResponse {
    pub status: Status,
    pub data: Vec<u8>,
}

impl ApduResponse {
    /// Parse a raw transport response per `framing`.
    pub fn parse(bytes: &[u8], framing: Framing) -> Result<Self, SessionError> {
        match framing {
            Framing::Native => {
                ensure!(
                    !bytes.is_empty(),
                    FramingError,
                    "native response is empty, expected at least a status byte"
                );
                Ok(ApduResponse {
                    status: Status::from_u8(bytes[0]),
                    data: bytes[1..].to_vec(),
                })
            }
            Framing::IsoWrapped => {
                ensure!(
                    bytes.len() >= 2,
                    FramingError,
                    "wrapped response is {} bytes, expected at least the 2-byte status word",
                    bytes.len()
                );
                let sw_index = bytes.len() - 2;
                ensure!(
                    bytes[sw_index] == 0x91,
                    FramingError,
                    "wrapped response status word high byte is 0x{:02x}, expected 0x91",
                    bytes[sw_index]
                );
                Ok(ApduResponse {
                    status: Status::from_u8(bytes[sw_index + 1]),
                    data: bytes[..sw_index].to_vec(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_request_has_no_wrapper() {
        let req = ApduRequest::new(0x5A, vec![0x11, 0x22, 0x33]);
        assert_eq!(req.to_bytes(Framing::Native), vec![0x5A, 0x11, 0x22, 0x33]);
    }

    #[test]
    fn wrapped_request_adds_class_byte_lc_and_trailing_zero() {
        let req = ApduRequest::new(0x5A, vec![0x11, 0x22, 0x33]);
        assert_eq!(
            req.to_bytes(Framing::IsoWrapped),
            vec![0x90, 0x5A, 0x00, 0x00, 0x03, 0x11, 0x22, 0x33, 0x00]
        );
    }

    #[test]
    fn wrapped_request_with_empty_params_has_lc_zero() {
        let req = ApduRequest::new(0x60, Vec::new());
        assert_eq!(
            req.to_bytes(Framing::IsoWrapped),
            vec![0x90, 0x60, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn native_response_splits_leading_status_byte() {
        let resp = ApduResponse::parse(&[0x00, 0xAA, 0xBB], Framing::Native).unwrap();
        assert!(resp.status.is_success());
        assert_eq!(resp.data, vec![0xAA, 0xBB]);
    }

    #[test]
    fn wrapped_response_splits_trailing_status_word() {
        let resp = ApduResponse::parse(&[0xAA, 0xBB, 0x91, 0xAF], Framing::IsoWrapped).unwrap();
        assert!(resp.status.is_additional_frame());
        assert_eq!(resp.data, vec![0xAA, 0xBB]);
    }

    #[test]
    fn wrapped_response_rejects_wrong_status_word_prefix() {
        assert!(ApduResponse::parse(&[0x00, 0x00], Framing::IsoWrapped).is_err());
    }
}
