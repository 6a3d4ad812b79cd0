//! `GetVersion` response parsing (`spec.md` §3 "Card Version", §4.4).
//!
//! The card returns this as three multi-frame chunks (7, 7, 14 bytes) that
//! the session layer's `0xAF` continuation loop already reassembles into
//! one 28-byte blob; this module only slices that blob.

use crate::client::error::{ClientError, ClientErrorKind};

/// The 7-byte hardware or software version block.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct VersionInfo {
    pub vendor_id: u8,
    pub hardware_type: u8,
    pub hardware_subtype: u8,
    pub major_version: u8,
    pub minor_version: u8,
    pub storage_size: u8,
    pub protocol: u8,
}

impl VersionInfo {
    fn parse(bytes: &[u8]) -> Self {
        VersionInfo {
            vendor_id: bytes[0],
            hardware_type: bytes[1],
            hardware_subtype: bytes[2],
            major_version: bytes[3],
            minor_version: bytes[4],
            storage_size: bytes[5],
            protocol: bytes[6],
        }
    }
}

/// The full, typed `GetVersion` response (`spec.md` §3's 28-byte blob:
/// hardware info, software info, then UID/batch/production data).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CardVersion {
    pub hardware: VersionInfo,
    pub software: VersionInfo,
    pub uid: [u8; 7],
    pub batch_number: [u8; 5],
    pub production_week: u8,
    pub production_year: u8,
}

impl CardVersion {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self, ClientError> {
        let kind = ClientErrorKind::ProtocolError {
            status: crate::status::KnownStatus::LengthError,
        };
        ensure!(
            bytes.len() == 28,
            kind,
            "GetVersion reassembled to {} bytes, expected 28",
            bytes.len()
        );

        let hardware = VersionInfo::parse(&bytes[0..7]);
        let software = VersionInfo::parse(&bytes[7..14]);
        let production = &bytes[14..28];

        let mut uid = [0u8; 7];
        uid.copy_from_slice(&production[0..7]);
        let mut batch_number = [0u8; 5];
        batch_number.copy_from_slice(&production[7..12]);

        Ok(CardVersion {
            hardware,
            software,
            uid,
            batch_number,
            production_week: production[12],
            production_year: production[13],
        })
    }
}
