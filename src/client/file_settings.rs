//! `GetFileSettings` response parsing (`spec.md` §3 "File settings").
//!
//! The response's leading byte is a file-type tag; everything after it is
//! laid out differently per type, so this is a tagged enum rather than one
//! flat struct.

use crate::client::error::{ClientError, ClientErrorKind};
use crate::session::CommMode;
use crate::status::KnownStatus;

const FILE_TYPE_STANDARD: u8 = 0x00;
const FILE_TYPE_BACKUP: u8 = 0x01;
const FILE_TYPE_VALUE: u8 = 0x02;
const FILE_TYPE_LINEAR_RECORD: u8 = 0x03;
const FILE_TYPE_CYCLIC_RECORD: u8 = 0x04;

/// The comm-mode a file's own settings request for commands that target
/// it (`ReadData`, `WriteData`, and friends), encoded in the low 2 bits of
/// the settings byte.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FileCommMode {
    Plain,
    Maced,
    Enciphered,
}

impl FileCommMode {
    fn from_byte(byte: u8) -> Self {
        match byte & 0x03 {
            0x03 => FileCommMode::Enciphered,
            0x01 => FileCommMode::Maced,
            _ => FileCommMode::Plain,
        }
    }

    /// The session-layer comm-mode this file setting maps to.
    pub fn comm_mode(self) -> CommMode {
        match self {
            FileCommMode::Plain => CommMode::Plain,
            FileCommMode::Maced => CommMode::Maced,
            FileCommMode::Enciphered => CommMode::Enciphered,
        }
    }
}

/// Which key slot may read, write, both, or reconfigure a file's access
/// rights. `0x0E` means "no authentication required", `0x0F` means "never
/// allowed" — both are carried through as plain nibble values rather than
/// resolved here, since callers may want to display them directly.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct AccessRights {
    pub read: u8,
    pub write: u8,
    pub read_write: u8,
    pub change_access_rights: u8,
}

impl AccessRights {
    fn parse(bytes: &[u8]) -> Self {
        AccessRights {
            read_write: bytes[0] >> 4,
            change_access_rights: bytes[0] & 0x0F,
            read: bytes[1] >> 4,
            write: bytes[1] & 0x0F,
        }
    }
}

fn u24_le(bytes: &[u8]) -> u32 {
    u32::from(bytes[0]) | u32::from(bytes[1]) << 8 | u32::from(bytes[2]) << 16
}

fn u32_le(bytes: &[u8]) -> u32 {
    u32::from(bytes[0]) | u32::from(bytes[1]) << 8 | u32::from(bytes[2]) << 16 | u32::from(bytes[3]) << 24
}

/// A parsed `GetFileSettings` response, dispatched on the leading
/// file-type byte.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FileSettings {
    Standard {
        comm_mode: FileCommMode,
        access_rights: AccessRights,
        file_size: u32,
    },
    Backup {
        comm_mode: FileCommMode,
        access_rights: AccessRights,
        file_size: u32,
    },
    Value {
        comm_mode: FileCommMode,
        access_rights: AccessRights,
        lower_limit: u32,
        upper_limit: u32,
        limited_credit_value: u32,
        limited_credit_enabled: bool,
    },
    LinearRecord {
        comm_mode: FileCommMode,
        access_rights: AccessRights,
        record_size: u32,
        max_records: u32,
        current_records: u32,
    },
    CyclicRecord {
        comm_mode: FileCommMode,
        access_rights: AccessRights,
        record_size: u32,
        max_records: u32,
        current_records: u32,
    },
}

impl FileSettings {
    pub(crate) fn parse(resp: &[u8]) -> Result<Self, ClientError> {
        let length_error = ClientErrorKind::ProtocolError {
            status: KnownStatus::LengthError,
        };
        ensure!(resp.len() >= 4, length_error, "file settings blob is only {} bytes", resp.len());

        let file_type = resp[0];
        let comm_mode = FileCommMode::from_byte(resp[1]);
        let access_rights = AccessRights::parse(&resp[2..4]);
        let body = &resp[4..];

        match file_type {
            FILE_TYPE_STANDARD | FILE_TYPE_BACKUP => {
                ensure!(body.len() >= 3, length_error, "standard/backup file settings missing file size");
                let file_size = u24_le(&body[0..3]);
                Ok(if file_type == FILE_TYPE_STANDARD {
                    FileSettings::Standard { comm_mode, access_rights, file_size }
                } else {
                    FileSettings::Backup { comm_mode, access_rights, file_size }
                })
            }
            FILE_TYPE_VALUE => {
                ensure!(body.len() >= 13, length_error, "value file settings missing limit/credit fields");
                Ok(FileSettings::Value {
                    comm_mode,
                    access_rights,
                    lower_limit: u32_le(&body[0..4]),
                    upper_limit: u32_le(&body[4..8]),
                    limited_credit_value: u32_le(&body[8..12]),
                    limited_credit_enabled: body[12] != 0,
                })
            }
            FILE_TYPE_LINEAR_RECORD | FILE_TYPE_CYCLIC_RECORD => {
                ensure!(body.len() >= 9, length_error, "record file settings missing record-count fields");
                let record_size = u24_le(&body[0..3]);
                let max_records = u24_le(&body[3..6]);
                let current_records = u24_le(&body[6..9]);
                Ok(if file_type == FILE_TYPE_LINEAR_RECORD {
                    FileSettings::LinearRecord { comm_mode, access_rights, record_size, max_records, current_records }
                } else {
                    FileSettings::CyclicRecord { comm_mode, access_rights, record_size, max_records, current_records }
                })
            }
            other => {
                let kind = ClientErrorKind::ProtocolError { status: KnownStatus::ParameterError };
                fail!(kind, "unrecognized file type byte 0x{:02x}", other)
            }
        }
    }
}
