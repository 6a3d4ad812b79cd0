//! The single-byte DESFire status codes and the `ADDITIONAL_FRAME` framing
//! byte that drives the multi-frame continuation loop (`spec.md` §4.3.3).

use std::fmt;

/// A status byte as returned by the card in the last position of a native
/// response, or in the low byte of the `91 XX` status word of a wrapped
/// response.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Status {
    /// `0x00` — command completed successfully
    Success,

    /// `0xAF` — more data follows; issue a continuation frame
    AdditionalFrame,

    /// Any other known status code
    Known(KnownStatus),

    /// A status byte this crate does not recognize
    Unknown(u8),
}

impl Status {
    /// Parse a status byte from the wire
    pub fn from_u8(byte: u8) -> Self {
        match byte {
            0x00 => Status::Success,
            0xAF => Status::AdditionalFrame,
            byte => match KnownStatus::from_u8(byte) {
                Some(known) => Status::Known(known),
                None => Status::Unknown(byte),
            },
        }
    }

    /// Serialize back to the wire byte
    pub fn to_u8(self) -> u8 {
        match self {
            Status::Success => 0x00,
            Status::AdditionalFrame => 0xAF,
            Status::Known(known) => known.to_u8(),
            Status::Unknown(byte) => byte,
        }
    }

    /// Is this the terminal success status?
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    /// Does this status request another continuation frame?
    pub fn is_additional_frame(self) -> bool {
        matches!(self, Status::AdditionalFrame)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Status::Success => write!(f, "OK"),
            Status::AdditionalFrame => write!(f, "ADDITIONAL_FRAME"),
            Status::Known(known) => write!(f, "{}", known),
            Status::Unknown(byte) => write!(f, "unknown status 0x{:02x}", byte),
        }
    }
}

/// DESFire status codes which signal a non-success, non-continuation outcome
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum KnownStatus {
    /// `0x0C` — no changes done to backup files
    NoChanges = 0x0C,
    /// `0x0E` — insufficient NV memory to complete command
    OutOfMemory = 0x0E,
    /// `0x1C` — command code not supported
    IllegalCommandCode = 0x1C,
    /// `0x1E` — CRC or MAC does not match data
    IntegrityError = 0x1E,
    /// `0x40` — invalid key number specified
    NoSuchKey = 0x40,
    /// `0x7E` — length of command string invalid
    LengthError = 0x7E,
    /// `0x9D` — current configuration/status does not allow the requested command
    PermissionDenied = 0x9D,
    /// `0x9E` — value of the parameter(s) invalid
    ParameterError = 0x9E,
    /// `0xA0` — requested AID not present on PICC
    ApplicationNotFound = 0xA0,
    /// `0xA1` — unrecoverable error within application, application will be disabled
    ApplicationIntegrityError = 0xA1,
    /// `0xAE` — current authentication status does not allow the requested command
    AuthenticationError = 0xAE,
    /// `0xBE` — attempt to read/write data from/to beyond the file's/record's limits
    BoundaryError = 0xBE,
    /// `0xC1` — unrecoverable error within PICC, PICC will be disabled
    PiccIntegrityError = 0xC1,
    /// `0xCA` — previous command was not fully completed
    CommandAborted = 0xCA,
    /// `0xCD` — PICC was disabled by an unrecoverable error
    PiccDisabled = 0xCD,
    /// `0xCE` — number of applications limited to 28, no additional applications possible
    CountError = 0xCE,
    /// `0xDE` — creation of file/application failed because it already exists
    DuplicateError = 0xDE,
    /// `0xEE` — could not complete NV-write operation due to loss of power
    EepromError = 0xEE,
    /// `0xF0` — specified file does not exist
    FileNotFound = 0xF0,
    /// `0xF1` — unrecoverable error within file, file will be disabled
    FileIntegrityError = 0xF1,
}

impl KnownStatus {
    /// Map a status byte to a known status, if recognized
    pub fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            0x0C => KnownStatus::NoChanges,
            0x0E => KnownStatus::OutOfMemory,
            0x1C => KnownStatus::IllegalCommandCode,
            0x1E => KnownStatus::IntegrityError,
            0x40 => KnownStatus::NoSuchKey,
            0x7E => KnownStatus::LengthError,
            0x9D => KnownStatus::PermissionDenied,
            0x9E => KnownStatus::ParameterError,
            0xA0 => KnownStatus::ApplicationNotFound,
            0xA1 => KnownStatus::ApplicationIntegrityError,
            0xAE => KnownStatus::AuthenticationError,
            0xBE => KnownStatus::BoundaryError,
            0xC1 => KnownStatus::PiccIntegrityError,
            0xCA => KnownStatus::CommandAborted,
            0xCD => KnownStatus::PiccDisabled,
            0xCE => KnownStatus::CountError,
            0xDE => KnownStatus::DuplicateError,
            0xEE => KnownStatus::EepromError,
            0xF0 => KnownStatus::FileNotFound,
            0xF1 => KnownStatus::FileIntegrityError,
            _ => return None,
        })
    }

    /// Serialize to the wire byte
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for KnownStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            KnownStatus::NoChanges => "NO_CHANGES",
            KnownStatus::OutOfMemory => "OUT_OF_MEMORY",
            KnownStatus::IllegalCommandCode => "ILLEGAL_COMMAND_CODE",
            KnownStatus::IntegrityError => "INTEGRITY_ERROR",
            KnownStatus::NoSuchKey => "NO_SUCH_KEY",
            KnownStatus::LengthError => "LENGTH_ERROR",
            KnownStatus::PermissionDenied => "PERMISSION_DENIED",
            KnownStatus::ParameterError => "PARAMETER_ERROR",
            KnownStatus::ApplicationNotFound => "APPLICATION_NOT_FOUND",
            KnownStatus::ApplicationIntegrityError => "APPL_INTEGRITY_ERROR",
            KnownStatus::AuthenticationError => "AUTHENTICATION_ERROR",
            KnownStatus::BoundaryError => "BOUNDARY_ERROR",
            KnownStatus::PiccIntegrityError => "PICC_INTEGRITY_ERROR",
            KnownStatus::CommandAborted => "COMMAND_ABORTED",
            KnownStatus::PiccDisabled => "PICC_DISABLED",
            KnownStatus::CountError => "COUNT_ERROR",
            KnownStatus::DuplicateError => "DUPLICATE_ERROR",
            KnownStatus::EepromError => "EEPROM_ERROR",
            KnownStatus::FileNotFound => "FILE_NOT_FOUND",
            KnownStatus::FileIntegrityError => "FILE_INTEGRITY_ERROR",
        };
        write!(f, "{}", name)
    }
}
