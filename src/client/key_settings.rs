//! Key-settings bitflags consumed/returned by `CreateApplication`,
//! `ChangeKeySettings` and `GetKeySettings` (`spec.md` §3, §4.4).
//!
//! The original Python source's `get_key_setting` only keeps the low 3
//! bits of the settings byte and mislabels the second response byte as a
//! "key size" (it is in fact the same `(key_count | key_type_flag)` byte
//! `CreateApplication` sends); this module exposes the full settings byte
//! and names the second byte correctly.

use bitflags::bitflags;

use crate::client::change_key::key_type_flag;
use crate::client::error::{ClientError, ClientErrorKind};
use crate::crypto::KeyType;
use crate::status::KnownStatus;

bitflags! {
    /// The low nibble of the key-settings byte (`spec.md` §3's "Key
    /// settings" entry): per-application or PICC-level policy toggles,
    /// independent of which key slot may change other keys (see
    /// [`ChangeKeyAccessRights`], the high nibble).
    pub struct KeySettings: u8 {
        /// The key this settings byte describes may itself be changed.
        const ALLOW_CHANGE_MASTER_KEY = 0x01;
        /// `GetApplicationIDs`/`GetFileIDs`/`GetFileSettings` may be
        /// called without authenticating first.
        const FREE_LISTING_WITHOUT_MASTER_KEY = 0x02;
        /// `CreateApplication`/file-creation commands may be called
        /// without authenticating first.
        const FREE_CREATE_DELETE_WITHOUT_MASTER_KEY = 0x04;
        /// This settings byte may itself be changed via
        /// `ChangeKeySettings`.
        const CONFIGURATION_CHANGEABLE = 0x08;
    }
}

/// The high nibble of the key-settings byte: which key slot, if any, may
/// change other keys in this application (or the PICC master key).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ChangeKeyAccessRights {
    /// Only this specific key slot (`0..=13`) may change other keys.
    KeyNo(u8),
    /// Each key may change itself, and no other key.
    SameKeyOnly,
    /// No key may ever be changed (frozen configuration).
    Frozen,
}

impl ChangeKeyAccessRights {
    fn from_nibble(nibble: u8) -> Self {
        match nibble & 0x0F {
            0x0E => ChangeKeyAccessRights::SameKeyOnly,
            0x0F => ChangeKeyAccessRights::Frozen,
            n => ChangeKeyAccessRights::KeyNo(n),
        }
    }

    fn to_nibble(self) -> u8 {
        match self {
            ChangeKeyAccessRights::KeyNo(n) => n & 0x0F,
            ChangeKeyAccessRights::SameKeyOnly => 0x0E,
            ChangeKeyAccessRights::Frozen => 0x0F,
        }
    }
}

/// The full `GetKeySettings` response: the settings/access-rights byte,
/// plus the application's key count and cipher (the same fields
/// `CreateApplication` is given at creation time).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct KeySettingsInfo {
    pub settings: KeySettings,
    pub change_key_access_rights: ChangeKeyAccessRights,
    pub max_keys: u8,
    pub key_type: KeyType,
}

impl KeySettingsInfo {
    pub(crate) fn parse(resp: &[u8]) -> Result<Self, ClientError> {
        let length_error = ClientErrorKind::ProtocolError {
            status: KnownStatus::LengthError,
        };
        ensure!(resp.len() >= 2, length_error, "key settings response is only {} bytes", resp.len());

        let settings = KeySettings::from_bits_truncate(resp[0] & 0x0F);
        let change_key_access_rights = ChangeKeyAccessRights::from_nibble(resp[0] >> 4);
        let max_keys = resp[1] & 0x0F;
        let key_type = match resp[1] & 0xF0 {
            0x40 => KeyType::TDes3,
            0x80 => KeyType::Aes,
            _ => KeyType::Des,
        };

        Ok(KeySettingsInfo {
            settings,
            change_key_access_rights,
            max_keys,
            key_type,
        })
    }

    /// The two wire bytes `CreateApplication` sends: the settings byte,
    /// then `(key_count | key_type_flag)`.
    pub(crate) fn to_wire(self) -> [u8; 2] {
        let settings_byte = self.settings.bits() | (self.change_key_access_rights.to_nibble() << 4);
        let key_count_byte = (self.max_keys & 0x0F) | key_type_flag(self.key_type);
        [settings_byte, key_count_byte]
    }
}
