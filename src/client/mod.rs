//! The DESFire command surface (`spec.md` §4.4): named operations that
//! turn into framed byte sequences, go through [`Session::command`], and
//! come back as typed results.

mod change_key;
pub mod error;
mod file_settings;
mod key_settings;
mod version;

mod credentials;

pub use self::credentials::Credentials;
pub use self::error::{ClientError, ClientErrorKind};
pub use self::file_settings::{AccessRights, FileCommMode, FileSettings};
pub use self::key_settings::{ChangeKeyAccessRights, KeySettings, KeySettingsInfo};
pub use self::version::{CardVersion, VersionInfo};

use crate::connector::Connector;
use crate::crypto;
use crate::key::Key;
use crate::object::{Aid, FileId};
use crate::session::{CommMode, Session};

const INS_GET_APPLICATION_IDS: u8 = 0x6A;
const INS_SELECT_APPLICATION: u8 = 0x5A;
const INS_CREATE_APPLICATION: u8 = 0xCA;
const INS_DELETE_APPLICATION: u8 = 0xDA;
const INS_GET_FILE_IDS: u8 = 0x6F;
const INS_GET_FILE_SETTINGS: u8 = 0xF5;
const INS_READ_DATA: u8 = 0xBD;
const INS_CHANGE_KEY_SETTINGS: u8 = 0x54;
const INS_GET_KEY_VERSION: u8 = 0x64;
const INS_GET_KEY_SETTINGS: u8 = 0x45;
const INS_GET_VERSION: u8 = 0x60;
const INS_FORMAT_PICC: u8 = 0xFC;

/// A DESFire client: the command surface layered over a [`Session`].
///
/// Not `Sync`, and not meaningfully `Send`-shareable across a live card
/// session — a card session is a serial resource (`spec.md` §5) and every
/// method here takes `&mut self`.
pub struct Client<C: Connector> {
    session: Session<C>,
}

impl<C: Connector> Client<C> {
    pub fn new(connector: C) -> Self {
        Client { session: Session::new(connector) }
    }

    /// Direct access to the underlying session, e.g. to inspect
    /// [`crate::session::SessionState`] without going through a command.
    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    /// The three-pass mutual authentication exchange (`spec.md` §4.3.1).
    /// `challenge`, when given, fixes `RndA` for deterministic tests
    /// instead of drawing it from the OS RNG.
    pub fn authenticate(&mut self, key_no: u8, key: Key, challenge: Option<Vec<u8>>) -> Result<(), ClientError> {
        self.session.authenticate(key_no, key, challenge)?;
        Ok(())
    }

    /// Convenience wrapper bundling a key slot and its key material.
    pub fn authenticate_with_credentials(&mut self, credentials: Credentials) -> Result<(), ClientError> {
        self.authenticate(credentials.auth_key_id, credentials.auth_key, None)
    }

    /// `SelectApplication` (0x5A): clears authentication unconditionally.
    pub fn select_application(&mut self, aid: Aid) -> Result<(), ClientError> {
        self.session.command(INS_SELECT_APPLICATION, aid.to_wire().to_vec(), CommMode::Plain)?;
        self.session.note_select_application(aid);
        Ok(())
    }

    /// `GetApplicationIDs` (0x6A): response is `3*N` bytes, each triple a
    /// little-endian 24-bit AID.
    pub fn get_application_ids(&mut self) -> Result<Vec<Aid>, ClientError> {
        let data = self.session.command(INS_GET_APPLICATION_IDS, Vec::new(), CommMode::Plain)?;
        let kind = ClientErrorKind::ProtocolError { status: crate::status::KnownStatus::LengthError };
        ensure!(data.len() % 3 == 0, kind, "GetApplicationIDs response is {} bytes, not a multiple of 3", data.len());

        Ok(data
            .chunks_exact(3)
            .map(|chunk| Aid::from_wire([chunk[0], chunk[1], chunk[2]]))
            .collect())
    }

    /// `CreateApplication` (0xCA): requires authentication; MACed.
    pub fn create_application(&mut self, aid: Aid, key_settings: KeySettingsInfo) -> Result<(), ClientError> {
        let mut payload = aid.to_wire().to_vec();
        payload.extend_from_slice(&key_settings.to_wire());
        self.session.command(INS_CREATE_APPLICATION, payload, CommMode::Maced)?;
        Ok(())
    }

    /// `DeleteApplication` (0xDA): requires authentication.
    pub fn delete_application(&mut self, aid: Aid) -> Result<(), ClientError> {
        self.session.command(INS_DELETE_APPLICATION, aid.to_wire().to_vec(), CommMode::Maced)?;
        Ok(())
    }

    /// `GetFileIDs` (0x6F): each response byte is one file id in the
    /// currently selected application.
    pub fn get_file_ids(&mut self) -> Result<Vec<FileId>, ClientError> {
        let data = self.session.command(INS_GET_FILE_IDS, Vec::new(), CommMode::Plain)?;
        Ok(data.into_iter().map(FileId::new).collect())
    }

    /// `GetFileSettings` (0xF5, 1 B file id).
    pub fn get_file_settings(&mut self, file_id: FileId) -> Result<FileSettings, ClientError> {
        let data = self.session.command(INS_GET_FILE_SETTINGS, vec![file_id.value()], CommMode::Plain)?;
        FileSettings::parse(&data)
    }

    /// `ReadData` (0xBD): `offset`/`length` are 24-bit values; `length ==
    /// 0` means "to the end of the file". `comm_mode` should match the
    /// target file's own comm-mode setting (`spec.md` §4.4 notes this
    /// depends on the file, not the command) — query it first via
    /// [`Self::get_file_settings`] if it isn't already known.
    pub fn read_file_data(
        &mut self,
        file_id: FileId,
        offset: u32,
        length: u32,
        comm_mode: CommMode,
    ) -> Result<Vec<u8>, ClientError> {
        let mut payload = Vec::with_capacity(7);
        payload.push(file_id.value());
        payload.extend_from_slice(&u24_to_wire(offset));
        payload.extend_from_slice(&u24_to_wire(length));
        let data = self.session.command(INS_READ_DATA, payload, comm_mode)?;
        Ok(data)
    }

    /// `ChangeKey` (0xC4, `spec.md` §4.4.1): the one command whose request
    /// payload is hand-enciphered rather than dispatched through a generic
    /// [`CommMode`]. Clears authentication if `key_no` is the slot that
    /// authenticated this session (invariant I3).
    pub fn change_key(&mut self, key_no: u8, new_key: &Key, current_key: Option<&Key>) -> Result<(), ClientError> {
        let at_picc = self.session.current_application().is_picc();
        let same_key = at_picc || self.session.last_auth_key_no() == Some(key_no);

        let key_no_byte = if at_picc {
            key_no | change_key::key_type_flag(new_key.key_type())
        } else {
            key_no
        };

        let session_key = self
            .session
            .session_key_mut()
            .expect("change_key requires an authenticated session");
        let cryptogram = change_key::build_cryptogram(session_key, key_no_byte, new_key, current_key, same_key)?;

        let mut payload = vec![key_no_byte];
        payload.extend_from_slice(&cryptogram);
        self.session.command(change_key::INS_CHANGE_KEY, payload, CommMode::Plain)?;
        self.session.note_change_key(key_no);
        Ok(())
    }

    /// `ChangeKeySettings` (0x54): the new settings byte plus its
    /// `CRC32(INS || settings)`, zero-padded and enciphered under the
    /// session key — the same construction `ChangeKey` uses, just over a
    /// single settings byte instead of a key cryptogram.
    pub fn change_key_settings(&mut self, new_settings: KeySettings) -> Result<(), ClientError> {
        let settings_byte = new_settings.bits();
        let crc_domain = [INS_CHANGE_KEY_SETTINGS, settings_byte];
        let crc = crypto::crc32(&crc_domain);

        let mut plaintext = vec![settings_byte];
        plaintext.extend_from_slice(&crc.to_le_bytes());

        let session_key = self
            .session
            .session_key_mut()
            .expect("change_key_settings requires an authenticated session");
        let cryptogram = session_key.padded_encrypt(&plaintext)?;

        self.session.command(INS_CHANGE_KEY_SETTINGS, cryptogram, CommMode::Plain)?;
        Ok(())
    }

    /// `GetKeyVersion` (0x64, 1 B key number).
    pub fn get_key_version(&mut self, key_no: u8) -> Result<u8, ClientError> {
        let data = self.session.command(INS_GET_KEY_VERSION, vec![key_no], CommMode::Plain)?;
        let kind = ClientErrorKind::ProtocolError { status: crate::status::KnownStatus::LengthError };
        ensure!(!data.is_empty(), kind, "GetKeyVersion returned an empty response");
        Ok(data[0])
    }

    /// `GetKeySettings` (0x45): no params.
    pub fn get_key_settings(&mut self) -> Result<KeySettingsInfo, ClientError> {
        let data = self.session.command(INS_GET_KEY_SETTINGS, Vec::new(), CommMode::Plain)?;
        KeySettingsInfo::parse(&data)
    }

    /// `GetVersion` (0x60): multi-frame, reassembled by the session
    /// layer's `0xAF` continuation loop into one 28-byte blob.
    pub fn get_card_version(&mut self) -> Result<CardVersion, ClientError> {
        let data = self.session.command(INS_GET_VERSION, Vec::new(), CommMode::Plain)?;
        CardVersion::parse(&data)
    }

    /// `FormatPICC` (0xFC): erases all applications and files; requires
    /// authentication with the PICC master key. Resets to unauthenticated
    /// at PICC level.
    pub fn format_card(&mut self) -> Result<(), ClientError> {
        self.session.command(INS_FORMAT_PICC, Vec::new(), CommMode::Maced)?;
        self.session.note_format_picc();
        Ok(())
    }
}

/// Encode a 24-bit value as its 3 little-endian wire bytes.
fn u24_to_wire(value: u32) -> [u8; 3] {
    [(value & 0xFF) as u8, ((value >> 8) & 0xFF) as u8, ((value >> 16) & 0xFF) as u8]
}
