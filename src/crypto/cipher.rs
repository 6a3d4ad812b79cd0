//! Block-cipher dispatch for the four DESFire key types.
//!
//! The teacher's SCP03 channel only ever talks to AES-128, so its CBC glue
//! is hardcoded to `Aes128`. DESFire needs DES, 2K-3DES, 3K-3DES and AES-128
//! behind the same CBC/running-IV interface. That four-key-type problem is
//! exactly what the pack's GlobalPlatform SCP02 crypto module solves (see
//! `crates/globalplatform/src/crypto.rs` in the retrieval pack): it expands
//! a 16-byte key to a 24-byte 3DES key by repeating the first 8 bytes, and
//! drives `cbc::Encryptor`/`TdesEde3` directly. We follow the same
//! expansion trick here, generalized to all three DES variants, using the
//! `cipher`/`aes`/`des`/`block-modes` crate family instead of SCP03's older
//! `block_cipher_trait`/`block-modes 0.2` pairing (which has no DES
//! support at all).

use aes::Aes128;
use block_modes::block_padding::NoPadding;
use block_modes::{BlockMode, Cbc};
use des::TdesEde3;

use super::error::{CryptoError, CryptoErrorKind::*};

type Aes128Cbc = Cbc<Aes128, NoPadding>;
type TdesCbc = Cbc<TdesEde3, NoPadding>;

/// The four symmetric key families a DESFire EV1 card can hold.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum KeyType {
    /// Single DES, stored as an 8-byte key (used as 3DES with all three
    /// sub-keys equal, which collapses to plain single DES)
    Des,
    /// 2-key triple DES, stored as a 16-byte key (`K1 || K2`)
    TDes2,
    /// 3-key triple DES, stored as a 24-byte key (`K1 || K2 || K3`)
    TDes3,
    /// AES-128, stored as a 16-byte key
    Aes,
}

impl KeyType {
    /// CBC block size in bytes: 8 for any DES variant, 16 for AES
    pub fn block_size(self) -> usize {
        match self {
            KeyType::Des | KeyType::TDes2 | KeyType::TDes3 => 8,
            KeyType::Aes => 16,
        }
    }

    /// Length of the raw key material on the wire/in memory
    pub fn key_len(self) -> usize {
        match self {
            KeyType::Des => 8,
            KeyType::TDes2 | KeyType::Aes => 16,
            KeyType::TDes3 => 24,
        }
    }
}

/// Expand raw DESFire key bytes into the 24-byte `K1 || K2 || K3` form
/// `TdesEde3` expects, repeating sub-keys per `spec.md` §3's key type table.
pub(crate) fn expand_3des_key(key_type: KeyType, key_bytes: &[u8]) -> [u8; 24] {
    let mut expanded = [0u8; 24];
    match key_type {
        KeyType::Des => {
            expanded[0..8].copy_from_slice(key_bytes);
            expanded[8..16].copy_from_slice(key_bytes);
            expanded[16..24].copy_from_slice(key_bytes);
        }
        KeyType::TDes2 => {
            expanded[0..8].copy_from_slice(&key_bytes[0..8]);
            expanded[8..16].copy_from_slice(&key_bytes[8..16]);
            expanded[16..24].copy_from_slice(&key_bytes[0..8]);
        }
        KeyType::TDes3 => expanded.copy_from_slice(key_bytes),
        KeyType::Aes => unreachable!("AES keys never go through 3DES expansion"),
    }
    expanded
}

/// CBC-encrypt `plaintext` (which MUST already be a multiple of
/// `key_type.block_size()`) under `key_bytes` with the given running `iv`.
pub fn cbc_encrypt(
    key_type: KeyType,
    key_bytes: &[u8],
    iv: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    ensure!(
        plaintext.len() % key_type.block_size() == 0,
        BlockAlignment,
        "plaintext length {} is not a multiple of the block size {}",
        plaintext.len(),
        key_type.block_size()
    );

    match key_type {
        KeyType::Aes => {
            let cipher = Aes128Cbc::new_from_slices(key_bytes, iv)
                .map_err(|_| err!(CipherInit, "invalid AES key/IV length"))?;
            Ok(cipher.encrypt_vec(plaintext))
        }
        _ => {
            let expanded = expand_3des_key(key_type, key_bytes);
            let cipher = TdesCbc::new_from_slices(&expanded, iv)
                .map_err(|_| err!(CipherInit, "invalid 3DES key/IV length"))?;
            Ok(cipher.encrypt_vec(plaintext))
        }
    }
}

/// CBC-decrypt `ciphertext` (which MUST already be a multiple of
/// `key_type.block_size()`) under `key_bytes` with the given running `iv`.
pub fn cbc_decrypt(
    key_type: KeyType,
    key_bytes: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    ensure!(
        ciphertext.len() % key_type.block_size() == 0,
        BlockAlignment,
        "ciphertext length {} is not a multiple of the block size {}",
        ciphertext.len(),
        key_type.block_size()
    );

    match key_type {
        KeyType::Aes => {
            let cipher = Aes128Cbc::new_from_slices(key_bytes, iv)
                .map_err(|_| err!(CipherInit, "invalid AES key/IV length"))?;
            cipher
                .decrypt_vec(ciphertext)
                .map_err(|_| err!(CipherInit, "CBC decrypt failed"))
        }
        _ => {
            let expanded = expand_3des_key(key_type, key_bytes);
            let cipher = TdesCbc::new_from_slices(&expanded, iv)
                .map_err(|_| err!(CipherInit, "invalid 3DES key/IV length"))?;
            cipher
                .decrypt_vec(ciphertext)
                .map_err(|_| err!(CipherInit, "CBC decrypt failed"))
        }
    }
}

/// Right-pads `plaintext` with zero bytes to a multiple of the block size,
/// then CBC-encrypts it. Used for `ChangeKey` cryptograms and similar.
pub fn padded_encrypt(
    key_type: KeyType,
    key_bytes: &[u8],
    iv: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let mut padded = plaintext.to_vec();
    let block_size = key_type.block_size();
    let remainder = padded.len() % block_size;
    if remainder != 0 {
        padded.extend(std::iter::repeat(0u8).take(block_size - remainder));
    }
    cbc_encrypt(key_type, key_bytes, iv, &padded)
}
