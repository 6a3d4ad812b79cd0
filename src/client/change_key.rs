//! `ChangeKey` cryptogram construction (`spec.md` §4.4.1).
//!
//! This is the one command whose request payload the command surface must
//! hand-encrypt itself rather than delegate to [`crate::session::CommMode`]:
//! the embedded CRC and the same-key/different-key XOR step have nothing to
//! do with the generic enciphered comm-mode, even though the final step
//! (zero-pad, CBC-encrypt under the session key) is identical to it.

use crate::client::error::ClientError;
use crate::crypto::{self, KeyType};
use crate::key::Key;

pub(crate) const INS_CHANGE_KEY: u8 = 0xC4;

/// Upper-nibble key-type flag OR'd into the `key_no` byte when changing the
/// PICC master key. At application level the key type is fixed at
/// application creation, so the flag is always zero there.
pub(crate) fn key_type_flag(key_type: KeyType) -> u8 {
    match key_type {
        KeyType::Des | KeyType::TDes2 => 0x00,
        KeyType::TDes3 => 0x40,
        KeyType::Aes => 0x80,
    }
}

/// XOR two byte slices, zero-extending the shorter one on the right.
fn xor_zero_extended(a: &[u8], b: &[u8]) -> Vec<u8> {
    let len = a.len().max(b.len());
    let mut out = vec![0u8; len];
    for (i, slot) in out.iter_mut().enumerate() {
        let av = a.get(i).copied().unwrap_or(0);
        let bv = b.get(i).copied().unwrap_or(0);
        *slot = av ^ bv;
    }
    out
}

/// Build and encrypt the `ChangeKey` cryptogram under `session_key`,
/// advancing its running IV in the process (`spec.md` §4.4.1 steps 1-5).
///
/// `key_no_byte` is the raw wire byte (key slot OR'd with
/// [`key_type_flag`] where applicable) — it participates in the embedded
/// CRC but callers still need to prepend it to the APDU payload
/// themselves, since it is sent in the clear ahead of the cryptogram.
pub(crate) fn build_cryptogram(
    session_key: &mut Key,
    key_no_byte: u8,
    new_key: &Key,
    current_key: Option<&Key>,
    same_key: bool,
) -> Result<Vec<u8>, ClientError> {
    let mut plaintext = if same_key {
        new_key.key_bytes().to_vec()
    } else {
        let current = current_key
            .expect("changing a key other than the one that authenticated the session requires its current bytes");
        xor_zero_extended(new_key.key_bytes(), current.key_bytes())
    };

    if new_key.key_type() == KeyType::Aes {
        plaintext.push(new_key.key_version());
    }

    let mut crc_domain = Vec::with_capacity(2 + plaintext.len());
    crc_domain.push(INS_CHANGE_KEY);
    crc_domain.push(key_no_byte);
    crc_domain.extend_from_slice(&plaintext);
    plaintext.extend_from_slice(&crypto::crc32(&crc_domain).to_le_bytes());

    if !same_key {
        plaintext.extend_from_slice(&crypto::crc32(new_key.key_bytes()).to_le_bytes());
    }

    Ok(session_key.padded_encrypt(&plaintext)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_aes_cryptogram_carries_plain_new_key_and_version() {
        let mut session_key = Key::zero(KeyType::Aes);
        let new_key = Key::new(KeyType::Aes, vec![0u8; 16], 0).unwrap();

        let cryptogram = build_cryptogram(&mut session_key, 0x00, &new_key, None, true).unwrap();

        // 16 (key) + 1 (version) + 4 (crc) = 21, padded up to 32.
        assert_eq!(cryptogram.len(), 32);
    }

    #[test]
    fn different_key_appends_a_second_crc_of_the_plain_new_key() {
        let mut session_key = Key::zero(KeyType::Aes);
        let new_key = Key::new(KeyType::Aes, vec![0x11u8; 16], 0).unwrap();
        let current_key = Key::new(KeyType::Aes, vec![0x22u8; 16], 0).unwrap();

        let same_key_cryptogram =
            build_cryptogram(&mut Key::zero(KeyType::Aes), 0x01, &new_key, None, true).unwrap();
        let different_key_cryptogram = build_cryptogram(
            &mut session_key,
            0x01,
            &new_key,
            Some(&current_key),
            false,
        )
        .unwrap();

        // 16 + 1 + 4 + 4 = 25, padded up to 32, vs. 21 padded up to 32 for
        // the same-key case: same padded length here, but different
        // plaintext, so the ciphertexts must differ.
        assert_eq!(same_key_cryptogram.len(), different_key_cryptogram.len());
        assert_ne!(same_key_cryptogram, different_key_cryptogram);
    }

    #[test]
    fn des_key_type_flag_is_zero() {
        assert_eq!(key_type_flag(KeyType::Des), 0x00);
        assert_eq!(key_type_flag(KeyType::TDes2), 0x00);
    }

    #[test]
    fn aes_key_type_flag_is_0x80() {
        assert_eq!(key_type_flag(KeyType::Aes), 0x80);
    }
}
