//! Single block-cipher block encryption, used both by CBC (via
//! [`super::cipher`]) and directly by the CMAC subkey derivation below,
//! which needs to encrypt one zero block with no chaining at all.

use aes::Aes128;
use cipher::generic_array::GenericArray;
use cipher::{BlockEncrypt, NewBlockCipher};
use des::TdesEde3;

use super::cipher::KeyType;
use super::error::{CryptoError, CryptoErrorKind::CipherInit};

/// Encrypt a single block in place (ECB, no chaining) under `key_bytes`.
/// `block` MUST be exactly `key_type.block_size()` bytes.
pub fn encrypt_block(
    key_type: KeyType,
    key_bytes: &[u8],
    block: &mut [u8],
) -> Result<(), CryptoError> {
    match key_type {
        KeyType::Aes => {
            let cipher = Aes128::new_from_slice(key_bytes)
                .map_err(|_| err!(CipherInit, "invalid AES key length"))?;
            let mut ga = GenericArray::clone_from_slice(block);
            cipher.encrypt_block(&mut ga);
            block.copy_from_slice(&ga);
        }
        _ => {
            let expanded = super::cipher::expand_3des_key(key_type, key_bytes);
            let cipher = TdesEde3::new_from_slice(&expanded)
                .map_err(|_| err!(CipherInit, "invalid 3DES key length"))?;
            let mut ga = GenericArray::clone_from_slice(block);
            cipher.encrypt_block(&mut ga);
            block.copy_from_slice(&ga);
        }
    }
    Ok(())
}
