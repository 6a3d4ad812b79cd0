//! The `Key` object: a stateful symmetric credential carrying its own
//! running IV and CMAC subkeys, per `spec.md` §3/§4.2.
//!
//! A session's secure channel only works if every cipher call in that
//! session goes through the *same* `Key` instance — the running IV it
//! carries is the mechanism that binds each CMAC to the session's message
//! history (invariant I4). Callers authenticate with one `Key`, then that
//! same `Key` is re-derived in place into the session key by
//! [`Key::derive_session_key`].

use zeroize::Zeroize;

use crate::crypto::{self, CryptoError, KeyType};

/// A symmetric DESFire credential: key material plus the running CBC IV
/// and CMAC subkeys derived from it.
pub struct Key {
    key_type: KeyType,
    key_bytes: Vec<u8>,
    key_version: u8,
    iv: Vec<u8>,
    cmac_sub1: Vec<u8>,
    cmac_sub2: Vec<u8>,
}

impl Key {
    /// Build a new key from raw bytes, validating the length against
    /// `key_type`, zeroing the IV, and deriving CMAC subkeys.
    pub fn new(key_type: KeyType, key_bytes: Vec<u8>, key_version: u8) -> Result<Self, CryptoError> {
        ensure!(
            key_bytes.len() == key_type.key_len(),
            crypto::CryptoErrorKind::KeyLength,
            "{:?} key must be {} bytes, got {}",
            key_type,
            key_type.key_len(),
            key_bytes.len()
        );

        let (cmac_sub1, cmac_sub2) = crypto::cmac_subkeys(key_type, &key_bytes)?;
        let iv = vec![0u8; key_type.block_size()];

        Ok(Key {
            key_type,
            key_bytes,
            key_version,
            iv,
            cmac_sub1,
            cmac_sub2,
        })
    }

    /// An all-zero key of the given type, version 0. Convenient for
    /// authenticating against a factory-default PICC master key.
    pub fn zero(key_type: KeyType) -> Self {
        Key::new(key_type, vec![0u8; key_type.key_len()], 0)
            .expect("zero-length key bytes always match key_type.key_len()")
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn key_bytes(&self) -> &[u8] {
        &self.key_bytes
    }

    pub fn key_version(&self) -> u8 {
        self.key_version
    }

    pub fn block_size(&self) -> usize {
        self.key_type.block_size()
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Reset the running IV to all-zero bytes of the cipher's block size.
    pub fn cipher_init(&mut self) {
        self.iv = vec![0u8; self.key_type.block_size()];
    }

    /// CBC-encrypt `plaintext` (must already be block-aligned) under the
    /// running IV, then advance the IV to the last ciphertext block.
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let ciphertext = crypto::cbc_encrypt(self.key_type, &self.key_bytes, &self.iv, plaintext)?;
        self.advance_iv(&ciphertext);
        Ok(ciphertext)
    }

    /// CBC-decrypt `ciphertext` (must already be block-aligned) under the
    /// running IV, then advance the IV to the last block of the *input*.
    pub fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let plaintext = crypto::cbc_decrypt(self.key_type, &self.key_bytes, &self.iv, ciphertext)?;
        self.advance_iv(ciphertext);
        Ok(plaintext)
    }

    /// Zero-pad `plaintext` to a block boundary, CBC-encrypt it, and
    /// advance the IV to the last ciphertext block.
    pub fn padded_encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let ciphertext = crypto::padded_encrypt(self.key_type, &self.key_bytes, &self.iv, plaintext)?;
        self.advance_iv(&ciphertext);
        Ok(ciphertext)
    }

    /// Recompute the CMAC subkeys from the current key bytes. Invariant I5
    /// requires this happen atomically with any mutation of `key_bytes`,
    /// which is why `Key` never exposes a bare key-bytes setter.
    pub fn generate_cmac(&mut self) -> Result<(), CryptoError> {
        let (sub1, sub2) = crypto::cmac_subkeys(self.key_type, &self.key_bytes)?;
        self.cmac_sub1 = sub1;
        self.cmac_sub2 = sub2;
        Ok(())
    }

    /// Compute the CMAC over `message` using the running IV, advance the
    /// IV to the full-block-size tag, and return the first 8 bytes for use
    /// on the wire.
    pub fn calculate_cmac(&mut self, message: &[u8]) -> Result<[u8; 8], CryptoError> {
        let tag = crypto::cmac(
            self.key_type,
            &self.key_bytes,
            &self.cmac_sub1,
            &self.cmac_sub2,
            &self.iv,
            message,
        )?;
        self.iv = tag.clone();

        let mut truncated = [0u8; 8];
        truncated.copy_from_slice(&tag[0..8]);
        Ok(truncated)
    }

    fn advance_iv(&mut self, blocks: &[u8]) {
        let block_size = self.key_type.block_size();
        let last_start = blocks.len() - block_size;
        self.iv = blocks[last_start..].to_vec();
    }

    /// Re-derive this key in place into the session key established by a
    /// successful three-pass authentication, per `spec.md` §4.3.1's table.
    /// Regenerates CMAC subkeys and zeroes the IV, as the session-key
    /// lifecycle requires.
    pub fn derive_session_key(&mut self, rnd_a: &[u8], rnd_b: &[u8]) -> Result<(), CryptoError> {
        let mut session_bytes = match self.key_type {
            KeyType::Des | KeyType::TDes2 => {
                let mut bytes = Vec::with_capacity(16);
                bytes.extend_from_slice(&rnd_a[0..4]);
                bytes.extend_from_slice(&rnd_b[0..4]);
                bytes.extend_from_slice(&rnd_a[4..8]);
                bytes.extend_from_slice(&rnd_b[4..8]);
                bytes
            }
            KeyType::TDes3 => {
                let mut bytes = Vec::with_capacity(24);
                bytes.extend_from_slice(&rnd_a[0..4]);
                bytes.extend_from_slice(&rnd_b[0..4]);
                bytes.extend_from_slice(&rnd_a[6..10]);
                bytes.extend_from_slice(&rnd_b[6..10]);
                bytes.extend_from_slice(&rnd_a[12..16]);
                bytes.extend_from_slice(&rnd_b[12..16]);
                bytes
            }
            KeyType::Aes => {
                let mut bytes = Vec::with_capacity(16);
                bytes.extend_from_slice(&rnd_a[0..4]);
                bytes.extend_from_slice(&rnd_b[0..4]);
                bytes.extend_from_slice(&rnd_a[12..16]);
                bytes.extend_from_slice(&rnd_b[12..16]);
                bytes
            }
        };

        if self.key_type != KeyType::Aes {
            for byte in session_bytes.iter_mut() {
                *byte &= 0xFE;
            }
        }

        self.key_bytes.zeroize();
        self.key_bytes = session_bytes;
        self.generate_cmac()?;
        self.cipher_init();
        Ok(())
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        self.key_bytes.zeroize();
        self.iv.zeroize();
        self.cmac_sub1.zeroize();
        self.cmac_sub2.zeroize();
    }
}
