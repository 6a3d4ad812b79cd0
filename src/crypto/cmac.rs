//! CMAC (NIST SP 800-38B) subkey derivation and tag computation.
//!
//! This can't be built on the `cmac` crate: that crate always starts CBC
//! chaining from a zero IV, but a DESFire session MACs every command and
//! response starting from the *running* IV left over from the previous
//! crypto operation (`spec.md` §4.1, invariant I4) — the running IV is what
//! binds a CMAC to the session's message history, not just to the single
//! message being MAC'd. Subkey derivation itself follows the doubling
//! algorithm in the vendored `cmac` crate in the retrieval pack
//! (`kata-containers/src/agent/vendor/cmac/src/lib.rs`), adapted to take an
//! external chaining value instead of always starting from zero.

use super::block::encrypt_block;
use super::cipher::{cbc_encrypt, KeyType};
use super::error::CryptoError;

const RB_64: u8 = 0x1B;
const RB_128: u8 = 0x87;

/// Left-shift a block by one bit, XOR-ing in `rb` when the block's MSB was
/// set (the GF(2^n) "double" operation subkey derivation is built from).
fn dbl(block: &[u8], rb: u8) -> Vec<u8> {
    let msb_set = block[0] & 0x80 != 0;
    let mut out = vec![0u8; block.len()];
    let mut carry = 0u8;
    for i in (0..block.len()).rev() {
        out[i] = (block[i] << 1) | carry;
        carry = (block[i] & 0x80) >> 7;
    }
    if msb_set {
        let last = out.len() - 1;
        out[last] ^= rb;
    }
    out
}

/// Derive the two CMAC subkeys `K1`/`K2` for `key_bytes` under `key_type`.
pub fn cmac_subkeys(key_type: KeyType, key_bytes: &[u8]) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
    let block_size = key_type.block_size();
    let rb = if block_size == 8 { RB_64 } else { RB_128 };

    let mut l = vec![0u8; block_size];
    encrypt_block(key_type, key_bytes, &mut l)?;

    let k1 = dbl(&l, rb);
    let k2 = dbl(&k1, rb);
    Ok((k1, k2))
}

/// Compute a full-block-size CMAC tag over `message`, CBC-chaining from
/// `iv` rather than a zero IV. The caller (`Key::calculate_cmac`) truncates
/// the result to the first 8 bytes for use on the wire; the untruncated
/// tag becomes the key's new running IV.
pub fn cmac(
    key_type: KeyType,
    key_bytes: &[u8],
    sub1: &[u8],
    sub2: &[u8],
    iv: &[u8],
    message: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let block_size = key_type.block_size();

    let mut blocks = message.to_vec();
    let complete = !blocks.is_empty() && blocks.len() % block_size == 0;

    if !complete {
        blocks.push(0x80);
        while blocks.len() % block_size != 0 {
            blocks.push(0x00);
        }
    }

    let last_start = blocks.len() - block_size;
    let subkey = if complete { sub1 } else { sub2 };
    for i in 0..block_size {
        blocks[last_start + i] ^= subkey[i];
    }

    cbc_encrypt(key_type, key_bytes, iv, &blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subkeys_are_block_sized_and_distinct() {
        let (k1, k2) = cmac_subkeys(KeyType::Aes, &[0u8; 16]).unwrap();
        assert_eq!(k1.len(), 16);
        assert_eq!(k2.len(), 16);
        assert_ne!(k1, k2);
    }

    #[test]
    fn dbl_without_msb_is_a_plain_left_shift() {
        let block = vec![0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let doubled = dbl(&block, RB_64);
        assert_eq!(doubled, vec![0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn dbl_with_msb_xors_in_rb() {
        let block = vec![0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let doubled = dbl(&block, RB_64);
        assert_eq!(doubled[7], RB_64);
        assert_eq!(&doubled[0..7], &[0u8; 7]);
    }

    #[test]
    fn cmac_tag_is_full_block_size_and_deterministic() {
        let key = [0x2bu8; 16];
        let (k1, k2) = cmac_subkeys(KeyType::Aes, &key).unwrap();
        let iv = [0u8; 16];
        let a = cmac(KeyType::Aes, &key, &k1, &k2, &iv, b"hello world").unwrap();
        let b = cmac(KeyType::Aes, &key, &k1, &k2, &iv, b"hello world").unwrap();
        assert_eq!(a.len(), 16);
        assert_eq!(a, b);
    }

    #[test]
    fn cmac_distinguishes_complete_and_incomplete_final_blocks() {
        let key = [0x11u8; 16];
        let (k1, k2) = cmac_subkeys(KeyType::Aes, &key).unwrap();
        let iv = [0u8; 16];
        let complete = cmac(KeyType::Aes, &key, &k1, &k2, &iv, &[0u8; 16]).unwrap();
        let incomplete = cmac(KeyType::Aes, &key, &k1, &k2, &iv, &[0u8; 15]).unwrap();
        assert_ne!(complete, incomplete);
    }

    #[test]
    fn cmac_chains_from_the_supplied_iv() {
        let key = [0x33u8; 8];
        let (k1, k2) = cmac_subkeys(KeyType::Des, &key).unwrap();
        let zero_iv = [0u8; 8];
        let other_iv = [0xFFu8; 8];
        let from_zero = cmac(KeyType::Des, &key, &k1, &k2, &zero_iv, b"abcdefgh").unwrap();
        let from_other = cmac(KeyType::Des, &key, &k1, &k2, &other_iv, b"abcdefgh").unwrap();
        assert_ne!(from_zero, from_other);
    }
}
