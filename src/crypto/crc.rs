//! CRC16 and CRC32 integrity checks appended to plaintext before a
//! `ChangeKey`-style cryptogram is encrypted, per `spec.md` §4.1.
//!
//! The pack doesn't carry a crate with these exact polynomial/init pairs
//! (zwave-rs's `checksum.rs` reaches for the `crc16` crate, but only for
//! its own `AUG_CCITT` preset), so these are hand-rolled reflected CRCs in
//! the style of that module: small, table-less, bit-at-a-time.

/// CRC16 per ISO/IEC 13239: poly 0x8408 (reflected), init 0x6363. Used for
/// legacy DES/3DES `ChangeKey` integrity.
pub fn crc16(data: &[u8]) -> u16 {
    const POLY: u16 = 0x8408;
    let mut crc: u16 = 0x6363;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// CRC32 per ISO/IEC 13239 (reflected): poly 0xEDB88320, init 0xFFFFFFFF,
/// final XOR 0xFFFFFFFF. Used for AES/3K-3DES `ChangeKey` integrity.
pub fn crc32(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    crc ^ 0xFFFF_FFFF
}

/// Append a little-endian CRC16 to `buf`
pub fn append_crc16(buf: &mut Vec<u8>) {
    let crc = crc16(buf);
    buf.extend_from_slice(&crc.to_le_bytes());
}

/// Append a little-endian CRC32 to `buf`
pub fn append_crc32(buf: &mut Vec<u8>) {
    let crc = crc32(buf);
    buf.extend_from_slice(&crc.to_le_bytes());
}
