//! Errors raised by the block-cipher/CMAC/CRC primitives in [`crate::crypto`].

use crate::error::Error;

/// Crypto primitive errors
pub type CryptoError = Error<CryptoErrorKind>;

/// Crypto primitive error kinds
#[derive(Copy, Clone, Eq, PartialEq, Debug, Fail)]
pub enum CryptoErrorKind {
    /// Key bytes were the wrong length for the declared key type
    #[fail(display = "invalid key length")]
    KeyLength,

    /// Input to a CBC operation was not a multiple of the cipher's block size
    #[fail(display = "input is not a multiple of the block size")]
    BlockAlignment,

    /// The underlying block-cipher crate rejected the key or IV
    #[fail(display = "cipher initialization failed")]
    CipherInit,
}
