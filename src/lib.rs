//! **desfire**: pure Rust client core for MIFARE DESFire EV1 contactless
//! smart cards.
//!
//! This crate implements the secure-session state machine that drives a
//! DESFire EV1 card over an arbitrary APDU transport: three-pass mutual
//! authentication, session-key derivation, per-command CMAC/encryption
//! discipline, and `0xAF` multi-frame continuation, plus the command
//! surface built on top of it (application/file management, key
//! management, data reads).
//!
//! # Getting started
//!
//! The following sketches authenticating against a card's PICC master key
//! and listing its applications. `MyConnector` stands in for whatever
//! physically transceives framed APDUs on your platform (PC/SC, an NFC
//! radio, etc. — see [`desfire::connector`]).
//!
//! ```no_build
//! use desfire::{Client, Key, KeyType};
//!
//! let connector = MyConnector::default();
//! let mut client = Client::new(connector);
//!
//! client.authenticate(0, Key::zero(KeyType::Aes), None).unwrap();
//! let aids = client.get_application_ids().unwrap();
//! println!("applications: {:?}", aids);
//! ```
//!
//! [`desfire::connector`]: crate::connector

#![crate_name = "desfire"]
#![crate_type = "rlib"]
#![deny(warnings, trivial_casts, trivial_numeric_casts)]
#![deny(unsafe_code, unused_import_braces, unused_qualifications)]
#![doc(
    html_root_url = "https://docs.rs/desfire/0.1.0"
)]

extern crate aes;
extern crate block_modes;
extern crate des;
extern crate failure;
#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate log;
extern crate rand;
extern crate subtle;
extern crate zeroize;

/// Error types shared by every layer of this crate.
#[macro_use]
pub mod error;

/// Cryptographic primitives: block-cipher CBC dispatch, CRC16/CRC32,
/// running-IV CMAC.
pub mod crypto;

/// The stateful `Key` object: key material plus running IV and CMAC
/// subkeys.
pub mod key;

/// Card-side identifier types: application IDs and file IDs.
pub mod object;

/// The single-byte DESFire status codes.
pub mod status;

/// The transport interface the core consumes.
pub mod connector;

/// The APDU exchange loop: three-pass authentication, per-command secure
/// channel comm-modes, and `0xAF` continuation reassembly.
pub mod session;

/// The DESFire command surface: named operations built on the session
/// layer.
pub mod client;

pub use client::{
    AccessRights, CardVersion, ChangeKeyAccessRights, Client, ClientError, ClientErrorKind,
    Credentials, FileCommMode, FileSettings, KeySettings, KeySettingsInfo, VersionInfo,
};
pub use connector::{Connector, ConnectorError, ConnectorErrorKind, Framing};
pub use crypto::{CryptoError, CryptoErrorKind, KeyType};
pub use error::Error;
pub use key::Key;
pub use object::{Aid, FileId};
pub use session::{CommMode, Session, SessionError, SessionErrorKind, SessionState};
pub use status::{KnownStatus, Status};
