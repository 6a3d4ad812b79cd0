//! Bundles what [`super::Client::authenticate`] needs into one value,
//! mirroring the teacher's `Credentials { auth_key_id, auth_key }`.

use crate::key::Key;

/// A key slot plus the key material to authenticate against it.
pub struct Credentials {
    pub auth_key_id: u8,
    pub auth_key: Key,
}

impl Credentials {
    pub fn new(auth_key_id: u8, auth_key: Key) -> Self {
        Credentials { auth_key_id, auth_key }
    }
}
