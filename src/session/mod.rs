//! The APDU exchange loop: three-pass authentication, per-command secure
//! channel comm-modes, and `0xAF` continuation reassembly (`spec.md` §4.3).

pub mod error;
mod message;

pub use self::error::{SessionError, SessionErrorKind};
pub use self::message::{ApduRequest, ApduResponse, INS_ADDITIONAL_FRAME};

use rand::{thread_rng, RngCore};
use subtle::ConstantTimeEq;

use crate::connector::{Connector, Framing};
use crate::key::Key;
use crate::object::Aid;
use crate::status::Status;

use self::error::SessionErrorKind::{
    AuthenticationError, Framing as FramingError, IntegrityError, TransportError,
};

/// Authentication instruction byte for a given key type (`spec.md` §4.3.1).
fn auth_ins(key_type: crate::crypto::KeyType) -> u8 {
    use crate::crypto::KeyType::*;
    match key_type {
        Des => 0x0A,
        TDes2 | TDes3 => 0x1A,
        Aes => 0xAA,
    }
}

/// Rotate a byte slice left by one position.
fn rotate_left_1(bytes: &[u8]) -> Vec<u8> {
    let mut rotated = Vec::with_capacity(bytes.len());
    rotated.extend_from_slice(&bytes[1..]);
    rotated.push(bytes[0]);
    rotated
}

/// The states a card session can be in (`spec.md` §4.3.5). Carrying exactly
/// the data relevant to each state makes e.g. "authenticated with no known
/// key slot" unrepresentable.
#[derive(Debug)]
pub enum SessionState {
    UnauthenticatedAtPicc,
    UnauthenticatedAtApp(Aid),
    AuthInProgress(u8),
    Authenticated(Aid, u8),
}

/// The secure-channel treatment applied to a command's outgoing payload
/// and its response (`spec.md` §4.3.2).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CommMode {
    /// No tag transmitted or verified. While a session is active the
    /// running IV is still advanced by feeding the command through CMAC,
    /// so host and card stay in lock-step for later MACed commands.
    Plain,
    /// CMAC computed over `ins || payload`; not transmitted. Verified on
    /// the response over `payload || status`; stripped before returning.
    Maced,
    /// `payload || CRC` zero-padded and CBC-encrypted under the session
    /// key.
    Enciphered,
    /// Legacy: as `Maced`, but the 4-byte truncated tag is actually
    /// transmitted/verified on the wire.
    PlainWithMac,
}

/// Owns the transport, the framing it expects, and the session state
/// machine, including the session key once authenticated.
pub struct Session<C: Connector> {
    connector: C,
    framing: Framing,
    state: SessionState,
    current_application: Aid,
    session_key: Option<Key>,
}

impl<C: Connector> Session<C> {
    pub fn new(connector: C) -> Self {
        let framing = connector.framing();
        Session {
            connector,
            framing,
            state: SessionState::UnauthenticatedAtPicc,
            current_application: Aid::PICC,
            session_key: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(..))
    }

    pub fn current_application(&self) -> Aid {
        self.current_application
    }

    /// The key slot used in the last successful authentication, if any.
    pub fn last_auth_key_no(&self) -> Option<u8> {
        match self.state {
            SessionState::Authenticated(_, key_no) => Some(key_no),
            _ => None,
        }
    }

    /// The session key established by the last successful authentication,
    /// if any. The command surface uses this directly for cryptogram
    /// construction (`ChangeKey`) that doesn't fit the generic
    /// [`CommMode::Enciphered`] treatment of [`Session::command`].
    pub fn session_key_mut(&mut self) -> Option<&mut Key> {
        self.session_key.as_mut()
    }

    /// Invariant I2/I3: drop back to unauthenticated at the currently
    /// selected application, discarding the session key.
    fn clear_authentication(&mut self) {
        self.session_key = None;
        self.state = if self.current_application.is_picc() {
            SessionState::UnauthenticatedAtPicc
        } else {
            SessionState::UnauthenticatedAtApp(self.current_application)
        };
    }

    /// Invariant I2: `SelectApplication` always clears authentication,
    /// from any prior state.
    pub fn note_select_application(&mut self, aid: Aid) {
        self.current_application = aid;
        self.session_key = None;
        self.state = SessionState::UnauthenticatedAtApp(aid);
    }

    /// `FormatPICC` resets to unauthenticated at PICC level.
    pub fn note_format_picc(&mut self) {
        self.current_application = Aid::PICC;
        self.session_key = None;
        self.state = SessionState::UnauthenticatedAtPicc;
    }

    /// Invariant I3: a `ChangeKey` on the slot that authenticated this
    /// session clears authentication.
    pub fn note_change_key(&mut self, key_no: u8) {
        if self.last_auth_key_no() == Some(key_no) {
            self.clear_authentication();
        }
    }

    /// One wire round-trip, no continuation handling: frame, transceive,
    /// parse. Used directly by `authenticate`, whose own `0xAF` means
    /// "challenge delivered", not "more data".
    fn raw_exchange(&mut self, req: ApduRequest) -> Result<ApduResponse, SessionError> {
        let wire = req.to_bytes(self.framing);
        trace!("-> {} bytes: {:02x?}", wire.len(), wire);
        let response_bytes = self
            .connector
            .transceive(&wire)
            .map_err(|e| err!(TransportError, "{}", e))?;
        trace!("<- {} bytes: {:02x?}", response_bytes.len(), response_bytes);
        ApduResponse::parse(&response_bytes, self.framing)
    }

    /// Reassemble `0xAF` continuation frames into one logical response.
    fn exchange_with_continuation(&mut self, req: ApduRequest) -> Result<ApduResponse, SessionError> {
        let first = self.raw_exchange(req)?;
        let mut status = first.status;
        let mut data = first.data;

        while status.is_additional_frame() {
            let next = self.raw_exchange(ApduRequest::continuation())?;
            data.extend_from_slice(&next.data);
            status = next.status;
        }

        Ok(ApduResponse { status, data })
    }

    /// Run `ins`/`payload` through the secure channel per `comm_mode`,
    /// reassemble any continuation frames, verify/decrypt the response,
    /// and surface card error statuses as [`SessionErrorKind::ProtocolError`].
    pub fn command(&mut self, ins: u8, payload: Vec<u8>, comm_mode: CommMode) -> Result<Vec<u8>, SessionError> {
        let authenticated = self.is_authenticated();
        let mut outgoing = payload;

        if authenticated {
            match comm_mode {
                CommMode::Enciphered => {
                    let key = self.session_key.as_mut().expect("authenticated ⇒ session_key ≠ ∅");
                    outgoing = key.padded_encrypt(&outgoing)?;
                }
                CommMode::Plain | CommMode::Maced | CommMode::PlainWithMac => {
                    let key = self.session_key.as_mut().expect("authenticated ⇒ session_key ≠ ∅");
                    let mut domain = Vec::with_capacity(1 + outgoing.len());
                    domain.push(ins);
                    domain.extend_from_slice(&outgoing);
                    let tag = key.calculate_cmac(&domain)?;
                    if comm_mode == CommMode::PlainWithMac {
                        outgoing.extend_from_slice(&tag[0..4]);
                    }
                }
            }
        }

        let resp = self.exchange_with_continuation(ApduRequest::new(ins, outgoing))?;

        match resp.status {
            Status::Success => {}
            Status::Known(known) => {
                let kind = crate::session::error::SessionErrorKind::ProtocolError { status: known };
                fail!(kind, "card returned {}", known);
            }
            Status::Unknown(byte) => {
                fail!(FramingError, "unknown status byte 0x{:02x}", byte);
            }
            Status::AdditionalFrame => unreachable!("exchange_with_continuation resolves this"),
        }

        let mut data = resp.data;

        if authenticated {
            match comm_mode {
                CommMode::Enciphered => {
                    let key = self.session_key.as_mut().expect("authenticated ⇒ session_key ≠ ∅");
                    data = key.decrypt(&data)?;
                }
                CommMode::Plain => {
                    let key = self.session_key.as_mut().expect("authenticated ⇒ session_key ≠ ∅");
                    let mut domain = data.clone();
                    domain.push(Status::Success.to_u8());
                    key.calculate_cmac(&domain)?;
                }
                CommMode::Maced | CommMode::PlainWithMac => {
                    // `Maced` carries the full 8-byte `CalculateCmac` result
                    // on the wire (`spec.md` §4.3.2: "tag stripped" on the
                    // response side); legacy `PlainWithMac` only carries a
                    // 4-byte truncated MAC.
                    let tag_len = if comm_mode == CommMode::PlainWithMac { 4 } else { 8 };
                    ensure!(
                        data.len() >= tag_len,
                        FramingError,
                        "response too short to carry its {}-byte MAC",
                        tag_len
                    );
                    let split_at = data.len() - tag_len;
                    let received_tag = data.split_off(split_at);

                    let key = self.session_key.as_mut().expect("authenticated ⇒ session_key ≠ ∅");
                    let mut domain = data.clone();
                    domain.push(Status::Success.to_u8());
                    let expected_tag = key.calculate_cmac(&domain)?;

                    let tags_match = bool::from(expected_tag[0..tag_len].ct_eq(&received_tag[..]));
                    if !tags_match {
                        self.clear_authentication();
                        warn!("response MAC did not verify, clearing session");
                        fail!(IntegrityError, "response MAC did not verify");
                    }
                }
            }
        }

        Ok(data)
    }

    /// The three-pass mutual authentication exchange (`spec.md` §4.3.1).
    /// `challenge`, when given, fixes `RndA` instead of drawing it from the
    /// OS RNG — used by deterministic tests against a recorded transcript.
    pub fn authenticate(
        &mut self,
        key_no: u8,
        mut key: Key,
        challenge: Option<Vec<u8>>,
    ) -> Result<(), SessionError> {
        self.state = SessionState::AuthInProgress(key_no);

        let block_size = key.block_size();
        let ins = auth_ins(key.key_type());

        // Not `exchange_with_continuation`: the card's `0xAF` here means
        // "challenge delivered, awaiting pass 2", not "more data follows"
        // (`spec.md` §4.3.3's `allow_continue_fallthrough` distinction). A
        // generic continuation loop would swallow the transport's reply to
        // pass 2 as if it were a continuation of pass 1.
        let pass1 = self
            .raw_exchange(ApduRequest::new(ins, vec![key_no]))
            .map_err(|e| {
                self.clear_authentication();
                e
            })?;

        if !pass1.status.is_additional_frame() {
            self.clear_authentication();
            warn!("authentication pass 1 failed: card did not request pass 2: {}", pass1.status);
            fail!(AuthenticationError, "card did not request pass 2: {}", pass1.status);
        }
        ensure!(
            pass1.data.len() == block_size,
            AuthenticationError,
            "E(RndB) is {} bytes, expected {}",
            pass1.data.len(),
            block_size
        );

        key.cipher_init();
        let rnd_b = key.decrypt(&pass1.data)?;
        let rnd_b_rot = rotate_left_1(&rnd_b);

        let rnd_a = match challenge {
            Some(bytes) => {
                ensure!(
                    bytes.len() == block_size,
                    AuthenticationError,
                    "supplied challenge is {} bytes, expected {}",
                    bytes.len(),
                    block_size
                );
                bytes
            }
            None => {
                let mut bytes = vec![0u8; block_size];
                thread_rng().fill_bytes(&mut bytes);
                bytes
            }
        };

        let mut pass2_plaintext = rnd_a.clone();
        pass2_plaintext.extend_from_slice(&rnd_b_rot);
        let pass2_ciphertext = key.encrypt(&pass2_plaintext)?;

        let pass2 = self.raw_exchange(ApduRequest::new(INS_ADDITIONAL_FRAME, pass2_ciphertext))?;

        if !pass2.status.is_success() {
            self.clear_authentication();
            warn!("authentication pass 2 rejected by card: {}", pass2.status);
            fail!(AuthenticationError, "card rejected pass 2: {}", pass2.status);
        }
        ensure!(
            pass2.data.len() == block_size,
            AuthenticationError,
            "E(RndA') is {} bytes, expected {}",
            pass2.data.len(),
            block_size
        );

        let rnd_a_rot_recovered = key.decrypt(&pass2.data)?;
        let rnd_a_rot_expected = rotate_left_1(&rnd_a);
        if rnd_a_rot_recovered != rnd_a_rot_expected {
            self.clear_authentication();
            warn!("authentication failed: RndA' mismatch, card failed to prove itself");
            fail!(AuthenticationError, "RndA' mismatch, card failed to prove itself");
        }

        key.derive_session_key(&rnd_a, &rnd_b)?;

        let aid = self.current_application;
        self.session_key = Some(key);
        self.state = SessionState::Authenticated(aid, key_no);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::ConnectorError;
    use crate::crypto::KeyType;

    /// A scripted connector that replays pre-recorded responses in order,
    /// independent of what was actually sent — enough to drive
    /// `authenticate` and `command` through a fixed transcript.
    struct ScriptedConnector {
        framing: Framing,
        responses: Vec<Vec<u8>>,
        sent: Vec<Vec<u8>>,
    }

    impl ScriptedConnector {
        fn new(framing: Framing, responses: Vec<Vec<u8>>) -> Self {
            ScriptedConnector {
                framing,
                responses,
                sent: Vec::new(),
            }
        }
    }

    impl Connector for ScriptedConnector {
        fn transceive(&mut self, request: &[u8]) -> Result<Vec<u8>, ConnectorError> {
            self.sent.push(request.to_vec());
            if self.responses.is_empty() {
                return Err(err!(
                    crate::connector::ConnectorErrorKind::ConnectionFailed,
                    "script exhausted"
                ));
            }
            Ok(self.responses.remove(0))
        }

        fn framing(&self) -> Framing {
            self.framing
        }
    }

    #[test]
    fn authenticate_follows_the_spec_worked_example() {
        let key = Key::zero(KeyType::Aes);
        let rnd_b: Vec<u8> = vec![
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
            0x0F, 0x10,
        ];
        let rnd_a: Vec<u8> = vec![
            0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D,
            0x1E, 0x1F,
        ];

        // Pass 1: card encrypts RndB under a zero IV with the all-zero key.
        let mut card_key = Key::zero(KeyType::Aes);
        let e_rnd_b = card_key.encrypt(&rnd_b).unwrap();

        // Mirror exactly what the host will do in `authenticate`, so the
        // card's running IV (continued on `card_key`) stays in lock-step:
        // decrypting `E(RndB)` advances the IV to `e_rnd_b`'s last block.
        let mut host_mirror = Key::zero(KeyType::Aes);
        host_mirror.cipher_init();
        host_mirror.decrypt(&e_rnd_b).unwrap();

        let mut rnd_b_rot = rnd_b[1..].to_vec();
        rnd_b_rot.push(rnd_b[0]);
        let mut pass2_plaintext = rnd_a.clone();
        pass2_plaintext.extend_from_slice(&rnd_b_rot);
        let pass2_ciphertext = host_mirror.encrypt(&pass2_plaintext).unwrap();

        // Pass 2: card decrypts the host's ciphertext (advancing its own
        // IV to that ciphertext's last block, matching `host_mirror`'s),
        // then re-encrypts `RndA' = rotL(RndA)` under the advanced IV.
        card_key.decrypt(&pass2_ciphertext).unwrap();
        let mut rnd_a_rot = rnd_a[1..].to_vec();
        rnd_a_rot.push(rnd_a[0]);
        let e_rnd_a_rot = card_key.encrypt(&rnd_a_rot).unwrap();

        let connector = ScriptedConnector::new(
            Framing::Native,
            vec![
                [&[0xAFu8][..], &e_rnd_b[..]].concat(),
                [&[0x00u8][..], &e_rnd_a_rot[..]].concat(),
            ],
        );

        let mut session = Session::new(connector);
        session
            .authenticate(0, key, Some(rnd_a.clone()))
            .expect("authentication should succeed against a consistent transcript");

        assert!(session.is_authenticated());
        assert_eq!(session.last_auth_key_no(), Some(0));
    }

    #[test]
    fn authenticate_rejects_a_mismatched_rnd_a_prime() {
        let key = Key::zero(KeyType::Aes);
        let rnd_b = vec![0x11u8; 16];

        let mut encrypt_key = Key::zero(KeyType::Aes);
        let e_rnd_b = encrypt_key.encrypt(&rnd_b).unwrap();
        let bogus_reply = encrypt_key.encrypt(&[0xFFu8; 16]).unwrap();

        let connector = ScriptedConnector::new(
            Framing::Native,
            vec![
                [&[0xAFu8][..], &e_rnd_b[..]].concat(),
                [&[0x00u8][..], &bogus_reply[..]].concat(),
            ],
        );

        let mut session = Session::new(connector);
        let result = session.authenticate(0, key, Some(vec![0x22u8; 16]));
        assert!(result.is_err());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn select_application_clears_authentication() {
        let connector = ScriptedConnector::new(Framing::Native, vec![]);
        let mut session = Session::new(connector);
        session.state = SessionState::Authenticated(Aid::new(0x112233), 3);
        session.note_select_application(Aid::new(0x112233));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn change_key_on_authenticated_slot_clears_authentication() {
        let connector = ScriptedConnector::new(Framing::Native, vec![]);
        let mut session = Session::new(connector);
        session.state = SessionState::Authenticated(Aid::PICC, 0);
        session.note_change_key(0);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn change_key_on_a_different_slot_leaves_authentication_intact() {
        let connector = ScriptedConnector::new(Framing::Native, vec![]);
        let mut session = Session::new(connector);
        session.state = SessionState::Authenticated(Aid::PICC, 0);
        session.note_change_key(5);
        assert!(session.is_authenticated());
    }

    #[test]
    fn bad_response_mac_raises_integrity_error_and_clears_session() {
        // A plain command succeeding with a forged trailing MAC in
        // PlainWithMac mode must be rejected.
        let connector = ScriptedConnector::new(
            Framing::Native,
            vec![[&[0x00u8][..], &[0xAAu8, 0xBB, 0x01, 0x02, 0x03, 0x04][..]].concat()],
        );
        let mut session = Session::new(connector);
        session.session_key = Some(Key::zero(KeyType::Aes));
        session.state = SessionState::Authenticated(Aid::PICC, 0);

        let result = session.command(0x60, Vec::new(), CommMode::PlainWithMac);
        assert!(result.is_err());
        assert!(!session.is_authenticated());
    }
}
