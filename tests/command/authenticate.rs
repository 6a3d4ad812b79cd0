//! Boundary scenario 1: AES authenticate, key 0, PICC master, all-zero key.

use desfire::{Client, Framing, Key, KeyType};

use super::{aes_worked_example, ScriptedConnector};

#[test]
fn authenticates_against_the_aes_worked_example_transcript() {
    let example = aes_worked_example();

    let connector = ScriptedConnector::new(
        Framing::Native,
        vec![
            [&[0xAFu8][..], &example.e_rnd_b[..]].concat(),
            [&[0x00u8][..], &example.e_rnd_a_rot[..]].concat(),
        ],
    );
    let mut client = Client::new(connector);

    client
        .authenticate(0, Key::zero(KeyType::Aes), Some(example.rnd_a))
        .expect("authentication should succeed against a consistent transcript");

    assert!(client.session().is_authenticated());
    assert_eq!(client.session().last_auth_key_no(), Some(0));
}

#[test]
fn a_corrupted_rnd_a_prime_is_rejected_and_clears_state() {
    let example = aes_worked_example();
    let mut corrupted = example.e_rnd_a_rot.clone();
    corrupted[0] ^= 0xFF;

    let connector = ScriptedConnector::new(
        Framing::Native,
        vec![
            [&[0xAFu8][..], &example.e_rnd_b[..]].concat(),
            [&[0x00u8][..], &corrupted[..]].concat(),
        ],
    );
    let mut client = Client::new(connector);

    let result = client.authenticate(0, Key::zero(KeyType::Aes), Some(example.rnd_a));
    assert!(result.is_err());
    assert!(!client.session().is_authenticated());
}
