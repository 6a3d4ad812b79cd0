//! Boundary scenario 5: same-key AES `ChangeKey` at PICC level clears
//! authentication on success.

use desfire::{Client, Framing, Key, KeyType};

use super::{aes_worked_example, ScriptedConnector};

#[test]
fn same_key_change_at_picc_level_clears_authentication() {
    let example = aes_worked_example();

    let connector = ScriptedConnector::new(
        Framing::Native,
        vec![
            [&[0xAFu8][..], &example.e_rnd_b[..]].concat(),
            [&[0x00u8][..], &example.e_rnd_a_rot[..]].concat(),
            vec![0x00],
        ],
    );
    let mut client = Client::new(connector);

    client
        .authenticate(0, Key::zero(KeyType::Aes), Some(example.rnd_a))
        .unwrap();
    assert!(client.session().is_authenticated());

    let new_key = Key::zero(KeyType::Aes);
    client
        .change_key(0, &new_key, None)
        .expect("changing the slot that authenticated the session should succeed");

    assert!(!client.session().is_authenticated());
}
