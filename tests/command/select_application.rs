//! Boundary scenario 6: `SelectApplication` unconditionally clears
//! authentication, from any prior state.

use desfire::{Aid, Client, Framing, Key, KeyType};

use super::{aes_worked_example, ScriptedConnector};

#[test]
fn clears_authentication_even_when_previously_authenticated() {
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

    client.select_application(Aid::new(0x112233)).unwrap();

    assert!(!client.session().is_authenticated());
    assert_eq!(client.session().current_application(), Aid::new(0x112233));
}

#[test]
fn clears_authentication_from_an_unauthenticated_session_too() {
    let connector = ScriptedConnector::new(Framing::Native, vec![vec![0x00]]);
    let mut client = Client::new(connector);

    client.select_application(Aid::new(0xABCDEF)).unwrap();
    assert!(!client.session().is_authenticated());
    assert_eq!(client.session().current_application(), Aid::new(0xABCDEF));
}
