//! Boundary scenario 2: `GetApplicationIDs` with three AIDs.

use desfire::{Aid, Client, Framing};

use super::ScriptedConnector;

#[test]
fn parses_three_little_endian_aid_triples() {
    let connector = ScriptedConnector::new(
        Framing::Native,
        vec![vec![
            0x00, 0xCC, 0xBB, 0xAA, 0x33, 0x22, 0x11, 0x66, 0x55, 0x44,
        ]],
    );
    let mut client = Client::new(connector);

    let aids = client.get_application_ids().unwrap();
    assert_eq!(
        aids,
        vec![Aid::new(0xAABBCC), Aid::new(0x112233), Aid::new(0x445566)]
    );
}

#[test]
fn an_unaligned_response_is_a_protocol_error() {
    let connector = ScriptedConnector::new(Framing::Native, vec![vec![0x00, 0x01, 0x02]]);
    let mut client = Client::new(connector);

    assert!(client.get_application_ids().is_err());
}
