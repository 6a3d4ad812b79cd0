//! Boundary scenario 3: `0xAF` continuation reassembly across `GetVersion`'s
//! three frames (hardware info, software info, production info).

use desfire::{Client, Framing};

use super::ScriptedConnector;

#[test]
fn reassembles_the_three_version_frames_in_order() {
    let mut hardware = vec![0xAFu8];
    hardware.extend_from_slice(&[0x04, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    let mut software = vec![0xAFu8];
    software.extend_from_slice(&[0x04, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    let mut production = vec![0x00u8];
    production.extend_from_slice(&[0xAA; 7]); // uid
    production.extend_from_slice(&[0xBB; 5]); // batch_number
    production.push(0x01); // production_week
    production.push(0x19); // production_year

    let connector = ScriptedConnector::new(Framing::Native, vec![hardware, software, production]);
    let mut client = Client::new(connector);

    let version = client.get_card_version().unwrap();
    assert_eq!(version.hardware.vendor_id, 0x04);
    assert_eq!(version.software.vendor_id, 0x04);
    assert_eq!(version.uid, [0xAA; 7]);
    assert_eq!(version.batch_number, [0xBB; 5]);
    assert_eq!(version.production_week, 0x01);
    assert_eq!(version.production_year, 0x19);
}
