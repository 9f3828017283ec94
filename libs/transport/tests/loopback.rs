//! End-to-end scenarios: a sender and a receiver transport paired over a
//! lossless in-memory stream.

use bytelink_transport::mock::{MockClock, MockStream};
use bytelink_transport::{CrcParameters, Error, SerialTransport, TransportConfig};

type Transport<'a> = SerialTransport<MockStream, &'a MockClock>;

fn pair<'a>(
    clock: &'a MockClock,
    crc: CrcParameters,
    config: TransportConfig,
) -> (Transport<'a>, Transport<'a>) {
    let sender = SerialTransport::new(MockStream::new(), clock, crc, config).unwrap();
    let receiver = SerialTransport::new(MockStream::new(), clock, crc, config).unwrap();
    (sender, receiver)
}

/// Runs `payload` through a full send → receive cycle and returns the wire
/// image that crossed the "link".
fn roundtrip(
    sender: &mut Transport<'_>,
    receiver: &mut Transport<'_>,
    payload: &[u8],
) -> Vec<u8> {
    sender.write_bytes(payload, 0).unwrap();
    sender.send_data().unwrap();

    let wire = sender.stream().transmitted().to_vec();
    sender.stream_mut().clear_transmitted();

    receiver.stream_mut().feed(&wire);
    assert!(receiver.available());
    assert_eq!(receiver.receive_data().unwrap(), payload.len());
    assert_eq!(receiver.rx_payload(), payload);
    wire
}

#[test]
fn roundtrip_with_default_configuration() {
    let clock = MockClock::new();
    let (mut sender, mut receiver) =
        pair(&clock, CrcParameters::CRC16_CCITT_FALSE, TransportConfig::default());

    let payload = [1u8, 2, 3, 0, 0, 6, 0, 8, 0, 0];
    let wire = roundtrip(&mut sender, &mut receiver, &payload);
    assert_eq!(wire.len(), payload.len() + 4 + 2);
    assert_eq!(wire[0], 129);
    assert_eq!(wire[1], payload.len() as u8);
}

#[test]
fn roundtrip_boundary_payload_sizes() {
    let clock = MockClock::new();
    let (mut sender, mut receiver) =
        pair(&clock, CrcParameters::CRC16_CCITT_FALSE, TransportConfig::default());

    roundtrip(&mut sender, &mut receiver, &[0x5A]);

    let mut largest = [0u8; 254];
    for (i, byte) in largest.iter_mut().enumerate() {
        *byte = (i % 7) as u8; // plenty of delimiter occurrences
    }
    roundtrip(&mut sender, &mut receiver, &largest);
}

#[test]
fn roundtrip_every_crc_width() {
    let clock = MockClock::new();
    let payload = [9u8, 0, 0, 3, 255, 0, 17];

    for crc in [
        CrcParameters::CRC8,
        CrcParameters::CRC16_CCITT_FALSE,
        CrcParameters::CRC32_XFER,
    ] {
        let (mut sender, mut receiver) = pair(&clock, crc, TransportConfig::default());
        let wire = roundtrip(&mut sender, &mut receiver, &payload);
        assert_eq!(wire.len(), payload.len() + 4 + crc.width());
    }
}

#[test]
fn roundtrip_with_nonzero_delimiter() {
    let clock = MockClock::new();
    let config = TransportConfig { delimiter_byte: 7, ..TransportConfig::default() };
    let (mut sender, mut receiver) = pair(&clock, CrcParameters::CRC16_CCITT_FALSE, config);

    // The payload is full of delimiter values; all must be eliminated on the
    // wire and restored on reception.
    let payload = [7u8, 7, 1, 7, 2, 7, 7];
    let wire = roundtrip(&mut sender, &mut receiver, &payload);
    let body = &wire[2..wire.len() - 3]; // overhead + encoded payload
    assert!(body.iter().all(|&b| b != 7), "delimiter leaked into the body");
}

#[test]
fn back_to_back_packets_are_received_in_order() {
    let clock = MockClock::new();
    let (mut sender, mut receiver) =
        pair(&clock, CrcParameters::CRC16_CCITT_FALSE, TransportConfig::default());

    for payload in [&[1u8, 2, 3][..], &[4u8, 5, 6, 7][..]] {
        sender.write_bytes(payload, 0).unwrap();
        sender.send_data().unwrap();
    }
    receiver.stream_mut().feed(sender.stream().transmitted());

    assert_eq!(receiver.receive_data().unwrap(), 3);
    assert_eq!(receiver.rx_payload(), &[1, 2, 3]);
    assert_eq!(receiver.receive_data().unwrap(), 4);
    assert_eq!(receiver.rx_payload(), &[4, 5, 6, 7]);
}

#[test]
fn noise_before_the_start_byte_is_skipped() {
    let clock = MockClock::new();
    let (mut sender, mut receiver) =
        pair(&clock, CrcParameters::CRC16_CCITT_FALSE, TransportConfig::default());

    let payload = [10u8, 20, 30];
    sender.write_bytes(&payload, 0).unwrap();
    sender.send_data().unwrap();

    receiver.stream_mut().feed(&[0x55, 0xAA, 0x55, 0xAA]);
    receiver.stream_mut().feed(sender.stream().transmitted());

    assert_eq!(receiver.receive_data().unwrap(), 3);
    assert_eq!(receiver.rx_payload(), &payload);
}

#[test]
fn flipped_crc_byte_is_rejected() {
    let clock = MockClock::new();
    let (mut sender, mut receiver) =
        pair(&clock, CrcParameters::CRC16_CCITT_FALSE, TransportConfig::default());

    let payload = [1u8, 2, 3, 0, 0, 6, 0, 8, 0, 0];
    sender.write_bytes(&payload, 0).unwrap();
    sender.send_data().unwrap();

    let mut wire = sender.stream().transmitted().to_vec();
    let last = wire.len() - 1;
    wire[last] ^= 0xFF;

    receiver.stream_mut().feed(&wire);
    assert_eq!(receiver.receive_data(), Err(Error::CrcCheckFailed));
}

#[test]
fn replaced_delimiter_is_rejected() {
    let clock = MockClock::new();
    let (mut sender, mut receiver) =
        pair(&clock, CrcParameters::CRC16_CCITT_FALSE, TransportConfig::default());

    let payload = [1u8, 2, 3, 0, 0, 6, 0, 8, 0, 0];
    sender.write_bytes(&payload, 0).unwrap();
    sender.send_data().unwrap();

    let mut wire = sender.stream().transmitted().to_vec();
    // The delimiter sits just before the two CRC bytes.
    let delimiter_index = wire.len() - 3;
    assert_eq!(wire[delimiter_index], 0);
    wire[delimiter_index] = 0x33;

    receiver.stream_mut().feed(&wire);
    assert_eq!(receiver.receive_data(), Err(Error::PacketDelimiterNotFound));
}

#[test]
fn early_delimiter_is_rejected() {
    let clock = MockClock::new();
    let (mut sender, mut receiver) =
        pair(&clock, CrcParameters::CRC16_CCITT_FALSE, TransportConfig::default());

    // A payload with no zero bytes encodes into a body with no delimiter
    // values, so planting one mid-body unambiguously ends the packet early.
    let payload = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10];
    sender.write_bytes(&payload, 0).unwrap();
    sender.send_data().unwrap();

    let mut wire = sender.stream().transmitted().to_vec();
    wire[7] = 0;

    receiver.stream_mut().feed(&wire);
    assert_eq!(receiver.receive_data(), Err(Error::PacketDelimiterTooEarly));
}

#[test]
fn tx_payload_tracking_is_monotonic_within_a_window() {
    let clock = MockClock::new();
    let (mut sender, _) =
        pair(&clock, CrcParameters::CRC16_CCITT_FALSE, TransportConfig::default());

    sender.write_bytes(&[1, 2, 3, 4, 5, 6, 7, 8], 0).unwrap();
    assert_eq!(sender.tx_payload_size(), 8);
    sender.write_bytes(&[9, 9], 2).unwrap();
    assert_eq!(sender.tx_payload_size(), 8);
    sender.write_bytes(&[1], 8).unwrap();
    assert_eq!(sender.tx_payload_size(), 9);

    sender.reset_transmission_buffer();
    assert_eq!(sender.tx_payload_size(), 0);
}
