//! Drives a full typed write → send → receive → read cycle between two
//! transports joined by an in-memory stream, mimicking a controller and a
//! host on either end of a serial link.
//!
//! Run with: `cargo run --example rx_tx_loop --features std`

use bytelink_transport::mock::MockStream;
use bytelink_transport::{CrcParameters, SerialTransport, StdClock, TransportConfig};

#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C, packed)]
struct TestStruct {
    test_flag: u8,
    test_float: f32,
}

fn main() {
    let config = TransportConfig::default();
    let crc = CrcParameters::CRC16_CCITT_FALSE;

    let mut controller =
        SerialTransport::<_, _>::new(MockStream::<512>::new(), StdClock::new(), crc, config)
            .expect("valid configuration");
    let mut host =
        SerialTransport::<_, _>::new(MockStream::<512>::new(), StdClock::new(), crc, config)
            .expect("valid configuration");

    // The controller stages a scalar, an array, and a packed structure.
    let test_scalar: u32 = 123_456_789;
    let test_array: [u8; 4] = [5, 6, 7, 8];
    let test_struct = TestStruct { test_flag: 1, test_float: 3.14 };

    let mut next = controller.write_data(&test_scalar, 0).unwrap();
    next = controller.write_data(&test_array, next).unwrap();
    controller.write_data(&test_struct, next).unwrap();
    controller.send_data().unwrap();

    let wire: Vec<u8> = controller.stream().transmitted().to_vec();
    println!("wire image ({} bytes):", wire.len());
    for chunk in wire.chunks(16) {
        for byte in chunk {
            print!("{byte:02x} ");
        }
        println!();
    }

    // Hand the wire bytes to the host side and unpack them.
    host.stream_mut().feed(&wire);
    assert!(host.available());
    let payload_size = host.receive_data().unwrap();
    println!("received payload of {payload_size} bytes");

    let mut scalar = 0u32;
    let mut array = [0u8; 4];
    let mut structure: TestStruct = bytemuck::Zeroable::zeroed();
    let mut offset = host.read_data(&mut scalar, 0).unwrap();
    offset = host.read_data(&mut array, offset).unwrap();
    host.read_data(&mut structure, offset).unwrap();

    println!("scalar = {scalar}");
    println!("array  = {array:?}");
    println!("struct = {structure:?}");

    assert_eq!(scalar, test_scalar);
    assert_eq!(array, test_array);
}
