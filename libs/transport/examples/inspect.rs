//! Encodes a payload and prints the resulting wire image, flagging where the
//! framing bytes sit and proving the delimiter never leaks into the body.
//!
//! Run with: `cargo run --example inspect --features std`

use bytelink_transport::mock::MockStream;
use bytelink_transport::{CrcParameters, SerialTransport, StdClock, TransportConfig};

fn main() {
    let config = TransportConfig::default();
    let mut transport = SerialTransport::<_, _>::new(
        MockStream::<512>::new(),
        StdClock::new(),
        CrcParameters::CRC16_CCITT_FALSE,
        config,
    )
    .expect("valid configuration");

    // A payload riddled with delimiter (zero) bytes.
    let payload: [u8; 10] = [1, 2, 3, 0, 0, 6, 0, 8, 0, 0];
    transport.write_data(&payload, 0).unwrap();
    transport.send_data().unwrap();

    let wire = transport.stream().transmitted();
    println!("payload: {payload:02x?}");
    println!("wire ({} bytes):", wire.len());
    for (i, byte) in wire.iter().enumerate() {
        print!("{byte:02x} ");
        if (i + 1) % 16 == 0 {
            println!();
        }
    }
    println!();

    let body_end = wire.len() - 3; // delimiter + 2 CRC bytes follow the body
    println!("start byte     : {:#04x}", wire[0]);
    println!("payload size   : {}", wire[1]);
    println!("overhead byte  : {}", wire[2]);
    println!("delimiter index: {body_end}");

    for (i, byte) in wire[2..body_end].iter().enumerate() {
        if *byte == config.delimiter_byte {
            println!("delimiter value leaked into the body at index {}", i + 2);
        }
    }
}
