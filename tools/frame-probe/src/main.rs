//! Bench tool for poking at the wire format: encodes a hex payload into a
//! complete packet, or decodes a captured hex packet back into its payload.

use anyhow::{Context, Result, bail};
use bytelink_transport::mock::MockStream;
use bytelink_transport::{CrcParameters, SerialTransport, StdClock, TransportConfig};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "frame-probe", about = "Encode and decode bytelink wire packets")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Checksum width and polynomial preset.
    #[arg(long, value_enum, default_value = "crc16")]
    crc: CrcPreset,

    /// Start byte value.
    #[arg(long, default_value_t = 129)]
    start: u8,

    /// Delimiter byte value.
    #[arg(long, default_value_t = 0)]
    delimiter: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Encode a hex payload into a full wire packet.
    Encode {
        /// Payload bytes as hex, e.g. "01 02 03 00 ff".
        payload: String,
    },
    /// Decode a captured hex wire packet back into its payload.
    Decode {
        /// Wire bytes as hex, start byte through the last CRC byte.
        bytes: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CrcPreset {
    /// CRC-8, polynomial 0x07.
    Crc8,
    /// CRC-16/CCITT-FALSE.
    Crc16,
    /// CRC-32/XFER.
    Crc32,
}

impl From<CrcPreset> for CrcParameters {
    fn from(preset: CrcPreset) -> Self {
        match preset {
            CrcPreset::Crc8 => CrcParameters::CRC8,
            CrcPreset::Crc16 => CrcParameters::CRC16_CCITT_FALSE,
            CrcPreset::Crc32 => CrcParameters::CRC32_XFER,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = TransportConfig {
        start_byte: cli.start,
        delimiter_byte: cli.delimiter,
        ..TransportConfig::default()
    };
    let mut transport = SerialTransport::<_, _>::new(
        MockStream::<512>::new(),
        StdClock::new(),
        cli.crc.into(),
        config,
    )
    .map_err(|error| anyhow::anyhow!("configuration rejected: {error}"))?;

    match cli.command {
        Command::Encode { payload } => {
            let payload = parse_hex(&payload)?;
            if payload.is_empty() {
                bail!("payload must contain at least one byte");
            }
            transport
                .write_bytes(&payload, 0)
                .map_err(|error| anyhow::anyhow!("staging failed: {error} (code {})", error.code()))?;
            transport
                .send_data()
                .map_err(|error| anyhow::anyhow!("encoding failed: {error} (code {})", error.code()))?;

            let wire = transport.stream().transmitted();
            println!("{}", format_hex(wire));
            eprintln!("{} payload bytes -> {} wire bytes", payload.len(), wire.len());
        }
        Command::Decode { bytes } => {
            let wire = parse_hex(&bytes)?;
            transport.stream_mut().feed(&wire);
            match transport.receive_data() {
                Ok(size) => {
                    println!("{}", format_hex(transport.rx_payload()));
                    eprintln!("{} wire bytes -> {} payload bytes", wire.len(), size);
                }
                Err(error) => bail!("decoding failed: {error} (code {})", error.code()),
            }
        }
    }

    Ok(())
}

// Accepts both spaced pairs ("01 02") and packed strings ("0102").
fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for word in input.split_whitespace() {
        if !word.is_ascii() || word.len() % 2 != 0 {
            bail!("invalid hex group {word:?}");
        }
        for index in (0..word.len()).step_by(2) {
            let pair = &word[index..index + 2];
            bytes.push(
                u8::from_str_radix(pair, 16)
                    .with_context(|| format!("invalid hex byte {pair:?}"))?,
            );
        }
    }
    Ok(bytes)
}

fn format_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
