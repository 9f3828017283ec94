//! The framed transport: staging buffers, typed payload I/O, and the
//! send/receive pipelines.

use bytemuck::Pod;

use crate::cobs::{
    self, MAX_PAYLOAD_SIZE, MIN_PAYLOAD_SIZE, OVERHEAD_INDEX, PAYLOAD_SIZE_INDEX,
    PAYLOAD_START_INDEX,
};
use crate::crc::{CrcParameters, CrcProcessor};
use crate::stream::{ByteStream, Clock};
use crate::{Error, Result};

/// Default start byte, chosen to be unlikely in line noise.
pub const DEFAULT_START_BYTE: u8 = 129;
/// Default delimiter. Zero is the one value the overhead byte can never take
/// after a successful encode, so it is the safest choice.
pub const DEFAULT_DELIMITER_BYTE: u8 = 0;
/// Default inter-byte timeout in microseconds.
pub const DEFAULT_TIMEOUT_US: u32 = 20_000;

/// Start byte + payload-size byte + overhead byte + delimiter byte.
const FRAMING_OVERHEAD: usize = 4;

/// Construction-time knobs for [`SerialTransport`].
///
/// `start_byte` and `delimiter_byte` may be equal, but keeping them distinct
/// makes resynchronization after line noise more reliable.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Largest payload the transmission buffer will stage, 1..=254.
    pub max_tx_payload: u8,
    /// Largest payload accepted during reception, 1..=254.
    pub max_rx_payload: u8,
    /// Smallest payload accepted during reception; also sets how many stream
    /// bytes must be buffered before [`SerialTransport::available`] reports
    /// true.
    pub min_rx_payload: u8,
    /// Byte value that opens every packet.
    pub start_byte: u8,
    /// Byte value that closes every packet body.
    pub delimiter_byte: u8,
    /// Longest tolerated gap between two received bytes of one packet.
    pub timeout_us: u32,
    /// When true, an exhausted stream with no start byte reports
    /// [`Error::StartByteNotFound`] instead of the quieter
    /// [`Error::NoBytesToParse`]. Noise before a packet is routine, so the
    /// quiet form is the production default.
    pub allow_start_byte_errors: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_tx_payload: MAX_PAYLOAD_SIZE,
            max_rx_payload: MAX_PAYLOAD_SIZE,
            min_rx_payload: MIN_PAYLOAD_SIZE,
            start_byte: DEFAULT_START_BYTE,
            delimiter_byte: DEFAULT_DELIMITER_BYTE,
            timeout_us: DEFAULT_TIMEOUT_US,
            allow_start_byte_errors: false,
        }
    }
}

/// Packet transport over a raw byte stream.
///
/// Owns one transmission and one reception staging buffer, both laid out as
/// `[START][SIZE][OVERHEAD][PAYLOAD…][DELIMITER][CRC…]`. Callers stage typed
/// data into the transmission payload region with [`write_data`], emit it
/// with [`send_data`], pull packets off the wire with [`receive_data`], and
/// read the recovered payload with [`read_data`].
///
/// `TX_CAP` and `RX_CAP` size the buffers at compile time; the defaults hold
/// the largest possible packet (254 payload + 4 framing + 4 CRC bytes).
/// Construction fails if a configured payload ceiling cannot fit.
///
/// [`write_data`]: Self::write_data
/// [`send_data`]: Self::send_data
/// [`receive_data`]: Self::receive_data
/// [`read_data`]: Self::read_data
pub struct SerialTransport<S, C, const TX_CAP: usize = 262, const RX_CAP: usize = 262> {
    stream: S,
    clock: C,
    crc: CrcProcessor,
    config: TransportConfig,
    tx_buffer: [u8; TX_CAP],
    rx_buffer: [u8; RX_CAP],
}

impl<S: ByteStream, C: Clock, const TX_CAP: usize, const RX_CAP: usize>
    SerialTransport<S, C, TX_CAP, RX_CAP>
{
    /// Builds the transport, its CRC lookup table, and both zeroed staging
    /// buffers (the transmission start byte is pre-filled and never changes).
    pub fn new(stream: S, clock: C, crc: CrcParameters, config: TransportConfig) -> Result<Self> {
        let bounds = MIN_PAYLOAD_SIZE..=MAX_PAYLOAD_SIZE;
        if !bounds.contains(&config.max_tx_payload)
            || !bounds.contains(&config.max_rx_payload)
            || !bounds.contains(&config.min_rx_payload)
            || config.min_rx_payload > config.max_rx_payload
        {
            return Err(Error::InvalidConfiguration);
        }

        let width = crc.width();
        if config.max_tx_payload as usize + FRAMING_OVERHEAD + width > TX_CAP
            || config.max_rx_payload as usize + FRAMING_OVERHEAD + width > RX_CAP
        {
            return Err(Error::BufferCapacityExceeded);
        }

        let mut tx_buffer = [0u8; TX_CAP];
        tx_buffer[0] = config.start_byte;

        Ok(Self {
            stream,
            clock,
            crc: CrcProcessor::new(crc),
            config,
            tx_buffer,
            rx_buffer: [0u8; RX_CAP],
        })
    }

    /// True when the stream holds at least as many bytes as the smallest
    /// packet this transport would accept. Calling [`receive_data`] before
    /// this reports true wastes cycles on a parse that cannot finish.
    ///
    /// [`receive_data`]: Self::receive_data
    pub fn available(&self) -> bool {
        self.stream.available() >= self.minimum_packet_size()
    }

    /// Copies `object`'s bytes into the transmission payload region starting
    /// at payload offset `start`. Returns the offset just past the written
    /// bytes, which chains directly into the next write.
    ///
    /// The payload-size tracker only ever grows inside one staging window:
    /// overwriting already-counted bytes does not shrink it, and writing at
    /// offset `n` counts everything below `n` as part of the payload.
    pub fn write_data<T: Pod>(&mut self, object: &T, start: usize) -> Result<usize> {
        self.write_bytes(bytemuck::bytes_of(object), start)
    }

    /// Raw-slice form of [`write_data`](Self::write_data).
    pub fn write_bytes(&mut self, bytes: &[u8], start: usize) -> Result<usize> {
        let end = start.checked_add(bytes.len()).ok_or(Error::WriteOverflow)?;
        if end > self.config.max_tx_payload as usize {
            return Err(Error::WriteOverflow);
        }

        self.tx_buffer[PAYLOAD_START_INDEX + start..PAYLOAD_START_INDEX + end]
            .copy_from_slice(bytes);
        self.tx_buffer[PAYLOAD_SIZE_INDEX] = self.tx_buffer[PAYLOAD_SIZE_INDEX].max(end as u8);
        Ok(end)
    }

    /// Copies bytes from the received payload region starting at payload
    /// offset `start` into `object`. Returns the offset just past the read
    /// bytes. The reception buffer is not modified.
    ///
    /// Reads are bounded by the received payload size, not the buffer: bytes
    /// beyond the payload are stale leftovers from earlier packets.
    pub fn read_data<T: Pod>(&self, object: &mut T, start: usize) -> Result<usize> {
        let bytes = bytemuck::bytes_of_mut(object);
        let end = start.checked_add(bytes.len()).ok_or(Error::ReadOverflow)?;
        if end > self.rx_buffer[PAYLOAD_SIZE_INDEX] as usize {
            return Err(Error::ReadOverflow);
        }

        bytes.copy_from_slice(&self.rx_buffer[PAYLOAD_START_INDEX + start..PAYLOAD_START_INDEX + end]);
        Ok(end)
    }

    /// Encodes the staged payload, appends its checksum, and hands the whole
    /// wire image (start byte through last CRC byte) to the stream. On
    /// success the transmission buffer is reset for the next payload.
    pub fn send_data(&mut self) -> Result<()> {
        let combined_size = self.construct_packet()?;
        self.stream.write(&self.tx_buffer[..combined_size]);
        self.reset_transmission_buffer();
        Ok(())
    }

    /// Pulls one packet off the stream and validates it. On success the
    /// payload is live in the reception buffer and its size is returned.
    ///
    /// The reception buffer is reset before every parse attempt, so a call
    /// after a failed reception starts clean.
    pub fn receive_data(&mut self) -> Result<usize> {
        if !self.available() {
            return Err(Error::NoBytesToParse);
        }

        self.reset_reception_buffer();
        let packet_size = self.parse_packet()?;
        self.validate_packet(packet_size)
    }

    /// Zeroes the transmission payload-size tracker and overhead byte. The
    /// only way to shrink a staged payload.
    pub fn reset_transmission_buffer(&mut self) {
        self.tx_buffer[PAYLOAD_SIZE_INDEX] = 0;
        self.tx_buffer[OVERHEAD_INDEX] = 0;
    }

    /// Zeroes the reception payload-size tracker and overhead byte,
    /// invalidating any previously received payload.
    pub fn reset_reception_buffer(&mut self) {
        self.rx_buffer[PAYLOAD_SIZE_INDEX] = 0;
        self.rx_buffer[OVERHEAD_INDEX] = 0;
    }

    /// Bytes currently staged for transmission.
    pub fn tx_payload_size(&self) -> u8 {
        self.tx_buffer[PAYLOAD_SIZE_INDEX]
    }

    /// Bytes of the most recently received payload.
    pub fn rx_payload_size(&self) -> u8 {
        self.rx_buffer[PAYLOAD_SIZE_INDEX]
    }

    /// The received payload as a slice.
    pub fn rx_payload(&self) -> &[u8] {
        let size = self.rx_buffer[PAYLOAD_SIZE_INDEX] as usize;
        &self.rx_buffer[PAYLOAD_START_INDEX..PAYLOAD_START_INDEX + size]
    }

    /// Configured transmission payload ceiling.
    pub fn max_tx_payload_size(&self) -> u8 {
        self.config.max_tx_payload
    }

    /// Configured reception payload ceiling.
    pub fn max_rx_payload_size(&self) -> u8 {
        self.config.max_rx_payload
    }

    /// Transmission staging buffer capacity in bytes.
    pub const fn tx_buffer_capacity(&self) -> usize {
        TX_CAP
    }

    /// Reception staging buffer capacity in bytes.
    pub const fn rx_buffer_capacity(&self) -> usize {
        RX_CAP
    }

    /// Switches between quiet and loud handling of a missing start byte.
    pub fn set_allow_start_byte_errors(&mut self, allow: bool) {
        self.config.allow_start_byte_errors = allow;
    }

    /// The underlying byte stream.
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// Mutable access to the underlying byte stream.
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Test helper: copies the staged transmission payload into the
    /// reception payload region, simulating a loopback reception of
    /// un-encoded data. Returns false when the payload exceeds the reception
    /// ceiling.
    pub fn copy_tx_payload_to_rx_buffer(&mut self) -> bool {
        let size = self.tx_buffer[PAYLOAD_SIZE_INDEX];
        if size > self.config.max_rx_payload {
            return false;
        }
        let size = size as usize;
        self.rx_buffer[PAYLOAD_START_INDEX..PAYLOAD_START_INDEX + size]
            .copy_from_slice(&self.tx_buffer[PAYLOAD_START_INDEX..PAYLOAD_START_INDEX + size]);
        self.rx_buffer[PAYLOAD_SIZE_INDEX] = size as u8;
        true
    }

    /// Smallest stream byte count that can hold a complete packet for this
    /// configuration.
    fn minimum_packet_size(&self) -> usize {
        self.config.min_rx_payload as usize + 3 + self.crc.width()
    }

    /// COBS-encodes the staged payload and appends the checksum over
    /// `[overhead..=delimiter]`. Returns the total wire size, start byte
    /// included.
    fn construct_packet(&mut self) -> Result<usize> {
        let packet_size = cobs::encode_payload(&mut self.tx_buffer, self.config.delimiter_byte)?;
        let checksum = self.crc.calculate(&self.tx_buffer, OVERHEAD_INDEX, packet_size)?;
        self.crc.append_checksum(&mut self.tx_buffer, packet_size + OVERHEAD_INDEX, checksum)
    }

    /// Reads one packet out of the stream into the reception buffer:
    /// scan for the start byte, read and bound-check the size byte, collect
    /// the body until the delimiter, then collect the CRC postamble. Returns
    /// the byte count past the preamble (body + postamble).
    fn parse_packet(&mut self) -> Result<usize> {
        // The start scan is driven purely by availability; the inter-byte
        // timer only runs once a packet has begun.
        let mut start_found = false;
        while self.stream.available() > 0 {
            match self.stream.read_one() {
                Some(byte) if byte == self.config.start_byte => {
                    start_found = true;
                    break;
                }
                Some(_) => continue,
                None => break,
            }
        }
        if !start_found {
            return Err(if self.config.allow_start_byte_errors {
                Error::StartByteNotFound
            } else {
                Error::NoBytesToParse
            });
        }

        let timeout = self.config.timeout_us as u64;

        // Payload-size byte.
        let mut size_found = false;
        let mut timer = self.clock.now_us();
        while self.clock.now_us().wrapping_sub(timer) < timeout {
            if let Some(byte) = self.stream.read_one() {
                self.rx_buffer[PAYLOAD_SIZE_INDEX] = byte;
                if byte < self.config.min_rx_payload || byte > self.config.max_rx_payload {
                    return Err(Error::InvalidPayloadSize);
                }
                size_found = true;
                break;
            }
        }
        if !size_found {
            return Err(Error::PayloadSizeNotFound);
        }

        // Body: overhead byte, encoded payload, delimiter. `bytes_read` is a
        // buffer index, so it starts past the two preamble slots.
        let body_end = self.rx_buffer[PAYLOAD_SIZE_INDEX] as usize + OVERHEAD_INDEX + 2;
        let mut bytes_read = OVERHEAD_INDEX;
        let mut delimiter_found = false;
        timer = self.clock.now_us();
        while self.clock.now_us().wrapping_sub(timer) < timeout && bytes_read < body_end {
            if let Some(byte) = self.stream.read_one() {
                self.rx_buffer[bytes_read] = byte;
                bytes_read += 1;
                timer = self.clock.now_us();
                if byte == self.config.delimiter_byte {
                    delimiter_found = true;
                    break;
                }
            }
        }
        if !delimiter_found && bytes_read < body_end {
            return Err(Error::PacketTimeout);
        }
        if !delimiter_found {
            return Err(Error::PacketDelimiterNotFound);
        }
        if bytes_read != body_end {
            return Err(Error::PacketDelimiterTooEarly);
        }

        // CRC postamble.
        let postamble_end = body_end + self.crc.width();
        timer = self.clock.now_us();
        while self.clock.now_us().wrapping_sub(timer) < timeout && bytes_read < postamble_end {
            if let Some(byte) = self.stream.read_one() {
                self.rx_buffer[bytes_read] = byte;
                bytes_read += 1;
                timer = self.clock.now_us();
            }
        }
        if bytes_read < postamble_end {
            return Err(Error::PostambleTimeout);
        }

        Ok(bytes_read - OVERHEAD_INDEX)
    }

    /// Checks the parsed packet's integrity and decodes it. `packet_size`
    /// counts everything past the preamble, CRC included. A zero remainder
    /// over body plus checksum proves the packet intact; the COBS decode then
    /// doubles as a second shape check.
    fn validate_packet(&mut self, packet_size: usize) -> Result<usize> {
        let remainder = self.crc.calculate(&self.rx_buffer, OVERHEAD_INDEX, packet_size)?;
        if remainder != 0 {
            return Err(Error::CrcCheckFailed);
        }
        cobs::decode_payload(&mut self.rx_buffer, self.config.delimiter_byte)
    }
}
