use core::fmt;

/// Result alias used across the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Failure codes for every fallible operation in the crate.
///
/// The discriminants are part of the wire-adjacent contract: hosts log and
/// compare these byte codes, so the numbering must not change between
/// releases. Byte-stuffing codes occupy 12..=22, checksum codes 52..=56, and
/// transport codes 105 and up.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Error {
    /// Encode refused a payload below the 1-byte minimum.
    PayloadTooSmall = 12,
    /// Encode refused a payload above the 254-byte COBS ceiling.
    PayloadTooLarge = 13,
    /// The buffer cannot hold the encoded packet.
    EncodeBufferTooSmall = 14,
    /// The overhead byte is nonzero: the buffer already holds encoded data.
    AlreadyEncoded = 15,
    /// Decode refused a packet below the 3-byte minimum.
    PacketTooSmall = 17,
    /// Decode refused a packet above the 256-byte ceiling.
    PacketTooLarge = 18,
    /// The buffer cannot hold the packet the size byte declares.
    DecodeBufferTooSmall = 19,
    /// The jump chain ran past the end of the packet without reaching an
    /// unencoded delimiter.
    DelimiterNotFound = 20,
    /// An unencoded delimiter appeared before the end of the packet.
    DelimiterFoundTooEarly = 21,
    /// The overhead byte is zero: the buffer has already been decoded.
    AlreadyDecoded = 22,

    /// The checksum range extends past the end of the buffer.
    ChecksumRangeOverflow = 52,
    /// Not enough room to append the checksum at the requested offset.
    ChecksumAppendOverflow = 54,
    /// Not enough bytes to read a checksum from the requested offset.
    ChecksumReadOverflow = 56,

    /// The incoming stream ran out before a start byte appeared. Only
    /// reported when start-byte errors are enabled.
    StartByteNotFound = 105,
    /// The payload-size byte did not arrive within the inter-byte timeout.
    PayloadSizeNotFound = 107,
    /// The received payload-size byte is outside the configured bounds.
    InvalidPayloadSize = 108,
    /// The packet body stalled past the inter-byte timeout.
    PacketTimeout = 109,
    /// Fewer bytes are buffered than the smallest possible packet.
    NoBytesToParse = 110,
    /// The packet arrived intact in shape but failed the CRC check.
    CrcCheckFailed = 112,
    /// A write would run past the transmission payload ceiling.
    WriteOverflow = 115,
    /// A read would run past the received payload.
    ReadOverflow = 117,
    /// The expected number of body bytes arrived without a delimiter.
    PacketDelimiterNotFound = 119,
    /// A delimiter byte arrived before the body was complete.
    PacketDelimiterTooEarly = 120,
    /// The CRC postamble stalled past the inter-byte timeout.
    PostambleTimeout = 121,

    /// A payload bound is outside 1..=254 or the minimum exceeds the maximum.
    InvalidConfiguration = 122,
    /// A configured payload ceiling plus framing and CRC overhead does not
    /// fit the staging buffer capacity.
    BufferCapacityExceeded = 123,
}

impl Error {
    /// The stable byte code for this error.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Error::PayloadTooSmall => "payload below the 1-byte minimum",
            Error::PayloadTooLarge => "payload above the 254-byte maximum",
            Error::EncodeBufferTooSmall => "buffer too small for the encoded packet",
            Error::AlreadyEncoded => "buffer already holds an encoded packet",
            Error::PacketTooSmall => "packet below the 3-byte minimum",
            Error::PacketTooLarge => "packet above the 256-byte maximum",
            Error::DecodeBufferTooSmall => "buffer too small for the declared packet",
            Error::DelimiterNotFound => "no delimiter at the end of the packet",
            Error::DelimiterFoundTooEarly => "delimiter before the end of the packet",
            Error::AlreadyDecoded => "buffer already decoded",
            Error::ChecksumRangeOverflow => "checksum range exceeds the buffer",
            Error::ChecksumAppendOverflow => "no room to append the checksum",
            Error::ChecksumReadOverflow => "no room to read the checksum",
            Error::StartByteNotFound => "start byte not found in the stream",
            Error::PayloadSizeNotFound => "payload-size byte not received",
            Error::InvalidPayloadSize => "payload-size byte out of bounds",
            Error::PacketTimeout => "packet body reception timed out",
            Error::NoBytesToParse => "not enough buffered bytes to parse",
            Error::CrcCheckFailed => "CRC check failed",
            Error::WriteOverflow => "write exceeds the payload region",
            Error::ReadOverflow => "read exceeds the received payload",
            Error::PacketDelimiterNotFound => "packet body ended without a delimiter",
            Error::PacketDelimiterTooEarly => "delimiter arrived before the body ended",
            Error::PostambleTimeout => "CRC postamble reception timed out",
            Error::InvalidConfiguration => "payload bounds out of range",
            Error::BufferCapacityExceeded => "configured payload does not fit the buffer",
        };
        f.write_str(message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
